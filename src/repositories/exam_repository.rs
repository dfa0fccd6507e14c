use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    models::domain::{Exam, Question},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExamRepository: Send + Sync {
    async fn find_exam(&self, id: &str) -> AppResult<Option<Exam>>;
    /// Questions of an exam in catalog order.
    async fn find_questions(&self, exam_id: &str) -> AppResult<Vec<Question>>;
}

pub struct MongoExamRepository {
    exams: Collection<Exam>,
    questions: Collection<Question>,
}

impl MongoExamRepository {
    pub fn new(db: &Database, config: &Config) -> Self {
        Self {
            exams: db.get_collection(&config.exams_collection),
            questions: db.get_collection(&config.questions_collection),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for exam catalog collections");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let exam_order_index = IndexModel::builder()
            .keys(doc! { "exam_id": 1, "order": 1 })
            .options(
                IndexOptions::builder()
                    .name("exam_order".to_string())
                    .build(),
            )
            .build();

        self.exams.create_index(id_index).await?;
        self.questions.create_index(exam_order_index).await?;

        log::info!("Successfully created indexes for exam catalog collections");
        Ok(())
    }
}

#[async_trait]
impl ExamRepository for MongoExamRepository {
    async fn find_exam(&self, id: &str) -> AppResult<Option<Exam>> {
        let exam = self.exams.find_one(doc! { "id": id }).await?;
        Ok(exam)
    }

    async fn find_questions(&self, exam_id: &str) -> AppResult<Vec<Question>> {
        let questions = self
            .questions
            .find(doc! { "exam_id": exam_id })
            .sort(doc! { "order": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(questions)
    }
}
