use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        DraftRepository, ExamRepository, MongoDraftRepository, MongoExamRepository,
    },
    services::{DraftService, ResultService},
};

#[derive(Clone)]
pub struct AppState {
    pub draft_service: Arc<DraftService>,
    pub result_service: Arc<ResultService>,
    pub db: Option<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let draft_repository = Arc::new(MongoDraftRepository::new(&db, &config.drafts_collection));
        draft_repository.ensure_indexes().await?;

        let exam_repository = Arc::new(MongoExamRepository::new(&db, &config));
        exam_repository.ensure_indexes().await?;

        let mut state = Self::from_repositories(config, draft_repository, exam_repository);
        state.db = Some(db);
        Ok(state)
    }

    /// Wires services over arbitrary repositories, without a database handle.
    pub fn from_repositories(
        config: Config,
        drafts: Arc<dyn DraftRepository>,
        exams: Arc<dyn ExamRepository>,
    ) -> Self {
        Self {
            draft_service: Arc::new(DraftService::new(drafts)),
            result_service: Arc::new(ResultService::new(exams)),
            db: None,
            config: Arc::new(config),
        }
    }
}
