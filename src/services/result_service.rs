use std::sync::Arc;

use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{domain::ExamResult, dto::request::ScoreAttemptRequest},
    repositories::ExamRepository,
    services::scoring_service::ScoringService,
};

/// Scores submitted attempts against the exam catalog. Results are returned, not stored.
pub struct ResultService {
    repository: Arc<dyn ExamRepository>,
}

impl ResultService {
    pub fn new(repository: Arc<dyn ExamRepository>) -> Self {
        Self { repository }
    }

    pub async fn score_attempt(
        &self,
        exam_id: &str,
        request: ScoreAttemptRequest,
    ) -> AppResult<ExamResult> {
        request.validate()?;

        let exam = self
            .repository
            .find_exam(exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Exam with id '{}' not found", exam_id)))?;

        let questions = self.repository.find_questions(exam_id).await?;

        Ok(ScoringService::calculate_result(
            &exam.id,
            &questions,
            &request.answers,
            request.time_taken,
            exam.pass_percentage,
        ))
    }
}
