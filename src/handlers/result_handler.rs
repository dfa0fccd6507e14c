use actix_web::{post, web, HttpResponse};

use crate::{app_state::AppState, errors::AppError, models::dto::request::ScoreAttemptRequest};

#[post("/api/exams/{exam_id}/results")]
pub async fn score_attempt(
    state: web::Data<AppState>,
    exam_id: web::Path<String>,
    request: web::Json<ScoreAttemptRequest>,
) -> Result<HttpResponse, AppError> {
    let result = state
        .result_service
        .score_attempt(&exam_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(result))
}
