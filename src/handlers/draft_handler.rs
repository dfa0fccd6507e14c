use actix_web::{delete, get, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{
        request::{DraftQuery, UpsertDraftFieldRequest},
        response::{ClearDraftResponse, DraftFieldDto, SaveDraftFieldResponse},
    },
};

#[put("/api/drafts/{draft_key}/fields")]
pub async fn upsert_draft_field(
    state: web::Data<AppState>,
    draft_key: web::Path<String>,
    request: web::Json<UpsertDraftFieldRequest>,
) -> Result<HttpResponse, AppError> {
    let field = state
        .draft_service
        .save_field(&draft_key, request.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(SaveDraftFieldResponse {
        data: DraftFieldDto::from(field),
        message: "Draft field saved".to_string(),
    }))
}

#[get("/api/drafts/{draft_key}/fields")]
pub async fn list_draft_fields(
    state: web::Data<AppState>,
    draft_key: web::Path<String>,
    query: web::Query<DraftQuery>,
) -> Result<HttpResponse, AppError> {
    let scope = query.scope(&draft_key);
    let fields: Vec<DraftFieldDto> = state
        .draft_service
        .list_fields(&scope)
        .await?
        .into_iter()
        .map(DraftFieldDto::from)
        .collect();

    Ok(HttpResponse::Ok().json(fields))
}

#[delete("/api/drafts/{draft_key}")]
pub async fn clear_draft(
    state: web::Data<AppState>,
    draft_key: web::Path<String>,
    query: web::Query<DraftQuery>,
) -> Result<HttpResponse, AppError> {
    let deleted = state.draft_service.clear(&query.scope(&draft_key)).await?;
    Ok(HttpResponse::Ok().json(ClearDraftResponse { deleted }))
}
