use std::sync::Arc;

use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{DraftField, DraftScope},
        dto::request::UpsertDraftFieldRequest,
    },
    repositories::DraftRepository,
};

/// Server side of the draft persistence contract.
pub struct DraftService {
    repository: Arc<dyn DraftRepository>,
}

impl DraftService {
    pub fn new(repository: Arc<dyn DraftRepository>) -> Self {
        Self { repository }
    }

    pub async fn save_field(
        &self,
        draft_key: &str,
        request: UpsertDraftFieldRequest,
    ) -> AppResult<DraftField> {
        Self::check_key(draft_key)?;
        request.validate()?;

        let field = request.into_field(draft_key);
        self.repository.upsert_field(field.clone()).await?;

        log::debug!("Stored draft field '{}' for '{}'", field.field_path, draft_key);
        Ok(field)
    }

    pub async fn list_fields(&self, scope: &DraftScope) -> AppResult<Vec<DraftField>> {
        Self::check_key(&scope.draft_key)?;
        self.repository.fetch_fields(scope).await
    }

    pub async fn clear(&self, scope: &DraftScope) -> AppResult<u64> {
        Self::check_key(&scope.draft_key)?;
        let deleted = self.repository.clear_draft(scope).await?;

        log::info!("Cleared draft '{}': {} fields removed", scope.draft_key, deleted);
        Ok(deleted)
    }

    fn check_key(draft_key: &str) -> AppResult<()> {
        if draft_key.trim().is_empty() || draft_key.len() > 200 {
            return Err(AppError::ValidationError(
                "draft key must be 1 to 200 characters".to_string(),
            ));
        }
        Ok(())
    }
}
