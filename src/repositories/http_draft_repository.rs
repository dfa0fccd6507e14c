use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::{
        domain::{DraftField, DraftScope},
        dto::{
            request::UpsertDraftFieldRequest,
            response::{ClearDraftResponse, DraftFieldDto},
        },
    },
    repositories::DraftRepository,
};

/// Draft store reached over the REST surface served by this crate's binary.
pub struct HttpDraftRepository {
    client: Client,
    base_url: Url,
}

impl HttpDraftRepository {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let base_url = Url::parse(base_url).map_err(|err| {
            AppError::ValidationError(format!("invalid draft API base URL '{}': {}", base_url, err))
        })?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            &config.draft_api_base_url,
            Duration::from_secs(config.draft_api_timeout_secs),
        )
    }

    /// `{base}/api/drafts/{draft_key}/{tail..}` with each segment percent-encoded.
    fn draft_url(&self, draft_key: &str, tail: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AppError::ValidationError(format!(
                    "draft API base URL cannot carry a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["api", "drafts", draft_key])
            .extend(tail);
        Ok(url)
    }

    fn with_scope(request: RequestBuilder, scope: &DraftScope) -> RequestBuilder {
        match &scope.exam_id {
            Some(exam_id) => request.query(&[("exam_id", exam_id)]),
            None => request,
        }
    }
}

#[async_trait]
impl DraftRepository for HttpDraftRepository {
    async fn upsert_field(&self, field: DraftField) -> AppResult<()> {
        let url = self.draft_url(&field.draft_key, &["fields"])?;

        self.client
            .put(url)
            .json(&UpsertDraftFieldRequest::from_field(&field))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn fetch_fields(&self, scope: &DraftScope) -> AppResult<Vec<DraftField>> {
        let url = self.draft_url(&scope.draft_key, &["fields"])?;

        let fields: Vec<DraftFieldDto> = Self::with_scope(self.client.get(url), scope)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(fields
            .into_iter()
            .map(|dto| dto.into_field(scope))
            .collect())
    }

    async fn clear_draft(&self, scope: &DraftScope) -> AppResult<u64> {
        let url = self.draft_url(&scope.draft_key, &[])?;

        let response: ClearDraftResponse = Self::with_scope(self.client.delete(url), scope)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.deleted)
    }
}
