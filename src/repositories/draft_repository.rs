use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, bson::Document, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{DraftField, DraftScope},
};

/// Storage contract behind the autosave engine: one value per `(scope, field_path)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DraftRepository: Send + Sync {
    /// Idempotent insert-or-replace of one field.
    async fn upsert_field(&self, field: DraftField) -> AppResult<()>;
    async fn fetch_fields(&self, scope: &DraftScope) -> AppResult<Vec<DraftField>>;
    /// Deletes every field of the scope and returns how many were removed.
    async fn clear_draft(&self, scope: &DraftScope) -> AppResult<u64>;
}

pub struct MongoDraftRepository {
    collection: Collection<DraftField>,
}

impl MongoDraftRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        let collection = db.get_collection(collection_name);
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for draft fields collection");

        let field_index = IndexModel::builder()
            .keys(doc! { "draft_key": 1, "exam_id": 1, "field_path": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("draft_field_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(field_index).await?;

        log::info!("Successfully created indexes for draft fields collection");
        Ok(())
    }
}

fn scope_filter(scope: &DraftScope) -> Document {
    doc! {
        "draft_key": scope.draft_key.as_str(),
        "exam_id": scope.exam_id.clone(),
    }
}

#[async_trait]
impl DraftRepository for MongoDraftRepository {
    async fn upsert_field(&self, field: DraftField) -> AppResult<()> {
        let mut filter = scope_filter(&field.scope());
        filter.insert("field_path", field.field_path.clone());

        self.collection
            .replace_one(filter, &field)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn fetch_fields(&self, scope: &DraftScope) -> AppResult<Vec<DraftField>> {
        let fields = self
            .collection
            .find(scope_filter(scope))
            .sort(doc! { "field_path": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(fields)
    }

    async fn clear_draft(&self, scope: &DraftScope) -> AppResult<u64> {
        let result = self.collection.delete_many(scope_filter(scope)).await?;

        log::debug!(
            "Cleared {} draft fields for '{}'",
            result.deleted_count,
            scope.draft_key
        );
        Ok(result.deleted_count)
    }
}
