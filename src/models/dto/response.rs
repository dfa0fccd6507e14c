use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::domain::{DraftField, DraftScope};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftFieldDto {
    pub field_path: String,
    pub data: JsonValue,
    pub updated_at: DateTime<Utc>,
}

impl From<DraftField> for DraftFieldDto {
    fn from(field: DraftField) -> Self {
        DraftFieldDto {
            field_path: field.field_path,
            data: field.data,
            updated_at: field.updated_at,
        }
    }
}

impl DraftFieldDto {
    pub fn into_field(self, scope: &DraftScope) -> DraftField {
        DraftField {
            draft_key: scope.draft_key.clone(),
            exam_id: scope.exam_id.clone(),
            field_path: self.field_path,
            data: self.data,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub message: String,
}

pub type SaveDraftFieldResponse = ApiResponse<DraftFieldDto>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearDraftResponse {
    pub deleted: u64,
}
