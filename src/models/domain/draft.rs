use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Addresses one logical draft. `exam_id` is part of the address and compared exactly, so a
/// scope without one never matches fields saved under an exam.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct DraftScope {
    pub draft_key: String,
    pub exam_id: Option<String>,
}

impl DraftScope {
    pub fn new(draft_key: &str) -> Self {
        DraftScope {
            draft_key: draft_key.to_string(),
            exam_id: None,
        }
    }

    pub fn for_exam(draft_key: &str, exam_id: &str) -> Self {
        DraftScope {
            draft_key: draft_key.to_string(),
            exam_id: Some(exam_id.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DraftField {
    pub draft_key: String,
    pub exam_id: Option<String>,
    pub field_path: String,
    pub data: JsonValue,
    pub updated_at: DateTime<Utc>,
}

impl DraftField {
    pub fn new(scope: &DraftScope, field_path: &str, data: JsonValue) -> Self {
        DraftField {
            draft_key: scope.draft_key.clone(),
            exam_id: scope.exam_id.clone(),
            field_path: field_path.to_string(),
            data,
            updated_at: Utc::now(),
        }
    }

    pub fn scope(&self) -> DraftScope {
        DraftScope {
            draft_key: self.draft_key.clone(),
            exam_id: self.exam_id.clone(),
        }
    }

    pub fn belongs_to(&self, scope: &DraftScope) -> bool {
        self.draft_key == scope.draft_key && self.exam_id == scope.exam_id
    }
}
