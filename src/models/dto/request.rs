use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::models::domain::{AttemptAnswer, DraftField, DraftScope};

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct UpsertDraftFieldRequest {
    #[validate(length(min = 1, max = 100))]
    pub exam_id: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub field_path: String,

    pub data: JsonValue,
}

impl UpsertDraftFieldRequest {
    pub fn from_field(field: &DraftField) -> Self {
        UpsertDraftFieldRequest {
            exam_id: field.exam_id.clone(),
            field_path: field.field_path.clone(),
            data: field.data.clone(),
        }
    }

    pub fn into_field(self, draft_key: &str) -> DraftField {
        let scope = DraftScope {
            draft_key: draft_key.to_string(),
            exam_id: self.exam_id,
        };
        DraftField::new(&scope, &self.field_path, self.data)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DraftQuery {
    pub exam_id: Option<String>,
}

impl DraftQuery {
    pub fn scope(&self, draft_key: &str) -> DraftScope {
        DraftScope {
            draft_key: draft_key.to_string(),
            exam_id: self.exam_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ScoreAttemptRequest {
    #[validate(length(max = 1000))]
    pub answers: Vec<AttemptAnswer>,

    #[serde(default)]
    pub time_taken: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upsert_request_rejects_empty_field_path() {
        let request = UpsertDraftFieldRequest {
            exam_id: None,
            field_path: String::new(),
            data: json!(null),
        };

        assert!(request.validate().is_err());
    }

    #[test]
    fn upsert_request_builds_scoped_field() {
        let request = UpsertDraftFieldRequest {
            exam_id: Some("exam-1".to_string()),
            field_path: "answers.q-1".to_string(),
            data: json!({"answer": "B"}),
        };
        assert!(request.validate().is_ok());

        let field = request.into_field("attempt-1");

        assert_eq!(field.scope(), DraftScope::for_exam("attempt-1", "exam-1"));
        assert_eq!(field.field_path, "answers.q-1");
    }

    #[test]
    fn score_request_defaults_time_taken() {
        let request: ScoreAttemptRequest =
            serde_json::from_value(json!({"answers": [{"question_id": "q-1", "answer": "B"}]}))
                .expect("request should deserialize");

        assert_eq!(request.time_taken, 0);
        assert_eq!(request.answers.len(), 1);
    }
}
