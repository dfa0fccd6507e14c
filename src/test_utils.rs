#[cfg(test)]
pub mod fixtures {
    use crate::models::domain::{AnswerValue, AttemptAnswer, Exam, Question, QuestionType};

    /// A 30 minute exam with a 40% pass mark.
    pub fn sample_exam() -> Exam {
        Exam::new("exam-1", "Bharat Mock SSC Practice", 30, 40.0)
    }

    /// Four questions over two sections, one of each question type.
    pub fn sample_questions() -> Vec<Question> {
        vec![
            Question::new("q-1", "quant", QuestionType::Single, AnswerValue::from("B"), 4.0)
                .with_options(&["A", "B", "C", "D"])
                .with_negative_marks(1.0),
            Question::new(
                "q-2",
                "quant",
                QuestionType::Multiple,
                AnswerValue::from(vec!["A", "C"]),
                4.0,
            )
            .with_options(&["A", "B", "C", "D"])
            .with_negative_marks(1.0),
            Question::new(
                "q-3",
                "reasoning",
                QuestionType::Numerical,
                AnswerValue::Number(12.0),
                2.0,
            ),
            Question::new(
                "q-4",
                "reasoning",
                QuestionType::TrueFalse,
                AnswerValue::from("true"),
                2.0,
            )
            .with_options(&["true", "false"])
            .with_negative_marks(0.5),
        ]
    }

    pub fn answered(question_id: &str, value: impl Into<AnswerValue>, time_taken: u64) -> AttemptAnswer {
        let mut answer = AttemptAnswer::new(question_id).with_answer(value);
        answer.time_taken = time_taken;
        answer
    }
}

#[cfg(test)]
pub mod test_helpers {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value as JsonValue;
    use tokio::sync::Semaphore;

    use crate::{
        errors::AppResult,
        models::domain::{DraftField, DraftScope},
        repositories::DraftRepository,
    };

    /// In-memory draft store that records every write in send order.
    ///
    /// When built with [`RecordingDraftRepository::gated`], each upsert records its payload and
    /// then waits for a permit from [`RecordingDraftRepository::release`].
    pub struct RecordingDraftRepository {
        fields: Mutex<Vec<DraftField>>,
        writes: Mutex<Vec<(String, JsonValue)>>,
        gate: Option<Semaphore>,
    }

    impl RecordingDraftRepository {
        pub fn new() -> Self {
            Self {
                fields: Mutex::new(Vec::new()),
                writes: Mutex::new(Vec::new()),
                gate: None,
            }
        }

        pub fn gated() -> Self {
            Self {
                gate: Some(Semaphore::new(0)),
                ..Self::new()
            }
        }

        pub fn release(&self, permits: usize) {
            if let Some(gate) = &self.gate {
                gate.add_permits(permits);
            }
        }

        pub fn writes(&self) -> Vec<(String, JsonValue)> {
            self.writes.lock().unwrap().clone()
        }

        pub fn stored(&self) -> Vec<DraftField> {
            self.fields.lock().unwrap().clone()
        }

        pub fn seed(&self, field: DraftField) {
            self.fields.lock().unwrap().push(field);
        }
    }

    #[async_trait]
    impl DraftRepository for RecordingDraftRepository {
        async fn upsert_field(&self, field: DraftField) -> AppResult<()> {
            self.writes
                .lock()
                .unwrap()
                .push((field.field_path.clone(), field.data.clone()));

            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }

            let mut fields = self.fields.lock().unwrap();
            fields.retain(|f| !(f.belongs_to(&field.scope()) && f.field_path == field.field_path));
            fields.push(field);
            Ok(())
        }

        async fn fetch_fields(&self, scope: &DraftScope) -> AppResult<Vec<DraftField>> {
            let fields = self.fields.lock().unwrap();
            Ok(fields.iter().filter(|f| f.belongs_to(scope)).cloned().collect())
        }

        async fn clear_draft(&self, scope: &DraftScope) -> AppResult<u64> {
            let mut fields = self.fields.lock().unwrap();
            let before = fields.len();
            fields.retain(|f| !f.belongs_to(scope));
            Ok((before - fields.len()) as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::models::domain::QuestionType;

    #[test]
    fn test_fixtures_sample_questions() {
        let questions = sample_questions();
        assert_eq!(questions.len(), 4);
        assert_eq!(questions[1].question_type, QuestionType::Multiple);
        assert_eq!(questions[2].section_id, "reasoning");
    }

    #[test]
    fn test_fixtures_sample_exam() {
        let exam = sample_exam();
        assert_eq!(exam.duration_seconds(), 1800);
        assert_eq!(exam.pass_percentage, 40.0);
    }
}
