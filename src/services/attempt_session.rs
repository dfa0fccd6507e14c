use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{
    errors::AppResult,
    models::domain::{AnswerValue, AttemptAnswer, AttemptPhase, Exam, ExamAttempt, ExamResult, Question},
    services::{autosave_service::AutosaveEngine, scoring_service::ScoringService},
};

pub const ANSWER_FIELD_PREFIX: &str = "answers.";
pub const PROGRESS_FIELD: &str = "progress";

pub fn answer_field(question_id: &str) -> String {
    format!("{}{}", ANSWER_FIELD_PREFIX, question_id)
}

/// Draft payload stored under [`PROGRESS_FIELD`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttemptProgress {
    pub current_question_index: usize,
    pub time_remaining_seconds: u64,
}

/// A running attempt whose every change is mirrored into its draft.
pub struct AttemptSession {
    attempt: ExamAttempt,
    autosave: AutosaveEngine,
}

impl AttemptSession {
    /// Loads the exam and its questions and starts the clock.
    pub fn start(exam: Exam, questions: Vec<Question>, autosave: AutosaveEngine) -> AppResult<Self> {
        let mut attempt = ExamAttempt::new();
        attempt.load_exam(exam);
        attempt.load_questions(questions);
        attempt.start()?;

        Ok(Self { attempt, autosave })
    }

    pub fn attempt(&self) -> &ExamAttempt {
        &self.attempt
    }

    pub fn autosave(&self) -> &AutosaveEngine {
        &self.autosave
    }

    pub fn set_answer(&mut self, question_id: &str, value: Option<AnswerValue>) -> bool {
        let applied = self.attempt.set_answer(question_id, value);
        if applied {
            self.save_answer(question_id);
        }
        applied
    }

    pub fn toggle_mark_for_review(&mut self, question_id: &str) -> bool {
        let applied = self.attempt.toggle_mark_for_review(question_id);
        if applied {
            self.save_answer(question_id);
        }
        applied
    }

    pub fn go_to_question(&mut self, index: usize) -> bool {
        let moved = self.attempt.go_to_question(index);
        if moved {
            self.save_progress();
        }
        moved
    }

    pub fn next_question(&mut self) -> bool {
        let moved = self.attempt.next_question();
        if moved {
            self.save_progress();
        }
        moved
    }

    pub fn previous_question(&mut self) -> bool {
        let moved = self.attempt.previous_question();
        if moved {
            self.save_progress();
        }
        moved
    }

    pub fn go_to_section(&mut self, section_id: &str) -> bool {
        let moved = self.attempt.go_to_section(section_id);
        if moved {
            self.save_progress();
        }
        moved
    }

    /// Advances the clock and saves the time spent on the current question.
    /// Returns `true` once time is up.
    pub fn tick(&mut self, elapsed_seconds: u64) -> bool {
        if self.attempt.phase() != AttemptPhase::InProgress {
            return false;
        }

        let expired = self.attempt.tick(elapsed_seconds);
        if let Some(question_id) = self.attempt.current_question().map(|q| q.id.clone()) {
            self.save_answer(&question_id);
        }
        self.save_progress();
        expired
    }

    /// Reinstates answers and progress from the persisted draft.
    /// Returns how many answers were restored.
    pub async fn resume(&mut self) -> usize {
        let fields = self.autosave.load_draft_fields().await;
        let mut restored = 0;

        for field in fields {
            if field.field_path == PROGRESS_FIELD {
                match serde_json::from_value::<AttemptProgress>(field.data) {
                    Ok(progress) => self.attempt.restore_progress(
                        progress.current_question_index,
                        progress.time_remaining_seconds,
                    ),
                    Err(err) => log::warn!("Skipping malformed progress draft: {}", err),
                }
            } else if let Some(question_id) = field.field_path.strip_prefix(ANSWER_FIELD_PREFIX) {
                match serde_json::from_value::<AttemptAnswer>(field.data) {
                    Ok(answer) if answer.question_id == question_id => {
                        if self.attempt.restore_answer(answer) {
                            restored += 1;
                        }
                    }
                    Ok(answer) => log::warn!(
                        "Skipping draft field '{}' holding an answer for '{}'",
                        field.field_path,
                        answer.question_id
                    ),
                    Err(err) => {
                        log::warn!("Skipping malformed draft field '{}': {}", field.field_path, err)
                    }
                }
            } else {
                log::debug!("Ignoring unrelated draft field '{}'", field.field_path);
            }
        }

        log::info!(
            "Resumed draft '{}' with {} answers",
            self.autosave.scope().draft_key,
            restored
        );
        restored
    }

    /// Flushes pending saves, submits, scores and clears the draft.
    /// `None` when the attempt is not in progress.
    pub async fn submit(&mut self) -> Option<ExamResult> {
        if self.attempt.phase() != AttemptPhase::InProgress {
            log::warn!("Ignoring submit: attempt is {:?}", self.attempt.phase());
            return None;
        }

        self.autosave.flush().await;
        self.attempt.submit();

        let exam = self.attempt.exam()?;
        let result = ScoringService::calculate_result(
            &exam.id,
            self.attempt.questions(),
            &self.attempt.answers(),
            self.attempt.time_taken(),
            exam.pass_percentage,
        );

        self.autosave.clear_draft().await;
        Some(result)
    }

    fn save_answer(&self, question_id: &str) {
        let Some(answer) = self.attempt.answer(question_id) else {
            return;
        };
        self.save(answer_field(question_id), serde_json::to_value(answer));
    }

    fn save_progress(&self) {
        let progress = AttemptProgress {
            current_question_index: self.attempt.current_question_index(),
            time_remaining_seconds: self.attempt.time_remaining_seconds(),
        };
        self.save(PROGRESS_FIELD.to_string(), serde_json::to_value(progress));
    }

    fn save(&self, field_path: String, data: serde_json::Result<JsonValue>) {
        match data {
            Ok(data) => self.autosave.save_field(field_path, data),
            Err(err) => log::error!("Failed to serialize draft field '{}': {}", field_path, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{DraftField, DraftScope, QuestionStatus, ResultStatus};
    use crate::services::autosave_service::AutosaveOptions;
    use crate::test_utils::fixtures::{sample_exam, sample_questions};
    use crate::test_utils::test_helpers::RecordingDraftRepository;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    fn scope() -> DraftScope {
        DraftScope::for_exam("attempt-1", "exam-1")
    }

    fn session(repo: &Arc<RecordingDraftRepository>) -> AttemptSession {
        let autosave = AutosaveEngine::new(repo.clone(), AutosaveOptions::new(scope()));
        AttemptSession::start(sample_exam(), sample_questions(), autosave)
            .expect("session should start")
    }

    #[tokio::test(start_paused = true)]
    async fn answers_are_saved_under_their_field_path() {
        let repo = Arc::new(RecordingDraftRepository::new());
        let mut session = session(&repo);

        assert!(session.set_answer("q-1", Some(AnswerValue::from("A"))));
        assert!(session.set_answer("q-1", Some(AnswerValue::from("B"))));
        assert!(session.toggle_mark_for_review("q-1"));
        sleep(Duration::from_millis(1100)).await;

        let writes = repo.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "answers.q-1");
        assert_eq!(
            writes[0].1,
            json!({"question_id": "q-1", "answer": "B", "marked_for_review": true, "time_taken": 0})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_saves_progress() {
        let repo = Arc::new(RecordingDraftRepository::new());
        let mut session = session(&repo);

        assert!(session.go_to_section("reasoning"));
        assert!(session.next_question());
        assert!(!session.next_question());
        sleep(Duration::from_millis(1100)).await;

        assert_eq!(
            repo.writes(),
            vec![(
                "progress".to_string(),
                json!({"current_question_index": 3, "time_remaining_seconds": 1800})
            )]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn tick_saves_time_on_current_question() {
        let repo = Arc::new(RecordingDraftRepository::new());
        let mut session = session(&repo);

        assert!(!session.tick(30));
        sleep(Duration::from_millis(1100)).await;

        let stored = repo.stored();
        let answer = stored
            .iter()
            .find(|f| f.field_path == "answers.q-1")
            .expect("current question saved");
        assert_eq!(answer.data["time_taken"], json!(30));
        assert!(stored.iter().any(|f| f.field_path == "progress"));
    }

    #[tokio::test]
    async fn resume_restores_answers_and_progress() {
        let repo = Arc::new(RecordingDraftRepository::new());
        let scope = scope();
        repo.seed(DraftField::new(
            &scope,
            "answers.q-2",
            json!({"question_id": "q-2", "answer": ["A", "C"], "marked_for_review": true}),
        ));
        repo.seed(DraftField::new(
            &scope,
            "answers.q-3",
            json!({"question_id": "q-3", "answer": 12.0, "time_taken": 40}),
        ));
        repo.seed(DraftField::new(&scope, "answers.q-4", json!("not an answer")));
        repo.seed(DraftField::new(
            &scope,
            "progress",
            json!({"current_question_index": 2, "time_remaining_seconds": 1200}),
        ));
        let mut session = session(&repo);

        let restored = session.resume().await;

        assert_eq!(restored, 2);
        let attempt = session.attempt();
        assert_eq!(attempt.question_status("q-2"), QuestionStatus::AnsweredMarked);
        assert_eq!(attempt.question_status("q-3"), QuestionStatus::Answered);
        assert_eq!(attempt.question_status("q-4"), QuestionStatus::Unanswered);
        assert_eq!(attempt.current_question_index(), 2);
        assert_eq!(attempt.current_section_id(), Some("reasoning"));
        assert_eq!(attempt.time_remaining_seconds(), 1200);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_flushes_scores_and_clears_the_draft() {
        let repo = Arc::new(RecordingDraftRepository::new());
        let mut session = session(&repo);
        session.set_answer("q-1", Some(AnswerValue::from("B")));
        session.set_answer("q-4", Some(AnswerValue::from("false")));
        session.tick(300);

        let result = session.submit().await.expect("attempt was in progress");

        // Pending answers reached the backend before the draft was cleared.
        let written: Vec<String> = repo.writes().into_iter().map(|(path, _)| path).collect();
        assert!(written.contains(&"answers.q-4".to_string()));
        assert!(repo.stored().is_empty());

        assert_eq!(result.exam_id, "exam-1");
        assert_eq!(result.correct_answers, 1);
        assert_eq!(result.wrong_answers, 1);
        assert_eq!(result.unattempted, 2);
        assert_eq!(result.score, 3.5);
        assert_eq!(result.time_taken, 300);
        assert_eq!(result.status, ResultStatus::Fail);
        assert!(session.attempt().is_submitted());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_waits_for_a_save_already_on_the_wire() {
        let repo = Arc::new(RecordingDraftRepository::gated());
        let mut session = session(&repo);
        session.set_answer("q-1", Some(AnswerValue::from("B")));

        // The debounce has fired and the upsert is held by the backend.
        sleep(Duration::from_millis(1001)).await;
        assert_eq!(repo.writes().len(), 1);
        assert!(session.autosave().pending_fields().is_empty());

        let gate = Arc::clone(&repo);
        let release = tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            gate.release(1);
        });

        let result = session.submit().await.expect("attempt was in progress");
        release.await.unwrap();
        sleep(Duration::from_millis(5000)).await;

        // The late upsert landed before the clear, so nothing of the attempt survives.
        assert!(repo.stored().is_empty());
        assert_eq!(result.correct_answers, 1);
    }

    #[tokio::test]
    async fn submit_twice_returns_nothing() {
        let repo = Arc::new(RecordingDraftRepository::new());
        let mut session = session(&repo);

        assert!(session.submit().await.is_some());
        assert!(session.submit().await.is_none());
    }
}
