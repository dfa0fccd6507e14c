//! In-memory model of one exam attempt.
//!
//! The attempt moves `NotStarted -> InProgress -> Submitted`; `reset` returns it to
//! `NotStarted` from anywhere. Every applied change is announced to subscribers as an
//! [`AttemptEvent`] so a UI layer can re-render without the model knowing about it.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{
        attempt_answer::{AttemptAnswer, QuestionStatus, StatusSummary},
        exam::Exam,
        question::{AnswerValue, Question},
    },
};

#[derive(Clone, Debug, PartialEq, Eq, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPhase {
    NotStarted,
    InProgress,
    Submitted,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AttemptEvent {
    ExamLoaded { exam_id: String },
    QuestionsLoaded { count: usize },
    Started { time_remaining_seconds: u64 },
    AnswerChanged { question_id: String },
    ReviewToggled { question_id: String, marked: bool },
    Navigated { index: usize },
    TimerTicked { time_remaining_seconds: u64 },
    Submitted,
    Reset,
}

pub type AttemptListener = Box<dyn Fn(&AttemptEvent) + Send + Sync>;

pub struct ExamAttempt {
    exam: Option<Exam>,
    questions: Vec<Question>,
    answers: HashMap<String, AttemptAnswer>,
    current_question_index: usize,
    current_section_id: Option<String>,
    time_remaining_seconds: u64,
    started: bool,
    submitted: bool,
    listeners: Vec<AttemptListener>,
}

impl Default for ExamAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExamAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamAttempt")
            .field("exam", &self.exam.as_ref().map(|e| &e.id))
            .field("questions", &self.questions.len())
            .field("answers", &self.answers.len())
            .field("current_question_index", &self.current_question_index)
            .field("current_section_id", &self.current_section_id)
            .field("time_remaining_seconds", &self.time_remaining_seconds)
            .field("phase", &self.phase())
            .finish()
    }
}

impl ExamAttempt {
    pub fn new() -> Self {
        ExamAttempt {
            exam: None,
            questions: Vec::new(),
            answers: HashMap::new(),
            current_question_index: 0,
            current_section_id: None,
            time_remaining_seconds: 0,
            started: false,
            submitted: false,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl Fn(&AttemptEvent) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&self, event: AttemptEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }

    pub fn phase(&self) -> AttemptPhase {
        if self.submitted {
            AttemptPhase::Submitted
        } else if self.started {
            AttemptPhase::InProgress
        } else {
            AttemptPhase::NotStarted
        }
    }

    pub fn exam(&self) -> Option<&Exam> {
        self.exam.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answer(&self, question_id: &str) -> Option<&AttemptAnswer> {
        self.answers.get(question_id)
    }

    /// Answers in question order, followed by any answers for ids outside the question set.
    pub fn answers(&self) -> Vec<AttemptAnswer> {
        let mut ordered: Vec<AttemptAnswer> = self
            .questions
            .iter()
            .filter_map(|q| self.answers.get(&q.id).cloned())
            .collect();

        let mut strays: Vec<AttemptAnswer> = self
            .answers
            .values()
            .filter(|a| !self.questions.iter().any(|q| q.id == a.question_id))
            .cloned()
            .collect();
        strays.sort_by(|a, b| a.question_id.cmp(&b.question_id));

        ordered.extend(strays);
        ordered
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    pub fn current_section_id(&self) -> Option<&str> {
        self.current_section_id.as_deref()
    }

    pub fn time_remaining_seconds(&self) -> u64 {
        self.time_remaining_seconds
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Seconds spent so far, measured against the exam duration.
    pub fn time_taken(&self) -> u64 {
        match (&self.exam, self.phase()) {
            (Some(exam), AttemptPhase::InProgress | AttemptPhase::Submitted) => exam
                .duration_seconds()
                .saturating_sub(self.time_remaining_seconds),
            _ => 0,
        }
    }

    pub fn load_exam(&mut self, exam: Exam) -> bool {
        if self.phase() != AttemptPhase::NotStarted {
            log::warn!("Ignoring exam load for '{}': attempt already started", exam.id);
            return false;
        }

        let exam_id = exam.id.clone();
        self.exam = Some(exam);
        self.emit(AttemptEvent::ExamLoaded { exam_id });
        true
    }

    /// Replaces the question set wholesale.
    pub fn load_questions(&mut self, questions: Vec<Question>) -> bool {
        if self.phase() != AttemptPhase::NotStarted {
            log::warn!("Ignoring question load: attempt already started");
            return false;
        }

        self.current_question_index = 0;
        self.current_section_id = questions.first().map(|q| q.section_id.clone());
        self.questions = questions;
        self.emit(AttemptEvent::QuestionsLoaded {
            count: self.questions.len(),
        });
        true
    }

    pub fn start(&mut self) -> AppResult<()> {
        if self.phase() != AttemptPhase::NotStarted {
            return Err(AppError::InvalidTransition(format!(
                "cannot start an attempt that is {:?}",
                self.phase()
            )));
        }

        let Some(exam) = &self.exam else {
            return Err(AppError::InvalidTransition(
                "cannot start an attempt without an exam".to_string(),
            ));
        };

        self.time_remaining_seconds = exam.duration_seconds();
        self.submitted = false;
        self.started = true;

        log::info!(
            "Attempt started for exam '{}' with {} questions",
            exam.id,
            self.questions.len()
        );
        self.emit(AttemptEvent::Started {
            time_remaining_seconds: self.time_remaining_seconds,
        });
        Ok(())
    }

    /// Upserts the answer for `question_id`, keeping its review flag and time. `None` clears it.
    pub fn set_answer(&mut self, question_id: &str, value: Option<AnswerValue>) -> bool {
        if !self.accepts_answers("set_answer") {
            return false;
        }

        self.entry(question_id).answer = value;
        self.emit(AttemptEvent::AnswerChanged {
            question_id: question_id.to_string(),
        });
        true
    }

    pub fn toggle_mark_for_review(&mut self, question_id: &str) -> bool {
        if !self.accepts_answers("toggle_mark_for_review") {
            return false;
        }

        let entry = self.entry(question_id);
        entry.marked_for_review = !entry.marked_for_review;
        let marked = entry.marked_for_review;

        self.emit(AttemptEvent::ReviewToggled {
            question_id: question_id.to_string(),
            marked,
        });
        true
    }

    pub fn go_to_question(&mut self, index: usize) -> bool {
        let Some(question) = self.questions.get(index) else {
            return false;
        };

        self.current_section_id = Some(question.section_id.clone());
        self.current_question_index = index;
        self.emit(AttemptEvent::Navigated { index });
        true
    }

    pub fn next_question(&mut self) -> bool {
        self.go_to_question(self.current_question_index + 1)
    }

    pub fn previous_question(&mut self) -> bool {
        match self.current_question_index.checked_sub(1) {
            Some(index) => self.go_to_question(index),
            None => false,
        }
    }

    /// Jumps to the first question of `section_id`.
    pub fn go_to_section(&mut self, section_id: &str) -> bool {
        match self.questions.iter().position(|q| q.section_id == section_id) {
            Some(index) => self.go_to_question(index),
            None => false,
        }
    }

    /// Advances the attempt clock. Returns `true` once no time remains.
    pub fn tick(&mut self, elapsed_seconds: u64) -> bool {
        if self.phase() != AttemptPhase::InProgress {
            return false;
        }

        let elapsed = elapsed_seconds.min(self.time_remaining_seconds);
        self.time_remaining_seconds -= elapsed;

        if let Some(question_id) = self.current_question().map(|q| q.id.clone()) {
            self.entry(&question_id).time_taken += elapsed;
        }

        self.emit(AttemptEvent::TimerTicked {
            time_remaining_seconds: self.time_remaining_seconds,
        });
        self.time_remaining_seconds == 0
    }

    pub fn submit(&mut self) -> bool {
        if self.phase() != AttemptPhase::InProgress {
            log::warn!("Ignoring submit: attempt is {:?}", self.phase());
            return false;
        }

        self.submitted = true;
        self.started = false;
        log::info!(
            "Attempt submitted with {} answered questions",
            self.answers.values().filter(|a| a.has_answer()).count()
        );
        self.emit(AttemptEvent::Submitted);
        true
    }

    /// Clears everything except subscribers.
    pub fn reset(&mut self) {
        self.exam = None;
        self.questions.clear();
        self.answers.clear();
        self.current_question_index = 0;
        self.current_section_id = None;
        self.time_remaining_seconds = 0;
        self.started = false;
        self.submitted = false;
        self.emit(AttemptEvent::Reset);
    }

    pub fn question_status(&self, question_id: &str) -> QuestionStatus {
        QuestionStatus::derive(self.answers.get(question_id))
    }

    pub fn status_summary(&self) -> StatusSummary {
        let mut summary = StatusSummary::default();
        for question in &self.questions {
            summary.record(self.question_status(&question.id));
        }
        summary
    }

    /// Reinstates a persisted answer, replacing any in-memory entry for the same question.
    pub fn restore_answer(&mut self, answer: AttemptAnswer) -> bool {
        if self.phase() == AttemptPhase::Submitted {
            return false;
        }

        let question_id = answer.question_id.clone();
        self.answers.insert(question_id.clone(), answer);
        self.emit(AttemptEvent::AnswerChanged { question_id });
        true
    }

    pub fn restore_progress(&mut self, index: usize, time_remaining_seconds: u64) {
        if self.phase() != AttemptPhase::InProgress {
            return;
        }

        self.go_to_question(index);
        if let Some(exam) = &self.exam {
            self.time_remaining_seconds = time_remaining_seconds.min(exam.duration_seconds());
        }
    }

    fn accepts_answers(&self, operation: &str) -> bool {
        if self.phase() == AttemptPhase::NotStarted {
            log::warn!("Ignoring {}: attempt has not started", operation);
            return false;
        }
        true
    }

    fn entry(&mut self, question_id: &str) -> &mut AttemptAnswer {
        self.answers
            .entry(question_id.to_string())
            .or_insert_with(|| AttemptAnswer::new(question_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{sample_exam, sample_questions};
    use std::sync::{Arc, Mutex};

    fn started_attempt() -> ExamAttempt {
        let mut attempt = ExamAttempt::new();
        attempt.load_exam(sample_exam());
        attempt.load_questions(sample_questions());
        attempt.start().expect("attempt should start");
        attempt
    }

    #[test]
    fn start_requires_exam() {
        let mut attempt = ExamAttempt::new();
        attempt.load_questions(sample_questions());

        let result = attempt.start();

        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
        assert_eq!(attempt.phase(), AttemptPhase::NotStarted);
    }

    #[test]
    fn start_sets_timer_from_exam_duration() {
        let attempt = started_attempt();

        assert_eq!(attempt.phase(), AttemptPhase::InProgress);
        assert_eq!(attempt.time_remaining_seconds(), 30 * 60);
        assert!(!attempt.is_submitted());
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut attempt = started_attempt();

        assert!(attempt.start().is_err());
    }

    #[test]
    fn answers_before_start_are_ignored() {
        let mut attempt = ExamAttempt::new();
        attempt.load_exam(sample_exam());

        assert!(!attempt.set_answer("q-1", Some(AnswerValue::from("B"))));
        assert!(!attempt.toggle_mark_for_review("q-1"));
        assert!(attempt.answer("q-1").is_none());
    }

    #[test]
    fn set_answer_preserves_review_flag_and_time() {
        let mut attempt = started_attempt();
        attempt.toggle_mark_for_review("q-1");
        attempt.tick(15);

        attempt.set_answer("q-1", Some(AnswerValue::from("B")));

        let entry = attempt.answer("q-1").expect("entry exists");
        assert!(entry.marked_for_review);
        assert_eq!(entry.time_taken, 15);
        assert_eq!(entry.answer, Some(AnswerValue::from("B")));
        assert_eq!(attempt.question_status("q-1"), QuestionStatus::AnsweredMarked);
    }

    #[test]
    fn clearing_an_answer_keeps_the_entry() {
        let mut attempt = started_attempt();
        attempt.set_answer("q-1", Some(AnswerValue::from("B")));

        attempt.set_answer("q-1", None);

        assert!(attempt.answer("q-1").is_some());
        assert_eq!(attempt.question_status("q-1"), QuestionStatus::Unanswered);
    }

    #[test]
    fn toggle_creates_entry_then_flips() {
        let mut attempt = started_attempt();

        attempt.toggle_mark_for_review("q-2");
        assert_eq!(attempt.question_status("q-2"), QuestionStatus::Marked);
        assert_eq!(attempt.answer("q-2").and_then(|a| a.answer.clone()), None);

        attempt.toggle_mark_for_review("q-2");
        assert_eq!(attempt.question_status("q-2"), QuestionStatus::Unanswered);
    }

    #[test]
    fn submit_moves_to_submitted_without_hard_blocking_edits() {
        let mut attempt = started_attempt();

        assert!(attempt.submit());
        assert_eq!(attempt.phase(), AttemptPhase::Submitted);
        assert!(!attempt.is_started());

        // Edits after submit still land; the owner is expected to stop issuing them.
        assert!(attempt.set_answer("q-1", Some(AnswerValue::from("A"))));
        assert!(!attempt.submit());
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut attempt = started_attempt();
        attempt.set_answer("q-1", Some(AnswerValue::from("B")));
        attempt.go_to_question(2);
        attempt.submit();

        attempt.reset();

        assert_eq!(attempt.phase(), AttemptPhase::NotStarted);
        assert!(attempt.exam().is_none());
        assert!(attempt.questions().is_empty());
        assert!(attempt.answers().is_empty());
        assert_eq!(attempt.current_question_index(), 0);
        assert_eq!(attempt.current_section_id(), None);
        assert_eq!(attempt.time_remaining_seconds(), 0);
    }

    #[test]
    fn load_is_ignored_once_started() {
        let mut attempt = started_attempt();

        assert!(!attempt.load_questions(vec![]));
        assert_eq!(attempt.questions().len(), sample_questions().len());
    }

    #[test]
    fn navigation_tracks_section() {
        let mut attempt = started_attempt();
        assert_eq!(attempt.current_section_id(), Some("quant"));

        assert!(attempt.go_to_section("reasoning"));
        let index = attempt.current_question_index();
        assert_eq!(attempt.questions()[index].section_id, "reasoning");
        assert_eq!(attempt.current_section_id(), Some("reasoning"));

        assert!(attempt.previous_question());
        assert_eq!(attempt.current_question_index(), index - 1);
        assert!(!attempt.go_to_question(99));
        assert!(!attempt.go_to_section("english"));
    }

    #[test]
    fn next_question_stops_at_the_end() {
        let mut attempt = started_attempt();
        let last = attempt.questions().len() - 1;
        attempt.go_to_question(last);

        assert!(!attempt.next_question());
        assert_eq!(attempt.current_question_index(), last);
    }

    #[test]
    fn tick_saturates_and_reports_expiry() {
        let mut attempt = started_attempt();

        assert!(!attempt.tick(60));
        assert_eq!(attempt.time_remaining_seconds(), 29 * 60);
        assert_eq!(attempt.time_taken(), 60);

        assert!(attempt.tick(10_000));
        assert_eq!(attempt.time_remaining_seconds(), 0);
        assert_eq!(attempt.answer("q-1").map(|a| a.time_taken), Some(30 * 60));
    }

    #[test]
    fn status_summary_covers_question_set() {
        let mut attempt = started_attempt();
        attempt.set_answer("q-1", Some(AnswerValue::from("B")));
        attempt.toggle_mark_for_review("q-2");

        let summary = attempt.status_summary();

        assert_eq!(summary.answered, 1);
        assert_eq!(summary.marked, 1);
        assert_eq!(summary.unanswered, sample_questions().len() - 2);
    }

    #[test]
    fn answers_follow_question_order() {
        let mut attempt = started_attempt();
        attempt.set_answer("q-3", Some(AnswerValue::Number(12.0)));
        attempt.set_answer("q-1", Some(AnswerValue::from("B")));

        let ids: Vec<String> = attempt.answers().into_iter().map(|a| a.question_id).collect();

        assert_eq!(ids, vec!["q-1".to_string(), "q-3".to_string()]);
    }

    #[test]
    fn subscribers_see_applied_transitions() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let mut attempt = ExamAttempt::new();
        attempt.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        attempt.load_exam(sample_exam());
        attempt.set_answer("q-1", Some(AnswerValue::from("B")));
        attempt.start().unwrap();
        attempt.set_answer("q-1", Some(AnswerValue::from("B")));
        attempt.submit();

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                AttemptEvent::ExamLoaded {
                    exam_id: "exam-1".to_string()
                },
                AttemptEvent::Started {
                    time_remaining_seconds: 1800
                },
                AttemptEvent::AnswerChanged {
                    question_id: "q-1".to_string()
                },
                AttemptEvent::Submitted,
            ]
        );
    }

    #[test]
    fn restore_answer_replaces_entry() {
        let mut attempt = started_attempt();
        attempt.set_answer("q-1", Some(AnswerValue::from("A")));

        attempt.restore_answer(AttemptAnswer::new("q-1").with_answer("C").marked());

        assert_eq!(attempt.question_status("q-1"), QuestionStatus::AnsweredMarked);
        assert_eq!(
            attempt.answer("q-1").and_then(|a| a.answer.clone()),
            Some(AnswerValue::from("C"))
        );
    }

    #[test]
    fn restore_progress_clamps_time() {
        let mut attempt = started_attempt();

        attempt.restore_progress(2, 99_999);

        assert_eq!(attempt.current_question_index(), 2);
        assert_eq!(attempt.time_remaining_seconds(), 1800);
    }
}
