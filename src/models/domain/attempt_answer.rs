use serde::{Deserialize, Serialize};

use crate::models::domain::question::AnswerValue;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AttemptAnswer {
    pub question_id: String,
    #[serde(default)]
    pub answer: Option<AnswerValue>,
    #[serde(default)]
    pub marked_for_review: bool,
    #[serde(default)]
    pub time_taken: u64,
}

impl AttemptAnswer {
    pub fn new(question_id: &str) -> Self {
        AttemptAnswer {
            question_id: question_id.to_string(),
            answer: None,
            marked_for_review: false,
            time_taken: 0,
        }
    }

    pub fn with_answer(mut self, answer: impl Into<AnswerValue>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    pub fn marked(mut self) -> Self {
        self.marked_for_review = true;
        self
    }

    /// An empty list does not count as an answer; any other present value does.
    pub fn has_answer(&self) -> bool {
        match &self.answer {
            None => false,
            Some(value) => !value.is_empty_choice(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionStatus {
    Unanswered,
    Answered,
    Marked,
    AnsweredMarked,
}

impl QuestionStatus {
    pub fn derive(entry: Option<&AttemptAnswer>) -> Self {
        let Some(entry) = entry else {
            return QuestionStatus::Unanswered;
        };

        match (entry.has_answer(), entry.marked_for_review) {
            (true, true) => QuestionStatus::AnsweredMarked,
            (true, false) => QuestionStatus::Answered,
            (false, true) => QuestionStatus::Marked,
            (false, false) => QuestionStatus::Unanswered,
        }
    }
}

/// Per-status counts across an exam's question set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub unanswered: usize,
    pub answered: usize,
    pub marked: usize,
    pub answered_marked: usize,
}

impl StatusSummary {
    pub fn record(&mut self, status: QuestionStatus) {
        match status {
            QuestionStatus::Unanswered => self.unanswered += 1,
            QuestionStatus::Answered => self.answered += 1,
            QuestionStatus::Marked => self.marked += 1,
            QuestionStatus::AnsweredMarked => self.answered_marked += 1,
        }
    }
}
