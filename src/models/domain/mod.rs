pub mod attempt_answer;
pub mod draft;
pub mod exam;
pub mod exam_attempt;
pub mod exam_result;
pub mod question;
pub use attempt_answer::{AttemptAnswer, QuestionStatus, StatusSummary};
pub use draft::{DraftField, DraftScope};
pub use exam::Exam;
pub use exam_attempt::{AttemptEvent, AttemptPhase, ExamAttempt};
pub use exam_result::{ExamResult, QuestionOutcome, ResultStatus, SectionAnalysis, Verdict};
pub use question::{AnswerValue, Question, QuestionType};
