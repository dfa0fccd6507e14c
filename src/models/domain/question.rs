use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub exam_id: String,
    pub section_id: String,
    pub question_type: QuestionType,
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: AnswerValue,
    pub marks: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_marks: Option<f64>,
    #[serde(default)]
    pub order: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Single,    // One option is correct
    Multiple,  // Exact set of options, order-independent
    TrueFalse, // Strict equality like single
    Numerical, // Compared after numeric coercion
}

/// An answer payload as it travels over the wire: a number, a string or a list of strings.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
    Choices(Vec<String>),
}

impl AnswerValue {
    pub fn is_empty_choice(&self) -> bool {
        matches!(self, AnswerValue::Choices(choices) if choices.is_empty())
    }

    /// Numeric view of the value. Blank text and lists never coerce.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(n) => Some(*n),
            AnswerValue::Text(text) => text.trim().parse().ok(),
            AnswerValue::Choices(_) => None,
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        AnswerValue::Number(value)
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(value: Vec<&str>) -> Self {
        AnswerValue::Choices(value.into_iter().map(str::to_string).collect())
    }
}

impl Question {
    pub fn new(
        id: &str,
        section_id: &str,
        question_type: QuestionType,
        correct_answer: AnswerValue,
        marks: f64,
    ) -> Self {
        Question {
            id: id.to_string(),
            exam_id: String::new(),
            section_id: section_id.to_string(),
            question_type,
            text: String::new(),
            options: Vec::new(),
            correct_answer,
            marks,
            negative_marks: None,
            order: 0,
        }
    }

    pub fn with_negative_marks(mut self, negative_marks: f64) -> Self {
        self.negative_marks = Some(negative_marks);
        self
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }
}
