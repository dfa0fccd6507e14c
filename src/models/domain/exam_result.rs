use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ExamResult {
    pub exam_id: String,
    pub score: f64,
    pub total_marks: f64,
    pub percentage: f64,
    pub correct_answers: usize,
    pub wrong_answers: usize,
    pub unattempted: usize,
    pub time_taken: u64,
    pub section_wise_analysis: Vec<SectionAnalysis>,
    pub question_results: Vec<QuestionOutcome>,
    pub status: ResultStatus,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SectionAnalysis {
    pub section_id: String,
    pub score: f64,
    pub total_marks: f64,
    pub correct: usize,
    pub wrong: usize,
    pub unattempted: usize,
    pub accuracy: f64,
    pub time_taken: u64,
}

impl SectionAnalysis {
    pub fn new(section_id: &str) -> Self {
        SectionAnalysis {
            section_id: section_id.to_string(),
            score: 0.0,
            total_marks: 0.0,
            correct: 0,
            wrong: 0,
            unattempted: 0,
            accuracy: 0.0,
            time_taken: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct QuestionOutcome {
    pub question_id: String,
    pub section_id: String,
    pub verdict: Verdict,
    pub marks_awarded: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Wrong,
    Unattempted,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Pass,
    Fail,
}

impl ExamResult {
    pub fn passed(&self) -> bool {
        self.status == ResultStatus::Pass
    }

    pub fn section(&self, section_id: &str) -> Option<&SectionAnalysis> {
        self.section_wise_analysis
            .iter()
            .find(|section| section.section_id == section_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ResultStatus::Pass).expect("serialize"),
            "\"pass\""
        );
        assert_eq!(
            serde_json::to_string(&Verdict::Unattempted).expect("serialize"),
            "\"unattempted\""
        );
    }

    #[test]
    fn section_lookup_by_id() {
        let result = ExamResult {
            exam_id: "exam-1".to_string(),
            score: 0.0,
            total_marks: 4.0,
            percentage: 0.0,
            correct_answers: 0,
            wrong_answers: 0,
            unattempted: 1,
            time_taken: 0,
            section_wise_analysis: vec![SectionAnalysis::new("quant")],
            question_results: vec![],
            status: ResultStatus::Fail,
        };

        assert!(result.section("quant").is_some());
        assert!(result.section("english").is_none());
        assert!(!result.passed());
    }
}
