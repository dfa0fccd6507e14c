use std::collections::HashMap;

use crate::models::domain::{
    AnswerValue, AttemptAnswer, ExamResult, Question, QuestionOutcome, QuestionType, ResultStatus,
    SectionAnalysis, Verdict,
};

pub struct ScoringService;

impl ScoringService {
    /// Score an attempt against the exam's full question list.
    ///
    /// Pure and deterministic: sections appear in the order their first question does, and
    /// per-question outcomes follow `questions`.
    pub fn calculate_result(
        exam_id: &str,
        questions: &[Question],
        answers: &[AttemptAnswer],
        time_taken: u64,
        pass_percentage: f64,
    ) -> ExamResult {
        let answer_map: HashMap<&str, &AttemptAnswer> = answers
            .iter()
            .map(|answer| (answer.question_id.as_str(), answer))
            .collect();

        let mut sections: Vec<SectionAnalysis> = Vec::new();
        let mut section_index: HashMap<&str, usize> = HashMap::new();
        let mut question_results = Vec::with_capacity(questions.len());

        let mut score = 0.0;
        let mut total_marks = 0.0;
        let mut correct_answers = 0;
        let mut wrong_answers = 0;

        for question in questions {
            let index = *section_index
                .entry(question.section_id.as_str())
                .or_insert_with(|| {
                    sections.push(SectionAnalysis::new(&question.section_id));
                    sections.len() - 1
                });
            let section = &mut sections[index];

            section.total_marks += question.marks;
            total_marks += question.marks;

            let submitted = answer_map
                .get(question.id.as_str())
                .and_then(|entry| entry.answer.as_ref().map(|value| (value, entry.time_taken)));

            let Some((value, answer_time)) = submitted else {
                section.unattempted += 1;
                question_results.push(QuestionOutcome {
                    question_id: question.id.clone(),
                    section_id: question.section_id.clone(),
                    verdict: Verdict::Unattempted,
                    marks_awarded: 0.0,
                });
                continue;
            };

            section.time_taken += answer_time;

            let (verdict, marks_awarded) = if Self::is_correct(question, value) {
                correct_answers += 1;
                section.correct += 1;
                (Verdict::Correct, question.marks)
            } else {
                wrong_answers += 1;
                section.wrong += 1;
                (Verdict::Wrong, -question.negative_marks.unwrap_or(0.0))
            };

            score += marks_awarded;
            section.score += marks_awarded;

            question_results.push(QuestionOutcome {
                question_id: question.id.clone(),
                section_id: question.section_id.clone(),
                verdict,
                marks_awarded,
            });
        }

        for section in &mut sections {
            section.score = section.score.max(0.0);
            let attempted = section.correct + section.wrong;
            section.accuracy = if attempted > 0 {
                100.0 * section.correct as f64 / attempted as f64
            } else {
                0.0
            };
        }

        let score = f64::max(score, 0.0);
        let percentage = if total_marks > 0.0 {
            100.0 * score / total_marks
        } else {
            0.0
        };

        let status = if percentage >= pass_percentage {
            ResultStatus::Pass
        } else {
            ResultStatus::Fail
        };

        log::debug!(
            "Scored exam '{}': {}/{} ({:.2}%), {}",
            exam_id,
            score,
            total_marks,
            percentage,
            if status == ResultStatus::Pass { "pass" } else { "fail" }
        );

        ExamResult {
            exam_id: exam_id.to_string(),
            score,
            total_marks,
            percentage,
            correct_answers,
            wrong_answers,
            unattempted: questions.len() - correct_answers - wrong_answers,
            time_taken,
            section_wise_analysis: sections,
            question_results,
            status,
        }
    }

    /// Type-specific equality. Shape mismatches are a wrong answer, never an error.
    fn is_correct(question: &Question, submitted: &AnswerValue) -> bool {
        match question.question_type {
            QuestionType::Multiple => match (submitted, &question.correct_answer) {
                (AnswerValue::Choices(given), AnswerValue::Choices(expected)) => {
                    let mut given = given.clone();
                    let mut expected = expected.clone();
                    given.sort();
                    expected.sort();
                    given == expected
                }
                _ => false,
            },
            QuestionType::Numerical => {
                match (submitted.as_number(), question.correct_answer.as_number()) {
                    (Some(given), Some(expected)) => given == expected,
                    _ => false,
                }
            }
            QuestionType::Single | QuestionType::TrueFalse => {
                match (submitted, &question.correct_answer) {
                    (AnswerValue::Text(given), AnswerValue::Text(expected)) => given == expected,
                    (AnswerValue::Number(given), AnswerValue::Number(expected)) => given == expected,
                    // Lists have no scalar identity.
                    _ => false,
                }
            }
        }
    }
}
