use crate::models::domain::{Answer, Question, Response, ResponseValue};
use crate::services::response_codec::ResponseCodec;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assessment {
    /// `None` when the question carries no explicit correctness flags.
    pub correct: Option<bool>,
    pub matched_answer_ids: Vec<String>,
}

pub struct CorrectnessChecker;

impl CorrectnessChecker {
    /// Matches a value against every answer of the question.
    ///
    /// Matched answers contribute their own flag. For choice questions an
    /// unselected answer flagged correct contributes nothing, so a response
    /// is correct once it selects at least `min_selections` (default 1)
    /// correct answers and no incorrect one.
    pub fn assess(question: &Question, value: Option<&ResponseValue>) -> Assessment {
        let matched: Vec<&Answer> = match value {
            Some(value) => question
                .answers
                .iter()
                .filter(|answer| ResponseCodec::matches(question.question_type, value, answer))
                .collect(),
            None => Vec::new(),
        };
        let matched_answer_ids = matched.iter().map(|a| a.id.clone()).collect();

        if !question.is_scorable() {
            return Assessment {
                correct: None,
                matched_answer_ids,
            };
        }

        let any_incorrect = matched.iter().any(|a| a.correct == Some(false));
        let hits = matched.iter().filter(|a| a.correct == Some(true)).count();

        let correct = if any_incorrect {
            false
        } else if question.question_type.is_choice() {
            let needed = question.constraints.min_selections.unwrap_or(1).max(1);
            hits >= needed
        } else {
            hits > 0
        };

        Assessment {
            correct: Some(correct),
            matched_answer_ids,
        }
    }

    /// Records correctness and matched answers on a validated response.
    /// Invalid responses keep correctness undetermined and match nothing.
    pub fn apply(question: &Question, response: &mut Response) {
        if !response.is_valid() {
            response.correct = None;
            response.matched_answer_ids.clear();
            return;
        }
        let assessment = Self::assess(question, response.value.as_ref());
        response.correct = assessment.correct;
        response.matched_answer_ids = assessment.matched_answer_ids;
    }
}
