use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::domain::ExamDefinition;
use crate::services::traversal::SurfacedQuestion;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreCard {
    pub score: Option<Decimal>,
    pub passed: Option<bool>,
    pub correct: usize,
    pub scorable: usize,
}

pub struct ScoringEngine;

impl ScoringEngine {
    /// Scores the questions surfaced for an attempt. Only scorable questions
    /// count toward the denominator; only responses marked correct count
    /// toward the numerator.
    pub fn score(exam: &ExamDefinition, surfaced: &[SurfacedQuestion<'_>]) -> ScoreCard {
        let mut correct = 0;
        let mut scorable = 0;

        for item in surfaced.iter().filter(|s| s.question.is_scorable()) {
            scorable += 1;
            if item.response.and_then(|r| r.correct) == Some(true) {
                correct += 1;
            }
        }

        let score = Self::percentage(correct, scorable);
        let passed = match (score, exam.passing_score) {
            (Some(score), Some(threshold)) => Some(score >= threshold),
            _ => None,
        };

        ScoreCard {
            score,
            passed,
            correct,
            scorable,
        }
    }

    /// `100 * correct / scorable` to two places, rounded away from zero.
    /// Undefined when nothing was scorable.
    pub fn percentage(correct: usize, scorable: usize) -> Option<Decimal> {
        if scorable == 0 {
            return None;
        }
        let raw = Decimal::from(correct as u64) * Decimal::ONE_HUNDRED / Decimal::from(scorable as u64);
        let mut rounded = raw.round_dp_with_strategy(2, RoundingStrategy::AwayFromZero);
        rounded.rescale(2);
        Some(rounded)
    }
}
