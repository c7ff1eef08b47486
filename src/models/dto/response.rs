use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::domain::{ExamDefinition, Question};
use crate::models::dto::batch::QuestionBatch;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, message: &str) -> Self {
        Self {
            data,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptCreated {
    pub attempt_id: String,
    pub resumed: bool,
    /// Absent when nothing is left to answer.
    pub batch: Option<QuestionBatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    pub attempt_id: String,
    pub question_id: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejoinder: Option<String>,
    /// Why the value was rejected, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FinishOutcome {
    Remaining {
        batch: QuestionBatch,
    },
    Completed {
        completed_at: DateTime<Utc>,
        score: Option<Decimal>,
        passed: Option<bool>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionSummary {
    pub id: String,
    pub name: String,
    pub prompt: String,
}

impl From<&Question> for QuestionSummary {
    fn from(question: &Question) -> Self {
        QuestionSummary {
            id: question.id.clone(),
            name: question.name.clone(),
            prompt: question.prompt.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptResults {
    pub attempt_id: String,
    pub score: Option<Decimal>,
    pub passed: Option<bool>,
    pub missed_questions: Vec<QuestionSummary>,
    pub invalid_questions: Vec<QuestionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamSummary {
    pub id: String,
    pub name: String,
    pub title: Option<String>,
    pub passing_score: Option<Decimal>,
    pub section_count: usize,
    pub question_count: usize,
}

impl From<&ExamDefinition> for ExamSummary {
    fn from(exam: &ExamDefinition) -> Self {
        ExamSummary {
            id: exam.id.clone(),
            name: exam.name.clone(),
            title: exam.title.clone(),
            passing_score: exam.passing_score,
            section_count: exam.sections.len(),
            question_count: exam.questions().count(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub offset: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_outcome_is_tagged_by_status() {
        let outcome = FinishOutcome::Completed {
            completed_at: Utc::now(),
            score: Some(Decimal::new(7500, 2)),
            passed: Some(true),
        };
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["status"], "completed");
        assert_eq!(json["score"], "75.00");
    }

    #[test]
    fn test_submission_outcome_omits_absent_fields() {
        let outcome = SubmissionOutcome {
            attempt_id: "a".to_string(),
            question_id: "q".to_string(),
            valid: true,
            rejoinder: None,
            error: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();

        assert!(json.get("rejoinder").is_none());
        assert!(json.get("error").is_none());
    }
}
