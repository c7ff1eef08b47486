use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::domain::assignment::Assignment;

/// One user's pass through an exam.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Attempt {
    pub id: String,
    pub assignment_id: String,
    pub exam_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub score: Option<Decimal>,
    pub passed: Option<bool>,
    /// Set once scoring has run, even when the score itself is undefined.
    pub scored_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl Attempt {
    pub fn new(assignment: &Assignment) -> Self {
        Attempt {
            id: Uuid::new_v4().to_string(),
            assignment_id: assignment.id.clone(),
            exam_id: assignment.exam_id.clone(),
            started_at: None,
            completed_at: None,
            score: None,
            passed: None,
            scored_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn status(&self) -> AttemptStatus {
        match (self.started_at, self.completed_at) {
            (_, Some(_)) => AttemptStatus::Completed,
            (Some(_), None) => AttemptStatus::InProgress,
            (None, None) => AttemptStatus::NotStarted,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn ensure_mutable(&self) -> AppResult<()> {
        if self.is_completed() {
            return Err(AppError::AttemptAlreadyCompleted(self.id.clone()));
        }
        Ok(())
    }

    /// Records the final score. Scoring runs at most once per attempt.
    pub fn record_score(&mut self, score: Option<Decimal>, passed: Option<bool>) -> AppResult<()> {
        if self.scored_at.is_some() {
            return Err(AppError::ScoreAlreadyComputed(self.id.clone()));
        }
        self.score = score;
        self.passed = passed;
        self.scored_at = Some(Utc::now());
        Ok(())
    }

    /// Sort key for picking the most recently started attempt.
    pub fn recency(&self) -> DateTime<Utc> {
        self.started_at.unwrap_or(self.created_at)
    }
}
