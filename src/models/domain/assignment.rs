use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Assignment of a user to an exam. Owned by the surrounding system; the
/// engine only reads it and marks it completed after a passing attempt.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Assignment {
    pub id: String,
    pub user_id: String,
    pub exam_id: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(user_id: &str, exam_id: &str) -> Self {
        Assignment {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            exam_id: exam_id.to_string(),
            completed_at: None,
            created_at: Utc::now(),
        }
    }
}
