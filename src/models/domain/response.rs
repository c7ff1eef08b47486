use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A typed, parsed response value. Choice questions store the selected
/// answer ids; every other type stores a single scalar.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResponseValue {
    Boolean(bool),
    Text(String),
    Choices(Vec<String>),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Time(NaiveTime),
    Decimal(Decimal),
    Float(f64),
    Integer(i64),
}

/// What a user gave for one question in one attempt. Unique per
/// `(attempt_id, question_id)`; created as a placeholder the moment the
/// question is first surfaced.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Response {
    pub id: String,
    pub attempt_id: String,
    pub question_id: String,
    pub section_id: String,
    /// Order of the question within its section's selection for this attempt.
    pub sequence: usize,
    pub value: Option<ResponseValue>,
    /// The submitted value as received, kept even when it failed to parse.
    pub raw_value: Option<serde_json::Value>,
    pub text: Option<String>,
    pub valid: Option<bool>,
    pub correct: Option<bool>,
    #[serde(default)]
    pub matched_answer_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Response {
    pub fn placeholder(attempt_id: &str, section_id: &str, question_id: &str, sequence: usize) -> Self {
        let now = Utc::now();
        Response {
            id: Uuid::new_v4().to_string(),
            attempt_id: attempt_id.to_string(),
            question_id: question_id.to_string(),
            section_id: section_id.to_string(),
            sequence,
            value: None,
            raw_value: None,
            text: None,
            valid: None,
            correct: None,
            matched_answer_ids: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid == Some(true)
    }

    pub fn is_invalid(&self) -> bool {
        self.valid == Some(false)
    }

    /// Stores a new value and resets validity and correctness to unknown.
    pub fn set_value(
        &mut self,
        value: Option<ResponseValue>,
        raw_value: Option<serde_json::Value>,
        text: Option<String>,
    ) {
        self.value = value;
        self.raw_value = raw_value;
        self.text = text;
        self.valid = None;
        self.correct = None;
        self.matched_answer_ids.clear();
        self.modified_at = Utc::now();
    }

    pub fn is_empty(&self) -> bool {
        let no_text = self.text.as_deref().map_or(true, |t| t.trim().is_empty());
        let no_value = match &self.value {
            None => true,
            Some(ResponseValue::Text(t)) => t.trim().is_empty(),
            Some(ResponseValue::Choices(ids)) => ids.is_empty(),
            Some(_) => false,
        };
        no_text && no_value
    }
}
