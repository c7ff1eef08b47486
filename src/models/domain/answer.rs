use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A choice definition attached to a question.
///
/// Unlabelled answers are never presented; they exist only to be matched
/// against free-form responses for correctness and branching.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Answer {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub position: usize,
    /// Stored value compared against non-choice responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// `Some(true)` correct, `Some(false)` incorrect, `None` not applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_section_id: Option<String>,
    #[serde(default)]
    pub ends_section: bool,
    #[serde(default)]
    pub ends_exam: bool,
}

impl Answer {
    pub fn new(name: &str) -> Self {
        Answer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            label: None,
            position: 0,
            value: None,
            correct: None,
            next_section_id: None,
            ends_section: false,
            ends_exam: false,
        }
    }

    pub fn labelled(name: &str, label: &str) -> Self {
        Answer::new(name).with_label(label)
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn with_correct(mut self, correct: bool) -> Self {
        self.correct = Some(correct);
        self
    }

    pub fn with_next_section(mut self, section_id: &str) -> Self {
        self.next_section_id = Some(section_id.to_string());
        self
    }

    pub fn ending_section(mut self) -> Self {
        self.ends_section = true;
        self
    }

    pub fn ending_exam(mut self) -> Self {
        self.ends_exam = true;
        self
    }

    pub fn is_visible(&self) -> bool {
        self.label.is_some()
    }

    pub fn has_branch(&self) -> bool {
        self.next_section_id.is_some() || self.ends_section || self.ends_exam
    }
}
