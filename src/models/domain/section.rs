use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::question::Question;

/// An ordered pool of questions within an exam.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Section {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub position: usize,
    /// Default jump applied when this section is entered; answers may override it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_section_id: Option<String>,
    #[serde(default)]
    pub random_order: bool,
    /// Cap on presented questions, only applied with `random_order`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_questions: Option<usize>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Section {
    pub fn new(name: &str) -> Self {
        Section {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            title: None,
            position: 0,
            next_section_id: None,
            random_order: false,
            max_questions: None,
            questions: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn randomized(mut self, max_questions: Option<usize>) -> Self {
        self.random_order = true;
        self.max_questions = max_questions;
        self
    }

    pub fn with_questions(mut self, questions: Vec<Question>) -> Self {
        self.questions.extend(questions);
        for (position, question) in self.questions.iter_mut().enumerate() {
            question.position = position;
        }
        self
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}
