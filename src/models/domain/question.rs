use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::answer::Answer;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub name: String,
    pub prompt: String,
    pub position: usize,
    pub question_type: QuestionType,
    #[serde(default)]
    pub constraints: QuestionConstraints,
    #[serde(default)]
    pub required: bool,
    /// Allows a free-text companion alongside the primary value.
    #[serde(default)]
    pub allow_text: bool,
    /// Returned to the user when their response is not correct.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejoinder: Option<String>,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Boolean,
    Text,
    LongText,
    Choice,
    MultiChoice,
    Date,
    DateTime,
    Time,
    Decimal,
    Float,
    Integer,
    Rating,
}

impl QuestionType {
    pub const ALL: [QuestionType; 12] = [
        QuestionType::Boolean,
        QuestionType::Text,
        QuestionType::LongText,
        QuestionType::Choice,
        QuestionType::MultiChoice,
        QuestionType::Date,
        QuestionType::DateTime,
        QuestionType::Time,
        QuestionType::Decimal,
        QuestionType::Float,
        QuestionType::Integer,
        QuestionType::Rating,
    ];

    pub fn is_choice(self) -> bool {
        matches!(self, QuestionType::Choice | QuestionType::MultiChoice)
    }

    pub fn is_text(self) -> bool {
        matches!(self, QuestionType::Text | QuestionType::LongText)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Must match the whole text value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_selections: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<usize>,
}

impl Question {
    pub fn new(name: &str, prompt: &str, question_type: QuestionType) -> Self {
        Question {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            prompt: prompt.to_string(),
            position: 0,
            question_type,
            constraints: QuestionConstraints::default(),
            required: false,
            allow_text: false,
            rejoinder: None,
            answers: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_constraints(mut self, constraints: QuestionConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_free_text(mut self) -> Self {
        self.allow_text = true;
        self
    }

    pub fn with_rejoinder(mut self, rejoinder: &str) -> Self {
        self.rejoinder = Some(rejoinder.to_string());
        self
    }

    /// Appends answers in order; positions are assigned when the question is
    /// inserted into an exam.
    pub fn with_answers(mut self, answers: Vec<Answer>) -> Self {
        self.answers.extend(answers);
        for (position, answer) in self.answers.iter_mut().enumerate() {
            answer.position = position;
        }
        self
    }

    pub fn answer(&self, answer_id: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.id == answer_id)
    }

    /// A question is scorable when at least one answer carries an explicit
    /// correct/incorrect flag.
    pub fn is_scorable(&self) -> bool {
        self.answers.iter().any(|a| a.correct.is_some())
    }

    pub fn visible_answers(&self) -> impl Iterator<Item = &Answer> {
        self.answers.iter().filter(|a| a.is_visible())
    }

    /// Whether a separate free-text companion may be stored. Text questions
    /// never take one: their value already is text.
    pub fn accepts_free_text(&self) -> bool {
        self.allow_text && !self.question_type.is_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_round_trip_serialization() {
        for variant in QuestionType::ALL {
            let json = serde_json::to_string(&variant).expect("variant should serialize");
            let parsed: QuestionType =
                serde_json::from_str(&json).expect("variant should deserialize");
            assert_eq!(variant, parsed);
        }
        assert_eq!(
            serde_json::to_string(&QuestionType::MultiChoice).unwrap(),
            "\"multi_choice\""
        );
    }

    #[test]
    fn question_type_rejects_unknown_variant() {
        let parsed = serde_json::from_str::<QuestionType>("\"essay\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn scorable_requires_explicit_flag() {
        let survey = Question::new("mood", "How do you feel?", QuestionType::Choice)
            .with_answers(vec![Answer::labelled("good", "Good"), Answer::labelled("bad", "Bad")]);
        assert!(!survey.is_scorable());

        let quiz = Question::new("capital", "Capital of France?", QuestionType::Text)
            .with_answers(vec![Answer::new("paris").with_value("Paris").with_correct(true)]);
        assert!(quiz.is_scorable());
    }

    #[test]
    fn free_text_is_refused_for_text_types() {
        let text = Question::new("essay", "Describe", QuestionType::LongText).with_free_text();
        let choice = Question::new("pick", "Pick", QuestionType::Choice).with_free_text();

        assert!(!text.accepts_free_text());
        assert!(choice.accepts_free_text());
    }

    #[test]
    fn with_answers_numbers_positions() {
        let question = Question::new("q", "Q", QuestionType::Choice).with_answers(vec![
            Answer::labelled("a", "A"),
            Answer::labelled("b", "B"),
            Answer::new("hidden"),
        ]);

        let positions: Vec<usize> = question.answers.iter().map(|a| a.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(question.visible_answers().count(), 2);
    }
}
