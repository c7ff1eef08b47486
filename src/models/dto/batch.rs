use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::domain::{
    Answer, ExamDefinition, Question, QuestionConstraints, QuestionType, Response, ResponseValue,
};
use crate::services::traversal::SurfacedQuestion;

/// Questions handed to a caller: the exam header plus sections in walk order,
/// each with its questions in the order they were selected for the attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionBatch {
    pub exam_id: String,
    pub title: Option<String>,
    pub passing_score: Option<Decimal>,
    pub sections: Vec<BatchSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSection {
    pub id: String,
    pub title: Option<String>,
    pub questions: Vec<BatchQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchQuestion {
    pub id: String,
    pub prompt: String,
    pub question_type: QuestionType,
    pub required: bool,
    pub allow_text: bool,
    pub constraints: QuestionConstraints,
    pub answers: Vec<BatchAnswer>,
    pub response: Option<ResponseView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchAnswer {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseView {
    pub value: Option<ResponseValue>,
    pub text: Option<String>,
    pub valid: Option<bool>,
    /// Only disclosed once the attempt is completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
}

impl QuestionBatch {
    /// Groups surfaced questions by section, keeping walk order.
    /// `reveal_correctness` controls whether stored correctness is included.
    pub fn build(
        exam: &ExamDefinition,
        surfaced: &[SurfacedQuestion<'_>],
        reveal_correctness: bool,
    ) -> Self {
        let mut sections: Vec<BatchSection> = Vec::new();

        for item in surfaced {
            let question = BatchQuestion::build(item.question, item.response, reveal_correctness);
            match sections.last_mut() {
                Some(section) if section.id == item.section.id => section.questions.push(question),
                _ => sections.push(BatchSection {
                    id: item.section.id.clone(),
                    title: item.section.title.clone(),
                    questions: vec![question],
                }),
            }
        }

        QuestionBatch {
            exam_id: exam.id.clone(),
            title: exam.title.clone(),
            passing_score: exam.passing_score,
            sections,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn question_ids(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|s| s.questions.iter().map(|q| q.id.as_str()))
    }
}

impl BatchQuestion {
    fn build(question: &Question, response: Option<&Response>, reveal_correctness: bool) -> Self {
        BatchQuestion {
            id: question.id.clone(),
            prompt: question.prompt.clone(),
            question_type: question.question_type,
            required: question.required,
            allow_text: question.allow_text,
            constraints: question.constraints.clone(),
            answers: question.visible_answers().map(BatchAnswer::from).collect(),
            response: response
                .filter(|r| r.valid.is_some() || !r.is_empty())
                .map(|r| ResponseView {
                    value: r.value.clone(),
                    text: r.text.clone(),
                    valid: r.valid,
                    correct: if reveal_correctness { r.correct } else { None },
                }),
        }
    }
}

impl From<&Answer> for BatchAnswer {
    fn from(answer: &Answer) -> Self {
        BatchAnswer {
            id: answer.id.clone(),
            label: answer.label.clone().unwrap_or_default(),
        }
    }
}
