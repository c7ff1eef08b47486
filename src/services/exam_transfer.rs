//! Structured JSON documents for moving exam definitions between systems.
//!
//! Ids are never exported. Branch targets are written as section names and
//! resolved back to fresh ids on import, so `export(import(export(x)))`
//! equals `export(x)` byte for byte.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Answer, ExamDefinition, Question, QuestionConstraints, QuestionType, Section},
    services::response_codec::ResponseCodec,
};

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_unconstrained(constraints: &QuestionConstraints) -> bool {
    *constraints == QuestionConstraints::default()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct ExamDocument {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passing_score: Option<Decimal>,
    #[validate(nested)]
    #[serde(default)]
    pub sections: Vec<SectionDocument>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct SectionDocument {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Name of the section to jump to on entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_section: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub random_order: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_questions: Option<usize>,
    #[validate(nested)]
    #[serde(default)]
    pub questions: Vec<QuestionDocument>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct QuestionDocument {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 10000))]
    pub prompt: String,
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "is_unconstrained")]
    pub constraints: QuestionConstraints,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_text: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejoinder: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub answers: Vec<AnswerDocument>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct AnswerDocument {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_section: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ends_section: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ends_exam: bool,
}

pub struct ExamTransfer;

impl ExamTransfer {
    pub fn export(exam: &ExamDefinition) -> AppResult<String> {
        let document = Self::to_document(exam)?;
        serde_json::to_string_pretty(&document)
            .map_err(|e| AppError::InternalError(format!("Failed to export exam: {}", e)))
    }

    pub fn import(json: &str) -> AppResult<ExamDefinition> {
        let document: ExamDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn to_document(exam: &ExamDefinition) -> AppResult<ExamDocument> {
        let names: HashMap<&str, &str> = exam
            .sections
            .iter()
            .map(|s| (s.id.as_str(), s.name.as_str()))
            .collect();
        let target_name = |target: &Option<String>| -> AppResult<Option<String>> {
            target
                .as_deref()
                .map(|id| {
                    names.get(id).map(|name| name.to_string()).ok_or_else(|| {
                        AppError::ValidationError(format!("Branch target '{}' does not exist", id))
                    })
                })
                .transpose()
        };

        let mut sections = Vec::with_capacity(exam.sections.len());
        for section in &exam.sections {
            let mut questions = Vec::with_capacity(section.questions.len());
            for question in &section.questions {
                let mut answers = Vec::with_capacity(question.answers.len());
                for answer in &question.answers {
                    answers.push(AnswerDocument {
                        name: answer.name.clone(),
                        label: answer.label.clone(),
                        value: answer.value.clone(),
                        correct: answer.correct,
                        next_section: target_name(&answer.next_section_id)?,
                        ends_section: answer.ends_section,
                        ends_exam: answer.ends_exam,
                    });
                }
                questions.push(QuestionDocument {
                    name: question.name.clone(),
                    prompt: question.prompt.clone(),
                    question_type: question.question_type,
                    constraints: question.constraints.clone(),
                    required: question.required,
                    allow_text: question.allow_text,
                    rejoinder: question.rejoinder.clone(),
                    answers,
                });
            }
            sections.push(SectionDocument {
                name: section.name.clone(),
                title: section.title.clone(),
                next_section: target_name(&section.next_section_id)?,
                random_order: section.random_order,
                max_questions: section.max_questions,
                questions,
            });
        }

        Ok(ExamDocument {
            name: exam.name.clone(),
            title: exam.title.clone(),
            description: exam.description.clone(),
            passing_score: exam.passing_score,
            sections,
        })
    }

    /// Builds a fresh definition from a document. Sections are inserted
    /// first and branches wired afterwards, so forward references resolve.
    pub fn from_document(document: ExamDocument) -> AppResult<ExamDefinition> {
        document.validate()?;

        let mut exam = ExamDefinition::new(&document.name, document.passing_score)?;
        exam.title = document.title;
        exam.description = document.description;

        let mut section_branches: Vec<(String, String)> = Vec::new();
        let mut answer_branches: Vec<(String, String)> = Vec::new();

        for section_doc in document.sections {
            let mut section = Section::new(&section_doc.name);
            section.title = section_doc.title;
            section.random_order = section_doc.random_order;
            section.max_questions = section_doc.max_questions;
            if let Some(target) = section_doc.next_section {
                section_branches.push((section.id.clone(), target));
            }

            let mut questions = Vec::with_capacity(section_doc.questions.len());
            for question_doc in section_doc.questions {
                let mut question =
                    Question::new(&question_doc.name, &question_doc.prompt, question_doc.question_type)
                        .with_constraints(question_doc.constraints);
                question.required = question_doc.required;
                question.allow_text = question_doc.allow_text;
                question.rejoinder = question_doc.rejoinder;

                let mut answers = Vec::with_capacity(question_doc.answers.len());
                for answer_doc in question_doc.answers {
                    let mut answer = Answer::new(&answer_doc.name);
                    answer.label = answer_doc.label;
                    answer.value = answer_doc.value;
                    answer.correct = answer_doc.correct;
                    answer.ends_section = answer_doc.ends_section;
                    answer.ends_exam = answer_doc.ends_exam;
                    if let Some(target) = answer_doc.next_section {
                        answer_branches.push((answer.id.clone(), target));
                    }
                    answers.push(answer);
                }
                questions.push(question.with_answers(answers));
            }

            exam.insert_section(None, section.with_questions(questions))?;
        }

        for (section_id, target) in section_branches {
            let target_id = section_id_by_name(&exam, &target)?;
            exam.set_section_next(&section_id, Some(&target_id))?;
        }
        for (answer_id, target) in answer_branches {
            let target_id = section_id_by_name(&exam, &target)?;
            exam.set_answer_next(&answer_id, Some(&target_id))?;
        }

        ResponseCodec::check_answer_values(&exam)?;
        Ok(exam)
    }
}

fn section_id_by_name(exam: &ExamDefinition, name: &str) -> AppResult<String> {
    exam.sections
        .iter()
        .find(|s| s.name == name)
        .map(|s| s.id.clone())
        .ok_or_else(|| AppError::ValidationError(format!("Unknown branch target section '{}'", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures;

    fn rich_exam() -> ExamDefinition {
        let mut exam = fixtures::branching_exam();
        exam.title = Some("Geography".to_string());
        exam.insert_section(
            None,
            Section::new("bonus").randomized(Some(1)).with_questions(vec![
                Question::new("river", "Longest river?", QuestionType::Text)
                    .with_constraints(QuestionConstraints {
                        max_length: Some(40),
                        pattern: Some("[A-Za-z ]+".to_string()),
                        ..Default::default()
                    }),
                Question::new("height", "Height of Everest (m)?", QuestionType::Decimal)
                    .with_answers(vec![Answer::new("everest").with_value("8848.86").with_correct(true)]),
            ]),
        )
        .unwrap();

        let bonus = exam.sections[2].id.clone();
        let go = exam.sections[0].questions[1].answers[1].id.clone();
        exam.set_answer_next(&go, Some(&bonus)).unwrap();
        exam
    }

    #[test]
    fn export_is_stable_across_import() {
        let exam = rich_exam();
        let first = ExamTransfer::export(&exam).unwrap();

        let imported = ExamTransfer::import(&first).unwrap();
        let second = ExamTransfer::export(&imported).unwrap();

        assert_eq!(first, second);
        assert_ne!(imported.id, exam.id);
    }

    #[test]
    fn branch_targets_are_written_by_name() {
        let document = ExamTransfer::to_document(&rich_exam()).unwrap();
        let go = &document.sections[0].questions[1].answers[1];

        assert_eq!(go.next_section.as_deref(), Some("bonus"));
        assert!(!ExamTransfer::export(&rich_exam()).unwrap().contains("\"id\""));
    }

    #[test]
    fn import_resolves_forward_references() {
        let json = r#"{
            "name": "forward",
            "sections": [
                { "name": "a", "next_section": "c", "questions": [] },
                { "name": "b", "questions": [] },
                { "name": "c", "questions": [] }
            ]
        }"#;

        let exam = ExamTransfer::import(json).unwrap();

        assert_eq!(
            exam.sections[0].next_section_id.as_deref(),
            Some(exam.sections[2].id.as_str())
        );
    }

    #[test]
    fn import_rejects_unknown_or_backward_targets() {
        let unknown = r#"{"name":"x","sections":[{"name":"a","next_section":"zz"}]}"#;
        assert!(matches!(
            ExamTransfer::import(unknown),
            Err(AppError::ValidationError(_))
        ));

        let backward = r#"{"name":"x","sections":[{"name":"a"},{"name":"b","next_section":"a"}]}"#;
        assert!(matches!(
            ExamTransfer::import(backward),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn import_rejects_unparsable_answer_values() {
        let json = r#"{"name":"x","sections":[{"name":"a","questions":[
            {"name":"q","prompt":"?","question_type":"integer",
             "answers":[{"name":"v","value":"seven","correct":true}]}
        ]}]}"#;

        assert!(matches!(
            ExamTransfer::import(json),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn import_rejects_malformed_documents() {
        assert!(matches!(
            ExamTransfer::import("{\"name\": 3}"),
            Err(AppError::ValidationError(_))
        ));
        assert!(ExamTransfer::import(r#"{"name":""}"#).is_err());
    }
}
