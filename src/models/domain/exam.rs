use std::collections::HashSet;

use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::domain::answer::Answer;
use crate::models::domain::question::Question;
use crate::models::domain::section::Section;

/// An exam definition aggregate: sections, their questions and the
/// questions' answers, all kept in contiguous position order.
///
/// Every mutating operation works on a copy, renumbers positions and runs
/// [`ExamDefinition::validate`] before replacing `self`, so a rejected edit
/// leaves the definition untouched.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExamDefinition {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Percentage (0-100 inclusive) needed to pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passing_score: Option<Decimal>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl ExamDefinition {
    pub fn new(name: &str, passing_score: Option<Decimal>) -> AppResult<Self> {
        let exam = ExamDefinition {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            title: None,
            description: None,
            passing_score,
            sections: Vec::new(),
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        };
        exam.validate()?;
        Ok(exam)
    }

    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    pub fn section_position(&self, section_id: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.id == section_id)
    }

    pub fn question(&self, question_id: &str) -> Option<(&Section, &Question)> {
        self.sections.iter().find_map(|section| {
            section
                .question(question_id)
                .map(|question| (section, question))
        })
    }

    pub fn questions(&self) -> impl Iterator<Item = (&Section, &Question)> {
        self.sections
            .iter()
            .flat_map(|section| section.questions.iter().map(move |q| (section, q)))
    }

    pub fn insert_section(&mut self, index: Option<usize>, section: Section) -> AppResult<()> {
        self.edit(|exam| {
            insert_at(&mut exam.sections, index, section);
            Ok(())
        })
    }

    pub fn move_section(&mut self, section_id: &str, index: usize) -> AppResult<()> {
        self.edit(|exam| {
            let from = exam
                .section_position(section_id)
                .ok_or_else(|| not_found("Section", section_id))?;
            move_to(&mut exam.sections, from, index);
            Ok(())
        })
    }

    pub fn insert_question(
        &mut self,
        section_id: &str,
        index: Option<usize>,
        question: Question,
    ) -> AppResult<()> {
        self.edit(|exam| {
            let section = exam
                .sections
                .iter_mut()
                .find(|s| s.id == section_id)
                .ok_or_else(|| not_found("Section", section_id))?;
            insert_at(&mut section.questions, index, question);
            Ok(())
        })
    }

    pub fn move_question(&mut self, question_id: &str, index: usize) -> AppResult<()> {
        self.edit(|exam| {
            let section = exam
                .sections
                .iter_mut()
                .find(|s| s.question(question_id).is_some())
                .ok_or_else(|| not_found("Question", question_id))?;
            let from = section
                .questions
                .iter()
                .position(|q| q.id == question_id)
                .ok_or_else(|| not_found("Question", question_id))?;
            move_to(&mut section.questions, from, index);
            Ok(())
        })
    }

    pub fn insert_answer(
        &mut self,
        question_id: &str,
        index: Option<usize>,
        answer: Answer,
    ) -> AppResult<()> {
        self.edit(|exam| {
            let question = exam
                .question_mut(question_id)
                .ok_or_else(|| not_found("Question", question_id))?;
            insert_at(&mut question.answers, index, answer);
            Ok(())
        })
    }

    pub fn move_answer(&mut self, answer_id: &str, index: usize) -> AppResult<()> {
        self.edit(|exam| {
            let question = exam
                .sections
                .iter_mut()
                .flat_map(|s| s.questions.iter_mut())
                .find(|q| q.answer(answer_id).is_some())
                .ok_or_else(|| not_found("Answer", answer_id))?;
            let from = question
                .answers
                .iter()
                .position(|a| a.id == answer_id)
                .ok_or_else(|| not_found("Answer", answer_id))?;
            move_to(&mut question.answers, from, index);
            Ok(())
        })
    }

    pub fn set_section_next(&mut self, section_id: &str, target: Option<&str>) -> AppResult<()> {
        self.edit(|exam| {
            let section = exam
                .sections
                .iter_mut()
                .find(|s| s.id == section_id)
                .ok_or_else(|| not_found("Section", section_id))?;
            section.next_section_id = target.map(str::to_string);
            Ok(())
        })
    }

    pub fn set_answer_next(&mut self, answer_id: &str, target: Option<&str>) -> AppResult<()> {
        self.edit(|exam| {
            let answer = exam
                .sections
                .iter_mut()
                .flat_map(|s| s.questions.iter_mut())
                .flat_map(|q| q.answers.iter_mut())
                .find(|a| a.id == answer_id)
                .ok_or_else(|| not_found("Answer", answer_id))?;
            answer.next_section_id = target.map(str::to_string);
            Ok(())
        })
    }

    /// Checks every structural rule of the definition.
    pub fn validate(&self) -> AppResult<()> {
        if let Some(score) = self.passing_score {
            if score < Decimal::ZERO || score > Decimal::ONE_HUNDRED {
                return Err(AppError::ValidationError(format!(
                    "Passing score {} must be between 0 and 100",
                    score
                )));
            }
        }

        self.check_identifiers()?;

        for (index, section) in self.sections.iter().enumerate() {
            check_position("Section", &section.name, section.position, index)?;

            if section.max_questions == Some(0) {
                return Err(AppError::ValidationError(format!(
                    "Section '{}' must present at least one question",
                    section.name
                )));
            }
            if let Some(target) = &section.next_section_id {
                self.check_branch(&section.name, index, target)?;
            }

            for (q_index, question) in section.questions.iter().enumerate() {
                check_position("Question", &question.name, question.position, q_index)?;
                check_constraints(question)?;

                for (a_index, answer) in question.answers.iter().enumerate() {
                    check_position("Answer", &answer.name, answer.position, a_index)?;
                    if let Some(target) = &answer.next_section_id {
                        self.check_branch(&answer.name, index, target)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn edit<F>(&mut self, apply: F) -> AppResult<()>
    where
        F: FnOnce(&mut ExamDefinition) -> AppResult<()>,
    {
        let mut candidate = self.clone();
        apply(&mut candidate)?;
        candidate.renumber();
        candidate.validate()?;
        candidate.modified_at = Some(Utc::now());
        *self = candidate;
        Ok(())
    }

    fn renumber(&mut self) {
        for (s_pos, section) in self.sections.iter_mut().enumerate() {
            section.position = s_pos;
            for (q_pos, question) in section.questions.iter_mut().enumerate() {
                question.position = q_pos;
                for (a_pos, answer) in question.answers.iter_mut().enumerate() {
                    answer.position = a_pos;
                }
            }
        }
    }

    fn question_mut(&mut self, question_id: &str) -> Option<&mut Question> {
        self.sections
            .iter_mut()
            .flat_map(|s| s.questions.iter_mut())
            .find(|q| q.id == question_id)
    }

    fn check_branch(&self, origin: &str, origin_position: usize, target_id: &str) -> AppResult<()> {
        match self.section_position(target_id) {
            None => Err(AppError::ValidationError(format!(
                "'{}' branches to unknown section '{}'",
                origin, target_id
            ))),
            Some(target) if target <= origin_position => Err(AppError::ValidationError(format!(
                "'{}' must branch to a section after its own (target position {}, origin position {})",
                origin, target, origin_position
            ))),
            Some(_) => Ok(()),
        }
    }

    /// Names share one namespace with the exam's own name; ids must be unique too.
    fn check_identifiers(&self) -> AppResult<()> {
        let mut names = HashSet::new();
        let mut ids = HashSet::new();

        let mut claim = |kind: &str, id: &str, name: &str| -> AppResult<()> {
            if name.trim().is_empty() {
                return Err(AppError::ValidationError(format!("{} name cannot be empty", kind)));
            }
            if !names.insert(name.to_string()) {
                return Err(AppError::ValidationError(format!(
                    "Name '{}' is used more than once in this exam",
                    name
                )));
            }
            if !ids.insert(id.to_string()) {
                return Err(AppError::ValidationError(format!(
                    "{} id '{}' is not unique",
                    kind, id
                )));
            }
            Ok(())
        };

        claim("Exam", &self.id, &self.name)?;
        for section in &self.sections {
            claim("Section", &section.id, &section.name)?;
            for question in &section.questions {
                claim("Question", &question.id, &question.name)?;
                for answer in &question.answers {
                    claim("Answer", &answer.id, &answer.name)?;
                }
            }
        }
        Ok(())
    }
}

fn check_position(kind: &str, name: &str, position: usize, expected: usize) -> AppResult<()> {
    if position != expected {
        return Err(AppError::ValidationError(format!(
            "{} '{}' has position {} but sits at index {}",
            kind, name, position, expected
        )));
    }
    Ok(())
}

fn check_constraints(question: &Question) -> AppResult<()> {
    let c = &question.constraints;
    let inverted = |what: &str| {
        AppError::ValidationError(format!(
            "Question '{}' has a minimum {} above its maximum",
            question.name, what
        ))
    };

    if let (Some(min), Some(max)) = (c.min_length, c.max_length) {
        if min > max {
            return Err(inverted("length"));
        }
    }
    if let (Some(min), Some(max)) = (c.min_value, c.max_value) {
        if min > max {
            return Err(inverted("value"));
        }
    }
    if let (Some(min), Some(max)) = (c.min_selections, c.max_selections) {
        if min > max {
            return Err(inverted("selection count"));
        }
    }
    if let Some(pattern) = &c.pattern {
        Regex::new(pattern).map_err(|e| {
            AppError::ValidationError(format!(
                "Question '{}' has an invalid pattern: {}",
                question.name, e
            ))
        })?;
    }
    Ok(())
}

fn insert_at<T>(items: &mut Vec<T>, index: Option<usize>, item: T) {
    let index = index.unwrap_or(items.len()).min(items.len());
    items.insert(index, item);
}

fn move_to<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
}

fn not_found(kind: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} '{}' not found", kind, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::question::{QuestionConstraints, QuestionType};

    fn exam_with_sections(names: &[&str]) -> ExamDefinition {
        let mut exam = ExamDefinition::new("exam", Some(Decimal::from(70))).unwrap();
        for name in names {
            exam.insert_section(None, Section::new(name)).unwrap();
        }
        exam
    }

    fn positions(exam: &ExamDefinition) -> Vec<usize> {
        exam.sections.iter().map(|s| s.position).collect()
    }

    fn names(exam: &ExamDefinition) -> Vec<&str> {
        exam.sections.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn passing_score_must_be_a_percentage() {
        assert!(ExamDefinition::new("a", Some(Decimal::from(100))).is_ok());
        assert!(ExamDefinition::new("b", Some(Decimal::ZERO)).is_ok());
        assert!(ExamDefinition::new("c", None).is_ok());
        assert!(matches!(
            ExamDefinition::new("d", Some(Decimal::from(101))),
            Err(AppError::ValidationError(_))
        ));
        assert!(ExamDefinition::new("e", Some(Decimal::from(-1))).is_err());
    }

    #[test]
    fn inserting_sections_keeps_positions_contiguous() {
        let mut exam = exam_with_sections(&["s1", "s2"]);
        exam.insert_section(Some(0), Section::new("s0")).unwrap();
        exam.insert_section(Some(99), Section::new("s3")).unwrap();

        assert_eq!(names(&exam), vec!["s0", "s1", "s2", "s3"]);
        assert_eq!(positions(&exam), vec![0, 1, 2, 3]);
    }

    #[test]
    fn moving_sections_renumbers() {
        let mut exam = exam_with_sections(&["a", "b", "c"]);
        let c = exam.sections[2].id.clone();
        exam.move_section(&c, 0).unwrap();

        assert_eq!(names(&exam), vec!["c", "a", "b"]);
        assert_eq!(positions(&exam), vec![0, 1, 2]);
    }

    #[test]
    fn questions_and_answers_renumber_on_insert_and_move() {
        let mut exam = exam_with_sections(&["s"]);
        let section_id = exam.sections[0].id.clone();
        let q1 = Question::new("q1", "One", QuestionType::Choice);
        let q2 = Question::new("q2", "Two", QuestionType::Choice);
        let q2_id = q2.id.clone();
        exam.insert_question(&section_id, None, q1).unwrap();
        exam.insert_question(&section_id, Some(0), q2).unwrap();

        let order: Vec<(&str, usize)> = exam.sections[0]
            .questions
            .iter()
            .map(|q| (q.name.as_str(), q.position))
            .collect();
        assert_eq!(order, vec![("q2", 0), ("q1", 1)]);

        exam.insert_answer(&q2_id, None, Answer::labelled("x", "X")).unwrap();
        exam.insert_answer(&q2_id, None, Answer::labelled("y", "Y")).unwrap();
        let y = exam.sections[0].questions[0].answers[1].id.clone();
        exam.move_answer(&y, 0).unwrap();

        let answers: Vec<(&str, usize)> = exam.sections[0].questions[0]
            .answers
            .iter()
            .map(|a| (a.name.as_str(), a.position))
            .collect();
        assert_eq!(answers, vec![("y", 0), ("x", 1)]);

        exam.move_question(&q2_id, 5).unwrap();
        assert_eq!(exam.sections[0].questions[1].id, q2_id);
        assert_eq!(exam.sections[0].questions[1].position, 1);
    }

    #[test]
    fn names_collide_across_the_whole_exam() {
        let mut exam = exam_with_sections(&["intro"]);
        let section_id = exam.sections[0].id.clone();

        let same_as_section = Question::new("intro", "?", QuestionType::Boolean);
        assert!(matches!(
            exam.insert_question(&section_id, None, same_as_section),
            Err(AppError::ValidationError(_))
        ));

        let same_as_exam = Section::new("exam");
        assert!(exam.insert_section(None, same_as_exam).is_err());
        assert_eq!(exam.sections.len(), 1);
        assert!(exam.sections[0].questions.is_empty());
    }

    #[test]
    fn section_branch_must_point_forward() {
        let mut exam = exam_with_sections(&["a", "b", "c"]);
        let a = exam.sections[0].id.clone();
        let b = exam.sections[1].id.clone();
        let c = exam.sections[2].id.clone();

        assert!(exam.set_section_next(&b, Some(&c)).is_ok());
        assert!(matches!(
            exam.set_section_next(&b, Some(&a)),
            Err(AppError::ValidationError(_))
        ));
        assert!(exam.set_section_next(&b, Some(&b)).is_err());
        assert!(exam.set_section_next(&b, Some("missing")).is_err());
        assert_eq!(exam.sections[1].next_section_id.as_deref(), Some(c.as_str()));
    }

    #[test]
    fn answer_branch_must_point_past_its_section() {
        let mut exam = exam_with_sections(&["a", "b"]);
        let a = exam.sections[0].id.clone();
        let b = exam.sections[1].id.clone();
        let question = Question::new("q", "Q", QuestionType::Choice);
        let question_id = question.id.clone();
        exam.insert_question(&a, None, question).unwrap();

        let backwards = Answer::labelled("stay", "Stay").with_next_section(&a);
        assert!(exam.insert_answer(&question_id, None, backwards).is_err());

        let forwards = Answer::labelled("go", "Go").with_next_section(&b);
        assert!(exam.insert_answer(&question_id, None, forwards).is_ok());
    }

    #[test]
    fn reorder_that_breaks_a_branch_is_rejected_and_rolled_back() {
        let mut exam = exam_with_sections(&["a", "b"]);
        let a = exam.sections[0].id.clone();
        let b = exam.sections[1].id.clone();
        exam.set_section_next(&a, Some(&b)).unwrap();

        assert!(exam.move_section(&b, 0).is_err());
        assert_eq!(names(&exam), vec!["a", "b"]);
    }

    #[test]
    fn invalid_constraints_are_rejected() {
        let mut exam = exam_with_sections(&["s"]);
        let section_id = exam.sections[0].id.clone();

        let bad_pattern = Question::new("re", "?", QuestionType::Text).with_constraints(
            QuestionConstraints {
                pattern: Some("([a-z".to_string()),
                ..Default::default()
            },
        );
        assert!(exam.insert_question(&section_id, None, bad_pattern).is_err());

        let inverted = Question::new("n", "?", QuestionType::Integer).with_constraints(
            QuestionConstraints {
                min_value: Some(Decimal::from(10)),
                max_value: Some(Decimal::from(1)),
                ..Default::default()
            },
        );
        assert!(exam.insert_question(&section_id, None, inverted).is_err());
    }

    #[test]
    fn question_lookup_returns_owning_section() {
        let mut exam = exam_with_sections(&["a", "b"]);
        let b = exam.sections[1].id.clone();
        let question = Question::new("q", "Q", QuestionType::Boolean);
        let question_id = question.id.clone();
        exam.insert_question(&b, None, question).unwrap();

        let (section, found) = exam.question(&question_id).unwrap();
        assert_eq!(section.id, b);
        assert_eq!(found.name, "q");
        assert_eq!(exam.questions().count(), 1);
    }
}
