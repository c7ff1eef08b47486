//! Process-local repositories backed by `RwLock<HashMap>`. Used when
//! `STORAGE_BACKEND=memory` and by the test suites.

use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Assignment, Attempt, ExamDefinition, Response},
};

use super::{AssignmentRepository, AttemptRepository, ExamRepository, ResponseRepository};

#[derive(Default)]
pub struct InMemoryExamRepository {
    exams: Arc<RwLock<HashMap<String, ExamDefinition>>>,
}

impl InMemoryExamRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExamRepository for InMemoryExamRepository {
    async fn create(&self, exam: ExamDefinition) -> AppResult<ExamDefinition> {
        let mut exams = self.exams.write().await;
        if exams.contains_key(&exam.id) || exams.values().any(|e| e.name == exam.name) {
            return Err(AppError::AlreadyExists(format!(
                "Exam named '{}' already exists",
                exam.name
            )));
        }
        exams.insert(exam.id.clone(), exam.clone());
        Ok(exam)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<ExamDefinition>> {
        let exams = self.exams.read().await;
        Ok(exams.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<ExamDefinition>> {
        let exams = self.exams.read().await;
        Ok(exams.values().find(|e| e.name == name).cloned())
    }

    async fn update(&self, exam: ExamDefinition) -> AppResult<ExamDefinition> {
        let mut exams = self.exams.write().await;
        if !exams.contains_key(&exam.id) {
            return Err(AppError::NotFound(format!(
                "Exam with id '{}' not found",
                exam.id
            )));
        }
        exams.insert(exam.id.clone(), exam.clone());
        Ok(exam)
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<ExamDefinition>, i64)> {
        let exams = self.exams.read().await;
        let mut items: Vec<_> = exams.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));

        let total = items.len() as i64;
        let page = items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }
}

#[derive(Default)]
pub struct InMemoryAssignmentRepository {
    assignments: Arc<RwLock<HashMap<String, Assignment>>>,
}

impl InMemoryAssignmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryAssignmentRepository {
    async fn create(&self, assignment: Assignment) -> AppResult<Assignment> {
        let mut assignments = self.assignments.write().await;
        if assignments.contains_key(&assignment.id) {
            return Err(AppError::AlreadyExists(format!(
                "Assignment with id '{}' already exists",
                assignment.id
            )));
        }
        assignments.insert(assignment.id.clone(), assignment.clone());
        Ok(assignment)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Assignment>> {
        let assignments = self.assignments.read().await;
        Ok(assignments.get(id).cloned())
    }

    async fn mark_completed(&self, id: &str, at: DateTime<Utc>) -> AppResult<()> {
        let mut assignments = self.assignments.write().await;
        let assignment = assignments
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Assignment with id '{}' not found", id)))?;
        assignment.completed_at = Some(at);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAttemptRepository {
    attempts: Arc<RwLock<HashMap<String, Attempt>>>,
}

impl InMemoryAttemptRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptRepository for InMemoryAttemptRepository {
    async fn create(&self, attempt: Attempt) -> AppResult<Attempt> {
        let mut attempts = self.attempts.write().await;
        if attempts.contains_key(&attempt.id) {
            return Err(AppError::AlreadyExists(format!(
                "Attempt with id '{}' already exists",
                attempt.id
            )));
        }
        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts.get(id).cloned())
    }

    async fn find_incomplete_by_assignment(&self, assignment_id: &str) -> AppResult<Vec<Attempt>> {
        let attempts = self.attempts.read().await;
        let mut items: Vec<_> = attempts
            .values()
            .filter(|a| a.assignment_id == assignment_id && !a.is_completed())
            .cloned()
            .collect();
        items.sort_by_key(|a| std::cmp::Reverse(a.recency()));
        Ok(items)
    }

    async fn mark_started(&self, id: &str, at: DateTime<Utc>) -> AppResult<()> {
        let mut attempts = self.attempts.write().await;
        if let Some(attempt) = attempts.get_mut(id) {
            attempt.started_at.get_or_insert(at);
        }
        Ok(())
    }

    async fn complete(&self, completed: &Attempt) -> AppResult<bool> {
        let mut attempts = self.attempts.write().await;
        match attempts.get_mut(&completed.id) {
            Some(attempt) if attempt.completed_at.is_none() => {
                attempt.completed_at = completed.completed_at;
                attempt.score = completed.score;
                attempt.passed = completed.passed;
                attempt.scored_at = completed.scored_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn save_score(&self, scored: &Attempt) -> AppResult<bool> {
        let mut attempts = self.attempts.write().await;
        match attempts.get_mut(&scored.id) {
            Some(attempt) if attempt.scored_at.is_none() => {
                attempt.score = scored.score;
                attempt.passed = scored.passed;
                attempt.scored_at = scored.scored_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Keyed by `(attempt_id, question_id)`, mirroring the unique index the
/// Mongo collection carries.
#[derive(Default)]
pub struct InMemoryResponseRepository {
    responses: Arc<RwLock<HashMap<(String, String), Response>>>,
}

impl InMemoryResponseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseRepository for InMemoryResponseRepository {
    async fn find_by_attempt(&self, attempt_id: &str) -> AppResult<Vec<Response>> {
        let responses = self.responses.read().await;
        let mut items: Vec<_> = responses
            .values()
            .filter(|r| r.attempt_id == attempt_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.section_id
                .cmp(&b.section_id)
                .then(a.sequence.cmp(&b.sequence))
        });
        Ok(items)
    }

    async fn find_one(&self, attempt_id: &str, question_id: &str) -> AppResult<Option<Response>> {
        let responses = self.responses.read().await;
        Ok(responses
            .get(&(attempt_id.to_string(), question_id.to_string()))
            .cloned())
    }

    async fn insert_placeholders(&self, placeholders: Vec<Response>) -> AppResult<usize> {
        let mut responses = self.responses.write().await;
        let mut inserted = 0;
        for ((attempt_id, section_id), selection) in super::by_section(placeholders) {
            let already_selected = responses
                .values()
                .any(|r| r.attempt_id == attempt_id && r.section_id == section_id);
            if already_selected {
                continue;
            }
            for placeholder in selection {
                let key = (placeholder.attempt_id.clone(), placeholder.question_id.clone());
                if let Entry::Vacant(slot) = responses.entry(key) {
                    slot.insert(placeholder);
                    inserted += 1;
                }
            }
        }
        Ok(inserted)
    }

    async fn save(&self, response: Response) -> AppResult<Response> {
        let mut responses = self.responses.write().await;
        let key = (response.attempt_id.clone(), response.question_id.clone());
        match responses.get_mut(&key) {
            Some(slot) => {
                *slot = response.clone();
                Ok(response)
            }
            None => Err(AppError::UnknownQuestionForAttempt(response.question_id)),
        }
    }
}
