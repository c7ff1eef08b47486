use std::sync::Arc;

use crate::{
    auth::{Actor, PermissionChecker, Resource},
    errors::{AppError, AppResult},
    models::domain::{Assignment, ExamDefinition},
    repositories::{AssignmentRepository, ExamRepository},
    services::{exam_transfer::ExamTransfer, response_codec::ResponseCodec},
};

pub struct ExamService {
    exams: Arc<dyn ExamRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    permissions: Arc<dyn PermissionChecker>,
}

impl ExamService {
    pub fn new(
        exams: Arc<dyn ExamRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            exams,
            assignments,
            permissions,
        }
    }

    pub async fn get_exam(&self, actor: &Actor, id: &str) -> AppResult<ExamDefinition> {
        self.permissions
            .check_read(actor, &Resource::ExamDefinition)?;
        self.find(id).await
    }

    pub async fn list_exams(
        &self,
        actor: &Actor,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<ExamDefinition>, i64)> {
        self.permissions
            .check_read(actor, &Resource::ExamDefinition)?;
        self.exams.list(offset, limit.clamp(1, 100)).await
    }

    pub async fn create_exam(&self, actor: &Actor, exam: ExamDefinition) -> AppResult<ExamDefinition> {
        self.permissions
            .check_create(actor, &Resource::ExamDefinition)?;
        exam.validate()?;
        ResponseCodec::check_answer_values(&exam)?;

        let created = self.exams.create(exam).await?;
        log::info!("Created exam {} ({})", created.name, created.id);
        Ok(created)
    }

    /// Replaces a stored definition after validating it as a whole.
    pub async fn update_exam(&self, actor: &Actor, mut exam: ExamDefinition) -> AppResult<ExamDefinition> {
        self.permissions
            .check_update(actor, &Resource::ExamDefinition)?;
        exam.validate()?;
        ResponseCodec::check_answer_values(&exam)?;

        exam.modified_at = Some(chrono::Utc::now());
        let updated = self.exams.update(exam).await?;
        log::info!("Updated exam {} ({})", updated.name, updated.id);
        Ok(updated)
    }

    pub async fn import_exam(&self, actor: &Actor, document: &str) -> AppResult<ExamDefinition> {
        self.permissions
            .check_create(actor, &Resource::ExamDefinition)?;
        let exam = ExamTransfer::import(document)?;

        let created = self.exams.create(exam).await?;
        log::info!("Imported exam {} ({})", created.name, created.id);
        Ok(created)
    }

    pub async fn export_exam(&self, actor: &Actor, id: &str) -> AppResult<String> {
        self.permissions
            .check_read(actor, &Resource::ExamDefinition)?;
        let exam = self.find(id).await?;
        ExamTransfer::export(&exam)
    }

    /// Assigns an exam to a user so they can start attempts on it.
    pub async fn assign_exam(&self, actor: &Actor, exam_id: &str, user_id: &str) -> AppResult<Assignment> {
        self.permissions
            .check_create(actor, &Resource::ExamDefinition)?;
        let exam = self.find(exam_id).await?;

        let assignment = self
            .assignments
            .create(Assignment::new(user_id, &exam.id))
            .await?;
        log::info!(
            "Assigned exam {} to user {} ({})",
            exam.id,
            user_id,
            assignment.id
        );
        Ok(assignment)
    }

    async fn find(&self, id: &str) -> AppResult<ExamDefinition> {
        self.exams
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Exam with id '{}' not found", id)))
    }
}
