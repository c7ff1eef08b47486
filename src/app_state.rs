use std::sync::Arc;

use crate::{
    auth::{AssignmentIdentityResolver, IdentityResolver, PermissionChecker, RolePermissionChecker},
    config::{Config, StorageBackend},
    db::Database,
    errors::AppResult,
    repositories::{
        AssignmentRepository, AttemptRepository, ExamRepository, InMemoryAssignmentRepository,
        InMemoryAttemptRepository, InMemoryExamRepository, InMemoryResponseRepository,
        MongoAssignmentRepository, MongoAttemptRepository, MongoExamRepository,
        MongoResponseRepository, ResponseRepository,
    },
    services::{AttemptService, ExamService},
};

#[derive(Clone)]
pub struct AppState {
    pub attempt_service: Arc<AttemptService>,
    pub exam_service: Arc<ExamService>,
    pub config: Arc<Config>,
    /// Present only with the MongoDB backend.
    pub db: Option<Database>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        match config.storage_backend {
            StorageBackend::Mongo => {
                let db = Database::connect(&config).await?;

                let exams = Arc::new(MongoExamRepository::new(&db));
                exams.ensure_indexes().await?;
                let assignments = Arc::new(MongoAssignmentRepository::new(&db));
                assignments.ensure_indexes().await?;
                let attempts = Arc::new(MongoAttemptRepository::new(&db));
                attempts.ensure_indexes().await?;
                let responses = Arc::new(MongoResponseRepository::new(&db));
                responses.ensure_indexes().await?;

                Ok(Self::from_repositories(
                    config,
                    Some(db),
                    exams,
                    assignments,
                    attempts,
                    responses,
                ))
            }
            StorageBackend::Memory => {
                log::warn!("Using in-memory storage; all data is lost on restart");
                Ok(Self::in_memory(config))
            }
        }
    }

    pub fn in_memory(config: Config) -> Self {
        Self::from_repositories(
            config,
            None,
            Arc::new(InMemoryExamRepository::new()),
            Arc::new(InMemoryAssignmentRepository::new()),
            Arc::new(InMemoryAttemptRepository::new()),
            Arc::new(InMemoryResponseRepository::new()),
        )
    }

    /// Wires services over the given storage with the role-based
    /// permission checker and assignment-based identity resolution.
    pub fn from_repositories(
        config: Config,
        db: Option<Database>,
        exams: Arc<dyn ExamRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        attempts: Arc<dyn AttemptRepository>,
        responses: Arc<dyn ResponseRepository>,
    ) -> Self {
        let permissions: Arc<dyn PermissionChecker> =
            Arc::new(RolePermissionChecker::new(config.allow_answer_changes));
        let identity: Arc<dyn IdentityResolver> =
            Arc::new(AssignmentIdentityResolver::new(assignments.clone()));

        let attempt_service = Arc::new(AttemptService::new(
            exams.clone(),
            assignments.clone(),
            attempts,
            responses,
            permissions.clone(),
            identity,
        ));
        let exam_service = Arc::new(ExamService::new(exams, assignments, permissions));

        Self {
            attempt_service,
            exam_service,
            config: Arc::new(config),
            db,
        }
    }
}
