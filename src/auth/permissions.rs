use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    auth::claims::{Claims, UserRole},
    errors::{AppError, AppResult},
    models::domain::Attempt,
    repositories::AssignmentRepository,
};

/// The caller on whose behalf an operation runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: &str, role: UserRole) -> Self {
        Self {
            user_id: user_id.to_string(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&Claims> for Actor {
    fn from(claims: &Claims) -> Self {
        Actor::new(&claims.sub, claims.role)
    }
}

/// What an operation touches, with just enough context to decide on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resource {
    ExamDefinition,
    Attempt { owner_id: String },
    Response { owner_id: String, already_valid: bool },
}

#[cfg_attr(test, mockall::automock)]
pub trait PermissionChecker: Send + Sync {
    fn check_create(&self, actor: &Actor, resource: &Resource) -> AppResult<()>;
    fn check_read(&self, actor: &Actor, resource: &Resource) -> AppResult<()>;
    fn check_update(&self, actor: &Actor, resource: &Resource) -> AppResult<()>;
}

/// Admins may do anything. Everyone else works only on their own attempts
/// and responses, and may read exam definitions.
pub struct RolePermissionChecker {
    allow_answer_changes: bool,
}

impl RolePermissionChecker {
    pub fn new(allow_answer_changes: bool) -> Self {
        Self {
            allow_answer_changes,
        }
    }

    fn owns(actor: &Actor, resource: &Resource) -> AppResult<()> {
        match resource {
            Resource::ExamDefinition => Err(AppError::PermissionDenied(
                "Only admins can modify exam definitions".to_string(),
            )),
            Resource::Attempt { owner_id } | Resource::Response { owner_id, .. } => {
                if *owner_id == actor.user_id {
                    Ok(())
                } else {
                    Err(AppError::PermissionDenied(
                        "You can only access your own attempts".to_string(),
                    ))
                }
            }
        }
    }
}

impl PermissionChecker for RolePermissionChecker {
    fn check_create(&self, actor: &Actor, resource: &Resource) -> AppResult<()> {
        if actor.is_admin() {
            return Ok(());
        }
        Self::owns(actor, resource)
    }

    fn check_read(&self, actor: &Actor, resource: &Resource) -> AppResult<()> {
        if actor.is_admin() || *resource == Resource::ExamDefinition {
            return Ok(());
        }
        Self::owns(actor, resource)
    }

    fn check_update(&self, actor: &Actor, resource: &Resource) -> AppResult<()> {
        if actor.is_admin() {
            return Ok(());
        }
        Self::owns(actor, resource)?;

        if let Resource::Response {
            already_valid: true,
            ..
        } = resource
        {
            if !self.allow_answer_changes {
                return Err(AppError::DuplicateResponseConflict(
                    "This question already has a valid answer".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Maps an attempt to the user who owns it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn attempt_owner(&self, attempt: &Attempt) -> AppResult<String>;
}

pub struct AssignmentIdentityResolver {
    assignments: Arc<dyn AssignmentRepository>,
}

impl AssignmentIdentityResolver {
    pub fn new(assignments: Arc<dyn AssignmentRepository>) -> Self {
        Self { assignments }
    }
}

#[async_trait]
impl IdentityResolver for AssignmentIdentityResolver {
    async fn attempt_owner(&self, attempt: &Attempt) -> AppResult<String> {
        self.assignments
            .find_by_id(&attempt.assignment_id)
            .await?
            .map(|assignment| assignment.user_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Assignment with id '{}' not found",
                    attempt.assignment_id
                ))
            })
    }
}
