pub mod assignment_repository;
pub mod attempt_repository;
pub mod exam_repository;
pub mod memory;
pub mod response_repository;

pub use assignment_repository::{AssignmentRepository, MongoAssignmentRepository};
pub use attempt_repository::{AttemptRepository, MongoAttemptRepository};
pub use exam_repository::{ExamRepository, MongoExamRepository};
pub use memory::{
    InMemoryAssignmentRepository, InMemoryAttemptRepository, InMemoryExamRepository,
    InMemoryResponseRepository,
};
pub use response_repository::{MongoResponseRepository, ResponseRepository};

use std::collections::BTreeMap;

use mongodb::error::{ErrorKind, WriteFailure};

use crate::models::domain::Response;

const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

/// Groups placeholders by the `(attempt, section)` they were selected for.
fn by_section(placeholders: Vec<Response>) -> BTreeMap<(String, String), Vec<Response>> {
    let mut sections: BTreeMap<(String, String), Vec<Response>> = BTreeMap::new();
    for placeholder in placeholders {
        sections
            .entry((placeholder.attempt_id.clone(), placeholder.section_id.clone()))
            .or_default()
            .push(placeholder);
    }
    sections
}
