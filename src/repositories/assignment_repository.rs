use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, to_bson},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::Assignment,
};

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn create(&self, assignment: Assignment) -> AppResult<Assignment>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Assignment>>;
    async fn mark_completed(&self, id: &str, at: DateTime<Utc>) -> AppResult<()>;
}

pub struct MongoAssignmentRepository {
    collection: Collection<Assignment>,
}

impl MongoAssignmentRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("assignments");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let user_exam_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "exam_id": 1 })
            .options(IndexOptions::builder().name("user_exam".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(user_exam_index).await?;
        log::info!("Successfully created indexes for assignments collection");
        Ok(())
    }
}

#[async_trait]
impl AssignmentRepository for MongoAssignmentRepository {
    async fn create(&self, assignment: Assignment) -> AppResult<Assignment> {
        self.collection.insert_one(&assignment).await?;
        Ok(assignment)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Assignment>> {
        let assignment = self.collection.find_one(doc! { "id": id }).await?;
        Ok(assignment)
    }

    async fn mark_completed(&self, id: &str, at: DateTime<Utc>) -> AppResult<()> {
        let result = self
            .collection
            .update_one(
                doc! { "id": id },
                doc! { "$set": { "completed_at": to_bson(&at)? } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Assignment with id '{}' not found",
                id
            )));
        }
        Ok(())
    }
}
