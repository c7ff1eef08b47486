use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{db::Database, errors::AppResult, models::domain::Attempt};

#[async_trait]
pub trait AttemptRepository: Send + Sync {
    async fn create(&self, attempt: Attempt) -> AppResult<Attempt>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>>;
    /// Incomplete attempts for an assignment, most recently started first.
    async fn find_incomplete_by_assignment(&self, assignment_id: &str) -> AppResult<Vec<Attempt>>;
    /// Records the start time unless one is already set.
    async fn mark_started(&self, id: &str, at: DateTime<Utc>) -> AppResult<()>;
    /// Atomically stores completion together with the score, verdict and
    /// `scored_at` of `attempt`. Returns `false` if the attempt was already
    /// completed.
    async fn complete(&self, attempt: &Attempt) -> AppResult<bool>;
    /// Atomically stores score, verdict and `scored_at`. Returns `false` if a
    /// score was already stored.
    async fn save_score(&self, attempt: &Attempt) -> AppResult<bool>;
}

pub struct MongoAttemptRepository {
    collection: Collection<Attempt>,
}

impl MongoAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("attempts");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let assignment_index = IndexModel::builder()
            .keys(doc! { "assignment_id": 1, "completed_at": 1 })
            .options(
                IndexOptions::builder()
                    .name("assignment_completion".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(assignment_index).await?;

        log::info!("Successfully created indexes for attempts collection");
        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for MongoAttemptRepository {
    async fn create(&self, attempt: Attempt) -> AppResult<Attempt> {
        self.collection.insert_one(&attempt).await?;
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Attempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn find_incomplete_by_assignment(&self, assignment_id: &str) -> AppResult<Vec<Attempt>> {
        let mut attempts: Vec<Attempt> = self
            .collection
            .find(doc! {
                "assignment_id": assignment_id,
                "completed_at": null
            })
            .await?
            .try_collect()
            .await?;

        attempts.sort_by_key(|a| std::cmp::Reverse(a.recency()));
        Ok(attempts)
    }

    async fn mark_started(&self, id: &str, at: DateTime<Utc>) -> AppResult<()> {
        self.collection
            .update_one(
                doc! { "id": id, "started_at": null },
                doc! { "$set": { "started_at": to_bson(&at)? } },
            )
            .await?;
        Ok(())
    }

    async fn complete(&self, attempt: &Attempt) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": &attempt.id, "completed_at": null },
                doc! { "$set": {
                    "completed_at": to_bson(&attempt.completed_at)?,
                    "score": to_bson(&attempt.score)?,
                    "passed": to_bson(&attempt.passed)?,
                    "scored_at": to_bson(&attempt.scored_at)?,
                } },
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn save_score(&self, attempt: &Attempt) -> AppResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "id": &attempt.id, "scored_at": null },
                doc! { "$set": {
                    "score": to_bson(&attempt.score)?,
                    "passed": to_bson(&attempt.passed)?,
                    "scored_at": to_bson(&attempt.scored_at)?,
                } },
            )
            .await?;
        Ok(result.modified_count == 1)
    }
}
