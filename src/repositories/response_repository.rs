use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{IndexOptions, ReplaceOptions},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::Response,
};

use super::by_section;

#[async_trait]
pub trait ResponseRepository: Send + Sync {
    async fn find_by_attempt(&self, attempt_id: &str) -> AppResult<Vec<Response>>;
    async fn find_one(&self, attempt_id: &str, question_id: &str) -> AppResult<Option<Response>>;
    /// Stores the question selection of freshly entered sections.
    ///
    /// Only the first selection for an `(attempt, section)` pair is kept: a
    /// section that already has rows drops the new placeholders for it
    /// entirely. Returns how many were inserted.
    async fn insert_placeholders(&self, placeholders: Vec<Response>) -> AppResult<usize> {
        let mut inserted = 0;
        for ((attempt_id, section_id), mut selection) in by_section(placeholders) {
            let existing = self
                .collection
                .count_documents(doc! { "attempt_id": &attempt_id, "section_id": &section_id })
                .await?;
            if existing > 0 {
                continue;
            }

            // In sequence order, so a racing selection collides on its first row
            // and stops before writing any of its own.
            selection.sort_by_key(|r| r.sequence);
            for placeholder in &selection {
                match self.collection.insert_one(placeholder).await {
                    Ok(_) => inserted += 1,
                    Err(err) if super::is_duplicate_key(&err) => {
                        log::debug!(
                            "Section {} of attempt {} was selected concurrently",
                            section_id,
                            attempt_id
                        );
                        break;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }
        Ok(inserted)
    }

    async fn save(&self, response: Response) -> AppResult<Response>;
}

pub struct MongoResponseRepository {
    collection: Collection<Response>,
}

impl MongoResponseRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("responses");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for responses collection");

        let attempt_question_index = IndexModel::builder()
            .keys(doc! { "attempt_id": 1, "question_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("attempt_question_unique".to_string())
                    .build(),
            )
            .build();

        let selection_index = IndexModel::builder()
            .keys(doc! { "attempt_id": 1, "section_id": 1, "sequence": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("attempt_section_sequence_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(attempt_question_index).await?;
        self.collection.create_index(selection_index).await?;

        log::info!("Successfully created indexes for responses collection");
        Ok(())
    }
}

#[async_trait]
impl ResponseRepository for MongoResponseRepository {
    async fn find_by_attempt(&self, attempt_id: &str) -> AppResult<Vec<Response>> {
        let responses = self
            .collection
            .find(doc! { "attempt_id": attempt_id })
            .sort(doc! { "section_id": 1, "sequence": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(responses)
    }

    async fn find_one(&self, attempt_id: &str, question_id: &str) -> AppResult<Option<Response>> {
        let response = self
            .collection
            .find_one(doc! { "attempt_id": attempt_id, "question_id": question_id })
            .await?;
        Ok(response)
    }

    async fn insert_placeholders(&self, placeholders: Vec<Response>) -> AppResult<usize> {
        let mut inserted = 0;
        for placeholder in &placeholders {
            match self.collection.insert_one(placeholder).await {
                Ok(_) => inserted += 1,
                Err(err) if super::is_duplicate_key(&err) => {
                    log::debug!(
                        "Placeholder for question {} in attempt {} already exists",
                        placeholder.question_id,
                        placeholder.attempt_id
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(inserted)
    }

    async fn save(&self, response: Response) -> AppResult<Response> {
        let options = ReplaceOptions::builder().upsert(false).build();
        let result = self
            .collection
            .replace_one(
                doc! { "attempt_id": &response.attempt_id, "question_id": &response.question_id },
                &response,
            )
            .with_options(options)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::UnknownQuestionForAttempt(response.question_id));
        }
        Ok(response)
    }
}
