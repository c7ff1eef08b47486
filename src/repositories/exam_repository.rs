use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{FindOptions, IndexOptions, ReplaceOptions},
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::ExamDefinition,
};

#[async_trait]
pub trait ExamRepository: Send + Sync {
    async fn create(&self, exam: ExamDefinition) -> AppResult<ExamDefinition>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<ExamDefinition>>;
    async fn find_by_name(&self, name: &str) -> AppResult<Option<ExamDefinition>>;
    async fn update(&self, exam: ExamDefinition) -> AppResult<ExamDefinition>;
    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<ExamDefinition>, i64)>;
}

pub struct MongoExamRepository {
    collection: Collection<ExamDefinition>,
}

impl MongoExamRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("exams");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for exams collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let name_index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("name_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(name_index).await?;

        log::info!("Successfully created indexes for exams collection");
        Ok(())
    }
}

#[async_trait]
impl ExamRepository for MongoExamRepository {
    async fn create(&self, exam: ExamDefinition) -> AppResult<ExamDefinition> {
        self.collection.insert_one(&exam).await.map_err(|err| {
            if super::is_duplicate_key(&err) {
                AppError::AlreadyExists(format!("Exam named '{}' already exists", exam.name))
            } else {
                err.into()
            }
        })?;
        Ok(exam)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<ExamDefinition>> {
        let exam = self.collection.find_one(doc! { "id": id }).await?;
        Ok(exam)
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<ExamDefinition>> {
        let exam = self.collection.find_one(doc! { "name": name }).await?;
        Ok(exam)
    }

    async fn update(&self, exam: ExamDefinition) -> AppResult<ExamDefinition> {
        let options = ReplaceOptions::builder().upsert(false).build();
        let result = self
            .collection
            .replace_one(doc! { "id": &exam.id }, &exam)
            .with_options(options)
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Exam with id '{}' not found",
                exam.id
            )));
        }
        Ok(exam)
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<ExamDefinition>, i64)> {
        let total = self.collection.count_documents(doc! {}).await? as i64;

        let find_options = FindOptions::builder()
            .skip(Some(offset.max(0) as u64))
            .limit(Some(limit))
            .sort(doc! { "name": 1 })
            .build();

        let cursor = self.collection.find(doc! {}).with_options(find_options).await?;
        let items: Vec<ExamDefinition> = cursor.try_collect().await?;

        Ok((items, total))
    }
}
