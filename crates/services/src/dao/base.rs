use bson::Document;
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use serde::{Serialize, de::DeserializeOwned};

#[derive(Debug, thiserror::Error)]
pub enum DaoError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
    #[error(transparent)]
    BsonSer(#[from] bson::ser::Error),
    #[error(transparent)]
    BsonDe(#[from] bson::de::Error),
}

pub type DaoResult<T> = Result<T, DaoError>;

/// Thin typed wrapper over a MongoDB collection.
pub struct BaseDao<T: Send + Sync> {
    pub collection: Collection<T>,
}

impl<T> BaseDao<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(db: &Database, collection: &str) -> Self {
        Self {
            collection: db.collection(collection),
        }
    }

    pub async fn find_one(&self, filter: Document) -> DaoResult<T> {
        self.collection
            .find_one(filter)
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_opt(&self, filter: Document) -> DaoResult<Option<T>> {
        Ok(self.collection.find_one(filter).await?)
    }

    pub async fn find_many(&self, filter: Document, sort: Option<Document>) -> DaoResult<Vec<T>> {
        let mut find = self.collection.find(filter);
        if let Some(sort) = sort {
            find = find.sort(sort);
        }
        Ok(find.await?.try_collect().await?)
    }

    pub async fn update_one(&self, filter: Document, update: Document) -> DaoResult<u64> {
        let result = self.collection.update_one(filter, update).await?;
        Ok(result.modified_count)
    }

    /// Update with upsert - the document is created on first write.
    pub async fn upsert_one(&self, filter: Document, update: Document) -> DaoResult<()> {
        self.collection
            .update_one(filter, update)
            .upsert(true)
            .await?;
        Ok(())
    }
}
