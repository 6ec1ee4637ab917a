//! MongoDB client and collection wrapper

use bson::{doc, oid::ObjectId, DateTime, Document};
use futures_util::TryStreamExt;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::db::schemas::Metadata;
use crate::types::TreeError;

/// Server error code for a unique index violation
const DUPLICATE_KEY: i32 = 11000;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// Whether a driver error is a unique index violation
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

/// Map a driver error, turning unique index violations into `Duplicate`
fn db_error(context: &str, err: mongodb::error::Error) -> TreeError {
    if is_duplicate_key(&err) {
        TreeError::Duplicate(format!("{}: unique key already exists", context))
    } else {
        TreeError::Database(format!("{}: {}", context, err))
    }
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, TreeError> {
        info!("Connecting to MongoDB at {}", uri);

        // Fail fast when the server is unreachable
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| TreeError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| TreeError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection, creating its indexes
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, TreeError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
{
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, TreeError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<(), TreeError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| TreeError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, TreeError> {
        let metadata = item.mut_metadata();
        metadata.created_at = Some(DateTime::now());
        metadata.updated_at = Some(DateTime::now());

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| db_error("Insert failed", e))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| TreeError::Database("Failed to get inserted ID".into()))
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, TreeError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| TreeError::Database(format!("Find failed: {}", e)))
    }

    /// Find documents matching `filter`, projected onto `P` and ordered by `sort`
    pub async fn find_projected<P>(
        &self,
        filter: Document,
        projection: Document,
        sort: Document,
    ) -> Result<Vec<P>, TreeError>
    where
        P: DeserializeOwned + Unpin + Send + Sync,
    {
        let cursor = self
            .inner
            .clone_with_type::<P>()
            .find(filter)
            .projection(projection)
            .sort(sort)
            .await
            .map_err(|e| TreeError::Database(format!("Find failed: {}", e)))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| TreeError::Database(format!("Cursor failed: {}", e)))
    }

    pub async fn count(&self, filter: Document) -> Result<u64, TreeError> {
        self.inner
            .count_documents(filter)
            .await
            .map_err(|e| TreeError::Database(format!("Count failed: {}", e)))
    }

    /// Update one document, stamping `metadata.updated_at`
    pub async fn update_one(
        &self,
        filter: Document,
        mut update: Document,
    ) -> Result<UpdateResult, TreeError> {
        let stamp = doc! { "metadata.updated_at": DateTime::now() };
        match update.get_document_mut("$set") {
            Ok(set) => set.extend(stamp),
            Err(_) => {
                update.insert("$set", stamp);
            }
        }

        self.update_raw(filter, update).await
    }

    /// Update one document without touching metadata
    pub async fn update_raw(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, TreeError> {
        self.inner
            .update_one(filter, update.into())
            .await
            .map_err(|e| db_error("Update failed", e))
    }
}
