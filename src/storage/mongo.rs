//! MongoDB storage backend
//!
//! One collection in the database named by the connection string.

use crate::config::{MongoConfig, redact_uri};
use crate::storage::{ID_FIELD, Record, RecordStore};
use crate::{ServiceError, StoreError};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, Bson, Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use std::time::Duration;
use tracing::{debug, info};

/// MongoDB-backed record store
pub struct MongoStore {
    db: Database,
    collection: Collection<Document>,
}

impl MongoStore {
    /// Build a client for the configured database.
    ///
    /// The driver connects lazily, so this succeeds even when the server is
    /// down; failures surface on the first operation.
    pub async fn connect(config: &MongoConfig) -> Result<Self, ServiceError> {
        let mut options = ClientOptions::parse(&config.uri)
            .await
            .map_err(StoreError::from)?;
        options.app_name = Some("datasvc".to_string());
        options.server_selection_timeout =
            Some(Duration::from_secs(config.server_selection_timeout_secs));

        let db_name = config
            .database
            .clone()
            .or_else(|| options.default_database.clone())
            .ok_or_else(|| {
                ServiceError::Config(format!(
                    "MongoDB URI must name a database: {}",
                    redact_uri(&config.uri)
                ))
            })?;

        let client = Client::with_options(options).map_err(StoreError::from)?;
        let db = client.database(&db_name);
        let collection = db.collection::<Document>(&config.collection);
        info!(
            "Using MongoDB database {} collection {}",
            db_name, config.collection
        );

        Ok(Self { db, collection })
    }
}

#[async_trait]
impl RecordStore for MongoStore {
    async fn find_all(&self) -> Result<Vec<Record>, StoreError> {
        let mut cursor = self
            .collection
            .find(doc! {})
            .projection(doc! { ID_FIELD: 0 })
            .await?;

        let mut records = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            records.push(document_to_record(document)?);
        }
        debug!("Fetched {} records", records.len());
        Ok(records)
    }

    async fn insert_one(&self, record: Record) -> Result<String, StoreError> {
        let document = record_to_document(&record)?;
        let result = self.collection.insert_one(document).await?;
        Ok(id_to_string(result.inserted_id))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

/// Convert a stored document to plain JSON (relaxed extended JSON for BSON-only types)
fn document_to_record(document: Document) -> Result<Record, StoreError> {
    match Bson::Document(document).into_relaxed_extjson() {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(StoreError::Decoding(format!(
            "expected a document, got {other}"
        ))),
    }
}

fn record_to_document(record: &Record) -> Result<Document, StoreError> {
    bson::to_document(record).map_err(|e| StoreError::Encoding(e.to_string()))
}

/// Render an inserted id; ObjectIds become their 24-char hex form
fn id_to_string(id: Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;
    use serde_json::json;

    #[test]
    fn test_document_to_record() {
        let document = doc! { "name": "a", "count": 3_i64, "nested": { "ok": true } };
        let record = document_to_record(document).unwrap();
        assert_eq!(
            serde_json::Value::Object(record),
            json!({ "name": "a", "count": 3, "nested": { "ok": true } })
        );
    }

    #[test]
    fn test_record_to_document() {
        let record = json!({ "name": "a", "tags": [1, 2] })
            .as_object()
            .cloned()
            .unwrap();
        let document = record_to_document(&record).unwrap();
        assert_eq!(document.get_str("name").unwrap(), "a");
        assert_eq!(document.get_array("tags").unwrap().len(), 2);
    }

    #[test]
    fn test_id_to_string() {
        let oid = ObjectId::new();
        assert_eq!(id_to_string(Bson::ObjectId(oid)), oid.to_hex());
        assert_eq!(id_to_string(Bson::String("custom".into())), "custom");
        assert_eq!(id_to_string(Bson::Int32(7)), "7");
    }

    #[tokio::test]
    async fn test_connect_requires_database() {
        let config = MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            ..MongoConfig::default()
        };
        let err = MongoStore::connect(&config).await.err().unwrap();
        assert!(matches!(err, ServiceError::Config(_)));
    }

    #[tokio::test]
    async fn test_connect_with_explicit_database() {
        let config = MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: Some("microservices".to_string()),
            ..MongoConfig::default()
        };
        assert!(MongoStore::connect(&config).await.is_ok());
    }
}
