//! Document store layer
//!
//! Handlers only ever read the whole collection or insert one record.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use crate::StoreError;
use async_trait::async_trait;

/// A schema-less JSON object as stored in the collection
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Field the store uses for its assigned identifier
pub const ID_FIELD: &str = "_id";

/// Backend holding the record collection
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch every record, without the identifier field
    async fn find_all(&self) -> Result<Vec<Record>, StoreError>;

    /// Insert one record and return its assigned identifier
    async fn insert_one(&self, record: Record) -> Result<String, StoreError>;

    /// Round-trip to the backend
    async fn ping(&self) -> Result<(), StoreError>;
}
