//! In-process record store
//!
//! Used for local runs without MongoDB and as the test double for handlers.

use crate::StoreError;
use crate::storage::{ID_FIELD, Record, RecordStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Record store kept in memory
pub struct MemoryStore {
    records: Mutex<Vec<Record>>,
    next_id: AtomicU64,
    available: AtomicBool,
    find_calls: AtomicU64,
    insert_calls: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            available: AtomicBool::new(true),
            find_calls: AtomicU64::new(0),
            insert_calls: AtomicU64::new(0),
        }
    }

    /// Simulate the backend going away (or coming back)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of `find_all` calls served
    pub fn find_calls(&self) -> u64 {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// Number of `insert_one` calls served
    pub fn insert_calls(&self) -> u64 {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Record>, StoreError> {
        self.check_available()?;
        self.find_calls.fetch_add(1, Ordering::SeqCst);

        let records = self.records.lock();
        Ok(records
            .iter()
            .map(|record| {
                let mut record = record.clone();
                record.remove(ID_FIELD);
                record
            })
            .collect())
    }

    async fn insert_one(&self, mut record: Record) -> Result<String, StoreError> {
        self.check_available()?;
        self.insert_calls.fetch_add(1, Ordering::SeqCst);

        // A client-supplied _id is kept as-is, whatever its type
        let id = match record.get(ID_FIELD) {
            Some(serde_json::Value::String(existing)) => existing.clone(),
            Some(existing) => existing.to_string(),
            None => {
                let id = format!("{:024x}", self.next_id.fetch_add(1, Ordering::SeqCst));
                record.insert(ID_FIELD.to_string(), serde_json::Value::String(id.clone()));
                id
            }
        };

        self.records.lock().push(record);
        Ok(id)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
