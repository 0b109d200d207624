use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::storage::{ObjectStore, ObjectSummary, StoredObject};

#[derive(Debug, Clone)]
struct MemoryObject {
    body: Vec<u8>,
    metadata: HashMap<String, String>,
    last_modified: DateTime<Utc>,
}

/// In-process bucket, listed in key order like S3.
///
/// Only built for tests, or with the `test-util` feature.
#[derive(Debug)]
pub struct MemoryStore {
    bucket: String,
    objects: Mutex<BTreeMap<String, MemoryObject>>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn insert(
        &self,
        key: impl Into<String>,
        body: Vec<u8>,
        metadata: HashMap<String, String>,
        last_modified: DateTime<Utc>,
    ) {
        self.lock().insert(
            key.into(),
            MemoryObject {
                body,
                metadata,
                last_modified,
            },
        );
    }

    /// Contents of an object, if present
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).map(|object| object.body.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, MemoryObject>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        Ok(self
            .lock()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectSummary {
                key: key.clone(),
                last_modified: object.last_modified,
            })
            .collect())
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject> {
        self.lock()
            .get(key)
            .map(|object| StoredObject {
                body: object.body.clone(),
                metadata: object.metadata.clone(),
            })
            .ok_or_else(|| Error::storage("fetching", key, "no such key"))
    }

    async fn put_object(&self, key: &str, body: Vec<u8>, _content_type: &str) -> Result<()> {
        self.insert(key, body, HashMap::new(), Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_memory_store_lists_prefix_in_key_order() {
        let store = MemoryStore::new("bucket");
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        store.insert("charts/b.tgz", vec![], HashMap::new(), time);
        store.insert("other/c.tgz", vec![], HashMap::new(), time);
        store.insert("charts/a.tgz", vec![], HashMap::new(), time);

        let listed = store.list_objects("charts/").await.unwrap();

        let keys: Vec<&str> = listed.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["charts/a.tgz", "charts/b.tgz"]);
        assert_eq!(listed[0].last_modified, time);
        assert_eq!(store.list_objects("").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_memory_store_get_and_put() {
        let store = MemoryStore::new("bucket");
        let mut metadata = HashMap::new();
        metadata.insert("chart-digest".to_string(), "abcd".to_string());
        store.insert("a.tgz", b"data".to_vec(), metadata, Utc::now());

        let object = store.get_object("a.tgz").await.unwrap();
        assert_eq!(object.body, b"data");
        assert_eq!(object.metadata["chart-digest"], "abcd");

        let missing = store.get_object("b.tgz").await.unwrap_err();
        assert!(matches!(missing, Error::Storage { .. }));

        store
            .put_object("index.yaml", b"apiVersion: v2\n".to_vec(), "application/x-yaml")
            .await
            .unwrap();
        assert_eq!(store.get("index.yaml").unwrap(), b"apiVersion: v2\n");
    }
}
