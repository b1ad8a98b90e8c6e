use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use requestdesk_core::domain::catalog::{CatalogProduct, CostCenter};
use requestdesk_core::domain::request::Request;

use crate::repositories::StoreError;

/// A record kept in a JSON collection document.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn record_id(&self) -> i64;
}

impl Record for Request {
    fn record_id(&self) -> i64 {
        self.id.0
    }
}

impl Record for CatalogProduct {
    fn record_id(&self) -> i64 {
        self.id.0
    }
}

impl Record for CostCenter {
    fn record_id(&self) -> i64 {
        self.id
    }
}

/// One pretty-printed JSON array on disk.
///
/// The file is the only source of truth: every call reads it fresh and every
/// mutation rewrites it in full. Mutations inside this process are serialized
/// by `write_lock`; writers in other processes are not coordinated and can
/// still lose updates between our read and our rewrite.
pub struct JsonCollection<T> {
    name: &'static str,
    path: PathBuf,
    write_lock: Mutex<()>,
    _records: PhantomData<fn() -> T>,
}

impl<T: Record> JsonCollection<T> {
    pub fn new(name: &'static str, path: impl Into<PathBuf>) -> Self {
        Self { name, path: path.into(), write_lock: Mutex::new(()), _records: PhantomData }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read path. A missing, unreadable or malformed document yields an empty
    /// collection.
    pub async fn load(&self) -> Vec<T> {
        match self.read_strict().await {
            Ok(records) => records,
            Err(error) => {
                warn!(
                    event_name = "store.collection.degraded",
                    collection = self.name,
                    path = %self.path.display(),
                    error = %error,
                    "collection document unusable, serving empty collection"
                );
                Vec::new()
            }
        }
    }

    /// Re-reads the document, applies `change`, and rewrites the document when
    /// `change` succeeds. A document that exists but cannot be decoded is an
    /// error here rather than an empty list, so a write never clobbers data it
    /// could not read.
    pub async fn mutate<R>(
        &self,
        change: impl FnOnce(&mut Vec<T>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.read_strict().await?;
        let outcome = change(&mut records)?;
        self.persist(&records).await?;

        debug!(
            event_name = "store.collection.persisted",
            collection = self.name,
            records = records.len(),
            "collection document rewritten"
        );
        Ok(outcome)
    }

    async fn read_strict(&self) -> Result<Vec<T>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path: self.path.clone(), source }),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw).map_err(|source| StoreError::Decode {
            path: self.path.clone(),
            reason: source.to_string(),
        })
    }

    async fn persist(&self, records: &[T]) -> Result<(), StoreError> {
        let encoded = serde_json::to_string_pretty(records)
            .map_err(|source| StoreError::Encode(source.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
        }

        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, encoded)
            .await
            .map_err(|source| StoreError::Io { path: staging.clone(), source })?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|source| StoreError::Io { path: self.path.clone(), source })
    }
}

/// Next id for a collection: max existing id plus one, or 1 when empty.
pub fn next_id<T: Record>(collection: &'static str, records: &[T]) -> Result<i64, StoreError> {
    match records.iter().map(Record::record_id).max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or(StoreError::IdSpaceExhausted { collection }),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use requestdesk_core::domain::catalog::{CatalogProduct, ProductId};

    use super::{next_id, JsonCollection};
    use crate::repositories::StoreError;

    fn product(id: i64, label: &str) -> CatalogProduct {
        CatalogProduct { id: ProductId(id), label: label.to_string(), price: Decimal::new(1999, 2) }
    }

    #[tokio::test]
    async fn missing_document_loads_as_empty() {
        let dir = TempDir::new().expect("tempdir");
        let collection =
            JsonCollection::<CatalogProduct>::new("products", dir.path().join("products.json"));

        assert!(collection.load().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_document_degrades_on_read_and_blocks_writes() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("products.json");
        tokio::fs::write(&path, "{ not json").await.expect("write garbage");
        let collection = JsonCollection::<CatalogProduct>::new("products", &path);

        assert!(collection.load().await.is_empty());

        let error = collection
            .mutate(|records| {
                records.push(product(1, "Laptop"));
                Ok(())
            })
            .await
            .expect_err("decode failure");
        assert!(matches!(error, StoreError::Decode { .. }));
        let untouched = tokio::fs::read_to_string(&path).await.expect("read back");
        assert_eq!(untouched, "{ not json");
    }

    #[tokio::test]
    async fn mutation_rewrites_pretty_printed_array() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested").join("products.json");
        let collection = JsonCollection::<CatalogProduct>::new("products", &path);

        collection
            .mutate(|records| {
                records.push(product(1, "Laptop"));
                Ok(())
            })
            .await
            .expect("mutate");

        let raw = tokio::fs::read_to_string(&path).await.expect("read back");
        assert!(raw.starts_with("[\n"));
        assert!(raw.contains("\"label\": \"Laptop\""));
        assert_eq!(collection.load().await, vec![product(1, "Laptop")]);
    }

    #[tokio::test]
    async fn failed_change_leaves_document_untouched() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("products.json");
        let collection = JsonCollection::<CatalogProduct>::new("products", &path);

        let result: Result<(), StoreError> = collection
            .mutate(|records| {
                records.push(product(1, "Laptop"));
                Err(StoreError::NotFound { collection: "products", id: 9 })
            })
            .await;

        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn next_id_is_max_plus_one() {
        assert_eq!(next_id::<CatalogProduct>("products", &[]).expect("id"), 1);
        assert_eq!(next_id("products", &[product(4, "A"), product(2, "B")]).expect("id"), 5);
    }

    #[test]
    fn next_id_after_i64_max_is_an_error() {
        let result = next_id("products", &[product(i64::MAX, "A")]);

        assert!(matches!(result, Err(StoreError::IdSpaceExhausted { collection: "products" })));
    }
}
