//! One named database and the operations it exposes.
//!
//! # Design
//! `DatabaseApi` is the capability set of a database. `Database` implements
//! it against its own scoped `Connection`; `ArangoClient` implements it by
//! forwarding to its `_system` database. Collection handles are cached and
//! reconciled against the server listing the same way the client caches
//! database handles.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::HandleCache;
use crate::collection::Collection;
use crate::connection::Connection;
use crate::error::{ArangoError, Result};
use crate::http::encode_segment;
use crate::types::{CollectionInfo, CreateCollection};

/// Operations every database handle supports.
pub trait DatabaseApi {
    fn name(&self) -> &str;

    /// Names of all collections, system collections included.
    fn collection_names(&self) -> Result<Vec<String>>;

    /// Handle for an existing collection. Rebuilds the collection cache once
    /// on a miss before giving up with `CollectionNotFound`.
    fn collection(&self, name: &str) -> Result<Arc<Collection>>;

    fn create_collection(&self, name: &str) -> Result<Arc<Collection>>;

    fn delete_collection(&self, name: &str) -> Result<()>;
}

#[derive(Debug)]
pub struct Database {
    name: String,
    conn: Connection,
    collections: Mutex<HandleCache<Collection>>,
}

impl Database {
    pub fn new(name: impl Into<String>, conn: Connection) -> Self {
        Self {
            name: name.into(),
            conn,
            collections: Mutex::new(HandleCache::default()),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Full `GET /_api/collection` listing.
    pub fn collection_infos(&self) -> Result<Vec<CollectionInfo>> {
        let res = self.conn.get("/_api/collection")?;
        if res.status_code != 200 {
            return Err(res.failure(ArangoError::CollectionList));
        }
        res.field_as("result")
    }

    pub fn cached_collection_names(&self) -> Vec<String> {
        self.collections.lock().names()
    }

    /// Reconcile the collection cache with the server listing.
    pub fn invalidate_collection_cache(&self) -> Result<()> {
        let mut cache = self.collections.lock();
        self.rebuild(&mut cache)
    }

    fn rebuild(&self, cache: &mut HandleCache<Collection>) -> Result<()> {
        let live = self.collection_names()?;
        let stats = cache.reconcile(live, |name| Collection::new(name, self.conn.clone()));
        tracing::debug!(
            database = %self.name,
            evicted = stats.evicted,
            inserted = stats.inserted,
            retained = stats.retained,
            "collection cache reconciled"
        );
        Ok(())
    }
}

impl DatabaseApi for Database {
    fn name(&self) -> &str {
        &self.name
    }

    fn collection_names(&self) -> Result<Vec<String>> {
        Ok(self.collection_infos()?.into_iter().map(|info| info.name).collect())
    }

    fn collection(&self, name: &str) -> Result<Arc<Collection>> {
        let mut cache = self.collections.lock();
        if let Some(collection) = cache.get(name) {
            return Ok(collection);
        }
        self.rebuild(&mut cache)?;
        cache
            .get(name)
            .ok_or_else(|| ArangoError::CollectionNotFound(name.to_string()).logged())
    }

    fn create_collection(&self, name: &str) -> Result<Arc<Collection>> {
        let data = serde_json::to_value(CreateCollection { name: name.to_string() })
            .map_err(|e| ArangoError::from(e).logged())?;
        let res = self.conn.post("/_api/collection", &data)?;
        if res.status_code != 200 {
            return Err(res.failure(ArangoError::CollectionCreate));
        }
        tracing::info!(database = %self.name, collection = name, "collection created");
        let mut cache = self.collections.lock();
        self.rebuild(&mut cache)?;
        cache
            .get(name)
            .ok_or_else(|| ArangoError::CollectionNotFound(name.to_string()).logged())
    }

    fn delete_collection(&self, name: &str) -> Result<()> {
        let res = self.conn.delete(&format!("/_api/collection/{}", encode_segment(name)))?;
        if res.status_code != 200 {
            return Err(res.failure(ArangoError::CollectionDelete));
        }
        tracing::info!(database = %self.name, collection = name, "collection deleted");
        self.invalidate_collection_cache()
    }
}
