//! Top-level client: server bootstrap and database management.
//!
//! # Design
//! `ArangoClient` verifies the server with `HEAD /_api/version` before it
//! hands out a value, so holding a client means the server answered at least
//! once. Database handles live in a `HandleCache` that is only ever rebuilt
//! from the server listing: on a `db()` miss and after every successful
//! create or delete. The cache sits behind a mutex that `db()` holds across
//! lookup, rebuild and recheck, so concurrent callers never interleave a
//! rebuild.
//!
//! Everything `DatabaseApi` offers is also available on the client itself,
//! forwarded to the `_system` database.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cache::HandleCache;
use crate::collection::Collection;
use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::database::{Database, DatabaseApi};
use crate::error::{ArangoError, Result};
use crate::http::encode_segment;
use crate::transport::{Transport, UreqTransport};
use crate::types::{CreateDatabase, DatabaseList, DatabaseUser, VersionInfo};

/// Name of the database every server has and the client delegates to.
pub const DEFAULT_DATABASE: &str = "_system";

#[derive(Debug)]
pub struct ArangoClient {
    config: Arc<ClientConfig>,
    conn: Connection,
    databases: Mutex<HandleCache<Database>>,
    default_database: Arc<Database>,
}

impl ArangoClient {
    /// Connect over HTTP with a fresh `UreqTransport`.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(UreqTransport::new(&config));
        Self::with_transport(config, transport)
    }

    /// Connect through any transport. Fails with `ArangoError::Connection`
    /// unless `HEAD /_api/version` answers 200.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let config = Arc::new(config);
        let conn = Connection::new(config.clone(), transport);

        let res = conn.head("/_api/version").map_err(|e| ArangoError::Connection {
            host: config.host.clone(),
            status: None,
            reason: e.to_string(),
        })?;
        if res.status_code != 200 {
            tracing::warn!(host = %config.host, status = res.status_code, "connectivity check failed");
            return Err(ArangoError::Connection {
                host: config.host.clone(),
                status: Some(res.status_code),
                reason: res.reason,
            });
        }
        tracing::info!(url = %config.base_url(), "connected");

        let default_database = Arc::new(Database::new(DEFAULT_DATABASE, conn.clone()));
        Ok(Self {
            config,
            conn,
            databases: Mutex::new(HandleCache::default()),
            default_database,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The `_system` database, reached through the unscoped connection.
    pub fn default_database(&self) -> &Arc<Database> {
        &self.default_database
    }

    pub fn version_info(&self) -> Result<VersionInfo> {
        let res = self.conn.get("/_api/version")?;
        if res.status_code != 200 {
            return Err(res.failure(ArangoError::Version));
        }
        res.body_as()
    }

    pub fn version(&self) -> Result<String> {
        let res = self.conn.get("/_api/version")?;
        if res.status_code != 200 {
            return Err(res.failure(ArangoError::Version));
        }
        res.field_as("version")
    }

    /// Databases visible to the current user, then all databases.
    pub fn databases(&self) -> Result<DatabaseList> {
        let res = self.conn.get("/_api/database/user")?;
        if res.status_code != 200 {
            return Err(res.failure(ArangoError::DatabaseList));
        }
        let user = res.field_as("result")?;

        let res = self.conn.get("/_api/database")?;
        if res.status_code != 200 {
            return Err(res.failure(ArangoError::DatabaseList));
        }
        let all = res.field_as("result")?;

        Ok(DatabaseList { user, all })
    }

    /// Handle for an existing database. A cache miss rebuilds the cache once
    /// before failing with `DatabaseNotFound`.
    pub fn db(&self, name: &str) -> Result<Arc<Database>> {
        let mut cache = self.databases.lock();
        if let Some(db) = cache.get(name) {
            return Ok(db);
        }
        self.rebuild(&mut cache)?;
        cache
            .get(name)
            .ok_or_else(|| ArangoError::DatabaseNotFound(name.to_string()).logged())
    }

    /// Create a database. `users` is sent only when non-empty.
    pub fn create_database(&self, name: &str, users: Option<&[DatabaseUser]>) -> Result<()> {
        let payload = CreateDatabase {
            name: name.to_string(),
            users: users.filter(|u| !u.is_empty()).map(<[DatabaseUser]>::to_vec),
        };
        let data = serde_json::to_value(&payload).map_err(|e| ArangoError::from(e).logged())?;
        let res = self.conn.post("/_api/database", &data)?;
        if res.status_code != 201 {
            return Err(res.failure(ArangoError::DatabaseCreate));
        }
        tracing::info!(database = name, "database created");
        self.invalidate_database_cache()
    }

    pub fn delete_database(&self, name: &str) -> Result<()> {
        let res = self.conn.delete(&format!("/_api/database/{}", encode_segment(name)))?;
        if res.status_code != 200 {
            return Err(res.failure(ArangoError::DatabaseDelete));
        }
        tracing::info!(database = name, "database deleted");
        self.invalidate_database_cache()
    }

    /// Reconcile the database cache with the server's full listing.
    pub fn invalidate_database_cache(&self) -> Result<()> {
        let mut cache = self.databases.lock();
        self.rebuild(&mut cache)
    }

    pub fn cached_database_names(&self) -> Vec<String> {
        self.databases.lock().names()
    }

    fn rebuild(&self, cache: &mut HandleCache<Database>) -> Result<()> {
        let live = self.databases()?.all;
        let stats = cache.reconcile(live, |name| Database::new(name, self.conn.scoped(name)));
        tracing::info!(
            evicted = stats.evicted,
            inserted = stats.inserted,
            retained = stats.retained,
            "database cache reconciled"
        );
        Ok(())
    }
}

impl DatabaseApi for ArangoClient {
    fn name(&self) -> &str {
        self.default_database.name()
    }

    fn collection_names(&self) -> Result<Vec<String>> {
        self.default_database.collection_names()
    }

    fn collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.default_database.collection(name)
    }

    fn create_collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.default_database.create_collection(name)
    }

    fn delete_collection(&self, name: &str) -> Result<()> {
        self.default_database.delete_collection(name)
    }
}
