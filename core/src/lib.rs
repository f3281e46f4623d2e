//! Blocking client for the ArangoDB HTTP API.
//!
//! # Overview
//! `ArangoClient` bootstraps a verified session, lists, creates and deletes
//! databases, and hands out `Database` handles from a cache that is rebuilt
//! from the server listing whenever it may be stale. Collection and document
//! operations live on `Database` and `Collection`; the client forwards the
//! `DatabaseApi` operations to its `_system` database.
//!
//! # Design
//! - Requests and responses are plain data (`http`). A `Connection` builds
//!   and parses them; a `Transport` carries them over the wire.
//! - `UreqTransport` is the production transport. Tests swap in scripted
//!   transports, so every operation is testable without a server.
//! - Each failing operation has its own `ArangoError` variant carrying the
//!   response that caused it.

pub mod cache;
pub mod client;
pub mod collection;
pub mod config;
pub mod connection;
pub mod database;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::{ArangoClient, DEFAULT_DATABASE};
pub use collection::Collection;
pub use config::ClientConfig;
pub use connection::{Connection, Response};
pub use database::{Database, DatabaseApi};
pub use error::{ArangoError, ResponseError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{CollectionInfo, CreateDatabase, DatabaseList, DatabaseUser, DocumentMeta, VersionInfo};
