//! Error types for the ArangoDB client.
//!
//! # Design
//! Every server-facing operation has its own variant so callers can match on
//! exactly what failed. Variants raised by a non-success status carry a
//! `ResponseError` with the triggering status, reason phrase and, when the
//! server sent one, its `errorMessage`.

use std::fmt;

use crate::connection::Response;

/// The response that caused an operation to fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseError {
    pub status: u16,
    pub reason: String,
    pub message: Option<String>,
}

impl ResponseError {
    pub fn from_response(response: &Response) -> Self {
        let message = response
            .obj
            .as_ref()
            .and_then(|obj| obj.get("errorMessage"))
            .and_then(|m| m.as_str())
            .map(str::to_string);
        Self {
            status: response.status_code,
            reason: response.reason.clone(),
            message,
        }
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.reason)?;
        if let Some(message) = &self.message {
            write!(f, " ({message})")?;
        }
        Ok(())
    }
}

/// Errors returned by the client, database and collection handles.
#[derive(Debug, thiserror::Error)]
pub enum ArangoError {
    /// The connectivity check at construction failed.
    #[error("failed to connect to '{host}' ({})", connect_detail(.status, .reason))]
    Connection {
        host: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("failed to get server version: {0}")]
    Version(ResponseError),

    #[error("failed to list databases: {0}")]
    DatabaseList(ResponseError),

    #[error("failed to create database: {0}")]
    DatabaseCreate(ResponseError),

    #[error("failed to delete database: {0}")]
    DatabaseDelete(ResponseError),

    /// The database is absent even after the cache was rebuilt.
    #[error("database '{0}' not found")]
    DatabaseNotFound(String),

    #[error("failed to list collections: {0}")]
    CollectionList(ResponseError),

    #[error("failed to create collection: {0}")]
    CollectionCreate(ResponseError),

    #[error("failed to delete collection: {0}")]
    CollectionDelete(ResponseError),

    #[error("collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("failed to count collection documents: {0}")]
    CollectionCount(ResponseError),

    #[error("failed to truncate collection: {0}")]
    CollectionTruncate(ResponseError),

    #[error("failed to get document: {0}")]
    DocumentGet(ResponseError),

    #[error("failed to create document: {0}")]
    DocumentCreate(ResponseError),

    #[error("failed to delete document: {0}")]
    DocumentDelete(ResponseError),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A success status whose body lacks the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ArangoError {
    /// Emit this error as a `warn` event and hand it back.
    pub(crate) fn logged(self) -> Self {
        tracing::warn!(error = %self, "request failed");
        self
    }

    /// The failing response, for variants raised by a non-success status.
    pub fn response(&self) -> Option<&ResponseError> {
        match self {
            ArangoError::Version(r)
            | ArangoError::DatabaseList(r)
            | ArangoError::DatabaseCreate(r)
            | ArangoError::DatabaseDelete(r)
            | ArangoError::CollectionList(r)
            | ArangoError::CollectionCreate(r)
            | ArangoError::CollectionDelete(r)
            | ArangoError::CollectionCount(r)
            | ArangoError::CollectionTruncate(r)
            | ArangoError::DocumentGet(r)
            | ArangoError::DocumentCreate(r)
            | ArangoError::DocumentDelete(r) => Some(r),
            _ => None,
        }
    }
}

fn connect_detail(status: &Option<u16>, reason: &str) -> String {
    match status {
        Some(status) => format!("{status}: {reason}"),
        None => reason.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ArangoError>;
