//! Request and response payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Databases visible to the authenticated user and all databases on the
/// server, each in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseList {
    pub user: Vec<String>,
    pub all: Vec<String>,
}

/// A user to create alongside a new database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseUser {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl DatabaseUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            passwd: None,
            active: None,
            extra: None,
        }
    }

    pub fn with_password(mut self, passwd: impl Into<String>) -> Self {
        self.passwd = Some(passwd.into());
        self
    }
}

/// Body of `POST /_api/database`. `users` is omitted entirely when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDatabase {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<DatabaseUser>>,
}

/// Body of `GET /_api/version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub server: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

/// One entry of `GET /_api/collection`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInfo {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_system: bool,
}

/// Body of `POST /_api/collection`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCollection {
    pub name: String,
}

/// Identity of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_rev")]
    pub rev: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_database_omits_missing_users() {
        let body = serde_json::to_value(CreateDatabase {
            name: "shop".to_string(),
            users: None,
        })
        .unwrap();
        assert_eq!(body, json!({"name": "shop"}));
    }

    #[test]
    fn create_database_includes_users() {
        let body = serde_json::to_value(CreateDatabase {
            name: "shop".to_string(),
            users: Some(vec![DatabaseUser::new("admin").with_password("pw")]),
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"name": "shop", "users": [{"username": "admin", "passwd": "pw"}]})
        );
    }

    #[test]
    fn collection_info_reads_server_fields() {
        let info: CollectionInfo = serde_json::from_value(json!({
            "id": "1234",
            "name": "_graphs",
            "isSystem": true,
            "status": 3,
            "type": 2
        }))
        .unwrap();
        assert_eq!(info.name, "_graphs");
        assert!(info.is_system);
    }

    #[test]
    fn document_meta_uses_underscore_names() {
        let meta: DocumentMeta =
            serde_json::from_value(json!({"_id": "users/1", "_key": "1", "_rev": "_a"})).unwrap();
        assert_eq!(meta.id, "users/1");
        assert_eq!(meta.key, "1");
    }
}
