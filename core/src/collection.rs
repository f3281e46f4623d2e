//! Handle for a single collection and its documents.
//!
//! # Design
//! A `Collection` is a name plus the owning database's scoped `Connection`.
//! It holds no cached state, so the handle stays valid for as long as the
//! collection exists on the server. Collection names and document keys are
//! percent-encoded before they are placed in a URL.

use serde_json::Value;

use crate::connection::Connection;
use crate::error::{ArangoError, Result};
use crate::http::encode_segment;
use crate::types::DocumentMeta;

/// One collection inside one database.
#[derive(Debug)]
pub struct Collection {
    name: String,
    conn: Connection,
}

impl Collection {
    /// `conn` must already be scoped to the owning database.
    pub fn new(name: impl Into<String>, conn: Connection) -> Self {
        Self {
            name: name.into(),
            conn,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the database this collection belongs to.
    pub fn database(&self) -> &str {
        self.conn.db_name().unwrap_or("_system")
    }

    fn collection_path(&self, action: &str) -> String {
        format!("/_api/collection/{}/{action}", encode_segment(&self.name))
    }

    fn document_path(&self, key: Option<&str>) -> String {
        let base = format!("/_api/document/{}", encode_segment(&self.name));
        match key {
            Some(key) => format!("{base}/{}", encode_segment(key)),
            None => base,
        }
    }

    pub fn count(&self) -> Result<u64> {
        let res = self.conn.get(&self.collection_path("count"))?;
        if res.status_code != 200 {
            return Err(res.failure(ArangoError::CollectionCount));
        }
        res.field_as("count")
    }

    /// Remove every document, keeping the collection itself.
    pub fn truncate(&self) -> Result<()> {
        let res = self.conn.put(&self.collection_path("truncate"), None)?;
        if res.status_code != 200 {
            return Err(res.failure(ArangoError::CollectionTruncate));
        }
        Ok(())
    }

    pub fn document(&self, key: &str) -> Result<Value> {
        let res = self.conn.get(&self.document_path(Some(key)))?;
        if res.status_code != 200 {
            return Err(res.failure(ArangoError::DocumentGet));
        }
        res.obj
            .ok_or_else(|| ArangoError::UnexpectedResponse("document body is empty".to_string()).logged())
    }

    pub fn create_document(&self, document: &Value) -> Result<DocumentMeta> {
        let res = self.conn.post(&self.document_path(None), document)?;
        // 202 means accepted without waiting for sync.
        if res.status_code != 201 && res.status_code != 202 {
            return Err(res.failure(ArangoError::DocumentCreate));
        }
        res.body_as()
    }

    pub fn delete_document(&self, key: &str) -> Result<()> {
        let res = self.conn.delete(&self.document_path(Some(key)))?;
        if res.status_code != 200 && res.status_code != 202 {
            return Err(res.failure(ArangoError::DocumentDelete));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::http::HttpMethod;
    use crate::testing::ScriptedTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn collection() -> (Collection, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::default());
        let conn = Connection::new(Arc::new(ClientConfig::default()), transport.clone()).scoped("shop");
        (Collection::new("orders", conn), transport)
    }

    #[test]
    fn count_reads_count_field() {
        let (coll, transport) = collection();
        transport.push_json(200, json!({"name": "orders", "count": 42}));
        assert_eq!(coll.count().unwrap(), 42);
        assert_eq!(
            transport.requests()[0].path,
            "http://localhost:8529/_db/shop/_api/collection/orders/count"
        );
    }

    #[test]
    fn truncate_uses_put() {
        let (coll, transport) = collection();
        transport.push_json(200, json!({"name": "orders"}));
        coll.truncate().unwrap();
        let req = &transport.requests()[0];
        assert_eq!(req.method, HttpMethod::Put);
        assert!(req.body.is_none());
    }

    #[test]
    fn document_not_found_carries_response() {
        let (coll, transport) = collection();
        transport.push_json(
            404,
            json!({"error": true, "code": 404, "errorNum": 1202, "errorMessage": "document not found"}),
        );
        let err = coll.document("missing").unwrap_err();
        match err {
            ArangoError::DocumentGet(r) => {
                assert_eq!(r.status, 404);
                assert_eq!(r.message.as_deref(), Some("document not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn create_document_accepts_202() {
        let (coll, transport) = collection();
        transport.push_json(202, json!({"_id": "orders/1", "_key": "1", "_rev": "_x"}));
        let meta = coll.create_document(&json!({"total": 10})).unwrap();
        assert_eq!(meta.key, "1");

        let req = &transport.requests()[0];
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"total": 10}));
    }

    #[test]
    fn create_document_rejects_conflict() {
        let (coll, transport) = collection();
        transport.push_json(409, json!({"error": true, "errorNum": 1210, "errorMessage": "unique constraint violated"}));
        assert!(matches!(
            coll.create_document(&json!({"_key": "1"})),
            Err(ArangoError::DocumentCreate(_))
        ));
    }

    #[test]
    fn delete_document_status_handling() {
        let (coll, transport) = collection();
        transport.push_json(200, json!({"_id": "orders/1", "_key": "1", "_rev": "_x"}));
        transport.push_json(404, json!({"error": true, "errorNum": 1202}));
        coll.delete_document("1").unwrap();
        assert!(matches!(coll.delete_document("1"), Err(ArangoError::DocumentDelete(_))));
    }

    #[test]
    fn document_keys_are_percent_encoded() {
        let (coll, transport) = collection();
        transport.push_json(200, json!({"_key": "50%ff"}));
        transport.push_json(200, json!({"_key": "a:b@c"}));
        coll.document("50%ff").unwrap();
        coll.delete_document("a:b@c").unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].path, "http://localhost:8529/_db/shop/_api/document/orders/50%25ff");
        assert_eq!(requests[1].path, "http://localhost:8529/_db/shop/_api/document/orders/a%3Ab%40c");
    }

    #[test]
    fn database_name_comes_from_connection() {
        let (coll, _) = collection();
        assert_eq!(coll.database(), "shop");
    }
}
