//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::error::{ArangoError, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// Replays queued responses in order and records every request.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn push(&self, response: HttpResponse) {
        self.responses.lock().push_back(response);
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push(HttpResponse::json(status, &body));
    }

    /// Queue the response to one `GET /_api/database` listing.
    pub fn push_db_list(&self, names: &[&str]) {
        self.push_json(200, json!({"error": false, "code": 200, "result": names}));
    }

    /// Queue the pair of responses `databases()` consumes.
    pub fn push_databases(&self, user: &[&str], all: &[&str]) {
        self.push_db_list(user);
        self.push_db_list(all);
    }

    /// Queue the response to one `GET /_api/collection` listing.
    pub fn push_collections(&self, names: &[&str]) {
        self.push_json(200, collection_listing(names));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    pub fn pending(&self) -> usize {
        self.responses.lock().len()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let path = request.path.clone();
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| ArangoError::Transport(format!("no scripted response for {path}")))
    }
}

/// `GET /_api/collection` body with the given names.
pub fn collection_listing(names: &[&str]) -> Value {
    let result: Vec<Value> = names
        .iter()
        .map(|name| json!({"name": name, "isSystem": name.starts_with('_')}))
        .collect();
    json!({"error": false, "code": 200, "result": result})
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` under a `warn`-level subscriber and return what it logged.
pub fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock()).into_owned();
    (result, logs)
}
