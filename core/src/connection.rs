//! HTTP verbs against one server, optionally scoped to one database.
//!
//! # Design
//! `Connection` is split the same way throughout: `build_request` turns a
//! verb, path and optional JSON body into an `HttpRequest`, and
//! `parse_response` turns an `HttpResponse` into a `Response`. Both are pure.
//! The verb methods (`get`, `post`, ...) glue the two together through the
//! configured `Transport`.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{ArangoError, Result, ResponseError};
use crate::http::{encode_segment, HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

/// A parsed server response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status_code: u16,
    pub reason: String,
    /// The JSON body. `None` for HEAD, empty bodies and non-JSON bodies.
    pub obj: Option<Value>,
}

impl Response {
    /// Borrow a top-level field of the JSON body.
    pub fn field(&self, name: &str) -> Result<&Value> {
        self.obj
            .as_ref()
            .and_then(|obj| obj.get(name))
            .ok_or_else(|| {
                ArangoError::UnexpectedResponse(format!(
                    "{} {}: body has no '{name}' field",
                    self.status_code, self.reason
                ))
                .logged()
            })
    }

    /// Deserialize a top-level field of the JSON body.
    pub fn field_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.field(name)?;
        serde_json::from_value(value.clone())
            .map_err(|e| ArangoError::UnexpectedResponse(format!("field '{name}': {e}")).logged())
    }

    /// Wrap this response in the failing operation's error and log it.
    pub fn failure(&self, make: fn(ResponseError) -> ArangoError) -> ArangoError {
        make(ResponseError::from_response(self)).logged()
    }

    /// Deserialize the whole JSON body.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T> {
        let obj = self.obj.clone().ok_or_else(|| {
            ArangoError::UnexpectedResponse(format!("{} {}: empty body", self.status_code, self.reason)).logged()
        })?;
        serde_json::from_value(obj).map_err(|e| ArangoError::UnexpectedResponse(e.to_string()).logged())
    }
}

/// Issues requests to the server described by a `ClientConfig`.
#[derive(Debug, Clone)]
pub struct Connection {
    config: Arc<ClientConfig>,
    db_name: Option<String>,
    authorization: Option<String>,
    transport: Arc<dyn Transport>,
}

impl Connection {
    /// An unscoped connection; paths resolve against the server root.
    pub fn new(config: Arc<ClientConfig>, transport: Arc<dyn Transport>) -> Self {
        let authorization = config.username.as_ref().map(|username| {
            let password = config.password.as_deref().unwrap_or_default();
            format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
        });
        Self {
            config,
            db_name: None,
            authorization,
            transport,
        }
    }

    /// A connection with the same server and credentials, bound to `db_name`.
    pub fn scoped(&self, db_name: &str) -> Self {
        Self {
            db_name: Some(db_name.to_string()),
            ..self.clone()
        }
    }

    pub fn db_name(&self) -> Option<&str> {
        self.db_name.as_deref()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        match &self.db_name {
            Some(name) => format!("{}/_db/{}{path}", self.config.base_url(), encode_segment(name)),
            None => format!("{}{path}", self.config.base_url()),
        }
    }

    pub fn build_request(&self, method: HttpMethod, path: &str, data: Option<&Value>) -> HttpRequest {
        let mut headers = Vec::new();
        if let Some(authorization) = &self.authorization {
            headers.push(("authorization".to_string(), authorization.clone()));
        }
        if data.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            path: self.url(path),
            headers,
            body: data.map(Value::to_string),
        }
    }

    pub fn parse_response(&self, method: HttpMethod, response: HttpResponse) -> Response {
        let reason = ureq::http::StatusCode::from_u16(response.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("Unknown")
            .to_string();
        let obj = if method == HttpMethod::Head || response.body.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&response.body).ok()
        };
        Response {
            status_code: response.status,
            reason,
            obj,
        }
    }

    fn send(&self, method: HttpMethod, path: &str, data: Option<&Value>) -> Result<Response> {
        let request = self.build_request(method, path, data);
        tracing::debug!(%method, url = %request.path, "sending request");
        let response = self
            .transport
            .execute(request)
            .map_err(ArangoError::logged)?;
        let response = self.parse_response(method, response);
        tracing::debug!(%method, path, status = response.status_code, "received response");
        Ok(response)
    }

    pub fn get(&self, path: &str) -> Result<Response> {
        self.send(HttpMethod::Get, path, None)
    }

    pub fn post(&self, path: &str, data: &Value) -> Result<Response> {
        self.send(HttpMethod::Post, path, Some(data))
    }

    pub fn put(&self, path: &str, data: Option<&Value>) -> Result<Response> {
        self.send(HttpMethod::Put, path, data)
    }

    pub fn delete(&self, path: &str) -> Result<Response> {
        self.send(HttpMethod::Delete, path, None)
    }

    pub fn head(&self, path: &str) -> Result<Response> {
        self.send(HttpMethod::Head, path, None)
    }
}
