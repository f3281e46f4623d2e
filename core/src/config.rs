use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ArangoError, Result};

/// Where and how to reach the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Whole-request timeout in milliseconds; `None` or `0` waits indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_protocol() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8529
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
            timeout_ms: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with any `ARANGO_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(protocol) = lookup("ARANGO_PROTOCOL") {
            config.protocol = protocol;
        }
        if let Some(host) = lookup("ARANGO_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("ARANGO_PORT") {
            config.port = port
                .parse()
                .map_err(|_| ArangoError::Config(format!("ARANGO_PORT is not a port: '{port}'")))?;
        }
        if let Some(username) = lookup("ARANGO_USERNAME") {
            config.username = Some(username);
        }
        if let Some(password) = lookup("ARANGO_PASSWORD") {
            config.password = Some(password);
        }
        if let Some(timeout) = lookup("ARANGO_TIMEOUT_MS") {
            let ms = timeout
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| {
                    ArangoError::Config(format!("ARANGO_TIMEOUT_MS is not a positive number: '{timeout}'"))
                })?;
            config.timeout_ms = Some(ms);
        }
        Ok(config)
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sub-millisecond remainders round up, so a non-zero timeout never
    /// becomes zero.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let ms = timeout.as_micros().div_ceil(1000);
        self.timeout_ms = Some(u64::try_from(ms).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    /// `{protocol}://{host}:{port}` with no trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}
