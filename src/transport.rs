//! HTTP access for the manifest service, injected into the clients instead of a global client

use std::{collections::HashMap, sync::Mutex, time::Duration};

use bytes::Bytes;
use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

pub trait Transport: Send + Sync {
    /// Fetch the whole body at `url`. Anything other than a successful response is an error.
    fn get(&self, url: &Url) -> Result<Bytes>;
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    /// Limit on a whole request, including the body transfer
    pub timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        // Short timeout for initial connection, but none for transfer to allow for fetching large
        // chunks on a poor network connection
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: None,
        }
    }
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::transport("<client>", format!("Failed to build client: {e}")))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> Result<Bytes> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::transport(url, e))?;

        response.bytes().map_err(|e| Error::transport(url, e))
    }
}

/// Serves canned bodies keyed by URL. Unknown URLs fail like a 404.
#[derive(Default)]
pub struct MemoryTransport {
    bodies: HashMap<String, Bytes>,
    requests: Mutex<Vec<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: &str, body: impl Into<Bytes>) {
        self.bodies.insert(url.to_string(), body.into());
    }

    /// Every URL requested so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Transport for MemoryTransport {
    fn get(&self, url: &Url) -> Result<Bytes> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.to_string());

        self.bodies
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| Error::transport(url, "404 Not Found"))
    }
}
