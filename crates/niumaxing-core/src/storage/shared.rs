//! Optional shared key-value capability.
//!
//! The shared store is where the global counter lives when several users
//! point at the same backend. It is injected as `Option<Box<dyn SharedStore>>`;
//! having none is the ordinary single-device setup.

use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use crate::error::StoreError;

/// JSON-valued store shared between users.
///
/// `shared` mirrors the host capability's scope flag: `true` addresses the
/// record visible to everyone, `false` a record private to the caller.
pub trait SharedStore {
    fn get(&self, key: &str, shared: bool) -> Result<Option<serde_json::Value>, StoreError>;
    fn set(&self, key: &str, value: &serde_json::Value, shared: bool) -> Result<(), StoreError>;
}

/// Shared store reached over HTTP.
///
/// - `GET  <base>/kv/<key>?shared=<bool>`: 200 with a JSON body, 404 when absent
/// - `PUT  <base>/kv/<key>?shared=<bool>`: JSON body, any 2xx is success
///
/// Requests run on a private current-thread runtime, so the store must be
/// used from synchronous code.
pub struct HttpSharedStore {
    base: Url,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpSharedStore {
    /// Build a store for `base_url` with a per-request timeout.
    ///
    /// # Errors
    /// Returns an error if the URL cannot be parsed or cannot carry a path,
    /// or if the HTTP client or runtime cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(StoreError::Unavailable(format!(
                "shared store url cannot hold a path: {base_url}"
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to start runtime: {e}")))?;

        Ok(Self {
            base,
            client,
            runtime,
        })
    }

    fn key_url(&self, key: &str, shared: bool) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Unavailable(format!("invalid shared store url: {}", self.base)))?
            .pop_if_empty()
            .push("kv")
            .push(key);
        url.query_pairs_mut()
            .append_pair("shared", if shared { "true" } else { "false" });
        Ok(url)
    }
}

impl SharedStore for HttpSharedStore {
    fn get(&self, key: &str, shared: bool) -> Result<Option<serde_json::Value>, StoreError> {
        let url = self.key_url(key, shared)?;
        tracing::debug!(%url, "shared store get");

        self.runtime.block_on(async {
            let resp = self.client.get(url).send().await?;
            match resp.status() {
                StatusCode::NOT_FOUND => Ok(None),
                status if status.is_success() => {
                    let value: serde_json::Value = resp.json().await?;
                    Ok((!value.is_null()).then_some(value))
                }
                status => Err(StoreError::Http {
                    status: status.as_u16(),
                }),
            }
        })
    }

    fn set(&self, key: &str, value: &serde_json::Value, shared: bool) -> Result<(), StoreError> {
        let url = self.key_url(key, shared)?;
        tracing::debug!(%url, "shared store set");

        self.runtime.block_on(async {
            let resp = self.client.put(url).json(value).send().await?;
            let status = resp.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(StoreError::Http {
                    status: status.as_u16(),
                })
            }
        })
    }
}
