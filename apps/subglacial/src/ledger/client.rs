//! # Ledger HTTP Client
//!
//! `RecordStore` over another server's ledger gateway (`/available`,
//! `/data/{key}`). Values travel as base64 inside JSON bodies.

use crate::api::{AvailableResponse, DataResponse, PutDataRequest, PutDataResponse};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Method, StatusCode, Url};
use subglacial_core::{RecordStore, StoreError, SubglacialError, WriteError};

/// HTTP client for a remote ledger gateway.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl LedgerClient {
    /// Create a client pointing at `base_url` (e.g. `http://ledger:8080`).
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, SubglacialError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            SubglacialError::Config(format!("invalid ledger URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SubglacialError::Config(format!(
                "ledger URL '{}' cannot be a base",
                base_url
            )));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        })
    }

    /// The gateway this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/{segments...}`, each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Build a request with optional Bearer auth.
    fn request(&self, method: Method, segments: &[&str]) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, self.url(segments));
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }
}

impl RecordStore for LedgerClient {
    async fn available(&self) -> bool {
        let resp = match self.request(Method::GET, &["available"]).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::debug!(status = %resp.status(), "Ledger availability probe refused");
                return false;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ledger unreachable");
                return false;
            }
        };
        resp.json::<AvailableResponse>()
            .await
            .map(|body| body.available)
            .unwrap_or(false)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let resp = self
            .request(Method::GET, &["data", key])
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    StoreError::Unavailable
                } else {
                    StoreError::Read(e.to_string())
                }
            })?;

        match resp.status() {
            StatusCode::SERVICE_UNAVAILABLE => return Err(StoreError::Unavailable),
            status if !status.is_success() => {
                return Err(StoreError::Read(format!("gateway returned {}", status)));
            }
            _ => {}
        }

        let body: DataResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Read(format!("bad gateway response: {}", e)))?;
        STANDARD
            .decode(body.value.as_bytes())
            .map_err(|e| StoreError::Read(format!("bad base64 value: {}", e)))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), WriteError> {
        let body = PutDataRequest {
            value: STANDARD.encode(value),
        };
        let resp = self
            .request(Method::PUT, &["data", key])
            .json(&body)
            .send()
            .await
            .map_err(|e| WriteError::Failed(e.to_string()))?;

        let status = resp.status();
        match resp.json::<PutDataResponse>().await {
            Ok(PutDataResponse { success: true, .. }) if status.is_success() => Ok(()),
            Ok(PutDataResponse { error, .. }) => Err(WriteError::from_reason(
                error.unwrap_or_else(|| format!("gateway returned {}", status)),
            )),
            Err(_) => Err(WriteError::Failed(format!("gateway returned {}", status))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
