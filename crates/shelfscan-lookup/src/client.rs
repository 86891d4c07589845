//! HTTP client for the inventory lookup API.
//!
//! # Wire contract
//!
//! ```text
//! GET {base_url}/items/qr/scan/{code}
//!
//! 200  {"message": "...", "item": {...}}   -> Found(item)
//! 404  {"error": "No item found ..."}      -> NotFound
//! any other status, transport failure,
//! undecodable body, or timeout            -> TransientError
//! ```
//!
//! The code is sent as a single percent-encoded path segment, so labels
//! holding `/`, `?` or spaces cannot escape into the rest of the URL.
//!
//! # Timeout Handling
//!
//! Every request is bounded by [`LookupClientConfig::timeout`] (default
//! 30 s). Expiry surfaces as [`LookupError::Timeout`].

use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use shelfscan_core::constants::{DEFAULT_API_BASE_URL, DEFAULT_LOOKUP_TIMEOUT_MS, LOOKUP_PATH};
use shelfscan_core::{Item, ItemCode};
use tracing::{debug, info, warn};

use crate::{LookupClient, LookupError, LookupResult};

/// Configuration for the HTTP lookup client.
///
/// # Example
///
/// ```
/// use shelfscan_lookup::LookupClientConfig;
/// use std::time::Duration;
///
/// let config = LookupClientConfig::new("http://inventory.local/api")
///     .timeout(Duration::from_secs(5))
///     .auth_token("secret");
///
/// assert_eq!(config.timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupClientConfig {
    /// API root, e.g. `http://127.0.0.1:5000/api`.
    pub base_url: String,

    /// Upper bound for one lookup, connection included.
    pub timeout: Duration,

    /// Sent as `Authorization: Bearer <token>` when set.
    pub auth_token: Option<String>,
}

impl Default for LookupClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
            auth_token: None,
        }
    }
}

impl LookupClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// Successful body of the scan endpoint.
///
/// Older deployments return the bare item; both shapes are accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScanResponse {
    Envelope { item: Item },
    Bare(Item),
}

impl ScanResponse {
    fn into_item(self) -> Item {
        match self {
            Self::Envelope { item } | Self::Bare(item) => item,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Lookup client speaking to the inventory REST API.
///
/// The client is cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpLookupClient {
    http: reqwest::Client,

    base: Url,

    config: LookupClientConfig,
}

impl HttpLookupClient {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidUrl`] if the base URL does not parse or
    /// cannot carry path segments, and [`LookupError::Request`] if the HTTP
    /// stack cannot be initialised.
    pub fn new(config: LookupClientConfig) -> Result<Self, LookupError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| LookupError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(LookupError::InvalidUrl(config.base_url.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LookupError::Request(e.to_string()))?;

        Ok(Self { http, base, config })
    }

    pub fn config(&self) -> &LookupClientConfig {
        &self.config
    }

    /// Full URL used to resolve `code`.
    pub fn scan_url(&self, code: &ItemCode) -> Result<Url, LookupError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| LookupError::InvalidUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(LOOKUP_PATH)
            .push(code.as_str());
        Ok(url)
    }

    async fn fetch(&self, code: &ItemCode) -> Result<LookupResult, LookupError> {
        let url = self.scan_url(code)?;
        debug!(%url, "Looking up item code");

        let mut request = self.http.get(url);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        match status {
            StatusCode::OK => {
                let body = response.bytes().await?;
                let item = serde_json::from_slice::<ScanResponse>(&body)
                    .map_err(|e| LookupError::Decode(e.to_string()))?
                    .into_item();
                info!(code = %code, item_id = %item.id, name = %item.name, "Item found");
                Ok(LookupResult::Found(item))
            }
            StatusCode::NOT_FOUND => {
                info!(code = %code, "No item for code");
                Ok(LookupResult::NotFound)
            }
            _ => {
                let message = response
                    .json::<ErrorBody>()
                    .await
                    .ok()
                    .map(|body| body.error);
                Err(LookupError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

impl LookupClient for HttpLookupClient {
    async fn lookup(&self, code: &ItemCode) -> LookupResult {
        let limit = self.config.timeout;

        let outcome = match tokio::time::timeout(limit, self.fetch(code)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(LookupError::Timeout(limit.as_millis() as u64)),
        };

        match outcome {
            Ok(result) => result,
            Err(error) => {
                let error = match error {
                    LookupError::Timeout(_) => LookupError::Timeout(limit.as_millis() as u64),
                    other => other,
                };
                warn!(code = %code, error = %error, "Lookup failed");
                LookupResult::TransientError(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn client(base: &str) -> HttpLookupClient {
        HttpLookupClient::new(LookupClientConfig::new(base)).unwrap()
    }

    #[rstest]
    #[case("http://127.0.0.1:5000/api", "ITM-42", "http://127.0.0.1:5000/api/items/qr/scan/ITM-42")]
    #[case("http://127.0.0.1:5000/api/", "ITM-42", "http://127.0.0.1:5000/api/items/qr/scan/ITM-42")]
    #[case("http://host", "INV-abc", "http://host/items/qr/scan/INV-abc")]
    #[case(
        "http://host/api",
        "a/b?c d",
        "http://host/api/items/qr/scan/a%2Fb%3Fc%20d"
    )]
    fn test_scan_url(#[case] base: &str, #[case] code: &str, #[case] expected: &str) {
        let code = ItemCode::new(code).unwrap();
        assert_eq!(client(base).scan_url(&code).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("not a url")]
    #[case("mailto:someone@example.com")]
    fn test_invalid_base_url(#[case] base: &str) {
        let result = HttpLookupClient::new(LookupClientConfig::new(base));
        assert!(matches!(result, Err(LookupError::InvalidUrl(_))));
    }

    #[test]
    fn test_config_defaults() {
        let config = LookupClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_scan_response_shapes() {
        let envelope: ScanResponse =
            serde_json::from_str(r#"{"message": "Found item from QR code!", "item": {"id": 42, "name": "Bolts"}}"#)
                .unwrap();
        let bare: ScanResponse = serde_json::from_str(r#"{"id": 7, "name": "Nuts"}"#).unwrap();

        assert_eq!(envelope.into_item().id.as_u64(), 42);
        assert_eq!(bare.into_item().name, "Nuts");
    }
}
