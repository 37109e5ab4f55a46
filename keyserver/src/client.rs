//! HTTP client for an HKP keyserver.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::error::KeyserverError;
use crate::index::{parse_index, IndexEntry};

pub const DEFAULT_KEYSERVER_URL: &str = "https://keyserver.ubuntu.com";

/// Default timeout for keyserver requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const PGP_KEYS_MEDIA_TYPE: &str = "application/pgp-keys";

/// Client for one keyserver.
///
/// - `GET /pks/lookup?op=get` returns an armored key
/// - `GET /pks/lookup?op=index` returns the machine-readable index
/// - `POST /pks/add` uploads an armored key
#[derive(Clone, Debug)]
pub struct KeyserverClient {
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
    base_url: String,
}

/// Strip whitespace and any `0x` prefix from a key id or fingerprint.
pub(crate) fn search_term(key_id: &str) -> String {
    let compact: String = key_id.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(&compact);
    format!("0x{}", digits.to_ascii_uppercase())
}

impl KeyserverClient {
    /// Create a client with default timeout settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn lookup_url(&self) -> String {
        format!("{}/pks/lookup", self.base_url)
    }

    /// Fetch the armored public key for a key id or fingerprint.
    pub async fn fetch_key(&self, key_id: &str) -> Result<String, KeyserverError> {
        let search = search_term(key_id);
        tracing::debug!(keyserver = %self.base_url, %search, "fetching key");

        let response = self
            .http_client
            .get(self.lookup_url())
            .query(&[
                ("op", "get"),
                ("options", "mr"),
                ("fingerprint", "on"),
                ("search", search.as_str()),
            ])
            .header(ACCEPT, PGP_KEYS_MEDIA_TYPE)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(KeyserverError::KeyNotFound(search));
        }
        if !response.status().is_success() {
            return Err(KeyserverError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        if !body.contains("BEGIN PGP PUBLIC KEY BLOCK") {
            return Err(KeyserverError::InvalidResponse(
                "response carries no armored public key".into(),
            ));
        }
        Ok(body)
    }

    /// Search the machine-readable index for a key id or fingerprint.
    ///
    /// A 404 means no match and yields an empty list.
    pub async fn search_index(&self, key_id: &str) -> Result<Vec<IndexEntry>, KeyserverError> {
        let search = search_term(key_id);
        tracing::debug!(keyserver = %self.base_url, %search, "searching index");

        let response = self
            .http_client
            .get(self.lookup_url())
            .query(&[
                ("op", "index"),
                ("options", "mr"),
                ("fingerprint", "on"),
                ("search", search.as_str()),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(KeyserverError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        parse_index(&response.text().await?)
    }

    /// Upload an armored public key.
    pub async fn publish(&self, armored: &str) -> Result<(), KeyserverError> {
        let response = self
            .http_client
            .post(format!("{}/pks/add", self.base_url))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&[("keytext", armored)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(KeyserverError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }
        tracing::info!(keyserver = %self.base_url, "published key");
        Ok(())
    }
}
