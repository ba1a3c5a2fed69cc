//! Client for the external "submit SQL, get CSV" catalog capability.
//!
//! The spatial catalog lives behind a separate query-manager service;
//! this module only knows how to hand it a SQL string and take back a
//! CSV body.  The per-request timeout travels in the
//! `X-DL-TimeoutRequest` header, in seconds.

use std::time::Duration;

/// Default catalog timeout, seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Errors from the external catalog call
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Transport-level failure
    #[error("catalog transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Catalog answered with a non-success status
    #[error("catalog returned status {0}: {1}")]
    Status(u16, String),

    /// Catalog body was not CSV
    #[error("catalog returned a non-CSV body: {0}")]
    NotCsv(String),
}

/// Asynchronous catalog client used by the service's dataset adapters.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl CatalogClient {
    /// Build a client for the query manager at `base_url`.
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        CatalogClient {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Submit `sql` and return the CSV text.
    pub async fn query_csv(&self, sql: &str) -> Result<String, CatalogError> {
        log::debug!("catalog SQL: {sql}");
        let resp = self
            .http
            .get(format!("{}/query", self.base_url))
            .query(&[("sql", sql), ("ofmt", "csv")])
            .header("X-DL-TimeoutRequest", self.timeout.as_secs().to_string())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(CatalogError::Status(
                status.as_u16(),
                body.chars().take(200).collect(),
            ));
        }
        // The query manager reports some failures as 200s with an HTML or
        // error-text body; reject anything that cannot be CSV.
        if body.trim_start().starts_with('<') || body.to_ascii_lowercase().starts_with("error") {
            return Err(CatalogError::NotCsv(body.chars().take(200).collect()));
        }
        Ok(body)
    }
}
