//! MOENV open-data API client.
//!
//! Provides blocking HTTP access to the `aqx_p_432` hourly AQI dataset.
//! Uses reqwest with rustls for TLS.

use std::time::Duration;

use reqwest::blocking::{Client, Request};
use tracing::{debug, instrument, warn};

use crate::errors::AqiError;
use crate::models::{RawRecord, parse_payload};

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("aqimap/", env!("CARGO_PKG_VERSION"));

/// Hourly AQI dataset endpoint.
pub const MOENV_AQI_URL: &str = "https://data.moenv.gov.tw/api/v2/aqx_p_432";

/// Default number of records requested; more than the number of stations.
pub const DEFAULT_LIMIT: usize = 1000;

/// First retry waits this long; each further retry doubles it.
const BACKOFF_BASE_SECS: u64 = 1;

/// Client for the MOENV AQI API.
pub struct MoenvClient {
    client: Client,
    base_url: String,
    api_key: String,
    backoff_base: Duration,
}

impl MoenvClient {
    /// Create a new client for the given API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client cannot be initialized.
    pub fn new(api_key: &str) -> Result<Self, AqiError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AqiError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: MOENV_AQI_URL.to_string(),
            api_key: api_key.to_string(),
            backoff_base: Duration::from_secs(BACKOFF_BASE_SECS),
        })
    }

    /// Point the client at a different endpoint (mirrors, tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_request(&self, limit: usize) -> Result<Request, AqiError> {
        let limit = limit.to_string();
        let request = self
            .client
            .get(&self.base_url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("limit", limit.as_str()),
                ("sort", "ImportDate"),
                ("order", "desc"),
                ("format", "JSON"),
            ])
            .build()?;
        Ok(request)
    }

    /// Fetch the latest AQI records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self))]
    pub fn fetch_records(&self, limit: usize) -> Result<Vec<RawRecord>, AqiError> {
        let request = self.build_request(limit)?;

        debug!("fetching AQI records from {}", self.base_url);

        let response = self.client.execute(request)?;

        // Check status before parsing
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AqiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text()?;
        let records = parse_payload(&body)?;

        debug!("fetched {} records", records.len());
        Ok(records)
    }

    /// Fetch with up to `attempts` tries, backing off exponentially between
    /// them. Only transport errors and 5xx responses are retried.
    ///
    /// # Errors
    ///
    /// Returns the last error once attempts are exhausted, or the first
    /// non-retryable error.
    pub fn fetch_with_retry(&self, limit: usize, attempts: u32) -> Result<Vec<RawRecord>, AqiError> {
        let attempts = attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.fetch_records(limit) {
                Ok(records) => return Ok(records),
                Err(e) if e.is_transient() && attempt < attempts => {
                    let delay = backoff_delay(self.backoff_base, attempt);
                    warn!(
                        "fetch attempt {}/{} failed, retrying in {:?}: {}",
                        attempt, attempts, delay, e
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Delay before retry number `attempt` (1-based): `base`, then doubling.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6);
    base * (1u32 << exponent)
}
