//! AUR RPC v5 client.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use tracing::{debug, warn};

use crate::aur::source::AurSource;
use crate::error::{AurPlanError, Result};
use crate::types::AurRecord;

/// Default AUR endpoint.
const DEFAULT_BASE_URL: &str = "https://aur.archlinux.org";

/// Maximum encoded query URL length in bytes; the RPC rejects longer ones.
const MAX_QUERY_LENGTH: usize = 8000;

/// Maximum random jitter added to retry delays.
const RETRY_JITTER_MAX_MS: u64 = 250;

/// What: Split query parameters so every request URL stays within bounds.
///
/// Inputs:
/// - `max_length`: Maximum total query length in bytes.
/// - `base_length`: Length of the URL without any parameter.
/// - `per_append`: Constant cost added per parameter (separator + key).
/// - `names`: The parameters to distribute.
///
/// Output:
/// - Returns parameter groups, one per request; `InvalidInput` when a
///   single parameter alone exceeds the bound.
fn split_query<'a>(
    max_length: usize,
    base_length: usize,
    per_append: usize,
    names: &[&'a str],
) -> Result<Vec<Vec<&'a str>>> {
    let mut chunks: Vec<Vec<&'a str>> = vec![Vec::new()];
    let mut current_length = base_length;

    for name in names {
        let append_length = name.len() + per_append;
        if current_length + append_length <= max_length {
            if let Some(current) = chunks.last_mut() {
                current.push(name);
            }
            current_length += append_length;
        } else {
            chunks.push(vec![name]);
            current_length = base_length + append_length;
        }

        if current_length > max_length {
            return Err(AurPlanError::InvalidInput(format!(
                "Query too long because of '{name}'"
            )));
        }
    }

    chunks.retain(|chunk| !chunk.is_empty());
    Ok(chunks)
}

/// Builder for [`AurClient`].
#[derive(Clone, Debug)]
pub struct AurClientBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: String,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl Default for AurClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(5),
            user_agent: concat!("aurplan/", env!("CARGO_PKG_VERSION")).to_string(),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl AurClientBuilder {
    /// Override the AUR endpoint (tests point this at a local server).
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// User agent sent with every request.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Number of retries after a failed request (0 disables retrying).
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Base delay for the exponential retry backoff.
    #[must_use]
    pub const fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionProblem` when the underlying HTTP client cannot be
    /// constructed.
    pub fn build(self) -> Result<AurClient> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()?;
        Ok(AurClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            max_retries: self.max_retries,
            retry_base_delay: self.retry_base_delay,
        })
    }
}

/// Client for the AUR RPC v5 endpoints.
///
/// Queries are chunked so no request URL exceeds the RPC's length bound, and
/// failed requests are retried a bounded number of times with jittered
/// exponential backoff.
#[derive(Clone, Debug)]
pub struct AurClient {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl AurClient {
    /// Create a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionProblem` when the underlying HTTP client cannot be
    /// constructed.
    pub fn new() -> Result<Self> {
        AurClientBuilder::default().build()
    }

    /// Start building a customized client.
    #[must_use]
    pub fn builder() -> AurClientBuilder {
        AurClientBuilder::default()
    }

    /// Perform one GET with bounded retries and parse the RPC envelope.
    async fn get_records(&self, url: &str) -> Result<Vec<AurRecord>> {
        let mut attempt = 0;
        let json: Value = loop {
            let outcome = async {
                let response = self.http.get(url).send().await?.error_for_status()?;
                response.json::<Value>().await
            }
            .await;

            match outcome {
                Ok(json) => break json,
                Err(error) if attempt < self.max_retries => {
                    let jitter = rand::rng().random_range(0..=RETRY_JITTER_MAX_MS);
                    let delay = self.retry_base_delay * 2_u32.saturating_pow(attempt)
                        + Duration::from_millis(jitter);
                    warn!(
                        %error,
                        attempt,
                        delay_ms = delay.as_millis(),
                        "AUR request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    warn!(%error, url, "AUR request failed");
                    return Err(error.into());
                }
            }
        };

        let Some(results) = json.get("results") else {
            warn!(url, "AUR response carries no results field");
            return Ok(Vec::new());
        };
        let records: Vec<AurRecord> = serde_json::from_value(results.clone())?;
        Ok(records)
    }
}

#[async_trait]
impl AurSource for AurClient {
    async fn info(&self, names: &[&str]) -> Result<Vec<AurRecord>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let base = format!("{}/rpc/v5/info?", self.base_url);
        let chunks = split_query(MAX_QUERY_LENGTH, base.len(), "&arg[]=".len(), names)?;

        let mut records = Vec::new();
        for chunk in chunks {
            let mut url = base.clone();
            for (index, name) in chunk.iter().enumerate() {
                if index > 0 {
                    url.push('&');
                }
                url.push_str("arg[]=");
                url.push_str(name);
            }
            debug!(names = chunk.len(), "fetching AUR package info");
            records.extend(self.get_records(&url).await?);
        }

        debug!(found = records.len(), "AUR info fetch completed");
        Ok(records)
    }

    async fn search(&self, query: &str) -> Result<Vec<AurRecord>> {
        let url = format!("{}/rpc/v5/search/{query}", self.base_url);
        debug!(%query, "searching AUR");
        self.get_records(&url).await
    }

    async fn search_by_name(&self, query: &str) -> Result<Vec<AurRecord>> {
        let url = format!("{}/rpc/v5/search/{query}?by=name", self.base_url);
        debug!(%query, "searching AUR by name");
        self.get_records(&url).await
    }
}
