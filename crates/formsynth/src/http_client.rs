//! Async HTTP transport wrapping reqwest.
//!
//! Fetches the form page and posts form-encoded responses. GET retries on
//! 5xx and backs off on 429; POST is sent exactly once.

use std::time::Duration;

use async_trait::async_trait;

use crate::types::{FormError, FormResult};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/131.0.0.0 Safari/537.36";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

const MAX_RETRIES: u32 = 2;

/// What the form pipeline needs from the network.
#[async_trait]
pub trait FormTransport: Send + Sync {
    /// GET `url` and return the body text of a successful response.
    async fn fetch(&self, url: &str) -> FormResult<String>;

    /// POST `fields` form-encoded to `url` and return the status code.
    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> FormResult<u16>;
}

/// reqwest-backed [`FormTransport`].
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
    backoff_base: Duration,
}

impl HttpClient {
    /// Create a client with a browser user-agent.
    pub fn new(timeout_ms: u64) -> FormResult<Self> {
        let timeout = Duration::from_millis(timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            timeout,
            backoff_base: Duration::from_millis(500),
        })
    }

    /// Override the first retry delay (doubles on each further retry).
    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    fn backoff(&self, retries: u32) -> Duration {
        self.backoff_base * 2u32.pow(retries.saturating_sub(1))
    }
}

#[async_trait]
impl FormTransport for HttpClient {
    async fn fetch(&self, url: &str) -> FormResult<String> {
        let mut retries = 0u32;

        loop {
            let resp = self.client.get(url).timeout(self.timeout).send().await;

            match resp {
                Ok(r) => {
                    let status = r.status().as_u16();

                    // Retry on 5xx
                    if status >= 500 && retries < MAX_RETRIES {
                        retries += 1;
                        tracing::debug!("GET {url} returned {status}; retry {retries}");
                        tokio::time::sleep(self.backoff(retries)).await;
                        continue;
                    }

                    // Backoff on 429
                    if status == 429 && retries < MAX_RETRIES {
                        retries += 1;
                        let retry_after = r
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .map(Duration::from_secs)
                            .unwrap_or_else(|| self.backoff(retries));
                        tracing::debug!("GET {url} rate limited; waiting {retry_after:?}");
                        tokio::time::sleep(retry_after.min(Duration::from_secs(10))).await;
                        continue;
                    }

                    if !r.status().is_success() {
                        return Err(FormError::FetchStatus { status });
                    }
                    return Ok(r.text().await?);
                }
                Err(e) => {
                    if retries < MAX_RETRIES && (e.is_timeout() || e.is_connect()) {
                        retries += 1;
                        tracing::debug!("GET {url} failed ({e}); retry {retries}");
                        tokio::time::sleep(self.backoff(retries)).await;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }

    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> FormResult<u16> {
        let r = self
            .client
            .post(url)
            .timeout(self.timeout)
            .form(fields)
            .send()
            .await?;
        Ok(r.status().as_u16())
    }
}
