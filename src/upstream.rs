use reqwest::Url;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::error::DownloadError;
use crate::metrics::{UPSTREAM_ERRORS, UPSTREAM_LATENCY};
use crate::models::UpstreamResult;

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

// Client for the extraction API - one attempt per call, no retries
pub struct UpstreamClient {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(client: reqwest::Client, config: UpstreamConfig) -> Self {
        Self { client, config }
    }

    pub async fn extract(&self, url: &str, stream: &str) -> Result<UpstreamResult, DownloadError> {
        let start_time = Instant::now();

        let endpoint = Url::parse_with_params(
            &self.config.endpoint,
            &[
                ("url", url),
                ("stream", stream),
                ("api_key", self.config.api_key.as_str()),
            ],
        )
        .map_err(|e| DownloadError::Unknown(format!("bad upstream endpoint: {e}")))?;

        let result = self
            .client
            .get(endpoint)
            .header(USER_AGENT, BROWSER_UA)
            .header(ACCEPT, "application/json")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .timeout(self.config.timeout)
            .send()
            .await;

        let outcome = match result {
            Ok(res) if res.status().is_success() => match res.json::<UpstreamResult>().await {
                Ok(body) => Ok(body),
                Err(e) if e.is_timeout() => Err(DownloadError::UpstreamTimeout),
                Err(e) => Err(DownloadError::Unknown(format!("parse error: {e}"))),
            },
            Ok(res) => Err(DownloadError::UpstreamStatus {
                status: res.status(),
            }),
            Err(e) if e.is_timeout() => Err(DownloadError::UpstreamTimeout),
            Err(e) => Err(DownloadError::Unknown(format!("request failed: {e}"))),
        };

        UPSTREAM_LATENCY.observe(start_time.elapsed().as_secs_f64());

        match &outcome {
            Ok(_) => debug!(elapsed = ?start_time.elapsed(), "upstream answered"),
            Err(err) => {
                UPSTREAM_ERRORS.inc();
                warn!(error = ?err, status = %err.status(), "upstream call failed");
            }
        }

        outcome
    }
}
