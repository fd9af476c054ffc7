pub mod gemini;
pub mod openai;

pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;

use crate::types::{OptimizerError, Result};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::{Client, Response, StatusCode};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Transport settings shared by the HTTP backends.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_seconds: 2,
        }
    }
}

impl HttpConfig {
    pub(crate) fn build_client(&self) -> Result<Client> {
        Ok(Client::builder()
            .user_agent("feed-optimizer/0.1")
            .timeout(Duration::from_secs(self.timeout_seconds))
            .build()?)
    }

    fn backoff(&self) -> ExponentialBackoff<backoff::SystemClock> {
        let initial = Duration::from_secs(self.retry_delay_seconds.max(1));
        ExponentialBackoff {
            current_interval: initial,
            initial_interval: initial,
            max_interval: initial * 16,
            multiplier: 2.0,
            max_elapsed_time: Some(initial * 60),
            ..Default::default()
        }
    }
}

/// 429 is not retried here: a retry would spend quota the classifier's governor
/// never sees, so throttling goes straight back to the provider fallback.
fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error()
}

/// Send a request, retrying server errors with exponential backoff.
/// Any other non-success status is returned as a backend error right away.
pub(crate) async fn send_with_retry<F, Fut>(
    adapter: &str,
    config: &HttpConfig,
    mut send: F,
) -> Result<Response>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = reqwest::Result<Response>>,
{
    let mut backoff = config.backoff();
    let mut last_error = None;

    for attempt in 0..=config.max_retries {
        match send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let error = OptimizerError::backend(
                    adapter,
                    format!("HTTP {}: {}", status, crate::utils::truncate_to_char_boundary(&body, 200)),
                );
                if !is_retryable(status) {
                    return Err(error);
                }
                last_error = Some(error);
            }
            Err(e) => last_error = Some(OptimizerError::Http(e)),
        }

        if attempt < config.max_retries {
            if let Some(delay) = backoff.next_backoff() {
                warn!("{} attempt {} failed, retrying in {:?}", adapter, attempt + 1, delay);
                tokio::time::sleep(delay).await;
                continue;
            }
        }
        break;
    }

    Err(last_error.unwrap_or_else(|| OptimizerError::backend(adapter, "request failed")))
}
