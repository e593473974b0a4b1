use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::contexts::GenerationError;

/// Delay unit for retries; attempt `n` waits `n` times this.
const BACKOFF_STEP: Duration = Duration::from_millis(500);

/// Width used when flattening HTML error pages.
const ERROR_TEXT_WIDTH: usize = 100;

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Http(format!("request timed out: {}", e))
        } else {
            GenerationError::Http(e.to_string())
        }
    }
}

/// Transport knobs shared by every provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout: Duration,
    pub retries: u32,
}

impl RequestOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.request_timeout_secs),
            retries: settings.request_retries,
        }
    }

    pub fn client(&self) -> Result<Client, GenerationError> {
        Ok(Client::builder().timeout(self.timeout).build()?)
    }

    /// Configured base URL without a trailing slash, or `default`.
    pub fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            max_tokens: None,
            temperature: None,
            timeout: Duration::from_secs(120),
            retries: 2,
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Sends the request built by `make`, retrying 429 and 5xx answers up to
/// `retries` more times with linear backoff.
///
/// Returns the first successful response. Error bodies are flattened to plain
/// text.
pub async fn send_with_retry<F>(retries: u32, make: F) -> Result<Response, GenerationError>
where
    F: Fn() -> RequestBuilder,
{
    let attempts = retries + 1;

    for attempt in 1..=attempts {
        let response = make().send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if is_retryable(status) && attempt < attempts {
            let delay = BACKOFF_STEP * attempt;
            warn!(
                "Provider answered {} (attempt {}/{}), retrying in {:?}",
                status.as_u16(),
                attempt,
                attempts,
                delay
            );
            tokio::time::sleep(delay).await;
            continue;
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GenerationError::RateLimited { attempts: attempt });
        }

        let body = response.text().await.unwrap_or_else(|_| "(no body)".into());
        debug!("Provider error body: {}", body);
        return Err(GenerationError::Api {
            status: status.as_u16(),
            message: clean_error_body(&body),
        });
    }

    Err(GenerationError::RateLimited { attempts })
}

/// Reduces a provider error body to a short human message.
///
/// JSON bodies yield their `error.message` (or string `error`) field, HTML
/// pages are rendered to text, anything else is trimmed as is.
pub fn clean_error_body(body: &str) -> String {
    let trimmed = body.trim();

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let error = &json["error"];
        if let Some(message) = error["message"].as_str().or_else(|| error.as_str()) {
            return message.to_string();
        }
    }

    if looks_like_html(trimmed) {
        if let Ok(text) = html2text::from_read(trimmed.as_bytes(), ERROR_TEXT_WIDTH) {
            return text.split_whitespace().collect::<Vec<_>>().join(" ");
        }
    }

    trimmed.to_string()
}

fn looks_like_html(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.starts_with("<!doctype html") || lower.starts_with("<html") || lower.contains("</body>")
}
