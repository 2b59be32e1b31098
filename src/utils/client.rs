use reqwest::blocking::{Client, Response};
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde_json::Value;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{GeneratorError, Result};
use crate::utils::prompt::ChatRequest;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound for any single wait between attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Something that can answer a chat request with the assistant's text.
pub trait ChatBackend {
    fn complete(&self, request: &ChatRequest) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one.
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): doubles each time.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

/// Blocking client for OpenAI-compatible chat-completions endpoints.
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    retry: RetryPolicy,
}

impl OpenAiClient {
    /// Build a client from settings. Fails with an auth error, before any
    /// network traffic, when no API key is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| GeneratorError::Config(format!("failed to build HTTP client: {}", e)))?;
        Self::with_client(client, settings)
    }

    fn with_client(client: Client, settings: &Settings) -> Result<Self> {
        let api_key = settings.require_api_key()?.to_string();
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            api_key,
            retry: RetryPolicy {
                max_retries: settings.max_retries,
                initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            },
        })
    }

    fn send_once(&self, request: &ChatRequest) -> std::result::Result<String, Failure> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .map_err(|e| {
                let kind = if e.is_timeout() { "timed out" } else { "failed" };
                Failure::now(GeneratorError::Network(format!("request {}: {}", kind, e)))
            })?;

        let status = response.status();
        if status.is_success() {
            let body = response
                .text()
                .map_err(|e| Failure::now(GeneratorError::Network(format!("reading response: {}", e))))?;
            return extract_content(&body).map_err(Failure::now);
        }

        let retry_after = retry_after(&response);
        let message = error_message(response, status);
        Err(Failure {
            error: classify_status(status, message),
            retry_after,
        })
    }
}

impl ChatBackend for OpenAiClient {
    fn complete(&self, request: &ChatRequest) -> Result<String> {
        let mut retry = 0;
        loop {
            debug!(model = %request.model, attempt = retry + 1, endpoint = %self.endpoint, "Sending chat request");
            match self.send_once(request) {
                Ok(content) => {
                    info!(model = %request.model, "Received response from API");
                    return Ok(content);
                }
                Err(failure) if failure.error.is_transient() && retry < self.retry.max_retries => {
                    retry += 1;
                    let delay = failure
                        .retry_after
                        .map(|d| d.min(MAX_BACKOFF))
                        .unwrap_or_else(|| self.retry.backoff(retry));
                    warn!(
                        retry,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure.error,
                        "Transient API failure, will retry"
                    );
                    thread::sleep(delay);
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }
}

/// A failed attempt plus the server's requested wait, if any.
struct Failure {
    error: GeneratorError,
    retry_after: Option<Duration>,
}

impl Failure {
    fn now(error: GeneratorError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

/// Map a non-success status to the error taxonomy.
pub fn classify_status(status: StatusCode, message: String) -> GeneratorError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GeneratorError::Auth(format!("API key rejected ({}): {}", status, message))
        }
        StatusCode::TOO_MANY_REQUESTS => GeneratorError::RateLimited(message),
        StatusCode::REQUEST_TIMEOUT => GeneratorError::Network(format!("{}: {}", status, message)),
        s if s.is_server_error() => GeneratorError::Network(format!("{}: {}", status, message)),
        s => GeneratorError::Api {
            status: s.as_u16(),
            message,
        },
    }
}

/// Assistant text from a successful chat-completions body.
pub fn extract_content(body: &str) -> Result<String> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| GeneratorError::parse(format!("API returned invalid JSON: {}", e), body))?;

    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_string)
        .ok_or_else(|| GeneratorError::parse("API response has no message content", body))
}

/// The provider's `error.message`, falling back to the status text.
fn error_message(response: Response, status: StatusCode) -> String {
    let fallback = status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string();
    match response.json::<Value>() {
        Ok(error_json) => error_json
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
