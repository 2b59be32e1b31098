use thiserror::Error;

/// Maximum number of characters of a raw model reply shown on the terminal.
const RAW_PREVIEW_LIMIT: usize = 2000;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited by the API provider: {0}")]
    RateLimited(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Could not parse model response: {message}")]
    Parse { message: String, raw: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt cancelled: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Process exit codes.
pub mod codes {
    pub const SUCCESS: i32 = 0;

    /// At least one story of a batch failed; the others were written.
    pub const PARTIAL_FAILURE: i32 = 1;

    pub const INVALID_INPUT: i32 = 2;

    pub const AUTH: i32 = 3;

    /// Network failure, exhausted retries, or a non-retryable API error.
    pub const NETWORK: i32 = 4;

    pub const PARSE: i32 = 5;

    pub const IO: i32 = 6;
}

impl GeneratorError {
    pub fn parse(message: impl Into<String>, raw: impl Into<String>) -> Self {
        GeneratorError::Parse {
            message: message.into(),
            raw: raw.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            GeneratorError::Auth(_) => codes::AUTH,
            GeneratorError::RateLimited(_)
            | GeneratorError::Network(_)
            | GeneratorError::Api { .. } => codes::NETWORK,
            GeneratorError::Parse { .. } => codes::PARSE,
            GeneratorError::InvalidInput(_)
            | GeneratorError::Config(_)
            | GeneratorError::Prompt(_) => codes::INVALID_INPUT,
            GeneratorError::Io(_) | GeneratorError::Json(_) | GeneratorError::Csv(_) => codes::IO,
        }
    }

    /// Whether the failed API call may succeed if attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GeneratorError::RateLimited(_) | GeneratorError::Network(_)
        )
    }

    /// The raw model reply for parse failures, truncated for display.
    pub fn raw_preview(&self) -> Option<String> {
        match self {
            GeneratorError::Parse { raw, .. } if !raw.trim().is_empty() => {
                if raw.chars().count() > RAW_PREVIEW_LIMIT {
                    let head: String = raw.chars().take(RAW_PREVIEW_LIMIT).collect();
                    Some(format!("{}\n... (truncated)", head))
                } else {
                    Some(raw.clone())
                }
            }
            _ => None,
        }
    }
}

impl From<inquire::InquireError> for GeneratorError {
    fn from(err: inquire::InquireError) -> Self {
        GeneratorError::Prompt(err.to_string())
    }
}
