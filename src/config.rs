//! Runtime settings for the generator.
//!
//! Settings are resolved in layers, later layers winning:
//! built-in defaults, the TOML config file, the `.env` file in the working
//! directory, process environment variables, and finally command-line flags
//! (applied by the command layer).

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{GeneratorError, Result};
use crate::models::{Priority, TestType};

/// Directory name under the platform config dir (e.g. `~/.config/`).
const CONFIG_DIR_NAME: &str = "test-case-generator";
const CONFIG_FILE_NAME: &str = "config.toml";
/// Config file looked up in the working directory before the global one.
pub const LOCAL_CONFIG_FILE: &str = "testgen.toml";
pub const ENV_FILE: &str = ".env";

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_VAR: &str = "OPENAI_MODEL";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// API key for the chat-completions provider. Usually comes from the
    /// environment or `.env` rather than the config file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Extra attempts after the first one for transient failures.
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub timeout_secs: u64,
    pub default_test_type: TestType,
    pub default_priority: Priority,
    /// Ask the model once more for valid JSON when its reply cannot be parsed.
    pub reprompt_on_parse_error: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_retries: 3,
            initial_backoff_ms: 1000,
            timeout_secs: 60,
            default_test_type: TestType::Integration,
            default_priority: Priority::Medium,
            reprompt_on_parse_error: true,
        }
    }
}

impl Settings {
    /// Load settings from every layer except command-line flags.
    ///
    /// `explicit_path` must exist when given; the implicit locations are
    /// optional.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut settings = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(GeneratorError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(path)?
            }
            None => match default_config_path() {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        load_env_file(Path::new(ENV_FILE));
        settings.apply_env(|name| env::var(name).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| GeneratorError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| GeneratorError::Config(e.to_string()))
    }

    /// Overlay values taken from environment variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_blank(API_KEY_VAR) {
            self.api_key = Some(key.trim().to_string());
        }
        if let Some(url) = non_blank(BASE_URL_VAR) {
            self.base_url = url.trim().to_string();
        }
        if let Some(model) = non_blank(MODEL_VAR) {
            self.model = model.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(GeneratorError::Config(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        if self.timeout_secs == 0 {
            return Err(GeneratorError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(GeneratorError::Config("model must not be empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(GeneratorError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        Ok(())
    }

    /// The API key, or an auth error when none is configured.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(GeneratorError::Auth(format!(
                "{} not found. Run `setup` or add it to a .env file",
                API_KEY_VAR
            ))),
        }
    }
}

/// Path of the global config file (`<config dir>/test-case-generator/config.toml`).
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// First existing config file: the local `testgen.toml`, then the global one.
fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    global_config_path().filter(|path| path.is_file())
}

/// Load a dotenv file into the process environment.
///
/// Variables already set in the environment are left untouched.
fn load_env_file(path: &Path) {
    if !path.is_file() {
        return;
    }
    match dotenvy::from_path(path) {
        Ok(()) => debug!(path = %path.display(), "Loaded environment file"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable environment file"),
    }
}

/// Contents written by `setup` to the `.env` file.
pub fn env_file_contents(api_key: &str, model: Option<&str>) -> String {
    let mut out = format!("{}={}\n", API_KEY_VAR, api_key.trim());
    if let Some(model) = model.map(str::trim).filter(|m| !m.is_empty()) {
        out.push_str(&format!("{}={}\n", MODEL_VAR, model));
    }
    out.push_str("# Add other configuration here\n");
    out
}
