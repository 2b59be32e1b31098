//! Story-to-test-cases pipeline: prompt, API call, parse.

use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{GeneratorError, Result};
use crate::models::TestCase;
use crate::utils::client::{ChatBackend, OpenAiClient};
use crate::utils::parser::{parse_response_with, ParseOptions};
use crate::utils::prompt::{build_prompt, build_repair_prompt};

/// Options for one generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub count: u32,
    pub focus_areas: Vec<String>,
    pub strict: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            count: 5,
            focus_areas: Vec::new(),
            strict: false,
        }
    }
}

pub struct TestCaseGenerator<B: ChatBackend> {
    backend: B,
    model: String,
    temperature: f32,
    parse_defaults: ParseOptions,
    reprompt_on_parse_error: bool,
}

impl TestCaseGenerator<OpenAiClient> {
    /// Generator backed by the HTTP client; requires an API key.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = OpenAiClient::from_settings(settings)?;
        Ok(Self::with_backend(client, settings))
    }
}

impl<B: ChatBackend> TestCaseGenerator<B> {
    pub fn with_backend(backend: B, settings: &Settings) -> Self {
        info!(model = %settings.model, "Initialized test case generator");
        Self {
            backend,
            model: settings.model.clone(),
            temperature: settings.temperature,
            parse_defaults: ParseOptions {
                default_test_type: settings.default_test_type,
                default_priority: settings.default_priority,
                strict: false,
            },
            reprompt_on_parse_error: settings.reprompt_on_parse_error,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate test cases for one user story.
    ///
    /// When the reply cannot be parsed and re-prompting is enabled, the model
    /// gets exactly one more chance to answer with valid JSON.
    pub fn generate(&self, user_story: &str, options: &GenerateOptions) -> Result<Vec<TestCase>> {
        let request = build_prompt(user_story, options.count, &options.focus_areas, &self.model)?
            .with_temperature(self.temperature);
        let parse_options = ParseOptions {
            strict: options.strict,
            ..self.parse_defaults
        };

        info!(count = options.count, model = %self.model, "Generating test cases");
        let reply = self.backend.complete(&request)?;

        let test_cases = match parse_response_with(&reply, &parse_options) {
            Ok(cases) => cases,
            Err(GeneratorError::Parse { message, .. }) if self.reprompt_on_parse_error => {
                warn!(reason = %message, "Unparseable reply, asking the model to correct it");
                let repair = build_repair_prompt(&request, &reply);
                let second = self.backend.complete(&repair)?;
                parse_response_with(&second, &parse_options)?
            }
            Err(e) => return Err(e),
        };

        if test_cases.len() != options.count as usize {
            warn!(
                requested = options.count,
                received = test_cases.len(),
                "Model returned a different number of test cases than requested"
            );
        }
        info!(count = test_cases.len(), "Generated test cases successfully");
        Ok(test_cases)
    }
}
