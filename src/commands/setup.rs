use inquire::{Confirm, Password, PasswordDisplayMode, Text};
use std::path::Path;
use tracing::info;

use crate::config::{env_file_contents, DEFAULT_MODEL};
use crate::error::{GeneratorError, Result};
use crate::utils::display::{print_banner, print_info, print_success};
use crate::utils::write_output;

const API_KEYS_URL: &str = "https://platform.openai.com/api-keys";

/// Interactive setup that writes the API key to `env_path`.
pub fn run_setup(env_path: &Path) -> Result<()> {
    print_banner("AI Test Case Generator - Setup");

    print_info("This tool requires an OpenAI-compatible API key to function.");
    print_info(&format!("Get your key from: {}\n", API_KEYS_URL));

    if env_path.exists() {
        print_info(&format!("{} file already exists", env_path.display()));
        let overwrite = Confirm::new("Do you want to update it?")
            .with_default(false)
            .prompt()?;
        if !overwrite {
            print_info("Setup cancelled");
            return Ok(());
        }
    }

    let api_key = Password::new("Enter your API key:")
        .with_display_mode(PasswordDisplayMode::Hidden)
        .without_confirmation()
        .prompt()?;
    if api_key.trim().is_empty() {
        return Err(GeneratorError::InvalidInput(
            "API key must not be empty".to_string(),
        ));
    }

    let model = Text::new("Default model (optional):")
        .with_placeholder(DEFAULT_MODEL)
        .prompt_skippable()?;

    write_output(env_path, &env_file_contents(&api_key, model.as_deref()))?;
    info!(path = %env_path.display(), "Wrote environment file");

    print_success(&format!("Configuration saved to {}!", env_path.display()));
    print_info("You can now generate test cases:");
    println!("  test_case_generator generate \"As a user, I want to login...\"");
    Ok(())
}
