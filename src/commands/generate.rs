use std::path::PathBuf;

use crate::config::Settings;
use crate::error::Result;
use crate::generator::{GenerateOptions, TestCaseGenerator};
use crate::utils::display::{print_info, print_success, print_test_cases, print_warning};
use crate::utils::{save_test_cases, ChatBackend, OutputFormat};

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub user_story: String,
    pub options: GenerateOptions,
    pub output: Option<PathBuf>,
}

/// Generate test cases for one story, print them, and optionally save them.
pub fn generate_test_cases(settings: &Settings, request: &GenerateRequest) -> Result<()> {
    // Reject a bad output path before spending an API call.
    if let Some(output) = &request.output {
        OutputFormat::from_path(output)?;
    }

    print_info(&format!(
        "Generating {} test cases with {}...",
        request.options.count, settings.model
    ));
    let generator = TestCaseGenerator::from_settings(settings)?;
    run_generate(&generator, request)
}

pub fn run_generate<B: ChatBackend>(
    generator: &TestCaseGenerator<B>,
    request: &GenerateRequest,
) -> Result<()> {
    let test_cases = generator.generate(&request.user_story, &request.options)?;

    print_success(&format!("Generated {} test cases!", test_cases.len()));
    if let Some(notice) = count_mismatch_notice(request.options.count, test_cases.len()) {
        print_warning(&notice);
    }
    print_test_cases(&test_cases);

    if let Some(output) = &request.output {
        save_test_cases(output, &test_cases)?;
        println!();
        print_success(&format!("Saved test cases to {}", output.display()));
    }

    Ok(())
}

/// User-facing note when the model did not honour the requested count.
pub fn count_mismatch_notice(requested: u32, received: usize) -> Option<String> {
    (received != requested as usize).then(|| {
        format!(
            "Requested {} test cases but the model returned {}",
            requested, received
        )
    })
}
