use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{GeneratorError, Result};
use crate::models::TestCase;
use crate::utils::render::{render, OutputFormat};

/// Read user stories from a text file, one per line; blank lines are skipped.
pub fn load_stories(file_path: &Path) -> Result<Vec<String>> {
    if !file_path.exists() {
        return Err(GeneratorError::InvalidInput(format!(
            "file {} does not exist",
            file_path.display()
        )));
    }

    let content = fs::read_to_string(file_path)?;
    let stories = parse_stories(&content);

    if stories.is_empty() {
        return Err(GeneratorError::InvalidInput(format!(
            "no user stories found in {}",
            file_path.display()
        )));
    }

    Ok(stories)
}

pub fn parse_stories(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render and save test cases, choosing the format from the file extension.
pub fn save_test_cases(file_path: &Path, test_cases: &[TestCase]) -> Result<()> {
    let format = OutputFormat::from_path(file_path)?;
    let content = render(test_cases, format)?;
    write_output(file_path, &content)?;
    info!(count = test_cases.len(), path = %file_path.display(), "Exported test cases");
    Ok(())
}

/// Write a fully rendered document, creating parent directories as needed.
pub fn write_output(file_path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            create_dir_all(parent)?;
        }
    }
    fs::write(file_path, content)?;
    Ok(())
}

/// Base name for the outputs of the `index`-th story of a batch (1-based).
pub fn story_base_name(index: usize) -> String {
    format!("story_{:03}", index)
}

pub fn story_output_path(output_dir: &Path, index: usize, format: OutputFormat) -> PathBuf {
    output_dir.join(format!("{}.{}", story_base_name(index), format.extension()))
}
