use chrono::Local;
use std::fmt::Write as _;
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::error::{GeneratorError, Result};
use crate::generator::{GenerateOptions, TestCaseGenerator};
use crate::utils::display::{print_error, print_info, print_success};
use crate::utils::{
    load_stories, render, story_base_name, story_output_path, write_output, ChatBackend,
    OutputFormat,
};

const SUMMARY_FILE: &str = "summary.md";
const PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq)]
pub enum StoryStatus {
    Generated { count: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoryOutcome {
    pub index: usize,
    pub story: String,
    pub status: StoryStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<StoryOutcome>,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, StoryStatus::Failed { .. }))
            .count()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.len() - self.failed()
    }
}

/// Generate test cases for every story in `file_path`.
pub fn batch_generate(
    settings: &Settings,
    file_path: &Path,
    output_dir: &Path,
    options: &GenerateOptions,
) -> Result<BatchReport> {
    print_info(&format!("Reading user stories from {}...", file_path.display()));
    let stories = load_stories(file_path)?;
    print_info(&format!("Found {} user stories", stories.len()));

    let generator = TestCaseGenerator::from_settings(settings)?;
    let report = run_batch(&generator, &stories, output_dir, options)?;

    println!();
    if report.failed() == 0 {
        print_success(&format!(
            "Completed! Check {}/ for results",
            output_dir.display()
        ));
    } else {
        print_error(&format!(
            "{} of {} stories failed. Check {}/ for results",
            report.failed(),
            report.outcomes.len(),
            output_dir.display()
        ));
    }
    Ok(report)
}

/// Process stories one after another. A failing story is recorded and
/// skipped, except for authentication failures which abort the run.
pub fn run_batch<B: ChatBackend>(
    generator: &TestCaseGenerator<B>,
    stories: &[String],
    output_dir: &Path,
    options: &GenerateOptions,
) -> Result<BatchReport> {
    create_dir_all(output_dir)?;
    let mut report = BatchReport::default();

    for (i, story) in stories.iter().enumerate() {
        let index = i + 1;
        print_info(&format!("Processing story {}/{}...", index, stories.len()));
        println!("  {}", preview(story));

        let status = match process_story(generator, story, index, output_dir, options) {
            Ok(count) => {
                print_success(&format!("  Generated {} test cases", count));
                StoryStatus::Generated { count }
            }
            Err(e @ GeneratorError::Auth(_)) => return Err(e),
            Err(e) => {
                error!(story = index, error = %e, "Story failed");
                print_error(&format!("  Failed: {}", e));
                StoryStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        report.outcomes.push(StoryOutcome {
            index,
            story: story.clone(),
            status,
        });
    }

    let summary_path = output_dir.join(SUMMARY_FILE);
    write_output(&summary_path, &render_summary(&report, generator.model()))?;
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Batch finished"
    );
    Ok(report)
}

/// Generate, render both formats in memory, then write both files.
fn process_story<B: ChatBackend>(
    generator: &TestCaseGenerator<B>,
    story: &str,
    index: usize,
    output_dir: &Path,
    options: &GenerateOptions,
) -> Result<usize> {
    let test_cases = generator.generate(story, options)?;

    let rendered: Vec<(PathBuf, String)> = [OutputFormat::Json, OutputFormat::Markdown]
        .into_iter()
        .map(|format| {
            render(&test_cases, format).map(|doc| (story_output_path(output_dir, index, format), doc))
        })
        .collect::<Result<_>>()?;

    write_all_or_none(&rendered)?;
    Ok(test_cases.len())
}

/// Write every document; on the first failure remove the ones already
/// written so a failed story leaves no partial output behind.
fn write_all_or_none(documents: &[(PathBuf, String)]) -> Result<()> {
    for (written, (path, doc)) in documents.iter().enumerate() {
        if let Err(e) = write_output(path, doc) {
            for (done, _) in &documents[..written] {
                if let Err(cleanup) = fs::remove_file(done) {
                    warn!(path = %done.display(), error = %cleanup, "Could not remove partial output");
                }
            }
            return Err(e);
        }
    }
    Ok(())
}

fn preview(story: &str) -> String {
    if story.chars().count() > PREVIEW_CHARS {
        let head: String = story.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        story.to_string()
    }
}

fn render_summary(report: &BatchReport, model: &str) -> String {
    let mut out = String::from("# Batch Summary\n\n");
    let _ = writeln!(out, "Generated: {}  ", Local::now().format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Model: {}  ", model);
    let _ = writeln!(
        out,
        "Stories: {} ({} succeeded, {} failed)\n",
        report.outcomes.len(),
        report.succeeded(),
        report.failed()
    );

    out.push_str("| # | Story | Status | Files |\n");
    out.push_str("|---|-------|--------|-------|\n");
    for outcome in &report.outcomes {
        let story = preview(&outcome.story).replace('|', "\\|");
        match &outcome.status {
            StoryStatus::Generated { count } => {
                let base = story_base_name(outcome.index);
                let _ = writeln!(
                    out,
                    "| {} | {} | ✓ {} test cases | [{base}.md]({base}.md), [{base}.json]({base}.json) |",
                    outcome.index, story, count
                );
            }
            StoryStatus::Failed { reason } => {
                let _ = writeln!(
                    out,
                    "| {} | {} | ✗ {} | - |",
                    outcome.index,
                    story,
                    reason.replace('|', "\\|").replace('\n', " ")
                );
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::prompt::ChatRequest;
    use tempfile::TempDir;

    /// Replies with one test case unless the story mentions "broken" or "locked".
    struct StoryAwareBackend;

    impl ChatBackend for StoryAwareBackend {
        fn complete(&self, request: &ChatRequest) -> Result<String> {
            let prompt = request.user_prompt().unwrap_or_default();
            if prompt.contains("locked") {
                return Err(GeneratorError::Auth("key revoked".into()));
            }
            if prompt.contains("broken") {
                return Ok("I'm sorry, I can't help with that.".into());
            }
            Ok(r#"[{"title":"Happy path","steps":["Do it"],"expected_result":"Done"}]"#.into())
        }
    }

    fn generator() -> TestCaseGenerator<StoryAwareBackend> {
        let settings = Settings {
            reprompt_on_parse_error: false,
            ..Settings::default()
        };
        TestCaseGenerator::with_backend(StoryAwareBackend, &settings)
    }

    fn stories(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_batch_writes_json_and_markdown_per_story() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("output");

        let report = run_batch(
            &generator(),
            &stories(&["As a user, I want A", "As a user, I want B"]),
            &out,
            &GenerateOptions::default(),
        )
        .unwrap();

        assert_eq!(report.succeeded(), 2);
        for name in ["story_001.json", "story_001.md", "story_002.json", "story_002.md"] {
            assert!(out.join(name).exists(), "missing {}", name);
        }
        let summary = fs::read_to_string(out.join(SUMMARY_FILE)).unwrap();
        assert!(summary.contains("2 succeeded, 0 failed"));
    }

    #[test]
    fn test_batch_continues_after_failed_story() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().to_path_buf();

        let report = run_batch(
            &generator(),
            &stories(&["As a user, I want A", "As a user, I want a broken thing", "As a user, I want C"]),
            &out,
            &GenerateOptions::default(),
        )
        .unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 2);
        assert!(matches!(report.outcomes[1].status, StoryStatus::Failed { .. }));
        assert!(!out.join("story_002.json").exists());
        assert!(!out.join("story_002.md").exists());
        assert!(out.join("story_003.md").exists());
    }

    #[test]
    fn test_failed_write_leaves_no_partial_story_output() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().to_path_buf();
        // A directory where the Markdown file should go makes that write fail.
        fs::create_dir_all(out.join("story_001.md")).unwrap();

        let report = run_batch(
            &generator(),
            &stories(&["As a user, I want A", "As a user, I want B"]),
            &out,
            &GenerateOptions::default(),
        )
        .unwrap();

        assert!(matches!(report.outcomes[0].status, StoryStatus::Failed { .. }));
        assert!(!out.join("story_001.json").exists());
        assert!(out.join("story_002.json").exists());
        assert!(out.join("story_002.md").exists());
    }

    #[test]
    fn test_batch_aborts_on_auth_error() {
        let temp_dir = TempDir::new().unwrap();

        let result = run_batch(
            &generator(),
            &stories(&["As a user, I want A", "As a user, I want locked", "As a user, I want C"]),
            temp_dir.path(),
            &GenerateOptions::default(),
        );

        assert!(matches!(result, Err(GeneratorError::Auth(_))));
        assert!(temp_dir.path().join("story_001.json").exists());
        assert!(!temp_dir.path().join("story_003.json").exists());
    }

    #[test]
    fn test_preview_truncates_long_stories() {
        let long = "a".repeat(120);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS + 3);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_summary_escapes_pipes() {
        let report = BatchReport {
            outcomes: vec![StoryOutcome {
                index: 1,
                story: "As a user | admin".into(),
                status: StoryStatus::Failed {
                    reason: "bad | reply".into(),
                },
            }],
        };
        let summary = render_summary(&report, "gpt-4o");
        assert!(summary.contains("As a user \\| admin"));
        assert!(summary.contains("bad \\| reply"));
        assert!(summary.contains("Model: gpt-4o"));
    }
}
