use csv::Writer;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

use crate::error::{GeneratorError, Result};
use crate::models::TestCase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Json,
    Csv,
}

impl OutputFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("md") | Some("markdown") => Ok(OutputFormat::Markdown),
            Some("json") => Ok(OutputFormat::Json),
            Some("csv") => Ok(OutputFormat::Csv),
            _ => Err(GeneratorError::InvalidInput(format!(
                "output file must end with .md, .json or .csv: {}",
                path.display()
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Render test cases in the given format. Pure; writing is up to the caller.
pub fn render(cases: &[TestCase], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(render_markdown(cases)),
        OutputFormat::Json => render_json(cases),
        OutputFormat::Csv => render_csv(cases),
    }
}

pub fn render_json(cases: &[TestCase]) -> Result<String> {
    let mut out = serde_json::to_string_pretty(cases)?;
    out.push('\n');
    Ok(out)
}

pub fn render_markdown(cases: &[TestCase]) -> String {
    let mut out = String::from("# Test Cases\n\n");

    // `write!` into a String cannot fail.
    for (i, tc) in cases.iter().enumerate() {
        let _ = writeln!(out, "## Test Case {}: {}\n", i + 1, tc.title);

        if !tc.description.is_empty() {
            let _ = writeln!(out, "**Description:** {}\n", tc.description);
        }

        if !tc.preconditions.is_empty() {
            out.push_str("**Preconditions:**\n");
            for precondition in &tc.preconditions {
                let _ = writeln!(out, "- {}", precondition);
            }
            out.push('\n');
        }

        out.push_str("**Steps:**\n");
        for (j, step) in tc.steps.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", j + 1, step);
        }
        out.push('\n');

        let _ = writeln!(out, "**Expected Result:** {}\n", tc.expected_result);
        let _ = writeln!(out, "**Type:** {}  ", tc.test_type);
        let _ = writeln!(out, "**Priority:** {}\n", tc.priority);
        out.push_str("---\n\n");
    }

    out
}

/// Flat CSV row; list fields become newline-separated cells.
#[derive(Serialize)]
struct CsvRow<'a> {
    title: &'a str,
    description: &'a str,
    preconditions: String,
    steps: String,
    expected_result: &'a str,
    test_type: &'static str,
    priority: &'static str,
}

impl<'a> From<&'a TestCase> for CsvRow<'a> {
    fn from(tc: &'a TestCase) -> Self {
        Self {
            title: &tc.title,
            description: &tc.description,
            preconditions: tc.preconditions.join("\n"),
            steps: tc.steps.join("\n"),
            expected_result: &tc.expected_result,
            test_type: tc.test_type.as_str(),
            priority: tc.priority.as_str(),
        }
    }
}

pub fn render_csv(cases: &[TestCase]) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    if cases.is_empty() {
        writer.write_record(TestCase::FIELDS)?;
    }
    for tc in cases {
        writer.serialize(CsvRow::from(tc))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| GeneratorError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| GeneratorError::InvalidInput(format!("CSV output is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, TestType};
    use crate::utils::parser::parse_response;
    use proptest::prelude::*;

    fn sample(title: &str) -> TestCase {
        TestCase {
            title: title.to_string(),
            description: "Verifies login".to_string(),
            preconditions: vec!["User exists".to_string()],
            steps: vec!["Open page".to_string(), "Submit".to_string()],
            expected_result: "Dashboard shown".to_string(),
            test_type: TestType::E2e,
            priority: Priority::High,
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("out.md")).unwrap(), OutputFormat::Markdown);
        assert_eq!(OutputFormat::from_path(Path::new("out.JSON")).unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(Path::new("dir/out.csv")).unwrap(), OutputFormat::Csv);
        assert!(matches!(
            OutputFormat::from_path(Path::new("out.txt")),
            Err(GeneratorError::InvalidInput(_))
        ));
        assert!(OutputFormat::from_path(Path::new("out")).is_err());
    }

    #[test]
    fn test_markdown_sections_are_numbered_from_one() {
        let cases: Vec<TestCase> = (1..=5).map(|i| sample(&format!("Case {}", i))).collect();
        let md = render_markdown(&cases);

        assert!(md.starts_with("# Test Cases\n"));
        for i in 1..=5 {
            assert!(md.contains(&format!("## Test Case {}: Case {}", i, i)));
        }
        assert!(!md.contains("## Test Case 6"));
        assert_eq!(md.matches("---").count(), 5);
    }

    #[test]
    fn test_markdown_field_order_and_step_numbering() {
        let md = render_markdown(&[sample("Login")]);

        let positions: Vec<usize> = [
            "## Test Case 1: Login",
            "**Description:**",
            "**Preconditions:**",
            "**Steps:**",
            "**Expected Result:**",
            "**Type:** e2e",
            "**Priority:** high",
        ]
        .iter()
        .map(|needle| md.find(needle).unwrap_or_else(|| panic!("missing {}", needle)))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        assert!(md.contains("1. Open page\n2. Submit\n"));
        assert!(md.contains("- User exists\n"));
    }

    #[test]
    fn test_markdown_omits_empty_optional_fields() {
        let mut tc = sample("Bare");
        tc.description.clear();
        tc.preconditions.clear();
        let md = render_markdown(&[tc]);
        assert!(!md.contains("**Description:**"));
        assert!(!md.contains("**Preconditions:**"));
    }

    #[test]
    fn test_json_is_array_with_schema_field_order() {
        let json = render_json(&[sample("A")]).unwrap();
        assert!(json.trim_start().starts_with('['));

        let positions: Vec<usize> = TestCase::FIELDS
            .iter()
            .map(|f| json.find(&format!("\"{}\"", f)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(json.contains("\"test_type\": \"e2e\""));
    }

    #[test]
    fn test_csv_has_header_and_joined_lists() {
        let csv = render_csv(&[sample("A"), sample("B")]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "title,description,preconditions,steps,expected_result,test_type,priority"
        );

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][0], "B");
        assert_eq!(&rows[0][3], "Open page\nSubmit");
        assert_eq!(&rows[0][5], "e2e");
    }

    #[test]
    fn test_csv_for_no_cases_is_header_only() {
        let csv = render_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    fn text() -> impl Strategy<Value = String> {
        "[A-Za-z0-9 ,.:;!?'\"\\[\\]{}()/_-]{1,40}"
            .prop_filter("non-blank and trimmed", |s| !s.trim().is_empty() && s.trim() == s)
    }

    fn test_case_strategy() -> impl Strategy<Value = TestCase> {
        (
            text(),
            prop_oneof![Just(String::new()), text()],
            prop::collection::vec(text(), 0..3),
            prop::collection::vec(text(), 1..5),
            text(),
            prop::sample::select(TestType::ALL.to_vec()),
            prop::sample::select(Priority::ALL.to_vec()),
        )
            .prop_map(
                |(title, description, preconditions, steps, expected_result, test_type, priority)| {
                    TestCase {
                        title,
                        description,
                        preconditions,
                        steps,
                        expected_result,
                        test_type,
                        priority,
                    }
                },
            )
    }

    proptest! {
        #[test]
        fn prop_json_render_round_trips_through_parser(
            cases in prop::collection::vec(test_case_strategy(), 1..6)
        ) {
            let json = render(&cases, OutputFormat::Json).unwrap();
            let parsed = parse_response(&json).unwrap();
            prop_assert_eq!(parsed, cases);
        }

        #[test]
        fn prop_markdown_has_one_section_per_case(
            cases in prop::collection::vec(test_case_strategy(), 0..6)
        ) {
            let md = render(&cases, OutputFormat::Markdown).unwrap();
            prop_assert_eq!(md.matches("\n---\n").count(), cases.len());
        }
    }
}
