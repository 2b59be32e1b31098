//! Decoding of model replies into [`TestCase`] records.
//!
//! Models often wrap their JSON in prose or Markdown code fences, so the
//! parser first locates balanced JSON candidates in the raw text and only
//! then deserializes records from the first candidate that holds any.

use serde::Deserialize;
use serde_json::Value;
use std::ops::Range;
use tracing::{debug, warn};

use crate::error::{GeneratorError, Result};
use crate::models::{Priority, TestCase, TestType};

/// Keys under which an object may wrap the record array.
const ENVELOPE_KEYS: [&str; 2] = ["test_cases", "tests"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub default_test_type: TestType,
    pub default_priority: Priority,
    /// Reject the whole reply when any record is invalid instead of dropping it.
    pub strict: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            default_test_type: TestType::default(),
            default_priority: Priority::default(),
            strict: false,
        }
    }
}

/// A list field the model may send either as an array or a single string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringList {
    Many(Vec<String>),
    One(String),
}

impl StringList {
    fn into_vec(self) -> Vec<String> {
        let items = match self {
            StringList::Many(items) => items,
            StringList::One(item) => vec![item],
        };
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Record as it arrives from the model, before validation.
#[derive(Debug, Deserialize)]
struct RawTestCase {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    preconditions: Option<StringList>,
    #[serde(default)]
    steps: Option<StringList>,
    #[serde(default)]
    expected_result: Option<String>,
    #[serde(default)]
    test_type: Option<String>,
    #[serde(default)]
    priority: Option<String>,
}

impl RawTestCase {
    fn into_test_case(self, options: &ParseOptions) -> std::result::Result<TestCase, String> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or("missing title")?;

        let steps = self.steps.map(StringList::into_vec).unwrap_or_default();
        if steps.is_empty() {
            return Err(format!("'{}' has no steps", title));
        }

        let expected_result = self
            .expected_result
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .ok_or_else(|| format!("'{}' has no expected_result", title))?;

        let test_type = self
            .test_type
            .and_then(|t| t.parse().ok())
            .unwrap_or(options.default_test_type);
        let priority = self
            .priority
            .and_then(|p| p.parse().ok())
            .unwrap_or(options.default_priority);

        Ok(TestCase {
            title,
            description: self.description.map(|d| d.trim().to_string()).unwrap_or_default(),
            preconditions: self.preconditions.map(StringList::into_vec).unwrap_or_default(),
            steps,
            expected_result,
            test_type,
            priority,
        })
    }
}

/// Parse a raw model reply with default options.
pub fn parse_response(raw_text: &str) -> Result<Vec<TestCase>> {
    parse_response_with(raw_text, &ParseOptions::default())
}

pub fn parse_response_with(raw_text: &str, options: &ParseOptions) -> Result<Vec<TestCase>> {
    let mut found_json = false;

    for candidate in json_candidates(raw_text) {
        found_json = true;
        let Some(records) = record_values(candidate) else {
            debug!("Skipping JSON value without test case records");
            continue;
        };
        return build_test_cases(records, raw_text, options);
    }

    let message = if found_json {
        "response contains JSON but no test case records"
    } else {
        "no JSON array or object found in response"
    };
    Err(GeneratorError::parse(message, raw_text))
}

fn build_test_cases(records: Vec<Value>, raw_text: &str, options: &ParseOptions) -> Result<Vec<TestCase>> {
    let total = records.len();
    let mut test_cases = Vec::with_capacity(total);

    for (index, record) in records.into_iter().enumerate() {
        let outcome = RawTestCase::deserialize(record)
            .map_err(|e| e.to_string())
            .and_then(|raw| raw.into_test_case(options));

        match outcome {
            Ok(test_case) => test_cases.push(test_case),
            Err(reason) if options.strict => {
                return Err(GeneratorError::parse(
                    format!("test case #{} is invalid: {}", index + 1, reason),
                    raw_text,
                ));
            }
            Err(reason) => {
                warn!(index = index + 1, reason = %reason, "Skipping invalid test case");
            }
        }
    }

    if test_cases.is_empty() {
        return Err(GeneratorError::parse(
            format!("none of the {} records is a usable test case", total),
            raw_text,
        ));
    }

    debug!(parsed = test_cases.len(), dropped = total - test_cases.len(), "Parsed test cases");
    Ok(test_cases)
}

/// Records held by a JSON value, if it has the shape of a reply.
///
/// An array counts once it holds at least one object. Its other elements are
/// kept so that record validation can reject or report them.
fn record_values(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => items.iter().any(Value::is_object).then_some(items),
        Value::Object(mut map) => {
            for key in ENVELOPE_KEYS {
                if let Some(inner) = map.remove(key) {
                    return record_values(inner);
                }
            }
            map.contains_key("title").then_some(vec![Value::Object(map)])
        }
        _ => None,
    }
}

/// Iterate over every balanced JSON array/object in `text` that parses, in
/// order of appearance.
///
/// Nested values are not reported separately once their enclosing value
/// parsed successfully.
fn json_candidates(text: &str) -> impl Iterator<Item = Value> + '_ {
    let mut parsed_end = 0;
    balanced_spans(text).into_iter().filter_map(move |span| {
        if span.start < parsed_end {
            return None;
        }
        let value = serde_json::from_str::<Value>(&text[span.clone()]).ok()?;
        parsed_end = span.end;
        Some(value)
    })
}

/// Byte ranges of every balanced bracketed span in `text`, ordered by start.
///
/// Single pass over the input. Quotes only open JSON strings inside a
/// bracket, so prose quotes around the JSON are ignored. A mismatched closing
/// bracket discards every span still open; brackets left open at the end
/// yield nothing.
fn balanced_spans(text: &str) -> Vec<Range<usize>> {
    let mut open: Vec<(u8, usize)> = Vec::new();
    let mut spans = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, byte) in text.bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' if !open.is_empty() => in_string = true,
            b'[' => open.push((b']', i)),
            b'{' => open.push((b'}', i)),
            b']' | b'}' => match open.pop() {
                Some((close, start)) if close == byte => spans.push(start..i + 1),
                Some(_) => open.clear(),
                None => {}
            },
            _ => {}
        }
    }

    spans.sort_by_key(|span| span.start);
    spans
}
