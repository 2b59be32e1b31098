use serde::{Deserialize, Serialize};

use crate::error::{GeneratorError, Result};

pub const SYSTEM_PROMPT: &str = "You are an expert QA engineer and test case designer. \
Generate comprehensive, practical test cases that cover positive scenarios, \
negative scenarios, edge cases, and security.";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Body of a chat-completions request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

impl ChatRequest {
    /// Content of the first user message.
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Build the chat request asking the model for `count` test cases.
pub fn build_prompt(
    user_story: &str,
    count: u32,
    focus_areas: &[String],
    model: &str,
) -> Result<ChatRequest> {
    let story = user_story.trim();
    if story.is_empty() {
        return Err(GeneratorError::InvalidInput(
            "user story must not be empty".to_string(),
        ));
    }
    if count == 0 {
        return Err(GeneratorError::InvalidInput(
            "count must be at least 1".to_string(),
        ));
    }
    if model.trim().is_empty() {
        return Err(GeneratorError::InvalidInput(
            "model must not be empty".to_string(),
        ));
    }

    let focus = normalize_focus_areas(focus_areas);
    let focus_text = if focus.is_empty() {
        String::new()
    } else {
        format!("\nPay special attention to: {}", focus.join(", "))
    };

    let prompt = format!(
        r#"Given this user story:
"{story}"

Generate exactly {count} comprehensive test cases.{focus_text}

Include:
- Positive test cases (happy path)
- Negative test cases (invalid input and error scenarios)
- Edge cases (boundary conditions and unusual situations)
- Security considerations

Return ONLY a valid JSON array with {count} objects in this exact format, with no prose before or after it:
[
  {{
    "title": "Brief descriptive title",
    "description": "What this test verifies",
    "preconditions": ["What must be set up first"],
    "steps": ["Step 1", "Step 2", "Step 3"],
    "expected_result": "What should happen",
    "test_type": "unit|integration|e2e",
    "priority": "low|medium|high"
  }}
]

Every object must have a non-empty "title", at least one entry in "steps", and an "expected_result".
Ensure test cases are specific and actionable, include concrete test data, and cover different scenarios."#
    );

    Ok(ChatRequest {
        model: model.trim().to_string(),
        messages: vec![
            ChatMessage::new(Role::System, SYSTEM_PROMPT),
            ChatMessage::new(Role::User, prompt),
        ],
        temperature: DEFAULT_TEMPERATURE,
    })
}

/// Follow-up request asking the model to fix a reply that could not be parsed.
pub fn build_repair_prompt(request: &ChatRequest, raw_reply: &str) -> ChatRequest {
    let mut repaired = request.clone();
    repaired
        .messages
        .push(ChatMessage::new(Role::Assistant, raw_reply));
    repaired.messages.push(ChatMessage::new(
        Role::User,
        "Your previous reply could not be parsed. Reply again with ONLY the JSON array of \
test case objects in the requested format. Do not add any explanation or code fences.",
    ));
    repaired
}

/// Drop blank entries and exact repeats, keeping first-seen order. Entries
/// are passed through verbatim so each one appears in the prompt as given.
fn normalize_focus_areas(focus_areas: &[String]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for area in focus_areas.iter().map(String::as_str) {
        if !area.trim().is_empty() && !seen.contains(&area) {
            seen.push(area);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_STORY: &str = "As a user, I want to login with email and password";

    #[test]
    fn test_prompt_contains_story_count_and_array_instruction() {
        let request = build_prompt(LOGIN_STORY, 5, &[], "gpt-3.5-turbo").unwrap();
        let prompt = request.user_prompt().unwrap();

        assert!(prompt.contains(LOGIN_STORY));
        assert!(prompt.contains("exactly 5"));
        assert!(prompt.contains("JSON array"));
        for field in crate::models::TestCase::FIELDS {
            assert!(prompt.contains(field), "missing field {}", field);
        }
        assert!(!prompt.contains("Pay special attention"));
    }

    #[test]
    fn test_prompt_enumerates_every_focus_area() {
        let focus = vec![
            "security".to_string(),
            "Performance ".to_string(),
            "".to_string(),
            "Security".to_string(),
            "security".to_string(),
        ];
        let request = build_prompt(LOGIN_STORY, 3, &focus, "gpt-4o").unwrap();
        let prompt = request.user_prompt().unwrap();

        assert!(prompt.contains("exactly 3"));
        for area in &focus {
            assert!(prompt.contains(area.as_str()), "missing focus area {:?}", area);
        }
        assert!(prompt.contains("Pay special attention to: security, Performance , Security\n"));
    }

    #[test]
    fn test_blank_focus_areas_add_no_focus_line() {
        let focus = vec!["".to_string(), "   ".to_string()];
        let request = build_prompt(LOGIN_STORY, 2, &focus, "gpt-4o").unwrap();
        assert!(!request.user_prompt().unwrap().contains("Pay special attention"));
    }

    #[test]
    fn test_request_carries_model_and_system_message() {
        let request = build_prompt(LOGIN_STORY, 1, &[], " gpt-4o ").unwrap();
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
        assert!((request.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_request_serializes_as_chat_completions_body() {
        let request = build_prompt(LOGIN_STORY, 2, &[], "gpt-4o").unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
    }

    #[test]
    fn test_rejects_zero_count_blank_story_and_blank_model() {
        assert!(matches!(
            build_prompt(LOGIN_STORY, 0, &[], "gpt-4o"),
            Err(GeneratorError::InvalidInput(_))
        ));
        assert!(matches!(
            build_prompt("   ", 3, &[], "gpt-4o"),
            Err(GeneratorError::InvalidInput(_))
        ));
        assert!(matches!(
            build_prompt(LOGIN_STORY, 3, &[], ""),
            Err(GeneratorError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_repair_prompt_appends_reply_and_correction_request() {
        let request = build_prompt(LOGIN_STORY, 2, &[], "gpt-4o").unwrap();
        let repaired = build_repair_prompt(&request, "Sorry, here you go: {oops");

        assert_eq!(repaired.messages.len(), 4);
        assert_eq!(repaired.messages[2].role, Role::Assistant);
        assert_eq!(repaired.messages[2].content, "Sorry, here you go: {oops");
        assert_eq!(repaired.messages[3].role, Role::User);
        assert_eq!(repaired.user_prompt(), request.user_prompt());
    }
}
