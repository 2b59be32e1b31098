use serde::{Deserialize, Serialize};

use crate::models::{Priority, TestType};

/// A single generated test scenario.
///
/// Field order here is the order used by every renderer and by the JSON
/// schema the model is asked to follow.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub preconditions: Vec<String>,
    pub steps: Vec<String>,
    pub expected_result: String,
    pub test_type: TestType,
    pub priority: Priority,
}

impl TestCase {
    /// Names of the serialized fields, in schema order.
    pub const FIELDS: [&'static str; 7] = [
        "title",
        "description",
        "preconditions",
        "steps",
        "expected_result",
        "test_type",
        "priority",
    ];
}
