use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Level at which a generated test case exercises the feature.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Unit,
    #[default]
    Integration,
    E2e,
}

impl TestType {
    pub const ALL: [TestType; 3] = [TestType::Unit, TestType::Integration, TestType::E2e];

    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::Unit => "unit",
            TestType::Integration => "integration",
            TestType::E2e => "e2e",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unit" => Ok(TestType::Unit),
            "integration" => Ok(TestType::Integration),
            "e2e" | "end-to-end" | "end_to_end" | "endtoend" => Ok(TestType::E2e),
            other => Err(format!("unknown test type '{}'", other)),
        }
    }
}
