//! Enum types for REVDECK entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing an enum from its wire string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Lifecycle state of a pull-request analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AnalysisStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AnalysisStatus::Pending),
            "processing" => Ok(AnalysisStatus::Processing),
            "completed" => Ok(AnalysisStatus::Completed),
            "failed" => Ok(AnalysisStatus::Failed),
            other => Err(ParseEnumError {
                kind: "AnalysisStatus",
                value: other.to_string(),
            }),
        }
    }
}

/// Severity of a review issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Suggestion,
}

impl Severity {
    /// Severities in display order, most severe first.
    pub fn all() -> &'static [Severity] {
        &[Severity::Critical, Severity::Warning, Severity::Suggestion]
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Suggestion => "suggestion",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Severity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Severity::Critical),
            "warning" => Ok(Severity::Warning),
            "suggestion" => Ok(Severity::Suggestion),
            other => Err(ParseEnumError {
                kind: "Severity",
                value: other.to_string(),
            }),
        }
    }
}

/// Category a review issue falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Security,
    Quality,
    Testing,
    Docs,
    Performance,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Security => "security",
            Category::Quality => "quality",
            Category::Testing => "testing",
            Category::Docs => "docs",
            Category::Performance => "performance",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Category {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "security" => Ok(Category::Security),
            "quality" => Ok(Category::Quality),
            "testing" => Ok(Category::Testing),
            "docs" => Ok(Category::Docs),
            "performance" => Ok(Category::Performance),
            other => Err(ParseEnumError {
                kind: "Category",
                value: other.to_string(),
            }),
        }
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_severity() -> impl Strategy<Value = Severity> {
        prop_oneof![
            Just(Severity::Critical),
            Just(Severity::Warning),
            Just(Severity::Suggestion),
        ]
    }

    fn arb_category() -> impl Strategy<Value = Category> {
        prop_oneof![
            Just(Category::Security),
            Just(Category::Quality),
            Just(Category::Testing),
            Just(Category::Docs),
            Just(Category::Performance),
        ]
    }

    fn arb_status() -> impl Strategy<Value = AnalysisStatus> {
        prop_oneof![
            Just(AnalysisStatus::Pending),
            Just(AnalysisStatus::Processing),
            Just(AnalysisStatus::Completed),
            Just(AnalysisStatus::Failed),
        ]
    }

    proptest! {
        /// Property: Display and FromStr are inverses for every variant.
        #[test]
        fn prop_severity_display_roundtrip(sev in arb_severity()) {
            prop_assert_eq!(sev.to_string().parse::<Severity>().unwrap(), sev);
        }

        #[test]
        fn prop_category_display_roundtrip(cat in arb_category()) {
            prop_assert_eq!(cat.to_string().parse::<Category>().unwrap(), cat);
        }

        #[test]
        fn prop_status_display_roundtrip(status in arb_status()) {
            prop_assert_eq!(status.to_string().parse::<AnalysisStatus>().unwrap(), status);
        }

        /// Property: serde wire form matches Display for every variant.
        #[test]
        fn prop_severity_serde_matches_display(sev in arb_severity()) {
            let json = serde_json::to_string(&sev).unwrap();
            prop_assert_eq!(json, format!("\"{}\"", sev));
        }
    }
}
