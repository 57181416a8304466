//! Policy compliance scoring.
//!
//! Every proposed and completed action is scored against a fixed set of
//! article checks. Each check returns 0..=100; the aggregate verdict is
//! computed by [`evaluator::PolicyGuard::verify`].

pub mod action;
pub mod checks;
pub mod evaluator;

pub use action::ActionDescriptor;
pub use evaluator::PolicyGuard;

use serde::{Deserialize, Serialize};

/// Result of one article check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub article: String,
    pub score: u32,
    pub passed: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ComplianceCheck {
    pub fn new(article: &str, score: u32, message: impl Into<String>) -> Self {
        Self {
            article: article.to_string(),
            score,
            passed: score >= 85,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Aggregate verdict over all article checks for one action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub compliant: bool,
    pub overall_score: f64,
    pub checks: Vec<ComplianceCheck>,
    pub articles_evaluated: usize,
}

impl ComplianceResult {
    pub fn failed_articles(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.article.clone())
            .collect()
    }
}
