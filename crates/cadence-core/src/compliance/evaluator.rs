//! The policy guard: runs every article check and aggregates the verdict.
//!
//! Aggregation applies three independent conditions, each sufficient to
//! fail on its own:
//!   1. any zero-tolerance article below 100
//!   2. mean score below 95
//!   3. more than one check below 85

use std::path::Path;

use crate::compliance::action::ActionDescriptor;
use crate::compliance::{checks, ComplianceResult};

const MEAN_THRESHOLD: f64 = 95.0;
const CHECK_THRESHOLD: u32 = 85;

pub struct PolicyGuard {
    /// Source policy document, kept for introspection. The checks
    /// themselves are compiled in; the text does not drive them.
    policy_text: String,
}

impl PolicyGuard {
    /// Load the policy document from `path` when given. A missing or
    /// unreadable file degrades to an empty document with a warning; the
    /// compiled-in checks still run.
    pub fn new(path: Option<&Path>) -> Self {
        let policy_text = match path {
            Some(p) => match std::fs::read_to_string(p) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "policy document unavailable");
                    String::new()
                }
            },
            None => String::new(),
        };
        Self { policy_text }
    }

    pub fn from_text(policy_text: impl Into<String>) -> Self {
        Self {
            policy_text: policy_text.into(),
        }
    }

    pub fn policy_text(&self) -> &str {
        &self.policy_text
    }

    /// Score `action` against every article and aggregate.
    pub fn verify(&self, action: &ActionDescriptor) -> ComplianceResult {
        let checks = checks::run_all(action);
        let articles_evaluated = checks.len();

        let overall_score = if checks.is_empty() {
            100.0
        } else {
            checks.iter().map(|c| c.score as f64).sum::<f64>() / checks.len() as f64
        };

        let zero_tolerance_breach = checks
            .iter()
            .any(|c| checks::ZERO_TOLERANCE.contains(&c.article.as_str()) && c.score < 100);
        let below_threshold = checks.iter().filter(|c| c.score < CHECK_THRESHOLD).count();

        let compliant =
            !zero_tolerance_breach && overall_score >= MEAN_THRESHOLD && below_threshold <= 1;

        if !compliant {
            tracing::warn!(
                score = overall_score,
                zero_tolerance_breach,
                below_threshold,
                "action is non-compliant"
            );
        }

        ComplianceResult {
            compliant,
            overall_score,
            checks,
            articles_evaluated,
        }
    }
}

impl Default for PolicyGuard {
    fn default() -> Self {
        Self::from_text("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verify(v: serde_json::Value) -> ComplianceResult {
        PolicyGuard::default().verify(&ActionDescriptor::new(v))
    }

    #[test]
    fn test_benign_action_is_compliant() {
        let result = verify(serde_json::json!({"description": "add a settings page"}));
        assert!(result.compliant);
        assert_eq!(result.overall_score, 100.0);
        assert_eq!(result.articles_evaluated, 13);
    }

    #[test]
    fn test_zero_tolerance_fails_despite_high_mean() {
        // One forbidden phrase: provenance drops to 0, mean is still
        // 12/13 * 100 ≈ 92.3 but the verdict must fail on the
        // zero-tolerance condition alone, not the mean.
        let result = verify(serde_json::json!({
            "description": "steal the ui"
        }));
        assert!(!result.compliant);
        assert_eq!(result.failed_articles(), vec!["provenance"]);
    }

    #[test]
    fn test_single_low_check_can_pass_if_mean_holds() {
        // human_oversight at 50 alone: mean = (12*100 + 50)/13 ≈ 96.2,
        // one check below 85. Both conditions hold so this passes.
        let result = verify(serde_json::json!({
            "description": "routine change",
            "human_can_override": false
        }));
        assert!(result.compliant);
        assert_eq!(result.checks.iter().filter(|c| !c.passed).count(), 1);
    }

    #[test]
    fn test_two_low_checks_fail_even_with_high_mean() {
        // Two checks at 50 but a hypothetical high mean would still fail
        // the at-most-one rule. Here: human_oversight 50 and
        // schedule_pressure 50 give mean ≈ 92.3, and two below 85.
        let result = verify(serde_json::json!({
            "description": "urgent deadline, skip review to make it",
            "human_can_override": false
        }));
        assert!(!result.compliant);
        assert!(result.checks.iter().filter(|c| c.score < 85).count() > 1);
    }

    #[test]
    fn test_mean_condition_fails_independently() {
        // quality_standards at 25 alone: one check below 85 (allowed) but
        // mean = (12*100 + 25)/13 ≈ 94.2 < 95.
        let result = verify(serde_json::json!({
            "description": "ship the service",
            "is_code": true,
            "has_tests": false,
            "has_documentation": false,
            "is_complete": false
        }));
        assert!(!result.compliant);
        assert!(result.overall_score < 95.0);
        assert_eq!(result.checks.iter().filter(|c| c.score < 85).count(), 1);
    }

    #[test]
    fn test_missing_policy_file_degrades() {
        let guard = PolicyGuard::new(Some(Path::new("/nonexistent/policy.md")));
        assert!(guard.policy_text().is_empty());
        let result = guard.verify(&ActionDescriptor::new(serde_json::json!({
            "description": "benign"
        })));
        assert!(result.compliant);
    }
}
