//! The article checks.
//!
//! Each check scores one policy article on 0..=100. Checks never abort the
//! run; every article is evaluated on every action so the result always
//! reports the full picture. `provenance` is the zero-tolerance article:
//! anything below 100 there fails the whole verdict regardless of the mean.

use crate::compliance::action::ActionDescriptor;
use crate::compliance::ComplianceCheck;

/// Articles where any deduction at all is an automatic overall failure.
pub const ZERO_TOLERANCE: &[&str] = &["provenance"];

const FORBIDDEN_SOURCING: &[&str] = &["steal", "copy", "rip off", "take from", "lift from"];
const REFERENCE_TERMS: &[&str] = &["reference", "inspired", "based on"];
const ATTRIBUTION_TERMS: &[&str] = &["credit", "attribution", "source"];
const OPEN_FORMATS: &[&str] = &["json", "markdown", "csv", "txt", "yaml", "html"];

pub fn run_all(action: &ActionDescriptor) -> Vec<ComplianceCheck> {
    vec![
        provenance(action),
        data_portability(action),
        role_separation(action),
        transparency(action),
        human_oversight(action),
        agent_provisioning(action),
        quality_standards(action),
        open_formats(action),
        schedule_pressure(action),
        emergency_protocol(action),
        policy_amendment(action),
        solution_completeness(action),
        release_gates(action),
    ]
}

/// Work must be original or properly attributed. Pass/fail only.
fn provenance(action: &ActionDescriptor) -> ComplianceCheck {
    if action.contains_any(FORBIDDEN_SOURCING) {
        return ComplianceCheck::new(
            "provenance",
            0,
            "action describes taking work from elsewhere",
        );
    }
    if action.contains_any(REFERENCE_TERMS) && !action.contains_any(ATTRIBUTION_TERMS) {
        return ComplianceCheck::new(
            "provenance",
            0,
            "references outside work without attribution",
        );
    }
    ComplianceCheck::new("provenance", 100, "original or attributed work")
}

/// Users must be able to leave with their data.
fn data_portability(action: &ActionDescriptor) -> ComplianceCheck {
    let mut score: i64 = 100;
    let mut notes = Vec::new();
    if action.contains_any(&["lock-in", "lock in", "proprietary format"]) {
        score -= 30;
        notes.push("introduces lock-in");
    }
    if action.contains_any(&["subscription"]) && !action.contains_any(&["export"]) {
        score -= 15;
        notes.push("subscription without a data export path");
    }
    let message = if notes.is_empty() {
        "data remains portable".to_string()
    } else {
        notes.join("; ")
    };
    ComplianceCheck::new("data_portability", score.max(0) as u32, message)
}

/// Coordinators route, advisors advise, builders build. Nobody wears two
/// hats on the same action.
fn role_separation(action: &ActionDescriptor) -> ComplianceCheck {
    let role = action.str_field("agent_role").unwrap_or_default();
    let description = action.description();
    let (score, message) = match role {
        "coordinator" if description.contains("execute") || description.contains("implement") => {
            (50, "coordinator performing execution work")
        }
        "advisor" if description.contains("enforce") || description.contains("block") => {
            (50, "advisor enforcing instead of advising")
        }
        "builder" if description.contains("approve") || description.contains("judge") => {
            (60, "builder judging its own output")
        }
        _ => (100, "role boundaries respected"),
    };
    ComplianceCheck::new("role_separation", score, message)
}

/// Actions must be observable and explainable.
fn transparency(action: &ActionDescriptor) -> ComplianceCheck {
    let mut score: i64 = 100;
    let mut notes = Vec::new();
    if !action.flag("logging_enabled") {
        score -= 20;
        notes.push("logging disabled");
    }
    if action.flag_or("requires_explanation", false) && !action.flag_or("explanation_provided", false)
    {
        score -= 15;
        notes.push("explanation required but not provided");
    }
    let message = if notes.is_empty() {
        "action is observable".to_string()
    } else {
        notes.join("; ")
    };
    ComplianceCheck::new("transparency", score.max(0) as u32, message)
}

/// Critical actions need a human in the loop, and humans can always
/// override.
fn human_oversight(action: &ActionDescriptor) -> ComplianceCheck {
    let critical = action.flag_or("is_critical", false);
    if critical && !action.flag("requires_human_approval") {
        return ComplianceCheck::new(
            "human_oversight",
            40,
            "critical action without human approval",
        );
    }
    if !action.flag("human_can_override") {
        return ComplianceCheck::new("human_oversight", 50, "no human override path");
    }
    ComplianceCheck::new("human_oversight", 100, "human oversight in place")
}

/// Agents come from the registry with declared scopes; no ad-hoc spawns.
fn agent_provisioning(action: &ActionDescriptor) -> ComplianceCheck {
    let mut score: i64 = 100;
    let mut notes = Vec::new();
    if action.flag_or("spawns_unregistered_agents", false) {
        score -= 15;
        notes.push("spawns agents outside the registry");
    }
    if action.flag_or("assigns_unscoped_capabilities", false) {
        score -= 10;
        notes.push("assigns capabilities outside declared scopes");
    }
    let message = if notes.is_empty() {
        "agents provisioned from the registry".to_string()
    } else {
        notes.join("; ")
    };
    ComplianceCheck::new("agent_provisioning", score.max(0) as u32, message)
}

/// Code ships with tests and documentation, and ships whole.
fn quality_standards(action: &ActionDescriptor) -> ComplianceCheck {
    if !action.flag_or("is_code", false) {
        return ComplianceCheck::new("quality_standards", 100, "not a code artifact");
    }
    let mut score: i64 = 100;
    let mut notes = Vec::new();
    if !action.flag_or("has_tests", false) {
        score -= 25;
        notes.push("no tests");
    }
    if !action.flag_or("has_documentation", false) {
        score -= 20;
        notes.push("no documentation");
    }
    if !action.flag("is_complete") {
        score -= 30;
        notes.push("incomplete implementation");
    }
    let message = if notes.is_empty() {
        "meets quality standards".to_string()
    } else {
        notes.join("; ")
    };
    ComplianceCheck::new("quality_standards", score.max(0) as u32, message)
}

/// Outputs use open formats and expose an API where one is expected.
fn open_formats(action: &ActionDescriptor) -> ComplianceCheck {
    let mut score: i64 = 100;
    let mut notes = Vec::new();
    if let Some(format) = action.str_field("output_format") {
        let format = format.to_lowercase();
        if !OPEN_FORMATS.iter().any(|f| format.contains(f)) {
            score -= 30;
            notes.push("output format is not an open format");
        }
    }
    if action.flag_or("should_have_api", false) && !action.flag("has_api") {
        score -= 20;
        notes.push("expected API is missing");
    }
    let message = if notes.is_empty() {
        "open formats used".to_string()
    } else {
        notes.join("; ")
    };
    ComplianceCheck::new("open_formats", score.max(0) as u32, message)
}

/// Deadlines never justify cutting the quality bar.
fn schedule_pressure(action: &ActionDescriptor) -> ComplianceCheck {
    let pressured = action.contains_any(&["deadline", "urgent", "asap"]);
    let rushing = action.contains_any(&["skip tests", "skip review", "rush", "cut corners"]);
    if pressured && rushing {
        return ComplianceCheck::new(
            "schedule_pressure",
            50,
            "schedule pressure used to justify skipping checks",
        );
    }
    ComplianceCheck::new("schedule_pressure", 100, "no pressure-driven shortcuts")
}

/// Emergencies are recorded and never bypass the gates.
fn emergency_protocol(action: &ActionDescriptor) -> ComplianceCheck {
    if !action.contains_any(&["emergency", "hotfix"]) {
        return ComplianceCheck::new("emergency_protocol", 100, "not an emergency action");
    }
    let mut score: i64 = 100;
    let mut notes = Vec::new();
    if !action.flag_or("incident_recorded", false) {
        score -= 30;
        notes.push("emergency without an incident record");
    }
    if action.flag_or("bypasses_gates", false) {
        score -= 40;
        notes.push("emergency used to bypass delivery gates");
    }
    let message = if notes.is_empty() {
        "emergency handled by the book".to_string()
    } else {
        notes.join("; ")
    };
    ComplianceCheck::new("emergency_protocol", score.max(0) as u32, message)
}

/// Policy text only changes through the approval process.
fn policy_amendment(action: &ActionDescriptor) -> ComplianceCheck {
    let amending = action.contains_any(&["amend policy", "change policy", "modify constitution"]);
    if amending && !action.flag_or("amendment_approved", false) {
        return ComplianceCheck::new("policy_amendment", 0, "unapproved policy amendment");
    }
    ComplianceCheck::new("policy_amendment", 100, "no unapproved policy change")
}

/// Ship finished systems, not fractions of one.
fn solution_completeness(action: &ActionDescriptor) -> ComplianceCheck {
    let partial = action.contains_any(&["mvp", "partial", "prototype only", "stub out"]);
    if partial && !action.contains_any(&["complete solution"]) {
        return ComplianceCheck::new(
            "solution_completeness",
            40,
            "deliberately partial deliverable",
        );
    }
    ComplianceCheck::new("solution_completeness", 100, "whole solution delivered")
}

/// SHIP outputs must have cleared all four delivery gates. Only evaluated
/// on outputs of SHIP; inputs and other modes trivially pass.
fn release_gates(action: &ActionDescriptor) -> ComplianceCheck {
    let applies = action.flag_or("is_output", false)
        && action.str_field("mode").map(str::to_uppercase) == Some("SHIP".to_string());
    if !applies {
        return ComplianceCheck::new("release_gates", 100, "not a shipped output");
    }
    let required = [
        "code_complete",
        "tests_passing",
        "deployed_to_production",
        "live_and_accessible",
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|field| !action.flag_or(field, false))
        .copied()
        .collect();
    if missing.is_empty() {
        ComplianceCheck::new("release_gates", 100, "all delivery gates cleared")
    } else {
        ComplianceCheck::new(
            "release_gates",
            0,
            format!("delivery gates not cleared: {}", missing.join(", ")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(v: serde_json::Value) -> ActionDescriptor {
        ActionDescriptor::new(v)
    }

    #[test]
    fn test_provenance_forbidden_phrase_scores_zero() {
        let check = provenance(&action(serde_json::json!({
            "description": "copy the dashboard from a competitor"
        })));
        assert_eq!(check.score, 0);
        assert!(!check.passed);
    }

    #[test]
    fn test_provenance_reference_needs_attribution() {
        let without = provenance(&action(serde_json::json!({
            "description": "layout inspired by classic kanban boards"
        })));
        assert_eq!(without.score, 0);
        let with = provenance(&action(serde_json::json!({
            "description": "layout inspired by classic kanban boards, with credit in the docs"
        })));
        assert_eq!(with.score, 100);
    }

    #[test]
    fn test_quality_standards_deductions_stack() {
        let check = quality_standards(&action(serde_json::json!({
            "is_code": true,
            "has_tests": false,
            "has_documentation": false,
            "is_complete": false
        })));
        assert_eq!(check.score, 25);
    }

    #[test]
    fn test_schedule_pressure_needs_both_signals() {
        let only_deadline = schedule_pressure(&action(serde_json::json!({
            "description": "urgent deadline on friday"
        })));
        assert_eq!(only_deadline.score, 100);
        let both = schedule_pressure(&action(serde_json::json!({
            "description": "urgent deadline, skip tests to make it"
        })));
        assert_eq!(both.score, 50);
    }

    #[test]
    fn test_release_gates_only_on_ship_outputs() {
        let ship_input = release_gates(&action(serde_json::json!({
            "mode": "SHIP", "is_output": false
        })));
        assert_eq!(ship_input.score, 100);

        let bad_output = release_gates(&action(serde_json::json!({
            "mode": "SHIP", "is_output": true,
            "code_complete": true, "tests_passing": false,
            "deployed_to_production": true, "live_and_accessible": true
        })));
        assert_eq!(bad_output.score, 0);
        assert!(bad_output.message.contains("tests_passing"));

        let good_output = release_gates(&action(serde_json::json!({
            "mode": "SHIP", "is_output": true,
            "code_complete": true, "tests_passing": true,
            "deployed_to_production": true, "live_and_accessible": true
        })));
        assert_eq!(good_output.score, 100);
    }

    #[test]
    fn test_run_all_evaluates_every_article() {
        let checks = run_all(&action(serde_json::json!({"description": "benign"})));
        assert_eq!(checks.len(), 13);
        assert!(checks.iter().all(|c| c.passed));
    }
}
