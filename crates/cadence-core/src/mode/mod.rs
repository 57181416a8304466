//! Mode types and session state for the four-stage pipeline.
//!
//! A `Mode` is one of the four fixed pipeline stages; a `Session` is one
//! execution instance of a mode with its own input, output, checkpoints
//! and error log. Mode inputs and outputs are closed tagged variants, one
//! shape per mode, validated at the orchestrator boundary.

pub mod manager;

pub use manager::ModeManager;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four operational modes, ordered by the default pipeline sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Ideate,
    Plan,
    Ship,
    Validate,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Ideate => "IDEATE",
            Mode::Plan => "PLAN",
            Mode::Ship => "SHIP",
            Mode::Validate => "VALIDATE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "IDEATE" => Some(Mode::Ideate),
            "PLAN" => Some(Mode::Plan),
            "SHIP" => Some(Mode::Ship),
            "VALIDATE" => Some(Mode::Validate),
            _ => None,
        }
    }

    /// Next mode in the standard pipeline. `VALIDATE` is terminal.
    pub fn next(&self) -> Option<Mode> {
        match self {
            Mode::Ideate => Some(Mode::Plan),
            Mode::Plan => Some(Mode::Ship),
            Mode::Ship => Some(Mode::Validate),
            Mode::Validate => None,
        }
    }

    pub fn all() -> [Mode; 4] {
        [Mode::Ideate, Mode::Plan, Mode::Ship, Mode::Validate]
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Active,
    Complete,
    Failed,
    /// Superseded by a newer session; paused-for-history, never discarded.
    Checkpointed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Active => "active",
            SessionStatus::Complete => "complete",
            SessionStatus::Failed => "failed",
            SessionStatus::Checkpointed => "checkpointed",
        }
    }
}

/// A timestamped snapshot appended to an active session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
}

/// One workflow instance of a mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub mode: Mode,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub input: ModeInput,
    pub output: Option<ModeOutput>,
    pub checkpoints: Vec<Checkpoint>,
    pub errors: Vec<String>,
}

impl Session {
    /// Create a new session, already ACTIVE.
    pub fn new(mode: Mode, input: ModeInput) -> Self {
        Self {
            id: generate_session_id(mode),
            mode,
            status: SessionStatus::Active,
            started_at: Utc::now(),
            ended_at: None,
            input,
            output: None,
            checkpoints: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Session ids combine the mode, a UTC timestamp (keeps ids ordered and
/// readable) and a short uuid suffix (keeps them unique within a second).
fn generate_session_id(mode: Mode) -> String {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let suffix = &uuid::Uuid::new_v4().simple().to_string()[..6];
    format!("{}_{}_{}", mode.as_str().to_lowercase(), stamp, suffix)
}

// ---------------------------------------------------------------------------
// Per-mode input payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdeateInput {
    pub prompt: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanInput {
    /// Vision document produced by an IDEATE session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_document: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Entry-requirement override: skip the "requires IDEATE output" check.
    #[serde(default)]
    pub direct_prompt: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipInput {
    /// Technical specification produced by a PLAN session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_specification: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub direct_prompt: bool,
    /// Named speed profile (fast / balanced / careful).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
    /// Overrides for the delivery gates; normally supplied by the
    /// delivery transform, exposed for hosts that deploy out-of-band.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_command: Option<String>,
    #[serde(default)]
    pub skip_tests: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateInput {
    /// Full output of a SHIP session.
    pub build_output: serde_json::Value,
}

/// Tagged input payload, one variant per mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum ModeInput {
    #[serde(rename = "IDEATE")]
    Ideate(IdeateInput),
    #[serde(rename = "PLAN")]
    Plan(PlanInput),
    #[serde(rename = "SHIP")]
    Ship(ShipInput),
    #[serde(rename = "VALIDATE")]
    Validate(ValidateInput),
}

impl ModeInput {
    pub fn mode(&self) -> Mode {
        match self {
            ModeInput::Ideate(_) => Mode::Ideate,
            ModeInput::Plan(_) => Mode::Plan,
            ModeInput::Ship(_) => Mode::Ship,
            ModeInput::Validate(_) => Mode::Validate,
        }
    }

    /// Whether the caller asked to skip the predecessor-output requirement.
    pub fn direct_prompt(&self) -> bool {
        match self {
            ModeInput::Plan(p) => p.direct_prompt,
            ModeInput::Ship(s) => s.direct_prompt,
            _ => false,
        }
    }

    /// Whether this input carries the output of the given predecessor mode.
    pub fn has_output_from(&self, mode: Mode) -> bool {
        match (self, mode) {
            (ModeInput::Plan(p), Mode::Ideate) => p.vision_document.is_some(),
            (ModeInput::Ship(s), Mode::Plan) => s.technical_specification.is_some(),
            (ModeInput::Validate(v), Mode::Ship) => !v.build_output.is_null(),
            _ => false,
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Per-mode output payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeateOutput {
    pub vision_document: serde_json::Value,
    pub agent_count: usize,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOutput {
    pub technical_specification: serde_json::Value,
    #[serde(default)]
    pub architecture_diagrams: Vec<String>,
    #[serde(default)]
    pub task_board: Vec<serde_json::Value>,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipOutput {
    // Exit criteria fields
    pub code_complete: bool,
    pub tests_passing: bool,
    pub deployed_to_production: bool,
    pub live_and_accessible: bool,
    pub monitoring_active: bool,
    pub documentation_published: bool,

    // Deployment addresses
    pub production_url: String,
    pub documentation_url: String,
    pub monitoring_url: String,
    pub health_check_url: String,

    // Gate inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_dir: Option<String>,
    #[serde(default)]
    pub expected_artifacts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_command: Option<String>,
    #[serde(default)]
    pub skip_tests: bool,

    /// Aggregate gate verdict, recorded by the orchestrator after the gate
    /// sequencer runs. None until then.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gates_passed: Option<bool>,

    pub deployed_at: DateTime<Utc>,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateOutput {
    pub validation_passed: bool,
    pub results: serde_json::Value,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub required_fixes: Vec<String>,
    pub session_id: String,
}

/// Tagged output payload, one variant per mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum ModeOutput {
    #[serde(rename = "IDEATE")]
    Ideate(IdeateOutput),
    #[serde(rename = "PLAN")]
    Plan(PlanOutput),
    #[serde(rename = "SHIP")]
    Ship(ShipOutput),
    #[serde(rename = "VALIDATE")]
    Validate(ValidateOutput),
}

impl ModeOutput {
    pub fn mode(&self) -> Mode {
        match self {
            ModeOutput::Ideate(_) => Mode::Ideate,
            ModeOutput::Plan(_) => Mode::Plan,
            ModeOutput::Ship(_) => Mode::Ship,
            ModeOutput::Validate(_) => Mode::Validate,
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            ModeOutput::Ideate(o) => &o.session_id,
            ModeOutput::Plan(o) => &o.session_id,
            ModeOutput::Ship(o) => &o.session_id,
            ModeOutput::Validate(o) => &o.session_id,
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Evaluate a named exit criterion against the serialized output.
    /// Absent fields are falsy.
    pub fn criterion(&self, name: &str) -> bool {
        self.to_value()
            .get(name)
            .map(value_is_truthy)
            .unwrap_or(false)
    }

    /// Condensed view for the workflow history.
    pub fn summary(&self) -> serde_json::Value {
        match self {
            ModeOutput::Ideate(o) => serde_json::json!({
                "session_id": o.session_id,
                "agent_count": o.agent_count,
            }),
            ModeOutput::Plan(o) => serde_json::json!({
                "session_id": o.session_id,
            }),
            ModeOutput::Ship(o) => serde_json::json!({
                "session_id": o.session_id,
                "production_url": o.production_url,
                "gates_passed": o.gates_passed,
            }),
            ModeOutput::Validate(o) => serde_json::json!({
                "session_id": o.session_id,
                "validation_passed": o.validation_passed,
            }),
        }
    }
}

/// JSON truthiness: false/null/0/""/[]/{} are falsy, everything else truthy.
pub fn value_is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_ordering_and_next() {
        assert!(Mode::Ideate < Mode::Plan);
        assert_eq!(Mode::Ideate.next(), Some(Mode::Plan));
        assert_eq!(Mode::Ship.next(), Some(Mode::Validate));
        assert_eq!(Mode::Validate.next(), None);
    }

    #[test]
    fn test_input_tag_roundtrip() {
        let input = ModeInput::Plan(PlanInput {
            vision_document: Some(serde_json::json!({"prompt": "x"})),
            prompt: None,
            direct_prompt: false,
        });
        let value = input.to_value();
        assert_eq!(value["mode"], "PLAN");
        let back: ModeInput = serde_json::from_value(value).unwrap();
        assert_eq!(back.mode(), Mode::Plan);
        assert!(back.has_output_from(Mode::Ideate));
    }

    #[test]
    fn test_truthiness() {
        assert!(value_is_truthy(&serde_json::json!(true)));
        assert!(value_is_truthy(&serde_json::json!("x")));
        assert!(value_is_truthy(&serde_json::json!(1)));
        assert!(!value_is_truthy(&serde_json::json!(false)));
        assert!(!value_is_truthy(&serde_json::json!(null)));
        assert!(!value_is_truthy(&serde_json::json!("")));
        assert!(!value_is_truthy(&serde_json::json!(0)));
    }

    #[test]
    fn test_session_id_prefix() {
        let session = Session::new(Mode::Ideate, ModeInput::Ideate(IdeateInput::default()));
        assert!(session.id.starts_with("ideate_"));
        assert_eq!(session.status, SessionStatus::Active);
    }
}
