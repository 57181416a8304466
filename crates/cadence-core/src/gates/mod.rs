//! Delivery readiness gates.
//!
//! Four gates run in a fixed order on every SHIP delivery: completeness,
//! tests, deployment, health. All four always run; the aggregate verdict
//! requires zero failures. A skipped gate never blocks.

pub mod validator;

pub use validator::{GateSequencer, GATE_ORDER};

use serde::{Deserialize, Serialize};

use crate::mode::ShipOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    Pass,
    Fail,
    Pending,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub gate: String,
    pub status: GateStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl GateResult {
    pub fn new(gate: &str, status: GateStatus, message: impl Into<String>) -> Self {
        Self {
            gate: gate.to_string(),
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Everything the gate sequencer needs to judge one delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateContext {
    /// Root of the build tree the completeness gate scans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_dir: Option<String>,
    /// Paths (relative to `artifact_dir`) that must exist.
    #[serde(default)]
    pub expected_artifacts: Vec<String>,
    /// Source markers that block delivery when found anywhere in the tree.
    #[serde(default = "default_blocking_markers")]
    pub blocking_markers: Vec<String>,
    /// Shell command for the tests gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_command: Option<String>,
    #[serde(default)]
    pub skip_tests: bool,
    #[serde(default = "default_min_coverage")]
    pub min_coverage: f64,
    #[serde(default = "default_test_timeout")]
    pub test_timeout_secs: u64,
    /// Target of the deployment and health gates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_url: Option<String>,
    #[serde(default = "default_health_path")]
    pub health_path: String,
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
}

fn default_blocking_markers() -> Vec<String> {
    vec!["TODO: CRITICAL".into(), "FIXME".into(), "HACK".into()]
}

fn default_min_coverage() -> f64 {
    70.0
}

fn default_test_timeout() -> u64 {
    300
}

fn default_health_path() -> String {
    "/health".into()
}

fn default_health_timeout() -> u64 {
    10
}

impl Default for GateContext {
    fn default() -> Self {
        Self {
            artifact_dir: None,
            expected_artifacts: Vec::new(),
            blocking_markers: default_blocking_markers(),
            test_command: None,
            skip_tests: false,
            min_coverage: default_min_coverage(),
            test_timeout_secs: default_test_timeout(),
            production_url: None,
            health_path: default_health_path(),
            health_timeout_secs: default_health_timeout(),
            deployment_id: None,
        }
    }
}

impl GateContext {
    pub fn from_ship_output(output: &ShipOutput) -> Self {
        Self {
            artifact_dir: output.artifact_dir.clone(),
            expected_artifacts: output.expected_artifacts.clone(),
            test_command: output.test_command.clone(),
            skip_tests: output.skip_tests,
            production_url: Some(output.production_url.clone()),
            ..Default::default()
        }
    }
}
