//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level CLI command and drives the
//! cadence-core engine directly. The engine keeps sessions in memory, so
//! chaining across invocations goes through a small state directory where
//! each completed mode's output is saved as JSON.

pub mod mode;
pub mod server;
pub mod status;
pub mod workflow;

use std::path::PathBuf;

use cadence_core::agents::ActivationService;
use cadence_core::{
    AgentRegistry, EventBus, Mode, ModeConfigSet, ModeOutput, Orchestrator, PolicyGuard,
    StubModeRunner,
};

/// Global CLI options shared by every command.
pub struct Context {
    pub registry: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub policy: Option<PathBuf>,
    pub state_dir: Option<PathBuf>,
}

impl Context {
    /// Build an orchestrator from the global options. Errors here are
    /// configuration problems and abort the command.
    pub fn orchestrator(&self) -> Result<Orchestrator, String> {
        let registry = match &self.registry {
            Some(path) => AgentRegistry::load(path).map_err(|e| e.to_string())?,
            None => AgentRegistry::builtin(),
        };
        let configs = match &self.config_dir {
            Some(dir) => ModeConfigSet::load_dir(dir).map_err(|e| e.to_string())?,
            None => ModeConfigSet::builtin(),
        };
        let guard = PolicyGuard::new(self.policy.as_deref());
        Ok(Orchestrator::new(
            configs,
            ActivationService::new(registry),
            guard,
            Box::new(StubModeRunner::new()),
            EventBus::new(),
        ))
    }

    /// Where chained mode outputs live.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("cadence")
        })
    }

    /// Save a completed mode output for later `--from-last` chaining.
    pub fn save_output(&self, output: &ModeOutput) -> Result<(), String> {
        let dir = self.state_dir();
        std::fs::create_dir_all(&dir)
            .map_err(|e| format!("cannot create state dir {}: {}", dir.display(), e))?;
        let path = dir.join(format!("{}.json", output.mode().as_str().to_lowercase()));
        let json = serde_json::to_string_pretty(&output.to_value())
            .map_err(|e| format!("cannot serialize output: {}", e))?;
        std::fs::write(&path, json)
            .map_err(|e| format!("cannot write {}: {}", path.display(), e))
    }

    /// Load the last saved output of `mode`.
    pub fn load_output(&self, mode: Mode) -> Result<serde_json::Value, String> {
        let path = self
            .state_dir()
            .join(format!("{}.json", mode.as_str().to_lowercase()));
        let raw = std::fs::read_to_string(&path).map_err(|_| {
            format!(
                "no saved {} output at {}; run `cadence {}` first",
                mode,
                path.display(),
                mode.as_str().to_lowercase()
            )
        })?;
        serde_json::from_str(&raw).map_err(|e| format!("corrupt {}: {}", path.display(), e))
    }
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

/// Print the per-command result banner.
pub fn print_done(mode: Mode, session_id: &str) {
    println!(
        "{} {} complete (session {})",
        console::style("✔").green(),
        mode,
        session_id
    );
}
