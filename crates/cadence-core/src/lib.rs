//! Cadence core: a policy-gated workflow engine.
//!
//! The engine drives work through four fixed modes, IDEATE → PLAN → SHIP →
//! VALIDATE, with pluggable agents doing the work inside each mode. Two
//! control layers sit across every execution: a compliance guard that
//! scores each proposed and completed action against a policy, and a
//! four-gate delivery check that judges every SHIP before it counts as
//! done.
//!
//! The crate is transport-agnostic. `cadence-server` puts an HTTP and
//! WebSocket surface on it; `cadence-cli` drives it from the terminal.

pub mod agents;
pub mod compliance;
pub mod config;
pub mod error;
pub mod events;
pub mod gates;
pub mod mode;
pub mod orchestrator;
pub mod runner;
pub mod state;

pub use agents::{ActivationService, AgentRegistry};
pub use compliance::{ActionDescriptor, PolicyGuard};
pub use config::ModeConfigSet;
pub use error::EngineError;
pub use events::{EventBus, WorkflowEvent};
pub use gates::{GateContext, GateSequencer};
pub use mode::{Mode, ModeInput, ModeManager, ModeOutput, Session, SessionStatus};
pub use orchestrator::Orchestrator;
pub use runner::{ModeRunner, StubModeRunner};
pub use state::{new_state, AppState, AppStateInner};
