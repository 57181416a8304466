//! Workflow progress events.
//!
//! The orchestrator emits events as a session moves through its steps;
//! subscribers (the WebSocket channel, the CLI spinner) receive them over
//! a broadcast channel. Emitting with no subscribers is fine.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::mode::Mode;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    Status { mode: Mode, message: String },
    Progress { mode: Mode, step: String, detail: String },
    Complete { mode: Mode, session_id: String },
    Error { mode: Mode, message: String },
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    /// Send to all current subscribers. No subscribers is not an error.
    pub fn emit(&self, event: WorkflowEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
