//! Shared application state for embedding the engine in a server.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::events::EventBus;
use crate::orchestrator::Orchestrator;

pub struct AppStateInner {
    /// The orchestrator is single-writer; handlers serialize on this lock.
    pub orchestrator: Mutex<Orchestrator>,
    pub events: EventBus,
}

pub type AppState = Arc<AppStateInner>;

pub fn new_state(orchestrator: Orchestrator) -> AppState {
    let events = orchestrator.events();
    Arc::new(AppStateInner {
        orchestrator: Mutex::new(orchestrator),
        events,
    })
}
