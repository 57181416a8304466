//! Session lifecycle management.
//!
//! At most one session is active at a time. Starting a new mode while one
//! is active checkpoints the running session and archives it; completing or
//! failing a session moves it to history. History is in memory only and
//! lives for the manager's lifetime.

use chrono::Utc;

use crate::config::ModeConfigSet;
use crate::error::EngineError;
use crate::mode::{Checkpoint, Mode, ModeInput, ModeOutput, Session, SessionStatus};

#[derive(Debug, Default)]
pub struct ModeManager {
    active: Option<Session>,
    history: Vec<Session>,
}

impl ModeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session for `mode`.
    ///
    /// Entry requirements are checked first: if the mode's config names a
    /// required predecessor, the input must either carry that predecessor's
    /// output or set the direct-prompt override (where allowed). Any
    /// currently active session is checkpointed and archived before the new
    /// one becomes active.
    pub fn start(
        &mut self,
        configs: &ModeConfigSet,
        mode: Mode,
        input: ModeInput,
    ) -> Result<&Session, EngineError> {
        let config = configs.get(mode);

        if let Some(required) = config.entry_requirements.requires_input_from {
            let satisfied = input.has_output_from(required)
                || (config.entry_requirements.direct_prompt_allowed && input.direct_prompt());
            if !satisfied {
                return Err(EngineError::EntryRequirement {
                    mode: mode.to_string(),
                    reason: format!("requires output from {}", required),
                });
            }
        }

        if let Some(mut previous) = self.active.take() {
            tracing::info!(
                session = %previous.id,
                mode = %previous.mode,
                "checkpointing active session superseded by {}",
                mode
            );
            previous.checkpoints.push(Checkpoint {
                timestamp: Utc::now(),
                data: serde_json::json!({ "superseded_by": mode.as_str() }),
            });
            previous.status = SessionStatus::Checkpointed;
            previous.ended_at = Some(Utc::now());
            self.history.push(previous);
        }

        let session = Session::new(mode, input);
        tracing::info!(session = %session.id, mode = %mode, "session started");
        Ok(self.active.insert(session))
    }

    /// Complete the active session with `output`.
    ///
    /// Every exit criterion in the mode's config must evaluate truthy on
    /// the output. On an unmet criterion the session stays active so the
    /// caller can retry with a corrected output.
    pub fn complete(
        &mut self,
        configs: &ModeConfigSet,
        output: ModeOutput,
    ) -> Result<Session, EngineError> {
        let session = self
            .active
            .as_mut()
            .ok_or_else(|| EngineError::BadRequest("no active session to complete".into()))?;

        if output.mode() != session.mode {
            return Err(EngineError::BadRequest(format!(
                "output is for {} but the active session is {}",
                output.mode(),
                session.mode
            )));
        }

        let config = configs.get(session.mode);
        let unmet: Vec<String> = config
            .exit_criteria
            .iter()
            .filter(|(_, required)| **required)
            .filter(|(name, _)| !output.criterion(name))
            .map(|(name, _)| name.clone())
            .collect();
        if !unmet.is_empty() {
            return Err(EngineError::ExitCriteria {
                mode: session.mode.to_string(),
                unmet,
            });
        }

        let mut done = self
            .active
            .take()
            .ok_or_else(|| EngineError::Internal("active session vanished".into()))?;
        done.output = Some(output);
        done.status = SessionStatus::Complete;
        done.ended_at = Some(Utc::now());
        tracing::info!(session = %done.id, mode = %done.mode, "session complete");
        self.history.push(done.clone());
        Ok(done)
    }

    /// Fail the active session, recording `error`. Never errors; failing
    /// with no active session is a no-op.
    pub fn fail(&mut self, error: &str) -> Option<Session> {
        let mut session = self.active.take()?;
        session.errors.push(error.to_string());
        session.status = SessionStatus::Failed;
        session.ended_at = Some(Utc::now());
        tracing::warn!(session = %session.id, mode = %session.mode, error, "session failed");
        self.history.push(session.clone());
        Some(session)
    }

    /// Append a checkpoint to the active session. No-op when idle.
    pub fn checkpoint(&mut self, data: serde_json::Value) {
        if let Some(session) = self.active.as_mut() {
            session.checkpoints.push(Checkpoint {
                timestamp: Utc::now(),
                data,
            });
        }
    }

    pub fn active(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    pub fn history(&self) -> &[Session] {
        &self.history
    }

    /// Most recent archived session regardless of how it ended, optionally
    /// filtered by mode.
    pub fn last_session(&self, mode: Option<Mode>) -> Option<&Session> {
        self.history
            .iter()
            .rev()
            .find(|s| mode.map_or(true, |m| s.mode == m))
    }

    /// Most recent session that completed successfully, optionally filtered
    /// by mode. Output chaining wants this rather than `last_session`.
    pub fn last_completed(&self, mode: Option<Mode>) -> Option<&Session> {
        self.history
            .iter()
            .rev()
            .find(|s| s.status == SessionStatus::Complete && mode.map_or(true, |m| s.mode == m))
    }

    /// Pipeline successor of the last completed session, or IDEATE when
    /// nothing has completed yet.
    pub fn next_mode(&self) -> Option<Mode> {
        match self.last_completed(None) {
            Some(session) => session.mode.next(),
            None => Some(Mode::Ideate),
        }
    }

    pub fn summary(&self) -> serde_json::Value {
        let mut per_mode = std::collections::BTreeMap::new();
        for session in &self.history {
            *per_mode.entry(session.mode.as_str()).or_insert(0usize) += 1;
        }
        let recent: Vec<_> = self
            .history
            .iter()
            .rev()
            .take(5)
            .map(|s| {
                serde_json::json!({
                    "id": s.id,
                    "mode": s.mode,
                    "status": s.status,
                    "ended_at": s.ended_at,
                })
            })
            .collect();
        serde_json::json!({
            "active": self.active.as_ref().map(|s| serde_json::json!({
                "id": s.id,
                "mode": s.mode,
                "status": s.status,
                "started_at": s.started_at,
            })),
            "history_count": self.history.len(),
            "per_mode": per_mode,
            "recent": recent,
            "next_mode": self.next_mode(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::{IdeateInput, IdeateOutput, PlanInput, ShipInput};

    fn configs() -> ModeConfigSet {
        ModeConfigSet::builtin()
    }

    fn ideate_input() -> ModeInput {
        ModeInput::Ideate(IdeateInput {
            prompt: "a task tracker".into(),
        })
    }

    fn ideate_output(session_id: &str) -> ModeOutput {
        ModeOutput::Ideate(IdeateOutput {
            vision_document: serde_json::json!({"summary": "task tracker"}),
            agent_count: 10,
            session_id: session_id.into(),
        })
    }

    #[test]
    fn test_start_and_complete() {
        let configs = configs();
        let mut manager = ModeManager::new();
        let id = manager
            .start(&configs, Mode::Ideate, ideate_input())
            .unwrap()
            .id
            .clone();
        let done = manager.complete(&configs, ideate_output(&id)).unwrap();
        assert_eq!(done.status, SessionStatus::Complete);
        assert!(manager.active().is_none());
        assert_eq!(manager.history().len(), 1);
        assert_eq!(manager.next_mode(), Some(Mode::Plan));
    }

    #[test]
    fn test_entry_requirement_blocks_plan_without_vision() {
        let configs = configs();
        let mut manager = ModeManager::new();
        let err = manager
            .start(
                &configs,
                Mode::Plan,
                ModeInput::Plan(PlanInput::default()),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::EntryRequirement { .. }));
    }

    #[test]
    fn test_direct_prompt_override() {
        let configs = configs();
        let mut manager = ModeManager::new();
        let input = ModeInput::Plan(PlanInput {
            vision_document: None,
            prompt: Some("skip ideation".into()),
            direct_prompt: true,
        });
        assert!(manager.start(&configs, Mode::Plan, input).is_ok());
    }

    #[test]
    fn test_validate_rejects_direct_prompt() {
        // VALIDATE never allows a direct prompt; a SHIP input with the
        // override set demonstrates the per-mode flag, not VALIDATE's.
        let configs = configs();
        let config = configs.get(Mode::Validate);
        assert!(!config.entry_requirements.direct_prompt_allowed);
    }

    #[test]
    fn test_supersede_checkpoints_previous() {
        let configs = configs();
        let mut manager = ModeManager::new();
        manager.start(&configs, Mode::Ideate, ideate_input()).unwrap();
        let input = ModeInput::Ship(ShipInput {
            direct_prompt: true,
            prompt: Some("ship it".into()),
            ..Default::default()
        });
        manager.start(&configs, Mode::Ship, input).unwrap();
        assert_eq!(manager.history().len(), 1);
        let archived = &manager.history()[0];
        assert_eq!(archived.status, SessionStatus::Checkpointed);
        assert_eq!(archived.checkpoints.len(), 1);
        assert_eq!(archived.checkpoints[0].data["superseded_by"], "SHIP");
    }

    #[test]
    fn test_unmet_exit_criteria_keeps_session_active() {
        let configs = configs();
        let mut manager = ModeManager::new();
        let id = manager
            .start(&configs, Mode::Ideate, ideate_input())
            .unwrap()
            .id
            .clone();
        let bad = ModeOutput::Ideate(IdeateOutput {
            vision_document: serde_json::Value::Null,
            agent_count: 0,
            session_id: id.clone(),
        });
        let err = manager.complete(&configs, bad).unwrap_err();
        assert!(matches!(err, EngineError::ExitCriteria { .. }));
        assert!(manager.active().is_some());
        // Retry with a valid output succeeds.
        manager.complete(&configs, ideate_output(&id)).unwrap();
    }

    #[test]
    fn test_fail_archives_session() {
        let configs = configs();
        let mut manager = ModeManager::new();
        manager.start(&configs, Mode::Ideate, ideate_input()).unwrap();
        let failed = manager.fail("runner exploded").unwrap();
        assert_eq!(failed.status, SessionStatus::Failed);
        assert_eq!(failed.errors, vec!["runner exploded".to_string()]);
        assert!(manager.active().is_none());
        // A failed session never counts as the pipeline's last step.
        assert_eq!(manager.next_mode(), Some(Mode::Ideate));
    }

    #[test]
    fn test_fail_with_no_active_session_is_noop() {
        let mut manager = ModeManager::new();
        assert!(manager.fail("nothing running").is_none());
    }

    #[test]
    fn test_last_session_sees_every_terminal_status() {
        let configs = configs();
        let mut manager = ModeManager::new();
        manager.start(&configs, Mode::Ideate, ideate_input()).unwrap();
        manager.fail("runner exploded").unwrap();

        // A failed IDEATE is still the most recent archived session.
        let last = manager.last_session(Some(Mode::Ideate)).unwrap();
        assert_eq!(last.status, SessionStatus::Failed);
        assert!(manager.last_completed(Some(Mode::Ideate)).is_none());

        // A superseded session is reachable through last_session too.
        manager.start(&configs, Mode::Ideate, ideate_input()).unwrap();
        let input = ModeInput::Ship(ShipInput {
            direct_prompt: true,
            prompt: Some("ship it".into()),
            ..Default::default()
        });
        manager.start(&configs, Mode::Ship, input).unwrap();
        let last = manager.last_session(Some(Mode::Ideate)).unwrap();
        assert_eq!(last.status, SessionStatus::Checkpointed);
    }
}
