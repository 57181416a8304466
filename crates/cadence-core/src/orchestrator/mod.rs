//! The orchestrator: drives one mode execution end to end, and chains
//! executions into the macro workflows.
//!
//! One mode execution is nine steps: verify the input tag, pre-check
//! compliance, start the session, activate agents, run the transform,
//! gate the delivery (SHIP only), post-check compliance, complete the
//! session, deactivate agents. Any failure after the session starts fails
//! the session, deactivates all agents, and surfaces the error to the
//! caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agents::ActivationService;
use crate::compliance::{ActionDescriptor, PolicyGuard};
use crate::config::ModeConfigSet;
use crate::error::EngineError;
use crate::events::{EventBus, WorkflowEvent};
use crate::gates::{GateContext, GateSequencer};
use crate::mode::{
    IdeateInput, Mode, ModeInput, ModeManager, ModeOutput, PlanInput, ShipInput, ValidateInput,
};
use crate::runner::ModeRunner;

/// One line of the workflow history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowHistoryRecord {
    pub mode: Mode,
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub success: bool,
    pub output_summary: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct Orchestrator {
    configs: ModeConfigSet,
    modes: ModeManager,
    agents: ActivationService,
    gates: GateSequencer,
    guard: PolicyGuard,
    runner: Box<dyn ModeRunner>,
    events: EventBus,
    history: Vec<WorkflowHistoryRecord>,
    enforce_compliance: bool,
}

impl Orchestrator {
    pub fn new(
        configs: ModeConfigSet,
        agents: ActivationService,
        guard: PolicyGuard,
        runner: Box<dyn ModeRunner>,
        events: EventBus,
    ) -> Self {
        Self {
            configs,
            modes: ModeManager::new(),
            agents,
            gates: GateSequencer::new(),
            guard,
            runner,
            events,
            history: Vec::new(),
            enforce_compliance: true,
        }
    }

    /// Disable compliance enforcement. Checks still run and are logged;
    /// their verdict no longer blocks execution.
    pub fn set_enforce_compliance(&mut self, enforce: bool) {
        self.enforce_compliance = enforce;
    }

    /// Owned handle to the event bus; cheap to clone.
    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    /// Execute one mode end to end.
    pub async fn execute_mode(
        &mut self,
        mode: Mode,
        input: ModeInput,
    ) -> Result<ModeOutput, EngineError> {
        if input.mode() != mode {
            return Err(EngineError::BadRequest(format!(
                "input is tagged {} but {} was requested",
                input.mode(),
                mode
            )));
        }

        self.events.emit(WorkflowEvent::Status {
            mode,
            message: format!("{} starting", mode),
        });

        // Pre-check: the proposed action must be compliant before any
        // session state is created.
        self.check_compliance(mode, &input.to_value(), false)?;

        let session = self.modes.start(&self.configs, mode, input.clone())?.clone();
        let started_at = session.started_at;

        match self.drive(&session, mode, &input).await {
            Ok(output) => {
                let done = match self.modes.complete(&self.configs, output.clone()) {
                    Ok(done) => done,
                    Err(e) => return self.abort(mode, started_at, &session.id, e),
                };
                self.agents.deactivate_all();
                self.history.push(WorkflowHistoryRecord {
                    mode,
                    session_id: done.id.clone(),
                    started_at,
                    ended_at: done.ended_at.unwrap_or_else(Utc::now),
                    success: true,
                    output_summary: Some(output.summary()),
                    error: None,
                });
                self.events.emit(WorkflowEvent::Complete {
                    mode,
                    session_id: done.id,
                });
                Ok(output)
            }
            Err(e) => self.abort(mode, started_at, &session.id, e),
        }
    }

    /// Steps 4..=7: activation, transform, gating, post-check. Split out
    /// so `execute_mode` can funnel every error through `abort`.
    async fn drive(
        &mut self,
        session: &crate::mode::Session,
        mode: Mode,
        input: &ModeInput,
    ) -> Result<ModeOutput, EngineError> {
        let activated = self.agents.activate_all(mode);
        self.events.emit(WorkflowEvent::Progress {
            mode,
            step: "agents".into(),
            detail: format!("{} agents active", activated.len()),
        });

        let mut output = self.runner.run(session, self.agents.active_agents(), input)?;
        self.events.emit(WorkflowEvent::Progress {
            mode,
            step: "transform".into(),
            detail: "mode transform complete".into(),
        });

        if let ModeOutput::Ship(ship) = &mut output {
            let ctx = GateContext::from_ship_output(ship);
            let results = self.gates.validate_all(&ctx).await;
            let passed = GateSequencer::all_passed(&results);
            ship.gates_passed = Some(passed);
            self.modes.checkpoint(GateSequencer::summary(&results));
            self.events.emit(WorkflowEvent::Progress {
                mode,
                step: "gates".into(),
                detail: format!("delivery gates passed: {}", passed),
            });
            if !passed {
                return Err(EngineError::GateFailure {
                    gates: GateSequencer::failed_gates(&results),
                });
            }
        }

        // Post-check: the completed output is an action too.
        self.check_compliance(mode, &output.to_value(), true)?;
        Ok(output)
    }

    fn check_compliance(
        &self,
        mode: Mode,
        payload: &serde_json::Value,
        is_output: bool,
    ) -> Result<(), EngineError> {
        let mut action = payload.clone();
        if let Some(obj) = action.as_object_mut() {
            obj.insert("is_output".into(), serde_json::json!(is_output));
            obj.entry("mode").or_insert(serde_json::json!(mode.as_str()));
        }
        let result = self.guard.verify(&ActionDescriptor::new(action));
        if !result.compliant && self.enforce_compliance {
            return Err(EngineError::ComplianceViolation {
                articles: result.failed_articles(),
                score: result.overall_score,
            });
        }
        Ok(())
    }

    /// Failure path: fail the session, deactivate everything, record it,
    /// emit the error, and hand the original error back.
    fn abort(
        &mut self,
        mode: Mode,
        started_at: DateTime<Utc>,
        session_id: &str,
        error: EngineError,
    ) -> Result<ModeOutput, EngineError> {
        self.modes.fail(&error.to_string());
        self.agents.deactivate_all();
        self.history.push(WorkflowHistoryRecord {
            mode,
            session_id: session_id.to_string(),
            started_at,
            ended_at: Utc::now(),
            success: false,
            output_summary: None,
            error: Some(error.to_string()),
        });
        self.events.emit(WorkflowEvent::Error {
            mode,
            message: error.to_string(),
        });
        Err(error)
    }

    // -- macro workflows ----------------------------------------------------

    /// IDEATE → PLAN → SHIP → VALIDATE, each stage fed the previous
    /// stage's output. Stops at the first failure.
    pub async fn full_lifecycle(&mut self, prompt: &str) -> Result<ModeOutput, EngineError> {
        let vision = self
            .execute_mode(Mode::Ideate, ModeInput::Ideate(IdeateInput { prompt: prompt.into() }))
            .await?;
        let ModeOutput::Ideate(ideate) = vision else {
            return Err(EngineError::Internal("IDEATE produced the wrong output".into()));
        };
        let plan = self
            .execute_mode(
                Mode::Plan,
                ModeInput::Plan(PlanInput {
                    vision_document: Some(ideate.vision_document),
                    prompt: None,
                    direct_prompt: false,
                }),
            )
            .await?;
        let ModeOutput::Plan(plan) = plan else {
            return Err(EngineError::Internal("PLAN produced the wrong output".into()));
        };
        let shipped = self
            .execute_mode(
                Mode::Ship,
                ModeInput::Ship(ShipInput {
                    technical_specification: Some(plan.technical_specification),
                    ..Default::default()
                }),
            )
            .await?;
        let build_output = shipped.to_value();
        self.execute_mode(
            Mode::Validate,
            ModeInput::Validate(ValidateInput { build_output }),
        )
        .await
    }

    /// IDEATE → SHIP → VALIDATE, skipping the planning stage. SHIP enters
    /// on the direct-prompt override.
    pub async fn rapid(&mut self, prompt: &str) -> Result<ModeOutput, EngineError> {
        self.execute_mode(
            Mode::Ideate,
            ModeInput::Ideate(IdeateInput { prompt: prompt.into() }),
        )
        .await?;
        let shipped = self
            .execute_mode(
                Mode::Ship,
                ModeInput::Ship(ShipInput {
                    prompt: Some(prompt.into()),
                    direct_prompt: true,
                    ..Default::default()
                }),
            )
            .await?;
        let build_output = shipped.to_value();
        self.execute_mode(
            Mode::Validate,
            ModeInput::Validate(ValidateInput { build_output }),
        )
        .await
    }

    /// SHIP then VALIDATE from a prompt, using the direct-prompt override.
    pub async fn express(&mut self, prompt: &str) -> Result<ModeOutput, EngineError> {
        let shipped = self
            .execute_mode(
                Mode::Ship,
                ModeInput::Ship(ShipInput {
                    prompt: Some(prompt.into()),
                    direct_prompt: true,
                    ..Default::default()
                }),
            )
            .await?;
        let build_output = shipped.to_value();
        self.execute_mode(
            Mode::Validate,
            ModeInput::Validate(ValidateInput { build_output }),
        )
        .await
    }

    // -- introspection ------------------------------------------------------

    pub fn status(&self) -> serde_json::Value {
        serde_json::json!({
            "sessions": self.modes.summary(),
            "agents": self.agents.summary(),
            "workflows_run": self.history.len(),
            "compliance_enforced": self.enforce_compliance,
        })
    }

    pub fn history(&self) -> &[WorkflowHistoryRecord] {
        &self.history
    }

    pub fn modes(&self) -> &ModeManager {
        &self.modes
    }

    pub fn agents(&self) -> &ActivationService {
        &self.agents
    }

    pub fn configs(&self) -> &ModeConfigSet {
        &self.configs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentRegistry;
    use crate::runner::StubModeRunner;

    fn orchestrator() -> (Orchestrator, tempfile::TempDir) {
        orchestrator_deploying_to("app.example.com")
    }

    fn orchestrator_deploying_to(domain: &str) -> (Orchestrator, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let runner = StubModeRunner::new()
            .with_artifact_root(dir.path().join("builds"))
            .with_base_domain(domain);
        let orch = Orchestrator::new(
            ModeConfigSet::builtin(),
            ActivationService::new(AgentRegistry::builtin()),
            PolicyGuard::default(),
            Box::new(runner),
            EventBus::new(),
        );
        (orch, dir)
    }

    /// Minimal HTTP endpoint answering 200 to everything, so the
    /// deployment and health gates see a live production URL.
    async fn spawn_live_endpoint() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = stream.read(&mut buf).await;
                    let _ = stream
                        .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\nok")
                        .await;
                });
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_ideate_executes_and_completes() {
        let (mut orch, _dir) = orchestrator();
        let output = orch
            .execute_mode(
                Mode::Ideate,
                ModeInput::Ideate(IdeateInput { prompt: "a task tracker".into() }),
            )
            .await
            .unwrap();
        assert_eq!(output.mode(), Mode::Ideate);
        assert_eq!(orch.history().len(), 1);
        assert!(orch.history()[0].success);
        // The full roster activates for IDEATE and is released afterwards.
        assert_eq!(orch.agents().active_count(), 0);
    }

    #[tokio::test]
    async fn test_input_tag_mismatch_is_rejected() {
        let (mut orch, _dir) = orchestrator();
        let err = orch
            .execute_mode(
                Mode::Plan,
                ModeInput::Ideate(IdeateInput { prompt: "x".into() }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::BadRequest(_)));
        // Rejected before any session was created.
        assert!(orch.history().is_empty());
    }

    #[tokio::test]
    async fn test_precheck_blocks_noncompliant_prompt() {
        let (mut orch, _dir) = orchestrator();
        let err = orch
            .execute_mode(
                Mode::Ideate,
                ModeInput::Ideate(IdeateInput {
                    prompt: "steal the competitor's dashboard".into(),
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ComplianceViolation { .. }));
        assert!(orch.modes().active().is_none());
    }

    #[tokio::test]
    async fn test_ship_gate_failure_fails_session_and_releases_agents() {
        // The stub deploys to an unreachable domain, so the health gate
        // fails and the whole SHIP execution must fail cleanly.
        let (mut orch, _dir) = orchestrator();
        let err = orch
            .execute_mode(
                Mode::Ship,
                ModeInput::Ship(ShipInput {
                    prompt: Some("ship it".into()),
                    direct_prompt: true,
                    production_url: Some("https://unreachable.invalid".into()),
                    skip_tests: true,
                    ..Default::default()
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::GateFailure { .. }));
        let record = &orch.history()[0];
        assert!(!record.success);
        assert_eq!(orch.agents().active_count(), 0);
        let session = orch.modes().history().last().unwrap();
        assert_eq!(session.status, crate::mode::SessionStatus::Failed);
    }

    #[tokio::test]
    async fn test_express_uses_direct_prompt() {
        let (mut orch, _dir) = orchestrator();
        // Gate failure is expected (no live endpoint); the point is that
        // the entry requirement did not block a direct-prompt SHIP.
        let err = orch.express("ship a landing page").await.unwrap_err();
        assert!(matches!(err, EngineError::GateFailure { .. }));
        assert!(!matches!(err, EngineError::EntryRequirement { .. }));
    }

    #[tokio::test]
    async fn test_rapid_skips_plan_and_ends_in_validation() {
        let url = spawn_live_endpoint().await;
        let (mut orch, _dir) = orchestrator_deploying_to(&url);
        let output = orch.rapid("a notes app").await.unwrap();
        assert_eq!(output.mode(), Mode::Validate);

        let modes: Vec<Mode> = orch.history().iter().map(|r| r.mode).collect();
        assert_eq!(modes, vec![Mode::Ideate, Mode::Ship, Mode::Validate]);
        assert!(orch.history().iter().all(|r| r.success));
    }

    #[tokio::test]
    async fn test_express_ships_then_validates() {
        let url = spawn_live_endpoint().await;
        let (mut orch, _dir) = orchestrator_deploying_to(&url);
        let output = orch.express("ship a landing page").await.unwrap();
        let ModeOutput::Validate(validated) = output else {
            panic!("expected VALIDATE output")
        };
        assert!(validated.validation_passed);

        let modes: Vec<Mode> = orch.history().iter().map(|r| r.mode).collect();
        assert_eq!(modes, vec![Mode::Ship, Mode::Validate]);
    }

    #[tokio::test]
    async fn test_unenforced_compliance_logs_but_proceeds() {
        let (mut orch, _dir) = orchestrator();
        orch.set_enforce_compliance(false);
        let output = orch
            .execute_mode(
                Mode::Ideate,
                ModeInput::Ideate(IdeateInput {
                    prompt: "steal the competitor's dashboard".into(),
                }),
            )
            .await
            .unwrap();
        assert_eq!(output.mode(), Mode::Ideate);
    }
}
