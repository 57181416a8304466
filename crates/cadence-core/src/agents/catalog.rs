//! Agent capability trait and the built-in factory map.
//!
//! Instantiation is a static lookup from agent name to factory function;
//! unknown names simply have no factory and fail activation for that one
//! agent. Hosts can extend the map with their own factories.

use std::collections::HashMap;

use serde_json::Value;

use crate::agents::{AgentDescriptor, AgentRole};
use crate::error::EngineError;

/// A live agent instance.
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;
    fn capabilities(&self) -> Vec<&'static str>;
    fn execute(&self, task: &str, context: &Value) -> Result<Value, EngineError>;
}

/// Constructs a live agent from its registry descriptor.
pub type AgentFactory = fn(&AgentDescriptor) -> Box<dyn Agent>;

macro_rules! stub_agent {
    ($type:ident, $caps:expr) => {
        pub struct $type {
            name: String,
        }

        impl $type {
            pub fn new(descriptor: &AgentDescriptor) -> Self {
                Self {
                    name: descriptor.name.clone(),
                }
            }
        }

        impl Agent for $type {
            fn name(&self) -> &str {
                &self.name
            }

            fn capabilities(&self) -> Vec<&'static str> {
                $caps.to_vec()
            }

            fn execute(&self, task: &str, context: &Value) -> Result<Value, EngineError> {
                Ok(serde_json::json!({
                    "agent": self.name,
                    "task": task,
                    "context_keys": context
                        .as_object()
                        .map(|o| o.keys().cloned().collect::<Vec<_>>())
                        .unwrap_or_default(),
                    "status": "done",
                }))
            }
        }
    };
}

stub_agent!(BuilderAgent, ["produce_artifact", "revise_artifact"]);
stub_agent!(ValidatorAgent, ["review_artifact", "report_findings"]);
stub_agent!(CoordinatorAgent, ["route_work", "track_progress"]);
stub_agent!(AdvisorAgent, ["provide_context", "recommend"]);

fn make_by_role(descriptor: &AgentDescriptor) -> Box<dyn Agent> {
    match descriptor.role {
        AgentRole::Builder => Box::new(BuilderAgent::new(descriptor)),
        AgentRole::Validator => Box::new(ValidatorAgent::new(descriptor)),
        AgentRole::Coordinator => Box::new(CoordinatorAgent::new(descriptor)),
        AgentRole::Advisor => Box::new(AdvisorAgent::new(descriptor)),
    }
}

/// Factory map covering the built-in roster. Each name maps to the stub
/// implementation for its role.
pub fn builtin_factories() -> HashMap<String, AgentFactory> {
    let names = [
        "forge",
        "rigger",
        "scribe",
        "warden",
        "prover",
        "surveyor",
        "anchor",
        "beacon",
        "oracle",
        "archivist",
    ];
    names
        .iter()
        .map(|name| (name.to_string(), make_by_role as AgentFactory))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentStatus;

    fn descriptor(name: &str, role: AgentRole) -> AgentDescriptor {
        AgentDescriptor {
            name: name.into(),
            role,
            status: AgentStatus::Inactive,
            scopes: vec!["both".into()],
            group: String::new(),
            description: String::new(),
            dependencies: vec![],
        }
    }

    #[test]
    fn test_factory_map_covers_builtin_roster() {
        let factories = builtin_factories();
        assert_eq!(factories.len(), 10);
        assert!(factories.contains_key("forge"));
        assert!(!factories.contains_key("unknown"));
    }

    #[test]
    fn test_stub_agent_executes() {
        let d = descriptor("warden", AgentRole::Validator);
        let agent = builtin_factories()["warden"](&d);
        assert_eq!(agent.name(), "warden");
        assert!(agent.capabilities().contains(&"review_artifact"));
        let out = agent
            .execute("review", &serde_json::json!({"target": "build"}))
            .unwrap();
        assert_eq!(out["status"], "done");
    }
}
