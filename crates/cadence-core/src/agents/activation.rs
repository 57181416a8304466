//! Agent activation: which agents run in which mode, and their lifecycle.
//!
//! The mode rule table is fixed: IDEATE uses the entire roster, PLAN and
//! SHIP use build-scoped agents, VALIDATE uses validate-scoped agents.
//! Activation failures are isolated per agent; a missing factory marks
//! that one agent errored and the rest of the roster still activates.

use std::collections::HashMap;

use crate::agents::catalog::{builtin_factories, Agent, AgentFactory};
use crate::agents::{AgentRegistry, AgentStatus};
use crate::mode::Mode;

pub struct ActivationService {
    registry: AgentRegistry,
    factories: HashMap<String, AgentFactory>,
    active: HashMap<String, Box<dyn Agent>>,
    activation_errors: Vec<String>,
}

impl ActivationService {
    pub fn new(registry: AgentRegistry) -> Self {
        Self {
            registry,
            factories: builtin_factories(),
            active: HashMap::new(),
            activation_errors: Vec::new(),
        }
    }

    /// Replace or extend the factory map. Host-provided factories win on
    /// name collisions.
    pub fn with_factories(mut self, factories: HashMap<String, AgentFactory>) -> Self {
        self.factories.extend(factories);
        self
    }

    /// Agent names in scope for `mode`, per the fixed rule table.
    pub fn agents_for_mode(&self, mode: Mode) -> Vec<String> {
        self.registry
            .all()
            .filter(|a| match mode {
                Mode::Ideate => true,
                Mode::Plan | Mode::Ship => a.scoped_build(),
                Mode::Validate => a.scoped_validate(),
            })
            .map(|a| a.name.clone())
            .collect()
    }

    /// Activate every agent in scope for `mode`. Returns the names that
    /// came up. Failures are recorded, logged and skipped.
    pub fn activate_all(&mut self, mode: Mode) -> Vec<String> {
        self.activation_errors.clear();
        let names = self.agents_for_mode(mode);
        let mut activated = Vec::with_capacity(names.len());

        for name in names {
            if self.active.contains_key(&name) {
                activated.push(name);
                continue;
            }
            // Clone keeps the descriptor readable while the registry is
            // mutated for status writes below.
            let descriptor = match self.registry.get(&name) {
                Some(d) => d.clone(),
                None => continue,
            };
            match self.factories.get(&name) {
                Some(factory) => {
                    self.registry.set_status(&name, AgentStatus::Loading);
                    let agent = factory(&descriptor);
                    self.active.insert(name.clone(), agent);
                    self.registry.set_status(&name, AgentStatus::Active);
                    activated.push(name);
                }
                None => {
                    let reason = format!("no factory registered for '{}'", name);
                    tracing::warn!(agent = %name, mode = %mode, "activation failed: {}", reason);
                    self.registry.set_status(&name, AgentStatus::Error);
                    self.activation_errors.push(reason);
                }
            }
        }

        tracing::info!(mode = %mode, count = activated.len(), "agents activated");
        activated
    }

    /// Deactivate one agent. Never fails; unknown names are a no-op.
    pub fn deactivate(&mut self, name: &str) {
        if self.active.remove(name).is_some() {
            self.registry.set_status(name, AgentStatus::Inactive);
        }
    }

    /// Deactivate every active agent. Never fails.
    pub fn deactivate_all(&mut self) {
        let names: Vec<String> = self.active.keys().cloned().collect();
        for name in names {
            self.deactivate(&name);
        }
    }

    /// Check that every dependency declared by `name` exists in the
    /// registry. Callers run this before activation; an unknown agent
    /// name fails with itself as the missing entry.
    pub fn validate_dependencies(&self, name: &str) -> (bool, Vec<String>) {
        let Some(descriptor) = self.registry.get(name) else {
            return (false, vec![name.to_string()]);
        };
        let missing: Vec<String> = descriptor
            .dependencies
            .iter()
            .filter(|dep| self.registry.get(dep.as_str()).is_none())
            .cloned()
            .collect();
        (missing.is_empty(), missing)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn active_agents(&self) -> &HashMap<String, Box<dyn Agent>> {
        &self.active
    }

    pub fn activation_errors(&self) -> &[String] {
        &self.activation_errors
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn agent_info(&self, name: &str) -> Option<serde_json::Value> {
        let descriptor = self.registry.get(name)?;
        Some(serde_json::json!({
            "name": descriptor.name,
            "role": descriptor.role,
            "status": descriptor.status,
            "scopes": descriptor.scopes,
            "group": descriptor.group,
            "description": descriptor.description,
            "active": self.active.contains_key(name),
        }))
    }

    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "registry": self.registry.summary(),
            "active": self.active.keys().collect::<Vec<_>>(),
            "activation_errors": self.activation_errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentDescriptor;
    use std::path::Path;

    fn registry_with(path: &Path, json: &str) -> AgentRegistry {
        std::fs::write(path, json).unwrap();
        AgentRegistry::load(path).unwrap()
    }

    #[test]
    fn test_mode_rule_table() {
        // Three agents covering each scope shape.
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with(
            &dir.path().join("r.json"),
            r#"{"agents": {
                "a": {"name": "a", "role": "builder", "scopes": "build"},
                "b": {"name": "b", "role": "validator", "scopes": "validate"},
                "c": {"name": "c", "role": "advisor", "scopes": "both"}
            }}"#,
        );
        let service = ActivationService::new(registry);

        let mut ideate = service.agents_for_mode(Mode::Ideate);
        ideate.sort();
        assert_eq!(ideate, vec!["a", "b", "c"]);

        let mut plan = service.agents_for_mode(Mode::Plan);
        plan.sort();
        assert_eq!(plan, vec!["a", "c"]);
        assert_eq!(service.agents_for_mode(Mode::Ship), plan);

        let mut validate = service.agents_for_mode(Mode::Validate);
        validate.sort();
        assert_eq!(validate, vec!["b", "c"]);
    }

    #[test]
    fn test_activation_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with(
            &dir.path().join("r.json"),
            r#"{"agents": {
                "forge": {"name": "forge", "role": "builder", "scopes": "build"},
                "ghost": {"name": "ghost", "role": "builder", "scopes": "build"}
            }}"#,
        );
        let mut service = ActivationService::new(registry);
        let activated = service.activate_all(Mode::Ship);
        assert_eq!(activated, vec!["forge"]);
        assert_eq!(service.activation_errors().len(), 1);
        assert_eq!(
            service.registry().get("ghost").unwrap().status,
            AgentStatus::Error
        );
        assert_eq!(
            service.registry().get("forge").unwrap().status,
            AgentStatus::Active
        );
    }

    #[test]
    fn test_deactivate_all_resets_status() {
        let mut service = ActivationService::new(AgentRegistry::builtin());
        service.activate_all(Mode::Ideate);
        assert_eq!(service.active_count(), 10);
        service.deactivate_all();
        assert_eq!(service.active_count(), 0);
        assert!(service
            .registry()
            .all()
            .all(|a| a.status == AgentStatus::Inactive));
    }

    #[test]
    fn test_dependency_validation_runs_before_activation() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with(
            &dir.path().join("r.json"),
            r#"{"agents": {
                "forge": {"name": "forge", "role": "builder", "scopes": "build",
                          "dependencies": ["anchor"]},
                "rigger": {"name": "rigger", "role": "builder", "scopes": "build",
                           "dependencies": ["forge"]}
            }}"#,
        );
        let service = ActivationService::new(registry);
        // Nothing activated yet; registry membership is what counts.
        assert_eq!(service.active_count(), 0);

        let (ok, missing) = service.validate_dependencies("forge");
        assert!(!ok);
        assert_eq!(missing, vec!["anchor"]);

        let (ok, missing) = service.validate_dependencies("rigger");
        assert!(ok);
        assert!(missing.is_empty());

        let (ok, missing) = service.validate_dependencies("phantom");
        assert!(!ok);
        assert_eq!(missing, vec!["phantom"]);
    }

    #[test]
    fn test_host_factory_extension() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_with(
            &dir.path().join("r.json"),
            r#"{"agents": {"custom": {"name": "custom", "role": "advisor", "scopes": "both"}}}"#,
        );
        fn make(d: &AgentDescriptor) -> Box<dyn Agent> {
            Box::new(crate::agents::catalog::AdvisorAgent::new(d))
        }
        let mut service = ActivationService::new(registry)
            .with_factories(HashMap::from([("custom".to_string(), make as AgentFactory)]));
        let activated = service.activate_all(Mode::Validate);
        assert_eq!(activated, vec!["custom"]);
    }
}
