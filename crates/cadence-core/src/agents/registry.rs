//! Agent registry: the roster of known agents and their persisted status.
//!
//! The registry is a JSON file of the form `{"agents": {name: {...}}}`.
//! When constructed from a file, status changes are written back to the
//! same file; the built-in registry keeps status in memory only.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::agents::{AgentDescriptor, AgentRole, AgentStatus};
use crate::error::EngineError;

#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    agents: BTreeMap<String, AgentDescriptor>,
}

#[derive(Debug)]
pub struct AgentRegistry {
    path: Option<PathBuf>,
    agents: BTreeMap<String, AgentDescriptor>,
}

impl AgentRegistry {
    /// The built-in ten-agent roster: the foundry builders, the watch
    /// validators, the council coordinators and advisors.
    pub fn builtin() -> Self {
        let mut agents = BTreeMap::new();
        let mut add = |name: &str, role: AgentRole, scopes: &str, group: &str, desc: &str| {
            agents.insert(
                name.to_string(),
                AgentDescriptor {
                    name: name.to_string(),
                    role,
                    status: AgentStatus::Inactive,
                    scopes: scopes.split(',').map(|s| s.trim().to_string()).collect(),
                    group: group.to_string(),
                    description: desc.to_string(),
                    dependencies: Vec::new(),
                },
            );
        };

        add("forge", AgentRole::Builder, "build", "foundry", "Writes application code");
        add("rigger", AgentRole::Builder, "build", "foundry", "Builds deployment pipelines");
        add("scribe", AgentRole::Builder, "both", "foundry", "Writes specifications and documentation");
        add("warden", AgentRole::Validator, "validate", "watch", "Reviews code for defects");
        add("prover", AgentRole::Validator, "validate", "watch", "Runs and assesses test suites");
        add("surveyor", AgentRole::Validator, "validate", "watch", "Audits deployed systems");
        add("anchor", AgentRole::Coordinator, "both", "council", "Routes work across the roster");
        add("beacon", AgentRole::Coordinator, "build", "council", "Tracks delivery milestones");
        add("oracle", AgentRole::Advisor, "both", "council", "Supplies domain context");
        add("archivist", AgentRole::Advisor, "both", "council", "Surfaces prior decisions");

        Self { path: None, agents }
    }

    /// Load a registry file. Read or parse failure is fatal.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::RegistryLoad(format!("{}: {}", path.display(), e)))?;
        let file: RegistryFile = serde_json::from_str(&raw)
            .map_err(|e| EngineError::RegistryLoad(format!("{}: {}", path.display(), e)))?;
        let mut agents = file.agents;
        // The map key is authoritative for the name.
        for (name, descriptor) in agents.iter_mut() {
            descriptor.name = name.clone();
        }
        tracing::info!(path = %path.display(), count = agents.len(), "agent registry loaded");
        Ok(Self {
            path: Some(path.to_path_buf()),
            agents,
        })
    }

    pub fn get(&self, name: &str) -> Option<&AgentDescriptor> {
        self.agents.get(name)
    }

    pub fn all(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.agents.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    pub fn by_role(&self, role: AgentRole) -> Vec<&AgentDescriptor> {
        self.agents.values().filter(|a| a.role == role).collect()
    }

    pub fn by_group(&self, group: &str) -> Vec<&AgentDescriptor> {
        self.agents.values().filter(|a| a.group == group).collect()
    }

    /// Update an agent's status, persisting the registry when file-backed.
    /// A persist failure is logged, not propagated; status is advisory.
    pub fn set_status(&mut self, name: &str, status: AgentStatus) {
        if let Some(agent) = self.agents.get_mut(name) {
            agent.status = status;
        }
        if let Some(path) = &self.path {
            let file = RegistryFile {
                agents: self.agents.clone(),
            };
            match serde_json::to_string_pretty(&file) {
                Ok(json) => {
                    if let Err(e) = std::fs::write(path, json) {
                        tracing::warn!(path = %path.display(), error = %e, "failed to persist registry status");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "failed to serialize registry"),
            }
        }
    }

    pub fn summary(&self) -> serde_json::Value {
        let active = self
            .agents
            .values()
            .filter(|a| a.status == AgentStatus::Active)
            .count();
        let mut by_role = BTreeMap::new();
        let mut by_group = BTreeMap::new();
        for agent in self.agents.values() {
            *by_role.entry(agent.role.as_str()).or_insert(0usize) += 1;
            if !agent.group.is_empty() {
                *by_group.entry(agent.group.as_str()).or_insert(0usize) += 1;
            }
        }
        serde_json::json!({
            "total": self.agents.len(),
            "active": active,
            "by_role": by_role,
            "by_group": by_group,
            "agents": self.agents.values().collect::<Vec<_>>(),
        })
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
