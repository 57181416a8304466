//! Agent metadata, registry, capability catalog and activation.

pub mod activation;
pub mod catalog;
pub mod registry;

pub use activation::ActivationService;
pub use catalog::{Agent, AgentFactory};
pub use registry::AgentRegistry;

use serde::{Deserialize, Serialize};

/// What an agent is for, coarsely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Produces artifacts: code, specs, docs.
    Builder,
    /// Judges artifacts: tests, reviews, audits.
    Validator,
    /// Routes work between agents; never executes or judges it.
    Coordinator,
    /// Supplies context and recommendations; never enforces.
    Advisor,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Builder => "builder",
            AgentRole::Validator => "validator",
            AgentRole::Coordinator => "coordinator",
            AgentRole::Advisor => "advisor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Inactive,
    Loading,
    Error,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Inactive => "inactive",
            AgentStatus::Loading => "loading",
            AgentStatus::Error => "error",
        }
    }
}

/// Accepts either `"build,validate"` or `["build", "validate"]` in the
/// registry file. Older registries use the comma form.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScopesField {
    List(Vec<String>),
    Joined(String),
}

fn deserialize_scopes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match ScopesField::deserialize(deserializer)? {
        ScopesField::List(list) => Ok(list),
        ScopesField::Joined(s) => Ok(s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect()),
    }
}

/// Static description of an agent, as stored in the registry file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub name: String,
    pub role: AgentRole,
    #[serde(default = "default_status")]
    pub status: AgentStatus,
    /// Mode scopes: `build`, `validate`, or `both`.
    #[serde(deserialize_with = "deserialize_scopes")]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub description: String,
    /// Names of agents this one expects to be present alongside it.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

fn default_status() -> AgentStatus {
    AgentStatus::Inactive
}

impl AgentDescriptor {
    /// Whether this agent is in scope for build-side work (PLAN, SHIP).
    pub fn scoped_build(&self) -> bool {
        self.scopes.iter().any(|s| s == "build" || s == "both")
    }

    /// Whether this agent is in scope for validation work (VALIDATE).
    pub fn scoped_validate(&self) -> bool {
        self.scopes.iter().any(|s| s == "validate" || s == "both")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_accepts_both_forms() {
        let from_list: AgentDescriptor = serde_json::from_str(
            r#"{"name": "a", "role": "builder", "scopes": ["build", "validate"]}"#,
        )
        .unwrap();
        let from_joined: AgentDescriptor = serde_json::from_str(
            r#"{"name": "a", "role": "builder", "scopes": "build, validate"}"#,
        )
        .unwrap();
        assert_eq!(from_list.scopes, from_joined.scopes);
        assert!(from_list.scoped_build());
        assert!(from_list.scoped_validate());
    }

    #[test]
    fn test_both_scope_covers_build_and_validate() {
        let d: AgentDescriptor =
            serde_json::from_str(r#"{"name": "a", "role": "advisor", "scopes": "both"}"#).unwrap();
        assert!(d.scoped_build());
        assert!(d.scoped_validate());
        assert_eq!(d.status, AgentStatus::Inactive);
    }
}
