//! Static per-mode configuration.
//!
//! Each mode carries an objective, entry requirements, exit criteria and a
//! few informational fields. Configs are either the built-in defaults or
//! loaded from a directory of `<mode>.json` files; a missing file falls
//! back to the built-in default for that mode, a malformed one is a load
//! error.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::mode::Mode;

/// What a mode demands before it can start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryRequirements {
    /// Predecessor mode whose output must be present in the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_input_from: Option<Mode>,
    /// Whether a direct prompt may stand in for the predecessor output.
    #[serde(default)]
    pub direct_prompt_allowed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeConfig {
    pub mode: Mode,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub objective: String,
    /// Informational roster of agent names this mode expects.
    #[serde(default)]
    pub agent_roster: Vec<String>,
    #[serde(default)]
    pub entry_requirements: EntryRequirements,
    /// Criterion name → required. Only `true` entries are enforced.
    #[serde(default)]
    pub exit_criteria: BTreeMap<String, bool>,
    /// Gate names this mode runs (informational; the sequencer owns order).
    #[serde(default)]
    pub gates: Vec<String>,
    #[serde(default)]
    pub workflows: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Named execution tempos, e.g. fast / balanced / careful for SHIP.
    #[serde(default)]
    pub speed_profiles: BTreeMap<String, BTreeMap<String, String>>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// All four mode configs, indexed by mode.
#[derive(Debug, Clone)]
pub struct ModeConfigSet {
    configs: BTreeMap<Mode, ModeConfig>,
}

impl ModeConfigSet {
    /// Built-in defaults mirroring the standard pipeline contract.
    pub fn builtin() -> Self {
        let mut configs = BTreeMap::new();

        configs.insert(
            Mode::Ideate,
            ModeConfig {
                mode: Mode::Ideate,
                version: default_version(),
                objective: "Transform a prompt into a structured vision document".into(),
                agent_roster: vec![],
                entry_requirements: EntryRequirements::default(),
                exit_criteria: BTreeMap::from([("vision_document".into(), true)]),
                gates: vec![],
                workflows: vec!["full".into(), "rapid".into()],
                outputs: vec!["vision_document".into()],
                speed_profiles: BTreeMap::new(),
            },
        );

        configs.insert(
            Mode::Plan,
            ModeConfig {
                mode: Mode::Plan,
                version: default_version(),
                objective: "Turn a vision document into a technical specification".into(),
                agent_roster: vec![],
                entry_requirements: EntryRequirements {
                    requires_input_from: Some(Mode::Ideate),
                    direct_prompt_allowed: true,
                },
                exit_criteria: BTreeMap::from([("technical_specification".into(), true)]),
                gates: vec![],
                workflows: vec!["full".into(), "rapid".into()],
                outputs: vec!["technical_specification".into(), "task_board".into()],
                speed_profiles: BTreeMap::new(),
            },
        );

        configs.insert(
            Mode::Ship,
            ModeConfig {
                mode: Mode::Ship,
                version: default_version(),
                objective: "Build, test, deploy and verify a working system".into(),
                agent_roster: vec![],
                entry_requirements: EntryRequirements {
                    requires_input_from: Some(Mode::Plan),
                    direct_prompt_allowed: true,
                },
                exit_criteria: BTreeMap::from([
                    ("code_complete".into(), true),
                    ("tests_passing".into(), true),
                    ("deployed_to_production".into(), true),
                    ("live_and_accessible".into(), true),
                    ("monitoring_active".into(), true),
                    ("documentation_published".into(), true),
                ]),
                gates: vec![
                    "completeness".into(),
                    "tests".into(),
                    "deployment".into(),
                    "health".into(),
                ],
                workflows: vec!["full".into(), "rapid".into(), "express".into()],
                outputs: vec!["production_url".into(), "health_check_url".into()],
                speed_profiles: BTreeMap::from([
                    (
                        "fast".into(),
                        BTreeMap::from([
                            ("review_depth".into(), "light".into()),
                            ("test_scope".into(), "smoke".into()),
                        ]),
                    ),
                    (
                        "balanced".into(),
                        BTreeMap::from([
                            ("review_depth".into(), "standard".into()),
                            ("test_scope".into(), "full".into()),
                        ]),
                    ),
                    (
                        "careful".into(),
                        BTreeMap::from([
                            ("review_depth".into(), "deep".into()),
                            ("test_scope".into(), "full_plus_load".into()),
                        ]),
                    ),
                ]),
            },
        );

        configs.insert(
            Mode::Validate,
            ModeConfig {
                mode: Mode::Validate,
                version: default_version(),
                objective: "Independently assess a shipped build".into(),
                agent_roster: vec![],
                entry_requirements: EntryRequirements {
                    requires_input_from: Some(Mode::Ship),
                    direct_prompt_allowed: false,
                },
                // A completed validation that FOUND problems is still a
                // completed validation; only a missing report blocks exit.
                exit_criteria: BTreeMap::from([("results".into(), true)]),
                gates: vec![],
                workflows: vec!["full".into()],
                outputs: vec!["results".into(), "recommendations".into()],
                speed_profiles: BTreeMap::new(),
            },
        );

        Self { configs }
    }

    /// Load configs from a directory of `ideate.json` / `plan.json` /
    /// `ship.json` / `validate.json` files. Missing files use the built-in
    /// default for that mode; unreadable or malformed files are errors.
    pub fn load_dir(dir: &Path) -> Result<Self, EngineError> {
        let mut set = Self::builtin();
        for mode in Mode::all() {
            let path = dir.join(format!("{}.json", mode.as_str().to_lowercase()));
            if !path.exists() {
                tracing::warn!(mode = %mode, path = %path.display(), "config file missing, using built-in default");
                continue;
            }
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| EngineError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
            let config: ModeConfig = serde_json::from_str(&raw)
                .map_err(|e| EngineError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
            if config.mode != mode {
                return Err(EngineError::ConfigLoad(format!(
                    "{}: declares mode {} but file is for {}",
                    path.display(),
                    config.mode,
                    mode
                )));
            }
            set.configs.insert(mode, config);
        }
        Ok(set)
    }

    pub fn get(&self, mode: Mode) -> &ModeConfig {
        // All four modes are always present; builtin() seeds every key.
        &self.configs[&mode]
    }
}

impl Default for ModeConfigSet {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_entry_chain() {
        let set = ModeConfigSet::builtin();
        assert!(set.get(Mode::Ideate).entry_requirements.requires_input_from.is_none());
        assert_eq!(
            set.get(Mode::Plan).entry_requirements.requires_input_from,
            Some(Mode::Ideate)
        );
        assert_eq!(
            set.get(Mode::Ship).entry_requirements.requires_input_from,
            Some(Mode::Plan)
        );
        assert_eq!(
            set.get(Mode::Validate).entry_requirements.requires_input_from,
            Some(Mode::Ship)
        );
        assert!(!set.get(Mode::Validate).entry_requirements.direct_prompt_allowed);
    }

    #[test]
    fn test_ship_has_six_exit_criteria() {
        let set = ModeConfigSet::builtin();
        assert_eq!(set.get(Mode::Ship).exit_criteria.len(), 6);
    }

    #[test]
    fn test_load_dir_overrides_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("ideate.json")).unwrap();
        write!(
            f,
            r#"{{"mode": "IDEATE", "objective": "custom", "exit_criteria": {{"vision_document": true}}}}"#
        )
        .unwrap();
        let set = ModeConfigSet::load_dir(dir.path()).unwrap();
        assert_eq!(set.get(Mode::Ideate).objective, "custom");
        // Modes without files keep their defaults.
        assert_eq!(set.get(Mode::Ship).exit_criteria.len(), 6);
    }

    #[test]
    fn test_load_dir_rejects_mismatched_mode() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plan.json"), r#"{"mode": "SHIP"}"#).unwrap();
        let err = ModeConfigSet::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::ConfigLoad(_)));
    }
}
