//! The action descriptor the compliance checks inspect.
//!
//! Actions arrive as open JSON objects; checks read them through typed
//! accessors. Some governance flags default to true when absent so that an
//! action that says nothing about them is treated as well-behaved.

use serde_json::Value;

/// Flags that default to true when the action omits them.
const DEFAULT_TRUE_FLAGS: &[&str] = &[
    "requires_human_approval",
    "human_can_override",
    "logging_enabled",
    "is_complete",
    "has_api",
];

#[derive(Debug, Clone)]
pub struct ActionDescriptor(Value);

impl ActionDescriptor {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// The whole action serialized and lowercased, for phrase scanning.
    pub fn text(&self) -> String {
        self.0.to_string().to_lowercase()
    }

    pub fn description(&self) -> String {
        self.0
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase()
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Boolean field, false when absent (unless listed as default-true).
    pub fn flag(&self, name: &str) -> bool {
        self.flag_or(name, DEFAULT_TRUE_FLAGS.contains(&name))
    }

    pub fn flag_or(&self, name: &str, default: bool) -> bool {
        match self.0.get(name) {
            Some(v) => crate::mode::value_is_truthy(v),
            None => default,
        }
    }

    pub fn contains_any(&self, phrases: &[&str]) -> bool {
        let text = self.text();
        phrases.iter().any(|p| text.contains(p))
    }
}

impl From<Value> for ActionDescriptor {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}
