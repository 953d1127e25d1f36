//! Convenience types shared by the bridge operations.

use serde::{Deserialize, Serialize};

use crate::schema::Diagnostic;

/// Signature key of the secret sentinel object.
pub const SECRET_SIG_KEY: &str = "4dabf18193072939515e22adb298388d";

/// Signature value of the secret sentinel object.
pub const SECRET_SIG_VALUE: &str = "1b47061264138c4ac30d75fd1eb44270";

/// Key holding the wrapped value inside the secret sentinel object.
pub const SECRET_VALUE_KEY: &str = "value";

/// The string that stands for a value not yet known during planning.
pub const UNKNOWN_VALUE: &str = "04da6b54-80e4-46f7-96ec-b56ff0331ba9";

/// Prefix of bridge-reserved object keys that are never diffed.
pub const RESERVED_KEY_PREFIX: &str = "__";

/// Whether an object key is reserved for bridge metadata.
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with(RESERVED_KEY_PREFIX)
}

/// The overall action a diff implies for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceAction {
    /// Nothing changes.
    NoChange,
    /// The resource is created.
    Create,
    /// The resource is updated in place.
    Update,
    /// The resource is destroyed and recreated.
    Replace,
    /// The resource is destroyed.
    Delete,
}

impl ResourceAction {
    /// The preview marker for this action.
    pub fn marker(self) -> &'static str {
        match self {
            ResourceAction::NoChange => " ",
            ResourceAction::Create => "+",
            ResourceAction::Update => "~",
            ResourceAction::Replace => "+-",
            ResourceAction::Delete => "-",
        }
    }

    /// The human-readable name of this action.
    pub fn label(self) -> &'static str {
        match self {
            ResourceAction::NoChange => "no change",
            ResourceAction::Create => "create",
            ResourceAction::Update => "update",
            ResourceAction::Replace => "replace",
            ResourceAction::Delete => "delete",
        }
    }
}

/// The result of checking resource inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// The inputs to use, with invalid provider-computed values dropped.
    pub inputs: serde_json::Value,
    /// Failures the user must fix.
    pub failures: Vec<Diagnostic>,
}

impl CheckResult {
    /// Whether the inputs passed every check.
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The result of refreshing a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResult {
    /// The refreshed, persisted state.
    pub state: serde_json::Value,
    /// Inputs reconstructed from the refreshed state.
    pub inputs: serde_json::Value,
}
