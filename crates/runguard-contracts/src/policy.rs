//! The normalized policy document.
//!
//! Every field carries a serde default so a sparse document deserializes into
//! a complete `Policy`. Field-level constraints (non-negative integers,
//! string lists) are checked by the policy schema in `runguard-policy` before
//! these types are populated.

use serde::{de, Deserialize, Deserializer, Serialize};

/// A fully-defaulted guard policy.
///
/// Empty collections and zero limits mean "no restriction" for the check they
/// configure:
///
/// - `allow_agents = []` permits every agent.
/// - `max_tokens_per_run = 0` is unlimited.
/// - `write_scopes = []` disables scope and protected-path checks.
/// - `approvals.destructive_ops.required = 0` disables the approval gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub metadata: PolicyMetadata,

    /// Agent identifiers permitted to run.
    #[serde(default)]
    pub allow_agents: Vec<String>,

    /// Token ceiling for a single run.
    #[serde(default, deserialize_with = "whole_number")]
    pub max_tokens_per_run: u64,

    /// Ordered write scopes. Scope order determines annotation and reason
    /// order for protected paths.
    #[serde(default)]
    pub write_scopes: Vec<WriteScope>,

    #[serde(default)]
    pub approvals: Approvals,

    /// Whether a valid provenance credential is required for `allow`.
    #[serde(default = "default_true")]
    pub provenance_required: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            metadata: PolicyMetadata::default(),
            allow_agents: Vec::new(),
            max_tokens_per_run: 0,
            write_scopes: Vec::new(),
            approvals: Approvals::default(),
            provenance_required: true,
        }
    }
}

impl Policy {
    /// The number of approvals a protected-path change needs.
    pub fn required_approvals(&self) -> u64 {
        self.approvals.destructive_ops.required
    }
}

/// Descriptive metadata; never consulted by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyMetadata {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for PolicyMetadata {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
            description: None,
        }
    }
}

/// A region of the file tree agents may write to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteScope {
    /// Glob pattern for files inside the scope.
    pub path: String,

    /// Glob patterns inside the scope whose modification needs approval.
    #[serde(default)]
    pub protected: Vec<String>,
}

impl WriteScope {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            protected: Vec::new(),
        }
    }

    /// Builder-style helper to attach a protected pattern.
    pub fn with_protected(mut self, pattern: impl Into<String>) -> Self {
        self.protected.push(pattern.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approvals {
    #[serde(default)]
    pub destructive_ops: ApprovalRequirement,
}

/// How many approvals a destructive (protected-path) change needs, and from
/// whom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequirement {
    #[serde(default, deserialize_with = "whole_number")]
    pub required: u64,

    /// Informational list of approver identities. The count of approvals is
    /// supplied by the caller; this list is not cross-checked.
    #[serde(default)]
    pub approvers: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_name() -> String {
    "default".to_string()
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// A non-negative integer that may be written with a zero fraction (`5.0`).
/// YAML and JSON producers often emit counts that way.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(n) = number.as_u64() {
        return Ok(n);
    }
    match number.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(de::Error::custom(format!(
            "expected a non-negative whole number, got {number}"
        ))),
    }
}
