//! Policy normalization and parsing.
//!
//! Normalization runs in two phases:
//!
//! 1. **Structural**: the raw document is validated against the checked-in
//!    policy JSON Schema. Every violation is collected so operators see the
//!    full set in one pass.
//! 2. **Defaulting**: the validated document is deserialized into `Policy`,
//!    whose serde defaults fill every absent field recursively.
//!
//! Decoding failures (bad YAML, JSON, or TOML) surface as
//! `GuardError::PolicyParse`; shape failures surface as
//! `GuardError::PolicyValidation`.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use jsonschema::Validator;
use serde_json::Value;
use tracing::debug;

use runguard_contracts::{
    error::{GuardError, GuardResult},
    policy::Policy,
};

const POLICY_SCHEMA_SOURCE: &str = include_str!("../schema/policy.schema.json");

/// Compiled once per process; immutable afterwards.
static POLICY_SCHEMA: LazyLock<Result<Validator, String>> = LazyLock::new(|| {
    let document: Value = serde_json::from_str(POLICY_SCHEMA_SOURCE)
        .map_err(|e| format!("policy schema is not valid JSON: {e}"))?;
    jsonschema::validator_for(&document).map_err(|e| format!("policy schema failed to compile: {e}"))
});

/// The encodings a policy document may arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFormat {
    Yaml,
    Json,
    Toml,
}

impl PolicyFormat {
    /// Pick a format from a file extension. Unknown extensions are read as
    /// YAML, which also accepts JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

impl fmt::Display for PolicyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
            Self::Toml => "TOML",
        };
        f.write_str(name)
    }
}

/// Validate `value` and fill every default.
///
/// Returns `GuardError::PolicyValidation` when `value` is not an object or
/// when any field violates its declared type or range. Unknown keys are
/// ignored.
pub fn normalize(value: &Value) -> GuardResult<Policy> {
    if !value.is_object() {
        return Err(GuardError::validation("policy must be an object"));
    }

    let validator = POLICY_SCHEMA.as_ref().map_err(|reason| GuardError::Config {
        reason: reason.clone(),
    })?;

    let violations: Vec<String> = validator
        .iter_errors(value)
        .map(|error| {
            let path = error.instance_path.to_string();
            let path = if path.is_empty() { "/".to_string() } else { path };
            format!("{path}: {error}")
        })
        .collect();
    if !violations.is_empty() {
        return Err(GuardError::PolicyValidation { violations });
    }

    let policy: Policy = serde_json::from_value(value.clone())
        .map_err(|e| GuardError::validation(format!("policy does not match the expected shape: {e}")))?;

    debug!(
        name = %policy.metadata.name,
        version = %policy.metadata.version,
        agents = policy.allow_agents.len(),
        scopes = policy.write_scopes.len(),
        "policy normalized"
    );

    Ok(policy)
}

/// Decode `text` as YAML and normalize it. JSON documents are valid YAML.
pub fn parse(text: &str) -> GuardResult<Policy> {
    parse_with_format(text, PolicyFormat::Yaml)
}

/// Decode `text` in the given format and normalize it.
pub fn parse_with_format(text: &str, format: PolicyFormat) -> GuardResult<Policy> {
    let parse_error = |reason: String| GuardError::PolicyParse {
        format: format.to_string(),
        reason,
    };

    let value: Value = match format {
        PolicyFormat::Yaml => serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?,
        PolicyFormat::Json => serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?,
        PolicyFormat::Toml => toml::from_str(text).map_err(|e| parse_error(e.to_string()))?,
    };

    normalize(&value)
}

/// Read the policy file at `path`, choosing the decoder from its extension.
///
/// Returns `GuardError::Config` if the file cannot be read.
pub fn load_policy(path: &Path) -> GuardResult<Policy> {
    let contents = std::fs::read_to_string(path).map_err(|e| GuardError::Config {
        reason: format!("failed to read policy file '{}': {}", path.display(), e),
    })?;
    parse_with_format(&contents, PolicyFormat::from_path(path))
}
