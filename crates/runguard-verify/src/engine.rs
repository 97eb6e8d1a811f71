//! Credential verifier.
//!
//! `SchemaVerifier` implements the `CredentialVerifier` trait from
//! runguard-core. Verification runs in two phases:
//!
//! 1. **Structural**: the credential document is validated against the
//!    checked-in credential JSON Schema.
//! 2. **Hygiene**: signatures must be present and PEM encoded, and every
//!    artifact must carry a 64-character hex digest.
//!
//! All problems are collected before returning. Reasons appear in this order:
//! schema violations, missing signatures, artifact digests, then one reason
//! per non-PEM signature.

use std::sync::LazyLock;

use jsonschema::Validator;
use serde_json::Value;
use tracing::{debug, warn};

use runguard_contracts::{credential::Credential, report::CredentialReport};
use runguard_core::traits::CredentialVerifier;

const CREDENTIAL_SCHEMA_SOURCE: &str = include_str!("../schema/credential.schema.json");

static CREDENTIAL_SCHEMA: LazyLock<Result<Validator, String>> = LazyLock::new(|| {
    let document: Value = serde_json::from_str(CREDENTIAL_SCHEMA_SOURCE)
        .map_err(|e| format!("credential schema is not valid JSON: {e}"))?;
    jsonschema::validator_for(&document)
        .map_err(|e| format!("credential schema failed to compile: {e}"))
});

const PEM_PREFIX: &str = "-----BEGIN";

/// The runguard credential verifier. Stateless; the compiled schema is
/// shared process-wide.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaVerifier;

impl SchemaVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Verify a raw JSON document that may not deserialize as a credential.
    ///
    /// Schema violations are reported as usual. When the document cannot be
    /// read as a `Credential` the hygiene phase is skipped and the summary is
    /// assembled from whatever fields are present.
    pub fn verify_document(&self, document: &Value) -> CredentialReport {
        let mut reasons = schema_reasons(document);

        let summary = match serde_json::from_value::<Credential>(document.clone()) {
            Ok(credential) => {
                reasons.extend(hygiene_reasons(&credential));
                summary_line(&credential)
            }
            Err(e) => {
                // The schema normally explains why; only speak up if it didn't.
                if reasons.is_empty() {
                    reasons.push(format!("Schema: / {e}"));
                }
                lenient_summary_line(document)
            }
        };

        finish(reasons, summary)
    }
}

impl CredentialVerifier for SchemaVerifier {
    fn verify(&self, credential: &Credential) -> CredentialReport {
        let mut reasons = match serde_json::to_value(credential) {
            Ok(document) => schema_reasons(&document),
            Err(e) => vec![format!("Schema: / credential is not representable as JSON: {e}")],
        };
        reasons.extend(hygiene_reasons(credential));

        finish(reasons, summary_line(credential))
    }
}

/// Verify `credential` with the default verifier.
pub fn verify(credential: &Credential) -> CredentialReport {
    SchemaVerifier.verify(credential)
}

/// Verify a raw credential document with the default verifier.
pub fn verify_document(document: &Value) -> CredentialReport {
    SchemaVerifier.verify_document(document)
}

/// `"Run: <id> | Agents: <a, b> | Tokens: <n> | Artifacts: <n>"`.
pub fn summary_line(credential: &Credential) -> String {
    let agents = credential.agent_ids();
    format_summary(
        &credential.run_id,
        &agents,
        credential.budgets.tokens,
        credential.artifacts.len(),
    )
}

fn lenient_summary_line(document: &Value) -> String {
    let run_id = document
        .get("run_id")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let agents: Vec<&str> = document
        .get("agents")
        .and_then(Value::as_array)
        .map(|agents| {
            agents
                .iter()
                .filter_map(|a| a.get("id").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    let tokens = document
        .pointer("/budgets/tokens")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let artifacts = document
        .get("artifacts")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    format_summary(run_id, &agents, tokens, artifacts)
}

fn format_summary(run_id: &str, agents: &[&str], tokens: u64, artifacts: usize) -> String {
    let agents = if agents.is_empty() {
        "none".to_string()
    } else {
        agents.join(", ")
    };
    format!("Run: {run_id} | Agents: {agents} | Tokens: {tokens} | Artifacts: {artifacts}")
}

fn schema_reasons(document: &Value) -> Vec<String> {
    let validator = match CREDENTIAL_SCHEMA.as_ref() {
        Ok(validator) => validator,
        Err(reason) => {
            warn!(%reason, "credential schema unavailable");
            return vec![format!("Schema: / {reason}")];
        }
    };

    validator
        .iter_errors(document)
        .map(|error| {
            let path = error.instance_path.to_string();
            let path = if path.is_empty() { "/".to_string() } else { path };
            let reason = format!("Schema: {path} {error}");
            warn!(%reason, "credential schema violation");
            reason
        })
        .collect()
}

fn hygiene_reasons(credential: &Credential) -> Vec<String> {
    let mut reasons = Vec::new();

    if credential.signatures.is_empty() {
        warn!(run_id = %credential.run_id, "credential has no signatures");
        reasons.push("No signatures present on credential.".to_string());
    }

    let missing: Vec<&str> = credential
        .artifacts
        .iter()
        .filter(|a| !is_sha256_hex(&a.sha256))
        .map(|a| a.name.as_str())
        .collect();
    if !missing.is_empty() {
        warn!(run_id = %credential.run_id, artifacts = ?missing, "artifacts lack sha256 digests");
        reasons.push(format!("Artifacts missing sha256: {}", missing.join(", ")));
    }

    for signature in &credential.signatures {
        if !signature.signature.starts_with(PEM_PREFIX) {
            warn!(issuer = %signature.issuer, "signature not PEM encoded");
            reasons.push(format!(
                "Signature from {} is not PEM encoded.",
                signature.issuer
            ));
        }
    }

    reasons
}

/// Case-insensitive: upper-case digests are accepted.
fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

fn finish(reasons: Vec<String>, summary: String) -> CredentialReport {
    debug!(valid = reasons.is_empty(), reasons = reasons.len(), %summary, "credential verified");
    CredentialReport {
        valid: reasons.is_empty(),
        reasons,
        summary,
    }
}
