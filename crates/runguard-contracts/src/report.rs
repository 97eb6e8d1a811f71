//! Credential verification report.

use serde::{Deserialize, Serialize};

/// The result of verifying a credential.
///
/// An invalid credential is an expected outcome, not an error: every problem
/// is recorded as a reason string and `valid` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialReport {
    /// True only when `reasons` is empty.
    pub valid: bool,
    pub reasons: Vec<String>,
    /// Pipe-delimited digest: run id, agents, tokens, artifact count.
    pub summary: String,
}
