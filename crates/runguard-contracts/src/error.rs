//! Error types for the runguard decision engine.
//!
//! Only the boundaries that read operator-supplied documents can fail: policy
//! parsing and normalization, credential decoding, and configuration loading.
//! The evaluator, verifier, and compiler report problems through their result
//! values instead.

use thiserror::Error;

/// The unified error type for the runguard crates.
#[derive(Debug, Error)]
pub enum GuardError {
    /// A well-formed policy document violated a field constraint.
    ///
    /// Carries one message per violated field so operators can fix them all
    /// in one pass.
    #[error("policy validation failed: {}", violations.join("; "))]
    PolicyValidation { violations: Vec<String> },

    /// The policy document could not be decoded at all.
    #[error("failed to parse policy {format}: {reason}")]
    PolicyParse { format: String, reason: String },

    /// A credential document is not valid JSON or does not have the
    /// credential shape.
    #[error("failed to parse credential: {reason}")]
    CredentialParse { reason: String },

    /// A required file or setting could not be read.
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl GuardError {
    /// Shorthand for a validation error with a single violation.
    pub fn validation(violation: impl Into<String>) -> Self {
        Self::PolicyValidation {
            violations: vec![violation.into()],
        }
    }
}

/// Convenience alias used throughout the runguard crates.
pub type GuardResult<T> = Result<T, GuardError>;
