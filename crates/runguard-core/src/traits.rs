//! Trait seams for the runguard decision pipeline.
//!
//! - `CredentialVerifier`: trusted checker (decides whether the run's
//!   evidence is well-formed)
//! - `PolicyEvaluator`: trusted gate (decides allow/block from flat facts)
//!
//! Both are pure: the same input always yields the same output, with no I/O.
//! The `Gate` wires them together.

use runguard_contracts::{
    assessment::{AssessmentInput, AssessmentResult},
    credential::Credential,
    report::CredentialReport,
};

/// The policy evaluator: turns a fact bundle into an allow/block decision.
///
/// Implementations hold an already-normalized policy. A blocking outcome is
/// reported through `AssessmentResult::reasons`, never as an error.
pub trait PolicyEvaluator: Send + Sync {
    fn assess(&self, input: &AssessmentInput) -> AssessmentResult;
}

/// The provenance verifier: validates a credential's structure and hygiene.
///
/// Every problem becomes a reason in the returned report; an invalid
/// credential is a business outcome, not a failure of the verifier.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, credential: &Credential) -> CredentialReport;
}
