//! The gate: verify the credential, assemble facts, assess.
//!
//! The gate enforces the decision order for a single run:
//!
//!   Credential → Verify → Fact bundle → Assess → Summary
//!
//! Provenance is only considered valid when a credential was supplied AND the
//! verifier accepted it. A missing credential is not an error; it simply
//! yields `provenance.valid = false`, which blocks when the policy requires
//! provenance.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use runguard_contracts::{
    assessment::{
        AgentFact, ApprovalCount, ApprovalFacts, AssessmentInput, AssessmentResult, Changes,
        ProvenanceFact, Usage,
    },
    credential::Credential,
    report::CredentialReport,
};

use crate::traits::{CredentialVerifier, PolicyEvaluator};

/// Facts about the run that come from the code-hosting platform rather than
/// from the credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFacts {
    /// Paths changed by the pull request, as reported by the platform.
    pub changed_files: Vec<String>,
    /// Number of approving reviews counted toward destructive operations.
    pub approvals: u64,
}

/// Everything the gate decided about one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateOutcome {
    pub assessment: AssessmentResult,
    /// Absent when no credential was supplied.
    pub credential_report: Option<CredentialReport>,
    /// One-line human summary of the decision and provenance state.
    pub summary: String,
}

impl GateOutcome {
    pub fn allow(&self) -> bool {
        self.assessment.allow
    }
}

/// Wires a verifier and an evaluator together in the correct order.
///
/// Construct one gate per effective policy; it can then be shared across
/// threads and reused for any number of runs.
pub struct Gate {
    evaluator: Box<dyn PolicyEvaluator>,
    verifier: Box<dyn CredentialVerifier>,
}

impl Gate {
    pub fn new(evaluator: Box<dyn PolicyEvaluator>, verifier: Box<dyn CredentialVerifier>) -> Self {
        Self { evaluator, verifier }
    }

    /// Decide one run.
    pub fn evaluate(&self, credential: Option<&Credential>, facts: &RunFacts) -> GateOutcome {
        let credential_report = credential.map(|c| self.verifier.verify(c));

        match (credential, &credential_report) {
            (Some(c), Some(report)) if !report.valid => warn!(
                run_id = %c.run_id,
                reasons = report.reasons.len(),
                "credential failed verification"
            ),
            (None, _) => warn!("no credential supplied; provenance treated as invalid"),
            _ => {}
        }

        let input = assemble_input(credential, credential_report.as_ref(), facts);
        debug!(
            agents = input.agents.len(),
            tokens = input.usage.tokens,
            files = input.changes.files.len(),
            approvals = input.approvals.destructive.count,
            provenance_valid = input.provenance.valid,
            "assessment input assembled"
        );

        let assessment = self.evaluator.assess(&input);
        let summary = summarize(&assessment, credential_report.as_ref());

        info!(
            allow = assessment.allow,
            reasons = assessment.reasons.len(),
            annotations = assessment.annotations.len(),
            "gate decision"
        );

        GateOutcome {
            assessment,
            credential_report,
            summary,
        }
    }
}

/// Project a credential and platform facts into the evaluator's fact bundle.
pub fn assemble_input(
    credential: Option<&Credential>,
    report: Option<&CredentialReport>,
    facts: &RunFacts,
) -> AssessmentInput {
    AssessmentInput {
        agents: credential
            .map(|c| {
                c.agents
                    .iter()
                    .map(|a| AgentFact { id: a.id.clone() })
                    .collect()
            })
            .unwrap_or_default(),
        usage: Usage {
            tokens: credential.map(|c| c.budgets.tokens).unwrap_or(0),
        },
        changes: Changes {
            files: facts.changed_files.clone(),
        },
        approvals: ApprovalFacts {
            destructive: ApprovalCount {
                count: facts.approvals,
            },
        },
        provenance: ProvenanceFact {
            valid: report.map(|r| r.valid).unwrap_or(false),
        },
    }
}

fn summarize(assessment: &AssessmentResult, report: Option<&CredentialReport>) -> String {
    let status = if assessment.allow { "allow" } else { "block" };
    let reasons = if assessment.reasons.is_empty() {
        "All guardrails satisfied.".to_string()
    } else {
        assessment.reasons.join("; ")
    };
    let provenance = match report {
        Some(r) if r.valid => "Provenance validated.".to_string(),
        Some(r) => format!("Provenance issues: {}", r.reasons.join("; ")),
        None => "No credential found.".to_string(),
    };

    format!("Decision: {status}. {reasons} {provenance}")
}
