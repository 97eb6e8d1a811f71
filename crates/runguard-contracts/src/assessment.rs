//! The flat fact bundle the evaluator consumes and the decision it returns.
//!
//! `AssessmentInput` is deliberately separate from `Credential`: the changed
//! file list and approval count come from the code-hosting platform, not from
//! the run itself, and the evaluator never cross-references the two.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentInput {
    pub agents: Vec<AgentFact>,
    pub usage: Usage,
    pub changes: Changes,
    pub approvals: ApprovalFacts,
    pub provenance: ProvenanceFact,
}

impl AssessmentInput {
    /// Build an input from plain values.
    pub fn new(
        agents: &[&str],
        tokens: u64,
        files: &[&str],
        approvals: u64,
        provenance_valid: bool,
    ) -> Self {
        Self {
            agents: agents.iter().map(|id| AgentFact { id: id.to_string() }).collect(),
            usage: Usage { tokens },
            changes: Changes {
                files: files.iter().map(|f| f.to_string()).collect(),
            },
            approvals: ApprovalFacts {
                destructive: ApprovalCount { count: approvals },
            },
            provenance: ProvenanceFact {
                valid: provenance_valid,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFact {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub tokens: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changes {
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalFacts {
    pub destructive: ApprovalCount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalCount {
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceFact {
    pub valid: bool,
}

/// The evaluator's decision.
///
/// `reasons` order is part of the contract: callers render it verbatim.
/// `annotations` never contains the same (path, message) pair twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub allow: bool,
    pub reasons: Vec<String>,
    pub annotations: Vec<Annotation>,
}

/// A per-file note attached to a decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    pub path: String,
    pub message: String,
}
