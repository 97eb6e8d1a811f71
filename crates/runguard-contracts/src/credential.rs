//! Run credential types.
//!
//! A credential is the evidence an agent run publishes: which agents ran,
//! how many tokens they spent, which artifacts they produced, and who signed
//! the record. Optional fields are skipped when absent so that re-serializing
//! a credential never introduces `null` values that would change its hash.
//! Every other field is required: a document that omits one does not decode,
//! so a typed `Credential` never carries silently invented empty lists.

use serde::{Deserialize, Serialize};

use crate::error::{GuardError, GuardResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub version: String,
    pub run_id: String,
    pub repository: Repository,
    pub workflow: Workflow,
    pub agents: Vec<AgentRecord>,
    pub decisions: Vec<DecisionRecord>,
    pub budgets: Budgets,
    pub artifacts: Vec<Artifact>,
    pub signatures: Vec<Signature>,
}

impl Credential {
    /// Decode a credential from JSON text.
    ///
    /// Returns `GuardError::CredentialParse` for malformed JSON or a document
    /// that lacks required credential fields.
    pub fn from_json_str(s: &str) -> GuardResult<Self> {
        serde_json::from_str(s).map_err(|e| GuardError::CredentialParse {
            reason: e.to_string(),
        })
    }

    /// Agent identifiers in declaration order.
    pub fn agent_ids(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// 40-character hex commit SHA.
    pub commit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub run_number: u64,
    pub trigger: String,
}

/// One agent that participated in the run. Only `id` is load-bearing for
/// policy checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: String,
    pub provider: String,
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
}

/// A guardrail decision recorded during the run. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: DecisionStatus,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    Allow,
    Deny,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budgets {
    pub tokens: u64,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub amount: f64,
    pub units: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub sha256: String,
    pub bindings: Vec<ArtifactBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ArtifactManifest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactBinding {
    #[serde(rename = "type")]
    pub kind: BindingKind,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    Embedded,
    Soft,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    #[serde(rename = "type")]
    pub kind: ManifestKind,
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestKind {
    C2pa,
    Sigstore,
    InToto,
}

/// A detached signature over the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub issuer: String,
    pub timestamp: String,
    /// PEM-armored signature text.
    pub signature: String,
    pub rekor_entry: String,
}
