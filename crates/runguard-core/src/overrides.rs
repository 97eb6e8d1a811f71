//! Human-issued policy overrides.
//!
//! Overrides are stored by an external collaborator keyed by (repository,
//! pull request). The engine only sees the merged result: callers apply the
//! overrides to the configured policy and hand the effective policy to the
//! evaluator.

use serde::{Deserialize, Serialize};

use runguard_contracts::policy::Policy;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overrides {
    /// Extra agent ids to permit for this run.
    #[serde(default)]
    pub allow_agents: Vec<String>,

    /// Replacement token ceiling. `None` or `Some(0)` keeps the policy value.
    #[serde(default)]
    pub budget_tokens: Option<u64>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self.allow_agents.is_empty() && self.budget_tokens.unwrap_or(0) == 0
    }

    /// Produce the effective policy.
    ///
    /// The allowlist keeps the policy's order and appends override ids not
    /// already present. Note that extending an empty allowlist turns an
    /// unrestricted policy into a restricted one.
    pub fn apply(&self, policy: &Policy) -> Policy {
        let mut effective = policy.clone();

        for agent in &self.allow_agents {
            if !effective.allow_agents.contains(agent) {
                effective.allow_agents.push(agent.clone());
            }
        }

        if let Some(tokens) = self.budget_tokens.filter(|t| *t > 0) {
            effective.max_tokens_per_run = tokens;
        }

        effective
    }
}
