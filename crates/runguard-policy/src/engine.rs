//! The native policy evaluator.
//!
//! `PolicyEngine` compiles a policy's glob patterns once and implements the
//! `PolicyEvaluator` trait from runguard-core.
//!
//! Evaluation algorithm (the order of `reasons` follows these steps):
//!
//! 1. Agent allowlist: one reason per input agent missing from a non-empty
//!    allowlist, in input order.
//! 2. Token budget: one reason when a non-zero ceiling is exceeded.
//! 3. Write scopes: only when scopes are declared. For each changed file:
//!    a. No scope path matches → "outside allowed write scopes" reason and
//!       annotation; the file gets no further checks.
//!    b. Otherwise every protected pattern of a matching scope that also
//!       matches the file is annotated (deduplicated by path and message) and,
//!       if approvals fall short, reported (never deduplicated).
//! 4. Provenance: one reason when provenance is required but invalid.
//!
//! `allow` is true exactly when no reasons were produced.

use std::collections::HashSet;

use tracing::{debug, warn};

use runguard_contracts::{
    assessment::{Annotation, AssessmentInput, AssessmentResult},
    error::GuardResult,
    policy::Policy,
};
use runguard_core::traits::PolicyEvaluator;

use crate::glob::{normalize_path, GlobMatcher};

const OUTSIDE_SCOPE_MESSAGE: &str = "File is outside allowed write scopes.";

#[derive(Debug, Clone)]
struct CompiledScope {
    path: GlobMatcher,
    protected: Vec<GlobMatcher>,
}

/// A `PolicyEvaluator` over one normalized policy.
///
/// ```rust,ignore
/// use runguard_policy::{engine::PolicyEngine, model::load_policy};
///
/// let engine = PolicyEngine::new(load_policy(Path::new("policy.yaml"))?)?;
/// let result = engine.assess(&input);
/// ```
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    policy: Policy,
    scopes: Vec<CompiledScope>,
}

impl PolicyEngine {
    /// Compile every scope and protected pattern in `policy`.
    pub fn new(policy: Policy) -> GuardResult<Self> {
        let scopes = policy
            .write_scopes
            .iter()
            .map(|scope| {
                Ok(CompiledScope {
                    path: GlobMatcher::new(&scope.path)?,
                    protected: scope
                        .protected
                        .iter()
                        .map(|p| GlobMatcher::new(p))
                        .collect::<GuardResult<Vec<_>>>()?,
                })
            })
            .collect::<GuardResult<Vec<_>>>()?;

        Ok(Self { policy, scopes })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    fn check_agents(&self, input: &AssessmentInput, reasons: &mut Vec<String>) {
        if self.policy.allow_agents.is_empty() {
            return;
        }
        let allowed: HashSet<&str> = self.policy.allow_agents.iter().map(String::as_str).collect();

        for agent in &input.agents {
            if !allowed.contains(agent.id.as_str()) {
                warn!(agent_id = %agent.id, "agent not on allowlist");
                reasons.push(format!("Agent {} is not on the allowlist.", agent.id));
            }
        }
    }

    fn check_budget(&self, input: &AssessmentInput, reasons: &mut Vec<String>) {
        let limit = self.policy.max_tokens_per_run;
        let tokens = input.usage.tokens;
        if limit > 0 && tokens > limit {
            warn!(tokens, limit, "token budget exceeded");
            reasons.push(format!("Token usage {tokens} exceeds max {limit}."));
        }
    }

    fn check_scopes(
        &self,
        input: &AssessmentInput,
        reasons: &mut Vec<String>,
        annotations: &mut Annotations,
    ) {
        // No declared scopes: every file is permitted and unprotected.
        if self.scopes.is_empty() {
            return;
        }

        let required = self.policy.required_approvals();
        let count = input.approvals.destructive.count;

        for raw in &input.changes.files {
            let file = normalize_path(raw);
            let matching: Vec<&CompiledScope> =
                self.scopes.iter().filter(|s| s.path.is_match(&file)).collect();

            if matching.is_empty() {
                warn!(file = %file, "file outside allowed write scopes");
                reasons.push(format!("File {file} is outside allowed write scopes."));
                annotations.add(&file, OUTSIDE_SCOPE_MESSAGE);
                continue;
            }

            // Scope order, then pattern order; each pattern string once per file.
            let mut touched: Vec<&str> = Vec::new();
            for scope in matching {
                for pattern in &scope.protected {
                    if pattern.is_match(&file) && !touched.contains(&pattern.pattern()) {
                        touched.push(pattern.pattern());
                    }
                }
            }

            for pattern in touched {
                debug!(file = %file, pattern, "protected path modified");
                annotations.add(&file, &format!("Protected path {pattern} modified."));

                if required > 0 && count < required {
                    warn!(file = %file, pattern, count, required, "protected path lacks approvals");
                    reasons.push(format!(
                        "Protected path {pattern} modified by {file} without required approvals ({count}/{required})."
                    ));
                }
            }
        }
    }

    fn check_provenance(&self, input: &AssessmentInput, reasons: &mut Vec<String>) {
        if self.policy.provenance_required && !input.provenance.valid {
            warn!("provenance required but credential invalid");
            reasons.push("Provenance credential is missing or invalid.".to_string());
        }
    }
}

impl PolicyEvaluator for PolicyEngine {
    fn assess(&self, input: &AssessmentInput) -> AssessmentResult {
        debug!(
            policy = %self.policy.metadata.name,
            agents = input.agents.len(),
            files = input.changes.files.len(),
            "assessing run"
        );

        let mut reasons = Vec::new();
        let mut annotations = Annotations::default();

        self.check_agents(input, &mut reasons);
        self.check_budget(input, &mut reasons);
        self.check_scopes(input, &mut reasons, &mut annotations);
        self.check_provenance(input, &mut reasons);

        debug!(allow = reasons.is_empty(), reasons = reasons.len(), "assessment complete");

        AssessmentResult {
            allow: reasons.is_empty(),
            reasons,
            annotations: annotations.into_vec(),
        }
    }
}

/// Assess `input` against `policy` without keeping a compiled engine around.
///
/// A policy whose patterns cannot be compiled fails closed: the result blocks
/// with the compilation error as its only reason.
pub fn assess(policy: &Policy, input: &AssessmentInput) -> AssessmentResult {
    match PolicyEngine::new(policy.clone()) {
        Ok(engine) => engine.assess(input),
        Err(e) => {
            warn!(error = %e, "policy patterns failed to compile");
            AssessmentResult {
                allow: false,
                reasons: vec![e.to_string()],
                annotations: Vec::new(),
            }
        }
    }
}

/// Insertion-ordered annotation list with (path, message) deduplication.
#[derive(Default)]
struct Annotations {
    seen: HashSet<(String, String)>,
    items: Vec<Annotation>,
}

impl Annotations {
    fn add(&mut self, path: &str, message: &str) {
        if self.seen.insert((path.to_string(), message.to_string())) {
            self.items.push(Annotation {
                path: path.to_string(),
                message: message.to_string(),
            });
        }
    }

    fn into_vec(self) -> Vec<Annotation> {
        self.items
    }
}
