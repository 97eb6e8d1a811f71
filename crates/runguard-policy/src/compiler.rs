//! Rule-program compiler.
//!
//! Renders a normalized policy as a standalone Rego module for an external
//! policy runtime (for example an admission controller that runs before any
//! credential exists). The program decides the same question as
//! `PolicyEngine`:
//!
//! ```text
//! allow = allow_agent ∧ within_budget ∧ valid_scope ∧ approvals_satisfied ∧ provenance_ok
//! ```
//!
//! Glob matching is delegated to the runtime's `glob.match` with `/` as the
//! separator. The runtime sees paths exactly as supplied, so callers must
//! pass normalized (`/`-separated, no leading `./`) file paths.
//!
//! Literal lists are emitted as compact JSON, which is valid Rego term
//! syntax and keeps escaping in one place.

use serde_json::{json, Value};

use runguard_contracts::policy::Policy;

const HEADER: &str = "package runguard.guard

import future.keywords.in

default allow = false";

const ALLOW_RULE: &str = "allow {
  allow_agent
  within_budget
  valid_scope
  approvals_satisfied
  provenance_ok
}";

/// Render `policy` as Rego source. Always ends with a single newline.
pub fn compile(policy: &Policy) -> String {
    let blocks = [
        HEADER.to_string(),
        ALLOW_RULE.to_string(),
        render_agent_allowlist(policy),
        render_budget(policy),
        render_scope(policy),
        render_approvals(policy),
        render_provenance(policy),
    ];

    format!("{}\n", blocks.join("\n\n"))
}

fn string_list<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    Value::from(items.into_iter().cloned().collect::<Vec<String>>()).to_string()
}

fn render_agent_allowlist(policy: &Policy) -> String {
    if policy.allow_agents.is_empty() {
        return "allow_agent { true }".to_string();
    }

    format!(
        "allow_agent {{
  some agent in allowlist
  input.agent.id == agent
}}

allowlist := {}",
        string_list(&policy.allow_agents)
    )
}

fn render_budget(policy: &Policy) -> String {
    if policy.max_tokens_per_run == 0 {
        return "within_budget { true }".to_string();
    }

    format!(
        "within_budget {{
  input.usage.tokens <= {}
}}",
        policy.max_tokens_per_run
    )
}

fn render_scope(policy: &Policy) -> String {
    let allowed_paths = string_list(policy.write_scopes.iter().map(|s| &s.path));
    let protected_paths = string_list(policy.write_scopes.iter().flat_map(|s| &s.protected));
    let write_scopes = Value::Array(
        policy
            .write_scopes
            .iter()
            .map(|s| json!({ "path": s.path, "protected": s.protected }))
            .collect(),
    )
    .to_string();

    // A protected pattern only counts for files inside its own scope,
    // mirroring the native evaluator.
    let touched = format!(
        "protected_path_touched {{
  some file in input.changes.files
  some scope in write_scopes
  glob.match(scope.path, [\"/\"], file)
  some pattern in scope.protected
  glob.match(pattern, [\"/\"], file)
}}

allowed_paths := {allowed_paths}

protected_paths := {protected_paths}

write_scopes := {write_scopes}"
    );

    if policy.write_scopes.is_empty() {
        return format!("valid_scope {{ true }}\n\n{touched}");
    }

    format!(
        "valid_scope {{
  not disallowed_file
}}

disallowed_file {{
  some file in input.changes.files
  not file_allowed(file)
}}

file_allowed(file) {{
  some pattern in allowed_paths
  glob.match(pattern, [\"/\"], file)
}}

{touched}"
    )
}

fn render_approvals(policy: &Policy) -> String {
    let required = policy.required_approvals();
    if required == 0 {
        return "approvals_satisfied { true }".to_string();
    }

    format!(
        "required_approvals := {required}

approvals_required {{
  required_approvals > 0
  protected_path_touched
}}

approvals_satisfied {{
  not approvals_required
}}

approvals_satisfied {{
  approvals_required
  input.approvals.destructive.count >= required_approvals
}}"
    )
}

fn render_provenance(policy: &Policy) -> String {
    if !policy.provenance_required {
        return "provenance_ok { true }".to_string();
    }

    "provenance_ok {
  input.provenance.valid == true
}"
    .to_string()
}
