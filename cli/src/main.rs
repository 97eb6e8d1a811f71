//! runguard: local simulator for agent run guardrails.
//!
//! Loads a policy, reads run credentials, and prints the decision the gate
//! would reach, the credential verification report, and the rule program a
//! policy compiles to.
//!
//! Usage:
//!   runguard simulate --policy policy.yaml --manifest credential.json --changed-file src/lib.rs
//!   runguard verify credential.json
//!   runguard hash credential.json
//!   runguard compile --policy policy.yaml
//!
//! Exit code 1 means a run was blocked, a credential was invalid, or the
//! command itself failed.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use runguard_contracts::{
    assessment::Annotation,
    credential::Credential,
    error::{GuardError, GuardResult},
    policy::Policy,
    report::CredentialReport,
};
use runguard_core::{
    gate::{Gate, GateOutcome, RunFacts},
    overrides::Overrides,
};
use runguard_policy::{compile, load_policy, PolicyEngine};
use runguard_verify::{
    read_credential, read_document, render_summary_markdown, resolve_manifest_paths, value_hash,
    verify_document, SchemaVerifier,
};

/// Policy file picked up from the working directory when `--policy` is absent.
const DEFAULT_POLICY_FILE: &str = "policy.yaml";

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "runguard",
    about = "Policy decisions and provenance checks for agent runs",
    long_about = "Simulates the runguard gate locally: policy evaluation over a run's\n\
                  credential and changed files, credential verification, canonical\n\
                  hashing, and rule-program compilation."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate one or more run credentials against a policy.
    Simulate(SimulateArgs),
    /// Verify a credential file and print its markdown summary.
    Verify {
        /// Path to the credential JSON document.
        credential: PathBuf,
    },
    /// Print the canonical SHA-256 fingerprint of a credential.
    Hash {
        /// Path to the credential JSON document.
        credential: PathBuf,
    },
    /// Print the rule program a policy compiles to.
    Compile {
        /// Policy file (YAML, JSON or TOML). Defaults to ./policy.yaml.
        #[arg(long)]
        policy: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
struct SimulateArgs {
    /// Policy file (YAML, JSON or TOML). Defaults to ./policy.yaml.
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Credential manifest to evaluate. Repeatable.
    #[arg(long = "manifest")]
    manifests: Vec<String>,

    /// Directory relative manifest paths are resolved against.
    #[arg(long)]
    manifest_dir: Option<PathBuf>,

    /// File changed by the run. Repeatable.
    #[arg(long = "changed-file")]
    changed_files: Vec<String>,

    /// Approvals counted toward destructive operations.
    #[arg(long, default_value_t = 0)]
    approvals: u64,

    /// Override the policy's token ceiling.
    #[arg(long)]
    budget_tokens: Option<u64>,

    /// Additionally permit this agent id. Repeatable.
    #[arg(long = "allow-agent")]
    allow_agents: Vec<String>,

    /// Emit a JSON payload instead of text.
    #[arg(long)]
    json: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Simulate(args) => run_simulate(&args),
        Command::Verify { credential } => run_verify(&credential),
        Command::Hash { credential } => run_hash(&credential),
        Command::Compile { policy } => run_compile(policy.as_deref()),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("runguard error: {e}");
            std::process::exit(1);
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────
//
// Each command returns Ok(false) for a negative verdict (blocked run, invalid
// credential) so that `main` owns the exit code.

fn run_simulate(args: &SimulateArgs) -> GuardResult<bool> {
    let report = simulate(args, Path::new("."))?;

    if args.json {
        let payload = serde_json::to_string_pretty(&report).map_err(|e| GuardError::Config {
            reason: format!("failed to encode simulation result: {e}"),
        })?;
        println!("{payload}");
    } else {
        print!("{}", render_simulation(&report));
    }

    Ok(report.allow)
}

fn run_verify(path: &Path) -> GuardResult<bool> {
    let document = read_document(path)?;
    let report = verify_document(&document);

    match serde_json::from_value::<Credential>(document) {
        Ok(credential) => println!("{}", render_summary_markdown(&credential, &report)),
        Err(_) => println!("{}", render_undecodable(&report)),
    }

    Ok(report.valid)
}

fn run_hash(path: &Path) -> GuardResult<bool> {
    println!("{}", hash_file(path)?);
    Ok(true)
}

/// Fingerprint the document as read, so fields the credential types do not
/// model still contribute to the hash.
fn hash_file(path: &Path) -> GuardResult<String> {
    Ok(value_hash(&read_document(path)?))
}

fn run_compile(policy: Option<&Path>) -> GuardResult<bool> {
    let policy = resolve_policy(policy, Path::new("."))?;
    print!("{}", compile(&policy));
    Ok(true)
}

// ── Simulation ────────────────────────────────────────────────────────────────

/// The outcome of `simulate` across every manifest.
#[derive(Debug, Serialize)]
struct SimulationReport {
    allow: bool,
    reasons: Vec<String>,
    annotations: Vec<Annotation>,
    manifests: Vec<ManifestOutcome>,
    evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ManifestOutcome {
    /// The credential path, or `None` for a run without a credential.
    path: Option<PathBuf>,
    allow: bool,
    reasons: Vec<String>,
    annotations: Vec<Annotation>,
    summary: String,
    credential: Option<CredentialReport>,
    /// Markdown summary of the credential, when one could be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    markdown: Option<String>,
}

/// Load the policy named by `explicit`, else `<cwd>/policy.yaml` if present,
/// else the fully-defaulted policy.
fn resolve_policy(explicit: Option<&Path>, cwd: &Path) -> GuardResult<Policy> {
    if let Some(path) = explicit {
        return load_policy(path);
    }

    let fallback = cwd.join(DEFAULT_POLICY_FILE);
    if fallback.is_file() {
        debug!(path = %fallback.display(), "using policy from working directory");
        load_policy(&fallback)
    } else {
        debug!("no policy file found; using defaults");
        Ok(Policy::default())
    }
}

fn simulate(args: &SimulateArgs, cwd: &Path) -> GuardResult<SimulationReport> {
    let overrides = Overrides {
        allow_agents: args.allow_agents.clone(),
        budget_tokens: args.budget_tokens,
    };
    let policy = overrides.apply(&resolve_policy(args.policy.as_deref(), cwd)?);
    let gate = Gate::new(
        Box::new(PolicyEngine::new(policy)?),
        Box::new(SchemaVerifier::new()),
    );
    let facts = RunFacts {
        changed_files: args.changed_files.clone(),
        approvals: args.approvals,
    };

    let base = args.manifest_dir.clone().unwrap_or_else(|| cwd.to_path_buf());
    let paths = resolve_manifest_paths(&base, &args.manifests);

    let mut manifests = Vec::new();
    if paths.is_empty() {
        manifests.push(evaluate(&gate, None, None, &facts));
    }
    for path in paths {
        // A credential that cannot be read or decoded is simulated as a missing
        // one, which blocks whenever provenance is required. When the file is
        // still JSON, its verification report explains what is wrong.
        match read_credential(&path) {
            Ok(credential) => {
                manifests.push(evaluate(&gate, Some(path), Some(&credential), &facts));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "credential unreadable");
                let report = read_document(&path).ok().map(|doc| verify_document(&doc));
                let mut outcome = evaluate(&gate, Some(path), None, &facts);
                outcome.credential = report;
                manifests.push(outcome);
            }
        }
    }

    let mut reasons = Vec::new();
    let mut annotations: Vec<Annotation> = Vec::new();
    for manifest in &manifests {
        reasons.extend(manifest.reasons.iter().cloned());
        for annotation in &manifest.annotations {
            if !annotations.contains(annotation) {
                annotations.push(annotation.clone());
            }
        }
    }

    Ok(SimulationReport {
        allow: manifests.iter().all(|m| m.allow),
        reasons,
        annotations,
        manifests,
        evaluated_at: Utc::now(),
    })
}

fn evaluate(
    gate: &Gate,
    path: Option<PathBuf>,
    credential: Option<&Credential>,
    facts: &RunFacts,
) -> ManifestOutcome {
    let GateOutcome {
        assessment,
        credential_report,
        summary,
    } = gate.evaluate(credential, facts);

    let markdown = credential
        .zip(credential_report.as_ref())
        .map(|(c, report)| render_summary_markdown(c, report));

    ManifestOutcome {
        path,
        allow: assessment.allow,
        reasons: assessment.reasons,
        annotations: assessment.annotations,
        summary,
        credential: credential_report,
        markdown,
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn render_simulation(report: &SimulationReport) -> String {
    let mut out = String::new();

    for manifest in &report.manifests {
        let label = manifest
            .path
            .as_ref()
            .map_or_else(|| "(no credential)".to_string(), |p| p.display().to_string());
        out.push_str(&format!("# {label}\n"));
        out.push_str(if manifest.allow { "allow\n" } else { "block\n" });
        for reason in &manifest.reasons {
            out.push_str(&format!("- {reason}\n"));
        }
        for annotation in &manifest.annotations {
            out.push_str(&format!("  {}: {}\n", annotation.path, annotation.message));
        }
        out.push_str(&format!("{}\n", manifest.summary));
        if let Some(markdown) = &manifest.markdown {
            out.push('\n');
            out.push_str(markdown);
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

fn render_undecodable(report: &CredentialReport) -> String {
    let mut lines = vec![
        "[WARN] Attention: document is not a readable credential".to_string(),
        String::new(),
        format!("**Summary:** {}", report.summary),
        String::new(),
        "**Reasons:**".to_string(),
    ];
    lines.extend(report.reasons.iter().map(|r| format!("- {r}")));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;

    use super::*;

    fn credential_json(agent: &str, tokens: u64) -> String {
        json!({
            "version": "1.0",
            "run_id": "run-1",
            "repository": {
                "owner": "acme",
                "name": "widgets",
                "ref": "refs/heads/main",
                "commit": "0123456789abcdef0123456789abcdef01234567"
            },
            "workflow": { "name": "agents", "run_number": 1, "trigger": "pull_request" },
            "agents": [{ "id": agent, "provider": "x", "capabilities": [] }],
            "decisions": [],
            "budgets": { "tokens": tokens, "currency": { "amount": 0.1, "units": "USD" } },
            "artifacts": [],
            "signatures": [{
                "issuer": "sigstore",
                "timestamp": "2024-05-01T12:00:00Z",
                "signature": "-----BEGIN SIGNATURE-----\nAA==\n-----END SIGNATURE-----",
                "rekor_entry": "1"
            }]
        })
        .to_string()
    }

    const POLICY: &str = "\
allow_agents:
  - openai-codex
max_tokens_per_run: 1000
write_scopes:
  - path: \"src/**\"
    protected:
      - \"src/infra/**\"
approvals:
  destructive_ops:
    required: 1
";

    #[test]
    fn policy_falls_back_to_working_directory_then_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_policy(None, dir.path()).unwrap(), Policy::default());

        fs::write(dir.path().join("policy.yaml"), POLICY).unwrap();
        let policy = resolve_policy(None, dir.path()).unwrap();
        assert_eq!(policy.allow_agents, vec!["openai-codex".to_string()]);
    }

    #[test]
    fn explicit_missing_policy_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_policy(Some(&dir.path().join("absent.yaml")), dir.path()).unwrap_err();
        assert!(matches!(err, GuardError::Config { .. }));
    }

    #[test]
    fn simulation_allows_compliant_run() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("policy.yaml"), POLICY).unwrap();
        fs::write(dir.path().join("cred.json"), credential_json("openai-codex", 500)).unwrap();

        let args = SimulateArgs {
            manifests: vec!["cred.json".to_string()],
            changed_files: vec!["src/lib.rs".to_string()],
            ..SimulateArgs::default()
        };
        let report = simulate(&args, dir.path()).unwrap();

        assert!(report.allow, "{:?}", report.reasons);
        assert_eq!(report.manifests.len(), 1);
        assert!(report.manifests[0]
            .markdown
            .as_deref()
            .unwrap()
            .starts_with("[PASS] Valid"));
    }

    #[test]
    fn overrides_admit_agent_and_raise_budget() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("policy.yaml"), POLICY).unwrap();
        fs::write(dir.path().join("cred.json"), credential_json("anthropic-claude", 5000)).unwrap();

        let mut args = SimulateArgs {
            manifests: vec!["cred.json".to_string()],
            ..SimulateArgs::default()
        };
        let blocked = simulate(&args, dir.path()).unwrap();
        assert_eq!(
            blocked.reasons,
            vec![
                "Agent anthropic-claude is not on the allowlist.".to_string(),
                "Token usage 5000 exceeds max 1000.".to_string(),
            ]
        );

        args.allow_agents = vec!["anthropic-claude".to_string()];
        args.budget_tokens = Some(10_000);
        assert!(simulate(&args, dir.path()).unwrap().allow);
    }

    #[test]
    fn protected_path_needs_approval() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("policy.yaml"), POLICY).unwrap();
        fs::write(dir.path().join("cred.json"), credential_json("openai-codex", 10)).unwrap();

        let mut args = SimulateArgs {
            manifests: vec!["cred.json".to_string()],
            changed_files: vec!["src/infra/main.tf".to_string()],
            ..SimulateArgs::default()
        };
        let report = simulate(&args, dir.path()).unwrap();
        assert!(!report.allow);
        assert_eq!(report.annotations.len(), 1);
        assert_eq!(report.annotations[0].path, "src/infra/main.tf");

        args.approvals = 1;
        let report = simulate(&args, dir.path()).unwrap();
        assert!(report.allow);
        assert_eq!(report.annotations.len(), 1);
    }

    #[test]
    fn unreadable_manifest_blocks_as_missing_credential() {
        let dir = tempfile::tempdir().unwrap();
        let args = SimulateArgs {
            manifests: vec!["absent.json".to_string()],
            manifest_dir: Some(dir.path().to_path_buf()),
            ..SimulateArgs::default()
        };

        let report = simulate(&args, Path::new("/nonexistent")).unwrap();

        assert!(!report.allow);
        assert_eq!(
            report.reasons,
            vec!["Provenance credential is missing or invalid.".to_string()]
        );
        assert_eq!(report.manifests[0].path, Some(dir.path().join("absent.json")));
        assert!(report.manifests[0].credential.is_none());
        assert!(report.manifests[0].summary.ends_with("No credential found."));
    }

    #[test]
    fn credential_missing_required_lists_blocks_with_schema_reasons() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc: serde_json::Value =
            serde_json::from_str(&credential_json("openai-codex", 10)).unwrap();
        let root = doc.as_object_mut().unwrap();
        root.remove("decisions");
        root.remove("artifacts");
        fs::write(dir.path().join("cred.json"), doc.to_string()).unwrap();

        let args = SimulateArgs {
            manifests: vec!["cred.json".to_string()],
            ..SimulateArgs::default()
        };
        let report = simulate(&args, dir.path()).unwrap();

        assert!(!report.allow);
        assert_eq!(
            report.reasons,
            vec!["Provenance credential is missing or invalid.".to_string()]
        );
        let credential = report.manifests[0].credential.as_ref().unwrap();
        assert!(!credential.valid);
        assert!(credential
            .reasons
            .contains(&"Schema: / \"decisions\" is a required property".to_string()));
        assert!(credential
            .reasons
            .contains(&"Schema: / \"artifacts\" is a required property".to_string()));
    }

    #[test]
    fn hash_covers_the_document_as_read() {
        let dir = tempfile::tempdir().unwrap();
        let full: serde_json::Value =
            serde_json::from_str(&credential_json("openai-codex", 10)).unwrap();

        let mut missing = full.clone();
        missing.as_object_mut().unwrap().remove("artifacts");
        let mut extended = full.clone();
        extended["annotations"] = json!({ "reviewer": "alice" });

        let mut hashes = Vec::new();
        for (name, doc) in [("full", &full), ("missing", &missing), ("extended", &extended)] {
            let path = dir.path().join(format!("{name}.json"));
            fs::write(&path, doc.to_string()).unwrap();
            hashes.push(hash_file(&path).unwrap());
        }

        assert_eq!(hashes[0], value_hash(&full));
        assert_ne!(hashes[0], hashes[1]);
        assert_ne!(hashes[0], hashes[2]);
    }

    #[test]
    fn json_payload_has_expected_keys() {
        let dir = tempfile::tempdir().unwrap();
        let report = simulate(&SimulateArgs::default(), dir.path()).unwrap();

        let payload = serde_json::to_value(&report).unwrap();
        for key in ["allow", "reasons", "annotations", "manifests", "evaluated_at"] {
            assert!(payload.get(key).is_some(), "missing {key}");
        }
        assert_eq!(payload["manifests"][0]["path"], serde_json::Value::Null);
    }

    #[test]
    fn text_rendering_labels_each_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let report = simulate(&SimulateArgs::default(), dir.path()).unwrap();

        let text = render_simulation(&report);

        assert!(text.starts_with("# (no credential)\nblock\n"));
        assert!(text.contains("- Provenance credential is missing or invalid."));
    }

    #[test]
    fn undecodable_credential_renders_reasons() {
        let report = verify_document(&json!({ "run_id": "x" }));
        let text = render_undecodable(&report);
        assert!(text.contains("**Summary:** Run: x | Agents: none"));
        assert!(text.contains("**Reasons:**\n- Schema: / "));
    }
}
