//! Markdown rendering of a credential report, suitable for a pull-request
//! comment or a CI job summary.

use runguard_contracts::{credential::Credential, report::CredentialReport};

pub fn render_summary_markdown(credential: &Credential, report: &CredentialReport) -> String {
    let status = if report.valid {
        "[PASS] Valid"
    } else {
        "[WARN] Attention"
    };

    let agents = if credential.agents.is_empty() {
        "None".to_string()
    } else {
        credential
            .agents
            .iter()
            .map(|a| format!("`{}`", a.id))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut lines = vec![
        format!("{status} runguard run credential"),
        String::new(),
        format!("**Run ID:** `{}`", credential.run_id),
        format!("**Agents:** {agents}"),
        format!("**Token Budget:** {}", credential.budgets.tokens),
        format!("**Artifacts:** {}", credential.artifacts.len()),
        String::new(),
        format!("**Summary:** {}", report.summary),
    ];

    if !report.valid {
        lines.push(String::new());
        lines.push("**Reasons:**".to_string());
        lines.extend(report.reasons.iter().map(|r| format!("- {r}")));
    }

    lines.join("\n")
}
