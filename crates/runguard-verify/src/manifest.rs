//! Locating and reading credential files.

use std::path::{Path, PathBuf};

use tracing::debug;

use runguard_contracts::{
    credential::Credential,
    error::{GuardError, GuardResult},
};

/// Resolve manifest references against `base`. Absolute paths are kept
/// as-is; relative ones are joined onto `base`. Order is preserved.
pub fn resolve_manifest_paths(base: &Path, manifests: &[String]) -> Vec<PathBuf> {
    manifests
        .iter()
        .map(|manifest| {
            let path = Path::new(manifest);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base.join(path)
            }
        })
        .collect()
}

/// Read and decode the credential at `path`.
///
/// Returns `GuardError::Config` if the file cannot be read and
/// `GuardError::CredentialParse` if it is not a credential document.
pub fn read_credential(path: &Path) -> GuardResult<Credential> {
    let contents = std::fs::read_to_string(path).map_err(|e| GuardError::Config {
        reason: format!("failed to read credential file '{}': {}", path.display(), e),
    })?;
    let credential = Credential::from_json_str(&contents).map_err(|e| match e {
        GuardError::CredentialParse { reason } => GuardError::CredentialParse {
            reason: format!("{}: {reason}", path.display()),
        },
        other => other,
    })?;
    debug!(path = %path.display(), run_id = %credential.run_id, "credential loaded");
    Ok(credential)
}

/// Read a credential file as an untyped JSON document, for verification of
/// documents that may not match the credential shape.
pub fn read_document(path: &Path) -> GuardResult<serde_json::Value> {
    let contents = std::fs::read_to_string(path).map_err(|e| GuardError::Config {
        reason: format!("failed to read credential file '{}': {}", path.display(), e),
    })?;
    serde_json::from_str(&contents).map_err(|e| GuardError::CredentialParse {
        reason: format!("{}: {e}", path.display()),
    })
}
