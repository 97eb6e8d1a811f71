//! runguard-verify: provenance verification for agent run credentials.
//!
//! - `engine`: `SchemaVerifier`, the schema and hygiene checks
//! - `canonical`: JCS + SHA-256 credential fingerprints
//! - `summary`: markdown rendering of a verification report
//! - `manifest`: manifest path resolution and credential file reads

pub mod canonical;
pub mod engine;
pub mod manifest;
pub mod summary;

pub use canonical::{credential_hash, value_hash};
pub use engine::{summary_line, verify, verify_document, SchemaVerifier};
pub use manifest::{read_credential, read_document, resolve_manifest_paths};
pub use summary::render_summary_markdown;
