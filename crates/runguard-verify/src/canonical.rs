//! Canonical credential fingerprints.
//!
//! A fingerprint is the lowercase hex SHA-256 of the RFC 8785 (JCS)
//! serialization: object keys sorted recursively, arrays kept in order, no
//! insignificant whitespace. Optional credential fields are skipped when
//! absent, so a missing `tools` list and an omitted one hash the same.

use serde_json::Value;
use sha2::{Digest, Sha256};

use runguard_contracts::credential::Credential;

/// Fingerprint a typed credential.
///
/// The hash covers only the fields `Credential` models, so it identifies a
/// document only after that document has passed the credential schema. Use
/// `value_hash` on the document as read to fingerprint it byte-for-byte.
///
/// # Panics
///
/// Panics if `credential` cannot be represented as JSON, which cannot happen
/// for the `Credential` type (non-finite amounts become `null`).
pub fn credential_hash(credential: &Credential) -> String {
    let value =
        serde_json::to_value(credential).expect("Credential must always be serializable to JSON");
    value_hash(&value)
}

/// Fingerprint an arbitrary JSON document.
///
/// # Panics
///
/// Panics if `value` cannot be canonicalized, which cannot happen for a
/// `serde_json::Value` (it never holds non-finite numbers).
pub fn value_hash(value: &Value) -> String {
    let canonical =
        serde_jcs::to_string(value).expect("serde_json::Value must always canonicalize");
    hex::encode(Sha256::digest(canonical.as_bytes()))
}
