//! # runguard-core
//!
//! The decision pipeline for runguard.
//!
//! This crate provides:
//! - The two trait seams (`PolicyEvaluator`, `CredentialVerifier`)
//! - `Overrides`, the merge of human-issued exceptions into a policy
//! - The `Gate` that verifies a credential and assesses the resulting facts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use runguard_core::{Gate, RunFacts};
//!
//! let gate = Gate::new(Box::new(engine), Box::new(verifier));
//! let outcome = gate.evaluate(Some(&credential), &RunFacts::default());
//! ```

pub mod gate;
pub mod overrides;
pub mod traits;

pub use gate::{Gate, GateOutcome, RunFacts};
pub use overrides::Overrides;

// ── Tests ────────────────────────────────────────────────────────────────────
