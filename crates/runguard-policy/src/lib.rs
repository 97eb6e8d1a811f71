//! # runguard-policy
//!
//! Policy normalization, evaluation, and compilation for runguard.
//!
//! ## Overview
//!
//! - [`model`] turns YAML, JSON, or TOML documents into a fully-defaulted
//!   [`Policy`](runguard_contracts::policy::Policy).
//! - [`engine::PolicyEngine`] implements the
//!   [`PolicyEvaluator`](runguard_core::traits::PolicyEvaluator) trait and
//!   produces ordered reasons and deduplicated annotations.
//! - [`glob`] is the path matcher behind write scopes.
//! - [`compiler`] renders the same policy as a Rego program.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use runguard_policy::{model::load_policy, PolicyEngine};
//!
//! let engine = PolicyEngine::new(load_policy(Path::new("policy.yaml"))?)?;
//! // Pass `engine` to `runguard_core::Gate::new(...)`.
//! ```

pub mod compiler;
pub mod engine;
pub mod glob;
pub mod model;

pub use compiler::compile;
pub use engine::{assess, PolicyEngine};
pub use glob::GlobMatcher;
pub use model::{load_policy, normalize, parse, parse_with_format, PolicyFormat};

// ── Tests ─────────────────────────────────────────────────────────────────────
