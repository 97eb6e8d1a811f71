//! # runguard-contracts
//!
//! Shared types for the runguard decision engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod assessment;
pub mod credential;
pub mod error;
pub mod policy;
pub mod report;
