//! # Verification
//!
//! Checks a plugin's compiled classes against an [`Ide`](crate::ide::Ide)
//! and classifies every reference that cannot be satisfied.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`problem`]**: The closed set of [`Problem`]s a run can report.
//! - **[`result`]**: [`VerificationResult`] and its [`Verdict`].
//! - **[`engine`]**: The [`VerificationEngine`] that walks a plugin's
//!   classes and method bodies.
//! - **[`batch`]**: Runs many verifications concurrently on tokio.
//!
//! Member lookup along the class hierarchy and the visibility rules are
//! internal to this module.
mod access;
pub mod batch;
pub mod engine;
mod hierarchy;
pub mod problem;
pub mod result;

pub use batch::{verify_batch, VerificationTask};
pub use engine::VerificationEngine;
pub use problem::Problem;
pub use result::{IneligibleReason, VerificationResult, Verdict};

#[cfg(test)]
mod tests;
