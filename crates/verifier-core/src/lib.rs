//! # Plugin Verifier Core
//!
//! Checks whether an IDE plugin is binary compatible with an IDE build.
//! Every class, field and method the plugin's bytecode refers to is
//! resolved against the IDE's own classes, and whatever cannot be resolved
//! is reported as a [`Problem`].
pub mod classes;
pub mod config;
pub mod ide;
pub mod kernel;
pub mod verification;

pub use classes::{ReadMode, ResolutionResult, Resolver};
pub use config::VerifierConfig;
pub use ide::{Ide, IdePlugin, IdeVersion};
pub use kernel::error::{Error, Result};
pub use verification::{Problem, VerificationEngine, VerificationResult, Verdict};

#[cfg(test)]
mod tests;
