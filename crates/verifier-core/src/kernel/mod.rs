//! # Verifier Kernel
//!
//! Crate-wide building blocks shared by every other module.
//!
//! - **[`error`]**: The aggregate [`Error`](error::Error) type and the
//!   crate-wide [`Result`](error::Result) alias.
//! - **[`constants`]**: Application name and version.
pub mod constants;
pub mod error;

pub use error::{Error, Result};
