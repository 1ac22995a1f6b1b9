//! # Verifier Kernel Errors
//!
//! Defines [`Error`], the aggregate of every module's error type. Errors
//! only arise while loading inputs; a verification run itself reports
//! problems as values and never fails.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::classes::classfile::ClassParseError;
use crate::classes::resolver::ResolverError;
use crate::config::ConfigError;
use crate::ide::version::VersionError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    #[error("Classpath error: {0}")]
    Resolver(#[from] ResolverError),

    #[error("Class file error: {0}")]
    ClassFile(#[from] ClassParseError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for verifier operations
pub type Result<T> = StdResult<T, Error>;
