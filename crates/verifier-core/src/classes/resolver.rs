use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use zip::result::ZipError;

use crate::classes::classfile::parse_class;
use crate::classes::node::ClassNode;

/// How much of each class file a byte source decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadMode {
    /// Class shape plus the symbol references of every method body.
    Full,
    /// Class shape only. Used for classpaths that are resolved against but
    /// never walked.
    Signatures,
}

/// Outcome of resolving one class name. Absence is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    Found(Arc<ClassNode>),
    NotFound,
    /// The source holds bytes for the class that do not form a valid class file.
    Invalid(String),
    /// The source holds the class but its bytes could not be read.
    FailedToRead(String),
}

impl ResolutionResult {
    pub fn is_found(&self) -> bool {
        matches!(self, ResolutionResult::Found(_))
    }

    pub fn node(&self) -> Option<&Arc<ClassNode>> {
        match self {
            ResolutionResult::Found(node) => Some(node),
            _ => None,
        }
    }
}

/// A source of resolved classes, keyed by dotted binary name.
///
/// Implementations are immutable once constructed and safe to share across
/// verification runs on different threads.
pub trait Resolver: Send + Sync {
    /// Resolves `class_name` to its [`ClassNode`].
    fn resolve_class(&self, class_name: &str) -> ResolutionResult;

    /// Whether this source holds bytes for `class_name`, valid or not.
    /// Must be true exactly when `resolve_class` returns something other
    /// than [`ResolutionResult::NotFound`]; unions rely on it to pick the
    /// layer that decodes a class.
    fn contains_class(&self, class_name: &str) -> bool;

    /// Names of every class this source holds.
    fn all_classes(&self) -> BTreeSet<String>;
}

/// Errors raised while opening a directory or archive as a byte source.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("IO error while opening {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("ZIP error while opening {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
    #[error("Unsupported classpath entry: {path}")]
    UnsupportedPath { path: PathBuf },
}

/// A source that holds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyResolver;

impl Resolver for EmptyResolver {
    fn resolve_class(&self, _class_name: &str) -> ResolutionResult {
        ResolutionResult::NotFound
    }

    fn contains_class(&self, _class_name: &str) -> bool {
        false
    }

    fn all_classes(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// Parses class bytes found under `class_name`. A class file that declares
/// a different name than the path it was stored under is invalid.
pub(crate) fn read_class_node(class_name: &str, bytes: &[u8], mode: ReadMode) -> ResolutionResult {
    match parse_class(bytes, mode) {
        Ok(node) if node.name == class_name => ResolutionResult::Found(Arc::new(node)),
        Ok(node) => ResolutionResult::Invalid(format!(
            "class file declares {} instead of {}",
            node.name, class_name
        )),
        Err(err) => ResolutionResult::Invalid(err.to_string()),
    }
}

/// Relative path of a class file within a directory or archive.
pub(crate) fn class_file_path(class_name: &str) -> String {
    format!("{}.class", class_name.replace('.', "/"))
}

/// Class name stored under a directory or archive entry, if the entry is a
/// loadable class file.
pub(crate) fn class_name_of_entry(entry: &str) -> Option<String> {
    if entry.starts_with("META-INF/") {
        return None;
    }
    let stem = entry.strip_suffix(".class")?;
    if stem.is_empty() || stem == "module-info" || stem.ends_with("/module-info") {
        return None;
    }
    Some(stem.replace('/', "."))
}
