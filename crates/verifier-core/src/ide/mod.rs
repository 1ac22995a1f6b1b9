//! # IDE Model
//!
//! Describes the IDE builds plugins are verified against and the plugins
//! themselves.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`version`]**: Parsing and ordering of IDE build numbers
//!   ([`IdeVersion`]) and the build ranges plugins declare ([`BuildRange`]).
//! - **[`plugin`]**: Loaded plugin descriptors ([`IdePlugin`]) and their
//!   dependency declarations.
//! - **[`registry`]**: The [`Ide`] snapshot: version, bundled and custom
//!   plugins, lookups by id and module, and the combined class resolver.
//! - **[`dependency`]**: Transitive dependency graphs of a plugin within an
//!   [`Ide`].
pub mod dependency;
pub mod plugin;
pub mod registry;
pub mod version;

pub use dependency::{DependencyEdge, DependencyGraph, MissingDependency};
pub use plugin::{IdePlugin, IdePluginBuilder, PluginDependency};
pub use registry::Ide;
pub use version::{BuildRange, IdeVersion, VersionError};
