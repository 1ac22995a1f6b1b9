//! # Class Resolution
//!
//! Everything needed to turn compiled bytecode into resolvable class shapes.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`node`]**: The resolved shape of a class ([`ClassNode`]) with its
//!   members, access flags and the symbol references of its method bodies.
//! - **[`classfile`]**: Parses raw class files into [`ClassNode`]s.
//! - **[`bytecode`]**: Decodes method bodies into symbol references.
//! - **[`resolver`]**: The [`Resolver`] capability shared by every byte
//!   source, and the [`ResolutionResult`] it yields.
//! - **[`memory`]**, **[`directory`]**, **[`jar`]**: Concrete byte sources.
//! - **[`union`]**: Precedence-ordered, caching composition of resolvers.
//! - **[`classpath`]**: Opens directories and archives on disk as one resolver.
pub(crate) mod bytecode;
pub mod classfile;
pub mod classpath;
pub mod directory;
pub mod jar;
pub mod memory;
pub mod node;
pub mod resolver;
pub mod union;

pub use classfile::{parse_class, ClassParseError};
pub use classpath::open_classpath;
pub use directory::DirectoryResolver;
pub use jar::JarResolver;
pub use memory::InMemoryResolver;
pub use node::{AccessFlags, AccessLevel, ClassNode, MemberSignature, Reference, TypeKind};
pub use resolver::{EmptyResolver, ReadMode, ResolutionResult, Resolver, ResolverError};
pub use union::{union, UnionResolver};
