use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::classes::node::ClassNode;
use crate::classes::resolver::{read_class_node, ReadMode, ResolutionResult, Resolver};

#[derive(Debug, Clone)]
enum Entry {
    Node(Arc<ClassNode>),
    Bytes(Arc<[u8]>),
}

/// Byte source held entirely in memory, either as raw class files or as
/// already-built class nodes.
#[derive(Debug, Clone)]
pub struct InMemoryResolver {
    mode: ReadMode,
    entries: BTreeMap<String, Entry>,
}

impl InMemoryResolver {
    pub fn new(mode: ReadMode) -> Self {
        Self {
            mode,
            entries: BTreeMap::new(),
        }
    }

    /// Adds a prebuilt class. A later class with the same name replaces it.
    pub fn with_class(mut self, node: ClassNode) -> Self {
        self.entries
            .insert(node.name.clone(), Entry::Node(Arc::new(node)));
        self
    }

    /// Adds raw class file bytes stored under `class_name`; they are parsed
    /// on every resolution.
    pub fn with_class_bytes(mut self, class_name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(
            class_name.to_string(),
            Entry::Bytes(Arc::from(bytes.into())),
        );
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Resolver for InMemoryResolver {
    fn resolve_class(&self, class_name: &str) -> ResolutionResult {
        match self.entries.get(class_name) {
            Some(Entry::Node(node)) => ResolutionResult::Found(Arc::clone(node)),
            Some(Entry::Bytes(bytes)) => read_class_node(class_name, bytes, self.mode),
            None => ResolutionResult::NotFound,
        }
    }

    fn contains_class(&self, class_name: &str) -> bool {
        self.entries.contains_key(class_name)
    }

    fn all_classes(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }
}
