use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use crate::classes::resolver::{ResolutionResult, Resolver};

/// Precedence-ordered composite of other resolvers.
///
/// A class resolves from the first layer that holds it, so earlier layers
/// shadow later ones. A layer holding an unreadable or invalid copy also
/// shadows later layers: the first copy is the one a classloader would
/// see. Every outcome, absence included, is cached by class name for the
/// lifetime of the union.
pub struct UnionResolver {
    layers: Vec<Arc<dyn Resolver>>,
    cache: RwLock<HashMap<String, ResolutionResult>>,
}

impl UnionResolver {
    pub fn new(layers: Vec<Arc<dyn Resolver>>) -> Self {
        Self {
            layers,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn layers(&self) -> &[Arc<dyn Resolver>] {
        &self.layers
    }

    /// Number of cached outcomes.
    pub fn cached_len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Only the first layer holding the class decodes it; later copies
    /// are never read.
    fn resolve_uncached(&self, class_name: &str) -> ResolutionResult {
        self.layers
            .iter()
            .find(|layer| layer.contains_class(class_name))
            .map(|layer| layer.resolve_class(class_name))
            .unwrap_or(ResolutionResult::NotFound)
    }
}

impl Resolver for UnionResolver {
    fn resolve_class(&self, class_name: &str) -> ResolutionResult {
        {
            let cache = self
                .cache
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(result) = cache.get(class_name) {
                return result.clone();
            }
        }

        // Resolved outside the lock; a concurrent resolution of the same
        // name computes an equal result and the first insert is kept.
        let result = self.resolve_uncached(class_name);
        let mut cache = self
            .cache
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache
            .entry(class_name.to_string())
            .or_insert(result)
            .clone()
    }

    fn contains_class(&self, class_name: &str) -> bool {
        self.layers
            .iter()
            .any(|layer| layer.contains_class(class_name))
    }

    fn all_classes(&self) -> BTreeSet<String> {
        self.layers
            .iter()
            .flat_map(|layer| layer.all_classes())
            .collect()
    }
}

/// Builds a caching union of `layers` in precedence order. A single layer
/// is still wrapped so lookups through the result are cached.
pub fn union(layers: Vec<Arc<dyn Resolver>>) -> Arc<dyn Resolver> {
    Arc::new(UnionResolver::new(layers))
}
