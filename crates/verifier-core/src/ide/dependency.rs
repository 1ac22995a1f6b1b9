use std::collections::HashSet;
use std::sync::Arc;

use log::debug;
use serde::Serialize;

use crate::ide::plugin::{IdePlugin, PluginDependency};
use crate::ide::registry::Ide;

/// Modules under this prefix are provided by the IDE platform itself.
/// A dependency on one is satisfied without any plugin providing it.
pub const PLATFORM_MODULE_PREFIX: &str = "com.intellij.modules.";

/// A resolved dependency between two plugins of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub dependency: PluginDependency,
}

/// A dependency declaration nothing in the IDE satisfies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MissingDependency {
    /// Id of the plugin declaring the dependency
    pub plugin_id: String,
    pub dependency: PluginDependency,
    pub reason: String,
}

/// Transitive dependencies of a plugin as resolved against an [`Ide`].
#[derive(Debug)]
pub struct DependencyGraph {
    /// The starting plugin, then every reachable dependency in first-visit order
    pub vertices: Vec<Arc<IdePlugin>>,
    pub edges: Vec<DependencyEdge>,
    pub missing: Vec<MissingDependency>,
}

impl DependencyGraph {
    /// Walks the dependencies of `plugin` depth-first. Each plugin is
    /// visited once, so cycles terminate.
    pub fn build(plugin: &Arc<IdePlugin>, ide: &Ide) -> Self {
        let mut graph = Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            missing: Vec::new(),
        };
        let mut visited = HashSet::new();
        graph.traverse(plugin, ide, &mut visited);
        debug!(
            "Dependency graph of {}: {} plugins, {} missing dependencies",
            plugin.id(),
            graph.vertices.len(),
            graph.missing.len()
        );
        graph
    }

    fn traverse(&mut self, current: &Arc<IdePlugin>, ide: &Ide, visited: &mut HashSet<String>) {
        if !visited.insert(current.id().to_string()) {
            return;
        }
        self.vertices.push(Arc::clone(current));

        for dependency in current.dependencies() {
            let resolved = if dependency.is_module {
                ide.get_plugin_by_module(&dependency.id)
            } else {
                ide.get_plugin_by_id(&dependency.id)
            };

            match resolved {
                Some(target) => {
                    self.traverse(&target, ide, visited);
                    self.edges.push(DependencyEdge {
                        from: current.id().to_string(),
                        to: target.id().to_string(),
                        dependency: dependency.clone(),
                    });
                }
                None if dependency.is_module && dependency.id.starts_with(PLATFORM_MODULE_PREFIX) => {}
                None => {
                    let kind = if dependency.is_module { "module" } else { "plugin" };
                    self.missing.push(MissingDependency {
                        plugin_id: current.id().to_string(),
                        dependency: dependency.clone(),
                        reason: format!(
                            "{} {} is not found in IDE {}",
                            kind,
                            dependency.id,
                            ide.version()
                        ),
                    });
                }
            }
        }
    }

    /// Dependencies of the starting plugin, excluding the plugin itself
    pub fn dependencies(&self) -> &[Arc<IdePlugin>] {
        self.vertices.get(1..).unwrap_or(&[])
    }

    /// Missing dependencies that are not optional
    pub fn mandatory_missing(&self) -> impl Iterator<Item = &MissingDependency> {
        self.missing.iter().filter(|missing| !missing.dependency.is_optional)
    }
}
