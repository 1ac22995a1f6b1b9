use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::classes::resolver::{EmptyResolver, Resolver};
use crate::ide::version::{BuildRange, IdeVersion};

/// A declared dependency of a plugin on another plugin or on a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PluginDependency {
    /// Plugin id, or module id when `is_module` is set
    pub id: String,
    /// Whether `id` names a module some plugin provides
    pub is_module: bool,
    /// Whether the plugin works without this dependency
    pub is_optional: bool,
}

impl PluginDependency {
    /// Create a mandatory dependency on a plugin id
    pub fn plugin(id: &str) -> Self {
        Self {
            id: id.to_string(),
            is_module: false,
            is_optional: false,
        }
    }

    /// Create a mandatory dependency on a module id
    pub fn module(id: &str) -> Self {
        Self {
            id: id.to_string(),
            is_module: true,
            is_optional: false,
        }
    }

    /// Mark this dependency optional
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }
}

impl fmt::Display for PluginDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_module { "module" } else { "plugin" };
        if self.is_optional {
            write!(f, "{} {} (optional)", kind, self.id)
        } else {
            write!(f, "{} {}", kind, self.id)
        }
    }
}

/// A loaded plugin: identity, declared compatibility and its compiled
/// classes. Immutable once built.
pub struct IdePlugin {
    id: String,
    version: Option<String>,
    build_range: BuildRange,
    modules: BTreeSet<String>,
    dependencies: Vec<PluginDependency>,
    classpath: Arc<dyn Resolver>,
}

impl IdePlugin {
    pub fn builder(id: &str, since_build: IdeVersion) -> IdePluginBuilder {
        IdePluginBuilder::new(id, since_build)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The plugin's own release version, if declared
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn since_build(&self) -> &IdeVersion {
        &self.build_range.since
    }

    pub fn until_build(&self) -> Option<&IdeVersion> {
        self.build_range.until.as_ref()
    }

    pub fn build_range(&self) -> &BuildRange {
        &self.build_range
    }

    /// Module ids this plugin provides
    pub fn modules(&self) -> &BTreeSet<String> {
        &self.modules
    }

    pub fn provides_module(&self, module_id: &str) -> bool {
        self.modules.contains(module_id)
    }

    pub fn dependencies(&self) -> &[PluginDependency] {
        &self.dependencies
    }

    /// The plugin's own compiled classes
    pub fn classpath(&self) -> &Arc<dyn Resolver> {
        &self.classpath
    }

    /// Checks whether this plugin declares itself compatible with `target`
    pub fn is_compatible_with(&self, target: &IdeVersion) -> bool {
        self.build_range.includes(target)
    }
}

impl fmt::Debug for IdePlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdePlugin")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("build_range", &self.build_range)
            .field("modules", &self.modules)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Builder for [`IdePlugin`]
pub struct IdePluginBuilder {
    plugin: IdePlugin,
}

impl IdePluginBuilder {
    /// Create a builder for a plugin with no classes, modules or dependencies
    pub fn new(id: &str, since_build: IdeVersion) -> Self {
        Self {
            plugin: IdePlugin {
                id: id.to_string(),
                version: None,
                build_range: BuildRange::new(since_build, None),
                modules: BTreeSet::new(),
                dependencies: Vec::new(),
                classpath: Arc::new(EmptyResolver),
            },
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.plugin.version = Some(version.to_string());
        self
    }

    pub fn until_build(mut self, until_build: IdeVersion) -> Self {
        self.plugin.build_range.until = Some(until_build);
        self
    }

    /// Declare a provided module
    pub fn module(mut self, module_id: &str) -> Self {
        self.plugin.modules.insert(module_id.to_string());
        self
    }

    /// Add a dependency
    pub fn dependency(mut self, dependency: PluginDependency) -> Self {
        self.plugin.dependencies.push(dependency);
        self
    }

    pub fn classpath(mut self, classpath: Arc<dyn Resolver>) -> Self {
        self.plugin.classpath = classpath;
        self
    }

    pub fn build(self) -> IdePlugin {
        self.plugin
    }
}
