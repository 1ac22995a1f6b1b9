use std::collections::HashMap;
use std::fmt;
use std::iter;
use std::sync::{Arc, OnceLock};

use log::debug;

use crate::classes::resolver::Resolver;
use crate::classes::union::union;
use crate::ide::plugin::IdePlugin;
use crate::ide::version::IdeVersion;

/// An IDE build with its bundled plugins and any custom plugins added on
/// top of it.
///
/// Each [`Ide`] value is an immutable snapshot. [`Ide::get_expanded_ide`]
/// links a new snapshot to its parent instead of copying the plugin
/// lists, so lookups check the newest plugin first and then delegate.
/// Cloning an [`Ide`] shares the snapshot.
#[derive(Clone)]
pub struct Ide {
    snapshot: Arc<Snapshot>,
}

struct Snapshot {
    version: IdeVersion,
    layer: Layer,
    resolver: OnceLock<Arc<dyn Resolver>>,
}

enum Layer {
    Base(BaseLayer),
    Expanded {
        parent: Arc<Snapshot>,
        plugin: Arc<IdePlugin>,
    },
}

struct BaseLayer {
    platform: Arc<dyn Resolver>,
    bundled: Arc<[Arc<IdePlugin>]>,
    indices: OnceLock<BundledIndices>,
}

/// Positions into the bundled list. A later plugin wins a shared id or
/// module.
struct BundledIndices {
    by_id: HashMap<String, usize>,
    by_module: HashMap<String, usize>,
}

impl BaseLayer {
    fn indices(&self) -> &BundledIndices {
        self.indices.get_or_init(|| {
            let mut by_id = HashMap::new();
            let mut by_module = HashMap::new();
            for (position, plugin) in self.bundled.iter().enumerate() {
                by_id.insert(plugin.id().to_string(), position);
                for module in plugin.modules() {
                    by_module.insert(module.clone(), position);
                }
            }
            BundledIndices { by_id, by_module }
        })
    }

    fn plugin_by_id(&self, id: &str) -> Option<&Arc<IdePlugin>> {
        self.indices()
            .by_id
            .get(id)
            .map(|position| &self.bundled[*position])
    }

    fn plugin_by_module(&self, module_id: &str) -> Option<&Arc<IdePlugin>> {
        self.indices()
            .by_module
            .get(module_id)
            .map(|position| &self.bundled[*position])
    }
}

impl Snapshot {
    fn parent(&self) -> Option<&Snapshot> {
        match &self.layer {
            Layer::Expanded { parent, .. } => Some(&**parent),
            Layer::Base(_) => None,
        }
    }

    /// This snapshot followed by its ancestors, newest first.
    fn chain(&self) -> impl Iterator<Item = &Snapshot> {
        iter::successors(Some(self), |snapshot| snapshot.parent())
    }

    fn base(&self) -> &BaseLayer {
        let mut current = self;
        loop {
            match &current.layer {
                Layer::Base(base) => return base,
                Layer::Expanded { parent, .. } => current = &**parent,
            }
        }
    }

    fn resolver(&self) -> &Arc<dyn Resolver> {
        self.resolver.get_or_init(|| match &self.layer {
            Layer::Base(base) => {
                let mut layers: Vec<Arc<dyn Resolver>> = base
                    .bundled
                    .iter()
                    .map(|plugin| Arc::clone(plugin.classpath()))
                    .collect();
                layers.push(Arc::clone(&base.platform));
                debug!(
                    "Built resolver for IDE {} over {} bundled plugins",
                    self.version,
                    base.bundled.len()
                );
                union(layers)
            }
            Layer::Expanded { parent, plugin } => {
                debug!(
                    "Built resolver for IDE {} expanded with {}",
                    self.version,
                    plugin.id()
                );
                union(vec![
                    Arc::clone(plugin.classpath()),
                    Arc::clone(parent.resolver()),
                ])
            }
        })
    }
}

impl Ide {
    /// Create an IDE from its platform classes and bundled plugins
    pub fn new(
        version: IdeVersion,
        platform: Arc<dyn Resolver>,
        bundled: Vec<Arc<IdePlugin>>,
    ) -> Self {
        Self {
            snapshot: Arc::new(Snapshot {
                version,
                layer: Layer::Base(BaseLayer {
                    platform,
                    bundled: Arc::from(bundled),
                    indices: OnceLock::new(),
                }),
                resolver: OnceLock::new(),
            }),
        }
    }

    pub fn version(&self) -> &IdeVersion {
        &self.snapshot.version
    }

    pub fn bundled_plugins(&self) -> &[Arc<IdePlugin>] {
        &self.snapshot.base().bundled
    }

    /// Custom plugins in the order they were added
    pub fn custom_plugins(&self) -> Vec<Arc<IdePlugin>> {
        let mut custom: Vec<Arc<IdePlugin>> = self
            .snapshot
            .chain()
            .filter_map(|snapshot| match &snapshot.layer {
                Layer::Expanded { plugin, .. } => Some(Arc::clone(plugin)),
                Layer::Base(_) => None,
            })
            .collect();
        custom.reverse();
        custom
    }

    /// Finds a plugin by id. Custom plugins shadow bundled ones, and later
    /// custom plugins shadow earlier ones.
    pub fn get_plugin_by_id(&self, id: &str) -> Option<Arc<IdePlugin>> {
        self.find_plugin(|plugin| plugin.id() == id, |base| base.plugin_by_id(id))
    }

    /// Finds the plugin providing `module_id`, with the same precedence as
    /// [`Ide::get_plugin_by_id`].
    pub fn get_plugin_by_module(&self, module_id: &str) -> Option<Arc<IdePlugin>> {
        self.find_plugin(
            |plugin| plugin.provides_module(module_id),
            |base| base.plugin_by_module(module_id),
        )
    }

    fn find_plugin<'a>(
        &'a self,
        matches_custom: impl Fn(&IdePlugin) -> bool,
        find_bundled: impl FnOnce(&'a BaseLayer) -> Option<&'a Arc<IdePlugin>>,
    ) -> Option<Arc<IdePlugin>> {
        for snapshot in self.snapshot.chain() {
            match &snapshot.layer {
                Layer::Expanded { plugin, .. } if matches_custom(plugin) => {
                    return Some(Arc::clone(plugin))
                }
                Layer::Expanded { .. } => continue,
                Layer::Base(base) => return find_bundled(base).cloned(),
            }
        }
        None
    }

    /// Returns a new IDE with `plugin` added as the newest custom plugin.
    /// The receiver and its cached resolver are left untouched.
    pub fn get_expanded_ide(&self, plugin: Arc<IdePlugin>) -> Ide {
        Ide {
            snapshot: Arc::new(Snapshot {
                version: self.snapshot.version.clone(),
                layer: Layer::Expanded {
                    parent: Arc::clone(&self.snapshot),
                    plugin,
                },
                resolver: OnceLock::new(),
            }),
        }
    }

    /// Resolver over every classpath of this IDE: custom plugins newest
    /// first, then bundled plugins in order, then the platform.
    pub fn get_resolver(&self) -> Arc<dyn Resolver> {
        Arc::clone(self.snapshot.resolver())
    }
}

impl fmt::Debug for Ide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bundled: Vec<&str> = self.bundled_plugins().iter().map(|p| p.id()).collect();
        let custom: Vec<String> = self
            .custom_plugins()
            .iter()
            .map(|p| p.id().to_string())
            .collect();
        f.debug_struct("Ide")
            .field("version", self.version())
            .field("bundled", &bundled)
            .field("custom", &custom)
            .finish()
    }
}
