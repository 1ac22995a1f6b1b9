use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::classes::resolver::{
    class_file_path, class_name_of_entry, read_class_node, ReadMode, ResolutionResult, Resolver,
    ResolverError,
};

/// Byte source backed by a directory tree of `.class` files laid out by
/// package. Class names are indexed when the directory is opened; bytes
/// are read on resolution.
#[derive(Debug)]
pub struct DirectoryResolver {
    root: PathBuf,
    mode: ReadMode,
    classes: BTreeSet<String>,
}

impl DirectoryResolver {
    pub fn open(root: impl Into<PathBuf>, mode: ReadMode) -> Result<Self, ResolverError> {
        let root = root.into();
        let mut classes = BTreeSet::new();
        collect_classes(&root, &root, &mut classes)?;
        debug!(
            "Indexed {} classes under directory {}",
            classes.len(),
            root.display()
        );
        Ok(Self {
            root,
            mode,
            classes,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn collect_classes(
    root: &Path,
    dir: &Path,
    out: &mut BTreeSet<String>,
) -> Result<(), ResolverError> {
    let entries = fs::read_dir(dir).map_err(|source| ResolverError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| ResolverError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_classes(root, &path, out)?;
            continue;
        }

        let relative = match path.strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let entry_name = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if let Some(class_name) = class_name_of_entry(&entry_name) {
            out.insert(class_name);
        }
    }

    Ok(())
}

impl Resolver for DirectoryResolver {
    fn resolve_class(&self, class_name: &str) -> ResolutionResult {
        if !self.classes.contains(class_name) {
            return ResolutionResult::NotFound;
        }
        let path = self.root.join(class_file_path(class_name));
        match fs::read(&path) {
            Ok(bytes) => read_class_node(class_name, &bytes, self.mode),
            Err(err) => ResolutionResult::FailedToRead(format!("{}: {}", path.display(), err)),
        }
    }

    fn contains_class(&self, class_name: &str) -> bool {
        self.classes.contains(class_name)
    }

    fn all_classes(&self) -> BTreeSet<String> {
        self.classes.clone()
    }
}
