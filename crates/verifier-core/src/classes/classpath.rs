use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::classes::directory::DirectoryResolver;
use crate::classes::jar::JarResolver;
use crate::classes::resolver::{ReadMode, Resolver, ResolverError};
use crate::classes::union::union;

/// Opens classpath entries as one resolver, preserving their order.
///
/// A directory contributes its own class tree first, then every archive
/// directly inside it in file-name order (the layout of an unpacked IDE or
/// plugin `lib/` folder). Archives are opened directly.
pub fn open_classpath(paths: &[PathBuf], mode: ReadMode) -> Result<Arc<dyn Resolver>, ResolverError> {
    let mut layers: Vec<Arc<dyn Resolver>> = Vec::new();
    for path in paths {
        open_entry(path, mode, &mut layers)?;
    }
    debug!(
        "Opened classpath of {} entries as {} layers",
        paths.len(),
        layers.len()
    );
    Ok(union(layers))
}

fn open_entry(
    path: &Path,
    mode: ReadMode,
    layers: &mut Vec<Arc<dyn Resolver>>,
) -> Result<(), ResolverError> {
    if path.is_dir() {
        layers.push(Arc::new(DirectoryResolver::open(path, mode)?));

        let entries = fs::read_dir(path).map_err(|source| ResolverError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archives = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ResolverError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let entry_path = entry.path();
            if entry_path.is_file() && is_archive(&entry_path) {
                archives.push(entry_path);
            }
        }
        archives.sort();
        for archive in archives {
            layers.push(Arc::new(JarResolver::open(archive, mode)?));
        }
        return Ok(());
    }

    if path.is_file() && is_archive(path) {
        layers.push(Arc::new(JarResolver::open(path, mode)?));
        return Ok(());
    }

    if !path.exists() {
        return Err(ResolverError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
        });
    }

    Err(ResolverError::UnsupportedPath {
        path: path.to_path_buf(),
    })
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}
