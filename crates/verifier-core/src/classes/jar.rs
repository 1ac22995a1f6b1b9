use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;
use zip::ZipArchive;

use crate::classes::resolver::{
    class_name_of_entry, read_class_node, ReadMode, ResolutionResult, Resolver, ResolverError,
};

/// Byte source backed by a `.jar` or `.zip` archive. The central directory
/// is indexed when the archive is opened; entries are inflated on
/// resolution.
pub struct JarResolver {
    path: PathBuf,
    mode: ReadMode,
    /// Class name to archive entry name.
    entries: BTreeMap<String, String>,
    archive: Mutex<ZipArchive<BufReader<File>>>,
}

impl JarResolver {
    pub fn open(path: impl Into<PathBuf>, mode: ReadMode) -> Result<Self, ResolverError> {
        let path = path.into();
        let file = File::open(&path).map_err(|source| ResolverError::Io {
            path: path.clone(),
            source,
        })?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|source| ResolverError::Zip {
            path: path.clone(),
            source,
        })?;

        let mut entries = BTreeMap::new();
        for entry_name in archive.file_names() {
            if let Some(class_name) = class_name_of_entry(entry_name) {
                entries.insert(class_name, entry_name.to_string());
            }
        }
        debug!("Indexed {} classes in archive {}", entries.len(), path.display());

        Ok(Self {
            path,
            mode,
            entries,
            archive: Mutex::new(archive),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entry(&self, entry_name: &str) -> Result<Vec<u8>, String> {
        let mut archive = self
            .archive
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entry = archive
            .by_name(entry_name)
            .map_err(|err| format!("{}!{}: {}", self.path.display(), entry_name, err))?;
        let mut buffer = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buffer)
            .map_err(|err| format!("{}!{}: {}", self.path.display(), entry_name, err))?;
        Ok(buffer)
    }
}

impl Resolver for JarResolver {
    fn resolve_class(&self, class_name: &str) -> ResolutionResult {
        let Some(entry_name) = self.entries.get(class_name) else {
            return ResolutionResult::NotFound;
        };
        match self.read_entry(entry_name) {
            Ok(bytes) => read_class_node(class_name, &bytes, self.mode),
            Err(reason) => ResolutionResult::FailedToRead(reason),
        }
    }

    fn contains_class(&self, class_name: &str) -> bool {
        self.entries.contains_key(class_name)
    }

    fn all_classes(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }
}
