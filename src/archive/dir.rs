use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{Archive, Entry};
use crate::error::ScanError;

/// A directory tree on disk. Entry paths are relative to the root.
#[derive(Debug, Clone)]
pub struct DirArchive {
    root: PathBuf,
}

impl DirArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Archive for DirArchive {
    fn entries(&self) -> Result<Vec<Entry>, ScanError> {
        let mut entries = Vec::new();

        for item in WalkDir::new(&self.root) {
            let item = item.map_err(|source| ScanError::Walk {
                path: self.root.clone(),
                source,
            })?;
            if !item.file_type().is_file() {
                continue;
            }

            let relative = item.path().strip_prefix(&self.root).unwrap_or(item.path());
            let path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let size = item
                .metadata()
                .map_err(|source| ScanError::Walk {
                    path: item.path().to_path_buf(),
                    source,
                })?
                .len();

            entries.push(Entry { path, size });
        }

        Ok(entries)
    }

    fn read(&self, entry: &Entry) -> Result<Vec<u8>, ScanError> {
        std::fs::read(self.root.join(&entry.path)).map_err(|source| ScanError::Entry {
            path: entry.path.clone(),
            source,
        })
    }
}
