use std::collections::BTreeMap;
use std::io::ErrorKind;

use super::{Archive, Entry};
use crate::error::ScanError;

/// Paths mapped to contents, for archives assembled in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), contents.into());
    }
}

impl<P, C> FromIterator<(P, C)> for MemoryArchive
where
    P: Into<String>,
    C: Into<Vec<u8>>,
{
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut archive = MemoryArchive::new();
        for (path, contents) in iter {
            archive.insert(path, contents);
        }
        archive
    }
}

impl Archive for MemoryArchive {
    fn entries(&self) -> Result<Vec<Entry>, ScanError> {
        Ok(self
            .files
            .iter()
            .map(|(path, contents)| Entry {
                path: path.clone(),
                size: contents.len() as u64,
            })
            .collect())
    }

    fn read(&self, entry: &Entry) -> Result<Vec<u8>, ScanError> {
        self.files
            .get(&entry.path)
            .cloned()
            .ok_or_else(|| ScanError::Entry {
                path: entry.path.clone(),
                source: ErrorKind::NotFound.into(),
            })
    }
}
