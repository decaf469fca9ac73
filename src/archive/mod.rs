//! Hierarchical file collections the detector can scan.
//!
//! - [`dir`] — a directory tree on disk.
//! - [`zipfile`] — a zip container, from a file or downloaded bytes.
//! - [`memory`] — an in-memory path → bytes map.

use std::io::Read;
use std::path::Path;

use crate::error::ScanError;

pub mod dir;
pub mod memory;
pub mod zipfile;

pub use dir::DirArchive;
pub use memory::MemoryArchive;
pub use zipfile::ZipArchive;

/// Magic bytes at the start of every zip local file header.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// A file inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Archive-absolute path with `/` separators.
    pub path: String,
    /// Uncompressed size in bytes.
    pub size: u64,
}

/// Read-only access to a hierarchical file collection.
pub trait Archive {
    /// Every regular file in the archive, in no particular order.
    fn entries(&self) -> Result<Vec<Entry>, ScanError>;

    /// The full contents of one entry returned by [`Archive::entries`].
    fn read(&self, entry: &Entry) -> Result<Vec<u8>, ScanError>;
}

/// Open a directory or zip file as an archive.
pub fn open(path: &Path) -> Result<Box<dyn Archive + Send>, ScanError> {
    if path.is_dir() {
        return Ok(Box::new(DirArchive::new(path)));
    }

    let is_zip = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
        || has_zip_magic(path);

    if is_zip {
        Ok(Box::new(ZipArchive::open(path)?))
    } else {
        Err(ScanError::UnsupportedArchive(path.to_path_buf()))
    }
}

fn has_zip_magic(path: &Path) -> bool {
    let mut magic = [0u8; 4];
    std::fs::File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .is_ok_and(|_| magic == ZIP_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("LICENSE"), "text").unwrap();

        let archive = open(dir.path()).unwrap();
        let entries = archive.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "LICENSE");
    }

    #[test]
    fn test_open_zip_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("module-download");
        let bytes = zipfile::tests::zip_bytes(&[("m@v1/LICENSE", "text")]);
        std::fs::write(&path, bytes).unwrap();

        let archive = open(&path).unwrap();
        assert_eq!(archive.entries().unwrap()[0].path, "m@v1/LICENSE");
    }

    #[test]
    fn test_open_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "plain text").unwrap();

        assert!(matches!(open(&path), Err(ScanError::UnsupportedArchive(_))));
    }

    #[test]
    fn test_open_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open(&dir.path().join("nope")).is_err());
    }
}
