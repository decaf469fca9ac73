use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use super::{Archive, Entry};
use crate::error::ScanError;

type Reader = Cursor<Arc<[u8]>>;

/// A zip container held in memory.
///
/// The parsed central directory is cloned per read, which shares the
/// underlying bytes, so `&self` reads stay cheap.
#[derive(Debug, Clone)]
pub struct ZipArchive {
    inner: zip::ZipArchive<Reader>,
}

impl ZipArchive {
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self, ScanError> {
        let inner = zip::ZipArchive::new(Cursor::new(bytes.into()))?;
        Ok(Self { inner })
    }

    pub fn open(path: &Path) -> Result<Self, ScanError> {
        let bytes = std::fs::read(path).map_err(|source| ScanError::Entry {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(bytes)
    }
}

impl Archive for ZipArchive {
    fn entries(&self) -> Result<Vec<Entry>, ScanError> {
        let mut zip = self.inner.clone();
        let mut entries = Vec::with_capacity(zip.len());

        for i in 0..zip.len() {
            let file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            entries.push(Entry {
                path: file.name().to_string(),
                size: file.size(),
            });
        }

        Ok(entries)
    }

    fn read(&self, entry: &Entry) -> Result<Vec<u8>, ScanError> {
        let to_entry_error = |source| ScanError::Entry {
            path: entry.path.clone(),
            source,
        };

        let mut zip = self.inner.clone();
        let mut file = zip
            .by_name(&entry.path)
            .map_err(|e| to_entry_error(std::io::Error::other(e)))?;

        // The header's size can understate what the stream inflates to
        let mut contents = Vec::with_capacity(entry.size as usize);
        (&mut file)
            .take(entry.size.saturating_add(1))
            .read_to_end(&mut contents)
            .map_err(to_entry_error)?;
        if contents.len() as u64 > entry.size {
            return Err(ScanError::TooLarge {
                path: entry.path.clone(),
                size: contents.len() as u64,
                limit: entry.size,
            });
        }
        Ok(contents)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use super::*;

    /// Build a stored (uncompressed) zip holding `files`.
    pub(crate) fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        for (name, contents) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_entries_and_read() {
        let bytes = zip_bytes(&[
            ("rsc.io/quote@v1.4.1/LICENSE", "license"),
            ("rsc.io/quote@v1.4.1/quote.go", "package quote"),
        ]);
        let archive = ZipArchive::from_bytes(bytes).unwrap();

        let entries = archive.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "rsc.io/quote@v1.4.1/LICENSE");
        assert_eq!(entries[0].size, 7);
        assert_eq!(archive.read(&entries[0]).unwrap(), b"license");
    }

    /// Rewrite every header's uncompressed size field to `size`.
    fn understate_sizes(bytes: &mut [u8], size: u32) {
        for i in 0..bytes.len().saturating_sub(4) {
            let field = match &bytes[i..i + 4] {
                b"PK\x03\x04" => i + 22,
                b"PK\x01\x02" => i + 24,
                _ => continue,
            };
            bytes[field..field + 4].copy_from_slice(&size.to_le_bytes());
        }
    }

    #[test]
    fn test_stream_longer_than_header() {
        let mut bytes = zip_bytes(&[("LICENSE", "much more than three bytes")]);
        understate_sizes(&mut bytes, 3);
        let archive = ZipArchive::from_bytes(bytes).unwrap();

        let entries = archive.entries().unwrap();
        assert_eq!(entries[0].size, 3);
        match archive.read(&entries[0]) {
            Err(ScanError::TooLarge { path, size, limit }) => {
                assert_eq!(path, "LICENSE");
                assert_eq!(size, 4);
                assert_eq!(limit, 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_bytes() {
        assert!(matches!(
            ZipArchive::from_bytes(b"not a zip".to_vec()),
            Err(ScanError::Zip(_))
        ));
    }

    #[test]
    fn test_read_unknown_entry() {
        let archive = ZipArchive::from_bytes(zip_bytes(&[("LICENSE", "x")])).unwrap();
        let missing = Entry {
            path: "COPYING".to_string(),
            size: 1,
        };
        assert!(matches!(
            archive.read(&missing),
            Err(ScanError::Entry { .. })
        ));
    }
}
