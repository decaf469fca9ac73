use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::LazyLock;

use regex::Regex;

use crate::archive::Archive;
use crate::error::ScanError;
use crate::license::classifier::Classifier;
use crate::license::corpus::Corpus;
use crate::models::{License, Metadata};

/// Coverage at or above which a file's matches are reported as its license types.
pub const DEFAULT_COVERAGE_THRESHOLD: f64 = 90.0;

/// Largest candidate file the detector will read.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10_000_000;

/// Base names that mark a license file, matched against the whole name.
static LICENSE_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:copying|unlicen[cs]e|mit[-_]licen[cs]e|licen[cs]e(?:-mit|-apache|\.mit|-2\.0)?)(?:\.(?:md|markdown|txt|rst))?$",
    )
    .expect("valid regex")
});

/// Finds license files in an archive and classifies each one.
#[derive(Debug, Clone)]
pub struct Detector {
    classifier: Classifier,
    coverage_threshold: f64,
    max_file_size: u64,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(Classifier::new(Corpus::builtin()))
    }
}

impl Detector {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            coverage_threshold: DEFAULT_COVERAGE_THRESHOLD,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_coverage_threshold(mut self, threshold: f64) -> Self {
        self.coverage_threshold = threshold;
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn coverage_threshold(&self) -> f64 {
        self.coverage_threshold
    }

    /// Detect license files under `prefix` in `archive`.
    ///
    /// Every file whose name passes [`is_license_file_name`] and which does
    /// not sit inside a vendored dependency yields one [`License`], even when
    /// its text matches nothing known. Reported paths have `prefix/` removed.
    /// Output follows archive order; use [`sort_by_path`] for a stable order.
    pub fn detect(&self, prefix: &str, archive: &dyn Archive) -> Result<Vec<License>, ScanError> {
        self.detect_until(prefix, archive, &AtomicBool::new(true))
    }

    /// Like [`Detector::detect`], but stops with [`ScanError::Cancelled`] once
    /// `running` turns false. Checked between files, never mid-classification.
    pub fn detect_until(
        &self,
        prefix: &str,
        archive: &dyn Archive,
        running: &AtomicBool,
    ) -> Result<Vec<License>, ScanError> {
        let mut licenses = Vec::new();

        for entry in archive.entries()? {
            if !running.load(Ordering::SeqCst) {
                return Err(ScanError::Cancelled);
            }

            let Some(file_path) = strip_prefix(prefix, &entry.path) else {
                tracing::trace!("{} is outside {}", entry.path, prefix);
                continue;
            };
            if !is_license_file_name(base_name(file_path)) {
                continue;
            }
            if is_vendored(file_path) {
                tracing::debug!("Skipping vendored license file {}", file_path);
                continue;
            }
            if entry.size > self.max_file_size {
                return Err(ScanError::TooLarge {
                    path: entry.path.clone(),
                    size: entry.size,
                    limit: self.max_file_size,
                });
            }

            let contents = archive.read(&entry)?;
            let metadata = self.metadata(file_path, &contents);
            tracing::info!(
                "{}: {:?} ({:.1}% coverage)",
                metadata.file_path,
                metadata.types,
                metadata.coverage.percent
            );
            licenses.push(License::new(metadata, contents));
        }

        Ok(licenses)
    }

    /// Classify one license file's contents.
    pub fn metadata(&self, file_path: &str, contents: &[u8]) -> Metadata {
        let coverage = self.classifier.classify(contents);

        let mut types: Vec<String> = if coverage.percent >= self.coverage_threshold {
            coverage.matches.iter().map(|m| m.name.clone()).collect()
        } else {
            Vec::new()
        };
        types.sort();
        types.dedup();

        Metadata {
            types,
            file_path: file_path.to_string(),
            coverage,
        }
    }
}

/// Detect license files with the built-in corpus and default thresholds.
pub fn detect(prefix: &str, archive: &dyn Archive) -> Result<Vec<License>, ScanError> {
    Detector::default().detect(prefix, archive)
}

/// Whether `name` (a base name, no directories) is a recognized license file name.
pub fn is_license_file_name(name: &str) -> bool {
    LICENSE_FILE_NAME.is_match(name)
}

/// Whether `path` lies inside a vendored dependency: some `vendor` directory
/// has at least one more directory below it before the file.
///
/// `pkg/vendor/LICENSE` belongs to a package named `vendor` and is kept;
/// `vendor/pkg/LICENSE` belongs to a vendored copy of `pkg` and is not.
pub fn is_vendored(path: &str) -> bool {
    let dirs: Vec<&str> = path.split('/').collect();
    let dirs = &dirs[..dirs.len().saturating_sub(1)];
    dirs.iter()
        .enumerate()
        .any(|(i, d)| *d == "vendor" && i + 1 < dirs.len())
}

/// `path` relative to `prefix`, or `None` if it lies outside it.
pub fn strip_prefix<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return Some(path);
    }
    path.strip_prefix(prefix)?.strip_prefix('/')
}

/// Order licenses by reported file path.
pub fn sort_by_path(licenses: &mut [License]) {
    licenses.sort_by(|a, b| a.metadata.file_path.cmp(&b.metadata.file_path));
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
