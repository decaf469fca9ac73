use serde::{Deserialize, Serialize};

/// Family a reference license text belongs to.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LicenseType {
    Apache,
    BSD,
    ISC,
    MIT,
    Unlicense,
    Zlib,
    Other,
    #[default]
    Unknown,
}

impl std::fmt::Display for LicenseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseType::Apache => write!(f, "Apache"),
            LicenseType::BSD => write!(f, "BSD"),
            LicenseType::ISC => write!(f, "ISC"),
            LicenseType::MIT => write!(f, "MIT"),
            LicenseType::Unlicense => write!(f, "Unlicense"),
            LicenseType::Zlib => write!(f, "Zlib"),
            LicenseType::Other => write!(f, "Other"),
            LicenseType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One reference license recognized inside a scanned text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Corpus name, e.g. `"MIT"` or `"BSD-0-Clause"`.
    pub name: String,
    #[serde(rename = "type")]
    pub license_type: LicenseType,
    /// Share of the reference text found in the input, 0–100.
    pub percent: f64,
    /// Byte offset of the first aligned word.
    pub start: usize,
    /// Byte offset just past the last aligned word.
    pub end: usize,
}

/// Classification result for one text.
///
/// The zero value (no matches, 0%) means nothing in the corpus was recognized.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Coverage {
    /// Share of the input's words covered by the union of all match spans, 0–100.
    pub percent: f64,
    /// Matches in the order they appear in the input.
    #[serde(rename = "match", default)]
    pub matches: Vec<Match>,
}

impl Coverage {
    pub fn is_zero(&self) -> bool {
        self.matches.is_empty() && self.percent == 0.0
    }
}

/// A detected license file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Distinct match names, sorted. Empty when the file could not be
    /// classified with enough coverage.
    #[serde(default)]
    pub types: Vec<String>,
    /// Path relative to the scan root, with the archive prefix removed.
    pub file_path: String,
    pub coverage: Coverage,
}

/// A detected license file together with its raw contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    #[serde(flatten)]
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub contents: Option<String>,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl License {
    pub fn new(metadata: Metadata, bytes: Vec<u8>) -> Self {
        Self {
            metadata,
            contents: None,
            bytes,
        }
    }

    /// Copy the raw bytes into `contents` so serializers include them.
    pub fn with_contents(mut self) -> Self {
        self.contents = Some(String::from_utf8_lossy(&self.bytes).into_owned());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyVerdict {
    Pass,
    Warn,
    Error,
}

impl std::fmt::Display for PolicyVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyVerdict::Pass => write!(f, "pass"),
            PolicyVerdict::Warn => write!(f, "warn"),
            PolicyVerdict::Error => write!(f, "error"),
        }
    }
}

/// Everything learned about one scan target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// The target as given on the command line.
    pub target: String,
    /// Prefix stripped from reported paths.
    pub prefix: String,
    pub licenses: Vec<License>,
    /// Verdict per license file, parallel to `licenses`.
    pub verdicts: Vec<PolicyVerdict>,
    /// Most restrictive verdict for the whole target.
    pub verdict: PolicyVerdict,
}
