use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a scan. A scan either sees every candidate file or
/// returns one of these; there are no partial results.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("cannot open zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("cannot read {path}: {source}")]
    Entry {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("potential license file {path} is {size} bytes, over the {limit} byte limit")]
    TooLarge { path: String, size: u64, limit: u64 },

    #[error("{} is neither a directory nor a zip archive", .0.display())]
    UnsupportedArchive(PathBuf),

    #[error("scan cancelled")]
    Cancelled,
}
