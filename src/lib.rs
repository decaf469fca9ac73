//! `license_detect` — find license files in a module archive and recognize their text.
//!
//! # Flow
//! 1. Open the file collection ([`archive`]): a directory, a zip, or an in-memory map.
//! 2. Pick license-shaped files outside vendored trees ([`detector`]).
//! 3. Classify each file against the reference corpus ([`license::classifier`]).
//! 4. Return one [`models::License`] per file, classified or not.
//!
//! ```no_run
//! use license_detect::archive::DirArchive;
//! use license_detect::detector::detect;
//!
//! let archive = DirArchive::new("/tmp/modules");
//! for license in detect("rsc.io/quote@v1.4.1", &archive)? {
//!     println!("{} {:?}", license.metadata.file_path, license.metadata.types);
//! }
//! # Ok::<(), license_detect::error::ScanError>(())
//! ```

pub mod archive;
pub mod config;
pub mod detector;
pub mod error;
pub mod fetch;
pub mod license;
pub mod models;
