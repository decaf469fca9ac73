//! Report renderers for license scan results.
//!
//! - [`terminal`] — colored per-target tables with a summary box; respects `--verbose` / `--quiet`.
//! - [`json`] — pretty-printed [`ScanReport`](license_detect::models::ScanReport) list.

pub mod json;
pub mod terminal;
