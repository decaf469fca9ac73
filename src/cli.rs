use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "license-detect",
    about = "Detect and classify license files inside module archives",
    version
)]
pub struct Cli {
    /// Directories, zip files, zip URLs or module@version to scan
    #[arg(default_value = ".", value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Path prefix to strip from reported file paths [default: module@version for module targets]
    #[arg(long)]
    pub prefix: Option<String>,

    /// Config file [default: ./.license-detect/config.toml, fallback ~/.config/license-detect/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Coverage percent at which matched licenses are reported as the file's types
    #[arg(long, value_name = "PERCENT")]
    pub threshold: Option<f64>,

    /// Module proxy used for module@version targets
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Include license file contents in JSON output
    #[arg(long)]
    pub contents: bool,

    /// Show match details and debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}
