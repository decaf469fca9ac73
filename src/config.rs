use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::detector::{DEFAULT_COVERAGE_THRESHOLD, DEFAULT_MAX_FILE_SIZE};
use crate::license::classifier::DEFAULT_MATCH_FLOOR;
use crate::models::{Metadata, PolicyVerdict};

/// Policy key for a license file whose text could not be classified.
pub const UNKNOWN_KEY: &str = "unknown";

/// Policy key for a target without any license file.
pub const NONE_KEY: &str = "none";

/// Root configuration structure, deserialized from `.license-detect/config.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detection: DetectionConfig,
    pub fetch: FetchConfig,
    pub policy: PolicyConfig,
}

/// Matching thresholds and limits.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// A file's match names become its license types only at or above this coverage.
    pub coverage_threshold: f64,
    /// Minimum share of a reference text that counts as a match.
    pub match_floor: f64,
    /// Candidate files larger than this abort the scan.
    pub max_file_size: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            coverage_threshold: DEFAULT_COVERAGE_THRESHOLD,
            match_floor: DEFAULT_MATCH_FLOOR,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Module proxy serving `<module>/@v/<version>.zip`.
    pub proxy: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            proxy: "https://proxy.golang.org".to_string(),
        }
    }
}

/// Defines how detected licenses are judged.
#[derive(Debug, Deserialize)]
pub struct PolicyConfig {
    /// Verdict applied to any license not explicitly listed in `licenses`.
    /// Defaults to `warn`.
    #[serde(default = "default_policy_action")]
    pub default: PolicyAction,
    /// Per-license overrides keyed by corpus name (e.g. `"MIT"`, `"BSD-3-Clause"`),
    /// plus the special keys `unknown` and `none`.
    #[serde(default)]
    pub licenses: HashMap<String, PolicyAction>,
}

fn default_policy_action() -> PolicyAction {
    PolicyAction::Warn
}

/// The action to take when a detected license matches a policy rule.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    Pass,
    Warn,
    /// The CLI exits with code 1.
    Error,
}

impl PolicyAction {
    pub fn to_verdict(self) -> PolicyVerdict {
        match self {
            PolicyAction::Pass => PolicyVerdict::Pass,
            PolicyAction::Warn => PolicyVerdict::Warn,
            PolicyAction::Error => PolicyVerdict::Error,
        }
    }
}

impl Default for PolicyConfig {
    /// Every license in the built-in corpus passes; an unclassified license
    /// file warns and a missing license is an error.
    fn default() -> Self {
        let mut licenses = HashMap::new();
        for name in [
            "Apache-2.0",
            "BSD-0-Clause",
            "BSD-2-Clause",
            "BSD-3-Clause",
            "ISC",
            "MIT",
            "Unlicense",
            "Zlib",
        ] {
            licenses.insert(name.to_string(), PolicyAction::Pass);
        }
        licenses.insert(UNKNOWN_KEY.to_string(), PolicyAction::Warn);
        licenses.insert(NONE_KEY.to_string(), PolicyAction::Error);

        PolicyConfig {
            default: PolicyAction::Warn,
            licenses,
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `./.license-detect/config.toml`
/// 3. `~/.config/license-detect/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let local = Path::new(".license-detect").join("config.toml");
    if local.exists() {
        return read_config(&local);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("license-detect")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    tracing::debug!("No config file found, using built-in defaults");
    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("parsing config {}", path.display()))?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Verdict for a single license file: the most restrictive action among its
/// types, or the `unknown` action when it has none.
pub fn license_verdict(config: &Config, metadata: &Metadata) -> PolicyVerdict {
    if metadata.types.is_empty() {
        return lookup(config, UNKNOWN_KEY);
    }
    metadata
        .types
        .iter()
        .map(|t| lookup(config, t))
        .max()
        .unwrap_or(PolicyVerdict::Pass)
}

/// Verdict for a whole target: the most restrictive of its files, or the
/// `none` action when it has no license files.
pub fn target_verdict(config: &Config, verdicts: &[PolicyVerdict]) -> PolicyVerdict {
    verdicts
        .iter()
        .copied()
        .max()
        .unwrap_or_else(|| lookup(config, NONE_KEY))
}

fn lookup(config: &Config, key: &str) -> PolicyVerdict {
    config
        .policy
        .licenses
        .get(key)
        .copied()
        .unwrap_or(config.policy.default)
        .to_verdict()
}
