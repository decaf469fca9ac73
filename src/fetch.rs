//! Resolve scan targets and download remote archives.
//!
//! A target is a local path, an `http(s)://` URL of a zip, or a
//! `module@version` fetched from a module proxy
//! (`<proxy>/<module>/@v/<version>.zip`). `module@latest` asks the proxy
//! for the newest version first.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use reqwest::Client;

const USER_AGENT: &str = concat!("license-detect/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Local(PathBuf),
    Url(String),
    Module { path: String, version: String },
}

impl Target {
    /// Interpret a command-line target. Existing paths win over module syntax.
    pub fn parse(raw: &str) -> Target {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Target::Url(raw.to_string());
        }
        if Path::new(raw).exists() {
            return Target::Local(PathBuf::from(raw));
        }
        match raw.rsplit_once('@') {
            Some((path, version)) if !path.is_empty() && !version.is_empty() => Target::Module {
                path: path.to_string(),
                version: version.to_string(),
            },
            _ => Target::Local(PathBuf::from(raw)),
        }
    }
}

/// Where a resolved target's archive lives.
#[derive(Debug)]
pub enum Source {
    Path(PathBuf),
    Zip(Vec<u8>),
}

/// A target ready to be opened, with the prefix its files live under.
#[derive(Debug)]
pub struct Resolved {
    pub source: Source,
    pub prefix: String,
}

/// Download whatever `target` needs. Local targets are passed through untouched.
pub async fn resolve(client: &Client, proxy: &str, target: &Target) -> Result<Resolved> {
    match target {
        Target::Local(path) => Ok(Resolved {
            source: Source::Path(path.clone()),
            prefix: String::new(),
        }),
        Target::Url(url) => Ok(Resolved {
            source: Source::Zip(download(client, url).await?),
            prefix: String::new(),
        }),
        Target::Module { path, version } => {
            let version = if version == "latest" {
                latest_version(client, proxy, path).await?
            } else {
                version.clone()
            };
            let url = module_zip_url(proxy, path, &version);
            Ok(Resolved {
                source: Source::Zip(download(client, &url).await?),
                prefix: format!("{}@{}", path, version),
            })
        }
    }
}

/// Proxy URL of the zip for `module` at `version`.
pub fn module_zip_url(proxy: &str, module: &str, version: &str) -> String {
    format!(
        "{}/{}/@v/{}.zip",
        proxy.trim_end_matches('/'),
        escape_path(module),
        escape_path(version)
    )
}

/// Case-encode a module path or version for the proxy: every uppercase
/// letter becomes `!` followed by its lowercase form.
pub fn escape_path(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

async fn latest_version(client: &Client, proxy: &str, module: &str) -> Result<String> {
    let url = format!("{}/{}/@latest", proxy.trim_end_matches('/'), escape_path(module));

    let response = client
        .get(&url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await
        .with_context(|| format!("requesting {}", url))?;

    if !response.status().is_success() {
        bail!("{} returned {}", url, response.status());
    }

    let data: serde_json::Value = response.json().await?;
    data.get("Version")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .with_context(|| format!("{} did not report a version", url))
}

async fn download(client: &Client, url: &str) -> Result<Vec<u8>> {
    tracing::debug!("Downloading {}", url);

    let response = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await
        .with_context(|| format!("requesting {}", url))?;

    if !response.status().is_success() {
        bail!("{} returned {}", url, response.status());
    }

    Ok(response.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_path() {
        assert_eq!(
            escape_path("github.com/BurntSushi/toml"),
            "github.com/!burnt!sushi/toml"
        );
        assert_eq!(escape_path("rsc.io/quote"), "rsc.io/quote");
    }

    #[test]
    fn test_module_zip_url() {
        assert_eq!(
            module_zip_url("https://proxy.golang.org/", "rsc.io/quote", "v1.4.1"),
            "https://proxy.golang.org/rsc.io/quote/@v/v1.4.1.zip"
        );
    }

    #[test]
    fn test_parse_targets() {
        assert_eq!(
            Target::parse("https://example.com/m.zip"),
            Target::Url("https://example.com/m.zip".to_string())
        );
        assert_eq!(
            Target::parse("rsc.io/quote@v1.4.1"),
            Target::Module {
                path: "rsc.io/quote".to_string(),
                version: "v1.4.1".to_string()
            }
        );
        assert_eq!(
            Target::parse("does/not/exist"),
            Target::Local(PathBuf::from("does/not/exist"))
        );
        assert_eq!(
            Target::parse("trailing@"),
            Target::Local(PathBuf::from("trailing@"))
        );
    }

    #[test]
    fn test_existing_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod@v1.0.0");
        std::fs::create_dir(&path).unwrap();
        let raw = path.to_string_lossy().to_string();
        assert_eq!(Target::parse(&raw), Target::Local(path));
    }

    #[tokio::test]
    async fn test_resolve_local_skips_network() {
        let client = Client::new();
        let target = Target::Local(PathBuf::from("."));
        let resolved = resolve(&client, "http://unused.invalid", &target)
            .await
            .unwrap();
        assert!(matches!(resolved.source, Source::Path(_)));
        assert_eq!(resolved.prefix, "");
    }
}
