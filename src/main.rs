//! `license-detect` — find license files in module archives, classify them, and apply policy.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load config ([`load_config`]).
//! 3. Resolve each target: local path, zip URL, or `module@version` from the proxy ([`fetch`]).
//! 4. Detect and classify license files ([`Detector`]), several targets at a time.
//! 5. Apply policy ([`license_verdict`], [`target_verdict`]).
//! 6. Render the requested report ([`report`]).
//! 7. Exit `0` (clean) or `1` (at least one [`PolicyVerdict::Error`]).

mod cli;
mod report;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;

use cli::{Cli, ReportFormat};
use license_detect::archive::{self, Archive, ZipArchive};
use license_detect::config::{license_verdict, load_config, target_verdict};
use license_detect::detector::{sort_by_path, Detector};
use license_detect::fetch::{self, Source, Target};
use license_detect::license::classifier::Classifier;
use license_detect::license::corpus::Corpus;
use license_detect::models::{License, PolicyVerdict, ScanReport};

/// Targets resolved and scanned concurrently.
const BATCH_SIZE: usize = 8;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config = load_config(cli.config.as_deref())?;
    let threshold = cli
        .threshold
        .unwrap_or(config.detection.coverage_threshold);
    let proxy = cli.proxy.clone().unwrap_or_else(|| config.fetch.proxy.clone());

    let classifier = Classifier::new(Corpus::builtin()).with_floor(config.detection.match_floor);
    let detector = Arc::new(
        Detector::new(classifier)
            .with_coverage_threshold(threshold)
            .with_max_file_size(config.detection.max_file_size),
    );

    // Ctrl-C stops scans between files
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                running.store(false, Ordering::SeqCst);
            }
        });
    }

    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

    let pb = if !cli.quiet {
        let pb = ProgressBar::new(cli.targets.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut reports = Vec::with_capacity(cli.targets.len());

    for batch in cli.targets.chunks(BATCH_SIZE) {
        let futures: Vec<_> = batch
            .iter()
            .map(|raw| {
                scan_target(
                    &client,
                    &proxy,
                    raw,
                    cli.prefix.as_deref(),
                    Arc::clone(&detector),
                    Arc::clone(&running),
                )
            })
            .collect();

        let results = join_all(futures).await;

        for (raw, result) in batch.iter().zip(results) {
            let (prefix, licenses) = result?;
            let verdicts: Vec<PolicyVerdict> = licenses
                .iter()
                .map(|l| license_verdict(&config, &l.metadata))
                .collect();
            let verdict = target_verdict(&config, &verdicts);

            if let Some(pb) = &pb {
                pb.println(format!(
                    "  {} {} {} license files",
                    "→".cyan(),
                    raw,
                    licenses.len()
                ));
                pb.inc(1);
            }

            reports.push(ScanReport {
                target: raw.clone(),
                prefix,
                licenses,
                verdicts,
                verdict,
            });
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let has_errors = reports.iter().any(|r| r.verdict == PolicyVerdict::Error);

    match cli.report {
        ReportFormat::Terminal => {
            report::terminal::render(&reports, threshold, cli.verbose, cli.quiet)?;
        }
        ReportFormat::Json => {
            report::json::render(reports, cli.contents)?;
        }
    }

    if has_errors {
        std::process::exit(1);
    }

    Ok(())
}

/// Resolve one target, then detect its license files on the blocking pool.
/// Returns the prefix used and the licenses sorted by path.
async fn scan_target(
    client: &Client,
    proxy: &str,
    raw: &str,
    prefix_override: Option<&str>,
    detector: Arc<Detector>,
    running: Arc<AtomicBool>,
) -> Result<(String, Vec<License>)> {
    let target = Target::parse(raw);
    let resolved = fetch::resolve(client, proxy, &target)
        .await
        .with_context(|| format!("resolving {}", raw))?;

    let prefix = prefix_override
        .map(str::to_string)
        .unwrap_or(resolved.prefix);
    let scan_prefix = prefix.clone();
    let source = resolved.source;

    let licenses = tokio::task::spawn_blocking(move || {
        let archive: Box<dyn Archive + Send> = match source {
            Source::Path(path) => archive::open(&path)?,
            Source::Zip(bytes) => Box::new(ZipArchive::from_bytes(bytes)?),
        };
        let mut licenses = detector.detect_until(&scan_prefix, archive.as_ref(), &running)?;
        sort_by_path(&mut licenses);
        Ok::<_, license_detect::error::ScanError>(licenses)
    })
    .await?
    .with_context(|| format!("scanning {}", raw))?;

    Ok((prefix, licenses))
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else if quiet {
        tracing::Level::ERROR
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}
