use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use license_detect::models::{License, PolicyVerdict, ScanReport};

/// Render a colored terminal report.
pub fn render(reports: &[ScanReport], threshold: f64, verbose: bool, quiet: bool) -> Result<()> {
    let files: usize = reports.iter().map(|r| r.licenses.len()).sum();
    let classified = reports
        .iter()
        .flat_map(|r| &r.licenses)
        .filter(|l| !l.metadata.types.is_empty())
        .count();
    let count = |v: PolicyVerdict| reports.iter().filter(|r| r.verdict == v).count();
    let (pass_count, warn_count, error_count) = (
        count(PolicyVerdict::Pass),
        count(PolicyVerdict::Warn),
        count(PolicyVerdict::Error),
    );

    if quiet {
        println!(
            "Targets: {}  Files: {}  Pass: {}  Warn: {}  Error: {}",
            reports.len(),
            files,
            pass_count.to_string().green(),
            warn_count.to_string().yellow(),
            error_count.to_string().red(),
        );
        return Ok(());
    }

    println!(
        "\n {} v{}\n",
        "license-detect".bold(),
        env!("CARGO_PKG_VERSION")
    );

    for report in reports {
        let heading = if report.prefix.is_empty() {
            report.target.clone()
        } else {
            format!("{} ({})", report.target, report.prefix)
        };
        println!(" {} {}\n", verdict_tag(report.verdict), heading.bold());

        if report.licenses.is_empty() {
            println!("   No license files found.\n");
            continue;
        }
        render_table(report, threshold, verbose);
        println!();
    }

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Targets scanned    : {}", reports.len()));
    println!(
        " │  {:<48} │",
        format!("License files      : {} ({} classified)", files, classified)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Pass            : {:>4}", "✓".green(), pass_count)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Warn            : {:>4}", "⚠".yellow(), warn_count)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Error           : {:>4}", "✗".red(), error_count)
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    Ok(())
}

fn render_table(report: &ScanReport, threshold: f64, verbose: bool) {
    let mut table = Table::new();
    let mut header = vec![
        Cell::new("File").add_attribute(Attribute::Bold),
        Cell::new("Types").add_attribute(Attribute::Bold),
        Cell::new("Coverage").add_attribute(Attribute::Bold),
    ];
    if verbose {
        header.push(Cell::new("Matches").add_attribute(Attribute::Bold));
    }
    header.push(Cell::new("Verdict").add_attribute(Attribute::Bold));

    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for (license, verdict) in report.licenses.iter().zip(&report.verdicts) {
        let (verdict_str, verdict_color) = match verdict {
            PolicyVerdict::Pass => ("✓ pass", Color::Green),
            PolicyVerdict::Warn => ("⚠ warn", Color::Yellow),
            PolicyVerdict::Error => ("✗ error", Color::Red),
        };

        let coverage = license.metadata.coverage.percent;
        let coverage_color = if coverage >= threshold {
            Color::Green
        } else if coverage > 0.0 {
            Color::Yellow
        } else {
            Color::DarkGrey
        };

        let mut row = vec![
            Cell::new(&license.metadata.file_path),
            Cell::new(types_label(license)),
            Cell::new(format!("{:.1}%", coverage))
                .fg(coverage_color)
                .set_alignment(CellAlignment::Right),
        ];
        if verbose {
            row.push(Cell::new(matches_label(license)));
        }
        row.push(
            Cell::new(verdict_str)
                .fg(verdict_color)
                .set_alignment(CellAlignment::Center),
        );
        table.add_row(row);
    }

    println!("{}", table);
}

fn verdict_tag(verdict: PolicyVerdict) -> ColoredString {
    match verdict {
        PolicyVerdict::Pass => "[PASS]".green().bold(),
        PolicyVerdict::Warn => "[WARN]".yellow().bold(),
        PolicyVerdict::Error => "[ERROR]".red().bold(),
    }
}

fn types_label(license: &License) -> String {
    if license.metadata.types.is_empty() {
        "unknown".to_string()
    } else {
        license.metadata.types.join(", ")
    }
}

fn matches_label(license: &License) -> String {
    license
        .metadata
        .coverage
        .matches
        .iter()
        .map(|m| format!("{} {:.0}% [{}..{}]", m.name, m.percent, m.start, m.end))
        .collect::<Vec<_>>()
        .join("\n")
}
