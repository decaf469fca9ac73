use anyhow::Result;

use license_detect::models::ScanReport;

/// Print every report as one JSON array. License texts are included only
/// when `contents` is set.
pub fn render(reports: Vec<ScanReport>, contents: bool) -> Result<()> {
    let reports: Vec<ScanReport> = if contents {
        reports
            .into_iter()
            .map(|mut r| {
                r.licenses = r.licenses.into_iter().map(|l| l.with_contents()).collect();
                r
            })
            .collect()
    } else {
        reports
    };

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
