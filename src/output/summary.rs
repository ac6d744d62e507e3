//! Run summary rendering
//!
//! Turns a [`RunSummary`] into the report printed at the end of a run.

use crate::pipeline::{RunSummary, Skip, Stage};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Skips grouped by kind, in a stable order
pub fn group_skips(skips: &[Skip]) -> BTreeMap<&'static str, usize> {
    let mut groups = BTreeMap::new();
    for skip in skips {
        *groups.entry(skip.reason.kind()).or_insert(0) += 1;
    }
    groups
}

/// Renders the run summary as plain text
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let elapsed = summary.finished_at - summary.started_at;

    // Writing to a String never fails
    let _ = writeln!(out, "=== Run Summary ===\n");
    let _ = writeln!(out, "Started:  {}", summary.started_at.to_rfc3339());
    let _ = writeln!(out, "Finished: {}", summary.finished_at.to_rfc3339());
    let _ = writeln!(out, "Elapsed:  {}s", elapsed.num_seconds());
    if summary.resumed_from != Stage::FetchListing {
        let _ = writeln!(out, "Resumed at: {}", summary.resumed_from);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Stages:");
    for report in &summary.reports {
        if report.from_artifact {
            let _ = writeln!(out, "  {}: from existing artifact", report.stage);
            continue;
        }
        let _ = writeln!(
            out,
            "  {}: {} processed, {} reused, {} skipped",
            report.stage,
            report.processed,
            report.reused,
            report.skips.len()
        );
    }
    let _ = writeln!(out);

    if summary.total_skips() > 0 {
        let _ = writeln!(out, "Skipped Items ({}):", summary.total_skips());
        for report in summary.reports.iter().filter(|r| !r.skips.is_empty()) {
            let groups = group_skips(&report.skips)
                .into_iter()
                .map(|(kind, count)| format!("{} {}", count, kind))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "  [{}] {}", report.stage, groups);
            for skip in &report.skips {
                let _ = writeln!(out, "    - {}: {}", skip.item, skip.reason);
            }
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Images saved: {}", summary.images_saved);
    if summary.temp_removed {
        let _ = writeln!(out, "Intermediate artifacts removed");
    }
    out
}

/// Prints the run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    print!("{}", render_summary(summary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{SkipReason, StageReport};
    use chrono::Utc;

    fn summary() -> RunSummary {
        let mut download = StageReport::new(Stage::DownloadImages);
        download.processed = 3;
        download.skip(Skip::new("Alpha: https://x/a.png", SkipReason::HttpStatus(404)));
        download.skip(Skip::new("Beta: https://x/b.png", SkipReason::HttpStatus(500)));
        download.skip(Skip::new(
            "Beta: https://x/c.png",
            SkipReason::NonImageContent {
                content_type: "text/html".to_string(),
            },
        ));

        RunSummary {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            resumed_from: Stage::DownloadImages,
            reports: vec![
                StageReport::from_artifact(Stage::FetchListing),
                StageReport::from_artifact(Stage::ExtractDetailUrls),
                StageReport::from_artifact(Stage::ExtractImageUrls),
                download,
            ],
            images_saved: 0,
            temp_removed: true,
        }
    }

    #[test]
    fn test_group_skips() {
        let summary = summary();
        let groups = group_skips(&summary.reports[3].skips);
        assert_eq!(groups.get("http_status"), Some(&2));
        assert_eq!(groups.get("non_image_content"), Some(&1));
    }

    #[test]
    fn test_render_summary() {
        let text = render_summary(&summary());

        assert!(text.contains("Resumed at: download_images"));
        assert!(text.contains("fetch_listing: from existing artifact"));
        assert!(text.contains("download_images: 3 processed, 0 reused, 3 skipped"));
        assert!(text.contains("[download_images] 2 http_status, 1 non_image_content"));
        assert!(text.contains("- Alpha: https://x/a.png: HTTP status 404"));
        assert!(text.contains("Intermediate artifacts removed"));
    }
}
