//! Progress bars for the looping stages

use indicatif::{ProgressBar, ProgressStyle};

/// Creates a bar for a stage with `total` items, or a hidden one when disabled
pub fn stage_bar(enabled: bool, total: usize, label: &str) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{prefix:>20} [{bar:40}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar.set_prefix(label.to_string());
    bar
}
