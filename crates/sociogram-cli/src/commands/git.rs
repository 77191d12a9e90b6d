use std::path::Path;

use anyhow::{Context, Result};

use sociogram_ingest::extractors::{LocalGitConfig, LocalGitExtractor};

use super::write_output;
use crate::ui;

/// Scan a repository and write its commit events in the generic layout,
/// ready to be fed back with `--input generic:FILE`.
pub fn run(repo: &Path, days: Option<i64>, output: Option<&Path>) -> Result<()> {
    let extractor = LocalGitExtractor::with_config(LocalGitConfig {
        history_days: days,
        ..LocalGitConfig::default()
    });

    let spinner = ui::spinner(&format!("Scanning {}", repo.display()));
    let result = extractor.extract(repo);
    spinner.finish_and_clear();
    let (events, stats) = result?;

    ui::success(&format!(
        "{}: {} commits, {} files, {} authors ({}ms)",
        stats.repository,
        stats.commits_scanned,
        stats.files_processed,
        stats.unique_authors,
        stats.duration_ms
    ));

    let json = serde_json::to_string_pretty(&events).context("Failed to serialize events")?;
    write_output(output, &json)
}
