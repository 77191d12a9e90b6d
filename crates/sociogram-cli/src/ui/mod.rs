//! Terminal output. Everything here writes to stderr so stdout stays JSON.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use sociogram_core::RunReport;

/// Print success message
pub fn success(msg: &str) {
    eprintln!("{} {}", style("✔").green(), msg);
}

/// Print warning message
pub fn warn(msg: &str) {
    eprintln!("{} {}", style("!").yellow(), msg);
}

/// Print info message (indented)
pub fn info(msg: &str) {
    eprintln!("  {}", msg);
}

/// Summarize a run: groups built, edges per policy, what was skipped.
pub fn report(report: &RunReport) {
    info(&format!(
        "{} events in {} groups",
        report.events, report.groups_built
    ));
    let build = &report.build;
    info(&format!(
        "{} edges: {} replies, {} joined, {} mentions, {} co-edits, {} directed",
        build.edges(),
        build.direct_replies,
        build.joined_discussion,
        build.mentions,
        build.co_edits,
        build.directed
    ));
    if report.identity_links > 0 {
        info(&format!("{} commit authors linked to logins", report.identity_links));
    }
    if build.unresolved_reply_targets > 0 {
        info(&format!(
            "{} replies to posts outside their thread",
            style(build.unresolved_reply_targets).dim()
        ));
    }
    let consolidation = &report.consolidation;
    if consolidation.self_loops_removed > 0 {
        info(&format!("{} self-loops removed", consolidation.self_loops_removed));
    }
    if consolidation.unresolved_pruned {
        info(&format!(
            "Unknown author removed with {} edges",
            consolidation.unresolved_edges_removed
        ));
    }
    for skipped in &report.skipped {
        match &skipped.key {
            Some(key) => warn(&format!("Skipped {} in {}: {}", key, skipped.scope, skipped.reason)),
            None => warn(&format!("Dropped item in {}: {}", skipped.scope, skipped.reason)),
        }
    }
}

/// Create a spinner for indeterminate progress
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
