// src/utils/log.rs

//! Console report output with server-style formatting.
//!
//! Library code logs through the `log` facade; this module prints the
//! human-facing reports of the CLI with timestamps and levels.

use std::sync::OnceLock;

use chrono::Local;
use log::{Level, LevelFilter};

use crate::pipeline::PurgeSummary;

static LEVEL: OnceLock<LevelFilter> = OnceLock::new();

/// Set the report level; later calls are ignored.
pub fn init(level: &str) {
    let _ = LEVEL.set(parse_level(level));
}

/// Unknown names fall back to `info`.
fn parse_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::Info)
}

fn enabled(level: Level) -> bool {
    level <= LEVEL.get().copied().unwrap_or(LevelFilter::Info)
}

fn line(level: Level, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("[{}] [{}] {}", timestamp, level, message)
}

pub fn error(message: &str) {
    if enabled(Level::Error) {
        eprintln!("{}", line(Level::Error, message));
    }
}

/// Printed at any report level.
pub fn success(message: &str) {
    println!("{}", line(Level::Info, message));
}

/// Boxed section title.
pub fn header(title: &str) {
    if enabled(Level::Info) {
        let border = "═".repeat(60);
        println!("{}", line(Level::Info, &border));
        println!("{}", line(Level::Info, &format!("  {}", title)));
        println!("{}", line(Level::Info, &border));
    }
}

pub fn sub_item(message: &str) {
    if enabled(Level::Info) {
        println!("{}", line(Level::Info, &format!("    {}", message)));
    }
}

/// Titled `key: value` block.
pub fn summary(title: &str, items: &[(&str, String)]) {
    if enabled(Level::Info) {
        println!();
        println!("{}", line(Level::Info, &format!("[SUMMARY] {}", title)));
        for (key, value) in items {
            println!("{}", line(Level::Info, &format!("    {}: {}", key, value)));
        }
    }
}

/// Summary lines for a pipeline run.
pub fn summary_items(summary: &PurgeSummary) -> Vec<(&'static str, String)> {
    let purged: Vec<&str> = summary
        .reports
        .iter()
        .flat_map(|r| r.purged.iter().map(String::as_str))
        .collect();
    vec![
        ("Keys", summary.keys.len().to_string()),
        ("Dry run", summary.is_dry_run().to_string()),
        ("Purged on", purged.join(", ")),
        ("Failed targets", summary.failed_targets().to_string()),
        ("Rows with errors", summary.record_failures.len().to_string()),
    ]
}

/// Print a pipeline run report.
pub fn purge_summary(summary: &PurgeSummary) {
    let items = summary_items(summary);
    self::summary(&summary.operation, &items);
    for report in &summary.reports {
        for failure in &report.failed {
            error(&format!("{}: {}", failure.domain, failure.message));
        }
    }
}
