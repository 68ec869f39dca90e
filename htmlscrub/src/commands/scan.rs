// htmlscrub/src/commands/scan.rs
//! `scan` command: reports what sanitisation would change.
//!
//! The input is never rewritten. Results go to the console as a table, or as
//! JSON to stdout or a file, and `--fail-over-threshold` turns the scan into
//! a CI gate.

use anyhow::{Context, Result};
use chrono::Utc;
use is_terminal::IsTerminal;
use log::{debug, info};
use serde::Serialize;
use std::io;
use std::path::PathBuf;

use htmlscrub_core::report::content_hash;
use htmlscrub_core::{engine::SanitizationEngine, SanitizationSummaryItem};

use crate::commands::{info_msg, CliError};
use crate::ui::summary::{print_summary, total_occurrences};
use crate::ui::theme::ThemeMap;

/// Options for a single `scan` run.
pub struct ScanOptions {
    pub input: String,
    pub source_id: String,
    pub json_file: Option<PathBuf>,
    pub json_stdout: bool,
    pub fail_over_threshold: Option<usize>,
    pub quiet: bool,
}

/// The machine-readable scan result.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub source: String,
    pub config_set: String,
    pub input_sha256: String,
    pub scanned_at: String,
    pub total_changes: usize,
    pub summary: Vec<SanitizationSummaryItem>,
}

impl ScanReport {
    pub fn new(source: &str, config_set: &str, input: &str, summary: Vec<SanitizationSummaryItem>) -> Self {
        Self {
            source: source.to_string(),
            config_set: config_set.to_string(),
            input_sha256: content_hash(input),
            scanned_at: Utc::now().to_rfc3339(),
            total_changes: total_occurrences(&summary),
            summary,
        }
    }
}

pub fn run_scan(engine: &dyn SanitizationEngine, opts: ScanOptions, theme_map: &ThemeMap) -> Result<()> {
    info!("Starting scan operation.");

    let summary = engine
        .analyze_for_stats(&opts.input, &opts.source_id)
        .context("Scan failed")?;
    let report = ScanReport::new(&opts.source_id, &engine.get_config().name, &opts.input, summary);
    debug!("Scan found {} changes.", report.total_changes);

    if opts.json_stdout {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize scan report")?;
        println!("{}", json);
    } else if let Some(path) = &opts.json_file {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize scan report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write scan report to {}", path.display()))?;
        if !opts.quiet {
            info_msg(format!("Scan report written to {}", path.display()), theme_map);
        }
    } else {
        let stdout = io::stdout();
        let supports_color = stdout.is_terminal();
        print_summary(&report.summary, &mut stdout.lock(), theme_map, supports_color)?;
    }

    if let Some(threshold) = opts.fail_over_threshold {
        if report.total_changes > threshold {
            return Err(CliError::ThresholdExceeded {
                found: report.total_changes,
                threshold,
            }
            .into());
        }
    }

    info!("Scan operation completed.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use htmlscrub_core::{HtmlEngine, SanitiserConfig};

    #[test]
    fn report_counts_every_change() -> Result<()> {
        let engine = HtmlEngine::new(SanitiserConfig::from_valid_elements("p"))?;
        let summary = engine.analyze_for_stats("<div><p x=\"1\">a</p></div>", "unit")?;
        let report = ScanReport::new("unit", "inline", "<div></div>", summary);
        assert_eq!(report.total_changes, 2);
        assert_eq!(report.input_sha256.len(), 64);

        let json: serde_json::Value = serde_json::to_value(&report)?;
        assert_eq!(json["summary"][0]["action"], "element_unwrapped");
        Ok(())
    }
}
