// htmlscrub/src/commands/sanitize.rs
//! `sanitize` command: cleans markup and writes it out.

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use htmlscrub_core::{engine::SanitizationEngine, SanitizationSummaryItem};

use crate::commands::{info_msg, success_msg, warn_msg};
use crate::ui::diff_viewer;
use crate::ui::summary;
use crate::ui::theme::ThemeMap;
use crate::utils::clipboard::copy_to_clipboard;

/// Options for a single `sanitize` run.
pub struct SanitizeOptions {
    pub input: String,
    pub source_id: String,
    pub clipboard: bool,
    pub diff: bool,
    pub output_path: Option<PathBuf>,
    pub no_summary: bool,
    pub quiet: bool,
}

/// Runs one sanitisation and handles every requested output.
pub fn run_sanitize(engine: &dyn SanitizationEngine, opts: SanitizeOptions, theme_map: &ThemeMap) -> Result<()> {
    info!("Starting sanitize operation.");

    let (sanitized_content, summary) = engine
        .sanitize(&opts.input, &opts.source_id)
        .context("Sanitization failed")?;

    debug!(
        "Content sanitized. Original length: {}, Sanitized length: {}",
        opts.input.len(),
        sanitized_content.len()
    );

    handle_primary_output(&opts, &sanitized_content, theme_map)?;

    if opts.clipboard {
        handle_clipboard_output(&sanitized_content, theme_map);
    }

    handle_summary(&summary, &opts, theme_map)?;

    info!("Sanitize operation completed.");
    Ok(())
}

fn write_content<W: Write + ?Sized>(writer: &mut W, content: &str) -> io::Result<()> {
    if content.ends_with('\n') {
        write!(writer, "{}", content)
    } else {
        writeln!(writer, "{}", content)
    }
}

fn handle_primary_output(opts: &SanitizeOptions, sanitized_content: &str, theme_map: &ThemeMap) -> Result<()> {
    match &opts.output_path {
        Some(path) => {
            if !opts.quiet {
                info_msg(format!("Writing sanitized content to file: {}", path.display()), theme_map);
            }
            let mut file = fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            if opts.diff {
                diff_viewer::print_diff(&opts.input, sanitized_content, &mut file, theme_map, false)?;
            } else {
                write_content(&mut file, sanitized_content)?;
            }
        }
        None => {
            debug!("Writing sanitized content to stdout.");
            let stdout = io::stdout();
            let supports_color = stdout.is_terminal();
            let mut writer = stdout.lock();
            if opts.diff {
                diff_viewer::print_diff(&opts.input, sanitized_content, &mut writer, theme_map, supports_color)?;
            } else {
                write_content(&mut writer, sanitized_content)?;
            }
        }
    }
    Ok(())
}

fn handle_clipboard_output(sanitized_content: &str, theme_map: &ThemeMap) {
    match copy_to_clipboard(sanitized_content) {
        Ok(()) => success_msg("Sanitized content copied to clipboard successfully.", theme_map),
        Err(e) => warn_msg(format!("Failed to copy to clipboard: {}", e), theme_map),
    }
}

fn handle_summary(summary: &[SanitizationSummaryItem], opts: &SanitizeOptions, theme_map: &ThemeMap) -> Result<()> {
    if opts.no_summary || opts.quiet {
        return Ok(());
    }
    debug!("Displaying sanitisation summary.");
    let stderr_supports_color = io::stderr().is_terminal();
    summary::print_summary(summary, &mut io::stderr(), theme_map, stderr_supports_color)
}
