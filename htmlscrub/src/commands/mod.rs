// htmlscrub/src/commands/mod.rs
//! Command implementations and the helpers they share.

pub mod check_policy;
pub mod sanitize;
pub mod scan;

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info};
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

use htmlscrub_core::config::{load_config_by_name, merge_configs, SanitiserConfig};

use crate::cli::ConfigArgs;
use crate::ui::output_format;
use crate::ui::theme::ThemeMap;

/// Failures that map to a specific process outcome rather than a crash.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{found} changes exceed the allowed threshold of {threshold}")]
    ThresholdExceeded { found: usize, threshold: usize },
}

/// Helper for printing info messages to stderr.
pub fn info_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let stderr_supports_color = io::stderr().is_terminal();
    let _ = output_format::print_info_message(&mut io::stderr(), msg.as_ref(), theme, stderr_supports_color);
}

/// Helper for printing error messages to stderr.
pub fn error_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let stderr_supports_color = io::stderr().is_terminal();
    let _ = output_format::print_error_message(&mut io::stderr(), msg.as_ref(), theme, stderr_supports_color);
}

/// Helper for printing warning messages to stderr.
pub fn warn_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let stderr_supports_color = io::stderr().is_terminal();
    let _ = output_format::print_warn_message(&mut io::stderr(), msg.as_ref(), theme, stderr_supports_color);
}

/// Helper for printing success messages to stderr.
pub fn success_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let stderr_supports_color = io::stderr().is_terminal();
    let _ = output_format::print_success_message(&mut io::stderr(), msg.as_ref(), theme, stderr_supports_color);
}

/// Reads the whole input from `path`, or from stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            info!("Reading input from file: {}", path.display());
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file: {}", path.display()))
        }
        None => {
            info!("Reading input from stdin...");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

/// Builds the effective configuration: the selected set (or `default`), a
/// user file merged over it, then an optional rule-text override.
pub fn resolve_config(args: &ConfigArgs) -> Result<SanitiserConfig> {
    let base = match args.config_set.as_deref() {
        Some(name) => load_config_by_name(name)
            .with_context(|| format!("Failed to load configuration set '{}'", name))?,
        None => SanitiserConfig::load_default_config()?,
    };

    let user = args
        .config
        .as_deref()
        .map(SanitiserConfig::load_from_file)
        .transpose()?;

    let mut config = merge_configs(base, user);
    if let Some(rules) = args.valid_elements.as_deref() {
        debug!("Overriding valid_elements from the command line.");
        config = config.with_valid_elements(rules);
    }

    config
        .validate()
        .with_context(|| format!("Configuration '{}' is not usable", config.name))?;
    Ok(config)
}
