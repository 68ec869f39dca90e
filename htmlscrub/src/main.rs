// htmlscrub/src/main.rs
//! htmlscrub entry point.
//!
//! Parses arguments, initialises logging and the theme, resolves the
//! sanitiser configuration and dispatches to the selected command.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::process::ExitCode;

use htmlscrub::cli::{Cli, Commands};
use htmlscrub::commands::check_policy::run_check_policy;
use htmlscrub::commands::sanitize::{run_sanitize, SanitizeOptions};
use htmlscrub::commands::scan::{run_scan, ScanOptions};
use htmlscrub::commands::{error_msg, read_input, resolve_config};
use htmlscrub::logger;
use htmlscrub::ui::theme::{build_theme_map, ThemeMap, ThemeStyle};
use htmlscrub_core::HtmlEngine;

fn source_id(path: Option<&std::path::Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdin".to_string())
}

fn run(cli: Cli, theme_map: &ThemeMap) -> Result<()> {
    match cli.command {
        Commands::Sanitize(cmd) => {
            let config = resolve_config(&cmd.config)?;
            let engine = HtmlEngine::new(config)?;
            let input = read_input(cmd.input_file.as_deref())?;
            let opts = SanitizeOptions {
                input,
                source_id: source_id(cmd.input_file.as_deref()),
                clipboard: cmd.clipboard,
                diff: cmd.diff,
                output_path: cmd.output,
                no_summary: cmd.no_summary,
                quiet: cli.quiet,
            };
            run_sanitize(&engine, opts, theme_map)
        }
        Commands::Scan(cmd) => {
            let config = resolve_config(&cmd.config)?;
            let engine = HtmlEngine::new(config)?;
            let input = read_input(cmd.input_file.as_deref())?;
            let opts = ScanOptions {
                input,
                source_id: source_id(cmd.input_file.as_deref()),
                json_file: cmd.json_file,
                json_stdout: cmd.json_stdout,
                fail_over_threshold: cmd.fail_over_threshold,
                quiet: cli.quiet,
            };
            run_scan(&engine, opts, theme_map)
        }
        Commands::CheckPolicy(cmd) => {
            let rules = match cmd.rules {
                Some(rules) => rules,
                None => resolve_config(&cmd.config)?.effective_rules(),
            };
            run_check_policy(&rules, theme_map)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logger::init_logger(logger::level_from_flags(cli.quiet, cli.debug, cli.disable_debug));
    info!("htmlscrub started. Version: {}", env!("CARGO_PKG_VERSION"));

    let theme_map = match build_theme_map(cli.theme.as_ref()).context("Failed to load theme") {
        Ok(theme_map) => theme_map,
        Err(e) => {
            let fallback = ThemeStyle::default_theme_map();
            error_msg(format!("{:#}", e), &fallback);
            return ExitCode::FAILURE;
        }
    };

    match run(cli, &theme_map) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error_msg(format!("{:#}", e), &theme_map);
            ExitCode::FAILURE
        }
    }
}
