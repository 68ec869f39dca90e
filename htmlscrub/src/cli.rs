// htmlscrub/src/cli.rs
//! This file defines the command-line interface (CLI) for the htmlscrub
//! application, including all available commands and their arguments.
//! License: MIT OR APACHE 2.0

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "htmlscrub",
    author = "Relay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Sanitize rich-text HTML against an allow-list",
    long_about = "htmlscrub filters HTML fragments, such as the output of a rich-text editor, against an allow-list of elements and attributes. Disallowed elements are unwrapped so their content survives, script-like elements are dropped entirely, attributes are stripped, defaulted or forced per rule, and links opened in a new browsing context get a safe `rel` value.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// Explicitly disable debug logging, even if RUST_LOG is set to DEBUG
    #[arg(long = "disable-debug", global = true, help = "Disable debug logging, overriding RUST_LOG.")]
    pub disable_debug: bool,

    /// Specify the path to a custom YAML theme file.
    #[arg(long = "theme", value_name = "FILE", global = true, help = "Specify the path to a custom YAML theme file.")]
    pub theme: Option<PathBuf>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `htmlscrub` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sanitizes an input file or stdin and writes the cleaned markup.
    #[command(about = "Sanitizes an input file or stdin and writes the cleaned markup.")]
    Sanitize(SanitizeCommand),

    /// Reports what sanitization would change without writing output.
    #[command(about = "Reports what sanitization would change without writing the cleaned markup.")]
    Scan(ScanCommand),

    /// Compiles an allow-list rule string and prints the resulting policy.
    #[command(name = "check-policy", about = "Compiles an allow-list rule string and prints the resulting policy.")]
    CheckPolicy(CheckPolicyCommand),
}

/// Options shared by every command that needs a sanitiser configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a custom configuration file (YAML), merged over the selected set.
    #[arg(long = "config", value_name = "FILE", help = "Path to a custom configuration file (YAML), merged over the selected set.")]
    pub config: Option<PathBuf>,

    /// Named configuration set, or a path to one.
    #[arg(long = "config-set", value_name = "NAME", env = "HTMLSCRUB_CONFIG_SET", help = "Built-in or installed configuration set to start from (defaults to 'default').")]
    pub config_set: Option<String>,

    /// Replaces the allow-list rules of the selected configuration.
    #[arg(long = "valid-elements", value_name = "RULES", help = "Allow-list rule text that replaces the configured valid_elements.")]
    pub valid_elements: Option<String>,
}

/// Arguments for the `sanitize` command.
#[derive(Parser, Debug)]
pub struct SanitizeCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Write sanitized output to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    /// Copy sanitized output to the system clipboard.
    #[arg(long, short = 'c', help = "Copy sanitized output to the system clipboard.")]
    pub clipboard: bool,

    /// Show a unified diff to highlight the changes made.
    #[arg(long, short = 'D', help = "Show a unified diff to highlight the changes made.")]
    pub diff: bool,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Suppress the sanitisation summary.
    #[arg(long = "no-summary", help = "Suppress the sanitisation summary.")]
    pub no_summary: bool,
}

/// Arguments for the `scan` command.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Exit with a non-zero code if the total number of changes exceeds this threshold.
    #[arg(long = "fail-over-threshold", value_name = "N", help = "Exit with a non-zero code if the total number of changes exceeds this threshold.")]
    pub fail_over_threshold: Option<usize>,

    /// Export the scan report to a JSON file.
    #[arg(long = "json-file", value_name = "FILE", help = "Export the scan report to a JSON file.")]
    pub json_file: Option<PathBuf>,

    /// Print the scan report as JSON to stdout (conflicts with --json-file).
    #[arg(long = "json-stdout", conflicts_with = "json_file", help = "Export the scan report to stdout as JSON.")]
    pub json_stdout: bool,
}

/// Arguments for the `check-policy` command.
#[derive(Parser, Debug)]
pub struct CheckPolicyCommand {
    /// Rule text to compile. When omitted, the configured rules are checked.
    #[arg(value_name = "RULES", help = "Allow-list rule text to compile; defaults to the configured rules.")]
    pub rules: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}
