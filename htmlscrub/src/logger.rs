// htmlscrub/src/logger.rs
//! Logging setup for the `htmlscrub` binary.
//!
//! Log lines are written to stderr as `[LEVEL target] message` so they never
//! mix with sanitised markup on stdout.

use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

/// Initialises the global logger.
///
/// `RUST_LOG` is honoured (default `warn`); a `level_override` replaces it.
/// Calling this more than once is harmless: later calls are ignored.
pub fn init_logger(level_override: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    builder.format(|buf, record| {
        writeln!(buf, "[{} {}] {}", record.level(), record.target(), record.args())
    });

    if let Some(level) = level_override {
        builder.filter_level(level);
    }

    let _ = builder.try_init();
}

/// Maps the global CLI flags onto a level override.
pub fn level_from_flags(quiet: bool, debug: bool, disable_debug: bool) -> Option<LevelFilter> {
    if quiet {
        Some(LevelFilter::Off)
    } else if debug && !disable_debug {
        Some(LevelFilter::Debug)
    } else if disable_debug {
        Some(LevelFilter::Info)
    } else {
        None
    }
}
