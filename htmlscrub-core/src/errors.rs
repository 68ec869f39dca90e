//! errors.rs - Custom error types for the htmlscrub-core library.
//!
//! `PolicyFormatError` is the only failure the sanitiser itself can report, and
//! it is raised while compiling the allow-list, never during a traversal.
//! `HtmlScrubError` wraps it together with the configuration and I/O failures
//! of the surrounding library surface.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// A malformed allow-list rule string.
///
/// `fragment` is the offending piece of the rule text (an element spec or an
/// attribute spec).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid policy fragment '{fragment}': {reason}")]
pub struct PolicyFormatError {
    pub fragment: String,
    pub reason: String,
}

impl PolicyFormatError {
    pub fn new(fragment: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            reason: reason.into(),
        }
    }
}

/// This enum represents all possible error types in the `htmlscrub-core` library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HtmlScrubError {
    #[error("Failed to compile allow-list policy: {0}")]
    Policy(#[from] PolicyFormatError),

    #[error("Configuration '{0}' is invalid: {1}")]
    InvalidConfig(String, String),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("A critical system error occurred: {0}")]
    AnyhowWrapper(#[from] anyhow::Error),
}
