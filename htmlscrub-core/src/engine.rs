// htmlscrub-core/src/engine.rs
//! Defines the `SanitizationEngine` trait.
//!
//! The trait decouples the CLI and other callers from the concrete way markup
//! is sanitised. Engines take raw markup in and hand sanitised markup plus a
//! change summary back out; parsing and serialisation are their concern.
//!
//! License: MIT OR APACHE 2.0

use anyhow::Result;

use crate::config::SanitiserConfig;
use crate::policy::Policy;
use crate::report::SanitizationSummaryItem;

/// A pluggable markup sanitiser.
pub trait SanitizationEngine: Send + Sync {
    /// Sanitises `content` and returns the cleaned markup together with a
    /// summary of every change made.
    ///
    /// # Arguments
    /// * `content` - The markup to sanitise.
    /// * `source_id` - The name or identifier of the source being processed.
    fn sanitize(&self, content: &str, source_id: &str) -> Result<(String, Vec<SanitizationSummaryItem>)>;

    /// Reports what sanitisation would change without producing output.
    ///
    /// Used by the `scan` command.
    fn analyze_for_stats(&self, content: &str, source_id: &str) -> Result<Vec<SanitizationSummaryItem>>;

    /// The compiled policy the engine applies.
    fn policy(&self) -> &Policy;

    /// The configuration the engine was built from.
    fn get_config(&self) -> &SanitiserConfig;
}
