// htmlscrub-core/src/engines/html_engine.rs
//! A `SanitizationEngine` that parses markup into a tree, applies the
//! allow-list policy and serialises the result.
//! License: MIT OR APACHE 2.0

use anyhow::{Context, Result};
use log::{debug, info};
use std::sync::Arc;

use crate::config::SanitiserConfig;
use crate::dom::Fragment;
use crate::engine::SanitizationEngine;
use crate::policy::Policy;
use crate::report::{content_hash, SanitiseReport, SanitizationSummaryItem};
use crate::sanitizers::compiler::get_or_compile_policy;
use crate::sanitizers::tree::TreeSanitiser;

#[derive(Debug)]
pub struct HtmlEngine {
    policy: Arc<Policy>,
    sanitiser: TreeSanitiser,
    config: SanitiserConfig,
}

impl HtmlEngine {
    pub fn new(config: SanitiserConfig) -> Result<Self> {
        let rules = config.effective_rules();
        let policy = get_or_compile_policy(&rules).with_context(|| {
            format!("Failed to compile valid_elements for configuration '{}'", config.name)
        })?;
        let sanitiser = TreeSanitiser::new(Arc::clone(&policy), &config);
        info!(
            "HtmlEngine ready with {} element entries from configuration '{}'.",
            policy.len(),
            config.name
        );

        Ok(Self {
            policy,
            sanitiser,
            config,
        })
    }

    pub fn sanitiser(&self) -> &TreeSanitiser {
        &self.sanitiser
    }

    /// Sanitises `content` and returns the output with the full event report.
    pub fn sanitize_with_report(&self, content: &str, source_id: &str) -> (String, SanitiseReport) {
        debug!(
            "Sanitising '{}' ({} bytes, sha256 {}).",
            source_id,
            content.len(),
            content_hash(content)
        );
        let mut fragment = Fragment::parse(content);
        let report = self.sanitiser.sanitise(&mut fragment);
        debug!("'{}': {} changes.", source_id, report.events().len());
        (fragment.to_html(), report)
    }
}

impl SanitizationEngine for HtmlEngine {
    fn sanitize(&self, content: &str, source_id: &str) -> Result<(String, Vec<SanitizationSummaryItem>)> {
        let (output, report) = self.sanitize_with_report(content, source_id);
        Ok((output, report.summary()))
    }

    fn analyze_for_stats(&self, content: &str, source_id: &str) -> Result<Vec<SanitizationSummaryItem>> {
        let (_, report) = self.sanitize_with_report(content, source_id);
        Ok(report.summary())
    }

    fn policy(&self) -> &Policy {
        &self.policy
    }

    fn get_config(&self) -> &SanitiserConfig {
        &self.config
    }
}
