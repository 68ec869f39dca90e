// htmlscrub-core/src/headless.rs

//! Convenience wrappers for using the core engine without any UI.
//! Provides a one-shot function that sanitises a string of markup.

use anyhow::Result;

use crate::config::SanitiserConfig;
use crate::engine::SanitizationEngine;
use crate::engines::html_engine::HtmlEngine;

/// Sanitises `content` with `config` and returns only the cleaned markup.
///
/// # Arguments
///
/// * `config` - The merged `SanitiserConfig` (built-in set plus optional user overrides).
/// * `content` - The markup to sanitise.
/// * `source_id` - A stable identifier for the input, used in logs.
pub fn headless_sanitize_string(config: SanitiserConfig, content: &str, source_id: &str) -> Result<String> {
    let engine: Box<dyn SanitizationEngine> = Box::new(HtmlEngine::new(config)?);
    let (sanitized_content, _) = engine.sanitize(content, source_id)?;
    Ok(sanitized_content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_headless_sanitize_string() -> Result<()> {
        let config = SanitiserConfig::from_valid_elements("a[href|target|rel]")
            .with_link_rel_value(Some("noopener, noreferrer".to_string()));

        let sanitized = headless_sanitize_string(
            config,
            "<a href=\"/test\" target=\"_blank\">Test</a>",
            "test_input",
        )?;

        assert_eq!(
            sanitized,
            "<a href=\"/test\" target=\"_blank\" rel=\"noopener, noreferrer\">Test</a>"
        );
        Ok(())
    }

    #[test]
    fn test_headless_rejects_bad_rules() {
        let config = SanitiserConfig::from_valid_elements("");
        assert!(headless_sanitize_string(config, "<p>x</p>", "empty").is_err());
    }
}
