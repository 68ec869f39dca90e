// htmlscrub-core/tests/config_integration_tests.rs
use anyhow::Result;
use std::io::Write;
use tempfile::NamedTempFile;

use htmlscrub_core::config::{self, SanitiserConfig, DEFAULT_LINK_REL_VALUE};
use htmlscrub_core::{headless_sanitize_string, ConfigSetNotFoundError};

#[test]
fn test_load_default_config() {
    let config = SanitiserConfig::load_default_config().unwrap();
    assert_eq!(config.name, "default");
    assert!(config.valid_elements.contains("a[href|target|rel|name]"));
    assert_eq!(config.link_rel_value.as_deref(), Some(DEFAULT_LINK_REL_VALUE));
    config.validate().unwrap();
}

#[test]
fn test_load_from_file() -> Result<()> {
    let yaml_content = r#"
name: blog_comments
valid_elements: "p,em,a[href|target|rel]"
link_rel_value: "nofollow"
url_attributes: [href]
"#;
    let mut file = NamedTempFile::new()?;
    file.write_all(yaml_content.as_bytes())?;
    let config = SanitiserConfig::load_from_file(file.path())?;
    assert_eq!(config.name, "blog_comments");
    assert_eq!(config.link_rel_value.as_deref(), Some("nofollow"));
    assert_eq!(config.url_attributes, vec!["href"]);
    // Omitted fields fall back to their defaults.
    assert_eq!(config.remove_subtree_elements, vec!["script", "style"]);
    Ok(())
}

#[test]
fn test_load_from_file_rejects_bad_rules() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(b"name: broken\nvalid_elements: \"p[id,em\"\n")?;
    let err = SanitiserConfig::load_from_file(file.path()).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("Invalid configuration"), "got: {}", message);
    assert!(message.contains("p[id,em"), "got: {}", message);
    Ok(())
}

#[test]
fn test_load_config_by_name_builtin_and_path() -> Result<()> {
    let minimal = config::load_config_by_name("minimal")?;
    assert_eq!(minimal.name, "minimal");

    let mut file = NamedTempFile::new()?;
    file.write_all(b"name: from_path\nvalid_elements: \"p\"\n")?;
    let path = file.path().to_string_lossy().to_string();
    let loaded = config::load_config_by_name(&path)?;
    assert_eq!(loaded.name, "from_path");
    Ok(())
}

#[test]
fn test_load_config_by_name_not_found() {
    let err = config::load_config_by_name("definitely_not_a_real_set_4821").unwrap_err();
    let not_found = err.downcast_ref::<ConfigSetNotFoundError>().unwrap();
    assert_eq!(not_found.config_name, "definitely_not_a_real_set_4821");
}

#[test]
fn test_config_candidate_paths_end_with_name() {
    let paths = config::config_candidate_paths("team");
    assert!(!paths.is_empty());
    assert!(paths.iter().all(|p| p.ends_with("team.yaml")));
}

#[test]
fn test_merge_configs_no_user_config() {
    let base = SanitiserConfig::from_valid_elements("p");
    let merged = config::merge_configs(base.clone(), None);
    assert_eq!(merged, base);
}

#[test]
fn test_merge_configs_override() {
    let mut base = SanitiserConfig::from_valid_elements("p,strong");
    base.name = "default".to_string();
    base.extended_valid_elements = Some("span[class]".to_string());

    let user = SanitiserConfig {
        extended_valid_elements: Some("code".to_string()),
        link_rel_value: None,
        ..SanitiserConfig::default()
    };

    let merged = config::merge_configs(base, Some(user));
    assert_eq!(merged.name, "default");
    assert_eq!(merged.valid_elements, "p,strong");
    assert_eq!(merged.effective_rules(), "p,strong,span[class],code");
    assert_eq!(merged.link_rel_value, None);
}

#[test]
fn test_with_valid_elements_overrides_rules() -> Result<()> {
    let config = SanitiserConfig::load_default_config()?.with_valid_elements("p");
    let output = headless_sanitize_string(config, "<p>a <em>b</em></p>", "override")?;
    assert_eq!(output, "<p>a b</p>");
    Ok(())
}
