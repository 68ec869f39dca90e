//! Configuration management for `htmlscrub-core`.
//!
//! A `SanitiserConfig` is a named configuration set: the allow-list rule text
//! plus the few options the tree sanitiser resolves once at construction
//! (the `rel` value injected on links with a `target`, the elements whose
//! subtree is dropped instead of unwrapped, and the URL attributes checked for
//! script schemes). Sets are loaded from YAML, either the embedded built-ins
//! or user files, and can be merged.
//!
//! License: MIT OR Apache-2.0

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::HtmlScrubError;
use crate::sanitizers::compiler::compile;

/// Default value injected into `rel` on links that carry a `target`.
pub const DEFAULT_LINK_REL_VALUE: &str = "noopener noreferrer";

fn default_link_rel_value() -> Option<String> {
    Some(DEFAULT_LINK_REL_VALUE.to_string())
}

fn default_remove_subtree_elements() -> Vec<String> {
    vec!["script".to_string(), "style".to_string()]
}

fn default_url_attributes() -> Vec<String> {
    vec!["href".to_string(), "src".to_string()]
}

/// One named sanitiser configuration set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SanitiserConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Allow-list rule text.
    #[serde(default)]
    pub valid_elements: String,
    /// Extra rule text appended to `valid_elements`.
    #[serde(default)]
    pub extended_valid_elements: Option<String>,
    /// `null` disables the `rel`-from-`target` rule.
    #[serde(default = "default_link_rel_value")]
    pub link_rel_value: Option<String>,
    /// Disallowed elements that are dropped with their subtree instead of unwrapped.
    #[serde(default = "default_remove_subtree_elements")]
    pub remove_subtree_elements: Vec<String>,
    /// Attributes whose values are checked for script URLs.
    #[serde(default = "default_url_attributes")]
    pub url_attributes: Vec<String>,
}

impl Default for SanitiserConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            valid_elements: String::new(),
            extended_valid_elements: None,
            link_rel_value: default_link_rel_value(),
            remove_subtree_elements: default_remove_subtree_elements(),
            url_attributes: default_url_attributes(),
        }
    }
}

/// The embedded list of built-in sets.
#[derive(Debug, Deserialize)]
struct ConfigSets {
    configs: Vec<SanitiserConfig>,
}

/// Error type for a configuration set that could not be located.
#[derive(Debug)]
pub struct ConfigSetNotFoundError {
    pub config_name: String,
}

impl fmt::Display for ConfigSetNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Configuration set '{}' not found.", self.config_name)
    }
}

impl std::error::Error for ConfigSetNotFoundError {}

impl SanitiserConfig {
    /// A configuration with the given rule text and default options.
    pub fn from_valid_elements(valid_elements: impl Into<String>) -> Self {
        Self {
            valid_elements: valid_elements.into(),
            ..Self::default()
        }
    }

    /// Replaces the allow-list rule text, keeping every other option.
    pub fn with_valid_elements(mut self, valid_elements: impl Into<String>) -> Self {
        self.valid_elements = valid_elements.into();
        self.extended_valid_elements = None;
        self
    }

    pub fn with_link_rel_value(mut self, value: Option<String>) -> Self {
        self.link_rel_value = value;
        self
    }

    /// The full rule text handed to the policy compiler.
    pub fn effective_rules(&self) -> String {
        match self.extended_valid_elements.as_deref().map(str::trim) {
            Some(extra) if !extra.is_empty() && !self.valid_elements.trim().is_empty() => {
                format!("{},{}", self.valid_elements, extra)
            }
            Some(extra) if !extra.is_empty() => extra.to_string(),
            _ => self.valid_elements.clone(),
        }
    }

    /// Checks that the rule text compiles and the options are coherent.
    pub fn validate(&self) -> Result<(), HtmlScrubError> {
        compile(&self.effective_rules())?;

        if let Some(value) = &self.link_rel_value {
            if value.trim().is_empty() {
                return Err(HtmlScrubError::InvalidConfig(
                    self.display_name().to_string(),
                    "link_rel_value must not be blank; use null to disable it".to_string(),
                ));
            }
        }
        if self
            .remove_subtree_elements
            .iter()
            .chain(self.url_attributes.iter())
            .any(|name| name.trim().is_empty())
        {
            return Err(HtmlScrubError::InvalidConfig(
                self.display_name().to_string(),
                "element and attribute lists must not contain blank names".to_string(),
            ));
        }
        Ok(())
    }

    fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "<unnamed>"
        } else {
            &self.name
        }
    }

    /// Loads a configuration set from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading sanitiser configuration from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: SanitiserConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        if !config.effective_rules().trim().is_empty() {
            config
                .validate()
                .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        }
        info!("Loaded configuration '{}' from file {}.", config.display_name(), path.display());

        Ok(config)
    }

    /// All built-in configuration sets.
    pub fn builtin_configs() -> Result<Vec<Self>> {
        debug!("Loading built-in configuration sets from embedded string...");
        let default_yaml = include_str!("../config/default_configs.yaml");
        let sets: ConfigSets =
            serde_yml::from_str(default_yaml).context("Failed to parse built-in configuration sets")?;
        debug!("Loaded {} built-in configuration sets.", sets.configs.len());
        Ok(sets.configs)
    }

    /// The built-in `default` set.
    pub fn load_default_config() -> Result<Self> {
        Self::builtin_configs()?
            .into_iter()
            .find(|config| config.name == "default")
            .ok_or_else(|| {
                ConfigSetNotFoundError {
                    config_name: "default".to_string(),
                }
                .into()
            })
    }
}

/// Merges a user configuration over a base set.
///
/// User options win; an empty user `valid_elements` inherits the base rule
/// text and `extended_valid_elements` from both sides are concatenated.
pub fn merge_configs(base: SanitiserConfig, user: Option<SanitiserConfig>) -> SanitiserConfig {
    let Some(user) = user else {
        debug!("merge_configs called without a user configuration.");
        return base;
    };
    debug!(
        "Merging user configuration '{}' over '{}'.",
        user.display_name(),
        base.display_name()
    );

    let valid_elements = if user.valid_elements.trim().is_empty() {
        base.valid_elements
    } else {
        user.valid_elements
    };

    let extended: Vec<String> = [base.extended_valid_elements, user.extended_valid_elements]
        .into_iter()
        .flatten()
        .filter(|rules| !rules.trim().is_empty())
        .collect();

    SanitiserConfig {
        name: if user.name.is_empty() { base.name } else { user.name },
        description: user.description.or(base.description),
        valid_elements,
        extended_valid_elements: (!extended.is_empty()).then(|| extended.join(",")),
        link_rel_value: user.link_rel_value,
        remove_subtree_elements: user.remove_subtree_elements,
        url_attributes: user.url_attributes,
    }
}

/// Directories searched, in order, for `<name>.yaml` configuration sets.
pub fn config_candidate_paths(name: &str) -> Vec<PathBuf> {
    let base_dirs = vec![
        dirs::home_dir().map(|p| p.join(".htmlscrub").join("configs")),
        dirs::config_dir().map(|p| p.join("htmlscrub").join("configs")),
        Some(PathBuf::from("/etc/htmlscrub/configs")),
        Some(PathBuf::from("./config")),
    ];

    base_dirs
        .into_iter()
        .flatten()
        .map(|dir| dir.join(format!("{}.yaml", name)))
        .collect()
}

/// Resolves a configuration set by file path, built-in name, or a
/// `<name>.yaml` in one of the [`config_candidate_paths`].
pub fn load_config_by_name(name_or_path: &str) -> Result<SanitiserConfig> {
    debug!("Attempting to load configuration set: '{}'", name_or_path);

    let path = Path::new(name_or_path);
    if path.is_file() {
        debug!("Input is a valid file path. Loading directly from: {}", path.display());
        return SanitiserConfig::load_from_file(path);
    }

    if let Some(builtin) = SanitiserConfig::builtin_configs()?
        .into_iter()
        .find(|config| config.name == name_or_path)
    {
        debug!("Using built-in configuration set '{}'.", name_or_path);
        return Ok(builtin);
    }

    match config_candidate_paths(name_or_path)
        .into_iter()
        .find(|candidate| candidate.exists())
    {
        Some(found) => {
            let mut config = SanitiserConfig::load_from_file(&found)?;
            if config.name.is_empty() {
                config.name = name_or_path.to_string();
            }
            Ok(config)
        }
        None => {
            warn!("Configuration set '{}' was not found in any search location.", name_or_path);
            Err(ConfigSetNotFoundError {
                config_name: name_or_path.to_string(),
            }
            .into())
        }
    }
}
