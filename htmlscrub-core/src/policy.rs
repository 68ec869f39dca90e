//! policy.rs - The compiled, immutable allow-list table.
//!
//! A `Policy` maps lower-cased element names to an `ElementEntry`. Elements that
//! are absent from the table are disallowed; an `ElementEntry::Deny` marks an
//! element whose whole subtree must be dropped. Each allowed element carries an
//! `ElementRule` listing the attributes it may keep, with their
//! plain/default/forced semantics already resolved into `AttributeKind`.
//!
//! Policies are produced by [`crate::sanitizers::compiler::compile`] and are
//! never mutated afterwards, so a single instance can be shared behind an `Arc`
//! by any number of concurrent sanitisation passes.
//!
//! License: MIT OR APACHE 2.0

use regex::Regex;
use std::collections::HashMap;
use std::fmt;

/// How an allowed attribute is treated when the element is tidied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Kept verbatim when present.
    Plain,
    /// Added with this value when absent; an input value wins.
    Default(String),
    /// Always set to this value, overriding any input value.
    Forced(String),
}

/// A single named attribute rule inside an `ElementRule`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRule {
    pub name: String,
    pub kind: AttributeKind,
    /// The element is only allowed when at least one required attribute is present.
    pub required: bool,
    /// When set, any other value causes the attribute to be stripped.
    pub valid_values: Option<Vec<String>>,
}

impl AttributeRule {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Plain,
            required: false,
            valid_values: None,
        }
    }

    pub fn with_kind(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self { kind, ..Self::plain(name) }
    }

    /// Returns true if `value` satisfies the rule's enumerated value set.
    pub fn accepts(&self, value: &str) -> bool {
        self.valid_values
            .as_ref()
            .map_or(true, |values| values.iter().any(|v| v == value))
    }
}

impl fmt::Display for AttributeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.required {
            f.write_str("!")?;
        }
        f.write_str(&self.name.replace(':', "::"))?;
        match &self.kind {
            AttributeKind::Plain => {}
            AttributeKind::Default(value) => write!(f, "={}", value)?,
            AttributeKind::Forced(value) => write!(f, ":{}", value)?,
        }
        if let Some(values) = &self.valid_values {
            write!(f, "<{}", values.join("?"))?;
        }
        Ok(())
    }
}

/// A wildcard attribute name such as `data-*`.
#[derive(Debug, Clone)]
pub struct AttributePattern {
    /// The pattern as written in the rule text.
    pub source: String,
    pub regex: Regex,
    pub valid_values: Option<Vec<String>>,
}

impl AttributePattern {
    pub fn matches(&self, name: &str, value: &str) -> bool {
        self.regex.is_match(name)
            && self
                .valid_values
                .as_ref()
                .map_or(true, |values| values.iter().any(|v| v == value))
    }
}

impl PartialEq for AttributePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.valid_values == other.valid_values
    }
}

/// Attribute rules and element flags for one allowed element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementRule {
    /// Canonical (output) element name.
    pub name: String,
    /// Named attribute rules in declaration order, inherited global rules first.
    pub attributes: Vec<AttributeRule>,
    pub attribute_patterns: Vec<AttributePattern>,
    /// Fill the element with a non-breaking space when it ends up empty.
    pub pad_empty: bool,
    /// Remove the element when it ends up empty.
    pub remove_empty: bool,
}

impl ElementRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeRule> {
        self.attributes.iter().find(|rule| rule.name == name)
    }

    /// Decides whether an input attribute survives filtering.
    pub fn allows_attribute(&self, name: &str, value: &str) -> bool {
        match self.attribute(name) {
            Some(rule) => rule.accepts(value),
            None => self
                .attribute_patterns
                .iter()
                .any(|pattern| pattern.matches(name, value)),
        }
    }

    pub fn required_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|rule| rule.required)
            .map(|rule| rule.name.as_str())
    }

    /// Default-valued attributes in declaration order.
    pub fn defaults(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().filter_map(|rule| match &rule.kind {
            AttributeKind::Default(value) => Some((rule.name.as_str(), value.as_str())),
            _ => None,
        })
    }

    /// Forced attributes in declaration order.
    pub fn forced(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().filter_map(|rule| match &rule.kind {
            AttributeKind::Forced(value) => Some((rule.name.as_str(), value.as_str())),
            _ => None,
        })
    }

    /// Inserts a rule; a redeclared name replaces the earlier rule in place.
    pub(crate) fn upsert_attribute(&mut self, rule: AttributeRule) {
        match self.attributes.iter_mut().find(|existing| existing.name == rule.name) {
            Some(existing) => *existing = rule,
            None => self.attributes.push(rule),
        }
    }

    pub(crate) fn upsert_pattern(&mut self, pattern: AttributePattern) {
        match self
            .attribute_patterns
            .iter_mut()
            .find(|existing| existing.source == pattern.source)
        {
            Some(existing) => *existing = pattern,
            None => self.attribute_patterns.push(pattern),
        }
    }
}

impl fmt::Display for ElementRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.remove_empty {
            f.write_str("-")?;
        } else if self.pad_empty {
            f.write_str("#")?;
        }
        f.write_str(&self.name)?;
        if self.attributes.is_empty() && self.attribute_patterns.is_empty() {
            return Ok(());
        }
        let specs: Vec<String> = self
            .attributes
            .iter()
            .map(ToString::to_string)
            .chain(self.attribute_patterns.iter().map(|pattern| {
                match &pattern.valid_values {
                    Some(values) => format!("{}<{}", pattern.source, values.join("?")),
                    None => pattern.source.clone(),
                }
            }))
            .collect();
        write!(f, "[{}]", specs.join("|"))
    }
}

/// What the policy says about one element name.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementEntry {
    Allow(ElementRule),
    /// Explicit drop-subtree marker (`!tag` in the rule text).
    Deny,
}

/// A wildcard element name such as `h+`.
#[derive(Debug, Clone)]
pub struct ElementPattern {
    pub source: String,
    pub regex: Regex,
    pub entry: ElementEntry,
}

/// The compiled allow-list.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    pub(crate) elements: HashMap<String, ElementEntry>,
    pub(crate) element_patterns: Vec<ElementPattern>,
    /// alias -> canonical name, e.g. `b` -> `strong` for `strong/b`.
    pub(crate) aliases: HashMap<String, String>,
    pub(crate) global_attributes: Vec<AttributeRule>,
}

impl Policy {
    /// Looks up the entry for `tag` (case-insensitive): exact names first, then
    /// aliases, then wildcard patterns in declaration order.
    pub fn entry(&self, tag: &str) -> Option<&ElementEntry> {
        let tag = tag.to_ascii_lowercase();
        if let Some(entry) = self.elements.get(&tag) {
            return Some(entry);
        }
        if let Some(canonical) = self.aliases.get(&tag) {
            if let Some(entry) = self.elements.get(canonical) {
                return Some(entry);
            }
        }
        self.element_patterns
            .iter()
            .find(|pattern| pattern.regex.is_match(&tag))
            .map(|pattern| &pattern.entry)
    }

    /// The rule for an allowed element, or `None` when it is absent or denied.
    pub fn rule(&self, tag: &str) -> Option<&ElementRule> {
        match self.entry(tag) {
            Some(ElementEntry::Allow(rule)) => Some(rule),
            _ => None,
        }
    }

    /// Returns the canonical name `tag` must be renamed to, if it is an alias.
    pub fn canonical_name(&self, tag: &str) -> Option<&str> {
        let tag = tag.to_ascii_lowercase();
        if self.elements.contains_key(&tag) {
            return None;
        }
        self.aliases.get(&tag).map(String::as_str)
    }

    pub fn is_denied(&self, tag: &str) -> bool {
        matches!(self.entry(tag), Some(ElementEntry::Deny))
    }

    pub fn global_attributes(&self) -> &[AttributeRule] {
        &self.global_attributes
    }

    /// Number of exact and wildcard element entries.
    pub fn len(&self) -> usize {
        self.elements.len() + self.element_patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Canonical rule text, one element spec per line, sorted by name.
    pub fn describe(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .elements
            .iter()
            .map(|(name, entry)| describe_entry(name, entry))
            .collect();
        lines.sort();
        lines.extend(
            self.element_patterns
                .iter()
                .map(|pattern| describe_entry(&pattern.source, &pattern.entry)),
        );
        let mut aliases: Vec<String> = self
            .aliases
            .iter()
            .map(|(alias, canonical)| format!("{}/{}", canonical, alias))
            .collect();
        aliases.sort();
        lines.extend(aliases);
        lines
    }
}

fn describe_entry(name: &str, entry: &ElementEntry) -> String {
    match entry {
        ElementEntry::Allow(rule) => rule.to_string(),
        ElementEntry::Deny => format!("!{}", name),
    }
}
