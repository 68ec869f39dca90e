// htmlscrub-core/src/report.rs
//! Records what a sanitisation pass changed.
//!
//! Every structural or attribute change the tree sanitiser makes is captured as
//! a `SanitiseEvent`. A `SanitiseReport` aggregates them into
//! `SanitizationSummaryItem`s for the CLI summary and the JSON scan output.
//!
//! Attribute values can carry user content, so debug logging masks them unless
//! `HTMLSCRUB_ALLOW_DEBUG_VALUES=true` is set.

use lazy_static::lazy_static;
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

lazy_static! {
    /// Initialized once: whether raw attribute values may appear in debug logs.
    static ref DEBUG_VALUES_ALLOWED: bool = {
        std::env::var("HTMLSCRUB_ALLOW_DEBUG_VALUES")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// The kind of change made to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitiseAction {
    /// Disallowed element replaced by its children.
    ElementUnwrapped,
    /// Element removed together with its subtree.
    SubtreeDropped,
    /// Alias element renamed to its canonical name.
    ElementRenamed,
    /// Allowed element removed because it ended up empty.
    EmptyElementRemoved,
    /// Empty element padded with a non-breaking space.
    EmptyElementPadded,
    AttributeRemoved,
    AttributeDefaulted,
    AttributeForced,
    /// `javascript:` URL stripped from a URL attribute.
    UnsafeUrlRemoved,
    /// Dependent attribute set because its trigger is present.
    ConditionalAttributeSet,
    /// Dependent attribute removed because its trigger is absent.
    ConditionalAttributeRemoved,
}

impl SanitiseAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SanitiseAction::ElementUnwrapped => "element_unwrapped",
            SanitiseAction::SubtreeDropped => "subtree_dropped",
            SanitiseAction::ElementRenamed => "element_renamed",
            SanitiseAction::EmptyElementRemoved => "empty_element_removed",
            SanitiseAction::EmptyElementPadded => "empty_element_padded",
            SanitiseAction::AttributeRemoved => "attribute_removed",
            SanitiseAction::AttributeDefaulted => "attribute_defaulted",
            SanitiseAction::AttributeForced => "attribute_forced",
            SanitiseAction::UnsafeUrlRemoved => "unsafe_url_removed",
            SanitiseAction::ConditionalAttributeSet => "conditional_attribute_set",
            SanitiseAction::ConditionalAttributeRemoved => "conditional_attribute_removed",
        }
    }
}

impl fmt::Display for SanitiseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single change, identified by element and (optionally) attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitiseEvent {
    pub action: SanitiseAction,
    pub element: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl SanitiseEvent {
    /// `tag` or `tag@attribute`.
    pub fn target(&self) -> String {
        match &self.attribute {
            Some(attribute) => format!("{}@{}", self.element, attribute),
            None => self.element.clone(),
        }
    }
}

/// Summary of all events of one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizationSummaryItem {
    pub action: SanitiseAction,
    pub occurrences: usize,
    /// Distinct targets, sorted.
    pub targets: Vec<String>,
}

/// The changes made by one pass, in the order they were made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitiseReport {
    events: Vec<SanitiseEvent>,
}

impl SanitiseReport {
    pub(crate) fn record(&mut self, action: SanitiseAction, element: &str, attribute: Option<&str>) {
        debug!(
            "{} on <{}>{}",
            action,
            element,
            attribute.map(|a| format!(" attribute '{}'", a)).unwrap_or_default()
        );
        self.events.push(SanitiseEvent {
            action,
            element: element.to_string(),
            attribute: attribute.map(str::to_string),
        });
    }

    pub fn events(&self) -> &[SanitiseEvent] {
        &self.events
    }

    pub fn is_clean(&self) -> bool {
        self.events.is_empty()
    }

    pub fn count(&self, action: SanitiseAction) -> usize {
        self.events.iter().filter(|e| e.action == action).count()
    }

    /// One item per action, ordered by action.
    pub fn summary(&self) -> Vec<SanitizationSummaryItem> {
        let mut grouped: BTreeMap<SanitiseAction, Vec<String>> = BTreeMap::new();
        for event in &self.events {
            grouped.entry(event.action).or_default().push(event.target());
        }
        grouped
            .into_iter()
            .map(|(action, mut targets)| {
                let occurrences = targets.len();
                targets.sort();
                targets.dedup();
                SanitizationSummaryItem {
                    action,
                    occurrences,
                    targets,
                }
            })
            .collect()
    }
}

pub fn redact_value(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.len() <= MAX_LEN {
        "[MASKED]".to_string()
    } else {
        format!("[MASKED: {} chars]", s.len())
    }
}

fn get_loggable_value(value: &str) -> String {
    if *DEBUG_VALUES_ALLOWED {
        value.to_string()
    } else {
        redact_value(value)
    }
}

pub fn log_attribute_removed_debug(element: &str, attribute: &str, value: &str) {
    debug!(
        "Removed attribute '{}' from <{}> (value: '{}')",
        attribute,
        element,
        get_loggable_value(value)
    );
}

/// SHA-256 of the input, hex encoded, for reports that reference their source.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
