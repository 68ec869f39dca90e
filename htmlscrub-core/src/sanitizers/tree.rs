//! tree.rs - Applies a compiled `Policy` to a parsed `Fragment`.
//!
//! The sanitiser walks the tree in document order. Each element is either
//! kept (and its attributes tidied against its rule), unwrapped (replaced by
//! its children, which are then evaluated in its place) or dropped together
//! with its subtree. Empty-element handling runs after an element's children
//! have been processed, so sanitising the output again changes nothing.
//!
//! The walk keeps its own stack of open elements instead of recursing, so
//! nesting depth in the input is bounded only by memory.
//!
//! Everything configurable is resolved in [`TreeSanitiser::new`]; a
//! sanitiser holds no mutable state and can be shared between threads.
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::SanitiserConfig;
use crate::dom::{remove_node, unwrap_node, Element, Fragment, Node};
use crate::policy::{ElementEntry, ElementRule, Policy};
use crate::report::{log_attribute_removed_debug, SanitiseAction, SanitiseReport};
use crate::validators::is_unsafe_url;

/// Content inserted into pad-if-empty elements.
const PAD_TEXT: &str = "\u{a0}";

/// An attribute whose presence depends on another attribute of the same element.
///
/// When `trigger` is present with a non-empty value, `dependent` is set to
/// `value`. Otherwise `dependent` is removed, even if the input supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalRule {
    pub element: String,
    pub trigger: String,
    pub dependent: String,
    pub value: String,
}

impl ConditionalRule {
    /// The `rel`-from-`target` rule for links.
    pub fn link_rel(value: impl Into<String>) -> Self {
        Self {
            element: "a".to_string(),
            trigger: "target".to_string(),
            dependent: "rel".to_string(),
            value: value.into(),
        }
    }
}

enum Disposition<'p> {
    Keep(&'p ElementRule),
    Unwrap,
    Drop,
}

/// A child list being walked. For a kept element, the element itself is
/// held here (its children moved into `nodes`) while a placeholder occupies
/// its slot in the parent list.
struct OpenList<'p> {
    element: Option<(Element, &'p ElementRule)>,
    nodes: Vec<Node>,
    index: usize,
}

/// Allow-list sanitiser for parsed HTML fragments.
#[derive(Debug, Clone)]
pub struct TreeSanitiser {
    policy: Arc<Policy>,
    conditional_rules: Vec<ConditionalRule>,
    remove_subtree_elements: HashSet<String>,
    url_attributes: HashSet<String>,
}

impl TreeSanitiser {
    pub fn new(policy: Arc<Policy>, config: &SanitiserConfig) -> Self {
        let conditional_rules = config
            .link_rel_value
            .as_ref()
            .map(|value| vec![ConditionalRule::link_rel(value.clone())])
            .unwrap_or_default();

        debug!(
            target: "htmlscrub_core::sanitizer",
            "TreeSanitiser built: {} element entries, {} conditional rules.",
            policy.len(),
            conditional_rules.len()
        );

        Self {
            policy,
            conditional_rules,
            remove_subtree_elements: lowercase_set(&config.remove_subtree_elements),
            url_attributes: lowercase_set(&config.url_attributes),
        }
    }

    /// Adds a conditional rule on top of those resolved from configuration.
    pub fn with_conditional_rule(mut self, rule: ConditionalRule) -> Self {
        self.conditional_rules.push(rule);
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn conditional_rules(&self) -> &[ConditionalRule] {
        &self.conditional_rules
    }

    /// Sanitises `fragment` in place and reports every change made.
    pub fn sanitise(&self, fragment: &mut Fragment) -> SanitiseReport {
        let mut report = SanitiseReport::default();
        let nodes = std::mem::take(fragment.children_mut());
        *fragment.children_mut() = self.sanitise_nodes(nodes, &mut report);
        debug!(
            target: "htmlscrub_core::sanitizer",
            "Sanitisation pass finished with {} changes.",
            report.events().len()
        );
        report
    }

    fn sanitise_nodes(&self, nodes: Vec<Node>, report: &mut SanitiseReport) -> Vec<Node> {
        let mut stack = vec![OpenList {
            element: None,
            nodes,
            index: 0,
        }];

        loop {
            let Some(list) = stack.last_mut() else {
                return Vec::new();
            };

            if list.index >= list.nodes.len() {
                let Some(finished) = stack.pop() else {
                    return Vec::new();
                };
                let Some((mut element, rule)) = finished.element else {
                    return finished.nodes;
                };
                *element.children_mut() = finished.nodes;
                let Some(parent) = stack.last_mut() else {
                    return vec![Node::Element(element)];
                };
                if self.finish_element(&mut element, rule, report) {
                    parent.nodes[parent.index] = Node::Element(element);
                    parent.index += 1;
                } else {
                    remove_node(&mut parent.nodes, parent.index);
                }
                continue;
            }

            let index = list.index;
            let disposition = match &mut list.nodes[index] {
                Node::Text(_) => {
                    list.index += 1;
                    continue;
                }
                Node::Element(element) => self.disposition(element, report),
            };

            match disposition {
                Disposition::Drop => {
                    remove_node(&mut list.nodes, index);
                }
                // The promoted children now start at `index` and are visited next.
                Disposition::Unwrap => {
                    unwrap_node(&mut list.nodes, index);
                }
                Disposition::Keep(rule) => {
                    let Node::Element(mut element) =
                        std::mem::replace(&mut list.nodes[index], Node::text(""))
                    else {
                        list.index += 1;
                        continue;
                    };
                    self.tidy_attributes(&mut element, rule, report);
                    let children = std::mem::take(element.children_mut());
                    stack.push(OpenList {
                        element: Some((element, rule)),
                        nodes: children,
                        index: 0,
                    });
                }
            }
        }
    }

    /// Applies empty-element handling once an element's children are done.
    /// Returns false when the element is to be removed.
    fn finish_element(&self, element: &mut Element, rule: &ElementRule, report: &mut SanitiseReport) -> bool {
        if element.is_void() || !is_empty(element) {
            return true;
        }
        if rule.remove_empty {
            report.record(SanitiseAction::EmptyElementRemoved, element.name(), None);
            return false;
        }
        if rule.pad_empty {
            report.record(SanitiseAction::EmptyElementPadded, element.name(), None);
            let children = element.children_mut();
            children.clear();
            children.push(Node::text(PAD_TEXT));
        }
        true
    }

    fn disposition<'p>(&'p self, element: &mut Element, report: &mut SanitiseReport) -> Disposition<'p> {
        if let Some(canonical) = self.policy.canonical_name(element.name()) {
            report.record(SanitiseAction::ElementRenamed, element.name(), None);
            element.rename(canonical);
        }

        match self.policy.entry(element.name()) {
            Some(ElementEntry::Deny) => {
                report.record(SanitiseAction::SubtreeDropped, element.name(), None);
                Disposition::Drop
            }
            Some(ElementEntry::Allow(rule)) if self.has_required_attributes(element, rule) => {
                Disposition::Keep(rule)
            }
            _ => {
                if self
                    .remove_subtree_elements
                    .contains(&element.name().to_ascii_lowercase())
                {
                    report.record(SanitiseAction::SubtreeDropped, element.name(), None);
                    Disposition::Drop
                } else {
                    report.record(SanitiseAction::ElementUnwrapped, element.name(), None);
                    Disposition::Unwrap
                }
            }
        }
    }

    /// At least one required attribute must survive tidying; no required
    /// attributes means the element always qualifies.
    fn has_required_attributes(&self, element: &Element, rule: &ElementRule) -> bool {
        let mut required = rule.required_attributes().peekable();
        if required.peek().is_none() {
            return true;
        }
        required.any(|name| match element.attr(name) {
            Some(value) => {
                rule.allows_attribute(name, value)
                    && !(self.url_attributes.contains(name) && is_unsafe_url(value))
            }
            None => false,
        })
    }

    fn tidy_attributes(&self, element: &mut Element, rule: &ElementRule, report: &mut SanitiseReport) {
        let removed = element.retain_attrs(|attribute| {
            !attribute.name.is_empty()
                && rule.allows_attribute(&attribute.name.to_ascii_lowercase(), &attribute.value)
        });
        for attribute in removed {
            log_attribute_removed_debug(element.name(), &attribute.name, &attribute.value);
            report.record(
                SanitiseAction::AttributeRemoved,
                element.name(),
                Some(attribute.name.as_str()),
            );
        }

        for (name, value) in rule.defaults() {
            if !element.has_attr(name) {
                element.set_attr(name, value);
                report.record(SanitiseAction::AttributeDefaulted, element.name(), Some(name));
            }
        }

        for (name, value) in rule.forced() {
            if element.attr(name) != Some(value) {
                element.set_attr(name, value);
                report.record(SanitiseAction::AttributeForced, element.name(), Some(name));
            }
        }

        let unsafe_urls: Vec<String> = element
            .attributes()
            .iter()
            .filter(|attribute| {
                self.url_attributes.contains(&attribute.name.to_ascii_lowercase())
                    && is_unsafe_url(&attribute.value)
            })
            .map(|attribute| attribute.name.clone())
            .collect();
        for name in unsafe_urls {
            element.remove_attr(&name);
            report.record(SanitiseAction::UnsafeUrlRemoved, element.name(), Some(name.as_str()));
        }

        self.apply_conditional_rules(element, report);
    }

    fn apply_conditional_rules(&self, element: &mut Element, report: &mut SanitiseReport) {
        for rule in &self.conditional_rules {
            if !rule.element.eq_ignore_ascii_case(element.name()) {
                continue;
            }
            let triggered = element.attr(&rule.trigger).is_some_and(|v| !v.is_empty());
            if triggered {
                if element.attr(&rule.dependent) != Some(rule.value.as_str()) {
                    element.set_attr(rule.dependent.as_str(), rule.value.as_str());
                    report.record(
                        SanitiseAction::ConditionalAttributeSet,
                        element.name(),
                        Some(rule.dependent.as_str()),
                    );
                }
            } else if element.remove_attr(&rule.dependent).is_some() {
                report.record(
                    SanitiseAction::ConditionalAttributeRemoved,
                    element.name(),
                    Some(rule.dependent.as_str()),
                );
            }
        }
    }
}

fn lowercase_set(names: &[String]) -> HashSet<String> {
    names
        .iter()
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}

/// No element children and no text other than ASCII whitespace.
/// U+00A0 counts as content, so a padded element is not empty.
fn is_empty(element: &Element) -> bool {
    element.children().iter().all(|child| match child {
        Node::Text(text) => text.chars().all(|c| c.is_ascii_whitespace()),
        Node::Element(_) => false,
    })
}
