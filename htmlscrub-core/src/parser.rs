//! parser.rs - Builds a `Fragment` from markup.
//!
//! Parsing is delegated to `scraper` (html5ever) in body-fragment context, so
//! malformed markup is repaired exactly as a browser would repair it. The
//! resulting tree is converted into the owned `dom` tree; comments, doctypes
//! and processing instructions are discarded. Attribute order is preserved,
//! and namespaced attributes keep their prefix (`xlink:href`).
//!
//! The conversion walks the parsed tree with an explicit stack of open
//! elements, so nesting depth is bounded only by memory.
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use scraper::{ElementRef, Html};

use crate::dom::{Element, Fragment, Node};

impl Fragment {
    /// Parses an HTML fragment such as the body of a rich-text field.
    pub fn parse(markup: &str) -> Self {
        let html = Html::parse_fragment(markup);
        let children = convert_children(html.root_element());
        debug!(
            "Parsed fragment of {} bytes into {} top-level nodes.",
            markup.len(),
            children.len()
        );
        Fragment::new(children)
    }
}

/// Convenience wrapper around [`Fragment::parse`].
pub fn parse_fragment(markup: &str) -> Fragment {
    Fragment::parse(markup)
}

fn convert_children(root: ElementRef<'_>) -> Vec<Node> {
    // Each entry is the next source child to visit and the element collecting
    // the converted children; the bottom entry stands in for the fragment.
    let mut open = vec![(root.first_child(), Element::new(""))];

    loop {
        let Some((cursor, target)) = open.last_mut() else {
            return Vec::new();
        };
        let Some(source) = *cursor else {
            let Some((_, finished)) = open.pop() else {
                return Vec::new();
            };
            match open.last_mut() {
                Some((_, parent)) => parent.children_mut().push(Node::Element(finished)),
                None => return finished.into_children(),
            }
            continue;
        };
        *cursor = source.next_sibling();

        match source.value() {
            scraper::Node::Text(text) => {
                let content: &str = text;
                target.children_mut().push(Node::text(content));
            }
            scraper::Node::Element(value) => {
                let element = convert_element(value);
                open.push((source.first_child(), element));
            }
            _ => {}
        }
    }
}

fn convert_element(value: &scraper::node::Element) -> Element {
    let mut element = Element::new(value.name());
    for (name, attribute_value) in &value.attrs {
        let qualified = match &name.prefix {
            Some(prefix) => format!("{}:{}", prefix, name.local),
            None => name.local.to_string(),
        };
        element.set_attr(qualified, attribute_value.to_string());
    }
    element
}
