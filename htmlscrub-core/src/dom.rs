//! dom.rs - The owned document tree the sanitiser works on.
//!
//! Every `Element` owns its children in a `Vec<Node>`, so structural edits
//! (unwrapping an element into its parent, dropping a subtree) are plain
//! index-based splices on the parent's child list. There are no parent
//! pointers and no shared ownership.
//!
//! Nothing here recurses on nesting depth. Serialization walks the tree with
//! an explicit stack and `Element` drops its subtree iteratively, so input
//! nested arbitrarily deep cannot exhaust the call stack.
//!
//! Serialization back to markup lives here too; parsing lives in
//! [`crate::parser`].
//!
//! License: MIT OR APACHE 2.0

use std::fmt::{self, Write};

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose text content html5ever parses as raw text (scripting
/// enabled), and which must therefore be serialized without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(content.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter, mostly for tests and programmatic trees.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(Node::Text(text.into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name.eq_ignore_ascii_case(name))
            .map(|attribute| attribute.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Overwrites an existing attribute in place, or appends a new one.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|attribute| attribute.name.eq_ignore_ascii_case(&name))
        {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self
            .attributes
            .iter()
            .position(|attribute| attribute.name.eq_ignore_ascii_case(name))?;
        Some(self.attributes.remove(index).value)
    }

    /// Keeps only the attributes for which `keep` returns true, returning the
    /// removed ones in their original order.
    pub fn retain_attrs<F>(&mut self, mut keep: F) -> Vec<Attribute>
    where
        F: FnMut(&Attribute) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.attributes.len());
        for attribute in self.attributes.drain(..) {
            if keep(&attribute) {
                kept.push(attribute);
            } else {
                removed.push(attribute);
            }
        }
        self.attributes = kept;
        removed
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    pub fn into_children(mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS
            .iter()
            .any(|void| void.eq_ignore_ascii_case(&self.name))
    }

    /// True when text children are written verbatim.
    pub fn is_raw_text(&self) -> bool {
        RAW_TEXT_ELEMENTS
            .iter()
            .any(|raw| raw.eq_ignore_ascii_case(&self.name))
    }
}

impl Drop for Element {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let Node::Element(mut element) = node {
                pending.append(&mut element.children);
            }
        }
    }
}

/// Replaces the element at `index` with its children, spliced into the same
/// position. Returns the number of promoted children, or `None` if `index`
/// does not hold an element.
pub fn unwrap_node(nodes: &mut Vec<Node>, index: usize) -> Option<usize> {
    if !matches!(nodes.get(index), Some(Node::Element(_))) {
        return None;
    }
    let Node::Element(element) = nodes.remove(index) else {
        return None;
    };
    let children = element.into_children();
    let promoted = children.len();
    nodes.splice(index..index, children);
    Some(promoted)
}

/// Removes the node at `index` together with its whole subtree.
pub fn remove_node(nodes: &mut Vec<Node>, index: usize) -> Option<Node> {
    (index < nodes.len()).then(|| nodes.remove(index))
}

/// A parsed HTML fragment: an ordered list of top-level nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    children: Vec<Node>,
}

impl Fragment {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Serializes the fragment back to markup.
    pub fn to_html(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nodes(f, &self.children)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nodes(f, std::slice::from_ref(self))
    }
}

enum WriteStep<'a> {
    /// A node to write; the flag marks text inside a raw-text element.
    Node(&'a Node, bool),
    EndTag(&'a str),
}

fn write_nodes<W: Write>(out: &mut W, nodes: &[Node]) -> fmt::Result {
    let mut pending: Vec<WriteStep<'_>> = nodes.iter().rev().map(|node| WriteStep::Node(node, false)).collect();

    while let Some(step) = pending.pop() {
        match step {
            WriteStep::EndTag(name) => write!(out, "</{}>", name)?,
            WriteStep::Node(Node::Text(text), true) => out.write_str(text)?,
            WriteStep::Node(Node::Text(text), false) => write_escaped(out, text, false)?,
            WriteStep::Node(Node::Element(element), _) => {
                write!(out, "<{}", element.name)?;
                for attribute in &element.attributes {
                    write!(out, " {}=\"", attribute.name)?;
                    write_escaped(out, &attribute.value, true)?;
                    out.write_char('"')?;
                }
                out.write_char('>')?;
                if element.is_void() {
                    continue;
                }
                let raw = element.is_raw_text();
                pending.push(WriteStep::EndTag(&element.name));
                pending.extend(element.children.iter().rev().map(|child| WriteStep::Node(child, raw)));
            }
        }
    }
    Ok(())
}

fn write_escaped<W: Write>(out: &mut W, text: &str, attribute_mode: bool) -> fmt::Result {
    for c in text.chars() {
        match c {
            '&' => out.write_str("&amp;")?,
            '\u{a0}' => out.write_str("&nbsp;")?,
            '"' if attribute_mode => out.write_str("&quot;")?,
            '<' if !attribute_mode => out.write_str("&lt;")?,
            '>' if !attribute_mode => out.write_str("&gt;")?,
            _ => out.write_char(c)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_attributes_in_order_with_escaping() {
        let node = Node::from(
            Element::new("a")
                .with_attr("href", "/a?b=1&c=2")
                .with_attr("title", "say \"hi\"")
                .with_text("1 < 2 & 3"),
        );
        assert_eq!(
            node.to_string(),
            "<a href=\"/a?b=1&amp;c=2\" title=\"say &quot;hi&quot;\">1 &lt; 2 &amp; 3</a>"
        );
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        let node = Node::from(Element::new("br"));
        assert_eq!(node.to_string(), "<br>");
    }

    #[test]
    fn raw_text_is_not_escaped() {
        let node = Node::from(Element::new("script").with_text("a < b"));
        assert_eq!(node.to_string(), "<script>a < b</script>");
    }

    #[test]
    fn noscript_and_iframe_content_is_raw_text() {
        let node = Node::from(Element::new("noscript").with_text("<p>x</p>"));
        assert_eq!(node.to_string(), "<noscript><p>x</p></noscript>");
        let node = Node::from(Element::new("IFRAME").with_text("a&b"));
        assert_eq!(node.to_string(), "<IFRAME>a&b</IFRAME>");
    }

    #[test]
    fn void_check_ignores_case() {
        let node = Node::from(Element::new("BR"));
        assert_eq!(node.to_string(), "<BR>");
        assert!(Element::new("Img").is_void());
    }

    #[test]
    fn deep_trees_serialize_and_drop_without_recursion() {
        const DEPTH: usize = 100_000;
        let mut element = Element::new("span").with_text("x");
        for _ in 1..DEPTH {
            element = Element::new("span").with_child(element);
        }
        let fragment = Fragment::new(vec![element.into()]);

        let html = fragment.to_html();
        assert_eq!(html.len(), DEPTH * "<span></span>".len() + 1);
        assert!(html.starts_with("<span><span>"));
        assert!(html.ends_with("x</span></span>"));
        drop(fragment);
    }

    #[test]
    fn non_breaking_space_is_an_entity() {
        let node = Node::from(Element::new("td").with_text("\u{a0}"));
        assert_eq!(node.to_string(), "<td>&nbsp;</td>");
    }

    #[test]
    fn set_attr_overwrites_in_place() {
        let mut element = Element::new("p").with_attr("a", "1").with_attr("b", "2");
        element.set_attr("A", "3");
        element.set_attr("c", "4");
        let names: Vec<_> = element.attributes().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(element.attr("a"), Some("3"));
        assert_eq!(element.remove_attr("b"), Some("2".to_string()));
        assert!(!element.has_attr("b"));
    }

    #[test]
    fn unwrap_splices_children_in_place() {
        let mut nodes = vec![
            Node::text("before"),
            Element::new("div")
                .with_text("one")
                .with_child(Element::new("em").with_text("two"))
                .into(),
            Node::text("after"),
        ];
        assert_eq!(unwrap_node(&mut nodes, 1), Some(2));
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[1], Node::text("one"));
        assert_eq!(nodes[2].as_element().map(Element::name), Some("em"));
        assert_eq!(unwrap_node(&mut nodes, 0), None);
    }

    #[test]
    fn remove_drops_subtree() {
        let mut nodes = vec![Element::new("div").with_text("x").into(), Node::text("y")];
        assert!(remove_node(&mut nodes, 0).is_some());
        assert_eq!(nodes, vec![Node::text("y")]);
        assert!(remove_node(&mut nodes, 5).is_none());
    }
}
