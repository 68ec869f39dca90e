//! compiler.rs - Compiles allow-list rule text into a `Policy`, with caching.
//!
//! The rule grammar is a comma-separated list of element specs:
//!
//! ```text
//! [!|-|#]name[/alias][[attr|attr=default|attr:forced|!required|-denied|attr<a?b]]
//! ```
//!
//! `@[...]` declares attributes valid on every element, and `*`, `?`, `+` turn
//! element or attribute names into wildcard patterns. Names are matched
//! case-insensitively and stored lower-cased.
//!
//! Compiled policies are cached process-wide, keyed by their rule text, so
//! repeated engine construction for the same configuration is cheap.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::errors::PolicyFormatError;
use crate::policy::{
    AttributeKind, AttributePattern, AttributeRule, ElementEntry, ElementPattern, ElementRule,
    Policy,
};

/// Element name of the global attribute rule.
const GLOBAL_ELEMENT: &str = "@";

lazy_static! {
    /// A thread-safe, global cache for compiled policies keyed by rule text.
    static ref COMPILED_POLICY_CACHE: RwLock<HashMap<String, Arc<Policy>>> = RwLock::new(HashMap::new());
}

/// One parsed attribute spec, before it is folded into an `ElementRule`.
#[derive(Debug)]
enum AttributeSpec {
    Rule(AttributeRule),
    Pattern(AttributePattern),
    /// `-name`: drop an inherited global attribute for this element.
    DenyGlobal(String),
}

#[derive(Debug)]
struct ElementSpec<'a> {
    fragment: &'a str,
    marker: Option<char>,
    name: String,
    alias: Option<String>,
    attributes: Vec<AttributeSpec>,
}

/// Compiles rule text into a `Policy`.
///
/// Fails with a `PolicyFormatError` naming the offending fragment on
/// unbalanced brackets, empty or invalid names, or contradictory attribute
/// flags. Within one element spec a redeclared attribute replaces the
/// earlier declaration; a redeclared element replaces the earlier element.
pub fn compile(rule_text: &str) -> Result<Policy, PolicyFormatError> {
    debug!("Starting compilation of allow-list policy ({} bytes).", rule_text.len());

    if rule_text.trim().is_empty() {
        return Err(PolicyFormatError::new(rule_text, "policy declares no elements"));
    }

    let mut policy = Policy::default();
    let mut globals = ElementRule::new(GLOBAL_ELEMENT);
    let mut global_denials: HashMap<String, Vec<String>> = HashMap::new();

    for fragment in split_element_specs(rule_text)? {
        let spec = parse_element_spec(fragment)?;

        if spec.name == GLOBAL_ELEMENT {
            for attribute in spec.attributes {
                match attribute {
                    AttributeSpec::Rule(rule) => globals.upsert_attribute(rule),
                    AttributeSpec::Pattern(pattern) => globals.upsert_pattern(pattern),
                    AttributeSpec::DenyGlobal(name) => {
                        warn!("Ignoring '-{}' in the global rule; there is nothing to deny.", name)
                    }
                }
            }
            continue;
        }

        let entry = if spec.marker == Some('!') {
            if !spec.attributes.is_empty() {
                warn!(
                    "Element '{}' is marked drop-subtree; its attribute rules are ignored.",
                    spec.name
                );
            }
            global_denials.remove(&spec.name);
            ElementEntry::Deny
        } else {
            let mut rule = ElementRule::new(spec.name.clone());
            rule.pad_empty = spec.marker == Some('#');
            rule.remove_empty = spec.marker == Some('-');
            let mut denied = Vec::new();
            for attribute in spec.attributes {
                match attribute {
                    AttributeSpec::Rule(attribute_rule) => rule.upsert_attribute(attribute_rule),
                    AttributeSpec::Pattern(pattern) => rule.upsert_pattern(pattern),
                    AttributeSpec::DenyGlobal(name) => denied.push(name),
                }
            }
            global_denials.insert(spec.name.clone(), denied);
            ElementEntry::Allow(rule)
        };

        if let Some(alias) = spec.alias {
            policy.aliases.insert(alias, spec.name.clone());
        }

        if has_wildcard(&spec.name) {
            let regex = wildcard_regex(spec.fragment, &spec.name)?;
            match policy
                .element_patterns
                .iter_mut()
                .find(|existing| existing.source == spec.name)
            {
                Some(existing) => existing.entry = entry,
                None => policy.element_patterns.push(ElementPattern {
                    source: spec.name,
                    regex,
                    entry,
                }),
            }
        } else {
            policy.elements.insert(spec.name, entry);
        }

        log::debug!(
            target: "htmlscrub_core::sanitizer",
            "Element spec '{}' compiled successfully.",
            fragment.trim()
        );
    }

    if policy.is_empty() {
        return Err(PolicyFormatError::new(rule_text, "policy declares no elements"));
    }

    apply_global_attributes(&mut policy, &globals, &global_denials);
    policy.global_attributes = globals.attributes;

    debug!("Finished compiling policy. Total element entries: {}.", policy.len());
    Ok(policy)
}

/// Gets a compiled `Policy` from the cache or compiles it if not found.
///
/// Returns an `Arc` so the same immutable policy can back many sanitisers.
pub fn get_or_compile_policy(rule_text: &str) -> Result<Arc<Policy>, PolicyFormatError> {
    {
        let cache = COMPILED_POLICY_CACHE
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(policy) = cache.get(rule_text) {
            debug!("Serving compiled policy from cache.");
            return Ok(Arc::clone(policy));
        }
    }

    debug!("Compiled policy not found in cache. Compiling now.");
    let compiled = Arc::new(compile(rule_text)?);

    COMPILED_POLICY_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(rule_text.to_string(), Arc::clone(&compiled));

    debug!("Successfully compiled and cached policy.");
    Ok(compiled)
}

/// Splits on commas outside of `[...]`, checking bracket balance as it goes.
///
/// An empty spec (`p,,strong`, a trailing comma) is reported together with
/// its neighbours and its 1-based position in the list.
fn split_element_specs(rule_text: &str) -> Result<Vec<&str>, PolicyFormatError> {
    let ranges = element_spec_ranges(rule_text)?;
    for (position, &(start, end)) in ranges.iter().enumerate() {
        if !rule_text[start..end].trim().is_empty() {
            continue;
        }
        let context_start = position
            .checked_sub(1)
            .map_or(start, |previous| ranges[previous].0);
        let context_end = ranges.get(position + 1).map_or(end, |next| next.1);
        return Err(PolicyFormatError::new(
            rule_text[context_start..context_end].trim(),
            format!("empty element spec at position {}", position + 1),
        ));
    }
    Ok(ranges.into_iter().map(|(start, end)| &rule_text[start..end]).collect())
}

fn element_spec_ranges(rule_text: &str) -> Result<Vec<(usize, usize)>, PolicyFormatError> {
    let mut specs = Vec::new();
    let mut in_brackets = false;
    let mut start = 0usize;

    for (i, c) in rule_text.char_indices() {
        match c {
            '[' if in_brackets => {
                return Err(PolicyFormatError::new(
                    rule_text[start..=i].trim(),
                    "nested '[' inside an attribute list",
                ));
            }
            '[' => in_brackets = true,
            ']' if !in_brackets => {
                return Err(PolicyFormatError::new(
                    rule_text[start..=i].trim(),
                    "unbalanced ']' without a matching '['",
                ));
            }
            ']' => in_brackets = false,
            ',' if !in_brackets => {
                specs.push((start, i));
                start = i + 1;
            }
            _ => {}
        }
    }

    if in_brackets {
        return Err(PolicyFormatError::new(
            rule_text[start..].trim(),
            "unbalanced '[' without a closing ']'",
        ));
    }
    specs.push((start, rule_text.len()));
    Ok(specs)
}

fn parse_element_spec(fragment: &str) -> Result<ElementSpec<'_>, PolicyFormatError> {
    let spec = fragment.trim();

    let (head, attribute_list) = match spec.find('[') {
        Some(open) => {
            let close = spec
                .rfind(']')
                .ok_or_else(|| PolicyFormatError::new(spec, "unbalanced '[' without a closing ']'"))?;
            if !spec[close + 1..].trim().is_empty() {
                return Err(PolicyFormatError::new(spec, "unexpected text after ']'"));
            }
            (&spec[..open], Some(&spec[open + 1..close]))
        }
        None => (spec, None),
    };

    let head = head.trim();
    let (marker, head) = match head.chars().next() {
        Some(c @ ('!' | '-' | '#')) => (Some(c), head[1..].trim_start()),
        _ => (None, head),
    };

    let mut parts = head.split('/');
    let name = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
    let alias = parts.next().map(|alias| alias.trim().to_ascii_lowercase());
    if parts.next().is_some() {
        return Err(PolicyFormatError::new(spec, "more than one '/' alias separator"));
    }

    if name.is_empty() {
        return Err(PolicyFormatError::new(spec, "empty element name"));
    }
    if name == GLOBAL_ELEMENT {
        if marker.is_some() || alias.is_some() {
            return Err(PolicyFormatError::new(
                spec,
                "the global '@' rule takes no marker or alias",
            ));
        }
    } else if !is_valid_name(&name) {
        return Err(PolicyFormatError::new(spec, "invalid element name"));
    }

    if let Some(alias) = &alias {
        if !is_valid_name(alias) || has_wildcard(alias) {
            return Err(PolicyFormatError::new(spec, "invalid alias name"));
        }
        if has_wildcard(&name) {
            return Err(PolicyFormatError::new(
                spec,
                "wildcard elements cannot declare an alias",
            ));
        }
    }

    let attributes = match attribute_list {
        Some(list) if !list.trim().is_empty() => list
            .split('|')
            .map(|attribute| parse_attribute_spec(spec, attribute))
            .collect::<Result<Vec<_>, _>>()?,
        _ => Vec::new(),
    };

    Ok(ElementSpec {
        fragment,
        marker,
        name,
        alias,
        attributes,
    })
}

fn parse_attribute_spec(element_spec: &str, raw: &str) -> Result<AttributeSpec, PolicyFormatError> {
    let spec = raw.trim();
    if spec.is_empty() {
        return Err(PolicyFormatError::new(element_spec, "empty attribute spec"));
    }

    let (flag, rest) = match spec.chars().next() {
        Some(c @ ('!' | '-')) => (Some(c), spec[1..].trim_start()),
        _ => (None, spec),
    };

    let mut name = String::new();
    let mut operator: Option<(char, &str)> = None;
    let mut chars = rest.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            // `ns::attr` spells a namespaced attribute.
            ':' if matches!(chars.peek(), Some((_, ':'))) => {
                chars.next();
                name.push(':');
            }
            '=' | ':' | '<' => {
                operator = Some((c, rest[i + 1..].trim()));
                break;
            }
            _ => name.push(c),
        }
    }

    let name = name.trim().to_ascii_lowercase();
    if name.is_empty() {
        return Err(PolicyFormatError::new(spec, "empty attribute name"));
    }
    if !is_valid_name(&name) {
        return Err(PolicyFormatError::new(spec, "invalid attribute name"));
    }

    if flag == Some('-') {
        if operator.is_some() {
            return Err(PolicyFormatError::new(spec, "a denied attribute takes no value"));
        }
        return Ok(AttributeSpec::DenyGlobal(name));
    }
    let required = flag == Some('!');

    let (kind, valid_values) = match operator {
        None => (AttributeKind::Plain, None),
        Some(('=', value)) => (AttributeKind::Default(value.to_string()), None),
        Some((':', value)) => (AttributeKind::Forced(value.to_string()), None),
        Some((_, value)) => {
            let values: Vec<String> = value
                .split('?')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            if values.is_empty() {
                return Err(PolicyFormatError::new(spec, "empty valid-value list after '<'"));
            }
            (AttributeKind::Plain, Some(values))
        }
    };

    if has_wildcard(&name) {
        if required || kind != AttributeKind::Plain {
            return Err(PolicyFormatError::new(
                spec,
                "wildcard attributes cannot be required, defaulted or forced",
            ));
        }
        let regex = wildcard_regex(spec, &name)?;
        return Ok(AttributeSpec::Pattern(AttributePattern {
            source: name,
            regex,
            valid_values,
        }));
    }

    Ok(AttributeSpec::Rule(AttributeRule {
        name,
        kind,
        required,
        valid_values,
    }))
}

/// Folds the `@` rule into every allowed element: inherited rules come first,
/// the element's own declarations override them and `-name` removes them.
fn apply_global_attributes(
    policy: &mut Policy,
    globals: &ElementRule,
    denials: &HashMap<String, Vec<String>>,
) {
    if globals.attributes.is_empty() && globals.attribute_patterns.is_empty() {
        return;
    }

    let entries = policy
        .elements
        .iter_mut()
        .map(|(name, entry)| (name.as_str(), entry))
        .chain(
            policy
                .element_patterns
                .iter_mut()
                .map(|pattern| (pattern.source.as_str(), &mut pattern.entry)),
        );

    for (name, entry) in entries {
        let ElementEntry::Allow(rule) = entry else {
            continue;
        };
        let denied: &[String] = denials.get(name).map(Vec::as_slice).unwrap_or(&[]);

        let mut merged: Vec<AttributeRule> = globals
            .attributes
            .iter()
            .filter(|global| !denied.contains(&global.name) && rule.attribute(&global.name).is_none())
            .cloned()
            .collect();
        merged.append(&mut rule.attributes);
        rule.attributes = merged;

        for pattern in &globals.attribute_patterns {
            let overridden = rule
                .attribute_patterns
                .iter()
                .any(|own| own.source == pattern.source);
            if !denied.contains(&pattern.source) && !overridden {
                rule.attribute_patterns.push(pattern.clone());
            }
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-' | '*' | '?' | '+'))
}

fn has_wildcard(name: &str) -> bool {
    name.chars().any(|c| matches!(c, '*' | '?' | '+'))
}

/// `*` -> any run, `?` -> optional character, `+` -> one or more characters.
fn wildcard_regex(fragment: &str, name: &str) -> Result<Regex, PolicyFormatError> {
    let mut pattern = String::from("^");
    for c in name.chars() {
        match c {
            '*' | '?' | '+' => {
                pattern.push('.');
                pattern.push(c);
            }
            _ => pattern.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
        .map_err(|e| PolicyFormatError::new(fragment.trim(), format!("invalid wildcard: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow<'a>(policy: &'a Policy, tag: &str) -> &'a ElementRule {
        policy.rule(tag).unwrap_or_else(|| panic!("'{}' should be allowed", tag))
    }

    #[test]
    fn compiles_plain_elements() {
        let policy = compile("p,strong").unwrap();
        assert_eq!(policy.len(), 2);
        assert!(policy.rule("p").is_some());
        assert!(policy.rule("STRONG").is_some());
        assert!(policy.entry("div").is_none());
    }

    #[test]
    fn compiles_attribute_kinds() {
        let policy =
            compile("p[default1=default1|default2=default2|force1:force1|force2:force2]").unwrap();
        let rule = allow(&policy, "p");
        let defaults: Vec<_> = rule.defaults().collect();
        let forced: Vec<_> = rule.forced().collect();
        assert_eq!(defaults, vec![("default1", "default1"), ("default2", "default2")]);
        assert_eq!(forced, vec![("force1", "force1"), ("force2", "force2")]);
    }

    #[test]
    fn tolerates_whitespace_and_case() {
        let policy = compile("  P [ ID | Class = Lead ] , A[ HREF ]  ").unwrap();
        let p = allow(&policy, "p");
        assert!(p.attribute("id").is_some());
        assert_eq!(
            p.attribute("class").map(|r| &r.kind),
            Some(&AttributeKind::Default("Lead".into()))
        );
        assert!(allow(&policy, "a").attribute("href").is_some());
    }

    #[test]
    fn last_attribute_declaration_wins() {
        let policy = compile("p[id=first|class|id:second]").unwrap();
        let rule = allow(&policy, "p");
        assert_eq!(rule.attributes.len(), 2);
        assert_eq!(rule.attributes[0].name, "id");
        assert_eq!(rule.attributes[0].kind, AttributeKind::Forced("second".into()));
    }

    #[test]
    fn forced_value_may_contain_commas() {
        let policy = compile("a[href|rel:noopener, noreferrer],p").unwrap();
        let rule = allow(&policy, "a");
        assert_eq!(
            rule.attribute("rel").map(|r| &r.kind),
            Some(&AttributeKind::Forced("noopener, noreferrer".into()))
        );
        assert!(policy.rule("p").is_some());
    }

    #[test]
    fn drop_subtree_marker_compiles_to_deny() {
        let policy = compile("p,!script").unwrap();
        assert!(policy.is_denied("script"));
        assert!(policy.rule("script").is_none());
    }

    #[test]
    fn global_attributes_are_inherited_unless_denied() {
        let policy = compile("@[id|class],p,span[-class|title]").unwrap();
        let p = allow(&policy, "p");
        assert!(p.attribute("id").is_some());
        assert!(p.attribute("class").is_some());

        let span = allow(&policy, "span");
        assert!(span.attribute("id").is_some());
        assert!(span.attribute("class").is_none());
        assert_eq!(span.attributes.last().map(|r| r.name.as_str()), Some("title"));
    }

    #[test]
    fn wildcards_match_elements_and_attributes() {
        let policy = compile("h+[data-*],td?").unwrap();
        assert!(policy.rule("h1").is_some());
        assert!(policy.rule("h").is_none());
        assert!(policy.rule("td").is_some());
        let heading = allow(&policy, "h2");
        assert!(heading.allows_attribute("data-id", "7"));
        assert!(!heading.allows_attribute("onclick", "x"));
    }

    #[test]
    fn aliases_resolve_to_canonical_rule() {
        let policy = compile("strong/b").unwrap();
        assert_eq!(policy.canonical_name("b"), Some("strong"));
        assert_eq!(policy.canonical_name("strong"), None);
        assert!(policy.rule("b").is_some());
    }

    #[test]
    fn valid_values_and_required_flags() {
        let policy = compile("img[!src|align<left?right]").unwrap();
        let img = allow(&policy, "img");
        assert_eq!(img.required_attributes().collect::<Vec<_>>(), vec!["src"]);
        assert!(img.allows_attribute("align", "left"));
        assert!(!img.allows_attribute("align", "center"));
    }

    #[test]
    fn namespaced_attribute_syntax() {
        let policy = compile("use[xlink::href]").unwrap();
        assert!(allow(&policy, "use").attribute("xlink:href").is_some());
    }

    #[test]
    fn element_markers_set_flags() {
        let policy = compile("-span,#td").unwrap();
        assert!(allow(&policy, "span").remove_empty);
        assert!(allow(&policy, "td").pad_empty);
    }

    #[test]
    fn rejects_malformed_rule_text() {
        let cases = [
            ("p[id", "p[id"),
            ("p]id", "p]"),
            ("p,,strong", "p,,strong"),
            ("p,strong,", "strong,"),
            ("p[id|]", "p[id|]"),
            ("p[id]x", "p[id]x"),
            ("[id]", "[id]"),
            ("p[a[b]]", "p[a["),
            ("a/b/c", "a/b/c"),
            ("p[data-*=x]", "data-*=x"),
            ("", ""),
        ];
        for (input, fragment) in cases {
            let err = compile(input).expect_err(input);
            assert_eq!(err.fragment, fragment, "fragment for '{}'", input);
        }
    }

    #[test]
    fn empty_spec_error_names_its_position() {
        let err = compile("p,em,,strong").unwrap_err();
        assert_eq!(err.fragment, "em,,strong");
        assert_eq!(err.reason, "empty element spec at position 3");

        let err = compile(",p").unwrap_err();
        assert_eq!(err.fragment, ",p");
        assert_eq!(err.reason, "empty element spec at position 1");
    }

    #[test]
    fn global_rule_alone_is_not_a_policy() {
        assert!(compile("@[id]").is_err());
    }

    #[test]
    fn cache_returns_shared_instance() {
        let first = get_or_compile_policy("p[id],em").unwrap();
        let second = get_or_compile_policy("p[id],em").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
