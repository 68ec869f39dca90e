// File: htmlscrub-core/src/validators.rs
//! Programmatic checks applied to attribute values after allow-list filtering.
//!
//! License: MIT OR APACHE 2.0

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// URL schemes that execute script when followed or loaded.
static SCRIPT_SCHEMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set = HashSet::new();
    set.extend(["javascript", "vbscript"]);
    set
});

/// Returns true if `value` is a script-executing URL.
///
/// Browsers ignore whitespace and control characters interleaved with the
/// scheme (`java\nscript:`) and compare it case-insensitively, so both are
/// normalised away before the scheme is compared.
pub fn is_unsafe_url(value: &str) -> bool {
    let mut scheme = String::new();
    for c in value.chars() {
        if c.is_whitespace() || c.is_control() {
            continue;
        }
        if c == ':' {
            return SCRIPT_SCHEMES.contains(scheme.as_str());
        }
        if !c.is_ascii_alphanumeric() && !matches!(c, '+' | '-' | '.') {
            return false;
        }
        scheme.push(c.to_ascii_lowercase());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_javascript_urls() {
        assert!(is_unsafe_url("javascript:alert(1)"));
        assert!(is_unsafe_url("  JavaScript:alert(1)"));
        assert!(is_unsafe_url("java\nscr\tipt:alert(1)"));
        assert!(is_unsafe_url("vbscript:msgbox"));
    }

    #[test]
    fn accepts_ordinary_urls() {
        assert!(!is_unsafe_url("/test"));
        assert!(!is_unsafe_url("https://example.com/javascript:"));
        assert!(!is_unsafe_url("mailto:someone@example.com"));
        assert!(!is_unsafe_url("page?next=javascript:x"));
        assert!(!is_unsafe_url(""));
    }
}
