// htmlscrub-core/tests/policy_compiler_tests.rs
use htmlscrub_core::{compile, AttributeKind, ElementEntry, PolicyFormatError};

#[test]
fn test_compiles_attribute_kinds_in_declaration_order() {
    let policy = compile("p[default1=default1|default2=default2|force1:force1|force2:force2]").unwrap();
    let rule = policy.rule("p").unwrap();
    let names: Vec<&str> = rule.attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["default1", "default2", "force1", "force2"]);
    assert_eq!(rule.attributes[0].kind, AttributeKind::Default("default1".into()));
    assert_eq!(rule.attributes[3].kind, AttributeKind::Forced("force2".into()));
}

#[test]
fn test_unknown_elements_have_no_entry() {
    let policy = compile("p,strong").unwrap();
    assert_eq!(policy.len(), 2);
    assert!(policy.entry("div").is_none());
    assert!(policy.rule("STRONG").is_some());
}

#[test]
fn test_deny_marker_and_aliases() {
    let policy = compile("strong/b,!script").unwrap();
    assert_eq!(policy.entry("script"), Some(&ElementEntry::Deny));
    assert_eq!(policy.canonical_name("b"), Some("strong"));
    assert_eq!(policy.canonical_name("strong"), None);
}

#[test]
fn test_describe_lists_canonical_rules() {
    let policy = compile("p[id],-strong/b").unwrap();
    assert_eq!(policy.describe(), vec!["-strong", "p[id]", "strong/b"]);
}

#[test]
fn test_errors_name_the_offending_fragment() {
    let cases: &[(&str, &str)] = &[
        ("p[id", "p[id"),
        ("p[id]]", "p[id]]"),
        ("p,,strong", "p,,strong"),
        ("p,strong,", "strong,"),
        ("p[=x]", "=x"),
    ];
    for (rules, fragment) in cases {
        let err: PolicyFormatError = compile(rules).unwrap_err();
        assert!(
            err.fragment.contains(fragment),
            "rules {:?}: fragment {:?} does not contain {:?}",
            rules,
            err.fragment,
            fragment
        );
        assert!(!err.reason.is_empty());
    }
}

#[test]
fn test_empty_rule_text_is_rejected() {
    assert!(compile("").is_err());
    assert!(compile("   ").is_err());
}
