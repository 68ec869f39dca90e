// htmlscrub-core/tests/sanitiser_tests.rs
//! End-to-end sanitisation through the public API: parse, sanitise against a
//! compiled policy, serialise.

use anyhow::Result;
use std::sync::Arc;

use htmlscrub_core::{
    compile, ConditionalRule, Element, Fragment, HtmlEngine, Node, SanitiseAction, SanitizationEngine,
    SanitiserConfig, TreeSanitiser,
};

const REL: &str = "noopener, noreferrer";

fn config(rules: &str) -> SanitiserConfig {
    SanitiserConfig::from_valid_elements(rules).with_link_rel_value(Some(REL.to_string()))
}

fn sanitise(rules: &str, input: &str) -> Result<String> {
    let engine = HtmlEngine::new(config(rules))?;
    Ok(engine.sanitize(input, "test")?.0)
}

#[test_log::test]
fn test_literal_scenarios() -> Result<()> {
    let cases = [
        (
            "p,strong",
            "<p>Leave Alone</p><div>Strip parent<strong>But keep children</strong> in order</div>",
            "<p>Leave Alone</p>Strip parent<strong>But keep children</strong> in order",
        ),
        ("p[id]", "<p id=\"keep\" bad=\"strip\">Test</p>", "<p id=\"keep\">Test</p>"),
        (
            "p[default1=default1|default2=default2|force1:force1|force2:force2]",
            "<p default1=\"specific1\" force1=\"specific1\">Test</p>",
            "<p default1=\"specific1\" force1=\"force1\" default2=\"default2\" force2=\"force2\">Test</p>",
        ),
        (
            "a[href|target|rel]",
            "<a href=\"/test\" target=\"_blank\">Test</a>",
            "<a href=\"/test\" target=\"_blank\" rel=\"noopener, noreferrer\">Test</a>",
        ),
        (
            "a[href|target|rel]",
            "<a href=\"/test\" rel=\"noopener, noreferrer\">Test</a>",
            "<a href=\"/test\">Test</a>",
        ),
    ];
    for (rules, input, expected) in cases {
        assert_eq!(sanitise(rules, input)?, expected, "rules: {}", rules);
    }
    Ok(())
}

#[test_log::test]
fn test_forced_value_ignores_input() -> Result<()> {
    for input in ["<p>x</p>", "<p class=\"me\">x</p>", "<p class=\"note\">x</p>"] {
        assert_eq!(sanitise("p[class:note]", input)?, "<p class=\"note\">x</p>");
    }
    Ok(())
}

#[test_log::test]
fn test_sanitising_twice_changes_nothing() -> Result<()> {
    let engine = HtmlEngine::new(SanitiserConfig::load_default_config()?)?;
    let inputs = [
        "<div><p align=\"centre\" onclick=\"x()\">a<b>b</b><i></i></p></div>",
        "<table><tr><td></td><th> </th></tr></table>",
        "<a href=\"javascript:alert(1)\" target=\"_blank\">x</a><img alt=\"no src\">",
        "<h2 align=\"left\"><span></span>Heading</h2><script>alert(1)</script><style>p{}</style>",
        "<ul><li><span> </span></li></ul><iframe src=\"/x\"><p>inside</p></iframe>",
    ];
    for input in inputs {
        let (once, _) = engine.sanitize(input, "first")?;
        let (twice, summary) = engine.sanitize(&once, "second")?;
        assert_eq!(twice, once, "input: {}", input);
        assert!(summary.is_empty(), "second pass changed {:?}", summary);
    }
    Ok(())
}

#[test_log::test]
fn test_default_config_on_editor_content() -> Result<()> {
    let engine = HtmlEngine::new(SanitiserConfig::load_default_config()?)?;
    let (output, _) = engine.sanitize(
        "<p class=\"lead\" style=\"color:red\">Hi <b>there</b></p><iframe src=\"//evil\"></iframe>\
         <a href=\"/x\" target=\"_blank\">x</a><img src=\"/i.png\">",
        "editor",
    )?;
    assert_eq!(
        output,
        "<p class=\"lead\">Hi <strong>there</strong></p>\
         <a href=\"/x\" target=\"_blank\" rel=\"noopener noreferrer\">x</a><img src=\"/i.png\" alt=\"\">"
    );
    Ok(())
}

#[test_log::test]
fn test_programmatic_tree() {
    let policy = Arc::new(compile("p[id]").unwrap());
    let sanitiser = TreeSanitiser::new(policy, &config("p[id]"));
    let mut fragment = Fragment::new(vec![
        Element::new("section")
            .with_child(Element::new("p").with_attr("id", "a").with_attr("", "nameless").with_text("one"))
            .into(),
        Node::text("two"),
    ]);

    let report = sanitiser.sanitise(&mut fragment);

    assert_eq!(fragment.to_html(), "<p id=\"a\">one</p>two");
    assert_eq!(report.count(SanitiseAction::ElementUnwrapped), 1);
    assert_eq!(report.count(SanitiseAction::AttributeRemoved), 1);
}

#[test_log::test]
fn test_custom_conditional_rule() {
    let rules = "img[src|alt|title]";
    let sanitiser = TreeSanitiser::new(Arc::new(compile(rules).unwrap()), &config(rules))
        .with_conditional_rule(ConditionalRule {
            element: "img".to_string(),
            trigger: "alt".to_string(),
            dependent: "title".to_string(),
            value: "image".to_string(),
        });

    let mut fragment = Fragment::parse("<img src=\"/a\" alt=\"A\"><img src=\"/b\" title=\"t\">");
    sanitiser.sanitise(&mut fragment);
    assert_eq!(
        fragment.to_html(),
        "<img src=\"/a\" alt=\"A\" title=\"image\"><img src=\"/b\">"
    );
}

#[test_log::test]
fn test_raw_text_elements_are_stable_across_passes() -> Result<()> {
    let cases = [
        ("p,noscript", "<noscript><p>x</p></noscript>"),
        ("iframe", "<iframe>a&b</iframe>"),
        ("xmp", "<xmp><b>&amp;</b></xmp>"),
    ];
    for (rules, input) in cases {
        let once = sanitise(rules, input)?;
        assert_eq!(once, input, "rules: {}", rules);
        assert_eq!(sanitise(rules, &once)?, once, "rules: {}", rules);
    }
    Ok(())
}

#[test_log::test]
fn test_namespaced_attributes_match_parsed_input() -> Result<()> {
    let input = "<svg><use xlink:href=\"#a\" onclick=\"x()\"></use></svg>";
    assert_eq!(
        sanitise("svg,use[xlink::href]", input)?,
        "<svg><use xlink:href=\"#a\"></use></svg>"
    );
    Ok(())
}

#[test]
fn test_deeply_nested_input_does_not_exhaust_the_stack() -> Result<()> {
    const DEPTH: usize = 100_000;
    let nested = format!("{}x{}", "<span>".repeat(DEPTH), "</span>".repeat(DEPTH));

    assert_eq!(sanitise("span", &nested)?, nested);
    assert_eq!(sanitise("p", &format!("<div>{}</div>", nested))?, "x");
    Ok(())
}
