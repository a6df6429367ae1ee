//! Integration tests for the tree matcher: `find` across initial-match
//! strategies, combinator resolution, group alternation, and incremental
//! narrowing.

use std::collections::HashSet;

use quoll_css::error::CssError;
use quoll_css::traverser::DomTraverser;
use quoll_dom::{AttributesMap, DomTree, ElementData, NodeId, NodeType};

fn alloc_element(tree: &mut DomTree, tag: &str) -> NodeId {
    tree.alloc(NodeType::Element(ElementData::new(tag)))
}

fn alloc_element_with_attrs(tree: &mut DomTree, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
    let mut map = AttributesMap::new();
    for (name, value) in attrs {
        let _ = map.insert((*name).to_string(), (*value).to_string());
    }
    tree.alloc(NodeType::Element(ElementData {
        tag_name: tag.to_string(),
        prefix: None,
        attrs: map,
    }))
}

fn find(tree: &DomTree, selector: &str) -> HashSet<NodeId> {
    let mut traverser = DomTraverser::new(tree);
    let _ = traverser.find(selector).expect("selector should match");
    traverser.into_matches()
}

fn set(ids: &[NodeId]) -> HashSet<NodeId> {
    ids.iter().copied().collect()
}

/// Build:
/// ```text
/// <html>
///   <body>
///     <div id="main" class="container wide">
///       <p class="intro">first</p>
///       <p>second</p>
///       <span/>
///       <p class="outro">third</p>
///     </div>
///     <div class="container">
///       <a href="/foo/bar">rel</a>
///       <a href="http://example.com/foo/bar">abs</a>
///     </div>
///   </body>
/// </html>
/// ```
struct Fixture {
    tree: DomTree,
    html: NodeId,
    body: NodeId,
    main: NodeId,
    p1: NodeId,
    p2: NodeId,
    span: NodeId,
    p3: NodeId,
    second_div: NodeId,
    rel_link: NodeId,
    abs_link: NodeId,
}

fn fixture() -> Fixture {
    let mut tree = DomTree::new();
    let html = alloc_element(&mut tree, "html");
    let body = alloc_element(&mut tree, "body");
    let main = alloc_element_with_attrs(
        &mut tree,
        "div",
        &[("id", "main"), ("class", "container wide")],
    );
    let p1 = alloc_element_with_attrs(&mut tree, "p", &[("class", "intro")]);
    let t1 = tree.alloc(NodeType::Text("first".to_string()));
    let p2 = alloc_element(&mut tree, "p");
    let t2 = tree.alloc(NodeType::Text("second".to_string()));
    let span = alloc_element(&mut tree, "span");
    let p3 = alloc_element_with_attrs(&mut tree, "p", &[("class", "outro")]);
    let t3 = tree.alloc(NodeType::Text("third".to_string()));
    let second_div = alloc_element_with_attrs(&mut tree, "div", &[("class", "container")]);
    let rel_link = alloc_element_with_attrs(&mut tree, "a", &[("href", "/foo/bar")]);
    let abs_link =
        alloc_element_with_attrs(&mut tree, "a", &[("href", "http://example.com/foo/bar")]);

    tree.append_child(NodeId::ROOT, html);
    tree.append_child(html, body);
    tree.append_child(body, main);
    tree.append_child(main, p1);
    tree.append_child(p1, t1);
    tree.append_child(main, p2);
    tree.append_child(p2, t2);
    tree.append_child(main, span);
    tree.append_child(main, p3);
    tree.append_child(p3, t3);
    tree.append_child(body, second_div);
    tree.append_child(second_div, rel_link);
    tree.append_child(second_div, abs_link);

    Fixture {
        tree,
        html,
        body,
        main,
        p1,
        p2,
        span,
        p3,
        second_div,
        rel_link,
        abs_link,
    }
}

// ========== initial-match strategies ==========

#[test]
fn test_find_by_tag_name() {
    let f = fixture();
    assert_eq!(find(&f.tree, "p"), set(&[f.p1, f.p2, f.p3]));
    assert_eq!(find(&f.tree, "span"), set(&[f.span]));
    assert_eq!(find(&f.tree, "nosuch"), set(&[]));
}

#[test]
fn test_find_wildcard() {
    let f = fixture();
    let all = find(&f.tree, "*");
    assert_eq!(
        all,
        set(&[
            f.html,
            f.body,
            f.main,
            f.p1,
            f.p2,
            f.span,
            f.p3,
            f.second_div,
            f.rel_link,
            f.abs_link,
        ])
    );
}

#[test]
fn test_find_by_id() {
    let f = fixture();
    assert_eq!(find(&f.tree, "#main"), set(&[f.main]));
    assert_eq!(find(&f.tree, "div#main"), set(&[f.main]));
    assert_eq!(find(&f.tree, "#nosuch"), set(&[]));
    // The id seed still honors the rest of the compound.
    assert_eq!(find(&f.tree, "p#main"), set(&[]));
}

#[test]
fn test_find_by_class() {
    let f = fixture();
    assert_eq!(find(&f.tree, ".container"), set(&[f.main, f.second_div]));
    // All classes must be present.
    assert_eq!(find(&f.tree, ".container.wide"), set(&[f.main]));
    assert_eq!(find(&f.tree, ".nosuch"), set(&[]));
    // Tag plus class goes through the element seed.
    assert_eq!(find(&f.tree, "p.intro"), set(&[f.p1]));
}

#[test]
fn test_find_by_attribute() {
    let f = fixture();
    assert_eq!(
        find(&f.tree, "[href]"),
        set(&[f.rel_link, f.abs_link])
    );
    // The prefix anchor distinguishes the relative link from the absolute
    // one that merely contains /foo/.
    assert_eq!(find(&f.tree, "[src^=\"/foo/\"]"), set(&[]));
    assert_eq!(find(&f.tree, "[href^=\"/foo/\"]"), set(&[f.rel_link]));
    assert_eq!(
        find(&f.tree, "[href*=\"/foo/\"]"),
        set(&[f.rel_link, f.abs_link])
    );
}

#[test]
fn test_find_namespaced_elements() {
    // <root xmlns:foo="urn:foo"><foo:item/><item/></root>
    let mut tree = DomTree::new();
    let root = alloc_element_with_attrs(&mut tree, "root", &[("xmlns:foo", "urn:foo")]);
    let ns_item = tree.alloc(NodeType::Element(ElementData {
        tag_name: "item".to_string(),
        prefix: Some("foo".to_string()),
        attrs: AttributesMap::new(),
    }));
    let plain_item = alloc_element(&mut tree, "item");
    tree.append_child(NodeId::ROOT, root);
    tree.append_child(root, ns_item);
    tree.append_child(root, plain_item);

    // A namespace prefix restricts to elements in that namespace.
    assert_eq!(find(&tree, "foo|item"), set(&[ns_item]));
    // The namespace wildcard takes both.
    assert_eq!(find(&tree, "*|item"), set(&[ns_item, plain_item]));
    // An unbound prefix matches nothing.
    assert_eq!(find(&tree, "bar|item"), set(&[]));
    // ns|* takes every element in the namespace.
    assert_eq!(find(&tree, "foo|*"), set(&[ns_item]));
}

// ========== combinators ==========

#[test]
fn test_direct_descendant_combinator() {
    let f = fixture();
    assert_eq!(find(&f.tree, "div > p"), set(&[f.p1, f.p2, f.p3]));
    assert_eq!(find(&f.tree, "body > p"), set(&[]));
    assert_eq!(find(&f.tree, "body > div > p"), set(&[f.p1, f.p2, f.p3]));
}

#[test]
fn test_any_descendant_combinator() {
    let f = fixture();
    assert_eq!(find(&f.tree, "body p"), set(&[f.p1, f.p2, f.p3]));
    assert_eq!(find(&f.tree, "html a"), set(&[f.rel_link, f.abs_link]));
    assert_eq!(find(&f.tree, "span a"), set(&[]));
}

#[test]
fn test_adjacent_combinator() {
    let f = fixture();
    // p2 immediately follows p1; the span sits between p2 and p3.
    assert_eq!(find(&f.tree, "p + p"), set(&[f.p2]));
    assert_eq!(find(&f.tree, "span + p"), set(&[f.p3]));
    assert_eq!(find(&f.tree, "p + span"), set(&[f.span]));
}

#[test]
fn test_adjacent_skips_text_nodes() {
    // <div><a/>text<b/></div>: b is adjacent to a despite the text node.
    let mut tree = DomTree::new();
    let div = alloc_element(&mut tree, "div");
    let a = alloc_element(&mut tree, "a");
    let text = tree.alloc(NodeType::Text("between".to_string()));
    let b = alloc_element(&mut tree, "b");
    tree.append_child(NodeId::ROOT, div);
    tree.append_child(div, a);
    tree.append_child(div, text);
    tree.append_child(div, b);

    assert_eq!(find(&tree, "a + b"), set(&[b]));
}

#[test]
fn test_sibling_combinator() {
    let f = fixture();
    // Any preceding sibling will do.
    assert_eq!(find(&f.tree, "p ~ p"), set(&[f.p2, f.p3]));
    assert_eq!(find(&f.tree, "p ~ span"), set(&[f.span]));
    // Only elements to the left count.
    assert_eq!(find(&f.tree, "span ~ p"), set(&[f.p3]));
}

#[test]
fn test_compound_chain() {
    let f = fixture();
    assert_eq!(
        find(&f.tree, "div.container.wide > p.intro"),
        set(&[f.p1])
    );
    assert_eq!(find(&f.tree, "#main .intro"), set(&[f.p1]));
    assert_eq!(find(&f.tree, "#main > .intro"), set(&[f.p1]));
    assert_eq!(find(&f.tree, "#main > a"), set(&[]));
}

#[test]
fn test_group_alternation() {
    let f = fixture();
    // Groups act as OR; survivors are unioned.
    assert_eq!(find(&f.tree, "span, a"), set(&[f.span, f.rel_link, f.abs_link]));
    assert_eq!(find(&f.tree, "#main, .outro"), set(&[f.main, f.p3]));
    // A node matching several groups appears once.
    assert_eq!(find(&f.tree, "p.intro, .intro"), set(&[f.p1]));
}

// ========== pseudo-classes through find ==========

#[test]
fn test_find_with_pseudo_classes() {
    let f = fixture();
    assert_eq!(find(&f.tree, "p:first-child"), set(&[f.p1]));
    assert_eq!(find(&f.tree, "p:last-child"), set(&[f.p3]));
    assert_eq!(find(&f.tree, "div p:nth-child(2)"), set(&[f.p2]));
    assert_eq!(find(&f.tree, "p:contains(second)"), set(&[f.p2]));
    assert_eq!(find(&f.tree, "p:not(.intro)"), set(&[f.p2, f.p3]));
    assert_eq!(find(&f.tree, ":root"), set(&[f.html]));
}

#[test]
fn test_find_empty() {
    let f = fixture();
    assert_eq!(find(&f.tree, "span:empty"), set(&[f.span]));
    assert_eq!(find(&f.tree, "p:empty"), set(&[]));
}

#[test]
fn test_unknown_pseudo_class_fails_the_query() {
    let f = fixture();
    let mut traverser = DomTraverser::new(&f.tree);
    assert!(matches!(
        traverser.find("p:no-such-class"),
        Err(CssError::Parse(_))
    ));
}

// ========== pseudo-elements through find ==========

#[test]
fn test_pseudo_element_requires_text_content() {
    let f = fixture();
    // ::before anchors to text content; the empty span has none.
    assert_eq!(find(&f.tree, "p::before"), set(&[f.p1, f.p2, f.p3]));
    assert_eq!(find(&f.tree, "span::before"), set(&[]));
    assert_eq!(find(&f.tree, "p::first-letter"), set(&[f.p1, f.p2, f.p3]));
}

#[test]
fn test_selection_pseudo_element_is_not_implemented() {
    let f = fixture();
    let mut traverser = DomTraverser::new(&f.tree);
    assert!(matches!(
        traverser.find("p::selection"),
        Err(CssError::NotImplemented(_))
    ));
}

// ========== incremental narrowing ==========

#[test]
fn test_chained_find_narrows_within_subtrees() {
    let f = fixture();
    let mut traverser = DomTraverser::new(&f.tree);
    let _ = traverser
        .find("div.wide")
        .expect("first query")
        .find("p")
        .expect("second query");

    // Only paragraphs inside the first result's subtree remain.
    assert_eq!(traverser.matches(), &set(&[f.p1, f.p2, f.p3]));
}

#[test]
fn test_initialized_candidates_filter_in_place() {
    let f = fixture();
    let candidates = set(&[f.p1, f.p2, f.span, f.p3]);
    let mut traverser = DomTraverser::with_candidates(&f.tree, candidates, true, None);
    let _ = traverser.find("p").expect("filter");

    // Pre-initialized candidates are tested as-is, never expanded to
    // their subtrees.
    assert_eq!(traverser.matches(), &set(&[f.p1, f.p2, f.p3]));
}

#[test]
fn test_scope_resolution() {
    let f = fixture();

    // :scope resolves to the explicitly supplied scope node...
    let candidates = set(&[f.p1, f.p2, f.span, f.p3, f.main]);
    let mut traverser =
        DomTraverser::with_candidates(&f.tree, candidates, true, Some(f.main));
    let _ = traverser.find(":scope").expect("scope query");
    assert_eq!(traverser.matches(), &set(&[f.main]));

    // ...and defaults to the document element otherwise.
    let mut traverser = DomTraverser::new(&f.tree);
    let _ = traverser.find(":scope").expect("scope query");
    assert_eq!(traverser.matches(), &set(&[f.html]));
}

// ========== edge cases ==========

#[test]
fn test_detached_node_fails_combinators_gracefully() {
    let mut tree = DomTree::new();
    let root = alloc_element(&mut tree, "root");
    tree.append_child(NodeId::ROOT, root);
    // Allocated but never attached.
    let detached = alloc_element(&mut tree, "b");

    let mut traverser = DomTraverser::with_candidates(&tree, set(&[detached]), true, None);
    let _ = traverser.find("a > b").expect("query");
    assert!(traverser.matches().is_empty());

    let mut traverser = DomTraverser::with_candidates(&tree, set(&[detached]), true, None);
    let _ = traverser.find("a b").expect("query");
    assert!(traverser.matches().is_empty());

    let mut traverser = DomTraverser::with_candidates(&tree, set(&[detached]), true, None);
    let _ = traverser.find("a + b").expect("query");
    assert!(traverser.matches().is_empty());

    // Without combinators the detached node can still match itself.
    let mut traverser = DomTraverser::with_candidates(&tree, set(&[detached]), true, None);
    let _ = traverser.find("b").expect("query");
    assert_eq!(traverser.matches(), &set(&[detached]));
}

#[test]
fn test_parse_error_leaves_no_partial_result() {
    let f = fixture();
    let mut traverser = DomTraverser::new(&f.tree);
    assert!(traverser.find("a > > b").is_err());
}

#[test]
fn test_empty_selector_matches_every_element() {
    // An empty selector parses to a single unconstrained simple selector,
    // which seeds from the wildcard and constrains nothing.
    let f = fixture();
    assert_eq!(find(&f.tree, ""), find(&f.tree, "*"));
}

#[test]
fn test_find_is_deterministic() {
    let f = fixture();
    let first = find(&f.tree, "div p, a");
    for _ in 0..8 {
        assert_eq!(find(&f.tree, "div p, a"), first);
    }
}

#[test]
fn test_matches_selector_directly() {
    let f = fixture();
    let traverser = DomTraverser::new(&f.tree);

    let mut handler = quoll_css::selector::Selector::new();
    quoll_css::parser::Parser::new("div > p", &mut handler)
        .parse()
        .expect("parse");
    let groups = handler.into_groups();

    assert!(traverser
        .matches_selector(f.p1, &groups[0])
        .expect("evaluate"));
    assert!(!traverser
        .matches_selector(f.span, &groups[0])
        .expect("evaluate"));
}
