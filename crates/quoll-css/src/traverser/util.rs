//! Utilities for tree traversal: attribute/value matching and the An+B
//! micro-syntax.

use quoll_dom::{DomTree, NodeId};

use crate::parser::AttrOp;

/// Check whether the given element has the given attribute, and that its
/// value satisfies `op` when a value constraint is present.
///
/// Absent attribute → `false`. Present attribute with no value constraint
/// → `true`. Non-element nodes carry no attributes and never match.
#[must_use]
pub fn matches_attribute(
    tree: &DomTree,
    node: NodeId,
    name: &str,
    value: Option<&str>,
    op: AttrOp,
) -> bool {
    let Some(element) = tree.as_element(node) else {
        return false;
    };
    let Some(haystack) = element.attrs.get(name) else {
        return false;
    };
    match value {
        None => true,
        Some(needle) => matches_attribute_value(needle, haystack, op),
    }
}

/// Check whether the given element has the given namespaced attribute.
///
/// The attribute's prefix must resolve (via in-scope declarations) to
/// `ns_uri`; unprefixed attributes are in no namespace and never match.
#[must_use]
pub fn matches_attribute_ns(
    tree: &DomTree,
    node: NodeId,
    ns_uri: &str,
    name: &str,
    value: Option<&str>,
    op: AttrOp,
) -> bool {
    let Some(haystack) = tree.attribute_ns(node, ns_uri, name) else {
        return false;
    };
    match value {
        None => true,
        Some(needle) => matches_attribute_value(needle, haystack, op),
    }
}

/// Check an attribute value against a needle using the given operation.
///
/// A needle longer than the haystack can never match, whatever the
/// operation.
///
/// Per Selectors Level 3 § 6.3.2, "the case-sensitivity of attribute names
/// and values in selectors depends on the document language"; this engine
/// assumes case sensitivity.
///
/// `ContainsWithSpace` implements whitespace-token membership: the needle
/// must equal one whitespace-delimited token of the haystack, which is
/// what `[attr~=value]` means in the selector spec.
#[must_use]
pub fn matches_attribute_value(needle: &str, haystack: &str, op: AttrOp) -> bool {
    if haystack.len() < needle.len() {
        return false;
    }

    match op {
        AttrOp::Exactly => needle == haystack,
        AttrOp::ContainsWithSpace => haystack.split_whitespace().any(|word| word == needle),
        AttrOp::ContainsWithHyphen => haystack.split('-').any(|part| part == needle),
        AttrOp::ContainsInString => haystack.contains(needle),
        AttrOp::BeginsWith => haystack.starts_with(needle),
        AttrOp::EndsWith => haystack.ends_with(needle),
    }
}

/// Remove one pair of matching leading and trailing quotes.
///
/// Pseudo-class arguments like `:contains("test")` arrive with their
/// quotes intact; this strips them when, and only when, the first and last
/// characters are the same quote character.
#[must_use]
pub fn remove_quotes(s: &str) -> &str {
    let mut chars = s.chars();
    let first = chars.next();
    let last = chars.next_back();
    if first == last && matches!(first, Some('"' | '\'')) {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Parse an An+B rule for CSS pseudo-classes.
///
/// [Selectors Level 3 § 6.6.5.2](https://www.w3.org/TR/selectors-3/#nth-child-pseudo)
///
/// Recognized forms: `even` → (2, 0), `odd` → (2, 1), `n` → (1, 0), a bare
/// integer `b` → (0, b), and the general `an+b` shape with optional signs
/// and whitespace around the `+`/`-`. A lone `-` coefficient means −1; an
/// absent or bare-sign coefficient degrades to 0.
///
/// Invalid rules return `(0, 0)`, which never matches anything. This is
/// per the spec: a malformed argument disables the rule rather than
/// failing the query.
#[must_use]
pub fn parse_anb(rule: &str) -> (i32, i32) {
    if rule == "even" {
        return (2, 0);
    }
    if rule == "odd" {
        return (2, 1);
    }
    if rule == "n" {
        return (1, 0);
    }
    if let Ok(b) = rule.parse::<i32>() {
        return (0, b);
    }

    parse_anb_general(rule).unwrap_or((0, 0))
}

/// The general `an+b` shape: optional whitespace, signed coefficient,
/// literal `n`, optional whitespace-separated signed offset, optional
/// trailing whitespace. Anything else is a non-match.
fn parse_anb_general(rule: &str) -> Option<(i32, i32)> {
    let mut chars = rule.chars().peekable();

    while chars.peek().is_some_and(|ch| ch.is_whitespace()) {
        let _ = chars.next();
    }

    let mut a_str = String::new();
    if chars.peek().is_some_and(|&ch| ch == '+' || ch == '-') {
        a_str.push(chars.next()?);
    }
    while chars.peek().is_some_and(char::is_ascii_digit) {
        a_str.push(chars.next()?);
    }

    if chars.next() != Some('n') {
        return None;
    }

    while chars.peek().is_some_and(|ch| ch.is_whitespace()) {
        let _ = chars.next();
    }

    let mut b_negative = false;
    if chars.peek().is_some_and(|&ch| ch == '+' || ch == '-') {
        b_negative = chars.next() == Some('-');
    }

    while chars.peek().is_some_and(|ch| ch.is_whitespace()) {
        let _ = chars.next();
    }

    let mut b_str = String::new();
    while chars.peek().is_some_and(char::is_ascii_digit) {
        b_str.push(chars.next()?);
    }

    while chars.peek().is_some_and(|ch| ch.is_whitespace()) {
        let _ = chars.next();
    }
    if chars.next().is_some() {
        return None;
    }

    let a = if a_str == "-" {
        -1
    } else {
        a_str.parse().unwrap_or(0)
    };
    let mut b = b_str.parse().unwrap_or(0);
    if b_negative {
        b = -b;
    }

    Some((a, b))
}
