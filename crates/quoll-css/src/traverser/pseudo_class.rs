//! The pseudo-class evaluator.
//!
//! Pseudo-class handling is kept out of the normal traversal so the
//! dispatch over known classes lives in one place. The core classes are
//! handled here; anything unknown is a parse error rather than a silent
//! non-match.

use std::collections::HashSet;

use quoll_dom::{DomTree, NodeId, NodeType};

use super::DomTraverser;
use super::util;
use crate::error::CssError;
use crate::parser::AttrOp;

/// Evaluates a single pseudo-class against a node.
///
/// Stateless; one instance is held by the traverser and shared across all
/// candidate checks of a query.
#[derive(Debug, Default)]
pub struct PseudoClassMatcher;

impl PseudoClassMatcher {
    /// Test whether the given element matches the given pseudo-class.
    ///
    /// * `name` - the pseudo-class name as written (lowercased here).
    /// * `node` - the element under test.
    /// * `scope` - the active root for this query, against which `:scope`
    ///   resolves.
    /// * `value` - the optional parenthesized argument, e.g. the `2n+1` of
    ///   `:nth-child(2n+1)`.
    ///
    /// UA-state classes (`:hover`, `:visited`, …) are always false: there
    /// is no rendering or navigation context to consult, and a never-true
    /// condition degrades the query instead of failing it.
    ///
    /// # Errors
    ///
    /// [`CssError::Parse`] for an unknown pseudo-class name or a
    /// structurally required argument that is missing;
    /// [`CssError::NotImplemented`] for `:lang()` without a value. Nested
    /// selector errors from `:has`/`:not` propagate unchanged.
    pub fn matches(
        &self,
        tree: &DomTree,
        name: &str,
        node: NodeId,
        scope: Option<NodeId>,
        value: Option<&str>,
    ) -> Result<bool, CssError> {
        let name = name.to_lowercase();
        match name.as_str() {
            // These require a user agent, which we don't have.
            "current" | "past" | "future" | "visited" | "hover" | "active" | "focus"
            // The next three are from jQuery.
            | "animated" | "visible" | "hidden"
            // Since we don't know how to validate elements, we can't
            // supply these.
            | "valid" | "invalid" | "required" | "optional" | "read-only" | "read-write"
            // No directionality info in the tree.
            | "dir"
            // We don't know what a column is in most documents.
            | "nth-column" | "nth-last-column"
            // This requires a location URL, which we don't have.
            | "target" => Ok(false),
            // The checkbox state this queries does not exist here; a
            // deterministic false keeps queries repeatable.
            "indeterminate" => Ok(false),
            "lang" => match value {
                None => Err(CssError::NotImplemented(
                    ":lang() requires a value".to_string(),
                )),
                Some(value) => Ok(self.lang(tree, node, value)),
            },
            "any-link" => Ok(util::matches_attribute(tree, node, "href", None, AttrOp::Exactly)
                || util::matches_attribute(tree, node, "src", None, AttrOp::Exactly)
                || util::matches_attribute(tree, node, "link", None, AttrOp::Exactly)),
            "link" => Ok(util::matches_attribute(
                tree,
                node,
                "href",
                None,
                AttrOp::Exactly,
            )),
            "local-link" => Ok(self.is_local_link(tree, node)),
            "root" => Ok(tree.document_element() == Some(node)),

            // CSS 4 declares the :scope pseudo-class, covering what the
            // :x-root and :x-reset extensions historically did.
            "x-root" | "x-reset" | "scope" => Ok(scope == Some(node)),

            // NON-STANDARD shorthands for even and odd, supported by
            // jQuery and several user agents.
            "even" => Ok(self.is_nth_child(tree, node, "even", false, false)),
            "odd" => Ok(self.is_nth_child(tree, node, "odd", false, false)),

            "nth-child" => Ok(self.is_nth_child(tree, node, value.unwrap_or(""), false, false)),
            "nth-last-child" => Ok(self.is_nth_child(tree, node, value.unwrap_or(""), true, false)),
            "nth-of-type" => Ok(self.is_nth_child(tree, node, value.unwrap_or(""), false, true)),
            "nth-last-of-type" => {
                Ok(self.is_nth_child(tree, node, value.unwrap_or(""), true, true))
            }
            "first-of-type" => Ok(self.is_first_of_type(tree, node)),
            "last-of-type" => Ok(self.is_last_of_type(tree, node)),
            "only-of-type" => {
                Ok(self.is_first_of_type(tree, node) && self.is_last_of_type(tree, node))
            }

            // Additional pseudo-classes defined in jQuery. :lt is treated
            // as "less than or equal to", :gt as strictly greater than.
            "lt" => {
                let rule = format!("-n + {}", leading_int(value.unwrap_or("")));
                Ok(self.is_nth_child(tree, node, &rule, false, false))
            }
            "gt" => {
                Ok(self.node_position_from_start(tree, node, false)
                    > leading_int(value.unwrap_or("")))
            }
            "nth" | "eq" => {
                let rule = leading_int(value.unwrap_or("")).to_string();
                Ok(self.is_nth_child(tree, node, &rule, false, false))
            }
            "first" => Ok(self.is_nth_child(tree, node, "1", false, false)),
            "first-child" => Ok(self.is_first(tree, node)),
            "last" | "last-child" => Ok(self.is_last(tree, node)),
            "only-child" => Ok(self.is_first(tree, node) && self.is_last(tree, node)),
            "empty" => Ok(self.is_empty(tree, node)),
            "parent" => Ok(!self.is_empty(tree, node)),

            "enabled" | "disabled" | "checked" => Ok(util::matches_attribute(
                tree,
                node,
                &name,
                None,
                AttrOp::Exactly,
            )),
            "text" | "radio" | "checkbox" | "file" | "password" | "submit" | "image" | "reset"
            | "button" => Ok(util::matches_attribute(
                tree,
                node,
                "type",
                Some(&name),
                AttrOp::Exactly,
            )),

            "header" => Ok(self.is_header(tree, node)),

            "has" | "matches" => match value {
                None => Err(CssError::Parse(format!("{name}() requires a selector"))),
                Some(selector) => self.has(tree, node, selector),
            },
            "not" => match value {
                None | Some("") => {
                    Err(CssError::Parse(":not() requires a value".to_string()))
                }
                Some(selector) => Ok(!self.has(tree, node, selector)?),
            },

            // Contains == text matches. An INEXACT (case-insensitive
            // substring) match.
            "contains" => Ok(self.contains(tree, node, value.unwrap_or(""))),
            // An EXACT match against the full text content.
            "contains-exactly" => Ok(self.contains_exactly(tree, node, value.unwrap_or(""))),

            _ => Err(CssError::Parse(format!("unknown pseudo-class: {name}"))),
        }
    }

    /// Pseudo-class handler for `:lang`.
    ///
    /// This does not implement the spec in its entirety: the document's own
    /// language is unknown, so only an explicitly set `lang` attribute (in
    /// any namespace, e.g. `xml:lang`) is consulted - nothing is inherited
    /// from ancestors.
    fn lang(&self, tree: &DomTree, node: NodeId, value: &str) -> bool {
        // `:lang(en)` matches `en-US` through hyphen-token membership;
        // an already-qualified value like `en-US` must match exactly.
        let op = if value.contains('-') {
            AttrOp::Exactly
        } else {
            AttrOp::ContainsWithHyphen
        };

        let Some(element) = tree.as_element(node) else {
            return false;
        };

        if element.attrs.contains_key("lang") {
            return util::matches_attribute(tree, node, "lang", Some(value), op);
        }

        // Fall back to a namespaced lang attribute (xml:lang, typically).
        for attr_name in element.attrs.keys() {
            if let Some((prefix, local)) = attr_name.split_once(':') {
                if local == "lang" {
                    return match tree.lookup_namespace_uri(node, prefix) {
                        Some(ns_uri) => {
                            util::matches_attribute_ns(tree, node, &ns_uri, "lang", Some(value), op)
                        }
                        None => false,
                    };
                }
            }
        }
        false
    }

    /// Provides the jQuery pseudo-class `:header`: h1 through h9.
    fn is_header(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(element) = tree.as_element(node) else {
            return false;
        };
        let mut chars = element.tag_name.chars();
        matches!(chars.next(), Some('h' | 'H'))
            && matches!(chars.next(), Some('1'..='9'))
            && chars.next().is_none()
    }

    /// Provides pseudo-class `:empty`.
    ///
    /// Only element and text children count; processing instructions and
    /// comments are not considered content. From the spec, it appears that
    /// CDATA is also not counted.
    fn is_empty(&self, tree: &DomTree, node: NodeId) -> bool {
        !tree.children(node).iter().any(|&kid| {
            matches!(
                tree.get(kid).map(|n| &n.node_type),
                Some(NodeType::Element(_) | NodeType::Text(_))
            )
        })
    }

    /// First among its element siblings (`:first-child`).
    fn is_first(&self, tree: &DomTree, node: NodeId) -> bool {
        !tree
            .preceding_siblings(node)
            .any(|sibling| tree.as_element(sibling).is_some())
    }

    /// First sibling of its type (`:first-of-type`).
    fn is_first_of_type(&self, tree: &DomTree, node: NodeId) -> bool {
        !tree
            .preceding_siblings(node)
            .any(|sibling| same_type(tree, sibling, node))
    }

    /// Last among its element siblings (`:last-child`).
    fn is_last(&self, tree: &DomTree, node: NodeId) -> bool {
        !tree
            .following_siblings(node)
            .any(|sibling| tree.as_element(sibling).is_some())
    }

    /// Last sibling of its type (`:last-of-type`).
    fn is_last_of_type(&self, tree: &DomTree, node: NodeId) -> bool {
        !tree
            .following_siblings(node)
            .any(|sibling| same_type(tree, sibling, node))
    }

    /// Provides `:contains()` as the original spec called for: a
    /// case-insensitive substring match against the full text content.
    fn contains(&self, tree: &DomTree, node: NodeId, value: &str) -> bool {
        let text = tree.text_content(node);
        let needle = util::remove_quotes(value);
        text.to_lowercase().contains(&needle.to_lowercase())
    }

    /// Provides the `:contains-exactly()` pseudo-class: an exact match
    /// against the full text content.
    fn contains_exactly(&self, tree: &DomTree, node: NodeId, value: &str) -> bool {
        tree.text_content(node) == util::remove_quotes(value)
    }

    /// Provides the `:has()`/`:matches()` pseudo-classes: true when a
    /// bounded traversal, seeded with this node as its sole pre-initialized
    /// candidate, finds a match for the nested selector. The node itself
    /// is therefore the subject under test; combinators in the nested
    /// selector look outward from it.
    fn has(&self, tree: &DomTree, node: NodeId, selector: &str) -> Result<bool, CssError> {
        let mut candidates = HashSet::new();
        let _ = candidates.insert(node);
        let mut traverser = DomTraverser::with_candidates(tree, candidates, true, None);
        let _ = traverser.find(selector)?;
        Ok(!traverser.matches().is_empty())
    }

    /// The relative 1-based position of a node among its element siblings,
    /// counted from the start; `by_type` restricts the count to siblings
    /// of the same type.
    fn node_position_from_start(&self, tree: &DomTree, node: NodeId, by_type: bool) -> i32 {
        let mut position = 1;
        for sibling in tree.preceding_siblings(node) {
            let counts = if by_type {
                same_type(tree, sibling, node)
            } else {
                tree.as_element(sibling).is_some()
            };
            if counts {
                position += 1;
            }
        }
        position
    }

    /// The relative 1-based position of a node among its element siblings,
    /// counted from the end.
    fn node_position_from_end(&self, tree: &DomTree, node: NodeId, by_type: bool) -> i32 {
        let mut position = 1;
        for sibling in tree.following_siblings(node) {
            let counts = if by_type {
                same_type(tree, sibling, node)
            } else {
                tree.as_element(sibling).is_some()
            };
            if counts {
                position += 1;
            }
        }
        position
    }

    /// Provides the machinery for all An+B rules: `nth-child` and also
    /// `nth-last-child`, `even`, `odd`, `first`, `last`, `eq`, `nth`,
    /// `nth-of-type`, `nth-last-of-type`, and friends.
    ///
    /// With group size A and offset B from [`util::parse_anb`], and the
    /// node's 1-based position P among its (optionally type-filtered)
    /// element siblings counted from the relevant end: when A is zero the
    /// node matches iff P equals B exactly; otherwise a negative B is
    /// normalized to A+B and the node matches iff (P−B)/A is a
    /// non-negative integer.
    fn is_nth_child(
        &self,
        tree: &DomTree,
        node: NodeId,
        value: &str,
        reverse: bool,
        by_type: bool,
    ) -> bool {
        let (group_size, mut element_in_group) = util::parse_anb(value);
        if tree.parent(node).is_none() || (group_size == 0 && element_in_group == 0) {
            return false;
        }

        let position = if reverse {
            self.node_position_from_end(tree, node, by_type)
        } else {
            self.node_position_from_start(tree, node, by_type)
        };

        // If group size is 0, we just check whether this is the nth
        // element.
        if group_size == 0 {
            return position == element_in_group;
        }

        if element_in_group < 0 {
            element_in_group += group_size;
        }
        let diff = position - element_in_group;
        diff % group_size == 0 && diff / group_size >= 0
    }

    /// A link whose `href` has no URL scheme, or the `file` scheme.
    fn is_local_link(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(element) = tree.as_element(node) else {
            return false;
        };
        let Some(url) = element.attrs.get("href") else {
            return false;
        };
        match url_scheme(url) {
            None => true,
            Some(scheme) => scheme == "file",
        }
    }
}

/// Whether two nodes are elements of the same type (same prefix and local
/// name).
fn same_type(tree: &DomTree, a: NodeId, b: NodeId) -> bool {
    match (tree.as_element(a), tree.as_element(b)) {
        (Some(ea), Some(eb)) => ea.tag_name == eb.tag_name && ea.prefix == eb.prefix,
        _ => false,
    }
}

/// The URL scheme of `url`, when it has one: a leading alphabetic
/// character followed by alphanumerics, `+`, `-`, or `.`, terminated by a
/// colon.
fn url_scheme(url: &str) -> Option<&str> {
    let (scheme, _) = url.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.')) {
        Some(scheme)
    } else {
        None
    }
}

/// The integer prefix of a pseudo-class argument (`"3"` → 3, `"3x"` → 3,
/// garbage → 0), mirroring how loosely the numeric jQuery classes read
/// their argument.
fn leading_int(value: &str) -> i32 {
    let trimmed = value.trim_start();
    let mut number = String::new();
    let mut chars = trimmed.chars().peekable();
    if chars.peek().is_some_and(|&ch| ch == '+' || ch == '-') {
        number.push(chars.next().unwrap_or('+'));
    }
    while chars.peek().is_some_and(char::is_ascii_digit) {
        number.push(chars.next().unwrap_or('0'));
    }
    number.parse().unwrap_or(0)
}
