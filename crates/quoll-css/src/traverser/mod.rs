//! Traverse a document tree, finding matches to a selector.
//!
//! # How this works
//!
//! This performs a bottom-up search. On the first pass it computes an
//! initial candidate set for the *last* simple selector in a selector
//! (the subject). Subsequent checks eliminate candidates from that set.
//!
//! Say we begin with the selector `foo.bar baz`:
//!
//! - First, find all `baz` elements.
//! - Next, any `baz` element that does not have a `foo` ancestor is
//!   eliminated from the matches.
//! - Finally, for those that do, does that `foo` also carry the class
//!   `bar`? If not, the candidate is removed.
//!
//! Partial simple selectors behave as if expanded to include an element:
//! `.bar` seeds the same way `*.bar` does. The exception is IDs, which
//! seed through a direct subtree id scan instead.

/// The pseudo-class evaluator.
pub mod pseudo_class;
/// Attribute/value matching and An+B parsing utilities.
pub mod util;

use std::collections::HashSet;

use quoll_dom::{DomTree, NodeId, NodeType};

use crate::error::CssError;
use crate::parser::{AttrOp, Parser};
use crate::selector::{AttrMatch, Combinator, PseudoClassRef, Selector, SimpleSelector};
use pseudo_class::PseudoClassMatcher;

/// Traverses a document tree and attempts to find matches to a selector.
///
/// The traverser carries a match set between queries: [`DomTraverser::find`]
/// consumes the current set as its candidate population and replaces it
/// with the nodes that satisfied the selector, so repeated `find` calls
/// narrow incrementally. A freshly constructed traverser starts from the
/// whole document.
#[derive(Debug)]
pub struct DomTraverser<'a> {
    tree: &'a DomTree,
    matches: HashSet<NodeId>,
    initialized: bool,
    ps_handler: PseudoClassMatcher,
    scope_node: Option<NodeId>,
}

impl<'a> DomTraverser<'a> {
    /// Build a traverser over the whole document.
    ///
    /// The first `find` call derives its candidates from the document; the
    /// scope node defaults to the document element.
    #[must_use]
    pub fn new(tree: &'a DomTree) -> Self {
        let mut matches = HashSet::new();
        let _ = matches.insert(tree.root());
        DomTraverser {
            tree,
            matches,
            initialized: false,
            ps_handler: PseudoClassMatcher,
            scope_node: tree.document_element(),
        }
    }

    /// Build a traverser over an existing candidate set.
    ///
    /// With `initialized` set, the candidates are taken as the correct
    /// starting population and used as-is (this is how nested `:has`/`:not`
    /// queries and filter-in-place narrowing run); otherwise the first
    /// `find` performs its initial-match optimization within each
    /// candidate's subtree. `scope` is the node `:scope` resolves to,
    /// defaulting to the document element.
    #[must_use]
    pub fn with_candidates(
        tree: &'a DomTree,
        matches: HashSet<NodeId>,
        initialized: bool,
        scope: Option<NodeId>,
    ) -> Self {
        DomTraverser {
            tree,
            matches,
            initialized,
            ps_handler: PseudoClassMatcher,
            scope_node: scope.or_else(|| tree.document_element()),
        }
    }

    /// Given a selector, find the matches in the tree.
    ///
    /// This is the main function for querying the document using a CSS
    /// selector. Each comma-separated group is evaluated independently and
    /// the survivors are unioned (groups act as OR); the result becomes
    /// the traverser's new match set.
    ///
    /// # Errors
    ///
    /// [`CssError::Parse`] for a malformed selector (including unknown
    /// pseudo-class names, discovered during evaluation) and
    /// [`CssError::NotImplemented`] for recognized-but-unsupported
    /// constructs. On error the match set is left unchanged and no partial
    /// result is produced.
    pub fn find(&mut self, selector: &str) -> Result<&mut Self, CssError> {
        let mut handler = Selector::new();
        Parser::new(selector, &mut handler).parse()?;

        let mut found = HashSet::new();
        for mut group in handler.into_groups() {
            let candidates = if self.initialized {
                self.matches.clone()
            } else {
                self.initial_match(&mut group[0])
            };

            for candidate in candidates {
                if self.matches_selector(candidate, &group)? {
                    let _ = found.insert(candidate);
                }
            }
        }
        self.matches = found;

        Ok(self)
    }

    /// The current match set.
    #[must_use]
    pub fn matches(&self) -> &HashSet<NodeId> {
        &self.matches
    }

    /// Consume the traverser, yielding the match set.
    #[must_use]
    pub fn into_matches(self) -> HashSet<NodeId> {
        self.matches
    }

    /// The tree this traverser queries.
    #[must_use]
    pub fn tree(&self) -> &DomTree {
        self.tree
    }

    /// Check whether the given node matches the given selector chain.
    ///
    /// A selector is a chain of one or more simple selectors connected by
    /// combinators, stored subject-first.
    ///
    /// Evaluation is recursive: the chain length bounds the recursion
    /// depth (plus tree depth for the descendant combinator), so an
    /// absolutely enormous selector could exhaust the call stack. That is
    /// an accepted resource limit, not a guarded failure mode.
    ///
    /// # Errors
    ///
    /// Propagates pseudo-class and pseudo-element evaluation errors.
    pub fn matches_selector(
        &self,
        node: NodeId,
        selectors: &[SimpleSelector],
    ) -> Result<bool, CssError> {
        self.matches_simple_selector(node, selectors, 0)
    }

    /// Perform a match check against a single simple selector (plus its
    /// combinator, when one links it onward).
    ///
    /// The predicate checks short-circuit as soon as one fails.
    fn matches_simple_selector(
        &self,
        node: NodeId,
        selectors: &[SimpleSelector],
        index: usize,
    ) -> Result<bool, CssError> {
        // Only elements participate in matching; a detached fragment's
        // document node or a text node fails gracefully.
        if self.tree.as_element(node).is_none() {
            return Ok(false);
        }

        let selector = &selectors[index];
        let result = self.match_element(node, selector.element.as_deref(), selector.ns.as_deref())
            && self.match_attributes(node, &selector.attributes)
            && self.match_id(node, selector.id.as_deref())
            && self.match_classes(node, &selector.classes);
        let result = result
            && self.match_pseudo_classes(node, &selector.pseudo_classes)?
            && self.match_pseudo_elements(node, &selector.pseudo_elements)?;

        let next = index + 1;
        if next < selectors.len() && result {
            return self.combine(node, selectors, next);
        }
        Ok(result)
    }

    /// Combine the next simple selector with the given match using the
    /// next combinator.
    ///
    /// If the next selector is itself combined with another one, that is
    /// evaluated too, and so on: a `true` here means the entire remaining
    /// chain matched.
    fn combine(
        &self,
        node: NodeId,
        selectors: &[SimpleSelector],
        index: usize,
    ) -> Result<bool, CssError> {
        match selectors[index].combinator {
            Some(Combinator::Adjacent) => self.combine_adjacent(node, selectors, index),
            Some(Combinator::Sibling) => self.combine_sibling(node, selectors, index),
            Some(Combinator::DirectDescendant) => {
                self.combine_direct_descendant(node, selectors, index)
            }
            Some(Combinator::AnyDescendant) => self.combine_any_descendant(node, selectors, index),
            // A group boundary reached inside a flattened chain: keep
            // checking this same node against the next segment.
            Some(Combinator::AnotherSelector) => {
                self.matches_simple_selector(node, selectors, index)
            }
            None => Ok(false),
        }
    }

    /// Process an adjacent sibling (`+`).
    ///
    /// The spec does not say whether adjacency should skip non-element
    /// nodes; text and comment siblings are ignored here, so the nearest
    /// *element* sibling is the one tested.
    fn combine_adjacent(
        &self,
        node: NodeId,
        selectors: &[SimpleSelector],
        index: usize,
    ) -> Result<bool, CssError> {
        for sibling in self.tree.preceding_siblings(node) {
            if self.tree.as_element(sibling).is_some() {
                return self.matches_simple_selector(sibling, selectors, index);
            }
        }
        Ok(false)
    }

    /// Check all siblings (`~`). Only elements to the LEFT of the given
    /// node are candidates.
    fn combine_sibling(
        &self,
        node: NodeId,
        selectors: &[SimpleSelector],
        index: usize,
    ) -> Result<bool, CssError> {
        for sibling in self.tree.preceding_siblings(node) {
            if self.tree.as_element(sibling).is_some()
                && self.matches_simple_selector(sibling, selectors, index)?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Handle a direct descendant combination (`>`): the immediate parent
    /// must match. A node with no parent cannot match.
    fn combine_direct_descendant(
        &self,
        node: NodeId,
        selectors: &[SimpleSelector],
        index: usize,
    ) -> Result<bool, CssError> {
        match self.tree.parent(node) {
            Some(parent) => self.matches_simple_selector(parent, selectors, index),
            None => Ok(false),
        }
    }

    /// Handle an any-descendant combination (whitespace): any ancestor may
    /// match. Non-element ancestors (the document node, typically) are
    /// skipped.
    fn combine_any_descendant(
        &self,
        node: NodeId,
        selectors: &[SimpleSelector],
        index: usize,
    ) -> Result<bool, CssError> {
        for ancestor in self.tree.ancestors(node) {
            if self.tree.as_element(ancestor).is_none() {
                continue;
            }
            if self.matches_simple_selector(ancestor, selectors, index)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Compute the initial match set for a selector group's subject.
    ///
    /// This should only run when not working from an existing match set.
    /// The cheapest applicable strategy is chosen to cut the candidate
    /// population down before full-predicate evaluation; each strategy
    /// clears the subject field it fully satisfied so the subsequent pass
    /// does not re-check it.
    fn initial_match(&self, selector: &mut SimpleSelector) -> HashSet<NodeId> {
        // ID queries give the smallest possible starting set, so they win
        // even over an explicit element name.
        if selector.id.is_some() {
            self.initial_match_on_id(selector)
        } else if selector.ns.is_some() {
            self.initial_match_on_element_ns(selector)
        } else if selector.element.as_deref().unwrap_or("*") == "*" && !selector.classes.is_empty()
        {
            // A wildcard element with classes: scanning for class carriers
            // substantially reduces the number of elements we start with.
            self.initial_match_on_classes(selector)
        } else {
            self.initial_match_on_element(selector)
        }
    }

    /// Seed the initial match by ID: each existing match (itself included)
    /// is scanned for elements carrying the id.
    fn initial_match_on_id(&self, selector: &mut SimpleSelector) -> HashSet<NodeId> {
        let Some(id) = selector.id.take() else {
            return HashSet::new();
        };
        let mut found = HashSet::new();

        for &node in &self.matches {
            if self.node_has_id(node, &id) {
                let _ = found.insert(node);
            }
            for descendant in self.tree.descendants(node) {
                if self.node_has_id(descendant, &id) {
                    let _ = found.insert(descendant);
                }
            }
        }
        found
    }

    fn node_has_id(&self, node: NodeId, id: &str) -> bool {
        self.tree
            .as_element(node)
            .and_then(|el| el.id())
            .is_some_and(|node_id| node_id == id)
    }

    /// Seed the initial match from class carriers.
    ///
    /// Only used when the subject's element is a wildcard and classes are
    /// present; in any other case the element strategy starts smaller.
    fn initial_match_on_classes(&self, selector: &mut SimpleSelector) -> HashSet<NodeId> {
        let classes = std::mem::take(&mut selector.classes);
        let mut found = HashSet::new();

        for &node in &self.matches {
            if self.node_has_classes(node, &classes) {
                let _ = found.insert(node);
            }
            for descendant in self.tree.descendants(node) {
                if self.node_has_classes(descendant, &classes) {
                    let _ = found.insert(descendant);
                }
            }
        }
        found
    }

    fn node_has_classes(&self, node: NodeId, required: &[String]) -> bool {
        self.tree.as_element(node).is_some_and(|el| {
            el.attrs.contains_key("class") && {
                let present = el.classes();
                required.iter().all(|class| present.contains(class.as_str()))
            }
        })
    }

    /// Seed the initial match by element name (or every element, for the
    /// wildcard). Each existing match root counts itself when its tag
    /// matches - or, for the wildcard, when it is the document element.
    fn initial_match_on_element(&self, selector: &mut SimpleSelector) -> HashSet<NodeId> {
        let element = selector.element.take().unwrap_or_else(|| "*".to_string());
        let mut found = HashSet::new();

        for &node in &self.matches {
            if let Some(el) = self.tree.as_element(node) {
                let is_document_child = self
                    .tree
                    .parent(node)
                    .and_then(|parent| self.tree.get(parent))
                    .is_some_and(|parent| matches!(parent.node_type, NodeType::Document));
                if el.tag_name == element || (element == "*" && is_document_child) {
                    let _ = found.insert(node);
                }
            }
            for descendant in self.tree.descendants(node) {
                if let Some(el) = self.tree.as_element(descendant) {
                    if element == "*" || el.tag_name == element {
                        let _ = found.insert(descendant);
                    }
                }
            }
        }
        found
    }

    /// Seed the initial match by element name, then filter by namespace.
    fn initial_match_on_element_ns(&self, selector: &mut SimpleSelector) -> HashSet<NodeId> {
        let Some(ns) = selector.ns.take() else {
            return HashSet::new();
        };
        let mut elements = self.initial_match_on_element(selector);

        // "Any namespace" matches anything.
        if ns == "*" {
            return elements;
        }

        // The prefix lookup must be done PER NODE: the same prefix can be
        // bound to different URIs in different subtrees.
        elements.retain(|&node| {
            self.tree
                .lookup_namespace_uri(node, &ns)
                .is_some_and(|ns_uri| self.tree.namespace_uri(node).as_deref() == Some(&ns_uri))
        });
        elements
    }

    /// Check whether the node matches the given element selector.
    ///
    /// Handles: element (`foo`), namespaced element (`ns|foo`), namespaced
    /// wildcard (`ns|*`), and the wildcards (`*`, `*|*`).
    fn match_element(&self, node: NodeId, element: Option<&str>, ns: Option<&str>) -> bool {
        let Some(element) = element else {
            return true;
        };

        if let Some(ns) = ns {
            if ns != "*" {
                // The prefix must resolve, and the node's own namespace
                // must be the resolved URI.
                let resolved = self.tree.lookup_namespace_uri(node, ns);
                match resolved {
                    Some(ns_uri) => {
                        if self.tree.namespace_uri(node).as_deref() != Some(ns_uri.as_str()) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
        }

        element == "*"
            || self
                .tree
                .as_element(node)
                .is_some_and(|el| el.tag_name == element)
    }

    /// Check whether the node satisfies all of the given attribute
    /// constraints, including namespaced ones and namespace wildcards.
    fn match_attributes(&self, node: NodeId, attributes: &[AttrMatch]) -> bool {
        attributes.iter().all(|attr| {
            let value = attr.value.as_deref();
            match attr.ns.as_deref() {
                Some("*") => self.match_attribute_any_ns(node, &attr.name, value, attr.op),
                Some(prefix) => match self.tree.lookup_namespace_uri(node, prefix) {
                    Some(ns_uri) => util::matches_attribute_ns(
                        self.tree, node, &ns_uri, &attr.name, value, attr.op,
                    ),
                    None => false,
                },
                None => util::matches_attribute(self.tree, node, &attr.name, value, attr.op),
            }
        })
    }

    /// An any-namespace attribute constraint (`[*|attr]`): any attribute
    /// with the right local name qualifies, whatever namespace it is in
    /// (including none).
    fn match_attribute_any_ns(
        &self,
        node: NodeId,
        name: &str,
        value: Option<&str>,
        op: AttrOp,
    ) -> bool {
        let Some(element) = self.tree.as_element(node) else {
            return false;
        };
        element.attrs.iter().any(|(attr_name, attr_value)| {
            let local = attr_name
                .split_once(':')
                .map_or(attr_name.as_str(), |(_, local)| local);
            local == name
                && match value {
                    None => true,
                    Some(needle) => util::matches_attribute_value(needle, attr_value, op),
                }
        })
    }

    /// Check that the node has the given ID.
    fn match_id(&self, node: NodeId, id: Option<&str>) -> bool {
        match id {
            None => true,
            Some(id) => self.node_has_id(node, id),
        }
    }

    /// Check that the node has all of the given classes.
    fn match_classes(&self, node: NodeId, classes: &[String]) -> bool {
        if classes.is_empty() {
            return true;
        }
        self.node_has_classes(node, classes)
    }

    /// Evaluate every pseudo-class reference against the node, delegating
    /// to the pseudo-class evaluator.
    ///
    /// All references are evaluated even after one fails, so an invalid
    /// pseudo-class later in the compound still raises its error.
    fn match_pseudo_classes(
        &self,
        node: NodeId,
        pseudo_classes: &[PseudoClassRef],
    ) -> Result<bool, CssError> {
        let mut ret = true;
        for pc in pseudo_classes {
            ret &= self.ps_handler.matches(
                self.tree,
                &pc.name,
                node,
                self.scope_node,
                pc.value.as_deref(),
            )?;
        }
        Ok(ret)
    }

    /// Test whether conditions obtain that would allow the node's
    /// pseudo-elements to exist. This does not modify the match in any
    /// way: `::before` on an element simply requires text content for the
    /// pseudo-element to anchor to.
    fn match_pseudo_elements(
        &self,
        node: NodeId,
        pseudo_elements: &[String],
    ) -> Result<bool, CssError> {
        if pseudo_elements.is_empty() {
            return Ok(true);
        }

        for pe in pseudo_elements {
            match pe.as_str() {
                "first-line" | "first-letter" | "before" | "after" => {
                    return Ok(!self.tree.text_content(node).is_empty());
                }
                "selection" => {
                    return Err(CssError::NotImplemented(format!(
                        "::{pe} is not implemented"
                    )));
                }
                _ => {}
            }
        }
        Ok(false)
    }
}
