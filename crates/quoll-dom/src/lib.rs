//! Arena-based document tree for the quoll selector engine.
//!
//! This crate provides the node tree that selector queries run against,
//! loosely following the [DOM Living Standard](https://dom.spec.whatwg.org/).
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all
//! relationships, providing O(1) access and traversal without borrow checker
//! issues. A [`NodeId`] is also the engine's notion of node *identity*: two
//! structurally identical nodes at different indices are distinct, which is
//! exactly what an identity-based match set needs.
//!
//! Beyond plain navigation, the tree exposes the query surface the selector
//! engine depends on: namespace resolution by prefix (via in-scope `xmlns`
//! declarations), namespace-qualified attribute access, and text-content
//! aggregation.

use std::collections::{HashMap, HashSet};

/// Map of attribute names to values for an element.
///
/// Attribute names are stored as written, so a namespaced attribute keeps
/// its `prefix:local` form (e.g. `xml:lang`).
pub type AttributesMap = HashMap<String, String>;

/// Namespace URI implicitly bound to the `xml` prefix.
///
/// [Namespaces in XML § 3](https://www.w3.org/TR/xml-names/#ns-decl)
/// "The prefix xml is by definition bound to the namespace name
/// `http://www.w3.org/XML/1998/namespace`."
pub const XML_NS_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// A type-safe index into the document tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
/// "Each node has an associated node document..."
///
/// `NodeId` provides O(1) access to any node in the tree without borrowing
/// issues, and doubles as the identity key for match sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Node is an abstract interface that is used by all nodes in a tree."
///
/// This node stores indices for parent/child/sibling relationships,
/// enabling O(1) traversal in any direction.
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub node_type: NodeType,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-parent)
    /// "An object that participates in a tree has a parent, which is either
    /// null or an object."
    pub parent: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-child)
    /// "A node has an associated list of children"
    pub children: Vec<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-next-sibling)
    /// "An object A's next sibling is the object immediately following A
    /// in the children of A's parent."
    pub next_sibling: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-previous-sibling)
    /// "An object A's previous sibling is the object immediately preceding A
    /// in the children of A's parent."
    pub prev_sibling: Option<NodeId>,
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Each node has an associated node type"
#[derive(Debug, Clone)]
pub enum NodeType {
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    Document,
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    Element(ElementData),
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    Text(String),
    /// [§ 4.7 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    Comment(String),
    /// [§ 4.6 Interface ProcessingInstruction](https://dom.spec.whatwg.org/#interface-processinginstruction)
    ///
    /// Selector matching never targets PIs, but `:empty` must be able to
    /// tell them apart from element and text children.
    ProcessingInstruction(String),
}

/// Element-specific data.
///
/// Per [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element):
/// "Elements have an associated namespace, namespace prefix, local name..."
///
/// The namespace prefix is stored as written in the source (the `ns` of
/// `<ns:tag>`); the URI it resolves to depends on in-scope `xmlns`
/// declarations and is computed on demand by [`DomTree::namespace_uri`].
#[derive(Debug, Clone)]
pub struct ElementData {
    /// "An element's local name"
    pub tag_name: String,
    /// "An element's namespace prefix", or `None` for unprefixed elements.
    pub prefix: Option<String>,
    /// "An element has an associated attribute list"
    pub attrs: AttributesMap,
}

impl ElementData {
    /// Create element data for an unprefixed element with no attributes.
    #[must_use]
    pub fn new(tag_name: &str) -> Self {
        ElementData {
            tag_name: tag_name.to_string(),
            prefix: None,
            attrs: AttributesMap::new(),
        }
    }

    /// Returns the element's id attribute value if present.
    ///
    /// Per [§ 3.2.6 Global attributes](https://html.spec.whatwg.org/multipage/dom.html#global-attributes):
    /// "The id attribute specifies its element's unique identifier (ID)."
    #[must_use]
    pub fn id(&self) -> Option<&String> {
        self.attrs.get("id")
    }

    /// Returns the set of class names from the class attribute.
    ///
    /// Per [§ 3.2.6 Global attributes](https://html.spec.whatwg.org/multipage/dom.html#global-attributes):
    /// "The class attribute, if specified, must have a value that is a set of
    /// space-separated tokens."
    #[must_use]
    pub fn classes(&self) -> HashSet<&str> {
        match self.attrs.get("class") {
            Some(classlist) => classlist.split_whitespace().collect(),
            None => HashSet::new(),
        }
    }
}

/// Arena-based document tree with O(1) node access and traversal.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// "The DOM represents a document as a tree. A tree is a finite hierarchical
/// tree structure."
///
/// All nodes live in a contiguous vector, using indices for relationships:
/// - O(1) access to any node by [`NodeId`]
/// - O(1) parent/sibling traversal
/// - No borrowing issues (indices instead of references)
///
/// The selector engine treats the tree as read-only for the duration of a
/// query; mutation during matching is the caller's bug, not a supported mode.
#[derive(Debug, Clone)]
pub struct DomTree {
    /// All nodes in the tree, indexed by `NodeId`.
    /// The Document node is always at index 0 (`NodeId::ROOT`).
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a new tree with just the Document node.
    #[must_use]
    pub fn new() -> Self {
        let document = Node {
            node_type: NodeType::Document,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        };
        DomTree {
            nodes: vec![document],
        }
    }

    /// Get the root document node ID.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Get the number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (should always have at least the Document).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node and return its ID.
    /// The node is not yet attached to the tree.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            node_type,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        });
        id
    }

    /// [§ 4.2.2 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// "To append a node to a parent, pre-insert node into parent before null."
    ///
    /// Appends `child` as the last child of `parent`, updating all
    /// relationships.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let prev_last_child = self.nodes[parent.0].children.last().copied();

        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);

        if let Some(prev_id) = prev_last_child {
            self.nodes[prev_id.0].next_sibling = Some(child);
            self.nodes[child.0].prev_sibling = Some(prev_id);
        }
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// Get the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.last().copied())
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// [§ 4.2.6 Descendant](https://dom.spec.whatwg.org/#concept-tree-descendant)
    ///
    /// "An object A is called a descendant of an object B, if either A is a
    /// child of B or A is a child of an object C that is a descendant of B."
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent(descendant);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Iterate over preceding siblings (from immediately before to first child).
    #[must_use]
    pub fn preceding_siblings(&self, id: NodeId) -> PrecedingSiblingIterator<'_> {
        PrecedingSiblingIterator {
            tree: self,
            current: self.prev_sibling(id),
        }
    }

    /// Iterate over following siblings (from immediately after to last child).
    #[must_use]
    pub fn following_siblings(&self, id: NodeId) -> FollowingSiblingIterator<'_> {
        FollowingSiblingIterator {
            tree: self,
            current: self.next_sibling(id),
        }
    }

    /// Iterate over all descendants of a node in pre-order (document order).
    ///
    /// The node itself is not included.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> DescendantIterator<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        DescendantIterator { tree: self, stack }
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// [§ 4.4 textContent](https://dom.spec.whatwg.org/#dom-node-textcontent)
    ///
    /// "The descendant text content of a node is the concatenation of the
    /// data of all the Text node descendants of the node, in tree order."
    ///
    /// For a text node, this is the node's own data.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.as_text(id) {
            return text.to_string();
        }
        let mut buf = String::new();
        for descendant in self.descendants(id) {
            if let Some(text) = self.as_text(descendant) {
                buf.push_str(text);
            }
        }
        buf
    }

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is
    /// that document, if it exists; otherwise null."
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .find(|&&id| matches!(self.get(id).map(|n| &n.node_type), Some(NodeType::Element(_))))
            .copied()
    }

    /// Resolve a namespace prefix against the in-scope declarations.
    ///
    /// [Namespaces in XML § 6.1](https://www.w3.org/TR/xml-names/#scoping)
    /// "The scope of a namespace declaration declaring a prefix extends from
    /// the beginning of the start-tag in which it appears to the end of the
    /// corresponding end-tag."
    ///
    /// Walks from `id` (inclusive) up through its ancestors looking for an
    /// `xmlns:<prefix>` declaration. The `xml` prefix is implicitly bound
    /// per the namespaces spec.
    #[must_use]
    pub fn lookup_namespace_uri(&self, id: NodeId, prefix: &str) -> Option<String> {
        if prefix == "xml" {
            return Some(XML_NS_URI.to_string());
        }
        let decl = format!("xmlns:{prefix}");
        self.self_and_ancestors(id)
            .find_map(|node| self.as_element(node).and_then(|el| el.attrs.get(&decl)))
            .cloned()
    }

    /// Find the in-scope default namespace (`xmlns="..."`) for a node.
    ///
    /// Returns `None` when no default namespace declaration is in scope.
    #[must_use]
    pub fn default_namespace(&self, id: NodeId) -> Option<String> {
        self.self_and_ancestors(id)
            .find_map(|node| self.as_element(node).and_then(|el| el.attrs.get("xmlns")))
            .cloned()
    }

    /// The namespace URI this element belongs to, if any.
    ///
    /// A prefixed element resolves its prefix against in-scope declarations;
    /// an unprefixed element falls under the in-scope default namespace.
    #[must_use]
    pub fn namespace_uri(&self, id: NodeId) -> Option<String> {
        let element = self.as_element(id)?;
        match &element.prefix {
            Some(prefix) => self.lookup_namespace_uri(id, prefix),
            None => self.default_namespace(id),
        }
    }

    /// Look up an attribute by namespace URI and local name.
    ///
    /// [§ 4.9 getAttributeNS](https://dom.spec.whatwg.org/#dom-element-getattributens)
    ///
    /// Unprefixed attributes are in no namespace, so only prefixed
    /// attributes whose prefix resolves to `ns_uri` can match.
    #[must_use]
    pub fn attribute_ns(&self, id: NodeId, ns_uri: &str, local: &str) -> Option<&str> {
        let element = self.as_element(id)?;
        for (name, value) in &element.attrs {
            if let Some((prefix, attr_local)) = name.split_once(':') {
                if attr_local == local
                    && self.lookup_namespace_uri(id, prefix).as_deref() == Some(ns_uri)
                {
                    return Some(value.as_str());
                }
            }
        }
        None
    }

    /// Iterate over a node and then its ancestors up to the root.
    fn self_and_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(id).chain(self.ancestors(id))
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Iterator over preceding siblings of a node.
pub struct PrecedingSiblingIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for PrecedingSiblingIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.prev_sibling(id);
        Some(id)
    }
}

/// Iterator over following siblings of a node.
pub struct FollowingSiblingIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for FollowingSiblingIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.next_sibling(id);
        Some(id)
    }
}

/// Pre-order iterator over the descendants of a node.
pub struct DescendantIterator<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for DescendantIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        for &child in self.tree.children(id).iter().rev() {
            self.stack.push(child);
        }
        Some(id)
    }
}
