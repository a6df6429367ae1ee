//! CSS3 selector engine for the quoll document tree.
//!
//! Given a document and a CSS3 selector string, this crate returns the set
//! of matching nodes, and supports incremental narrowing of an existing
//! match set. Everything is synchronous, in-process computation over a
//! read-only tree: no I/O, no shared mutable state between queries.
//!
//! # Scope
//!
//! This crate implements:
//! - **Input stream and scanner** - a hand-written tokenizer over the
//!   selector string ([Selectors Level 3 § 10.1](https://www.w3.org/TR/selectors-3/#w3cselgrammar)).
//! - **Event-driven parser** - recursive descent over the selector
//!   grammar (combinators, namespaces, attribute operators,
//!   pseudo-classes/elements), firing one [`parser::EventHandler`] call
//!   per recognized construct.
//! - **Selector builder** - the production event handler, accumulating
//!   events into groups of [`selector::SimpleSelector`] records.
//! - **Pseudo-class evaluation** - An+B arithmetic, positional logic,
//!   text predicates, and nested-selector predicates (`:has`, `:not`)
//!   ([Selectors Level 3 § 6.6](https://www.w3.org/TR/selectors-3/#pseudo-classes)).
//! - **Tree matching** - a bottom-up matcher with initial-candidate
//!   optimizations and combinator recursion
//!   ([Selectors Level 3 § 8](https://www.w3.org/TR/selectors-3/#combinators)).
//!
//! # Not implemented
//!
//! - UA-state pseudo-classes (`:hover`, `:visited`, …) always evaluate
//!   false: there is no rendering or navigation context here.
//! - `::selection` raises [`error::CssError::NotImplemented`].
//! - Style computation, cascade, and specificity-based ordering are out of
//!   scope; this is a query engine, not a style engine.
//!
//! # Example
//!
//! ```
//! use quoll_css::DomTraverser;
//! use quoll_dom::{DomTree, ElementData, NodeType};
//!
//! let mut tree = DomTree::new();
//! let html = tree.alloc(NodeType::Element(ElementData::new("html")));
//! let body = tree.alloc(NodeType::Element(ElementData::new("body")));
//! let para = tree.alloc(NodeType::Element(ElementData::new("p")));
//! tree.append_child(tree.root(), html);
//! tree.append_child(html, body);
//! tree.append_child(body, para);
//!
//! let mut traverser = DomTraverser::new(&tree);
//! let _ = traverser.find("body > p").unwrap();
//! assert!(traverser.matches().contains(&para));
//! ```

/// Error types shared across parsing and matching.
pub mod error;
/// Event-driven selector parsing.
pub mod parser;
/// Selector tokenization.
pub mod scanner;
/// Selector representation and the event-accumulating builder.
pub mod selector;
/// The selector input stream.
pub mod stream;
/// Bottom-up tree matching, pseudo-class evaluation, and match utilities.
pub mod traverser;

// Re-exports for convenience
pub use error::CssError;
pub use parser::{AttrOp, EventHandler, Parser};
pub use scanner::{Scanner, Token};
pub use selector::{Combinator, Selector, SimpleSelector};
pub use stream::InputStream;
pub use traverser::DomTraverser;
pub use traverser::pseudo_class::PseudoClassMatcher;
