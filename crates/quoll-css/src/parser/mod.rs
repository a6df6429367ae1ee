//! Selector parser module.

/// Listener contract the parser emits grammar events to.
pub mod events;
/// Recursive-descent selector parser implementation.
pub mod selector_parser;

pub use events::{AttrOp, EventHandler};
pub use selector_parser::Parser;
