//! Error types for selector parsing and matching.

use thiserror::Error;

/// Errors raised while parsing or evaluating a CSS selector.
///
/// Two failure modes matter to callers and are kept distinct:
///
/// - [`CssError::Parse`] - the selector string is malformed. Raised
///   synchronously from parsing or from matching (an unknown pseudo-class
///   name is only discovered when the evaluator sees it). A failed parse
///   yields no match set at all.
/// - [`CssError::NotImplemented`] - the selector is syntactically valid but
///   names a construct this engine cannot evaluate (`::selection`, `:lang()`
///   without a value). Callers may treat "valid but unsupported" differently
///   from "invalid".
///
/// [`CssError::Internal`] guards against engine bugs (pumping the scanner
/// past end of stream) and is not a user-facing failure mode.
#[derive(Debug, Error)]
pub enum CssError {
    /// The selector string is not well formed.
    #[error("CSS parse error: {0}")]
    Parse(String),

    /// A syntactically valid construct that this engine does not evaluate.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// An internal invariant was violated; indicates a bug in the engine.
    #[error("internal error: {0}")]
    Internal(String),
}
