//! Token categories recognized by the selector scanner.

use strum_macros::Display;

/// Tokens of the selector grammar.
///
/// [Selectors Level 3 § 10.1](https://www.w3.org/TR/selectors-3/#w3cselgrammar)
///
/// Each variant is a single-character category; the scanner keeps the
/// consumed character itself in its `value` field, which matters for
/// [`Token::Char`] and [`Token::StringLegal`] where the category alone does
/// not identify the character.
///
/// The `Display` names are the phrasing used in parse error messages
/// ("Expected equals, got tilde").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Token {
    /// An identifier character: `-`, `_`, or ASCII alphanumeric.
    #[strum(serialize = "character")]
    Char,
    /// `*`
    #[strum(serialize = "star")]
    Star,
    /// `>`
    #[strum(serialize = "right angle bracket")]
    RAngle,
    /// `.`
    #[strum(serialize = "dot")]
    Dot,
    /// `#`
    #[strum(serialize = "octothorp")]
    Octo,
    /// `]`
    #[strum(serialize = "right square bracket")]
    RSquare,
    /// `[`
    #[strum(serialize = "left square bracket")]
    LSquare,
    /// `:`
    #[strum(serialize = "colon")]
    Colon,
    /// `)`
    #[strum(serialize = "right parenthesis")]
    RParen,
    /// `(`
    #[strum(serialize = "left parenthesis")]
    LParen,
    /// `+`
    #[strum(serialize = "plus")]
    Plus,
    /// `~`
    #[strum(serialize = "tilde")]
    Tilde,
    /// `=`
    #[strum(serialize = "equals")]
    Eq,
    /// `|`
    #[strum(serialize = "vertical bar")]
    Pipe,
    /// `,`
    #[strum(serialize = "comma")]
    Comma,
    /// Whitespace, collapsed to a single space.
    #[strum(serialize = "space")]
    White,
    /// `"`
    #[strum(serialize = "quote")]
    Quote,
    /// `'`
    #[strum(serialize = "single quote")]
    SQuote,
    /// `\`
    #[strum(serialize = "backslash")]
    BSlash,
    /// `^`
    #[strum(serialize = "carat")]
    Carat,
    /// `$`
    #[strum(serialize = "dollar")]
    Dollar,
    /// `@` - not in the selector grammar, but old broken CSS uses it.
    #[strum(serialize = "at")]
    At,
    /// Any other character legal inside a string.
    #[strum(serialize = "a legal non-alphanumeric character")]
    StringLegal,
}

/// Human-readable name for an optional token, for error reporting.
///
/// `None` is the end-of-stream sentinel.
#[must_use]
pub fn token_name(token: Option<Token>) -> String {
    match token {
        Some(tok) => tok.to_string(),
        None => "end of file".to_string(),
    }
}
