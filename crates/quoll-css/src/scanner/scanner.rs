//! The selector scanner.

use super::token::Token;
use crate::error::CssError;
use crate::stream::InputStream;

/// Scanner for CSS selector parsing.
///
/// Consumes an [`InputStream`] one character at a time, classifying each
/// into a [`Token`]. The most recently produced token and its character are
/// exposed as fields so the parser can inspect them without re-pumping.
#[derive(Debug)]
pub struct Scanner {
    input: InputStream,
    /// The current token, or `None` once the stream is exhausted.
    pub token: Option<Token>,
    /// The character the current token was built from. Whitespace runs are
    /// collapsed to a single space.
    pub value: char,
    recurse: bool,
    iterations: usize,
}

impl Scanner {
    /// Build a scanner over the given selector string.
    #[must_use]
    pub fn new(selector: &str) -> Self {
        Scanner {
            input: InputStream::new(selector),
            token: None,
            value: '\0',
            recurse: false,
            iterations: 0,
        }
    }

    /// Return the position of the reader in the string.
    #[must_use]
    pub fn position(&self) -> usize {
        self.input.position()
    }

    /// See the next character without removing it from the stream.
    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.input.peek()
    }

    /// Advance to the next token in the input stream.
    ///
    /// Sets `token`/`value` and returns the new token, or `None` once the
    /// end of the stream is reached.
    ///
    /// # Errors
    ///
    /// Returns [`CssError::Parse`] when the stream contains a character that
    /// is legal nowhere in a selector (a control character), and
    /// [`CssError::Internal`] when called again after the end of the stream
    /// was already reported - that second pump can only happen through a
    /// parser bug, so it is surfaced as an internal invariant violation
    /// rather than a user-facing parse failure.
    pub fn next_token(&mut self) -> Result<Option<Token>, CssError> {
        self.iterations += 1;
        if self.input.is_empty() {
            if self.recurse {
                return Err(CssError::Internal(format!(
                    "recursion error detected at iteration {}",
                    self.iterations
                )));
            }
            self.recurse = true;
            self.token = None;
            return Ok(None);
        }

        let Some(ch) = self.input.consume() else {
            return Err(CssError::Internal(
                "input stream empty after non-empty check".to_string(),
            ));
        };

        if is_selector_whitespace(ch) {
            // Collapse all whitespace to a space.
            self.value = ' ';
            self.token = Some(Token::White);
            return Ok(self.token);
        }

        if ch == '-' || ch == '_' || ch.is_ascii_alphanumeric() {
            self.value = ch;
            self.token = Some(Token::Char);
            return Ok(self.token);
        }

        self.value = ch;
        let tok = match ch {
            '*' => Some(Token::Star),
            '>' => Some(Token::RAngle),
            '.' => Some(Token::Dot),
            '#' => Some(Token::Octo),
            '[' => Some(Token::LSquare),
            ']' => Some(Token::RSquare),
            ':' => Some(Token::Colon),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '+' => Some(Token::Plus),
            '~' => Some(Token::Tilde),
            '=' => Some(Token::Eq),
            '|' => Some(Token::Pipe),
            ',' => Some(Token::Comma),
            '"' => Some(Token::Quote),
            '\'' => Some(Token::SQuote),
            '\\' => Some(Token::BSlash),
            '^' => Some(Token::Carat),
            '$' => Some(Token::Dollar),
            '@' => Some(Token::At),
            _ => None,
        };

        let tok = match tok {
            Some(tok) => tok,
            None => {
                // Catch all characters that are legal within strings:
                // printable ASCII, plus everything above the ASCII range.
                // Control characters are the only thing rejected outright.
                let ord = u32::from(ch);
                if (32..=126).contains(&ord) || ord >= 128 {
                    Token::StringLegal
                } else {
                    return Err(CssError::Parse(format!(
                        "illegal character found in stream: {ord}"
                    )));
                }
            }
        };

        self.token = Some(tok);
        Ok(self.token)
    }

    /// Get a name string from the input stream.
    ///
    /// A name string is composed only of [`Token::Char`] characters
    /// (`-`, `_`, `a-z`, `A-Z`, `0-9`). Consumes tokens greedily until the
    /// first non-Char token, which is left as the current token.
    ///
    /// # Errors
    ///
    /// Propagates scanner errors from token advancement.
    pub fn get_name_string(&mut self) -> Result<String, CssError> {
        let mut buf = String::new();
        while self.token == Some(Token::Char) {
            buf.push(self.value);
            let _ = self.next_token()?;
        }
        Ok(buf)
    }

    /// Read a string with any legal 'string' characters.
    ///
    /// See CSS Selectors Level 3 § 10.1 for the definition of string. This
    /// handles string1, string2, and the unquoted case (oddly absent from
    /// the official grammar, though such strings appear as examples in the
    /// spec).
    ///
    /// The scanner must be positioned at the opening `"`, `'`, or `(`; the
    /// matching close token is consumed. A backslash escapes the following
    /// character: the escaped character is taken literally and the
    /// backslash itself is dropped.
    ///
    /// # Errors
    ///
    /// Propagates scanner errors from token advancement.
    pub fn get_quoted_string(&mut self) -> Result<String, CssError> {
        self.read_delimited_string(false)
    }

    /// Read the contents of a pseudo-class argument.
    ///
    /// Like [`Scanner::get_quoted_string`], but additionally recurses on
    /// nested parentheses so arguments like `:not(:nth-child(2n))` survive
    /// with their inner structure intact.
    ///
    /// # Errors
    ///
    /// Propagates scanner errors from token advancement.
    pub fn get_pseudo_class_string(&mut self) -> Result<String, CssError> {
        self.read_delimited_string(true)
    }

    fn read_delimited_string(&mut self, nest_parens: bool) -> Result<String, CssError> {
        let end = match self.token {
            Some(Token::LParen) => Token::RParen,
            Some(tok @ (Token::Quote | Token::SQuote)) => tok,
            _ => return Ok(String::new()),
        };

        let mut buf = String::new();
        let mut escape = false;

        // Skip the opening quote/paren.
        let _ = self.next_token()?;

        while let Some(token) = self.token {
            if token == Token::BSlash && !escape {
                // The backslash itself is dropped; the next character is
                // taken literally.
                escape = true;
            } else if escape {
                buf.push(self.value);
                escape = false;
            } else if nest_parens && token == Token::LParen {
                // Allow nested pseudo-classes.
                buf.push('(');
                buf.push_str(&self.get_pseudo_class_string()?);
                buf.push(')');
                // get_pseudo_class_string consumed through the closing
                // paren and advanced past it, so re-enter the loop without
                // pumping again.
                continue;
            } else if token == end {
                // At end of string; skip the close token and stop.
                let _ = self.next_token()?;
                break;
            } else {
                buf.push(self.value);
            }
            let _ = self.next_token()?;
        }

        Ok(buf)
    }
}

/// Whitespace per the selector grammar: space, tab, newline, carriage
/// return, vertical tab, form feed.
fn is_selector_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C')
}
