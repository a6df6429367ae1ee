//! The recursive-descent selector parser.

use super::events::{AttrOp, EventHandler};
use crate::error::CssError;
use crate::scanner::{Scanner, Token, token_name};

/// Parse a CSS selector.
///
/// In CSS, a selector identifies which element or elements in a document
/// are being selected - effectively a query language for a structured
/// document. This is an event-based parser: it recognizes the grammar with
/// no backtracking and fires one [`EventHandler`] call per recognized
/// construct, leaving representation to the handler. It can be used, for
/// example, as the basis for a DOM query engine built on CSS.
pub struct Parser<'a, H: EventHandler> {
    scanner: Scanner,
    handler: &'a mut H,
}

impl<'a, H: EventHandler> Parser<'a, H> {
    /// Construct a new selector parser over `selector`, sending events to
    /// `handler`.
    pub fn new(selector: &str, handler: &'a mut H) -> Self {
        Parser {
            scanner: Scanner::new(selector),
            handler,
        }
    }

    /// Parse the selector.
    ///
    /// Drives an event-based parse that fires handler events as the
    /// selector is recognized. Runs to completion or fails; a failed parse
    /// leaves the handler with whatever events were emitted before the
    /// error, which the caller is expected to discard.
    ///
    /// # Errors
    ///
    /// Returns [`CssError::Parse`] for malformed selectors. The top-level
    /// loop enforces forward progress: when the token stream is not
    /// exhausted but a full pass over the grammar consumed nothing, the
    /// input matches no production and the parse fails rather than
    /// spinning.
    pub fn parse(&mut self) -> Result<(), CssError> {
        let _ = self.scanner.next_token()?;

        while self.scanner.token.is_some() {
            let position = self.scanner.position();

            self.selector()?;

            if self.scanner.token.is_some() && self.scanner.position() == position {
                // The scanner did not pop a single character off of the
                // input stream during a full run of the grammar, so the
                // current input matches no recognizable pattern.
                return Err(CssError::Parse(
                    "CSS selector is not well formed".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Handle one entire selector: leading whitespace, the simple-selector
    /// sequence, then a trailing combinator if any.
    fn selector(&mut self) -> Result<(), CssError> {
        let _ = self.consume_whitespace()?;
        self.simple_selectors()?;
        self.combinator()
    }

    /// Consume whitespace tokens, returning how many were consumed.
    fn consume_whitespace(&mut self) -> Result<usize, CssError> {
        let mut white = 0;
        while self.scanner.token == Some(Token::White) {
            let _ = self.scanner.next_token()?;
            white += 1;
        }
        Ok(white)
    }

    /// Handle one of the five combinators: `>`, `+`, `~`, `,`, and
    /// whitespace.
    ///
    /// `' '` and `' > '` are both valid combinators, so whitespace
    /// consumption is counted to tell the bare descendant combinator apart
    /// from padding around an explicit one.
    fn combinator(&mut self) -> Result<(), CssError> {
        let mut in_combinator = false;
        let white = self.consume_whitespace()?;

        match self.scanner.token {
            Some(Token::RAngle) => {
                self.handler.direct_descendant();
                let _ = self.scanner.next_token()?;
                in_combinator = true;
            }
            Some(Token::Plus) => {
                self.handler.adjacent();
                let _ = self.scanner.next_token()?;
                in_combinator = true;
            }
            Some(Token::Comma) => {
                self.handler.another_selector();
                let _ = self.scanner.next_token()?;
                in_combinator = true;
            }
            Some(Token::Tilde) => {
                self.handler.sibling();
                let _ = self.scanner.next_token()?;
                in_combinator = true;
            }
            _ => {}
        }

        if in_combinator {
            // Two combinators in a row is malformed (e.g. `a > > b`).
            let _ = self.consume_whitespace()?;
            if is_combinator(self.scanner.token) {
                return Err(CssError::Parse(
                    "illegal combinator: cannot have two combinators in sequence".to_string(),
                ));
            }
        } else if white > 0 {
            // Whitespace with no explicit combinator is the descendant
            // combinator.
            self.handler.any_descendant();
        }
        Ok(())
    }

    /// Handle a simple selector: each clause kind in its fixed order.
    fn simple_selectors(&mut self) -> Result<(), CssError> {
        self.all_elements()?;
        self.element_name()?;
        self.element_class()?;
        self.element_id()?;
        self.pseudo_class()?;
        self.attribute()
    }

    /// Handle the all-elements designators: `*`, `*|*`, and `*|name`.
    ///
    /// Fires [`EventHandler::any_element`], [`EventHandler::any_element_in_ns`],
    /// or [`EventHandler::element_ns`].
    fn all_elements(&mut self) -> Result<(), CssError> {
        if self.scanner.token == Some(Token::Star) {
            let _ = self.scanner.next_token()?;
            if self.scanner.token == Some(Token::Pipe) {
                let _ = self.scanner.next_token()?;
                if self.scanner.token == Some(Token::Star) {
                    // `*|*`: per spec this requires that the element be in
                    // a namespace, so it goes to the namespace handler.
                    let _ = self.scanner.next_token()?;
                    self.handler.any_element_in_ns("*");
                } else {
                    // `*|name`: the name must be in a namespace.
                    let name = self.scanner.get_name_string()?;
                    self.handler.element_ns(&name, "*");
                }
            } else {
                self.handler.any_element();
            }
        }
        Ok(())
    }

    /// Handle element names:
    ///
    /// - `name` - [`EventHandler::element`]
    /// - `|name` - [`EventHandler::element`] (empty namespace is equivalent
    ///   to none)
    /// - `ns|name` - [`EventHandler::element_ns`]
    /// - `ns|*` - [`EventHandler::any_element_in_ns`]
    fn element_name(&mut self) -> Result<(), CssError> {
        if self.scanner.token == Some(Token::Pipe) {
            // `|name` is equivalent to `name`.
            let _ = self.scanner.next_token()?;
            let _ = self.consume_whitespace()?;
            let name = self.scanner.get_name_string()?;
            self.handler.element(&name);
        } else if self.scanner.token == Some(Token::Char) {
            let name = self.scanner.get_name_string()?;
            if self.scanner.token == Some(Token::Pipe) {
                // The name so far was actually a namespace prefix.
                let ns = name;
                let _ = self.scanner.next_token()?;
                let _ = self.consume_whitespace()?;
                if self.scanner.token == Some(Token::Star) {
                    // `ns|*`
                    self.handler.any_element_in_ns(&ns);
                    let _ = self.scanner.next_token()?;
                } else if self.scanner.token == Some(Token::Char) {
                    let element = self.scanner.get_name_string()?;
                    self.handler.element_ns(&element, &ns);
                } else {
                    return Err(expected(Token::Char, self.scanner.token));
                }
            } else {
                self.handler.element(&name);
            }
        }
        Ok(())
    }

    /// Handle a class selector (`.myclass`).
    ///
    /// Whitespace between the dot and the name is tolerated.
    fn element_class(&mut self) -> Result<(), CssError> {
        if self.scanner.token == Some(Token::Dot) {
            let _ = self.scanner.next_token()?;
            let _ = self.consume_whitespace()?;
            let class = self.scanner.get_name_string()?;
            self.handler.element_class(&class);
        }
        Ok(())
    }

    /// Handle an ID selector (`#myid`). A `#` not followed by an identifier
    /// is malformed.
    fn element_id(&mut self) -> Result<(), CssError> {
        if self.scanner.token == Some(Token::Octo) {
            let _ = self.scanner.next_token()?;
            if self.scanner.token != Some(Token::Char) {
                return Err(CssError::Parse("expected string after #".to_string()));
            }
            let id = self.scanner.get_name_string()?;
            self.handler.element_id(&id);
        }
        Ok(())
    }

    /// Handle a pseudo-class or pseudo-element.
    ///
    /// CSS 3 separates pseudo-elements (`::` separator) from pseudo-classes
    /// (`:`). Pseudo-elements cannot take arguments, and per the spec must
    /// be the last item in a selector: only end-of-input or a new
    /// alternative (`,`) may follow one.
    fn pseudo_class(&mut self) -> Result<(), CssError> {
        if self.scanner.token != Some(Token::Colon) {
            return Ok(());
        }

        let is_pseudo_element = self.scanner.next_token()? == Some(Token::Colon);
        if is_pseudo_element {
            let _ = self.scanner.next_token()?;
        }

        let name = self.scanner.get_name_string()?;

        let mut value = None;
        if self.scanner.token == Some(Token::LParen) {
            if is_pseudo_element {
                return Err(CssError::Parse(
                    "illegal left paren: pseudo-element cannot have arguments".to_string(),
                ));
            }
            value = Some(self.scanner.get_pseudo_class_string()?);
        }

        if is_pseudo_element {
            self.handler.pseudo_element(&name);
            let _ = self.consume_whitespace()?;

            if self.scanner.token.is_some() && self.scanner.token != Some(Token::Comma) {
                return Err(CssError::Parse(
                    "a pseudo-element must be the last item in a selector".to_string(),
                ));
            }
        } else {
            self.handler.pseudo_class(&name, value.as_deref());
        }
        Ok(())
    }

    /// Handle an attribute clause:
    ///
    /// - `[name]`, `[name=value]`, and every operator in [`AttrOp`]
    /// - `[|name…]` - empty namespace, equivalent to `[name…]`
    /// - `[ns|name…]`, `[*|name…]` - namespaced attribute
    /// - a leading `@` is tolerated (old broken CSS writes `[@name]`)
    ///
    /// Operators must not have whitespace between their characters
    /// (`~=`, never `~ =`). Values may be quoted strings (with backslash
    /// escapes) or bare words following the name rules.
    fn attribute(&mut self) -> Result<(), CssError> {
        if self.scanner.token != Some(Token::LSquare) {
            return Ok(());
        }

        let _ = self.scanner.next_token()?;
        let _ = self.consume_whitespace()?;

        if self.scanner.token == Some(Token::At) {
            let _ = self.scanner.next_token()?;
            let _ = self.consume_whitespace()?;
        }

        let mut ns: Option<String> = None;
        if self.scanner.token == Some(Token::Star) {
            // Any-namespace prefix; requires the attribute name to follow
            // after the pipe.
            ns = Some("*".to_string());
            let _ = self.scanner.next_token()?;
        }
        if self.scanner.token == Some(Token::Pipe) {
            // A bare leading pipe is the empty namespace; skip it.
            let _ = self.scanner.next_token()?;
            let _ = self.consume_whitespace()?;
        }

        let mut attr_name = self.scanner.get_name_string()?;
        let _ = self.consume_whitespace()?;

        // Check for a namespaced attribute: ns|attr. Peek past the pipe to
        // make sure this is not the |= operator, which looks the same.
        if self.scanner.token == Some(Token::Pipe) && self.scanner.peek() != Some('=') {
            ns = Some(attr_name);
            let _ = self.scanner.next_token()?;
            attr_name = self.scanner.get_name_string()?;
            let _ = self.consume_whitespace()?;
        }

        let mut op: Option<AttrOp> = None;
        match self.scanner.token {
            Some(Token::Eq) => op = Some(AttrOp::Exactly),
            Some(Token::Tilde) => {
                self.expect_eq_after_operator()?;
                op = Some(AttrOp::ContainsWithSpace);
            }
            Some(Token::Pipe) => {
                self.expect_eq_after_operator()?;
                op = Some(AttrOp::ContainsWithHyphen);
            }
            Some(Token::Star) => {
                self.expect_eq_after_operator()?;
                op = Some(AttrOp::ContainsInString);
            }
            Some(Token::Dollar) => {
                self.expect_eq_after_operator()?;
                op = Some(AttrOp::EndsWith);
            }
            Some(Token::Carat) => {
                self.expect_eq_after_operator()?;
                op = Some(AttrOp::BeginsWith);
            }
            _ => {}
        }

        let mut attr_val: Option<String> = None;
        if op.is_some() {
            // Consume the `=` and go on.
            let _ = self.scanner.next_token()?;
            let _ = self.consume_whitespace()?;

            // The grammar wants a quoted string here, but the spec itself
            // shows examples like [lang=fr], so bare words are assumed to
            // follow the name rules while quoted strings follow the string
            // rules.
            attr_val = Some(
                if matches!(self.scanner.token, Some(Token::Quote | Token::SQuote)) {
                    self.scanner.get_quoted_string()?
                } else {
                    self.scanner.get_name_string()?
                },
            );
        }

        let _ = self.consume_whitespace()?;

        if self.scanner.token != Some(Token::RSquare) {
            return Err(expected(Token::RSquare, self.scanner.token));
        }

        let op = op.unwrap_or(AttrOp::Exactly);
        match ns {
            Some(ns) => self
                .handler
                .attribute_ns(&attr_name, &ns, attr_val.as_deref(), op),
            None => self.handler.attribute(&attr_name, attr_val.as_deref(), op),
        }
        let _ = self.scanner.next_token()?;
        Ok(())
    }

    /// Two-character operators must be immediately followed by `=`.
    fn expect_eq_after_operator(&mut self) -> Result<(), CssError> {
        if self.scanner.next_token()? != Some(Token::Eq) {
            return Err(expected(Token::Eq, self.scanner.token));
        }
        Ok(())
    }
}

/// Check whether the token is an explicit combinator.
fn is_combinator(tok: Option<Token>) -> bool {
    matches!(
        tok,
        Some(Token::Plus | Token::RAngle | Token::Comma | Token::Tilde)
    )
}

/// Consistently-formatted "expected X, got Y" parse error.
fn expected(want: Token, got: Option<Token>) -> CssError {
    CssError::Parse(format!(
        "expected {}, got {}",
        token_name(Some(want)),
        token_name(got)
    ))
}
