//! The event contract between the selector parser and its consumers.

use strum_macros::Display;

/// Attribute value comparison operators.
///
/// [Selectors Level 3 § 6.3](https://www.w3.org/TR/selectors-3/#attribute-selectors)
///
/// The `Display` form is the CSS punctuation (`=`, `~=`, `|=`, `*=`, `^=`,
/// `$=`), used when rendering a selector back to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AttrOp {
    /// `[attr=value]` - "the attribute value is exactly 'value'"
    #[strum(serialize = "=")]
    Exactly,
    /// `[attr~=value]` - "a whitespace-separated list of words, one of
    /// which is exactly 'value'"
    #[strum(serialize = "~=")]
    ContainsWithSpace,
    /// `[attr|=value]` - hyphen-separated list containing 'value'
    #[strum(serialize = "|=")]
    ContainsWithHyphen,
    /// `[attr*=value]` - "contains at least one instance of the substring"
    #[strum(serialize = "*=")]
    ContainsInString,
    /// `[attr^=value]` - "begins with the prefix 'value'"
    #[strum(serialize = "^=")]
    BeginsWith,
    /// `[attr$=value]` - "ends with the suffix 'value'"
    #[strum(serialize = "$=")]
    EndsWith,
}

/// Receiver for selector parse events.
///
/// The [`Parser`](super::Parser) recognizes the selector grammar and, as a
/// side effect of each production, calls the matching method here. This
/// decouples grammar recognition from any particular selector
/// representation: the production implementation is
/// [`Selector`](crate::selector::Selector), which accumulates events into
/// simple-selector groups, and test harnesses supply their own recorders.
///
/// Events arrive in source order. Combinator events terminate the simple
/// selector under construction and announce the relationship to the next
/// one.
pub trait EventHandler {
    /// An ID selector (`#mytest`) was found.
    fn element_id(&mut self, id: &str);

    /// A bare element name (`mytest` or `|mytest`) was found.
    fn element(&mut self, name: &str);

    /// A namespaced element name (`ns|mytest`, `*|mytest`) was found.
    fn element_ns(&mut self, name: &str, namespace: &str);

    /// The wildcard element (`*`) was found.
    fn any_element(&mut self);

    /// A namespaced wildcard (`ns|*`, `*|*`) was found.
    fn any_element_in_ns(&mut self, ns: &str);

    /// A class selector (`.myclass`) was found.
    fn element_class(&mut self, name: &str);

    /// An attribute selector (`[name]`, `[name=value]`) was found.
    fn attribute(&mut self, name: &str, value: Option<&str>, op: AttrOp);

    /// A namespaced attribute selector (`[ns|name=value]`) was found.
    fn attribute_ns(&mut self, name: &str, ns: &str, value: Option<&str>, op: AttrOp);

    /// A pseudo-class (`:visited`, `:nth-child(2n+1)`) was found.
    fn pseudo_class(&mut self, name: &str, value: Option<&str>);

    /// A pseudo-element (`::first-line`) was found.
    fn pseudo_element(&mut self, name: &str);

    /// A direct descendant combinator (`>`) was found.
    fn direct_descendant(&mut self);

    /// A descendant combinator (whitespace) was found.
    fn any_descendant(&mut self);

    /// An adjacent sibling combinator (`+`) was found.
    fn adjacent(&mut self);

    /// A general sibling combinator (`~`) was found.
    fn sibling(&mut self);

    /// An alternative-group separator (`,`) was found.
    fn another_selector(&mut self);
}
