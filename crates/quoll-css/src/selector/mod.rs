//! Selector representation: simple selectors, combinators, and the builder
//! that accumulates parse events into selector groups.

use core::fmt;

use strum_macros::Display;

use crate::parser::{AttrOp, EventHandler};

/// Combinators joining two simple selectors.
///
/// [Selectors Level 3 § 8](https://www.w3.org/TR/selectors-3/#combinators)
///
/// A combinator on a [`SimpleSelector`] describes its relationship to the
/// simple selector that *follows it in source order*. The `Display` form is
/// the CSS punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Combinator {
    /// `+` - "an element immediately preceded by its sibling"
    #[strum(serialize = "+")]
    Adjacent,
    /// `>` - "a childhood relationship between two elements"
    #[strum(serialize = ">")]
    DirectDescendant,
    /// `,` - not a structural relationship: starts a new alternative group
    #[strum(serialize = ", ")]
    AnotherSelector,
    /// `~` - "an element preceded by some sibling, not necessarily
    /// immediately"
    #[strum(serialize = "~")]
    Sibling,
    /// Whitespace - "an element that is an arbitrary descendant of some
    /// ancestor"
    #[strum(serialize = " ")]
    AnyDescendant,
}

/// One attribute constraint of a simple selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrMatch {
    /// Attribute local name.
    pub name: String,
    /// Namespace prefix, `*` for any namespace, or `None` for no
    /// namespace constraint.
    pub ns: Option<String>,
    /// Required value; `None` means presence alone satisfies the
    /// constraint.
    pub value: Option<String>,
    /// How the value is compared.
    pub op: AttrOp,
}

/// One pseudo-class reference of a simple selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoClassRef {
    /// Pseudo-class name as written (case preserved; matching lowercases).
    pub name: String,
    /// Parenthesized argument, if any.
    pub value: Option<String>,
}

/// Models a simple selector.
///
/// CSS selectors are composed of one or more simple selectors, where each
/// simple selector may have any of the following components:
///
/// - An element name (or the wildcard `*`)
/// - An ID (`#foo`)
/// - One or more classes (`.foo.bar`)
/// - One or more attribute matchers (`[foo=bar]`)
/// - One or more pseudo-classes (`:foo`)
/// - One or more pseudo-elements (`::first`)
///
/// For performance reasons this object is kept as sparse as possible:
/// every field defaults to empty, and the matcher treats an empty field as
/// "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleSelector {
    /// Element name, `*` for the wildcard, or `None` for any element.
    pub element: Option<String>,
    /// Namespace prefix, `*` for any namespace, or `None` for no
    /// namespace constraint.
    pub ns: Option<String>,
    /// Exact id.
    pub id: Option<String>,
    /// Required classes; all must be present.
    pub classes: Vec<String>,
    /// Attribute constraints, in source order.
    pub attributes: Vec<AttrMatch>,
    /// Pseudo-class references, in source order.
    pub pseudo_classes: Vec<PseudoClassRef>,
    /// Pseudo-element names, in source order.
    pub pseudo_elements: Vec<String>,
    /// Relationship to the simple selector that follows this one in
    /// source order, when any does.
    pub combinator: Option<Combinator>,
}

impl SimpleSelector {
    /// Create an empty simple selector with no constraints.
    #[must_use]
    pub fn new() -> Self {
        SimpleSelector::default()
    }

    /// True when no constraint of any kind has been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.element.is_none()
            && self.ns.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
            && self.pseudo_classes.is_empty()
            && self.pseudo_elements.is_empty()
            && self.combinator.is_none()
    }
}

impl fmt::Display for SimpleSelector {
    /// Render the simple selector back to selector-ish text. Used for
    /// diagnostics; not guaranteed to re-parse to an identical event
    /// stream.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.ns {
            write!(f, "{ns}|")?;
        }
        if let Some(element) = &self.element {
            write!(f, "{element}")?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for attr in &self.attributes {
            write!(f, "[")?;
            if let Some(ns) = &attr.ns {
                write!(f, "{ns}|")?;
            }
            write!(f, "{}", attr.name)?;
            if let Some(value) = &attr.value {
                write!(f, "{}{value}", attr.op)?;
            }
            write!(f, "]")?;
        }
        for pc in &self.pseudo_classes {
            write!(f, ":{}", pc.name)?;
            if let Some(value) = &pc.value {
                write!(f, "({value})")?;
            }
        }
        for pe in &self.pseudo_elements {
            write!(f, "::{pe}")?;
        }
        if let Some(combinator) = self.combinator {
            write!(f, "{combinator}")?;
        }
        Ok(())
    }
}

/// The production [`EventHandler`]: accumulates parse events into groups
/// of simple selectors.
///
/// Comma-separated alternatives each become one *group*. Within a group
/// the simple selectors are stored **subject-first**: each combinator
/// event stamps the record under construction and prepends a fresh one, so
/// by the end of the parse `groups()[g][0]` is the rightmost compound (the
/// subject the match set is seeded from) and walking to index `i + 1`
/// moves one combinator to the left in source order. The traverser relies
/// on this ordering for its bottom-up search.
///
/// This type has no matching logic; it is purely a listener/builder.
#[derive(Debug)]
pub struct Selector {
    groups: Vec<Vec<SimpleSelector>>,
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

impl Selector {
    /// Create a builder holding a single empty simple selector.
    #[must_use]
    pub fn new() -> Self {
        Selector {
            groups: vec![vec![SimpleSelector::new()]],
        }
    }

    /// The accumulated selector groups, subject-first within each group.
    #[must_use]
    pub fn groups(&self) -> &[Vec<SimpleSelector>] {
        &self.groups
    }

    /// Consume the builder, yielding the accumulated groups.
    #[must_use]
    pub fn into_groups(self) -> Vec<Vec<SimpleSelector>> {
        self.groups
    }

    /// Number of selector groups accumulated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// True when nothing beyond the initial empty selector was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.len() == 1 && self.groups[0].len() == 1 && self.groups[0][0].is_empty()
    }

    /// The simple selector currently under construction.
    ///
    /// Groups are never empty: construction and both combinator paths
    /// insert a fresh record.
    fn current(&mut self) -> &mut SimpleSelector {
        let group = self.groups.len() - 1;
        &mut self.groups[group][0]
    }

    /// Stamp the current simple selector with `combinator` and start a new
    /// one in front of it (keeping subject-first order).
    fn push_combinator(&mut self, combinator: Combinator) {
        self.current().combinator = Some(combinator);
        let group = self.groups.len() - 1;
        self.groups[group].insert(0, SimpleSelector::new());
    }
}

impl EventHandler for Selector {
    fn element_id(&mut self, id: &str) {
        self.current().id = Some(id.to_string());
    }

    fn element(&mut self, name: &str) {
        self.current().element = Some(name.to_string());
    }

    fn element_ns(&mut self, name: &str, namespace: &str) {
        let current = self.current();
        current.element = Some(name.to_string());
        current.ns = Some(namespace.to_string());
    }

    fn any_element(&mut self) {
        self.current().element = Some("*".to_string());
    }

    fn any_element_in_ns(&mut self, ns: &str) {
        let current = self.current();
        current.element = Some("*".to_string());
        current.ns = Some(ns.to_string());
    }

    fn element_class(&mut self, name: &str) {
        self.current().classes.push(name.to_string());
    }

    fn attribute(&mut self, name: &str, value: Option<&str>, op: AttrOp) {
        self.current().attributes.push(AttrMatch {
            name: name.to_string(),
            ns: None,
            value: value.map(str::to_string),
            op,
        });
    }

    fn attribute_ns(&mut self, name: &str, ns: &str, value: Option<&str>, op: AttrOp) {
        self.current().attributes.push(AttrMatch {
            name: name.to_string(),
            ns: Some(ns.to_string()),
            value: value.map(str::to_string),
            op,
        });
    }

    fn pseudo_class(&mut self, name: &str, value: Option<&str>) {
        self.current().pseudo_classes.push(PseudoClassRef {
            name: name.to_string(),
            value: value.map(str::to_string),
        });
    }

    fn pseudo_element(&mut self, name: &str) {
        self.current().pseudo_elements.push(name.to_string());
    }

    fn direct_descendant(&mut self) {
        self.push_combinator(Combinator::DirectDescendant);
    }

    fn any_descendant(&mut self) {
        self.push_combinator(Combinator::AnyDescendant);
    }

    fn adjacent(&mut self) {
        self.push_combinator(Combinator::Adjacent);
    }

    fn sibling(&mut self) {
        self.push_combinator(Combinator::Sibling);
    }

    fn another_selector(&mut self) {
        self.current().combinator = Some(Combinator::AnotherSelector);
        self.groups.push(vec![SimpleSelector::new()]);
    }
}
