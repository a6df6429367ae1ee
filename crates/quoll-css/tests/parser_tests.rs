//! Integration tests for the event-driven selector parser.
//!
//! A recording [`EventHandler`] captures the emitted event stream so each
//! grammar production can be checked for exactly the events it should
//! fire, in order.

use quoll_css::error::CssError;
use quoll_css::parser::{AttrOp, EventHandler, Parser};

/// One recorded parse event.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    ElementId(String),
    Element(String),
    ElementNs(String, String),
    AnyElement,
    AnyElementInNs(String),
    ElementClass(String),
    Attribute(String, Option<String>, AttrOp),
    AttributeNs(String, String, Option<String>, AttrOp),
    PseudoClass(String, Option<String>),
    PseudoElement(String),
    DirectDescendant,
    AnyDescendant,
    Adjacent,
    Sibling,
    AnotherSelector,
}

/// Testing harness for the event handler contract: records every event in
/// arrival order.
#[derive(Debug, Default)]
struct RecordingHandler {
    stack: Vec<Event>,
}

impl EventHandler for RecordingHandler {
    fn element_id(&mut self, id: &str) {
        self.stack.push(Event::ElementId(id.to_string()));
    }

    fn element(&mut self, name: &str) {
        self.stack.push(Event::Element(name.to_string()));
    }

    fn element_ns(&mut self, name: &str, namespace: &str) {
        self.stack
            .push(Event::ElementNs(name.to_string(), namespace.to_string()));
    }

    fn any_element(&mut self) {
        self.stack.push(Event::AnyElement);
    }

    fn any_element_in_ns(&mut self, ns: &str) {
        self.stack.push(Event::AnyElementInNs(ns.to_string()));
    }

    fn element_class(&mut self, name: &str) {
        self.stack.push(Event::ElementClass(name.to_string()));
    }

    fn attribute(&mut self, name: &str, value: Option<&str>, op: AttrOp) {
        self.stack.push(Event::Attribute(
            name.to_string(),
            value.map(str::to_string),
            op,
        ));
    }

    fn attribute_ns(&mut self, name: &str, ns: &str, value: Option<&str>, op: AttrOp) {
        self.stack.push(Event::AttributeNs(
            name.to_string(),
            ns.to_string(),
            value.map(str::to_string),
            op,
        ));
    }

    fn pseudo_class(&mut self, name: &str, value: Option<&str>) {
        self.stack.push(Event::PseudoClass(
            name.to_string(),
            value.map(str::to_string),
        ));
    }

    fn pseudo_element(&mut self, name: &str) {
        self.stack.push(Event::PseudoElement(name.to_string()));
    }

    fn direct_descendant(&mut self) {
        self.stack.push(Event::DirectDescendant);
    }

    fn any_descendant(&mut self) {
        self.stack.push(Event::AnyDescendant);
    }

    fn adjacent(&mut self) {
        self.stack.push(Event::Adjacent);
    }

    fn sibling(&mut self) {
        self.stack.push(Event::Sibling);
    }

    fn another_selector(&mut self) {
        self.stack.push(Event::AnotherSelector);
    }
}

/// Parse a selector and return the recorded event stream.
fn parse_events(selector: &str) -> Result<Vec<Event>, CssError> {
    let mut handler = RecordingHandler::default();
    Parser::new(selector, &mut handler).parse()?;
    Ok(handler.stack)
}

fn events(selector: &str) -> Vec<Event> {
    parse_events(selector).expect("selector should parse")
}

// ========== element productions ==========

#[test]
fn test_element_id() {
    assert_eq!(events("#mytest"), vec![Event::ElementId("mytest".into())]);
}

#[test]
fn test_element() {
    assert_eq!(events("mytest"), vec![Event::Element("mytest".into())]);

    // An empty namespace is equivalent to no namespace.
    assert_eq!(events("|mytest"), vec![Event::Element("mytest".into())]);
}

#[test]
fn test_element_ns() {
    assert_eq!(
        events("myns|mytest"),
        vec![Event::ElementNs("mytest".into(), "myns".into())]
    );
    assert_eq!(
        events("*|mytest"),
        vec![Event::ElementNs("mytest".into(), "*".into())]
    );
    assert_eq!(events("*|*"), vec![Event::AnyElementInNs("*".into())]);
}

#[test]
fn test_any_element() {
    assert_eq!(events("*"), vec![Event::AnyElement]);
}

#[test]
fn test_any_element_in_ns() {
    assert_eq!(events("myns|*"), vec![Event::AnyElementInNs("myns".into())]);
}

#[test]
fn test_element_class() {
    assert_eq!(
        events(".myclass"),
        vec![Event::ElementClass("myclass".into())]
    );
}

#[test]
fn test_repeated_classes() {
    assert_eq!(
        events(".one.two"),
        vec![
            Event::ElementClass("one".into()),
            Event::ElementClass("two".into()),
        ]
    );
}

// ========== pseudo-classes and pseudo-elements ==========

#[test]
fn test_pseudo_class() {
    // Without a value.
    assert_eq!(
        events("myele:mypclass"),
        vec![
            Event::Element("myele".into()),
            Event::PseudoClass("mypclass".into(), None),
        ]
    );

    // With a value.
    assert_eq!(
        events("myele:mypclass(myval)"),
        vec![
            Event::Element("myele".into()),
            Event::PseudoClass("mypclass".into(), Some("myval".into())),
        ]
    );

    // With a pseudo-class as value.
    assert_eq!(
        events("myele:mypclass(:anotherPseudo)"),
        vec![
            Event::Element("myele".into()),
            Event::PseudoClass("mypclass".into(), Some(":anotherPseudo".into())),
        ]
    );
}

#[test]
fn test_pseudo_element() {
    assert_eq!(
        events("myele::mypele"),
        vec![
            Event::Element("myele".into()),
            Event::PseudoElement("mypele".into()),
        ]
    );
}

#[test]
fn test_pseudo_element_must_be_last() {
    // Anything but end-of-input or a comma after a pseudo-element is
    // malformed.
    assert!(matches!(
        parse_events("a::before b"),
        Err(CssError::Parse(_))
    ));

    // A comma is fine: the pseudo-element ends one alternative.
    assert_eq!(
        events("a::before, b"),
        vec![
            Event::Element("a".into()),
            Event::PseudoElement("before".into()),
            Event::AnotherSelector,
            Event::Element("b".into()),
        ]
    );
}

#[test]
fn test_pseudo_element_cannot_have_arguments() {
    assert!(matches!(
        parse_events("a::slotted(b)"),
        Err(CssError::Parse(_))
    ));
}

// ========== combinators ==========

#[test]
fn test_direct_descendant() {
    assert_eq!(
        events("ele1 > ele2"),
        vec![
            Event::Element("ele1".into()),
            Event::DirectDescendant,
            Event::Element("ele2".into()),
        ]
    );
}

#[test]
fn test_any_descendant() {
    assert_eq!(
        events("ele1  .class"),
        vec![
            Event::Element("ele1".into()),
            Event::AnyDescendant,
            Event::ElementClass("class".into()),
        ]
    );
}

#[test]
fn test_adjacent() {
    assert_eq!(
        events("ele1 + ele2"),
        vec![
            Event::Element("ele1".into()),
            Event::Adjacent,
            Event::Element("ele2".into()),
        ]
    );
}

#[test]
fn test_sibling() {
    assert_eq!(
        events("ele1 ~ ele2"),
        vec![
            Event::Element("ele1".into()),
            Event::Sibling,
            Event::Element("ele2".into()),
        ]
    );
}

#[test]
fn test_another_selector() {
    assert_eq!(
        events("ele1 , ele2"),
        vec![
            Event::Element("ele1".into()),
            Event::AnotherSelector,
            Event::Element("ele2".into()),
        ]
    );
}

#[test]
fn test_combinators_without_padding() {
    assert_eq!(
        events("a>b"),
        vec![
            Event::Element("a".into()),
            Event::DirectDescendant,
            Event::Element("b".into()),
        ]
    );
    assert_eq!(
        events("a+b"),
        vec![
            Event::Element("a".into()),
            Event::Adjacent,
            Event::Element("b".into()),
        ]
    );
    assert_eq!(
        events("a~b"),
        vec![
            Event::Element("a".into()),
            Event::Sibling,
            Event::Element("b".into()),
        ]
    );
    assert_eq!(
        events("a,b"),
        vec![
            Event::Element("a".into()),
            Event::AnotherSelector,
            Event::Element("b".into()),
        ]
    );
}

#[test]
fn test_illegal_combinator_sequences() {
    assert!(matches!(
        parse_events("ele1 > > ele2"),
        Err(CssError::Parse(_))
    ));
    assert!(matches!(
        parse_events("ele1+ ,ele2"),
        Err(CssError::Parse(_))
    ));
}

#[test]
fn test_illegal_id() {
    assert!(matches!(parse_events("##ID"), Err(CssError::Parse(_))));
}

// ========== attributes ==========

#[test]
fn test_attribute_presence() {
    assert_eq!(
        events("element[attr]"),
        vec![
            Event::Element("element".into()),
            Event::Attribute("attr".into(), None, AttrOp::Exactly),
        ]
    );
    assert_eq!(
        events("*[attr]"),
        vec![
            Event::AnyElement,
            Event::Attribute("attr".into(), None, AttrOp::Exactly),
        ]
    );
    // A pseudo-class after the attribute clause is picked up on the next
    // pass of the top-level loop.
    assert_eq!(
        events("element[attr]:class"),
        vec![
            Event::Element("element".into()),
            Event::Attribute("attr".into(), None, AttrOp::Exactly),
            Event::PseudoClass("class".into(), None),
        ]
    );
}

#[test]
fn test_attribute_operators() {
    let cases: [(&str, AttrOp); 6] = [
        ("*[attr=\"value\"]", AttrOp::Exactly),
        ("*[attr^=\"value\"]", AttrOp::BeginsWith),
        ("*[attr$=\"value\"]", AttrOp::EndsWith),
        ("*[attr*=\"value\"]", AttrOp::ContainsInString),
        ("*[attr~=\"value\"]", AttrOp::ContainsWithSpace),
        ("*[attr|=\"value\"]", AttrOp::ContainsWithHyphen),
    ];
    for (selector, op) in cases {
        assert_eq!(
            events(selector),
            vec![
                Event::AnyElement,
                Event::Attribute("attr".into(), Some("value".into()), op),
            ],
            "selector {selector:?}"
        );
    }
}

#[test]
fn test_attribute_with_empty_namespace_prefix() {
    // [|attr=...] acts like [attr=...].
    assert_eq!(
        events("*[|attr=\"value\"]"),
        vec![
            Event::AnyElement,
            Event::Attribute("attr".into(), Some("value".into()), AttrOp::Exactly),
        ]
    );
}

#[test]
fn test_attribute_bareword_value() {
    // Displayed in the spec, though not accounted for in the grammar.
    assert_eq!(
        events("*[attr=value]"),
        vec![
            Event::AnyElement,
            Event::Attribute("attr".into(), Some("value".into()), AttrOp::Exactly),
        ]
    );
}

#[test]
fn test_attribute_value_escapes() {
    // Characters can be escaped with a backslash.
    assert_eq!(
        events(r#"*[attr="\.value"]"#),
        vec![
            Event::AnyElement,
            Event::Attribute("attr".into(), Some(".value".into()), AttrOp::Exactly),
        ]
    );
    assert_eq!(
        events(r#"*[attr="\.\]\]\]"]"#),
        vec![
            Event::AnyElement,
            Event::Attribute("attr".into(), Some(".]]]".into()), AttrOp::Exactly),
        ]
    );
    // Backslash-backslash resolves to a single backslash.
    assert_eq!(
        events(r#"*[attr="\\c"]"#),
        vec![
            Event::AnyElement,
            Event::Attribute("attr".into(), Some("\\c".into()), AttrOp::Exactly),
        ]
    );
}

#[test]
fn test_attribute_empty_value() {
    assert_eq!(
        events("*[attr=\"\"]"),
        vec![
            Event::AnyElement,
            Event::Attribute("attr".into(), Some(String::new()), AttrOp::Exactly),
        ]
    );
}

#[test]
fn test_attribute_ns() {
    assert_eq!(
        events("*[ns|attr=\"value\"]"),
        vec![
            Event::AnyElement,
            Event::AttributeNs("attr".into(), "ns".into(), Some("value".into()), AttrOp::Exactly),
        ]
    );
    assert_eq!(
        events("*[*|attr^=\"value\"]"),
        vec![
            Event::AnyElement,
            Event::AttributeNs(
                "attr".into(),
                "*".into(),
                Some("value".into()),
                AttrOp::BeginsWith
            ),
        ]
    );
    assert_eq!(
        events("*[*|attr|=\"value\"]"),
        vec![
            Event::AnyElement,
            Event::AttributeNs(
                "attr".into(),
                "*".into(),
                Some("value".into()),
                AttrOp::ContainsWithHyphen
            ),
        ]
    );
}

#[test]
fn test_attribute_at_prefix_tolerated() {
    // Old broken CSS writes [@attr]; the @ is skipped.
    assert_eq!(
        events("*[@attr]"),
        vec![
            Event::AnyElement,
            Event::Attribute("attr".into(), None, AttrOp::Exactly),
        ]
    );
}

#[test]
fn test_illegal_attribute() {
    // `=~` is not an operator; the value reader stops at the tilde and
    // the close-bracket check fails.
    assert!(matches!(
        parse_events("[test=~far]"),
        Err(CssError::Parse(_))
    ));
}

#[test]
fn test_attribute_operator_requires_adjacent_equals() {
    assert!(matches!(parse_events("[a~ =b]"), Err(CssError::Parse(_))));
}

#[test]
fn test_unclosed_attribute_bracket() {
    assert!(matches!(parse_events("[attr"), Err(CssError::Parse(_))));
}

// ========== combinations ==========

#[test]
fn test_element_ns_class_and_attribute() {
    let expect = vec![
        Event::ElementNs("element".into(), "ns".into()),
        Event::ElementClass("class".into()),
        Event::Attribute("name".into(), Some("value".into()), AttrOp::Exactly),
    ];

    assert_eq!(events("ns|element.class[name=\"value\"]"), expect);

    // Again, with spaces this time.
    assert_eq!(events(" ns|element. class[  name = \"value\" ]"), expect);
}

#[test]
fn test_all_combo() {
    let selector = "*|ele1 > ele2.class1 + ns1|ele3.class2[attr=simple] ~
 .class2[attr2~=\"longer string of text.\"]:pseudoClass(value)
 .class3::pseudoElement";
    let expect = vec![
        Event::ElementNs("ele1".into(), "*".into()),
        Event::DirectDescendant,
        Event::Element("ele2".into()),
        Event::ElementClass("class1".into()),
        Event::Adjacent,
        Event::ElementNs("ele3".into(), "ns1".into()),
        Event::ElementClass("class2".into()),
        Event::Attribute("attr".into(), Some("simple".into()), AttrOp::Exactly),
        Event::Sibling,
        Event::ElementClass("class2".into()),
        Event::Attribute(
            "attr2".into(),
            Some("longer string of text.".into()),
            AttrOp::ContainsWithSpace,
        ),
        Event::PseudoClass("pseudoClass".into(), Some("value".into())),
        Event::AnyDescendant,
        Event::ElementClass("class3".into()),
        Event::PseudoElement("pseudoElement".into()),
    ];

    assert_eq!(events(selector), expect);
}

// ========== degenerate inputs ==========

#[test]
fn test_empty_selector_produces_no_events() {
    assert_eq!(events(""), vec![]);
}

#[test]
fn test_unparseable_garbage_is_a_parse_error() {
    // A string-legal character matches no production, so the
    // forward-progress guard fires rather than looping forever.
    assert!(matches!(parse_events("&&&"), Err(CssError::Parse(_))));
}
