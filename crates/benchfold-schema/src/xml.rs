//! XML bindings: schema decoding and the XML content view.
//!
//! Schema roles live in a `type="prefix:role"` attribute; the prefix is
//! ignored. Wrapper elements such as `complexType` or `sequence` are looked
//! through, so XSD-shaped schemas load as long as their `element`s carry
//! role types.

use crate::content::ContentNode;
use crate::role::Role;
use crate::schema::{Schema, SchemaError, SchemaFormat, Scope, join, shown};
use benchfold_kernel::{FailurePredicate, Literal, PredicateError};
use regex::Regex;
use roxmltree::{Document, Node};
use std::sync::OnceLock;

const ELEMENT_TAG: &str = "element";
const FAILURE_TAG: &str = "failure";
const ANY_ITEM: &str = "*";

fn boolean_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?i:true|false)$").expect("boolean regex must compile"))
}

fn integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+$").expect("integer regex must compile"))
}

fn double_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][+-]?\d+)?$")
            .expect("double regex must compile")
    })
}

/// Classify XML text: boolean, integer, double, else string.
pub fn classify(text: &str) -> Literal {
    let text = text.trim();
    if boolean_re().is_match(text) {
        return Literal::Boolean(text.eq_ignore_ascii_case("true"));
    }
    if integer_re().is_match(text)
        && let Ok(i) = text.parse::<i64>()
    {
        return Literal::Integer(i);
    }
    if double_re().is_match(text)
        && let Ok(d) = text.parse::<f64>()
        && d.is_finite()
    {
        return Literal::Double(d);
    }
    Literal::String(text.to_string())
}

pub fn parse_schema(text: &str) -> Result<Schema, SchemaError> {
    let doc = Document::parse(text).map_err(|e| SchemaError::Format {
        json: String::new(),
        xml: e.to_string(),
    })?;
    let container = doc.root_element();
    let top = if is_tag(container, ELEMENT_TAG) {
        container
    } else {
        let mut found = Vec::new();
        declarations(container, &mut found);
        found
            .into_iter()
            .find(|n| is_tag(*n, ELEMENT_TAG))
            .ok_or(SchemaError::Empty)?
    };
    let root = decode_element(top, "")?;
    Schema::new(root, SchemaFormat::Xml)
}

fn is_tag(node: Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

/// `element` and `failure` declarations directly under `node`.
fn declarations<'a, 'input>(node: Node<'a, 'input>, out: &mut Vec<Node<'a, 'input>>) {
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            ELEMENT_TAG | FAILURE_TAG => out.push(child),
            "annotation" | "documentation" => {}
            _ => declarations(child, out),
        }
    }
}

fn decode_element(element: Node<'_, '_>, parent_path: &str) -> Result<Scope, SchemaError> {
    let key = element.attribute("name").unwrap_or_default();
    let path = join(parent_path, key);
    let role = match element.attribute("type") {
        None => Role::Ignored,
        Some(qualified) => {
            let local = qualified.rsplit(':').next().unwrap_or(qualified);
            local.parse().map_err(|role| SchemaError::UnknownRole {
                path: shown(&path),
                role,
            })?
        }
    };

    let mut scope = Scope::new(key, role);
    let mut found = Vec::new();
    declarations(element, &mut found);
    for node in found {
        if is_tag(node, FAILURE_TAG) {
            scope.failures.push(decode_failure(node, &path)?);
            continue;
        }
        let child = decode_element(node, &path)?;
        if role == Role::Array && child.role.is_structural() {
            if scope.items.is_some() {
                return Err(SchemaError::Malformed {
                    path: shown(&path),
                    message: "array declares more than one item element".into(),
                });
            }
            scope.items = Some(Box::new(child));
        } else {
            scope.children.push(child);
        }
    }
    Ok(scope)
}

fn decode_failure(node: Node<'_, '_>, path: &str) -> Result<FailurePredicate, SchemaError> {
    if let Some(key) = node.attribute("key") {
        return Ok(FailurePredicate::StringEqualsKey {
            key: key.to_string(),
        });
    }
    let predicate_error = |source| SchemaError::Predicate {
        path: shown(path),
        source,
    };
    let raw = node
        .attribute("value")
        .ok_or_else(|| predicate_error(PredicateError::MissingValue))?;
    FailurePredicate::from_literal(&classify(raw), node.attribute("compare"))
        .map_err(predicate_error)
}

/// A position in a parsed XML content document.
///
/// Keys resolve to an attribute first and a nested element second; an
/// element's own text is its literal.
#[derive(Debug, Clone, Copy)]
pub enum XmlNode<'a, 'input> {
    Element(Node<'a, 'input>),
    Attribute(&'a str),
}

impl<'a, 'input> XmlNode<'a, 'input> {
    pub fn root(doc: &'a Document<'input>) -> Self {
        Self::Element(doc.root_element())
    }

    /// Tag name of an element; empty for attributes.
    pub fn name(&self) -> &'a str {
        match self {
            Self::Element(node) => node.tag_name().name(),
            Self::Attribute(_) => "",
        }
    }
}

impl ContentNode for XmlNode<'_, '_> {
    fn child(&self, key: &str) -> Option<Self> {
        let Self::Element(node) = self else {
            return None;
        };
        if let Some(value) = node.attribute(key) {
            return Some(Self::Attribute(value));
        }
        node.children()
            .find(|c| is_tag(*c, key))
            .map(Self::Element)
    }

    fn items(&self, item_key: &str) -> Vec<Self> {
        let Self::Element(node) = self else {
            return Vec::new();
        };
        node.children()
            .filter(|c| {
                c.is_element()
                    && (item_key.is_empty()
                        || item_key == ANY_ITEM
                        || c.tag_name().name() == item_key)
            })
            .map(Self::Element)
            .collect()
    }

    fn members(&self) -> Vec<(String, Self)> {
        let Self::Element(node) = self else {
            return Vec::new();
        };
        let attributes = node
            .attributes()
            .map(|a| (a.name().to_string(), Self::Attribute(a.value())));
        let elements = node
            .children()
            .filter(Node::is_element)
            .map(|c| (c.tag_name().name().to_string(), Self::Element(c)));
        attributes.chain(elements).collect()
    }

    fn literal(&self) -> Option<Literal> {
        match self {
            Self::Attribute(value) => Some(classify(value)),
            Self::Element(node) => {
                let text: String = node
                    .children()
                    .filter(Node::is_text)
                    .filter_map(|c| c.text())
                    .collect();
                let text = text.trim();
                (!text.is_empty()).then(|| classify(text))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::{AttributeRole, ValueSource};
    use benchfold_kernel::{Comparator, ValueKind};

    const SCHEMA: &str = r#"
        <schema xmlns:b="urn:benchfold">
          <element name="report" type="b:object">
            <element name="suite" type="b:name"/>
            <element name="tests" type="b:array">
              <element name="test" type="b:result">
                <element name="name" type="b:name"/>
                <element name="ms" type="b:double">
                  <failure value="100" compare="&gt;"/>
                </element>
              </element>
            </element>
          </element>
        </schema>"#;

    #[test]
    fn classify_follows_literal_patterns() {
        assert_eq!(classify("TRUE"), Literal::Boolean(true));
        assert_eq!(classify(" 42 "), Literal::Integer(42));
        assert_eq!(classify("-1.5e3"), Literal::Double(-1500.0));
        assert_eq!(classify(".5"), Literal::Double(0.5));
        assert_eq!(classify("1.2.3"), Literal::String("1.2.3".into()));
        assert_eq!(classify("nan"), Literal::String("nan".into()));
    }

    #[test]
    fn schema_elements_decode_into_scopes() {
        let schema = parse_schema(SCHEMA).unwrap();
        let root = schema.root();
        assert_eq!(root.key, "report");
        assert_eq!(root.role, Role::Object);
        assert_eq!(root.children[0].role, Role::Attribute(AttributeRole::Name));

        let tests = &root.children[1];
        let item = tests.items.as_deref().unwrap();
        assert_eq!(item.key, "test");
        assert_eq!(item.role, Role::Result { full: false });
        let ms = &item.children[1];
        assert_eq!(ms.role, Role::Value(ValueSource::Typed(ValueKind::Double)));
        assert_eq!(
            ms.failures,
            vec![FailurePredicate::NumericCompare {
                compare: Comparator::Greater,
                value: 100.0
            }]
        );
    }

    #[test]
    fn wrapper_elements_are_looked_through() {
        let schema = parse_schema(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:element name="run" type="object">
                   <xs:annotation><xs:documentation>ignored</xs:documentation></xs:annotation>
                   <xs:complexType><xs:sequence>
                     <xs:element name="total" type="result-full"/>
                   </xs:sequence></xs:complexType>
                 </xs:element>
               </xs:schema>"#,
        )
        .unwrap();
        assert_eq!(schema.root().children.len(), 1);
        assert_eq!(schema.root().children[0].key, "total");
    }

    #[test]
    fn arrays_accept_a_single_item_element() {
        let err = parse_schema(
            r#"<schema><element name="a" type="array">
                 <element name="x" type="result-full"/>
                 <element name="y" type="result-full"/>
               </element></schema>"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::Malformed { ref path, .. } if path == "a"));
    }

    #[test]
    fn content_keys_prefer_attributes_over_elements() {
        let text = r#"<test name="attr"><name>element</name><ms>12.5</ms></test>"#;
        let doc = Document::parse(text).unwrap();
        let root = XmlNode::root(&doc);

        assert_eq!(
            root.child("name").and_then(|n| n.literal()),
            Some(Literal::String("attr".into()))
        );
        assert_eq!(
            root.child("ms").and_then(|n| n.literal()),
            Some(Literal::Double(12.5))
        );
        assert_eq!(root.name(), "test");
        assert_eq!(root.literal(), None);
    }

    #[test]
    fn items_filter_by_item_name() {
        let doc = Document::parse("<r><t/><t/><other/></r>").unwrap();
        let root = XmlNode::root(&doc);
        assert_eq!(root.items("t").len(), 2);
        assert_eq!(root.items("*").len(), 3);
    }
}
