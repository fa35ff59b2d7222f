//! Document model wrappers over the `sxd-document` DOM.
//!
//! A [`Document`] owns the underlying storage (`sxd_document::Package`) and
//! lends out lightweight, `Copy` handles into it: [`Element`], [`Attribute`],
//! and the [`XmlNode`] enum covering every node kind. All navigation is a
//! call-through to the wrapped DOM; this module adds no tree machinery of
//! its own, only an ergonomic surface in the style of libxml2's wrappers.
//!
//! XML and HTML parses produce the *same* document model, so navigation,
//! XPath evaluation, and serialization behave identically for both.
//!
//! # Examples
//!
//! ```
//! use xmlcanopy::Document;
//!
//! let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
//! let root = doc.root_element().unwrap();
//! assert_eq!(root.name(), "root");
//! assert_eq!(root.text(), "Hello");
//! ```

mod element;

pub use element::{Descendants, Element};

use std::fmt;
use std::io::Write;
use std::path::Path;

use sxd_document::dom::{self, ChildOfRoot};
use sxd_document::writer::format_document;
use sxd_document::Package;

use crate::error::{Error, ParseDiagnostic, Result};
use crate::parser::ParseOptions;
use crate::xpath::{XPathContext, XPathValue};

/// Which parser produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Produced by the XML parser.
    Xml,
    /// Produced by the permissive HTML parser.
    Html,
}

/// An XML namespace: an optional prefix bound to a URI.
///
/// Used both for reporting an element's namespace and as registration input
/// for XPath evaluation (see [`XPathContext::register_namespaces`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    /// The namespace prefix, or `None` for a default namespace.
    pub prefix: Option<String>,
    /// The namespace URI.
    pub uri: String,
}

impl Namespace {
    /// Creates a namespace from a prefix and URI.
    pub fn new(prefix: Option<&str>, uri: &str) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            uri: uri.to_string(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "xmlns:{}={}", p, self.uri),
            None => write!(f, "xmlns={}", self.uri),
        }
    }
}

/// A named attribute on an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attribute<'d> {
    inner: dom::Attribute<'d>,
}

impl<'d> Attribute<'d> {
    pub(crate) fn new(inner: dom::Attribute<'d>) -> Self {
        Self { inner }
    }

    /// The attribute's local name.
    pub fn name(&self) -> &'d str {
        self.inner.name().local_part()
    }

    /// The attribute's namespace URI, if it has one.
    pub fn namespace_uri(&self) -> Option<&'d str> {
        self.inner.name().namespace_uri()
    }

    /// The attribute's value.
    pub fn value(&self) -> &'d str {
        self.inner.value()
    }

    /// The underlying `sxd-document` attribute handle.
    pub fn inner(&self) -> dom::Attribute<'d> {
        self.inner
    }
}

impl fmt::Display for Attribute<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=\"{}\"", self.name(), self.value())
    }
}

/// A handle to any node in the document.
///
/// This is the element type of XPath node-sets and of [`Document::children`].
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode<'d> {
    /// An element node.
    Element(Element<'d>),
    /// An attribute node (only reachable through XPath).
    Attribute(Attribute<'d>),
    /// A text node (including CDATA content).
    Text(dom::Text<'d>),
    /// A comment node.
    Comment(dom::Comment<'d>),
    /// A processing instruction node.
    ProcessingInstruction(dom::ProcessingInstruction<'d>),
    /// The document root (parent of the root element).
    Root(dom::Root<'d>),
    /// A namespace node (only reachable through XPath's `namespace::` axis).
    Namespace(Namespace),
}

impl<'d> XmlNode<'d> {
    /// Returns the element if this node is one.
    pub fn as_element(&self) -> Option<Element<'d>> {
        match self {
            Self::Element(e) => Some(*e),
            _ => None,
        }
    }

    /// Returns the text content for text and comment nodes.
    pub fn as_text(&self) -> Option<&'d str> {
        match self {
            Self::Text(t) => Some(t.text()),
            Self::Comment(c) => Some(c.text()),
            _ => None,
        }
    }

    /// The XPath string-value of this node.
    ///
    /// For elements and the root this is the concatenation of all descendant
    /// text; for the other kinds it is the node's own content.
    pub fn string_value(&self) -> String {
        match self {
            Self::Element(e) => e.text(),
            Self::Attribute(a) => a.value().to_string(),
            Self::Text(t) => t.text().to_string(),
            Self::Comment(c) => c.text().to_string(),
            Self::ProcessingInstruction(pi) => pi.value().unwrap_or("").to_string(),
            Self::Root(r) => r
                .children()
                .into_iter()
                .filter_map(|c| match c {
                    ChildOfRoot::Element(e) => Some(Element::new(e).text()),
                    _ => None,
                })
                .collect(),
            Self::Namespace(ns) => ns.uri.clone(),
        }
    }
}

/// An XML or HTML document.
///
/// Owns the underlying DOM storage plus everything the wrapped parsers leave
/// behind: recovery diagnostics and the captured DOCTYPE. Handles returned
/// by navigation methods borrow from the document.
pub struct Document {
    package: Package,
    kind: DocumentKind,
    /// Diagnostics collected while parsing (empty for a clean parse).
    pub diagnostics: Vec<ParseDiagnostic>,
    doctype: Option<String>,
}

impl Document {
    pub(crate) fn from_parts(
        package: Package,
        kind: DocumentKind,
        diagnostics: Vec<ParseDiagnostic>,
        doctype: Option<String>,
    ) -> Self {
        Self {
            package,
            kind,
            diagnostics,
            doctype,
        }
    }

    /// Parses an XML document from a string with default options.
    pub fn parse_str(input: &str) -> Result<Self> {
        crate::parser::parse_str(input)
    }

    /// Parses an XML document from a string with the given options.
    pub fn parse_str_with_options(input: &str, options: &ParseOptions) -> Result<Self> {
        crate::parser::parse_str_with_options(input, options)
    }

    /// Parses an XML document from a file with default options.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        crate::parser::parse_file(path)
    }

    /// The underlying `sxd-document` DOM handle.
    pub(crate) fn dom(&self) -> dom::Document<'_> {
        self.package.as_document()
    }

    /// The underlying `sxd-document` storage, for direct access to the
    /// wrapped library's full API.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// True if this document was produced by the HTML parser.
    pub fn is_html(&self) -> bool {
        self.kind == DocumentKind::Html
    }

    /// The raw DOCTYPE declaration, captured verbatim, if one was present.
    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    /// The document's root element.
    ///
    /// Returns `None` only for documents constructed without one, which the
    /// parsers never produce.
    pub fn root_element(&self) -> Option<Element<'_>> {
        self.dom().root().children().into_iter().find_map(|c| match c {
            ChildOfRoot::Element(e) => Some(Element::new(e)),
            _ => None,
        })
    }

    /// All top-level nodes: the root element plus any comments and
    /// processing instructions outside it.
    pub fn children(&self) -> Vec<XmlNode<'_>> {
        self.dom()
            .root()
            .children()
            .into_iter()
            .map(|c| match c {
                ChildOfRoot::Element(e) => XmlNode::Element(Element::new(e)),
                ChildOfRoot::Comment(c) => XmlNode::Comment(c),
                ChildOfRoot::ProcessingInstruction(pi) => XmlNode::ProcessingInstruction(pi),
            })
            .collect()
    }

    /// The value of the given attribute.
    pub fn value_of<'d>(&'d self, attribute: &Attribute<'d>) -> &'d str {
        attribute.value()
    }

    /// The value of the named attribute on `element`, if present.
    pub fn attribute_value<'d>(&'d self, element: Element<'d>, name: &str) -> Option<&'d str> {
        element.attribute(name)
    }

    /// Evaluates an XPath expression with the document root as context node.
    pub fn xpath(&self, expression: &str) -> Result<XPathValue<'_>> {
        crate::xpath::evaluate(self, expression)
    }

    /// Evaluates an XPath expression with registered namespaces and variables.
    pub fn xpath_with(
        &self,
        expression: &str,
        context: &XPathContext,
    ) -> Result<XPathValue<'_>> {
        crate::xpath::evaluate_with(self, expression, context)
    }

    /// Evaluates an XPath expression and returns the matched elements in
    /// document order.
    ///
    /// Fails if the expression does not evaluate to a node-set.
    pub fn select(&self, expression: &str) -> Result<Vec<Element<'_>>> {
        match self.xpath(expression)? {
            XPathValue::NodeSet(set) => Ok(set.elements()),
            _ => Err(Error::XPathEvaluation {
                expression: expression.to_string(),
                message: "expression did not evaluate to a node-set".to_string(),
            }),
        }
    }

    /// Returns a depth-first pre-order walk over the document's elements,
    /// yielding `(depth, element, parent)` for each.
    pub fn tree(&self) -> TreeWalk<'_> {
        TreeWalk {
            stack: self
                .root_element()
                .map(|root| vec![(0, root, None)])
                .unwrap_or_default(),
        }
    }

    /// Serializes the document to an XML string.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        String::from_utf8(buf).map_err(|e| Error::Serialize(e.to_string()))
    }

    /// Writes the serialized document to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        format_document(&self.dom(), writer)?;
        Ok(())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("kind", &self.kind)
            .field("root", &self.root_element().map(|e| e.qualified_name()))
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}

/// Depth-first pre-order walk over a document's elements.
///
/// Created by [`Document::tree`]. Each step yields the element's depth
/// (root = 0), the element itself, and its parent element.
pub struct TreeWalk<'d> {
    stack: Vec<(usize, Element<'d>, Option<Element<'d>>)>,
}

impl<'d> Iterator for TreeWalk<'d> {
    type Item = (usize, Element<'d>, Option<Element<'d>>);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, element, parent) = self.stack.pop()?;
        let mark = self.stack.len();
        self.stack.extend(
            element
                .children()
                .filter_map(|n| n.as_element())
                .map(|child| (depth + 1, child, Some(element))),
        );
        self.stack[mark..].reverse();
        Some((depth, element, parent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_element() {
        let doc = Document::parse_str("<root><child/></root>").unwrap();
        assert_eq!(doc.root_element().unwrap().name(), "root");
    }

    #[test]
    fn test_children_includes_outside_comments() {
        let doc = Document::parse_str("<!-- before --><root/><!-- after -->").unwrap();
        let children = doc.children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].as_text(), Some(" before "));
        assert!(children[1].as_element().is_some());
        assert_eq!(children[2].as_text(), Some(" after "));
    }

    #[test]
    fn test_tree_walk_order_and_depth() {
        let doc = Document::parse_str("<a><b><c/></b><d/></a>").unwrap();
        let walk: Vec<_> = doc
            .tree()
            .map(|(depth, e, parent)| (depth, e.name(), parent.map(|p| p.name())))
            .collect();
        assert_eq!(
            walk,
            vec![
                (0, "a", None),
                (1, "b", Some("a")),
                (2, "c", Some("b")),
                (1, "d", Some("a")),
            ]
        );
    }

    #[test]
    fn test_select_returns_elements_in_document_order() {
        let doc = Document::parse_str("<r><x id='1'/><y/><x id='2'/></r>").unwrap();
        let xs = doc.select("//x").unwrap();
        assert_eq!(xs.len(), 2);
        assert_eq!(xs[0].attribute("id"), Some("1"));
        assert_eq!(xs[1].attribute("id"), Some("2"));
    }

    #[test]
    fn test_select_rejects_scalar_result() {
        let doc = Document::parse_str("<r/>").unwrap();
        assert!(doc.select("count(//r)").is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let doc = Document::parse_str("<r a=\"1\"><c>text</c></r>").unwrap();
        let out = doc.to_xml_string().unwrap();
        let doc2 = Document::parse_str(&out).unwrap();
        let root = doc2.root_element().unwrap();
        assert_eq!(root.name(), "r");
        assert_eq!(root.attribute("a"), Some("1"));
        assert_eq!(root.text(), "text");
    }

    #[test]
    fn test_value_of_attribute() {
        let doc = Document::parse_str("<r key=\"value\"/>").unwrap();
        let root = doc.root_element().unwrap();
        let attr = root.attributes()[0];
        assert_eq!(doc.value_of(&attr), "value");
        assert_eq!(doc.attribute_value(root, "key"), Some("value"));
    }
}
