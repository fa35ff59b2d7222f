//! XPath 1.0 evaluation and context registration.
//!
//! Call-through to the `sxd-xpath` engine. Expression parsing and evaluation
//! belong to the engine; this module owns value mapping, document-order
//! node-set snapshots, and the registration of namespaces and variables onto
//! a fresh engine context per evaluation (the same lifecycle libxml2 callers
//! follow with `xmlXPathNewContext`/`xmlXPathFreeContext` around each query).
//!
//! # Quick Start
//!
//! ```
//! use xmlcanopy::Document;
//! use xmlcanopy::xpath::evaluate;
//!
//! let doc = Document::parse_str("<root><a>1</a><b>2</b></root>").unwrap();
//! let result = evaluate(&doc, "count(/root/*)").unwrap();
//! assert_eq!(result.to_number(), 2.0);
//! ```
//!
//! # Namespaces and Variables
//!
//! ```
//! use xmlcanopy::Document;
//! use xmlcanopy::xpath::{evaluate_with, XPathContext};
//!
//! let doc = Document::parse_str(
//!     r#"<f:feed xmlns:f="urn:feed"><f:title>Hi</f:title></f:feed>"#,
//! ).unwrap();
//!
//! let mut ctx = XPathContext::new();
//! ctx.register_namespace("f", "urn:feed");
//! ctx.register_variable("min", 1.0);
//!
//! let result = evaluate_with(&doc, "count(//f:title) >= $min", &ctx).unwrap();
//! assert!(result.to_boolean());
//! ```

use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value, XPath};

use crate::error::{Error, Result};
use crate::tree::{Document, Element, Namespace, XmlNode};

/// Default prefix bound to prefix-less namespaces passed to
/// [`XPathContext::register_namespaces`].
pub const DEFAULT_NAMESPACE_PREFIX: &str = "ns";

/// A scalar value bindable to an XPath variable.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathScalar {
    /// A boolean variable.
    Boolean(bool),
    /// A numeric variable.
    Number(f64),
    /// A string variable.
    String(String),
}

impl From<bool> for XPathScalar {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for XPathScalar {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for XPathScalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for XPathScalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Registration state applied to each evaluation: namespace prefixes and
/// variable bindings.
///
/// The context is owned and reusable; a fresh engine context is created per
/// evaluation and the registrations replayed onto it.
#[derive(Debug, Clone, Default)]
pub struct XPathContext {
    namespaces: Vec<(String, String)>,
    variables: Vec<(String, XPathScalar)>,
}

impl XPathContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `prefix` to `uri` for use in expressions.
    pub fn register_namespace(&mut self, prefix: &str, uri: &str) -> &mut Self {
        self.namespaces.push((prefix.to_string(), uri.to_string()));
        self
    }

    /// Registers a collection of namespaces.
    ///
    /// Namespaces without a prefix (default namespaces) are bound to the
    /// [`DEFAULT_NAMESPACE_PREFIX`] so expressions can still address them.
    pub fn register_namespaces(&mut self, namespaces: impl IntoIterator<Item = Namespace>) -> &mut Self {
        for ns in namespaces {
            let prefix = ns.prefix.as_deref().unwrap_or(DEFAULT_NAMESPACE_PREFIX);
            self.register_namespace(prefix, &ns.uri);
        }
        self
    }

    /// Binds a boolean, number, or string variable usable as `$name`.
    pub fn register_variable(&mut self, name: &str, value: impl Into<XPathScalar>) -> &mut Self {
        self.variables.push((name.to_string(), value.into()));
        self
    }

    /// Whether `prefix` has a registered binding.
    fn has_prefix(&self, prefix: &str) -> bool {
        self.namespaces.iter().any(|(p, _)| p == prefix)
    }

    /// Replays the registrations onto a fresh engine context.
    fn apply<'d>(&self, context: &mut Context<'d>) {
        for (prefix, uri) in &self.namespaces {
            context.set_namespace(prefix, uri);
        }
        for (name, value) in &self.variables {
            let value: Value<'d> = match value {
                XPathScalar::Boolean(b) => Value::Boolean(*b),
                XPathScalar::Number(n) => Value::Number(*n),
                XPathScalar::String(s) => Value::String(s.clone()),
            };
            context.set_variable(name.as_str(), value);
        }
    }
}

/// A compiled XPath expression, reusable across documents and context nodes.
pub struct XPathExpression {
    inner: XPath,
    expression: String,
}

impl XPathExpression {
    /// Compiles an expression.
    pub fn compile(expression: &str) -> Result<Self> {
        if expression.trim().is_empty() {
            return Err(Error::XPathSyntax {
                expression: expression.to_string(),
                message: "empty expression".to_string(),
            });
        }
        let factory = Factory::new();
        match factory.build(expression) {
            Ok(Some(inner)) => Ok(Self {
                inner,
                expression: expression.to_string(),
            }),
            Ok(None) => Err(Error::XPathSyntax {
                expression: expression.to_string(),
                message: "expression compiled to nothing".to_string(),
            }),
            Err(e) => Err(Error::XPathSyntax {
                expression: expression.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// The source text this expression was compiled from.
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// Evaluates with the document root as context node.
    pub fn evaluate<'d>(&self, document: &'d Document) -> Result<XPathValue<'d>> {
        self.evaluate_with(document, &XPathContext::default())
    }

    /// Evaluates with the document root as context node and the given
    /// registrations.
    pub fn evaluate_with<'d>(
        &self,
        document: &'d Document,
        context: &XPathContext,
    ) -> Result<XPathValue<'d>> {
        let dom = document.dom();
        self.run(context, dom.root())
    }

    /// Evaluates with an element as context node.
    pub fn evaluate_from<'d>(
        &self,
        element: Element<'d>,
        context: &XPathContext,
    ) -> Result<XPathValue<'d>> {
        self.run(context, element.inner())
    }

    fn run<'d>(
        &self,
        context: &XPathContext,
        node: impl Into<Node<'d>>,
    ) -> Result<XPathValue<'d>> {
        // The engine aborts on a prefix it cannot resolve, so unknown
        // prefixes are rejected before evaluation.
        if let Some(prefix) = unregistered_prefix(&self.expression, context) {
            return Err(Error::XPathEvaluation {
                expression: self.expression.clone(),
                message: format!("unknown namespace prefix `{prefix}`"),
            });
        }
        let mut engine_context = Context::new();
        context.apply(&mut engine_context);
        match self.inner.evaluate(&engine_context, node) {
            Ok(value) => Ok(XPathValue::from_engine(value)),
            Err(e) => Err(Error::XPathEvaluation {
                expression: self.expression.clone(),
                message: e.to_string(),
            }),
        }
    }
}

/// Finds a namespace prefix used in `expression` that `context` does not
/// register.
///
/// A prefix is a name immediately before a single colon, outside string
/// literals. Double colons separate an axis from a node test and are not
/// prefixes.
fn unregistered_prefix(expression: &str, context: &XPathContext) -> Option<String> {
    fn is_name_byte(b: u8) -> bool {
        b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.') || b >= 0x80
    }

    let bytes = expression.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
        } else {
            match b {
                b'"' | b'\'' => quote = Some(b),
                b':' if i + 1 < bytes.len() && bytes[i + 1] == b':' => i += 1,
                b':' if i > 0 && is_name_byte(bytes[i - 1]) => {
                    let mut start = i;
                    while start > 0 && is_name_byte(bytes[start - 1]) {
                        start -= 1;
                    }
                    // A name cannot begin with a digit.
                    if !bytes[start].is_ascii_digit() {
                        let prefix = &expression[start..i];
                        if !context.has_prefix(prefix) {
                            return Some(prefix.to_string());
                        }
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Evaluates an expression with the document root as context node.
pub fn evaluate<'d>(document: &'d Document, expression: &str) -> Result<XPathValue<'d>> {
    XPathExpression::compile(expression)?.evaluate(document)
}

/// Evaluates an expression with registered namespaces and variables.
pub fn evaluate_with<'d>(
    document: &'d Document,
    expression: &str,
    context: &XPathContext,
) -> Result<XPathValue<'d>> {
    XPathExpression::compile(expression)?.evaluate_with(document, context)
}

/// The result of evaluating an XPath expression.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue<'d> {
    /// A set of nodes, snapshotted in document order.
    NodeSet(NodeSet<'d>),
    /// A boolean result.
    Boolean(bool),
    /// A numeric result.
    Number(f64),
    /// A string result.
    String(String),
}

impl<'d> XPathValue<'d> {
    fn from_engine(value: Value<'d>) -> Self {
        match value {
            Value::Nodeset(set) => {
                let nodes = set
                    .document_order()
                    .into_iter()
                    .map(wrap_node)
                    .collect();
                Self::NodeSet(NodeSet { nodes })
            }
            Value::Boolean(b) => Self::Boolean(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
        }
    }

    /// The boolean interpretation, per the XPath `boolean()` function.
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::NodeSet(set) => !set.is_empty(),
            Self::Boolean(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
        }
    }

    /// The numeric interpretation, per the XPath `number()` function.
    pub fn to_number(&self) -> f64 {
        match self {
            Self::NodeSet(_) => parse_xpath_number(&self.to_xpath_string()),
            Self::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Number(n) => *n,
            Self::String(s) => parse_xpath_number(s),
        }
    }

    /// The string interpretation, per the XPath `string()` function.
    pub fn to_xpath_string(&self) -> String {
        match self {
            Self::NodeSet(set) => set
                .first()
                .map(XmlNode::string_value)
                .unwrap_or_default(),
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => format_xpath_number(*n),
            Self::String(s) => s.clone(),
        }
    }

    /// The node-set, if this value is one.
    pub fn as_node_set(&self) -> Option<&NodeSet<'d>> {
        match self {
            Self::NodeSet(set) => Some(set),
            _ => None,
        }
    }
}

fn parse_xpath_number(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Formats a number the way the XPath `string()` function does: integers
/// without a decimal point, NaN and infinities by name.
fn format_xpath_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn wrap_node(node: Node<'_>) -> XmlNode<'_> {
    match node {
        Node::Element(e) => XmlNode::Element(Element::new(e)),
        Node::Attribute(a) => XmlNode::Attribute(crate::tree::Attribute::new(a)),
        Node::Text(t) => XmlNode::Text(t),
        Node::Comment(c) => XmlNode::Comment(c),
        Node::ProcessingInstruction(pi) => XmlNode::ProcessingInstruction(pi),
        Node::Root(r) => XmlNode::Root(r),
        Node::Namespace(ns) => XmlNode::Namespace(Namespace::new(
            if ns.prefix().is_empty() {
                None
            } else {
                Some(ns.prefix())
            },
            ns.uri(),
        )),
    }
}

/// A node-set snapshot in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeSet<'d> {
    nodes: Vec<XmlNode<'d>>,
}

impl<'d> NodeSet<'d> {
    /// The number of nodes in the set.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&XmlNode<'d>> {
        self.nodes.get(index)
    }

    /// The first node in document order.
    pub fn first(&self) -> Option<&XmlNode<'d>> {
        self.nodes.first()
    }

    /// Iterates over the nodes in document order.
    pub fn iter(&self) -> std::slice::Iter<'_, XmlNode<'d>> {
        self.nodes.iter()
    }

    /// The element nodes of the set, in document order.
    pub fn elements(&self) -> Vec<Element<'d>> {
        self.nodes.iter().filter_map(XmlNode::as_element).collect()
    }
}

impl<'a, 'd> IntoIterator for &'a NodeSet<'d> {
    type Item = &'a XmlNode<'d>;
    type IntoIter = std::slice::Iter<'a, XmlNode<'d>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    #[test]
    fn test_node_set_in_document_order() {
        let doc = Document::parse_str("<r><a/><b/><a/></r>").unwrap();
        let value = evaluate(&doc, "//a | //b").unwrap();
        let set = value.as_node_set().unwrap();
        let names: Vec<_> = set.elements().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_unregistered_prefix_is_an_evaluation_error() {
        let doc = Document::parse_str("<r/>").unwrap();
        assert!(matches!(
            evaluate(&doc, "//missing:node"),
            Err(Error::XPathEvaluation { .. })
        ));
        // Axis separators and colons inside string literals are not prefixes.
        let value = evaluate(&doc, "count(descendant-or-self::r['a:b' = 'a:b'])").unwrap();
        assert_eq!(value.to_number(), 1.0);
    }

    #[test]
    fn test_scalar_results() {
        let doc = Document::parse_str("<r><n>4</n><n>6</n></r>").unwrap();
        assert_eq!(evaluate(&doc, "count(//n)").unwrap().to_number(), 2.0);
        assert_eq!(evaluate(&doc, "sum(//n)").unwrap().to_number(), 10.0);
        assert!(evaluate(&doc, "count(//n) = 2").unwrap().to_boolean());
        assert_eq!(
            evaluate(&doc, "string(//n[1])").unwrap().to_xpath_string(),
            "4"
        );
    }

    #[test]
    fn test_value_coercions() {
        assert!(XPathValue::Number(1.0).to_boolean());
        assert!(!XPathValue::Number(0.0).to_boolean());
        assert!(!XPathValue::Number(f64::NAN).to_boolean());
        assert!(XPathValue::String("x".to_string()).to_boolean());
        assert!(!XPathValue::String(String::new()).to_boolean());
        assert_eq!(XPathValue::Boolean(true).to_number(), 1.0);
        assert_eq!(XPathValue::String(" 42 ".to_string()).to_number(), 42.0);
        assert!(XPathValue::String("x".to_string()).to_number().is_nan());
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_xpath_number(2.0), "2");
        assert_eq!(format_xpath_number(-3.0), "-3");
        assert_eq!(format_xpath_number(2.5), "2.5");
        assert_eq!(format_xpath_number(f64::NAN), "NaN");
        assert_eq!(format_xpath_number(f64::INFINITY), "Infinity");
        assert_eq!(format_xpath_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_empty_expression_rejected() {
        let doc = Document::parse_str("<r/>").unwrap();
        assert!(matches!(
            doc.xpath("   "),
            Err(Error::XPathSyntax { .. })
        ));
    }

    #[test]
    fn test_invalid_expression_rejected() {
        assert!(matches!(
            XPathExpression::compile("//["),
            Err(Error::XPathSyntax { .. })
        ));
    }

    #[test]
    fn test_compiled_expression_reuse() {
        let expr = XPathExpression::compile("count(//item)").unwrap();
        let doc1 = Document::parse_str("<r><item/></r>").unwrap();
        let doc2 = Document::parse_str("<r><item/><item/></r>").unwrap();
        assert_eq!(expr.evaluate(&doc1).unwrap().to_number(), 1.0);
        assert_eq!(expr.evaluate(&doc2).unwrap().to_number(), 2.0);
    }

    #[test]
    fn test_evaluate_from_element() {
        let doc = Document::parse_str("<r><a><x/></a><b><x/><x/></b></r>").unwrap();
        let root = doc.root_element().unwrap();
        let b = root.descendants().find(|e| e.name() == "b").unwrap();
        let expr = XPathExpression::compile("count(x)").unwrap();
        let ctx = XPathContext::new();
        assert_eq!(expr.evaluate_from(b, &ctx).unwrap().to_number(), 2.0);
    }

    #[test]
    fn test_default_prefix_fallback() {
        let mut ctx = XPathContext::new();
        ctx.register_namespaces(vec![Namespace::new(None, "urn:d")]);
        let doc = Document::parse_str(r#"<r xmlns="urn:d"><c/></r>"#).unwrap();
        let value = evaluate_with(&doc, "//ns:c", &ctx).unwrap();
        assert_eq!(value.as_node_set().unwrap().len(), 1);
    }

    #[test]
    fn test_variables() {
        let doc = Document::parse_str("<r><n>5</n></r>").unwrap();
        let mut ctx = XPathContext::new();
        ctx.register_variable("limit", 4.0)
            .register_variable("tag", "n")
            .register_variable("strict", true);
        let value = evaluate_with(
            &doc,
            "//n[. > $limit and name() = $tag and $strict]",
            &ctx,
        )
        .unwrap();
        assert_eq!(value.as_node_set().unwrap().len(), 1);
    }
}
