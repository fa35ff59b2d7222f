//! Element handles and traversal iterators.

use std::fmt;

use sxd_document::dom::{self, ChildOfElement, ParentOfChild};

use super::{Attribute, Namespace, XmlNode};

/// A handle to an element node.
///
/// `Element` is `Copy`; equality compares node identity (two handles are
/// equal only when they reference the same node in the same document).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element<'d> {
    inner: dom::Element<'d>,
}

impl<'d> From<dom::Element<'d>> for Element<'d> {
    fn from(inner: dom::Element<'d>) -> Self {
        Self { inner }
    }
}

impl<'d> Element<'d> {
    pub(crate) fn new(inner: dom::Element<'d>) -> Self {
        Self { inner }
    }

    /// The underlying `sxd-document` element handle.
    pub fn inner(&self) -> dom::Element<'d> {
        self.inner
    }

    /// The element's local name.
    pub fn name(&self) -> &'d str {
        self.inner.name().local_part()
    }

    /// The element's namespace URI, if it is in a namespace.
    pub fn namespace_uri(&self) -> Option<&'d str> {
        self.inner.name().namespace_uri()
    }

    /// The element's namespace as a prefix/URI pair, if it is in one.
    pub fn namespace(&self) -> Option<Namespace> {
        self.namespace_uri()
            .map(|uri| Namespace::new(self.inner.preferred_prefix(), uri))
    }

    /// The fully qualified name in Clark notation: `{uri}local` when the
    /// element is in a namespace, the plain local name otherwise.
    pub fn qualified_name(&self) -> String {
        match self.namespace_uri() {
            Some(uri) => format!("{{{}}}{}", uri, self.name()),
            None => self.name().to_string(),
        }
    }

    /// The concatenation of all descendant text, i.e. the element's XPath
    /// string-value.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self.inner, &mut out);
        out
    }

    /// The element's attributes.
    ///
    /// Namespace declarations are not attributes and never appear here.
    pub fn attributes(&self) -> Vec<Attribute<'d>> {
        self.inner
            .attributes()
            .into_iter()
            .map(Attribute::new)
            .collect()
    }

    /// The value of the named (un-namespaced) attribute, if present.
    pub fn attribute(&self, name: &str) -> Option<&'d str> {
        self.inner.attribute_value(name)
    }

    /// The value of the named attribute in the given namespace, if present.
    pub fn attribute_ns(&self, name: &str, namespace_uri: &str) -> Option<&'d str> {
        self.inner.attribute_value((namespace_uri, name))
    }

    /// Interprets the named attribute as a boolean: `true` if it exists and
    /// holds a non-zero integer.
    pub fn bool_attribute(&self, name: &str) -> bool {
        self.attribute(name)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .is_some_and(|v| v != 0)
    }

    /// The parent element, or `None` for the root element.
    pub fn parent(&self) -> Option<Element<'d>> {
        match self.inner.parent()? {
            ParentOfChild::Element(e) => Some(Element::new(e)),
            ParentOfChild::Root(_) => None,
        }
    }

    /// All child nodes, in document order.
    pub fn children(&self) -> impl Iterator<Item = XmlNode<'d>> {
        self.inner.children().into_iter().map(wrap_child)
    }

    /// All descendant elements, depth-first pre-order, excluding `self`.
    ///
    /// Each element is yielded exactly once, in document order.
    pub fn descendants(&self) -> Descendants<'d> {
        let mut stack = Vec::new();
        push_children(&mut stack, self.inner);
        Descendants { stack }
    }

    /// The element siblings after this one, in document order.
    pub fn following_siblings(&self) -> impl Iterator<Item = Element<'d>> {
        self.inner
            .following_siblings()
            .into_iter()
            .filter_map(|c| match c {
                ChildOfElement::Element(e) => Some(Element::new(e)),
                _ => None,
            })
    }
}

impl fmt::Display for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}

fn wrap_child(child: ChildOfElement<'_>) -> XmlNode<'_> {
    match child {
        ChildOfElement::Element(e) => XmlNode::Element(Element::new(e)),
        ChildOfElement::Text(t) => XmlNode::Text(t),
        ChildOfElement::Comment(c) => XmlNode::Comment(c),
        ChildOfElement::ProcessingInstruction(pi) => XmlNode::ProcessingInstruction(pi),
    }
}

/// Pushes the element children of `element` onto `stack`, last child first,
/// so that popping visits them in document order.
fn push_children<'d>(stack: &mut Vec<Element<'d>>, element: dom::Element<'d>) {
    let mark = stack.len();
    stack.extend(element.children().into_iter().filter_map(|c| match c {
        ChildOfElement::Element(e) => Some(Element::new(e)),
        _ => None,
    }));
    stack[mark..].reverse();
}

fn collect_text(element: dom::Element<'_>, out: &mut String) {
    for child in element.children() {
        match child {
            ChildOfElement::Text(t) => out.push_str(t.text()),
            ChildOfElement::Element(e) => collect_text(e, out),
            _ => {}
        }
    }
}

/// Depth-first pre-order iterator over descendant elements.
///
/// Created by [`Element::descendants`].
pub struct Descendants<'d> {
    stack: Vec<Element<'d>>,
}

impl<'d> Iterator for Descendants<'d> {
    type Item = Element<'d>;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        push_children(&mut self.stack, element.inner);
        Some(element)
    }
}
