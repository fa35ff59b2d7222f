//! Permissive HTML parsing.
//!
//! Wraps the `html5ever`-based parser from `scraper`, which applies the HTML5
//! error-recovery algorithm: unclosed tags are closed, stray end tags are
//! dropped, and a missing `html`/`head`/`body` skeleton is implied. The
//! recovered tree is transferred into the same document storage the XML
//! parser uses, so navigation, XPath, and serialization work identically on
//! both kinds of input.
//!
//! HTML elements land in the document without a namespace; address them by
//! bare name in XPath expressions (`//title`, not a prefixed form).
//!
//! ```
//! use xmlcanopy::html::parse_html;
//!
//! let doc = parse_html("<p>one<p>two").unwrap();
//! let count = doc.xpath("count(//p)").unwrap().to_number();
//! assert_eq!(count, 2.0);
//! ```

use std::fs;
use std::path::Path;

use sxd_document::dom;
use sxd_document::Package;

use crate::error::{Error, ParseDiagnostic, Result, Severity, SourceLocation};
use crate::tree::{Document, DocumentKind};

/// Options controlling HTML parsing.
///
/// Unlike the XML parser, recovery defaults to on: HTML5 parsing is defined
/// in terms of error recovery and real-world pages rarely parse cleanly.
#[derive(Debug, Clone)]
pub struct HtmlParseOptions {
    recover: bool,
    no_blanks: bool,
    no_warnings: bool,
}

impl Default for HtmlParseOptions {
    fn default() -> Self {
        Self {
            recover: true,
            no_blanks: false,
            no_warnings: false,
        }
    }
}

impl HtmlParseOptions {
    /// Creates the default option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// When disabled, any recovery performed by the HTML5 algorithm is
    /// reported as a fatal error instead of a diagnostic.
    #[must_use]
    pub fn recover(mut self, recover: bool) -> Self {
        self.recover = recover;
        self
    }

    /// Drop whitespace-only text nodes from the tree.
    #[must_use]
    pub fn no_blanks(mut self, no_blanks: bool) -> Self {
        self.no_blanks = no_blanks;
        self
    }

    /// Suppress the warning log line emitted per recovery diagnostic.
    #[must_use]
    pub fn no_warnings(mut self, no_warnings: bool) -> Self {
        self.no_warnings = no_warnings;
        self
    }
}

/// Parses an HTML document with default options.
pub fn parse_html(input: &str) -> Result<Document> {
    parse_html_with_options(input, &HtmlParseOptions::default())
}

/// Parses an HTML document.
pub fn parse_html_with_options(input: &str, options: &HtmlParseOptions) -> Result<Document> {
    let html = scraper::Html::parse_document(input);

    let diagnostics: Vec<ParseDiagnostic> = html
        .errors
        .iter()
        .map(|message| ParseDiagnostic {
            severity: Severity::Warning,
            message: message.to_string(),
            location: SourceLocation::default(),
        })
        .collect();

    if !options.no_warnings {
        for diagnostic in &diagnostics {
            log::warn!("html parse: {}", diagnostic.message);
        }
    }

    if !options.recover {
        if let Some(first) = diagnostics.first() {
            return Err(Error::XmlSyntax {
                message: first.message.clone(),
                location: first.location,
                diagnostics,
            });
        }
    }

    let package = Package::new();
    let mut doctype = None;
    {
        let doc = package.as_document();
        transfer_children(&doc, html.tree.root(), Target::Root(doc.root()), options, &mut doctype);
    }

    Ok(Document::from_parts(
        package,
        DocumentKind::Html,
        diagnostics,
        doctype,
    ))
}

/// Parses an HTML document from a file.
pub fn parse_html_file(path: impl AsRef<Path>) -> Result<Document> {
    parse_html_file_with_options(path, &HtmlParseOptions::default())
}

/// Parses an HTML document from a file.
pub fn parse_html_file_with_options(
    path: impl AsRef<Path>,
    options: &HtmlParseOptions,
) -> Result<Document> {
    let path = path.as_ref();
    log::debug!("parsing HTML file {}", path.display());
    let input = fs::read_to_string(path)?;
    parse_html_with_options(&input, options)
}

/// Attachment point while transferring the recovered tree into the document
/// storage. Comments and processing instructions can attach to the root,
/// everything else only below an element.
enum Target<'d> {
    Root(dom::Root<'d>),
    Element(dom::Element<'d>),
}

fn transfer_children<'d>(
    doc: &dom::Document<'d>,
    node: ego_tree::NodeRef<'_, scraper::Node>,
    target: Target<'d>,
    options: &HtmlParseOptions,
    doctype: &mut Option<String>,
) {
    for child in node.children() {
        match child.value() {
            scraper::Node::Element(element) => {
                let new_element = doc.create_element(element.name());
                for (name, value) in element.attrs() {
                    new_element.set_attribute_value(name, value);
                }
                match &target {
                    Target::Root(root) => root.append_child(new_element),
                    Target::Element(parent) => parent.append_child(new_element),
                }
                transfer_children(doc, child, Target::Element(new_element), options, doctype);
            }
            scraper::Node::Text(text) => {
                if options.no_blanks && text.trim().is_empty() {
                    continue;
                }
                // Text cannot hang off the document root; the HTML5 tree
                // builder only produces it below an element anyway.
                if let Target::Element(parent) = &target {
                    parent.append_child(doc.create_text(&**text));
                }
            }
            scraper::Node::Comment(comment) => {
                let new_comment = doc.create_comment(&**comment);
                match &target {
                    Target::Root(root) => root.append_child(new_comment),
                    Target::Element(parent) => parent.append_child(new_comment),
                }
            }
            scraper::Node::ProcessingInstruction(pi) => {
                let data: &str = &pi.data;
                let new_pi = doc.create_processing_instruction(
                    &pi.target,
                    if data.is_empty() { None } else { Some(data) },
                );
                match &target {
                    Target::Root(root) => root.append_child(new_pi),
                    Target::Element(parent) => parent.append_child(new_pi),
                }
            }
            scraper::Node::Doctype(d) => {
                *doctype = Some(format!("<!DOCTYPE {}>", d.name()));
            }
            scraper::Node::Document | scraper::Node::Fragment => {
                // Nested document markers do not occur below the root.
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed() {
        let doc = parse_html("<html><head><title>T</title></head><body></body></html>").unwrap();
        assert!(doc.is_html());
        let root = doc.root_element().unwrap();
        assert_eq!(root.name(), "html");
    }

    #[test]
    fn test_recovers_unclosed_tags() {
        let doc = parse_html("<html><body><p>one<p>two").unwrap();
        assert_eq!(doc.xpath("count(//p)").unwrap().to_number(), 2.0);
        assert_eq!(
            doc.xpath("string(//p[2])").unwrap().to_xpath_string(),
            "two"
        );
    }

    #[test]
    fn test_implied_skeleton_on_empty_input() {
        let doc = parse_html("").unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(root.name(), "html");
        let names: Vec<_> = root.children().filter_map(|c| c.as_element()).map(|e| e.name()).collect();
        assert_eq!(names, vec!["head", "body"]);
    }

    #[test]
    fn test_doctype_captured() {
        let doc = parse_html("<!DOCTYPE html><html><body></body></html>").unwrap();
        assert_eq!(doc.doctype(), Some("<!DOCTYPE html>"));
    }

    #[test]
    fn test_attributes_transferred() {
        let doc = parse_html(r#"<html><body><a href="/x" id="l">go</a></body></html>"#).unwrap();
        let root = doc.root_element().unwrap();
        let a = root.descendants().find(|e| e.name() == "a").unwrap();
        assert_eq!(a.attribute("href"), Some("/x"));
        assert_eq!(a.attribute("id"), Some("l"));
    }

    #[test]
    fn test_no_blanks() {
        let input = "<html><body>\n  <p>x</p>\n  </body></html>";
        let doc = parse_html_with_options(input, &HtmlParseOptions::new().no_blanks(true)).unwrap();
        let root = doc.root_element().unwrap();
        let body = root.descendants().find(|e| e.name() == "body").unwrap();
        let text_children = body
            .children()
            .filter(|c| c.as_text().is_some())
            .count();
        assert_eq!(text_children, 0);
    }

    #[test]
    fn test_comment_preserved() {
        let doc = parse_html("<html><body><!-- note --><p>x</p></body></html>").unwrap();
        assert_eq!(doc.xpath("count(//comment())").unwrap().to_number(), 1.0);
    }

    #[test]
    fn test_xpath_title() {
        let doc = parse_html("<html><head><title>Hello</title></head><body></body></html>").unwrap();
        assert_eq!(
            doc.xpath("string(/html/head/title)").unwrap().to_xpath_string(),
            "Hello"
        );
    }
}
