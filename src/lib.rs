//! # xmlcanopy
//!
//! One roof over the XML toolchain: DOM parsing, streaming reading, XPath
//! evaluation, and permissive HTML parsing, each backed by a dedicated crate
//! but exposed through a single coherent API.
//!
//! - [`parser`] builds a [`Document`] from XML text via `quick-xml` events,
//!   with optional libxml2-style error recovery.
//! - [`tree`] wraps the `sxd-document` storage with navigation handles
//!   ([`Element`], [`XmlNode`]) and serialization.
//! - [`reader`] is a pull-based cursor over XML input in the style of
//!   `xmlTextReader`, for documents too large to hold as a tree.
//! - [`xpath`] compiles and evaluates XPath 1.0 expressions via `sxd-xpath`,
//!   with namespace and variable registration.
//! - [`html`] parses real-world HTML via `scraper`'s `html5ever` engine into
//!   the same document model.
//!
//! ## Quick Start
//!
//! ```
//! use xmlcanopy::Document;
//!
//! let doc = Document::parse_str("<library><book id=\"1\">Dune</book></library>").unwrap();
//! let book = doc.select("//book[@id='1']").unwrap()[0];
//! assert_eq!(book.text(), "Dune");
//! ```
//!
//! The wrapped crates are re-exported for callers that need an underlying
//! API this facade does not surface.

pub mod error;
pub mod html;
pub mod parser;
pub mod reader;
pub mod tree;
pub mod xpath;

pub use error::{Error, ParseDiagnostic, Result, Severity, SourceLocation};
pub use html::{parse_html, parse_html_file, HtmlParseOptions};
pub use parser::{parse_file, parse_str, ParseOptions};
pub use reader::{XmlNodeType, XmlReader};
pub use tree::{Attribute, Document, DocumentKind, Element, Namespace, XmlNode};
pub use xpath::{evaluate, evaluate_with, NodeSet, XPathContext, XPathExpression, XPathValue};

pub use quick_xml;
pub use scraper;
pub use sxd_document;
pub use sxd_xpath;
