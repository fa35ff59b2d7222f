//! Pull-based streaming XML reader API.
//!
//! The `XmlReader` provides a cursor-style, pull-based interface for reading
//! XML documents, in the manner of libxml2's `xmlTextReader` and .NET's
//! `XmlReader`. Tokenization and namespace resolution are delegated to the
//! wrapped `quick_xml::NsReader`; this module owns the cursor state, the
//! attribute cursor, and depth tracking.
//!
//! # Usage Pattern
//!
//! Call [`XmlReader::read`] repeatedly to advance through the document. Each
//! call moves the cursor to the next node. Use accessor methods like
//! [`XmlReader::node_type`], [`XmlReader::name`], and [`XmlReader::value`]
//! to inspect the current node. When `read()` returns `Ok(false)`, the end
//! of the document has been reached.
//!
//! # Examples
//!
//! ```
//! use xmlcanopy::reader::{XmlReader, XmlNodeType};
//!
//! let mut reader = XmlReader::new("<root><child>Hello</child></root>");
//! let mut elements = Vec::new();
//!
//! while reader.read().unwrap() {
//!     if reader.node_type() == XmlNodeType::Element {
//!         elements.push(reader.name().to_string());
//!     }
//! }
//!
//! assert_eq!(elements, vec!["root", "child"]);
//! ```

use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::error::{Error, ParseDiagnostic, Result, Severity, SourceLocation};
use crate::parser::{ParseOptions, Resolution};

/// The type of the node the reader is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XmlNodeType {
    /// No node; the reader has not been advanced yet.
    None,
    /// An element start tag, e.g. `<div>` or `<br/>`.
    ///
    /// For self-closing elements, [`XmlReader::is_empty_element`] returns
    /// `true` and no separate `EndElement` is produced.
    Element,
    /// An element end tag, e.g. `</div>`.
    EndElement,
    /// A text node containing non-whitespace character data.
    Text,
    /// A CDATA section.
    CData,
    /// An XML comment.
    Comment,
    /// A processing instruction, e.g. `<?target data?>`.
    ProcessingInstruction,
    /// The XML declaration, e.g. `<?xml version="1.0"?>`.
    XmlDeclaration,
    /// A document type declaration.
    DocumentType,
    /// A whitespace-only text node.
    Whitespace,
    /// An attribute (reached via the attribute cursor).
    Attribute,
    /// The end of the document.
    EndDocument,
}

/// An attribute captured for the current element.
#[derive(Debug, Clone)]
struct AttributeEntry {
    name: String,
    local_name: String,
    prefix: Option<String>,
    namespace_uri: Option<String>,
    value: String,
}

/// The current cursor position within the document.
#[derive(Debug, Clone, Default)]
struct Cursor {
    node_type: Option<XmlNodeType>,
    name: String,
    local_name: String,
    prefix: Option<String>,
    namespace_uri: Option<String>,
    value: Option<String>,
    depth: u32,
    is_empty: bool,
}

/// A cursor-style pull reader over an XML document.
pub struct XmlReader<'a> {
    input: &'a [u8],
    inner: NsReader<&'a [u8]>,
    buf: Vec<u8>,
    options: ParseOptions,
    cursor: Cursor,
    attributes: Vec<AttributeEntry>,
    attribute_cursor: Option<usize>,
    /// Nesting depth of the *next* element to be opened.
    depth: u32,
    finished: bool,
    diagnostics: Vec<ParseDiagnostic>,
}

impl<'a> XmlReader<'a> {
    /// Creates a reader over a string with default options.
    pub fn new(input: &'a str) -> Self {
        Self::with_options(input, ParseOptions::default())
    }

    /// Creates a reader over a string with the given options.
    ///
    /// `no_blanks` makes the reader skip whitespace-only text entirely
    /// instead of reporting it as [`XmlNodeType::Whitespace`]; `max_depth`
    /// bounds element nesting.
    pub fn with_options(input: &'a str, options: ParseOptions) -> Self {
        Self::from_bytes_with_options(input.as_bytes(), options)
    }

    /// Creates a reader over raw bytes with the given options.
    pub fn from_bytes_with_options(input: &'a [u8], options: ParseOptions) -> Self {
        Self {
            input,
            inner: NsReader::from_reader(input),
            buf: Vec::new(),
            options,
            cursor: Cursor::default(),
            attributes: Vec::new(),
            attribute_cursor: None,
            depth: 0,
            finished: false,
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics collected so far (undefined entities and the like).
    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.diagnostics
    }

    /// Advances the reader to the next node.
    ///
    /// Returns `Ok(true)` if a node was read, `Ok(false)` at the end of the
    /// document (after which [`XmlReader::node_type`] reports
    /// [`XmlNodeType::EndDocument`]).
    pub fn read(&mut self) -> Result<bool> {
        loop {
            if self.finished {
                return Ok(false);
            }
            self.attribute_cursor = None;
            self.buf.clear();

            let (resolve, event) = match self.inner.read_resolved_event_into(&mut self.buf) {
                Ok(resolved) => resolved,
                Err(e) => {
                    let offset = self.inner.buffer_position() as usize;
                    self.finished = true;
                    return Err(Error::XmlSyntax {
                        message: e.to_string(),
                        location: SourceLocation::of(self.input, offset),
                        diagnostics: self.diagnostics.clone(),
                    });
                }
            };
            // Release the reader borrow held by the resolution before the
            // reader is touched again below.
            let resolve = Resolution::from(resolve);
            let decoder = self.inner.decoder();
            let offset = self.inner.buffer_position() as usize;

            let decode = |bytes: &[u8]| -> Result<String> {
                decoder
                    .decode(bytes)
                    .map(|s| s.into_owned())
                    .map_err(|e| Error::TextDecode(e.to_string()))
            };

            // Direct field assignment keeps the event's borrow of the read
            // buffer away from whole-struct borrows.
            macro_rules! set_valued {
                ($node_type:expr, $name:expr, $value:expr) => {{
                    let name: String = $name;
                    self.attributes.clear();
                    self.cursor = Cursor {
                        node_type: Some($node_type),
                        local_name: name.clone(),
                        name,
                        prefix: None,
                        namespace_uri: None,
                        value: Some($value),
                        depth: self.depth,
                        is_empty: false,
                    };
                }};
            }

            let is_empty = matches!(event, Event::Empty(_));
            match event {
                Event::Start(start) | Event::Empty(start) => {
                    let element_depth = self.depth;
                    if element_depth >= self.options.max_depth {
                        self.finished = true;
                        return Err(Error::XmlSyntax {
                            message: format!(
                                "maximum element nesting depth of {} exceeded",
                                self.options.max_depth
                            ),
                            location: SourceLocation::of(self.input, offset),
                            diagnostics: self.diagnostics.clone(),
                        });
                    }

                    let name = decode(start.name().into_inner())?;
                    let local_name = decode(start.local_name().into_inner())?;
                    let prefix = match start.name().prefix() {
                        Some(p) => Some(decode(p.into_inner())?),
                        None => None,
                    };
                    let namespace_uri = match &resolve {
                        Resolution::Bound(ns) => Some(decode(ns)?),
                        _ => None,
                    };

                    let mut attributes = Vec::new();
                    for attr in start.attributes() {
                        let attr = match attr {
                            Ok(attr) => attr,
                            Err(e) => {
                                self.diagnostics.push(ParseDiagnostic {
                                    severity: Severity::Error,
                                    message: e.to_string(),
                                    location: SourceLocation::of(self.input, offset),
                                });
                                continue;
                            }
                        };
                        if attr.key.as_namespace_binding().is_some() {
                            continue;
                        }
                        let value = match attr.decode_and_unescape_value(decoder) {
                            Ok(value) => value.into_owned(),
                            Err(e) => {
                                self.diagnostics.push(ParseDiagnostic {
                                    severity: Severity::Error,
                                    message: e.to_string(),
                                    location: SourceLocation::of(self.input, offset),
                                });
                                String::from_utf8_lossy(&attr.value).into_owned()
                            }
                        };
                        let (attr_resolve, attr_local) = self.inner.resolve_attribute(attr.key);
                        attributes.push(AttributeEntry {
                            name: decode(attr.key.into_inner())?,
                            local_name: decode(attr_local.into_inner())?,
                            prefix: match attr.key.prefix() {
                                Some(p) => Some(decode(p.into_inner())?),
                                None => None,
                            },
                            namespace_uri: match attr_resolve {
                                ResolveResult::Bound(ns) => Some(decode(ns.into_inner())?),
                                _ => None,
                            },
                            value,
                        });
                    }

                    if !is_empty {
                        self.depth += 1;
                    }
                    self.attributes = attributes;
                    self.cursor = Cursor {
                        node_type: Some(XmlNodeType::Element),
                        name,
                        local_name,
                        prefix,
                        namespace_uri,
                        value: None,
                        depth: element_depth,
                        is_empty,
                    };
                    return Ok(true);
                }
                Event::End(end) => {
                    self.depth = self.depth.saturating_sub(1);
                    let name = decode(end.name().into_inner())?;
                    let local_name = decode(end.local_name().into_inner())?;
                    let prefix = match end.name().prefix() {
                        Some(p) => Some(decode(p.into_inner())?),
                        None => None,
                    };
                    let namespace_uri = match &resolve {
                        Resolution::Bound(ns) => Some(decode(ns)?),
                        _ => None,
                    };
                    self.attributes.clear();
                    self.cursor = Cursor {
                        node_type: Some(XmlNodeType::EndElement),
                        name,
                        local_name,
                        prefix,
                        namespace_uri,
                        value: None,
                        depth: self.depth,
                        is_empty: false,
                    };
                    return Ok(true);
                }
                Event::Text(text) => {
                    let value = decode(&text)?;
                    let blank = value.trim().is_empty();
                    if blank && self.options.no_blanks {
                        continue;
                    }
                    let node_type = if blank {
                        XmlNodeType::Whitespace
                    } else {
                        XmlNodeType::Text
                    };
                    set_valued!(node_type, String::new(), value);
                    return Ok(true);
                }
                Event::CData(cdata) => {
                    let value = decode(&cdata)?;
                    set_valued!(XmlNodeType::CData, String::new(), value);
                    return Ok(true);
                }
                Event::GeneralRef(reference) => {
                    let resolved = match reference.resolve_char_ref() {
                        Ok(Some(ch)) => Some(ch.to_string()),
                        Ok(None) => {
                            let name = decode(&reference)?;
                            match name.as_str() {
                                "lt" => Some("<".to_string()),
                                "gt" => Some(">".to_string()),
                                "amp" => Some("&".to_string()),
                                "apos" => Some("'".to_string()),
                                "quot" => Some("\"".to_string()),
                                _ => {
                                    self.diagnostics.push(ParseDiagnostic {
                                        severity: Severity::Error,
                                        message: format!("undefined entity &{name};"),
                                        location: SourceLocation::of(self.input, offset),
                                    });
                                    None
                                }
                            }
                        }
                        Err(e) => {
                            self.diagnostics.push(ParseDiagnostic {
                                severity: Severity::Error,
                                message: e.to_string(),
                                location: SourceLocation::of(self.input, offset),
                            });
                            None
                        }
                    };
                    match resolved {
                        Some(value) => {
                            set_valued!(XmlNodeType::Text, String::new(), value);
                            return Ok(true);
                        }
                        None => continue,
                    }
                }
                Event::Comment(comment) => {
                    let value = decode(&comment)?;
                    set_valued!(XmlNodeType::Comment, String::new(), value);
                    return Ok(true);
                }
                Event::PI(pi) => {
                    let target = decode(pi.target())?;
                    // The separator between target and data is not data.
                    let value = decode(pi.content())?.trim_start().to_string();
                    set_valued!(XmlNodeType::ProcessingInstruction, target, value);
                    return Ok(true);
                }
                Event::Decl(decl) => {
                    let mut value = String::new();
                    if let Ok(version) = decl.version() {
                        value.push_str(&format!("version=\"{}\"", decode(&version)?));
                    }
                    if let Some(Ok(encoding)) = decl.encoding() {
                        value.push_str(&format!(" encoding=\"{}\"", decode(&encoding)?));
                    }
                    if let Some(Ok(standalone)) = decl.standalone() {
                        value.push_str(&format!(" standalone=\"{}\"", decode(&standalone)?));
                    }
                    set_valued!(XmlNodeType::XmlDeclaration, "xml".to_string(), value);
                    return Ok(true);
                }
                Event::DocType(text) => {
                    let value = decode(&text)?;
                    let name = value
                        .trim()
                        .split_whitespace()
                        .next()
                        .unwrap_or("")
                        .to_string();
                    set_valued!(XmlNodeType::DocumentType, name, value);
                    return Ok(true);
                }
                Event::Eof => {
                    self.finished = true;
                    self.attributes.clear();
                    self.cursor = Cursor {
                        node_type: Some(XmlNodeType::EndDocument),
                        depth: 0,
                        ..Cursor::default()
                    };
                    return Ok(false);
                }
            }
        }
    }

    // -- Accessors for the current node ------------------------------------

    /// The type of the current node.
    pub fn node_type(&self) -> XmlNodeType {
        if self.attribute_cursor.is_some() {
            return XmlNodeType::Attribute;
        }
        self.cursor.node_type.unwrap_or(XmlNodeType::None)
    }

    /// The qualified name of the current node (prefix included).
    pub fn name(&self) -> &str {
        match self.current_attribute() {
            Some(attr) => &attr.name,
            None => &self.cursor.name,
        }
    }

    /// The local name of the current node (prefix excluded).
    pub fn local_name(&self) -> &str {
        match self.current_attribute() {
            Some(attr) => &attr.local_name,
            None => &self.cursor.local_name,
        }
    }

    /// The namespace prefix of the current node, if any.
    pub fn prefix(&self) -> Option<&str> {
        match self.current_attribute() {
            Some(attr) => attr.prefix.as_deref(),
            None => self.cursor.prefix.as_deref(),
        }
    }

    /// The namespace URI the current node resolves to, if any.
    pub fn namespace_uri(&self) -> Option<&str> {
        match self.current_attribute() {
            Some(attr) => attr.namespace_uri.as_deref(),
            None => self.cursor.namespace_uri.as_deref(),
        }
    }

    /// The text value of the current node, if it has one.
    pub fn value(&self) -> Option<&str> {
        match self.current_attribute() {
            Some(attr) => Some(&attr.value),
            None => self.cursor.value.as_deref(),
        }
    }

    /// True if the current node has a text value.
    pub fn has_value(&self) -> bool {
        self.value().is_some()
    }

    /// The nesting depth of the current node. The root element is at depth
    /// zero; attributes are one level deeper than their element.
    pub fn depth(&self) -> u32 {
        match self.attribute_cursor {
            Some(_) => self.cursor.depth + 1,
            None => self.cursor.depth,
        }
    }

    /// True if the current node is a self-closing element.
    pub fn is_empty_element(&self) -> bool {
        self.cursor.is_empty
    }

    // -- Attribute access --------------------------------------------------

    /// The number of attributes on the current element.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// The value of the attribute with the given qualified name.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// The value of the attribute with the given local name and namespace.
    pub fn get_attribute_ns(&self, local_name: &str, namespace_uri: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| {
                a.local_name == local_name && a.namespace_uri.as_deref() == Some(namespace_uri)
            })
            .map(|a| a.value.as_str())
    }

    /// Moves the cursor onto the first attribute of the current element.
    ///
    /// Returns `false` if the element has no attributes.
    pub fn move_to_first_attribute(&mut self) -> bool {
        if self.attributes.is_empty() {
            return false;
        }
        self.attribute_cursor = Some(0);
        true
    }

    /// Moves the cursor onto the next attribute.
    ///
    /// From the element itself this is equivalent to
    /// [`XmlReader::move_to_first_attribute`].
    pub fn move_to_next_attribute(&mut self) -> bool {
        match self.attribute_cursor {
            None => self.move_to_first_attribute(),
            Some(i) if i + 1 < self.attributes.len() => {
                self.attribute_cursor = Some(i + 1);
                true
            }
            Some(_) => false,
        }
    }

    /// Moves the cursor back from an attribute onto its element.
    ///
    /// Returns `false` if the cursor was not on an attribute.
    pub fn move_to_element(&mut self) -> bool {
        self.attribute_cursor.take().is_some()
    }

    fn current_attribute(&self) -> Option<&AttributeEntry> {
        self.attribute_cursor.and_then(|i| self.attributes.get(i))
    }
}
