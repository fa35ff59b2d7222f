//! XML document parser.
//!
//! Builds a [`Document`] by driving the streaming, namespace-aware tokenizer
//! (`quick_xml::NsReader`) into the `sxd-document` DOM. Tokenization,
//! namespace resolution, entity decoding, and well-formedness checking all
//! belong to the wrapped tokenizer; this module owns only the event-to-tree
//! mapping, the nesting-depth guard, and recovery-mode diagnostics.
//!
//! # Examples
//!
//! ```
//! use xmlcanopy::parser::{parse_str, parse_str_with_options, ParseOptions};
//!
//! let doc = parse_str("<root><child>Hello</child></root>").unwrap();
//! assert_eq!(doc.root_element().unwrap().name(), "root");
//!
//! // Recovery mode collects diagnostics instead of failing outright.
//! let opts = ParseOptions::default().recover(true);
//! let doc = parse_str_with_options("<root>&undefined;</root>", &opts).unwrap();
//! assert_eq!(doc.diagnostics.len(), 1);
//! ```

use std::fs;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use sxd_document::dom;
use sxd_document::Package;

use crate::error::{Error, ParseDiagnostic, Result, Severity, SourceLocation};
use crate::tree::{Document, DocumentKind};

/// Default maximum element nesting depth.
pub const DEFAULT_MAX_DEPTH: u32 = 256;

/// Parse options controlling parser behavior.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use xmlcanopy::parser::ParseOptions;
///
/// let opts = ParseOptions::default()
///     .recover(true)
///     .no_blanks(true)
///     .max_depth(128);
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// If true, collect diagnostics for recoverable errors and keep reading
    /// instead of failing. The resulting tree may be partial.
    pub recover: bool,
    /// If true, whitespace-only text nodes are not materialized.
    pub no_blanks: bool,
    /// Maximum element nesting depth (default: 256). Exceeding it is always
    /// a fatal error, even in recovery mode.
    pub max_depth: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            recover: false,
            no_blanks: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    /// Sets recovery mode.
    #[must_use]
    pub fn recover(mut self, recover: bool) -> Self {
        self.recover = recover;
        self
    }

    /// Sets whether whitespace-only text nodes are dropped.
    #[must_use]
    pub fn no_blanks(mut self, no_blanks: bool) -> Self {
        self.no_blanks = no_blanks;
        self
    }

    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Parses an XML document from a string with default options.
pub fn parse_str(input: &str) -> Result<Document> {
    parse_bytes(input.as_bytes())
}

/// Parses an XML document from a string with the given options.
pub fn parse_str_with_options(input: &str, options: &ParseOptions) -> Result<Document> {
    parse_bytes_with_options(input.as_bytes(), options)
}

/// Parses an XML document from raw bytes with default options.
///
/// Handles a UTF-8 BOM; UTF-16 input with a byte order mark is transcoded
/// to UTF-8 before parsing.
pub fn parse_bytes(input: &[u8]) -> Result<Document> {
    parse_bytes_with_options(input, &ParseOptions::default())
}

/// Parses an XML document from raw bytes with the given options.
pub fn parse_bytes_with_options(input: &[u8], options: &ParseOptions) -> Result<Document> {
    match transcode_utf16(input)? {
        Some(utf8) => build_document(&utf8, options),
        None => build_document(input, options),
    }
}

/// Parses an XML document from a file with default options.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document> {
    parse_file_with_options(path, &ParseOptions::default())
}

/// Parses an XML document from a file with the given options.
pub fn parse_file_with_options(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Document> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    log::debug!("parsing {} ({} bytes)", path.display(), bytes.len());
    parse_bytes_with_options(&bytes, options)
}

/// Resolves a predefined XML entity name to its replacement text.
fn predefined_entity(name: &str) -> Option<&'static str> {
    match name {
        "lt" => Some("<"),
        "gt" => Some(">"),
        "amp" => Some("&"),
        "apos" => Some("'"),
        "quot" => Some("\""),
        _ => None,
    }
}

/// True if parsing can continue past this tokenizer error in recovery mode.
fn is_recoverable(error: &quick_xml::Error) -> bool {
    !matches!(
        error,
        quick_xml::Error::Io(_) | quick_xml::Error::Encoding(_)
    )
}

/// Namespace resolution for an event, detached from the reader.
///
/// The `ResolveResult` returned alongside an event borrows the reader
/// mutably; copying the binding out lets the reader be used again while the
/// event is still alive.
pub(crate) enum Resolution {
    Unbound,
    Bound(Vec<u8>),
    Unknown(Vec<u8>),
}

impl From<ResolveResult<'_>> for Resolution {
    fn from(resolve: ResolveResult<'_>) -> Self {
        match resolve {
            ResolveResult::Unbound => Self::Unbound,
            ResolveResult::Bound(ns) => Self::Bound(ns.into_inner().to_vec()),
            ResolveResult::Unknown(p) => Self::Unknown(p),
        }
    }
}

/// Transcodes UTF-16 input (detected by its byte order mark) to UTF-8.
///
/// The tokenizer's per-event decoding cannot reassemble UTF-16 code units
/// from event byte slices, so UTF-16 documents are converted up front. The
/// UTF-8 BOM on the result pins the detected encoding even when the XML
/// declaration still names UTF-16.
fn transcode_utf16(input: &[u8]) -> Result<Option<Vec<u8>>> {
    let encoding = match input {
        [0xFF, 0xFE, ..] => encoding_rs::UTF_16LE,
        [0xFE, 0xFF, ..] => encoding_rs::UTF_16BE,
        _ => return Ok(None),
    };
    let (text, _, had_errors) = encoding.decode(input);
    if had_errors {
        return Err(Error::TextDecode(format!(
            "malformed {} input",
            encoding.name()
        )));
    }
    let mut utf8 = vec![0xEF, 0xBB, 0xBF];
    utf8.extend_from_slice(text.as_bytes());
    Ok(Some(utf8))
}

fn build_document(input: &[u8], options: &ParseOptions) -> Result<Document> {
    let mut reader = NsReader::from_reader(input);
    let mut buf = Vec::new();

    let package = Package::new();
    let mut diagnostics: Vec<ParseDiagnostic> = Vec::new();
    let mut doctype: Option<String> = None;
    let mut saw_root = false;

    {
        let doc = package.as_document();
        let mut stack: Vec<dom::Element<'_>> = Vec::new();
        // In recovery mode, depth of an extra-root subtree being skipped.
        let mut skip_depth: u32 = 0;

        loop {
            buf.clear();
            let pos_before = reader.buffer_position();

            let (resolve, event) = match reader.read_resolved_event_into(&mut buf) {
                Ok(resolved) => resolved,
                Err(e) => {
                    let offset = reader.buffer_position() as usize;
                    if options.recover && is_recoverable(&e) {
                        diagnostics.push(ParseDiagnostic {
                            severity: Severity::Error,
                            message: e.to_string(),
                            location: SourceLocation::of(input, offset),
                        });
                        // Stop once the tokenizer can make no forward progress.
                        if reader.buffer_position() == pos_before {
                            break;
                        }
                        continue;
                    }
                    return Err(Error::syntax(input, offset, e.to_string(), diagnostics));
                }
            };
            // Release the reader borrow held by the resolution before the
            // reader is touched again below.
            let resolve = Resolution::from(resolve);

            if skip_depth > 0 {
                match event {
                    Event::Start(_) => skip_depth += 1,
                    Event::End(_) => skip_depth -= 1,
                    Event::Eof => break,
                    _ => {}
                }
                continue;
            }

            // The decoder reflects any encoding detected while reading the
            // event, so it must be taken after the read.
            let decoder = reader.decoder();

            macro_rules! decode {
                ($bytes:expr) => {
                    match decoder.decode($bytes) {
                        Ok(text) => text,
                        Err(e) => return Err(Error::TextDecode(e.to_string())),
                    }
                };
            }

            // Recoverable problem: diagnostic in recovery mode, fatal otherwise.
            macro_rules! recoverable {
                ($message:expr) => {{
                    let message = $message;
                    if options.recover {
                        diagnostics.push(ParseDiagnostic {
                            severity: Severity::Error,
                            message,
                            location: SourceLocation::of(input, pos_before as usize),
                        });
                    } else {
                        return Err(Error::syntax(
                            input,
                            pos_before as usize,
                            message,
                            diagnostics,
                        ));
                    }
                }};
            }

            let is_empty = matches!(event, Event::Empty(_));

            match event {
                Event::Start(start) | Event::Empty(start) => {
                    if stack.is_empty() && saw_root {
                        recoverable!("extra content at the end of the document".to_string());
                        if !is_empty {
                            skip_depth = 1;
                        }
                        continue;
                    }
                    if stack.len() as u32 >= options.max_depth {
                        return Err(Error::syntax(
                            input,
                            pos_before as usize,
                            format!(
                                "maximum element nesting depth of {} exceeded",
                                options.max_depth
                            ),
                            diagnostics,
                        ));
                    }

                    let local = decode!(start.local_name().into_inner()).into_owned();
                    let prefix = match start.name().prefix() {
                        Some(p) => Some(decode!(p.into_inner()).into_owned()),
                        None => None,
                    };
                    let uri = match &resolve {
                        Resolution::Bound(ns) => Some(decode!(ns).into_owned()),
                        Resolution::Unbound => None,
                        Resolution::Unknown(p) => {
                            recoverable!(format!(
                                "unbound namespace prefix `{}`",
                                String::from_utf8_lossy(p)
                            ));
                            None
                        }
                    };

                    let element = match &uri {
                        Some(uri) => {
                            let e = doc.create_element((uri.as_str(), local.as_str()));
                            if let Some(prefix) = &prefix {
                                e.set_preferred_prefix(Some(prefix));
                            }
                            e
                        }
                        None => doc.create_element(local.as_str()),
                    };

                    for attr in start.attributes() {
                        let attr = match attr {
                            Ok(attr) => attr,
                            Err(e) => {
                                recoverable!(e.to_string());
                                continue;
                            }
                        };
                        // xmlns declarations are namespace bindings, not attributes.
                        if attr.key.as_namespace_binding().is_some() {
                            continue;
                        }
                        let value = match attr.decode_and_unescape_value(decoder) {
                            Ok(value) => value.into_owned(),
                            Err(e) => {
                                recoverable!(e.to_string());
                                String::from_utf8_lossy(&attr.value).into_owned()
                            }
                        };
                        let (attr_resolve, attr_local) = reader.resolve_attribute(attr.key);
                        let attr_local = decode!(attr_local.into_inner()).into_owned();
                        match attr_resolve {
                            ResolveResult::Bound(ns) => {
                                let attr_uri = decode!(ns.into_inner()).into_owned();
                                let a = element.set_attribute_value(
                                    (attr_uri.as_str(), attr_local.as_str()),
                                    &value,
                                );
                                if let Some(p) = attr.key.prefix() {
                                    let p = decode!(p.into_inner()).into_owned();
                                    a.set_preferred_prefix(Some(&p));
                                }
                            }
                            _ => {
                                element.set_attribute_value(attr_local.as_str(), &value);
                            }
                        }
                    }

                    if let Some(parent) = stack.last() {
                        parent.append_child(element);
                    } else {
                        doc.root().append_child(element);
                        saw_root = true;
                    }
                    if !is_empty {
                        stack.push(element);
                    }
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(text) => {
                    let raw = decode!(&text).into_owned();
                    let unescaped = match quick_xml::escape::unescape(&raw) {
                        Ok(text) => text.into_owned(),
                        Err(e) => {
                            recoverable!(e.to_string());
                            raw
                        }
                    };
                    if options.no_blanks && unescaped.trim().is_empty() {
                        // dropped
                    } else if let Some(parent) = stack.last() {
                        parent.append_child(doc.create_text(&unescaped));
                    } else if !unescaped.trim().is_empty() {
                        recoverable!("text content outside the root element".to_string());
                    }
                }
                Event::CData(cdata) => {
                    let text = decode!(&cdata).into_owned();
                    if let Some(parent) = stack.last() {
                        parent.append_child(doc.create_text(&text));
                    } else if !text.trim().is_empty() {
                        recoverable!("text content outside the root element".to_string());
                    }
                }
                Event::GeneralRef(reference) => {
                    let replacement = match reference.resolve_char_ref() {
                        Ok(Some(ch)) => Some(ch.to_string()),
                        Ok(None) => {
                            let name = decode!(&reference).into_owned();
                            match predefined_entity(&name) {
                                Some(text) => Some(text.to_string()),
                                None => {
                                    recoverable!(format!("undefined entity &{name};"));
                                    None
                                }
                            }
                        }
                        Err(e) => {
                            recoverable!(e.to_string());
                            None
                        }
                    };
                    if let (Some(text), Some(parent)) = (replacement, stack.last()) {
                        parent.append_child(doc.create_text(&text));
                    }
                }
                Event::Comment(comment) => {
                    let text = decode!(&comment).into_owned();
                    let node = doc.create_comment(&text);
                    match stack.last() {
                        Some(parent) => parent.append_child(node),
                        None => doc.root().append_child(node),
                    }
                }
                Event::PI(pi) => {
                    let target = decode!(pi.target()).into_owned();
                    let content = decode!(pi.content()).into_owned();
                    // The separator between target and data is not data.
                    let content = content.trim_start();
                    let value = if content.is_empty() {
                        None
                    } else {
                        Some(content)
                    };
                    let node = doc.create_processing_instruction(&target, value);
                    match stack.last() {
                        Some(parent) => parent.append_child(node),
                        None => doc.root().append_child(node),
                    }
                }
                Event::DocType(text) => {
                    if doctype.is_none() {
                        let text = decode!(&text).into_owned();
                        doctype = Some(format!("<!DOCTYPE {}>", text.trim()));
                    }
                }
                Event::Decl(_) => {
                    // The writer emits its own declaration on output.
                }
                Event::Eof => break,
            }
        }
    }

    if !saw_root {
        let offset = reader.buffer_position() as usize;
        return Err(Error::syntax(
            input,
            offset,
            "no root element found",
            diagnostics,
        ));
    }

    log::debug!(
        "parse complete: {} diagnostic(s) collected",
        diagnostics.len()
    );
    Ok(Document::from_parts(
        package,
        DocumentKind::Xml,
        diagnostics,
        doctype,
    ))
}
