//! Error types and diagnostics for XML and HTML parsing.
//!
//! This module provides structured error reporting with source location
//! tracking, matching libxml2's error reporting model. Errors carry line,
//! column, and byte offset information for precise diagnostics.
//!
//! Parsing supports **error recovery mode**: diagnostics are collected into a
//! `Vec<ParseDiagnostic>` while still producing a (possibly partial) tree.
//! When a fatal error aborts parsing, everything collected up to that point
//! travels inside the error so callers can see what was recovered first.

use std::fmt;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Severity level for a parse diagnostic, matching libxml2's `xmlErrorLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A non-fatal issue that doesn't prevent parsing.
    Warning,
    /// A recoverable error; the parser can continue but the document is malformed.
    Error,
    /// An unrecoverable error; parsing must stop.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Fatal => write!(f, "fatal error"),
        }
    }
}

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl SourceLocation {
    /// Computes the location of `byte_offset` within `input`.
    ///
    /// Columns count characters, approximated as non-continuation bytes so
    /// that multi-byte UTF-8 sequences count once.
    pub(crate) fn of(input: &[u8], byte_offset: usize) -> Self {
        let end = byte_offset.min(input.len());
        let mut line: u32 = 1;
        let mut column: u32 = 1;
        for &b in &input[..end] {
            if b == b'\n' {
                line += 1;
                column = 1;
            } else if b & 0xC0 != 0x80 {
                column += 1;
            }
        }
        Self {
            line,
            column,
            byte_offset,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single diagnostic emitted during parsing.
///
/// Diagnostics are collected when the parser operates in recovery mode,
/// allowing it to produce a partial tree even when the input is malformed.
/// HTML parsing collects the tree builder's recovery notes the same way.
#[derive(Debug, Clone)]
pub struct ParseDiagnostic {
    /// The severity of this diagnostic.
    pub severity: Severity,
    /// Human-readable error message.
    pub message: String,
    /// Where in the source this error occurred.
    pub location: SourceLocation,
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}",
            self.severity, self.message, self.location
        )
    }
}

/// The error type for all fallible operations in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error while reading input or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A low-level error reported by the XML tokenizer.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A fatal XML syntax error.
    ///
    /// Carries every diagnostic collected before the failure so callers can
    /// see what was recovered on the way to the fatal error.
    #[error("{message} at {location}")]
    XmlSyntax {
        /// The primary error message.
        message: String,
        /// Where in the source the fatal error occurred.
        location: SourceLocation,
        /// All diagnostics collected before the fatal error.
        diagnostics: Vec<ParseDiagnostic>,
    },

    /// Input bytes could not be decoded to text.
    #[error("text decoding failed: {0}")]
    TextDecode(String),

    /// An XPath expression failed to compile.
    #[error("invalid XPath expression `{expression}`: {message}")]
    XPathSyntax {
        /// The offending expression.
        expression: String,
        /// The engine's description of the problem.
        message: String,
    },

    /// An XPath expression compiled but failed to evaluate.
    #[error("XPath evaluation of `{expression}` failed: {message}")]
    XPathEvaluation {
        /// The expression being evaluated.
        expression: String,
        /// The engine's description of the problem.
        message: String,
    },

    /// Document serialization failed.
    #[error("serialization failed: {0}")]
    Serialize(String),
}

impl Error {
    /// Constructs a fatal syntax error at the given byte offset of `input`.
    pub(crate) fn syntax(
        input: &[u8],
        byte_offset: usize,
        message: impl Into<String>,
        diagnostics: Vec<ParseDiagnostic>,
    ) -> Self {
        Self::XmlSyntax {
            message: message.into(),
            location: SourceLocation::of(input, byte_offset),
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation {
            line: 10,
            column: 5,
            byte_offset: 42,
        };
        assert_eq!(loc.to_string(), "10:5");
    }

    #[test]
    fn test_source_location_of_counts_lines_and_columns() {
        let input = b"<a>\n  <b/>\n</a>";
        let loc = SourceLocation::of(input, 6);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 3);
        assert_eq!(loc.byte_offset, 6);
    }

    #[test]
    fn test_source_location_of_multibyte() {
        // "é" is two bytes but one column
        let input = "<a>é</a>".as_bytes();
        let loc = SourceLocation::of(input, 5);
        assert_eq!(loc.line, 1);
        assert_eq!(loc.column, 5);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Fatal.to_string(), "fatal error");
    }

    #[test]
    fn test_syntax_error_display() {
        let err = Error::syntax(b"<root", 5, "unexpected end of input", vec![]);
        assert_eq!(err.to_string(), "unexpected end of input at 1:6");
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = ParseDiagnostic {
            severity: Severity::Error,
            message: "undefined entity &foo;".to_string(),
            location: SourceLocation {
                line: 2,
                column: 7,
                byte_offset: 12,
            },
        };
        assert_eq!(diag.to_string(), "error: undefined entity &foo; at 2:7");
    }
}
