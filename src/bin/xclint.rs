//! xmllint-style CLI for XML/HTML processing.
//!
//! Covers the everyday subset of libxml2's `xmllint`: parsing with optional
//! recovery, `XPath` evaluation with namespace registration, and serialized
//! output.

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use xmlcanopy::html::{parse_html_with_options, HtmlParseOptions};
use xmlcanopy::parser::{self, ParseOptions};
use xmlcanopy::tree::{Document, Element, XmlNode};
use xmlcanopy::xpath::{XPathContext, XPathExpression, XPathValue};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// xclint -- parse, query, and reserialize XML/HTML files.
#[derive(Parser, Debug)]
#[command(name = "xclint", version, about, long_about = None)]
struct Cli {
    /// XML files to process (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// Print additional information during processing.
    #[arg(long)]
    verbose: bool,

    // -- Parsing options ---------------------------------------------------
    /// Parse input as HTML instead of XML.
    #[arg(long)]
    html: bool,

    /// Recover from parsing errors (produce partial tree).
    #[arg(long)]
    recover: bool,

    /// Remove ignorable blank (whitespace-only) text nodes.
    #[arg(long)]
    noblanks: bool,

    /// Do not output the result tree.
    #[arg(long)]
    noout: bool,

    // -- XPath -------------------------------------------------------------
    /// Evaluate an XPath expression and print the result.
    #[allow(clippy::doc_markdown)]
    #[arg(long, value_name = "EXPR")]
    xpath: Option<String>,

    /// Register a namespace for XPath evaluation (repeatable).
    #[arg(long, value_name = "PREFIX=URI", value_parser = parse_ns_binding)]
    ns: Vec<(String, String)>,

    // -- Output options ----------------------------------------------------
    /// Save output to a file instead of stdout.
    #[arg(long, value_name = "FILE")]
    output: Option<String>,

    /// Print timing information for parsing and processing.
    #[arg(long)]
    timing: bool,
}

/// Parses a `PREFIX=URI` namespace binding from the command line.
fn parse_ns_binding(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((prefix, uri)) if !prefix.is_empty() && !uri.is_empty() => {
            Ok((prefix.to_string(), uri.to_string()))
        }
        _ => Err(format!("expected PREFIX=URI, got `{arg}`")),
    }
}

// ---------------------------------------------------------------------------
// Exit codes (matching libxml2 xmllint conventions)
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_PARSE_ERROR: u8 = 1;
const EXIT_XPATH_ERROR: u8 = 4;

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    let mut worst_exit: u8 = EXIT_SUCCESS;

    for file in &cli.files {
        let exit = process_file(&cli, file);
        if exit > worst_exit {
            worst_exit = exit;
        }
    }

    ExitCode::from(worst_exit)
}

/// Processes a single input file and returns an exit code.
fn process_file(cli: &Cli, filename: &str) -> u8 {
    let start_read = Instant::now();

    let input = match read_input(filename) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{filename}: failed to read: {e}");
            return EXIT_PARSE_ERROR;
        }
    };

    if cli.timing {
        let elapsed = start_read.elapsed();
        eprintln!("Reading file {filename} took {elapsed:?}");
    }

    let start_parse = Instant::now();

    let doc = if cli.html {
        parse_as_html(cli, &input)
    } else {
        parse_as_xml(cli, &input)
    };

    let doc = match doc {
        Ok(d) => d,
        Err(msg) => {
            eprintln!("{filename}: {msg}");
            return EXIT_PARSE_ERROR;
        }
    };

    if cli.timing {
        let elapsed = start_parse.elapsed();
        eprintln!("Parsing took {elapsed:?}");
    }

    if cli.verbose && !doc.diagnostics.is_empty() {
        for diag in &doc.diagnostics {
            eprintln!("{filename}: {diag}");
        }
    }

    // XPath mode replaces tree output.
    if let Some(ref expr) = cli.xpath {
        return evaluate_xpath(cli, filename, &doc, expr);
    }

    if !cli.noout {
        let start_serial = Instant::now();

        match doc.to_xml_string() {
            Ok(mut output) => {
                if !output.ends_with('\n') {
                    output.push('\n');
                }
                write_output(cli, &output);
            }
            Err(e) => {
                eprintln!("{filename}: failed to serialize: {e}");
                return EXIT_PARSE_ERROR;
            }
        }

        if cli.timing {
            let elapsed = start_serial.elapsed();
            eprintln!("Serializing took {elapsed:?}");
        }
    }

    EXIT_SUCCESS
}

// ---------------------------------------------------------------------------
// Input reading
// ---------------------------------------------------------------------------

/// Reads input from a file or stdin (when filename is `-`).
fn read_input(filename: &str) -> io::Result<String> {
    if filename == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(filename)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parses input as XML with the configured options.
fn parse_as_xml(cli: &Cli, input: &str) -> Result<Document, String> {
    let opts = ParseOptions::default()
        .recover(cli.recover)
        .no_blanks(cli.noblanks);
    parser::parse_str_with_options(input, &opts).map_err(|e| e.to_string())
}

/// Parses input as HTML with the configured options.
fn parse_as_html(cli: &Cli, input: &str) -> Result<Document, String> {
    // HTML recovery stays on; --recover is the XML-side switch.
    let opts = HtmlParseOptions::default().no_blanks(cli.noblanks);
    parse_html_with_options(input, &opts).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// XPath evaluation
// ---------------------------------------------------------------------------

/// Evaluates an `XPath` expression and prints the result to stdout.
fn evaluate_xpath(cli: &Cli, filename: &str, doc: &Document, expression: &str) -> u8 {
    let expr = match XPathExpression::compile(expression) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("{filename}: XPath error: {e}");
            return EXIT_XPATH_ERROR;
        }
    };

    let mut context = XPathContext::new();
    for (prefix, uri) in &cli.ns {
        context.register_namespace(prefix, uri);
    }

    match expr.evaluate_with(doc, &context) {
        Ok(value) => {
            let mut output = String::new();
            match &value {
                XPathValue::NodeSet(nodes) => {
                    for node in nodes {
                        serialize_node(node, &mut output);
                        output.push('\n');
                    }
                }
                XPathValue::String(s) => {
                    output.push_str(s);
                    output.push('\n');
                }
                XPathValue::Number(n) => {
                    output.push_str(&n.to_string());
                    output.push('\n');
                }
                XPathValue::Boolean(b) => {
                    output.push_str(&b.to_string());
                    output.push('\n');
                }
            }
            write_output(cli, &output);
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("{filename}: XPath error: {e}");
            EXIT_XPATH_ERROR
        }
    }
}

/// Serializes a single result node for `XPath` output.
fn serialize_node(node: &XmlNode<'_>, out: &mut String) {
    match node {
        XmlNode::Element(e) => serialize_element(*e, out),
        XmlNode::Attribute(a) => {
            out.push_str(a.name());
            out.push_str("=\"");
            push_escaped(a.value(), out);
            out.push('"');
        }
        XmlNode::Text(t) => push_escaped(t.text(), out),
        XmlNode::Comment(c) => {
            out.push_str("<!--");
            out.push_str(c.text());
            out.push_str("-->");
        }
        XmlNode::ProcessingInstruction(pi) => {
            out.push_str("<?");
            out.push_str(pi.target());
            if let Some(data) = pi.value() {
                out.push(' ');
                out.push_str(data);
            }
            out.push_str("?>");
        }
        XmlNode::Root(root) => {
            for child in root.children() {
                if let sxd_document::dom::ChildOfRoot::Element(e) = child {
                    serialize_node(&XmlNode::Element(e.into()), out);
                }
            }
        }
        XmlNode::Namespace(ns) => out.push_str(&ns.to_string()),
    }
}

/// Recursively serializes an element subtree.
fn serialize_element(element: Element<'_>, out: &mut String) {
    let tag = tag_name(element);
    out.push('<');
    out.push_str(&tag);
    for attr in element.attributes() {
        out.push(' ');
        out.push_str(attr.name());
        out.push_str("=\"");
        push_escaped(attr.value(), out);
        out.push('"');
    }

    let children: Vec<_> = element.children().collect();
    if children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    for child in children {
        serialize_node(&child, out);
    }
    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

/// The prefixed tag name of an element, as it would appear in source.
fn tag_name(element: Element<'_>) -> String {
    match element.inner().preferred_prefix() {
        Some(prefix) => format!("{prefix}:{}", element.name()),
        None => element.name().to_string(),
    }
}

/// Escapes the characters that cannot appear literally in XML content.
fn push_escaped(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

// ---------------------------------------------------------------------------
// Output writing
// ---------------------------------------------------------------------------

/// Writes output to stdout or to the file specified by --output.
fn write_output(cli: &Cli, content: &str) {
    if let Some(ref output_file) = cli.output {
        if let Err(e) = fs::write(output_file, content) {
            eprintln!("{output_file}: failed to write: {e}");
        }
    } else {
        print!("{content}");
        let _ = io::stdout().flush();
    }
}
