//! `XPath` query examples: scalars, node-sets, namespaces, and variables.
//!
//! Run with: `cargo run --example xpath_query`
#![allow(clippy::expect_used)]

use xmlcanopy::xpath::{evaluate, evaluate_with, XPathContext, XPathExpression};
use xmlcanopy::Document;

fn main() {
    env_logger::init();

    let xml = r#"<?xml version="1.0"?>
<library>
  <book genre="fiction" id="1">
    <title>The Great Gatsby</title>
    <author>F. Scott Fitzgerald</author>
    <price>10.99</price>
  </book>
  <book genre="science" id="2">
    <title>A Brief History of Time</title>
    <author>Stephen Hawking</author>
    <price>14.99</price>
  </book>
  <book genre="fiction" id="3">
    <title>1984</title>
    <author>George Orwell</author>
    <price>8.99</price>
  </book>
</library>"#;

    let doc = Document::parse_str(xml).expect("failed to parse XML");

    // Count all books
    let result = evaluate(&doc, "count(//book)").expect("XPath failed");
    println!("Total books: {}", result.to_number());

    // Find all fiction books
    println!("\nFiction books:");
    let result = evaluate(&doc, "//book[@genre='fiction']/title").expect("XPath failed");
    if let Some(nodes) = result.as_node_set() {
        for title in nodes.elements() {
            println!("  - {}", title.text());
        }
    }

    // Find books over a price limit bound as a variable
    println!("\nBooks over $10:");
    let mut ctx = XPathContext::new();
    ctx.register_variable("limit", 10.0);
    let result =
        evaluate_with(&doc, "//book[number(price) > $limit]/title", &ctx).expect("XPath failed");
    if let Some(nodes) = result.as_node_set() {
        for title in nodes.elements() {
            println!("  - {}", title.text());
        }
    }

    // Compile once, evaluate from different context nodes
    let per_book = XPathExpression::compile("string(author)").expect("bad expression");
    let books = doc.select("//book").expect("XPath failed");
    println!("\nAuthors:");
    for book in books {
        let author = per_book
            .evaluate_from(book, &XPathContext::new())
            .expect("XPath failed");
        println!("  - {}", author.to_xpath_string());
    }

    // Namespaced documents need registered prefixes
    let feed = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>News</title></feed>"#;
    let feed_doc = Document::parse_str(feed).expect("failed to parse XML");
    let mut ctx = XPathContext::new();
    ctx.register_namespace("atom", "http://www.w3.org/2005/Atom");
    let result = evaluate_with(&feed_doc, "string(/atom:feed/atom:title)", &ctx)
        .expect("XPath failed");
    println!("\nFeed title: {}", result.to_xpath_string());
}
