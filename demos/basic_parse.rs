//! Basic XML parsing and tree navigation.
//!
//! Run with: `cargo run --example basic_parse`
#![allow(clippy::expect_used)]

use xmlcanopy::Document;

fn main() {
    env_logger::init();

    let xml = r#"<?xml version="1.0"?>
<bookstore>
  <book category="fiction">
    <title lang="en">The Great Gatsby</title>
    <author>F. Scott Fitzgerald</author>
    <year>1925</year>
    <price>10.99</price>
  </book>
  <book category="science">
    <title lang="en">A Brief History of Time</title>
    <author>Stephen Hawking</author>
    <year>1988</year>
    <price>14.99</price>
  </book>
</bookstore>"#;

    let doc = Document::parse_str(xml).expect("failed to parse XML");
    let root = doc.root_element().expect("no root element");

    println!("Root element: {}", root.name());

    // Iterate over child elements
    for book in root.children().filter_map(|c| c.as_element()) {
        let category = book.attribute("category").unwrap_or("unknown");
        println!("\n<{}> (category={category})", book.name());

        for field in book.children().filter_map(|c| c.as_element()) {
            println!("  {}: {}", field.name(), field.text());
        }
    }

    // Walk the whole tree with depth information
    println!("\nFull tree:");
    for (depth, element, _parent) in doc.tree() {
        println!("{}{}", "  ".repeat(depth), element.name());
    }
}
