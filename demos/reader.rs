//! Pull-based `XmlReader` streaming example.
//!
//! The `XmlReader` provides a cursor-style interface for reading XML
//! documents one node at a time without building a full DOM tree.
//!
//! Run with: `cargo run --example reader`
#![allow(clippy::expect_used)]

use xmlcanopy::reader::{XmlNodeType, XmlReader};

fn main() {
    env_logger::init();

    let xml = r#"<?xml version="1.0"?>
<catalog>
  <product id="1" category="electronics">
    <name>Widget</name>
    <price currency="USD">29.99</price>
  </product>
  <product id="2" category="books">
    <name>XML Handbook</name>
    <price currency="USD">49.99</price>
  </product>
</catalog>"#;

    let mut reader = XmlReader::new(xml);

    println!("Walking the XML document node by node:\n");

    while reader.read().expect("read failed") {
        let indent = "  ".repeat(reader.depth() as usize);
        match reader.node_type() {
            XmlNodeType::Element => {
                print!("{indent}<{}", reader.name());
                // Walk attributes with the cursor, then return to the element
                if reader.move_to_first_attribute() {
                    loop {
                        print!(" {}=\"{}\"", reader.name(), reader.value().unwrap_or(""));
                        if !reader.move_to_next_attribute() {
                            break;
                        }
                    }
                    reader.move_to_element();
                }
                if reader.is_empty_element() {
                    println!("/>");
                } else {
                    println!(">");
                }
            }
            XmlNodeType::EndElement => {
                println!("{indent}</{}>", reader.name());
            }
            XmlNodeType::Text => {
                let text = reader.value().unwrap_or("");
                println!("{indent}\"{}\"", text.trim());
            }
            XmlNodeType::Whitespace => {}
            other => {
                println!("{indent}({other:?})");
            }
        }
    }

    println!("\nDone.");
}
