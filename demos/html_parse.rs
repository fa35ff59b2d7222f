//! HTML parsing example demonstrating error-tolerant parsing.
//!
//! Run with: `cargo run --example html_parse`
#![allow(clippy::expect_used)]

use xmlcanopy::html::parse_html;

fn main() {
    env_logger::init();

    // Deliberately malformed HTML: unclosed tags, missing skeleton
    let html = r#"<h1>Welcome
<p>First paragraph
<p>Second paragraph with a <a href="/link">link
<ul>
  <li>one
  <li>two
</ul>"#;

    let doc = parse_html(html).expect("failed to parse HTML");

    println!("Recovered document structure:\n");
    for (depth, element, _parent) in doc.tree() {
        let attrs: Vec<String> = element
            .attributes()
            .iter()
            .map(|a| format!("{}=\"{}\"", a.name(), a.value()))
            .collect();
        if attrs.is_empty() {
            println!("{}<{}>", "  ".repeat(depth), element.name());
        } else {
            println!("{}<{} {}>", "  ".repeat(depth), element.name(), attrs.join(" "));
        }
    }

    // XPath works on the recovered tree like on any XML document
    let paragraphs = doc.xpath("count(//p)").expect("XPath failed");
    println!("\nParagraphs: {}", paragraphs.to_number());

    let link = doc.xpath("string(//a/@href)").expect("XPath failed");
    println!("Link target: {}", link.to_xpath_string());

    if !doc.diagnostics.is_empty() {
        println!("\nRecovery diagnostics: {}", doc.diagnostics.len());
    }
}
