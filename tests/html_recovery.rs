//! Integration tests for permissive HTML parsing and recovery.

#![allow(clippy::unwrap_used)]

use xmlcanopy::html::{parse_html, parse_html_file, parse_html_with_options, HtmlParseOptions};

#[test]
fn test_unclosed_tags_are_recovered() {
    let html = "<html><body><p>first<p>second<ul><li>a<li>b</ul></body></html>";
    let doc = parse_html(html).unwrap();

    assert_eq!(doc.xpath("count(//p)").unwrap().to_number(), 2.0);
    assert_eq!(doc.xpath("count(//li)").unwrap().to_number(), 2.0);
    assert_eq!(
        doc.xpath("string(//li[2])").unwrap().to_xpath_string(),
        "b"
    );
}

#[test]
fn test_skeleton_implied() {
    let doc = parse_html("<p>bare paragraph</p>").unwrap();
    let root = doc.root_element().unwrap();
    assert_eq!(root.name(), "html");

    let names: Vec<_> = root
        .children()
        .filter_map(|c| c.as_element())
        .map(|e| e.name())
        .collect();
    assert_eq!(names, vec!["head", "body"]);
    assert_eq!(doc.xpath("count(/html/body/p)").unwrap().to_number(), 1.0);
}

#[test]
fn test_html_document_kind() {
    let doc = parse_html("<html><body></body></html>").unwrap();
    assert!(doc.is_html());

    let xml_doc = xmlcanopy::Document::parse_str("<r/>").unwrap();
    assert!(!xml_doc.is_html());
}

#[test]
fn test_stray_end_tags_dropped() {
    let doc = parse_html("<html><body></div><p>kept</p></span></body></html>").unwrap();
    assert_eq!(doc.xpath("count(//div)").unwrap().to_number(), 0.0);
    assert_eq!(
        doc.xpath("string(//p)").unwrap().to_xpath_string(),
        "kept"
    );
}

#[test]
fn test_no_blanks_drops_whitespace_nodes() {
    let html = "<html><body>\n    <p>x</p>\n    <p>y</p>\n  </body></html>";
    let doc = parse_html_with_options(html, &HtmlParseOptions::new().no_blanks(true)).unwrap();

    let body = doc.select("//body").unwrap()[0];
    assert!(body.children().all(|c| c.as_text().is_none()));
    assert_eq!(doc.xpath("count(//p)").unwrap().to_number(), 2.0);
}

#[test]
fn test_entities_in_html_text() {
    let doc = parse_html("<html><body><p>a &amp; b &lt;c&gt;</p></body></html>").unwrap();
    assert_eq!(
        doc.xpath("string(//p)").unwrap().to_xpath_string(),
        "a & b <c>"
    );
}

#[test]
fn test_attributes_and_xpath_predicates() {
    let html = r#"<html><body>
        <a href="/one" class="nav">one</a>
        <a href="/two">two</a>
    </body></html>"#;
    let doc = parse_html(html).unwrap();

    let nav = doc.select("//a[@class='nav']").unwrap();
    assert_eq!(nav.len(), 1);
    assert_eq!(nav[0].attribute("href"), Some("/one"));
}

#[test]
fn test_doctype_and_comments() {
    let html = "<!DOCTYPE html><html><body><!-- marker --><p>x</p></body></html>";
    let doc = parse_html(html).unwrap();

    assert_eq!(doc.doctype(), Some("<!DOCTYPE html>"));
    assert_eq!(doc.xpath("count(//comment())").unwrap().to_number(), 1.0);
}

#[test]
fn test_serialize_recovered_tree() {
    let doc = parse_html("<html><body><p>one<p>two</body></html>").unwrap();
    let out = doc.to_xml_string().unwrap();

    // The reserialized form is well-formed XML
    let reparsed = xmlcanopy::Document::parse_str(&out).unwrap();
    assert_eq!(reparsed.xpath("count(//p)").unwrap().to_number(), 2.0);
}

#[test]
fn test_strict_mode_accepts_clean_document() {
    let html = "<!DOCTYPE html><html><head><title>ok</title></head><body><p>x</p></body></html>";
    let doc = parse_html_with_options(
        html,
        &HtmlParseOptions::new().recover(false).no_warnings(true),
    )
    .unwrap();
    assert!(doc.diagnostics.is_empty());
}

#[test]
fn test_parse_html_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.html");
    std::fs::write(&path, "<html><head><title>T</title></head><body></body></html>").unwrap();

    let doc = parse_html_file(&path).unwrap();
    assert_eq!(
        doc.xpath("string(//title)").unwrap().to_xpath_string(),
        "T"
    );
}
