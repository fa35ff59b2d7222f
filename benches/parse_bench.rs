#![allow(clippy::expect_used)]

use std::fmt::Write;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use xmlcanopy::html::parse_html;
use xmlcanopy::reader::{XmlNodeType, XmlReader};
use xmlcanopy::xpath::evaluate;
use xmlcanopy::Document;

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// Generates a small XML document with approximately 10 elements.
fn make_small_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n");
    for i in 0..10 {
        let _ = writeln!(xml, "  <item id=\"{i}\">Value {i}</item>");
    }
    xml.push_str("</root>\n");
    xml
}

/// Generates a medium XML document with approximately 100 elements.
fn make_medium_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<catalog>\n");
    for i in 0..100 {
        let _ = writeln!(
            xml,
            "  <book id=\"bk{i}\"><title>Title {i}</title>\
             <author>Author {i}</author>\
             <price>{}.99</price></book>",
            10 + i
        );
    }
    xml.push_str("</catalog>\n");
    xml
}

/// Generates a large XML document with approximately 1000 elements.
fn make_large_xml() -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<database>\n");
    for i in 0..1000 {
        let _ = writeln!(
            xml,
            "  <record id=\"{i}\"><name>Record {i}</name>\
             <value>{}</value><status>active</status></record>",
            i * 42
        );
    }
    xml.push_str("</database>\n");
    xml
}

/// Generates an HTML page with repeated list content.
fn make_html_page() -> String {
    let mut html = String::from("<!DOCTYPE html><html><head><title>Bench</title></head><body>");
    for i in 0..100 {
        let _ = write!(html, "<p class=\"row\">Paragraph {i}<ul><li>a<li>b</ul>");
    }
    html.push_str("</body></html>");
    html
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let small = make_small_xml();
    let medium = make_medium_xml();
    let large = make_large_xml();

    c.bench_function("parse_small", |b| {
        b.iter(|| Document::parse_str(black_box(&small)).expect("parse failed"));
    });
    c.bench_function("parse_medium", |b| {
        b.iter(|| Document::parse_str(black_box(&medium)).expect("parse failed"));
    });
    c.bench_function("parse_large", |b| {
        b.iter(|| Document::parse_str(black_box(&large)).expect("parse failed"));
    });
}

fn bench_xpath(c: &mut Criterion) {
    let medium = make_medium_xml();
    let doc = Document::parse_str(&medium).expect("parse failed");

    c.bench_function("xpath_count_medium", |b| {
        b.iter(|| {
            evaluate(&doc, black_box("count(//book[number(price) > 50])"))
                .expect("evaluation failed")
                .to_number()
        });
    });
    c.bench_function("xpath_select_medium", |b| {
        b.iter(|| {
            doc.select(black_box("//book/title"))
                .expect("evaluation failed")
                .len()
        });
    });
}

fn bench_reader(c: &mut Criterion) {
    let large = make_large_xml();

    c.bench_function("reader_scan_large", |b| {
        b.iter(|| {
            let mut reader = XmlReader::new(black_box(&large));
            let mut elements = 0usize;
            while reader.read().expect("read failed") {
                if reader.node_type() == XmlNodeType::Element {
                    elements += 1;
                }
            }
            elements
        });
    });
}

fn bench_html(c: &mut Criterion) {
    let page = make_html_page();

    c.bench_function("html_parse_page", |b| {
        b.iter(|| parse_html(black_box(&page)).expect("parse failed"));
    });
}

criterion_group!(benches, bench_parse, bench_xpath, bench_reader, bench_html);
criterion_main!(benches);
