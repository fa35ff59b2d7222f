//! Integration tests for XPath evaluation: namespaces, variables, coercions,
//! and compiled expression reuse.

#![allow(clippy::unwrap_used)]

use xmlcanopy::xpath::{evaluate, evaluate_with, XPathContext, XPathExpression, XPathValue};
use xmlcanopy::{Document, Error, Namespace};

const CATALOG: &str = r#"<?xml version="1.0"?>
<catalog>
  <book genre="fiction" id="1"><title>Dune</title><price>9.99</price></book>
  <book genre="science" id="2"><title>Cosmos</title><price>14.50</price></book>
  <book genre="fiction" id="3"><title>Hyperion</title><price>12.00</price></book>
</catalog>"#;

#[test]
fn test_node_set_query() {
    let doc = Document::parse_str(CATALOG).unwrap();
    let result = evaluate(&doc, "//book[@genre='fiction']").unwrap();
    let set = result.as_node_set().unwrap();
    assert_eq!(set.len(), 2);

    let ids: Vec<_> = set
        .elements()
        .iter()
        .map(|e| e.attribute("id").unwrap())
        .collect();
    assert_eq!(ids, vec!["1", "3"]);
}

#[test]
fn test_attribute_nodes() {
    let doc = Document::parse_str(CATALOG).unwrap();
    let result = doc.xpath("//book/@id").unwrap();
    let set = result.as_node_set().unwrap();
    assert_eq!(set.len(), 3);

    let values: Vec<_> = set.iter().map(|n| n.string_value()).collect();
    assert_eq!(values, vec!["1", "2", "3"]);
}

#[test]
fn test_scalar_coercions() {
    let doc = Document::parse_str(CATALOG).unwrap();

    let count = evaluate(&doc, "count(//book)").unwrap();
    assert_eq!(count.to_number(), 3.0);
    assert!(count.to_boolean());
    assert_eq!(count.to_xpath_string(), "3");

    let total = evaluate(&doc, "sum(//price)").unwrap();
    assert!((total.to_number() - 36.49).abs() < 1e-9);

    let missing = evaluate(&doc, "//magazine").unwrap();
    assert!(!missing.to_boolean());
    assert_eq!(missing.to_xpath_string(), "");
    assert!(missing.to_number().is_nan());
}

#[test]
fn test_select_wants_a_node_set() {
    let doc = Document::parse_str(CATALOG).unwrap();

    let titles = doc.select("//title").unwrap();
    assert_eq!(titles.len(), 3);
    assert_eq!(titles[0].text(), "Dune");

    // Scalar expressions are a type error for select
    assert!(matches!(
        doc.select("count(//book)"),
        Err(Error::XPathEvaluation { .. })
    ));
}

#[test]
fn test_registered_namespaces() {
    let xml = r#"<f:feed xmlns:f="urn:feed"><f:entry/><f:entry/></f:feed>"#;
    let doc = Document::parse_str(xml).unwrap();

    let mut ctx = XPathContext::new();
    ctx.register_namespace("feed", "urn:feed");
    let result = evaluate_with(&doc, "count(//feed:entry)", &ctx).unwrap();
    assert_eq!(result.to_number(), 2.0);

    // Unregistered prefixes fail at evaluation
    assert!(evaluate(&doc, "count(//feed:entry)").is_err());
}

#[test]
fn test_default_namespace_gets_ns_prefix() {
    let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>Hi</title></feed>"#;
    let doc = Document::parse_str(xml).unwrap();
    let root = doc.root_element().unwrap();

    let mut ctx = XPathContext::new();
    ctx.register_namespaces(root.namespace());
    let result = evaluate_with(&doc, "string(/ns:feed/ns:title)", &ctx).unwrap();
    assert_eq!(result.to_xpath_string(), "Hi");
}

#[test]
fn test_register_namespaces_mixed() {
    let mut ctx = XPathContext::new();
    ctx.register_namespaces(vec![
        Namespace::new(Some("a"), "urn:a"),
        Namespace::new(None, "urn:default"),
    ]);

    let xml = r#"<r xmlns="urn:default" xmlns:a="urn:a"><a:x/><y/></r>"#;
    let doc = Document::parse_str(xml).unwrap();
    assert_eq!(
        evaluate_with(&doc, "count(//a:x)", &ctx).unwrap().to_number(),
        1.0
    );
    assert_eq!(
        evaluate_with(&doc, "count(//ns:y)", &ctx).unwrap().to_number(),
        1.0
    );
}

#[test]
fn test_variables_of_each_kind() {
    let doc = Document::parse_str(CATALOG).unwrap();

    let mut ctx = XPathContext::new();
    ctx.register_variable("genre", "fiction")
        .register_variable("max", 13.0)
        .register_variable("include", true);

    let result = evaluate_with(
        &doc,
        "//book[@genre = $genre and number(price) < $max and $include]/title",
        &ctx,
    )
    .unwrap();
    let titles: Vec<_> = result
        .as_node_set()
        .unwrap()
        .elements()
        .iter()
        .map(|e| e.text())
        .collect();
    assert_eq!(titles, vec!["Dune", "Hyperion"]);
}

#[test]
fn test_compiled_expression_across_documents() {
    let expr = XPathExpression::compile("count(//item)").unwrap();
    assert_eq!(expr.as_str(), "count(//item)");

    let a = Document::parse_str("<r><item/></r>").unwrap();
    let b = Document::parse_str("<r><item/><item/><item/></r>").unwrap();
    assert_eq!(expr.evaluate(&a).unwrap().to_number(), 1.0);
    assert_eq!(expr.evaluate(&b).unwrap().to_number(), 3.0);
}

#[test]
fn test_evaluate_from_context_node() {
    let doc = Document::parse_str(CATALOG).unwrap();
    let books = doc.select("//book").unwrap();

    let title_of = XPathExpression::compile("string(title)").unwrap();
    let ctx = XPathContext::new();
    let titles: Vec<_> = books
        .iter()
        .map(|b| title_of.evaluate_from(*b, &ctx).unwrap().to_xpath_string())
        .collect();
    assert_eq!(titles, vec!["Dune", "Cosmos", "Hyperion"]);

    // Relative paths resolve against the context element
    let sibling = XPathExpression::compile("following-sibling::book[1]/@id").unwrap();
    let next = sibling.evaluate_from(books[0], &ctx).unwrap();
    assert_eq!(next.to_xpath_string(), "2");
}

#[test]
fn test_syntax_errors() {
    assert!(matches!(
        XPathExpression::compile(""),
        Err(Error::XPathSyntax { .. })
    ));
    assert!(matches!(
        XPathExpression::compile("//book["),
        Err(Error::XPathSyntax { .. })
    ));
}

#[test]
fn test_union_results_in_document_order() {
    let doc = Document::parse_str(CATALOG).unwrap();
    let result = doc.xpath("//price | //title").unwrap();
    let names: Vec<_> = result
        .as_node_set()
        .unwrap()
        .elements()
        .iter()
        .map(|e| e.name())
        .collect();
    assert_eq!(
        names,
        vec!["title", "price", "title", "price", "title", "price"]
    );
}

#[test]
fn test_boolean_and_string_results() {
    let doc = Document::parse_str(CATALOG).unwrap();

    let result = doc.xpath("//book[@id='2']/@genre = 'science'").unwrap();
    assert_eq!(result, XPathValue::Boolean(true));

    let result = doc.xpath("concat('x-', //book[1]/title)").unwrap();
    assert_eq!(result.to_xpath_string(), "x-Dune");
}
