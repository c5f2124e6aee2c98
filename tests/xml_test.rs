mod common;

use std::collections::HashSet;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{Datelike, Timelike};
use common::parse_str;
use contentparser::{ContentParser, ParseError, ParserOptions, PropertyValue, XmlContentParser};

const CONTENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<content>
  <primaryNodeType>app:Page</primaryNodeType>
  <node>
    <name>jcr:content</name>
    <primaryNodeType>app:PageContent</primaryNodeType>
    <mixinNodeType>mix:versionable</mixinNodeType>
    <mixinNodeType>mix:referenceable</mixinNodeType>
    <property><name>jcr:title</name><type>String</type><value>English</value></property>
    <property><name>jcr:description</name><type>String</type><value>Sample description</value></property>
    <property><name>navTitle</name><type>String</type><value>HOME</value></property>
    <property><name>longProp</name><type>Long</type><value>1234567890123</value></property>
    <property><name>decimalProp</name><type>Decimal</type><value>1.2345</value></property>
    <property><name>doubleProp</name><type>Double</type><value>1.5</value></property>
    <property><name>booleanProp</name><type>Boolean</type><value>true</value></property>
    <property><name>dateProp</name><type>Date</type><value>2014-09-19T21:20:26.812+02:00</value></property>
    <property><name>pathProp</name><type>Path</type><value>/content/x</value></property>
    <property>
      <name>stringPropMulti</name>
      <type>String</type>
      <values><value>aa</value><value>bb</value><value>cc</value></values>
    </property>
    <property>
      <name>longPropMulti</name>
      <type>Long</type>
      <values><value>1234567890123</value><value>55</value></values>
    </property>
    <node>
      <name>teaserbar</name>
      <primaryNodeType>nt:unstructured</primaryNodeType>
      <node>
        <name>teaserbaritem</name>
        <primaryNodeType>nt:unstructured</primaryNodeType>
      </node>
    </node>
    <node>
      <name>aside</name>
      <primaryNodeType>nt:unstructured</primaryNodeType>
    </node>
    <node>
      <name>content</name>
      <primaryNodeType>nt:unstructured</primaryNodeType>
    </node>
  </node>
</content>"#;

fn names(values: &[&str]) -> HashSet<String> {
    values.iter().map(|name| name.to_string()).collect()
}

#[test]
fn test_content_type_token() {
    assert_eq!(XmlContentParser.content_type(), "xml");
}

#[test]
fn test_root_and_child_primary_types() {
    let handler = parse_str(&XmlContentParser, &ParserOptions::default(), CONTENT_XML).unwrap();
    assert_eq!(
        handler.root().property("jcr:primaryType").unwrap().as_str(),
        Some("app:Page")
    );
    let child = handler
        .root()
        .child("jcr:content")
        .expect("expected child at jcr:content");
    assert_eq!(
        child.property("jcr:primaryType").unwrap().as_str(),
        Some("app:PageContent")
    );
}

#[test]
fn test_mixin_types() {
    let handler = parse_str(&XmlContentParser, &ParserOptions::default(), CONTENT_XML).unwrap();
    let child = handler.root().child("jcr:content").unwrap();
    assert_eq!(
        child.property("jcr:mixinTypes").unwrap().as_array(),
        Some(
            &[
                PropertyValue::String("mix:versionable".to_string()),
                PropertyValue::String("mix:referenceable".to_string()),
            ][..]
        )
    );
}

#[test]
fn test_data_types() {
    let handler = parse_str(&XmlContentParser, &ParserOptions::default(), CONTENT_XML).unwrap();
    let child = handler.root().child("jcr:content").unwrap();

    assert_eq!(child.property("jcr:title").unwrap().as_str(), Some("English"));
    assert_eq!(
        child.property("longProp").unwrap().as_long(),
        Some(1234567890123)
    );
    assert_eq!(
        child.property("decimalProp").unwrap().as_decimal(),
        Some(&BigDecimal::from_str("1.2345").unwrap())
    );
    assert_eq!(
        child.property("doubleProp").unwrap().as_decimal(),
        Some(&BigDecimal::from_str("1.5").unwrap())
    );
    assert_eq!(child.property("booleanProp").unwrap().as_bool(), Some(true));
    assert_eq!(
        child.property("pathProp").unwrap().as_str(),
        Some("/content/x")
    );

    assert_eq!(
        child.property("stringPropMulti").unwrap().as_array(),
        Some(
            &[
                PropertyValue::String("aa".to_string()),
                PropertyValue::String("bb".to_string()),
                PropertyValue::String("cc".to_string()),
            ][..]
        )
    );
    assert_eq!(
        child.property("longPropMulti").unwrap().as_array(),
        Some(&[PropertyValue::Long(1234567890123), PropertyValue::Long(55)][..])
    );

    let calendar = child
        .property("dateProp")
        .and_then(PropertyValue::as_calendar)
        .expect("expected a calendar value");
    assert_eq!(calendar.year(), 2014);
    assert_eq!(calendar.month(), 9);
    assert_eq!(calendar.day(), 19);
    assert_eq!(calendar.hour(), 21);
    assert_eq!(calendar.minute(), 20);
    assert_eq!(calendar.second(), 26);
    assert_eq!(calendar.timestamp_subsec_millis(), 812);
}

#[test]
fn test_ignore_resources_and_properties() {
    let options = ParserOptions {
        ignore_resource_names: names(&["teaserbar", "aside"]),
        ignore_property_names: names(&["longProp", "jcr:title"]),
        ..Default::default()
    };
    let handler = parse_str(&XmlContentParser, &options, CONTENT_XML).unwrap();
    let child = handler.root().child("jcr:content").unwrap();

    assert_eq!(child.property("navTitle").unwrap().as_str(), Some("HOME"));
    assert!(child.property("jcr:title").is_none());
    assert!(child.property("longProp").is_none());

    assert!(handler.root().child("jcr:content/teaserbar").is_none());
    assert!(handler.root().child("jcr:content/aside").is_none());
    assert!(handler.root().child("jcr:content/content").is_some());
}

#[test]
fn test_prefix_stripping_then_ignore() {
    let options = ParserOptions {
        remove_property_name_prefixes: vec!["jcr:".to_string()],
        ignore_property_names: names(&["title"]),
        ..Default::default()
    };
    let handler = parse_str(&XmlContentParser, &options, CONTENT_XML).unwrap();
    let child = handler.root().child("jcr:content").unwrap();

    assert!(child.property("title").is_none());
    assert!(child.property("jcr:title").is_none());
    assert_eq!(
        child.property("description").unwrap().as_str(),
        Some("Sample description")
    );
}

#[test]
fn test_pre_order_emission() {
    let handler = parse_str(&XmlContentParser, &ParserOptions::default(), CONTENT_XML).unwrap();
    assert_eq!(
        handler.paths(),
        vec![
            "/",
            "/jcr:content",
            "/jcr:content/teaserbar",
            "/jcr:content/teaserbar/teaserbaritem",
            "/jcr:content/aside",
            "/jcr:content/content",
        ]
    );
}

#[test]
fn test_default_primary_type_injection() {
    let source = "<content><node><name>child</name></node></content>";
    let handler = parse_str(&XmlContentParser, &ParserOptions::default(), source).unwrap();
    assert_eq!(
        handler.root().property("jcr:primaryType").unwrap().as_str(),
        Some("nt:unstructured")
    );
    assert_eq!(
        handler
            .root()
            .child("child")
            .unwrap()
            .property("jcr:primaryType")
            .unwrap()
            .as_str(),
        Some("nt:unstructured")
    );
}

#[test]
fn test_date_with_utc_designator() {
    let source = "<content><property><name>when</name><type>Date</type>\
        <value>2014-04-22T13:11:24.000Z</value></property></content>";
    let handler = parse_str(&XmlContentParser, &ParserOptions::default(), source).unwrap();
    let calendar = handler
        .root()
        .property("when")
        .and_then(PropertyValue::as_calendar)
        .expect("expected a calendar value");
    assert_eq!(calendar.year(), 2014);
    assert_eq!(calendar.hour(), 13);
    assert_eq!(calendar.offset().local_minus_utc(), 0);
}

#[test]
fn test_child_without_name_is_fatal() {
    let source = "<content><node><primaryNodeType>nt:unstructured</primaryNodeType></node></content>";
    let result = parse_str(&XmlContentParser, &ParserOptions::default(), source);
    assert!(
        matches!(result, Err(ParseError::MissingField { field: "name", .. })),
        "unexpected: {result:?}"
    );
}

#[test]
fn test_property_without_type_is_fatal() {
    let source = "<content><property><name>p</name><value>x</value></property></content>";
    let result = parse_str(&XmlContentParser, &ParserOptions::default(), source);
    assert!(
        matches!(result, Err(ParseError::MissingField { field: "type", .. })),
        "unexpected: {result:?}"
    );
}

#[test]
fn test_property_without_value_is_fatal() {
    let source = "<content><property><name>p</name><type>String</type></property></content>";
    let result = parse_str(&XmlContentParser, &ParserOptions::default(), source);
    assert!(
        matches!(result, Err(ParseError::MissingField { field: "value", .. })),
        "unexpected: {result:?}"
    );
}

#[test]
fn test_unsupported_type_token_is_fatal() {
    let source =
        "<content><property><name>p</name><type>Widget</type><value>x</value></property></content>";
    let result = parse_str(&XmlContentParser, &ParserOptions::default(), source);
    assert!(
        matches!(result, Err(ParseError::UnsupportedType { .. })),
        "unexpected: {result:?}"
    );
}

#[test]
fn test_ignored_property_skips_value_coercion() {
    // The Long value is invalid, but the name-based ignore wins.
    let options = ParserOptions {
        ignore_property_names: names(&["broken"]),
        ..Default::default()
    };
    let source =
        "<content><property><name>broken</name><type>Long</type><value>oops</value></property></content>";
    let handler = parse_str(&XmlContentParser, &options, source).unwrap();
    assert!(handler.root().property("broken").is_none());
}

#[test]
fn test_malformed_xml_is_a_syntax_error() {
    let source = "<content><node></content>";
    let result = parse_str(&XmlContentParser, &ParserOptions::default(), source);
    assert!(
        matches!(result, Err(ParseError::XmlSyntax { .. })),
        "unexpected: {result:?}"
    );
}

#[test]
fn test_multiple_name_elements_are_fatal() {
    let source =
        "<content><node><name>a</name><name>b</name></node></content>";
    let result = parse_str(&XmlContentParser, &ParserOptions::default(), source);
    assert!(result.is_err(), "duplicated single-valued element must fail");
}
