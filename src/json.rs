//! JSON content parser.
//!
//! The whole document is read into a value tree before anything is reported:
//! a node's own properties must be known and emitted before its children are
//! visited, and a forward-only tokenizer cannot provide that look-ahead
//! without buffering anyway.

use std::io::Read;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use log::{debug, trace};
use miette::NamedSource;
use serde_json::{Map, Value};

use crate::api::{ContentHandler, ContentParser};
use crate::coerce::{homogenize_array, parse_date};
use crate::error::ParseError;
use crate::options::ParserOptions;
use crate::utils::{append_path_segment, offset_for_position};
use crate::value::{PropertyMap, PropertyValue, JCR_PRIMARY_TYPE};

/// Parses standard JSON content trees, with optional extensions for
/// comments and back-tick quoting.
pub struct JsonContentParser;

impl ContentParser for JsonContentParser {
    fn content_type(&self) -> &'static str {
        "json"
    }

    fn parse(
        &self,
        handler: &mut dyn ContentHandler,
        input: &mut dyn Read,
        options: &ParserOptions,
    ) -> Result<(), ParseError> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        debug!("parsing JSON content ({} bytes)", text.len());

        if options.json_parser_features.quote_tick {
            text = tick_to_double_quote(&text);
        }
        if options.json_parser_features.comments {
            text = strip_comments(&text);
        }

        let root: Value =
            serde_json::from_str(&text).map_err(|err| json_syntax_error(&text, &err))?;
        let Value::Object(object) = root else {
            return Err(ParseError::UnexpectedRoot);
        };
        walk(handler, &object, options, "/")
    }
}

fn json_syntax_error(source: &str, err: &serde_json::Error) -> ParseError {
    let offset = offset_for_position(source, err.line(), err.column());
    ParseError::JsonSyntax {
        src: NamedSource::new("content.json", source.to_string()),
        span: (offset, 0).into(),
        message: err.to_string(),
    }
}

/// Reports `object` under `path`, then recurses into its object-typed
/// members in insertion order.
fn walk(
    handler: &mut dyn ContentHandler,
    object: &Map<String, Value>,
    options: &ParserOptions,
    path: &str,
) -> Result<(), ParseError> {
    let mut properties = PropertyMap::new();
    let mut children: Vec<(&String, &Map<String, Value>)> = Vec::new();

    for (name, value) in object {
        if let Value::Object(child) = value {
            // Object members are child resources; the ignore check uses the
            // raw name and prunes the whole subtree.
            if !options.is_resource_ignored(name) {
                children.push((name, child));
            }
            continue;
        }
        // The resource ignore set matches the raw member name even in
        // property position, so a member that would become a child after a
        // format change stays suppressed either way.
        if options.is_resource_ignored(name) {
            continue;
        }
        let property_name = options.strip_property_prefix(name);
        if options.ignore_property_names.contains(property_name) {
            continue;
        }
        if let Some(converted) = convert_value(value, options)? {
            properties.insert(property_name.to_string(), converted);
        }
    }

    if let Some(default_primary_type) = &options.default_primary_type {
        if !properties.contains_key(JCR_PRIMARY_TYPE) {
            properties.insert(
                JCR_PRIMARY_TYPE.to_string(),
                PropertyValue::String(default_primary_type.clone()),
            );
        }
    }

    trace!("resource {path} ({} properties)", properties.len());
    handler.resource(path, properties);

    for (name, child) in children {
        let child_path = append_path_segment(path, name);
        walk(handler, child, options, &child_path)?;
    }
    Ok(())
}

/// Converts a non-object JSON value. `None` means a JSON null, which is
/// dropped from the property map (the value model has no null scalar).
fn convert_value(
    value: &Value,
    options: &ParserOptions,
) -> Result<Option<PropertyValue>, ParseError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(boolean) => Ok(Some(PropertyValue::Boolean(*boolean))),
        Value::String(text) => {
            if options.detect_calendar_values {
                if let Some(calendar) = parse_date(text) {
                    return Ok(Some(PropertyValue::Calendar(calendar)));
                }
            }
            Ok(Some(PropertyValue::String(text.clone())))
        }
        Value::Number(number) => {
            if let Some(long) = number.as_i64() {
                Ok(Some(PropertyValue::Long(long)))
            } else {
                // Non-integral literals keep their textual form thanks to
                // serde_json's arbitrary_precision representation.
                let decimal = BigDecimal::from_str(&number.to_string()).map_err(|_| {
                    ParseError::coercion(format!("invalid decimal literal: {number}"))
                })?;
                Ok(Some(PropertyValue::Decimal(decimal)))
            }
        }
        Value::Array(elements) => {
            let mut converted = Vec::with_capacity(elements.len());
            for element in elements {
                if element.is_object() {
                    return Err(ParseError::coercion(
                        "multi-value array must not contain maps/objects",
                    ));
                }
                match convert_value(element, options)? {
                    Some(element_value) => converted.push(element_value),
                    None => {
                        return Err(ParseError::coercion(
                            "multi-value array must not contain null values",
                        ));
                    }
                }
            }
            homogenize_array(converted).map(Some)
        }
        Value::Object(_) => Err(ParseError::coercion(
            "unexpected object value in property position",
        )),
    }
}

/// Rewrites back-tick delimited strings to standard double quoting. Double
/// quotes inside a tick string are escaped; everything inside a regular
/// double-quoted string passes through untouched.
fn tick_to_double_quote(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut in_double_quote = false;
    let mut in_tick = false;
    let mut escaped = false;
    for c in input.chars() {
        if escaped {
            output.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                output.push(c);
                escaped = true;
            }
            '"' if in_tick => output.push_str("\\\""),
            '"' => {
                in_double_quote = !in_double_quote;
                output.push('"');
            }
            '`' if !in_double_quote => {
                in_tick = !in_tick;
                output.push('"');
            }
            _ => output.push(c),
        }
    }
    output
}

/// Removes `//` line and `/* */` block comments outside of strings.
fn strip_comments(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;
    while let Some(c) = chars.next() {
        if in_string {
            output.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                output.push(c);
            }
            '/' => match chars.peek() {
                Some('/') => {
                    while let Some(&next) = chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        chars.next();
                    }
                }
                Some('*') => {
                    chars.next();
                    let mut previous = '\0';
                    for next in chars.by_ref() {
                        if previous == '*' && next == '/' {
                            break;
                        }
                        previous = next;
                    }
                }
                _ => output.push(c),
            },
            _ => output.push(c),
        }
    }
    output
}
