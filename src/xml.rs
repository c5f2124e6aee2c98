//! Content-fragment XML parser.
//!
//! The dialect encodes a node as an element with optional `primaryNodeType`,
//! repeatable `mixinNodeType`, repeatable `property` (each with `name`,
//! `type` and either `value` or `values>value*`) and repeatable `node`
//! children. Like the JSON parser this one buffers the whole tree: the
//! property data of a node is spread across child elements, so pre-order
//! emission needs the complete element before reporting it.

use std::io::{BufReader, Read};
use std::str::FromStr;

use bigdecimal::BigDecimal;
use log::{debug, trace};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::api::{ContentHandler, ContentParser};
use crate::coerce::{homogenize_array, parse_date};
use crate::error::ParseError;
use crate::options::ParserOptions;
use crate::utils::append_path_segment;
use crate::value::{PropertyMap, PropertyValue, JCR_MIXIN_TYPES, JCR_PRIMARY_TYPE};

/// Parses XML files that contain content fragments.
pub struct XmlContentParser;

impl ContentParser for XmlContentParser {
    fn content_type(&self) -> &'static str {
        "xml"
    }

    fn parse(
        &self,
        handler: &mut dyn ContentHandler,
        input: &mut dyn Read,
        options: &ParserOptions,
    ) -> Result<(), ParseError> {
        debug!("parsing content-fragment XML");
        let root = build_tree(input)?;
        walk(handler, &root, options, None)
    }
}

/// One buffered element: the dialect only ever needs names, text content
/// and child elements, so a full DOM is not worth carrying.
#[derive(Debug, Default)]
struct XmlElement {
    name: String,
    text: String,
    children: Vec<XmlElement>,
}

fn build_tree(input: &mut dyn Read) -> Result<XmlElement, ParseError> {
    let mut reader = Reader::from_reader(BufReader::new(input));
    reader.config_mut().expand_empty_elements = true;

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(start)) => {
                if stack.is_empty() && root.is_some() {
                    return Err(xml_syntax(&reader, "multiple root elements"));
                }
                stack.push(XmlElement {
                    name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                    text: String::new(),
                    children: Vec::new(),
                });
            }
            Ok(Event::Text(text)) => {
                if let Some(current) = stack.last_mut() {
                    let unescaped = text
                        .unescape()
                        .map_err(|err| xml_syntax(&reader, &err.to_string()))?;
                    current.text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(cdata)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&cdata));
                }
            }
            Ok(Event::End(_)) => {
                if let Some(finished) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(finished),
                        None => root = Some(finished),
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(xml_syntax(&reader, &err.to_string())),
        }
        buf.clear();
    }
    if !stack.is_empty() {
        return Err(xml_syntax(&reader, "unexpected end of document"));
    }
    root.ok_or_else(|| xml_syntax(&reader, "document contains no root element"))
}

fn xml_syntax<R>(reader: &Reader<R>, message: &str) -> ParseError {
    ParseError::XmlSyntax {
        offset: reader.buffer_position(),
        message: message.to_string(),
    }
}

fn walk(
    handler: &mut dyn ContentHandler,
    element: &XmlElement,
    options: &ParserOptions,
    parent_path: Option<&str>,
) -> Result<(), ParseError> {
    let path = match parent_path {
        None => "/".to_string(),
        Some(parent) => {
            let name = match single_child_text(element, "name")? {
                Some(name) if !name.trim().is_empty() => name,
                _ => {
                    return Err(ParseError::MissingField {
                        field: "name",
                        path: parent.to_string(),
                    });
                }
            };
            if options.is_resource_ignored(&name) {
                return Ok(());
            }
            append_path_segment(parent, &name)
        }
    };

    let mut properties = PropertyMap::new();

    if let Some(primary_type) = single_child_text(element, "primaryNodeType")? {
        if !primary_type.trim().is_empty()
            && !options.ignore_property_names.contains(JCR_PRIMARY_TYPE)
        {
            properties.insert(
                JCR_PRIMARY_TYPE.to_string(),
                PropertyValue::String(primary_type),
            );
        }
    }
    let mixins: Vec<PropertyValue> = children_named(element, "mixinNodeType")
        .map(|mixin| PropertyValue::String(mixin.text.clone()))
        .collect();
    if !mixins.is_empty() && !options.ignore_property_names.contains(JCR_MIXIN_TYPES) {
        properties.insert(JCR_MIXIN_TYPES.to_string(), homogenize_array(mixins)?);
    }

    for property in children_named(element, "property") {
        read_property(property, options, &path, &mut properties)?;
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
    handler.resource(&path, properties);

    for node in children_named(element, "node") {
        walk(handler, node, options, Some(&path))?;
    }
    Ok(())
}

fn read_property(
    element: &XmlElement,
    options: &ParserOptions,
    path: &str,
    properties: &mut PropertyMap,
) -> Result<(), ParseError> {
    let raw_name = match single_child_text(element, "name")? {
        Some(name) if !name.trim().is_empty() => name,
        _ => {
            return Err(ParseError::MissingField {
                field: "name",
                path: path.to_string(),
            });
        }
    };
    // Name-based ignore strictly before value coercion.
    let name = options.strip_property_prefix(&raw_name);
    if options.ignore_property_names.contains(name) {
        return Ok(());
    }

    let type_token = match single_child_text(element, "type")? {
        Some(token) if !token.trim().is_empty() => token,
        _ => {
            return Err(ParseError::MissingField {
                field: "type",
                path: path.to_string(),
            });
        }
    };

    let value = if let Some(values_wrapper) = children_named(element, "values").next() {
        let converted = children_named(values_wrapper, "value")
            .map(|value| convert_value(&type_token, &value.text, path))
            .collect::<Result<Vec<_>, _>>()?;
        homogenize_array(converted)?
    } else {
        let text = single_child_text(element, "value")?.ok_or(ParseError::MissingField {
            field: "value",
            path: path.to_string(),
        })?;
        convert_value(&type_token, &text, path)?
    };

    properties.insert(name.to_string(), value);
    Ok(())
}

/// The fixed type-token table of the dialect. Unknown tokens are fatal.
fn convert_value(type_token: &str, value: &str, path: &str) -> Result<PropertyValue, ParseError> {
    match type_token {
        "String" | "Name" | "Path" | "Reference" | "WeakReference" | "URI" => {
            Ok(PropertyValue::String(value.to_string()))
        }
        "Long" => value.parse::<i64>().map(PropertyValue::Long).map_err(|_| {
            ParseError::coercion(format!("invalid Long value '{value}' at {path}"))
        }),
        "Double" | "Decimal" => BigDecimal::from_str(value)
            .map(PropertyValue::Decimal)
            .map_err(|_| {
                ParseError::coercion(format!(
                    "invalid {type_token} value '{value}' at {path}"
                ))
            }),
        // The type token was explicit, so an unparseable date is fatal here.
        "Date" => parse_date(value).map(PropertyValue::Calendar).ok_or_else(|| {
            ParseError::coercion(format!("invalid Date value '{value}' at {path}"))
        }),
        "Boolean" => Ok(PropertyValue::Boolean(value.eq_ignore_ascii_case("true"))),
        _ => Err(ParseError::UnsupportedType {
            type_token: type_token.to_string(),
            path: path.to_string(),
        }),
    }
}

fn children_named<'a>(
    element: &'a XmlElement,
    name: &'a str,
) -> impl Iterator<Item = &'a XmlElement> {
    element.children.iter().filter(move |child| child.name == name)
}

/// Text of the single child element with the given name. `Ok(None)` when
/// absent; more than one occurrence is malformed.
fn single_child_text(element: &XmlElement, name: &str) -> Result<Option<String>, ParseError> {
    let mut matches = children_named(element, name);
    let first = match matches.next() {
        None => return Ok(None),
        Some(child) => child,
    };
    if matches.next().is_some() {
        return Err(ParseError::coercion(format!(
            "found multiple elements named '{name}'"
        )));
    }
    Ok(Some(first.text.clone()))
}
