//! Streaming JCR document-view XML parser.
//!
//! Unlike the other two formats, everything a node carries lives in the
//! attributes of its opening tag, so a node can be reported the moment its
//! element opens and no buffering is needed. The price is that ignore
//! decisions must be made on the way in and remembered: an emitted event
//! cannot be retracted, so nothing under an ignored path may ever reach the
//! handler.

use std::collections::HashSet;
use std::io::{BufReader, Read};
use std::str::FromStr;

use bigdecimal::BigDecimal;
use log::{debug, trace};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::api::{ContentHandler, ContentParser};
use crate::coerce::{homogenize_array, parse_date};
use crate::error::ParseError;
use crate::options::ParserOptions;
use crate::utils::append_path_segment;
use crate::value::{PropertyMap, PropertyValue, JCR_PRIMARY_TYPE};

/// Parses JCR document-view XML as a forward-only event stream.
pub struct JcrXmlContentParser;

impl ContentParser for JcrXmlContentParser {
    fn content_type(&self) -> &'static str {
        "jcr.xml"
    }

    fn parse(
        &self,
        handler: &mut dyn ContentHandler,
        input: &mut dyn Read,
        options: &ParserOptions,
    ) -> Result<(), ParseError> {
        debug!("parsing JCR document-view XML");
        let mut reader = Reader::from_reader(BufReader::new(input));
        // Empty elements must produce Start and End so the path stack
        // pushes and pops symmetrically.
        reader.config_mut().expand_empty_elements = true;

        let mut state = DocViewState::default();
        // The pull reader does not police document structure, so the driver
        // loop must: exactly one root element, nothing but whitespace
        // outside it.
        let mut seen_root = false;
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(element)) => {
                    if state.paths.is_empty() && seen_root {
                        return Err(ParseError::XmlSyntax {
                            offset: reader.buffer_position(),
                            message: "multiple root elements".to_string(),
                        });
                    }
                    seen_root = true;
                    start_element(handler, &mut state, &element, options).map_err(|err| {
                        attach_offset(err, reader.buffer_position())
                    })?;
                }
                Ok(Event::End(_)) => {
                    state.paths.pop();
                }
                Ok(Event::Text(text)) => {
                    if state.paths.is_empty() && !text.iter().all(u8::is_ascii_whitespace) {
                        return Err(ParseError::XmlSyntax {
                            offset: reader.buffer_position(),
                            message: "text content outside the root element".to_string(),
                        });
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => {
                    return Err(ParseError::XmlSyntax {
                        offset: reader.buffer_position(),
                        message: err.to_string(),
                    });
                }
            }
            buf.clear();
        }
        if !state.paths.is_empty() {
            return Err(ParseError::XmlSyntax {
                offset: reader.buffer_position(),
                message: "unexpected end of document".to_string(),
            });
        }
        if !seen_root {
            return Err(ParseError::XmlSyntax {
                offset: reader.buffer_position(),
                message: "document contains no root element".to_string(),
            });
        }
        Ok(())
    }
}

fn attach_offset(err: ParseError, offset: u64) -> ParseError {
    match err {
        ParseError::XmlSyntax { message, .. } => ParseError::XmlSyntax { offset, message },
        other => other,
    }
}

/// The only traversal state the streaming parser needs: the stack of open
/// paths, plus every path that was decided to be ignored (ancestors
/// included, so descendants can be suppressed without look-back).
#[derive(Debug, Default)]
struct DocViewState {
    paths: Vec<String>,
    ignored_paths: HashSet<String>,
}

impl DocViewState {
    fn is_ignored(&self, path: &str) -> bool {
        let mut current = path;
        loop {
            if self.ignored_paths.contains(current) {
                return true;
            }
            match current.rfind('/') {
                Some(0) | None => return false,
                Some(index) => current = &current[..index],
            }
        }
    }
}

fn start_element(
    handler: &mut dyn ContentHandler,
    state: &mut DocViewState,
    element: &BytesStart<'_>,
    options: &ParserOptions,
) -> Result<(), ParseError> {
    let resource_name = decode_name(&String::from_utf8_lossy(element.name().as_ref()));

    let path = match state.paths.last() {
        None => "/".to_string(),
        Some(parent) => {
            let path = append_path_segment(parent, &resource_name);
            if options.is_resource_ignored(&resource_name) {
                state.ignored_paths.insert(path.clone());
            }
            path
        }
    };
    // Pushed unconditionally so End can always pop symmetrically.
    state.paths.push(path.clone());

    if state.is_ignored(&path) {
        return Ok(());
    }

    let mut properties = PropertyMap::new();
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|err| ParseError::XmlSyntax {
            offset: 0,
            message: err.to_string(),
        })?;
        let qualified_name = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        // Namespace declarations are not properties.
        if qualified_name == "xmlns" || qualified_name.starts_with("xmlns:") {
            continue;
        }
        let decoded = decode_name(&qualified_name);
        let property_name = options.strip_property_prefix(&decoded);
        if options.ignore_property_names.contains(property_name) {
            continue;
        }
        let raw_value = attribute.unescape_value().map_err(|err| ParseError::XmlSyntax {
            offset: 0,
            message: err.to_string(),
        })?;
        if let Some(value) = parse_attribute_value(&path, property_name, &raw_value)? {
            properties.insert(property_name.to_string(), value);
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
    handler.resource(&path, properties);
    Ok(())
}

/// Decodes the `_xHHHH_` escaping used to represent JCR names that are not
/// valid XML names. Malformed sequences are left verbatim.
pub fn decode_name(qualified_name: &str) -> String {
    let chars: Vec<char> = qualified_name.chars().collect();
    let mut output = String::with_capacity(qualified_name.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '_'
            && i + 6 < chars.len()
            && chars[i + 1] == 'x'
            && chars[i + 6] == '_'
            && chars[i + 2..i + 6].iter().all(char::is_ascii_hexdigit)
        {
            let hex: String = chars[i + 2..i + 6].iter().collect();
            if let Some(decoded) = u32::from_str_radix(&hex, 16)
                .ok()
                .and_then(char::from_u32)
            {
                output.push(decoded);
                i += 7;
                continue;
            }
        }
        output.push(chars[i]);
        i += 1;
    }
    output
}

/// Parses one attribute value of the document-view grammar: an optional
/// `{Type}` prefix, then either a scalar or a `[item,item,...]` list with
/// backslash escaping for `\,` `\[` `\{` `\\`.
///
/// `Ok(None)` drops the property: `{Binary}` values and `{Date}` values
/// that fail to parse are skipped, since attribute typing is best effort.
fn parse_attribute_value(
    path: &str,
    name: &str,
    raw: &str,
) -> Result<Option<PropertyValue>, ParseError> {
    let (type_token, rest) = match raw.strip_prefix('{').and_then(|r| r.split_once('}')) {
        Some((token, rest)) => (Some(token), rest),
        None => (None, raw),
    };

    if rest.starts_with('[') && rest.ends_with(']') {
        let inner = &rest[1..rest.len() - 1];
        let mut values = Vec::new();
        for item in split_array_items(inner) {
            match parse_scalar(path, name, type_token, &item)? {
                Some(value) => values.push(value),
                None => {
                    return Err(ParseError::coercion(format!(
                        "multi-value array must not contain null values (property '{name}' at {path})"
                    )));
                }
            }
        }
        return homogenize_array(values).map(Some);
    }
    parse_scalar(path, name, type_token, rest)
}

fn parse_scalar(
    path: &str,
    name: &str,
    type_token: Option<&str>,
    raw: &str,
) -> Result<Option<PropertyValue>, ParseError> {
    if raw.starts_with('[') && raw.ends_with(']') {
        return Err(ParseError::coercion(format!(
            "nested multi-value arrays are not supported (property '{name}' at {path})"
        )));
    }
    let value = de_escape(raw);
    let Some(token) = type_token else {
        return Ok(Some(PropertyValue::String(value)));
    };
    match token {
        "String" | "Name" | "Path" | "Reference" | "WeakReference" | "URI" => {
            Ok(Some(PropertyValue::String(value)))
        }
        "Long" => value
            .parse::<i64>()
            .map(|long| Some(PropertyValue::Long(long)))
            .map_err(|_| {
                ParseError::coercion(format!(
                    "invalid Long value '{value}' for property '{name}' at {path}"
                ))
            }),
        "Double" | "Decimal" => BigDecimal::from_str(&value)
            .map(|decimal| Some(PropertyValue::Decimal(decimal)))
            .map_err(|_| {
                ParseError::coercion(format!(
                    "invalid {token} value '{value}' for property '{name}' at {path}"
                ))
            }),
        "Boolean" => Ok(Some(PropertyValue::Boolean(value.eq_ignore_ascii_case("true")))),
        "Date" => Ok(parse_date(&value).map(PropertyValue::Calendar)),
        "Binary" => Ok(None),
        _ => Err(ParseError::UnsupportedType {
            type_token: token.to_string(),
            path: path.to_string(),
        }),
    }
}

/// Splits the inside of a `[...]` list on unescaped commas, keeping the
/// escape sequences intact for [`de_escape`].
fn split_array_items(inner: &str) -> Vec<String> {
    if inner.is_empty() {
        return Vec::new();
    }
    let mut items = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in inner.chars() {
        if escaped {
            current.push('\\');
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            ',' => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if escaped {
        current.push('\\');
    }
    items.push(current);
    items
}

fn de_escape(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                output.push(next);
            }
        } else {
            output.push(c);
        }
    }
    output
}
