//! Pure scalar conversion shared by all parsers.

use chrono::{DateTime, FixedOffset};

use crate::error::ParseError;
use crate::value::PropertyValue;

/// ISO-8601 with mandatory milliseconds and zone offset,
/// e.g. `2014-04-22T15:11:24.000+02:00`.
pub const ISO_8601_MILLISECONDS_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// The "ECMA" format emitted by JavaScript `Date#toString`,
/// e.g. `Wed Apr 22 2014 15:11:24 GMT+0200`. The leading weekday token is
/// matched separately and not cross-checked against the date.
pub const ECMA_DATE_FORMAT: &str = "%b %d %Y %H:%M:%S GMT%z";

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Attempts to parse a calendar value, trying the ISO-8601 milliseconds
/// format first and the ECMA format second. The encoded UTC offset is kept
/// as the timestamp's zone; a trailing `Z` designator reads as `+00:00`.
///
/// Returns `None` when neither format matches; callers use this to check
/// whether a string is a date, so the ambiguous case is not an error.
pub fn parse_date(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_str(text, ISO_8601_MILLISECONDS_DATE_FORMAT) {
        return Some(parsed);
    }
    // chrono's %:z has no spelling for the Z designator.
    if let Some(prefix) = text.strip_suffix('Z') {
        let normalized = format!("{prefix}+00:00");
        if let Ok(parsed) = DateTime::parse_from_str(&normalized, ISO_8601_MILLISECONDS_DATE_FORMAT)
        {
            return Some(parsed);
        }
    }
    parse_ecma_date(text)
}

fn parse_ecma_date(text: &str) -> Option<DateTime<FixedOffset>> {
    let (weekday, rest) = text.split_once(' ')?;
    if !WEEKDAYS.contains(&weekday) {
        return None;
    }
    DateTime::parse_from_str(rest, ECMA_DATE_FORMAT).ok()
}

/// Verifies that a multi-value property is homogeneous and wraps it.
///
/// Every element must carry the same scalar kind as the first one, and
/// elements must not themselves be arrays. An empty input passes through
/// unchanged: the element type is moot when there are no elements.
///
/// Null and object elements cannot be represented as a [`PropertyValue`] at
/// all; the format parsers reject them at conversion time with the same
/// error kind.
pub fn homogenize_array(values: Vec<PropertyValue>) -> Result<PropertyValue, ParseError> {
    let Some(first) = values.first() else {
        return Ok(PropertyValue::Array(values));
    };
    let expected = first.kind_name();
    for value in &values {
        if matches!(value, PropertyValue::Array(_)) {
            return Err(ParseError::coercion(
                "multi-value array must not contain nested arrays",
            ));
        }
        if value.kind_name() != expected {
            return Err(ParseError::coercion(format!(
                "multi-value array must not contain values with different types ({expected}, {})",
                value.kind_name()
            )));
        }
    }
    Ok(PropertyValue::Array(values))
}
