use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;

/// Canonical property key for a node's primary type, regardless of source format.
pub const JCR_PRIMARY_TYPE: &str = "jcr:primaryType";
/// Canonical property key for a node's mixin types, regardless of source format.
pub const JCR_MIXIN_TYPES: &str = "jcr:mixinTypes";

/// The properties of a single node, keyed by property name.
///
/// Insertion order is preserved so that re-parsing the same input yields an
/// identical sequence of entries.
pub type PropertyMap = IndexMap<String, PropertyValue>;

/// A single typed property value.
///
/// Arrays are homogeneous: every element shares one scalar kind, and arrays
/// never nest. [`crate::coerce::homogenize_array`] enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    /// 64-bit signed integer.
    Long(i64),
    /// Arbitrary-precision decimal. Also covers the `Double` type token of
    /// the content-fragment dialect; the value model has no binary float.
    Decimal(BigDecimal),
    Boolean(bool),
    /// A timestamp carrying the UTC offset it was written with.
    Calendar(DateTime<FixedOffset>),
    /// Homogeneous ordered sequence of scalars.
    Array(Vec<PropertyValue>),
}

impl PropertyValue {
    /// The scalar kind of this value, as used in coercion error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyValue::String(_) => "String",
            PropertyValue::Long(_) => "Long",
            PropertyValue::Decimal(_) => "Decimal",
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::Calendar(_) => "Date",
            PropertyValue::Array(_) => "Array",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            PropertyValue::Long(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            PropertyValue::Decimal(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_calendar(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            PropertyValue::Calendar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::Array(values) => Some(values),
            _ => None,
        }
    }
}
