pub mod api;
pub mod coerce;
pub mod error;
pub mod jcr_xml;
pub mod json;
pub mod options;
pub mod utils;
pub mod value;
pub mod xml;

pub use api::{ContentHandler, ContentParser};
pub use error::ParseError;
pub use jcr_xml::JcrXmlContentParser;
pub use json::JsonContentParser;
pub use options::{JsonParserFeatures, ParserOptions};
pub use value::{PropertyMap, PropertyValue, JCR_MIXIN_TYPES, JCR_PRIMARY_TYPE};
pub use xml::XmlContentParser;
