use std::collections::HashSet;

/// Feature toggles that only affect the JSON parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonParserFeatures {
    /// Permit `//` line comments and `/* */` block comments. When disabled,
    /// a comment is a syntax error.
    pub comments: bool,
    /// Permit back-tick delimited strings in place of double quotes. The
    /// input is losslessly rewritten to standard quoting before parsing.
    pub quote_tick: bool,
}

impl Default for JsonParserFeatures {
    fn default() -> Self {
        JsonParserFeatures {
            comments: true,
            quote_tick: false,
        }
    }
}

/// Per-invocation parser configuration.
///
/// Constructed once by the caller and read-only for the duration of a
/// `parse` call; one instance may be shared by concurrent invocations.
/// All three parsers apply the same options uniformly.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Resource (node) names whose entire subtree is skipped.
    pub ignore_resource_names: HashSet<String>,
    /// Property names that are dropped. Matched after prefix stripping.
    pub ignore_property_names: HashSet<String>,
    /// Literal prefixes stripped from property names before ignore matching
    /// and before insertion into the property map. First match wins.
    pub remove_property_name_prefixes: Vec<String>,
    /// Injected as `jcr:primaryType` when a node does not define one.
    pub default_primary_type: Option<String>,
    /// Try plain strings against the two supported calendar formats.
    pub detect_calendar_values: bool,
    pub json_parser_features: JsonParserFeatures,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            ignore_resource_names: HashSet::new(),
            ignore_property_names: HashSet::new(),
            remove_property_name_prefixes: Vec::new(),
            default_primary_type: Some("nt:unstructured".to_string()),
            detect_calendar_values: false,
            json_parser_features: JsonParserFeatures::default(),
        }
    }
}

impl ParserOptions {
    /// Removes the first matching configured prefix from a property name.
    pub fn strip_property_prefix<'a>(&self, name: &'a str) -> &'a str {
        for prefix in &self.remove_property_name_prefixes {
            if let Some(stripped) = name.strip_prefix(prefix.as_str()) {
                return stripped;
            }
        }
        name
    }

    pub(crate) fn is_resource_ignored(&self, name: &str) -> bool {
        self.ignore_resource_names.contains(name)
    }
}
