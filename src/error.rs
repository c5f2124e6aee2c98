use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// The single error type surfaced by every parser.
///
/// Events are emitted incrementally, so a caller receiving one of these may
/// already have seen `resource(...)` calls for a prefix of the tree. Callers
/// that need atomicity must buffer until `parse` returns.
#[derive(Error, Debug, Diagnostic)]
pub enum ParseError {
    #[error("invalid JSON content: {message}")]
    #[diagnostic(
        code(contentparser::json_syntax),
        help("the input must be a single well-formed JSON object")
    )]
    JsonSyntax {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
    },

    #[error("invalid XML content near byte {offset}: {message}")]
    #[diagnostic(code(contentparser::xml_syntax))]
    XmlSyntax { offset: u64, message: String },

    #[error("{message}")]
    #[diagnostic(
        code(contentparser::coercion),
        help("multi-value arrays must hold scalars of a single type; check the offending property")
    )]
    Coercion { message: String },

    #[error("missing required element '{field}' at {path}")]
    #[diagnostic(code(contentparser::missing_field))]
    MissingField { field: &'static str, path: String },

    #[error("unsupported property type '{type_token}' at {path}")]
    #[diagnostic(code(contentparser::unsupported_type))]
    UnsupportedType { type_token: String, path: String },

    #[error("root JSON value must be an object")]
    #[diagnostic(code(contentparser::unexpected_root))]
    UnexpectedRoot,

    #[error("error reading content stream")]
    #[diagnostic(code(contentparser::io))]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Shorthand for a coercion failure with a preformatted message.
    pub(crate) fn coercion(message: impl Into<String>) -> Self {
        ParseError::Coercion {
            message: message.into(),
        }
    }
}
