use std::io::Read;

use crate::error::ParseError;
use crate::options::ParserOptions;
use crate::value::PropertyMap;

/// The sink every parser writes into.
///
/// For any parent/child pair of nodes the call for the parent path strictly
/// precedes the call for the child path, and siblings arrive in document
/// order. Each non-ignored node is reported exactly once, on the caller's
/// thread.
pub trait ContentHandler {
    /// Reports one node of the content tree.
    ///
    /// `path` is absolute and `/`-delimited; the map is created fresh for
    /// this call and never touched again by the parser.
    fn resource(&mut self, path: &str, properties: PropertyMap);
}

/// A parser for one serialization format of a content tree.
///
/// Implementations keep no state across `parse` calls, so a single instance
/// may be used concurrently as long as each invocation brings its own
/// handler, input and options.
pub trait ContentParser {
    /// The content-type token under which a registry can look this parser
    /// up: `"json"`, `"xml"` or `"jcr.xml"`.
    fn content_type(&self) -> &'static str;

    /// Consumes the whole input stream and reports every retained node to
    /// `handler` in pre-order.
    ///
    /// Either all retained nodes are emitted and `Ok(())` is returned, or
    /// the first fatal condition aborts the parse; nodes emitted before the
    /// failure are not retracted.
    fn parse(
        &self,
        handler: &mut dyn ContentHandler,
        input: &mut dyn Read,
        options: &ParserOptions,
    ) -> Result<(), ParseError>;
}
