// Shared test support: a handler that records the raw event sequence and
// rebuilds the reported tree for path-based assertions.
#![allow(dead_code)]

use contentparser::{ContentHandler, ContentParser, ParseError, ParserOptions, PropertyMap, PropertyValue};

/// One rebuilt node of the reported tree.
#[derive(Debug, Clone)]
pub struct ContentElement {
    pub name: String,
    pub properties: PropertyMap,
    pub children: Vec<ContentElement>,
}

impl ContentElement {
    /// Looks up a descendant by a relative path like `"jcr:content/header"`.
    /// A leading slash is invalid and finds nothing.
    pub fn child(&self, relative_path: &str) -> Option<&ContentElement> {
        if relative_path.starts_with('/') {
            return None;
        }
        let mut current = self;
        for segment in relative_path.split('/') {
            current = current.children.iter().find(|child| child.name == segment)?;
        }
        Some(current)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

#[derive(Debug, Default)]
pub struct RecordingHandler {
    pub events: Vec<(String, PropertyMap)>,
    root: Option<ContentElement>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &ContentElement {
        self.root.as_ref().expect("no root resource was reported")
    }

    /// The reported paths, in emission order.
    pub fn paths(&self) -> Vec<&str> {
        self.events.iter().map(|(path, _)| path.as_str()).collect()
    }
}

impl ContentHandler for RecordingHandler {
    fn resource(&mut self, path: &str, properties: PropertyMap) {
        self.events.push((path.to_string(), properties.clone()));
        if path == "/" {
            self.root = Some(ContentElement {
                name: String::new(),
                properties,
                children: Vec::new(),
            });
            return;
        }
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        let Some(mut current) = self.root.as_mut() else {
            panic!("child {path} reported before the root");
        };
        for segment in &segments[..segments.len() - 1] {
            current = current
                .children
                .iter_mut()
                .find(|child| child.name == *segment)
                .unwrap_or_else(|| panic!("child {path} reported before its parent"));
        }
        current.children.push(ContentElement {
            name: segments.last().unwrap().to_string(),
            properties,
            children: Vec::new(),
        });
    }
}

pub fn parse_str(
    parser: &dyn ContentParser,
    options: &ParserOptions,
    text: &str,
) -> Result<RecordingHandler, ParseError> {
    let mut handler = RecordingHandler::new();
    let mut input = text.as_bytes();
    parser.parse(&mut handler, &mut input, options)?;
    Ok(handler)
}
