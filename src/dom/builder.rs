//! Tree Builder
//!
//! Consumes [`XmlHandler`] events and appends nodes to a [`Document`].
//! Construction is single-pass and append-only: the cursor descends on a
//! start tag and climbs back to its parent on the matching end tag.

use tracing::trace;

use super::document::Document;
use super::node::{Element, NodeId, XmlNode};
use crate::error::{ParseError, TreeError};
use crate::options::Options;
use crate::reader::XmlHandler;

/// Builds a [`Document`] from tokenizer events
pub struct TreeBuilder {
    doc: Document,
    cursor: NodeId,
    options: Options,
    /// First structural error seen; later events are ignored
    error: Option<ParseError>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        TreeBuilder {
            doc: Document::with_encoding(options.encoding.clone()),
            cursor: Document::ROOT,
            options,
            error: None,
        }
    }

    /// Current insertion point
    #[inline]
    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    /// Finish building. Fails if an event was out of order or an element
    /// is still open.
    pub fn finish(self) -> Result<Document, ParseError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.cursor != Document::ROOT {
            let name = self.doc.node_name(self.cursor).unwrap_or_default().to_string();
            return Err(ParseError::UnclosedElement { name });
        }
        Ok(self.doc)
    }

    fn is_formatting_whitespace(text: &str) -> bool {
        text.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
    }

    fn append(&mut self, make: impl FnOnce(NodeId) -> XmlNode) {
        if self.error.is_some() {
            return;
        }
        let parent = self.cursor;
        let node = make(parent);
        match self.doc.push_node(parent, node) {
            Ok(id) => {
                if self.doc.get_node(id).is_some_and(XmlNode::is_element) {
                    self.cursor = id;
                }
            }
            Err(TreeError::TooManyNodes) => self.error = Some(ParseError::TooManyNodes),
            Err(err) => self.error = Some(err.into()),
        }
    }
}

impl XmlHandler for TreeBuilder {
    fn start_element(&mut self, name: &str, attributes: &[(&str, &str)]) {
        self.options.observe(|| {
            trace!(
                tag = name,
                parent = %self.doc.ancestor_path(self.cursor),
                attributes = attributes.len(),
                "start element"
            );
        });
        if self.error.is_none() && self.cursor == Document::ROOT && self.doc.root_element().is_some() {
            self.error = Some(ParseError::MultipleRootElements {
                name: name.to_string(),
            });
            return;
        }
        let mut element = Element::new(name);
        for &(key, value) in attributes {
            element.set_attribute(key, value);
        }
        self.append(|parent| XmlNode::element(Some(parent), element));
    }

    fn characters(&mut self, text: &str) {
        if self.options.drop_formatting_whitespace && Self::is_formatting_whitespace(text) {
            return;
        }
        self.options.observe(|| {
            trace!(len = text.len(), parent = self.doc.node_name(self.cursor).unwrap_or_default(), "text");
        });
        self.append(|parent| XmlNode::text(parent, text));
    }

    fn cdata(&mut self, data: &[u8]) {
        self.options.observe(|| {
            trace!(len = data.len(), parent = self.doc.node_name(self.cursor).unwrap_or_default(), "cdata");
        });
        self.append(|parent| XmlNode::cdata(parent, data));
    }

    fn end_element(&mut self, name: &str) {
        if self.error.is_some() {
            return;
        }
        let Some(parent) = self.doc.parent(self.cursor) else {
            self.error = Some(ParseError::UnexpectedEndTag {
                name: name.to_string(),
            });
            return;
        };
        let open = self.doc.node_name(self.cursor).unwrap_or_default();
        if open != name {
            self.error = Some(ParseError::MismatchedEndTag {
                expected: open.to_string(),
                found: name.to_string(),
            });
            return;
        }
        self.options.observe(|| {
            trace!(tag = name, parent = %self.doc.ancestor_path(self.cursor), "end element");
        });
        self.cursor = parent;
    }

    fn xml_declaration(&mut self, encoding: Option<&str>) {
        if let Some(encoding) = encoding {
            self.doc.set_encoding(encoding);
        }
    }

    fn end_document(&mut self) {
        self.options.observe(|| {
            trace!(nodes = self.doc.node_count(), "end document");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeKind;

    #[test]
    fn test_builds_nested_elements() {
        let mut builder = TreeBuilder::new();
        builder.start_element("root", &[]);
        builder.start_element("a", &[("x", "1"), ("flag", "TRUE")]);
        builder.end_element("a");
        builder.characters("hello");
        builder.cdata(b"raw");
        builder.end_element("root");
        builder.end_document();
        let doc = builder.finish().unwrap();

        let root = doc.root_element().unwrap();
        let kinds: Vec<_> = doc
            .children(root)
            .iter()
            .map(|&c| doc.get_node(c).unwrap().kind())
            .collect();
        assert_eq!(kinds, [NodeKind::Element, NodeKind::Text, NodeKind::CData]);

        let a = doc.children(root)[0];
        let node = doc.get_node(a).unwrap();
        assert_eq!(node.typed_attribute("x"), Some(&crate::Value::Integer(1)));
        assert_eq!(node.typed_attribute("flag"), Some(&crate::Value::Boolean(true)));
    }

    #[test]
    fn test_drops_formatting_whitespace() {
        let mut builder = TreeBuilder::new();
        builder.start_element("root", &[]);
        for ws in [" ", "  ", "\t", "\n", "\n    "] {
            builder.characters(ws);
        }
        builder.characters(" x ");
        builder.end_element("root");
        let doc = builder.finish().unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.children(root).len(), 1);
    }

    #[test]
    fn test_keeps_whitespace_when_configured() {
        let options = Options::default().drop_formatting_whitespace(false);
        let mut builder = TreeBuilder::with_options(options);
        builder.start_element("root", &[]);
        builder.characters("\n");
        builder.end_element("root");
        let doc = builder.finish().unwrap();
        assert_eq!(doc.children(doc.root_element().unwrap()).len(), 1);
    }

    #[test]
    fn test_unclosed_element() {
        let mut builder = TreeBuilder::new();
        builder.start_element("root", &[]);
        builder.start_element("a", &[]);
        builder.end_element("a");
        assert_eq!(
            builder.finish().unwrap_err(),
            ParseError::UnclosedElement { name: "root".to_string() }
        );
    }

    #[test]
    fn test_unexpected_end_tag() {
        let mut builder = TreeBuilder::new();
        builder.end_element("root");
        assert_eq!(
            builder.finish().unwrap_err(),
            ParseError::UnexpectedEndTag { name: "root".to_string() }
        );
    }

    #[test]
    fn test_mismatched_end_tag() {
        let mut builder = TreeBuilder::new();
        builder.start_element("root", &[]);
        builder.end_element("other");
        assert_eq!(
            builder.finish().unwrap_err(),
            ParseError::MismatchedEndTag {
                expected: "root".to_string(),
                found: "other".to_string(),
            }
        );
    }

    #[test]
    fn test_second_root_element() {
        let mut builder = TreeBuilder::new();
        builder.start_element("a", &[]);
        builder.end_element("a");
        builder.start_element("b", &[]);
        builder.end_element("b");
        assert_eq!(
            builder.finish().unwrap_err(),
            ParseError::MultipleRootElements { name: "b".to_string() }
        );
        assert_eq!(
            Document::parse(b"<a/><b/>").unwrap_err(),
            ParseError::MultipleRootElements { name: "b".to_string() }
        );
    }

    #[test]
    fn test_declared_encoding() {
        let mut builder = TreeBuilder::new();
        builder.xml_declaration(Some("ISO-8859-1"));
        builder.start_element("r", &[]);
        builder.end_element("r");
        assert_eq!(builder.finish().unwrap().encoding(), "ISO-8859-1");
    }
}
