//! XML Document - Arena-based tree representation
//!
//! All nodes live by value in one arena owned by the [`Document`]. Parents
//! refer to children by [`NodeId`] and every node stores its parent's id, so
//! "parent" is a lookup, never a second owner. Node 0 is the synthetic
//! document root; the real root element is its child.

use std::fmt::Write as _;

use super::builder::TreeBuilder;
use super::node::{Element, NodeData, NodeId, XmlNode, DOCUMENT_NODE_NAME};
use crate::error::{Error, ParseError, TreeError};
use crate::options::Options;
use crate::reader::entities::{escape_attribute, escape_text};
use crate::xpath;

/// An XML document stored in arena format
#[derive(Debug, Clone)]
pub struct Document {
    /// Arena of nodes; index 0 is the synthetic root
    nodes: Vec<XmlNode>,
    /// Declared encoding label written by serialization
    encoding: String,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Id of the synthetic document root
    pub const ROOT: NodeId = 0;

    /// Create an empty document holding only the synthetic root
    pub fn new() -> Self {
        Self::with_encoding("utf-8")
    }

    pub fn with_encoding(encoding: impl Into<String>) -> Self {
        Document {
            nodes: vec![XmlNode::element(None, Element::new(DOCUMENT_NODE_NAME))],
            encoding: encoding.into(),
        }
    }

    /// Parse a UTF-8 document with default options
    pub fn parse(input: &[u8]) -> Result<Self, ParseError> {
        Self::parse_with(input, &Options::default())
    }

    /// Parse a UTF-8 document
    pub fn parse_with(input: &[u8], options: &Options) -> Result<Self, ParseError> {
        let mut builder = TreeBuilder::with_options(options.clone());
        crate::reader::scan(input, &mut builder)?;
        builder.finish()
    }

    /// Get the synthetic root id
    #[inline]
    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    /// First element child of the synthetic root
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(Self::ROOT)
            .iter()
            .copied()
            .find(|&id| self.nodes[id as usize].is_element())
    }

    #[inline]
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn set_encoding(&mut self, encoding: impl Into<String>) {
        self.encoding = encoding.into();
    }

    /// Get a node by ID
    #[inline]
    pub fn get_node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        (id as usize) < self.nodes.len()
    }

    /// Get total number of nodes, the synthetic root included
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get node name as string
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        self.get_node(id).map(XmlNode::name)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.parent)
    }

    /// Direct children, in document order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get_node(id).map_or(&[], XmlNode::children)
    }

    /// Direct children whose name equals `name`
    pub fn children_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.nodes[c as usize].name() == name)
            .collect()
    }

    /// Iterate over all descendants of a node in pre-order
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = self.children(id).iter().rev().copied().collect();
        Descendants { doc: self, stack }
    }

    /// All descendants whose name equals `name`
    pub fn descendants_named(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants_where(id, |node| node.name() == name)
    }

    /// All descendants satisfying `predicate`
    pub fn descendants_where<F>(&self, id: NodeId, mut predicate: F) -> Vec<NodeId>
    where
        F: FnMut(&XmlNode) -> bool,
    {
        self.descendants(id)
            .filter(|&d| predicate(&self.nodes[d as usize]))
            .collect()
    }

    pub fn descendant_count(&self, id: NodeId) -> usize {
        self.descendants(id).count()
    }

    /// Ancestors satisfying `predicate`, nearest first
    pub fn ancestors_where<F>(&self, id: NodeId, mut predicate: F) -> Vec<NodeId>
    where
        F: FnMut(&XmlNode) -> bool,
    {
        let mut result = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(ancestor) = cursor {
            let node = &self.nodes[ancestor as usize];
            if predicate(node) {
                result.push(ancestor);
            }
            cursor = node.parent;
        }
        result
    }

    /// Ancestor names joined by `:`, nearest first (diagnostics)
    pub fn ancestor_path(&self, id: NodeId) -> String {
        let mut path = String::new();
        for ancestor in self.ancestors_where(id, |_| true) {
            path.push_str(self.nodes[ancestor as usize].name());
            path.push(':');
        }
        path
    }

    /// Every other child of this node's parent
    pub fn siblings(&self, id: NodeId) -> Vec<NodeId> {
        match self.parent(id) {
            Some(parent) => self
                .children(parent)
                .iter()
                .copied()
                .filter(|&c| c != id)
                .collect(),
            None => Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Composition
    // ------------------------------------------------------------------

    /// Append a new element as the last child of `parent`
    pub fn add_child<I, K, V>(
        &mut self,
        parent: NodeId,
        name: &str,
        attributes: I,
    ) -> Result<NodeId, TreeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut element = Element::new(name);
        for (key, value) in attributes {
            element.set_attribute(key, value);
        }
        self.push_child(parent, |parent| XmlNode::element(Some(parent), element))
    }

    /// Append a new element as the last child of `node`'s parent
    pub fn add_sibling<I, K, V>(
        &mut self,
        node: NodeId,
        name: &str,
        attributes: I,
    ) -> Result<NodeId, TreeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let parent = self
            .get_node(node)
            .ok_or(TreeError::UnknownNode(node))?
            .parent
            .ok_or(TreeError::NoParent(node))?;
        self.add_child(parent, name, attributes)
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> Result<NodeId, TreeError> {
        let text = text.into();
        self.push_child(parent, |parent| XmlNode::text(parent, text))
    }

    pub fn append_cdata(
        &mut self,
        parent: NodeId,
        bytes: impl Into<Vec<u8>>,
    ) -> Result<NodeId, TreeError> {
        let bytes = bytes.into();
        self.push_child(parent, |parent| XmlNode::cdata(parent, bytes))
    }

    fn push_child<F>(&mut self, parent: NodeId, make: F) -> Result<NodeId, TreeError>
    where
        F: FnOnce(NodeId) -> XmlNode,
    {
        self.push_node(parent, make(parent))
    }

    /// Append `node` to `parent`'s children. The synthetic root holds at
    /// most one element.
    pub(crate) fn push_node(&mut self, parent: NodeId, node: XmlNode) -> Result<NodeId, TreeError> {
        let target = self.get_node(parent).ok_or(TreeError::UnknownNode(parent))?;
        if !target.is_element() {
            return Err(TreeError::NotAnElement(parent));
        }
        if parent == Self::ROOT && node.is_element() {
            if let Some(existing) = self.root_element() {
                return Err(TreeError::MultipleRootElements(existing));
            }
        }
        let id = NodeId::try_from(self.nodes.len()).map_err(|_| TreeError::TooManyNodes)?;
        if let Some(element) = self.nodes[parent as usize].as_element_mut() {
            element.children.push(id);
        }
        self.nodes.push(node);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Compile `query` and evaluate it from the synthetic root
    pub fn query(&self, query: &str) -> Result<Vec<NodeId>, Error> {
        self.query_from(Self::ROOT, query)
    }

    /// Compile `query` and evaluate it from `node`
    pub fn query_from(&self, node: NodeId, query: &str) -> Result<Vec<NodeId>, Error> {
        let compiled = xpath::compile(query)?;
        Ok(xpath::evaluate(self, node, &compiled)?)
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// XML declaration followed by every top-level node, the root element
    /// included
    pub fn source(&self) -> String {
        let mut out = format!("<?xml version=\"1.0\" encoding=\"{}\"?>", self.encoding);
        for &child in self.children(Self::ROOT) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Source of a single node and its subtree
    pub fn node_source(&self, id: NodeId) -> String {
        if id == Self::ROOT {
            return self.source();
        }
        let mut out = String::new();
        if self.contains(id) {
            self.write_node(id, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id as usize].data {
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::CData(bytes) => {
                out.push_str("<![CDATA[");
                out.push_str(&String::from_utf8_lossy(bytes));
                out.push_str("]]>");
            }
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for (key, value) in element.attributes() {
                    let _ = write!(out, " {}=\"{}\"", key, escape_attribute(value));
                }
                out.push('>');
                for &child in &element.children {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
        }
    }
}

/// Iterator over descendant nodes, pre-order
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(current).iter().rev().copied());
        Some(current)
    }
}
