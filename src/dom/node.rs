//! XML Node representation
//!
//! Uses NodeId (u32) for compact node references into the document arena.

use indexmap::IndexMap;

use crate::value::Value;

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Name carried by text nodes in place of a tag name
pub const TEXT_NODE_NAME: &str = "#text";
/// Name carried by CDATA nodes in place of a tag name
pub const CDATA_NODE_NAME: &str = "#cdata";
/// Name of the synthetic document root
pub const DOCUMENT_NODE_NAME: &str = "#document";

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    CData,
}

/// Element payload: name, owned children and attribute maps
#[derive(Debug, Clone, Default)]
pub struct Element {
    /// Tag name, possibly `prefix:local`
    pub name: String,
    /// Children in document order
    pub children: Vec<NodeId>,
    /// Raw attribute strings
    attributes: IndexMap<String, String>,
    /// The same keys decoded into typed values
    typed_attributes: IndexMap<String, Value>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Element::default()
        }
    }

    /// Insert a raw attribute and its typed counterpart
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        self.typed_attributes
            .insert(key.clone(), Value::from_attribute(&value));
        self.attributes.insert(key, value);
    }

    /// Raw attributes in insertion order
    #[inline]
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    /// Typed attributes, keyed like [`Element::attributes`]
    #[inline]
    pub fn typed_attributes(&self) -> &IndexMap<String, Value> {
        &self.typed_attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn typed_attribute(&self, key: &str) -> Option<&Value> {
        self.typed_attributes.get(key)
    }
}

/// Variant-specific node content
#[derive(Debug, Clone)]
pub enum NodeData {
    Element(Element),
    /// Character data
    Text(String),
    /// Raw CDATA bytes
    CData(Vec<u8>),
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Parent node (None for document root)
    pub parent: Option<NodeId>,
    pub data: NodeData,
}

impl XmlNode {
    pub fn element(parent: Option<NodeId>, element: Element) -> Self {
        XmlNode {
            parent,
            data: NodeData::Element(element),
        }
    }

    pub fn text(parent: NodeId, text: impl Into<String>) -> Self {
        XmlNode {
            parent: Some(parent),
            data: NodeData::Text(text.into()),
        }
    }

    pub fn cdata(parent: NodeId, bytes: impl Into<Vec<u8>>) -> Self {
        XmlNode {
            parent: Some(parent),
            data: NodeData::CData(bytes.into()),
        }
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::CData(_) => NodeKind::CData,
        }
    }

    /// Tag name for elements, a sentinel name otherwise
    pub fn name(&self) -> &str {
        match &self.data {
            NodeData::Element(e) => &e.name,
            NodeData::Text(_) => TEXT_NODE_NAME,
            NodeData::CData(_) => CDATA_NODE_NAME,
        }
    }

    /// Namespace prefix: the part of the name before the first colon
    pub fn prefix(&self) -> Option<&str> {
        self.name().split_once(':').map(|(prefix, _)| prefix)
    }

    /// Name without its prefix, or the full name when there is none
    pub fn unprefixed_name(&self) -> &str {
        let name = self.name();
        name.split_once(':').map_or(name, |(_, local)| local)
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    #[inline]
    pub fn as_element(&self) -> Option<&Element> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Child ids; empty for text and CDATA nodes
    pub fn children(&self) -> &[NodeId] {
        match &self.data {
            NodeData::Element(e) => &e.children,
            _ => &[],
        }
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn cdata_content(&self) -> Option<&[u8]> {
        match &self.data {
            NodeData::CData(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Raw attribute value
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.as_element().and_then(|e| e.attribute(key))
    }

    /// Typed attribute value
    pub fn typed_attribute(&self, key: &str) -> Option<&Value> {
        self.as_element().and_then(|e| e.typed_attribute(key))
    }

    #[inline]
    pub fn has_attributes(&self) -> bool {
        self.as_element().is_some_and(|e| !e.attributes().is_empty())
    }
}
