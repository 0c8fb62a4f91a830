//! DOM Module - Arena-based XML Document
//!
//! Implements the document tree using:
//! - Arena allocation for nodes
//! - NodeId (u32) indices instead of parent/child pointers
//! - A builder that consumes reader events

pub mod builder;
pub mod document;
pub mod node;

pub use builder::TreeBuilder;
pub use document::{Descendants, Document};
pub use node::{
    Element, NodeData, NodeId, NodeKind, XmlNode, CDATA_NODE_NAME, DOCUMENT_NODE_NAME,
    TEXT_NODE_NAME,
};
