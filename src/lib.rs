//! litexml - Arena-based XML document tree with XPath-Lite queries
//!
//! Layers:
//! - reader: byte scanner emitting start/end/text/CDATA events
//! - dom: arena document built from those events, traversal and composition
//! - xpath: query compiler, evaluator, disassembler and compiled-query cache
//! - strategy: parallel evaluation of many queries over one document
//!
//! ```
//! let doc = litexml::parse(br#"<root><a x="1"/><a x="5"/><b/></root>"#)?;
//! let hits = doc.query("//a[@x>2]")?;
//! assert_eq!(hits.len(), 1);
//! assert_eq!(doc.get_node(hits[0]).and_then(|n| n.attribute("x")), Some("5"));
//! # Ok::<(), litexml::Error>(())
//! ```

pub mod dom;
pub mod error;
pub mod options;
pub mod reader;
pub mod strategy;
pub mod value;
pub mod xpath;

pub use dom::{Document, Element, NodeData, NodeId, NodeKind, TreeBuilder, XmlNode};
pub use error::{
    CompileError, CompileErrorKind, CompileState, Error, EvaluationError, ParseError, TreeError,
};
pub use options::Options;
pub use reader::XmlHandler;
pub use value::Value;
pub use xpath::{compile, disassemble, evaluate, CompiledQuery, QueryCache};

/// Parse a UTF-8 document with default options
pub fn parse(input: &[u8]) -> Result<Document, ParseError> {
    Document::parse(input)
}

/// Parse a UTF-8 document with `options`
pub fn parse_with(input: &[u8], options: &Options) -> Result<Document, ParseError> {
    Document::parse_with(input, options)
}
