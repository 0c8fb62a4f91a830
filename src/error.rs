//! Error types
//!
//! Every fallible entry point returns one of the typed errors below.
//! [`Error`] wraps them all for the convenience APIs.

use std::fmt;
use std::ops::Range;

use thiserror::Error;

use crate::dom::NodeId;
use crate::xpath::{CharClass, Instruction};

/// Kind of query compilation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// A character that is illegal in the current compiler state
    UnexpectedToken,
    /// Input ended inside a bracket expression
    IncompleteExpression,
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileErrorKind::UnexpectedToken => f.write_str("UnexpectedToken"),
            CompileErrorKind::IncompleteExpression => f.write_str("IncompleteExpression"),
        }
    }
}

/// Snapshot of the compiler at the moment it failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileState {
    /// Classification of the offending character
    pub class: CharClass,
    /// Instruction being assembled
    pub instruction: Instruction,
    /// Token accumulated so far
    pub token: String,
    /// Offending character (`None` at end of input)
    pub character: Option<char>,
    /// Zero-based character index into the query
    pub index: usize,
}

/// Query compilation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "query error ({kind}) at character {position}: {message} while assembling a {instruction} instruction",
    position = .state.index + 1,
    instruction = .state.instruction.as_str()
)]
pub struct CompileError {
    pub message: String,
    pub kind: CompileErrorKind,
    pub state: CompileState,
}

impl CompileError {
    /// 1-based character position of the failure
    pub fn position(&self) -> usize {
        self.state.index + 1
    }
}

/// Query evaluation error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("index {}..{} is out of range for a result set of {len} nodes", .requested.start, .requested.end)]
    IndexOutOfRange { requested: Range<usize>, len: usize },
    #[error("node {0} does not exist in this document")]
    UnknownNode(NodeId),
}

/// Error raised by programmatic tree composition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} does not exist in this document")]
    UnknownNode(NodeId),
    #[error("node {0} is not an element and cannot hold children")]
    NotAnElement(NodeId),
    #[error("node {0} has no parent")]
    NoParent(NodeId),
    #[error("document already has root element {0}")]
    MultipleRootElements(NodeId),
    #[error("document holds the maximum number of nodes")]
    TooManyNodes,
}

/// Error raised while turning document bytes into a tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid UTF-8 at byte {offset}")]
    InvalidUtf8 { offset: usize },
    #[error("unterminated {construct} starting at byte {offset}")]
    Unterminated { construct: &'static str, offset: usize },
    #[error("malformed tag at byte {offset}")]
    MalformedTag { offset: usize },
    #[error("end tag </{name}> has no matching start tag")]
    UnexpectedEndTag { name: String },
    #[error("end tag </{found}> does not close <{expected}>")]
    MismatchedEndTag { expected: String, found: String },
    #[error("element <{name}> is never closed")]
    UnclosedElement { name: String },
    #[error("element <{name}> follows the root element at top level")]
    MultipleRootElements { name: String },
    #[error("document holds the maximum number of nodes")]
    TooManyNodes,
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Umbrella error for the convenience entry points
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_display() {
        let err = CompileError {
            message: "comparison outside of an attribute predicate".to_string(),
            kind: CompileErrorKind::UnexpectedToken,
            state: CompileState {
                class: CharClass::Comparison,
                instruction: Instruction::Null,
                token: String::new(),
                character: Some('<'),
                index: 0,
            },
        };
        assert_eq!(err.position(), 1);
        assert_eq!(
            err.to_string(),
            "query error (UnexpectedToken) at character 1: comparison outside of an \
             attribute predicate while assembling a null instruction"
        );
    }

    #[test]
    fn test_index_error_display() {
        let err = EvaluationError::IndexOutOfRange { requested: 5..6, len: 2 };
        assert_eq!(
            err.to_string(),
            "index 5..6 is out of range for a result set of 2 nodes"
        );
    }

    #[test]
    fn test_arena_full_is_distinct() {
        assert_eq!(
            ParseError::TooManyNodes.to_string(),
            "document holds the maximum number of nodes"
        );
        assert_ne!(
            ParseError::TooManyNodes,
            ParseError::UnclosedElement { name: String::new() }
        );
        assert_eq!(
            ParseError::from(TreeError::NotAnElement(3)).to_string(),
            "node 3 is not an element and cannot hold children"
        );
    }
}
