//! XPath-Lite Engine
//!
//! A small path-query language compiled to a flat instruction stream:
//! - `/` child and `//` descendant steps, names and `*`
//! - `[n]` index, `[a:b]` slice, `[name]` has-child tests
//! - `[@key OP value]` and `@key OP value` attribute predicates
//! - Compiled query caching

pub mod cache;
pub mod compiler;
pub mod disasm;
pub mod eval;
pub mod lexer;
pub mod predicate;

pub use cache::QueryCache;
pub use compiler::{
    compile, compile_with, CompiledQuery, Instruction, Operand, Operation, PathExpression,
};
pub use disasm::disassemble;
pub use eval::{evaluate, evaluate_with};
pub use lexer::CharClass;
pub use predicate::{Comparison, Predicate};
