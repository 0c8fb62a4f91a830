//! Disassembler
//!
//! Renders an instruction stream as line-oriented pseudo-assembly. Meant
//! for humans debugging queries; nothing parses it back.

use std::fmt::Write as _;

use super::compiler::{CompiledQuery, Instruction, PathExpression};
use super::predicate::Predicate;

/// Render `query` as pseudo-assembly, one operation per line
pub fn disassemble(query: &CompiledQuery) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "QUERY {:?}", query.source);

    for (i, op) in query.ops.iter().enumerate() {
        match op.instruction {
            // The leading no-op is the query header
            Instruction::Null if i == 0 => {}
            Instruction::Null => out.push_str("   NOOP\n"),
            Instruction::ChildOperator => out.push_str("   CHILDREN\n"),
            Instruction::DescendantOperator => out.push_str("   DESCENDANTS\n"),
            Instruction::ElementName => {
                let _ = writeln!(out, "      NAMED #{}", op.parameter());
            }
            Instruction::AnyChild => out.push_str("   CHLA\n"),
            Instruction::AttributePredicate => {
                let _ = writeln!(out, "      WHERE {}", condition(op.parameter()));
            }
            Instruction::PathExpression => {
                let line = match op.path_expression() {
                    Some(PathExpression::Index(index)) => format!("PEXP.IDX #{index}"),
                    Some(PathExpression::IndexRange(range)) => {
                        format!("PEXP.IDXRANGE #{}, #{}", range.start, range.end)
                    }
                    Some(PathExpression::AttributeCondition(c)) => format!("WHERE {}", condition(c)),
                    Some(PathExpression::HasChildOfType(name)) => format!("PEXP.HASCHILD '{name}'"),
                    Some(PathExpression::Unknown) | None => "PEXP.NOP".to_string(),
                };
                let _ = writeln!(out, "  {line}");
            }
        }
    }

    out.push_str("END");
    out
}

fn condition(source: &str) -> String {
    let predicate = Predicate::parse(source);
    match predicate.test {
        Some((op, comparand)) => format!("{} *{}, .\"{}\"", op.mnemonic(), predicate.key, comparand),
        None => format!("HAS? *{}", predicate.key),
    }
}
