//! Query Evaluation Engine
//!
//! Runs a compiled instruction stream against a document. The result set
//! starts as the single start node; every operation maps the current set
//! to the next one, left to right.

use tracing::{debug, trace};

use super::compiler::{CompiledQuery, Instruction, Operation, PathExpression};
use super::predicate::Predicate;
use crate::dom::{Document, NodeId, XmlNode};
use crate::error::EvaluationError;
use crate::options::Options;

/// Evaluate a compiled query from `start` with default options
pub fn evaluate(
    doc: &Document,
    start: NodeId,
    query: &CompiledQuery,
) -> Result<Vec<NodeId>, EvaluationError> {
    evaluate_with(doc, start, query, &Options::default())
}

/// Evaluate a compiled query from `start`, logging to the configured
/// subscriber
pub fn evaluate_with(
    doc: &Document,
    start: NodeId,
    query: &CompiledQuery,
    options: &Options,
) -> Result<Vec<NodeId>, EvaluationError> {
    options.observe(|| {
        if !doc.contains(start) {
            return Err(EvaluationError::UnknownNode(start));
        }
        let mut results = vec![start];
        for op in &query.ops {
            let before = results.len();
            results = step(doc, op, results)?;
            trace!(
                instruction = op.instruction.as_str(),
                parameter = op.parameter(),
                before,
                after = results.len(),
                "step"
            );
        }
        debug!(query = %query.source, results = results.len(), "evaluated query");
        Ok(results)
    })
}

/// Apply one operation to the current result set
fn step(doc: &Document, op: &Operation, results: Vec<NodeId>) -> Result<Vec<NodeId>, EvaluationError> {
    let node = move |id: NodeId| doc.get_node(id);

    Ok(match op.instruction {
        Instruction::Null => results,

        Instruction::AttributePredicate => Predicate::parse(op.parameter()).filter(doc, &results),

        Instruction::PathExpression => match op.path_expression() {
            Some(expression) => apply_expression(doc, expression, results)?,
            None => results,
        },

        Instruction::ChildOperator => results
            .iter()
            .flat_map(|&id| doc.children(id))
            .copied()
            .filter(|&child| node(child).is_some_and(XmlNode::is_element))
            .collect(),

        // Every descendant of every node, no deduplication
        Instruction::DescendantOperator => results
            .iter()
            .flat_map(|&id| doc.descendants(id))
            .collect(),

        Instruction::ElementName => {
            let wanted = op.parameter().to_lowercase();
            results
                .into_iter()
                .filter(|&id| node(id).is_some_and(|n| n.name().to_lowercase() == wanted))
                .collect()
        }

        Instruction::AnyChild => results
            .into_iter()
            .filter(|&id| node(id).is_some_and(XmlNode::is_element))
            .collect(),
    })
}

fn apply_expression(
    doc: &Document,
    expression: &PathExpression,
    results: Vec<NodeId>,
) -> Result<Vec<NodeId>, EvaluationError> {
    match expression {
        PathExpression::AttributeCondition(condition) => {
            Ok(Predicate::parse(condition).filter(doc, &results))
        }

        PathExpression::HasChildOfType(name) => Ok(results
            .into_iter()
            .filter(|&id| {
                doc.children(id).iter().any(|&child| {
                    doc.get_node(child)
                        .is_some_and(|c| c.is_element() && c.name() == name)
                })
            })
            .collect()),

        PathExpression::Index(index) => results
            .get(*index)
            .map(|&id| vec![id])
            .ok_or(EvaluationError::IndexOutOfRange {
                requested: *index..index.saturating_add(1),
                len: results.len(),
            }),

        PathExpression::IndexRange(range) => results
            .get(range.clone())
            .map(<[NodeId]>::to_vec)
            .ok_or(EvaluationError::IndexOutOfRange {
                requested: range.clone(),
                len: results.len(),
            }),

        PathExpression::Unknown => {
            debug!("unrecognised path expression ignored");
            Ok(results)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::compile;

    fn fixture() -> Document {
        Document::parse(b"<root><a x=\"1\"/><a x=\"5\"/><b/></root>").unwrap()
    }

    fn run(doc: &Document, query: &str) -> Result<Vec<NodeId>, EvaluationError> {
        evaluate(doc, Document::ROOT, &compile(query).unwrap())
    }

    fn attr(doc: &Document, ids: &[NodeId], key: &str) -> Vec<String> {
        ids.iter()
            .map(|&id| doc.get_node(id).unwrap().attribute(key).unwrap_or("-").to_string())
            .collect()
    }

    #[test]
    fn test_child_path() {
        let doc = fixture();
        let result = run(&doc, "/root/a").unwrap();
        assert_eq!(attr(&doc, &result, "x"), ["1", "5"]);
    }

    #[test]
    fn test_element_name_is_case_insensitive() {
        let doc = fixture();
        assert_eq!(run(&doc, "/ROOT/A").unwrap().len(), 2);
    }

    #[test]
    fn test_descendant_condition() {
        let doc = fixture();
        let result = run(&doc, "//a[@x>2]").unwrap();
        assert_eq!(attr(&doc, &result, "x"), ["5"]);
    }

    #[test]
    fn test_wildcard() {
        let doc = fixture();
        let result = run(&doc, "/root/*").unwrap();
        let names: Vec<_> = result.iter().map(|&id| doc.node_name(id).unwrap()).collect();
        assert_eq!(names, ["a", "a", "b"]);
    }

    #[test]
    fn test_index_and_range() {
        let doc = fixture();
        assert_eq!(attr(&doc, &run(&doc, "/root/a[0]").unwrap(), "x"), ["1"]);
        assert_eq!(attr(&doc, &run(&doc, "/root/a[1]").unwrap(), "x"), ["5"]);
        assert_eq!(attr(&doc, &run(&doc, "/root/a[0:2]").unwrap(), "x"), ["1", "5"]);
        assert!(run(&doc, "/root/a[1:1]").unwrap().is_empty());
    }

    #[test]
    fn test_index_out_of_range() {
        let doc = fixture();
        assert_eq!(
            run(&doc, "/root/a[5]"),
            Err(EvaluationError::IndexOutOfRange { requested: 5..6, len: 2 })
        );
        assert_eq!(
            run(&doc, "/root/a[1:3]"),
            Err(EvaluationError::IndexOutOfRange { requested: 1..3, len: 2 })
        );
        assert_eq!(
            run(&doc, "/root/a[2:1]"),
            Err(EvaluationError::IndexOutOfRange { requested: 2..1, len: 2 })
        );
    }

    #[test]
    fn test_has_child() {
        let doc = fixture();
        let result = run(&doc, "/root[b]").unwrap();
        assert_eq!(result, [doc.root_element().unwrap()]);
        assert!(run(&doc, "/root[c]").unwrap().is_empty());
    }

    #[test]
    fn test_descendants_preorder_with_text() {
        let doc = Document::parse(b"<r><p>one<i>two</i></p><q/></r>").unwrap();
        let result = run(&doc, "/r//*").unwrap();
        let names: Vec<_> = result.iter().map(|&id| doc.node_name(id).unwrap()).collect();
        assert_eq!(names, ["p", "i", "q"]);

        // The descendant step itself keeps text nodes
        let compiled = compile("/r//").unwrap();
        let all = evaluate(&doc, Document::ROOT, &compiled).unwrap();
        let names: Vec<_> = all.iter().map(|&id| doc.node_name(id).unwrap()).collect();
        assert_eq!(names, ["p", "#text", "i", "#text", "q"]);
    }

    #[test]
    fn test_descendants_not_deduplicated() {
        let doc = Document::parse(b"<r><a><a/></a></r>").unwrap();
        assert_eq!(run(&doc, "//a//a").unwrap().len(), 1);
        // r and the outer a both reach the inner a
        let result = run(&doc, "//*//*").unwrap();
        let names: Vec<_> = result.iter().map(|&id| doc.node_name(id).unwrap()).collect();
        assert_eq!(names, ["a", "a", "a"]);
        assert_eq!(result[1], result[2]);
    }

    #[test]
    fn test_attribute_shorthand_and_existence() {
        let doc = Document::parse(b"<r><i id=\"1\" on=\"true\"/><i on=\"false\"/></r>").unwrap();
        assert_eq!(run(&doc, "/r/i@id").unwrap().len(), 1);
        assert_eq!(run(&doc, "/r/i@on=true").unwrap().len(), 1);
        assert_eq!(run(&doc, "/r/i[@on!=true]").unwrap().len(), 1);
    }

    #[test]
    fn test_boolean_ordering_is_inequality() {
        let doc = Document::parse(b"<r><i f=\"true\"/></r>").unwrap();
        assert!(run(&doc, "/r/i[@f>=true]").unwrap().is_empty());
        assert!(run(&doc, "/r/i[@f<=true]").unwrap().is_empty());
        assert_eq!(run(&doc, "/r/i[@f>=false]").unwrap().len(), 1);
        assert_eq!(run(&doc, "/r/i[@f=true]").unwrap().len(), 1);
    }

    #[test]
    fn test_start_node() {
        let doc = fixture();
        let root = doc.root_element().unwrap();
        let compiled = compile("/a").unwrap();
        assert_eq!(evaluate(&doc, root, &compiled).unwrap().len(), 2);
        assert_eq!(
            evaluate(&doc, 99, &compiled),
            Err(EvaluationError::UnknownNode(99))
        );
    }

    #[test]
    fn test_unknown_expression_is_noop() {
        let doc = fixture();
        assert_eq!(run(&doc, "/root/a[-]").unwrap().len(), 2);
    }
}
