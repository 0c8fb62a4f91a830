//! Query Compiler
//!
//! Turns a query string into a flat instruction stream with a single
//! left-to-right pass. The compiler keeps one pending instruction and the
//! token accumulated for it; most transitions flush that pair as an
//! [`Operation`] and start the next one. Bracket contents are collected
//! verbatim and classified when the bracket closes.

use std::fmt;
use std::ops::Range;

use tracing::{debug, trace};

use super::lexer::{classify, is_entity_name, CharClass};
use crate::error::{CompileError, CompileErrorKind, CompileState};
use crate::options::Options;

/// Instruction tag of an [`Operation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// No-op
    Null,
    /// Keep nodes with the given name
    ElementName,
    /// Replace each node by its element children
    ChildOperator,
    /// Replace each node by all of its descendants
    DescendantOperator,
    /// Keep element nodes of any name
    AnyChild,
    /// Filter by an attribute test
    AttributePredicate,
    /// Apply a bracketed [`PathExpression`]
    PathExpression,
}

impl Instruction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Instruction::Null => "null",
            Instruction::ElementName => "element",
            Instruction::ChildOperator => "child",
            Instruction::DescendantOperator => "descendant",
            Instruction::AnyChild => "anychild",
            Instruction::AttributePredicate => "attrib",
            Instruction::PathExpression => "px",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a bracket expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathExpression {
    /// `[n]`: zero-based position in the result set
    Index(usize),
    /// `[a:b]`: half-open slice of the result set
    IndexRange(Range<usize>),
    /// `[name]`: has a direct element child named `name`
    HasChildOfType(String),
    /// `[@key OP value]` or `[@key]`
    AttributeCondition(String),
    /// Anything the compiler does not recognise; evaluates as a no-op
    Unknown,
}

impl PathExpression {
    /// Classify the collected contents of a bracket expression
    pub fn classify(contents: &str) -> Self {
        let Some(first) = contents.chars().next() else {
            return PathExpression::Unknown;
        };

        if let Some(condition) = contents.strip_prefix('@') {
            return PathExpression::AttributeCondition(condition.to_string());
        }

        if classify(first) == CharClass::Digit {
            if let Ok(index) = contents.parse::<usize>() {
                return PathExpression::Index(index);
            }
            return match contents.split_once(':') {
                Some((start, end)) => match (parse_index(start), parse_index(end)) {
                    (Some(start), Some(end)) => PathExpression::IndexRange(start..end),
                    _ => PathExpression::Unknown,
                },
                None => PathExpression::Unknown,
            };
        }

        if is_entity_name(first) {
            return PathExpression::HasChildOfType(contents.to_string());
        }

        PathExpression::Unknown
    }
}

/// Digits only; rejects the sign `usize::from_str` would accept
fn parse_index(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Argument of an [`Operation`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Tag name, predicate text or the raw separator token
    Parameter(String),
    /// Classified bracket expression
    Expression(PathExpression),
}

/// One step of the instruction stream
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operation {
    pub instruction: Instruction,
    pub operand: Operand,
}

impl Operation {
    pub fn new(instruction: Instruction, parameter: impl Into<String>) -> Self {
        Operation {
            instruction,
            operand: Operand::Parameter(parameter.into()),
        }
    }

    pub fn expression(expression: PathExpression) -> Self {
        Operation {
            instruction: Instruction::PathExpression,
            operand: Operand::Expression(expression),
        }
    }

    /// Text parameter; empty for path expressions
    pub fn parameter(&self) -> &str {
        match &self.operand {
            Operand::Parameter(p) => p,
            Operand::Expression(_) => "",
        }
    }

    pub fn path_expression(&self) -> Option<&PathExpression> {
        match &self.operand {
            Operand::Expression(e) => Some(e),
            Operand::Parameter(_) => None,
        }
    }
}

/// Compiled query: the source text and its instruction stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub source: String,
    pub ops: Vec<Operation>,
}

impl CompiledQuery {
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Compile a query with default options
pub fn compile(query: &str) -> Result<CompiledQuery, CompileError> {
    compile_with(query, &Options::default())
}

/// Compile a query, logging to the configured subscriber
pub fn compile_with(query: &str, options: &Options) -> Result<CompiledQuery, CompileError> {
    options.observe(|| {
        let result = Compiler::new().run(query);
        match &result {
            Ok(compiled) => debug!(query, ops = compiled.ops.len(), "compiled query"),
            Err(err) => debug!(query, error = %err, "query failed to compile"),
        }
        result
    })
}

struct Compiler {
    ops: Vec<Operation>,
    /// Pending instruction
    current: Instruction,
    /// Token accumulated for `current`
    token: String,
    /// A backslash was just seen inside a bracket
    escaped: bool,
    /// Open quote inside a bracket; `]` and blanks are literal until it closes
    quote: Option<char>,
}

impl Compiler {
    fn new() -> Self {
        Compiler {
            ops: Vec::new(),
            current: Instruction::Null,
            token: String::new(),
            escaped: false,
            quote: None,
        }
    }

    fn run(mut self, query: &str) -> Result<CompiledQuery, CompileError> {
        let mut count = 0;
        for (index, c) in query.chars().enumerate() {
            count = index + 1;
            if self.current == Instruction::PathExpression {
                self.bracket_char(c);
            } else {
                self.path_char(c, index)?;
            }
        }

        if self.current == Instruction::PathExpression {
            return Err(self.error(
                CompileErrorKind::IncompleteExpression,
                "query ended inside a bracket expression",
                CharClass::Other,
                None,
                count,
            ));
        }
        self.flush();

        Ok(CompiledQuery {
            source: query.to_string(),
            ops: self.ops,
        })
    }

    /// Handle a character outside brackets
    fn path_char(&mut self, c: char, index: usize) -> Result<(), CompileError> {
        let class = classify(c);
        match class {
            CharClass::SquareBracket if c == ']' => {
                return Err(self.unexpected("closing bracket without an opening bracket", class, c, index));
            }
            CharClass::SquareBracket => {
                self.flush();
                self.current = Instruction::PathExpression;
            }
            CharClass::Comparison => {
                if self.current != Instruction::AttributePredicate {
                    return Err(self.unexpected(
                        "comparison outside of an attribute predicate",
                        class,
                        c,
                        index,
                    ));
                }
                self.token.push(c);
            }
            CharClass::Digit => {
                // Only meaningful as part of a predicate comparand
                if self.current == Instruction::AttributePredicate {
                    self.token.push(c);
                }
            }
            CharClass::EntityName => match self.current {
                Instruction::ElementName | Instruction::AttributePredicate => self.token.push(c),
                Instruction::Null => self.start(Instruction::ElementName, c),
                Instruction::ChildOperator | Instruction::DescendantOperator => {
                    self.flush();
                    self.start(Instruction::ElementName, c);
                }
                Instruction::AnyChild | Instruction::PathExpression => {
                    return Err(self.unexpected("name character after a wildcard", class, c, index));
                }
            },
            CharClass::Path => {
                if self.current == Instruction::ChildOperator {
                    self.token.push(c);
                    self.current = Instruction::DescendantOperator;
                } else {
                    self.flush();
                    self.start(Instruction::ChildOperator, c);
                }
            }
            CharClass::AttributeIndicator => {
                self.flush();
                self.current = Instruction::AttributePredicate;
            }
            CharClass::Any => {
                self.flush();
                self.current = Instruction::AnyChild;
            }
            CharClass::Whitespace | CharClass::Other => {
                return Err(self.unexpected("unexpected character", class, c, index));
            }
        }
        Ok(())
    }

    /// Handle a character inside brackets
    fn bracket_char(&mut self, c: char) {
        if self.escaped {
            self.escaped = false;
            if c != ']' && c != '\\' {
                self.token.push('\\');
            }
            self.token.push(c);
            return;
        }
        if let Some(quote) = self.quote {
            match c {
                '\\' => self.escaped = true,
                _ if c == quote => self.quote = None,
                _ => self.token.push(c),
            }
            return;
        }
        match c {
            '\\' => self.escaped = true,
            ' ' | '\t' if self.token.is_empty() => {}
            '"' | '\'' => self.quote = Some(c),
            ']' => {
                let expression = PathExpression::classify(&self.token);
                trace!(instruction = Instruction::PathExpression.as_str(), expression = ?expression, "emit");
                self.ops.push(Operation::expression(expression));
                self.token.clear();
                self.current = Instruction::Null;
            }
            _ => self.token.push(c),
        }
    }

    fn start(&mut self, instruction: Instruction, c: char) {
        self.current = instruction;
        self.token.clear();
        self.token.push(c);
    }

    /// Emit the pending instruction with its token and reset the token
    fn flush(&mut self) {
        let parameter = std::mem::take(&mut self.token);
        trace!(instruction = self.current.as_str(), parameter = %parameter, "emit");
        self.ops.push(Operation::new(self.current, parameter));
    }

    fn unexpected(&self, message: &str, class: CharClass, c: char, index: usize) -> CompileError {
        self.error(CompileErrorKind::UnexpectedToken, message, class, Some(c), index)
    }

    fn error(
        &self,
        kind: CompileErrorKind,
        message: &str,
        class: CharClass,
        character: Option<char>,
        index: usize,
    ) -> CompileError {
        CompileError {
            message: message.to_string(),
            kind,
            state: CompileState {
                class,
                instruction: self.current,
                token: self.token.clone(),
                character,
                index,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn op(instruction: Instruction, parameter: &str) -> Operation {
        Operation::new(instruction, parameter)
    }

    #[test]
    fn test_compile_child_path() {
        let compiled = compile("/root/a").unwrap();
        assert_eq!(compiled.source, "/root/a");
        assert_eq!(
            compiled.ops,
            [
                op(Instruction::Null, ""),
                op(Instruction::ChildOperator, "/"),
                op(Instruction::ElementName, "root"),
                op(Instruction::ChildOperator, "/"),
                op(Instruction::ElementName, "a"),
            ]
        );
    }

    #[test]
    fn test_compile_descendant_with_condition() {
        let compiled = compile("//a[@x>2]").unwrap();
        assert_eq!(
            compiled.ops,
            [
                op(Instruction::Null, ""),
                op(Instruction::DescendantOperator, "//"),
                op(Instruction::ElementName, "a"),
                Operation::expression(PathExpression::AttributeCondition("x>2".to_string())),
                op(Instruction::Null, ""),
            ]
        );
    }

    #[test]
    fn test_compile_wildcard() {
        let compiled = compile("/root/*").unwrap();
        assert_eq!(
            compiled.ops[3..],
            [op(Instruction::ChildOperator, "/"), op(Instruction::AnyChild, "")]
        );
    }

    #[test]
    fn test_compile_attribute_shorthand() {
        let compiled = compile("/item@price>=10.5").unwrap();
        assert_eq!(
            compiled.ops[2..],
            [
                op(Instruction::ElementName, "item"),
                op(Instruction::AttributePredicate, "price>=10.5"),
            ]
        );

        // A bare operator before '@' is emitted on its own
        let compiled = compile("/@id").unwrap();
        assert_eq!(
            compiled.ops,
            [
                op(Instruction::Null, ""),
                op(Instruction::ChildOperator, "/"),
                op(Instruction::AttributePredicate, "id"),
            ]
        );
    }

    #[test]
    fn test_case_is_preserved() {
        let compiled = compile("/Root@Key=Yes").unwrap();
        assert_eq!(compiled.ops[2], op(Instruction::ElementName, "Root"));
        assert_eq!(compiled.ops[3], op(Instruction::AttributePredicate, "Key=Yes"));
    }

    #[test]
    fn test_digits_outside_predicates_are_ignored() {
        let compiled = compile("/h1").unwrap();
        assert_eq!(compiled.ops[2], op(Instruction::ElementName, "h"));
    }

    #[rstest]
    #[case("0", PathExpression::Index(0))]
    #[case("12", PathExpression::Index(12))]
    #[case("0:2", PathExpression::IndexRange(0..2))]
    #[case("3:1", PathExpression::IndexRange(3..1))]
    #[case("1:2:3", PathExpression::Unknown)]
    #[case("1.5", PathExpression::Unknown)]
    #[case("1:", PathExpression::Unknown)]
    #[case("b", PathExpression::HasChildOfType("b".to_string()))]
    #[case("ns:child", PathExpression::HasChildOfType("ns:child".to_string()))]
    #[case("@x>2", PathExpression::AttributeCondition("x>2".to_string()))]
    #[case("@id", PathExpression::AttributeCondition("id".to_string()))]
    #[case("-1", PathExpression::Unknown)]
    #[case("", PathExpression::Unknown)]
    fn test_classify_bracket(#[case] contents: &str, #[case] expected: PathExpression) {
        assert_eq!(PathExpression::classify(contents), expected);
    }

    #[rstest]
    #[case("/a[ 2]", PathExpression::Index(2))]
    #[case("/a[@name='x y']", PathExpression::AttributeCondition("name=x y".to_string()))]
    #[case("/a[@v=\"1\\]\"]", PathExpression::AttributeCondition("v=1]".to_string()))]
    #[case("/a[@v=a\\\\b]", PathExpression::AttributeCondition("v=a\\b".to_string()))]
    #[case("/a[@v=a\\nb]", PathExpression::AttributeCondition("v=a\\nb".to_string()))]
    #[case("/a[@v=\"a]b\"]", PathExpression::AttributeCondition("v=a]b".to_string()))]
    #[case("/a[@v='say \"hi\"']", PathExpression::AttributeCondition("v=say \"hi\"".to_string()))]
    fn test_bracket_contents(#[case] query: &str, #[case] expected: PathExpression) {
        let compiled = compile(query).unwrap();
        assert_eq!(compiled.ops[3].path_expression(), Some(&expected));
        assert_eq!(compiled.ops[3].parameter(), "");
    }

    #[test]
    fn test_comparison_outside_predicate() {
        let err = compile("<").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UnexpectedToken);
        assert_eq!(err.position(), 1);
        assert_eq!(err.state.character, Some('<'));
        assert_eq!(err.state.class, CharClass::Comparison);
        assert_eq!(err.state.instruction, Instruction::Null);

        let err = compile("/root/a=1").unwrap_err();
        assert_eq!(err.position(), 8);
        assert_eq!(err.state.instruction, Instruction::ElementName);
        assert_eq!(err.state.token, "a");
    }

    #[rstest]
    #[case("/a b", 3, ' ')]
    #[case("/a-b", 3, '-')]
    #[case("/a]", 3, ']')]
    #[case("/*a", 3, 'a')]
    fn test_unexpected_token(#[case] query: &str, #[case] position: usize, #[case] c: char) {
        let err = compile(query).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::UnexpectedToken);
        assert_eq!(err.position(), position);
        assert_eq!(err.state.character, Some(c));
    }

    #[test]
    fn test_incomplete_bracket() {
        let err = compile("/a[@x>").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::IncompleteExpression);
        assert_eq!(err.state.character, None);
        assert_eq!(err.state.index, 6);
        assert_eq!(err.state.token, "@x>");
        assert_eq!(err.state.instruction, Instruction::PathExpression);

        let err = compile("/a[@v=\"b]").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::IncompleteExpression);
        assert_eq!(err.state.token, "@v=b]");
    }

    #[test]
    fn test_positions_count_characters() {
        let err = compile("/größe<").unwrap_err();
        assert_eq!(err.position(), 7);
    }

    #[test]
    fn test_compile_is_deterministic() {
        for query in ["/root/a", "//a[@x>2]", "/root[b]/*", "/a[0:2]@y!=3", ""] {
            assert_eq!(compile(query).unwrap(), compile(query).unwrap());
        }
    }

    #[test]
    fn test_empty_query() {
        let compiled = compile("").unwrap();
        assert_eq!(compiled.ops, [op(Instruction::Null, "")]);
    }
}
