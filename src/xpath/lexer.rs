//! Query Lexer
//!
//! Classifies query characters. The compiler works one Unicode scalar at a
//! time and decides what to do from the class alone.

use std::fmt;

/// Classification of a single query character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    /// Alphabetic, `:` or `_`
    EntityName,
    /// `=`, `<`, `>` or `!`
    Comparison,
    /// ASCII digit or `.`
    Digit,
    /// `/`
    Path,
    /// `[` or `]`
    SquareBracket,
    /// `@`
    AttributeIndicator,
    /// `*`
    Any,
    /// Space, tab, `"` or `'`
    Whitespace,
    /// Anything else
    Other,
}

impl CharClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CharClass::EntityName => "entity name",
            CharClass::Comparison => "comparison",
            CharClass::Digit => "digit",
            CharClass::Path => "path",
            CharClass::SquareBracket => "square bracket",
            CharClass::AttributeIndicator => "attribute indicator",
            CharClass::Any => "wildcard",
            CharClass::Whitespace => "whitespace",
            CharClass::Other => "other",
        }
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a query character
#[inline]
pub fn classify(c: char) -> CharClass {
    match c {
        ':' | '_' => CharClass::EntityName,
        '=' | '<' | '>' | '!' => CharClass::Comparison,
        '@' => CharClass::AttributeIndicator,
        '0'..='9' | '.' => CharClass::Digit,
        '/' => CharClass::Path,
        '[' | ']' => CharClass::SquareBracket,
        '*' => CharClass::Any,
        ' ' | '\t' | '"' | '\'' => CharClass::Whitespace,
        c if c.is_alphabetic() => CharClass::EntityName,
        _ => CharClass::Other,
    }
}

/// True for characters that may start or continue an element name
#[inline]
pub fn is_entity_name(c: char) -> bool {
    classify(c) == CharClass::EntityName
}
