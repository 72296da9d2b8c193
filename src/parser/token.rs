// Copyright 2025 TempoDB Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Token types for the SQL lexer
//!
//! This module defines the token types used by the SQL lexer and parser.

use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::LazyLock;

/// Position represents a position in the input source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset, starting at 0
    pub offset: usize,
    /// Line number, starting at 1
    pub line: usize,
    /// Column number, starting at 1
    pub column: usize,
}

impl Position {
    /// Create a new position
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset {}", self.offset)
    }
}

/// TokenType represents the type of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// Error token
    Error,
    /// End of input
    Eof,
    /// Identifier (table name, column name, etc.)
    Identifier,
    /// SQL keyword (SELECT, FROM, WHERE, etc.)
    Keyword,
    /// String literal ('hello')
    String,
    /// Integer number (123)
    Integer,
    /// Floating point number (123.45)
    Float,
    /// Operator (=, <, >, +, -, etc.)
    Operator,
    /// Punctuator (comma, semicolon, parentheses, dot)
    Punctuator,
    /// Comment (-- or /* */)
    Comment,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Error => write!(f, "ERROR"),
            TokenType::Eof => write!(f, "EOF"),
            TokenType::Identifier => write!(f, "IDENTIFIER"),
            TokenType::Keyword => write!(f, "KEYWORD"),
            TokenType::String => write!(f, "STRING"),
            TokenType::Integer => write!(f, "INTEGER"),
            TokenType::Float => write!(f, "FLOAT"),
            TokenType::Operator => write!(f, "OPERATOR"),
            TokenType::Punctuator => write!(f, "PUNCTUATOR"),
            TokenType::Comment => write!(f, "COMMENT"),
        }
    }
}

/// Token represents a lexical token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The type of the token
    pub token_type: TokenType,
    /// The literal string value; keywords are upper-cased, quoted
    /// identifiers are unquoted, string literals keep their quotes
    pub literal: String,
    /// The position in the source
    pub position: Position,
    /// Error message (if token_type is Error)
    pub error: Option<String>,
}

impl Token {
    /// Create a new token
    pub fn new(token_type: TokenType, literal: impl Into<String>, position: Position) -> Self {
        Self {
            token_type,
            literal: literal.into(),
            position,
            error: None,
        }
    }

    /// Create an error token
    pub fn error(
        message: impl Into<String>,
        literal: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            token_type: TokenType::Error,
            literal: literal.into(),
            position,
            error: Some(message.into()),
        }
    }

    /// Create an EOF token
    pub fn eof(position: Position) -> Self {
        Self {
            token_type: TokenType::Eof,
            literal: String::new(),
            position,
            error: None,
        }
    }

    /// Check if this is an EOF token
    pub fn is_eof(&self) -> bool {
        self.token_type == TokenType::Eof
    }

    /// Check if this is a keyword with the given value (case-insensitive)
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.token_type == TokenType::Keyword && self.literal.eq_ignore_ascii_case(keyword)
    }

    /// Check if this is an operator with the given value
    pub fn is_operator(&self, op: &str) -> bool {
        self.token_type == TokenType::Operator && self.literal == op
    }

    /// Check if this is a punctuator with the given value
    pub fn is_punctuator(&self, punct: &str) -> bool {
        self.token_type == TokenType::Punctuator && self.literal == punct
    }

    /// String literal content without the surrounding quotes
    pub fn unquoted(&self) -> &str {
        let s = self.literal.as_str();
        if self.token_type == TokenType::String && s.len() >= 2 && s.starts_with('\'') {
            &s[1..s.len() - 1]
        } else {
            s
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.token_type == TokenType::Error {
            write!(
                f,
                "{}: {} at {}",
                self.token_type,
                self.error.as_deref().unwrap_or("unknown error"),
                self.position
            )
        } else {
            write!(
                f,
                "{}: '{}' at {}",
                self.token_type, self.literal, self.position
            )
        }
    }
}

/// SQL keywords (case-insensitive). Type names are keywords too; the
/// parser lets any non-reserved keyword double as an identifier.
pub static KEYWORDS: &[&str] = &[
    "SELECT",
    "FROM",
    "WHERE",
    "INSERT",
    "INTO",
    "VALUES",
    "CREATE",
    "TABLE",
    "DROP",
    "ALTER",
    "ADD",
    "COLUMN",
    "TRUNCATE",
    "REPAIR",
    "RENAME",
    "COPY",
    "SET",
    "AND",
    "OR",
    "NOT",
    "NULL",
    "AS",
    "TO",
    "ON",
    "BY",
    "ASC",
    "DESC",
    "ORDER",
    "GROUP",
    "LIMIT",
    "JOIN",
    "INNER",
    "OUTER",
    "LEFT",
    "RIGHT",
    "CROSS",
    "TRUE",
    "FALSE",
    "CAST",
    "PARTITION",
    "SAMPLE",
    "INDEX",
    "CAPACITY",
    "CACHE",
    "NOCACHE",
    "UNION",
    "EXCEPT",
    "INTERSECT",
    "DISTINCT",
    "IN",
    "IS",
    "BETWEEN",
    "LIKE",
    // column types
    "BOOLEAN",
    "BYTE",
    "SHORT",
    "CHAR",
    "INT",
    "LONG",
    "FLOAT",
    "DOUBLE",
    "DATE",
    "TIMESTAMP",
    "STRING",
    "SYMBOL",
    "BINARY",
    "LONG256",
    // partition units
    "NONE",
    "DAY",
    "MONTH",
    "YEAR",
];

/// Compiled keyword set for O(1) lookups
static KEYWORD_SET: LazyLock<FxHashSet<&'static str>> = LazyLock::new(|| {
    let mut set = FxHashSet::with_capacity_and_hasher(KEYWORDS.len(), Default::default());
    for kw in KEYWORDS {
        set.insert(*kw);
    }
    set
});

/// Check if a string is an SQL keyword (case-insensitive)
#[inline]
pub fn is_keyword(s: &str) -> bool {
    if KEYWORD_SET.contains(s) {
        return true;
    }
    let upper = s.to_uppercase();
    KEYWORD_SET.contains(upper.as_str())
}

/// SQL operators
pub static OPERATORS: &[&str] = &[
    "=", ">", "<", ">=", "<=", "<>", "!=", "+", "-", "*", "/", "%", "||",
];

/// Compiled operator set for O(1) lookups
static OPERATOR_SET: LazyLock<FxHashSet<&'static str>> = LazyLock::new(|| {
    let mut set = FxHashSet::with_capacity_and_hasher(OPERATORS.len(), Default::default());
    for op in OPERATORS {
        set.insert(*op);
    }
    set
});

/// Check if a string is an SQL operator
#[inline]
pub fn is_operator(s: &str) -> bool {
    OPERATOR_SET.contains(s)
}

/// Control symbols the lexer always splits on, regardless of adjacency
pub static SQL_CONTROL_SYMBOLS: &[&str] = &["(", ";", ")", ",", "/*", "*/", "--"];

/// SQL punctuators
pub static PUNCTUATORS: &[char] = &[',', ';', '(', ')', '.'];

/// Check if a character is an SQL punctuator
pub fn is_punctuator(c: char) -> bool {
    PUNCTUATORS.contains(&c)
}

/// Characters that can be part of an operator
pub fn is_operator_char(c: char) -> bool {
    matches!(c, '=' | '<' | '>' | '!' | '+' | '-' | '*' | '/' | '%' | '|')
}
