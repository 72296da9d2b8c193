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

//! SQL Lexer (Tokenizer)
//!
//! Byte-offset positions, single-token pushback (`unparse`) for the
//! compiler's keyword dispatch, and `restart` for the retry loop.

use super::token::{
    is_keyword, is_operator, is_operator_char, is_punctuator, Position, Token, TokenType,
};

/// SQL Lexer for tokenizing input
pub struct Lexer {
    /// Input string
    input: Vec<char>,
    /// Byte offset of each character in `input`
    offsets: Vec<usize>,
    /// Current position in input (points to current char)
    position: usize,
    /// Current reading position in input (after current char)
    read_position: usize,
    /// Current character under examination
    ch: char,
    /// Current position tracking
    pos: Position,
    /// Token handed back via `unparse`, re-delivered before lexing resumes
    pushed_back: Option<Token>,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let mut chars = Vec::with_capacity(input.len());
        let mut offsets = Vec::with_capacity(input.len());
        for (offset, ch) in input.char_indices() {
            chars.push(ch);
            offsets.push(offset);
        }
        let mut lexer = Self {
            input: chars,
            offsets,
            position: 0,
            read_position: 0,
            ch: '\0',
            pos: Position::new(0, 1, 1),
            pushed_back: None,
        };
        lexer.read_char();
        lexer
    }

    /// Rewind to the beginning of the input, dropping any pushback
    pub fn restart(&mut self) {
        self.position = 0;
        self.read_position = 0;
        self.ch = '\0';
        self.pos = Position::new(0, 1, 1);
        self.pushed_back = None;
        self.read_char();
    }

    /// Hand a token back; the next `next_token` call returns it again
    pub fn unparse(&mut self, token: Token) {
        self.pushed_back = Some(token);
    }

    /// Read the next character
    fn read_char(&mut self) {
        if self.ch == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else if self.ch != '\0' {
            self.pos.column += 1;
        }

        if self.read_position >= self.input.len() {
            self.ch = '\0';
            self.pos.offset = self.offsets.last().map_or(0, |o| o + 1);
        } else {
            self.ch = self.input[self.read_position];
            self.position = self.read_position;
            self.read_position += 1;
            self.pos.offset = self.offsets[self.position];
        }
    }

    /// Peek at the next character without advancing
    fn peek_char(&self) -> char {
        if self.read_position >= self.input.len() {
            '\0'
        } else {
            self.input[self.read_position]
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        if let Some(token) = self.pushed_back.take() {
            return token;
        }

        self.skip_whitespace();

        let pos = self.pos;

        match self.ch {
            '\0' => Token::eof(pos),

            // String literal (single quotes)
            '\'' => match self.read_string_literal() {
                Ok(literal) => Token::new(TokenType::String, literal, pos),
                Err(partial) => Token::error("unterminated string literal", partial, pos),
            },

            // Double-quoted identifier
            '"' => match self.read_quoted_identifier() {
                Ok(literal) => Token::new(TokenType::Identifier, literal, pos),
                Err(partial) => Token::error("unterminated quoted identifier", partial, pos),
            },

            // Number literal
            c if c.is_ascii_digit() => {
                let literal = self.read_number();
                if literal.contains('.') || literal.contains('e') || literal.contains('E') {
                    Token::new(TokenType::Float, literal, pos)
                } else {
                    Token::new(TokenType::Integer, literal, pos)
                }
            }

            // Single line comment (--)
            '-' if self.peek_char() == '-' => {
                let literal = self.read_line_comment();
                Token::new(TokenType::Comment, literal, pos)
            }

            // Multi-line comment
            '/' if self.peek_char() == '*' => {
                let literal = self.read_block_comment();
                Token::new(TokenType::Comment, literal, pos)
            }

            // Punctuator
            c if is_punctuator(c) => {
                self.read_char();
                Token::new(TokenType::Punctuator, c.to_string(), pos)
            }

            // Operator
            c if is_operator_char(c) => {
                let literal = self.read_operator();
                Token::new(TokenType::Operator, literal, pos)
            }

            // Identifier or keyword
            c if c.is_alphabetic() || c == '_' => {
                let literal = self.read_identifier();
                if is_keyword(&literal) {
                    Token::new(TokenType::Keyword, literal.to_uppercase(), pos)
                } else {
                    Token::new(TokenType::Identifier, literal, pos)
                }
            }

            // Unrecognized character
            c => {
                self.read_char();
                Token::error(
                    format!("unrecognized character: {:?}", c),
                    c.to_string(),
                    pos,
                )
            }
        }
    }

    /// Get the next non-comment token, or None at end of input
    pub fn next_significant(&mut self) -> Option<Token> {
        loop {
            let token = self.next_token();
            match token.token_type {
                TokenType::Comment => continue,
                TokenType::Eof => return None,
                _ => return Some(token),
            }
        }
    }

    /// Position just past the last consumed character
    pub fn current_position(&self) -> usize {
        self.pos.offset
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while self.ch.is_whitespace() {
            self.read_char();
        }
    }

    /// Read an identifier, including digits, underscores and $
    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        result.push(self.ch);
        self.read_char();

        while self.ch.is_alphanumeric() || self.ch == '_' || self.ch == '$' {
            result.push(self.ch);
            self.read_char();
        }

        result
    }

    /// Read a number (integer or float)
    fn read_number(&mut self) -> String {
        let mut result = String::new();
        result.push(self.ch);
        self.read_char();

        while self.ch.is_ascii_digit() {
            result.push(self.ch);
            self.read_char();
        }

        if self.ch == '.' && self.peek_char().is_ascii_digit() {
            result.push(self.ch);
            self.read_char();
            while self.ch.is_ascii_digit() {
                result.push(self.ch);
                self.read_char();
            }
        }

        if self.ch == 'e' || self.ch == 'E' {
            result.push(self.ch);
            self.read_char();
            if self.ch == '+' || self.ch == '-' {
                result.push(self.ch);
                self.read_char();
            }
            while self.ch.is_ascii_digit() {
                result.push(self.ch);
                self.read_char();
            }
        }

        result
    }

    /// Read a single-quoted string literal; doubled quotes escape.
    /// The returned literal keeps its surrounding quotes.
    fn read_string_literal(&mut self) -> Result<String, String> {
        let mut result = String::new();
        result.push('\'');
        self.read_char(); // consume opening quote

        loop {
            if self.ch == '\0' {
                return Err(result);
            } else if self.ch == '\'' {
                if self.peek_char() == '\'' {
                    result.push('\'');
                    self.read_char();
                    self.read_char();
                } else {
                    result.push('\'');
                    self.read_char();
                    return Ok(result);
                }
            } else {
                result.push(self.ch);
                self.read_char();
            }
        }
    }

    /// Read a double-quoted identifier; doubled quotes escape
    fn read_quoted_identifier(&mut self) -> Result<String, String> {
        let mut result = String::new();
        self.read_char(); // consume opening quote

        while self.ch != '\0' {
            if self.ch == '"' && self.peek_char() == '"' {
                result.push('"');
                self.read_char();
                self.read_char();
            } else if self.ch == '"' {
                self.read_char();
                return Ok(result);
            } else {
                result.push(self.ch);
                self.read_char();
            }
        }

        Err(result)
    }

    /// Read a single-line comment (--)
    fn read_line_comment(&mut self) -> String {
        let mut result = String::new();
        while self.ch != '\n' && self.ch != '\0' {
            result.push(self.ch);
            self.read_char();
        }
        result
    }

    /// Read a block comment (/* ... */)
    fn read_block_comment(&mut self) -> String {
        let mut result = String::new();
        result.push(self.ch); // /
        self.read_char();
        result.push(self.ch); // *
        self.read_char();

        while !(self.ch == '*' && self.peek_char() == '/') && self.ch != '\0' {
            result.push(self.ch);
            self.read_char();
        }

        if self.ch != '\0' {
            result.push(self.ch);
            self.read_char();
            result.push(self.ch);
            self.read_char();
        }

        result
    }

    /// Read an operator, preferring the longest match
    fn read_operator(&mut self) -> String {
        let mut result = String::new();
        let first_char = self.ch;
        result.push(first_char);
        self.read_char();

        if self.ch != '\0' {
            let two_chars: String = [first_char, self.ch].iter().collect();
            if is_operator(&two_chars) {
                result.push(self.ch);
                self.read_char();
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_select() {
        let mut lexer = Lexer::new("SELECT * FROM trades");

        let token = lexer.next_token();
        assert_eq!(token.token_type, TokenType::Keyword);
        assert_eq!(token.literal, "SELECT");

        let token = lexer.next_token();
        assert_eq!(token.token_type, TokenType::Operator);
        assert_eq!(token.literal, "*");

        let token = lexer.next_token();
        assert_eq!(token.token_type, TokenType::Keyword);
        assert_eq!(token.literal, "FROM");

        let token = lexer.next_token();
        assert_eq!(token.token_type, TokenType::Identifier);
        assert_eq!(token.literal, "trades");

        assert!(lexer.next_token().is_eof());
    }

    #[test]
    fn test_byte_offsets() {
        let mut lexer = Lexer::new("INSERT INTO t VALUES (3.5)");
        let mut offsets = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.is_eof() {
                break;
            }
            offsets.push((token.literal.clone(), token.position.offset));
        }
        assert!(offsets.contains(&("3.5".to_string(), 22)));
        assert!(offsets.contains(&("t".to_string(), 12)));
    }

    #[test]
    fn test_numbers() {
        let mut lexer = Lexer::new("123 45.67 3.14e10");
        assert_eq!(lexer.next_token().token_type, TokenType::Integer);
        assert_eq!(lexer.next_token().token_type, TokenType::Float);
        assert_eq!(lexer.next_token().token_type, TokenType::Float);
    }

    #[test]
    fn test_string_literals_keep_quotes() {
        let mut lexer = Lexer::new("'hello' 'it''s'");
        let token = lexer.next_token();
        assert_eq!(token.literal, "'hello'");
        assert_eq!(token.unquoted(), "hello");
        let token = lexer.next_token();
        assert_eq!(token.literal, "'it's'");
    }

    #[test]
    fn test_quoted_identifiers() {
        let mut lexer = Lexer::new("\"table name\"");
        let token = lexer.next_token();
        assert_eq!(token.token_type, TokenType::Identifier);
        assert_eq!(token.literal, "table name");
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("'oops");
        let token = lexer.next_token();
        assert_eq!(token.token_type, TokenType::Error);
    }

    #[test]
    fn test_comments_and_significant() {
        let mut lexer = Lexer::new("-- leading\nSELECT /* x */ 1");
        let token = lexer.next_significant().unwrap();
        assert_eq!(token.literal, "SELECT");
        let token = lexer.next_significant().unwrap();
        assert_eq!(token.literal, "1");
        assert!(lexer.next_significant().is_none());
    }

    #[test]
    fn test_unparse() {
        let mut lexer = Lexer::new("create table x");
        let token = lexer.next_token();
        assert_eq!(token.literal, "CREATE");
        lexer.unparse(token);
        let token = lexer.next_token();
        assert_eq!(token.literal, "CREATE");
        assert_eq!(lexer.next_token().literal, "TABLE");
    }

    #[test]
    fn test_restart() {
        let mut lexer = Lexer::new("drop table x");
        assert_eq!(lexer.next_token().literal, "DROP");
        assert_eq!(lexer.next_token().literal, "TABLE");
        lexer.restart();
        assert_eq!(lexer.next_token().literal, "DROP");
    }

    #[test]
    fn test_operators() {
        let mut lexer = Lexer::new("= <> >= <= != + - * / % ||");
        let expected = ["=", "<>", ">=", "<=", "!=", "+", "-", "*", "/", "%", "||"];
        for exp in expected {
            let token = lexer.next_token();
            assert_eq!(token.token_type, TokenType::Operator);
            assert_eq!(token.literal, exp);
        }
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let mut lexer = Lexer::new("truncate TRUNCATE Truncate");
        for _ in 0..3 {
            let token = lexer.next_token();
            assert_eq!(token.token_type, TokenType::Keyword);
            assert_eq!(token.literal, "TRUNCATE");
        }
    }
}
