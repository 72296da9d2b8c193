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

//! SQL Parser
//!
//! Pratt parsing for expressions, recursive descent for statements. The
//! parser consumes a [`Lexer`] and allocates expression nodes out of the
//! per-compile arena, producing a typed [`ExecutionModel`].

use std::collections::HashSet;
use std::sync::LazyLock;

use super::ast::*;
use super::lexer::Lexer;
use super::pool::{ExprId, ExprPool};
use super::precedence::Precedence;
use super::token::{Token, TokenType};
use crate::core::error::{Error, Result};
use crate::core::types::{ColumnType, PartitionBy};

/// Reserved SQL keywords that can never be used as identifiers
static RESERVED_KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "SELECT", "FROM", "WHERE", "INSERT", "INTO", "VALUES", "CREATE", "TABLE", "DROP", "ALTER",
        "ADD", "AND", "OR", "NOT", "NULL", "AS", "ON", "JOIN", "INNER", "OUTER", "LEFT", "RIGHT",
        "CROSS", "ORDER", "GROUP", "BY", "LIMIT", "UNION", "EXCEPT", "INTERSECT", "DISTINCT",
        "CAST", "TRUNCATE", "REPAIR", "RENAME", "COPY", "SET", "IN", "IS", "BETWEEN", "LIKE",
        "TRUE", "FALSE",
    ]
    .into_iter()
    .collect()
});

/// SQL parser building execution models out of a token stream
pub struct Parser<'a> {
    lexer: Lexer,
    cur_token: Token,
    peek_token: Token,
    pool: &'a mut ExprPool,
}

impl<'a> Parser<'a> {
    /// Create a parser over a primed lexer; the lexer may already have a
    /// token pushed back by the compiler's keyword dispatch
    pub fn new(mut lexer: Lexer, pool: &'a mut ExprPool) -> Self {
        let cur_token = Self::fetch(&mut lexer);
        let peek_token = Self::fetch(&mut lexer);
        Parser {
            lexer,
            cur_token,
            peek_token,
            pool,
        }
    }

    fn fetch(lexer: &mut Lexer) -> Token {
        loop {
            let token = lexer.next_token();
            if token.token_type != TokenType::Comment {
                return token;
            }
        }
    }

    /// Parse one statement into an execution model
    pub fn parse(mut self) -> Result<ExecutionModel> {
        self.check_lex_error()?;
        let model = if self.cur_token.is_keyword("SELECT") {
            ExecutionModel::Query(self.parse_query_model()?)
        } else if self.cur_token.is_keyword("CREATE") {
            ExecutionModel::CreateTable(self.parse_create_table()?)
        } else if self.cur_token.is_keyword("INSERT") {
            ExecutionModel::Insert(self.parse_insert()?)
        } else if self.cur_token.is_keyword("COPY") {
            ExecutionModel::Copy(self.parse_copy()?)
        } else if self.cur_token.is_keyword("RENAME") {
            ExecutionModel::Rename(self.parse_rename()?)
        } else {
            return Err(Error::syntax(
                self.cur_token.position.offset,
                format!("unexpected token: {}", self.cur_token.literal),
            ));
        };

        // nothing but a trailing semicolon may follow the statement
        if self.peek_token.is_punctuator(";") {
            self.next_token();
        }
        if !self.peek_token.is_eof() {
            return Err(Error::syntax(
                self.peek_token.position.offset,
                format!("unexpected token: {}", self.peek_token.literal),
            ));
        }
        Ok(model)
    }

    // =========================================================================
    // Token plumbing
    // =========================================================================

    fn next_token(&mut self) {
        self.cur_token = std::mem::replace(&mut self.peek_token, Self::fetch(&mut self.lexer));
    }

    fn check_lex_error(&self) -> Result<()> {
        for token in [&self.cur_token, &self.peek_token] {
            if token.token_type == TokenType::Error {
                return Err(Error::syntax(
                    token.position.offset,
                    token
                        .error
                        .clone()
                        .unwrap_or_else(|| "invalid token".to_string()),
                ));
            }
        }
        Ok(())
    }

    /// Check if a keyword is reserved and cannot be used as an identifier
    fn is_reserved_keyword(keyword: &str) -> bool {
        RESERVED_KEYWORDS.contains(keyword.to_uppercase().as_str())
    }

    fn token_is_identifier_like(token: &Token) -> bool {
        match token.token_type {
            TokenType::Identifier => true,
            TokenType::Keyword => !Self::is_reserved_keyword(&token.literal),
            _ => false,
        }
    }

    /// Consume the next token, which must be the given keyword
    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        self.next_token();
        self.check_lex_error()?;
        if self.cur_token.is_keyword(keyword) {
            Ok(())
        } else {
            Err(Error::syntax(
                self.cur_token.position.offset,
                format!("'{}' expected", keyword.to_lowercase()),
            ))
        }
    }

    /// Consume the next token, which must be the given punctuator
    fn expect_punctuator(&mut self, punct: &str) -> Result<()> {
        self.next_token();
        self.check_lex_error()?;
        if self.cur_token.is_punctuator(punct) {
            Ok(())
        } else {
            Err(Error::syntax(
                self.cur_token.position.offset,
                format!("'{}' expected", punct),
            ))
        }
    }

    /// Consume the next token, which must be usable as an identifier
    fn expect_identifier(&mut self, what: &str) -> Result<(String, usize)> {
        self.next_token();
        self.check_lex_error()?;
        if Self::token_is_identifier_like(&self.cur_token) {
            Ok((
                self.cur_token.literal.clone(),
                self.cur_token.position.offset,
            ))
        } else {
            Err(Error::syntax(
                self.cur_token.position.offset,
                format!("{} expected", what),
            ))
        }
    }

    // =========================================================================
    // Expressions (Pratt)
    // =========================================================================

    /// Parse the expression starting at the *next* token; on return the
    /// current token is the last token of the expression
    fn parse_expression(&mut self) -> Result<ExprId> {
        self.next_token();
        self.parse_expr_bp(Precedence::Lowest)
    }

    /// Parse the expression starting at the current token
    fn parse_expr_bp(&mut self, precedence: Precedence) -> Result<ExprId> {
        self.check_lex_error()?;
        let mut left = self.parse_prefix()?;

        while precedence < self.peek_precedence() {
            self.next_token();
            left = self.parse_infix(left)?;
        }

        Ok(left)
    }

    fn peek_precedence(&self) -> Precedence {
        match self.peek_token.token_type {
            TokenType::Operator => Precedence::for_operator(&self.peek_token.literal),
            TokenType::Keyword => Precedence::for_operator(&self.peek_token.literal),
            _ => Precedence::Lowest,
        }
    }

    fn parse_prefix(&mut self) -> Result<ExprId> {
        let pos = self.cur_token.position.offset;
        match self.cur_token.token_type {
            TokenType::Integer | TokenType::Float | TokenType::String => Ok(self
                .pool
                .alloc(ExpressionNode::constant(self.cur_token.literal.clone(), pos))),
            TokenType::Keyword
                if self.cur_token.is_keyword("TRUE")
                    || self.cur_token.is_keyword("FALSE")
                    || self.cur_token.is_keyword("NULL") =>
            {
                Ok(self.pool.alloc(ExpressionNode::constant(
                    self.cur_token.literal.to_lowercase(),
                    pos,
                )))
            }
            TokenType::Keyword if self.cur_token.is_keyword("NOT") => {
                self.next_token();
                let operand = self.parse_expr_bp(Precedence::Prefix)?;
                Ok(self.pool.alloc(ExpressionNode::unary("not", pos, operand)))
            }
            TokenType::Operator if self.cur_token.literal == "-" => {
                self.next_token();
                let operand = self.parse_expr_bp(Precedence::Prefix)?;
                Ok(self.pool.alloc(ExpressionNode::unary("-", pos, operand)))
            }
            TokenType::Punctuator if self.cur_token.literal == "(" => {
                self.next_token();
                let inner = self.parse_expr_bp(Precedence::Lowest)?;
                self.expect_punctuator(")")?;
                Ok(inner)
            }
            _ if Self::token_is_identifier_like(&self.cur_token) => {
                let name = self.cur_token.literal.clone();
                if self.peek_token.is_punctuator("(") {
                    self.next_token(); // onto '('
                    let args = self.parse_call_arguments()?;
                    Ok(self.pool.alloc(ExpressionNode::function(
                        name.to_lowercase(),
                        pos,
                        args,
                    )))
                } else if self.peek_token.is_punctuator(".") {
                    self.next_token(); // onto '.'
                    let (column, _) = self.expect_identifier("column name")?;
                    Ok(self
                        .pool
                        .alloc(ExpressionNode::literal(format!("{}.{}", name, column), pos)))
                } else {
                    Ok(self.pool.alloc(ExpressionNode::literal(name, pos)))
                }
            }
            _ => Err(Error::syntax(
                pos,
                format!("unexpected token: {}", self.cur_token.literal),
            )),
        }
    }

    /// Current token is '('; consume through the matching ')'
    fn parse_call_arguments(&mut self) -> Result<Vec<ExprId>> {
        let mut args = Vec::new();
        if self.peek_token.is_punctuator(")") {
            self.next_token();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            self.next_token();
            if self.cur_token.is_punctuator(")") {
                return Ok(args);
            }
            if !self.cur_token.is_punctuator(",") {
                return Err(Error::syntax(
                    self.cur_token.position.offset,
                    "',' or ')' expected",
                ));
            }
        }
    }

    fn parse_infix(&mut self, left: ExprId) -> Result<ExprId> {
        let op = self.cur_token.literal.to_lowercase();
        let pos = self.cur_token.position.offset;
        let precedence = Precedence::for_operator(&op);
        self.next_token();
        let right = self.parse_expr_bp(precedence)?;
        Ok(self.pool.alloc(ExpressionNode::binary(op, pos, left, right)))
    }

    // =========================================================================
    // SELECT
    // =========================================================================

    /// Parse a SELECT; the current token is the SELECT keyword
    fn parse_query_model(&mut self) -> Result<QueryModel> {
        let mut model = QueryModel {
            position: self.cur_token.position.offset,
            ..QueryModel::default()
        };

        // projection; a lone * means all columns
        if self.peek_token.is_operator("*") {
            self.next_token();
        } else {
            loop {
                let ast = self.parse_expression()?;
                let position = self.pool.get(ast).position;
                let mut alias = None;
                if self.peek_token.is_keyword("AS") {
                    self.next_token();
                    let (name, _) = self.expect_identifier("alias")?;
                    alias = Some(name);
                } else if self.peek_token.token_type == TokenType::Identifier {
                    self.next_token();
                    alias = Some(self.cur_token.literal.clone());
                }
                model.columns.push(QueryColumn {
                    alias,
                    ast,
                    position,
                });
                if self.peek_token.is_punctuator(",") {
                    self.next_token();
                } else {
                    break;
                }
            }
        }

        self.expect_keyword("FROM")?;

        // source: table name or nested query
        if self.peek_token.is_punctuator("(") {
            self.next_token();
            self.expect_keyword("SELECT")?;
            let nested = self.parse_query_model()?;
            self.expect_punctuator(")")?;
            model.nested = Some(Box::new(nested));
        } else {
            let (name, position) = self.expect_identifier("table name or sub-query")?;
            model.table = Some(TableRef { name, position });
        }
        if Self::token_is_identifier_like(&self.peek_token) && !self.peek_is_clause_keyword() {
            self.next_token();
            model.alias = Some(self.cur_token.literal.clone());
        }

        // joins
        loop {
            let (kind, position) = if self.peek_token.is_keyword("JOIN") {
                self.next_token();
                (JoinKind::Inner, self.cur_token.position.offset)
            } else if self.peek_token.is_keyword("INNER") {
                self.next_token();
                let position = self.cur_token.position.offset;
                self.expect_keyword("JOIN")?;
                (JoinKind::Inner, position)
            } else if self.peek_token.is_keyword("CROSS") {
                self.next_token();
                let position = self.cur_token.position.offset;
                self.expect_keyword("JOIN")?;
                (JoinKind::Cross, position)
            } else if self.peek_token.is_keyword("LEFT")
                || self.peek_token.is_keyword("RIGHT")
                || self.peek_token.is_keyword("OUTER")
            {
                return Err(Error::not_supported(
                    self.peek_token.position.offset,
                    format!("{} joins are not supported", self.peek_token.literal),
                ));
            } else {
                break;
            };

            let (name, table_position) = self.expect_identifier("table name")?;
            let mut alias = None;
            if Self::token_is_identifier_like(&self.peek_token)
                && !self.peek_is_clause_keyword()
                && !self.peek_token.is_keyword("ON")
            {
                self.next_token();
                alias = Some(self.cur_token.literal.clone());
            }
            let on = match kind {
                JoinKind::Inner => {
                    self.expect_keyword("ON")?;
                    Some(self.parse_expression()?)
                }
                JoinKind::Cross => None,
            };
            model.joins.push(JoinModel {
                kind,
                table: TableRef {
                    name,
                    position: table_position,
                },
                alias,
                on,
                position,
            });
        }

        if self.peek_token.is_keyword("WHERE") {
            self.next_token();
            model.where_clause = Some(self.parse_expression()?);
        }

        if self.peek_token.is_keyword("GROUP") {
            self.next_token();
            self.expect_keyword("BY")?;
            loop {
                model.group_by.push(self.parse_expression()?);
                if self.peek_token.is_punctuator(",") {
                    self.next_token();
                } else {
                    break;
                }
            }
        }

        if self.peek_token.is_keyword("SAMPLE") {
            self.next_token();
            self.expect_keyword("BY")?;
            model.sample_by = Some(self.parse_expression()?);
        }

        if self.peek_token.is_keyword("ORDER") {
            self.next_token();
            self.expect_keyword("BY")?;
            loop {
                let expr = self.parse_expression()?;
                let mut descending = false;
                if self.peek_token.is_keyword("DESC") {
                    self.next_token();
                    descending = true;
                } else if self.peek_token.is_keyword("ASC") {
                    self.next_token();
                }
                model.order_by.push(OrderByItem { expr, descending });
                if self.peek_token.is_punctuator(",") {
                    self.next_token();
                } else {
                    break;
                }
            }
        }

        if self.peek_token.is_keyword("LIMIT") {
            self.next_token();
            model.limit = Some(self.parse_expression()?);
        }

        if self.peek_token.is_keyword("UNION")
            || self.peek_token.is_keyword("EXCEPT")
            || self.peek_token.is_keyword("INTERSECT")
        {
            return Err(Error::not_supported(
                self.peek_token.position.offset,
                format!("{} is not supported", self.peek_token.literal),
            ));
        }

        Ok(model)
    }

    fn peek_is_clause_keyword(&self) -> bool {
        const CLAUSES: &[&str] = &[
            "WHERE", "GROUP", "SAMPLE", "ORDER", "LIMIT", "JOIN", "INNER", "CROSS", "LEFT",
            "RIGHT", "OUTER", "ON", "UNION", "EXCEPT", "INTERSECT", "TIMESTAMP", "PARTITION",
        ];
        self.peek_token.token_type == TokenType::Keyword
            && CLAUSES
                .iter()
                .any(|c| self.peek_token.literal.eq_ignore_ascii_case(c))
    }

    // =========================================================================
    // CREATE TABLE
    // =========================================================================

    /// Parse CREATE TABLE; the current token is the CREATE keyword
    fn parse_create_table(&mut self) -> Result<CreateTableModel> {
        self.expect_keyword("TABLE")?;
        let (name, name_position) = self.expect_identifier("table name")?;

        let mut model = CreateTableModel {
            name,
            name_position,
            ..CreateTableModel::default()
        };

        if self.peek_token.is_keyword("AS") {
            self.next_token();
            self.expect_punctuator("(")?;
            self.expect_keyword("SELECT")?;
            let query = self.parse_query_model()?;
            self.expect_punctuator(")")?;
            model.query = Some(Box::new(query));

            while self.peek_token.is_punctuator(",") {
                self.next_token();
                self.expect_keyword("CAST")?;
                let cast = self.parse_column_cast()?;
                let key = cast.column_name.to_lowercase();
                if model.cast_models.insert(key, cast).is_some() {
                    return Err(Error::syntax(
                        self.cur_token.position.offset,
                        "duplicate cast",
                    ));
                }
            }
        } else {
            self.expect_punctuator("(")?;
            self.parse_create_columns(&mut model)?;
        }

        if self.peek_token.is_keyword("TIMESTAMP") {
            self.next_token();
            self.expect_punctuator("(")?;
            let (column, position) = self.expect_identifier("column name")?;
            self.expect_punctuator(")")?;
            model.timestamp = Some(TableRef {
                name: column,
                position,
            });
        }

        if self.peek_token.is_keyword("PARTITION") {
            self.next_token();
            self.expect_keyword("BY")?;
            self.next_token();
            model.partition_by = self
                .cur_token
                .literal
                .parse::<PartitionBy>()
                .map_err(|_| {
                    Error::syntax(
                        self.cur_token.position.offset,
                        "'NONE', 'DAY', 'MONTH' or 'YEAR' expected",
                    )
                })?;
        }

        // column-list creation validates the timestamp reference up front
        if model.query.is_none() {
            if let Some(ref ts) = model.timestamp {
                match model
                    .columns
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(&ts.name))
                {
                    None => return Err(Error::invalid_column(ts.position, &ts.name)),
                    Some(c) if c.ty != ColumnType::Timestamp => {
                        return Err(Error::semantic(
                            ts.position,
                            format!("TIMESTAMP column expected [actual={}]", c.ty),
                        ))
                    }
                    _ => {}
                }
            }
        }

        Ok(model)
    }

    /// Parse the body of a column-list CREATE; current token is '('
    fn parse_create_columns(&mut self, model: &mut CreateTableModel) -> Result<()> {
        loop {
            // index(col [capacity n]) entries may be mixed into the list
            if self.peek_token.is_keyword("INDEX") {
                self.next_token();
                self.expect_punctuator("(")?;
                let (column, position) = self.expect_identifier("column name")?;
                let capacity = if self.peek_token.is_keyword("CAPACITY") {
                    self.next_token();
                    Some(self.expect_numeric_capacity()?)
                } else {
                    None
                };
                self.expect_punctuator(")")?;
                let target = model
                    .columns
                    .iter_mut()
                    .find(|c| c.name.eq_ignore_ascii_case(&column))
                    .ok_or_else(|| Error::invalid_column(position, &column))?;
                if target.ty != ColumnType::Symbol {
                    return Err(Error::semantic(
                        position,
                        "indexes are supported only for SYMBOL columns",
                    ));
                }
                target.indexed = true;
                target.index_block_capacity = capacity;
            } else {
                let (name, position) = self.expect_identifier("column name")?;
                if model
                    .columns
                    .iter()
                    .any(|c| c.name.eq_ignore_ascii_case(&name))
                {
                    return Err(Error::syntax(position, "duplicate column"));
                }
                let column = self.parse_column_type(name, position)?;
                model.columns.push(column);
            }

            self.next_token();
            if self.cur_token.is_punctuator(")") {
                return Ok(());
            }
            if !self.cur_token.is_punctuator(",") {
                return Err(Error::syntax(self.cur_token.position.offset, "',' expected"));
            }
        }
    }

    /// Parse `<type> [symbol-options]` after a column name
    fn parse_column_type(&mut self, name: String, position: usize) -> Result<CreateColumnModel> {
        self.next_token();
        let type_position = self.cur_token.position.offset;
        let ty = ColumnType::by_name(&self.cur_token.literal)
            .ok_or_else(|| Error::syntax(type_position, "unsupported column type"))?;

        let mut column = CreateColumnModel {
            name,
            position,
            ty,
            type_position,
            symbol_capacity: None,
            symbol_cache: None,
            indexed: false,
            index_block_capacity: None,
        };

        if ty == ColumnType::Symbol {
            if self.peek_token.is_keyword("CAPACITY") {
                self.next_token();
                let capacity = self.expect_numeric_capacity()?;
                crate::core::types::validate_symbol_capacity(
                    self.cur_token.position.offset,
                    capacity,
                )?;
                column.symbol_capacity = Some(capacity);
            }
            if self.peek_token.is_keyword("CACHE") {
                self.next_token();
                column.symbol_cache = Some(true);
            } else if self.peek_token.is_keyword("NOCACHE") {
                self.next_token();
                column.symbol_cache = Some(false);
            }
            if self.peek_token.is_keyword("INDEX") {
                self.next_token();
                column.indexed = true;
                if self.peek_token.is_keyword("CAPACITY") {
                    self.next_token();
                    column.index_block_capacity = Some(self.expect_numeric_capacity()?);
                }
            }
        } else if self.peek_token.is_keyword("CAPACITY")
            || self.peek_token.is_keyword("CACHE")
            || self.peek_token.is_keyword("NOCACHE")
            || self.peek_token.is_keyword("INDEX")
        {
            return Err(Error::semantic(
                self.peek_token.position.offset,
                format!(
                    "'{}' is supported only for SYMBOL columns",
                    self.peek_token.literal.to_lowercase()
                ),
            ));
        }

        Ok(column)
    }

    /// Parse `CAST ( column AS type [CAPACITY n] [CACHE|NOCACHE] )`;
    /// current token is the CAST keyword
    fn parse_column_cast(&mut self) -> Result<ColumnCastModel> {
        self.expect_punctuator("(")?;
        let (column_name, name_position) = self.expect_identifier("column name")?;
        self.expect_keyword("AS")?;
        self.next_token();
        let type_position = self.cur_token.position.offset;
        let ty = ColumnType::by_name(&self.cur_token.literal)
            .ok_or_else(|| Error::syntax(type_position, "unsupported column type"))?;

        let mut cast = ColumnCastModel {
            column_name,
            name_position,
            ty,
            type_position,
            symbol_capacity: None,
            symbol_cache: None,
        };

        if ty == ColumnType::Symbol {
            if self.peek_token.is_keyword("CAPACITY") {
                self.next_token();
                let capacity = self.expect_numeric_capacity()?;
                crate::core::types::validate_symbol_capacity(
                    self.cur_token.position.offset,
                    capacity,
                )?;
                cast.symbol_capacity = Some(capacity);
            }
            if self.peek_token.is_keyword("CACHE") {
                self.next_token();
                cast.symbol_cache = Some(true);
            } else if self.peek_token.is_keyword("NOCACHE") {
                self.next_token();
                cast.symbol_cache = Some(false);
            }
        }

        self.expect_punctuator(")")?;
        Ok(cast)
    }

    /// Consume the next token(s) as a possibly negative integer capacity
    fn expect_numeric_capacity(&mut self) -> Result<i64> {
        self.next_token();
        let negative = if self.cur_token.is_operator("-") {
            self.next_token();
            true
        } else {
            false
        };
        if self.cur_token.token_type != TokenType::Integer {
            return Err(Error::syntax(
                self.cur_token.position.offset,
                "numeric capacity expected",
            ));
        }
        let value: i64 = self.cur_token.literal.parse().map_err(|_| {
            Error::syntax(self.cur_token.position.offset, "numeric capacity expected")
        })?;
        Ok(if negative { -value } else { value })
    }

    // =========================================================================
    // INSERT
    // =========================================================================

    /// Parse INSERT; the current token is the INSERT keyword
    fn parse_insert(&mut self) -> Result<InsertModel> {
        self.expect_keyword("INTO")?;

        self.next_token();
        self.check_lex_error()?;
        if !Self::token_is_identifier_like(&self.cur_token) {
            return Err(Error::syntax(
                self.cur_token.position.offset,
                "literal expected",
            ));
        }
        let mut model = InsertModel {
            table_name: self.cur_token.literal.clone(),
            position: self.cur_token.position.offset,
            ..InsertModel::default()
        };

        if self.peek_token.is_punctuator("(") {
            self.next_token();
            loop {
                let (name, position) = self.expect_identifier("column name")?;
                model.columns.push(TableRef { name, position });
                self.next_token();
                if self.cur_token.is_punctuator(")") {
                    break;
                }
                if !self.cur_token.is_punctuator(",") {
                    return Err(Error::syntax(
                        self.cur_token.position.offset,
                        "',' or ')' expected",
                    ));
                }
            }
        }

        if self.peek_token.is_keyword("VALUES") {
            self.next_token();
            self.expect_punctuator("(")?;
            loop {
                model.values.push(self.parse_expression()?);
                self.next_token();
                if self.cur_token.is_punctuator(")") {
                    break;
                }
                if !self.cur_token.is_punctuator(",") {
                    return Err(Error::syntax(
                        self.cur_token.position.offset,
                        "',' or ')' expected",
                    ));
                }
            }
        } else if self.peek_token.is_keyword("SELECT") {
            self.next_token();
            model.select_position = self.cur_token.position.offset;
            model.query = Some(Box::new(self.parse_query_model()?));
        } else if self.peek_token.is_punctuator("(") {
            self.next_token();
            self.expect_keyword("SELECT")?;
            model.select_position = self.cur_token.position.offset;
            let query = self.parse_query_model()?;
            self.expect_punctuator(")")?;
            model.query = Some(Box::new(query));
        } else {
            return Err(Error::syntax(
                self.peek_token.position.offset,
                "'values' or 'select' expected",
            ));
        }

        Ok(model)
    }

    // =========================================================================
    // COPY
    // =========================================================================

    /// Parse COPY; the current token is the COPY keyword
    fn parse_copy(&mut self) -> Result<CopyModel> {
        self.next_token();
        self.check_lex_error()?;
        if self.cur_token.token_type != TokenType::String {
            return Err(Error::syntax(
                self.cur_token.position.offset,
                "file name expected",
            ));
        }
        let file_name = self.cur_token.unquoted().to_string();
        let file_position = self.cur_token.position.offset;

        self.expect_keyword("INTO")?;
        let (table_name, table_position) = self.expect_identifier("table name")?;

        Ok(CopyModel {
            file_name,
            file_position,
            table_name,
            table_position,
        })
    }

    // =========================================================================
    // RENAME
    // =========================================================================

    /// Parse RENAME TABLE; the current token is the RENAME keyword
    fn parse_rename(&mut self) -> Result<RenameTableModel> {
        self.expect_keyword("TABLE")?;
        let (from, from_position) = self.expect_identifier("table name")?;
        self.expect_keyword("TO")?;
        let (to, to_position) = self.expect_identifier("table name")?;
        Ok(RenameTableModel {
            from: TableRef {
                name: from,
                position: from_position,
            },
            to: TableRef {
                name: to,
                position: to_position,
            },
        })
    }
}
