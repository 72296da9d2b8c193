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

//! Abstract Syntax Tree and execution model types
//!
//! The parser produces an [`ExecutionModel`]: a typed statement model over
//! expression nodes held in the per-compile arena. Models are mutable,
//! the optimiser rewrites [`QueryModel`]s in place, and no model lives
//! longer than one `compile()` call.

use rustc_hash::FxHashMap;

use super::pool::ExprId;
use crate::core::types::{ColumnType, PartitionBy};

/// Expression node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprKind {
    /// Identifier: column or table reference
    Literal,
    /// Constant: number, string, boolean or NULL
    Constant,
    /// Unary or binary operator; operands in `lhs`/`rhs`
    Operator,
    /// Function call; arguments in `args`
    Function,
    /// UNION/EXCEPT/INTERSECT over two queries
    SetOperation,
    /// Nested query used as an expression
    Query,
}

/// A node of the expression tree, held in the per-compile arena
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionNode {
    /// Node kind
    pub kind: ExprKind,
    /// Source token: identifier text, operator symbol, constant literal
    pub token: String,
    /// Byte offset into the SQL text
    pub position: usize,
    /// Left operand of a binary operator, or the only operand of a unary
    pub lhs: Option<ExprId>,
    /// Right operand of a binary operator
    pub rhs: Option<ExprId>,
    /// Function-call arguments
    pub args: Vec<ExprId>,
}

impl ExpressionNode {
    /// Identifier node
    pub fn literal(token: impl Into<String>, position: usize) -> Self {
        Self {
            kind: ExprKind::Literal,
            token: token.into(),
            position,
            lhs: None,
            rhs: None,
            args: Vec::new(),
        }
    }

    /// Constant node; the token keeps its source spelling
    pub fn constant(token: impl Into<String>, position: usize) -> Self {
        Self {
            kind: ExprKind::Constant,
            token: token.into(),
            position,
            lhs: None,
            rhs: None,
            args: Vec::new(),
        }
    }

    /// Binary operator node
    pub fn binary(token: impl Into<String>, position: usize, lhs: ExprId, rhs: ExprId) -> Self {
        Self {
            kind: ExprKind::Operator,
            token: token.into(),
            position,
            lhs: Some(lhs),
            rhs: Some(rhs),
            args: Vec::new(),
        }
    }

    /// Unary operator node
    pub fn unary(token: impl Into<String>, position: usize, operand: ExprId) -> Self {
        Self {
            kind: ExprKind::Operator,
            token: token.into(),
            position,
            lhs: Some(operand),
            rhs: None,
            args: Vec::new(),
        }
    }

    /// Function-call node
    pub fn function(token: impl Into<String>, position: usize, args: Vec<ExprId>) -> Self {
        Self {
            kind: ExprKind::Function,
            token: token.into(),
            position,
            lhs: None,
            rhs: None,
            args,
        }
    }
}

/// A projected column of a SELECT
#[derive(Debug, Clone, PartialEq)]
pub struct QueryColumn {
    /// Explicit alias, when the user wrote one
    pub alias: Option<String>,
    /// The projected expression
    pub ast: ExprId,
    /// Byte offset of the column in the SQL text
    pub position: usize,
}

/// Join kinds supported by the code generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// INNER JOIN with an ON predicate
    Inner,
    /// CROSS JOIN without a predicate
    Cross,
}

/// One joined source of a SELECT
#[derive(Debug, Clone, PartialEq)]
pub struct JoinModel {
    /// Join kind
    pub kind: JoinKind,
    /// Joined table name
    pub table: TableRef,
    /// Alias for the joined table
    pub alias: Option<String>,
    /// ON predicate; None for CROSS joins
    pub on: Option<ExprId>,
    /// Byte offset of the JOIN keyword
    pub position: usize,
}

/// A table name with its source position
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    /// Unquoted table name
    pub name: String,
    /// Byte offset in the SQL text
    pub position: usize,
}

/// One ORDER BY key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderByItem {
    /// Sort key expression
    pub expr: ExprId,
    /// True for DESC
    pub descending: bool,
}

/// Composite model of a SELECT, mutable during optimisation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryModel {
    /// Projected columns; empty means `*`
    pub columns: Vec<QueryColumn>,
    /// Base table, when the source is a table name
    pub table: Option<TableRef>,
    /// Source alias
    pub alias: Option<String>,
    /// Nested model, when the source is a sub-query
    pub nested: Option<Box<QueryModel>>,
    /// Joined sources, in syntactic order until the optimiser reorders
    pub joins: Vec<JoinModel>,
    /// WHERE predicate
    pub where_clause: Option<ExprId>,
    /// GROUP BY keys
    pub group_by: Vec<ExprId>,
    /// SAMPLE BY bucket expression
    pub sample_by: Option<ExprId>,
    /// ORDER BY keys
    pub order_by: Vec<OrderByItem>,
    /// LIMIT row count expression
    pub limit: Option<ExprId>,
    /// Byte offset of the SELECT keyword
    pub position: usize,
}

/// One column definition of CREATE TABLE
#[derive(Debug, Clone, PartialEq)]
pub struct CreateColumnModel {
    /// Column name
    pub name: String,
    /// Byte offset of the name
    pub position: usize,
    /// Declared type
    pub ty: ColumnType,
    /// Byte offset of the type token
    pub type_position: usize,
    /// SYMBOL dictionary capacity; None takes the configured default
    pub symbol_capacity: Option<i64>,
    /// SYMBOL cache flag; None takes the configured default
    pub symbol_cache: Option<bool>,
    /// Whether the column carries a bitmap index
    pub indexed: bool,
    /// Bitmap index value block capacity; None takes the configured default
    pub index_block_capacity: Option<i64>,
}

/// Per-column CAST of CREATE TABLE AS SELECT
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnCastModel {
    /// Cast column name
    pub column_name: String,
    /// Byte offset of the column name
    pub name_position: usize,
    /// Target type
    pub ty: ColumnType,
    /// Byte offset of the type token
    pub type_position: usize,
    /// SYMBOL dictionary capacity override
    pub symbol_capacity: Option<i64>,
    /// SYMBOL cache flag override
    pub symbol_cache: Option<bool>,
}

/// Model of CREATE TABLE, with or without AS SELECT
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateTableModel {
    /// Target table name
    pub name: String,
    /// Byte offset of the table name
    pub name_position: usize,
    /// Explicit column list; empty for AS SELECT
    pub columns: Vec<CreateColumnModel>,
    /// CAST overrides for AS SELECT, keyed by lower-cased column name
    pub cast_models: FxHashMap<String, ColumnCastModel>,
    /// Designated timestamp column reference
    pub timestamp: Option<TableRef>,
    /// Partitioning mode
    pub partition_by: PartitionBy,
    /// Source query for AS SELECT
    pub query: Option<Box<QueryModel>>,
}

/// Model of INSERT, with either a VALUES tuple or a nested query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertModel {
    /// Target table name
    pub table_name: String,
    /// Byte offset of the table name
    pub position: usize,
    /// Ordered column set; empty means all table columns
    pub columns: Vec<TableRef>,
    /// VALUES expressions, one per column-set entry or table column
    pub values: Vec<ExprId>,
    /// Nested query for INSERT AS SELECT
    pub query: Option<Box<QueryModel>>,
    /// Byte offset of the SELECT keyword of the nested query
    pub select_position: usize,
}

/// Model of COPY
#[derive(Debug, Clone, PartialEq)]
pub struct CopyModel {
    /// Source file name, unquoted; the literal name `stdin` selects
    /// remote mode
    pub file_name: String,
    /// Byte offset of the file name
    pub file_position: usize,
    /// Destination table name
    pub table_name: String,
    /// Byte offset of the table name
    pub table_position: usize,
}

impl CopyModel {
    /// True when the source is the caller's input stream
    pub fn is_stdin(&self) -> bool {
        self.file_name.eq_ignore_ascii_case("stdin")
    }
}

/// Model of RENAME TABLE
#[derive(Debug, Clone, PartialEq)]
pub struct RenameTableModel {
    /// Existing table
    pub from: TableRef,
    /// New name
    pub to: TableRef,
}

/// The typed statement model handed from the parser to the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionModel {
    /// SELECT
    Query(QueryModel),
    /// CREATE TABLE [AS SELECT]
    CreateTable(CreateTableModel),
    /// INSERT [AS SELECT]
    Insert(InsertModel),
    /// COPY
    Copy(CopyModel),
    /// RENAME TABLE
    Rename(RenameTableModel),
}
