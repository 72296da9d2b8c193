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
//! This module provides the SQL front end:
//!
//! - [`Lexer`] - tokenizer with byte-offset positions and pushback
//! - [`Parser`] - builds typed execution models from tokens
//! - [`ast`] - expression nodes and statement models
//! - [`pool`] - the per-compile expression node arena
//! - [`token`] - token types and keyword tables

pub mod ast;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;
pub mod pool;
pub mod precedence;
pub mod token;

pub use ast::{
    ColumnCastModel, CopyModel, CreateColumnModel, CreateTableModel, ExecutionModel, ExprKind,
    ExpressionNode, InsertModel, JoinKind, JoinModel, OrderByItem, QueryColumn, QueryModel,
    RenameTableModel, TableRef,
};
pub use lexer::Lexer;
pub use parser::Parser;
pub use pool::{ExprId, ExprPool};
pub use precedence::Precedence;
pub use token::{
    is_keyword, is_operator, is_punctuator, Position, Token, TokenType, KEYWORDS, OPERATORS,
    SQL_CONTROL_SYMBOLS,
};
