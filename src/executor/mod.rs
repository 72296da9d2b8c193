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

//! SQL compiler
//!
//! [`SqlCompiler::compile`] is the single entry point of the pipeline.
//! Statements whose first keyword identifies a mutation (`truncate`,
//! `alter`, `repair`, `set`, `drop`) are executed straight off the token
//! stream; everything else parses into an execution model and flows
//! through optimiser and code generator, or into a mutation executor.
//!
//! A compiler instance is single-threaded: its expression pool and
//! scratch state reset at the start of every call, and nothing handed to
//! a caller may point into them. The produced [`CompiledQuery`] is owned
//! by the caller.

pub mod codegen;
pub mod context;
pub mod copier;
mod ddl;
mod dml;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::error::{Error, Result};
use crate::optimizer::SqlOptimiser;
use crate::parser::ast::ExecutionModel;
use crate::parser::lexer::Lexer;
use crate::parser::pool::ExprPool;
use crate::parser::token::{Token, TokenType};
use crate::parser::Parser;
use crate::storage::config::Config;
use crate::storage::traits::{RecordCursorFactory, StorageEngine, TableStatus};
use crate::text::{NullTextLoader, TextLoader};
use crate::functions::FunctionParser;

pub use codegen::SqlCodeGenerator;
pub use context::{ExecutionContext, SecurityContext};
pub use copier::{assemble_row_copier, RecordToRowCopier};
pub use dml::InsertStatement;

/// Shared handle to the text loader backing COPY
pub type TextLoaderRef = Arc<Mutex<dyn TextLoader>>;

/// The compiled form of one statement, owned by the caller
pub enum CompiledQuery {
    /// SELECT: a reusable cursor factory
    Select(Box<dyn RecordCursorFactory>),
    /// INSERT with literal values: an executable statement
    Insert(InsertStatement),
    /// INSERT AS SELECT ran to completion during compilation
    InsertAsSelect,
    /// CREATE TABLE ran to completion
    CreateTable,
    /// ALTER TABLE ran to completion
    Alter,
    /// DROP TABLE ran to completion
    Drop,
    /// TRUNCATE ran to completion
    Truncate,
    /// REPAIR ran to completion
    Repair,
    /// SET was accepted and ignored
    Set,
    /// COPY from a local file ran to completion
    CopyLocal,
    /// COPY from stdin: the caller feeds this loader
    CopyRemote(TextLoaderRef),
    /// RENAME TABLE ran to completion
    Rename,
}

impl std::fmt::Debug for CompiledQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CompiledQuery::Select(_) => "Select",
            CompiledQuery::Insert(_) => "Insert",
            CompiledQuery::InsertAsSelect => "InsertAsSelect",
            CompiledQuery::CreateTable => "CreateTable",
            CompiledQuery::Alter => "Alter",
            CompiledQuery::Drop => "Drop",
            CompiledQuery::Truncate => "Truncate",
            CompiledQuery::Repair => "Repair",
            CompiledQuery::Set => "Set",
            CompiledQuery::CopyLocal => "CopyLocal",
            CompiledQuery::CopyRemote(_) => "CopyRemote",
            CompiledQuery::Rename => "Rename",
        };
        f.write_str(name)
    }
}

impl CompiledQuery {
    /// Take the cursor factory of a SELECT
    pub fn into_factory(self) -> Option<Box<dyn RecordCursorFactory>> {
        match self {
            CompiledQuery::Select(factory) => Some(factory),
            _ => None,
        }
    }

    /// Take the statement of a literal INSERT
    pub fn into_insert(self) -> Option<InsertStatement> {
        match self {
            CompiledQuery::Insert(statement) => Some(statement),
            _ => None,
        }
    }
}

/// Mutations driven through the retry loop
enum RetriedMutation {
    CreateTable,
    InsertAsSelect,
}

/// The SQL compilation and execution pipeline
pub struct SqlCompiler {
    engine: Arc<dyn StorageEngine>,
    config: Config,
    pool: ExprPool,
    optimiser: SqlOptimiser,
    function_parser: FunctionParser,
    code_generator: SqlCodeGenerator,
    text_loader: TextLoaderRef,
}

impl SqlCompiler {
    /// Create a compiler over the given engine with default configuration
    pub fn new(engine: Arc<dyn StorageEngine>) -> Self {
        Self::with_config(engine, Config::default())
    }

    /// Create a compiler with explicit configuration
    pub fn with_config(engine: Arc<dyn StorageEngine>, config: Config) -> Self {
        let pool = ExprPool::with_capacity(config.expression_pool_capacity);
        Self {
            code_generator: SqlCodeGenerator::new(Arc::clone(&engine)),
            engine,
            pool,
            optimiser: SqlOptimiser::new(),
            function_parser: FunctionParser::new(),
            text_loader: Arc::new(Mutex::new(NullTextLoader::new())),
            config,
        }
    }

    /// Replace the loader COPY streams into
    pub fn set_text_loader(&mut self, loader: impl TextLoader + 'static) {
        self.text_loader = Arc::new(Mutex::new(loader));
    }

    /// The engine this compiler mutates
    pub fn engine(&self) -> &Arc<dyn StorageEngine> {
        &self.engine
    }

    /// The configuration in force
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile one statement; mutations execute before this returns
    pub fn compile(&mut self, sql: &str, ctx: &ExecutionContext) -> Result<CompiledQuery> {
        self.pool.clear();

        let mut lexer = Lexer::new(sql);
        let Some(token) = lexer.next_significant() else {
            return Err(Error::syntax(0, "empty query"));
        };

        if token.token_type == TokenType::Keyword {
            match token.literal.as_str() {
                "TRUNCATE" => return self.truncate_tables(&mut lexer, ctx),
                "ALTER" => return self.alter_table(&mut lexer, ctx),
                "REPAIR" => return self.repair_tables(&mut lexer, ctx),
                "SET" => return self.compile_set(&mut lexer),
                "DROP" => return self.drop_table(&mut lexer, ctx),
                _ => {}
            }
        }

        lexer.unparse(token);
        let model = self.compile_execution_model(lexer)?;
        self.dispatch_model(model, sql, ctx)
    }

    /// Parse and, where the model carries a query, optimise
    fn compile_execution_model(&mut self, lexer: Lexer) -> Result<ExecutionModel> {
        let mut model = Parser::new(lexer, &mut self.pool).parse()?;
        match &mut model {
            ExecutionModel::Query(query) => {
                self.optimiser
                    .optimise(query, &mut self.pool, &*self.engine)?;
            }
            ExecutionModel::Insert(insert) => {
                if let Some(ref mut query) = insert.query {
                    self.optimiser
                        .optimise(query, &mut self.pool, &*self.engine)?;
                    let target = insert.columns.len();
                    if target > 0 && !query.columns.is_empty() && query.columns.len() != target {
                        return Err(Error::semantic(insert.position, "column count mismatch"));
                    }
                } else if !insert.columns.is_empty()
                    && insert.columns.len() != insert.values.len()
                {
                    return Err(Error::syntax(
                        insert.columns[0].position,
                        "value count does not match column count",
                    ));
                }
            }
            ExecutionModel::CreateTable(create) => {
                if let Some(ref mut query) = create.query {
                    self.optimiser
                        .optimise(query, &mut self.pool, &*self.engine)?;
                }
            }
            _ => {}
        }
        Ok(model)
    }

    fn dispatch_model(
        &mut self,
        model: ExecutionModel,
        sql: &str,
        ctx: &ExecutionContext,
    ) -> Result<CompiledQuery> {
        match model {
            ExecutionModel::Query(query) => {
                let factory = self.code_generator.generate(&query, &self.pool)?;
                Ok(CompiledQuery::Select(factory))
            }
            ExecutionModel::CreateTable(create) => {
                self.require_writes(ctx)?;
                self.execute_with_retries(
                    RetriedMutation::CreateTable,
                    ExecutionModel::CreateTable(create),
                    sql,
                    ctx,
                )
            }
            ExecutionModel::Insert(insert) => {
                self.require_writes(ctx)?;
                if insert.query.is_some() {
                    self.execute_with_retries(
                        RetriedMutation::InsertAsSelect,
                        ExecutionModel::Insert(insert),
                        sql,
                        ctx,
                    )
                } else {
                    self.insert(&insert)
                }
            }
            ExecutionModel::Copy(copy) => {
                self.require_writes(ctx)?;
                self.execute_copy(&copy)
            }
            ExecutionModel::Rename(rename) => {
                self.require_writes(ctx)?;
                if self.engine.status(&rename.from.name) != TableStatus::Exists {
                    return Err(Error::semantic(
                        rename.from.position,
                        format!("table '{}' does not exist", rename.from.name),
                    ));
                }
                if self.engine.status(&rename.to.name) != TableStatus::DoesNotExist {
                    return Err(Error::semantic(
                        rename.to.position,
                        format!("table '{}' already exists", rename.to.name),
                    ));
                }
                self.engine
                    .rename(&rename.from.name, &rename.to.name)
                    .map_err(|e| match e {
                        Error::ResourceBusy { message, .. } => Error::ResourceBusy {
                            position: rename.from.position,
                            message,
                        },
                        other => other,
                    })?;
                Ok(CompiledQuery::Rename)
            }
        }
    }

    /// Run a streaming mutation, re-compiling and retrying while the
    /// source schema keeps changing underneath it
    fn execute_with_retries(
        &mut self,
        mutation: RetriedMutation,
        mut model: ExecutionModel,
        sql: &str,
        ctx: &ExecutionContext,
    ) -> Result<CompiledQuery> {
        let mut attempts_left = self.config.create_as_select_retry_count;
        loop {
            let result = match (&mutation, &model) {
                (RetriedMutation::CreateTable, ExecutionModel::CreateTable(create)) => {
                    self.create_table(create, ctx)
                }
                (RetriedMutation::InsertAsSelect, ExecutionModel::Insert(insert)) => {
                    self.insert_as_select(insert)
                }
                _ => Err(Error::internal(0, "mutation does not match its model")),
            };
            match result {
                Err(e) if e.is_out_of_date() => {
                    attempts_left = attempts_left.saturating_sub(1);
                    self.pool.clear();
                    model = self.compile_execution_model(Lexer::new(sql))?;
                    if attempts_left == 0 {
                        return Err(Error::internal(0, "underlying cursor is extremely volatile"));
                    }
                }
                other => return other,
            }
        }
    }

    /// The session dialect accepts and ignores settings
    fn compile_set(&mut self, lexer: &mut Lexer) -> Result<CompiledQuery> {
        while lexer.next_significant().is_some() {}
        Ok(CompiledQuery::Set)
    }

    fn require_writes(&self, ctx: &ExecutionContext) -> Result<()> {
        if ctx.allows_writes() {
            Ok(())
        } else {
            Err(Error::semantic(0, "write operations are not permitted"))
        }
    }

    // =========================================================================
    // Raw token stream helpers for the keyword executors
    // =========================================================================

    pub(crate) fn fetch_token(lexer: &mut Lexer, expected: &str) -> Result<Token> {
        lexer
            .next_significant()
            .ok_or_else(|| Error::syntax(lexer.current_position(), format!("{} expected", expected)))
    }

    pub(crate) fn expect_keyword_token(lexer: &mut Lexer, keyword: &str) -> Result<Token> {
        let token = Self::fetch_token(lexer, &format!("'{}'", keyword.to_lowercase()))?;
        if token.is_keyword(keyword) {
            Ok(token)
        } else {
            Err(Error::syntax(
                token.position.offset,
                format!("'{}' expected", keyword.to_lowercase()),
            ))
        }
    }

    pub(crate) fn expect_name_token(lexer: &mut Lexer, expected: &str) -> Result<Token> {
        let token = Self::fetch_token(lexer, expected)?;
        match token.token_type {
            TokenType::Identifier | TokenType::Keyword => Ok(token),
            _ => Err(Error::syntax(
                token.position.offset,
                format!("{} expected", expected),
            )),
        }
    }

    pub(crate) fn table_exists_or_fail(&self, position: usize, name: &str) -> Result<()> {
        if self.engine.status(name) == TableStatus::DoesNotExist {
            return Err(Error::semantic(
                position,
                format!("table '{}' does not exist", name),
            ));
        }
        Ok(())
    }
}
