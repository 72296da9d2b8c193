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

//! DDL execution
//!
//! CREATE TABLE [AS SELECT], ALTER TABLE ADD/DROP COLUMN, DROP TABLE,
//! TRUNCATE TABLE and REPAIR TABLE. CREATE runs under the engine's table
//! name lock, which is released on every exit path; a writer produced by
//! AS SELECT is handed to the engine on unlock so it can adopt it.

use std::sync::Arc;

use log::{error, info};

use crate::core::error::{Error, Result};
use crate::core::types::{ceil_pow2, is_compatible_cast, validate_symbol_capacity, ColumnType};
use crate::parser::ast::CreateTableModel;
use crate::parser::lexer::Lexer;
use crate::parser::token::TokenType;
use crate::storage::config::Config;
use crate::storage::traits::{
    ColumnFilter, RecordMetadata, TableStatus, TableStructure, TableWriter,
};

use super::copier::assemble_row_copier;
use super::dml::{copy_ordered, copy_unordered};
use super::{CompiledQuery, ExecutionContext, SqlCompiler};

impl SqlCompiler {
    /// CREATE TABLE, with or without AS SELECT; called under the retry
    /// loop so a volatile source re-compiles rather than failing
    pub(crate) fn create_table(
        &mut self,
        model: &CreateTableModel,
        _ctx: &ExecutionContext,
    ) -> Result<CompiledQuery> {
        if !self.engine.lock_name(&model.name) {
            return Err(Error::busy(model.name_position, "cannot acquire table lock"));
        }
        let result = self.create_table_locked(model);
        let engine = Arc::clone(&self.engine);
        match result {
            Ok(writer) => {
                engine.unlock_name(&model.name, writer);
                Ok(CompiledQuery::CreateTable)
            }
            Err(e) => {
                engine.unlock_name(&model.name, None);
                Err(e)
            }
        }
    }

    fn create_table_locked(
        &mut self,
        model: &CreateTableModel,
    ) -> Result<Option<Box<dyn TableWriter>>> {
        if self.engine.status(&model.name) == TableStatus::Exists {
            return Err(Error::AlreadyExists {
                position: model.name_position,
            });
        }

        if model.query.is_none() {
            self.engine
                .create_table(&ColumnListStructure {
                    model,
                    config: &self.config,
                })
                .map_err(|e| {
                    error!("could not create table [error={}]", e);
                    Error::internal(
                        model.name_position,
                        "Could not create table. See log for details.",
                    )
                })?;
            return Ok(None);
        }

        self.create_table_from_cursor(model).map(Some)
    }

    fn create_table_from_cursor(
        &mut self,
        model: &CreateTableModel,
    ) -> Result<Box<dyn TableWriter>> {
        let query = model
            .query
            .as_ref()
            .ok_or_else(|| Error::internal(model.name_position, "create model has no query"))?;
        let factory = self.code_generator.generate(query, &self.pool)?;
        let metadata = factory.metadata();

        // CAST pairs must share a cast group; a cast naming a column the
        // source no longer has is permanent, not retryable
        for cast in model.cast_models.values() {
            let index = metadata
                .column_index(&cast.column_name)
                .ok_or_else(|| Error::invalid_column(cast.name_position, &cast.column_name))?;
            let from = metadata.column(index).ty;
            if !is_compatible_cast(from, cast.ty) {
                return Err(Error::semantic(
                    cast.type_position,
                    format!("unsupported cast [from={},to={}]", from, cast.ty),
                ));
            }
        }

        if let Some(ref timestamp) = model.timestamp {
            let index = metadata
                .column_index(&timestamp.name)
                .ok_or_else(|| Error::invalid_column(timestamp.position, &timestamp.name))?;
            let ty = metadata.column(index).ty;
            if ty != ColumnType::Timestamp {
                return Err(Error::semantic(
                    timestamp.position,
                    format!("TIMESTAMP column expected [actual={}]", ty),
                ));
            }
        }

        self.engine
            .create_table(&CursorStructure {
                model,
                metadata,
                config: &self.config,
            })
            .map_err(|e| {
                error!("could not create table [error={}]", e);
                Error::internal(
                    model.name_position,
                    "Could not create table. See log for details.",
                )
            })?;

        // anything failing from here on leaves a created table behind;
        // it is removed before the error propagates
        match self.copy_table_data(model, factory.as_ref()) {
            Ok(writer) => Ok(writer),
            Err(e) => {
                if self.engine.remove_directory(&model.name) {
                    Err(e)
                } else {
                    error!(
                        "failed to clean up after create table failure [table={}]",
                        model.name
                    );
                    Err(Error::internal(
                        0,
                        "Concurrent modification cannot be handled. Failed to clean up. \
                         See log for more details.",
                    ))
                }
            }
        }
    }

    fn copy_table_data(
        &self,
        model: &CreateTableModel,
        factory: &dyn crate::storage::traits::RecordCursorFactory,
    ) -> Result<Box<dyn TableWriter>> {
        let mut writer = self.engine.writer(&model.name)?;
        let copier = assemble_row_copier(
            factory.metadata(),
            writer.metadata(),
            &ColumnFilter::entity(writer.metadata().column_count()),
        )?;
        let timestamp_index = writer.metadata().timestamp_index();
        let mut cursor = factory.cursor()?;
        match timestamp_index {
            Some(ts) => copy_ordered(writer.as_mut(), cursor.as_mut(), &copier, ts)?,
            None => copy_unordered(writer.as_mut(), cursor.as_mut(), &copier)?,
        }
        Ok(writer)
    }

    /// ALTER TABLE <name> ADD|DROP COLUMN ...
    pub(crate) fn alter_table(
        &mut self,
        lexer: &mut Lexer,
        ctx: &ExecutionContext,
    ) -> Result<CompiledQuery> {
        self.require_writes(ctx)?;
        Self::expect_keyword_token(lexer, "TABLE")?;
        let name_token = Self::expect_name_token(lexer, "table name")?;
        let table_position = name_token.position.offset;
        let table_name = name_token.literal;

        self.table_exists_or_fail(table_position, &table_name)?;

        let mut writer = self.engine.writer(&table_name).map_err(|e| {
            info!("failed to lock table for alter [table={}, error={}]", table_name, e);
            Error::busy(table_position, format!("table '{}' is busy", table_name))
        })?;

        let token = Self::fetch_token(lexer, "'add' or 'drop'")?;
        if token.is_keyword("ADD") {
            self.alter_table_add_column(lexer, table_position, writer.as_mut())?;
        } else if token.is_keyword("DROP") {
            self.alter_table_drop_column(lexer, table_position, writer.as_mut())?;
        } else {
            return Err(Error::syntax(
                token.position.offset,
                format!("unexpected token: {}", token.literal),
            ));
        }

        Ok(CompiledQuery::Alter)
    }

    fn alter_table_add_column(
        &self,
        lexer: &mut Lexer,
        table_position: usize,
        writer: &mut dyn TableWriter,
    ) -> Result<()> {
        Self::expect_keyword_token(lexer, "COLUMN")?;

        loop {
            let column_token = Self::expect_name_token(lexer, "column name")?;
            let column_name = column_token.literal;
            if writer.metadata().column_index(&column_name).is_some() {
                return Err(Error::semantic(
                    column_token.position.offset,
                    format!("column '{}' already exists", column_name),
                ));
            }

            let type_token = Self::fetch_token(lexer, "column type")?;
            let ty = ColumnType::by_name(&type_token.literal)
                .ok_or_else(|| Error::syntax(type_token.position.offset, "invalid type"))?;

            let mut symbol_capacity = self.config.default_symbol_capacity as i64;
            let mut cache = self.config.default_symbol_cache_flag;
            let mut indexed = false;
            let mut index_block_capacity = self.config.index_value_block_size as i64;

            let mut next = lexer.next_significant();

            if ty == ColumnType::Symbol {
                if next.as_ref().is_some_and(|t| t.is_keyword("CAPACITY")) {
                    let mut token = Self::fetch_token(lexer, "symbol capacity")?;
                    let error_position = token.position.offset;
                    let negative = token.is_operator("-");
                    if negative {
                        token = Self::fetch_token(lexer, "symbol capacity")?;
                    }
                    if token.token_type != TokenType::Integer {
                        return Err(Error::syntax(
                            token.position.offset,
                            "numeric capacity expected",
                        ));
                    }
                    let mut capacity: i64 = token.literal.parse().map_err(|_| {
                        Error::syntax(token.position.offset, "numeric capacity expected")
                    })?;
                    if negative {
                        capacity = -capacity;
                    }
                    validate_symbol_capacity(error_position, capacity)?;
                    symbol_capacity = capacity;
                    next = lexer.next_significant();
                }

                if next.as_ref().is_some_and(|t| t.is_keyword("CACHE")) {
                    cache = true;
                    next = lexer.next_significant();
                } else if next.as_ref().is_some_and(|t| t.is_keyword("NOCACHE")) {
                    cache = false;
                    next = lexer.next_significant();
                }

                if next.as_ref().is_some_and(|t| t.is_keyword("INDEX")) {
                    indexed = true;
                    next = lexer.next_significant();
                }

                if next.as_ref().is_some_and(|t| t.is_keyword("CAPACITY")) {
                    let token = Self::fetch_token(lexer, "symbol index capacity")?;
                    if token.token_type != TokenType::Integer {
                        return Err(Error::syntax(
                            token.position.offset,
                            "numeric capacity expected",
                        ));
                    }
                    index_block_capacity = token.literal.parse().map_err(|_| {
                        Error::syntax(token.position.offset, "numeric capacity expected")
                    })?;
                    next = lexer.next_significant();
                }
            }

            writer
                .add_column(
                    &column_name,
                    ty,
                    ceil_pow2(symbol_capacity.max(0) as usize),
                    cache,
                    indexed,
                    ceil_pow2(index_block_capacity.max(0) as usize),
                )
                .map_err(|e| {
                    error!(
                        "cannot add column [table={}, column={}, error={}]",
                        writer.name(),
                        column_name,
                        e
                    );
                    Error::semantic(table_position, format!("Cannot add column [error={}]", e))
                })?;

            match next {
                None => return Ok(()),
                Some(token) if token.is_punctuator(",") => continue,
                Some(token) if token.is_punctuator(";") => return Ok(()),
                Some(token) => {
                    return Err(Error::syntax(token.position.offset, "',' expected"));
                }
            }
        }
    }

    fn alter_table_drop_column(
        &self,
        lexer: &mut Lexer,
        table_position: usize,
        writer: &mut dyn TableWriter,
    ) -> Result<()> {
        Self::expect_keyword_token(lexer, "COLUMN")?;

        loop {
            let column_token = Self::expect_name_token(lexer, "column name")?;
            let column_name = column_token.literal;
            if writer.metadata().column_index(&column_name).is_none() {
                return Err(Error::invalid_column(
                    column_token.position.offset,
                    &column_name,
                ));
            }

            writer.remove_column(&column_name).map_err(|e| {
                error!(
                    "cannot drop column [table={}, column={}, error={}]",
                    writer.name(),
                    column_name,
                    e
                );
                Error::semantic(table_position, "Cannot add column. Try again later.")
            })?;

            match lexer.next_significant() {
                None => return Ok(()),
                Some(token) if token.is_punctuator(",") => continue,
                Some(token) if token.is_punctuator(";") => return Ok(()),
                Some(token) => {
                    return Err(Error::syntax(token.position.offset, "',' expected"));
                }
            }
        }
    }

    /// DROP TABLE <name>
    pub(crate) fn drop_table(
        &mut self,
        lexer: &mut Lexer,
        ctx: &ExecutionContext,
    ) -> Result<CompiledQuery> {
        self.require_writes(ctx)?;
        Self::expect_keyword_token(lexer, "TABLE")?;
        let name_token = Self::expect_name_token(lexer, "table name")?;
        let position = name_token.position.offset;
        let table_name = name_token.literal;

        self.table_exists_or_fail(position, &table_name)?;
        self.engine.remove(&table_name).map_err(|e| match e {
            Error::ResourceBusy { message, .. } => Error::ResourceBusy { position, message },
            other => other,
        })?;

        Ok(CompiledQuery::Drop)
    }

    /// TRUNCATE TABLE <n1> [, <n2> ...]
    ///
    /// All writers are acquired before the first table is touched; if any
    /// acquisition fails no table is truncated.
    pub(crate) fn truncate_tables(
        &mut self,
        lexer: &mut Lexer,
        ctx: &ExecutionContext,
    ) -> Result<CompiledQuery> {
        self.require_writes(ctx)?;
        Self::expect_keyword_token(lexer, "TABLE")?;

        let mut writers: Vec<Box<dyn TableWriter>> = Vec::new();
        loop {
            let token = Self::fetch_token(lexer, "table name")?;
            if token.token_type == TokenType::Punctuator {
                return Err(Error::syntax(token.position.offset, "table name expected"));
            }
            let position = token.position.offset;
            let table_name = token.literal;
            self.table_exists_or_fail(position, &table_name)?;

            match self.engine.writer(&table_name) {
                Ok(writer) => writers.push(writer),
                Err(e) => {
                    info!("table busy [table={}, error={}]", table_name, e);
                    return Err(Error::busy(
                        position,
                        format!("table '{}' is busy", table_name),
                    ));
                }
            }

            match lexer.next_significant() {
                Some(token) if token.is_punctuator(",") => continue,
                _ => break,
            }
        }

        for mut writer in writers {
            let name = writer.name().to_string();
            if self.engine.lock_readers(&name) {
                let result = writer.truncate();
                self.engine.unlock_readers(&name);
                result.map_err(|e| {
                    error!("could not truncate [table={}, error={}]", name, e);
                    e
                })?;
            } else {
                return Err(Error::busy(
                    0,
                    format!("there is an active query against '{}'. Try again.", name),
                ));
            }
        }

        Ok(CompiledQuery::Truncate)
    }

    /// REPAIR TABLE <n1> [, <n2> ...]
    ///
    /// Opening and closing a writer runs the engine's consistency
    /// recovery for the table.
    pub(crate) fn repair_tables(
        &mut self,
        lexer: &mut Lexer,
        ctx: &ExecutionContext,
    ) -> Result<CompiledQuery> {
        self.require_writes(ctx)?;
        Self::expect_keyword_token(lexer, "TABLE")?;

        loop {
            let token = Self::fetch_token(lexer, "table name")?;
            if token.token_type == TokenType::Punctuator {
                return Err(Error::syntax(token.position.offset, "table name expected"));
            }
            let position = token.position.offset;
            let table_name = token.literal;
            self.table_exists_or_fail(position, &table_name)?;

            match self.engine.writer(&table_name) {
                Ok(writer) => drop(writer),
                Err(e) => {
                    info!("table busy [table={}, error={}]", table_name, e);
                    return Err(Error::busy(
                        position,
                        format!("table '{}' is busy", table_name),
                    ));
                }
            }

            match lexer.next_significant() {
                Some(token) if token.is_punctuator(",") => continue,
                _ => break,
            }
        }

        Ok(CompiledQuery::Repair)
    }
}

/// Structure view over an explicit column list
struct ColumnListStructure<'a> {
    model: &'a CreateTableModel,
    config: &'a Config,
}

impl TableStructure for ColumnListStructure<'_> {
    fn table_name(&self) -> &str {
        &self.model.name
    }

    fn column_count(&self) -> usize {
        self.model.columns.len()
    }

    fn column_name(&self, index: usize) -> &str {
        &self.model.columns[index].name
    }

    fn column_type(&self, index: usize) -> ColumnType {
        self.model.columns[index].ty
    }

    fn symbol_capacity(&self, index: usize) -> usize {
        let capacity = self.model.columns[index]
            .symbol_capacity
            .unwrap_or(self.config.default_symbol_capacity as i64);
        ceil_pow2(capacity.max(0) as usize)
    }

    fn symbol_cache_flag(&self, index: usize) -> bool {
        self.model.columns[index]
            .symbol_cache
            .unwrap_or(self.config.default_symbol_cache_flag)
    }

    fn indexed_flag(&self, index: usize) -> bool {
        self.model.columns[index].indexed
    }

    fn index_block_capacity(&self, index: usize) -> usize {
        let capacity = self.model.columns[index]
            .index_block_capacity
            .unwrap_or(self.config.index_value_block_size as i64);
        ceil_pow2(capacity.max(0) as usize)
    }

    fn partition_by(&self) -> crate::core::types::PartitionBy {
        self.model.partition_by
    }

    fn timestamp_index(&self) -> Option<usize> {
        let timestamp = self.model.timestamp.as_ref()?;
        self.model
            .columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(&timestamp.name))
    }
}

/// Structure view composing cursor metadata with the CAST map
struct CursorStructure<'a> {
    model: &'a CreateTableModel,
    metadata: &'a RecordMetadata,
    config: &'a Config,
}

impl CursorStructure<'_> {
    fn cast_for(&self, index: usize) -> Option<&crate::parser::ast::ColumnCastModel> {
        self.model
            .cast_models
            .get(&self.metadata.column_name(index).to_lowercase())
    }
}

impl TableStructure for CursorStructure<'_> {
    fn table_name(&self) -> &str {
        &self.model.name
    }

    fn column_count(&self) -> usize {
        self.metadata.column_count()
    }

    fn column_name(&self, index: usize) -> &str {
        self.metadata.column_name(index)
    }

    fn column_type(&self, index: usize) -> ColumnType {
        self.cast_for(index)
            .map_or(self.metadata.column(index).ty, |cast| cast.ty)
    }

    fn symbol_capacity(&self, index: usize) -> usize {
        let capacity = self
            .cast_for(index)
            .and_then(|cast| cast.symbol_capacity)
            .unwrap_or(self.config.default_symbol_capacity as i64);
        ceil_pow2(capacity.max(0) as usize)
    }

    fn symbol_cache_flag(&self, index: usize) -> bool {
        self.cast_for(index)
            .and_then(|cast| cast.symbol_cache)
            .unwrap_or(self.config.default_symbol_cache_flag)
    }

    fn indexed_flag(&self, _index: usize) -> bool {
        false
    }

    fn index_block_capacity(&self, _index: usize) -> usize {
        ceil_pow2(self.config.index_value_block_size)
    }

    fn partition_by(&self) -> crate::core::types::PartitionBy {
        self.model.partition_by
    }

    fn timestamp_index(&self) -> Option<usize> {
        let timestamp = self.model.timestamp.as_ref()?;
        self.metadata.column_index(&timestamp.name)
    }
}
