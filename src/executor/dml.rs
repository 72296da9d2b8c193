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

//! DML execution
//!
//! INSERT with literal values compiles into an [`InsertStatement`] the
//! caller executes later; INSERT AS SELECT streams a cursor into the
//! writer during compilation; COPY streams file bytes through the text
//! loader.

use std::fs::File;
use std::io::Read;
use std::sync::Arc;

use log::info;

use crate::core::error::{Error, Result};
use crate::core::types::is_assignable_from;
use crate::functions::{EmptyRecord, Function, VirtualRecord};
use crate::parser::ast::{CopyModel, InsertModel};
use crate::storage::traits::{
    ColumnFilter, ColumnTypes, RecordCursor, RecordMetadata, StorageEngine, TableWriter,
};
use crate::text::{Atomicity, LoadState};

use super::copier::{assemble_row_copier, RecordToRowCopier};
use super::{CompiledQuery, SqlCompiler};

/// Typed view over a list of bound value functions
struct FunctionTypes<'a>(&'a [Function]);

impl ColumnTypes for FunctionTypes<'_> {
    fn column_count(&self) -> usize {
        self.0.len()
    }

    fn column_type(&self, index: usize) -> crate::core::types::ColumnType {
        self.0[index].data_type()
    }
}

/// A compiled INSERT with literal values, bound to the table structure
/// observed at compile time
pub struct InsertStatement {
    engine: Arc<dyn StorageEngine>,
    table_name: String,
    functions: Vec<Function>,
    copier: RecordToRowCopier,
    timestamp_function: Option<Function>,
    structure_version: u64,
}

impl InsertStatement {
    /// Target table
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Structure version the statement was compiled against
    pub fn structure_version(&self) -> u64 {
        self.structure_version
    }

    /// Append and commit one row. Fails with `ReaderOutOfDate` when the
    /// table's structure moved since compilation; the caller re-compiles.
    pub fn execute(&self) -> Result<()> {
        let mut writer = self.engine.writer(&self.table_name)?;
        if writer.structure_version() != self.structure_version {
            return Err(Error::ReaderOutOfDate);
        }
        let base = EmptyRecord;
        let record = VirtualRecord::new(&self.functions, &base);
        match self.timestamp_function {
            Some(ref ts) => {
                let row = writer.new_row_at(ts.get_timestamp(&base))?;
                self.copier.copy(&record, &mut *row);
                row.append();
            }
            None => {
                let row = writer.new_row();
                self.copier.copy(&record, &mut *row);
                row.append();
            }
        }
        writer.commit()
    }
}

/// Stream every record into the writer at its source timestamp
pub(crate) fn copy_ordered(
    writer: &mut dyn TableWriter,
    cursor: &mut dyn RecordCursor,
    copier: &RecordToRowCopier,
    cursor_timestamp_index: usize,
) -> Result<()> {
    while cursor.has_next() {
        let timestamp = cursor.record().get_timestamp(cursor_timestamp_index);
        let row = writer.new_row_at(timestamp)?;
        copier.copy(cursor.record(), &mut *row);
        row.append();
    }
    writer.commit()
}

/// Stream every record into the writer in source order
pub(crate) fn copy_unordered(
    writer: &mut dyn TableWriter,
    cursor: &mut dyn RecordCursor,
    copier: &RecordToRowCopier,
) -> Result<()> {
    while cursor.has_next() {
        let row = writer.new_row();
        copier.copy(cursor.record(), &mut *row);
        row.append();
    }
    writer.commit()
}

impl SqlCompiler {
    /// Compile INSERT ... VALUES into an executable statement
    pub(crate) fn insert(&mut self, model: &InsertModel) -> Result<CompiledQuery> {
        self.table_exists_or_fail(model.position, &model.table_name)?;

        // the validation reader is released before the statement ever
        // opens a writer
        let reader = self.engine.reader(&model.table_name).map_err(|e| match e {
            Error::ResourceBusy { message, .. } => Error::ResourceBusy {
                position: model.position,
                message,
            },
            other => other,
        })?;
        let structure_version = reader.structure_version();
        let metadata = reader.metadata();
        let timestamp_index = metadata.timestamp_index();
        let empty = RecordMetadata::new();

        let mut functions = Vec::new();
        let mut timestamp_function: Option<Function> = None;
        let filter;

        if !model.columns.is_empty() {
            let mut list = ColumnFilter::list();
            for (i, column) in model.columns.iter().enumerate() {
                let index = metadata
                    .column_index(&column.name)
                    .ok_or_else(|| Error::invalid_column(column.position, &column.name))?;
                let function =
                    self.function_parser
                        .parse_function(&self.pool, model.values[i], &empty)?;
                let value_position = self.pool.get(model.values[i]).position;
                let to = metadata.column(index).ty;
                let from = function.data_type();
                if !is_assignable_from(to, from) {
                    return Err(Error::semantic(
                        value_position,
                        format!("inconvertible types: {} -> {}", from, to),
                    ));
                }
                if Some(index) == timestamp_index {
                    timestamp_function = Some(function);
                } else {
                    functions.push(function);
                    list.push(index);
                }
            }
            filter = list;
        } else {
            let column_count = metadata.column_count();
            if model.values.len() != column_count {
                return Err(Error::syntax(
                    model.position,
                    "value count does not match column count",
                ));
            }
            for (i, &value) in model.values.iter().enumerate() {
                let function = self.function_parser.parse_function(&self.pool, value, &empty)?;
                let value_position = self.pool.get(value).position;
                let to = metadata.column(i).ty;
                let from = function.data_type();
                if !is_assignable_from(to, from) {
                    return Err(Error::semantic(
                        value_position,
                        format!("inconvertible types: {} -> {}", from, to),
                    ));
                }
                if Some(i) == timestamp_index {
                    timestamp_function = Some(function.clone());
                }
                // positions must line up with the entity filter, so the
                // timestamp function stays in place as well
                functions.push(function);
            }
            filter = ColumnFilter::entity(column_count);
        }

        if timestamp_index.is_some() && timestamp_function.is_none() {
            return Err(Error::semantic(0, "insert statement must populate timestamp"));
        }

        let copier = assemble_row_copier(&FunctionTypes(&functions), metadata, &filter)?;

        Ok(CompiledQuery::Insert(InsertStatement {
            engine: Arc::clone(&self.engine),
            table_name: model.table_name.clone(),
            functions,
            copier,
            timestamp_function,
            structure_version,
        }))
    }

    /// INSERT AS SELECT: stream the source cursor into the writer,
    /// chronologically when the table has a designated timestamp
    pub(crate) fn insert_as_select(&mut self, model: &InsertModel) -> Result<CompiledQuery> {
        let query = model
            .query
            .as_ref()
            .ok_or_else(|| Error::internal(model.position, "insert model has no query"))?;
        self.table_exists_or_fail(model.position, &model.table_name)?;

        let mut writer = self.engine.writer(&model.table_name).map_err(|e| match e {
            Error::ResourceBusy { message, .. } => Error::ResourceBusy {
                position: model.position,
                message,
            },
            other => other,
        })?;
        let factory = self.code_generator.generate(query, &self.pool)?;
        let cursor_metadata = factory.metadata();
        let writer_metadata = writer.metadata().clone();
        let writer_timestamp = writer_metadata.timestamp_index();
        let cursor_timestamp = cursor_metadata.timestamp_index();

        // the target needs chronological data the cursor cannot provide
        if writer_timestamp.is_some() && cursor_timestamp.is_none() {
            return Err(Error::semantic(
                model.position,
                "select clause must provide timestamp column",
            ));
        }

        let copier;
        if !model.columns.is_empty() {
            if model.columns.len() > cursor_metadata.column_count() {
                return Err(Error::semantic(model.position, "column count mismatch"));
            }
            let mut list = ColumnFilter::list();
            let mut has_timestamp = false;
            for (i, column) in model.columns.iter().enumerate() {
                let index = writer_metadata
                    .column_index(&column.name)
                    .ok_or_else(|| Error::invalid_column(column.position, &column.name))?;
                if Some(index) == writer_timestamp {
                    has_timestamp = true;
                }
                let from = cursor_metadata.column(i).ty;
                let to = writer_metadata.column(index).ty;
                if !is_assignable_from(to, from) {
                    return Err(Error::semantic(
                        column.position,
                        format!("inconvertible types: {} -> {}", from, to),
                    ));
                }
                list.push(index);
            }
            if writer_timestamp.is_some() && !has_timestamp {
                return Err(Error::semantic(
                    model.columns[0].position,
                    "column list must include timestamp",
                ));
            }
            copier = assemble_row_copier(cursor_metadata, &writer_metadata, &list)?;
        } else {
            let n = writer_metadata.column_count();
            if n > cursor_metadata.column_count() {
                return Err(Error::semantic(
                    model.select_position,
                    "not enough columns selected",
                ));
            }
            for i in 0..n {
                let from = cursor_metadata.column(i).ty;
                let to = writer_metadata.column(i).ty;
                if is_assignable_from(to, from) {
                    continue;
                }
                let position = query
                    .columns
                    .get(i)
                    .map(|c| c.position)
                    .unwrap_or(model.select_position);
                return Err(Error::semantic(
                    position,
                    format!("inconvertible types: {} -> {}", from, to),
                ));
            }
            copier = assemble_row_copier(
                cursor_metadata,
                &writer_metadata,
                &ColumnFilter::entity(n),
            )?;
        }

        let streamed = {
            let mut cursor = factory.cursor()?;
            match (writer_timestamp, cursor_timestamp) {
                (Some(_), Some(ts)) => copy_ordered(writer.as_mut(), cursor.as_mut(), &copier, ts),
                _ => copy_unordered(writer.as_mut(), cursor.as_mut(), &copier),
            }
        };

        match streamed {
            Ok(()) => Ok(CompiledQuery::InsertAsSelect),
            Err(e) => {
                // roll back whatever streamed before the failure
                writer.rollback();
                Err(e)
            }
        }
    }

    /// COPY: stdin hands the loader to the caller, a local file streams
    /// through it here
    pub(crate) fn execute_copy(&mut self, model: &CopyModel) -> Result<CompiledQuery> {
        {
            let mut loader = self.text_loader.lock();
            loader.clear();
            loader.set_state(LoadState::AnalyzeStructure);
            loader.configure_destination(&model.table_name, false, Atomicity::SkipRow);
        }
        if model.is_stdin() {
            return Ok(CompiledQuery::CopyRemote(Arc::clone(&self.text_loader)));
        }
        self.copy_table(model)?;
        Ok(CompiledQuery::CopyLocal)
    }

    fn copy_table(&mut self, model: &CopyModel) -> Result<()> {
        let mut file = File::open(&model.file_name).map_err(|e| {
            Error::io(
                model.file_position,
                e.raw_os_error().unwrap_or(0),
                "could not open file",
            )
        })?;
        let file_len = file
            .metadata()
            .map(|m| m.len())
            .map_err(|e| {
                Error::io(
                    model.file_position,
                    e.raw_os_error().unwrap_or(0),
                    "could not read file",
                )
            })?;

        let mut buffer = vec![0u8; self.config.copy_buffer_size.max(1)];
        let mut loader = self.text_loader.lock();
        let mut total: u64 = 0;
        let mut analysed = false;

        let streamed: Result<()> = loop {
            let read = match file.read(&mut buffer) {
                Ok(read) => read,
                Err(e) => {
                    break Err(Error::io(
                        model.file_position,
                        e.raw_os_error().unwrap_or(0),
                        "could not read file",
                    ))
                }
            };
            if read == 0 {
                if total < file_len {
                    break Err(Error::io(
                        model.file_position,
                        0,
                        "could not read file",
                    ));
                }
                break Ok(());
            }
            total += read as u64;
            let parsed = loader.parse(&buffer[..read]);
            if !analysed {
                loader.set_state(LoadState::LoadData);
                analysed = true;
            }
            if let Err(e) = parsed {
                // row-level import errors follow the loader's skip-row
                // policy and do not fail the statement
                info!("text import error [file={}, error={}]", model.file_name, e);
            }
        };

        streamed?;
        if analysed {
            if let Err(e) = loader.wrap_up() {
                info!("text import error [file={}, error={}]", model.file_name, e);
            }
        }
        info!("copied [file={}, bytes={}]", model.file_name, total);
        Ok(())
    }
}
