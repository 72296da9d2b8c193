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

//! Code generator
//!
//! Turns an optimised query model into a tree of record cursor
//! factories: table scan at the leaves, then nested-loop joins, filter,
//! projection, sort and limit. Factories are reusable; each `cursor()`
//! call opens a fresh stream over current table data and fails with
//! `ReaderOutOfDate` when the table's structure moved under a compiled
//! factory.

use std::borrow::Cow;
use std::sync::Arc;

use crate::core::error::{Error, Result};
use crate::core::types::{ColumnType, Long256, NULL_CHAR, NULL_INT, NULL_LONG};
use crate::core::value::Value;
use crate::functions::{Function, FunctionParser};
use crate::parser::ast::{ExprKind, JoinKind, QueryModel};
use crate::parser::pool::ExprPool;
use crate::storage::traits::{
    ColumnMeta, Record, RecordCursor, RecordCursorFactory, RecordMetadata, StorageEngine,
    TableReader,
};

/// Generates cursor factories from optimised query models
pub struct SqlCodeGenerator {
    engine: Arc<dyn StorageEngine>,
    function_parser: FunctionParser,
}

impl SqlCodeGenerator {
    /// Create a code generator over the given engine
    pub fn new(engine: Arc<dyn StorageEngine>) -> Self {
        Self {
            engine,
            function_parser: FunctionParser::new(),
        }
    }

    /// Generate the factory tree for `model`
    pub fn generate(
        &self,
        model: &QueryModel,
        pool: &ExprPool,
    ) -> Result<Box<dyn RecordCursorFactory>> {
        if let Some(&first) = model.group_by.first() {
            return Err(Error::not_supported(
                pool.get(first).position,
                "GROUP BY is not supported",
            ));
        }
        if let Some(sample) = model.sample_by {
            return Err(Error::not_supported(
                pool.get(sample).position,
                "SAMPLE BY is not supported",
            ));
        }

        let mut factory = self.generate_source(model, pool)?;

        if let Some(where_clause) = model.where_clause {
            let filter =
                self.function_parser
                    .parse_function(pool, where_clause, factory.metadata())?;
            if filter.data_type() != ColumnType::Boolean {
                return Err(Error::semantic(
                    pool.get(where_clause).position,
                    "boolean expression expected",
                ));
            }
            let metadata = factory.metadata().clone();
            factory = Box::new(FilterFactory {
                base: factory,
                filter,
                metadata,
            });
        }

        // ORDER BY keys naming projection outputs sort the projected
        // rows; keys naming underlying columns sort before projecting
        if model.columns.is_empty() {
            if !model.order_by.is_empty() {
                factory = self.generate_order_by(model, pool, factory)?;
            }
        } else if model.order_by.is_empty() || self.order_keys_are_projected(model, pool) {
            factory = self.generate_projection(model, pool, factory)?;
            if !model.order_by.is_empty() {
                factory = self.generate_order_by(model, pool, factory)?;
            }
        } else {
            factory = self.generate_order_by(model, pool, factory)?;
            factory = self.generate_projection(model, pool, factory)?;
        }

        if let Some(limit) = model.limit {
            let f = self
                .function_parser
                .parse_function(pool, limit, &RecordMetadata::new())?;
            if !f.is_constant() || !f.data_type().is_numeric() {
                return Err(Error::semantic(
                    pool.get(limit).position,
                    "constant row count expected",
                ));
            }
            let count = f.get_long(&crate::functions::EmptyRecord).max(0) as usize;
            let metadata = factory.metadata().clone();
            factory = Box::new(LimitFactory {
                base: factory,
                limit: count,
                metadata,
            });
        }

        Ok(factory)
    }

    /// Scan, nested model, and join plumbing
    fn generate_source(
        &self,
        model: &QueryModel,
        pool: &ExprPool,
    ) -> Result<Box<dyn RecordCursorFactory>> {
        let mut factory: Box<dyn RecordCursorFactory> = if let Some(ref nested) = model.nested {
            self.generate(nested, pool)?
        } else if let Some(ref table) = model.table {
            self.scan(&table.name, table.position)?
        } else {
            return Err(Error::internal(model.position, "query model has no source"));
        };

        for join in &model.joins {
            let right = self.scan(&join.table.name, join.table.position)?;
            let right_label = join.alias.clone().unwrap_or_else(|| join.table.name.clone());
            let left_label = model
                .alias
                .clone()
                .or_else(|| model.table.as_ref().map(|t| t.name.clone()));
            let metadata =
                join_metadata(factory.metadata(), left_label.as_deref(), right.metadata(), &right_label);

            let filter = match (join.kind, join.on) {
                (JoinKind::Inner, Some(on)) => {
                    let f = self.function_parser.parse_function(pool, on, &metadata)?;
                    if f.data_type() != ColumnType::Boolean {
                        return Err(Error::semantic(
                            pool.get(on).position,
                            "boolean expression expected",
                        ));
                    }
                    Some(f)
                }
                _ => None,
            };

            factory = Box::new(NestedLoopJoinFactory {
                left: factory,
                right,
                filter,
                metadata,
            });
        }

        Ok(factory)
    }

    fn scan(&self, table: &str, position: usize) -> Result<Box<dyn RecordCursorFactory>> {
        let metadata = self
            .engine
            .table_metadata(table)
            .map_err(|_| Error::semantic(position, format!("table '{}' does not exist", table)))?;
        let version = self
            .engine
            .reader(table)
            .map_err(reposition(position))?
            .structure_version();
        Ok(Box::new(TableScanFactory {
            engine: Arc::clone(&self.engine),
            table: table.to_string(),
            metadata,
            version,
        }))
    }

    fn generate_projection(
        &self,
        model: &QueryModel,
        pool: &ExprPool,
        base: Box<dyn RecordCursorFactory>,
    ) -> Result<Box<dyn RecordCursorFactory>> {
        let mut functions = Vec::with_capacity(model.columns.len());
        let mut metadata = RecordMetadata::new();
        let base_timestamp = base.metadata().timestamp_index();
        let mut timestamp_index = None;

        for (i, column) in model.columns.iter().enumerate() {
            let function =
                self.function_parser
                    .parse_function(pool, column.ast, base.metadata())?;
            let ast = pool.get(column.ast);
            let name = column.alias.clone().unwrap_or_else(|| {
                if ast.kind == ExprKind::Literal {
                    ast.token.clone()
                } else {
                    format!("column{}", i + 1)
                }
            });
            if let Function::Column { index, .. } = &function {
                if Some(*index) == base_timestamp {
                    timestamp_index = Some(i);
                }
            }
            metadata.add(ColumnMeta::new(name, function.data_type()));
            functions.push(function);
        }
        metadata.set_timestamp_index(timestamp_index);

        Ok(Box::new(VirtualFactory {
            base,
            functions,
            metadata,
        }))
    }

    /// True when every ORDER BY key names a projected column or alias
    fn order_keys_are_projected(&self, model: &QueryModel, pool: &ExprPool) -> bool {
        model.order_by.iter().all(|item| {
            let expr = pool.get(item.expr);
            expr.kind == ExprKind::Literal
                && model.columns.iter().any(|column| {
                    if let Some(ref alias) = column.alias {
                        if alias.eq_ignore_ascii_case(&expr.token) {
                            return true;
                        }
                    }
                    let ast = pool.get(column.ast);
                    ast.kind == ExprKind::Literal && ast.token.eq_ignore_ascii_case(&expr.token)
                })
        })
    }

    fn generate_order_by(
        &self,
        model: &QueryModel,
        pool: &ExprPool,
        base: Box<dyn RecordCursorFactory>,
    ) -> Result<Box<dyn RecordCursorFactory>> {
        let mut keys = Vec::with_capacity(model.order_by.len());
        for item in &model.order_by {
            let expr = pool.get(item.expr);
            if expr.kind != ExprKind::Literal {
                return Err(Error::semantic(
                    expr.position,
                    "column name expected in ORDER BY",
                ));
            }
            let index = base
                .metadata()
                .column_index(&expr.token)
                .ok_or_else(|| Error::invalid_column(expr.position, &expr.token))?;
            keys.push((index, item.descending));
        }
        let metadata = base.metadata().clone();
        Ok(Box::new(OrderByFactory {
            base,
            keys,
            metadata,
        }))
    }
}

fn reposition(position: usize) -> impl Fn(Error) -> Error {
    move |e| match e {
        Error::Internal { message, .. } => Error::Semantic { position, message },
        Error::ResourceBusy { message, .. } => Error::ResourceBusy { position, message },
        other => other,
    }
}

/// Combined shape of a join; column names are qualified only when the
/// bare name is ambiguous across the two sides
fn join_metadata(
    left: &RecordMetadata,
    left_label: Option<&str>,
    right: &RecordMetadata,
    right_label: &str,
) -> RecordMetadata {
    let mut metadata = RecordMetadata::new();
    let ambiguous = |name: &str| {
        left.column_index(name).is_some() && right.column_index(name).is_some()
    };
    for column in left.columns() {
        let mut meta = column.clone();
        if ambiguous(&column.name) {
            if let Some(label) = left_label {
                meta.name = format!("{}.{}", label, column.name);
            }
        }
        metadata.add(meta);
    }
    for column in right.columns() {
        let mut meta = column.clone();
        if ambiguous(&column.name) {
            meta.name = format!("{}.{}", right_label, column.name);
        }
        metadata.add(meta);
    }
    metadata.set_timestamp_index(left.timestamp_index());
    metadata
}

// =============================================================================
// Table scan
// =============================================================================

struct TableScanFactory {
    engine: Arc<dyn StorageEngine>,
    table: String,
    metadata: RecordMetadata,
    version: u64,
}

impl RecordCursorFactory for TableScanFactory {
    fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    fn cursor(&self) -> Result<Box<dyn RecordCursor + '_>> {
        let reader = self.engine.reader(&self.table)?;
        if reader.structure_version() != self.version {
            return Err(Error::ReaderOutOfDate);
        }
        Ok(Box::new(TableScanCursor { reader, row: 0 }))
    }
}

struct TableScanCursor {
    reader: Box<dyn TableReader>,
    /// 1-based position of the current row; 0 before the first advance
    row: usize,
}

impl RecordCursor for TableScanCursor {
    fn has_next(&mut self) -> bool {
        if self.row < self.reader.row_count() {
            self.row += 1;
            true
        } else {
            false
        }
    }

    fn record(&self) -> &dyn Record {
        self
    }
}

impl Record for TableScanCursor {
    fn get_bool(&self, col: usize) -> bool {
        self.reader.get_bool(self.row - 1, col)
    }
    fn get_byte(&self, col: usize) -> i8 {
        self.reader.get_byte(self.row - 1, col)
    }
    fn get_short(&self, col: usize) -> i16 {
        self.reader.get_short(self.row - 1, col)
    }
    fn get_char(&self, col: usize) -> char {
        self.reader.get_char(self.row - 1, col)
    }
    fn get_int(&self, col: usize) -> i32 {
        self.reader.get_int(self.row - 1, col)
    }
    fn get_long(&self, col: usize) -> i64 {
        self.reader.get_long(self.row - 1, col)
    }
    fn get_date(&self, col: usize) -> i64 {
        self.reader.get_long(self.row - 1, col)
    }
    fn get_timestamp(&self, col: usize) -> i64 {
        self.reader.get_long(self.row - 1, col)
    }
    fn get_float(&self, col: usize) -> f32 {
        self.reader.get_float(self.row - 1, col)
    }
    fn get_double(&self, col: usize) -> f64 {
        self.reader.get_double(self.row - 1, col)
    }
    fn get_str(&self, col: usize) -> Option<Cow<'_, str>> {
        self.reader.get_str(self.row - 1, col)
    }
    fn get_sym(&self, col: usize) -> Option<Cow<'_, str>> {
        self.reader.get_sym(self.row - 1, col)
    }
    fn get_bin(&self, col: usize) -> Option<Cow<'_, [u8]>> {
        self.reader.get_bin(self.row - 1, col)
    }
    fn get_long256(&self, col: usize) -> Long256 {
        self.reader.get_long256(self.row - 1, col)
    }
}

// =============================================================================
// Filter
// =============================================================================

struct FilterFactory {
    base: Box<dyn RecordCursorFactory>,
    filter: Function,
    metadata: RecordMetadata,
}

impl RecordCursorFactory for FilterFactory {
    fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    fn cursor(&self) -> Result<Box<dyn RecordCursor + '_>> {
        Ok(Box::new(FilterCursor {
            base: self.base.cursor()?,
            filter: &self.filter,
        }))
    }
}

struct FilterCursor<'a> {
    base: Box<dyn RecordCursor + 'a>,
    filter: &'a Function,
}

impl RecordCursor for FilterCursor<'_> {
    fn has_next(&mut self) -> bool {
        while self.base.has_next() {
            if self.filter.get_bool(self.base.record()) {
                return true;
            }
        }
        false
    }

    fn record(&self) -> &dyn Record {
        self.base.record()
    }
}

// =============================================================================
// Projection
// =============================================================================

struct VirtualFactory {
    base: Box<dyn RecordCursorFactory>,
    functions: Vec<Function>,
    metadata: RecordMetadata,
}

impl RecordCursorFactory for VirtualFactory {
    fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    fn cursor(&self) -> Result<Box<dyn RecordCursor + '_>> {
        Ok(Box::new(VirtualCursor {
            base: self.base.cursor()?,
            functions: &self.functions,
        }))
    }
}

struct VirtualCursor<'a> {
    base: Box<dyn RecordCursor + 'a>,
    functions: &'a [Function],
}

impl RecordCursor for VirtualCursor<'_> {
    fn has_next(&mut self) -> bool {
        self.base.has_next()
    }

    fn record(&self) -> &dyn Record {
        self
    }
}

impl Record for VirtualCursor<'_> {
    fn get_bool(&self, col: usize) -> bool {
        self.functions[col].get_bool(self.base.record())
    }
    fn get_byte(&self, col: usize) -> i8 {
        self.functions[col].get_byte(self.base.record())
    }
    fn get_short(&self, col: usize) -> i16 {
        self.functions[col].get_short(self.base.record())
    }
    fn get_char(&self, col: usize) -> char {
        self.functions[col].get_char(self.base.record())
    }
    fn get_int(&self, col: usize) -> i32 {
        self.functions[col].get_int(self.base.record())
    }
    fn get_long(&self, col: usize) -> i64 {
        self.functions[col].get_long(self.base.record())
    }
    fn get_date(&self, col: usize) -> i64 {
        self.functions[col].get_date(self.base.record())
    }
    fn get_timestamp(&self, col: usize) -> i64 {
        self.functions[col].get_timestamp(self.base.record())
    }
    fn get_float(&self, col: usize) -> f32 {
        self.functions[col].get_float(self.base.record())
    }
    fn get_double(&self, col: usize) -> f64 {
        self.functions[col].get_double(self.base.record())
    }
    fn get_str(&self, col: usize) -> Option<Cow<'_, str>> {
        self.functions[col].get_str(self.base.record())
    }
    fn get_sym(&self, col: usize) -> Option<Cow<'_, str>> {
        self.functions[col].get_sym(self.base.record())
    }
    fn get_bin(&self, col: usize) -> Option<Cow<'_, [u8]>> {
        self.functions[col].get_bin(self.base.record())
    }
    fn get_long256(&self, col: usize) -> Long256 {
        self.functions[col].get_long256(self.base.record())
    }
}

// =============================================================================
// Sort
// =============================================================================

struct OrderByFactory {
    base: Box<dyn RecordCursorFactory>,
    keys: Vec<(usize, bool)>,
    metadata: RecordMetadata,
}

impl RecordCursorFactory for OrderByFactory {
    fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    fn cursor(&self) -> Result<Box<dyn RecordCursor + '_>> {
        let mut rows: Vec<Vec<Value>> = Vec::new();
        {
            let mut cursor = self.base.cursor()?;
            while cursor.has_next() {
                rows.push(materialise(cursor.record(), &self.metadata));
            }
        }
        rows.sort_by(|a, b| {
            for &(index, descending) in &self.keys {
                let ordering = a[index].compare(&b[index]);
                let ordering = if descending { ordering.reverse() } else { ordering };
                if ordering != std::cmp::Ordering::Equal {
                    return ordering;
                }
            }
            std::cmp::Ordering::Equal
        });
        Ok(Box::new(RowBufferCursor { rows, row: 0 }))
    }
}

fn materialise(record: &dyn Record, metadata: &RecordMetadata) -> Vec<Value> {
    (0..metadata.column_count())
        .map(|col| Value::read_from(record, col, metadata.column(col).ty))
        .collect()
}

/// Cursor over fully materialised rows
struct RowBufferCursor {
    rows: Vec<Vec<Value>>,
    row: usize,
}

impl RecordCursor for RowBufferCursor {
    fn has_next(&mut self) -> bool {
        if self.row < self.rows.len() {
            self.row += 1;
            true
        } else {
            false
        }
    }

    fn record(&self) -> &dyn Record {
        self
    }
}

impl RowBufferCursor {
    fn cell(&self, col: usize) -> &Value {
        &self.rows[self.row - 1][col]
    }
}

impl Record for RowBufferCursor {
    fn get_bool(&self, col: usize) -> bool {
        matches!(self.cell(col), Value::Boolean(true))
    }
    fn get_byte(&self, col: usize) -> i8 {
        match self.cell(col) {
            Value::Byte(v) => *v,
            _ => 0,
        }
    }
    fn get_short(&self, col: usize) -> i16 {
        match self.cell(col) {
            Value::Short(v) => *v,
            _ => 0,
        }
    }
    fn get_char(&self, col: usize) -> char {
        match self.cell(col) {
            Value::Char(v) => *v,
            _ => NULL_CHAR,
        }
    }
    fn get_int(&self, col: usize) -> i32 {
        match self.cell(col) {
            Value::Int(v) => *v,
            _ => NULL_INT,
        }
    }
    fn get_long(&self, col: usize) -> i64 {
        match self.cell(col) {
            Value::Long(v) | Value::Date(v) | Value::Timestamp(v) => *v,
            _ => NULL_LONG,
        }
    }
    fn get_date(&self, col: usize) -> i64 {
        self.get_long(col)
    }
    fn get_timestamp(&self, col: usize) -> i64 {
        self.get_long(col)
    }
    fn get_float(&self, col: usize) -> f32 {
        match self.cell(col) {
            Value::Float(v) => *v,
            _ => f32::NAN,
        }
    }
    fn get_double(&self, col: usize) -> f64 {
        match self.cell(col) {
            Value::Double(v) => *v,
            _ => f64::NAN,
        }
    }
    fn get_str(&self, col: usize) -> Option<Cow<'_, str>> {
        match self.cell(col) {
            Value::Str(v) | Value::Sym(v) => v.as_deref().map(Cow::Borrowed),
            _ => None,
        }
    }
    fn get_sym(&self, col: usize) -> Option<Cow<'_, str>> {
        self.get_str(col)
    }
    fn get_bin(&self, col: usize) -> Option<Cow<'_, [u8]>> {
        match self.cell(col) {
            Value::Bin(v) => v.as_deref().map(Cow::Borrowed),
            _ => None,
        }
    }
    fn get_long256(&self, col: usize) -> Long256 {
        match self.cell(col) {
            Value::Long256(v) => *v,
            _ => Long256::NULL,
        }
    }
}

// =============================================================================
// Limit
// =============================================================================

struct LimitFactory {
    base: Box<dyn RecordCursorFactory>,
    limit: usize,
    metadata: RecordMetadata,
}

impl RecordCursorFactory for LimitFactory {
    fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    fn cursor(&self) -> Result<Box<dyn RecordCursor + '_>> {
        Ok(Box::new(LimitCursor {
            base: self.base.cursor()?,
            remaining: self.limit,
        }))
    }
}

struct LimitCursor<'a> {
    base: Box<dyn RecordCursor + 'a>,
    remaining: usize,
}

impl RecordCursor for LimitCursor<'_> {
    fn has_next(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        if self.base.has_next() {
            self.remaining -= 1;
            true
        } else {
            false
        }
    }

    fn record(&self) -> &dyn Record {
        self.base.record()
    }
}

// =============================================================================
// Nested-loop join
// =============================================================================

struct NestedLoopJoinFactory {
    left: Box<dyn RecordCursorFactory>,
    right: Box<dyn RecordCursorFactory>,
    filter: Option<Function>,
    metadata: RecordMetadata,
}

impl RecordCursorFactory for NestedLoopJoinFactory {
    fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    fn cursor(&self) -> Result<Box<dyn RecordCursor + '_>> {
        // the build side is materialised once per cursor
        let mut right_rows = Vec::new();
        {
            let mut right = self.right.cursor()?;
            while right.has_next() {
                right_rows.push(materialise(right.record(), self.right.metadata()));
            }
        }
        Ok(Box::new(NestedLoopJoinCursor {
            left: self.left.cursor()?,
            left_width: self.left.metadata().column_count(),
            left_live: false,
            right_rows,
            right_index: 0,
            filter: self.filter.as_ref(),
        }))
    }
}

struct NestedLoopJoinCursor<'a> {
    left: Box<dyn RecordCursor + 'a>,
    left_width: usize,
    left_live: bool,
    right_rows: Vec<Vec<Value>>,
    /// 1-based position into right_rows; 0 before the first advance
    right_index: usize,
    filter: Option<&'a Function>,
}

impl NestedLoopJoinCursor<'_> {
    fn advance(&mut self) -> bool {
        loop {
            if self.left_live && self.right_index < self.right_rows.len() {
                self.right_index += 1;
                return true;
            }
            if !self.left.has_next() {
                return false;
            }
            self.left_live = true;
            self.right_index = 0;
            if self.right_rows.is_empty() {
                return false;
            }
        }
    }
}

impl RecordCursor for NestedLoopJoinCursor<'_> {
    fn has_next(&mut self) -> bool {
        while self.advance() {
            match self.filter {
                Some(f) if !f.get_bool(self.record()) => continue,
                _ => return true,
            }
        }
        false
    }

    fn record(&self) -> &dyn Record {
        self
    }
}

impl NestedLoopJoinCursor<'_> {
    fn right_cell(&self, col: usize) -> &Value {
        &self.right_rows[self.right_index - 1][col - self.left_width]
    }
}

impl Record for NestedLoopJoinCursor<'_> {
    fn get_bool(&self, col: usize) -> bool {
        if col < self.left_width {
            self.left.record().get_bool(col)
        } else {
            matches!(self.right_cell(col), Value::Boolean(true))
        }
    }
    fn get_byte(&self, col: usize) -> i8 {
        if col < self.left_width {
            self.left.record().get_byte(col)
        } else {
            match self.right_cell(col) {
                Value::Byte(v) => *v,
                _ => 0,
            }
        }
    }
    fn get_short(&self, col: usize) -> i16 {
        if col < self.left_width {
            self.left.record().get_short(col)
        } else {
            match self.right_cell(col) {
                Value::Short(v) => *v,
                _ => 0,
            }
        }
    }
    fn get_char(&self, col: usize) -> char {
        if col < self.left_width {
            self.left.record().get_char(col)
        } else {
            match self.right_cell(col) {
                Value::Char(v) => *v,
                _ => NULL_CHAR,
            }
        }
    }
    fn get_int(&self, col: usize) -> i32 {
        if col < self.left_width {
            self.left.record().get_int(col)
        } else {
            match self.right_cell(col) {
                Value::Int(v) => *v,
                _ => NULL_INT,
            }
        }
    }
    fn get_long(&self, col: usize) -> i64 {
        if col < self.left_width {
            self.left.record().get_long(col)
        } else {
            match self.right_cell(col) {
                Value::Long(v) | Value::Date(v) | Value::Timestamp(v) => *v,
                _ => NULL_LONG,
            }
        }
    }
    fn get_date(&self, col: usize) -> i64 {
        self.get_long(col)
    }
    fn get_timestamp(&self, col: usize) -> i64 {
        self.get_long(col)
    }
    fn get_float(&self, col: usize) -> f32 {
        if col < self.left_width {
            self.left.record().get_float(col)
        } else {
            match self.right_cell(col) {
                Value::Float(v) => *v,
                _ => f32::NAN,
            }
        }
    }
    fn get_double(&self, col: usize) -> f64 {
        if col < self.left_width {
            self.left.record().get_double(col)
        } else {
            match self.right_cell(col) {
                Value::Double(v) => *v,
                _ => f64::NAN,
            }
        }
    }
    fn get_str(&self, col: usize) -> Option<Cow<'_, str>> {
        if col < self.left_width {
            self.left.record().get_str(col)
        } else {
            match self.right_cell(col) {
                Value::Str(v) | Value::Sym(v) => v.as_deref().map(Cow::Borrowed),
                _ => None,
            }
        }
    }
    fn get_sym(&self, col: usize) -> Option<Cow<'_, str>> {
        self.get_str(col)
    }
    fn get_bin(&self, col: usize) -> Option<Cow<'_, [u8]>> {
        if col < self.left_width {
            self.left.record().get_bin(col)
        } else {
            match self.right_cell(col) {
                Value::Bin(v) => v.as_deref().map(Cow::Borrowed),
                _ => None,
            }
        }
    }
    fn get_long256(&self, col: usize) -> Long256 {
        if col < self.left_width {
            self.left.record().get_long256(col)
        } else {
            match self.right_cell(col) {
                Value::Long256(v) => *v,
                _ => Long256::NULL,
            }
        }
    }
}
