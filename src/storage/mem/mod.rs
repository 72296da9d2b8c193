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

//! In-memory columnar table store
//!
//! Tables hold typed column vectors. Commits publish a fresh snapshot
//! behind an `Arc` swap, so readers pin an immutable snapshot and never
//! observe uncommitted rows. Writers are exclusive per table; name locks
//! serialise CREATE; reader locks let TRUNCATE exclude active queries.

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::error::{Error, Result};
use crate::core::types::{ColumnType, Long256, PartitionBy, NULL_CHAR, NULL_INT, NULL_LONG};
use crate::core::value::Value;
use crate::storage::traits::{
    ColumnMeta, RecordMetadata, Row, StorageEngine, TableReader, TableStatus, TableStructure,
    TableWriter,
};

/// One typed column vector; DATE/TIMESTAMP store epoch longs, SYMBOL
/// shares the string representation
#[derive(Debug, Clone)]
enum Column {
    Bool(Vec<bool>),
    Byte(Vec<i8>),
    Short(Vec<i16>),
    Char(Vec<char>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Str(Vec<Option<String>>),
    Long256(Vec<Long256>),
    Bin(Vec<Option<Vec<u8>>>),
}

impl Column {
    fn for_type(ty: ColumnType) -> Column {
        match ty {
            ColumnType::Boolean => Column::Bool(Vec::new()),
            ColumnType::Byte => Column::Byte(Vec::new()),
            ColumnType::Short => Column::Short(Vec::new()),
            ColumnType::Char => Column::Char(Vec::new()),
            ColumnType::Int => Column::Int(Vec::new()),
            ColumnType::Long | ColumnType::Date | ColumnType::Timestamp => Column::Long(Vec::new()),
            ColumnType::Float => Column::Float(Vec::new()),
            ColumnType::Double => Column::Double(Vec::new()),
            ColumnType::String | ColumnType::Symbol => Column::Str(Vec::new()),
            ColumnType::Long256 => Column::Long256(Vec::new()),
            ColumnType::Binary => Column::Bin(Vec::new()),
        }
    }

    fn push_null(&mut self) {
        match self {
            Column::Bool(v) => v.push(false),
            Column::Byte(v) => v.push(0),
            Column::Short(v) => v.push(0),
            Column::Char(v) => v.push(NULL_CHAR),
            Column::Int(v) => v.push(NULL_INT),
            Column::Long(v) => v.push(NULL_LONG),
            Column::Float(v) => v.push(f32::NAN),
            Column::Double(v) => v.push(f64::NAN),
            Column::Str(v) => v.push(None),
            Column::Long256(v) => v.push(Long256::NULL),
            Column::Bin(v) => v.push(None),
        }
    }

    fn push_value(&mut self, value: &Value) {
        match (self, value) {
            (Column::Bool(v), Value::Boolean(x)) => v.push(*x),
            (Column::Byte(v), Value::Byte(x)) => v.push(*x),
            (Column::Short(v), Value::Short(x)) => v.push(*x),
            (Column::Char(v), Value::Char(x)) => v.push(*x),
            (Column::Int(v), Value::Int(x)) => v.push(*x),
            (Column::Long(v), Value::Long(x) | Value::Date(x) | Value::Timestamp(x)) => v.push(*x),
            (Column::Float(v), Value::Float(x)) => v.push(*x),
            (Column::Double(v), Value::Double(x)) => v.push(*x),
            (Column::Str(v), Value::Str(x) | Value::Sym(x)) => v.push(x.clone()),
            (Column::Long256(v), Value::Long256(x)) => v.push(*x),
            (Column::Bin(v), Value::Bin(x)) => v.push(x.clone()),
            (col, _) => col.push_null(),
        }
    }
}

/// An immutable, committed snapshot of a table's data
#[derive(Debug, Clone)]
struct TableData {
    columns: Vec<Column>,
    row_count: usize,
    max_timestamp: i64,
}

impl TableData {
    fn empty(metadata: &RecordMetadata) -> Self {
        Self {
            columns: metadata.columns().map(|c| Column::for_type(c.ty)).collect(),
            row_count: 0,
            max_timestamp: NULL_LONG,
        }
    }
}

struct TableState {
    metadata: RecordMetadata,
    data: Arc<TableData>,
}

/// One table of the store
struct MemTable {
    name: String,
    #[allow(dead_code)]
    partition_by: PartitionBy,
    state: RwLock<TableState>,
    structure_version: AtomicU64,
    writer_busy: AtomicBool,
    reader_count: AtomicUsize,
    readers_locked: AtomicBool,
}

/// In-memory implementation of the table store
pub struct MemEngine {
    tables: RwLock<FxHashMap<String, Arc<MemTable>>>,
    name_locks: Mutex<FxHashSet<String>>,
}

impl MemEngine {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(FxHashMap::default()),
            name_locks: Mutex::new(FxHashSet::default()),
        }
    }

    fn table(&self, name: &str) -> Result<Arc<MemTable>> {
        self.tables
            .read()
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| Error::internal(0, format!("table '{}' does not exist", name)))
    }
}

impl Default for MemEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine for MemEngine {
    fn status(&self, name: &str) -> TableStatus {
        let key = name.to_lowercase();
        if self.tables.read().contains_key(&key) {
            TableStatus::Exists
        } else if self.name_locks.lock().contains(&key) {
            TableStatus::Reserved
        } else {
            TableStatus::DoesNotExist
        }
    }

    fn lock_name(&self, name: &str) -> bool {
        self.name_locks.lock().insert(name.to_lowercase())
    }

    fn unlock_name(&self, name: &str, writer: Option<Box<dyn TableWriter>>) {
        drop(writer);
        self.name_locks.lock().remove(&name.to_lowercase());
    }

    fn create_table(&self, structure: &dyn TableStructure) -> Result<()> {
        let mut metadata = RecordMetadata::new();
        for i in 0..structure.column_count() {
            metadata.add(ColumnMeta {
                name: structure.column_name(i).to_string(),
                ty: structure.column_type(i),
                symbol_capacity: structure.symbol_capacity(i),
                symbol_cache: structure.symbol_cache_flag(i),
                indexed: structure.indexed_flag(i),
                index_block_capacity: structure.index_block_capacity(i),
            });
        }
        metadata.set_timestamp_index(structure.timestamp_index());

        let key = structure.table_name().to_lowercase();
        let mut tables = self.tables.write();
        if tables.contains_key(&key) {
            return Err(Error::internal(
                0,
                format!("table '{}' already exists", structure.table_name()),
            ));
        }
        let data = Arc::new(TableData::empty(&metadata));
        tables.insert(
            key,
            Arc::new(MemTable {
                name: structure.table_name().to_string(),
                partition_by: structure.partition_by(),
                state: RwLock::new(TableState { metadata, data }),
                structure_version: AtomicU64::new(0),
                writer_busy: AtomicBool::new(false),
                reader_count: AtomicUsize::new(0),
                readers_locked: AtomicBool::new(false),
            }),
        );
        Ok(())
    }

    fn reader(&self, name: &str) -> Result<Box<dyn TableReader>> {
        let table = self.table(name)?;
        if table.readers_locked.load(Ordering::Acquire) {
            return Err(Error::busy(
                0,
                format!("table '{}' is locked for readers", name),
            ));
        }
        table.reader_count.fetch_add(1, Ordering::AcqRel);
        let (metadata, data) = {
            let state = table.state.read();
            (state.metadata.clone(), Arc::clone(&state.data))
        };
        let version = table.structure_version.load(Ordering::Acquire);
        Ok(Box::new(MemReader {
            table,
            metadata,
            data,
            version,
        }))
    }

    fn writer(&self, name: &str) -> Result<Box<dyn TableWriter>> {
        let table = self.table(name)?;
        if table
            .writer_busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::busy(0, format!("table '{}' is busy", name)));
        }
        let metadata = table.state.read().metadata.clone();
        Ok(Box::new(MemWriter {
            table,
            metadata,
            staged: Vec::new(),
            staged_max_timestamp: NULL_LONG,
            current: Vec::new(),
        }))
    }

    fn table_metadata(&self, name: &str) -> Result<RecordMetadata> {
        Ok(self.table(name)?.state.read().metadata.clone())
    }

    fn lock_readers(&self, name: &str) -> bool {
        match self.table(name) {
            Ok(table) => {
                if table.reader_count.load(Ordering::Acquire) > 0 {
                    return false;
                }
                table
                    .readers_locked
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
            }
            Err(_) => false,
        }
    }

    fn unlock_readers(&self, name: &str) {
        if let Ok(table) = self.table(name) {
            table.readers_locked.store(false, Ordering::Release);
        }
    }

    fn remove(&self, name: &str) -> Result<()> {
        let key = name.to_lowercase();
        let table = self.table(name)?;
        if table.writer_busy.load(Ordering::Acquire) {
            return Err(Error::busy(0, format!("table '{}' is busy", name)));
        }
        self.tables.write().remove(&key);
        Ok(())
    }

    fn remove_directory(&self, name: &str) -> bool {
        self.tables.write().remove(&name.to_lowercase());
        true
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from_key = from.to_lowercase();
        let to_key = to.to_lowercase();
        let mut tables = self.tables.write();
        if tables.contains_key(&to_key) {
            return Err(Error::internal(0, format!("table '{}' already exists", to)));
        }
        let table = tables
            .remove(&from_key)
            .ok_or_else(|| Error::internal(0, format!("table '{}' does not exist", from)))?;
        if table.writer_busy.load(Ordering::Acquire) {
            tables.insert(from_key, table);
            return Err(Error::busy(0, format!("table '{}' is busy", from)));
        }
        tables.insert(to_key, table);
        Ok(())
    }
}

/// Reader over a pinned snapshot
struct MemReader {
    table: Arc<MemTable>,
    metadata: RecordMetadata,
    data: Arc<TableData>,
    version: u64,
}

impl Drop for MemReader {
    fn drop(&mut self) {
        self.table.reader_count.fetch_sub(1, Ordering::AcqRel);
    }
}

impl TableReader for MemReader {
    fn name(&self) -> &str {
        &self.table.name
    }

    fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    fn structure_version(&self) -> u64 {
        self.version
    }

    fn row_count(&self) -> usize {
        self.data.row_count
    }

    fn get_bool(&self, row: usize, col: usize) -> bool {
        match &self.data.columns[col] {
            Column::Bool(v) => v[row],
            _ => false,
        }
    }

    fn get_byte(&self, row: usize, col: usize) -> i8 {
        match &self.data.columns[col] {
            Column::Byte(v) => v[row],
            _ => 0,
        }
    }

    fn get_short(&self, row: usize, col: usize) -> i16 {
        match &self.data.columns[col] {
            Column::Short(v) => v[row],
            _ => 0,
        }
    }

    fn get_char(&self, row: usize, col: usize) -> char {
        match &self.data.columns[col] {
            Column::Char(v) => v[row],
            _ => NULL_CHAR,
        }
    }

    fn get_int(&self, row: usize, col: usize) -> i32 {
        match &self.data.columns[col] {
            Column::Int(v) => v[row],
            _ => NULL_INT,
        }
    }

    fn get_long(&self, row: usize, col: usize) -> i64 {
        match &self.data.columns[col] {
            Column::Long(v) => v[row],
            _ => NULL_LONG,
        }
    }

    fn get_float(&self, row: usize, col: usize) -> f32 {
        match &self.data.columns[col] {
            Column::Float(v) => v[row],
            _ => f32::NAN,
        }
    }

    fn get_double(&self, row: usize, col: usize) -> f64 {
        match &self.data.columns[col] {
            Column::Double(v) => v[row],
            _ => f64::NAN,
        }
    }

    fn get_str(&self, row: usize, col: usize) -> Option<Cow<'_, str>> {
        match &self.data.columns[col] {
            Column::Str(v) => v[row].as_deref().map(Cow::Borrowed),
            _ => None,
        }
    }

    fn get_sym(&self, row: usize, col: usize) -> Option<Cow<'_, str>> {
        self.get_str(row, col)
    }

    fn get_bin(&self, row: usize, col: usize) -> Option<Cow<'_, [u8]>> {
        match &self.data.columns[col] {
            Column::Bin(v) => v[row].as_deref().map(Cow::Borrowed),
            _ => None,
        }
    }

    fn get_long256(&self, row: usize, col: usize) -> Long256 {
        match &self.data.columns[col] {
            Column::Long256(v) => v[row],
            _ => Long256::NULL,
        }
    }
}

/// Exclusive writer; staged rows publish on commit
struct MemWriter {
    table: Arc<MemTable>,
    metadata: RecordMetadata,
    staged: Vec<Vec<Value>>,
    staged_max_timestamp: i64,
    current: Vec<Value>,
}

impl MemWriter {
    fn null_row(&self) -> Vec<Value> {
        self.metadata
            .columns()
            .map(|c| match c.ty {
                ColumnType::Boolean => Value::Boolean(false),
                ColumnType::Byte => Value::Byte(0),
                ColumnType::Short => Value::Short(0),
                ColumnType::Char => Value::Char(NULL_CHAR),
                ColumnType::Int => Value::Int(NULL_INT),
                ColumnType::Long => Value::Long(NULL_LONG),
                ColumnType::Date => Value::Date(NULL_LONG),
                ColumnType::Timestamp => Value::Timestamp(NULL_LONG),
                ColumnType::Float => Value::Float(f32::NAN),
                ColumnType::Double => Value::Double(f64::NAN),
                ColumnType::String => Value::Str(None),
                ColumnType::Symbol => Value::Sym(None),
                ColumnType::Long256 => Value::Long256(Long256::NULL),
                ColumnType::Binary => Value::Bin(None),
            })
            .collect()
    }

    fn last_timestamp(&self) -> i64 {
        if self.staged_max_timestamp != NULL_LONG {
            self.staged_max_timestamp
        } else {
            self.table.state.read().data.max_timestamp
        }
    }
}

impl Drop for MemWriter {
    fn drop(&mut self) {
        self.table.writer_busy.store(false, Ordering::Release);
    }
}

impl TableWriter for MemWriter {
    fn name(&self) -> &str {
        &self.table.name
    }

    fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    fn structure_version(&self) -> u64 {
        self.table.structure_version.load(Ordering::Acquire)
    }

    fn new_row(&mut self) -> &mut dyn Row {
        self.current = self.null_row();
        self
    }

    fn new_row_at(&mut self, timestamp: i64) -> Result<&mut dyn Row> {
        let last = self.last_timestamp();
        if last != NULL_LONG && timestamp < last {
            return Err(Error::internal(0, "cannot insert rows out of order"));
        }
        self.current = self.null_row();
        if let Some(ts_index) = self.metadata.timestamp_index() {
            self.current[ts_index] = Value::Timestamp(timestamp);
        }
        self.staged_max_timestamp = timestamp;
        Ok(self)
    }

    fn commit(&mut self) -> Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }
        let mut state = self.table.state.write();
        let mut data = (*state.data).clone();
        for row in self.staged.drain(..) {
            for (col, value) in data.columns.iter_mut().zip(row.iter()) {
                col.push_value(value);
            }
            data.row_count += 1;
        }
        if self.staged_max_timestamp != NULL_LONG {
            data.max_timestamp = self.staged_max_timestamp;
        }
        self.staged_max_timestamp = NULL_LONG;
        state.data = Arc::new(data);
        Ok(())
    }

    fn rollback(&mut self) {
        self.staged.clear();
        self.staged_max_timestamp = NULL_LONG;
    }

    fn truncate(&mut self) -> Result<()> {
        self.staged.clear();
        self.staged_max_timestamp = NULL_LONG;
        let mut state = self.table.state.write();
        state.data = Arc::new(TableData::empty(&self.metadata));
        Ok(())
    }

    fn add_column(
        &mut self,
        name: &str,
        ty: ColumnType,
        symbol_capacity: usize,
        symbol_cache: bool,
        indexed: bool,
        index_block_capacity: usize,
    ) -> Result<()> {
        if self.metadata.column_index(name).is_some() {
            return Err(Error::internal(0, format!("column '{}' already exists", name)));
        }
        let mut state = self.table.state.write();
        let meta = ColumnMeta {
            name: name.to_string(),
            ty,
            symbol_capacity,
            symbol_cache,
            indexed,
            index_block_capacity,
        };
        state.metadata.add(meta.clone());
        let mut data = (*state.data).clone();
        let mut column = Column::for_type(ty);
        for _ in 0..data.row_count {
            column.push_null();
        }
        data.columns.push(column);
        state.data = Arc::new(data);
        self.metadata.add(meta);
        self.table.structure_version.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn remove_column(&mut self, name: &str) -> Result<()> {
        let index = self
            .metadata
            .column_index(name)
            .ok_or_else(|| Error::internal(0, format!("column '{}' does not exist", name)))?;
        let mut state = self.table.state.write();
        state.metadata.remove(index);
        let mut data = (*state.data).clone();
        data.columns.remove(index);
        state.data = Arc::new(data);
        self.metadata.remove(index);
        self.table.structure_version.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

impl Row for MemWriter {
    fn put_bool(&mut self, col: usize, value: bool) {
        self.current[col] = Value::Boolean(value);
    }
    fn put_byte(&mut self, col: usize, value: i8) {
        self.current[col] = Value::Byte(value);
    }
    fn put_short(&mut self, col: usize, value: i16) {
        self.current[col] = Value::Short(value);
    }
    fn put_char(&mut self, col: usize, value: char) {
        self.current[col] = Value::Char(value);
    }
    fn put_int(&mut self, col: usize, value: i32) {
        self.current[col] = Value::Int(value);
    }
    fn put_long(&mut self, col: usize, value: i64) {
        self.current[col] = Value::Long(value);
    }
    fn put_date(&mut self, col: usize, value: i64) {
        self.current[col] = Value::Date(value);
    }
    fn put_timestamp(&mut self, col: usize, value: i64) {
        self.current[col] = Value::Timestamp(value);
    }
    fn put_float(&mut self, col: usize, value: f32) {
        self.current[col] = Value::Float(value);
    }
    fn put_double(&mut self, col: usize, value: f64) {
        self.current[col] = Value::Double(value);
    }
    fn put_str(&mut self, col: usize, value: Option<&str>) {
        self.current[col] = Value::Str(value.map(str::to_string));
    }
    fn put_sym(&mut self, col: usize, value: Option<&str>) {
        self.current[col] = Value::Sym(value.map(str::to_string));
    }
    fn put_bin(&mut self, col: usize, value: Option<&[u8]>) {
        self.current[col] = Value::Bin(value.map(<[u8]>::to_vec));
    }
    fn put_long256(&mut self, col: usize, value: Long256) {
        self.current[col] = Value::Long256(value);
    }
    fn append(&mut self) {
        let row = std::mem::take(&mut self.current);
        self.staged.push(row);
    }
}
