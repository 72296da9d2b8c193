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

//! Reader, writer and row traits for table access
//!
//! Writers are exclusive per table and held only for the duration of a
//! mutation; readers are shared. A [`Row`] is a writer-side accumulator
//! with typed per-column setters and a final `append`.

use std::borrow::Cow;

use crate::core::error::Result;
use crate::core::types::{ColumnType, Long256, PartitionBy};

use super::cursor::RecordMetadata;

/// Structural description used to materialise a new table
pub trait TableStructure {
    /// Table name
    fn table_name(&self) -> &str;
    /// Number of columns
    fn column_count(&self) -> usize;
    /// Column name at `index`
    fn column_name(&self, index: usize) -> &str;
    /// Column type at `index`
    fn column_type(&self, index: usize) -> ColumnType;
    /// SYMBOL dictionary capacity at `index`
    fn symbol_capacity(&self, index: usize) -> usize;
    /// SYMBOL dictionary cache flag at `index`
    fn symbol_cache_flag(&self, index: usize) -> bool;
    /// Bitmap index flag at `index`
    fn indexed_flag(&self, index: usize) -> bool;
    /// Bitmap index value block capacity at `index`
    fn index_block_capacity(&self, index: usize) -> usize;
    /// Partitioning mode
    fn partition_by(&self) -> PartitionBy;
    /// Designated timestamp column index, if any
    fn timestamp_index(&self) -> Option<usize>;
}

/// Shared, read-only view of a table
///
/// Readers pin a consistent snapshot of committed data; cell accessors
/// address that snapshot by `(row, column)` position.
pub trait TableReader {
    /// Table name
    fn name(&self) -> &str;
    /// Shape of the table at snapshot time
    fn metadata(&self) -> &RecordMetadata;
    /// Monotonic counter bumped by every schema change
    fn structure_version(&self) -> u64;
    /// Number of committed rows in the snapshot
    fn row_count(&self) -> usize;

    fn get_bool(&self, row: usize, col: usize) -> bool;
    fn get_byte(&self, row: usize, col: usize) -> i8;
    fn get_short(&self, row: usize, col: usize) -> i16;
    fn get_char(&self, row: usize, col: usize) -> char;
    fn get_int(&self, row: usize, col: usize) -> i32;
    fn get_long(&self, row: usize, col: usize) -> i64;
    fn get_float(&self, row: usize, col: usize) -> f32;
    fn get_double(&self, row: usize, col: usize) -> f64;
    fn get_str(&self, row: usize, col: usize) -> Option<Cow<'_, str>>;
    fn get_sym(&self, row: usize, col: usize) -> Option<Cow<'_, str>>;
    fn get_bin(&self, row: usize, col: usize) -> Option<Cow<'_, [u8]>>;
    fn get_long256(&self, row: usize, col: usize) -> Long256;
}

/// Writer-side row accumulator; values set through typed putters, the row
/// enters the uncommitted tail on `append`
pub trait Row {
    fn put_bool(&mut self, col: usize, value: bool);
    fn put_byte(&mut self, col: usize, value: i8);
    fn put_short(&mut self, col: usize, value: i16);
    fn put_char(&mut self, col: usize, value: char);
    fn put_int(&mut self, col: usize, value: i32);
    fn put_long(&mut self, col: usize, value: i64);
    fn put_date(&mut self, col: usize, value: i64);
    fn put_timestamp(&mut self, col: usize, value: i64);
    fn put_float(&mut self, col: usize, value: f32);
    fn put_double(&mut self, col: usize, value: f64);
    fn put_str(&mut self, col: usize, value: Option<&str>);
    fn put_sym(&mut self, col: usize, value: Option<&str>);
    fn put_bin(&mut self, col: usize, value: Option<&[u8]>);
    fn put_long256(&mut self, col: usize, value: Long256);
    /// Finish the row; it becomes part of the writer's uncommitted tail
    fn append(&mut self);
}

/// Exclusive, mutating handle on a table
///
/// Dropping a writer releases exclusivity; uncommitted rows are discarded
/// unless `commit` ran first.
pub trait TableWriter {
    /// Table name
    fn name(&self) -> &str;
    /// Current shape of the table
    fn metadata(&self) -> &RecordMetadata;
    /// Monotonic counter bumped by every schema change
    fn structure_version(&self) -> u64;

    /// Start a new row for a table without a designated timestamp
    fn new_row(&mut self) -> &mut dyn Row;
    /// Start a new row at the given designated timestamp; rows must
    /// arrive in non-decreasing timestamp order
    fn new_row_at(&mut self, timestamp: i64) -> Result<&mut dyn Row>;

    /// Publish all appended rows to readers
    fn commit(&mut self) -> Result<()>;
    /// Discard all appended rows since the last commit
    fn rollback(&mut self);
    /// Remove every committed row, preserving the schema
    fn truncate(&mut self) -> Result<()>;

    /// Add a column; SYMBOL capacities are powers of two
    fn add_column(
        &mut self,
        name: &str,
        ty: ColumnType,
        symbol_capacity: usize,
        symbol_cache: bool,
        indexed: bool,
        index_block_capacity: usize,
    ) -> Result<()>;
    /// Remove a column by name
    fn remove_column(&mut self, name: &str) -> Result<()>;
}

impl std::fmt::Debug for dyn TableReader + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TableReader({})", self.name())
    }
}

impl std::fmt::Debug for dyn TableWriter + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TableWriter({})", self.name())
    }
}
