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

//! Record and cursor abstractions
//!
//! A [`Record`] is a row-shaped accessor exposing typed column readers
//! indexed by position. A [`RecordCursor`] is a single-use, single-threaded
//! stream of records. A [`RecordCursorFactory`] is a reusable producer of
//! cursors; SELECT compilation hands one to the caller.

use std::borrow::Cow;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::core::error::Result;
use crate::core::types::{ColumnType, Long256};

/// A typed view over an ordered set of source columns
pub trait ColumnTypes {
    /// Number of columns
    fn column_count(&self) -> usize;
    /// Type of the column at `index`
    fn column_type(&self, index: usize) -> ColumnType;
}

/// Per-column metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Column name
    pub name: String,
    /// Column type
    pub ty: ColumnType,
    /// SYMBOL dictionary capacity (power of two)
    pub symbol_capacity: usize,
    /// Whether the SYMBOL dictionary is cached on heap
    pub symbol_cache: bool,
    /// Whether the column carries a bitmap index
    pub indexed: bool,
    /// Bitmap index value block capacity (power of two)
    pub index_block_capacity: usize,
}

impl ColumnMeta {
    /// Create plain column metadata with no symbol/index options
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            symbol_capacity: 0,
            symbol_cache: false,
            indexed: false,
            index_block_capacity: 0,
        }
    }
}

/// Metadata describing the shape of records produced by a cursor or
/// stored in a table
#[derive(Debug, Clone, Default)]
pub struct RecordMetadata {
    columns: Vec<ColumnMeta>,
    by_name: FxHashMap<String, usize>,
    timestamp_index: Option<usize>,
}

impl RecordMetadata {
    /// Create empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column; names are unique, the first registration wins
    pub fn add(&mut self, column: ColumnMeta) -> usize {
        let index = self.columns.len();
        self.by_name
            .entry(column.name.to_lowercase())
            .or_insert(index);
        self.columns.push(column);
        index
    }

    /// Nominate the designated timestamp column
    pub fn set_timestamp_index(&mut self, index: Option<usize>) {
        self.timestamp_index = index;
    }

    /// Designated timestamp column index, if the table has one
    pub fn timestamp_index(&self) -> Option<usize> {
        self.timestamp_index
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Resolve a column name (case-insensitive) to its index
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(&name.to_lowercase()).copied()
    }

    /// Column name at `index`
    pub fn column_name(&self, index: usize) -> &str {
        &self.columns[index].name
    }

    /// Full metadata of the column at `index`
    pub fn column(&self, index: usize) -> &ColumnMeta {
        &self.columns[index]
    }

    /// Iterate column metadata in position order
    pub fn columns(&self) -> impl Iterator<Item = &ColumnMeta> {
        self.columns.iter()
    }

    /// Remove the column at `index`, renumbering those after it
    pub fn remove(&mut self, index: usize) {
        let removed = self.columns.remove(index);
        self.by_name.remove(&removed.name.to_lowercase());
        for v in self.by_name.values_mut() {
            if *v > index {
                *v -= 1;
            }
        }
        self.timestamp_index = match self.timestamp_index {
            Some(t) if t == index => None,
            Some(t) if t > index => Some(t - 1),
            other => other,
        };
    }
}

impl ColumnTypes for RecordMetadata {
    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_type(&self, index: usize) -> ColumnType {
        self.columns[index].ty
    }
}

/// Row-shaped accessor with one typed reader per column type.
///
/// Callers must invoke the reader matching the column's declared type;
/// implementations are free to panic on a mismatched call.
pub trait Record {
    fn get_bool(&self, col: usize) -> bool;
    fn get_byte(&self, col: usize) -> i8;
    fn get_short(&self, col: usize) -> i16;
    fn get_char(&self, col: usize) -> char;
    fn get_int(&self, col: usize) -> i32;
    fn get_long(&self, col: usize) -> i64;
    fn get_date(&self, col: usize) -> i64;
    fn get_timestamp(&self, col: usize) -> i64;
    fn get_float(&self, col: usize) -> f32;
    fn get_double(&self, col: usize) -> f64;
    fn get_str(&self, col: usize) -> Option<Cow<'_, str>>;
    fn get_sym(&self, col: usize) -> Option<Cow<'_, str>>;
    fn get_bin(&self, col: usize) -> Option<Cow<'_, [u8]>>;
    fn get_long256(&self, col: usize) -> Long256;
}

/// Single-use stream of records
///
/// `has_next` advances the cursor; `record` reads the current row and is
/// valid only after `has_next` returned true.
pub trait RecordCursor {
    /// Advance to the next record; false at the end of the stream
    fn has_next(&mut self) -> bool;
    /// The current record
    fn record(&self) -> &dyn Record;
}

impl std::fmt::Debug for dyn RecordCursor + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RecordCursor")
    }
}

/// Reusable producer of single-use record cursors
pub trait RecordCursorFactory: Send {
    /// Shape of the records this factory produces
    fn metadata(&self) -> &RecordMetadata;
    /// Open a fresh cursor over the current table data
    fn cursor(&self) -> Result<Box<dyn RecordCursor + '_>>;
}

/// Ordered list of destination column indexes, indexed by source position.
///
/// The entity variant is the identity mapping of a fixed width; the list
/// variant carries explicitly resolved target indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnFilter {
    /// Identity mapping over the first `n` columns
    Entity(usize),
    /// Explicit destination indexes in source-iteration order
    List(SmallVec<[usize; 16]>),
}

impl ColumnFilter {
    /// Identity filter of the given width
    pub fn entity(count: usize) -> Self {
        ColumnFilter::Entity(count)
    }

    /// Empty list filter, to be populated with [`ColumnFilter::push`]
    pub fn list() -> Self {
        ColumnFilter::List(SmallVec::new())
    }

    /// Append a destination index to a list filter
    pub fn push(&mut self, index: usize) {
        match self {
            ColumnFilter::List(v) => v.push(index),
            ColumnFilter::Entity(_) => unreachable!("cannot push into an entity filter"),
        }
    }

    /// Number of source positions covered
    pub fn count(&self) -> usize {
        match self {
            ColumnFilter::Entity(n) => *n,
            ColumnFilter::List(v) => v.len(),
        }
    }

    /// Destination column index for source position `i`
    pub fn get(&self, i: usize) -> usize {
        match self {
            ColumnFilter::Entity(_) => i,
            ColumnFilter::List(v) => v[i],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> RecordMetadata {
        let mut m = RecordMetadata::new();
        m.add(ColumnMeta::new("x", ColumnType::Int));
        m.add(ColumnMeta::new("ts", ColumnType::Timestamp));
        m.set_timestamp_index(Some(1));
        m
    }

    #[test]
    fn test_metadata_lookup() {
        let m = meta();
        assert_eq!(m.column_count(), 2);
        assert_eq!(m.column_index("x"), Some(0));
        assert_eq!(m.column_index("X"), Some(0));
        assert_eq!(m.column_index("missing"), None);
        assert_eq!(m.column_name(1), "ts");
        assert_eq!(m.column_type(1), ColumnType::Timestamp);
        assert_eq!(m.timestamp_index(), Some(1));
    }

    #[test]
    fn test_metadata_remove_renumbers() {
        let mut m = meta();
        m.add(ColumnMeta::new("y", ColumnType::Double));
        m.remove(0);
        assert_eq!(m.column_index("ts"), Some(0));
        assert_eq!(m.column_index("y"), Some(1));
        assert_eq!(m.timestamp_index(), Some(0));
        m.remove(0);
        assert_eq!(m.timestamp_index(), None);
    }

    #[test]
    fn test_entity_filter() {
        let f = ColumnFilter::entity(3);
        assert_eq!(f.count(), 3);
        assert_eq!(f.get(0), 0);
        assert_eq!(f.get(2), 2);
    }

    #[test]
    fn test_list_filter() {
        let mut f = ColumnFilter::list();
        f.push(2);
        f.push(0);
        assert_eq!(f.count(), 2);
        assert_eq!(f.get(0), 2);
        assert_eq!(f.get(1), 0);
    }
}
