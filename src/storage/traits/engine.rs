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

//! Engine trait for the table store
//!
//! The SQL pipeline consumes the physical table store exclusively through
//! this trait. Name locks serialise CREATE against concurrent creation of
//! the same table; reader locks let TRUNCATE exclude active queries.

use super::cursor::RecordMetadata;
use super::table::{TableReader, TableStructure, TableWriter};
use crate::core::error::Result;

/// What the engine knows about a table name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    /// No table and no reservation under this name
    DoesNotExist,
    /// A table exists under this name
    Exists,
    /// The name is reserved (locked for creation) but not yet a table
    Reserved,
}

/// The table store consumed by the SQL pipeline
pub trait StorageEngine: Send + Sync {
    /// Report what exists under `name`
    fn status(&self, name: &str) -> TableStatus;

    /// Try to take the exclusive creation lock on `name`; non-blocking
    fn lock_name(&self, name: &str) -> bool;

    /// Release the creation lock on `name`. A writer produced while the
    /// lock was held may be handed over for the engine to adopt.
    fn unlock_name(&self, name: &str, writer: Option<Box<dyn TableWriter>>);

    /// Materialise a new table from a structural description
    fn create_table(&self, structure: &dyn TableStructure) -> Result<()>;

    /// Open a shared reader over committed data
    fn reader(&self, name: &str) -> Result<Box<dyn TableReader>>;

    /// Open the exclusive writer; fails busy when one is already out
    fn writer(&self, name: &str) -> Result<Box<dyn TableWriter>>;

    /// Shape of the table without pinning a data snapshot
    fn table_metadata(&self, name: &str) -> Result<RecordMetadata>;

    /// Block new readers on `name`; fails when readers are active
    fn lock_readers(&self, name: &str) -> bool;

    /// Re-admit readers on `name`
    fn unlock_readers(&self, name: &str);

    /// Remove the table and its on-disk structure
    fn remove(&self, name: &str) -> Result<()>;

    /// Best-effort removal of a partially created table directory;
    /// returns false when cleanup itself failed
    fn remove_directory(&self, name: &str) -> bool;

    /// Rename a table; the target name must be free
    fn rename(&self, from: &str, to: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify trait is object-safe
    fn _assert_object_safe(_: &dyn StorageEngine) {}
}
