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

//! Text import seam
//!
//! COPY streams bytes through a [`TextLoader`]. The first chunk is
//! analysed for structure, subsequent chunks append data. The CSV parser
//! itself lives outside this crate; the bundled [`NullTextLoader`]
//! counts bytes so the streaming path is testable without it.

use crate::core::error::Result;

/// Loader states driven by the COPY executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// First chunk: infer column names and types
    #[default]
    AnalyzeStructure,
    /// Subsequent chunks: append rows
    LoadData,
}

/// What happens when a single row fails to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Atomicity {
    /// Abort the whole import
    Abort,
    /// Drop the failing row and continue
    #[default]
    SkipRow,
    /// Drop every row of the failing chunk
    SkipAll,
}

/// Sink for COPY byte streams
pub trait TextLoader: Send {
    /// Reset all state between imports
    fn clear(&mut self);
    /// Name the destination table and the row-error policy
    fn configure_destination(&mut self, table: &str, overwrite: bool, atomicity: Atomicity);
    /// Switch between structure analysis and data loading
    fn set_state(&mut self, state: LoadState);
    /// Consume one chunk
    fn parse(&mut self, data: &[u8]) -> Result<()>;
    /// Flush trailing partial rows after the final chunk
    fn wrap_up(&mut self) -> Result<()>;
}

/// Byte-counting loader standing in for the external CSV importer
#[derive(Debug, Default)]
pub struct NullTextLoader {
    table: String,
    state: LoadState,
    atomicity: Atomicity,
    analyzed_bytes: usize,
    loaded_bytes: usize,
    wrapped_up: bool,
}

impl NullTextLoader {
    /// Create an idle loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Destination table configured by the last COPY
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Current state
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Configured row-error policy
    pub fn atomicity(&self) -> Atomicity {
        self.atomicity
    }

    /// Bytes consumed while analysing structure
    pub fn analyzed_bytes(&self) -> usize {
        self.analyzed_bytes
    }

    /// Bytes consumed while loading data
    pub fn loaded_bytes(&self) -> usize {
        self.loaded_bytes
    }

    /// True once the import was wrapped up
    pub fn wrapped_up(&self) -> bool {
        self.wrapped_up
    }
}

impl TextLoader for NullTextLoader {
    fn clear(&mut self) {
        *self = Self::default();
    }

    fn configure_destination(&mut self, table: &str, _overwrite: bool, atomicity: Atomicity) {
        self.table = table.to_string();
        self.atomicity = atomicity;
    }

    fn set_state(&mut self, state: LoadState) {
        self.state = state;
    }

    fn parse(&mut self, data: &[u8]) -> Result<()> {
        match self.state {
            LoadState::AnalyzeStructure => self.analyzed_bytes += data.len(),
            LoadState::LoadData => self.loaded_bytes += data.len(),
        }
        Ok(())
    }

    fn wrap_up(&mut self) -> Result<()> {
        self.wrapped_up = true;
        Ok(())
    }
}
