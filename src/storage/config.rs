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

//! Compiler and engine configuration
//!

/// Configuration shared by the SQL compiler and the table store
#[derive(Debug, Clone)]
pub struct Config {
    /// Attempts made by CREATE TABLE AS SELECT and INSERT AS SELECT when
    /// the source schema changes mid-flight
    /// Default: 5
    pub create_as_select_retry_count: u32,

    /// Read buffer used when streaming a local file through COPY
    /// Default: 2 MiB
    pub copy_buffer_size: usize,

    /// SYMBOL dictionary capacity when none is specified
    /// Default: 256
    pub default_symbol_capacity: usize,

    /// Whether SYMBOL dictionaries are cached when unspecified
    /// Default: false
    pub default_symbol_cache_flag: bool,

    /// Bitmap index value block capacity when none is specified
    /// Default: 256
    pub index_value_block_size: usize,

    /// Initial capacity of the per-compile expression node arena
    /// Default: 8192
    pub expression_pool_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_as_select_retry_count: 5,
            copy_buffer_size: 2 * 1024 * 1024,
            default_symbol_capacity: 256,
            default_symbol_cache_flag: false,
            index_value_block_size: 256,
            expression_pool_capacity: 8192,
        }
    }
}

impl Config {
    /// Creates a new Config with default values
    pub fn new() -> Self {
        Self::default()
    }
}
