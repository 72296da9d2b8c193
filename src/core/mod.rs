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

//! Core types for TempoDB: column types, cell values and errors

pub mod error;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use types::{
    ceil_pow2, is_assignable_from, is_compatible_cast, ColumnType, Long256, PartitionBy,
    NULL_CHAR, NULL_INT, NULL_LONG,
};
pub use value::Value;
