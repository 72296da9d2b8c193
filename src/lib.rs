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

//! # TempoDB - column-oriented SQL engine for time series
//!
//! TempoDB is a column-oriented, time-partitioned relational engine for
//! time-series workloads. This crate holds its SQL compilation and
//! execution pipeline: lexer, parser, optimiser, function binding, code
//! generation and the table mutation executors, together with the
//! abstract storage interfaces and a bundled in-memory columnar engine.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use tempodb::executor::{ExecutionContext, SqlCompiler};
//! use tempodb::{MemEngine, Record, RecordCursor, RecordCursorFactory};
//!
//! let engine = Arc::new(MemEngine::new());
//! let mut compiler = SqlCompiler::new(engine);
//! let ctx = ExecutionContext::new();
//!
//! compiler
//!     .compile("CREATE TABLE trades (price DOUBLE, ts TIMESTAMP) TIMESTAMP(ts) PARTITION BY DAY", &ctx)
//!     .unwrap();
//!
//! let insert = compiler
//!     .compile("INSERT INTO trades VALUES (1.5, 1577836800000000)", &ctx)
//!     .unwrap()
//!     .into_insert()
//!     .unwrap();
//! insert.execute().unwrap();
//!
//! let factory = compiler
//!     .compile("SELECT price FROM trades", &ctx)
//!     .unwrap()
//!     .into_factory()
//!     .unwrap();
//! let mut cursor = factory.cursor().unwrap();
//! assert!(cursor.has_next());
//! assert_eq!(cursor.record().get_double(0), 1.5);
//! ```
//!
//! ## Modules
//!
//! - [`core`] - column types, cell values, errors
//! - [`parser`] - lexer, expression arena, statement models
//! - [`optimizer`] - rule-based query model rewriting
//! - [`functions`] - typed function instances and binding
//! - [`executor`] - the compiler, code generator, row copier and
//!   mutation executors
//! - [`storage`] - table-store interfaces, configuration and the
//!   in-memory engine
//! - [`text`] - the COPY text-import seam

pub mod core;
pub mod executor;
pub mod functions;
pub mod optimizer;
pub mod parser;
pub mod storage;
pub mod text;

// Re-export main types for convenience
pub use crate::core::{ColumnType, Error, Long256, PartitionBy, Result, Value};
pub use executor::{CompiledQuery, ExecutionContext, InsertStatement, SqlCompiler};
pub use storage::traits::{
    Record, RecordCursor, RecordCursorFactory, RecordMetadata, StorageEngine, TableReader,
    TableWriter,
};
pub use storage::{Config, MemEngine};
