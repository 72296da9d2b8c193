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

//! Retry loop tests
//!
//! A hostile engine reports a different structure version on every
//! reader it hands out, so every streaming mutation observes a source
//! that changed underneath it and the retry loop runs dry.

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tempodb::core::Result;
use tempodb::executor::{ExecutionContext, SqlCompiler};
use tempodb::storage::traits::{
    RecordCursorFactory, RecordMetadata, StorageEngine, TableReader, TableStatus, TableStructure,
    TableWriter,
};
use tempodb::{Error, Long256, MemEngine};

/// Engine whose readers never agree on a structure version
struct VolatileEngine {
    inner: MemEngine,
    version: AtomicU64,
    readers_opened: AtomicUsize,
}

impl VolatileEngine {
    fn new() -> Self {
        Self {
            inner: MemEngine::new(),
            version: AtomicU64::new(0),
            readers_opened: AtomicUsize::new(0),
        }
    }
}

struct VolatileReader {
    inner: Box<dyn TableReader>,
    version: u64,
}

impl TableReader for VolatileReader {
    fn name(&self) -> &str {
        self.inner.name()
    }
    fn metadata(&self) -> &RecordMetadata {
        self.inner.metadata()
    }
    fn structure_version(&self) -> u64 {
        self.version
    }
    fn row_count(&self) -> usize {
        self.inner.row_count()
    }
    fn get_bool(&self, row: usize, col: usize) -> bool {
        self.inner.get_bool(row, col)
    }
    fn get_byte(&self, row: usize, col: usize) -> i8 {
        self.inner.get_byte(row, col)
    }
    fn get_short(&self, row: usize, col: usize) -> i16 {
        self.inner.get_short(row, col)
    }
    fn get_char(&self, row: usize, col: usize) -> char {
        self.inner.get_char(row, col)
    }
    fn get_int(&self, row: usize, col: usize) -> i32 {
        self.inner.get_int(row, col)
    }
    fn get_long(&self, row: usize, col: usize) -> i64 {
        self.inner.get_long(row, col)
    }
    fn get_float(&self, row: usize, col: usize) -> f32 {
        self.inner.get_float(row, col)
    }
    fn get_double(&self, row: usize, col: usize) -> f64 {
        self.inner.get_double(row, col)
    }
    fn get_str(&self, row: usize, col: usize) -> Option<Cow<'_, str>> {
        self.inner.get_str(row, col)
    }
    fn get_sym(&self, row: usize, col: usize) -> Option<Cow<'_, str>> {
        self.inner.get_sym(row, col)
    }
    fn get_bin(&self, row: usize, col: usize) -> Option<Cow<'_, [u8]>> {
        self.inner.get_bin(row, col)
    }
    fn get_long256(&self, row: usize, col: usize) -> Long256 {
        self.inner.get_long256(row, col)
    }
}

impl StorageEngine for VolatileEngine {
    fn status(&self, name: &str) -> TableStatus {
        self.inner.status(name)
    }
    fn lock_name(&self, name: &str) -> bool {
        self.inner.lock_name(name)
    }
    fn unlock_name(&self, name: &str, writer: Option<Box<dyn TableWriter>>) {
        self.inner.unlock_name(name, writer)
    }
    fn create_table(&self, structure: &dyn TableStructure) -> Result<()> {
        self.inner.create_table(structure)
    }
    fn reader(&self, name: &str) -> Result<Box<dyn TableReader>> {
        self.readers_opened.fetch_add(1, Ordering::Relaxed);
        let inner = self.inner.reader(name)?;
        Ok(Box::new(VolatileReader {
            inner,
            version: self.version.fetch_add(1, Ordering::Relaxed),
        }))
    }
    fn writer(&self, name: &str) -> Result<Box<dyn TableWriter>> {
        self.inner.writer(name)
    }
    fn table_metadata(&self, name: &str) -> Result<RecordMetadata> {
        self.inner.table_metadata(name)
    }
    fn lock_readers(&self, name: &str) -> bool {
        self.inner.lock_readers(name)
    }
    fn unlock_readers(&self, name: &str) {
        self.inner.unlock_readers(name)
    }
    fn remove(&self, name: &str) -> Result<()> {
        self.inner.remove(name)
    }
    fn remove_directory(&self, name: &str) -> bool {
        self.inner.remove_directory(name)
    }
    fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.inner.rename(from, to)
    }
}

fn populate(engine: &Arc<VolatileEngine>) {
    let ctx = ExecutionContext::new();
    let mut compiler = SqlCompiler::new(engine.clone() as Arc<dyn StorageEngine>);
    compiler
        .compile("CREATE TABLE src (x INT)", &ctx)
        .expect("create src");
    compiler
        .compile("INSERT INTO src VALUES (1)", &ctx)
        .expect("compile insert")
        .into_insert()
        .expect("insert statement")
        .execute()
        .expect("insert");
}

#[test]
fn test_insert_as_select_runs_out_of_retries() {
    let engine = Arc::new(VolatileEngine::new());
    populate(&engine);

    let ctx = ExecutionContext::new();
    let mut compiler = SqlCompiler::new(engine.clone() as Arc<dyn StorageEngine>);
    compiler
        .compile("CREATE TABLE dst (x INT)", &ctx)
        .expect("create dst");

    let before = engine.readers_opened.load(Ordering::Relaxed);
    let err = compiler
        .compile("INSERT INTO dst SELECT * FROM src", &ctx)
        .unwrap_err();
    assert!(
        err.to_string().contains("underlying cursor is extremely volatile"),
        "{}",
        err
    );

    // every attempt re-compiles the model; the configured retry count
    // bounds the number of attempts
    let attempts = compiler.config().create_as_select_retry_count as usize;
    let opened = engine.readers_opened.load(Ordering::Relaxed) - before;
    // each attempt opens a handful of readers (scan build + cursor);
    // the loop must not spin past its allowance
    assert!(opened >= attempts, "opened {} readers", opened);
    assert!(opened <= (attempts + 1) * 3, "opened {} readers", opened);
}

#[test]
fn test_create_as_select_runs_out_of_retries() {
    let engine = Arc::new(VolatileEngine::new());
    populate(&engine);

    let ctx = ExecutionContext::new();
    let mut compiler = SqlCompiler::new(engine.clone() as Arc<dyn StorageEngine>);
    let err = compiler
        .compile("CREATE TABLE dst AS (SELECT * FROM src)", &ctx)
        .unwrap_err();
    assert!(
        err.to_string().contains("underlying cursor is extremely volatile"),
        "{}",
        err
    );
    // the failed create left nothing behind and released its name lock
    assert_eq!(engine.status("dst"), TableStatus::DoesNotExist);
    compiler
        .compile("CREATE TABLE dst (x INT)", &ctx)
        .expect("name lock must be free after retries");
}

#[test]
fn test_stale_factory_error_is_retryable_kind() {
    let engine = Arc::new(VolatileEngine::new());
    populate(&engine);

    let ctx = ExecutionContext::new();
    let mut compiler = SqlCompiler::new(engine.clone() as Arc<dyn StorageEngine>);
    let factory = compiler
        .compile("SELECT x FROM src", &ctx)
        .unwrap()
        .into_factory()
        .unwrap();
    // SELECT is not retried by the compiler: the stale factory error
    // surfaces to the caller as-is
    let err = factory.cursor().unwrap_err();
    assert_eq!(err, Error::ReaderOutOfDate);
}
