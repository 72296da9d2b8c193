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

//! CREATE, DROP, RENAME and ALTER TABLE tests

use std::sync::Arc;

use tempodb::executor::{CompiledQuery, ExecutionContext, SqlCompiler};
use tempodb::{ColumnType, Error, MemEngine, StorageEngine, TableReader};

fn setup() -> (Arc<MemEngine>, SqlCompiler, ExecutionContext) {
    let engine = Arc::new(MemEngine::new());
    let compiler = SqlCompiler::new(engine.clone());
    (engine, compiler, ExecutionContext::new())
}

fn exec(compiler: &mut SqlCompiler, ctx: &ExecutionContext, sql: &str) -> CompiledQuery {
    compiler
        .compile(sql, ctx)
        .unwrap_or_else(|e| panic!("{}: {}", sql, e))
}

#[test]
fn test_create_table_schema() {
    let (engine, mut compiler, ctx) = setup();
    exec(
        &mut compiler,
        &ctx,
        "CREATE TABLE trades (price DOUBLE, sym SYMBOL CAPACITY 100 NOCACHE INDEX, \
         ts TIMESTAMP) TIMESTAMP(ts) PARTITION BY DAY",
    );

    let metadata = engine.table_metadata("trades").unwrap();
    assert_eq!(metadata.column_count(), 3);
    assert_eq!(metadata.column(0).ty, ColumnType::Double);
    assert_eq!(metadata.column(1).ty, ColumnType::Symbol);
    // capacities round up to the next power of two
    assert_eq!(metadata.column(1).symbol_capacity, 128);
    assert!(metadata.column(1).indexed);
    assert!(!metadata.column(1).symbol_cache);
    assert_eq!(metadata.timestamp_index(), Some(2));
}

#[test]
fn test_create_existing_table_fails() {
    let (_, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE t (x INT)");
    let err = compiler.compile("CREATE TABLE t (x INT)", &ctx).unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { .. }), "{}", err);
}

#[test]
fn test_drop_then_recreate() {
    let (engine, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE t (x INT)");
    exec(&mut compiler, &ctx, "DROP TABLE t");
    assert!(engine.table_metadata("t").is_err());
    exec(&mut compiler, &ctx, "CREATE TABLE t (y DOUBLE)");
    let metadata = engine.table_metadata("t").unwrap();
    assert_eq!(metadata.column(0).ty, ColumnType::Double);
}

#[test]
fn test_drop_missing_table() {
    let (_, mut compiler, ctx) = setup();
    let err = compiler.compile("DROP TABLE ghost", &ctx).unwrap_err();
    assert!(err.to_string().contains("table 'ghost' does not exist"));
}

#[test]
fn test_create_name_lock_contention() {
    let (engine, mut compiler, ctx) = setup();
    assert!(engine.lock_name("locked"));
    let err = compiler
        .compile("CREATE TABLE locked (x INT)", &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("cannot acquire table lock"));
    engine.unlock_name("locked", None);
    exec(&mut compiler, &ctx, "CREATE TABLE locked (x INT)");
}

#[test]
fn test_rename_table() {
    let (engine, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE old_name (x INT)");
    exec(&mut compiler, &ctx, "RENAME TABLE old_name TO new_name");
    assert!(engine.table_metadata("old_name").is_err());
    assert!(engine.table_metadata("new_name").is_ok());

    let err = compiler
        .compile("RENAME TABLE missing TO whatever", &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_alter_add_then_drop_restores_schema() {
    let (engine, mut compiler, ctx) = setup();
    exec(
        &mut compiler,
        &ctx,
        "CREATE TABLE a (x INT, ts TIMESTAMP) TIMESTAMP(ts) PARTITION BY DAY",
    );
    let before: Vec<(String, ColumnType)> = engine
        .table_metadata("a")
        .unwrap()
        .columns()
        .map(|c| (c.name.clone(), c.ty))
        .collect();

    exec(&mut compiler, &ctx, "ALTER TABLE a ADD COLUMN y DOUBLE");
    assert_eq!(engine.table_metadata("a").unwrap().column_count(), 3);

    exec(&mut compiler, &ctx, "ALTER TABLE a DROP COLUMN y");
    let after: Vec<(String, ColumnType)> = engine
        .table_metadata("a")
        .unwrap()
        .columns()
        .map(|c| (c.name.clone(), c.ty))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_alter_add_multiple_columns() {
    let (engine, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE m (x INT)");
    exec(
        &mut compiler,
        &ctx,
        "ALTER TABLE m ADD COLUMN s SYMBOL CAPACITY 20 CACHE INDEX CAPACITY 300, v DOUBLE",
    );
    let metadata = engine.table_metadata("m").unwrap();
    assert_eq!(metadata.column_count(), 3);
    let sym = metadata.column(1);
    assert_eq!(sym.ty, ColumnType::Symbol);
    assert_eq!(sym.symbol_capacity, 32);
    assert!(sym.symbol_cache);
    assert!(sym.indexed);
    assert_eq!(sym.index_block_capacity, 512);
    assert_eq!(metadata.column(2).ty, ColumnType::Double);
}

#[test]
fn test_alter_add_existing_column() {
    let (_, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE e (x INT)");
    let err = compiler
        .compile("ALTER TABLE e ADD COLUMN x DOUBLE", &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("column 'x' already exists"));
}

#[test]
fn test_alter_add_invalid_type() {
    let (_, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE e (x INT)");
    let err = compiler
        .compile("ALTER TABLE e ADD COLUMN y VARCHAR", &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("invalid type"));
}

#[test]
fn test_alter_add_bad_capacity() {
    let (_, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE e (x INT)");

    let err = compiler
        .compile("ALTER TABLE e ADD COLUMN s SYMBOL CAPACITY abc", &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("numeric capacity expected"));

    let err = compiler
        .compile("ALTER TABLE e ADD COLUMN s SYMBOL CAPACITY -64", &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("min symbol capacity"));
}

#[test]
fn test_alter_drop_unknown_column() {
    let (_, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE e (x INT)");
    let err = compiler
        .compile("ALTER TABLE e DROP COLUMN nope", &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("invalid column: nope"));
}

#[test]
fn test_alter_busy_table() {
    let (engine, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE busy (x INT)");
    let writer = engine.writer("busy").unwrap();
    let err = compiler
        .compile("ALTER TABLE busy ADD COLUMN y INT", &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("table 'busy' is busy"), "{}", err);
    drop(writer);
    exec(&mut compiler, &ctx, "ALTER TABLE busy ADD COLUMN y INT");
}

#[test]
fn test_alter_drop_preserves_data() {
    let (engine, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE keep (x INT, y INT)");
    compiler
        .compile("INSERT INTO keep VALUES (1, 2)", &ctx)
        .unwrap()
        .into_insert()
        .unwrap()
        .execute()
        .unwrap();
    exec(&mut compiler, &ctx, "ALTER TABLE keep DROP COLUMN y");
    let reader = engine.reader("keep").unwrap();
    assert_eq!(reader.row_count(), 1);
    assert_eq!(reader.get_int(0, 0), 1);
}

#[test]
fn test_set_is_accepted_and_ignored() {
    let (_, mut compiler, ctx) = setup();
    let result = exec(&mut compiler, &ctx, "SET search_path TO public");
    assert!(matches!(result, CompiledQuery::Set));
}

#[test]
fn test_keyword_dispatch_is_case_insensitive() {
    let (engine, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "create table ci (x int)");
    exec(&mut compiler, &ctx, "alter table ci add column y double");
    exec(&mut compiler, &ctx, "TRUNCATE table ci");
    exec(&mut compiler, &ctx, "repair TABLE ci");
    exec(&mut compiler, &ctx, "Drop Table ci");
    assert!(engine.table_metadata("ci").is_err());
}
