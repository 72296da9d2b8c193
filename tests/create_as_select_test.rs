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

//! CREATE TABLE AS SELECT tests

use std::sync::Arc;

use tempodb::executor::{ExecutionContext, SqlCompiler};
use tempodb::storage::traits::TableStatus;
use tempodb::{ColumnType, Error, MemEngine, StorageEngine, TableReader};

fn setup() -> (Arc<MemEngine>, SqlCompiler, ExecutionContext) {
    let engine = Arc::new(MemEngine::new());
    let compiler = SqlCompiler::new(engine.clone());
    (engine, compiler, ExecutionContext::new())
}

fn exec(compiler: &mut SqlCompiler, ctx: &ExecutionContext, sql: &str) {
    compiler
        .compile(sql, ctx)
        .unwrap_or_else(|e| panic!("{}: {}", sql, e));
}

fn insert(compiler: &mut SqlCompiler, ctx: &ExecutionContext, sql: &str) {
    compiler
        .compile(sql, ctx)
        .unwrap_or_else(|e| panic!("{}: {}", sql, e))
        .into_insert()
        .unwrap()
        .execute()
        .unwrap();
}

#[test]
fn test_create_as_select_with_cast() {
    let (engine, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE f (x INT)");
    insert(&mut compiler, &ctx, "INSERT INTO f VALUES (1)");
    insert(&mut compiler, &ctx, "INSERT INTO f VALUES (2)");

    exec(
        &mut compiler,
        &ctx,
        "CREATE TABLE g AS (SELECT * FROM f), CAST(x AS LONG)",
    );

    let metadata = engine.table_metadata("g").unwrap();
    assert_eq!(metadata.column(0).ty, ColumnType::Long);

    let reader = engine.reader("g").unwrap();
    assert_eq!(reader.row_count(), engine.reader("f").unwrap().row_count());
    assert_eq!(reader.get_long(0, 0), 1);
    assert_eq!(reader.get_long(1, 0), 2);
}

#[test]
fn test_incompatible_cast_rejected() {
    let (engine, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE f (x INT)");

    let err = compiler
        .compile("CREATE TABLE g AS (SELECT * FROM f), CAST(x AS STRING)", &ctx)
        .unwrap_err();
    assert!(
        err.to_string().contains("unsupported cast [from=INT,to=STRING]"),
        "{}",
        err
    );
    // nothing was created and the name lock was released
    assert_eq!(engine.status("g"), TableStatus::DoesNotExist);
    exec(&mut compiler, &ctx, "CREATE TABLE g (y INT)");
}

#[test]
fn test_cast_unknown_column_rejected() {
    let (_, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE f (x INT)");
    let err = compiler
        .compile("CREATE TABLE g AS (SELECT * FROM f), CAST(zz AS LONG)", &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("invalid column: zz"));
}

#[test]
fn test_create_as_select_partitioned() {
    let (engine, mut compiler, ctx) = setup();
    exec(
        &mut compiler,
        &ctx,
        "CREATE TABLE src (v DOUBLE, ts TIMESTAMP) TIMESTAMP(ts) PARTITION BY DAY",
    );
    insert(&mut compiler, &ctx, "INSERT INTO src VALUES (1.5, 1000)");
    insert(&mut compiler, &ctx, "INSERT INTO src VALUES (2.5, 2000)");

    exec(
        &mut compiler,
        &ctx,
        "CREATE TABLE dst AS (SELECT * FROM src) TIMESTAMP(ts) PARTITION BY DAY",
    );

    let metadata = engine.table_metadata("dst").unwrap();
    assert_eq!(metadata.timestamp_index(), Some(1));
    let reader = engine.reader("dst").unwrap();
    assert_eq!(reader.row_count(), 2);
    assert_eq!(reader.get_long(0, 1), 1000);
    assert_eq!(reader.get_long(1, 1), 2000);
}

#[test]
fn test_create_as_select_timestamp_must_be_timestamp() {
    let (_, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE f (x INT)");
    let err = compiler
        .compile("CREATE TABLE g AS (SELECT * FROM f) TIMESTAMP(x)", &ctx)
        .unwrap_err();
    assert!(
        err.to_string().contains("TIMESTAMP column expected [actual=INT]"),
        "{}",
        err
    );
}

#[test]
fn test_create_as_select_with_projection_and_filter() {
    let (engine, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE f (x INT, y INT)");
    for sql in [
        "INSERT INTO f VALUES (1, 10)",
        "INSERT INTO f VALUES (2, 20)",
        "INSERT INTO f VALUES (3, 30)",
    ] {
        insert(&mut compiler, &ctx, sql);
    }

    exec(
        &mut compiler,
        &ctx,
        "CREATE TABLE g AS (SELECT y FROM f WHERE x > 1)",
    );
    let reader = engine.reader("g").unwrap();
    assert_eq!(reader.row_count(), 2);
    assert_eq!(reader.get_int(0, 0), 20);
    assert_eq!(reader.get_int(1, 0), 30);
}

#[test]
fn test_create_as_select_from_missing_table() {
    let (engine, mut compiler, ctx) = setup();
    let err = compiler
        .compile("CREATE TABLE g AS (SELECT * FROM nope)", &ctx)
        .unwrap_err();
    assert!(matches!(err, Error::Semantic { .. }), "{}", err);
    assert_eq!(engine.status("g"), TableStatus::DoesNotExist);
}

#[test]
fn test_symbol_cast_capacity() {
    let (engine, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE f (s STRING)");
    insert(&mut compiler, &ctx, "INSERT INTO f VALUES ('a')");

    exec(
        &mut compiler,
        &ctx,
        "CREATE TABLE g AS (SELECT * FROM f), CAST(s AS SYMBOL CAPACITY 50 CACHE)",
    );
    let metadata = engine.table_metadata("g").unwrap();
    let column = metadata.column(0);
    assert_eq!(column.ty, ColumnType::Symbol);
    assert_eq!(column.symbol_capacity, 64);
    assert!(column.symbol_cache);
}
