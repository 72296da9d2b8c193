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

//! INSERT AS SELECT tests

use std::sync::Arc;

use tempodb::executor::{ExecutionContext, SqlCompiler};
use tempodb::{MemEngine, StorageEngine, TableReader};

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
fn test_implicit_columns() {
    let (engine, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE src (x INT, v DOUBLE)");
    insert(&mut compiler, &ctx, "INSERT INTO src VALUES (1, 1.5)");
    insert(&mut compiler, &ctx, "INSERT INTO src VALUES (2, 2.5)");
    exec(&mut compiler, &ctx, "CREATE TABLE dst (x INT, v DOUBLE)");

    exec(&mut compiler, &ctx, "INSERT INTO dst SELECT * FROM src");

    let reader = engine.reader("dst").unwrap();
    assert_eq!(reader.row_count(), 2);
    assert_eq!(reader.get_int(0, 0), 1);
    assert_eq!(reader.get_double(1, 1), 2.5);
}

#[test]
fn test_implicit_columns_widen() {
    let (engine, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE src (x INT)");
    insert(&mut compiler, &ctx, "INSERT INTO src VALUES (7)");
    exec(&mut compiler, &ctx, "CREATE TABLE dst (x LONG)");

    exec(&mut compiler, &ctx, "INSERT INTO dst SELECT * FROM src");
    assert_eq!(engine.reader("dst").unwrap().get_long(0, 0), 7);
}

#[test]
fn test_explicit_column_list_reorders() {
    let (engine, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE src (a INT, b INT)");
    insert(&mut compiler, &ctx, "INSERT INTO src VALUES (1, 2)");
    exec(&mut compiler, &ctx, "CREATE TABLE dst (a INT, b INT)");

    // source column 0 lands in b, source column 1 lands in a
    exec(&mut compiler, &ctx, "INSERT INTO dst (b, a) SELECT * FROM src");

    let reader = engine.reader("dst").unwrap();
    assert_eq!(reader.get_int(0, 0), 2);
    assert_eq!(reader.get_int(0, 1), 1);
}

#[test]
fn test_not_enough_columns() {
    let (_, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE src (x INT)");
    exec(&mut compiler, &ctx, "CREATE TABLE dst (x INT, y INT)");
    let err = compiler
        .compile("INSERT INTO dst SELECT * FROM src", &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("not enough columns selected"), "{}", err);
}

#[test]
fn test_column_count_mismatch() {
    let (_, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE src (x INT, y INT)");
    exec(&mut compiler, &ctx, "CREATE TABLE dst (x INT, y INT)");
    let err = compiler
        .compile("INSERT INTO dst (x, y) SELECT x FROM src", &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("column count mismatch"), "{}", err);
}

#[test]
fn test_inconvertible_types_rejected() {
    let (_, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE src (s STRING)");
    exec(&mut compiler, &ctx, "CREATE TABLE dst (x INT)");
    let err = compiler
        .compile("INSERT INTO dst SELECT * FROM src", &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("inconvertible types: STRING -> INT"));
}

#[test]
fn test_target_timestamp_requires_cursor_timestamp() {
    let (_, mut compiler, ctx) = setup();
    exec(&mut compiler, &ctx, "CREATE TABLE src (ts LONG, x INT)");
    exec(
        &mut compiler,
        &ctx,
        "CREATE TABLE dst (ts TIMESTAMP, x INT) TIMESTAMP(ts) PARTITION BY DAY",
    );
    let err = compiler
        .compile("INSERT INTO dst SELECT * FROM src", &ctx)
        .unwrap_err();
    assert!(
        err.to_string().contains("select clause must provide timestamp column"),
        "{}",
        err
    );
}

#[test]
fn test_column_list_must_include_timestamp() {
    let (_, mut compiler, ctx) = setup();
    exec(
        &mut compiler,
        &ctx,
        "CREATE TABLE src (x INT, ts TIMESTAMP) TIMESTAMP(ts) PARTITION BY DAY",
    );
    exec(
        &mut compiler,
        &ctx,
        "CREATE TABLE dst (x INT, ts TIMESTAMP) TIMESTAMP(ts) PARTITION BY DAY",
    );
    let err = compiler
        .compile("INSERT INTO dst (x) SELECT x FROM src", &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("column list must include timestamp"), "{}", err);
}

#[test]
fn test_ordered_stream_into_partitioned_table() {
    let (engine, mut compiler, ctx) = setup();
    exec(
        &mut compiler,
        &ctx,
        "CREATE TABLE src (x INT, ts TIMESTAMP) TIMESTAMP(ts) PARTITION BY DAY",
    );
    insert(&mut compiler, &ctx, "INSERT INTO src VALUES (1, 1000)");
    insert(&mut compiler, &ctx, "INSERT INTO src VALUES (2, 2000)");
    exec(
        &mut compiler,
        &ctx,
        "CREATE TABLE dst (x INT, ts TIMESTAMP) TIMESTAMP(ts) PARTITION BY DAY",
    );

    exec(&mut compiler, &ctx, "INSERT INTO dst SELECT * FROM src");

    let reader = engine.reader("dst").unwrap();
    assert_eq!(reader.row_count(), 2);
    assert_eq!(reader.get_long(0, 1), 1000);
    assert_eq!(reader.get_long(1, 1), 2000);
}

#[test]
fn test_round_trip_duplicates_rows() {
    // inserting a table into itself doubles it row for row
    let (engine, mut compiler, ctx) = setup();
    exec(
        &mut compiler,
        &ctx,
        "CREATE TABLE t (a INT, b LONG, c DOUBLE, ts TIMESTAMP) TIMESTAMP(ts) PARTITION BY DAY",
    );
    insert(&mut compiler, &ctx, "INSERT INTO t VALUES (1, 10, 1.5, 100)");
    insert(&mut compiler, &ctx, "INSERT INTO t VALUES (2, 20, 2.5, 200)");

    exec(&mut compiler, &ctx, "INSERT INTO t SELECT * FROM t");

    let reader = engine.reader("t").unwrap();
    assert_eq!(reader.row_count(), 4);
    for (original, duplicate) in [(0, 2), (1, 3)] {
        assert_eq!(reader.get_int(original, 0), reader.get_int(duplicate, 0));
        assert_eq!(reader.get_long(original, 1), reader.get_long(duplicate, 1));
        assert_eq!(reader.get_double(original, 2), reader.get_double(duplicate, 2));
        assert_eq!(reader.get_long(original, 3), reader.get_long(duplicate, 3));
    }
}

#[test]
fn test_failed_stream_rolls_back() {
    // a descending source violates the chronology of the partitioned
    // target mid-stream; the row written before the failure unwinds
    let (engine, mut compiler, ctx) = setup();
    exec(
        &mut compiler,
        &ctx,
        "CREATE TABLE src (x INT, ts TIMESTAMP) TIMESTAMP(ts) PARTITION BY DAY",
    );
    insert(&mut compiler, &ctx, "INSERT INTO src VALUES (1, 1000)");
    insert(&mut compiler, &ctx, "INSERT INTO src VALUES (2, 2000)");
    exec(
        &mut compiler,
        &ctx,
        "CREATE TABLE dst (x INT, ts TIMESTAMP) TIMESTAMP(ts) PARTITION BY DAY",
    );

    let err = compiler
        .compile("INSERT INTO dst SELECT * FROM src ORDER BY ts DESC", &ctx)
        .unwrap_err();
    assert!(err.to_string().contains("out of order"), "{}", err);
    assert_eq!(engine.reader("dst").unwrap().row_count(), 0);
}
