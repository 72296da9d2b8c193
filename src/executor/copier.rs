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

//! Record-to-row copier
//!
//! Builds, once per compiled statement, a chain of per-column conversion
//! functors copying one record into one writer row. The shape is fixed at
//! compile time, so the hot loop is a flat array of direct calls with no
//! per-row type dispatch.
//!
//! INT and LONG nulls pass through integer conversions as their plain
//! representation; only FLOAT/DOUBLE NaN maps to the integer null
//! sentinels. The destination's designated timestamp column is never
//! written here - rows are started at their timestamp instead.

use crate::core::error::{Error, Result};
use crate::core::types::{ColumnType, NULL_CHAR, NULL_INT, NULL_LONG};
use crate::storage::traits::{ColumnFilter, ColumnTypes, Record, RecordMetadata, Row};

type CopyFn = fn(&dyn Record, usize, &mut dyn Row, usize);

#[derive(Debug)]
struct CopyOp {
    from: usize,
    to: usize,
    copy: CopyFn,
}

/// A compiled one-record copier
#[derive(Debug)]
pub struct RecordToRowCopier {
    ops: Vec<CopyOp>,
}

impl RecordToRowCopier {
    /// Copy one record into one writer row
    pub fn copy(&self, record: &dyn Record, row: &mut dyn Row) {
        for op in &self.ops {
            (op.copy)(record, op.from, row, op.to);
        }
    }

    /// Number of columns the copier writes
    pub fn column_count(&self) -> usize {
        self.ops.len()
    }
}

/// Build a copier for the given source shape, destination metadata and
/// column filter. The filter maps source position `i` to destination
/// column `filter.get(i)`; the destination timestamp column is skipped.
pub fn assemble_row_copier(
    from: &dyn ColumnTypes,
    to: &RecordMetadata,
    filter: &ColumnFilter,
) -> Result<RecordToRowCopier> {
    let timestamp_index = to.timestamp_index();
    let mut ops = Vec::with_capacity(filter.count());

    for i in 0..filter.count() {
        let to_index = filter.get(i);
        if Some(to_index) == timestamp_index {
            continue;
        }
        let from_type = from.column_type(i);
        let to_type = to.column(to_index).ty;
        let copy = conversion(from_type, to_type).ok_or_else(|| {
            Error::internal(
                0,
                format!("no conversion from {} to {}", from_type, to_type),
            )
        })?;
        ops.push(CopyOp {
            from: i,
            to: to_index,
            copy,
        });
    }

    Ok(RecordToRowCopier { ops })
}

/// The complete legal conversion table; None marks an illegal pair, which
/// assignability validation rejects before assembly
fn conversion(from: ColumnType, to: ColumnType) -> Option<CopyFn> {
    use ColumnType::*;
    let f: CopyFn = match (from, to) {
        (Int, Int) => |r, f, w, t| w.put_int(t, r.get_int(f)),
        (Int, Long) => |r, f, w, t| w.put_long(t, r.get_int(f) as i64),
        (Int, Date) => |r, f, w, t| w.put_date(t, r.get_int(f) as i64),
        (Int, Timestamp) => |r, f, w, t| w.put_timestamp(t, r.get_int(f) as i64),
        (Int, Short) => |r, f, w, t| w.put_short(t, r.get_int(f) as i16),
        (Int, Byte) => |r, f, w, t| w.put_byte(t, r.get_int(f) as i8),
        (Int, Float) => |r, f, w, t| w.put_float(t, r.get_int(f) as f32),
        (Int, Double) => |r, f, w, t| w.put_double(t, r.get_int(f) as f64),

        (Long, Int) => |r, f, w, t| w.put_int(t, r.get_long(f) as i32),
        (Long, Long) => |r, f, w, t| w.put_long(t, r.get_long(f)),
        (Long, Date) => |r, f, w, t| w.put_date(t, r.get_long(f)),
        (Long, Timestamp) => |r, f, w, t| w.put_timestamp(t, r.get_long(f)),
        (Long, Short) => |r, f, w, t| w.put_short(t, r.get_long(f) as i16),
        (Long, Byte) => |r, f, w, t| w.put_byte(t, r.get_long(f) as i8),
        (Long, Float) => |r, f, w, t| w.put_float(t, r.get_long(f) as f32),
        (Long, Double) => |r, f, w, t| w.put_double(t, r.get_long(f) as f64),

        (Date, Int) => |r, f, w, t| w.put_int(t, r.get_date(f) as i32),
        (Date, Long) => |r, f, w, t| w.put_long(t, r.get_date(f)),
        (Date, Date) => |r, f, w, t| w.put_date(t, r.get_date(f)),
        (Date, Timestamp) => |r, f, w, t| w.put_timestamp(t, r.get_date(f)),
        (Date, Short) => |r, f, w, t| w.put_short(t, r.get_date(f) as i16),
        (Date, Byte) => |r, f, w, t| w.put_byte(t, r.get_date(f) as i8),
        (Date, Float) => |r, f, w, t| w.put_float(t, r.get_date(f) as f32),
        (Date, Double) => |r, f, w, t| w.put_double(t, r.get_date(f) as f64),

        (Timestamp, Int) => |r, f, w, t| w.put_int(t, r.get_timestamp(f) as i32),
        (Timestamp, Long) => |r, f, w, t| w.put_long(t, r.get_timestamp(f)),
        (Timestamp, Date) => |r, f, w, t| w.put_date(t, r.get_timestamp(f)),
        (Timestamp, Timestamp) => |r, f, w, t| w.put_timestamp(t, r.get_timestamp(f)),
        (Timestamp, Short) => |r, f, w, t| w.put_short(t, r.get_timestamp(f) as i16),
        (Timestamp, Byte) => |r, f, w, t| w.put_byte(t, r.get_timestamp(f) as i8),
        (Timestamp, Float) => |r, f, w, t| w.put_float(t, r.get_timestamp(f) as f32),
        (Timestamp, Double) => |r, f, w, t| w.put_double(t, r.get_timestamp(f) as f64),

        (Byte, Int) => |r, f, w, t| w.put_int(t, r.get_byte(f) as i32),
        (Byte, Long) => |r, f, w, t| w.put_long(t, r.get_byte(f) as i64),
        (Byte, Date) => |r, f, w, t| w.put_date(t, r.get_byte(f) as i64),
        (Byte, Timestamp) => |r, f, w, t| w.put_timestamp(t, r.get_byte(f) as i64),
        (Byte, Short) => |r, f, w, t| w.put_short(t, r.get_byte(f) as i16),
        (Byte, Byte) => |r, f, w, t| w.put_byte(t, r.get_byte(f)),
        (Byte, Float) => |r, f, w, t| w.put_float(t, r.get_byte(f) as f32),
        (Byte, Double) => |r, f, w, t| w.put_double(t, r.get_byte(f) as f64),

        (Short, Int) => |r, f, w, t| w.put_int(t, r.get_short(f) as i32),
        (Short, Long) => |r, f, w, t| w.put_long(t, r.get_short(f) as i64),
        (Short, Date) => |r, f, w, t| w.put_date(t, r.get_short(f) as i64),
        (Short, Timestamp) => |r, f, w, t| w.put_timestamp(t, r.get_short(f) as i64),
        (Short, Short) => |r, f, w, t| w.put_short(t, r.get_short(f)),
        (Short, Byte) => |r, f, w, t| w.put_byte(t, r.get_short(f) as i8),
        (Short, Float) => |r, f, w, t| w.put_float(t, r.get_short(f) as f32),
        (Short, Double) => |r, f, w, t| w.put_double(t, r.get_short(f) as f64),

        (Boolean, Boolean) => |r, f, w, t| w.put_bool(t, r.get_bool(f)),

        (Float, Int) => |r, f, w, t| {
            let v = r.get_float(f);
            w.put_int(t, if v.is_nan() { NULL_INT } else { v as i32 });
        },
        (Float, Long) => |r, f, w, t| {
            let v = r.get_float(f);
            w.put_long(t, if v.is_nan() { NULL_LONG } else { v as i64 });
        },
        (Float, Date) => |r, f, w, t| {
            let v = r.get_float(f);
            w.put_date(t, if v.is_nan() { NULL_LONG } else { v as i64 });
        },
        (Float, Timestamp) => |r, f, w, t| {
            let v = r.get_float(f);
            w.put_timestamp(t, if v.is_nan() { NULL_LONG } else { v as i64 });
        },
        (Float, Short) => |r, f, w, t| w.put_short(t, r.get_float(f) as i16),
        (Float, Byte) => |r, f, w, t| w.put_byte(t, r.get_float(f) as i8),
        (Float, Float) => |r, f, w, t| w.put_float(t, r.get_float(f)),
        (Float, Double) => |r, f, w, t| w.put_double(t, r.get_float(f) as f64),

        (Double, Int) => |r, f, w, t| {
            let v = r.get_double(f);
            w.put_int(t, if v.is_nan() { NULL_INT } else { v as i32 });
        },
        (Double, Long) => |r, f, w, t| {
            let v = r.get_double(f);
            w.put_long(t, if v.is_nan() { NULL_LONG } else { v as i64 });
        },
        (Double, Date) => |r, f, w, t| {
            let v = r.get_double(f);
            w.put_date(t, if v.is_nan() { NULL_LONG } else { v as i64 });
        },
        (Double, Timestamp) => |r, f, w, t| {
            let v = r.get_double(f);
            w.put_timestamp(t, if v.is_nan() { NULL_LONG } else { v as i64 });
        },
        (Double, Short) => |r, f, w, t| w.put_short(t, r.get_double(f) as i16),
        (Double, Byte) => |r, f, w, t| w.put_byte(t, r.get_double(f) as i8),
        (Double, Float) => |r, f, w, t| w.put_float(t, r.get_double(f) as f32),
        (Double, Double) => |r, f, w, t| w.put_double(t, r.get_double(f)),

        (Char, Char) => |r, f, w, t| w.put_char(t, r.get_char(f)),
        (Char, String) => |r, f, w, t| {
            let c = r.get_char(f);
            if c == NULL_CHAR {
                w.put_str(t, None);
            } else {
                let mut buf = [0u8; 4];
                w.put_str(t, Some(c.encode_utf8(&mut buf)));
            }
        },

        (Symbol, String) => |r, f, w, t| w.put_str(t, r.get_sym(f).as_deref()),
        (Symbol, Symbol) => |r, f, w, t| w.put_sym(t, r.get_sym(f).as_deref()),
        (String, String) => |r, f, w, t| w.put_str(t, r.get_str(f).as_deref()),
        (String, Symbol) => |r, f, w, t| w.put_sym(t, r.get_str(f).as_deref()),

        (Binary, Binary) => |r, f, w, t| w.put_bin(t, r.get_bin(f).as_deref()),
        (Long256, Long256) => |r, f, w, t| w.put_long256(t, r.get_long256(f)),

        _ => return None,
    };
    Some(f)
}
