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

//! Typed function instances
//!
//! The function parser binds expression nodes to [`Function`] values: a
//! closed set of typed evaluators over a [`Record`]. Every function has a
//! definite [`ColumnType`] chosen by overload selection at bind time; the
//! row copier and the filter cursors then call only the getter matching
//! that type.

pub mod parser;
pub mod registry;

pub use parser::FunctionParser;

use std::borrow::Cow;

use crate::core::types::{ColumnType, Long256, NULL_CHAR, NULL_INT, NULL_LONG};
use crate::storage::traits::Record;

/// Comparison operators bound to typed comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// How a bound comparison evaluates its operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpKind {
    /// Both operands evaluate as doubles
    Numeric,
    /// Both operands evaluate as strings
    Str,
    /// Both operands evaluate as booleans
    Bool,
}

/// A typed, bound expression evaluator
#[derive(Debug, Clone, PartialEq)]
pub enum Function {
    /// Boolean constant
    BoolConst(bool),
    /// 32-bit integer constant
    IntConst(i32),
    /// 64-bit integer constant
    LongConst(i64),
    /// Double constant
    DoubleConst(f64),
    /// String constant; None is the typed null
    StrConst(Option<String>),
    /// Timestamp constant in epoch microseconds
    TimestampConst(i64),
    /// The NULL literal; typed as STRING
    Null,
    /// Read of the underlying record's column
    Column { index: usize, ty: ColumnType },
    /// Numeric negation, typed as its operand
    Neg(Box<Function>),
    /// Boolean negation
    Not(Box<Function>),
    /// Arithmetic, typed by overload selection (INT, LONG or DOUBLE)
    Arith {
        op: char,
        ty: ColumnType,
        lhs: Box<Function>,
        rhs: Box<Function>,
    },
    /// Comparison, boolean result
    Cmp {
        op: CmpOp,
        kind: CmpKind,
        lhs: Box<Function>,
        rhs: Box<Function>,
    },
    /// Logical AND
    And(Box<Function>, Box<Function>),
    /// Logical OR
    Or(Box<Function>, Box<Function>),
    /// String concatenation
    Concat(Box<Function>, Box<Function>),
    /// abs(), typed as its argument
    Abs { ty: ColumnType, arg: Box<Function> },
    /// to_timestamp(str): ISO-8601 text to epoch microseconds
    ToTimestamp(Box<Function>),
}

impl Function {
    /// The type this function evaluates to
    pub fn data_type(&self) -> ColumnType {
        match self {
            Function::BoolConst(_) => ColumnType::Boolean,
            Function::IntConst(_) => ColumnType::Int,
            Function::LongConst(_) => ColumnType::Long,
            Function::DoubleConst(_) => ColumnType::Double,
            Function::StrConst(_) | Function::Null => ColumnType::String,
            Function::TimestampConst(_) => ColumnType::Timestamp,
            Function::Column { ty, .. } => *ty,
            Function::Neg(f) => f.data_type(),
            Function::Not(_) | Function::Cmp { .. } | Function::And(..) | Function::Or(..) => {
                ColumnType::Boolean
            }
            Function::Arith { ty, .. } => *ty,
            Function::Concat(..) => ColumnType::String,
            Function::Abs { ty, .. } => *ty,
            Function::ToTimestamp(_) => ColumnType::Timestamp,
        }
    }

    /// True when the value is constant across records
    pub fn is_constant(&self) -> bool {
        match self {
            Function::BoolConst(_)
            | Function::IntConst(_)
            | Function::LongConst(_)
            | Function::DoubleConst(_)
            | Function::StrConst(_)
            | Function::TimestampConst(_)
            | Function::Null => true,
            Function::Column { .. } => false,
            Function::Neg(f) | Function::Not(f) | Function::Abs { arg: f, .. } => f.is_constant(),
            Function::ToTimestamp(f) => f.is_constant(),
            Function::Arith { lhs, rhs, .. } | Function::Cmp { lhs, rhs, .. } => {
                lhs.is_constant() && rhs.is_constant()
            }
            Function::And(l, r) | Function::Or(l, r) | Function::Concat(l, r) => {
                l.is_constant() && r.is_constant()
            }
        }
    }

    // =========================================================================
    // Evaluation cores
    // =========================================================================

    /// Evaluate as a 64-bit integer; nulls collapse to NULL_LONG
    fn long_value(&self, rec: &dyn Record) -> i64 {
        match self {
            Function::IntConst(v) => {
                if *v == NULL_INT {
                    NULL_LONG
                } else {
                    *v as i64
                }
            }
            Function::LongConst(v) | Function::TimestampConst(v) => *v,
            Function::DoubleConst(v) => {
                if v.is_nan() {
                    NULL_LONG
                } else {
                    *v as i64
                }
            }
            Function::Column { index, ty } => match ty {
                ColumnType::Byte => rec.get_byte(*index) as i64,
                ColumnType::Short => rec.get_short(*index) as i64,
                ColumnType::Int => {
                    let v = rec.get_int(*index);
                    if v == NULL_INT {
                        NULL_LONG
                    } else {
                        v as i64
                    }
                }
                ColumnType::Long => rec.get_long(*index),
                ColumnType::Date => rec.get_date(*index),
                ColumnType::Timestamp => rec.get_timestamp(*index),
                ColumnType::Float => {
                    let v = rec.get_float(*index);
                    if v.is_nan() {
                        NULL_LONG
                    } else {
                        v as i64
                    }
                }
                ColumnType::Double => {
                    let v = rec.get_double(*index);
                    if v.is_nan() {
                        NULL_LONG
                    } else {
                        v as i64
                    }
                }
                _ => NULL_LONG,
            },
            Function::Neg(f) => {
                let v = f.long_value(rec);
                if v == NULL_LONG {
                    v
                } else {
                    -v
                }
            }
            Function::Arith { op, ty, lhs, rhs } => {
                if *ty == ColumnType::Double || *ty == ColumnType::Float {
                    let v = self.double_value(rec);
                    return if v.is_nan() { NULL_LONG } else { v as i64 };
                }
                let l = lhs.long_value(rec);
                let r = rhs.long_value(rec);
                if l == NULL_LONG || r == NULL_LONG {
                    return NULL_LONG;
                }
                match op {
                    '+' => l.wrapping_add(r),
                    '-' => l.wrapping_sub(r),
                    '*' => l.wrapping_mul(r),
                    '%' => {
                        if r == 0 {
                            NULL_LONG
                        } else {
                            l % r
                        }
                    }
                    _ => NULL_LONG,
                }
            }
            Function::Abs { arg, .. } => {
                let v = arg.long_value(rec);
                if v == NULL_LONG {
                    v
                } else {
                    v.wrapping_abs()
                }
            }
            Function::ToTimestamp(arg) => match arg.get_str(rec) {
                Some(text) => parse_timestamp_micros(&text).unwrap_or(NULL_LONG),
                None => NULL_LONG,
            },
            _ => {
                let v = self.double_value(rec);
                if v.is_nan() {
                    NULL_LONG
                } else {
                    v as i64
                }
            }
        }
    }

    /// Evaluate as a double; nulls collapse to NaN
    fn double_value(&self, rec: &dyn Record) -> f64 {
        match self {
            Function::DoubleConst(v) => *v,
            Function::IntConst(v) => {
                if *v == NULL_INT {
                    f64::NAN
                } else {
                    *v as f64
                }
            }
            Function::LongConst(v) | Function::TimestampConst(v) => {
                if *v == NULL_LONG {
                    f64::NAN
                } else {
                    *v as f64
                }
            }
            Function::Column { index, ty } => match ty {
                ColumnType::Float => rec.get_float(*index) as f64,
                ColumnType::Double => rec.get_double(*index),
                ColumnType::Byte => rec.get_byte(*index) as f64,
                ColumnType::Short => rec.get_short(*index) as f64,
                ColumnType::Int => {
                    let v = rec.get_int(*index);
                    if v == NULL_INT {
                        f64::NAN
                    } else {
                        v as f64
                    }
                }
                ColumnType::Long | ColumnType::Date | ColumnType::Timestamp => {
                    let v = self.long_value(rec);
                    if v == NULL_LONG {
                        f64::NAN
                    } else {
                        v as f64
                    }
                }
                _ => f64::NAN,
            },
            Function::Neg(f) => -f.double_value(rec),
            Function::Arith { op, ty, lhs, rhs } => {
                if *ty != ColumnType::Double && *ty != ColumnType::Float {
                    let v = self.long_value(rec);
                    return if v == NULL_LONG { f64::NAN } else { v as f64 };
                }
                let l = lhs.double_value(rec);
                let r = rhs.double_value(rec);
                match op {
                    '+' => l + r,
                    '-' => l - r,
                    '*' => l * r,
                    '/' => l / r,
                    '%' => l % r,
                    _ => f64::NAN,
                }
            }
            Function::Abs { arg, ty } => {
                if *ty == ColumnType::Double || *ty == ColumnType::Float {
                    arg.double_value(rec).abs()
                } else {
                    let v = self.long_value(rec);
                    if v == NULL_LONG {
                        f64::NAN
                    } else {
                        v as f64
                    }
                }
            }
            _ => {
                let v = self.long_value(rec);
                if v == NULL_LONG {
                    f64::NAN
                } else {
                    v as f64
                }
            }
        }
    }

    // =========================================================================
    // Record-style getters, dispatched by data_type()
    // =========================================================================

    pub fn get_bool(&self, rec: &dyn Record) -> bool {
        match self {
            Function::BoolConst(v) => *v,
            Function::Column { index, .. } => rec.get_bool(*index),
            Function::Not(f) => !f.get_bool(rec),
            Function::And(l, r) => l.get_bool(rec) && r.get_bool(rec),
            Function::Or(l, r) => l.get_bool(rec) || r.get_bool(rec),
            Function::Cmp { op, kind, lhs, rhs } => match kind {
                CmpKind::Numeric => {
                    let l = lhs.double_value(rec);
                    let r = rhs.double_value(rec);
                    if l.is_nan() || r.is_nan() {
                        // null comparisons hold only for equality of two nulls
                        return matches!(op, CmpOp::Eq) && l.is_nan() && r.is_nan();
                    }
                    match op {
                        CmpOp::Eq => l == r,
                        CmpOp::Ne => l != r,
                        CmpOp::Lt => l < r,
                        CmpOp::Le => l <= r,
                        CmpOp::Gt => l > r,
                        CmpOp::Ge => l >= r,
                    }
                }
                CmpKind::Str => {
                    let l = lhs.get_str(rec);
                    let r = rhs.get_str(rec);
                    match (l, r) {
                        (Some(l), Some(r)) => match op {
                            CmpOp::Eq => l == r,
                            CmpOp::Ne => l != r,
                            CmpOp::Lt => l < r,
                            CmpOp::Le => l <= r,
                            CmpOp::Gt => l > r,
                            CmpOp::Ge => l >= r,
                        },
                        (None, None) => matches!(op, CmpOp::Eq),
                        _ => matches!(op, CmpOp::Ne),
                    }
                }
                CmpKind::Bool => {
                    let l = lhs.get_bool(rec);
                    let r = rhs.get_bool(rec);
                    match op {
                        CmpOp::Eq => l == r,
                        CmpOp::Ne => l != r,
                        _ => false,
                    }
                }
            },
            _ => false,
        }
    }

    pub fn get_byte(&self, rec: &dyn Record) -> i8 {
        match self {
            Function::Column {
                index,
                ty: ColumnType::Byte,
            } => rec.get_byte(*index),
            _ => {
                let v = self.long_value(rec);
                if v == NULL_LONG {
                    0
                } else {
                    v as i8
                }
            }
        }
    }

    pub fn get_short(&self, rec: &dyn Record) -> i16 {
        match self {
            Function::Column {
                index,
                ty: ColumnType::Short,
            } => rec.get_short(*index),
            _ => {
                let v = self.long_value(rec);
                if v == NULL_LONG {
                    0
                } else {
                    v as i16
                }
            }
        }
    }

    pub fn get_char(&self, rec: &dyn Record) -> char {
        match self {
            Function::Column {
                index,
                ty: ColumnType::Char,
            } => rec.get_char(*index),
            _ => NULL_CHAR,
        }
    }

    pub fn get_int(&self, rec: &dyn Record) -> i32 {
        match self {
            Function::IntConst(v) => *v,
            Function::Column {
                index,
                ty: ColumnType::Int,
            } => rec.get_int(*index),
            _ => {
                let v = self.long_value(rec);
                if v == NULL_LONG {
                    NULL_INT
                } else {
                    v as i32
                }
            }
        }
    }

    pub fn get_long(&self, rec: &dyn Record) -> i64 {
        self.long_value(rec)
    }

    pub fn get_date(&self, rec: &dyn Record) -> i64 {
        self.long_value(rec)
    }

    pub fn get_timestamp(&self, rec: &dyn Record) -> i64 {
        self.long_value(rec)
    }

    pub fn get_float(&self, rec: &dyn Record) -> f32 {
        match self {
            Function::Column {
                index,
                ty: ColumnType::Float,
            } => rec.get_float(*index),
            _ => self.double_value(rec) as f32,
        }
    }

    pub fn get_double(&self, rec: &dyn Record) -> f64 {
        self.double_value(rec)
    }

    pub fn get_str<'a>(&'a self, rec: &'a dyn Record) -> Option<Cow<'a, str>> {
        match self {
            Function::StrConst(v) => v.as_deref().map(Cow::Borrowed),
            Function::Null => None,
            Function::Column { index, ty } => match ty {
                ColumnType::String => rec.get_str(*index),
                ColumnType::Symbol => rec.get_sym(*index),
                ColumnType::Char => {
                    let c = rec.get_char(*index);
                    if c == NULL_CHAR {
                        None
                    } else {
                        Some(Cow::Owned(c.to_string()))
                    }
                }
                _ => None,
            },
            Function::Concat(l, r) => {
                let l = l.get_str(rec)?;
                let r = r.get_str(rec)?;
                Some(Cow::Owned(format!("{}{}", l, r)))
            }
            _ => None,
        }
    }

    pub fn get_sym<'a>(&'a self, rec: &'a dyn Record) -> Option<Cow<'a, str>> {
        match self {
            Function::Column {
                index,
                ty: ColumnType::Symbol,
            } => rec.get_sym(*index),
            _ => self.get_str(rec),
        }
    }

    pub fn get_bin<'a>(&'a self, rec: &'a dyn Record) -> Option<Cow<'a, [u8]>> {
        match self {
            Function::Column {
                index,
                ty: ColumnType::Binary,
            } => rec.get_bin(*index),
            _ => None,
        }
    }

    pub fn get_long256(&self, rec: &dyn Record) -> Long256 {
        match self {
            Function::Column {
                index,
                ty: ColumnType::Long256,
            } => rec.get_long256(*index),
            _ => Long256::NULL,
        }
    }
}

/// Parse an ISO-8601-ish timestamp into epoch microseconds
fn parse_timestamp_micros(text: &str) -> Option<i64> {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_micros());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp_micros());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_micros());
    }
    None
}

/// A record whose columns are produced by functions, evaluated lazily
/// against a base record
pub struct VirtualRecord<'a> {
    functions: &'a [Function],
    base: &'a dyn Record,
}

impl<'a> VirtualRecord<'a> {
    /// Wrap functions around a base record
    pub fn new(functions: &'a [Function], base: &'a dyn Record) -> Self {
        Self { functions, base }
    }
}

impl Record for VirtualRecord<'_> {
    fn get_bool(&self, col: usize) -> bool {
        self.functions[col].get_bool(self.base)
    }
    fn get_byte(&self, col: usize) -> i8 {
        self.functions[col].get_byte(self.base)
    }
    fn get_short(&self, col: usize) -> i16 {
        self.functions[col].get_short(self.base)
    }
    fn get_char(&self, col: usize) -> char {
        self.functions[col].get_char(self.base)
    }
    fn get_int(&self, col: usize) -> i32 {
        self.functions[col].get_int(self.base)
    }
    fn get_long(&self, col: usize) -> i64 {
        self.functions[col].get_long(self.base)
    }
    fn get_date(&self, col: usize) -> i64 {
        self.functions[col].get_date(self.base)
    }
    fn get_timestamp(&self, col: usize) -> i64 {
        self.functions[col].get_timestamp(self.base)
    }
    fn get_float(&self, col: usize) -> f32 {
        self.functions[col].get_float(self.base)
    }
    fn get_double(&self, col: usize) -> f64 {
        self.functions[col].get_double(self.base)
    }
    fn get_str(&self, col: usize) -> Option<Cow<'_, str>> {
        self.functions[col].get_str(self.base)
    }
    fn get_sym(&self, col: usize) -> Option<Cow<'_, str>> {
        self.functions[col].get_sym(self.base)
    }
    fn get_bin(&self, col: usize) -> Option<Cow<'_, [u8]>> {
        self.functions[col].get_bin(self.base)
    }
    fn get_long256(&self, col: usize) -> Long256 {
        self.functions[col].get_long256(self.base)
    }
}

/// A record with no columns; reads return null sentinels. Used as the
/// base of constant-only virtual records.
pub struct EmptyRecord;

impl Record for EmptyRecord {
    fn get_bool(&self, _col: usize) -> bool {
        false
    }
    fn get_byte(&self, _col: usize) -> i8 {
        0
    }
    fn get_short(&self, _col: usize) -> i16 {
        0
    }
    fn get_char(&self, _col: usize) -> char {
        NULL_CHAR
    }
    fn get_int(&self, _col: usize) -> i32 {
        NULL_INT
    }
    fn get_long(&self, _col: usize) -> i64 {
        NULL_LONG
    }
    fn get_date(&self, _col: usize) -> i64 {
        NULL_LONG
    }
    fn get_timestamp(&self, _col: usize) -> i64 {
        NULL_LONG
    }
    fn get_float(&self, _col: usize) -> f32 {
        f32::NAN
    }
    fn get_double(&self, _col: usize) -> f64 {
        f64::NAN
    }
    fn get_str(&self, _col: usize) -> Option<Cow<'_, str>> {
        None
    }
    fn get_sym(&self, _col: usize) -> Option<Cow<'_, str>> {
        None
    }
    fn get_bin(&self, _col: usize) -> Option<Cow<'_, [u8]>> {
        None
    }
    fn get_long256(&self, _col: usize) -> Long256 {
        Long256::NULL
    }
}
