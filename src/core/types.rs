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

//! Core type definitions for TempoDB
//!
//! This module defines the closed set of column types, their cast groups,
//! the assignability rules used by INSERT validation, and the null
//! sentinel values of the storage format.

use std::fmt;
use std::str::FromStr;

use super::error::Error;

/// Null sentinel for INT columns
pub const NULL_INT: i32 = i32::MIN;
/// Null sentinel for LONG, DATE and TIMESTAMP columns
pub const NULL_LONG: i64 = i64::MIN;
/// Null sentinel for CHAR columns
pub const NULL_CHAR: char = '\0';

/// Column types supported by the storage format
///
/// The discriminants are part of the wire/disk format and must not change.
/// Their ordering is load-bearing: numeric widening for INSERT assignment
/// is defined as `from < to` within the `Byte..=Double` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ColumnType {
    /// Boolean true/false
    Boolean = 0,
    /// 8-bit signed integer
    Byte = 1,
    /// 16-bit signed integer
    Short = 2,
    /// Single UTF-16 code unit
    Char = 3,
    /// 32-bit signed integer
    Int = 4,
    /// 64-bit signed integer
    Long = 5,
    /// Milliseconds since the epoch
    Date = 6,
    /// Microseconds since the epoch
    Timestamp = 7,
    /// 32-bit floating point number
    Float = 8,
    /// 64-bit floating point number
    Double = 9,
    /// Variable-length UTF-8 string
    String = 10,
    /// Interned string with a per-column dictionary and optional bitmap index
    Symbol = 11,
    /// 256-bit unsigned integer
    Long256 = 12,
    /// Variable-length binary blob
    Binary = 13,
}

/// All column types, in discriminant order
pub static COLUMN_TYPES: &[ColumnType] = &[
    ColumnType::Boolean,
    ColumnType::Byte,
    ColumnType::Short,
    ColumnType::Char,
    ColumnType::Int,
    ColumnType::Long,
    ColumnType::Date,
    ColumnType::Timestamp,
    ColumnType::Float,
    ColumnType::Double,
    ColumnType::String,
    ColumnType::Symbol,
    ColumnType::Long256,
    ColumnType::Binary,
];

/// Cast groups for CREATE TABLE AS SELECT.
///
/// Two types may appear in a CAST clause iff their groups match. Indexed
/// by `ColumnType` discriminant.
static CAST_GROUPS: [u8; 14] = [
    2, // BOOLEAN
    1, // BYTE
    1, // SHORT
    1, // CHAR
    1, // INT
    1, // LONG
    1, // DATE
    1, // TIMESTAMP
    1, // FLOAT
    1, // DOUBLE
    3, // STRING
    3, // SYMBOL
    5, // LONG256
    4, // BINARY
];

impl ColumnType {
    /// Returns the type ID as u8 for serialization
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Create ColumnType from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        COLUMN_TYPES.get(value as usize).copied()
    }

    /// The cast group this type belongs to (see CREATE TABLE AS SELECT)
    pub fn cast_group(&self) -> u8 {
        CAST_GROUPS[*self as usize]
    }

    /// Returns true if this type stores a 64-bit epoch value
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::Timestamp)
    }

    /// Returns true if this type participates in numeric widening
    pub fn is_numeric(&self) -> bool {
        *self >= ColumnType::Byte && *self <= ColumnType::Double && *self != ColumnType::Char
    }

    /// Resolve a SQL type name, returning None for unknown names
    pub fn by_name(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

/// Two types are compatible for a CAST clause iff their cast groups match
pub fn is_compatible_cast(from: ColumnType, to: ColumnType) -> bool {
    from.cast_group() == to.cast_group()
}

/// INSERT assignability: identity, numeric widening within BYTE..DOUBLE,
/// STRING<->SYMBOL, and CHAR->STRING.
///
/// CHAR sits inside the numeric discriminant range for cast-group purposes
/// but does not widen to or from numerics; the only non-identity CHAR
/// assignment is CHAR->STRING.
pub fn is_assignable_from(to: ColumnType, from: ColumnType) -> bool {
    to == from
        || (from >= ColumnType::Byte
            && to >= ColumnType::Byte
            && to <= ColumnType::Double
            && from < to
            && from != ColumnType::Char
            && to != ColumnType::Char)
        || (from == ColumnType::String && to == ColumnType::Symbol)
        || (from == ColumnType::Symbol && to == ColumnType::String)
        || (from == ColumnType::Char && to == ColumnType::String)
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Byte => "BYTE",
            ColumnType::Short => "SHORT",
            ColumnType::Char => "CHAR",
            ColumnType::Int => "INT",
            ColumnType::Long => "LONG",
            ColumnType::Date => "DATE",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Float => "FLOAT",
            ColumnType::Double => "DOUBLE",
            ColumnType::String => "STRING",
            ColumnType::Symbol => "SYMBOL",
            ColumnType::Long256 => "LONG256",
            ColumnType::Binary => "BINARY",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BOOLEAN" => Ok(ColumnType::Boolean),
            "BYTE" => Ok(ColumnType::Byte),
            "SHORT" => Ok(ColumnType::Short),
            "CHAR" => Ok(ColumnType::Char),
            "INT" => Ok(ColumnType::Int),
            "LONG" => Ok(ColumnType::Long),
            "DATE" => Ok(ColumnType::Date),
            "TIMESTAMP" => Ok(ColumnType::Timestamp),
            "FLOAT" => Ok(ColumnType::Float),
            "DOUBLE" => Ok(ColumnType::Double),
            "STRING" => Ok(ColumnType::String),
            "SYMBOL" => Ok(ColumnType::Symbol),
            "LONG256" => Ok(ColumnType::Long256),
            "BINARY" => Ok(ColumnType::Binary),
            _ => Err(Error::semantic(0, format!("invalid type: {}", s))),
        }
    }
}

/// 256-bit unsigned integer, stored as four little-endian 64-bit limbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Long256(pub [u64; 4]);

impl Long256 {
    /// Null sentinel: all limbs set
    pub const NULL: Long256 = Long256([u64::MAX; 4]);

    /// Check if this value is the null sentinel
    pub fn is_null(&self) -> bool {
        *self == Long256::NULL
    }
}

impl Default for Long256 {
    fn default() -> Self {
        Long256::NULL
    }
}

/// How a table's rows are split across partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PartitionBy {
    /// Single partition
    #[default]
    None = 0,
    /// One partition per day
    Day = 1,
    /// One partition per month
    Month = 2,
    /// One partition per year
    Year = 3,
}

impl FromStr for PartitionBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NONE" => Ok(PartitionBy::None),
            "DAY" => Ok(PartitionBy::Day),
            "MONTH" => Ok(PartitionBy::Month),
            "YEAR" => Ok(PartitionBy::Year),
            _ => Err(Error::semantic(0, format!("unknown partitioning: {}", s))),
        }
    }
}

impl fmt::Display for PartitionBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionBy::None => write!(f, "NONE"),
            PartitionBy::Day => write!(f, "DAY"),
            PartitionBy::Month => write!(f, "MONTH"),
            PartitionBy::Year => write!(f, "YEAR"),
        }
    }
}

/// Round up to the next power of two, leaving powers of two unchanged
pub fn ceil_pow2(value: usize) -> usize {
    value.next_power_of_two()
}

/// Largest symbol capacity accepted by a writer
pub const MAX_SYMBOL_CAPACITY: i64 = 1 << 30;
/// Smallest symbol capacity accepted by a writer
pub const MIN_SYMBOL_CAPACITY: i64 = 2;

/// Validate a SYMBOL column capacity, reporting at the given position
pub fn validate_symbol_capacity(position: usize, capacity: i64) -> super::error::Result<()> {
    if capacity < MIN_SYMBOL_CAPACITY {
        return Err(Error::semantic(
            position,
            format!("min symbol capacity is {}", MIN_SYMBOL_CAPACITY),
        ));
    }
    if capacity > MAX_SYMBOL_CAPACITY {
        return Err(Error::semantic(
            position,
            format!("max symbol capacity is {}", MAX_SYMBOL_CAPACITY),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trip() {
        for &ty in COLUMN_TYPES {
            assert_eq!(ty.to_string().parse::<ColumnType>().unwrap(), ty);
            assert_eq!(ColumnType::from_u8(ty.as_u8()), Some(ty));
        }
        assert!("VARCHAR".parse::<ColumnType>().is_err());
        assert_eq!(ColumnType::from_u8(14), None);
    }

    #[test]
    fn test_cast_groups() {
        // numeric-like group is freely inter-castable
        for &a in &[
            ColumnType::Byte,
            ColumnType::Short,
            ColumnType::Char,
            ColumnType::Int,
            ColumnType::Long,
            ColumnType::Float,
            ColumnType::Double,
            ColumnType::Date,
            ColumnType::Timestamp,
        ] {
            assert!(is_compatible_cast(a, ColumnType::Long));
            assert!(!is_compatible_cast(a, ColumnType::Boolean));
            assert!(!is_compatible_cast(a, ColumnType::String));
        }
        assert!(is_compatible_cast(ColumnType::String, ColumnType::Symbol));
        assert!(is_compatible_cast(ColumnType::Symbol, ColumnType::String));
        assert!(is_compatible_cast(ColumnType::Binary, ColumnType::Binary));
        assert!(!is_compatible_cast(ColumnType::Long256, ColumnType::Long));
        assert!(!is_compatible_cast(ColumnType::Long256, ColumnType::Binary));
    }

    #[test]
    fn test_assignability_widening() {
        assert!(is_assignable_from(ColumnType::Long, ColumnType::Int));
        assert!(is_assignable_from(ColumnType::Double, ColumnType::Int));
        assert!(is_assignable_from(ColumnType::Double, ColumnType::Float));
        assert!(is_assignable_from(ColumnType::Timestamp, ColumnType::Long));
        assert!(is_assignable_from(ColumnType::Float, ColumnType::Timestamp));
        // narrowing is not assignable
        assert!(!is_assignable_from(ColumnType::Int, ColumnType::Long));
        assert!(!is_assignable_from(ColumnType::Int, ColumnType::Double));
        assert!(!is_assignable_from(ColumnType::Byte, ColumnType::Short));
    }

    #[test]
    fn test_assignability_strings() {
        assert!(is_assignable_from(ColumnType::Symbol, ColumnType::String));
        assert!(is_assignable_from(ColumnType::String, ColumnType::Symbol));
        assert!(is_assignable_from(ColumnType::String, ColumnType::Char));
        assert!(!is_assignable_from(ColumnType::Char, ColumnType::String));
        assert!(!is_assignable_from(ColumnType::String, ColumnType::Int));
    }

    #[test]
    fn test_char_does_not_widen() {
        assert!(!is_assignable_from(ColumnType::Int, ColumnType::Char));
        assert!(!is_assignable_from(ColumnType::Char, ColumnType::Byte));
        assert!(is_assignable_from(ColumnType::Char, ColumnType::Char));
    }

    #[test]
    fn test_long256_null() {
        assert!(Long256::NULL.is_null());
        assert!(!Long256([0, 0, 0, 1]).is_null());
        assert!(Long256::default().is_null());
    }

    #[test]
    fn test_partition_by_parse() {
        assert_eq!("day".parse::<PartitionBy>().unwrap(), PartitionBy::Day);
        assert_eq!("MONTH".parse::<PartitionBy>().unwrap(), PartitionBy::Month);
        assert_eq!("Year".parse::<PartitionBy>().unwrap(), PartitionBy::Year);
        assert_eq!("NONE".parse::<PartitionBy>().unwrap(), PartitionBy::None);
        assert!("WEEK".parse::<PartitionBy>().is_err());
    }

    #[test]
    fn test_ceil_pow2() {
        assert_eq!(ceil_pow2(1), 1);
        assert_eq!(ceil_pow2(2), 2);
        assert_eq!(ceil_pow2(3), 4);
        assert_eq!(ceil_pow2(100), 128);
        assert_eq!(ceil_pow2(256), 256);
    }

    #[test]
    fn test_symbol_capacity_validation() {
        assert!(validate_symbol_capacity(0, 2).is_ok());
        assert!(validate_symbol_capacity(0, 256).is_ok());
        assert!(validate_symbol_capacity(0, 1).is_err());
        assert!(validate_symbol_capacity(0, -64).is_err());
        assert!(validate_symbol_capacity(0, (1 << 30) + 1).is_err());
    }
}
