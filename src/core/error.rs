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

//! Error types for TempoDB
//!
//! Every error raised while compiling or executing a statement carries the
//! byte offset into the original SQL text where the problem was detected
//! (0 where no position is known).

use thiserror::Error;

/// Result type alias for TempoDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type shared by the SQL pipeline and the storage engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed SQL: unexpected token, missing keyword, unterminated
    /// quote, numeric expected, column list mismatch
    #[error("{message} [position: {position}]")]
    Syntax { position: usize, message: String },

    /// Well-formed SQL that does not type-check or resolve: unknown
    /// table/column, duplicate column, invalid type, incompatible cast,
    /// inconvertible assignment, missing timestamp
    #[error("{message} [position: {position}]")]
    Semantic { position: usize, message: String },

    /// A writer, reader lock or table name lock could not be acquired
    #[error("{message} [position: {position}]")]
    ResourceBusy { position: usize, message: String },

    /// CREATE TABLE found the table (or a reservation for it) already there
    #[error("table already exists [position: {position}]")]
    AlreadyExists { position: usize },

    /// The source table's structure changed underneath a streaming
    /// mutation; the statement must be re-compiled against fresh metadata
    #[error("reader is out of date")]
    ReaderOutOfDate,

    /// File I/O failure inside COPY, reported with the OS errno
    #[error("{message} [errno={errno}] [position: {position}]")]
    Io {
        position: usize,
        errno: i32,
        message: String,
    },

    /// Feature parsed but not executable by this build
    #[error("{message} [position: {position}]")]
    NotSupported { position: usize, message: String },

    /// Exhausted retries or unexpected storage state
    #[error("{message} [position: {position}]")]
    Internal { position: usize, message: String },
}

impl Error {
    /// Create a new Syntax error
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Error::Syntax {
            position,
            message: message.into(),
        }
    }

    /// Create a new Semantic error
    pub fn semantic(position: usize, message: impl Into<String>) -> Self {
        Error::Semantic {
            position,
            message: message.into(),
        }
    }

    /// Create a new ResourceBusy error
    pub fn busy(position: usize, message: impl Into<String>) -> Self {
        Error::ResourceBusy {
            position,
            message: message.into(),
        }
    }

    /// Create a new Io error
    pub fn io(position: usize, errno: i32, message: impl Into<String>) -> Self {
        Error::Io {
            position,
            errno,
            message: message.into(),
        }
    }

    /// Create a new NotSupported error
    pub fn not_supported(position: usize, message: impl Into<String>) -> Self {
        Error::NotSupported {
            position,
            message: message.into(),
        }
    }

    /// Create a new Internal error
    pub fn internal(position: usize, message: impl Into<String>) -> Self {
        Error::Internal {
            position,
            message: message.into(),
        }
    }

    /// Semantic error for a column name that does not resolve
    pub fn invalid_column(position: usize, name: &str) -> Self {
        Error::semantic(position, format!("invalid column: {}", name))
    }

    /// Byte offset into the SQL text, 0 where unknown
    pub fn position(&self) -> usize {
        match self {
            Error::Syntax { position, .. }
            | Error::Semantic { position, .. }
            | Error::ResourceBusy { position, .. }
            | Error::AlreadyExists { position }
            | Error::Io { position, .. }
            | Error::NotSupported { position, .. }
            | Error::Internal { position, .. } => *position,
            Error::ReaderOutOfDate => 0,
        }
    }

    /// Check if the retry loop should re-compile and re-run
    pub fn is_out_of_date(&self) -> bool {
        matches!(self, Error::ReaderOutOfDate)
    }

    /// Check if this error reports a contended resource
    pub fn is_busy(&self) -> bool {
        matches!(self, Error::ResourceBusy { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::semantic(17, "table 'trades' does not exist");
        assert_eq!(
            err.to_string(),
            "table 'trades' does not exist [position: 17]"
        );
        assert_eq!(err.position(), 17);
    }

    #[test]
    fn test_invalid_column() {
        let err = Error::invalid_column(9, "price");
        assert_eq!(err.to_string(), "invalid column: price [position: 9]");
    }

    #[test]
    fn test_out_of_date_classification() {
        assert!(Error::ReaderOutOfDate.is_out_of_date());
        assert_eq!(Error::ReaderOutOfDate.position(), 0);
        assert!(!Error::syntax(0, "x").is_out_of_date());
    }

    #[test]
    fn test_busy_classification() {
        assert!(Error::busy(3, "table 'x' is busy").is_busy());
        assert!(!Error::internal(0, "boom").is_busy());
    }

    #[test]
    fn test_io_display() {
        let err = Error::io(5, 2, "could not open file");
        assert_eq!(
            err.to_string(),
            "could not open file [errno=2] [position: 5]"
        );
    }
}
