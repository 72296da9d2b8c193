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

//! Function parser
//!
//! Walks an expression tree bottom-up and binds every node to a typed
//! [`Function`] through the operator/function factories. Column
//! references resolve against the metadata of the record the expression
//! will run over; binding an expression over empty metadata therefore
//! rejects any column reference.

use crate::core::error::{Error, Result};
use crate::parser::ast::ExprKind;
use crate::parser::pool::{ExprId, ExprPool};
use crate::storage::traits::RecordMetadata;

use super::registry;
use super::Function;

/// Binds expression nodes to typed function instances
#[derive(Debug, Default)]
pub struct FunctionParser;

impl FunctionParser {
    /// Create a function parser
    pub fn new() -> Self {
        Self
    }

    /// Bind the expression rooted at `node` against `metadata`
    pub fn parse_function(
        &self,
        pool: &ExprPool,
        node: ExprId,
        metadata: &RecordMetadata,
    ) -> Result<Function> {
        let expr = pool.get(node);
        match expr.kind {
            ExprKind::Constant => registry::new_constant(&expr.token, expr.position),
            ExprKind::Literal => {
                // joined metadata may key columns by their qualified
                // name; fall back to the bare column otherwise
                let index = metadata
                    .column_index(&expr.token)
                    .or_else(|| {
                        expr.token
                            .rsplit_once('.')
                            .and_then(|(_, col)| metadata.column_index(col))
                    })
                    .ok_or_else(|| Error::invalid_column(expr.position, &expr.token))?;
                Ok(Function::Column {
                    index,
                    ty: metadata.column(index).ty,
                })
            }
            ExprKind::Operator => {
                let lhs = expr
                    .lhs
                    .map(|id| self.parse_function(pool, id, metadata))
                    .transpose()?;
                let rhs = expr
                    .rhs
                    .map(|id| self.parse_function(pool, id, metadata))
                    .transpose()?;
                match (lhs, rhs) {
                    (Some(l), Some(r)) => {
                        registry::new_binary_operator(&expr.token, expr.position, l, r)
                    }
                    (Some(l), None) => {
                        registry::new_unary_operator(&expr.token, expr.position, l)
                    }
                    _ => Err(Error::internal(
                        expr.position,
                        "operator node without operands",
                    )),
                }
            }
            ExprKind::Function => {
                let args = expr
                    .args
                    .iter()
                    .map(|&id| self.parse_function(pool, id, metadata))
                    .collect::<Result<Vec<_>>>()?;
                registry::new_function(&expr.token, expr.position, args)
            }
            ExprKind::Query | ExprKind::SetOperation => Err(Error::not_supported(
                expr.position,
                "sub-queries are not supported in expressions",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ColumnType;
    use crate::functions::EmptyRecord;
    use crate::parser::ast::ExpressionNode;
    use crate::storage::traits::ColumnMeta;

    fn metadata() -> RecordMetadata {
        let mut m = RecordMetadata::new();
        m.add(ColumnMeta::new("price", ColumnType::Double));
        m.add(ColumnMeta::new("sym", ColumnType::Symbol));
        m
    }

    #[test]
    fn test_bind_constant_expression() {
        let mut pool = ExprPool::with_capacity(8);
        let one = pool.alloc(ExpressionNode::constant("1", 0));
        let two = pool.alloc(ExpressionNode::constant("2", 4));
        let sum = pool.alloc(ExpressionNode::binary("+", 2, one, two));

        let f = FunctionParser::new()
            .parse_function(&pool, sum, &RecordMetadata::new())
            .unwrap();
        assert_eq!(f.data_type(), ColumnType::Int);
        assert_eq!(f.get_int(&EmptyRecord), 3);
    }

    #[test]
    fn test_bind_column_reference() {
        let mut pool = ExprPool::with_capacity(8);
        let col = pool.alloc(ExpressionNode::literal("price", 0));
        let f = FunctionParser::new()
            .parse_function(&pool, col, &metadata())
            .unwrap();
        assert_eq!(
            f,
            Function::Column {
                index: 0,
                ty: ColumnType::Double
            }
        );
    }

    #[test]
    fn test_bind_qualified_column() {
        let mut pool = ExprPool::with_capacity(8);
        let col = pool.alloc(ExpressionNode::literal("t.sym", 0));
        let f = FunctionParser::new()
            .parse_function(&pool, col, &metadata())
            .unwrap();
        assert_eq!(f.data_type(), ColumnType::Symbol);
    }

    #[test]
    fn test_unknown_column_is_semantic_error() {
        let mut pool = ExprPool::with_capacity(8);
        let col = pool.alloc(ExpressionNode::literal("volume", 17));
        let err = FunctionParser::new()
            .parse_function(&pool, col, &metadata())
            .unwrap_err();
        assert_eq!(err.position(), 17);
        assert!(err.to_string().contains("invalid column"));
    }

    #[test]
    fn test_column_over_empty_metadata_rejected() {
        let mut pool = ExprPool::with_capacity(8);
        let col = pool.alloc(ExpressionNode::literal("x", 3));
        let err = FunctionParser::new()
            .parse_function(&pool, col, &RecordMetadata::new())
            .unwrap_err();
        assert!(matches!(err, Error::Semantic { .. }));
    }
}
