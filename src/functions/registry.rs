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

//! Operator and function factories
//!
//! Each factory validates operand types, selects the overload, and
//! returns a bound [`Function`]. Constant folding happens here so that a
//! negated literal binds as a plain constant.

use crate::core::error::{Error, Result};
use crate::core::types::ColumnType;

use super::{CmpKind, CmpOp, Function};

/// Bind a constant token (source spelling) to a typed constant
pub fn new_constant(token: &str, position: usize) -> Result<Function> {
    match token {
        "true" => return Ok(Function::BoolConst(true)),
        "false" => return Ok(Function::BoolConst(false)),
        "null" => return Ok(Function::Null),
        _ => {}
    }
    if token.starts_with('\'') {
        // string literal with its quotes still on
        let inner = &token[1..token.len().saturating_sub(1)];
        return Ok(Function::StrConst(Some(inner.to_string())));
    }
    if token.contains('.') || token.contains('e') || token.contains('E') {
        return token
            .parse::<f64>()
            .map(Function::DoubleConst)
            .map_err(|_| Error::syntax(position, format!("invalid constant: {}", token)));
    }
    if let Ok(v) = token.parse::<i32>() {
        return Ok(Function::IntConst(v));
    }
    token
        .parse::<i64>()
        .map(Function::LongConst)
        .map_err(|_| Error::syntax(position, format!("invalid constant: {}", token)))
}

fn is_numeric_operand(ty: ColumnType) -> bool {
    ty.is_numeric() || ty.is_temporal()
}

fn is_string_operand(ty: ColumnType) -> bool {
    matches!(ty, ColumnType::String | ColumnType::Symbol | ColumnType::Char)
}

/// Result type ladder for binary arithmetic
fn arith_result_type(l: ColumnType, r: ColumnType) -> ColumnType {
    if l == ColumnType::Double
        || r == ColumnType::Double
        || l == ColumnType::Float
        || r == ColumnType::Float
    {
        ColumnType::Double
    } else if l >= ColumnType::Long || r >= ColumnType::Long {
        ColumnType::Long
    } else {
        ColumnType::Int
    }
}

/// Bind a unary operator
pub fn new_unary_operator(token: &str, position: usize, operand: Function) -> Result<Function> {
    match token {
        "-" => {
            let ty = operand.data_type();
            if !is_numeric_operand(ty) {
                return Err(Error::semantic(
                    position,
                    format!("unary '-' requires a numeric operand, not {}", ty),
                ));
            }
            // fold literal negation into the constant itself
            Ok(match operand {
                Function::IntConst(v) => Function::IntConst(-v),
                Function::LongConst(v) => Function::LongConst(-v),
                Function::DoubleConst(v) => Function::DoubleConst(-v),
                other => Function::Neg(Box::new(other)),
            })
        }
        "not" => {
            if operand.data_type() != ColumnType::Boolean {
                return Err(Error::semantic(
                    position,
                    "NOT requires a boolean operand",
                ));
            }
            Ok(Function::Not(Box::new(operand)))
        }
        _ => Err(Error::semantic(
            position,
            format!("unknown operator: {}", token),
        )),
    }
}

/// Bind a binary operator, selecting the overload from operand types
pub fn new_binary_operator(
    token: &str,
    position: usize,
    lhs: Function,
    rhs: Function,
) -> Result<Function> {
    let lt = lhs.data_type();
    let rt = rhs.data_type();

    match token {
        "+" | "-" | "*" | "/" | "%" => {
            if !is_numeric_operand(lt) || !is_numeric_operand(rt) {
                return Err(Error::semantic(
                    position,
                    format!("'{}' requires numeric operands, not {} and {}", token, lt, rt),
                ));
            }
            let ty = if token == "/" {
                ColumnType::Double
            } else {
                arith_result_type(lt, rt)
            };
            Ok(Function::Arith {
                op: token.chars().next().unwrap_or('+'),
                ty,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            })
        }
        "=" | "!=" | "<>" | "<" | "<=" | ">" | ">=" => {
            let op = match token {
                "=" => CmpOp::Eq,
                "!=" | "<>" => CmpOp::Ne,
                "<" => CmpOp::Lt,
                "<=" => CmpOp::Le,
                ">" => CmpOp::Gt,
                _ => CmpOp::Ge,
            };
            let kind = if is_numeric_operand(lt) && is_numeric_operand(rt) {
                CmpKind::Numeric
            } else if is_string_operand(lt) && is_string_operand(rt) {
                CmpKind::Str
            } else if lt == ColumnType::Boolean && rt == ColumnType::Boolean {
                CmpKind::Bool
            } else {
                return Err(Error::semantic(
                    position,
                    format!("cannot compare {} and {}", lt, rt),
                ));
            };
            Ok(Function::Cmp {
                op,
                kind,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            })
        }
        "and" | "or" => {
            if lt != ColumnType::Boolean || rt != ColumnType::Boolean {
                return Err(Error::semantic(
                    position,
                    format!("'{}' requires boolean operands", token.to_uppercase()),
                ));
            }
            Ok(if token == "and" {
                Function::And(Box::new(lhs), Box::new(rhs))
            } else {
                Function::Or(Box::new(lhs), Box::new(rhs))
            })
        }
        "||" => {
            if !is_string_operand(lt) || !is_string_operand(rt) {
                return Err(Error::semantic(
                    position,
                    "'||' requires string operands",
                ));
            }
            Ok(Function::Concat(Box::new(lhs), Box::new(rhs)))
        }
        _ => Err(Error::semantic(
            position,
            format!("unknown operator: {}", token),
        )),
    }
}

/// Bind a named function call, selecting the overload from argument types
pub fn new_function(name: &str, position: usize, mut args: Vec<Function>) -> Result<Function> {
    match name {
        "abs" => {
            if args.len() != 1 {
                return Err(Error::semantic(position, "wrong number of arguments"));
            }
            let arg = args.remove(0);
            let ty = arg.data_type();
            if !ty.is_numeric() {
                return Err(Error::semantic(
                    position,
                    format!("abs() requires a numeric argument, not {}", ty),
                ));
            }
            let ty = if ty == ColumnType::Float {
                ColumnType::Double
            } else {
                ty
            };
            Ok(Function::Abs {
                ty,
                arg: Box::new(arg),
            })
        }
        "concat" => {
            if args.len() != 2 {
                return Err(Error::semantic(position, "wrong number of arguments"));
            }
            let rhs = args.pop().unwrap_or(Function::Null);
            let lhs = args.pop().unwrap_or(Function::Null);
            new_binary_operator("||", position, lhs, rhs)
        }
        "to_timestamp" => {
            if args.len() != 1 {
                return Err(Error::semantic(position, "wrong number of arguments"));
            }
            let arg = args.remove(0);
            if !is_string_operand(arg.data_type()) {
                return Err(Error::semantic(
                    position,
                    "to_timestamp() requires a string argument",
                ));
            }
            Ok(Function::ToTimestamp(Box::new(arg)))
        }
        _ => Err(Error::semantic(
            position,
            format!("unknown function name: {}", name),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::EmptyRecord;

    #[test]
    fn test_constant_binding() {
        assert_eq!(new_constant("1", 0).unwrap(), Function::IntConst(1));
        assert_eq!(
            new_constant("1577836800000000", 0).unwrap(),
            Function::LongConst(1_577_836_800_000_000)
        );
        assert_eq!(new_constant("3.5", 0).unwrap(), Function::DoubleConst(3.5));
        assert_eq!(new_constant("true", 0).unwrap(), Function::BoolConst(true));
        assert_eq!(new_constant("null", 0).unwrap(), Function::Null);
        assert_eq!(
            new_constant("'abc'", 0).unwrap(),
            Function::StrConst(Some("abc".into()))
        );
    }

    #[test]
    fn test_negation_folds_constants() {
        let f = new_unary_operator("-", 0, Function::IntConst(5)).unwrap();
        assert_eq!(f, Function::IntConst(-5));
        let f = new_unary_operator("-", 0, Function::DoubleConst(2.5)).unwrap();
        assert_eq!(f, Function::DoubleConst(-2.5));
    }

    #[test]
    fn test_arith_overloads() {
        let f = new_binary_operator("+", 0, Function::IntConst(1), Function::IntConst(2)).unwrap();
        assert_eq!(f.data_type(), ColumnType::Int);

        let f = new_binary_operator("+", 0, Function::IntConst(1), Function::LongConst(2)).unwrap();
        assert_eq!(f.data_type(), ColumnType::Long);

        let f =
            new_binary_operator("*", 0, Function::DoubleConst(1.5), Function::IntConst(2)).unwrap();
        assert_eq!(f.data_type(), ColumnType::Double);

        // division is always double
        let f = new_binary_operator("/", 0, Function::IntConst(4), Function::IntConst(2)).unwrap();
        assert_eq!(f.data_type(), ColumnType::Double);
        assert_eq!(f.get_double(&EmptyRecord), 2.0);
    }

    #[test]
    fn test_arith_rejects_strings() {
        let err = new_binary_operator(
            "+",
            9,
            Function::StrConst(Some("a".into())),
            Function::IntConst(1),
        )
        .unwrap_err();
        assert_eq!(err.position(), 9);
    }

    #[test]
    fn test_unknown_function() {
        let err = new_function("frobnicate", 4, vec![]).unwrap_err();
        assert!(err.to_string().contains("unknown function name"));
    }

    #[test]
    fn test_abs_overload() {
        let f = new_function("abs", 0, vec![Function::IntConst(-3)]).unwrap();
        assert_eq!(f.data_type(), ColumnType::Int);
        assert_eq!(f.get_int(&EmptyRecord), 3);
    }
}
