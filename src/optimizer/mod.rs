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

//! Rule-based query model rewriter
//!
//! Runs after parsing and before code generation:
//!
//! 1. sub-query inlining - a nested `select *` collapses into its parent
//! 2. source resolution - every referenced table must exist
//! 3. alias resolution - `alias.column` references of single-source
//!    queries lose their qualifier
//! 4. predicate push-down - WHERE conjuncts that only touch columns a
//!    nested projection exposes move into the nested model
//! 5. join reordering - predicated joins run before cross joins

use crate::core::error::{Error, Result};
use crate::parser::ast::{ExprKind, ExpressionNode, JoinKind, QueryModel};
use crate::parser::pool::{ExprId, ExprPool};
use crate::storage::traits::{StorageEngine, TableStatus};

/// Rewrites query models in place
#[derive(Debug, Default)]
pub struct SqlOptimiser;

impl SqlOptimiser {
    /// Create an optimiser
    pub fn new() -> Self {
        Self
    }

    /// Optimise `model` and every nested model below it
    pub fn optimise(
        &self,
        model: &mut QueryModel,
        pool: &mut ExprPool,
        engine: &dyn StorageEngine,
    ) -> Result<()> {
        if let Some(nested) = model.nested.as_mut() {
            self.optimise(nested, pool, engine)?;
        }
        self.inline_subqueries(model, pool);
        self.resolve_sources(model, engine)?;
        self.resolve_aliases(model, pool)?;
        self.push_down_predicates(model, pool);
        self.reorder_joins(model);
        Ok(())
    }

    /// Collapse `SELECT ... FROM (SELECT * FROM t WHERE p)` into
    /// `SELECT ... FROM t WHERE p`, repeatedly
    fn inline_subqueries(&self, model: &mut QueryModel, pool: &mut ExprPool) {
        while let Some(nested) = model.nested.take() {
            let trivial = nested.columns.is_empty()
                && nested.joins.is_empty()
                && nested.group_by.is_empty()
                && nested.sample_by.is_none()
                && nested.order_by.is_empty()
                && nested.limit.is_none();
            if !trivial {
                model.nested = Some(nested);
                return;
            }
            let nested = *nested;
            model.table = nested.table;
            model.nested = nested.nested;
            if model.alias.is_none() {
                model.alias = nested.alias;
            }
            model.where_clause = match (nested.where_clause, model.where_clause) {
                (Some(inner), Some(outer)) => {
                    let position = pool.get(outer).position;
                    Some(pool.alloc(ExpressionNode::binary("and", position, inner, outer)))
                }
                (inner, outer) => inner.or(outer),
            };
        }
    }

    /// Every table named by the model must exist in the engine
    fn resolve_sources(&self, model: &QueryModel, engine: &dyn StorageEngine) -> Result<()> {
        if let Some(ref table) = model.table {
            if engine.status(&table.name) != TableStatus::Exists {
                return Err(Error::semantic(
                    table.position,
                    format!("table '{}' does not exist", table.name),
                ));
            }
        }
        for join in &model.joins {
            if engine.status(&join.table.name) != TableStatus::Exists {
                return Err(Error::semantic(
                    join.table.position,
                    format!("table '{}' does not exist", join.table.name),
                ));
            }
        }
        Ok(())
    }

    /// For single-source models, rewrite `alias.column` to `column`;
    /// an unknown qualifier is an invalid column
    fn resolve_aliases(&self, model: &mut QueryModel, pool: &mut ExprPool) -> Result<()> {
        if !model.joins.is_empty() {
            return Ok(());
        }
        let source_names: Vec<String> = model
            .alias
            .iter()
            .cloned()
            .chain(model.table.as_ref().map(|t| t.name.clone()))
            .collect();

        let mut roots: Vec<ExprId> = Vec::new();
        roots.extend(model.columns.iter().map(|c| c.ast));
        roots.extend(model.where_clause);
        roots.extend(model.group_by.iter().copied());
        roots.extend(model.sample_by);
        roots.extend(model.order_by.iter().map(|o| o.expr));
        roots.extend(model.limit);

        for root in roots {
            self.strip_qualifiers(root, &source_names, pool)?;
        }
        Ok(())
    }

    fn strip_qualifiers(
        &self,
        node: ExprId,
        source_names: &[String],
        pool: &mut ExprPool,
    ) -> Result<()> {
        let (kind, lhs, rhs, args) = {
            let expr = pool.get(node);
            (expr.kind, expr.lhs, expr.rhs, expr.args.clone())
        };
        if kind == ExprKind::Literal {
            let (token, position) = {
                let expr = pool.get(node);
                (expr.token.clone(), expr.position)
            };
            if let Some((qualifier, column)) = token.split_once('.') {
                if source_names
                    .iter()
                    .any(|n| n.eq_ignore_ascii_case(qualifier))
                {
                    pool.get_mut(node).token = column.to_string();
                } else {
                    return Err(Error::invalid_column(position, &token));
                }
            }
            return Ok(());
        }
        for child in lhs.into_iter().chain(rhs).chain(args) {
            self.strip_qualifiers(child, source_names, pool)?;
        }
        Ok(())
    }

    /// Move WHERE conjuncts into a projected nested model when every
    /// column they touch maps onto a plain column of the nested output
    fn push_down_predicates(&self, model: &mut QueryModel, pool: &mut ExprPool) {
        let Some(nested) = model.nested.as_mut() else {
            return;
        };
        let Some(where_clause) = model.where_clause else {
            return;
        };
        if nested.columns.is_empty() {
            // bare `select *` nesting was already inlined; anything left
            // here carries clauses that must run before filtering
            return;
        }

        // visible name -> underlying column, only for plain projections
        let mut visible: Vec<(String, String)> = Vec::new();
        for column in &nested.columns {
            let ast = pool.get(column.ast);
            if ast.kind != ExprKind::Literal {
                continue;
            }
            let source = ast.token.clone();
            let name = column.alias.clone().unwrap_or_else(|| source.clone());
            visible.push((name, source));
        }

        let mut conjuncts = Vec::new();
        split_conjuncts(pool, where_clause, &mut conjuncts);

        let mut kept: Vec<ExprId> = Vec::new();
        let mut pushed: Vec<ExprId> = Vec::new();
        for conjunct in conjuncts {
            if self.rewrite_for_pushdown(conjunct, &visible, pool) {
                pushed.push(conjunct);
            } else {
                kept.push(conjunct);
            }
        }

        if pushed.is_empty() {
            return;
        }
        for conjunct in pushed {
            nested.where_clause = Some(match nested.where_clause {
                Some(existing) => {
                    let position = pool.get(existing).position;
                    pool.alloc(ExpressionNode::binary("and", position, existing, conjunct))
                }
                None => conjunct,
            });
        }
        model.where_clause = kept.into_iter().reduce(|acc, next| {
            let position = pool.get(acc).position;
            pool.alloc(ExpressionNode::binary("and", position, acc, next))
        });
    }

    /// Check that every literal of `node` is a visible nested column and
    /// rewrite it to the underlying name; false leaves the node untouched
    fn rewrite_for_pushdown(
        &self,
        node: ExprId,
        visible: &[(String, String)],
        pool: &mut ExprPool,
    ) -> bool {
        if !self.pushdown_applies(node, visible, pool) {
            return false;
        }
        self.apply_pushdown_rewrite(node, visible, pool);
        true
    }

    fn pushdown_applies(
        &self,
        node: ExprId,
        visible: &[(String, String)],
        pool: &ExprPool,
    ) -> bool {
        let expr = pool.get(node);
        match expr.kind {
            ExprKind::Literal => visible
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(&expr.token)),
            ExprKind::Constant => true,
            ExprKind::Operator | ExprKind::Function => expr
                .lhs
                .into_iter()
                .chain(expr.rhs)
                .chain(expr.args.iter().copied())
                .all(|child| self.pushdown_applies(child, visible, pool)),
            _ => false,
        }
    }

    fn apply_pushdown_rewrite(
        &self,
        node: ExprId,
        visible: &[(String, String)],
        pool: &mut ExprPool,
    ) {
        let (kind, lhs, rhs, args) = {
            let expr = pool.get(node);
            (expr.kind, expr.lhs, expr.rhs, expr.args.clone())
        };
        if kind == ExprKind::Literal {
            let token = pool.get(node).token.clone();
            if let Some((_, source)) = visible
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(&token))
            {
                pool.get_mut(node).token = source.clone();
            }
            return;
        }
        for child in lhs.into_iter().chain(rhs).chain(args) {
            self.apply_pushdown_rewrite(child, visible, pool);
        }
    }

    /// Predicated joins first, cross joins last; syntactic order is
    /// preserved within each class
    fn reorder_joins(&self, model: &mut QueryModel) {
        model
            .joins
            .sort_by_key(|join| matches!(join.kind, JoinKind::Cross));
    }
}

/// Flatten a tree of AND nodes into its conjuncts
fn split_conjuncts(pool: &ExprPool, node: ExprId, out: &mut Vec<ExprId>) {
    let expr = pool.get(node);
    if expr.kind == ExprKind::Operator && expr.token == "and" {
        if let (Some(lhs), Some(rhs)) = (expr.lhs, expr.rhs) {
            split_conjuncts(pool, lhs, out);
            split_conjuncts(pool, rhs, out);
            return;
        }
    }
    out.push(node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ExecutionModel, Lexer, Parser};
    use crate::storage::mem::MemEngine;
    use crate::storage::traits::{ColumnMeta, RecordMetadata, StorageEngine, TableStructure};
    use crate::core::types::{ColumnType, PartitionBy};

    struct Structure(RecordMetadata, String);

    impl TableStructure for Structure {
        fn table_name(&self) -> &str {
            &self.1
        }
        fn column_count(&self) -> usize {
            self.0.column_count()
        }
        fn column_name(&self, index: usize) -> &str {
            self.0.column_name(index)
        }
        fn column_type(&self, index: usize) -> ColumnType {
            self.0.column(index).ty
        }
        fn symbol_capacity(&self, _index: usize) -> usize {
            128
        }
        fn symbol_cache_flag(&self, _index: usize) -> bool {
            false
        }
        fn indexed_flag(&self, _index: usize) -> bool {
            false
        }
        fn index_block_capacity(&self, _index: usize) -> usize {
            256
        }
        fn partition_by(&self) -> PartitionBy {
            PartitionBy::None
        }
        fn timestamp_index(&self) -> Option<usize> {
            None
        }
    }

    fn engine_with_tables(names: &[&str]) -> MemEngine {
        let engine = MemEngine::new();
        for name in names {
            let mut metadata = RecordMetadata::new();
            metadata.add(ColumnMeta::new("x", ColumnType::Int));
            metadata.add(ColumnMeta::new("price", ColumnType::Double));
            engine
                .create_table(&Structure(metadata, name.to_string()))
                .unwrap();
        }
        engine
    }

    fn optimise(sql: &str, engine: &MemEngine) -> Result<(QueryModel, ExprPool)> {
        let mut pool = ExprPool::with_capacity(64);
        let model = Parser::new(Lexer::new(sql), &mut pool).parse()?;
        let ExecutionModel::Query(mut model) = model else {
            panic!("expected query");
        };
        SqlOptimiser::new().optimise(&mut model, &mut pool, engine)?;
        Ok((model, pool))
    }

    #[test]
    fn test_trivial_subquery_inlined() {
        let engine = engine_with_tables(&["t"]);
        let (model, _) =
            optimise("SELECT x FROM (SELECT * FROM t WHERE x > 1) WHERE x < 10", &engine).unwrap();
        assert!(model.nested.is_none());
        assert_eq!(model.table.unwrap().name, "t");
        // both predicates survive, conjoined
        assert!(model.where_clause.is_some());
    }

    #[test]
    fn test_missing_table_resolved() {
        let engine = engine_with_tables(&["t"]);
        let err = optimise("SELECT * FROM ghost", &engine).unwrap_err();
        assert!(err.to_string().contains("table 'ghost' does not exist"));
    }

    #[test]
    fn test_alias_qualifier_stripped() {
        let engine = engine_with_tables(&["t"]);
        let (model, pool) = optimise("SELECT q.x FROM t q WHERE q.x > 1", &engine).unwrap();
        assert_eq!(pool.get(model.columns[0].ast).token, "x");
    }

    #[test]
    fn test_unknown_qualifier_rejected() {
        let engine = engine_with_tables(&["t"]);
        let err = optimise("SELECT z.x FROM t q", &engine).unwrap_err();
        assert!(err.to_string().contains("invalid column"));
    }

    #[test]
    fn test_predicate_pushed_into_projection() {
        let engine = engine_with_tables(&["t"]);
        let (model, _) = optimise(
            "SELECT p FROM (SELECT price p FROM t) WHERE p > 10",
            &engine,
        )
        .unwrap();
        let nested = model.nested.as_ref().unwrap();
        assert!(nested.where_clause.is_some(), "predicate should move inward");
        assert!(model.where_clause.is_none());
    }

    #[test]
    fn test_join_reordering() {
        let engine = engine_with_tables(&["a", "b", "c"]);
        let (model, _) = optimise(
            "SELECT * FROM a CROSS JOIN b JOIN c ON a.x = c.x",
            &engine,
        )
        .unwrap();
        assert_eq!(model.joins[0].kind, JoinKind::Inner);
        assert_eq!(model.joins[1].kind, JoinKind::Cross);
    }
}
