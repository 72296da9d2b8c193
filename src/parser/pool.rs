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

//! Per-compile expression node arena
//!
//! Expression nodes live in an arena owned by the compiler and cleared at
//! the start of every `compile()` call. Node identity is an index into
//! the arena, so a stale [`ExprId`] can never dangle: after a clear it
//! simply addresses a node of the next compilation, which is why callers
//! must not retain ids across compilations.

use super::ast::ExpressionNode;

/// Index-based handle to a node in the [`ExprPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

impl ExprId {
    /// Arena slot this id addresses
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Arena of expression nodes, reused across compilations
#[derive(Debug, Default)]
pub struct ExprPool {
    nodes: Vec<ExpressionNode>,
}

impl ExprPool {
    /// Create a pool with room for `capacity` nodes before reallocating
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Drop all nodes; allocation is retained for reuse
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Move a node into the arena, returning its id
    pub fn alloc(&mut self, node: ExpressionNode) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Borrow the node at `id`
    pub fn get(&self, id: ExprId) -> &ExpressionNode {
        &self.nodes[id.index()]
    }

    /// Mutably borrow the node at `id`
    pub fn get_mut(&mut self, id: ExprId) -> &mut ExpressionNode {
        &mut self.nodes[id.index()]
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the pool holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
