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

//! Per-statement execution context

/// Who is running the statement and what they may do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityContext {
    /// Reads and writes
    #[default]
    AllowAll,
    /// Reads only; every mutation is rejected
    ReadOnly,
}

/// Context a statement compiles and executes under
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionContext {
    security: SecurityContext,
}

impl ExecutionContext {
    /// A context permitting reads and writes
    pub fn new() -> Self {
        Self::default()
    }

    /// A context rejecting all mutations
    pub fn read_only() -> Self {
        Self {
            security: SecurityContext::ReadOnly,
        }
    }

    /// The security context in force
    pub fn security(&self) -> SecurityContext {
        self.security
    }

    /// True when mutations are permitted
    pub fn allows_writes(&self) -> bool {
        self.security == SecurityContext::AllowAll
    }
}
