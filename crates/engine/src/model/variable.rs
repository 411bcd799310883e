use serde::{Deserialize, Serialize};

use super::detail::{Detail, Location};

/// The scope a variable was declared in: an AST node id, this variable's
/// child index within that node's declaration list, and the scope's
/// nesting depth (spec §3 "Variable" / §4.1 "Scope enumeration").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeRef {
    pub ast_id: usize,
    pub child_index: usize,
    pub depth: usize,
}

/// A single named, typed, placed variable (spec §3 "Variable").
///
/// `position` is `None` until the variable is first observed at its
/// `VariableDeclaration` step (spec §4.5 step 5); once set it is frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub type_string: String,
    pub scope: ScopeRef,
    pub location: Location,
    /// Stack slot for value types, base pointer index for memory, slot
    /// number for storage. `None` until first observed.
    pub position: Option<u64>,
    pub detail: Detail,
}

impl Variable {
    pub fn new(name: String, type_string: String, scope: ScopeRef, location: Location, detail: Detail) -> Self {
        Self { name, type_string, scope, location, position: None, detail }
    }

    /// Freezes `position` on first observation; subsequent calls are no-ops,
    /// matching the "frozen after first observation" invariant.
    pub fn observe_position(&mut self, position: u64) {
        if self.position.is_none() {
            self.position = Some(position);
        }
    }
}
