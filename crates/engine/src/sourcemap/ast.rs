//! AST search helpers built on top of [`super::visitor`] (spec §4.1
//! "Locate AST node containing a source range" and "Scope enumeration at
//! byte offset").

use foundry_compilers::artifacts::{
    Block, ContractDefinition, FunctionCall, FunctionDefinition, SourceUnit, VariableDeclaration,
};

use super::visitor::{Visitor, Walk};

fn range_contains(node_start: usize, node_len: usize, start: usize, len: usize) -> bool {
    node_start <= start && start + len <= node_start + node_len
}

/// True when `node_start` itself falls inside `[target_start, target_start +
/// target_length)` — breakpoint resolution's rule (spec §4.4 "resolve"): the
/// node whose range *starts* on the target line, not one that encloses the
/// whole line the way `range_contains` requires.
fn starts_within(node_start: usize, target_start: usize, target_length: usize) -> bool {
    node_start >= target_start && node_start < target_start + target_length
}

/// A located node: its id and byte range.
#[derive(Debug, Clone, Copy)]
pub struct NodeMatch {
    pub id: usize,
    pub start: usize,
    pub length: usize,
}

/// Which syntactic kind [`locate`] should look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    FunctionDefinition,
    VariableDeclaration,
    FunctionCall,
    /// Any node: used by breakpoint resolution, which only cares about the
    /// first node (of any kind) starting inside the target line.
    Any,
}

/// Depth-first walk that records the *last* (innermost, since descent
/// continues past a match) node of `kind` matching `(start, length)`: a
/// specific `kind` looks for a node whose range *contains* it, `Any` looks
/// for a node whose range *starts inside* it (breakpoint resolution).
struct KindLocator {
    kind: NodeKind,
    start: usize,
    length: usize,
    found: Option<NodeMatch>,
}

impl Visitor for KindLocator {
    fn visit_function_definition(&mut self, node: &FunctionDefinition) -> eyre::Result<()> {
        let (start, length) = (node.src.start.unwrap_or_default(), node.src.length.unwrap_or_default());
        let matched = match self.kind {
            NodeKind::FunctionDefinition => range_contains(start, length, self.start, self.length),
            NodeKind::Any => starts_within(start, self.start, self.length),
            _ => false,
        };
        if matched {
            self.found = Some(NodeMatch { id: node.id, start, length });
        }
        Ok(())
    }

    fn visit_variable_declaration(&mut self, node: &VariableDeclaration) -> eyre::Result<()> {
        let (start, length) = (node.src.start.unwrap_or_default(), node.src.length.unwrap_or_default());
        let matched = match self.kind {
            NodeKind::VariableDeclaration => range_contains(start, length, self.start, self.length),
            NodeKind::Any => starts_within(start, self.start, self.length),
            _ => false,
        };
        if matched {
            self.found = Some(NodeMatch { id: node.id, start, length });
        }
        Ok(())
    }

    fn visit_function_call(&mut self, node: &FunctionCall) -> eyre::Result<()> {
        let (start, length) = (node.src.start.unwrap_or_default(), node.src.length.unwrap_or_default());
        let matched = match self.kind {
            NodeKind::FunctionCall => range_contains(start, length, self.start, self.length),
            NodeKind::Any => starts_within(start, self.start, self.length),
            _ => false,
        };
        if matched {
            self.found = Some(NodeMatch { id: node.id, start, length });
        }
        Ok(())
    }

    fn visit_statement(&mut self, statement: &foundry_compilers::artifacts::Statement) -> eyre::Result<()> {
        if self.kind == NodeKind::Any {
            if let Some((id, src)) = statement_id_and_src(statement) {
                let start = src.start.unwrap_or_default();
                let length = src.length.unwrap_or_default();
                if starts_within(start, self.start, self.length) {
                    self.found = Some(NodeMatch { id, start, length });
                }
            }
        }
        Ok(())
    }
}

fn statement_id_and_src(
    statement: &foundry_compilers::artifacts::Statement,
) -> Option<(usize, foundry_compilers::artifacts::ast::SourceLocation)> {
    use foundry_compilers::artifacts::Statement::*;
    match statement {
        Block(b) => Some((b.id, b.src.clone())),
        IfStatement(s) => Some((s.id, s.src.clone())),
        ForStatement(s) => Some((s.id, s.src.clone())),
        WhileStatement(s) => Some((s.id, s.src.clone())),
        DoWhileStatement(s) => Some((s.id, s.src.clone())),
        ExpressionStatement(s) => Some((s.id, s.src.clone())),
        VariableDeclarationStatement(s) => Some((s.id, s.src.clone())),
        Return(s) => Some((s.id, s.src.clone())),
        EmitStatement(s) => Some((s.id, s.src.clone())),
        RevertStatement(s) => Some((s.id, s.src.clone())),
        UncheckedBlock(s) => Some((s.id, s.src.clone())),
        TryStatement(s) => Some((s.id, s.src.clone())),
        InlineAssembly(s) => Some((s.id, s.src.clone())),
        Break(_) | Continue(_) | PlaceholderStatement(_) => None,
    }
}

/// Locate the innermost node of `kind` matching `[start, start + length)`,
/// walking every contract in `unit` — containment for a specific `kind`,
/// "starts inside" for `NodeKind::Any`.
pub fn locate(unit: &SourceUnit, kind: NodeKind, start: usize, length: usize) -> eyre::Result<Option<NodeMatch>> {
    let mut locator = KindLocator { kind, start, length, found: None };
    unit.walk(&mut locator)?;
    Ok(locator.found)
}

/// One frame of the lexical scope chain at a byte offset (spec §4.1 "Scope
/// enumeration at byte offset").
#[derive(Debug, Clone, Copy)]
pub struct ScopeFrame {
    pub ast_id: usize,
    pub child_index: usize,
    pub depth: usize,
}

struct ScopeEnumerator {
    target: usize,
    stack: Vec<ScopeFrame>,
    /// Number of nested scopes opened so far under the current top frame;
    /// used as the next frame's `child_index`.
    child_counters: Vec<usize>,
}

impl ScopeEnumerator {
    fn push_if_contains(&mut self, id: usize, start: usize, length: usize) -> bool {
        if start <= self.target && self.target < start + length {
            let depth = self.stack.len();
            let child_index = *self.child_counters.last().unwrap_or(&0);
            self.stack.push(ScopeFrame { ast_id: id, child_index, depth });
            self.child_counters.push(0);
            true
        } else {
            false
        }
    }

    fn pop_if(&mut self, pushed: bool) {
        if pushed {
            self.child_counters.pop();
            if let Some(c) = self.child_counters.last_mut() {
                *c += 1;
            }
        }
    }
}

impl Visitor for ScopeEnumerator {
    fn visit_contract_definition(&mut self, node: &ContractDefinition) -> eyre::Result<()> {
        self.push_if_contains(
            node.id,
            node.src.start.unwrap_or_default(),
            node.src.length.unwrap_or_default(),
        );
        Ok(())
    }

    fn post_visit_contract_definition(&mut self, node: &ContractDefinition) -> eyre::Result<()> {
        let pushed = self.stack.last().map(|f| f.ast_id) == Some(node.id);
        self.pop_if(pushed);
        Ok(())
    }

    fn visit_function_definition(&mut self, node: &FunctionDefinition) -> eyre::Result<()> {
        self.push_if_contains(
            node.id,
            node.src.start.unwrap_or_default(),
            node.src.length.unwrap_or_default(),
        );
        Ok(())
    }

    fn post_visit_function_definition(&mut self, node: &FunctionDefinition) -> eyre::Result<()> {
        let pushed = self.stack.last().map(|f| f.ast_id) == Some(node.id);
        self.pop_if(pushed);
        Ok(())
    }

    fn visit_block(&mut self, node: &Block) -> eyre::Result<()> {
        self.push_if_contains(
            node.id,
            node.src.start.unwrap_or_default(),
            node.src.length.unwrap_or_default(),
        );
        Ok(())
    }

    fn post_visit_block(&mut self, node: &Block) -> eyre::Result<()> {
        let pushed = self.stack.last().map(|f| f.ast_id) == Some(node.id);
        self.pop_if(pushed);
        Ok(())
    }
}

/// The plain name (no parameter types) of the `FunctionDefinition` whose
/// range contains `[start, start + length)`, used to label call-stack
/// frames pushed via an internal jump (spec §3 "Stack frame": "resolve
/// `FunctionDefinition` containing previous location").
///
/// Unlike [`locate`]'s general-purpose search this only ever needs the
/// innermost enclosing function (Solidity functions don't nest), so it
/// reuses the same visitor machinery through [`locate`] rather than adding
/// a second one.
pub fn function_name_at(unit: &SourceUnit, start: usize, length: usize) -> eyre::Result<Option<String>> {
    let Some(m) = locate(unit, NodeKind::FunctionDefinition, start, length)? else { return Ok(None) };

    struct NameLookup {
        id: usize,
        found: Option<String>,
    }
    impl Visitor for NameLookup {
        fn visit_function_definition(&mut self, node: &FunctionDefinition) -> eyre::Result<()> {
            if node.id == self.id {
                self.found = Some(if node.name.is_empty() { format!("<fallback@{}>", node.id) } else { node.name.clone() });
            }
            Ok(())
        }
    }
    let mut lookup = NameLookup { id: m.id, found: None };
    unit.walk(&mut lookup)?;
    Ok(lookup.found)
}

/// Returns the lexical scope chain at `offset`, innermost first.
///
/// `child_index` counts nested scopes opened directly under a frame, not a
/// node's literal position among all its AST siblings — good enough to
/// distinguish "second inner block of this function" from the first
/// without re-deriving the parent's full child list.
pub fn scope_chain(unit: &SourceUnit, offset: usize) -> eyre::Result<Vec<ScopeFrame>> {
    let mut enumerator =
        ScopeEnumerator { target: offset, stack: Vec::new(), child_counters: vec![0] };
    unit.walk(&mut enumerator)?;
    let mut stack = enumerator.stack;
    stack.reverse();
    Ok(stack)
}
