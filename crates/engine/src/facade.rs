//! The client-facing facade: the small set of operations a UI actually
//! calls, plus lazy variable expansion (spec §4.8 "Client facade", §6
//! "Engine -> UI client").

use std::path::Path;

use rustc_hash::FxHashMap;

use crate::decoder::{self, DecodedValue};
use crate::engine::Engine;
use crate::model::{Breakpoint, Detail, StackFrame};
use crate::step_engine::{StepMode, StopReason};

/// A decoded leaf or a composite placeholder, ready for the UI (spec §6
/// "variable" wire shape).
#[derive(Debug, Clone)]
pub struct VariableView {
    pub name: String,
    pub type_string: String,
    pub value: String,
    /// 0 for leaves; otherwise pass back to `variables()` to expand.
    pub variables_reference: u64,
}

/// One frame of navigation from a scope's variable list down into a
/// composite value, re-walked from `Contract::scope_variables` on demand
/// rather than cached as borrowed pointers, so expansion state never
/// outlives a single stop event.
#[derive(Debug, Clone)]
enum FieldKey {
    ArrayIndex(u64),
    StructField(String),
}

#[derive(Debug, Clone)]
enum ExpandEntry {
    Scope { ast_id: usize },
    Field { ast_id: usize, var_index: usize, path: Vec<FieldKey> },
}

/// Wraps an [`Engine`] with the UI-facing operations. Holds the
/// `variablesReference` table for the current stop; it's invalidated
/// (cleared) every time execution moves.
pub struct Facade<'e> {
    engine: &'e mut Engine,
    expand_table: FxHashMap<u64, ExpandEntry>,
    next_ref: u64,
}

impl<'e> Facade<'e> {
    pub fn new(engine: &'e mut Engine) -> Self {
        Self { engine, expand_table: FxHashMap::default(), next_ref: 1 }
    }

    fn alloc_ref(&mut self, entry: ExpandEntry) -> u64 {
        let id = self.next_ref;
        self.next_ref += 1;
        self.expand_table.insert(id, entry);
        id
    }

    pub fn set_breakpoint(&mut self, path: &Path, line: usize, original_source: bool) -> eyre::Result<Breakpoint> {
        self.engine.set_breakpoint(path, line, true, original_source)
    }

    pub fn clear_breakpoints(&mut self, path: &Path) {
        self.engine.clear_breakpoints(path)
    }

    /// Evaluates `expression` at the current stop point (spec §4.6
    /// "evaluate", §4.8 "watch/hover").
    pub async fn evaluate(&mut self, expression: &str) -> eyre::Result<String> {
        self.expand_table.clear();
        self.engine.evaluate(expression).await
    }

    pub async fn continue_(&mut self) -> eyre::Result<Option<StopReason>> {
        self.expand_table.clear();
        self.engine.step(StepMode::Continue).await
    }

    pub async fn step_over(&mut self) -> eyre::Result<Option<StopReason>> {
        self.expand_table.clear();
        self.engine.step(StepMode::StepOver).await
    }

    pub async fn step_in(&mut self) -> eyre::Result<Option<StopReason>> {
        self.expand_table.clear();
        self.engine.step(StepMode::StepIn).await
    }

    pub async fn step_out(&mut self) -> eyre::Result<Option<StopReason>> {
        self.expand_table.clear();
        self.engine.step(StepMode::StepOut).await
    }

    pub fn stack_trace(&self) -> &[StackFrame] {
        &self.engine.step_engine.call_stack
    }

    /// One `variablesReference` per scope frame currently in the chain
    /// (spec §4.8 "scopes").
    pub fn scopes(&mut self) -> Vec<(String, u64)> {
        let Some(data) = self.engine.step_engine.current.clone() else { return Vec::new() };
        data.scope_chain
            .iter()
            .map(|frame| {
                let reference = self.alloc_ref(ExpandEntry::Scope { ast_id: frame.ast_id });
                (format!("scope@{}", frame.ast_id), reference)
            })
            .collect()
    }

    /// Expands a `variablesReference` into its immediate children, decoding
    /// leaves on demand (spec §4.8 "variables", "lazy variable expansion").
    pub fn variables(&mut self, reference: u64) -> eyre::Result<Vec<VariableView>> {
        let Some(entry) = self.expand_table.get(&reference).cloned() else { return Ok(Vec::new()) };
        let Some(data) = self.engine.step_engine.current.clone() else { return Ok(Vec::new()) };
        let contract_name = self
            .engine
            .contracts
            .iter()
            .find(|(_, c)| c.address == Some(data.contract_address))
            .map(|(n, _)| n.clone())
            .ok_or_else(|| crate::error::EngineError::ModelGap("no contract at current address".into()))?;
        let contract = &self.engine.contracts[&contract_name];

        match entry {
            ExpandEntry::Scope { ast_id } => {
                let Some(vars) = contract.scope_variables.get(&ast_id) else { return Ok(Vec::new()) };
                let mut out = Vec::with_capacity(vars.len());
                for (index, variable) in vars.iter().enumerate() {
                    out.push(self.render(&variable.detail, &variable.name, &variable.type_string, &data.raw, ast_id, index, Vec::new()));
                }
                Ok(out)
            }
            ExpandEntry::Field { ast_id, var_index, path } => {
                let Some(variable) = contract.scope_variables.get(&ast_id).and_then(|v| v.get(var_index)) else {
                    return Ok(Vec::new());
                };
                let Some(detail) = navigate(&variable.detail, &path) else { return Ok(Vec::new()) };
                match detail {
                    Detail::Struct(s) => Ok(s
                        .members
                        .iter()
                        .map(|(name, member)| {
                            let mut child_path = path.clone();
                            child_path.push(FieldKey::StructField(name.clone()));
                            self.render(member, name, "", &data.raw, ast_id, var_index, child_path)
                        })
                        .collect()),
                    Detail::Array(a) => {
                        let members = a.members.clone().unwrap_or_default();
                        Ok(members
                            .iter()
                            .enumerate()
                            .map(|(i, member)| {
                                let mut child_path = path.clone();
                                child_path.push(FieldKey::ArrayIndex(i as u64));
                                self.render(member, &i.to_string(), "", &data.raw, ast_id, var_index, child_path)
                            })
                            .collect())
                    }
                    _ => Ok(Vec::new()),
                }
            }
        }
    }

    fn render(
        &mut self,
        detail: &Detail,
        name: &str,
        type_string: &str,
        raw: &crate::model::step_data::RawVmState,
        ast_id: usize,
        var_index: usize,
        path: Vec<FieldKey>,
    ) -> VariableView {
        match detail {
            Detail::Value(v) => {
                // A decode failure never throws (spec §4.8 "render"); the UI
                // client gets the fixed sentinel, not the internal error text.
                let value = decoder::decode_value(v, raw).map(describe).unwrap_or_else(|_| "(invalid value)".to_string());
                VariableView { name: name.to_string(), type_string: type_string.to_string(), value, variables_reference: 0 }
            }
            _ => {
                let reference = self.alloc_ref(ExpandEntry::Field { ast_id, var_index, path });
                VariableView { name: name.to_string(), type_string: type_string.to_string(), value: String::new(), variables_reference: reference }
            }
        }
    }
}

fn navigate<'d>(root: &'d Detail, path: &[FieldKey]) -> Option<&'d Detail> {
    let mut current = root;
    for key in path {
        current = match (current, key) {
            (Detail::Struct(s), FieldKey::StructField(name)) => &s.members.iter().find(|(n, _)| n == name)?.1,
            (Detail::Array(a), FieldKey::ArrayIndex(i)) => a.members.as_ref()?.get(*i as usize)?,
            _ => return None,
        };
    }
    Some(current)
}

fn describe(value: DecodedValue) -> String {
    match value {
        DecodedValue::Bool(b) => b.to_string(),
        DecodedValue::Unsigned(u) => u.to_string(),
        DecodedValue::Signed(i) => i.to_string(),
        DecodedValue::Address(a) => a.to_string(),
        DecodedValue::Bytes(b) => format!("0x{}", hex::encode(b)),
    }
}
