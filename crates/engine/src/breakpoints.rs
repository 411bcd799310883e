//! Breakpoint registry and resolution (spec §4.4 "Breakpoints").

use foundry_compilers::artifacts::SourceUnit;
use rustc_hash::FxHashMap;

use crate::model::{Breakpoint, Contract, File};
use crate::sourcemap::ast::{locate, NodeKind};

/// Owns every breakpoint and hands out ids. One per engine instance.
#[derive(Debug, Default)]
pub struct BreakpointRegistry {
    next_id: u32,
}

impl BreakpointRegistry {
    /// Registers a new breakpoint on `line` of `file` and attempts to bind
    /// it immediately if `file`'s contracts are already linked (spec §4.4
    /// "setBreakpoint").
    pub fn set_breakpoint(
        &mut self,
        file: &mut File,
        unit: Option<&SourceUnit>,
        contracts: &FxHashMap<String, Contract>,
        line: usize,
        visible: bool,
        original_source: bool,
    ) -> Breakpoint {
        let id = self.next_id;
        self.next_id += 1;
        let resolved_line = if original_source { file.translate_original_to_current(line) } else { line };
        let mut bp = Breakpoint::new(id, resolved_line, visible, original_source);
        resolve(&mut bp, file, unit, contracts);
        file.breakpoints.push(bp.clone());
        bp
    }

    /// Re-attempts resolution for every unverified breakpoint in `file`,
    /// called after a new contract sharing `file`'s path is linked.
    pub fn resolve_all(&self, file: &mut File, unit: Option<&SourceUnit>, contracts: &FxHashMap<String, Contract>) {
        for bp in file.breakpoints.iter_mut().filter(|b| !b.verified) {
            resolve(bp, file, unit, contracts);
        }
    }

    pub fn clear_breakpoint(&self, file: &mut File, id: u32) {
        file.breakpoints.retain(|bp| bp.id != id);
    }

    /// Clears breakpoints. `visible_only` keeps the internal breakpoints
    /// the evaluator places for its own use.
    pub fn clear_breakpoints(&self, file: &mut File, visible_only: bool) {
        if visible_only {
            file.breakpoints.retain(|bp| !bp.visible);
        } else {
            file.breakpoints.clear();
        }
    }
}

/// Attempts to bind `bp` to a `(address, pc)` pair: locate the AST node
/// starting within `bp.line`'s byte range, then find the first instruction
/// in each linked contract sharing this file whose source map entry starts
/// inside that node's range (spec §4.4 "resolve").
fn resolve(bp: &mut Breakpoint, file: &File, unit: Option<&SourceUnit>, contracts: &FxHashMap<String, Contract>) {
    let Some((line_start, line_end)) = file.byte_range_of_line(bp.line) else { return };
    let Some(unit) = unit else { return };
    let Ok(Some(node)) = locate(unit, NodeKind::Any, line_start, line_end - line_start) else { return };

    for contract in contracts.values() {
        let Some(address) = contract.address else { continue };
        if contract.source_path != file.path {
            continue;
        }

        if let Some(ic) = contract
            .source_locations
            .iter()
            .position(|loc| loc.start >= node.start && loc.start < node.start + node.length.max(1))
        {
            if let Some(pc) = contract.ic_to_pc.get(ic) {
                bp.binding = Some((address, pc));
                bp.verified = true;
                return;
            }
        }
    }
}
