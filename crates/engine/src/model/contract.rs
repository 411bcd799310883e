use std::path::PathBuf;

use alloy_primitives::{Address, Bytes};
use revm::interpreter::opcode;
use rustc_hash::FxHashMap;

use super::variable::Variable;
use crate::sourcemap::SrcLoc;

/// Program counter -> instruction index, built by walking the bytecode once
/// and skipping `PUSHn` payload bytes (spec §4.1 "Build the pc/instruction
/// index map"). Grounded on the teacher's `PcIcMap`/`IcPcMap` pair.
#[derive(Debug, Clone, Default)]
pub struct PcIcMap {
    map: FxHashMap<usize, usize>,
}

impl PcIcMap {
    pub fn new(code: &[u8]) -> Self {
        Self { map: make_map(code, true) }
    }

    pub fn get(&self, pc: usize) -> Option<usize> {
        self.map.get(&pc).copied()
    }
}

/// The inverse of [`PcIcMap`]: instruction index -> program counter.
#[derive(Debug, Clone, Default)]
pub struct IcPcMap {
    map: FxHashMap<usize, usize>,
}

impl IcPcMap {
    pub fn new(code: &[u8]) -> Self {
        Self { map: make_map(code, false) }
    }

    pub fn get(&self, ic: usize) -> Option<usize> {
        self.map.get(&ic).copied()
    }
}

fn make_map(code: &[u8], pc_first: bool) -> FxHashMap<usize, usize> {
    let mut map = FxHashMap::default();
    let mut pc = 0usize;
    let mut ic = 0usize;
    while pc < code.len() {
        let op = code[pc];
        if pc_first {
            map.insert(pc, ic);
        } else {
            map.insert(ic, pc);
        }
        if (opcode::PUSH1..=opcode::PUSH32).contains(&op) {
            pc += (op - opcode::PUSH1 + 1) as usize;
        }
        pc += 1;
        ic += 1;
    }
    map
}

/// A deployed (or not-yet-linked) contract and everything derived from its
/// bytecode and AST (spec §3 "Contract").
#[derive(Debug, Clone)]
pub struct Contract {
    pub name: String,
    pub source_path: PathBuf,
    /// Empty until the contract is linked to a deployment address.
    pub address: Option<Address>,
    pub creation_code: Bytes,
    pub runtime_code: Bytes,
    pub runtime_source_map: String,
    /// Decoded once at link time from `runtime_source_map`.
    pub source_locations: Vec<SrcLoc>,
    pub pc_to_ic: PcIcMap,
    pub ic_to_pc: IcPcMap,
    /// pc -> `functionName(types)` signature, found by scanning the runtime
    /// code for the dispatcher pattern `PUSH4 <selector> EQ PUSH2 <pc> JUMPI`
    /// (spec §4.3 "Build functionEntryMap").
    pub function_entry_map: FxHashMap<usize, String>,
    pub ast_root_id: Option<usize>,
    /// Scope AST id -> variables declared directly in that scope.
    pub scope_variables: FxHashMap<usize, Vec<Variable>>,
}

impl Contract {
    pub fn new(
        name: String,
        source_path: PathBuf,
        creation_code: Bytes,
        runtime_code: Bytes,
        runtime_source_map: String,
    ) -> eyre::Result<Self> {
        let source_locations = crate::sourcemap::decode_source_map(&runtime_source_map)?;
        let pc_to_ic = PcIcMap::new(&runtime_code);
        let ic_to_pc = IcPcMap::new(&runtime_code);
        Ok(Self {
            name,
            source_path,
            address: None,
            creation_code,
            runtime_code,
            runtime_source_map,
            source_locations,
            pc_to_ic,
            ic_to_pc,
            function_entry_map: FxHashMap::default(),
            ast_root_id: None,
            scope_variables: FxHashMap::default(),
        })
    }

    /// The source location for the instruction at `pc`, if the bytecode's
    /// source map covers it.
    pub fn src_loc_at_pc(&self, pc: usize) -> Option<&SrcLoc> {
        let ic = self.pc_to_ic.get(pc)?;
        self.source_locations.get(ic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pc_ic_map_skips_push_payload() {
        // PUSH1 0x01 ; PUSH2 0x00 0x02 ; STOP
        let code = [opcode::PUSH1, 0x01, opcode::PUSH2, 0x00, 0x02, opcode::STOP];
        let pc_to_ic = PcIcMap::new(&code);
        assert_eq!(pc_to_ic.get(0), Some(0));
        assert_eq!(pc_to_ic.get(2), Some(1));
        assert_eq!(pc_to_ic.get(5), Some(2));
        assert_eq!(pc_to_ic.get(1), None);

        let ic_to_pc = IcPcMap::new(&code);
        assert_eq!(ic_to_pc.get(0), Some(0));
        assert_eq!(ic_to_pc.get(1), Some(2));
        assert_eq!(ic_to_pc.get(2), Some(5));
    }
}
