use alloy_primitives::{Address, Bytes, U256};

use super::frame::StackFrame;
use crate::sourcemap::ast::ScopeFrame;
use crate::sourcemap::SrcLoc;

/// A snapshot of the raw VM state reported with a single step event (spec
/// §4.5, §6 "VM adapter -> engine: step event"). Deliberately thin: only
/// what the decoder and evaluator actually read.
#[derive(Debug, Clone, Default)]
pub struct RawVmState {
    pub stack: Vec<U256>,
    pub memory: Bytes,
    /// Storage reads the adapter already performed this step, keyed by
    /// slot; the decoder falls back to requesting any slot missing here.
    pub storage: rustc_hash::FxHashMap<U256, U256>,
}

/// Everything the engine derives about the *current* step (spec §3 "Step
/// data"). Replaced wholesale on every step event; nothing here survives
/// across steps except via [`super::frame::StackFrame`]s pushed onto the
/// call stack.
#[derive(Debug, Clone)]
pub struct StepData {
    pub request_id: uuid::Uuid,
    pub contract_address: Address,
    pub pc: usize,
    pub instruction_index: usize,
    pub src_loc: Option<SrcLoc>,
    pub line: usize,
    pub column: usize,
    pub scope_chain: Vec<ScopeFrame>,
    pub raw: RawVmState,
    pub call_stack: Vec<StackFrame>,
    /// Set when this step landed on a function's dispatcher entry pc (spec
    /// §4.5 "stopOnStepIn": "we are not standing on a `FunctionDefinition`
    /// header pc") — the selector-dispatch shim's target, not a real
    /// statement a user stepped "into".
    pub entered_function_header: bool,
}

impl StepData {
    pub fn new(request_id: uuid::Uuid, contract_address: Address, pc: usize, instruction_index: usize) -> Self {
        Self {
            request_id,
            contract_address,
            pc,
            instruction_index,
            src_loc: None,
            line: 0,
            column: 0,
            scope_chain: Vec::new(),
            raw: RawVmState::default(),
            call_stack: Vec::new(),
            entered_function_header: false,
        }
    }
}
