//! The top-level `Engine`: owns every piece of state and wires the VM
//! adapter connection to the step engine (spec §3 "Engine", §5
//! "Concurrency model").

use std::path::PathBuf;
use std::sync::Arc;

use foundry_compilers::artifacts::SourceUnit;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::adapter::{AdapterRequest, AdapterResponse, CorrelationMap};
use crate::breakpoints::BreakpointRegistry;
use crate::decoder::DecodedValue;
use crate::evaluator::{Compiler, EvaluationRequest, Evaluator};
use crate::model::{Breakpoint, Contract, File};
use crate::program_model::{self, CompilationResult};
use crate::step_engine::{StepEngine, StepEvent, StepMode, StopReason};

/// Everything the engine knows, in one place. Constructed once per
/// debugging session; there is no multi-session sharing.
pub struct Engine {
    pub files: FxHashMap<PathBuf, File>,
    pub units: FxHashMap<PathBuf, SourceUnit>,
    pub contracts: FxHashMap<String, Contract>,
    pub breakpoint_registry: BreakpointRegistry,
    pub step_engine: StepEngine,
    pub correlation: Arc<CorrelationMap>,
    outbound: mpsc::UnboundedSender<AdapterRequest>,
    compiler: Option<Box<dyn Compiler + Send + Sync>>,
    eval_nonce: u32,
    /// Set for the duration of one `evaluate()` call; a second concurrent
    /// request is rejected rather than queued (spec §4.6 step 1).
    evaluating: bool,
}

impl Engine {
    /// `outbound` is the channel the CLI's adapter-socket writer task
    /// drains; `correlation` is shared with whatever task reads the
    /// adapter's incoming responses and calls [`Engine::deliver_response`].
    pub fn new(outbound: mpsc::UnboundedSender<AdapterRequest>, correlation: Arc<CorrelationMap>) -> Self {
        Self {
            files: FxHashMap::default(),
            units: FxHashMap::default(),
            contracts: FxHashMap::default(),
            breakpoint_registry: BreakpointRegistry::default(),
            step_engine: StepEngine::default(),
            correlation,
            outbound,
            compiler: None,
            eval_nonce: 0,
            evaluating: false,
        }
    }

    /// Installs the recompiler the evaluator drives (spec §4.4 "Compiler
    /// trait"). A session with no compiler installed rejects `evaluate`
    /// requests with an `Evaluator` error rather than panicking.
    pub fn with_compiler(mut self, compiler: Box<dyn Compiler + Send + Sync>) -> Self {
        self.compiler = Some(compiler);
        self
    }

    /// Links a fresh compilation result into the engine's file/contract
    /// maps (spec §4.3 "linkCompilerOutput").
    pub fn link_compilation(&mut self, result: CompilationResult) -> eyre::Result<()> {
        for source in &result.sources {
            self.units.insert(source.path.clone(), source.ast.clone());
        }
        let (files, contracts) = program_model::link_compiler_output(result)?;
        self.files.extend(files);
        self.contracts.extend(contracts);
        Ok(())
    }

    /// Binds a contract to its deployed address once the VM adapter reports
    /// a `newContract` trigger, deducing the contract from its runtime
    /// bytecode (spec §4.3 "linkContractAddress" / "newContract").
    pub fn link_contract_address(&mut self, runtime_code: &[u8], address: alloy_primitives::Address) {
        if let Some(contract) = program_model::link_contract_address(&mut self.contracts, runtime_code, address) {
            let path = contract.source_path.clone();
            if let Some(file) = self.files.get_mut(&path) {
                self.breakpoint_registry.resolve_all(file, self.units.get(&path), &self.contracts);
            }
        }
    }

    /// Binds a contract to its deployed address by name, for a
    /// `linkContractAddress` trigger that already names the contract (spec
    /// §4.3).
    pub fn link_contract_address_by_name(&mut self, contract_name: &str, address: alloy_primitives::Address) {
        if let Some(contract) = program_model::link_contract_address_by_name(&mut self.contracts, contract_name, address) {
            let path = contract.source_path.clone();
            if let Some(file) = self.files.get_mut(&path) {
                self.breakpoint_registry.resolve_all(file, self.units.get(&path), &self.contracts);
            }
        }
    }

    fn all_breakpoints(&self) -> Vec<Breakpoint> {
        self.files.values().flat_map(|f| f.breakpoints.iter().cloned()).collect()
    }

    /// Sends `request` to the adapter and awaits its matching response,
    /// registering the correlation *before* the send to avoid a race with
    /// an unrealistically fast reply (spec §5 "Request/response
    /// correlation").
    async fn round_trip(&self, request: AdapterRequest) -> eyre::Result<AdapterResponse> {
        let id = request.id();
        let rx = self.correlation.register(id).await;
        self.outbound
            .send(request)
            .map_err(|_| crate::error::EngineError::Fatal("VM adapter channel closed".into()))?;
        rx.await.map_err(|_| crate::error::EngineError::Fatal("VM adapter disconnected mid-request".into()).into())
    }

    /// Delivers a response read off the adapter socket to whichever
    /// request is awaiting it. Called by the CLI's read loop.
    pub async fn deliver_response(&self, response: AdapterResponse) {
        self.correlation.resolve(response).await;
    }

    /// Issues step requests of `mode`, one VM instruction at a time, until
    /// the step engine reports an actual stop or the adapter signals the
    /// run ended (spec §4.5 "Step semantics"). A single instruction rarely
    /// satisfies a `StepOver`/`StepOut`/`Continue` condition on its own —
    /// e.g. `Continue`'s own stop rule is "only a breakpoint" — so looping
    /// here is what makes those modes actually run instead of advancing one
    /// opcode and reporting nothing.
    pub async fn step(&mut self, mode: StepMode) -> eyre::Result<Option<StopReason>> {
        self.step_engine.request(mode);
        loop {
            let request = match mode {
                StepMode::StepIn => AdapterRequest::StepInto { id: Uuid::new_v4() },
                StepMode::StepOver => AdapterRequest::StepOver { id: Uuid::new_v4() },
                StepMode::StepOut => AdapterRequest::StepOut { id: Uuid::new_v4() },
                StepMode::Continue => AdapterRequest::Continue { id: Uuid::new_v4() },
            };
            let response = self.round_trip(request).await?;
            match self.process_step_response(response)? {
                StepOutcome::Ended => return Ok(None),
                StepOutcome::Stopped(reason) => return Ok(Some(reason)),
                StepOutcome::Running => continue,
            }
        }
    }

    fn process_step_response(&mut self, response: AdapterResponse) -> eyre::Result<StepOutcome> {
        let AdapterResponse::Step { id: _, address, pc, stack, memory, ended } = response else {
            return Err(crate::error::EngineError::Protocol("expected a step response".into()).into());
        };
        if ended {
            return Ok(StepOutcome::Ended);
        }
        Ok(match self.ingest_step(address, pc, stack, memory)? {
            Some(reason) => StepOutcome::Stopped(reason),
            None => StepOutcome::Running,
        })
    }

    /// Feeds one raw VM step through the step engine, whether it arrived as
    /// the response to a step request or as an unsolicited `step` trigger
    /// (spec §6 "Adapter → engine triggers": the adapter reports the first
    /// step after a deploy this way, since nothing in the engine asked for
    /// it by id).
    pub fn ingest_step(
        &mut self,
        address: alloy_primitives::Address,
        pc: usize,
        stack: Vec<alloy_primitives::U256>,
        memory: alloy_primitives::Bytes,
    ) -> eyre::Result<Option<StopReason>> {
        let event = StepEvent {
            request_id: Uuid::new_v4(),
            address,
            pc,
            raw: crate::model::step_data::RawVmState { stack, memory, storage: FxHashMap::default() },
        };
        let breakpoints = self.all_breakpoints();
        self.step_engine.on_step(event, &mut self.contracts, &self.files, &self.units, &breakpoints)
    }

    /// Pushes a `sendBreakpoint` notification to the VM adapter (spec §4.4
    /// "resolve"/"clearBreakpoint"). Fire-and-forget: the adapter's ack, if
    /// any, doesn't gate anything the engine does next.
    fn notify_breakpoint(&self, id: u32, address: alloy_primitives::Address, pc: usize, enabled: bool) {
        let _ = self.outbound.send(AdapterRequest::SendBreakpoint { id: Uuid::new_v4(), address, pc, enabled, runtime: true });
        let _ = id; // id is carried on the breakpoint itself, not the wire message; see DESIGN.md.
    }

    /// Sets a breakpoint and, if it resolves immediately, notifies the
    /// adapter (spec §4.4 "setBreakpoint").
    pub fn set_breakpoint(&mut self, path: &std::path::Path, line: usize, visible: bool, original_source: bool) -> eyre::Result<Breakpoint> {
        let file = self
            .files
            .get_mut(path)
            .ok_or_else(|| crate::error::EngineError::Protocol(format!("unknown file: {}", path.display())))?;
        let unit = self.units.get(path);
        let bp = self.breakpoint_registry.set_breakpoint(file, unit, &self.contracts, line, visible, original_source);
        if let Some((address, pc)) = bp.binding {
            self.notify_breakpoint(bp.id, address, pc, true);
        }
        Ok(bp)
    }

    /// Clears every breakpoint in `path` (spec §4.4 "clearBreakpoints"),
    /// always notifying the adapter for ones that had resolved to a
    /// binding — unresolved breakpoints never reached the adapter in the
    /// first place, so there's nothing to disable there.
    pub fn clear_breakpoints(&mut self, path: &std::path::Path) {
        let Some(file) = self.files.get_mut(path) else { return };
        let cleared: Vec<_> = file.breakpoints.iter().filter(|b| b.visible).filter_map(|b| b.binding.map(|(a, pc)| (b.id, a, pc))).collect();
        self.breakpoint_registry.clear_breakpoints(file, true);
        for (id, address, pc) in cleared {
            self.notify_breakpoint(id, address, pc, false);
        }
    }

    /// Runs one synthesize-recompile-inject-resume cycle for `expression`
    /// evaluated at the current stop point (spec §4.6 "evaluate").
    /// Returns the decoded result as a display string, matching what the
    /// facade hands back to the UI client's `evaluate` response.
    pub async fn evaluate(&mut self, expression: &str) -> eyre::Result<String> {
        if self.evaluating {
            return Err(crate::error::EngineError::Evaluator("another evaluation is already in progress".into()).into());
        }
        let Some(compiler) = self.compiler.as_deref() else {
            return Err(crate::error::EngineError::Evaluator("no compiler installed; evaluate is unavailable".into()).into());
        };
        let Some(data) = self.step_engine.current.clone() else {
            return Err(crate::error::EngineError::Evaluator("not stopped; cannot evaluate".into()).into());
        };
        let Some(src_loc) = data.src_loc else {
            return Err(crate::error::EngineError::ModelGap("current step has no source mapping".into()).into());
        };
        let contract_name = self
            .contracts
            .iter()
            .find(|(_, c)| c.address == Some(data.contract_address))
            .map(|(name, _)| name.clone())
            .ok_or_else(|| crate::error::EngineError::ModelGap("no linked contract at current address".into()))?;
        let file_path = self.contracts[&contract_name].source_path.clone();

        self.evaluating = true;
        self.eval_nonce += 1;
        let result = self.run_evaluation(compiler, expression, &contract_name, &file_path, src_loc.start, data.scope_chain.clone()).await;
        self.evaluating = false;
        result
    }

    async fn run_evaluation(
        &mut self,
        compiler: &dyn Compiler,
        expression: &str,
        contract_name: &str,
        file_path: &PathBuf,
        insertion_offset: usize,
        scope_chain: Vec<crate::sourcemap::ast::ScopeFrame>,
    ) -> eyre::Result<String> {
        let request = EvaluationRequest {
            expression: expression.to_string(),
            file_path: file_path.clone(),
            contract_name: contract_name.to_string(),
            insertion_offset,
            scope_chain,
        };

        let plan = {
            let file = &self.files[file_path];
            let contract = &self.contracts[contract_name];
            Evaluator::new(compiler, self.eval_nonce).evaluate(&request, file, contract)?
        };

        let address = self.contracts[contract_name].address.expect("evaluate requires a linked contract");
        let recompiled_contract = plan
            .recompiled
            .contracts
            .iter()
            .find(|c| c.name == *contract_name)
            .ok_or_else(|| crate::error::EngineError::Evaluator("recompiled output missing the evaluated contract".into()))?;
        let code = recompiled_contract.runtime_code.clone();

        let inject_response = self
            .round_trip(AdapterRequest::InjectCode { id: Uuid::new_v4(), address, code, pc: plan.resume_pc })
            .await?;
        if !matches!(inject_response, AdapterResponse::Injected { .. }) {
            return Err(crate::error::EngineError::Protocol("expected an injected-code ack".into()).into());
        }

        // Commit the recompiled file/contract into the program model before
        // resuming, so the next step event decodes against the code that's
        // actually now running (spec §4.6 step 7, §5 "commits atomically").
        self.link_compilation(plan.recompiled)?;
        if let Some(file) = self.files.get_mut(file_path) {
            file.record_insertion(plan.brace_line, plan.function_lines);
            file.record_insertion(plan.call_line, plan.call_lines);
        }
        let internal_bp = self.breakpoint_registry.set_breakpoint(
            self.files.get_mut(file_path).expect("file just inserted above"),
            self.units.get(file_path),
            &self.contracts,
            plan.post_call_line,
            false,
            false,
        );

        self.step_engine.await_return(plan.wrapper_name.clone());

        let word = loop {
            match self.step(StepMode::Continue).await? {
                None => return Err(crate::error::EngineError::Fatal("VM ended before the evaluation returned".into()).into()),
                Some(StopReason::Breakpoint(id)) if id == internal_bp.id => {
                    break self
                        .step_engine
                        .take_captured_return()
                        .ok_or_else(|| crate::error::EngineError::Evaluator("wrapper call never returned".into()))?;
                }
                Some(_) => continue,
            }
        };

        self.breakpoint_registry.clear_breakpoint(self.files.get_mut(file_path).expect("file linked above"), internal_bp.id);

        let unit = self.units.get(file_path).ok_or_else(|| crate::error::EngineError::Evaluator("missing recompiled AST".into()))?;
        let resolver = program_model::struct_resolver(unit);
        let decoded = crate::evaluator::decode_return_value(word, &plan.expected_type, &resolver)?;
        Ok(describe_decoded(decoded))
    }
}

/// What one adapter step response means for [`Engine::step`]'s loop: a real
/// stop, an ordinary instruction with nothing to report yet, or the VM
/// adapter signaling the run is over. Kept distinct from
/// `Option<StopReason>` — which [`StepEngine::on_step`] still returns for
/// unsolicited `step` triggers — because collapsing "ended" and "not a stop
/// point yet" into the same `None` would make `Continue` (whose own stop
/// rule is "only a breakpoint") unable to tell the two apart.
enum StepOutcome {
    Stopped(StopReason),
    Running,
    Ended,
}

fn describe_decoded(value: DecodedValue) -> String {
    match value {
        DecodedValue::Bool(b) => b.to_string(),
        DecodedValue::Unsigned(u) => u.to_string(),
        DecodedValue::Signed(i) => i.to_string(),
        DecodedValue::Address(a) => a.to_string(),
        DecodedValue::Bytes(b) => format!("0x{}", hex::encode(b)),
    }
}
