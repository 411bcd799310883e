//! Hosts one debugging session: the UI client channel on stdin/stdout, the
//! VM adapter channel over a TCP socket (spec §6). This is the "IDE/CLI"
//! mentioned in spec.md §1 — a real caller for the facade in §4.8, not a
//! production UI.

use clap::Args;
use eyre::WrapErr;
use sdb_engine::adapter::{AdapterRequest, CorrelationMap};
use sdb_engine::step_engine::{StepMode, StopReason};
use sdb_engine::{Engine, EngineError, Facade};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

use crate::adapter_wire::{AdapterEnvelope, AdapterMessageType, AdapterTrigger};
use crate::compiler::SolcCompiler;
use crate::protocol::{
    ClearBreakpointsContent, Envelope, EvaluateContent, SetBreakpointContent, StackContent, UiAction, UiActionContent,
    VariablesContent,
};

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address of the VM adapter's TCP listener (spec §6 "VM adapter
    /// channel"). The adapter itself is an external collaborator; sdb only
    /// speaks its wire protocol.
    #[arg(long, env = "SDB_ADAPTER_ADDR", default_value = "127.0.0.1:6699")]
    pub adapter_addr: String,

    /// solc version the evaluator's recompiler installs on demand.
    #[arg(long, default_value = "0.8.19")]
    pub solc_version: String,
}

impl ServeArgs {
    pub async fn run(self) -> eyre::Result<()> {
        let version: semver::Version = self.solc_version.parse().wrap_err("invalid --solc-version")?;
        let compiler = SolcCompiler::new(version);

        let stream = tokio::net::TcpStream::connect(&self.adapter_addr)
            .await
            .wrap_err_with(|| format!("failed to connect to the VM adapter at {}", self.adapter_addr))?;
        let (adapter_read, adapter_write) = stream.into_split();

        let (outbound_tx, mut outbound_rx) = tokio::sync::mpsc::unbounded_channel::<AdapterRequest>();
        let correlation = CorrelationMap::new();

        let mut writer = tokio::io::BufWriter::new(adapter_write);
        tokio::spawn(async move {
            while let Some(request) = outbound_rx.recv().await {
                let Ok(envelope) = AdapterEnvelope::from_request(&request) else { continue };
                let Ok(mut line) = serde_json::to_string(&envelope) else { continue };
                line.push('\n');
                if writer.write_all(line.as_bytes()).await.is_err() || writer.flush().await.is_err() {
                    break;
                }
            }
        });

        let (trigger_tx, mut trigger_rx) = tokio::sync::mpsc::unbounded_channel::<AdapterTrigger>();
        let reader_correlation = correlation.clone();
        tokio::spawn(async move {
            let mut lines = tokio::io::BufReader::new(adapter_read).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let Ok(envelope) = serde_json::from_str::<AdapterEnvelope>(&line) else { continue };
                        match envelope.message_type {
                            AdapterMessageType::Response => {
                                if let Ok(response) = envelope.decode_response() {
                                    reader_correlation.resolve(response).await;
                                }
                            }
                            AdapterMessageType::Request => {
                                if let Some(trigger) = envelope.decode_trigger() {
                                    let _ = trigger_tx.send(trigger);
                                }
                            }
                        }
                    }
                    _ => {
                        reader_correlation.cancel_all().await;
                        break;
                    }
                }
            }
        });

        let mut engine = Engine::new(outbound_tx, correlation).with_compiler(Box::new(compiler));

        let mut ui_lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        loop {
            tokio::select! {
                line = ui_lines.next_line() => {
                    let Ok(Some(line)) = line else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let Ok(request) = serde_json::from_str::<Envelope>(&line) else { continue };
                    let (response, events) = handle_ui_request(&mut engine, request).await;
                    write_envelope(&mut stdout, &response).await?;
                    for event in events {
                        write_envelope(&mut stdout, &event).await?;
                    }
                }
                trigger = trigger_rx.recv() => {
                    let Some(trigger) = trigger else { continue };
                    if let Some(event) = apply_trigger(&mut engine, trigger) {
                        write_envelope(&mut stdout, &event).await?;
                    }
                }
            }
        }

        Ok(())
    }
}

async fn write_envelope(out: &mut tokio::io::Stdout, envelope: &Envelope) -> eyre::Result<()> {
    let mut line = serde_json::to_string(envelope)?;
    line.push('\n');
    out.write_all(line.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

async fn handle_ui_request(engine: &mut Engine, request: Envelope) -> (Envelope, Vec<Envelope>) {
    let id = request.id;
    let kind = request.kind.clone();
    match dispatch(engine, &kind, request.content).await {
        Ok((content, events)) => (Envelope::response(id, kind, content), events),
        Err(e) => (Envelope::error(id, kind, e.to_string()), Vec::new()),
    }
}

async fn dispatch(engine: &mut Engine, kind: &str, content: serde_json::Value) -> eyre::Result<(serde_json::Value, Vec<Envelope>)> {
    match kind {
        "ping" => Ok((serde_json::json!({}), Vec::new())),

        "clearBreakpoints" => {
            let c: ClearBreakpointsContent = serde_json::from_value(content)?;
            Facade::new(engine).clear_breakpoints(&c.path);
            Ok((serde_json::json!({}), Vec::new()))
        }

        "setBreakpoint" => {
            let c: SetBreakpointContent = serde_json::from_value(content)?;
            let bp = Facade::new(engine).set_breakpoint(&c.path, c.line, true)?;
            let event = Envelope::event("breakpointValidated", vec![serde_json::json!({ "id": bp.id, "verified": bp.verified })]);
            Ok((serde_json::json!({ "id": bp.id, "verified": bp.verified }), vec![event]))
        }

        "stack" => {
            let c: StackContent = serde_json::from_value(content)?;
            let facade = Facade::new(engine);
            let frames = facade.stack_trace();
            let end = c.end_frame.min(frames.len());
            let slice = if c.start_frame < end { &frames[c.start_frame..end] } else { &[] };
            Ok((serde_json::json!({ "frames": slice }), Vec::new()))
        }

        "variables" => {
            let c: VariablesContent = serde_json::from_value(content)?;
            let variables = Facade::new(engine).variables(c.variables_reference)?;
            let rendered: Vec<_> = variables
                .into_iter()
                .map(|v| {
                    serde_json::json!({
                        "name": v.name,
                        "type": v.type_string,
                        "value": v.value,
                        "variablesReference": v.variables_reference,
                    })
                })
                .collect();
            Ok((serde_json::json!({ "variables": rendered }), Vec::new()))
        }

        "uiAction" => {
            let c: UiActionContent = serde_json::from_value(content)?;
            let stop = run_ui_action(engine, c.action).await?;
            if matches!(stop, Some(StopReason::Entry)) {
                engine.step_engine.acknowledge_entry();
            }
            let event_name = event_name_for(c.action, stop);
            Ok((serde_json::json!({}), vec![Envelope::event(event_name, Vec::new())]))
        }

        "evaluate" => {
            let c: EvaluateContent = serde_json::from_value(content)?;
            let result = Facade::new(engine).evaluate(&c.expression).await?;
            Ok((serde_json::json!({ "result": result }), Vec::new()))
        }

        other => Err(EngineError::Protocol(format!("unknown request type: {other}")).into()),
    }
}

async fn run_ui_action(engine: &mut Engine, action: UiAction) -> eyre::Result<Option<StopReason>> {
    match action {
        UiAction::Continue => engine.step(StepMode::Continue).await,
        UiAction::StepOver => engine.step(StepMode::StepOver).await,
        UiAction::StepIn => engine.step(StepMode::StepIn).await,
        UiAction::StepOut => engine.step(StepMode::StepOut).await,
        // Reverse execution is an explicit non-goal (spec §9); the request
        // is acknowledged with an error rather than left to hang.
        UiAction::ContinueReverse | UiAction::StepBack => {
            Err(EngineError::Fatal("reverse execution is not supported".into()).into())
        }
    }
}

fn event_name_for(action: UiAction, stop: Option<StopReason>) -> &'static str {
    match stop {
        None => "end",
        Some(StopReason::Entry) => "stopOnEntry",
        Some(StopReason::Breakpoint(_)) => "stopOnBreakpoint",
        Some(StopReason::Step) => match action {
            UiAction::StepOver => "stopOnStepOver",
            UiAction::StepIn => "stopOnStepIn",
            UiAction::StepOut => "stopOnStepOut",
            _ => "stopOnStep",
        },
    }
}

/// Applies one adapter-originated trigger (spec §4.3, §6). Returns an event
/// frame when the trigger itself produces a UI-visible stop (the
/// unsolicited `step` trigger reporting the very first instruction after a
/// deploy).
fn apply_trigger(engine: &mut Engine, trigger: AdapterTrigger) -> Option<Envelope> {
    match trigger {
        AdapterTrigger::LinkCompilerOutput { source_root_path: _, compilation_result } => {
            if let Err(e) = engine.link_compilation(compilation_result) {
                return Some(Envelope::event("error", vec![serde_json::json!(e.to_string())]));
            }
            None
        }
        AdapterTrigger::LinkContractAddress { contract_name, address } => {
            engine.link_contract_address_by_name(&contract_name, address);
            None
        }
        AdapterTrigger::NewContract { code, address } => {
            engine.link_contract_address(&code, address);
            None
        }
        AdapterTrigger::Step { address, pc, stack, memory } => match engine.ingest_step(address, pc, stack, memory) {
            Ok(Some(StopReason::Entry)) => {
                engine.step_engine.acknowledge_entry();
                Some(Envelope::event("stopOnEntry", Vec::new()))
            }
            Ok(Some(StopReason::Breakpoint(_))) => Some(Envelope::event("stopOnBreakpoint", Vec::new())),
            Ok(Some(StopReason::Step)) => Some(Envelope::event("stopOnStep", Vec::new())),
            Ok(None) => Some(Envelope::event("end", Vec::new())),
            Err(e) => Some(Envelope::event("error", vec![serde_json::json!(e.to_string())])),
        },
        AdapterTrigger::Exception { message } => Some(Envelope::event("error", vec![serde_json::json!(message)])),
    }
}
