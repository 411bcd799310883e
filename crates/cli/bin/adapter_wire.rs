//! The VM adapter channel's wire shape (spec §6 "VM adapter channel"):
//! `{ id, messageType, content, triggerType? }` frames. Engine-originated
//! requests and their responses nest an [`sdb_engine::adapter::AdapterRequest`]
//! / [`AdapterResponse`] verbatim as `content`; adapter-originated triggers
//! are named by `triggerType` and decoded per-variant here.

use std::path::PathBuf;

use alloy_primitives::{Address, Bytes};
use sdb_engine::adapter::{AdapterRequest, AdapterResponse};
use sdb_engine::program_model::CompilationResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdapterMessageType {
    Request,
    Response,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterEnvelope {
    pub id: Uuid,
    pub message_type: AdapterMessageType,
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_type: Option<String>,
}

impl AdapterEnvelope {
    pub fn from_request(request: &AdapterRequest) -> eyre::Result<Self> {
        Ok(Self { id: request.id(), message_type: AdapterMessageType::Request, content: serde_json::to_value(request)?, trigger_type: None })
    }

    pub fn decode_response(&self) -> eyre::Result<AdapterResponse> {
        Ok(serde_json::from_value(self.content.clone())?)
    }

    pub fn decode_trigger(&self) -> Option<AdapterTrigger> {
        let trigger_type = self.trigger_type.as_deref()?;
        let content = self.content.clone();
        match trigger_type {
            "linkCompilerOutput" => {
                let payload: LinkCompilerOutputPayload = serde_json::from_value(content).ok()?;
                Some(AdapterTrigger::LinkCompilerOutput { source_root_path: payload.source_root_path, compilation_result: payload.compilation_result })
            }
            "linkContractAddress" => {
                let payload: LinkContractAddressPayload = serde_json::from_value(content).ok()?;
                Some(AdapterTrigger::LinkContractAddress { contract_name: payload.contract_name, address: payload.address })
            }
            "newContract" => {
                let payload: NewContractPayload = serde_json::from_value(content).ok()?;
                Some(AdapterTrigger::NewContract { code: payload.code, address: payload.address })
            }
            "step" => {
                let payload: StepPayload = serde_json::from_value(content).ok()?;
                Some(AdapterTrigger::Step { address: payload.address, pc: payload.pc, stack: payload.stack, memory: payload.memory })
            }
            "exception" => {
                let payload: ExceptionPayload = serde_json::from_value(content).ok()?;
                Some(AdapterTrigger::Exception { message: payload.message })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkCompilerOutputPayload {
    source_root_path: PathBuf,
    compilation_result: CompilationResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkContractAddressPayload {
    contract_name: String,
    address: Address,
}

#[derive(Debug, Deserialize)]
struct NewContractPayload {
    code: Bytes,
    address: Address,
}

#[derive(Debug, Deserialize)]
struct StepPayload {
    address: Address,
    pc: usize,
    stack: Vec<alloy_primitives::U256>,
    memory: Bytes,
}

#[derive(Debug, Deserialize)]
struct ExceptionPayload {
    message: String,
}

/// A decoded adapter-originated trigger (spec §6 "Adapter → engine
/// triggers"). `source_root_path` and `gasLeft`/`opcode` on `step` are
/// accepted on the wire but unused by the engine (spec §3 doesn't model gas
/// or the mnemonic; the opcode is implied by `pc` once linked).
pub enum AdapterTrigger {
    LinkCompilerOutput { source_root_path: PathBuf, compilation_result: CompilationResult },
    LinkContractAddress { contract_name: String, address: Address },
    NewContract { code: Bytes, address: Address },
    Step { address: Address, pc: usize, stack: Vec<alloy_primitives::U256>, memory: Bytes },
    Exception { message: String },
}
