//! The VM adapter wire protocol and request/response correlation (spec §5
//! "Concurrency model", §6 "External interfaces").
//!
//! The engine and the VM adapter speak newline-delimited JSON over
//! whatever transport the CLI wires up (spec leaves this to the host); each
//! request carries a `Uuid`, and [`CorrelationMap`] lets the engine `await`
//! the matching response without blocking anything else, even though the
//! engine itself is single-threaded and cooperative — there is exactly one
//! VM adapter connection in flight at a time, so this is about not
//! stalling on slow I/O, not about real parallel work.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, Mutex};
use uuid::Uuid;

/// Engine -> VM adapter (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdapterRequest {
    StepInto { id: Uuid },
    StepOver { id: Uuid },
    StepOut { id: Uuid },
    Continue { id: Uuid },
    ReadStorage { id: Uuid, address: Address, slot: U256 },
    /// Swaps the runtime code at `address` for `code` and arranges for
    /// execution to resume at `pc` in the new code (spec §4.6 step 10,
    /// `putCodeRequest`/`injectNewCode`). The VM is left exactly as paused
    /// as before; only the evaluator uses this.
    InjectCode { id: Uuid, address: Address, code: Bytes, pc: usize },
    SendBreakpoint { id: Uuid, address: Address, pc: usize, enabled: bool, runtime: bool },
}

impl AdapterRequest {
    pub fn id(&self) -> Uuid {
        match self {
            Self::StepInto { id }
            | Self::StepOver { id }
            | Self::StepOut { id }
            | Self::Continue { id }
            | Self::ReadStorage { id, .. }
            | Self::InjectCode { id, .. }
            | Self::SendBreakpoint { id, .. } => *id,
        }
    }
}

/// VM adapter -> engine (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdapterResponse {
    Step { id: Uuid, address: Address, pc: usize, stack: Vec<U256>, memory: Bytes, ended: bool },
    Storage { id: Uuid, value: U256 },
    Injected { id: Uuid },
    Ack { id: Uuid },
    Error { id: Uuid, message: String },
}

impl AdapterResponse {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Step { id, .. }
            | Self::Storage { id, .. }
            | Self::Injected { id, .. }
            | Self::Ack { id, .. }
            | Self::Error { id, .. } => *id,
        }
    }
}

/// Maps an in-flight request's id to the oneshot sender that will wake the
/// task awaiting its response. One instance is shared (via `Arc`) between
/// the task reading the adapter's socket and every task that issues a
/// request.
#[derive(Default)]
pub struct CorrelationMap {
    pending: Mutex<FxHashMap<Uuid, oneshot::Sender<AdapterResponse>>>,
}

impl CorrelationMap {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `id` as awaiting a response, returning the receiver half.
    /// Must be called before the matching request is written to the
    /// socket, to avoid a response racing ahead of its registration.
    pub async fn register(&self, id: Uuid) -> oneshot::Receiver<AdapterResponse> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);
        rx
    }

    /// Delivers an incoming response to whichever task registered its id,
    /// if any (an adapter echoing a stale or unknown id is silently
    /// dropped).
    pub async fn resolve(&self, response: AdapterResponse) {
        if let Some(tx) = self.pending.lock().await.remove(&response.id()) {
            let _ = tx.send(response);
        }
    }

    pub async fn cancel_all(&self) {
        self.pending.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_wakes_the_matching_waiter() {
        let map = CorrelationMap::new();
        let id = Uuid::new_v4();
        let rx = map.register(id).await;
        map.resolve(AdapterResponse::Injected { id }).await;
        let response = rx.await.unwrap();
        assert_eq!(response.id(), id);
    }

    #[tokio::test]
    async fn resolve_with_unknown_id_is_a_no_op() {
        let map = CorrelationMap::new();
        map.resolve(AdapterResponse::Error { id: Uuid::new_v4(), message: "late".into() }).await;
    }
}
