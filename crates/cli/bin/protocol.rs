//! The UI client channel's wire shape (spec §6 "UI client channel"):
//! `{ id, isRequest, type, content, error? }` frames, one per line of
//! newline-delimited JSON.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub id: Uuid,
    #[serde(rename = "isRequest")]
    pub is_request: bool,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn response(id: Uuid, kind: impl Into<String>, content: serde_json::Value) -> Self {
        Self { id, is_request: false, kind: kind.into(), content, error: None }
    }

    pub fn error(id: Uuid, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self { id, is_request: false, kind: kind.into(), content: serde_json::Value::Null, error: Some(message.into()) }
    }

    /// A server-initiated `event` frame (spec §6: "Server-initiated
    /// requests carry `type=\"event\"`").
    pub fn event(name: &str, args: Vec<serde_json::Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            is_request: true,
            kind: "event".to_string(),
            content: serde_json::json!({ "event": name, "args": args }),
            error: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ClearBreakpointsContent {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct SetBreakpointContent {
    pub path: PathBuf,
    pub line: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackContent {
    pub start_frame: usize,
    pub end_frame: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariablesContent {
    pub variables_reference: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiActionContent {
    pub action: UiAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UiAction {
    Continue,
    ContinueReverse,
    StepOver,
    StepBack,
    StepIn,
    StepOut,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateContent {
    pub expression: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub frame_id: Option<u64>,
}
