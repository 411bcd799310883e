use alloy_primitives::Address;

/// A reconstructed logical call-stack entry (spec §3 "Stack frame").
///
/// Pushed when the previous step's source-map jump was `"i"`, or when the
/// current pc is a function entry pc; popped when the previous step's jump
/// was `"o"`. The top-of-stack frame for the line currently executing is
/// synthesized on demand from `StepData`, never stored here.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub function_name: String,
    pub file: std::path::PathBuf,
    pub line: usize,
    pub address: Address,
    /// Program counter at the call site (the instruction that jumped in).
    pub call_site_pc: usize,
}
