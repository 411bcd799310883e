//! The error taxonomy from spec §7.
//!
//! Most fallible engine code just returns `eyre::Result` and relies on
//! `eyre!`/`bail!`/`ensure!`/`OptionExt::ok_or_eyre` for context, matching
//! the teacher's style. `EngineError` exists only for the handful of kinds
//! that a caller needs to branch on (does this recover locally, or is it
//! fatal) rather than merely log.

use std::fmt;

/// Taxonomy of engine-level failures.
///
/// Kinds 1-5 recover locally: the caller logs/reports and keeps going.
/// Kind 6 is the only one that surfaces to the user as termination.
#[derive(Debug, Clone)]
pub enum EngineError {
    /// Unknown request type, mis-keyed id, malformed JSON.
    Protocol(String),
    /// Event for an unlinked address, or a pc with no source mapping.
    ModelGap(String),
    /// A breakpoint could not be bound to any program counter.
    Resolution(String),
    /// A compile error in the evaluator that wasn't pattern-matched to a fix.
    Evaluator(String),
    /// Raw bytes shorter than the declared type width.
    Decoding(String),
    /// VM adapter disconnected; the session is over.
    Fatal(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Self::ModelGap(msg) => write!(f, "model gap: {msg}"),
            Self::Resolution(msg) => write!(f, "resolution error: {msg}"),
            Self::Evaluator(msg) => write!(f, "evaluator error: {msg}"),
            Self::Decoding(msg) => write!(f, "decoding error: {msg}"),
            Self::Fatal(msg) => write!(f, "fatal error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
