//! # sdb-engine
//!
//! The execution-tracking and evaluation engine for a source-level debugger
//! over EVM-style bytecode: ingest compiler output, reconstruct a call
//! stack and lexical scope from a stream of per-instruction VM events,
//! enforce breakpoints and step semantics, decode typed variables out of
//! raw stack/memory/storage cells, and evaluate expressions by
//! synthesizing and injecting a helper function.
//!
//! The VM itself, the compiler toolchain, and the UI wire framing are all
//! external collaborators: this crate only speaks their artifact/message
//! shapes, never implements them.

#[macro_use]
extern crate tracing;

pub mod adapter;
pub mod breakpoints;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod facade;
pub mod model;
pub mod program_model;
pub mod sourcemap;
pub mod step_engine;

pub use engine::Engine;
pub use error::EngineError;
pub use facade::Facade;
