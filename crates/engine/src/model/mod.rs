//! The engine's in-memory data model (spec §3 "Data model").

pub mod breakpoint;
pub mod contract;
pub mod detail;
pub mod file;
pub mod frame;
pub mod step_data;
pub mod variable;

pub use breakpoint::Breakpoint;
pub use contract::Contract;
pub use detail::{Detail, Location, Position};
pub use file::File;
pub use frame::StackFrame;
pub use step_data::StepData;
pub use variable::{ScopeRef, Variable};
