//! Ambient stack shared across the `sdb` workspace.
//!
//! Nothing in here is specific to source-level debugging: it is the same
//! kind of plumbing (cache directory conventions, progress reporting) a
//! debugger host needs regardless of what it debugs.

#[macro_use]
extern crate tracing;

pub mod cache;
pub mod progress_bar;
