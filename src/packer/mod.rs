//! Packer module orchestrator.
//!
//! The slot/barrier packer is the algorithmic heart of the crate; the
//! implementation lives in the private `core` module.

mod core;

pub use core::{Packer, PassItem, Slot};
