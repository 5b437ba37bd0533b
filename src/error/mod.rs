//! Error module orchestrator; the error types live in the private `types` module.

mod types;

pub use types::{LayoutError, Result};
