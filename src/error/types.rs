use thiserror::Error;

/// Unified result type for the cobble crate.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors surfaced by the packing engine.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("no viable slot for item `{id}` ({fixed}x{flex})")]
    NoViableSlot { id: String, fixed: f64, flex: f64 },
    #[error("invalid measurement for item `{id}`: {reason}")]
    InvalidMeasurement { id: String, reason: String },
    #[error("container fixed size must be a finite non-negative number, got {0}")]
    InvalidContainer(f64),
    #[error("item `{0}` not found")]
    ItemNotFound(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
