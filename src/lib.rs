//! Gap-filling ("masonry") packing layout engine.
//!
//! Items are placed into a container along one fixed axis; the container
//! grows along the flexible axis. The packer fills the topmost, then
//! leftmost, available gap for each item in turn, trading strict reading
//! order for a tighter packing. One pass is atomic: it either commits a
//! full layout or nothing.

pub mod error;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod packer;
pub mod registry;
pub mod runtime;
pub mod width;

pub use error::{LayoutError, Result};
pub use geometry::{Bounds, Point, Rect, Size, overlaps};
pub use layout::{
    CancelToken, EngineConfig, FixedAxis, Layout, LayoutEngine, PassContext, PassHook, PassOutcome,
    PassStats, Placement,
};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{MetricSnapshot, PassMetrics};
pub use packer::{Packer, PassItem, Slot};
pub use registry::{
    ContainerSource, ContainerSpec, ItemId, ItemSource, Measurement, PlacementRegistry, TileSet,
};
pub use runtime::audit::{
    AuditEvent, AuditEventBuilder, AuditStage, NullPassAudit, PassAudit,
};
pub use runtime::diagnostics::{LifecycleLogger, LoggingAudit};
pub use runtime::driver::{DriverError, DriverResult, TerminalDriver};
pub use runtime::{LayoutRuntime, LayoutSink, RuntimeConfig, RuntimeEvent};
pub use width::{display_width, measure_block};
