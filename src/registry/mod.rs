//! Registry module orchestrator; the implementation lives in the private `core` module.

mod core;

pub use core::{
    ContainerSource, ContainerSpec, ItemId, ItemSource, Measurement, PlacementRegistry, TileSet,
};
