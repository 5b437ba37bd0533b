use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::{LayoutError, Result};
use crate::layout::Layout;
use crate::width::measure_block;

pub type ItemId = String;

/// Sizes reported by the measurement boundary for one item. Values are in
/// (fixed, flex) axis order; the engine validates them before placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    pub fixed: f64,
    pub flex: f64,
    pub hidden: bool,
}

impl Measurement {
    pub const fn new(fixed: f64, flex: f64) -> Self {
        Self {
            fixed,
            flex,
            hidden: false,
        }
    }

    pub const fn hidden(fixed: f64, flex: f64) -> Self {
        Self {
            fixed,
            flex,
            hidden: true,
        }
    }
}

/// Measurement provider: yields the ordered item collection for a pass.
/// Order is significant and must be stable while a pass runs.
pub trait ItemSource {
    fn collect(&self) -> Vec<(ItemId, Measurement)>;
}

/// Container metrics provider: the fixed-axis extent and the padding
/// offsets (in (fixed, flex) axis order) of the seed slot.
pub trait ContainerSource {
    fn fixed_size(&self) -> f64;
    fn padding(&self) -> (f64, f64);
}

/// Plain-value container metrics. The runtime owns one and rewrites its
/// fixed size on every resize notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSpec {
    pub fixed_size: f64,
    pub padding_fixed: f64,
    pub padding_flex: f64,
}

impl ContainerSpec {
    pub const fn new(fixed_size: f64) -> Self {
        Self {
            fixed_size,
            padding_fixed: 0.0,
            padding_flex: 0.0,
        }
    }

    pub fn with_padding(mut self, fixed: f64, flex: f64) -> Self {
        self.padding_fixed = fixed;
        self.padding_flex = flex;
        self
    }
}

impl ContainerSource for ContainerSpec {
    fn fixed_size(&self) -> f64 {
        self.fixed_size
    }

    fn padding(&self) -> (f64, f64) {
        (self.padding_fixed, self.padding_flex)
    }
}

#[derive(Debug, Clone)]
struct Tile {
    id: ItemId,
    measurement: Measurement,
}

/// Ordered in-memory item collection.
///
/// Tiles carry either explicit measurements or text content measured as
/// monospaced cells. The fingerprint digests order, sizes, and visibility
/// so callers can detect collection changes between passes.
#[derive(Debug, Default)]
pub struct TileSet {
    tiles: Vec<Tile>,
}

impl TileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Append a tile, or update it in place (keeping its position) when the
    /// id is already present.
    pub fn push(&mut self, id: impl Into<ItemId>, measurement: Measurement) {
        let id = id.into();
        if let Some(tile) = self.tiles.iter_mut().find(|tile| tile.id == id) {
            tile.measurement = measurement;
        } else {
            self.tiles.push(Tile { id, measurement });
        }
    }

    /// Append a text tile measured as (widest line, line count) in cells.
    pub fn push_text(&mut self, id: impl Into<ItemId>, content: &str) {
        let (fixed, flex) = measure_block(content);
        self.push(id, Measurement::new(fixed, flex));
    }

    pub fn set_measurement(&mut self, id: &str, measurement: Measurement) -> Result<()> {
        self.find_mut(id)?.measurement = measurement;
        Ok(())
    }

    pub fn set_hidden(&mut self, id: &str, hidden: bool) -> Result<()> {
        self.find_mut(id)?.measurement.hidden = hidden;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<()> {
        let idx = self
            .tiles
            .iter()
            .position(|tile| tile.id == id)
            .ok_or_else(|| LayoutError::ItemNotFound(id.to_string()))?;
        self.tiles.remove(idx);
        Ok(())
    }

    /// Digest of (order, sizes, visibility). Two sets with the same
    /// fingerprint pack identically under the same container.
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for tile in &self.tiles {
            hasher.update(tile.id.as_bytes());
            hasher.update(&[0xff]);
            hasher.update(&tile.measurement.fixed.to_bits().to_le_bytes());
            hasher.update(&tile.measurement.flex.to_bits().to_le_bytes());
            hasher.update(&[tile.measurement.hidden as u8]);
        }
        hasher.finalize()
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Tile> {
        self.tiles
            .iter_mut()
            .find(|tile| tile.id == id)
            .ok_or_else(|| LayoutError::ItemNotFound(id.to_string()))
    }
}

impl ItemSource for TileSet {
    fn collect(&self) -> Vec<(ItemId, Measurement)> {
        self.tiles
            .iter()
            .map(|tile| (tile.id.clone(), tile.measurement))
            .collect()
    }
}

/// Last committed screen placements, diffed against each completed pass so
/// the caller only re-applies offsets for items that actually moved.
#[derive(Debug, Default)]
pub struct PlacementRegistry {
    committed: HashMap<ItemId, (f64, f64)>,
}

impl PlacementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed layout. Returns the ids whose placement changed
    /// (including items placed for the first time); items absent from the
    /// layout are forgotten.
    pub fn sync(&mut self, layout: &Layout) -> Vec<ItemId> {
        let mut moved = Vec::new();
        for placement in &layout.placements {
            let next = (placement.x, placement.y);
            if self.committed.get(&placement.id) != Some(&next) {
                self.committed.insert(placement.id.clone(), next);
                moved.push(placement.id.clone());
            }
        }

        let keep: HashSet<&str> = layout
            .placements
            .iter()
            .map(|placement| placement.id.as_str())
            .collect();
        self.committed.retain(|id, _| keep.contains(id.as_str()));

        moved
    }

    pub fn position_of(&self, id: &str) -> Option<(f64, f64)> {
        self.committed.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }
}
