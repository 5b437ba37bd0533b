//! Pass milestone hooks.
//!
//! External collaborators observe a pass (and may abandon it) without the
//! engine depending on any event-bus implementation. Hooks run in
//! registration order at each milestone.

use crate::error::Result;

use super::core::{CancelToken, Layout};

/// Context handed to hooks at every milestone.
pub struct PassContext<'a> {
    cancel: &'a CancelToken,
    fixed_size: Option<f64>,
    item_count: Option<usize>,
}

impl<'a> PassContext<'a> {
    pub(crate) fn new(
        cancel: &'a CancelToken,
        fixed_size: Option<f64>,
        item_count: Option<usize>,
    ) -> Self {
        Self {
            cancel,
            fixed_size,
            item_count,
        }
    }

    /// Ask the engine to abandon the current pass. The engine checks the
    /// flag after each milestone and between item placements.
    pub fn request_abort(&self) {
        self.cancel.cancel();
    }

    /// Container fixed size, once it has been read this pass.
    pub fn fixed_size(&self) -> Option<f64> {
        self.fixed_size
    }

    /// Number of collected items, once the collection has been read.
    pub fn item_count(&self) -> Option<usize> {
        self.item_count
    }
}

/// Behaviour injection point around the pass lifecycle.
pub trait PassHook: Send {
    fn name(&self) -> &str {
        "pass_hook"
    }

    /// Before the container is measured.
    fn before_measure(&mut self, _ctx: &mut PassContext<'_>) -> Result<()> {
        Ok(())
    }

    /// After the size check passed, before the item collection is read.
    fn before_items(&mut self, _ctx: &mut PassContext<'_>) -> Result<()> {
        Ok(())
    }

    /// After items are collected and validated, before placement begins.
    fn before_placement(&mut self, _ctx: &mut PassContext<'_>) -> Result<()> {
        Ok(())
    }

    /// After every item is placed and the flex size is computed.
    fn after_completion(&mut self, _ctx: &mut PassContext<'_>, _layout: &Layout) -> Result<()> {
        Ok(())
    }

    /// The pass was skipped because the fixed size had not changed.
    fn on_cancelled(&mut self, _ctx: &mut PassContext<'_>) -> Result<()> {
        Ok(())
    }
}
