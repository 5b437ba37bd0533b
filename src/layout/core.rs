use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::error::{LayoutError, Result};
use crate::geometry::{Point, Size};
use crate::packer::{Packer, PassItem};
use crate::registry::{ContainerSource, ItemId, ItemSource, Measurement};

use super::hooks::{PassContext, PassHook};

/// Which screen axis has an externally given extent. The other axis grows
/// to fit content and its extent is the pass's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FixedAxis {
    /// x is fixed, the container grows downward (vertical masonry).
    Width,
    /// y is fixed, the container grows rightward (horizontal masonry).
    Height,
}

impl FixedAxis {
    /// Map (fixed, flex) coordinates into screen (x, y).
    pub fn to_screen(self, fixed: f64, flex: f64) -> (f64, f64) {
        match self {
            FixedAxis::Width => (fixed, flex),
            FixedAxis::Height => (flex, fixed),
        }
    }

    /// Extract the fixed-axis extent from a terminal cell size.
    pub fn fixed_cells(self, size: Size) -> u16 {
        match self {
            FixedAxis::Width => size.width,
            FixedAxis::Height => size.height,
        }
    }
}

/// Engine configuration. Padding is not configured here: it always comes
/// from the container metrics boundary.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub fixed_axis: FixedAxis,
    /// Uniform spacing enforced between adjacent items.
    pub gutter: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_axis: FixedAxis::Width,
            gutter: 4.0,
        }
    }
}

/// Final screen offset for one visible item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub id: ItemId,
    pub x: f64,
    pub y: f64,
}

/// Counters describing what one completed pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PassStats {
    pub items_placed: usize,
    pub items_hidden: usize,
    pub slots_swept: usize,
}

/// The externally visible result of a completed pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    /// The container fixed-axis extent the pass was computed against.
    pub fixed_size: f64,
    /// Computed container flex-axis extent (growth beyond padding).
    pub flex_size: f64,
    pub stats: PassStats,
    pub placements: Vec<Placement>,
}

/// How a `run_pass` call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// A new layout was computed.
    Completed(Layout),
    /// The fixed size had not changed; nothing was recomputed.
    Cancelled,
    /// The cancel token tripped mid-pass; no layout escaped.
    Interrupted,
}

/// Cooperative cancellation flag, cheap to clone and share. The engine
/// clears it when a pass starts and checks it between item placements.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Pass orchestrator: owns the packer, the milestone hooks, and the
/// last observed container fixed size used for the cancellation check.
pub struct LayoutEngine {
    config: EngineConfig,
    packer: Packer,
    hooks: Vec<Box<dyn PassHook>>,
    cancel: CancelToken,
    last_fixed_size: Option<f64>,
}

impl LayoutEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            packer: Packer::new(),
            hooks: Vec::new(),
            cancel: CancelToken::new(),
            last_fixed_size: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn add_hook<H>(&mut self, hook: H)
    where
        H: PassHook + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    /// Clone the token callers (or hooks) use to abandon the running pass.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Forget the last observed fixed size so the next pass always runs.
    pub fn invalidate(&mut self) {
        self.last_fixed_size = None;
    }

    pub fn last_fixed_size(&self) -> Option<f64> {
        self.last_fixed_size
    }

    /// Run one full pass over the item collection.
    ///
    /// Skips with `PassOutcome::Cancelled` when the container fixed size
    /// matches the previous observation and `force` is false. Either every
    /// item receives a final position and a `Layout` is returned, or the
    /// pass aborts with no partial result.
    pub fn run_pass(
        &mut self,
        items: &dyn ItemSource,
        container: &dyn ContainerSource,
        force: bool,
    ) -> Result<PassOutcome> {
        self.cancel.clear();
        self.notify(None, None, |hook, ctx| hook.before_measure(ctx))?;

        let fixed_size = container.fixed_size();
        if !fixed_size.is_finite() || fixed_size < 0.0 {
            return Err(LayoutError::InvalidContainer(fixed_size));
        }

        if !force && self.last_fixed_size == Some(fixed_size) {
            self.notify(Some(fixed_size), None, |hook, ctx| hook.on_cancelled(ctx))?;
            return Ok(PassOutcome::Cancelled);
        }

        // A failed or abandoned pass must not satisfy the next size check;
        // the new observation is recorded only on completion.
        self.last_fixed_size = None;

        self.notify(Some(fixed_size), None, |hook, ctx| hook.before_items(ctx))?;
        if self.cancel.is_cancelled() {
            return Ok(PassOutcome::Interrupted);
        }

        let collected = items.collect();
        let mut pass_items = Vec::with_capacity(collected.len());
        for (id, measurement) in collected {
            validate_measurement(&id, measurement)?;
            pass_items.push(PassItem::new(
                id,
                measurement.fixed,
                measurement.flex,
                measurement.hidden,
            ));
        }

        self.notify(Some(fixed_size), Some(pass_items.len()), |hook, ctx| {
            hook.before_placement(ctx)
        })?;
        if self.cancel.is_cancelled() {
            return Ok(PassOutcome::Interrupted);
        }

        let (pad_fixed, pad_flex) = container.padding();
        self.packer
            .begin_pass(Point::new(pad_fixed, pad_flex), self.config.gutter, fixed_size);

        let mut hidden = 0usize;
        for item in pass_items.iter_mut() {
            if self.cancel.is_cancelled() {
                return Ok(PassOutcome::Interrupted);
            }
            if item.hidden {
                hidden += 1;
                continue;
            }
            self.packer.place(item)?;
        }

        let origin = self.packer.origin();
        let mut max_flex: Option<f64> = None;
        for item in pass_items.iter().filter(|item| !item.hidden) {
            let extent = item.pos.y + item.flex;
            max_flex = Some(max_flex.map_or(extent, |seen: f64| seen.max(extent)));
        }
        let flex_size = max_flex.map_or(0.0, |extent| (extent - origin.y).max(0.0));

        let placements = pass_items
            .iter()
            .filter(|item| !item.hidden)
            .map(|item| {
                let (x, y) = self.config.fixed_axis.to_screen(item.pos.x, item.pos.y);
                Placement {
                    id: item.id.clone(),
                    x,
                    y,
                }
            })
            .collect::<Vec<_>>();

        let layout = Layout {
            fixed_size,
            flex_size,
            stats: PassStats {
                items_placed: placements.len(),
                items_hidden: hidden,
                slots_swept: self.packer.swept(),
            },
            placements,
        };

        self.last_fixed_size = Some(fixed_size);
        self.notify_completion(&layout)?;
        Ok(PassOutcome::Completed(layout))
    }

    fn notify<F>(&mut self, fixed_size: Option<f64>, item_count: Option<usize>, mut f: F) -> Result<()>
    where
        F: FnMut(&mut dyn PassHook, &mut PassContext<'_>) -> Result<()>,
    {
        let cancel = self.cancel.clone();
        for hook in self.hooks.iter_mut() {
            let mut ctx = PassContext::new(&cancel, fixed_size, item_count);
            f(hook.as_mut(), &mut ctx)?;
        }
        Ok(())
    }

    fn notify_completion(&mut self, layout: &Layout) -> Result<()> {
        let cancel = self.cancel.clone();
        for hook in self.hooks.iter_mut() {
            let mut ctx = PassContext::new(
                &cancel,
                Some(layout.fixed_size),
                Some(layout.placements.len()),
            );
            hook.after_completion(&mut ctx, layout)?;
        }
        Ok(())
    }
}

fn validate_measurement(id: &ItemId, measurement: Measurement) -> Result<()> {
    for (value, axis) in [(measurement.fixed, "fixed"), (measurement.flex, "flex")] {
        if !value.is_finite() {
            return Err(LayoutError::InvalidMeasurement {
                id: id.clone(),
                reason: format!("{axis} size is not a finite number"),
            });
        }
        if value < 0.0 {
            return Err(LayoutError::InvalidMeasurement {
                id: id.clone(),
                reason: format!("{axis} size {value} is negative"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::registry::{ContainerSpec, TileSet};

    fn tiles(sizes: &[(f64, f64)]) -> TileSet {
        let mut set = TileSet::new();
        for (i, &(fixed, flex)) in sizes.iter().enumerate() {
            set.push(format!("tile-{i}"), Measurement::new(fixed, flex));
        }
        set
    }

    fn container(fixed: f64) -> ContainerSpec {
        ContainerSpec::new(fixed)
    }

    fn engine(gutter: f64) -> LayoutEngine {
        LayoutEngine::new(EngineConfig {
            fixed_axis: FixedAxis::Width,
            gutter,
        })
    }

    fn completed(outcome: PassOutcome) -> Layout {
        match outcome {
            PassOutcome::Completed(layout) => layout,
            other => panic!("expected completed pass, got {other:?}"),
        }
    }

    #[test]
    fn pass_places_items_and_reports_flex_size() {
        let set = tiles(&[(50.0, 50.0), (50.0, 30.0), (50.0, 50.0)]);
        let mut engine = engine(0.0);

        let layout = completed(engine.run_pass(&set, &container(100.0), false).unwrap());

        assert_eq!(layout.fixed_size, 100.0);
        assert_eq!(layout.flex_size, 80.0);
        assert_eq!(layout.placements.len(), 3);
        assert_eq!(layout.placements[0].x, 0.0);
        assert_eq!(layout.placements[0].y, 0.0);
        assert_eq!(layout.placements[1].x, 50.0);
        assert_eq!(layout.placements[1].y, 0.0);
        assert_eq!(layout.placements[2].x, 50.0);
        assert_eq!(layout.placements[2].y, 30.0);
    }

    #[test]
    fn second_pass_with_unchanged_size_cancels() {
        let set = tiles(&[(40.0, 40.0)]);
        let mut engine = engine(0.0);
        let spec = container(100.0);

        let first = engine.run_pass(&set, &spec, false).unwrap();
        assert!(matches!(first, PassOutcome::Completed(_)));

        let second = engine.run_pass(&set, &spec, false).unwrap();
        assert_eq!(second, PassOutcome::Cancelled);

        // A forced pass recomputes, deterministically.
        let forced = completed(engine.run_pass(&set, &spec, true).unwrap());
        assert_eq!(forced, completed(engine.run_pass(&set, &spec, true).unwrap()));
    }

    #[test]
    fn resize_runs_a_fresh_pass() {
        let set = tiles(&[(60.0, 20.0), (60.0, 20.0)]);
        let mut engine = engine(0.0);

        let wide = completed(engine.run_pass(&set, &container(140.0), false).unwrap());
        assert_eq!(wide.placements[1].y, 0.0);

        let narrow = completed(engine.run_pass(&set, &container(100.0), false).unwrap());
        assert_eq!(narrow.placements[1].x, 0.0);
        assert_eq!(narrow.placements[1].y, 20.0);
    }

    #[test]
    fn hidden_items_pack_as_if_absent() {
        let mut set = tiles(&[(50.0, 50.0), (50.0, 70.0), (50.0, 30.0)]);
        set.set_hidden("tile-1", true).unwrap();
        let mut engine = engine(0.0);

        let layout = completed(engine.run_pass(&set, &container(100.0), false).unwrap());

        assert_eq!(layout.stats.items_placed, 2);
        assert_eq!(layout.stats.items_hidden, 1);
        assert_eq!(layout.placements.len(), 2);
        assert_eq!(layout.placements[0].id, "tile-0");
        assert_eq!(layout.placements[1].id, "tile-2");
        // tile-2 slides into the spot the hidden tile would have taken.
        assert_eq!((layout.placements[1].x, layout.placements[1].y), (50.0, 0.0));
        assert_eq!(layout.flex_size, 50.0);
    }

    #[test]
    fn empty_collection_yields_the_trivial_flex_size() {
        let set = TileSet::new();
        let mut engine = engine(0.0);

        let layout = completed(
            engine
                .run_pass(&set, &container(100.0).with_padding(10.0, 10.0), false)
                .unwrap(),
        );
        assert!(layout.placements.is_empty());
        assert_eq!(layout.flex_size, 0.0);
    }

    #[test]
    fn padding_offsets_the_seed_slot_but_not_the_flex_size() {
        let set = tiles(&[(50.0, 50.0)]);
        let mut engine = engine(0.0);

        let layout = completed(
            engine
                .run_pass(&set, &container(100.0).with_padding(8.0, 12.0), false)
                .unwrap(),
        );

        assert_eq!((layout.placements[0].x, layout.placements[0].y), (8.0, 12.0));
        assert_eq!(layout.flex_size, 50.0);
    }

    #[test]
    fn fixed_axis_height_swaps_screen_coordinates() {
        let set = tiles(&[(60.0, 20.0), (60.0, 20.0)]);
        let mut engine = LayoutEngine::new(EngineConfig {
            fixed_axis: FixedAxis::Height,
            gutter: 0.0,
        });

        let layout = completed(engine.run_pass(&set, &container(100.0), false).unwrap());

        // Fixed coordinate maps to screen y, flex to screen x.
        assert_eq!((layout.placements[0].x, layout.placements[0].y), (0.0, 0.0));
        assert_eq!((layout.placements[1].x, layout.placements[1].y), (20.0, 0.0));
        assert_eq!(layout.flex_size, 40.0);
    }

    #[test]
    fn all_placements_respect_the_fixed_axis_bound() {
        let set = tiles(&[
            (80.0, 30.0),
            (40.0, 55.0),
            (100.0, 25.0),
            (60.0, 40.0),
            (20.0, 20.0),
        ]);
        let mut engine = engine(4.0);

        let layout = completed(engine.run_pass(&set, &container(240.0), false).unwrap());

        let widths = [80.0, 40.0, 100.0, 60.0, 20.0];
        for (placement, width) in layout.placements.iter().zip(widths) {
            assert!(
                placement.x + width <= 240.0,
                "{} exceeds the container",
                placement.id
            );
        }
    }

    #[test]
    fn oversized_item_aborts_the_pass() {
        let set = tiles(&[(150.0, 20.0)]);
        let mut engine = engine(0.0);
        let spec = container(100.0);

        let err = engine.run_pass(&set, &spec, false).unwrap_err();
        assert!(matches!(err, LayoutError::NoViableSlot { .. }));

        // The failed pass did not record the size: the next call re-runs
        // (and fails again) instead of cancelling.
        let err = engine.run_pass(&set, &spec, false).unwrap_err();
        assert!(matches!(err, LayoutError::NoViableSlot { .. }));
    }

    #[test]
    fn negative_measurement_is_rejected_before_placement() {
        let mut set = TileSet::new();
        set.push("bad", Measurement::new(-1.0, 10.0));
        let mut engine = engine(0.0);

        let err = engine.run_pass(&set, &container(100.0), false).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::InvalidMeasurement { id, .. } if id == "bad"
        ));

        set.push("bad", Measurement::new(10.0, f64::NAN));
        let err = engine.run_pass(&set, &container(100.0), false).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidMeasurement { .. }));
    }

    #[test]
    fn non_finite_container_size_is_rejected() {
        let set = tiles(&[(10.0, 10.0)]);
        let mut engine = engine(0.0);

        let err = engine
            .run_pass(&set, &container(f64::NAN), false)
            .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidContainer(_)));
    }

    struct RecordingHook {
        seen: Arc<Mutex<Vec<&'static str>>>,
        abort_at_items: bool,
    }

    impl PassHook for RecordingHook {
        fn name(&self) -> &str {
            "test.recorder"
        }

        fn before_measure(&mut self, _ctx: &mut PassContext<'_>) -> crate::error::Result<()> {
            self.seen.lock().unwrap().push("before_measure");
            Ok(())
        }

        fn before_items(&mut self, ctx: &mut PassContext<'_>) -> crate::error::Result<()> {
            self.seen.lock().unwrap().push("before_items");
            if self.abort_at_items {
                ctx.request_abort();
            }
            Ok(())
        }

        fn before_placement(&mut self, _ctx: &mut PassContext<'_>) -> crate::error::Result<()> {
            self.seen.lock().unwrap().push("before_placement");
            Ok(())
        }

        fn after_completion(
            &mut self,
            _ctx: &mut PassContext<'_>,
            _layout: &Layout,
        ) -> crate::error::Result<()> {
            self.seen.lock().unwrap().push("after_completion");
            Ok(())
        }

        fn on_cancelled(&mut self, _ctx: &mut PassContext<'_>) -> crate::error::Result<()> {
            self.seen.lock().unwrap().push("on_cancelled");
            Ok(())
        }
    }

    #[test]
    fn hooks_fire_in_milestone_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = tiles(&[(40.0, 40.0)]);
        let mut engine = engine(0.0);
        engine.add_hook(RecordingHook {
            seen: Arc::clone(&seen),
            abort_at_items: false,
        });
        let spec = container(100.0);

        engine.run_pass(&set, &spec, false).unwrap();
        engine.run_pass(&set, &spec, false).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "before_measure",
                "before_items",
                "before_placement",
                "after_completion",
                "before_measure",
                "on_cancelled",
            ]
        );
    }

    #[test]
    fn hook_abort_interrupts_the_pass() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = tiles(&[(40.0, 40.0)]);
        let mut engine = engine(0.0);
        engine.add_hook(RecordingHook {
            seen: Arc::clone(&seen),
            abort_at_items: true,
        });
        let spec = container(100.0);

        let outcome = engine.run_pass(&set, &spec, false).unwrap();
        assert_eq!(outcome, PassOutcome::Interrupted);
        assert!(!seen.lock().unwrap().contains(&"before_placement"));
    }

    #[test]
    fn pass_start_clears_a_stale_cancel_token() {
        let set = tiles(&[(40.0, 40.0), (40.0, 40.0)]);
        let mut engine = engine(0.0);
        let token = engine.cancel_token();
        token.cancel();

        // The token abandons the *current* pass only; a trip left over from
        // an earlier pass must not leak into this one.
        let outcome = engine.run_pass(&set, &container(100.0), false).unwrap();
        assert!(matches!(outcome, PassOutcome::Completed(_)));
    }
}
