use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};
use serde_json::json;

use crate::error::Result;
use crate::geometry::Size;
use crate::layout::{Layout, LayoutEngine, PassOutcome};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::PassMetrics;
use crate::registry::{ContainerSpec, ItemId, PlacementRegistry, TileSet};

pub mod audit;
pub mod diagnostics;
pub mod driver;

use audit::{AuditEventBuilder, AuditStage, NullPassAudit, PassAudit};

/// Configuration knobs for the runtime loop.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Interval between synthetic tick events in the live loop.
    pub tick_interval: Duration,
    /// Repack when the container resizes. Disabled, resize events still
    /// update the container size for the next forced pass.
    pub repack_on_resize: bool,
    /// Optional structured logger used by the runtime.
    pub logger: Option<Logger>,
    /// Metrics accumulator used for periodic snapshots.
    pub metrics: Option<Arc<Mutex<PassMetrics>>>,
    /// Interval between metrics snapshot emissions. Zero disables snapshots.
    pub metrics_interval: Duration,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(200),
            repack_on_resize: true,
            logger: None,
            metrics: None,
            metrics_interval: Duration::from_secs(5),
            metrics_target: "cobble::runtime.metrics".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(PassMetrics::new())));
        }
    }

    /// Disable metrics collection and prevent further snapshots.
    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<PassMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// High-level events driving the runtime.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    Tick { elapsed: Duration },
    /// The container (terminal) changed size.
    Resize(Size),
    /// Caller-forced re-layout regardless of the size check.
    Refresh,
    Key(KeyEvent),
    Raw(CrosstermEvent),
}

/// Receives every committed layout together with the ids that moved.
pub trait LayoutSink: Send {
    fn apply(&mut self, layout: &Layout, moved: &[ItemId]) -> Result<()>;
}

/// Event-driven orchestrator: owns the engine, the tile collection, and
/// the placement registry, and turns resize/refresh/tick events into
/// passes. One runtime drives one container; independent containers get
/// independent runtimes.
pub struct LayoutRuntime {
    engine: LayoutEngine,
    tiles: TileSet,
    container: ContainerSpec,
    placements: PlacementRegistry,
    config: RuntimeConfig,
    sink: Option<Box<dyn LayoutSink>>,
    audit: Box<dyn PassAudit>,
    last_fingerprint: Option<blake3::Hash>,
    should_exit: bool,
    start_instant: Option<Instant>,
    last_metrics_emit: Option<Instant>,
}

impl LayoutRuntime {
    pub fn new(engine: LayoutEngine, tiles: TileSet, container: ContainerSpec) -> Self {
        Self {
            engine,
            tiles,
            container,
            placements: PlacementRegistry::new(),
            config: RuntimeConfig::default(),
            sink: None,
            audit: Box::new(NullPassAudit),
            last_fingerprint: None,
            should_exit: false,
            start_instant: None,
            last_metrics_emit: None,
        }
    }

    pub fn config_mut(&mut self) -> &mut RuntimeConfig {
        &mut self.config
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut LayoutEngine {
        &mut self.engine
    }

    pub fn tiles(&self) -> &TileSet {
        &self.tiles
    }

    /// Mutable access to the tile collection. Changes are picked up by the
    /// next refresh, or by the next tick via the fingerprint check.
    pub fn tiles_mut(&mut self) -> &mut TileSet {
        &mut self.tiles
    }

    pub fn placements(&self) -> &PlacementRegistry {
        &self.placements
    }

    pub fn set_sink<S>(&mut self, sink: S)
    where
        S: LayoutSink + 'static,
    {
        self.sink = Some(Box::new(sink));
    }

    pub fn set_audit<A>(&mut self, audit: A)
    where
        A: PassAudit + 'static,
    {
        self.audit = Box::new(audit);
    }

    /// Feed one resize notification. Convenience wrapper over `dispatch`.
    pub fn resize(&mut self, size: Size) -> Result<()> {
        self.dispatch(RuntimeEvent::Resize(size))
    }

    /// Advance the runtime by a single event. Embedders with their own
    /// event loop call this instead of `run`/`run_scripted`.
    pub fn dispatch(&mut self, event: RuntimeEvent) -> Result<()> {
        match &event {
            RuntimeEvent::Resize(size) => {
                let fixed = self.engine.config().fixed_axis.fixed_cells(*size) as f64;
                self.container.fixed_size = fixed;
                if self.config.repack_on_resize {
                    self.repack(false, "resize")?;
                }
            }
            RuntimeEvent::Refresh => {
                self.repack(true, "refresh")?;
            }
            RuntimeEvent::Tick { .. } => {
                if self.collection_changed() {
                    self.audit.record(
                        AuditEventBuilder::new(AuditStage::CollectionChanged)
                            .detail("tiles", json!(self.tiles.len()))
                            .finish(),
                    );
                    self.repack(true, "collection_changed")?;
                }
            }
            RuntimeEvent::Key(key) => {
                if key.kind == KeyEventKind::Press
                    && matches!(key.code, KeyCode::Esc | KeyCode::Char('q'))
                {
                    self.should_exit = true;
                    self.log_runtime_event(LogLevel::Info, "exit_requested", std::iter::empty());
                }
            }
            RuntimeEvent::Raw(_) => {}
        }

        self.log_runtime_event(
            LogLevel::Debug,
            "event_dispatched",
            [json_kv("event", json!(Self::describe_event(&event)))],
        );
        self.audit.record(
            AuditEventBuilder::new(AuditStage::EventDispatched)
                .detail("event", json!(Self::describe_event(&event)))
                .finish(),
        );
        self.maybe_emit_metrics();
        Ok(())
    }

    /// Live loop: poll terminal events, repack on resize, tick on idle.
    /// Esc or 'q' exits.
    pub fn run(&mut self) -> Result<()> {
        self.bootstrap()?;
        let mut last_tick = Instant::now();

        while !self.should_exit {
            let timeout = self
                .config
                .tick_interval
                .checked_sub(last_tick.elapsed())
                .unwrap_or(Duration::ZERO);

            if event::poll(timeout)? {
                let raw = event::read()?;
                let runtime_event = Self::map_event(raw);
                self.dispatch(runtime_event)?;
                if self.should_exit {
                    break;
                }
            }

            if last_tick.elapsed() >= self.config.tick_interval {
                let now = Instant::now();
                let elapsed = now.duration_since(last_tick);
                last_tick = now;
                self.dispatch(RuntimeEvent::Tick { elapsed })?;
            }
        }

        self.finalize();
        Ok(())
    }

    /// Deterministic replay of a prepared event sequence. Used by tests
    /// and benches; no terminal required.
    pub fn run_scripted<I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = RuntimeEvent>,
    {
        self.bootstrap()?;
        for event in events.into_iter() {
            self.dispatch(event)?;
            if self.should_exit {
                break;
            }
        }
        self.finalize();
        Ok(())
    }

    fn bootstrap(&mut self) -> Result<()> {
        self.should_exit = false;
        let now = Instant::now();
        self.start_instant = Some(now);
        self.last_metrics_emit = Some(now);
        if self.config.metrics.is_none() && self.config.metrics_interval > Duration::ZERO {
            self.config.metrics = Some(Arc::new(Mutex::new(PassMetrics::new())));
        }

        self.log_runtime_event(
            LogLevel::Info,
            "runtime_started",
            [
                json_kv("tiles", json!(self.tiles.len())),
                json_kv("fixed_size", json!(self.container.fixed_size)),
            ],
        );
        self.audit.record(
            AuditEventBuilder::new(AuditStage::RuntimeStarted)
                .detail("tiles", json!(self.tiles.len()))
                .finish(),
        );

        // Initial pass so callers see a layout before the first event.
        self.repack(true, "bootstrap")
    }

    fn finalize(&mut self) {
        let uptime_ms = self
            .start_instant
            .map(|start| start.elapsed().as_millis())
            .unwrap_or(0);
        self.log_runtime_event(
            LogLevel::Info,
            "runtime_stopped",
            [json_kv("uptime_ms", json!(uptime_ms))],
        );
        self.audit
            .record(AuditEventBuilder::new(AuditStage::RuntimeStopped).finish());
    }

    fn repack(&mut self, force: bool, trigger: &'static str) -> Result<()> {
        match self.engine.run_pass(&self.tiles, &self.container, force)? {
            PassOutcome::Completed(layout) => {
                let moved = self.placements.sync(&layout);
                if let Some(sink) = self.sink.as_mut() {
                    sink.apply(&layout, &moved)?;
                }
                if let Some(metrics) = self.config.metrics.as_ref() {
                    if let Ok(mut guard) = metrics.lock() {
                        guard.record_completed(
                            layout.stats.items_placed,
                            layout.stats.items_hidden,
                            layout.stats.slots_swept,
                        );
                    }
                }
                self.log_runtime_event(
                    LogLevel::Info,
                    "pass_completed",
                    [
                        json_kv("trigger", json!(trigger)),
                        json_kv("items", json!(layout.stats.items_placed)),
                        json_kv("moved", json!(moved.len())),
                        json_kv("flex_size", json!(layout.flex_size)),
                    ],
                );
                self.audit.record(
                    AuditEventBuilder::new(AuditStage::PassCompleted)
                        .detail("trigger", json!(trigger))
                        .detail("moved", json!(moved.len()))
                        .finish(),
                );
            }
            PassOutcome::Cancelled => {
                if let Some(metrics) = self.config.metrics.as_ref() {
                    if let Ok(mut guard) = metrics.lock() {
                        guard.record_cancelled();
                    }
                }
                self.log_runtime_event(
                    LogLevel::Debug,
                    "pass_cancelled",
                    [json_kv("trigger", json!(trigger))],
                );
                self.audit.record(
                    AuditEventBuilder::new(AuditStage::PassCancelled)
                        .detail("trigger", json!(trigger))
                        .finish(),
                );
            }
            PassOutcome::Interrupted => {
                if let Some(metrics) = self.config.metrics.as_ref() {
                    if let Ok(mut guard) = metrics.lock() {
                        guard.record_interrupted();
                    }
                }
                self.log_runtime_event(
                    LogLevel::Warn,
                    "pass_interrupted",
                    [json_kv("trigger", json!(trigger))],
                );
                self.audit.record(
                    AuditEventBuilder::new(AuditStage::PassInterrupted)
                        .detail("trigger", json!(trigger))
                        .finish(),
                );
            }
        }

        self.last_fingerprint = Some(self.tiles.fingerprint());
        Ok(())
    }

    fn collection_changed(&self) -> bool {
        self.last_fingerprint
            .is_some_and(|fingerprint| fingerprint != self.tiles.fingerprint())
    }

    fn map_event(event: CrosstermEvent) -> RuntimeEvent {
        match event {
            CrosstermEvent::Resize(width, height) => RuntimeEvent::Resize(Size::new(width, height)),
            CrosstermEvent::Key(key) => RuntimeEvent::Key(key),
            other => RuntimeEvent::Raw(other),
        }
    }

    fn log_runtime_event<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, "cobble::runtime", message, fields);
            let _ = logger.log_event(event);
        }
    }

    fn maybe_emit_metrics(&mut self) {
        let interval = self.config.metrics_interval;
        if interval == Duration::ZERO {
            return;
        }
        let (Some(logger), Some(metrics)) =
            (self.config.logger.as_ref(), self.config.metrics.as_ref())
        else {
            return;
        };

        let now = Instant::now();
        if let Some(last) = self.last_metrics_emit {
            if now.duration_since(last) < interval {
                return;
            }
        }
        self.last_metrics_emit = Some(now);

        let uptime = self
            .start_instant
            .map_or(Duration::ZERO, |start| now.duration_since(start));
        if let Ok(guard) = metrics.lock() {
            let snapshot = guard.snapshot(uptime);
            let _ = logger.log_event(snapshot.to_log_event(&self.config.metrics_target));
        }
    }

    fn describe_event(event: &RuntimeEvent) -> &'static str {
        match event {
            RuntimeEvent::Tick { .. } => "tick",
            RuntimeEvent::Resize(_) => "resize",
            RuntimeEvent::Refresh => "refresh",
            RuntimeEvent::Key(_) => "key",
            RuntimeEvent::Raw(_) => "raw",
        }
    }
}
