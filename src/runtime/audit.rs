//! Runtime lifecycle audit utilities.
//!
//! Lightweight instrumentation hooks so callers can observe the major
//! transitions of `LayoutRuntime`. Records capture a stage identifier plus
//! structured metadata so downstream code can log, buffer, or visualize
//! the runtime's progression without contorting the event loop.

use std::time::SystemTime;

use serde_json::Value;

/// Distinct lifecycle checkpoints emitted by `LayoutRuntime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStage {
    /// The event loop started (scripted or live).
    RuntimeStarted,
    /// A runtime event finished propagating.
    EventDispatched,
    /// A pass completed and its layout was committed.
    PassCompleted,
    /// A pass was skipped because the fixed size had not changed.
    PassCancelled,
    /// A pass was abandoned mid-flight.
    PassInterrupted,
    /// The tile collection changed since the last committed pass.
    CollectionChanged,
    /// The event loop stopped.
    RuntimeStopped,
}

/// Structured audit entry.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub timestamp: SystemTime,
    pub stage: AuditStage,
    pub details: Vec<(String, Value)>,
}

impl AuditEvent {
    fn new(stage: AuditStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            details: Vec::new(),
        }
    }
}

/// Builder helper to append fields ergonomically.
pub struct AuditEventBuilder {
    event: AuditEvent,
}

impl AuditEventBuilder {
    pub fn new(stage: AuditStage) -> Self {
        Self {
            event: AuditEvent::new(stage),
        }
    }

    pub fn detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.event.details.push((key.into(), value));
        self
    }

    pub fn finish(self) -> AuditEvent {
        self.event
    }
}

/// Trait implemented by any audit sink.
pub trait PassAudit: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Default no-op implementation used when auditing is disabled.
#[derive(Debug, Default)]
pub struct NullPassAudit;

impl PassAudit for NullPassAudit {
    fn record(&self, _event: AuditEvent) {}
}
