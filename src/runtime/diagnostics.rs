use serde_json::json;

use crate::error::Result;
use crate::layout::{Layout, PassContext, PassHook};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};

use super::audit::{AuditEvent, PassAudit};

/// Logs every pass milestone for observability/debugging.
pub struct LifecycleLogger {
    logger: Logger,
    level: LogLevel,
}

impl LifecycleLogger {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            level: LogLevel::Debug,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    fn emit(&self, message: &str, fields: impl IntoIterator<Item = (String, serde_json::Value)>) {
        let event = event_with_fields(self.level, "cobble::pass.lifecycle", message, fields);
        let _ = self.logger.log_event(event);
    }
}

impl PassHook for LifecycleLogger {
    fn name(&self) -> &str {
        "diagnostics.lifecycle_logger"
    }

    fn before_measure(&mut self, _ctx: &mut PassContext<'_>) -> Result<()> {
        self.emit("pass.before_measure", std::iter::empty());
        Ok(())
    }

    fn before_items(&mut self, ctx: &mut PassContext<'_>) -> Result<()> {
        let fields = ctx
            .fixed_size()
            .map(|size| json_kv("fixed_size", json!(size)))
            .into_iter();
        self.emit("pass.before_items", fields);
        Ok(())
    }

    fn before_placement(&mut self, ctx: &mut PassContext<'_>) -> Result<()> {
        let fields = ctx
            .item_count()
            .map(|count| json_kv("items", json!(count)))
            .into_iter();
        self.emit("pass.before_placement", fields);
        Ok(())
    }

    fn after_completion(&mut self, _ctx: &mut PassContext<'_>, layout: &Layout) -> Result<()> {
        self.emit(
            "pass.completed",
            [
                json_kv("items", json!(layout.stats.items_placed)),
                json_kv("hidden", json!(layout.stats.items_hidden)),
                json_kv("flex_size", json!(layout.flex_size)),
            ],
        );
        Ok(())
    }

    fn on_cancelled(&mut self, ctx: &mut PassContext<'_>) -> Result<()> {
        let fields = ctx
            .fixed_size()
            .map(|size| json_kv("fixed_size", json!(size)))
            .into_iter();
        self.emit("pass.cancelled", fields);
        Ok(())
    }
}

/// Audit sink that forwards every stage to the structured logger.
pub struct LoggingAudit {
    logger: Logger,
    target: String,
}

impl LoggingAudit {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            target: "cobble::runtime.audit".to_string(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }
}

impl PassAudit for LoggingAudit {
    fn record(&self, event: AuditEvent) {
        let log_event = event_with_fields(
            LogLevel::Debug,
            &self.target,
            &format!("{:?}", event.stage),
            event.details,
        );
        let _ = self.logger.log_event(log_event);
    }
}
