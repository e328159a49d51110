// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Routing `tracing` events through a [`Logger`].
//!
//! [`EngineLayer`] lets code that logs with the `tracing` macros share the
//! same outputs, encoding and decoration fields as code holding a logger.

use crate::engine::{Caller, Level};
use crate::field::Field;
use crate::logger::Logger;
use std::fmt;
use tracing::field::{Field as TracingField, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, Layer};

/// A `tracing_subscriber` layer that writes every event as a record of
/// `logger`.
///
/// The event's `message` becomes the record message and its other fields
/// follow the logger's own fields. The engine emits on its own dispatcher,
/// so its records never come back through this layer.
#[derive(Debug, Clone)]
pub struct EngineLayer {
    logger: Logger,
}

impl EngineLayer {
    /// Create a layer writing through `logger`
    pub fn new(logger: Logger) -> Self {
        EngineLayer { logger }
    }
}

impl<S: Subscriber> Layer<S> for EngineLayer {
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: LayerContext<'_, S>) -> bool {
        self.logger
            .engine()
            .enabled(Level::from(metadata.level()))
    }

    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let caller = metadata
            .file()
            .zip(metadata.line())
            .map(|(file, line)| Caller { file, line });

        self.logger.write(
            Level::from(metadata.level()),
            &visitor.message,
            caller,
            &visitor.fields,
        );
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: Vec<Field>,
}

impl EventVisitor {
    fn push(&mut self, field: &TracingField, value: impl serde::Serialize) {
        self.fields.push(Field::new(field.name(), value));
    }
}

impl Visit for EventVisitor {
    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.push(field, value);
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.push(field, value);
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.push(field, value);
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.push(field, value);
    }

    fn record_str(&mut self, field: &TracingField, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push(field, value);
        }
    }

    fn record_error(&mut self, field: &TracingField, value: &(dyn std::error::Error + 'static)) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push(field, format!("{:?}", value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::output::AddSync;
    use crate::{args, Context};
    use ctxlog_test_utils::{FailingWriter, SharedBuffer};
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    fn buffer_logger(level: Level) -> (Logger, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let engine = Engine::builder()
            .with_level(level)
            .with_output("buffer", AddSync(buffer.clone()))
            .build();
        (Logger::from_engine(engine), buffer)
    }

    #[test]
    fn test_event_becomes_record() {
        let (logger, buffer) = buffer_logger(Level::Info);
        let subscriber = Registry::default().with(EngineLayer::new(logger));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(user = "alice", attempts = 3_u64, ok = true, "signed in as {}", "alice");
        });

        let records = buffer.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["message"], "signed in as alice");
        assert_eq!(records[0]["user"], "alice");
        assert_eq!(records[0]["attempts"], 3);
        assert_eq!(records[0]["ok"], true);
        assert!(records[0]["caller"].as_str().unwrap().contains("layer.rs"));
    }

    #[test]
    fn test_event_carries_decoration_fields() {
        let (logger, buffer) = buffer_logger(Level::Info);
        let ctx = crate::request::with_request(
            &Context::new(),
            &http::Request::builder()
                .header("X-Request-ID", "r1")
                .body(())
                .unwrap(),
        );
        let decorated = logger.with(Some(&ctx), args!["component", "billing"]);
        let subscriber = Registry::default().with(EngineLayer::new(decorated));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("slow upstream");
        });

        let record = &buffer.records()[0];
        assert_eq!(record["level"], "warn");
        assert_eq!(record["RequestID"], "r1");
        assert_eq!(record["component"], "billing");
    }

    #[test]
    fn test_levels_below_minimum_are_skipped() {
        let (logger, buffer) = buffer_logger(Level::Warn);
        let subscriber = Registry::default().with(EngineLayer::new(logger));

        tracing::subscriber::with_default(subscriber, || {
            tracing::trace!("trace");
            tracing::debug!("debug");
            tracing::info!("info");
            tracing::error!("error");
        });

        let records = buffer.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["message"], "error");
    }

    #[test]
    fn test_failing_output_does_not_block_others() {
        let buffer = SharedBuffer::new();
        let engine = Engine::builder()
            .with_output("broken", AddSync(FailingWriter))
            .with_output("buffer", AddSync(buffer.clone()))
            .build();
        let subscriber = Registry::default().with(EngineLayer::new(Logger::from_engine(engine)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("first");
            tracing::info!("second");
        });

        let messages: Vec<String> = buffer
            .records()
            .iter()
            .map(|r| r["message"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn test_event_fields_cannot_replace_record_keys() {
        let (logger, buffer) = buffer_logger(Level::Info);
        let subscriber = Registry::default().with(EngineLayer::new(logger));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(level = "info", caller = "spoofed.rs:1", "real failure");
        });

        let record = &buffer.records()[0];
        assert_eq!(record["level"], "error");
        assert!(record["caller"].as_str().unwrap().contains("layer.rs"));
        assert_eq!(record["fields.level"], "info");
        assert_eq!(record["fields.caller"], "spoofed.rs:1");
    }
}
