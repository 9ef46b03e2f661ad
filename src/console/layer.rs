use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use super::host::Console;
use super::types::LogKind;
use crate::kernel::payload::Payload;

/// Routes `tracing` events through an instrumented console, so they show up
/// next to ordinary console output.
///
/// The engine's own diagnostics travel this path too. They are emitted while
/// the console class is in flight, so they reach the sink without being fed
/// back into the observer.
pub struct ConsoleLayer {
    console: Arc<Console>,
}

impl ConsoleLayer {
    pub fn new(console: Arc<Console>) -> Self {
        Self { console }
    }
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let kind = LogKind::from(*event.metadata().level());
        // Nowhere to report a failing sink from inside a subscriber
        let _ = self.console.emit(kind, &visitor.into_values());
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl FieldVisitor {
    fn into_values(self) -> Vec<Payload> {
        let mut values = Vec::with_capacity(2);
        if let Some(message) = self.message {
            values.push(Payload::Text(message));
        }
        if !self.fields.is_empty() {
            values.push(Payload::Json(Value::Object(self.fields)));
        }
        values
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(rendered);
        } else {
            self.fields.insert(field.name().to_string(), Value::from(rendered));
        }
    }
}
