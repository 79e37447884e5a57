//! Tracing utilities for asserting on what a call logs.
//!
//! [`LogCapture`] installs a layer that records every event together with
//! the name of the span it was emitted in. The pipeline's lifecycle lines
//! (`Start`, `Duration ...`, `Success (...)`) and its debug-level state
//! transitions can then be asserted on.

use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::instrument::{WithDispatch, WithSubscriber};
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

/// One captured event.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    /// Event level.
    pub level: Level,
    /// Event target (module path).
    pub target: String,
    /// Name of the span the event was emitted in.
    pub span: Option<String>,
    /// Rendered `message` field.
    pub message: String,
    /// Other field values as strings.
    pub fields: Vec<(String, String)>,
}

impl CapturedEvent {
    /// Value of a non-message field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let value = format!("{value:?}");
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }
}

struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = FieldVisitor {
            message: String::new(),
            fields: Vec::new(),
        };
        event.record(&mut visitor);

        let span = ctx.event_span(event).map(|span| span.name().to_string());

        self.events.lock().unwrap().push(CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            span,
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

/// Collector for captured events.
#[derive(Clone)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    dispatch: Dispatch,
}

impl Default for LogCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl LogCapture {
    /// Creates a collector with its own dispatch.
    pub fn new() -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let layer = CaptureLayer {
            events: events.clone(),
        };
        let dispatch = Dispatch::new(Registry::default().with(layer));
        Self { events, dispatch }
    }

    /// The dispatch events must be sent to.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Runs `future` with this collector as its subscriber.
    pub fn capture<F>(&self, future: F) -> WithDispatch<F> {
        future.with_subscriber(self.dispatch.clone())
    }

    /// Runs a closure with this collector as the default subscriber.
    pub fn in_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Every captured event.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Messages logged at `level`, in order.
    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.level == level)
            .map(|event| event.message.clone())
            .collect()
    }

    /// Messages logged at info level or above, in order.
    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.level <= Level::INFO)
            .map(|event| event.message.clone())
            .collect()
    }

    /// Pipeline states, in the order they were entered.
    pub fn states(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| event.field("state").map(String::from))
            .collect()
    }

    /// Clear all captured events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Assert that the given messages were logged in order, allowing other
    /// messages in between.
    pub fn assert_message_sequence(&self, expected: &[&str]) {
        let messages = self.messages();
        let mut expected_iter = expected.iter();
        let mut current_expected = expected_iter.next();

        for message in &messages {
            if let Some(exp) = current_expected
                && message == *exp
            {
                current_expected = expected_iter.next();
            }
        }

        if current_expected.is_some() {
            panic!("Expected message sequence {expected:?} but got {messages:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tracing::{debug, info, info_span, warn};

    use super::*;

    #[test]
    fn test_event_capture() {
        let capture = LogCapture::new();
        capture.in_scope(|| {
            let span = info_span!("verdict.request", method = "GET");
            let _enter = span.enter();
            info!(path = "/users", "Start");
            warn!("Failure (404)");
        });

        let events = capture.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "Start");
        assert_eq!(events[0].field("path"), Some("/users"));
        assert_eq!(events[0].span.as_deref(), Some("verdict.request"));
        assert_eq!(capture.messages_at(Level::WARN), vec!["Failure (404)"]);
    }

    #[test]
    fn test_message_sequence_skips_debug() {
        let capture = LogCapture::new();
        capture.in_scope(|| {
            info!("Start");
            debug!(state = "Calling", "verdict pipeline");
            info!("Success (200)");
        });
        assert_eq!(capture.messages(), vec!["Start", "Success (200)"]);
        assert_eq!(capture.states(), vec!["Calling"]);
        capture.assert_message_sequence(&["Start", "Success (200)"]);
    }

    #[tokio::test]
    async fn test_capture_future() {
        let capture = LogCapture::new();
        capture
            .capture(async {
                tokio::task::yield_now().await;
                info!("inside");
            })
            .await;
        assert_eq!(capture.messages(), vec!["inside"]);
    }
}
