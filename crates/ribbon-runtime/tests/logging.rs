#![forbid(unsafe_code)]

//! Log output of scale passes.
//!
//! Run:
//!   cargo test -p ribbon-runtime --test logging

use std::sync::{Arc, Mutex};

use ribbon_core::geometry::Size;
use ribbon_harness::{SyntheticHost, home_tab};
use ribbon_runtime::{Ribbon, RibbonConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone)]
struct Captured {
    level: tracing::Level,
    message: String,
    span: Option<String>,
}

struct Capture(Arc<Mutex<Vec<Captured>>>);

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        let span = ctx
            .event_span(event)
            .map(|s| s.name().to_string());
        self.0.lock().unwrap().push(Captured {
            level: *event.metadata().level(),
            message: visitor.0,
            span,
        });
    }
}

fn capture<F: FnOnce()>(f: F) -> Vec<Captured> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(Capture(Arc::clone(&events)));
    tracing::subscriber::with_default(subscriber, f);
    let out = events.lock().unwrap().clone();
    out
}

#[test]
fn no_room_is_a_warning_inside_the_scale_span() {
    let events = capture(|| {
        let mut ribbon = Ribbon::from_definitions(RibbonConfig::default(), &[home_tab()]).unwrap();
        let mut host = SyntheticHost::new(Size::new(150, 120));
        ribbon.scale(&mut host).unwrap();
    });
    let no_room: Vec<_> = events
        .iter()
        .filter(|e| e.level == tracing::Level::WARN && e.message.starts_with("no room"))
        .collect();
    assert_eq!(no_room.len(), 1);
    assert_eq!(no_room[0].span.as_deref(), Some("ribbon.scale"));
}

#[test]
fn step_warning_message_is_logged() {
    let events = capture(|| {
        let mut ribbon = Ribbon::from_definitions(RibbonConfig::default(), &[home_tab()]).unwrap();
        let mut host = SyntheticHost::new(Size::new(220, 120));
        ribbon.scale(&mut host).unwrap();
    });
    assert!(
        events
            .iter()
            .any(|e| e.level == tracing::Level::WARN && e.message == "Font group collapsed")
    );
}

#[test]
fn completed_pass_logs_evidence() {
    let events = capture(|| {
        let mut ribbon = Ribbon::from_definitions(RibbonConfig::default(), &[home_tab()]).unwrap();
        let mut host = SyntheticHost::new(Size::new(900, 120));
        ribbon.scale(&mut host).unwrap();
    });
    assert!(
        events
            .iter()
            .any(|e| e.level == tracing::Level::DEBUG && e.message == "scale pass complete")
    );
}
