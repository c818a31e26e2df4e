//! Performance timing for Trellis.
//!
//! Recording is off by default and costs one relaxed atomic load per scope
//! while disabled. Once enabled, every scope pushes a start and an end event
//! into a global list that can be exported for Chrome's tracing tool.

use std::io::Write;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use ecow::{EcoString, EcoVec};
use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use serde::ser::SerializeSeq;

/// Creates a timing scope around an expression.
///
/// The output of the expression is returned. An optional `detail` is
/// recorded as an event argument.
///
/// ```ignore
/// timed!("identity transform", transform(&tree));
/// timed!("rune", detail = "Hint", rewrite(&node));
/// ```
#[macro_export]
macro_rules! timed {
    ($name:expr, detail = $detail:expr, $body:expr $(,)?) => {{
        let __scope = $crate::TimingScope::new($name).map(|s| s.with_detail($detail).build());
        $body
    }};
    ($name:expr, $body:expr $(,)?) => {{
        let __scope = $crate::TimingScope::new($name).map(|s| s.build());
        $body
    }};
}

thread_local! {
    /// A small, stable identifier for the current thread.
    static THREAD_ID: u64 = {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    };
}

/// Whether the timer is enabled. Defaults to `false`.
static ENABLED: AtomicBool = AtomicBool::new(false);

/// The list of collected events.
static EVENTS: Mutex<Vec<Event>> = Mutex::new(Vec::new());

/// The reference point for event timestamps.
static EPOCH: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Enable the timer.
#[inline]
pub fn enable() {
    LazyLock::force(&EPOCH);
    ENABLED.store(true, Ordering::Relaxed);
}

/// Disable the timer. Already recorded events are kept.
#[inline]
pub fn disable() {
    ENABLED.store(false, Ordering::Relaxed);
}

/// Whether the timer is enabled.
#[inline]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Clears the recorded events.
#[inline]
pub fn clear() {
    EVENTS.lock().clear();
}

/// The number of recorded events.
pub fn event_count() -> usize {
    EVENTS.lock().len()
}

/// Export the recorded events as JSON for Chrome's tracing tool.
pub fn export_json<W: Write>(writer: W) -> Result<(), EcoString> {
    #[derive(Serialize)]
    struct Entry<'a> {
        name: &'static str,
        cat: &'static str,
        ph: &'static str,
        ts: f64,
        pid: u64,
        tid: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        args: Option<Args<'a>>,
    }

    #[derive(Serialize)]
    struct Args<'a> {
        detail: &'a str,
    }

    let events = EVENTS.lock();
    let mut serializer = serde_json::Serializer::new(writer);
    let mut seq = serializer
        .serialize_seq(Some(events.len()))
        .map_err(|e| ecow::eco_format!("failed to serialize events: {e}"))?;

    for event in events.iter() {
        seq.serialize_element(&Entry {
            name: event.name,
            cat: "trellis",
            ph: match event.kind {
                EventKind::Start => "B",
                EventKind::End => "E",
            },
            ts: event.micros,
            pid: 1,
            tid: event.thread_id,
            args: event.detail.as_deref().map(|detail| Args { detail }),
        })
        .map_err(|e| ecow::eco_format!("failed to serialize event: {e}"))?;
    }

    seq.end().map_err(|e| ecow::eco_format!("failed to serialize events: {e}"))
}

/// A scope that records an event when it is dropped.
#[must_use]
pub struct TimingScope {
    name: &'static str,
    detail: Option<EcoString>,
}

impl TimingScope {
    /// Create a new scope if timing is enabled.
    #[inline]
    pub fn new(name: &'static str) -> Option<Self> {
        is_enabled().then_some(Self { name, detail: None })
    }

    /// Attach a detail, like the component type being transformed.
    pub fn with_detail(mut self, detail: impl Into<EcoString>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Record the start event and return a guard that records the end.
    pub fn build(self) -> TimingScopeGuard {
        let event = Event {
            kind: EventKind::Start,
            micros: now_micros(),
            name: self.name,
            detail: self.detail,
            thread_id: THREAD_ID.with(|id| *id),
        };
        EVENTS.lock().push(event.clone());
        TimingScopeGuard { start: Some(event) }
    }
}

/// Records the end of a scope when dropped.
pub struct TimingScopeGuard {
    start: Option<Event>,
}

impl Drop for TimingScopeGuard {
    fn drop(&mut self) {
        if let Some(mut event) = self.start.take() {
            event.kind = EventKind::End;
            event.micros = now_micros();
            EVENTS.lock().push(event);
        }
    }
}

/// An event that has been recorded.
#[derive(Clone)]
struct Event {
    /// Whether this is a start or end event.
    kind: EventKind,
    /// Microseconds since the timer was first enabled.
    micros: f64,
    /// The name of the scope.
    name: &'static str,
    /// An optional argument shown next to the name.
    detail: Option<EcoString>,
    /// The thread the event was recorded on.
    thread_id: u64,
}

/// Whether an event marks the start or end of a scope.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum EventKind {
    Start,
    End,
}

fn now_micros() -> f64 {
    EPOCH.elapsed().as_nanos() as f64 / 1_000.0
}

/// Names of the events currently recorded, in order. Used by tests across
/// the workspace to check instrumentation.
pub fn recorded_names() -> EcoVec<&'static str> {
    EVENTS.lock().iter().map(|event| event.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing() {
        // Disabled: nothing is recorded and the body still runs.
        let out = timed!("disabled scope", 1 + 1);
        assert_eq!(out, 2);
        assert!(!recorded_names().contains(&"disabled scope"));

        enable();
        let out = timed!("enabled scope", detail = "Hint", "done");
        assert_eq!(out, "done");
        disable();

        let names = recorded_names();
        assert_eq!(names.iter().filter(|&&n| n == "enabled scope").count(), 2);

        let mut buf = Vec::new();
        export_json(&mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let entries = json.as_array().unwrap();
        assert!(entries.iter().any(|e| e["name"] == "enabled scope"
            && e["ph"] == "B"
            && e["args"]["detail"] == "Hint"));
    }
}
