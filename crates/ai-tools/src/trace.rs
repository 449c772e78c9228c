#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A small, allocation-friendly trace event.
///
/// This is intentionally "dumb data" so it can be recorded during simulation and later rendered
/// by tooling. `a` and `b` are tag-specific payloads (agent ids, state symbols, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    pub turn: u64,
    pub tag: Cow<'static, str>,
    pub a: u64,
    pub b: u64,
}

impl TraceEvent {
    pub fn new(turn: u64, tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            turn,
            tag: tag.into(),
            a: 0,
            b: 0,
        }
    }

    pub fn with_a(mut self, a: u64) -> Self {
        self.a = a;
        self
    }

    pub fn with_b(mut self, b: u64) -> Self {
        self.b = b;
        self
    }
}

pub trait TraceSink {
    fn emit(&mut self, event: TraceEvent);
}

#[derive(Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn emit(&mut self, _event: TraceEvent) {}
}

#[derive(Debug, Default)]
pub struct VecTraceSink {
    pub events: Vec<TraceEvent>,
}

impl VecTraceSink {
    pub fn count(&self, tag: &str) -> usize {
        self.events.iter().filter(|e| e.tag == tag).count()
    }
}

impl TraceSink for VecTraceSink {
    fn emit(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}

/// Shared sink: lets the caller keep a handle while a tree or tracker owns the other.
impl<S: TraceSink> TraceSink for Rc<RefCell<S>> {
    fn emit(&mut self, event: TraceEvent) {
        self.borrow_mut().emit(event);
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}

impl TraceSink for TraceLog {
    fn emit(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Optional sink slot carried by traced components. Emitting into an empty tracer is free.
#[derive(Default)]
pub struct Tracer {
    sink: Option<Box<dyn TraceSink>>,
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("enabled", &self.sink.is_some())
            .finish()
    }
}

impl Tracer {
    pub fn new(sink: impl TraceSink + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn emit(&mut self, event: TraceEvent) {
        if let Some(sink) = self.sink.as_mut() {
            sink.emit(event);
        }
    }

    /// Emit lazily, so disabled tracers skip building the event.
    pub fn emit_with(&mut self, make: impl FnOnce() -> TraceEvent) {
        if let Some(sink) = self.sink.as_mut() {
            sink.emit(make());
        }
    }
}
