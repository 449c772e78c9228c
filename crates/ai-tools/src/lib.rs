//! Tooling primitives for turn-based game AI.
//!
//! This crate is intentionally lightweight and engine-agnostic. Trees and state machines emit
//! [`TraceEvent`]s through an optional [`Tracer`]; what happens to them (tests counting
//! transitions, an inspector drawing node status) is up to the sink.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{NullTraceSink, TraceEvent, TraceLog, TraceSink, Tracer, VecTraceSink};
