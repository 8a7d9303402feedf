//! Event sink system for observability.
//!
//! The executor reports every notable transition to an [`EventSink`] handed to
//! it explicitly, so callers and tests can observe a run without scraping logs.

mod event;
mod sink;

pub use event::ReproEvent;
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
