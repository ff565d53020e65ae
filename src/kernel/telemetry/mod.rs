//! Span emission telemetry.
//!
//! Telemetry is a read-only side-effect layer. The event loop and tickers never
//! consult it; it exists for the shutdown summary and for tests.

pub mod event;
pub mod metrics;
pub mod recorder;
