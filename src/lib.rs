pub mod config;
pub mod kernel;
pub mod services;

pub use config::GeneratorConfig;
pub use kernel::event_loop::{EventLoop, LoopSummary, TickHandler};
pub use kernel::ticker::{JitteredTicker, TickerStats};
pub use kernel::time::IntervalBounds;
pub use services::emitter::SpanEmitter;
pub use services::tracer::LogTracer;
