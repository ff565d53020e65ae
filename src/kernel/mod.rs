pub mod event;
pub mod event_loop;
pub mod telemetry;
pub mod ticker;
pub mod time;
