pub mod emitter;
pub mod tracer;
