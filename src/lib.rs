pub mod trace;
pub mod reduce;
pub mod probe;

// Re-export the entry points nearly every caller touches
pub use reduce::tracer::wrap;
pub use trace::channel::TraceChannel;
