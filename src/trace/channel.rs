use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

use super::event::{Direction, ElementValue, TraceEvent};
use super::sink::NullSink;

/// Downstream boundary of the instrumentation layer. Implementations carry
/// events towards the visualizer (buffer, socket, log); they must tolerate
/// concurrent calls from parallel partial accumulators.
pub trait EventSink: Send + Sync {
    fn record(&self, event: TraceEvent);
}

/// Cheap cloneable handle through which every probe emits.
///
/// All entry points are fire-and-forget: a sink that panics is absorbed here,
/// because instrumentation must never unwind into the pipeline it observes.
#[derive(Clone)]
pub struct TraceChannel {
    sink: Arc<dyn EventSink>,
}

impl TraceChannel {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Channel that discards everything, for uninstrumented runs.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NullSink))
    }

    /// Raw entry point. Typed variants below feed into this.
    pub fn emit(&self, event: TraceEvent) {
        let sink = &self.sink;
        if catch_unwind(AssertUnwindSafe(|| sink.record(event))).is_err() {
            warn!("trace sink panicked; event dropped");
        }
    }

    pub fn emit_bool(
        &self,
        direction: Direction,
        elem: bool,
        operation: &str,
        operation_id: i32,
        stream_id: i32,
        param: &str,
    ) {
        self.emit(make(direction, ElementValue::Bool(elem), operation, operation_id, stream_id, param, None));
    }

    pub fn emit_i64(
        &self,
        direction: Direction,
        elem: i64,
        operation: &str,
        operation_id: i32,
        stream_id: i32,
        param: &str,
    ) {
        self.emit(make(direction, ElementValue::Int(elem), operation, operation_id, stream_id, param, None));
    }

    pub fn emit_f64(
        &self,
        direction: Direction,
        elem: f64,
        operation: &str,
        operation_id: i32,
        stream_id: i32,
        param: &str,
    ) {
        self.emit(make(direction, ElementValue::Float(elem), operation, operation_id, stream_id, param, None));
    }

    pub fn emit_char(
        &self,
        direction: Direction,
        elem: char,
        operation: &str,
        operation_id: i32,
        stream_id: i32,
        param: &str,
    ) {
        self.emit(make(direction, ElementValue::Char(elem), operation, operation_id, stream_id, param, None));
    }

    pub fn emit_text(
        &self,
        direction: Direction,
        elem: &str,
        operation: &str,
        operation_id: i32,
        stream_id: i32,
        param: &str,
    ) {
        self.emit(make(direction, ElementValue::Text(elem.to_string()), operation, operation_id, stream_id, param, None));
    }

    /// Generic object variant; the only one that carries a state snapshot.
    #[allow(clippy::too_many_arguments)]
    pub fn emit_object(
        &self,
        direction: Direction,
        repr: String,
        operation: &str,
        operation_id: i32,
        stream_id: i32,
        param: &str,
        snapshot: Option<String>,
    ) {
        self.emit(make(direction, ElementValue::Object(repr), operation, operation_id, stream_id, param, snapshot));
    }
}

fn make(
    direction: Direction,
    element: ElementValue,
    operation: &str,
    operation_id: i32,
    stream_id: i32,
    param: &str,
    snapshot: Option<String>,
) -> TraceEvent {
    TraceEvent {
        direction,
        element,
        operation: operation.to_string(),
        operation_id,
        stream_id,
        param: param.to_string(),
        snapshot,
    }
}
