use crate::trace::channel::TraceChannel;
use crate::trace::event::Direction;

/// Stream id used by probes firing outside any open pipeline.
pub const NO_STREAM: i32 = -1;

/// Records the outcome of an instrumented boolean condition and returns it
/// unchanged. Calling code continues exactly as if the probe were absent.
pub fn probe_condition(value: bool, condition_id: i32, channel: &TraceChannel) -> bool {
    channel.emit_bool(Direction::Condition, value, "condition", condition_id, NO_STREAM, "");
    value
}

/// Records an index used to access an element of an indexed container and
/// returns it unchanged. Container identity and the indexed dimension ride
/// in the param descriptor.
pub fn probe_index_access<C: ?Sized>(
    container: &C,
    index: usize,
    access_id: i32,
    dimension: i32,
    channel: &TraceChannel,
) -> usize {
    let param = format!("container={:p} dim={}", container as *const C, dimension);
    channel.emit_i64(Direction::Access, index as i64, "index_access", access_id, NO_STREAM, &param);
    index
}

/// Insertion point invoked once when a traced pipeline has run to
/// completion. Deliberately empty: downstream tooling keys on the call
/// itself, the core has no work to do here.
#[inline]
pub fn pipeline_complete(_stream_id: i32) {}
