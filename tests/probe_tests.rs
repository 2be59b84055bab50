use std::sync::Arc;

use pipetrace::probe::{pipeline_complete, probe_condition, probe_index_access, NO_STREAM};
use pipetrace::trace::sink::CaptureSink;
use pipetrace::trace::{Direction, ElementValue, EventSink, TraceChannel, TraceEvent};

struct PanickingSink;

impl EventSink for PanickingSink {
    fn record(&self, _event: TraceEvent) {
        panic!("transport down");
    }
}

#[test]
fn test_condition_probe_is_identity() {
    let channel = TraceChannel::disabled();
    for value in [true, false] {
        assert_eq!(probe_condition(value, 7, &channel), value);
    }
}

#[test]
fn test_condition_probe_routes_through_channel() {
    let sink = Arc::new(CaptureSink::new());
    let channel = TraceChannel::new(sink.clone());

    probe_condition(true, 42, &channel);
    probe_condition(false, 42, &channel);

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].direction, Direction::Condition);
    assert_eq!(events[0].element, ElementValue::Bool(true));
    assert_eq!(events[1].element, ElementValue::Bool(false));
    assert_eq!(events[0].operation_id, 42, "condition id is the operation id");
    assert_eq!(events[0].stream_id, NO_STREAM);
}

#[test]
fn test_index_probe_is_identity() {
    let channel = TraceChannel::disabled();
    let data = [10, 20, 30];
    for index in 0..data.len() {
        assert_eq!(probe_index_access(&data, index, 0, 1, &channel), index);
    }
}

#[test]
fn test_index_probe_records_site_and_dimension() {
    let sink = Arc::new(CaptureSink::new());
    let channel = TraceChannel::new(sink.clone());
    let matrix = vec![vec![1, 2], vec![3, 4]];

    let row = probe_index_access(&matrix, 1, 3, 1, &channel);
    let col = probe_index_access(&matrix[row], 0, 3, 2, &channel);
    assert_eq!(matrix[row][col], 3);

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].direction, Direction::Access);
    assert_eq!(events[0].element, ElementValue::Int(1));
    assert_eq!(events[0].operation_id, 3, "access site id is the operation id");
    assert!(events[0].param.contains("dim=1"), "param: {}", events[0].param);
    assert!(events[1].param.contains("dim=2"), "param: {}", events[1].param);
}

#[test]
fn test_index_probe_distinguishes_containers() {
    let sink = Arc::new(CaptureSink::new());
    let channel = TraceChannel::new(sink.clone());
    let first = vec![1, 2, 3];
    let second = vec![4, 5, 6];

    probe_index_access(&first, 0, 0, 1, &channel);
    probe_index_access(&second, 0, 0, 1, &channel);

    let events = sink.events();
    assert_ne!(events[0].param, events[1].param, "distinct containers, distinct identities");
}

#[test]
fn test_probes_absorb_sink_failures() {
    let channel = TraceChannel::new(Arc::new(PanickingSink));
    assert!(probe_condition(true, 0, &channel));
    assert_eq!(probe_index_access(&[1, 2, 3], 2, 0, 1, &channel), 2);
}

#[test]
fn test_completion_marker_is_inert() {
    // Purely an insertion point; calling it any number of times does nothing.
    pipeline_complete(0);
    pipeline_complete(0);
    pipeline_complete(NO_STREAM);
}
