use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde::{Serialize, Deserialize};
use tracing::debug;
use uuid::Uuid;

use super::channel::EventSink;
use super::event::{Direction, TraceEvent};

const MAX_RECORDS: usize = 10_000;

/// One row of the per-session stream trace. `seq` is the visualization
/// ordering; `IN` rows carry 0 because the visualizer does not order them.
/// `element_id`/`parent_ids` track element lineage across stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecord {
    pub seq: u32,
    pub operation: String,
    pub direction: Direction,
    pub operation_id: i32,
    pub element_id: u32,
    pub parent_ids: Vec<u32>,
    pub value: String,
}

#[derive(Debug)]
struct RecorderState {
    records: VecDeque<TraceRecord>,
    /// Last non-OUT record per operation id.
    last_in_ops: HashMap<i32, TraceRecord>,
    /// IN-side rows of `sorted` stages awaiting their reordered OUT row.
    sorted_pending: Vec<TraceRecord>,
    sequence: u32,
    elements: u32,
}

impl RecorderState {
    fn new() -> Self {
        Self {
            records: VecDeque::with_capacity(MAX_RECORDS),
            last_in_ops: HashMap::new(),
            sorted_pending: Vec::new(),
            sequence: 1,
            elements: 1,
        }
    }

    fn last(&self) -> Option<TraceRecord> {
        self.records.back().cloned()
    }

    fn push(
        &mut self,
        operation: &str,
        direction: Direction,
        operation_id: i32,
        element_id: u32,
        parent_ids: Vec<u32>,
        value: String,
    ) {
        let seq = if direction == Direction::In {
            0
        } else {
            let seq = self.sequence;
            self.sequence += 1;
            seq
        };
        let record = TraceRecord {
            seq,
            operation: operation.to_string(),
            direction,
            operation_id,
            element_id,
            parent_ids,
            value,
        };
        if self.records.len() >= MAX_RECORDS {
            self.records.pop_front();
        }
        self.records.push_back(record.clone());
        if direction != Direction::Out {
            if operation == "sorted" {
                self.sorted_pending.push(record.clone());
            }
            self.last_in_ops.insert(operation_id, record);
        }
    }
}

/// Session-scoped accounting of stream trace events: sequence numbering,
/// element identity, and lineage reconstruction across reordering stages.
/// Plugs in as an [`EventSink`]; condition/access probe events are not
/// stream rows and pass through untouched.
pub struct StreamTraceRecorder {
    session: Uuid,
    state: Mutex<RecorderState>,
}

impl StreamTraceRecorder {
    pub fn new() -> Self {
        Self {
            session: Uuid::new_v4(),
            state: Mutex::new(RecorderState::new()),
        }
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn records(&self) -> Vec<TraceRecord> {
        self.lock().records.iter().cloned().collect()
    }

    pub fn clear(&self) {
        *self.lock() = RecorderState::new();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn on_start(&self, event: &TraceEvent) {
        let mut state = self.lock();
        let element_id = state.elements;
        state.elements += 1;
        state.push(
            &event.operation,
            Direction::Start,
            event.operation_id,
            element_id,
            vec![element_id],
            event.element.render(),
        );
    }

    fn on_in(&self, event: &TraceEvent) {
        let mut state = self.lock();
        let Some(last) = state.last() else {
            debug!("IN row with no preceding trace, dropped");
            return;
        };
        state.push(
            &event.operation,
            Direction::In,
            event.operation_id,
            last.element_id,
            last.parent_ids,
            event.element.render(),
        );
    }

    fn on_out(&self, event: &TraceEvent) {
        let mut state = self.lock();
        let Some(last) = state.last() else {
            debug!("OUT row with no preceding trace, dropped");
            return;
        };
        let value = event.element.render();

        // flat_map is the one-to-many stage: an OUT row with a value the IN
        // side never produced is a freshly minted element.
        let mut element_id = if event.operation == "flat_map" && last.value != value {
            let id = state.elements;
            state.elements += 1;
            id
        } else {
            last.element_id
        };
        let mut parent_ids = last.parent_ids;

        // sorted reorders elements, so the OUT row re-attaches to the
        // buffered IN row carrying the same value.
        if event.operation == "sorted" {
            if let Some(pos) = state.sorted_pending.iter().position(|r| r.value == value) {
                let matched = state.sorted_pending.remove(pos);
                element_id = matched.element_id;
                parent_ids = matched.parent_ids;
            }
        }

        state.push(&event.operation, Direction::Out, event.operation_id, element_id, parent_ids, value);
    }

    fn on_terminal(&self, event: &TraceEvent, direction: Direction) {
        let mut state = self.lock();
        match event.operation.as_str() {
            "count" => {
                let last_count = state.last_in_ops.get(&event.operation_id).cloned();
                let element_id = last_count.as_ref().map(|r| r.element_id).unwrap_or(state.elements);
                let mut parent_ids = last_count.as_ref().map(|r| r.parent_ids.clone()).unwrap_or_default();
                if let Some(last) = state.last() {
                    parent_ids.push(last.element_id);
                }
                let count = last_count
                    .and_then(|r| r.value.parse::<i64>().ok())
                    .map(|n| n + 1)
                    .unwrap_or(1);
                state.push(&event.operation, direction, event.operation_id, element_id, parent_ids, count.to_string());
            }
            "max" | "min" => {
                let Some(last) = state.last() else {
                    debug!("terminal row with no preceding trace, dropped");
                    return;
                };
                let running = state.last_in_ops.get(&event.operation_id).cloned();
                let replaces = match &running {
                    None => true,
                    Some(prev) => match (prev.value.parse::<f64>(), last.value.parse::<f64>()) {
                        (Ok(p), Ok(l)) if event.operation == "max" => p < l,
                        (Ok(p), Ok(l)) => p > l,
                        _ => true,
                    },
                };
                let winner = if replaces { last } else { running.unwrap_or(last) };
                state.push(
                    &event.operation,
                    direction,
                    event.operation_id,
                    winner.element_id,
                    winner.parent_ids,
                    winner.value,
                );
            }
            _ => {
                let value = event.element.render();
                match state.last() {
                    Some(last) => state.push(
                        &event.operation,
                        direction,
                        event.operation_id,
                        last.element_id,
                        last.parent_ids,
                        value,
                    ),
                    None => {
                        // Terminal on an empty pipeline still gets a row.
                        let element_id = state.elements;
                        state.push(&event.operation, direction, event.operation_id, element_id, Vec::new(), value);
                    }
                }
            }
        }
    }
}

impl Default for StreamTraceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for StreamTraceRecorder {
    fn record(&self, event: TraceEvent) {
        match event.direction {
            Direction::Start => self.on_start(&event),
            Direction::In => self.on_in(&event),
            Direction::Out => self.on_out(&event),
            Direction::End | Direction::Nop => self.on_terminal(&event, event.direction),
            Direction::Condition | Direction::Access => {}
        }
    }
}
