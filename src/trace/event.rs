use serde::{Serialize, Deserialize};

/// Classification tag attached to every emitted event.
///
/// `Start`/`In`/`Out` mark an element crossing a stage boundary, `End`/`Nop`
/// are the reduction tracer's effect verdict, `Condition`/`Access` come from
/// the secondary probes. Wire strings match the visualizer protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Start,
    In,
    Out,
    End,
    Nop,
    Condition,
    Access,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Start => "START",
            Direction::In => "IN",
            Direction::Out => "OUT",
            Direction::End => "END",
            Direction::Nop => "NOP",
            Direction::Condition => "CONDITION",
            Direction::Access => "ACCESS",
        }
    }
}

/// The probed value, one variant per supported element kind plus a generic
/// object variant. Object elements carry a rendered representation because
/// events own their data once they leave the emitting thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Text(String),
    Object(String),
}

impl ElementValue {
    /// Display form used by the recorder's value column.
    pub fn render(&self) -> String {
        match self {
            ElementValue::Bool(b) => b.to_string(),
            ElementValue::Int(n) => n.to_string(),
            ElementValue::Float(f) => f.to_string(),
            ElementValue::Char(c) => c.to_string(),
            ElementValue::Text(s) => s.clone(),
            ElementValue::Object(repr) => repr.clone(),
        }
    }
}

/// One probed occurrence, emitted once per probe/accumulate call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub direction: Direction,
    pub element: ElementValue,
    /// Human-readable label of the pipeline stage ("filter", "sum", ...).
    pub operation: String,
    /// Stable id of the stage within its pipeline, assigned at probe insertion.
    pub operation_id: i32,
    /// Identifies the pipeline execution instance.
    pub stream_id: i32,
    /// Static parameter descriptor of the stage, e.g. the lambda source text.
    pub param: String,
    /// Optional rendering of the emitting value's current state.
    pub snapshot: Option<String>,
}
