//! Core types for the DTN log player
//!
//! This module defines the data model produced by the parser: the simulation
//! area, the declared nodes, the typed events and the time frames that make
//! up a timeline. Apart from the runtime fields of [`Node`], everything here
//! is immutable once parsed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Node identifier as written in the log
pub type NodeId = String;

/// All declared nodes, keyed by id, in declaration order
pub type Topology = IndexMap<NodeId, Node>;

/// Errors that can occur while loading or replaying a log
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("Malformed log at line {line}: {reason} (`{content}`)")]
    Format {
        /// 1-based line number in the log file
        line: usize,
        /// The offending line, trimmed
        content: String,
        /// What was wrong with it
        reason: String,
    },

    #[error("Unknown node referenced: {0}")]
    UnknownNodeReference(NodeId),

    #[error("Frame index {index} out of bounds (timeline has {len} frames)")]
    OutOfBounds { index: usize, len: usize },

    #[error("Timeline is empty")]
    EmptyTimeline,

    #[error("End of timeline reached")]
    EndOfTimeline,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Rectangle bounding the simulation space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub width: f64,
    pub height: f64,
}

/// RGB colour, one byte per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A declared network node
///
/// The static fields come from the `node=` declaration; `state` holds the
/// runtime fields mutated by the executor during replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node id
    pub nid: NodeId,
    /// Category tag (the log's `type=` field, e.g. "ferry", "relay")
    pub kind: String,
    /// Group number (0 when not declared)
    pub group: i64,
    /// Display colour
    pub color: Color,
    /// Buffer capacity, 0 means unbounded
    pub buffer_size: usize,
    /// Radii of the circular ranges drawn around the node
    pub ranges: Vec<f64>,
    /// Runtime state, starts empty
    #[serde(default)]
    pub state: NodeState,
}

impl Node {
    /// Display label used by node lists: `"{nid} [{held}/{capacity}]"`
    pub fn display_label(&self) -> String {
        format!("{} [{}/{}]", self.nid, self.state.buffer.len(), self.buffer_size)
    }

    /// Buffer fill ratio, `None` when the buffer is unbounded
    pub fn buffer_ratio(&self) -> Option<f64> {
        if self.buffer_size == 0 {
            None
        } else {
            Some(self.state.buffer.len() as f64 / self.buffer_size as f64)
        }
    }
}

/// Mutable per-node runtime fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    /// Position, absent until the first `pos` event
    pub pos: Option<(f64, f64)>,
    /// Content ids currently held
    pub buffer: Vec<String>,
    /// Planned tour through other nodes
    pub route: Vec<NodeId>,
}

/// Raw value of a `key=value` token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    /// View the value as a list; a scalar is a one-element list
    pub fn to_list(&self) -> Vec<String> {
        match self {
            FieldValue::Scalar(s) => vec![s.clone()],
            FieldValue::List(items) => items.clone(),
        }
    }

    /// View the value as text; list items are re-joined with `|`
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Scalar(s) => s.clone(),
            FieldValue::List(items) => items.join("|"),
        }
    }
}

/// Parsed `key=value` fields of one line
pub type Fields = BTreeMap<String, FieldValue>;

/// A single replay event, validated at parse time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Event {
    /// Node moved to `(x, y)`
    Pos { node: NodeId, x: f64, y: f64 },
    /// Node's planned tour replaced
    Route { node: NodeId, tour: Vec<NodeId> },
    /// Node's buffer contents replaced (empty entries are dropped on apply)
    Buffer { node: NodeId, list: Vec<String> },
    /// Message transit between two nodes, transient
    Send {
        source: NodeId,
        dest: NodeId,
        meta: Option<String>,
    },
    /// Node broadcasting presence, transient
    Beacon { node: NodeId },
    /// Event kind this player does not interpret; kept verbatim
    Other { kind: String, fields: Fields },
}

impl Event {
    /// The log tag of this event (`pos`, `route`, ...)
    pub fn kind(&self) -> &str {
        match self {
            Event::Pos { .. } => "pos",
            Event::Route { .. } => "route",
            Event::Buffer { .. } => "buffer",
            Event::Send { .. } => "send",
            Event::Beacon { .. } => "beacon",
            Event::Other { kind, .. } => kind,
        }
    }

    /// Delay class used when scheduling the tick after this event's frame
    pub fn delay_class(&self) -> DelayClass {
        match self {
            Event::Pos { .. } | Event::Route { .. } | Event::Beacon { .. } => DelayClass::Position,
            Event::Buffer { .. } => DelayClass::Buffer,
            Event::Send { .. } | Event::Other { .. } => DelayClass::Message,
        }
    }

    /// True for events that only affect the frame they occur in
    pub fn is_transient(&self) -> bool {
        matches!(self, Event::Send { .. } | Event::Beacon { .. })
    }
}

/// Named delay classes, ordered from fastest to slowest visual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayClass {
    Position,
    Buffer,
    Message,
}

impl fmt::Display for DelayClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelayClass::Position => write!(f, "position"),
            DelayClass::Buffer => write!(f, "buffer"),
            DelayClass::Message => write!(f, "message"),
        }
    }
}

/// Events sharing one simulation timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeFrame {
    pub time: f64,
    pub events: Vec<Event>,
}

impl TimeFrame {
    pub fn new(time: f64, events: Vec<Event>) -> Self {
        Self { time, events }
    }
}
