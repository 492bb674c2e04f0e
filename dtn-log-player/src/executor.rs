//! State executor
//!
//! [`NodeTable`] owns every node and its runtime state. [`Executor`] is the
//! only code that mutates that state: it applies one event (or one frame's
//! batch of events) at a time and fails fast on references to undeclared
//! nodes.

use crate::types::{Event, Node, NodeId, NodeState, PlayerError, Result, Topology};
use serde::Serialize;

/// Owned node-state container, in declaration order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NodeTable {
    nodes: Topology,
}

/// Runtime state of every node, in table order
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    states: Vec<NodeState>,
}

impl NodeTable {
    pub fn new(nodes: Topology) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, nid: &str) -> Option<&Node> {
        self.nodes.get(nid)
    }

    /// Look up a node, failing on unknown ids
    pub fn node(&self, nid: &str) -> Result<&Node> {
        self.nodes
            .get(nid)
            .ok_or_else(|| PlayerError::UnknownNodeReference(nid.to_string()))
    }

    fn node_mut(&mut self, nid: &str) -> Result<&mut Node> {
        self.nodes
            .get_mut(nid)
            .ok_or_else(|| PlayerError::UnknownNodeReference(nid.to_string()))
    }

    pub fn contains(&self, nid: &str) -> bool {
        self.nodes.contains_key(nid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Node list labels, e.g. `"n1 [1/4]"`
    pub fn display_labels(&self) -> Vec<String> {
        self.nodes.values().map(Node::display_label).collect()
    }

    /// Ids of nodes that have not received a position yet
    pub fn unplaced(&self) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|node| node.state.pos.is_none())
            .map(|node| node.nid.as_str())
            .collect()
    }

    /// Clear all runtime state back to the freshly-parsed state
    pub fn reset(&mut self) {
        for node in self.nodes.values_mut() {
            node.state = NodeState::default();
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            states: self.nodes.values().map(|node| node.state.clone()).collect(),
        }
    }

    pub fn restore(&mut self, snapshot: &StateSnapshot) {
        for (node, state) in self.nodes.values_mut().zip(&snapshot.states) {
            node.state = state.clone();
        }
    }
}

/// Applies events to a [`NodeTable`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Executor;

impl Executor {
    /// Apply a single event
    pub fn apply(table: &mut NodeTable, event: &Event) -> Result<()> {
        log::trace!("Applying {} event", event.kind());

        match event {
            Event::Pos { node, x, y } => {
                table.node_mut(node)?.state.pos = Some((*x, *y));
            }
            Event::Route { node, tour } => {
                table.node_mut(node)?.state.route = tour.clone();
            }
            Event::Buffer { node, list } => {
                table.node_mut(node)?.state.buffer = list
                    .iter()
                    .filter(|item| !item.is_empty())
                    .cloned()
                    .collect();
            }
            Event::Send { source, dest, .. } => {
                table.node(source)?;
                table.node(dest)?;
            }
            Event::Beacon { node } => {
                table.node(node)?;
            }
            Event::Other { kind, .. } => {
                log::trace!("No state change for event kind {:?}", kind);
            }
        }

        Ok(())
    }

    /// Apply a frame's events in order, stopping at the first failure
    pub fn apply_events(table: &mut NodeTable, events: &[Event]) -> Result<()> {
        events.iter().try_for_each(|event| Self::apply(table, event))
    }
}
