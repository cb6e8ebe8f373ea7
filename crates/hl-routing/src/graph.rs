//! Immutable routing-graph snapshot.
//!
//! # Data layout
//!
//! Warehouse ids are arbitrary rowids, so each snapshot first assigns them
//! dense indices (first-seen order over the connection list).  Outgoing
//! edges are then stored in **Compressed Sparse Row (CSR)** form: the edges
//! of dense node `n` occupy
//!
//! ```text
//! edge_*[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! Within one source node, edges keep the order in which the connection list
//! supplied them.  Dijkstra's tie-breaking ("first found wins") therefore
//! depends only on that order, which the store fixes by connection id.

use rustc_hash::FxHashMap;

use hl_core::{Connection, ConnectionId, WarehouseId};

use crate::{RoutingError, RoutingResult};

/// One outgoing edge as seen from its source node.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Edge {
    /// Travel time in minutes.
    pub cost:       u32,
    pub target:     WarehouseId,
    pub connection: ConnectionId,
}

/// Point-in-time adjacency view of the connection table.
///
/// Build with [`RoutingGraph::from_connections`]; there is no way to mutate
/// a snapshot afterwards.
#[derive(Debug, Clone, Default)]
pub struct RoutingGraph {
    /// Dense index → warehouse id.
    pub(crate) nodes: Vec<WarehouseId>,
    index:            FxHashMap<WarehouseId, u32>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// Length = `node_count + 1`.
    pub(crate) node_out_start:  Vec<u32>,
    /// Dense index of each edge's target.
    pub(crate) edge_to:         Vec<u32>,
    pub(crate) edge_cost:       Vec<u32>,
    pub(crate) edge_connection: Vec<ConnectionId>,
}

impl RoutingGraph {
    /// A graph with no nodes.  Every routing query against it is `NoPath`
    /// (or `AtGoal` for `start == goal`).
    pub fn empty() -> Self {
        Self { node_out_start: vec![0], ..Self::default() }
    }

    /// Snapshot `connections` into a routing graph.
    ///
    /// Fails only on a zero-minute connection, which would let Dijkstra
    /// settle nodes out of order with respect to leg scheduling.
    pub fn from_connections(connections: &[Connection]) -> RoutingResult<Self> {
        if u32::try_from(connections.len()).is_err() {
            return Err(RoutingError::TooManyEdges(connections.len()));
        }

        let mut nodes: Vec<WarehouseId> = Vec::new();
        let mut index: FxHashMap<WarehouseId, u32> = FxHashMap::default();
        let mut intern = |id: WarehouseId| -> u32 {
            *index.entry(id).or_insert_with(|| {
                nodes.push(id);
                (nodes.len() - 1) as u32
            })
        };

        let mut raw: Vec<(u32, u32, u32, ConnectionId)> = Vec::with_capacity(connections.len());
        for c in connections {
            if c.minutes == 0 {
                return Err(RoutingError::ZeroWeight { id: c.id, from: c.source, to: c.target });
            }
            let from = intern(c.source);
            let to = intern(c.target);
            raw.push((from, to, c.minutes, c.id));
        }

        // Stable: equal sources keep list order.
        raw.sort_by_key(|&(from, ..)| from);

        let node_count = nodes.len();
        let mut node_out_start = vec![0u32; node_count + 1];
        for &(from, ..) in &raw {
            node_out_start[from as usize + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, raw.len());

        Ok(Self {
            nodes,
            index,
            node_out_start,
            edge_to:         raw.iter().map(|e| e.1).collect(),
            edge_cost:       raw.iter().map(|e| e.2).collect(),
            edge_connection: raw.iter().map(|e| e.3).collect(),
        })
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `true` if `node` is an endpoint of at least one connection.
    pub fn contains(&self, node: WarehouseId) -> bool {
        self.index.contains_key(&node)
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// Outgoing edges of `node` in list order.  Empty for unknown nodes.
    pub fn out_edges(&self, node: WarehouseId) -> impl Iterator<Item = Edge> + '_ {
        let range = self
            .dense(node)
            .map(|n| self.edge_range(n))
            .unwrap_or(0..0);
        range.map(|e| Edge {
            cost:       self.edge_cost[e],
            target:     self.nodes[self.edge_to[e] as usize],
            connection: self.edge_connection[e],
        })
    }

    pub fn out_degree(&self, node: WarehouseId) -> usize {
        self.dense(node).map_or(0, |n| self.edge_range(n).len())
    }

    #[inline]
    pub(crate) fn dense(&self, node: WarehouseId) -> Option<u32> {
        self.index.get(&node).copied()
    }

    #[inline]
    pub(crate) fn edge_range(&self, n: u32) -> std::ops::Range<usize> {
        let start = self.node_out_start[n as usize] as usize;
        let end = self.node_out_start[n as usize + 1] as usize;
        start..end
    }
}
