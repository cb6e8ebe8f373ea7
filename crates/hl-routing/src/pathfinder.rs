//! Next-hop path finding.
//!
//! # Pluggability
//!
//! `hl-sim` routes through the [`PathFinder`] trait so a different algorithm
//! (A*, congestion-aware costs) can be swapped in without touching the
//! scheduler.  The default [`DijkstraPathFinder`] is sufficient for networks
//! of warehouse scale.
//!
//! # Cost units
//!
//! Edge costs are connection travel times in whole minutes (`u32`);
//! accumulated path costs are `u64` so long chains cannot overflow.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use hl_core::{ConnectionId, WarehouseId};

use crate::RoutingGraph;

// ── Route ─────────────────────────────────────────────────────────────────────

/// The first leg of a shortest path.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct NextHop {
    /// Connection to traverse now.
    pub connection:    ConnectionId,
    /// Where that connection ends.
    pub target:        WarehouseId,
    /// Travel time of this hop alone.
    pub leg_minutes:   u32,
    /// Cost of the whole shortest path from start to goal.
    pub total_minutes: u64,
}

/// Outcome of a routing query.  Every variant is an expected result.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Route {
    /// Take this connection next.
    Next(NextHop),
    /// `start == goal`; nothing to traverse.
    AtGoal,
    /// The goal is not reachable from the start in this snapshot.
    NoPath,
}

impl Route {
    pub fn next_hop(self) -> Option<NextHop> {
        match self {
            Route::Next(hop) => Some(hop),
            Route::AtGoal | Route::NoPath => None,
        }
    }

    pub fn is_no_path(self) -> bool {
        matches!(self, Route::NoPath)
    }
}

// ── PathFinder trait ──────────────────────────────────────────────────────────

/// Pluggable next-hop router.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`: the scheduler may plan a tick's
/// transports on rayon workers (feature `parallel` of `hl-sim`), all sharing
/// one snapshot and one path finder.
pub trait PathFinder: Send + Sync {
    /// First hop of a shortest path from `start` to `goal` in `graph`.
    fn next_hop(&self, graph: &RoutingGraph, start: WarehouseId, goal: WarehouseId) -> Route;
}

// ── DijkstraPathFinder ────────────────────────────────────────────────────────

/// Single-source Dijkstra that stops as soon as the goal is settled.
///
/// A node's predecessor is replaced only by a strictly cheaper candidate, so
/// among equal-cost paths the one discovered first is kept.
#[derive(Copy, Clone, Debug, Default)]
pub struct DijkstraPathFinder;

impl PathFinder for DijkstraPathFinder {
    fn next_hop(&self, graph: &RoutingGraph, start: WarehouseId, goal: WarehouseId) -> Route {
        dijkstra(graph, start, goal)
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

fn dijkstra(graph: &RoutingGraph, start: WarehouseId, goal: WarehouseId) -> Route {
    if start == goal {
        return Route::AtGoal;
    }
    let (Some(from), Some(to)) = (graph.dense(start), graph.dense(goal)) else {
        return Route::NoPath;
    };

    let n = graph.node_count();
    let mut dist = vec![u64::MAX; n];
    // prev[v] = (predecessor, edge index used to reach v).
    let mut prev: Vec<Option<(u32, usize)>> = vec![None; n];

    dist[from as usize] = 0;

    // Reverse turns the max-heap into a min-heap; the node index breaks cost
    // ties deterministically.
    let mut heap: BinaryHeap<Reverse<(u64, u32)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, node))) = heap.pop() {
        if node == to {
            return first_hop(graph, &prev, from, to, cost);
        }

        // Stale entry.
        if cost > dist[node as usize] {
            continue;
        }

        for e in graph.edge_range(node) {
            let neighbor = graph.edge_to[e];
            let candidate = cost.saturating_add(u64::from(graph.edge_cost[e]));
            if candidate < dist[neighbor as usize] {
                dist[neighbor as usize] = candidate;
                prev[neighbor as usize] = Some((node, e));
                heap.push(Reverse((candidate, neighbor)));
            }
        }
    }

    Route::NoPath
}

/// Walk predecessors back from `to` and return the edge leaving `from`.
fn first_hop(
    graph: &RoutingGraph,
    prev: &[Option<(u32, usize)>],
    from: u32,
    to: u32,
    total: u64,
) -> Route {
    let mut cur = to;
    while let Some((pred, edge)) = prev[cur as usize] {
        if pred == from {
            return Route::Next(NextHop {
                connection:    graph.edge_connection[edge],
                target:        graph.nodes[graph.edge_to[edge] as usize],
                leg_minutes:   graph.edge_cost[edge],
                total_minutes: total,
            });
        }
        cur = pred;
    }
    // The goal was popped, so a predecessor chain to `from` must exist.
    debug_assert!(false, "broken predecessor chain");
    Route::NoPath
}
