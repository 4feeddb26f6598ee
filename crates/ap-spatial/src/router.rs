//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! The query layer calls routing through the [`Router`] trait, so an
//! application can swap in A* or a contraction hierarchy without touching the
//! search code.
//!
//! # Cost units
//!
//! Edge cost is physical length in metres (`f64`).  Lengths are `>= 0` by
//! construction (see [`RoadNetworkBuilder::build`](crate::RoadNetworkBuilder::build)),
//! which is all Dijkstra needs.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use ap_core::{EdgeId, GeoPoint, NodeId};

use crate::network::RoadNetwork;
use crate::{SpatialError, SpatialResult};

// ── Route ─────────────────────────────────────────────────────────────────────

/// A path through the network.
///
/// `total_length_m` is always the sum of `edges`' lengths, accumulated in
/// travel order during reconstruction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    /// Visited nodes from origin to destination.  Never empty.
    pub nodes: Vec<NodeId>,
    /// Traversed edges; `edges.len() == nodes.len() - 1`.
    pub edges: Vec<EdgeId>,
    pub total_length_m: f64,
}

impl Route {
    /// Single-node route for `origin == destination`.
    pub fn trivial(node: NodeId) -> Self {
        Self { nodes: vec![node], edges: vec![], total_length_m: 0.0 }
    }

    /// `true` if the origin and destination are the same node.
    pub fn is_trivial(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn origin(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn destination(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    /// Node coordinates in travel order.
    pub fn polyline(&self, network: &RoadNetwork) -> Vec<GeoPoint> {
        network.polyline(&self.nodes)
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable point-to-point routing engine.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync` so one router can serve Rayon
/// workers evaluating candidates in parallel.
pub trait Router: Send + Sync {
    /// Shortest route from `from` to `to` by edge length.
    ///
    /// `from == to` yields a trivial one-node route.  Fails with
    /// [`SpatialError::NoRoute`] when `to` is unreachable.
    fn route(&self, network: &RoadNetwork, from: NodeId, to: NodeId) -> SpatialResult<Route>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Standard Dijkstra's algorithm over the CSR road graph.
#[derive(Copy, Clone, Debug, Default)]
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(&self, network: &RoadNetwork, from: NodeId, to: NodeId) -> SpatialResult<Route> {
        check_node(network, from)?;
        check_node(network, to)?;
        if from == to {
            return Ok(Route::trivial(from));
        }

        let mut search = Search::new(network, from);
        while let Some(node) = search.settle_next() {
            if node == to {
                return Ok(reconstruct(network, &search.prev_edge, from, to));
            }
        }
        Err(SpatialError::NoRoute { from, to })
    }
}

/// Shortest routes from `origin` to each of `targets` in one Dijkstra run.
///
/// Stops as soon as every distinct target is settled.  The result is indexed
/// like `targets`; `None` marks an unreachable target.  Targets may repeat.
pub fn shortest_routes_to(
    network: &RoadNetwork,
    origin:  NodeId,
    targets: &[NodeId],
) -> SpatialResult<Vec<Option<Route>>> {
    check_node(network, origin)?;
    for &t in targets {
        check_node(network, t)?;
    }

    let mut is_target = vec![false; network.node_count()];
    let mut remaining = 0usize;
    for &t in targets {
        if !is_target[t.index()] {
            is_target[t.index()] = true;
            remaining += 1;
        }
    }

    let mut search = Search::new(network, origin);
    while remaining > 0 {
        match search.settle_next() {
            Some(node) if is_target[node.index()] => remaining -= 1,
            Some(_) => {}
            None => break,
        }
    }

    Ok(targets
        .iter()
        .map(|&t| {
            if t == origin {
                Some(Route::trivial(t))
            } else if search.settled[t.index()] {
                Some(reconstruct(network, &search.prev_edge, origin, t))
            } else {
                None
            }
        })
        .collect())
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

fn check_node(network: &RoadNetwork, node: NodeId) -> SpatialResult<()> {
    if network.contains(node) {
        Ok(())
    } else {
        Err(SpatialError::NodeNotFound(node))
    }
}

/// Total order over non-negative finite lengths for the heap.
#[derive(Copy, Clone, PartialEq, Debug)]
struct Cost(f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Incremental Dijkstra state: each `settle_next` call finalises one node.
struct Search<'a> {
    network:   &'a RoadNetwork,
    dist:      Vec<f64>,
    prev_edge: Vec<EdgeId>,
    settled:   Vec<bool>,
    // Secondary key NodeId makes equal-cost pops deterministic.
    heap:      BinaryHeap<Reverse<(Cost, NodeId)>>,
}

impl<'a> Search<'a> {
    fn new(network: &'a RoadNetwork, origin: NodeId) -> Self {
        let n = network.node_count();
        let mut dist = vec![f64::INFINITY; n];
        dist[origin.index()] = 0.0;
        let mut heap = BinaryHeap::new();
        heap.push(Reverse((Cost(0.0), origin)));
        Self {
            network,
            dist,
            prev_edge: vec![EdgeId::INVALID; n],
            settled: vec![false; n],
            heap,
        }
    }

    /// Pop and settle the closest unsettled node, relaxing its out-edges.
    /// Returns `None` once the reachable set is exhausted.
    fn settle_next(&mut self) -> Option<NodeId> {
        while let Some(Reverse((Cost(cost), node))) = self.heap.pop() {
            // Skip stale heap entries.
            if self.settled[node.index()] || cost > self.dist[node.index()] {
                continue;
            }
            self.settled[node.index()] = true;

            for edge in self.network.out_edges(node) {
                let neighbor = self.network.edge_to[edge.index()];
                if self.settled[neighbor.index()] {
                    continue;
                }
                let new_cost = cost + self.network.edge_length_m[edge.index()];
                if new_cost < self.dist[neighbor.index()] {
                    self.dist[neighbor.index()] = new_cost;
                    self.prev_edge[neighbor.index()] = edge;
                    self.heap.push(Reverse((Cost(new_cost), neighbor)));
                }
            }
            return Some(node);
        }
        None
    }
}

fn reconstruct(network: &RoadNetwork, prev_edge: &[EdgeId], from: NodeId, to: NodeId) -> Route {
    let mut edges = Vec::new();
    let mut cur = to;
    while cur != from {
        let e = prev_edge[cur.index()];
        debug_assert!(e.is_valid(), "reconstruct called on an unreached node");
        edges.push(e);
        cur = network.edge_from[e.index()];
    }
    edges.reverse();

    let mut nodes = Vec::with_capacity(edges.len() + 1);
    nodes.push(from);
    let mut total_length_m = 0.0;
    for &e in &edges {
        nodes.push(network.edge_to[e.index()]);
        total_length_m += network.edge_length_m[e.index()];
    }
    Route { nodes, edges, total_length_m }
}
