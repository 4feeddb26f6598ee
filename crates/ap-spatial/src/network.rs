//! Road network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays (`edge_from`, `edge_to`, `edge_length_m`) are sorted by
//! source node and indexed by `EdgeId`.  Edges are directed for traversal; a
//! two-way street is two edges.  Connectivity analysis treats them as
//! undirected (see [`crate::components`]).
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps a coordinate to the nearest `NodeId`.  Points
//! are stored in an equirectangular projection `[lat, lon · cos(φ₀)]` with
//! `φ₀` the mean node latitude, so planar distance tracks geodesic distance
//! at district scale.

use log::warn;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use ap_core::{EdgeId, GeoPoint, NodeId};

use crate::{SpatialError, SpatialResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree: a projected `[lat, scaled lon]` point with the
/// associated `NodeId`.
#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2],
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed road graph in CSR format plus a spatial index for node snapping.
///
/// Read-only once built; share it across threads by reference.  Do not
/// construct directly; use [`RoadNetworkBuilder`].
pub struct RoadNetwork {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Geographic position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<GeoPoint>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer.  Outgoing edges of node `n` are at EdgeIds
    /// `node_out_start[n] .. node_out_start[n+1]`.
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId = position in sorted order) ──────────
    /// Source node of each edge.  Needed to walk `prev_edge` chains back
    /// to the origin.
    pub edge_from: Vec<NodeId>,

    /// Destination node of each edge.
    pub edge_to: Vec<NodeId>,

    /// Physical length of each edge in metres.  Always finite and `>= 0`.
    pub edge_length_m: Vec<f64>,

    // ── Spatial index ─────────────────────────────────────────────────────
    spatial_idx: RTree<NodeEntry>,
    lon_scale: f64,
}

impl RoadNetwork {
    /// Construct an empty network with no nodes or edges.
    ///
    /// Snapping against it fails with [`SpatialError::NoNodeFound`].
    pub fn empty() -> Self {
        RoadNetworkBuilder::new().build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_pos.len()
    }

    pub fn position(&self, node: NodeId) -> SpatialResult<GeoPoint> {
        self.node_pos
            .get(node.index())
            .copied()
            .ok_or(SpatialError::NodeNotFound(node))
    }

    /// Positions of `nodes` in order: a route's polyline for rendering.
    /// Unknown ids are skipped.
    pub fn polyline(&self, nodes: &[NodeId]) -> Vec<GeoPoint> {
        nodes
            .iter()
            .filter_map(|n| self.node_pos.get(n.index()).copied())
            .collect()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    ///
    /// This is a contiguous index range, no heap allocation.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(EdgeId::from_index)
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// Length of the shortest directed edge `from → to`, if any.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<(EdgeId, f64)> {
        self.out_edges(from)
            .filter(|e| self.edge_to[e.index()] == to)
            .map(|e| (e, self.edge_length_m[e.index()]))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    #[inline]
    fn project(&self, pos: GeoPoint) -> [f64; 2] {
        [pos.lat, pos.lon * self.lon_scale]
    }

    /// Return the `NodeId` of the nearest road node to `pos`.
    ///
    /// Equidistant nodes resolve to the lowest id.  Fails if the network has
    /// no nodes or `pos` is not a valid coordinate.
    pub fn nearest_node(&self, pos: GeoPoint) -> SpatialResult<NodeId> {
        if !pos.is_valid() {
            return Err(SpatialError::InvalidPosition(pos));
        }
        let query = self.project(pos);
        let mut iter = self.spatial_idx.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best_d2) = iter.next().ok_or(SpatialError::NoNodeFound)?;

        let mut best = first.id;
        for (entry, d2) in iter {
            if d2 > best_d2 {
                break;
            }
            best = best.min(entry.id);
        }
        Ok(best)
    }

    /// Return up to `k` nearest nodes to `pos`, sorted by ascending distance.
    /// Empty for an invalid `pos`.
    pub fn k_nearest_nodes(&self, pos: GeoPoint, k: usize) -> Vec<NodeId> {
        if !pos.is_valid() {
            return Vec::new();
        }
        self.spatial_idx
            .nearest_neighbor_iter(&self.project(pos))
            .take(k)
            .map(|e| e.id)
            .collect()
    }

    /// Copy the nodes in `keep` (and every edge with both endpoints kept) into
    /// a new network.  Kept nodes are renumbered in ascending old-id order.
    ///
    /// Returns the new network and `old_to_new`, where `old_to_new[old]` is
    /// the new id or `NodeId::INVALID`.
    pub fn subnetwork(&self, keep: &[NodeId]) -> (RoadNetwork, Vec<NodeId>) {
        let mut keep_mask = vec![false; self.node_count()];
        for &n in keep {
            if self.contains(n) {
                keep_mask[n.index()] = true;
            }
        }

        let mut old_to_new = vec![NodeId::INVALID; self.node_count()];
        let kept = keep_mask.iter().filter(|&&k| k).count();
        let mut b = RoadNetworkBuilder::with_capacity(kept, self.edge_count());
        for (i, &k) in keep_mask.iter().enumerate() {
            if k {
                old_to_new[i] = b.add_node(self.node_pos[i]);
            }
        }
        for e in 0..self.edge_count() {
            let from = old_to_new[self.edge_from[e].index()];
            let to   = old_to_new[self.edge_to[e].index()];
            if from.is_valid() && to.is_valid() {
                b.add_directed_edge(from, to, self.edge_length_m[e]);
            }
        }
        (b.build(), old_to_new)
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// The builder accepts nodes and directed edges in any order.  `build()`
/// drops malformed edges, sorts the rest by source node, constructs the CSR
/// arrays, and bulk-loads the R-tree.
///
/// # Example
///
/// ```
/// use ap_core::GeoPoint;
/// use ap_spatial::RoadNetworkBuilder;
///
/// let mut b = RoadNetworkBuilder::new();
/// let a = b.add_node(GeoPoint::new(-12.1211, -77.0297));
/// let c = b.add_node(GeoPoint::new(-12.1220, -77.0290));
/// b.add_road(a, c, 125.0);
/// let net = b.build();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // bidirectional
/// ```
pub struct RoadNetworkBuilder {
    nodes:     Vec<GeoPoint>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from:     NodeId,
    to:       NodeId,
    length_m: f64,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_edges: Vec::new() }
    }

    /// Pre-allocate for the expected number of nodes and edges.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:     Vec::with_capacity(nodes),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a road node and return its `NodeId` (sequential from 0).
    ///
    /// A position failing [`GeoPoint::is_valid`] is not stored: the call
    /// returns `NodeId::INVALID`, and `build()` drops any edge touching it.
    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        if !pos.is_valid() {
            warn!("dropping road node with invalid position {pos}");
            return NodeId::INVALID;
        }
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(pos);
        id
    }

    /// Add a **directed** edge from `from` to `to` with physical length
    /// `length_m` (metres).
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, length_m: f64) {
        self.raw_edges.push(RawEdge { from, to, length_m });
    }

    /// Add edges in **both directions** for a two-way road segment.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length_m: f64) {
        self.add_directed_edge(a, b, length_m);
        self.add_directed_edge(b, a, length_m);
    }

    /// Position of a node added earlier (used by loaders to derive edge
    /// lengths from geometry).
    pub fn node_pos(&self, id: NodeId) -> GeoPoint {
        self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`RoadNetwork`].
    ///
    /// Edges with a negative or non-finite length, or an endpoint that was
    /// never added, are dropped with a warning.
    ///
    /// Time complexity: O(E log E) for edge sort + O(N log N) for R-tree bulk
    /// load, where N = nodes, E = edges.
    pub fn build(self) -> RoadNetwork {
        let node_count = self.nodes.len();

        let mut raw: Vec<RawEdge> = Vec::with_capacity(self.raw_edges.len());
        for e in self.raw_edges {
            let in_range = e.from.index() < node_count && e.to.index() < node_count;
            if !in_range || !e.length_m.is_finite() || e.length_m < 0.0 {
                warn!(
                    "dropping malformed edge {} -> {} (length {})",
                    e.from, e.to, e.length_m
                );
                continue;
            }
            raw.push(e);
        }

        // Stable sort keeps insertion order among a node's out-edges.
        raw.sort_by_key(|e| e.from.0);
        let edge_count = raw.len();

        let edge_from:     Vec<NodeId> = raw.iter().map(|e| e.from).collect();
        let edge_to:       Vec<NodeId> = raw.iter().map(|e| e.to).collect();
        let edge_length_m: Vec<f64>    = raw.iter().map(|e| e.length_m).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        let lon_scale = if node_count == 0 {
            1.0
        } else {
            let mean_lat = self.nodes.iter().map(|p| p.lat).sum::<f64>() / node_count as f64;
            mean_lat.to_radians().cos().max(1e-6)
        };

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &pos)| NodeEntry {
                point: [pos.lat, pos.lon * lon_scale],
                id: NodeId::from_index(i),
            })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        RoadNetwork {
            node_pos: self.nodes,
            node_out_start,
            edge_from,
            edge_to,
            edge_length_m,
            spatial_idx,
            lon_scale,
        }
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
