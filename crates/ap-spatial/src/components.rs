//! Connectivity analysis and the graph acceptance step.
//!
//! Downstream search assumes "unreachable" means a one-way restriction, not a
//! separate island the data source happened to include.  Every network coming
//! out of a data source therefore passes through [`accept`], which keeps a
//! single weakly-connected component (edges read as undirected).

use log::info;

use ap_core::NodeId;

use crate::{RoadNetwork, SpatialError, SpatialResult};

/// Which component [`accept`] keeps.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum ComponentPolicy {
    /// The component with the most nodes.  Equal sizes resolve to the
    /// component holding the lowest node id.
    #[default]
    Largest,
    /// The component containing this node.
    Anchor(NodeId),
}

// ── Union-find ────────────────────────────────────────────────────────────────

struct DisjointSet {
    parent: Vec<u32>,
    rank:   Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self { parent: (0..n as u32).collect(), rank: vec![0; n] }
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            // Path halving.
            let gp = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = gp;
            x = gp;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra as usize].cmp(&self.rank[rb as usize]) {
            std::cmp::Ordering::Less    => self.parent[ra as usize] = rb,
            std::cmp::Ordering::Greater => self.parent[rb as usize] = ra,
            std::cmp::Ordering::Equal   => {
                self.parent[rb as usize] = ra;
                self.rank[ra as usize] += 1;
            }
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Label every node with its weakly-connected component.
///
/// Labels are dense (`0..k`) and numbered by each component's lowest node id,
/// so label `0` always contains `NodeId(0)`.
pub fn weak_components(network: &RoadNetwork) -> Vec<u32> {
    let n = network.node_count();
    let mut ds = DisjointSet::new(n);
    for e in 0..network.edge_count() {
        ds.union(network.edge_from[e].0, network.edge_to[e].0);
    }

    let mut root_label = vec![u32::MAX; n];
    let mut labels = vec![0u32; n];
    let mut next = 0u32;
    for i in 0..n as u32 {
        let r = ds.find(i) as usize;
        if root_label[r] == u32::MAX {
            root_label[r] = next;
            next += 1;
        }
        labels[i as usize] = root_label[r];
    }
    labels
}

/// All nodes in the same weak component as `anchor`, ascending.
pub fn component_of(network: &RoadNetwork, anchor: NodeId) -> SpatialResult<Vec<NodeId>> {
    if !network.contains(anchor) {
        return Err(SpatialError::NodeNotFound(anchor));
    }
    let labels = weak_components(network);
    let target = labels[anchor.index()];
    Ok(labels
        .iter()
        .enumerate()
        .filter(|&(_, &l)| l == target)
        .map(|(i, _)| NodeId::from_index(i))
        .collect())
}

/// Restrict `network` to a single weak component.
///
/// Returns the network unchanged when it is already connected.  Node ids are
/// renumbered otherwise, so callers must snap against the returned network.
///
/// # Errors
///
/// [`SpatialError::NoNodeFound`] for an empty network,
/// [`SpatialError::NodeNotFound`] for an out-of-range anchor.
pub fn accept(network: RoadNetwork, policy: ComponentPolicy) -> SpatialResult<RoadNetwork> {
    if network.is_empty() {
        return Err(SpatialError::NoNodeFound);
    }

    let labels = weak_components(&network);
    let component_count = labels.iter().copied().max().map_or(0, |m| m as usize + 1);
    if component_count == 1 {
        return Ok(network);
    }

    let target = match policy {
        ComponentPolicy::Anchor(anchor) => {
            if !network.contains(anchor) {
                return Err(SpatialError::NodeNotFound(anchor));
            }
            labels[anchor.index()]
        }
        ComponentPolicy::Largest => {
            let mut sizes = vec![0usize; component_count];
            for &l in &labels {
                sizes[l as usize] += 1;
            }
            // Labels follow lowest-node order, so the first maximum wins ties.
            let mut best = 0;
            for (l, &s) in sizes.iter().enumerate() {
                if s > sizes[best] {
                    best = l;
                }
            }
            best as u32
        }
    };

    let keep: Vec<NodeId> = labels
        .iter()
        .enumerate()
        .filter(|&(_, &l)| l == target)
        .map(|(i, _)| NodeId::from_index(i))
        .collect();

    info!(
        "restricting road network to component of {} / {} nodes ({} components)",
        keep.len(),
        network.node_count(),
        component_count
    );
    let (restricted, _) = network.subnetwork(&keep);
    Ok(restricted)
}
