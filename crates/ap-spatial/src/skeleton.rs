//! Connectivity skeleton: a minimum spanning tree over access points.
//!
//! The skeleton is a picture of how the access points relate to each other,
//! not a routing structure.  Edge weights are great-circle distances over the
//! complete graph on the points.
//!
//! Two Prim's variants share one contract (spanning tree, minimum total
//! weight):
//!
//! | Strategy | Cost  | Ties                                           |
//! |----------|-------|------------------------------------------------|
//! | `Naive`  | O(V³) | first (inside, outside) pair in index order    |
//! | `Dense`  | O(V²) | lowest outside index, then earliest attachment |

use ap_core::{GeoPoint, PointId, PointSet, SkeletonStrategy};

/// One tree edge between two access points.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpanningEdge {
    /// Endpoint already in the tree when the edge was chosen.
    pub a: PointId,
    /// Endpoint the edge pulled into the tree.
    pub b: PointId,
    pub weight_m: f64,
}

/// Output of [`build_skeleton`]: `len() - 1` edges for `len() >= 2` points.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Skeleton {
    pub edges: Vec<SpanningEdge>,
}

impl Skeleton {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn total_weight_m(&self) -> f64 {
        self.edges.iter().map(|e| e.weight_m).sum()
    }

    /// Coordinate pairs for drawing.  Edges naming points outside `points`
    /// are skipped.
    pub fn segments(&self, points: &PointSet) -> Vec<(GeoPoint, GeoPoint)> {
        self.edges
            .iter()
            .filter_map(|e| {
                let a = points.get(e.a).ok()?;
                let b = points.get(e.b).ok()?;
                Some((a.pos, b.pos))
            })
            .collect()
    }
}

/// Build the minimum spanning tree over `points`.
///
/// `points` is already deduplicated (a [`PointSet`] guarantees it), and the
/// first point seeds the tree.
pub fn build_skeleton(points: &PointSet, strategy: SkeletonStrategy) -> Skeleton {
    let pos = points.positions();
    let pairs = match strategy {
        SkeletonStrategy::Naive => prim_naive(&pos),
        SkeletonStrategy::Dense => prim_dense(&pos),
    };
    Skeleton {
        edges: pairs
            .into_iter()
            .map(|(a, b, weight_m)| SpanningEdge {
                a: PointId::from_index(a),
                b: PointId::from_index(b),
                weight_m,
            })
            .collect(),
    }
}

/// Full-scan Prim's: every step examines all (inside, outside) pairs.
pub(crate) fn prim_naive(pos: &[GeoPoint]) -> Vec<(usize, usize, f64)> {
    let n = pos.len();
    if n < 2 {
        return vec![];
    }

    let mut inside = vec![false; n];
    inside[0] = true;
    let mut edges = Vec::with_capacity(n - 1);

    while edges.len() < n - 1 {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in (0..n).filter(|&i| inside[i]) {
            for j in (0..n).filter(|&j| !inside[j]) {
                let d = pos[i].distance_m(pos[j]);
                // Strict `<` keeps the first pair found on ties.
                if best.is_none_or(|(_, _, bd)| d < bd) {
                    best = Some((i, j, d));
                }
            }
        }
        let Some((u, v, d)) = best else {
            break; // no outside point reachable; keep the partial tree
        };
        inside[v] = true;
        edges.push((u, v, d));
    }
    edges
}

/// Key-array Prim's: `key[j]` holds the cheapest known attachment of outside
/// point `j`, refreshed once per insertion.
pub(crate) fn prim_dense(pos: &[GeoPoint]) -> Vec<(usize, usize, f64)> {
    let n = pos.len();
    if n < 2 {
        return vec![];
    }

    let mut inside = vec![false; n];
    let mut key = vec![f64::INFINITY; n];
    let mut parent = vec![usize::MAX; n];
    let mut edges = Vec::with_capacity(n - 1);

    inside[0] = true;
    for j in 1..n {
        key[j] = pos[0].distance_m(pos[j]);
        parent[j] = 0;
    }

    for _ in 1..n {
        let mut next: Option<usize> = None;
        for j in (0..n).filter(|&j| !inside[j]) {
            if next.is_none_or(|v| key[j] < key[v]) {
                next = Some(j);
            }
        }
        let Some(v) = next else { break };
        if !key[v].is_finite() {
            break;
        }

        inside[v] = true;
        edges.push((parent[v], v, key[v]));

        for j in (0..n).filter(|&j| !inside[j]) {
            let d = pos[v].distance_m(pos[j]);
            if d < key[j] {
                key[j] = d;
                parent[j] = v;
            }
        }
    }
    edges
}
