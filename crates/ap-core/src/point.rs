//! Access points and the ingestion boundary.
//!
//! Data sources hand over [`RawPoint`]s exactly as they found them: names may
//! be missing and coordinates may repeat.  [`PointSet::ingest`] is the one
//! place where that is resolved.  Everything downstream sees a deduplicated,
//! fully-labelled, immutable set.

use log::{debug, warn};
use rustc_hash::FxHashSet;

use crate::{CoreError, CoreResult, GeoPoint, PointId};

/// A point of interest as delivered by a data source.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawPoint {
    /// Source-side identifier, if the source has one (e.g. an OSM node id).
    pub source_id: Option<i64>,
    pub name: Option<String>,
    pub pos: GeoPoint,
}

impl RawPoint {
    pub fn new(name: Option<&str>, lat: f64, lon: f64) -> Self {
        Self {
            source_id: None,
            name: name.map(str::to_owned),
            pos: GeoPoint::new(lat, lon),
        }
    }
}

/// A deduplicated, labelled access point.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessPoint {
    pub id: PointId,
    /// Display label.  Never empty: unnamed points carry the default label.
    pub name: String,
    /// `false` when `name` is the substituted default.
    pub named: bool,
    pub source_id: Option<i64>,
    pub pos: GeoPoint,
}

/// Immutable, deduplicated collection of access points for one place.
///
/// `PointId(i)` is the `i`-th point in first-seen order.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointSet {
    points: Vec<AccessPoint>,
}

impl PointSet {
    /// Resolve raw source output into a `PointSet`.
    ///
    /// - Invalid coordinates (non-finite or out of range) are dropped.
    /// - Exact `(lat, lon)` duplicates keep their first occurrence.
    /// - Missing or blank names become `default_label`.
    pub fn ingest<I>(raw: I, default_label: &str) -> Self
    where
        I: IntoIterator<Item = RawPoint>,
    {
        let mut seen: FxHashSet<(u64, u64)> = FxHashSet::default();
        let mut points = Vec::new();
        let mut dropped_invalid = 0usize;
        let mut dropped_dup = 0usize;

        for r in raw {
            if !r.pos.is_valid() {
                warn!("dropping access point with invalid coordinate {}", r.pos);
                dropped_invalid += 1;
                continue;
            }
            if !seen.insert(r.pos.bits()) {
                dropped_dup += 1;
                continue;
            }

            let (name, named) = match r.name.as_deref().map(str::trim) {
                Some(n) if !n.is_empty() => (n.to_owned(), true),
                _ => (default_label.to_owned(), false),
            };
            points.push(AccessPoint {
                id: PointId::from_index(points.len()),
                name,
                named,
                source_id: r.source_id,
                pos: r.pos,
            });
        }

        if dropped_dup > 0 || dropped_invalid > 0 {
            debug!(
                "ingested {} access points ({} duplicates, {} invalid dropped)",
                points.len(),
                dropped_dup,
                dropped_invalid
            );
        }
        Self { points }
    }

    /// Build directly from coordinates, all carrying `default_label`.
    pub fn from_positions(positions: &[GeoPoint], default_label: &str) -> Self {
        Self::ingest(
            positions.iter().map(|&pos| RawPoint { source_id: None, name: None, pos }),
            default_label,
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AccessPoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[AccessPoint] {
        &self.points
    }

    pub fn get(&self, id: PointId) -> CoreResult<&AccessPoint> {
        self.points.get(id.index()).ok_or(CoreError::PointNotFound(id))
    }

    /// Positions in `PointId` order.
    pub fn positions(&self) -> Vec<GeoPoint> {
        self.points.iter().map(|p| p.pos).collect()
    }

    /// Mean position of the set, or `None` if empty.
    pub fn centroid(&self) -> Option<GeoPoint> {
        crate::centroid(&self.positions())
    }

    /// The point with the smallest straight-line distance to `from`, with its
    /// distance in metres.  Ties go to the lowest `PointId`.
    pub fn nearest_straight_line(&self, from: GeoPoint) -> Option<(&AccessPoint, f64)> {
        let mut best: Option<(&AccessPoint, f64)> = None;
        for p in &self.points {
            let d = from.distance_m(p.pos);
            match best {
                Some((_, bd)) if d >= bd => {}
                _ => best = Some((p, d)),
            }
        }
        best
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a AccessPoint;
    type IntoIter = std::slice::Iter<'a, AccessPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
