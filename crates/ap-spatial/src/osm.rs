//! OSM PBF loaders, enabled with the `osm` Cargo feature.
//!
//! A file-backed stand-in for the external geographic data source: one pass
//! yields either the walk/drive road network or the access points of an
//! extract.
//!
//! ```ignore
//! use std::path::Path;
//! use ap_core::NetworkType;
//! use ap_spatial::osm::{load_access_points, load_network};
//!
//! let net = load_network(Path::new("miraflores.osm.pbf"), NetworkType::Walk)?;
//! let aps = load_access_points(Path::new("miraflores.osm.pbf"), "internet_access", "wlan")?;
//! ```
//!
//! # What is loaded
//!
//! Ways whose `highway` class is usable by the requested network type.  Drive
//! honours `oneway`; walk ignores it.  Edge lengths are haversine distances
//! between consecutive way nodes.  The network is *not* restricted to one
//! component here; that is [`crate::accept`]'s job.

use std::path::Path;

use log::info;
use osmpbf::{Element, ElementReader};
use rustc_hash::{FxHashMap, FxHashSet};

use ap_core::{GeoPoint, NetworkType, NodeId, RawPoint};

use crate::network::{RoadNetwork, RoadNetworkBuilder};
use crate::SpatialError;

// ── Public entry points ───────────────────────────────────────────────────────

/// Load the road network usable by `network_type` from an OSM PBF file.
///
/// # Errors
///
/// Returns [`SpatialError::Osm`] on open or parse errors.
pub fn load_network(path: &Path, network_type: NetworkType) -> Result<RoadNetwork, SpatialError> {
    // ── Phase 1: collect all OSM nodes + usable ways in one sequential pass ──
    let reader = ElementReader::from_path(path).map_err(|e| SpatialError::Osm(e.to_string()))?;

    let mut all_nodes: FxHashMap<i64, GeoPoint> = FxHashMap::default();
    let mut ways: Vec<OsmWay> = Vec::new();

    reader
        .for_each(|elem| match elem {
            Element::Node(n) => {
                all_nodes.insert(n.id(), GeoPoint::new(n.lat(), n.lon()));
            }
            Element::DenseNode(n) => {
                all_nodes.insert(n.id(), GeoPoint::new(n.lat(), n.lon()));
            }
            Element::Way(w) => {
                // Collect tags eagerly so &str lifetimes don't escape the closure.
                let tags: Vec<(&str, &str)> = w.tags().collect();
                let Some(highway) = tag(&tags, "highway") else { return };
                if !usable(network_type, highway, &tags) {
                    return;
                }
                let oneway = match network_type {
                    NetworkType::Drive => is_oneway(highway, &tags),
                    NetworkType::Walk  => false,
                };
                ways.push(OsmWay { refs: w.refs().collect(), oneway });
            }
            _ => {}
        })
        .map_err(|e| SpatialError::Osm(e.to_string()))?;

    // ── Phase 2: road-referenced node IDs ─────────────────────────────────
    let road_node_ids: FxHashSet<i64> = ways.iter().flat_map(|w| w.refs.iter().copied()).collect();

    // ── Phase 3: build network ────────────────────────────────────────────
    let mut builder = RoadNetworkBuilder::with_capacity(road_node_ids.len(), road_node_ids.len() * 2);

    // Sorted so NodeIds are stable across runs on the same extract.
    let mut sorted_ids: Vec<i64> = road_node_ids.into_iter().collect();
    sorted_ids.sort_unstable();

    let mut osm_to_local: FxHashMap<i64, NodeId> =
        FxHashMap::with_capacity_and_hasher(sorted_ids.len(), Default::default());
    for osm_id in sorted_ids {
        if let Some(&pos) = all_nodes.get(&osm_id) {
            let id = builder.add_node(pos);
            if id.is_valid() {
                osm_to_local.insert(osm_id, id);
            }
        }
    }
    drop(all_nodes);

    for way in &ways {
        for window in way.refs.windows(2) {
            if let (Some(&from), Some(&to)) = (osm_to_local.get(&window[0]), osm_to_local.get(&window[1])) {
                let len_m = builder.node_pos(from).distance_m(builder.node_pos(to));
                if way.oneway {
                    builder.add_directed_edge(from, to, len_m);
                } else {
                    builder.add_road(from, to, len_m);
                }
            }
        }
    }

    info!(
        "loaded {network_type} network: {} nodes, {} edges from {} ways",
        builder.node_count(),
        builder.edge_count(),
        ways.len()
    );
    Ok(builder.build())
}

/// Load every OSM node tagged `key=value` (e.g. `internet_access=wlan`) as a
/// raw access point.  Names come from the `name` tag when present.
///
/// Only point features are returned; tagged ways and areas are ignored.
pub fn load_access_points(path: &Path, key: &str, value: &str) -> Result<Vec<RawPoint>, SpatialError> {
    let reader = ElementReader::from_path(path).map_err(|e| SpatialError::Osm(e.to_string()))?;
    let mut points = Vec::new();

    reader
        .for_each(|elem| {
            let (id, pos, tags): (i64, GeoPoint, Vec<(&str, &str)>) = match &elem {
                Element::Node(n)      => (n.id(), GeoPoint::new(n.lat(), n.lon()), n.tags().collect()),
                Element::DenseNode(n) => (n.id(), GeoPoint::new(n.lat(), n.lon()), n.tags().collect()),
                _ => return,
            };
            if tag(&tags, key) == Some(value) {
                points.push(RawPoint {
                    source_id: Some(id),
                    name: tag(&tags, "name").map(str::to_owned),
                    pos,
                });
            }
        })
        .map_err(|e| SpatialError::Osm(e.to_string()))?;

    info!("loaded {} raw access points tagged {key}={value}", points.len());
    Ok(points)
}

// ── Internal types ────────────────────────────────────────────────────────────

struct OsmWay {
    refs:   Vec<i64>,
    oneway: bool,
}

// ── Tag helpers ───────────────────────────────────────────────────────────────

fn tag<'a>(tags: &[(&'a str, &'a str)], key: &str) -> Option<&'a str> {
    tags.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Whether a way of class `highway` belongs in the `network_type` graph.
pub(crate) fn usable(network_type: NetworkType, highway: &str, tags: &[(&str, &str)]) -> bool {
    if matches!(tag(tags, "access"), Some("no" | "private")) {
        return false;
    }
    match network_type {
        NetworkType::Drive => matches!(
            highway,
            "motorway" | "motorway_link" | "trunk" | "trunk_link"
                | "primary" | "primary_link" | "secondary" | "secondary_link"
                | "tertiary" | "tertiary_link" | "residential" | "living_street"
                | "unclassified" | "road"
        ),
        NetworkType::Walk => {
            if tag(tags, "foot") == Some("no") {
                return false;
            }
            !matches!(
                highway,
                "motorway" | "motorway_link" | "trunk" | "trunk_link"
                    | "cycleway" | "bus_guideway" | "raceway" | "construction"
                    | "proposed" | "abandoned" | "platform"
            )
        }
    }
}

/// Whether a drivable way is one-way.
///
/// Motorways and roundabouts are implicitly one-way in OSM convention.
pub(crate) fn is_oneway(highway: &str, tags: &[(&str, &str)]) -> bool {
    let explicit = matches!(tag(tags, "oneway"), Some("yes" | "1" | "true"));
    let implicit = matches!(highway, "motorway" | "motorway_link")
        || tag(tags, "junction") == Some("roundabout");
    explicit || implicit
}
