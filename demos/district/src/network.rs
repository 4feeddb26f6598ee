//! Synthetic Miraflores (Lima) district.
//!
//! A 5 × 5 street grid at ~220 m spacing, with one one-way avenue along the
//! northern row and a small disconnected cul-de-sac to the east that the
//! locator drops on load.

use ap_core::{GeoPoint, NodeId, RawPoint};
use ap_spatial::{RoadNetwork, RoadNetworkBuilder};

pub const PLACE: &str = "Miraflores, Lima";

const ORIGIN: GeoPoint = GeoPoint { lat: -12.1300, lon: -77.0350 };
const STEP_DEG: f64 = 0.002;
const SIDE: usize = 5;

/// Build the district road network.  `drive` makes the northern avenue
/// one-way (westbound) as it is for cars.
pub fn build_network(drive: bool) -> RoadNetwork {
    let mut b = RoadNetworkBuilder::with_capacity(SIDE * SIDE + 2, SIDE * SIDE * 4 + 2);

    let mut grid = [[NodeId::INVALID; SIDE]; SIDE];
    for (r, row) in grid.iter_mut().enumerate() {
        for (c, node) in row.iter_mut().enumerate() {
            *node = b.add_node(GeoPoint::new(
                ORIGIN.lat + r as f64 * STEP_DEG,
                ORIGIN.lon + c as f64 * STEP_DEG,
            ));
        }
    }

    for r in 0..SIDE {
        for c in 0..SIDE {
            let here = grid[r][c];
            if c + 1 < SIDE {
                let east = grid[r][c + 1];
                let len = b.node_pos(here).distance_m(b.node_pos(east));
                if drive && r == SIDE - 1 {
                    b.add_directed_edge(east, here, len);
                } else {
                    b.add_road(here, east, len);
                }
            }
            if r + 1 < SIDE {
                let north = grid[r + 1][c];
                let len = b.node_pos(here).distance_m(b.node_pos(north));
                b.add_road(here, north, len);
            }
        }
    }

    // Cul-de-sac with no link to the grid.
    let a = b.add_node(GeoPoint::new(ORIGIN.lat + 0.004, ORIGIN.lon + 0.014));
    let z = b.add_node(GeoPoint::new(ORIGIN.lat + 0.005, ORIGIN.lon + 0.014));
    let len = b.node_pos(a).distance_m(b.node_pos(z));
    b.add_road(a, z, len);

    b.build()
}

/// WiFi hotspots as a feature query would return them: one duplicate, one
/// unnamed, one blank-named.
pub fn hotspots() -> Vec<RawPoint> {
    vec![
        RawPoint::new(Some("Parque Kennedy"), -12.1221, -77.0301),
        RawPoint::new(Some("Biblioteca Municipal"), -12.1279, -77.0338),
        RawPoint::new(Some("Biblioteca Municipal (dup)"), -12.1279, -77.0338),
        RawPoint::new(None, -12.1295, -77.0275),
        RawPoint::new(Some("Cafe Haiti"), -12.1244, -77.0289),
        RawPoint::new(Some(" "), -12.1262, -77.0312),
        RawPoint { source_id: Some(9_001), ..RawPoint::new(Some("Mercado Surquillo"), -12.1285, -77.0265) },
    ]
}
