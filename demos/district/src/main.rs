//! district: smallest end-to-end run of the apreach locator.
//!
//! Loads a synthetic Miraflores (Lima) street grid and a handful of WiFi
//! hotspots through in-memory sources, then finds the most accessible hotspot
//! for one query under each travel mode.  The map layers (hotspots, skeleton,
//! routes and connectors) are written as GeoJSON to `output/district/`.
//!
//! ```text
//! cargo run -p district -- [walk|drive|flight] [LAT LON]
//! RUST_LOG=debug cargo run -p district
//! ```

mod network;

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use log::info;
use serde_json::{Value, json};

use ap_core::{GeoPoint, LocatorConfig, NetworkType, TravelMode};
use ap_query::{
    Arrival, InMemoryNetworkSource, InMemoryPlaceSource, Locator, QueryOutcome, Unavailable,
};

use network::{PLACE, build_network, hotspots};

const DEFAULT_QUERY: GeoPoint = GeoPoint { lat: -12.1290, lon: -77.0330 };
const OUTPUT_DIR: &str = "output/district";

fn parse_args() -> Result<(Vec<TravelMode>, GeoPoint)> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let modes = match args.first() {
        Some(m) => vec![m.parse::<TravelMode>()?],
        None => TravelMode::ALL.to_vec(),
    };
    let query = match args.get(1..3) {
        Some([lat, lon]) => GeoPoint::new(
            lat.parse().with_context(|| format!("bad latitude {lat:?}"))?,
            lon.parse().with_context(|| format!("bad longitude {lon:?}"))?,
        ),
        _ if args.len() > 1 => bail!("expected both LAT and LON"),
        _ => DEFAULT_QUERY,
    };
    Ok((modes, query))
}

fn line(a: GeoPoint, b: GeoPoint, props: Value) -> Value {
    json!({
        "type": "Feature",
        "geometry": { "type": "LineString", "coordinates": [[a.lon, a.lat], [b.lon, b.lat]] },
        "properties": props,
    })
}

fn route_features(arrival: &Arrival) -> Vec<Value> {
    let coords: Vec<[f64; 2]> = arrival.polyline.iter().map(|p| [p.lon, p.lat]).collect();
    let mut out = vec![json!({
        "type": "Feature",
        "geometry": { "type": "LineString", "coordinates": coords },
        "properties": {
            "layer": "route",
            "mode": arrival.mode.as_str(),
            "distance_m": arrival.distance_m,
            "eta_minutes": arrival.eta_minutes,
            "to": arrival.point.name,
        },
    })];
    for (a, b) in arrival.approach_leg().into_iter().chain(arrival.final_leg()) {
        out.push(line(a, b, json!({ "layer": "connector", "mode": arrival.mode.as_str() })));
    }
    out
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (modes, query) = parse_args()?;

    let places = InMemoryPlaceSource::new().with_place(PLACE, hotspots());
    let networks = InMemoryNetworkSource::new()
        .with_network(PLACE, NetworkType::Walk, || build_network(false))
        .with_network(PLACE, NetworkType::Drive, || build_network(true));
    let locator = Locator::new(LocatorConfig::default(), places, networks)?;

    println!("=== district: apreach locator ===");
    println!("Place: {PLACE}  |  Query: {query}");
    println!();

    // 1. Hotspots and skeleton.
    let points = locator.load_points(PLACE)?;
    let skeleton = locator.skeleton(PLACE)?;
    let center = points.centroid().context("no hotspots")?;
    println!("Hotspots: {} (map centre {center})", points.len());
    println!(
        "Skeleton: {} edges, {:.0} m total",
        skeleton.len(),
        skeleton.total_weight_m()
    );
    println!();

    let mut features: Vec<Value> = points
        .iter()
        .map(|p| {
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [p.pos.lon, p.pos.lat] },
                "properties": { "layer": "hotspot", "name": p.name, "named": p.named },
            })
        })
        .collect();
    for edge in &skeleton.edges {
        let (a, b) = (points.get(edge.a)?.pos, points.get(edge.b)?.pos);
        let label = a.midpoint(b);
        features.push(line(a, b, json!({ "layer": "skeleton", "weight_m": edge.weight_m })));
        features.push(json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [label.lon, label.lat] },
            "properties": { "layer": "skeleton_label", "text": format!("{:.0} m", edge.weight_m) },
        }));
    }

    // 2. One query per mode.
    println!("{:<8} {:<24} {:>10} {:>8}", "Mode", "Hotspot", "Dist (m)", "ETA");
    println!("{}", "-".repeat(53));
    for mode in modes {
        let t0 = Instant::now();
        let outcome = locator.query(PLACE, mode, query)?;
        info!("{mode} query answered in {:.3} ms", t0.elapsed().as_secs_f64() * 1e3);

        match outcome {
            QueryOutcome::Ready(arrival) => {
                println!(
                    "{:<8} {:<24} {:>10.0} {:>6.1} m",
                    mode.as_str(),
                    arrival.point.name,
                    arrival.distance_m,
                    arrival.eta_minutes
                );
                features.extend(route_features(&arrival));
            }
            QueryOutcome::NoRouteFound => println!("{:<8} no hotspot reachable", mode.as_str()),
            QueryOutcome::DataUnavailable(Unavailable::Graph) => {
                println!("{:<8} no road network for this place", mode.as_str())
            }
            QueryOutcome::DataUnavailable(Unavailable::Snap) => {
                println!("{:<8} query point could not be placed on the network", mode.as_str())
            }
            QueryOutcome::NoPointsAvailable => println!("{:<8} no hotspots in {PLACE}", mode.as_str()),
        }
    }
    println!();

    // 3. Map layers.
    std::fs::create_dir_all(OUTPUT_DIR)?;
    let path = Path::new(OUTPUT_DIR).join("map.geojson");
    let doc = json!({
        "type": "FeatureCollection",
        "properties": { "center": [center.lon, center.lat], "query": [query.lon, query.lat] },
        "features": features,
    });
    std::fs::write(&path, serde_json::to_string_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Map layers written to {}", path.display());

    Ok(())
}
