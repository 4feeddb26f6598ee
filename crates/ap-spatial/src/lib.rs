//! `ap-spatial`: road network, node snapping, routing and the access-point
//! skeleton.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`network`]    | `RoadNetwork` (CSR + R-tree), `RoadNetworkBuilder`        |
//! | [`components`] | weak components, `accept` (largest-component restriction) |
//! | [`router`]     | `Router` trait, `Route`, `DijkstraRouter`, multi-target   |
//! | [`skeleton`]   | Prim's MST over access points (`Skeleton`, `SpanningEdge`)|
//! | [`osm`]        | PBF network + access-point loaders (feature = `"osm"`)    |
//! | [`error`]      | `SpatialError`, `SpatialResult<T>`                        |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `osm`   | Enables OSM PBF loading via the `osmpbf` crate.             |
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod components;
pub mod error;
pub mod network;
pub mod router;
pub mod skeleton;

#[cfg(feature = "osm")]
pub mod osm;


pub use components::{ComponentPolicy, accept, component_of, weak_components};
pub use error::{SpatialError, SpatialResult};
pub use network::{RoadNetwork, RoadNetworkBuilder};
pub use router::{DijkstraRouter, Route, Router, shortest_routes_to};
pub use skeleton::{Skeleton, SpanningEdge, build_skeleton};
