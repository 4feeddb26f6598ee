//! `ap-core`: foundational types for the `apreach` access-point locator.
//!
//! This crate is a dependency of every other `ap-*` crate.  It intentionally
//! has no `ap-*` dependencies and minimal external ones (`thiserror`, `log`,
//! `rustc-hash`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `NodeId`, `EdgeId`, `PointId`                         |
//! | [`geo`]         | `GeoPoint`, haversine distance, centroid              |
//! | [`point`]       | `RawPoint`, `AccessPoint`, `PointSet` (ingestion)     |
//! | [`transport`]   | `TravelMode`, `NetworkType`                           |
//! | [`config`]      | `LocatorConfig`, search/skeleton strategy enums       |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod point;
pub mod transport;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{LocatorConfig, SearchStrategy, SkeletonStrategy};
pub use error::{CoreError, CoreResult};
pub use geo::{GeoPoint, centroid};
pub use ids::{EdgeId, NodeId, PointId};
pub use point::{AccessPoint, PointSet, RawPoint};
pub use transport::{NetworkType, TravelMode};
