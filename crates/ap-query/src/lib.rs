//! `ap-query`: finds the most accessible access point for a query location.
//!
//! # Query flow
//!
//! ```text
//! Locator::query(place, mode, coord):
//!   ① Points   : PlaceFeatureSource (cached) → PointSet; empty → NoPointsAvailable
//!   ② Flight?  : straight-line nearest point → Ready
//!   ③ Network  : RoadNetworkSource (cached) → accept(largest component);
//!                missing/empty → DataUnavailable
//!   ④ Origin   : snap coord to nearest node
//!   ⑤ Search   : BestDestinationSearch over all candidates
//!                (parallel with the `parallel` feature)
//!   ⑥ ETA      : TravelEstimator → Ready | NoRouteFound
//! ```
//!
//! A newer query supersedes an in-flight one through [`SupersedeGate`]; the
//! network is read-only, so the stale search is simply dropped.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs per-candidate evaluation on Rayon's thread pool.  |
//! | `serde`    | Serde derives on core and spatial types.               |

pub mod cache;
pub mod cancel;
pub mod engine;
pub mod error;
pub mod estimate;
pub mod search;
pub mod source;

#[cfg(test)]
mod tests;

pub use cache::SelectionCache;
pub use cancel::{QueryTicket, SupersedeGate};
pub use engine::{
    Arrival, Locator, QueryOutcome, RouteOutcome, Unavailable, compute_best_route,
    compute_skeleton, compute_straight_line,
};
pub use error::{QueryError, QueryResult, SourceError};
pub use estimate::TravelEstimator;
pub use search::{BestDestination, BestDestinationSearch, CandidateOutcome, SearchReport};
pub use source::{InMemoryNetworkSource, InMemoryPlaceSource, PlaceFeatureSource, RoadNetworkSource};
