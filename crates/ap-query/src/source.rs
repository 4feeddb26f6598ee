//! External data collaborators.
//!
//! The locator never talks to a geographic backend directly; it asks these
//! traits.  Results are raw: point lists may be empty, repeat coordinates and
//! lack names, and networks may be disconnected.  The engine cleans both up
//! ([`PointSet::ingest`](ap_core::PointSet::ingest),
//! [`ap_spatial::accept`]).

use std::collections::HashMap;
use std::sync::Arc;

use ap_core::{NetworkType, RawPoint};
use ap_spatial::RoadNetwork;

use crate::SourceError;

/// Points of interest for a place (e.g. nodes tagged `internet_access=wlan`).
pub trait PlaceFeatureSource: Send + Sync {
    fn fetch_points(&self, place: &str) -> Result<Vec<RawPoint>, SourceError>;
}

/// Road networks for a place.
pub trait RoadNetworkSource: Send + Sync {
    /// `Ok(None)` means the source has no network of that type for the place.
    fn fetch_network(
        &self,
        place:        &str,
        network_type: NetworkType,
    ) -> Result<Option<RoadNetwork>, SourceError>;
}

// ── In-memory adapters ────────────────────────────────────────────────────────

/// Fixed point lists keyed by place.  Unknown places yield an empty list.
#[derive(Clone, Debug, Default)]
pub struct InMemoryPlaceSource {
    places: HashMap<String, Vec<RawPoint>>,
}

impl InMemoryPlaceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_place(mut self, place: impl Into<String>, points: Vec<RawPoint>) -> Self {
        self.places.insert(place.into(), points);
        self
    }
}

impl PlaceFeatureSource for InMemoryPlaceSource {
    fn fetch_points(&self, place: &str) -> Result<Vec<RawPoint>, SourceError> {
        Ok(self.places.get(place).cloned().unwrap_or_default())
    }
}

type NetworkFactory = Arc<dyn Fn() -> RoadNetwork + Send + Sync>;

/// Networks produced on demand by registered factories.
///
/// `RoadNetwork` is not `Clone` (it owns an R-tree), so each fetch builds a
/// fresh copy; the engine's cache makes that a one-time cost per selection.
#[derive(Clone, Default)]
pub struct InMemoryNetworkSource {
    networks: HashMap<(String, NetworkType), NetworkFactory>,
}

impl InMemoryNetworkSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_network<F>(mut self, place: impl Into<String>, network_type: NetworkType, build: F) -> Self
    where
        F: Fn() -> RoadNetwork + Send + Sync + 'static,
    {
        self.networks.insert((place.into(), network_type), Arc::new(build));
        self
    }
}

impl RoadNetworkSource for InMemoryNetworkSource {
    fn fetch_network(
        &self,
        place:        &str,
        network_type: NetworkType,
    ) -> Result<Option<RoadNetwork>, SourceError> {
        Ok(self
            .networks
            .get(&(place.to_owned(), network_type))
            .map(|build| build()))
    }
}
