//! The query engine.
//!
//! The three free functions are the pure core: they take already-loaded data
//! and never touch a source.  [`Locator`] adds the session around them:
//! sources, caches, configuration and query superseding.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use ap_core::{
    AccessPoint, CoreError, GeoPoint, LocatorConfig, NetworkType, PointSet, SkeletonStrategy,
    TravelMode,
};
use ap_spatial::{
    ComponentPolicy, DijkstraRouter, RoadNetwork, Route, Router, Skeleton, SpatialError, accept,
    build_skeleton,
};

use crate::{
    BestDestinationSearch, PlaceFeatureSource, QueryError, QueryResult, QueryTicket,
    RoadNetworkSource, SelectionCache, SupersedeGate, TravelEstimator,
};

// ── Outcomes ──────────────────────────────────────────────────────────────────

/// A located access point and how to get there.
#[derive(Clone, Debug, PartialEq)]
pub struct Arrival {
    pub mode:  TravelMode,
    pub query: GeoPoint,
    pub point: AccessPoint,
    /// Road route between the snapped nodes.  `None` under `Flight`.
    pub route: Option<Route>,
    /// Route length, or straight-line distance under `Flight`.
    pub distance_m: f64,
    pub eta_minutes: f64,
    /// Drawable path: the route's node coordinates, or `[query, point]`
    /// under `Flight`.
    pub polyline: Vec<GeoPoint>,
}

impl Arrival {
    /// Off-network leg from the query coordinate to the route's first node.
    pub fn approach_leg(&self) -> Option<(GeoPoint, GeoPoint)> {
        self.route.as_ref()?;
        self.polyline.first().map(|&first| (self.query, first))
    }

    /// Off-network leg from the route's last node to the access point.
    pub fn final_leg(&self) -> Option<(GeoPoint, GeoPoint)> {
        self.route.as_ref()?;
        self.polyline.last().map(|&last| (last, self.point.pos))
    }
}

/// Why a road route could not even be attempted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Unavailable {
    /// No usable network for the selected place and mode.
    Graph,
    /// The query coordinate could not be snapped (empty network).
    Snap,
}

/// Result of one routing computation.
#[derive(Clone, Debug, PartialEq)]
pub enum RouteOutcome {
    Ready(Arrival),
    /// No candidate reachable from the origin.  Normal, not a fault.
    NoRouteFound,
    DataUnavailable(Unavailable),
}

/// Result of a full [`Locator::query`].
#[derive(Clone, Debug, PartialEq)]
pub enum QueryOutcome {
    Ready(Arrival),
    NoRouteFound,
    DataUnavailable(Unavailable),
    /// The place has no access points.
    NoPointsAvailable,
}

impl From<RouteOutcome> for QueryOutcome {
    fn from(o: RouteOutcome) -> Self {
        match o {
            RouteOutcome::Ready(a)           => QueryOutcome::Ready(a),
            RouteOutcome::NoRouteFound       => QueryOutcome::NoRouteFound,
            RouteOutcome::DataUnavailable(u) => QueryOutcome::DataUnavailable(u),
        }
    }
}

// ── Pure operations ───────────────────────────────────────────────────────────

/// Minimum spanning tree over `points`.
pub fn compute_skeleton(points: &PointSet, strategy: SkeletonStrategy) -> Skeleton {
    build_skeleton(points, strategy)
}

/// Nearest access point by straight-line distance, with the ETA under `mode`.
///
/// Never touches a road network.  Returns `NoRouteFound` only for an empty
/// point set.
///
/// # Errors
///
/// [`CoreError::InvalidCoordinate`] for an out-of-range `query`.
pub fn compute_straight_line(
    query:     GeoPoint,
    points:    &PointSet,
    mode:      TravelMode,
    estimator: &TravelEstimator,
) -> QueryResult<RouteOutcome> {
    if !query.is_valid() {
        return Err(CoreError::InvalidCoordinate(query).into());
    }
    let Some((point, distance_m)) = points.nearest_straight_line(query) else {
        return Ok(RouteOutcome::NoRouteFound);
    };
    Ok(RouteOutcome::Ready(Arrival {
        mode,
        query,
        point: point.clone(),
        route: None,
        distance_m,
        eta_minutes: estimator.estimate(distance_m, mode),
        polyline: vec![query, point.pos],
    }))
}

/// Most accessible access point over the road network.
///
/// `Flight` delegates to [`compute_straight_line`].  For road modes, a
/// missing or empty `network` is `DataUnavailable`.
///
/// # Errors
///
/// [`CoreError::InvalidCoordinate`] for an out-of-range `query`;
/// [`QueryError::Superseded`] when `ticket` goes stale.
pub fn compute_best_route<R: Router>(
    network:   Option<&RoadNetwork>,
    query:     GeoPoint,
    points:    &PointSet,
    mode:      TravelMode,
    search:    &BestDestinationSearch<R>,
    estimator: &TravelEstimator,
    ticket:    &QueryTicket,
) -> QueryResult<RouteOutcome> {
    if !query.is_valid() {
        return Err(CoreError::InvalidCoordinate(query).into());
    }
    if !mode.uses_road_network() {
        return compute_straight_line(query, points, mode, estimator);
    }
    let Some(network) = network else {
        return Ok(RouteOutcome::DataUnavailable(Unavailable::Graph));
    };

    let origin = match network.nearest_node(query) {
        Ok(n) => n,
        Err(e) => {
            debug!("origin snap failed for {query}: {e}");
            return Ok(RouteOutcome::DataUnavailable(Unavailable::Snap));
        }
    };

    let report = search.find_best(network, origin, points.as_slice(), ticket)?;
    let Some(best) = report.best else {
        return Ok(RouteOutcome::NoRouteFound);
    };

    let point = points.get(best.point)?.clone();
    let distance_m = best.distance_m();
    Ok(RouteOutcome::Ready(Arrival {
        mode,
        query,
        point,
        polyline: best.route.polyline(network),
        route: Some(best.route),
        distance_m,
        eta_minutes: estimator.estimate(distance_m, mode),
    }))
}

// ── Locator ───────────────────────────────────────────────────────────────────

/// Session-level engine: sources, caches and the superseding gate around the
/// pure operations.
///
/// # Type parameters
///
/// `P`/`N` are the data sources; `R` the router (default
/// [`DijkstraRouter`]).
pub struct Locator<P, N, R = DijkstraRouter>
where
    P: PlaceFeatureSource,
    N: RoadNetworkSource,
    R: Router,
{
    config:    LocatorConfig,
    places:    P,
    networks:  N,
    points:    SelectionCache<String, PointSet>,
    graphs:    SelectionCache<(String, NetworkType), RoadNetwork>,
    search:    BestDestinationSearch<R>,
    estimator: TravelEstimator,
    gate:      SupersedeGate,
}

impl<P, N> Locator<P, N, DijkstraRouter>
where
    P: PlaceFeatureSource,
    N: RoadNetworkSource,
{
    pub fn new(config: LocatorConfig, places: P, networks: N) -> QueryResult<Self> {
        Self::with_router(config, places, networks, DijkstraRouter)
    }
}

impl<P, N, R> Locator<P, N, R>
where
    P: PlaceFeatureSource,
    N: RoadNetworkSource,
    R: Router,
{
    pub fn with_router(config: LocatorConfig, places: P, networks: N, router: R) -> QueryResult<Self> {
        config.validate()?;
        let max_age = config.cache_max_age_secs.map(Duration::from_secs);
        let search = BestDestinationSearch::new(router, config.search_strategy)
            .with_threads(config.num_threads)?;
        Ok(Self {
            points:    SelectionCache::new(config.cache_capacity, max_age),
            graphs:    SelectionCache::new(config.cache_capacity, max_age),
            estimator: TravelEstimator::from_config(&config),
            gate:      SupersedeGate::new(),
            search,
            config,
            places,
            networks,
        })
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    pub fn estimator(&self) -> &TravelEstimator {
        &self.estimator
    }

    /// Gate used by [`query`](Self::query).  Clone it to supersede queries
    /// from another thread.
    pub fn gate(&self) -> &SupersedeGate {
        &self.gate
    }

    /// Deduplicated access points for `place`, from cache when possible.
    ///
    /// Empty results are not cached, so a later call refetches.
    pub fn load_points(&self, place: &str) -> QueryResult<Arc<PointSet>> {
        self.points.get_or_try_insert(place.to_owned(), || {
            let raw = self.places.fetch_points(place)?;
            let raw_count = raw.len();
            let set = PointSet::ingest(raw, &self.config.default_label);
            if set.is_empty() {
                return Err(QueryError::NoPointsAvailable { place: place.to_owned() });
            }
            info!("loaded {} access points for {place:?} ({raw_count} raw)", set.len());
            Ok(set)
        })
    }

    /// Accepted (single-component) network of `network_type` for `place`.
    pub fn load_network(&self, place: &str, network_type: NetworkType) -> QueryResult<Arc<RoadNetwork>> {
        self.graphs.get_or_try_insert((place.to_owned(), network_type), || {
            let unavailable = || QueryError::GraphUnavailable {
                place:   place.to_owned(),
                network: network_type,
            };
            let raw = self.networks.fetch_network(place, network_type)?.ok_or_else(unavailable)?;
            let net = match accept(raw, ComponentPolicy::Largest) {
                Ok(net) => net,
                Err(SpatialError::NoNodeFound) => return Err(unavailable()),
                Err(e) => return Err(e.into()),
            };
            info!(
                "loaded {network_type} network for {place:?}: {} nodes, {} edges",
                net.node_count(),
                net.edge_count()
            );
            Ok(net)
        })
    }

    /// Connectivity skeleton of `place`'s access points.
    pub fn skeleton(&self, place: &str) -> QueryResult<Skeleton> {
        let points = self.load_points(place)?;
        Ok(compute_skeleton(&points, self.config.skeleton_strategy))
    }

    /// Drop cached data for `place` (all modes).
    pub fn invalidate(&self, place: &str) {
        self.points.invalidate(&place.to_owned());
        for network_type in [NetworkType::Walk, NetworkType::Drive] {
            self.graphs.invalidate(&(place.to_owned(), network_type));
        }
    }

    pub fn invalidate_all(&self) {
        self.points.invalidate_all();
        self.graphs.invalidate_all();
    }

    /// Run a full query, superseding any query still in flight.
    pub fn query(&self, place: &str, mode: TravelMode, at: GeoPoint) -> QueryResult<QueryOutcome> {
        let ticket = self.gate.issue();
        self.query_with(place, mode, at, &ticket)
    }

    /// Run a full query under an existing ticket.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidCoordinate`] for an out-of-range `at`;
    /// [`QueryError::Superseded`] if `ticket` goes stale.  Missing data is
    /// reported through [`QueryOutcome`], not as an error.
    pub fn query_with(
        &self,
        place:  &str,
        mode:   TravelMode,
        at:     GeoPoint,
        ticket: &QueryTicket,
    ) -> QueryResult<QueryOutcome> {
        if !at.is_valid() {
            return Err(CoreError::InvalidCoordinate(at).into());
        }

        let points = match self.load_points(place) {
            Ok(p) => p,
            Err(QueryError::NoPointsAvailable { .. }) => return Ok(QueryOutcome::NoPointsAvailable),
            Err(QueryError::Source(e)) => {
                warn!("point source failed for {place:?}: {e}");
                return Ok(QueryOutcome::NoPointsAvailable);
            }
            Err(e) => return Err(e),
        };

        let network = match mode.network_type() {
            None => None,
            Some(network_type) => match self.load_network(place, network_type) {
                Ok(net) => Some(net),
                Err(QueryError::GraphUnavailable { .. }) => None,
                Err(QueryError::Source(e)) => {
                    warn!("network source failed for {place:?}/{network_type}: {e}");
                    None
                }
                Err(e) => return Err(e),
            },
        };

        if !ticket.is_current() {
            return Err(QueryError::Superseded);
        }

        let outcome = compute_best_route(
            network.as_deref(),
            at,
            &points,
            mode,
            &self.search,
            &self.estimator,
            ticket,
        )?;
        match &outcome {
            RouteOutcome::Ready(a) => debug!(
                "{mode} query at {at}: {:?} at {:.1} m, {:.1} min",
                a.point.name, a.distance_m, a.eta_minutes
            ),
            other => debug!("{mode} query at {at}: {other:?}"),
        }
        Ok(outcome.into())
    }
}
