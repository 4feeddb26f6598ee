//! Best-destination search: which candidate access point is cheapest to reach
//! from the origin node over the road network.
//!
//! Each candidate ends in an explicit [`CandidateOutcome`].  Snap and routing
//! failures exclude that candidate only; they are counted in the
//! [`SearchReport`] and logged at `debug`, and the search carries on.
//!
//! # Strategies
//!
//! | Strategy       | Work                                      | Parallel |
//! |----------------|-------------------------------------------|----------|
//! | `PerCandidate` | one point-to-point Dijkstra per candidate | yes      |
//! | `MultiTarget`  | one Dijkstra, stopped when all are settled| no       |
//!
//! Both select the same minimum length.  On equal lengths the earliest
//! candidate in input order wins.

use log::debug;

use ap_core::{AccessPoint, GeoPoint, NodeId, PointId, SearchStrategy};
use ap_spatial::{RoadNetwork, Route, Router, SpatialError, SpatialResult, shortest_routes_to};

use crate::{QueryError, QueryResult, QueryTicket};

/// What happened to one candidate.
#[derive(Clone, Debug, PartialEq)]
pub enum CandidateOutcome {
    Reached(Route),
    /// Snapped, but no directed path from the origin (e.g. one-way streets).
    Unreachable,
    /// Could not be mapped to a node of the network.
    SnapFailed,
}

/// The winning candidate and its route.
#[derive(Clone, Debug, PartialEq)]
pub struct BestDestination {
    pub point: PointId,
    pub route: Route,
}

impl BestDestination {
    #[inline]
    pub fn distance_m(&self) -> f64 {
        self.route.total_length_m
    }
}

/// Aggregate result of one search.  `best == None` is the normal
/// "no candidate reachable" outcome.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchReport {
    pub best:        Option<BestDestination>,
    pub reached:     usize,
    pub unreachable: usize,
    pub snap_failed: usize,
}

impl SearchReport {
    pub fn evaluated(&self) -> usize {
        self.reached + self.unreachable + self.snap_failed
    }
}

/// Multi-candidate shortest-path search over a read-only [`RoadNetwork`].
///
/// # Type parameter
///
/// `R` must implement [`Router`] (e.g. [`ap_spatial::DijkstraRouter`]).  It is
/// only used by the `PerCandidate` strategy.
pub struct BestDestinationSearch<R: Router> {
    router:   R,
    strategy: SearchStrategy,
    #[cfg(feature = "parallel")]
    pool:     Option<rayon::ThreadPool>,
}

impl<R: Router> BestDestinationSearch<R> {
    pub fn new(router: R, strategy: SearchStrategy) -> Self {
        Self {
            router,
            strategy,
            #[cfg(feature = "parallel")]
            pool: None,
        }
    }

    /// Run per-candidate evaluation on a dedicated pool of `num_threads`
    /// workers instead of Rayon's global pool.  A no-op without the
    /// `parallel` feature.
    pub fn with_threads(self, num_threads: Option<usize>) -> QueryResult<Self> {
        #[cfg(feature = "parallel")]
        {
            let mut this = self;
            if let Some(n) = num_threads {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ap_core::CoreError::Config(e.to_string()))?;
                this.pool = Some(pool);
            }
            Ok(this)
        }

        #[cfg(not(feature = "parallel"))]
        {
            let _ = num_threads;
            Ok(self)
        }
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    /// Find the candidate with the shortest route from `origin`, snapping each
    /// candidate with [`RoadNetwork::nearest_node`].
    pub fn find_best(
        &self,
        network:    &RoadNetwork,
        origin:     NodeId,
        candidates: &[AccessPoint],
        ticket:     &QueryTicket,
    ) -> QueryResult<SearchReport> {
        self.find_best_with(network, origin, candidates, |pos| network.nearest_node(pos), ticket)
    }

    /// As [`find_best`](Self::find_best) with a caller-supplied snap function.
    ///
    /// # Errors
    ///
    /// [`SpatialError::NodeNotFound`] if `origin` is not in `network`;
    /// [`QueryError::Superseded`] if `ticket` goes stale mid-search.
    pub fn find_best_with<S>(
        &self,
        network:    &RoadNetwork,
        origin:     NodeId,
        candidates: &[AccessPoint],
        snap:       S,
        ticket:     &QueryTicket,
    ) -> QueryResult<SearchReport>
    where
        S: Fn(GeoPoint) -> SpatialResult<NodeId> + Sync,
    {
        if !network.contains(origin) {
            return Err(SpatialError::NodeNotFound(origin).into());
        }

        let outcomes = match self.strategy {
            SearchStrategy::PerCandidate => {
                self.evaluate_each(network, origin, candidates, &snap, ticket)?
            }
            SearchStrategy::MultiTarget => {
                evaluate_multi_target(network, origin, candidates, &snap, ticket)?
            }
        };

        if !ticket.is_current() {
            return Err(QueryError::Superseded);
        }
        Ok(reduce(candidates, outcomes))
    }

    fn evaluate_each<S>(
        &self,
        network:    &RoadNetwork,
        origin:     NodeId,
        candidates: &[AccessPoint],
        snap:       &S,
        ticket:     &QueryTicket,
    ) -> QueryResult<Vec<CandidateOutcome>>
    where
        S: Fn(GeoPoint) -> SpatialResult<NodeId> + Sync,
    {
        #[cfg(not(feature = "parallel"))]
        {
            let mut out = Vec::with_capacity(candidates.len());
            for c in candidates {
                if !ticket.is_current() {
                    return Err(QueryError::Superseded);
                }
                out.push(self.evaluate_one(network, origin, c, snap));
            }
            Ok(out)
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            // Stale workers return `None`; order is preserved by `collect`.
            let run = || -> Vec<Option<CandidateOutcome>> {
                candidates
                    .par_iter()
                    .map(|c| {
                        ticket
                            .is_current()
                            .then(|| self.evaluate_one(network, origin, c, snap))
                    })
                    .collect()
            };
            let results = match &self.pool {
                Some(pool) => pool.install(run),
                None => run(),
            };
            results
                .into_iter()
                .map(|o| o.ok_or(QueryError::Superseded))
                .collect()
        }
    }

    fn evaluate_one<S>(
        &self,
        network:   &RoadNetwork,
        origin:    NodeId,
        candidate: &AccessPoint,
        snap:      &S,
    ) -> CandidateOutcome
    where
        S: Fn(GeoPoint) -> SpatialResult<NodeId>,
    {
        let node = match snap(candidate.pos) {
            Ok(n) => n,
            Err(e) => {
                debug!("candidate {} excluded: snap failed ({e})", candidate.id);
                return CandidateOutcome::SnapFailed;
            }
        };
        match self.router.route(network, origin, node) {
            Ok(route) => CandidateOutcome::Reached(route),
            Err(SpatialError::NoRoute { .. }) => {
                debug!("candidate {} excluded: {node} unreachable from {origin}", candidate.id);
                CandidateOutcome::Unreachable
            }
            Err(e) => {
                debug!("candidate {} excluded: {e}", candidate.id);
                CandidateOutcome::SnapFailed
            }
        }
    }
}

/// Snap every candidate, then settle all snapped nodes in one Dijkstra run.
fn evaluate_multi_target<S>(
    network:    &RoadNetwork,
    origin:     NodeId,
    candidates: &[AccessPoint],
    snap:       &S,
    ticket:     &QueryTicket,
) -> QueryResult<Vec<CandidateOutcome>>
where
    S: Fn(GeoPoint) -> SpatialResult<NodeId>,
{
    let snapped: Vec<Option<NodeId>> = candidates
        .iter()
        .map(|c| match snap(c.pos) {
            Ok(n) if network.contains(n) => Some(n),
            Ok(n) => {
                debug!("candidate {} excluded: snapped to unknown {n}", c.id);
                None
            }
            Err(e) => {
                debug!("candidate {} excluded: snap failed ({e})", c.id);
                None
            }
        })
        .collect();

    if !ticket.is_current() {
        return Err(QueryError::Superseded);
    }

    let targets: Vec<NodeId> = snapped.iter().flatten().copied().collect();
    let mut routes = shortest_routes_to(network, origin, &targets)?.into_iter();

    Ok(snapped
        .iter()
        .zip(candidates)
        .map(|(s, c)| match s {
            None => CandidateOutcome::SnapFailed,
            Some(node) => match routes.next().flatten() {
                Some(route) => CandidateOutcome::Reached(route),
                None => {
                    debug!("candidate {} excluded: {node} unreachable from {origin}", c.id);
                    CandidateOutcome::Unreachable
                }
            },
        })
        .collect())
}

/// Sequential minimum over outcomes in candidate order.
fn reduce(candidates: &[AccessPoint], outcomes: Vec<CandidateOutcome>) -> SearchReport {
    let mut report = SearchReport::default();
    for (c, outcome) in candidates.iter().zip(outcomes) {
        match outcome {
            CandidateOutcome::Reached(route) => {
                report.reached += 1;
                let better = report
                    .best
                    .as_ref()
                    .is_none_or(|b| route.total_length_m < b.route.total_length_m);
                if better {
                    report.best = Some(BestDestination { point: c.id, route });
                }
            }
            CandidateOutcome::Unreachable => report.unreachable += 1,
            CandidateOutcome::SnapFailed  => report.snap_failed += 1,
        }
    }
    debug!(
        "search evaluated {} candidates: {} reached, {} unreachable, {} snap failures",
        report.evaluated(),
        report.reached,
        report.unreachable,
        report.snap_failed
    );
    report
}
