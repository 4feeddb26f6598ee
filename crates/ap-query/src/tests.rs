//! Unit tests for ap-query.

#[cfg(test)]
mod helpers {
    use ap_core::{GeoPoint, NodeId, PointSet};
    use ap_spatial::{RoadNetwork, RoadNetworkBuilder};

    pub const O: GeoPoint = GeoPoint { lat: 0.0, lon: 0.0 };
    pub const A: GeoPoint = GeoPoint { lat: 0.0, lon: 0.001 };
    pub const B: GeoPoint = GeoPoint { lat: 0.0, lon: 0.002 };

    /// O - A - B with O-A 100 m and A-B 50 m, two-way.
    pub fn line_network() -> (RoadNetwork, [NodeId; 3]) {
        let mut b = RoadNetworkBuilder::new();
        let o = b.add_node(O);
        let a = b.add_node(A);
        let c = b.add_node(B);
        b.add_road(o, a, 100.0);
        b.add_road(a, c, 50.0);
        (b.build(), [o, a, c])
    }

    /// `line_network` plus a two-node island far to the north-east.
    pub fn line_with_island() -> RoadNetwork {
        let mut b = RoadNetworkBuilder::new();
        let o = b.add_node(O);
        let a = b.add_node(A);
        let c = b.add_node(B);
        let i0 = b.add_node(GeoPoint::new(0.5, 0.5));
        let i1 = b.add_node(GeoPoint::new(0.5, 0.501));
        b.add_road(o, a, 100.0);
        b.add_road(a, c, 50.0);
        b.add_road(i0, i1, 100.0);
        b.build()
    }

    pub fn points(positions: &[GeoPoint]) -> PointSet {
        PointSet::from_positions(positions, "Public WiFi")
    }

    /// Bellman-Ford distances from `origin`.
    pub fn reference_distances(net: &RoadNetwork, origin: NodeId) -> Vec<f64> {
        let n = net.node_count();
        let mut dist = vec![f64::INFINITY; n];
        dist[origin.index()] = 0.0;
        for _ in 0..n {
            let mut changed = false;
            for e in 0..net.edge_count() {
                let (u, v) = (net.edge_from[e].index(), net.edge_to[e].index());
                let cand = dist[u] + net.edge_length_m[e];
                if cand < dist[v] {
                    dist[v] = cand;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        dist
    }
}

// ── TravelEstimator ───────────────────────────────────────────────────────────

#[cfg(test)]
mod estimate {
    use ap_core::{LocatorConfig, TravelMode};
    use crate::TravelEstimator;

    #[test]
    fn default_speeds() {
        let e = TravelEstimator::default();
        assert!((e.estimate(750.0, TravelMode::Walk) - 10.0).abs() < 1e-12);
        assert!((e.estimate(2500.0, TravelMode::Drive) - 10.0).abs() < 1e-12);
        assert!((e.estimate(833.0, TravelMode::Flight) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn linear_in_distance() {
        let e = TravelEstimator::default();
        for mode in TravelMode::ALL {
            let one = e.estimate(123.4, mode);
            assert!((e.estimate(246.8, mode) - 2.0 * one).abs() < 1e-9);
            assert_eq!(e.estimate(0.0, mode), 0.0);
        }
    }

    #[test]
    fn from_config_uses_configured_speeds() {
        let cfg = LocatorConfig { walk_speed_m_per_min: 50.0, ..LocatorConfig::default() };
        let e = TravelEstimator::from_config(&cfg);
        assert_eq!(e.speed_m_per_min(TravelMode::Walk), 50.0);
        assert!((e.estimate(100.0, TravelMode::Walk) - 2.0).abs() < 1e-12);
        assert_eq!(e.speed_m_per_min(TravelMode::Drive), 250.0);
    }
}

// ── SupersedeGate ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod cancel {
    use crate::{QueryTicket, SupersedeGate};

    #[test]
    fn newer_ticket_supersedes_older() {
        let gate = SupersedeGate::new();
        let first = gate.issue();
        assert!(first.is_current());
        let second = gate.issue();
        assert!(!first.is_current());
        assert!(second.is_current());
    }

    #[test]
    fn cancel_all_stales_everything() {
        let gate = SupersedeGate::new();
        let t = gate.issue();
        gate.clone().cancel_all();
        assert!(!t.is_current());
    }

    #[test]
    fn detached_ticket_stays_current() {
        let t = QueryTicket::detached();
        assert!(t.is_current());
        assert!(t.clone().is_current());
    }
}

// ── SelectionCache ────────────────────────────────────────────────────────────

#[cfg(test)]
mod cache {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::SelectionCache;

    #[test]
    fn hit_returns_same_value() {
        let cache: SelectionCache<String, Vec<u32>> = SelectionCache::new(4, None);
        let first = cache.insert("lima".into(), vec![1, 2, 3]);
        let hit = cache.get(&"lima".to_owned()).expect("cached");
        assert!(Arc::ptr_eq(&first, &hit));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let cache: SelectionCache<&str, u32> = SelectionCache::new(2, None);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert!(cache.get(&"a").is_some());
        cache.insert("c", 3);
        assert!(cache.get(&"b").is_none());
        assert!(cache.get(&"a").is_some());
        assert!(cache.get(&"c").is_some());
    }

    #[test]
    fn zero_capacity_holds_one() {
        let cache: SelectionCache<u8, u8> = SelectionCache::new(0, None);
        cache.insert(1, 1);
        cache.insert(2, 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache: SelectionCache<&str, u32> = SelectionCache::new(4, Some(Duration::from_millis(1)));
        cache.insert("a", 1);
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get(&"a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn failed_load_is_not_cached() {
        let cache: SelectionCache<&str, u32> = SelectionCache::new(4, None);
        let mut calls = 0;
        let r: Result<_, &str> = cache.get_or_try_insert("a", || {
            calls += 1;
            Err("backend down")
        });
        assert!(r.is_err());
        let r: Result<_, &str> = cache.get_or_try_insert("a", || {
            calls += 1;
            Ok(7)
        });
        assert_eq!(*r.expect("loaded"), 7);
        let r: Result<_, &str> = cache.get_or_try_insert("a", || {
            calls += 1;
            Ok(8)
        });
        assert_eq!(*r.expect("cached"), 7);
        assert_eq!(calls, 2);
    }

    #[test]
    fn invalidate() {
        let cache: SelectionCache<&str, u32> = SelectionCache::new(4, None);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.invalidate(&"a");
        assert!(cache.get(&"a").is_none());
        assert_eq!(cache.len(), 1);
        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}

// ── BestDestinationSearch ─────────────────────────────────────────────────────

#[cfg(test)]
mod search {
    use ap_core::{GeoPoint, NodeId, PointId, SearchStrategy};
    use ap_spatial::{DijkstraRouter, RoadNetworkBuilder, SpatialError};
    use rand::{Rng, SeedableRng, rngs::SmallRng};

    use super::helpers::{A, B, O, line_network, points, reference_distances};
    use crate::{BestDestinationSearch, QueryError, QueryTicket, SupersedeGate};

    fn search(strategy: SearchStrategy) -> BestDestinationSearch<DijkstraRouter> {
        BestDestinationSearch::new(DijkstraRouter, strategy)
    }

    const STRATEGIES: [SearchStrategy; 2] = [SearchStrategy::PerCandidate, SearchStrategy::MultiTarget];

    #[test]
    fn single_candidate_along_the_line() {
        let (net, [o, a, b]) = line_network();
        let cands = points(&[B]);
        for s in STRATEGIES {
            let report = search(s).find_best(&net, o, cands.as_slice(), &QueryTicket::detached()).unwrap();
            let best = report.best.expect("reachable");
            assert_eq!(best.point, PointId::from_index(0));
            assert_eq!(best.route.nodes, vec![o, a, b]);
            assert_eq!(best.distance_m(), 150.0);
        }
    }

    #[test]
    fn every_candidate_is_considered() {
        let (net, [o, a, _]) = line_network();
        // B listed first; A is still the closer one.
        let cands = points(&[B, A]);
        for s in STRATEGIES {
            let report = search(s).find_best(&net, o, cands.as_slice(), &QueryTicket::detached()).unwrap();
            let best = report.best.expect("reachable");
            assert_eq!(best.point, PointId::from_index(1));
            assert_eq!(best.route.nodes, vec![o, a]);
            assert_eq!(best.distance_m(), 100.0);
            assert_eq!(report.reached, 2);
        }
    }

    #[test]
    fn candidate_in_other_component_is_unreachable() {
        let mut b = RoadNetworkBuilder::new();
        let o = b.add_node(O);
        let a = b.add_node(A);
        let c = b.add_node(GeoPoint::new(1.0, 1.0));
        let d = b.add_node(GeoPoint::new(1.0, 1.001));
        b.add_road(o, a, 100.0);
        b.add_road(c, d, 100.0);
        let net = b.build();

        let cands = points(&[GeoPoint::new(1.0, 1.0)]);
        for s in STRATEGIES {
            let report = search(s).find_best(&net, o, cands.as_slice(), &QueryTicket::detached()).unwrap();
            assert!(report.best.is_none());
            assert_eq!(report.unreachable, 1);
        }
    }

    #[test]
    fn one_way_street_blocks_return() {
        let mut b = RoadNetworkBuilder::new();
        let o = b.add_node(O);
        let a = b.add_node(A);
        b.add_directed_edge(a, o, 100.0);
        let net = b.build();

        let cands = points(&[A]);
        for s in STRATEGIES {
            let report = search(s).find_best(&net, o, cands.as_slice(), &QueryTicket::detached()).unwrap();
            assert!(report.best.is_none());
            assert_eq!(report.unreachable, 1);
        }
    }

    #[test]
    fn candidate_at_origin_is_trivial() {
        let (net, [o, ..]) = line_network();
        let cands = points(&[B, O]);
        let report = search(SearchStrategy::PerCandidate)
            .find_best(&net, o, cands.as_slice(), &QueryTicket::detached())
            .unwrap();
        let best = report.best.expect("reachable");
        assert_eq!(best.point, PointId::from_index(1));
        assert!(best.route.is_trivial());
        assert_eq!(best.distance_m(), 0.0);
    }

    #[test]
    fn equal_lengths_pick_earliest_candidate() {
        let mut b = RoadNetworkBuilder::new();
        let o = b.add_node(O);
        let w = b.add_node(GeoPoint::new(0.0, -0.001));
        let e = b.add_node(GeoPoint::new(0.0, 0.001));
        b.add_road(o, w, 100.0);
        b.add_road(o, e, 100.0);
        let net = b.build();

        let cands = points(&[GeoPoint::new(0.0, 0.001), GeoPoint::new(0.0, -0.001)]);
        for s in STRATEGIES {
            let report = search(s).find_best(&net, o, cands.as_slice(), &QueryTicket::detached()).unwrap();
            assert_eq!(report.best.expect("reachable").point, PointId::from_index(0));
        }
    }

    #[test]
    fn snap_failure_excludes_only_that_candidate() {
        let (net, [o, ..]) = line_network();
        let cands = points(&[B, A]);
        let snap = |pos: GeoPoint| {
            if pos == A { Err(SpatialError::NoNodeFound) } else { net.nearest_node(pos) }
        };
        for s in STRATEGIES {
            let report = search(s)
                .find_best_with(&net, o, cands.as_slice(), snap, &QueryTicket::detached())
                .unwrap();
            let best = report.best.as_ref().expect("B still reachable");
            assert_eq!(best.point, PointId::from_index(0));
            assert_eq!(best.distance_m(), 150.0);
            assert_eq!(report.snap_failed, 1);
            assert_eq!(report.evaluated(), 2);
        }
    }

    #[test]
    fn snap_to_unknown_node_is_excluded() {
        let (net, [o, ..]) = line_network();
        let cands = points(&[B]);
        for s in STRATEGIES {
            let report = search(s)
                .find_best_with(&net, o, cands.as_slice(), |_| Ok(NodeId::from_index(99)), &QueryTicket::detached())
                .unwrap();
            assert!(report.best.is_none());
            assert_eq!(report.snap_failed, 1);
        }
    }

    #[test]
    fn no_candidates_no_best() {
        let (net, [o, ..]) = line_network();
        let report = search(SearchStrategy::PerCandidate)
            .find_best(&net, o, &[], &QueryTicket::detached())
            .unwrap();
        assert!(report.best.is_none());
        assert_eq!(report.evaluated(), 0);
    }

    #[test]
    fn unknown_origin_is_an_error() {
        let (net, _) = line_network();
        let cands = points(&[B]);
        let err = search(SearchStrategy::PerCandidate)
            .find_best(&net, NodeId::from_index(42), cands.as_slice(), &QueryTicket::detached())
            .unwrap_err();
        assert!(matches!(err, QueryError::Spatial(SpatialError::NodeNotFound(_))));
    }

    #[test]
    fn stale_ticket_is_superseded() {
        let (net, [o, ..]) = line_network();
        let cands = points(&[A, B]);
        let gate = SupersedeGate::new();
        let stale = gate.issue();
        let _newer = gate.issue();
        for s in STRATEGIES {
            let err = search(s).find_best(&net, o, cands.as_slice(), &stale).unwrap_err();
            assert!(matches!(err, QueryError::Superseded));
        }
    }

    #[test]
    fn with_threads_accepts_none() {
        let s = search(SearchStrategy::MultiTarget).with_threads(None).unwrap();
        assert_eq!(s.strategy(), SearchStrategy::MultiTarget);
    }

    /// Strategies agree with each other and with a Bellman-Ford reference on
    /// random networks with integer lengths.
    #[test]
    fn strategies_agree_with_reference() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..20 {
            let n = rng.gen_range(5..30);
            let mut b = RoadNetworkBuilder::new();
            let nodes: Vec<NodeId> = (0..n)
                .map(|_| b.add_node(GeoPoint::new(rng.gen_range(0.0..0.05), rng.gen_range(0.0..0.05))))
                .collect();
            for _ in 0..n * 2 {
                let u = nodes[rng.gen_range(0..n)];
                let v = nodes[rng.gen_range(0..n)];
                let len = rng.gen_range(1..100) as f64;
                if rng.gen_bool(0.5) {
                    b.add_road(u, v, len);
                } else {
                    b.add_directed_edge(u, v, len);
                }
            }
            let net = b.build();

            let cands = points(
                &(0..6)
                    .map(|_| GeoPoint::new(rng.gen_range(0.0..0.05), rng.gen_range(0.0..0.05)))
                    .collect::<Vec<_>>(),
            );
            let origin = nodes[rng.gen_range(0..n)];
            let reference = reference_distances(&net, origin);
            let expected = cands
                .iter()
                .map(|c| reference[net.nearest_node(c.pos).unwrap().index()])
                .fold(f64::INFINITY, f64::min);

            let per = search(SearchStrategy::PerCandidate)
                .find_best(&net, origin, cands.as_slice(), &QueryTicket::detached())
                .unwrap();
            let multi = search(SearchStrategy::MultiTarget)
                .find_best(&net, origin, cands.as_slice(), &QueryTicket::detached())
                .unwrap();

            assert_eq!(per.best.as_ref().map(|b| b.point), multi.best.as_ref().map(|b| b.point));
            assert_eq!(per.reached, multi.reached);
            match per.best {
                Some(best) => {
                    assert_eq!(best.distance_m(), expected);
                    assert_eq!(multi.best.map(|b| b.distance_m()), Some(expected));
                    assert_eq!(best.route.origin(), origin);
                }
                None => assert!(expected.is_infinite()),
            }
        }
    }
}

// ── Parallel evaluation ───────────────────────────────────────────────────────

#[cfg(all(test, feature = "parallel"))]
mod parallel {
    use ap_core::{GeoPoint, LocatorConfig, NetworkType, PointId, RawPoint, SearchStrategy, TravelMode};
    use ap_spatial::{DijkstraRouter, RoadNetworkBuilder};

    use super::helpers::{A, B, O, line_network, points};
    use crate::{
        BestDestinationSearch, InMemoryNetworkSource, InMemoryPlaceSource, Locator, QueryError,
        QueryOutcome, QueryTicket, SupersedeGate,
    };

    fn pooled(threads: usize) -> BestDestinationSearch<DijkstraRouter> {
        BestDestinationSearch::new(DijkstraRouter, SearchStrategy::PerCandidate)
            .with_threads(Some(threads))
            .unwrap()
    }

    #[test]
    fn pool_matches_sequential_on_ties() {
        let mut b = RoadNetworkBuilder::new();
        let o = b.add_node(O);
        let w = b.add_node(GeoPoint::new(0.0, -0.001));
        let e = b.add_node(GeoPoint::new(0.0, 0.001));
        b.add_road(o, w, 100.0);
        b.add_road(o, e, 100.0);
        let net = b.build();

        let cands = points(&[
            GeoPoint::new(0.0, 0.001),
            GeoPoint::new(0.0, -0.001),
            GeoPoint::new(0.0, 0.0011),
            GeoPoint::new(0.0, -0.0011),
        ]);
        let sequential = BestDestinationSearch::new(DijkstraRouter, SearchStrategy::MultiTarget)
            .find_best(&net, o, cands.as_slice(), &QueryTicket::detached())
            .unwrap();
        assert_eq!(sequential.best.as_ref().map(|b| b.point), Some(PointId::from_index(0)));

        for threads in [1, 2, 4] {
            for _ in 0..10 {
                let report = pooled(threads)
                    .find_best(&net, o, cands.as_slice(), &QueryTicket::detached())
                    .unwrap();
                assert_eq!(report, sequential);
            }
        }
    }

    #[test]
    fn pool_finds_closest_on_line() {
        let (net, [o, a, _]) = line_network();
        let cands = points(&[B, A]);
        let report = pooled(2)
            .find_best(&net, o, cands.as_slice(), &QueryTicket::detached())
            .unwrap();
        let best = report.best.expect("reachable");
        assert_eq!(best.point, PointId::from_index(1));
        assert_eq!(best.route.nodes, vec![o, a]);
    }

    #[test]
    fn stale_ticket_is_superseded_under_pool() {
        let (net, [o, ..]) = line_network();
        let cands = points(&[A, B]);
        let gate = SupersedeGate::new();
        let stale = gate.issue();
        gate.cancel_all();
        for threads in [1, 2] {
            let err = pooled(threads).find_best(&net, o, cands.as_slice(), &stale).unwrap_err();
            assert!(matches!(err, QueryError::Superseded));
        }
    }

    #[test]
    fn zero_threads_is_rejected() {
        let cfg = LocatorConfig { num_threads: Some(0), ..LocatorConfig::default() };
        let r = Locator::new(cfg, InMemoryPlaceSource::new(), InMemoryNetworkSource::new());
        assert!(r.is_err());
    }

    #[test]
    fn locator_with_pinned_threads() {
        let cfg = LocatorConfig { num_threads: Some(1), ..LocatorConfig::default() };
        let places = InMemoryPlaceSource::new()
            .with_place("Line", vec![RawPoint::new(Some("B"), 0.0, 0.002)]);
        let networks = InMemoryNetworkSource::new()
            .with_network("Line", NetworkType::Walk, || line_network().0);
        let loc = Locator::new(cfg, places, networks).unwrap();
        let QueryOutcome::Ready(arrival) = loc.query("Line", TravelMode::Walk, O).unwrap() else {
            panic!("expected a route");
        };
        assert_eq!(arrival.distance_m, 150.0);
    }
}

// ── Pure engine operations ────────────────────────────────────────────────────

#[cfg(test)]
mod engine {
    use ap_core::{GeoPoint, PointSet, SearchStrategy, SkeletonStrategy, TravelMode};
    use ap_core::CoreError;
    use ap_spatial::{DijkstraRouter, RoadNetwork};

    use super::helpers::{A, B, O, line_network, points};
    use crate::{
        BestDestinationSearch, QueryError, QueryTicket, RouteOutcome, TravelEstimator, Unavailable,
        compute_best_route, compute_skeleton, compute_straight_line,
    };

    fn best_route(network: Option<&RoadNetwork>, query: GeoPoint, pts: &PointSet, mode: TravelMode) -> RouteOutcome {
        let search = BestDestinationSearch::new(DijkstraRouter, SearchStrategy::PerCandidate);
        compute_best_route(network, query, pts, mode, &search, &TravelEstimator::default(), &QueryTicket::detached())
            .unwrap()
    }

    #[test]
    fn flight_is_straight_line() {
        let pts = points(&[GeoPoint::new(0.0, 0.01)]);
        let RouteOutcome::Ready(arrival) =
            compute_straight_line(O, &pts, TravelMode::Flight, &TravelEstimator::default()).unwrap()
        else {
            panic!("expected a result");
        };
        assert!((arrival.distance_m - 1112.0).abs() < 2.0, "got {}", arrival.distance_m);
        assert!((arrival.eta_minutes - 1.335).abs() < 0.01, "got {}", arrival.eta_minutes);
        assert!(arrival.route.is_none());
        assert_eq!(arrival.polyline, vec![O, GeoPoint::new(0.0, 0.01)]);
        assert!(arrival.approach_leg().is_none());
    }

    #[test]
    fn flight_ignores_network() {
        let pts = points(&[B, A]);
        let RouteOutcome::Ready(arrival) = best_route(None, O, &pts, TravelMode::Flight) else {
            panic!("flight never needs a network");
        };
        assert_eq!(arrival.point.pos, A);
        assert_eq!(arrival.mode, TravelMode::Flight);
    }

    #[test]
    fn straight_line_without_points() {
        let out = compute_straight_line(O, &PointSet::default(), TravelMode::Flight, &TravelEstimator::default());
        assert_eq!(out.unwrap(), RouteOutcome::NoRouteFound);
    }

    #[test]
    fn straight_line_rejects_invalid_query() {
        let pts = points(&[A]);
        for query in [GeoPoint::new(f64::NAN, 0.0), GeoPoint::new(0.0, 181.0)] {
            let err = compute_straight_line(query, &pts, TravelMode::Flight, &TravelEstimator::default())
                .unwrap_err();
            assert!(matches!(err, QueryError::Core(CoreError::InvalidCoordinate(_))));
        }
    }

    #[test]
    fn best_route_rejects_invalid_query() {
        let (net, _) = line_network();
        let pts = points(&[B]);
        let search = BestDestinationSearch::new(DijkstraRouter, SearchStrategy::PerCandidate);
        for mode in TravelMode::ALL {
            let err = compute_best_route(
                Some(&net),
                GeoPoint::new(f64::NAN, 0.0),
                &pts,
                mode,
                &search,
                &TravelEstimator::default(),
                &QueryTicket::detached(),
            )
            .unwrap_err();
            assert!(matches!(err, QueryError::Core(CoreError::InvalidCoordinate(_))));
        }
    }

    #[test]
    fn road_mode_without_network() {
        let pts = points(&[B]);
        assert_eq!(
            best_route(None, O, &pts, TravelMode::Walk),
            RouteOutcome::DataUnavailable(Unavailable::Graph)
        );
    }

    #[test]
    fn road_mode_on_empty_network() {
        let pts = points(&[B]);
        let empty = RoadNetwork::empty();
        assert_eq!(
            best_route(Some(&empty), O, &pts, TravelMode::Drive),
            RouteOutcome::DataUnavailable(Unavailable::Snap)
        );
    }

    #[test]
    fn walk_route_with_connectors() {
        let (net, [o, a, b]) = line_network();
        let query = GeoPoint::new(0.0001, 0.0);
        let wifi = GeoPoint::new(0.0001, 0.002);
        let pts = points(&[wifi]);

        let RouteOutcome::Ready(arrival) = best_route(Some(&net), query, &pts, TravelMode::Walk) else {
            panic!("expected a route");
        };
        assert_eq!(arrival.route.as_ref().map(|r| r.nodes.clone()), Some(vec![o, a, b]));
        assert_eq!(arrival.distance_m, 150.0);
        assert!((arrival.eta_minutes - 2.0).abs() < 1e-12);
        assert_eq!(arrival.polyline, vec![O, A, B]);
        assert_eq!(arrival.approach_leg(), Some((query, O)));
        assert_eq!(arrival.final_leg(), Some((B, wifi)));
    }

    #[test]
    fn drive_eta_uses_drive_speed() {
        let (net, _) = line_network();
        let pts = points(&[O]);
        let RouteOutcome::Ready(arrival) = best_route(Some(&net), B, &pts, TravelMode::Drive) else {
            panic!("two-way line is connected");
        };
        assert_eq!(arrival.distance_m, 150.0);
        assert!((arrival.eta_minutes - 0.6).abs() < 1e-12);
    }

    #[test]
    fn skeleton_spans_points() {
        let pts = points(&[O, A, B, GeoPoint::new(0.001, 0.0)]);
        for strategy in [SkeletonStrategy::Naive, SkeletonStrategy::Dense] {
            let sk = compute_skeleton(&pts, strategy);
            assert_eq!(sk.len(), 3);
        }
        assert!(compute_skeleton(&points(&[O]), SkeletonStrategy::Naive).is_empty());
    }
}

// ── Locator ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod locator {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ap_core::{CoreError, GeoPoint, LocatorConfig, NetworkType, RawPoint, TravelMode};

    use super::helpers::{O, line_network, line_with_island};
    use crate::{
        InMemoryNetworkSource, InMemoryPlaceSource, Locator, QueryError, QueryOutcome, Unavailable,
    };

    fn places() -> InMemoryPlaceSource {
        InMemoryPlaceSource::new()
            .with_place(
                "Lima",
                vec![
                    RawPoint::new(Some("Cafe"), 0.0, 0.002),
                    RawPoint::new(Some("Cafe again"), 0.0, 0.002),
                    RawPoint::new(None, 0.5, 0.5005),
                    RawPoint::new(Some("  "), 0.0, 0.0011),
                ],
            )
            .with_place("Offline", vec![RawPoint::new(Some("Library"), 0.0, 0.01)])
            .with_place("Empty", Vec::new())
    }

    type TestLocator = Locator<InMemoryPlaceSource, InMemoryNetworkSource>;

    fn locator_counting(fetches: Arc<AtomicUsize>) -> TestLocator {
        let networks = InMemoryNetworkSource::new().with_network("Lima", NetworkType::Walk, move || {
            fetches.fetch_add(1, Ordering::SeqCst);
            line_with_island()
        });
        Locator::new(LocatorConfig::default(), places(), networks).unwrap()
    }

    fn locator() -> TestLocator {
        locator_counting(Arc::new(AtomicUsize::new(0)))
    }

    #[test]
    fn points_are_cleaned_on_load() {
        let loc = locator();
        let pts = loc.load_points("Lima").unwrap();
        assert_eq!(pts.len(), 3);
        let names: Vec<&str> = pts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Cafe", "Public WiFi", "Public WiFi"]);
    }

    #[test]
    fn empty_place_has_no_points() {
        let loc = locator();
        for place in ["Empty", "Atlantis"] {
            let out = loc.query(place, TravelMode::Walk, O).unwrap();
            assert_eq!(out, QueryOutcome::NoPointsAvailable);
            assert!(matches!(loc.load_points(place), Err(QueryError::NoPointsAvailable { .. })));
        }
    }

    #[test]
    fn network_is_restricted_to_largest_component() {
        let loc = locator();
        let net = loc.load_network("Lima", NetworkType::Walk).unwrap();
        assert_eq!(net.node_count(), 3);
    }

    #[test]
    fn walk_query_finds_closest_by_road() {
        let loc = locator();
        let QueryOutcome::Ready(arrival) = loc.query("Lima", TravelMode::Walk, O).unwrap() else {
            panic!("expected a route");
        };
        // The blank-named point next to A beats "Cafe" at B.
        assert_eq!(arrival.point.pos, GeoPoint::new(0.0, 0.0011));
        assert_eq!(arrival.point.name, "Public WiFi");
        assert!(!arrival.point.named);
        assert_eq!(arrival.distance_m, 100.0);
        assert!((arrival.eta_minutes - 100.0 / 75.0).abs() < 1e-12);
    }

    #[test]
    fn network_is_fetched_once_per_selection() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let loc = locator_counting(Arc::clone(&fetches));
        loc.query("Lima", TravelMode::Walk, O).unwrap();
        loc.query("Lima", TravelMode::Walk, GeoPoint::new(0.0, 0.001)).unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        loc.invalidate("Lima");
        loc.query("Lima", TravelMode::Walk, O).unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_network_is_data_unavailable() {
        let loc = locator();
        assert_eq!(
            loc.query("Offline", TravelMode::Walk, O).unwrap(),
            QueryOutcome::DataUnavailable(Unavailable::Graph)
        );
        assert_eq!(
            loc.query("Lima", TravelMode::Drive, O).unwrap(),
            QueryOutcome::DataUnavailable(Unavailable::Graph)
        );
    }

    #[test]
    fn empty_network_is_data_unavailable() {
        let networks = InMemoryNetworkSource::new()
            .with_network("Lima", NetworkType::Walk, ap_spatial::RoadNetwork::empty);
        let loc = Locator::new(LocatorConfig::default(), places(), networks).unwrap();
        assert!(matches!(
            loc.load_network("Lima", NetworkType::Walk),
            Err(QueryError::GraphUnavailable { .. })
        ));
        assert_eq!(
            loc.query("Lima", TravelMode::Walk, O).unwrap(),
            QueryOutcome::DataUnavailable(Unavailable::Graph)
        );
    }

    #[test]
    fn flight_needs_no_network() {
        let loc = locator();
        let QueryOutcome::Ready(arrival) = loc.query("Offline", TravelMode::Flight, O).unwrap() else {
            panic!("flight is straight-line");
        };
        assert_eq!(arrival.point.name, "Library");
        assert!((arrival.distance_m - 1112.0).abs() < 2.0);
    }

    #[test]
    fn invalid_coordinate_is_rejected() {
        let loc = locator();
        let err = loc.query("Lima", TravelMode::Walk, GeoPoint::new(91.0, 0.0)).unwrap_err();
        assert!(matches!(err, QueryError::Core(CoreError::InvalidCoordinate(_))));
    }

    #[test]
    fn stale_ticket_is_superseded() {
        let loc = locator();
        let stale = loc.gate().issue();
        loc.gate().issue();
        let err = loc.query_with("Lima", TravelMode::Walk, O, &stale).unwrap_err();
        assert!(matches!(err, QueryError::Superseded));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = LocatorConfig { drive_speed_m_per_min: 0.0, ..LocatorConfig::default() };
        let r = Locator::new(cfg, places(), InMemoryNetworkSource::new());
        assert!(matches!(r, Err(QueryError::Core(CoreError::Config(_)))));
    }

    #[test]
    fn skeleton_of_place() {
        let loc = locator();
        assert_eq!(loc.skeleton("Lima").unwrap().len(), 2);
        assert!(loc.skeleton("Empty").is_err());
    }

    #[test]
    fn line_network_route_is_exact() {
        let networks = InMemoryNetworkSource::new()
            .with_network("Line", NetworkType::Drive, || line_network().0);
        let places = InMemoryPlaceSource::new()
            .with_place("Line", vec![RawPoint::new(Some("B"), 0.0, 0.002)]);
        let loc = Locator::new(LocatorConfig::default(), places, networks).unwrap();
        let QueryOutcome::Ready(arrival) = loc.query("Line", TravelMode::Drive, O).unwrap() else {
            panic!("expected a route");
        };
        assert_eq!(arrival.distance_m, 150.0);
        assert!((arrival.eta_minutes - 0.6).abs() < 1e-12);
        assert_eq!(arrival.point.name, "B");
    }
}
