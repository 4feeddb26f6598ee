//! Locator configuration.
//!
//! Typically loaded from a TOML/JSON file by the application crate (with the
//! `serde` feature) and handed to the query engine.

use crate::{CoreError, CoreResult, TravelMode};

/// How `BestDestinationSearch` evaluates candidates.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SearchStrategy {
    /// One point-to-point Dijkstra per candidate.  Parallelisable.
    #[default]
    PerCandidate,
    /// A single Dijkstra from the origin that stops once every candidate node
    /// is settled.  Fewer relaxations for large candidate sets.
    MultiTarget,
}

/// Which Prim's variant builds the connectivity skeleton.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SkeletonStrategy {
    /// Full (inside × outside) scan per step, O(V³).
    #[default]
    Naive,
    /// Key-array Prim's, O(V²).  Same total weight; tie order may differ.
    Dense,
}

/// Top-level locator configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LocatorConfig {
    /// Label given to access points the source left unnamed.
    pub default_label: String,

    pub walk_speed_m_per_min: f64,
    pub drive_speed_m_per_min: f64,
    pub flight_speed_m_per_min: f64,

    /// Worker thread count for parallel candidate evaluation.  `None` uses
    /// Rayon's global pool.  Ignored without the `parallel` feature.
    pub num_threads: Option<usize>,

    pub search_strategy: SearchStrategy,
    pub skeleton_strategy: SkeletonStrategy,

    /// Maximum number of `(place, mode)` selections kept per cache.
    pub cache_capacity: usize,

    /// Entries older than this are refetched.  `None` keeps entries for the
    /// whole session.
    pub cache_max_age_secs: Option<u64>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            default_label:          "Public WiFi".to_owned(),
            walk_speed_m_per_min:   TravelMode::Walk.default_speed_m_per_min(),
            drive_speed_m_per_min:  TravelMode::Drive.default_speed_m_per_min(),
            flight_speed_m_per_min: TravelMode::Flight.default_speed_m_per_min(),
            num_threads:            None,
            search_strategy:        SearchStrategy::default(),
            skeleton_strategy:      SkeletonStrategy::default(),
            cache_capacity:         32,
            cache_max_age_secs:     None,
        }
    }
}

impl LocatorConfig {
    /// Configured speed for `mode` in metres per minute.
    pub fn speed_m_per_min(&self, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Walk   => self.walk_speed_m_per_min,
            TravelMode::Drive  => self.drive_speed_m_per_min,
            TravelMode::Flight => self.flight_speed_m_per_min,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        for mode in TravelMode::ALL {
            let v = self.speed_m_per_min(mode);
            if !(v.is_finite() && v > 0.0) {
                return Err(CoreError::Config(format!(
                    "{mode} speed must be positive, got {v}"
                )));
            }
        }
        if self.cache_capacity == 0 {
            return Err(CoreError::Config("cache_capacity must be at least 1".into()));
        }
        if self.num_threads == Some(0) {
            return Err(CoreError::Config("num_threads must be at least 1".into()));
        }
        Ok(())
    }
}
