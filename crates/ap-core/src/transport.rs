//! Travel modes and the road-network flavour each one needs.
//!
//! `Flight` is a straight-line proxy: it has no road network and every
//! distance under it is a plain [`GeoPoint::distance_m`](crate::GeoPoint::distance_m).

use std::str::FromStr;

use crate::CoreError;

/// How the user intends to reach the access point.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TravelMode {
    /// On foot over the pedestrian network.
    #[default]
    Walk,
    /// Private vehicle over the drivable network (one-way restrictions apply).
    Drive,
    /// As the crow flies; bypasses the road network entirely.
    Flight,
}

/// Which road network a data source should be asked for.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NetworkType {
    Walk,
    Drive,
}

impl TravelMode {
    pub const ALL: [TravelMode; 3] = [TravelMode::Walk, TravelMode::Drive, TravelMode::Flight];

    /// Default average speed in metres per minute.
    ///
    /// | Mode   | m/min | ≈ km/h |
    /// |--------|-------|--------|
    /// | Walk   | 75    | 4.5    |
    /// | Drive  | 250   | 15     |
    /// | Flight | 833   | 50     |
    ///
    /// The drive figure is an urban door-to-door average, not a cruising speed.
    pub fn default_speed_m_per_min(self) -> f64 {
        match self {
            TravelMode::Walk   => 75.0,
            TravelMode::Drive  => 250.0,
            TravelMode::Flight => 833.0,
        }
    }

    /// Road network required for this mode, or `None` for straight-line modes.
    #[inline]
    pub fn network_type(self) -> Option<NetworkType> {
        match self {
            TravelMode::Walk   => Some(NetworkType::Walk),
            TravelMode::Drive  => Some(NetworkType::Drive),
            TravelMode::Flight => None,
        }
    }

    #[inline]
    pub fn uses_road_network(self) -> bool {
        self.network_type().is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Walk   => "walk",
            TravelMode::Drive  => "drive",
            TravelMode::Flight => "flight",
        }
    }
}

impl NetworkType {
    pub fn as_str(self) -> &'static str {
        match self {
            NetworkType::Walk  => "walk",
            NetworkType::Drive => "drive",
        }
    }
}

impl std::fmt::Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walk" | "foot" | "pedestrian"  => Ok(TravelMode::Walk),
            "drive" | "car" | "vehicle"     => Ok(TravelMode::Drive),
            "flight" | "straight" | "crow"  => Ok(TravelMode::Flight),
            other => Err(CoreError::Parse(format!("unknown travel mode {other:?}"))),
        }
    }
}
