//! Distance → duration.

use ap_core::{LocatorConfig, TravelMode};

/// Converts a physical distance into minutes using a fixed average speed per
/// [`TravelMode`].  Linear in distance for a fixed mode.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TravelEstimator {
    walk_m_per_min:   f64,
    drive_m_per_min:  f64,
    flight_m_per_min: f64,
}

impl TravelEstimator {
    pub fn from_config(config: &LocatorConfig) -> Self {
        Self {
            walk_m_per_min:   config.speed_m_per_min(TravelMode::Walk),
            drive_m_per_min:  config.speed_m_per_min(TravelMode::Drive),
            flight_m_per_min: config.speed_m_per_min(TravelMode::Flight),
        }
    }

    #[inline]
    pub fn speed_m_per_min(&self, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Walk   => self.walk_m_per_min,
            TravelMode::Drive  => self.drive_m_per_min,
            TravelMode::Flight => self.flight_m_per_min,
        }
    }

    /// Estimated minutes to cover `distance_m` metres under `mode`.
    #[inline]
    pub fn estimate(&self, distance_m: f64, mode: TravelMode) -> f64 {
        distance_m / self.speed_m_per_min(mode)
    }
}

impl Default for TravelEstimator {
    fn default() -> Self {
        Self {
            walk_m_per_min:   TravelMode::Walk.default_speed_m_per_min(),
            drive_m_per_min:  TravelMode::Drive.default_speed_m_per_min(),
            flight_m_per_min: TravelMode::Flight.default_speed_m_per_min(),
        }
    }
}
