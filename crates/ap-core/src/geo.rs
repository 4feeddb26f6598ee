//! Geographic coordinate type and great-circle distance.
//!
//! `GeoPoint` uses `f64` latitude/longitude.  Access points a few metres apart
//! must stay distinguishable after haversine, and the skeleton compares sums
//! of many short distances, so single precision is not enough here.

/// Mean Earth radius in metres used by every distance in the workspace.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `true` if both components are finite and inside the WGS-84 ranges
    /// (`lat ∈ [-90, 90]`, `lon ∈ [-180, 180]`).
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Haversine great-circle distance in metres.
    ///
    /// Symmetric, and exactly `0.0` for identical coordinates.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        if self == other {
            return 0.0;
        }

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        // Clamp guards asin against a > 1 from rounding on antipodal pairs.
        let c = 2.0 * a.sqrt().min(1.0).asin();
        EARTH_RADIUS_M * c
    }

    /// Planar midpoint in degree space, for placing a label on a short
    /// segment.  Not a great-circle midpoint.
    #[inline]
    pub fn midpoint(self, other: GeoPoint) -> GeoPoint {
        GeoPoint::new((self.lat + other.lat) * 0.5, (self.lon + other.lon) * 0.5)
    }

    /// Key for positional identity.  `-0.0` and `0.0` compare equal as floats
    /// and must also hash equal, hence the `+ 0.0` normalisation.
    #[inline]
    pub fn bits(self) -> (u64, u64) {
        ((self.lat + 0.0).to_bits(), (self.lon + 0.0).to_bits())
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Arithmetic mean of `points` in degree space, used to centre a map view.
///
/// Returns `None` for an empty slice.
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lon) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.lat, lon + p.lon));
    Some(GeoPoint::new(lat / n, lon / n))
}
