//! Geographic positions and great-circle distance.

/// Mean Earth radius in metres (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 coordinate in decimal degrees.
///
/// Used both for station positions and for the user's device location.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    /// Create a new position.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in metres (haversine formula).
    ///
    /// # Examples
    ///
    /// ```
    /// use velo_stations::domain::Position;
    ///
    /// let a = Position::new(47.2380, 6.0243);
    /// assert_eq!(a.distance_to(&a), 0.0);
    /// ```
    pub fn distance_to(&self, other: &Position) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// `geo:` URI understood by map applications, labelled with `label`.
    pub fn geo_uri(&self, label: &str) -> String {
        format!(
            "geo:{lat},{lon}?q={lat},{lon}({label})",
            lat = self.latitude,
            lon = self.longitude,
        )
    }

    /// Web maps link, for when no map application handles `geo:`.
    pub fn maps_url(&self) -> String {
        format!(
            "https://maps.google.com/maps?q={},{}",
            self.latitude, self.longitude
        )
    }
}
