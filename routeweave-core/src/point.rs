//! Geographic points supplied by callers.

use geo::Coord;

/// A location to route from or to.
///
/// A point may be missing, which marks it as unroutable. Missing points and
/// points sitting exactly on the origin are considered empty: they can be
/// filtered out before a backend query and restored afterwards.
///
/// # Examples
///
/// ```
/// use routeweave_core::Point;
///
/// let berlin = Point::new(13.388_86, 52.517_037);
/// assert!(!berlin.is_empty());
/// assert!(Point::missing().is_empty());
/// assert!(Point::new(0.0, 0.0).is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// Longitude (`x`) and latitude (`y`), or `None` when unknown.
    pub location: Option<Coord<f64>>,
}

impl Point {
    /// Construct a point from a longitude and latitude.
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self {
            location: Some(Coord { x: lon, y: lat }),
        }
    }

    /// Construct a point without a known location.
    #[must_use]
    pub const fn missing() -> Self {
        Self { location: None }
    }

    /// Whether the point has no location at all.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        self.location.is_none()
    }

    /// Whether the point is missing or sits on `(0, 0)`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.location
            .is_none_or(|coord| coord.x == 0.0 && coord.y == 0.0)
    }
}

impl From<Coord<f64>> for Point {
    fn from(location: Coord<f64>) -> Self {
        Self {
            location: Some(location),
        }
    }
}
