//! Geographic to plane projection
//! Uses the spherical Mercator transform, normalized to the unit square

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Latitude limit of the square Mercator plane (same bound OSM tiles use)
pub const MAX_LATITUDE: f64 = 85.05112878;

/// A geographic position in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Arithmetic mean of latitude and longitude.
    ///
    /// Not geodesically correct (ignores the antimeridian), which is fine for
    /// grouping markers that are already close on screen.
    pub fn mean<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> Option<GeoPoint> {
        let mut count = 0usize;
        let (mut lat, mut lon) = (0.0, 0.0);
        for p in points {
            lat += p.latitude;
            lon += p.longitude;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(GeoPoint::new(lat / count as f64, lon / count as f64))
    }
}

/// Position on the projected plane, both axes in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanePoint {
    pub x: f64,
    pub y: f64,
}

/// Project a geographic position onto the unit plane
pub fn to_plane(geo: GeoPoint) -> PlanePoint {
    let x = (normalize_longitude(geo.longitude) + 180.0) / 360.0;

    let lat_rad = clamp_latitude(geo.latitude).to_radians();
    let mercator_n = (PI / 4.0 + lat_rad / 2.0).tan().ln();
    let y = 0.5 - mercator_n / (2.0 * PI);

    // Rounding at the clamp boundary can land a hair outside the plane
    PlanePoint {
        x: x.clamp(0.0, 1.0),
        y: y.clamp(0.0, 1.0),
    }
}

/// Inverse of [`to_plane`]
pub fn to_geo(plane: PlanePoint) -> GeoPoint {
    let longitude = plane.x * 360.0 - 180.0;
    let latitude = (2.0 * (PI * (1.0 - 2.0 * plane.y)).exp().atan() - PI / 2.0).to_degrees();
    GeoPoint::new(latitude, longitude)
}

/// Normalize longitude to [-180, 180]
pub fn normalize_longitude(lon: f64) -> f64 {
    if !lon.is_finite() {
        return 0.0;
    }
    let mut l = lon;
    while l < -180.0 {
        l += 360.0;
    }
    while l > 180.0 {
        l -= 360.0;
    }
    l
}

/// Clamp latitude to valid Mercator range
pub fn clamp_latitude(lat: f64) -> f64 {
    if !lat.is_finite() {
        return 0.0;
    }
    lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
}
