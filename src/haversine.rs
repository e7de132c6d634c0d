//! Great-circle distance between coordinates.
//!
//! Used as the straight-line bound for computed paths and as the length of
//! fallback segments.

/// Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Default walking speed in meters per minute (~5 km/h).
pub const DEFAULT_WALKING_SPEED_M_PER_MIN: f64 = 83.33;

/// Haversine distance between two `(lat, lng)` points in meters.
pub fn haversine_m(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Minutes needed to walk `meters` at `speed_m_per_min`, rounded to the
/// nearest minute.
pub fn walking_minutes(meters: f64, speed_m_per_min: f64) -> u32 {
    if meters <= 0.0 || speed_m_per_min <= 0.0 {
        return 0;
    }
    (meters / speed_m_per_min).round() as u32
}
