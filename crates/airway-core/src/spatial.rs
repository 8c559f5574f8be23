//! Great-circle math for distances, bearings and turn angles.

/// Mean Earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3_440.065;

/// Calculate distance between two points in nautical miles using Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
pub fn haversine_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_NM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Calculate initial bearing from point 1 to point 2 in radians.
/// Returns bearing in radians, 0 = north, π/2 = east.
pub fn initial_bearing_rad(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    x.atan2(y)
}

/// Bearing change in degrees when flying `prev -> current -> next`.
///
/// Points are `(lat, lon)` pairs. The result is folded into `[0, 180]`.
/// Returns `None` when either bearing is not a finite number.
pub fn turn_angle_deg(prev: (f64, f64), current: (f64, f64), next: (f64, f64)) -> Option<f64> {
    let inbound = initial_bearing_rad(prev.0, prev.1, current.0, current.1);
    let outbound = initial_bearing_rad(current.0, current.1, next.0, next.1);
    if !inbound.is_finite() || !outbound.is_finite() {
        return None;
    }

    let mut angle = (outbound - inbound).abs();
    if angle > std::f64::consts::PI {
        angle = 2.0 * std::f64::consts::PI - angle;
    }
    Some(angle.to_degrees())
}
