//! Great-circle distances between locations.

use optiflow_core::domain::Location;

/// Haversine distance between two locations, in the unit of `radius`.
pub fn haversine(from: &Location, to: &Location, radius: f64) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    radius * c
}

/// Distance from `location` to the closest of `depots`, or `None` when
/// there are no depots.
pub fn nearest_depot_distance(location: &Location, depots: &[Location], radius: f64) -> Option<f64> {
    depots
        .iter()
        .map(|depot| haversine(location, depot, radius))
        .min_by(|a, b| a.total_cmp(b))
}
