//! Spherical-earth geometry for coordinates and polylines
//!
//! Coordinates are `geo::Coord<f64>` in degrees, with `x` holding the longitude and `y`
//! the latitude. Every distance returned by this module is in meters.

use geo::{Coord, LineString};

/// Mean earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Two coordinates closer than this in both axes (degrees, roughly 1 cm) are the same point
pub const COORD_EPSILON: f64 = 1e-7;

/// Segments shorter than this (meters) are degenerate and skipped
const MIN_SEGMENT_M: f64 = 1e-9;

/// Closest point on a polyline to some query point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearestPoint {
    /// The projected coordinate, lying on the polyline
    pub coord: Coord<f64>,
    /// Distance from the query point to `coord` in meters
    pub distance_m: f64,
    /// Distance from the polyline start to `coord`, measured along the polyline, in meters
    pub along_m: f64,
}

/// Check whether two coordinates denote the same point (within [`COORD_EPSILON`])
#[inline]
pub fn coords_equal(a: Coord<f64>, b: Coord<f64>) -> bool {
    (a.x - b.x).abs() <= COORD_EPSILON && (a.y - b.y).abs() <= COORD_EPSILON
}

/// Great-circle distance between two coordinates in meters (haversine formula)
#[inline]
pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();
    let delta_lat = (b.y - a.y).to_radians();
    let delta_lon = (b.x - a.x).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

    EARTH_RADIUS_M * c
}

/// Total length of a polyline in meters
#[inline]
pub fn length(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|segment| distance(segment.start, segment.end))
        .sum()
}

/// Coordinate lying `distance_m` meters along the polyline
///
/// The distance is clamped to `[0, length(line)]`: the first vertex is returned for
/// non-positive distances and the last vertex for distances past the end. Inside a
/// segment the position is linearly interpolated between its two vertices.
///
/// Returns `None` only for an empty polyline.
pub fn point_at_distance(line: &LineString<f64>, distance_m: f64) -> Option<Coord<f64>> {
    let first = *line.0.first()?;
    let last = *line.0.last()?;

    if distance_m <= 0.0 {
        return Some(first);
    }

    let mut travelled = 0.0;
    for segment in line.lines() {
        let segment_length = distance(segment.start, segment.end);
        if segment_length < MIN_SEGMENT_M {
            continue;
        }
        if travelled + segment_length >= distance_m {
            let t = (distance_m - travelled) / segment_length;
            return Some(lerp(segment.start, segment.end, t));
        }
        travelled += segment_length;
    }

    Some(last)
}

/// Closest point on the polyline to `point`
///
/// Each segment is handled in a local equirectangular frame anchored at its start
/// vertex: `point` is projected perpendicularly onto the segment and the projection is
/// clamped to the segment's end points. The segment yielding the smallest great-circle
/// distance wins; on ties the earlier segment is kept. Zero-length segments are
/// skipped, so a fully degenerate polyline projects onto its first vertex.
///
/// Returns `None` only for an empty polyline.
pub fn nearest_point(line: &LineString<f64>, point: Coord<f64>) -> Option<NearestPoint> {
    let first = *line.0.first()?;

    let mut best = NearestPoint {
        coord: first,
        distance_m: distance(point, first),
        along_m: 0.0,
    };

    let mut travelled = 0.0;
    for segment in line.lines() {
        let segment_length = distance(segment.start, segment.end);
        if segment_length < MIN_SEGMENT_M {
            continue;
        }

        let t = segment_parameter(segment.start, segment.end, point);
        let coord = lerp(segment.start, segment.end, t);
        let candidate_distance = distance(point, coord);
        if candidate_distance < best.distance_m {
            best = NearestPoint {
                coord,
                distance_m: candidate_distance,
                along_m: travelled + segment_length * t,
            };
        }
        travelled += segment_length;
    }

    Some(best)
}

/// Linear interpolation between two coordinates, `t` in `[0, 1]`
#[inline]
fn lerp(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    Coord {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
    }
}

/// Clamped projection parameter of `p` onto segment `a`-`b`
///
/// Longitudes are scaled by the cosine of the start latitude so that both axes are
/// (approximately) in the same unit near the segment.
#[inline]
fn segment_parameter(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> f64 {
    let lon_scale = a.y.to_radians().cos();

    let dx = (b.x - a.x) * lon_scale;
    let dy = b.y - a.y;
    let px = (p.x - a.x) * lon_scale;
    let py = p.y - a.y;

    let squared_length = dx * dx + dy * dy;
    if squared_length <= 0.0 {
        return 0.0;
    }

    ((px * dx + py * dy) / squared_length).clamp(0.0, 1.0)
}
