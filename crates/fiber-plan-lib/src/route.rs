//! Feeder route storage and geometry normalization
//!
//! Input lines arrive either as a single line or as a multi-part line. Both are
//! normalized into a flat sequence of simple [`Route`]s before any pole placement, so
//! downstream code never branches on geometry shape.

use crate::{PlanError, Result, geomath};
use geo::{Coord, LineString, MultiLineString};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Geometry of a decoded input line
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RouteGeometry {
    /// A single polyline
    Line(LineString<f64>),
    /// Several polylines sharing the same attributes
    MultiLine(MultiLineString<f64>),
}

/// A decoded input line with its optional name
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteFeature {
    pub name: Option<String>,
    pub geometry: RouteGeometry,
}

/// A single feeder route with precomputed length
///
/// A route always holds at least two coordinates. Its identity within a planning run
/// is its index in the normalized route list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Route {
    /// Ordered route coordinates (longitude, latitude)
    line: LineString<f64>,
    /// Optional name carried over from the input feature
    name: Option<String>,
    /// Cached total length in meters (computed once during construction)
    cached_length: f64,
}

impl RouteFeature {
    /// Create a named single-line feature
    pub fn line(name: impl Into<String>, line: LineString<f64>) -> Self {
        Self {
            name: Some(name.into()),
            geometry: RouteGeometry::Line(line),
        }
    }

    /// Split the feature into simple routes, one per part
    pub fn into_routes(self) -> Result<Vec<Route>> {
        let name = self.name;
        match self.geometry {
            RouteGeometry::Line(line) => Ok(vec![Route::new(line, name)?]),
            RouteGeometry::MultiLine(multi) => multi
                .0
                .into_iter()
                .map(|line| Route::new(line, name.clone()))
                .collect(),
        }
    }
}

/// Normalize decoded features into the flat route list used for a planning run
pub fn normalize(features: Vec<RouteFeature>) -> Result<Vec<Route>> {
    let mut routes = Vec::with_capacity(features.len());
    for feature in features {
        routes.extend(feature.into_routes()?);
    }
    Ok(routes)
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Route {
    /// Create a new route from a polyline
    ///
    /// # Returns
    /// The route on success, or `InvalidGeometry` if the line has fewer than two coordinates
    pub fn new(line: LineString<f64>, name: Option<String>) -> Result<Self> {
        if line.0.len() < 2 {
            return Err(PlanError::InvalidGeometry(format!(
                "route {} has {} coordinate(s), at least 2 are required",
                name.as_deref().unwrap_or("<unnamed>"),
                line.0.len()
            )));
        }

        let cached_length = geomath::length(&line);
        Ok(Self {
            line,
            name,
            cached_length,
        })
    }

    /// Access the underlying polyline
    #[inline]
    pub fn line(&self) -> &LineString<f64> {
        &self.line
    }

    /// Route name, if the input provided one
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Total length in meters
    ///
    /// This is O(1) as the value is cached during construction.
    #[inline]
    pub fn length(&self) -> f64 {
        self.cached_length
    }

    /// Coordinate `distance_m` meters along the route, clamped to the route ends
    pub fn point_at(&self, distance_m: f64) -> Coord<f64> {
        // Construction guarantees at least two coordinates, so the lookup cannot miss
        geomath::point_at_distance(&self.line, distance_m).unwrap_or_default()
    }

    /// Closest point on the route to `point`
    pub fn nearest_point(&self, point: Coord<f64>) -> Option<geomath::NearestPoint> {
        geomath::nearest_point(&self.line, point)
    }
}
