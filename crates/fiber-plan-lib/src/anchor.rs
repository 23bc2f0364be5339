//! Cabinet (origin) anchoring
//!
//! Every origin is resolved to one support, its anchor. From then on the anchor's
//! coordinate stands in for the origin: downstream placement and all cable length
//! accounting start from the anchor, and the raw input coordinate is dropped.

use crate::support::nearest_support;
use crate::{PlanError, Result, Route, Support};
use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an origin picks its anchor support
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum AnchorPolicy {
    /// The support closest to the origin, over all routes
    #[default]
    NearestSupport,
    /// The first support of the nearest reachable route
    FirstOnLine,
    /// The last support of the nearest reachable route
    LastOnLine,
}

impl AnchorPolicy {
    pub const ALL: [AnchorPolicy; 3] = [
        AnchorPolicy::NearestSupport,
        AnchorPolicy::FirstOnLine,
        AnchorPolicy::LastOnLine,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnchorPolicy::NearestSupport => "nearest-support",
            AnchorPolicy::FirstOnLine => "first-on-line",
            AnchorPolicy::LastOnLine => "last-on-line",
        }
    }
}

impl fmt::Display for AnchorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnchorPolicy {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|policy| policy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                PlanError::InvalidConfig(format!(
                    "unknown anchor policy '{s}' (expected one of: nearest-support, first-on-line, last-on-line)"
                ))
            })
    }
}

/// A demand point (cabinet) to be connected into the network
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Origin {
    /// Raw input location (longitude, latitude)
    pub coord: Coord<f64>,
    /// Free-form name, passed through unmodified
    pub name: Option<String>,
}

impl Origin {
    pub fn new(coord: Coord<f64>, name: Option<String>) -> Self {
        Self { coord, name }
    }
}

/// Projection of a point onto the nearest route
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteProjection {
    /// Index of the route the point projects onto
    pub route_index: usize,
    /// Projected location on that route
    pub coord: Coord<f64>,
    /// Distance from the projected point to the route in meters
    pub distance_m: f64,
    /// Distance of the projection from the route start in meters
    pub along_m: f64,
}

/// An origin resolved to its anchor support
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnchoredOrigin {
    /// Name carried over from the input origin
    pub name: Option<String>,
    /// The support the origin is attached to
    pub anchor: Support,
    /// Projection of the raw origin onto the nearest route within the projection limit.
    /// `None` when no route was within reach, which sends satellite synthesis to its
    /// fallback mode. Only its presence matters there: the walk starts at the anchor.
    pub projection: Option<RouteProjection>,
}

impl AnchoredOrigin {
    /// Working location of the origin: the anchor's coordinate
    #[inline]
    pub fn coord(&self) -> Coord<f64> {
        self.anchor.coord
    }
}

/// Project `point` onto the closest of `routes`, keeping it only within `max_projection_m`
///
/// The globally closest projection wins; on ties the route with the lower index is kept.
pub fn project_onto_routes(
    routes: &[Route],
    point: Coord<f64>,
    max_projection_m: f64,
) -> Option<RouteProjection> {
    let mut best: Option<RouteProjection> = None;
    for (route_index, route) in routes.iter().enumerate() {
        let Some(nearest) = route.nearest_point(point) else {
            continue;
        };
        if best.is_some_and(|b| nearest.distance_m >= b.distance_m) {
            continue;
        }
        best = Some(RouteProjection {
            route_index,
            coord: nearest.coord,
            distance_m: nearest.distance_m,
            along_m: nearest.along_m,
        });
    }

    best.filter(|projection| projection.distance_m <= max_projection_m)
}

/// Resolve an origin to its anchor support under `policy`
///
/// Line policies fall back to the nearest support when no route lies within
/// `max_projection_m` of the origin.
///
/// # Errors
/// `NoSupports` when the support set is empty.
pub fn anchor(
    origin: Origin,
    routes: &[Route],
    supports: &[Support],
    policy: AnchorPolicy,
    max_projection_m: f64,
) -> Result<AnchoredOrigin> {
    #[cfg(feature = "profiling")]
    profiling::scope!("anchor::anchor");

    if supports.is_empty() {
        return Err(PlanError::NoSupports);
    }

    let projection = project_onto_routes(routes, origin.coord, max_projection_m);

    let on_line = match (policy, projection) {
        (AnchorPolicy::NearestSupport, _) | (_, None) => None,
        (AnchorPolicy::FirstOnLine, Some(p)) => supports
            .iter()
            .filter(|s| s.key.route_index == p.route_index)
            .min_by(|a, b| a.along_m.total_cmp(&b.along_m)),
        (AnchorPolicy::LastOnLine, Some(p)) => supports
            .iter()
            .filter(|s| s.key.route_index == p.route_index)
            .max_by(|a, b| a.along_m.total_cmp(&b.along_m)),
    };

    let anchor = match on_line.or_else(|| nearest_support(supports, origin.coord)) {
        Some(support) => *support,
        None => return Err(PlanError::NoSupports),
    };

    tracing::debug!(
        "Anchored origin {} to support {:?} ({policy}, projection: {})",
        origin.name.as_deref().unwrap_or("<unnamed>"),
        anchor.key,
        projection.map_or_else(
            || "none".to_string(),
            |p| format!("route {} at {:.1} m", p.route_index, p.distance_m)
        )
    );

    Ok(AnchoredOrigin {
        name: origin.name,
        anchor,
        projection,
    })
}
