//! Pole (support) placement along feeder routes

use crate::{PlanError, Result, Route, geomath};
use geo::Coord;
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance (meters) absorbing floating-point shortfall in the route length when
/// counting how many spacing steps fit on a route
const LENGTH_TOLERANCE_M: f64 = 1e-6;

/// Upper bound on the number of spacing steps placed on a single route
pub const MAX_STEPS_PER_ROUTE: usize = 1_000_000;

/// Global identity of a support within one planning run
///
/// Supports on different routes are never merged, even when they coincide in space;
/// the key keeps them apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SupportKey {
    /// Index of the owning route in the normalized route list
    pub route_index: usize,
    /// Position of the support along its route (0 = route start)
    pub position: usize,
}

/// A pole placed on a route
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Support {
    pub key: SupportKey,
    /// Location (longitude, latitude)
    pub coord: Coord<f64>,
    /// Distance from the route start in meters, within `[0, route length]`
    pub along_m: f64,
}

/// Reject spacings that cannot produce a finite pole sequence
pub(crate) fn validate_spacing(spacing_m: f64, what: &str) -> Result<()> {
    if !spacing_m.is_finite() || spacing_m <= 0.0 {
        return Err(PlanError::InvalidConfig(format!(
            "{what} must be a positive number of meters, got {spacing_m}"
        )));
    }
    Ok(())
}

/// Place supports every `spacing_m` meters along a route
///
/// With `L` the route length, `max(1, floor(L / spacing))` steps are taken and a support
/// is emitted at the start of every step plus the end of the last one, so every route
/// gets at least two supports. Along-route distances never exceed `L`: on a route
/// shorter than one spacing the second support sits on the route end.
///
/// # Errors
/// `InvalidConfig` for a non-positive spacing, or one so small that the route would
/// need more than [`MAX_STEPS_PER_ROUTE`] steps.
pub fn place(route: &Route, route_index: usize, spacing_m: f64) -> Result<Vec<Support>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("support::place");

    validate_spacing(spacing_m, "pole spacing")?;

    let length = route.length();
    let steps = ((length + LENGTH_TOLERANCE_M) / spacing_m).floor();
    if steps > MAX_STEPS_PER_ROUTE as f64 {
        return Err(PlanError::InvalidConfig(format!(
            "pole spacing of {spacing_m} m needs {steps} steps on a {length:.1} m route \
             (at most {MAX_STEPS_PER_ROUTE})"
        )));
    }
    let steps = (steps as usize).max(1);

    let supports = (0..=steps)
        .map(|position| {
            let along_m = (position as f64 * spacing_m).min(length);
            Support {
                key: SupportKey {
                    route_index,
                    position,
                },
                coord: route.point_at(along_m),
                along_m,
            }
        })
        .collect();

    Ok(supports)
}

/// Place supports on every route and concatenate them into one working set
///
/// Routes are processed in parallel; the result is ordered by route index, then by
/// position along the route.
pub fn place_all(routes: &[Route], spacing_m: f64) -> Result<Vec<Support>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("support::place_all");

    validate_spacing(spacing_m, "pole spacing")?;

    let per_route: Vec<Vec<Support>> = routes
        .par_iter()
        .enumerate()
        .map(|(route_index, route)| place(route, route_index, spacing_m))
        .collect::<Result<_>>()?;

    let supports: Vec<Support> = per_route.into_iter().flatten().collect();
    tracing::debug!(
        "Placed {} supports on {} routes ({} m spacing)",
        supports.len(),
        routes.len(),
        spacing_m
    );
    Ok(supports)
}

/// The support closest to `point`, first in working-set order on ties
pub fn nearest_support(supports: &[Support], point: Coord<f64>) -> Option<&Support> {
    let mut best: Option<(&Support, f64)> = None;
    for support in supports {
        let d = geomath::distance(point, support.coord);
        match best {
            Some((_, best_distance)) if d >= best_distance => {}
            _ => best = Some((support, d)),
        }
    }
    best.map(|(support, _)| support)
}
