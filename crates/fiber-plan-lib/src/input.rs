//! GPX input decoding
//!
//! Every GPX track and route becomes a feeder route feature; every standalone waypoint
//! becomes an origin. No keyword-based classification is performed.

use crate::{Origin, Result, RouteFeature, RouteGeometry};
use geo::{LineString, MultiLineString};
use rayon::prelude::*;
use std::io::Read;
use std::path::Path;

/// Decoded planning input
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlanInput {
    pub routes: Vec<RouteFeature>,
    pub origins: Vec<Origin>,
}

impl PlanInput {
    /// Append another input, keeping its order after this one
    pub fn merge(&mut self, other: PlanInput) {
        self.routes.extend(other.routes);
        self.origins.extend(other.origins);
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.origins.is_empty()
    }
}

/// Convert waypoints into a polyline, `None` if too short to form a route
fn waypoints_to_line(points: &[gpx::Waypoint], owner: Option<&str>) -> Option<LineString<f64>> {
    if points.len() < 2 {
        tracing::warn!(
            "Skipping line {} with {} point(s)",
            owner.unwrap_or("<unnamed>"),
            points.len()
        );
        return None;
    }
    Some(points.iter().map(|waypoint| waypoint.point().0).collect())
}

/// Convert parsed GPX data into planning input
pub fn from_gpx(gpx_data: gpx::Gpx) -> PlanInput {
    let mut input = PlanInput::default();

    for track in gpx_data.tracks {
        let name = track.name;
        let mut lines: Vec<LineString<f64>> = track
            .segments
            .iter()
            .filter_map(|segment| waypoints_to_line(&segment.points, name.as_deref()))
            .collect();

        let geometry = match lines.len() {
            0 => continue,
            1 => RouteGeometry::Line(lines.remove(0)),
            _ => RouteGeometry::MultiLine(MultiLineString::new(lines)),
        };
        input.routes.push(RouteFeature { name, geometry });
    }

    for route in gpx_data.routes {
        if let Some(line) = waypoints_to_line(&route.points, route.name.as_deref()) {
            input.routes.push(RouteFeature {
                name: route.name,
                geometry: RouteGeometry::Line(line),
            });
        }
    }

    input.origins = gpx_data
        .waypoints
        .into_iter()
        .map(|waypoint| Origin::new(waypoint.point().0, waypoint.name))
        .collect();

    input
}

/// Read planning input from a GPX document
pub fn read_gpx<R: Read>(reader: R) -> Result<PlanInput> {
    let gpx_data = gpx::read(reader)?;
    Ok(from_gpx(gpx_data))
}

/// Load planning input from GPX files in parallel
///
/// Files are decoded concurrently but merged in the order given, so route and origin
/// indices are stable across runs.
pub fn load_from_files<P: AsRef<Path> + Send + Sync>(paths: Vec<P>) -> Result<PlanInput> {
    #[cfg(feature = "profiling")]
    profiling::scope!("input::load_from_files");

    let inputs: Vec<PlanInput> = paths
        .par_iter()
        .map(|path| -> Result<PlanInput> {
            let file = std::fs::File::open(path.as_ref())?;
            let input = read_gpx(std::io::BufReader::new(file))?;
            tracing::debug!(
                "Loaded {}: {} routes, {} origins",
                path.as_ref().display(),
                input.routes.len(),
                input.origins.len()
            );
            Ok(input)
        })
        .collect::<Result<_>>()?;

    let mut merged = PlanInput::default();
    for input in inputs {
        merged.merge(input);
    }
    Ok(merged)
}
