//! Planner - Top-level pipeline from routes and origins to a complete layout
//!
//! This module provides the one-shot planning API: validate the configuration,
//! normalize route geometry, place poles, anchor cabinets, synthesize distribution
//! points and aggregate the result.

use crate::satellite::{ClaimSet, synthesize};
use crate::support::{place_all, validate_spacing};
use crate::{
    AnchorPolicy, AnchoredOrigin, ConnectionEdge, MaterialReport, MaterialSpec, Origin,
    PlanError, Result, Route, RouteFeature, Satellite, Summary, Support, anchor, route,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a planning run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlanConfig {
    /// Distance between consecutive poles along a route, in meters
    pub pole_spacing_m: f64,
    /// Number of satellites requested per origin (fewer may be placed)
    pub satellites_per_origin: usize,
    /// Step length of the satellite walk along a route, in meters
    pub satellite_spacing_m: f64,
    /// How origins pick their anchor support
    pub anchor_policy: AnchorPolicy,
    /// Origins farther than this from every route (meters) are not route-guided
    pub max_projection_m: f64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            pole_spacing_m: 50.0,
            satellites_per_origin: 4,
            satellite_spacing_m: 100.0,
            anchor_policy: AnchorPolicy::NearestSupport,
            max_projection_m: 200.0,
        }
    }
}

impl PlanConfig {
    /// Reject configurations that cannot be planned
    pub fn validate(&self) -> Result<()> {
        validate_spacing(self.pole_spacing_m, "pole spacing")?;
        validate_spacing(self.satellite_spacing_m, "satellite spacing")?;
        if !self.max_projection_m.is_finite() || self.max_projection_m <= 0.0 {
            return Err(PlanError::InvalidConfig(format!(
                "maximum projection distance must be a positive number of meters, got {}",
                self.max_projection_m
            )));
        }
        Ok(())
    }
}

/// A planned layout
///
/// The anchored origin list replaces the raw input origins: each origin's working
/// location is its anchor support.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plan {
    routes: Vec<Route>,
    supports: Vec<Support>,
    origins: Vec<AnchoredOrigin>,
    satellites: Vec<Satellite>,
    edges: Vec<ConnectionEdge>,
    summary: Summary,
    pole_spacing_m: f64,
    satellites_per_origin: usize,
}

impl Plan {
    /// Normalized routes the layout was planned on
    #[inline]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// All poles, ordered by route then position
    #[inline]
    pub fn supports(&self) -> &[Support] {
        &self.supports
    }

    /// Origins resolved to their anchors, in input order
    #[inline]
    pub fn origins(&self) -> &[AnchoredOrigin] {
        &self.origins
    }

    /// Accepted satellites of all origins, in claim order
    #[inline]
    pub fn satellites(&self) -> &[Satellite] {
        &self.satellites
    }

    /// Anchor-to-satellite connections, parallel to [`Plan::satellites`]
    #[inline]
    pub fn edges(&self) -> &[ConnectionEdge] {
        &self.edges
    }

    #[inline]
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Build the material report for this layout
    pub fn material_report(&self, material: &MaterialSpec) -> MaterialReport {
        MaterialReport {
            summary: self.summary.clone(),
            material: material.clone(),
            pole_spacing_m: self.pole_spacing_m,
            satellites_per_origin: self.satellites_per_origin,
        }
    }
}

/// One-shot layout planner
#[derive(Debug, Clone)]
pub struct Planner {
    config: PlanConfig,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Planner {
    /// Create a planner, validating the configuration up front
    pub fn new(config: PlanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    /// Plan a layout for the given route features and origins
    ///
    /// Origins are anchored and served strictly in the supplied order. Zero routes or
    /// zero origins yield an empty plan with an all-zero summary.
    pub fn run(&self, features: Vec<RouteFeature>, origins: Vec<Origin>) -> Result<Plan> {
        #[cfg(feature = "profiling")]
        profiling::scope!("planner::run");

        let config = &self.config;
        let empty = Plan {
            pole_spacing_m: config.pole_spacing_m,
            satellites_per_origin: config.satellites_per_origin,
            ..Plan::default()
        };

        let routes = route::normalize(features)?;
        if routes.is_empty() || origins.is_empty() {
            tracing::info!(
                "Nothing to plan ({} routes, {} origins)",
                routes.len(),
                origins.len()
            );
            return Ok(empty);
        }

        let supports = place_all(&routes, config.pole_spacing_m)?;

        let anchored = origins
            .into_iter()
            .map(|origin| {
                anchor::anchor(
                    origin,
                    &routes,
                    &supports,
                    config.anchor_policy,
                    config.max_projection_m,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let mut claims = ClaimSet::new();
        let mut satellites = Vec::new();
        let mut edges = Vec::new();
        for (origin_index, origin) in anchored.iter().enumerate() {
            let synthesis = synthesize(
                origin_index,
                origin,
                &routes,
                &supports,
                &mut claims,
                config.satellites_per_origin,
                config.satellite_spacing_m,
            )?;
            satellites.extend(synthesis.satellites);
            edges.extend(synthesis.edges);
        }

        let summary = Summary::aggregate(&routes, &supports, &anchored, &satellites, &edges);
        tracing::info!(
            "Planned {} origins: {} supports, {} satellites, {:.1} m feeder, {:.1} m distribution",
            summary.origin_count,
            summary.support_count,
            summary.satellite_count,
            summary.total_route_length_m,
            summary.total_connection_length_m
        );

        Ok(Plan {
            routes,
            supports,
            origins: anchored,
            satellites,
            edges,
            summary,
            ..empty
        })
    }
}
