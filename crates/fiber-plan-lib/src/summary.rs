//! Aggregated layout metrics and the material report built on top of them

use crate::{AnchoredOrigin, ConnectionEdge, PlanError, Result, Route, Satellite, Support};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Counts and cable lengths of a planned layout
///
/// Every field is derived from the layout collections; a summary never carries state of
/// its own, so re-aggregating the same collections always yields the same summary.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Summary {
    pub route_count: usize,
    pub support_count: usize,
    pub origin_count: usize,
    pub satellite_count: usize,
    /// Sum of all route lengths in meters (feeder cable)
    pub total_route_length_m: f64,
    /// Sum of all connection edge lengths in meters (distribution cable)
    pub total_connection_length_m: f64,
}

impl Summary {
    /// Reduce layout collections into a summary
    pub fn aggregate(
        routes: &[Route],
        supports: &[Support],
        origins: &[AnchoredOrigin],
        satellites: &[Satellite],
        edges: &[ConnectionEdge],
    ) -> Self {
        Self {
            route_count: routes.len(),
            support_count: supports.len(),
            origin_count: origins.len(),
            satellite_count: satellites.len(),
            total_route_length_m: routes.iter().map(Route::length).sum(),
            total_connection_length_m: edges.iter().map(|e| e.length_m).sum(),
        }
    }
}

/// Pole height classes available for support structures, in meters
pub const POLE_HEIGHTS_M: [u32; 3] = [6, 7, 9];

/// Feeder cable core counts available
pub const FEEDER_CORES: [u32; 4] = [12, 24, 48, 96];

/// Material attributes passed through to the report unchanged
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaterialSpec {
    /// Pole height class in meters
    pub pole_height_m: u32,
    /// Feeder cable core count
    pub feeder_cores: u32,
}

impl Default for MaterialSpec {
    fn default() -> Self {
        Self {
            pole_height_m: 6,
            feeder_cores: 12,
        }
    }
}

impl MaterialSpec {
    /// Check the attributes against the available catalog values
    pub fn validate(&self) -> Result<()> {
        if !POLE_HEIGHTS_M.contains(&self.pole_height_m) {
            return Err(PlanError::InvalidConfig(format!(
                "pole height must be one of {POLE_HEIGHTS_M:?} m, got {} m",
                self.pole_height_m
            )));
        }
        if !FEEDER_CORES.contains(&self.feeder_cores) {
            return Err(PlanError::InvalidConfig(format!(
                "feeder core count must be one of {FEEDER_CORES:?}, got {}",
                self.feeder_cores
            )));
        }
        Ok(())
    }
}

/// Bill of materials for a planned layout
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaterialReport {
    pub summary: Summary,
    pub material: MaterialSpec,
    /// Configured pole spacing in meters
    pub pole_spacing_m: f64,
    /// Requested satellites per origin (the accepted count is in the summary)
    pub satellites_per_origin: usize,
}

impl fmt::Display for MaterialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;
        writeln!(f, "Material report")?;
        writeln!(f, "  Cabinets (ODC):           {}", s.origin_count)?;
        writeln!(f, "  ODP per cabinet:          {}", self.satellites_per_origin)?;
        writeln!(f, "  Distribution points:      {}", s.satellite_count)?;
        writeln!(f, "  Pole type:                {} m", self.material.pole_height_m)?;
        writeln!(f, "  Pole spacing:             {} m", self.pole_spacing_m)?;
        writeln!(f, "  Poles:                    {}", s.support_count)?;
        writeln!(f, "  Feeder routes:            {}", s.route_count)?;
        writeln!(f, "  Feeder cable:             {} core", self.material.feeder_cores)?;
        writeln!(f, "  Feeder cable length:      {:.1} m", s.total_route_length_m)?;
        write!(f, "  Distribution cable length: {:.1} m", s.total_connection_length_m)
    }
}
