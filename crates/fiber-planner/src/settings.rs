use clap::Parser;
use fiber_plan_lib::{AnchorPolicy, MaterialSpec, PlanConfig, PlanError};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Fiber Planner - Plan poles, cabinet anchors and distribution points along feeder routes
pub struct Settings {
    /// GPX files to plan from (tracks and routes are feeders, waypoints are cabinets)
    #[clap(short, long, value_name = "FILE", required = true, num_args = 1..)]
    pub gpx_files: Vec<PathBuf>,

    /// Distance between poles along a feeder route, in meters
    #[clap(long, default_value = "50")]
    pub pole_spacing: f64,

    /// Distribution points requested per cabinet
    #[clap(long, default_value = "4")]
    pub satellites_per_origin: usize,

    /// Step between distribution points when walking along a feeder, in meters
    #[clap(long, default_value = "100")]
    pub satellite_spacing: f64,

    /// Cabinet anchoring policy: nearest-support, first-on-line or last-on-line
    #[clap(long, default_value = "nearest-support", value_parser = parse_anchor_policy)]
    pub anchor_policy: AnchorPolicy,

    /// Cabinets farther than this from every feeder (meters) use nearby poles instead
    #[clap(long, default_value = "200")]
    pub max_projection: f64,

    /// Pole height class in meters (6, 7 or 9)
    #[clap(long, default_value = "6")]
    pub pole_height: u32,

    /// Feeder cable core count (12, 24, 48 or 96)
    #[clap(long, default_value = "12")]
    pub feeder_cores: u32,

    /// Print the full plan as JSON instead of the material report
    #[clap(long, default_value = "false")]
    pub json: bool,
}

fn parse_anchor_policy(value: &str) -> Result<AnchorPolicy, String> {
    value
        .parse::<AnchorPolicy>()
        .map_err(|e: PlanError| e.to_string())
}

impl Settings {
    /// Parse settings from the command line, exiting with usage help on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    pub fn plan_config(&self) -> PlanConfig {
        PlanConfig {
            pole_spacing_m: self.pole_spacing,
            satellites_per_origin: self.satellites_per_origin,
            satellite_spacing_m: self.satellite_spacing,
            anchor_policy: self.anchor_policy,
            max_projection_m: self.max_projection,
        }
    }

    pub fn material_spec(&self) -> MaterialSpec {
        MaterialSpec {
            pole_height_m: self.pole_height,
            feeder_cores: self.feeder_cores,
        }
    }
}
