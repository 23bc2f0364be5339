//! Fiber Plan Library - Core Layout Synthesis for Fiber Distribution Networks
//!
//! This library turns a set of feeder routes and cabinet locations into a distribution
//! layout: poles placed at fixed intervals along every route, each cabinet snapped to a
//! pole, and a bounded number of distribution points per cabinet claimed from the
//! remaining poles, together with the cable lengths needed to connect them.
//!
//! # Architecture
//!
//! - **[`geomath`]**: Spherical-earth distance and polyline referencing helpers
//! - **[`Route`]**: Immutable feeder route with cached length
//! - **[`support`]**: Pole placement along routes
//! - **[`anchor`]**: Cabinet-to-pole resolution under an [`AnchorPolicy`]
//! - **[`satellite`]**: Distribution point synthesis with global collision avoidance
//! - **[`Summary`]**: Derived counts and lengths, plus the [`MaterialReport`]
//! - **[`Planner`]**: One-shot pipeline tying all of the above together
//!
//! # Determinism
//!
//! Cabinets are processed in the order they are supplied. Poles claimed by an earlier
//! cabinet are unavailable to later ones, so reordering the input can change the layout,
//! but the same input always produces the same layout.

pub mod anchor;
pub mod geomath;
pub mod input;
mod plan;
mod route;
pub mod satellite;
mod summary;
pub mod support;

// Public API exports
pub use anchor::{AnchorPolicy, AnchoredOrigin, Origin, RouteProjection};
pub use input::PlanInput;
pub use plan::{Plan, PlanConfig, Planner};
pub use route::{Route, RouteFeature, RouteGeometry};
pub use satellite::{ClaimSet, ConnectionEdge, Satellite, Synthesis, SynthesisMode};
pub use summary::{MaterialReport, MaterialSpec, Summary};
pub use support::{Support, SupportKey};

/// Error types for layout planning
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No supports available to anchor against")]
    NoSupports,

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlanError>;
