//! Satellite (distribution point) synthesis
//!
//! Each anchored origin receives up to `satellites_per_origin` satellites, every one of
//! them snapped onto an existing support. When the origin lies close to a route the
//! satellites are found by walking outward from the anchor along the anchor's route,
//! alternating forward and backward in growing steps (line-guided mode); otherwise the
//! nearest free supports around the anchor are taken (fallback mode).
//!
//! A [`ClaimSet`] shared by all origins of a run makes sure no support is used twice.
//! Origins must be processed in a fixed order for the result to be reproducible.

use crate::support::nearest_support;
use crate::{AnchoredOrigin, PlanError, Result, Route, Support, SupportKey, geomath};
use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Supports already consumed by a satellite during the current run
#[derive(Clone, Debug, Default)]
pub struct ClaimSet {
    keys: HashSet<SupportKey>,
}

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, key: &SupportKey) -> bool {
        self.keys.contains(key)
    }

    /// Mark a support as consumed. Returns `false` if it already was.
    #[inline]
    pub fn claim(&mut self, key: SupportKey) -> bool {
        self.keys.insert(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A distribution point serving one origin, coincident with a support
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Satellite {
    /// Index of the owning origin in the anchored origin list
    pub origin_index: usize,
    /// The support this satellite occupies
    pub key: SupportKey,
    pub coord: Coord<f64>,
}

/// Cable from an origin's anchor to one of its satellites
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConnectionEdge {
    pub origin_index: usize,
    /// Anchor coordinate
    pub from: Coord<f64>,
    /// Satellite coordinate
    pub to: Coord<f64>,
    /// Great-circle length in meters
    pub length_m: f64,
}

/// Which strategy produced a synthesis
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SynthesisMode {
    /// Walk along the anchor's route, outward from the anchor
    LineGuided,
    /// Nearest free supports around the anchor
    Fallback,
}

/// Satellites and edges produced for one origin
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Synthesis {
    pub mode: SynthesisMode,
    pub satellites: Vec<Satellite>,
    pub edges: Vec<ConnectionEdge>,
}

/// Accepts candidate supports for one origin, enforcing the placement rules
struct Acceptor<'a> {
    origin_index: usize,
    anchor: Coord<f64>,
    claims: &'a mut ClaimSet,
    satellites: Vec<Satellite>,
    edges: Vec<ConnectionEdge>,
}

impl<'a> Acceptor<'a> {
    fn new(origin_index: usize, anchor: Coord<f64>, claims: &'a mut ClaimSet) -> Self {
        Self {
            origin_index,
            anchor,
            claims,
            satellites: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Try to turn `support` into a satellite
    ///
    /// Rejected when it sits on the anchor, is claimed already (by any origin), or
    /// coincides with a satellite this origin already has.
    fn offer(&mut self, support: &Support) -> bool {
        if geomath::coords_equal(support.coord, self.anchor)
            || self.claims.contains(&support.key)
            || self
                .satellites
                .iter()
                .any(|s| geomath::coords_equal(s.coord, support.coord))
        {
            return false;
        }

        self.claims.claim(support.key);
        self.satellites.push(Satellite {
            origin_index: self.origin_index,
            key: support.key,
            coord: support.coord,
        });
        self.edges.push(ConnectionEdge {
            origin_index: self.origin_index,
            from: self.anchor,
            to: support.coord,
            length_m: geomath::distance(self.anchor, support.coord),
        });
        true
    }

    fn accepted(&self) -> usize {
        self.satellites.len()
    }

    fn finish(self, mode: SynthesisMode) -> Synthesis {
        Synthesis {
            mode,
            satellites: self.satellites,
            edges: self.edges,
        }
    }
}

/// Along-route target of walk step `i` (1-based): `+1, -1, +2, -2, ...` spacings from `start`
#[inline]
fn walk_target(start_m: f64, i: usize, spacing_m: f64, length_m: f64) -> f64 {
    let step = i.div_ceil(2) as f64;
    let direction = if i % 2 == 1 { 1.0 } else { -1.0 };
    (start_m + direction * step * spacing_m).clamp(0.0, length_m)
}

/// Synthesize the satellites of one anchored origin
///
/// Line-guided mode runs exactly `satellites_per_origin` walk steps; steps that land on
/// an unusable support are skipped without retry, so fewer satellites than requested
/// may be returned. Fallback mode scans all supports by increasing distance from the
/// anchor and stops once the quota is met. Every accepted support is added to `claims`.
///
/// # Errors
/// `NoSupports` when the support set is empty.
pub fn synthesize(
    origin_index: usize,
    anchored: &AnchoredOrigin,
    routes: &[Route],
    supports: &[Support],
    claims: &mut ClaimSet,
    satellites_per_origin: usize,
    spacing_m: f64,
) -> Result<Synthesis> {
    #[cfg(feature = "profiling")]
    profiling::scope!("satellite::synthesize");

    if supports.is_empty() {
        return Err(PlanError::NoSupports);
    }

    let mut acceptor = Acceptor::new(origin_index, anchored.coord(), claims);

    // The raw projection only decides the mode; the walk follows the anchor's own route
    let guide = anchored
        .projection
        .and(routes.get(anchored.anchor.key.route_index));

    let mode = match guide {
        Some(route) => {
            let start = anchored.anchor.along_m;
            let length = route.length();
            for i in 1..=satellites_per_origin {
                let target = walk_target(start, i, spacing_m, length);
                if let Some(support) = nearest_support(supports, route.point_at(target)) {
                    acceptor.offer(support);
                }
            }
            SynthesisMode::LineGuided
        }
        None => {
            let anchor = anchored.coord();
            let mut by_distance: Vec<(f64, &Support)> = supports
                .iter()
                .map(|s| (geomath::distance(anchor, s.coord), s))
                .collect();
            // Stable sort keeps working-set order among equidistant supports
            by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));

            for (_, support) in by_distance {
                if acceptor.accepted() >= satellites_per_origin {
                    break;
                }
                acceptor.offer(support);
            }
            SynthesisMode::Fallback
        }
    };

    if acceptor.accepted() < satellites_per_origin {
        tracing::debug!(
            "Origin {} received {} of {} satellites ({:?})",
            origin_index,
            acceptor.accepted(),
            satellites_per_origin,
            mode
        );
    }

    Ok(acceptor.finish(mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{AnchorPolicy, Origin, anchor};
    use crate::geomath::EARTH_RADIUS_M;
    use crate::support::{place, place_all};
    use approx::assert_abs_diff_eq;
    use geo::LineString;

    fn deg(meters: f64) -> f64 {
        (meters / EARTH_RADIUS_M).to_degrees()
    }

    fn equator_route(meters: f64) -> Route {
        Route::new(LineString::from(vec![(0.0, 0.0), (deg(meters), 0.0)]), None).unwrap()
    }

    fn anchored_at(
        routes: &[Route],
        supports: &[Support],
        along_m: f64,
        north_m: f64,
        max_projection_m: f64,
    ) -> AnchoredOrigin {
        let origin = Origin::new(
            Coord {
                x: deg(along_m),
                y: deg(north_m),
            },
            None,
        );
        anchor(
            origin,
            routes,
            supports,
            AnchorPolicy::NearestSupport,
            max_projection_m,
        )
        .unwrap()
    }

    fn along_of(supports: &[Support], key: SupportKey) -> f64 {
        supports.iter().find(|s| s.key == key).unwrap().along_m
    }

    #[test]
    fn test_walk_target_alternates() {
        let targets: Vec<f64> = (1..=6).map(|i| walk_target(500.0, i, 100.0, 1000.0)).collect();
        assert_eq!(targets, vec![600.0, 400.0, 700.0, 300.0, 800.0, 200.0]);
    }

    #[test]
    fn test_walk_target_clamps() {
        assert_eq!(walk_target(50.0, 2, 100.0, 1000.0), 0.0);
        assert_eq!(walk_target(950.0, 1, 100.0, 1000.0), 1000.0);
    }

    #[test]
    fn test_line_guided_walk() {
        let routes = vec![equator_route(1000.0)];
        let supports = place(&routes[0], 0, 100.0).unwrap();
        let anchored = anchored_at(&routes, &supports, 500.0, 0.0, 200.0);
        let mut claims = ClaimSet::new();

        let synthesis = synthesize(0, &anchored, &routes, &supports, &mut claims, 4, 100.0).unwrap();

        assert_eq!(synthesis.mode, SynthesisMode::LineGuided);
        let positions: Vec<usize> = synthesis.satellites.iter().map(|s| s.key.position).collect();
        assert_eq!(positions, vec![6, 4, 7, 3]);

        let lengths: Vec<f64> = synthesis.edges.iter().map(|e| e.length_m).collect();
        for (length, expected) in lengths.iter().zip([100.0, 100.0, 200.0, 200.0]) {
            assert_abs_diff_eq!(*length, expected, epsilon = 1e-3);
        }
        assert!(synthesis.edges.iter().all(|e| e.from == anchored.coord()));
        assert_eq!(claims.len(), 4);
    }

    fn anchored_with(
        routes: &[Route],
        supports: &[Support],
        along_m: f64,
        north_m: f64,
        policy: AnchorPolicy,
    ) -> AnchoredOrigin {
        let origin = Origin::new(
            Coord {
                x: deg(along_m),
                y: deg(north_m),
            },
            None,
        );
        anchor(origin, routes, supports, policy, 200.0).unwrap()
    }

    #[test]
    fn test_first_on_line_walks_from_anchor() {
        let routes = vec![equator_route(1000.0)];
        let supports = place(&routes[0], 0, 100.0).unwrap();
        let anchored = anchored_with(&routes, &supports, 520.0, 10.0, AnchorPolicy::FirstOnLine);
        assert_eq!(anchored.anchor.key.position, 0);
        let mut claims = ClaimSet::new();

        let synthesis = synthesize(0, &anchored, &routes, &supports, &mut claims, 4, 100.0).unwrap();

        // Backward steps clamp onto the anchor at the route start and are skipped
        assert_eq!(synthesis.mode, SynthesisMode::LineGuided);
        let along: Vec<f64> = synthesis
            .satellites
            .iter()
            .map(|s| along_of(&supports, s.key))
            .collect();
        assert_eq!(along, vec![100.0, 200.0]);
        for (edge, expected) in synthesis.edges.iter().zip([100.0, 200.0]) {
            assert_abs_diff_eq!(edge.length_m, expected, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_last_on_line_walks_from_anchor() {
        let routes = vec![equator_route(1000.0)];
        let supports = place(&routes[0], 0, 100.0).unwrap();
        let anchored = anchored_with(&routes, &supports, 520.0, 10.0, AnchorPolicy::LastOnLine);
        assert_eq!(anchored.anchor.key.position, 10);
        let mut claims = ClaimSet::new();

        let synthesis = synthesize(0, &anchored, &routes, &supports, &mut claims, 4, 100.0).unwrap();

        let along: Vec<f64> = synthesis
            .satellites
            .iter()
            .map(|s| along_of(&supports, s.key))
            .collect();
        assert_eq!(along, vec![900.0, 800.0]);
        let total: f64 = synthesis.edges.iter().map(|e| e.length_m).sum();
        assert_abs_diff_eq!(total, 300.0, epsilon = 1e-3);
    }

    #[test]
    fn test_walk_follows_anchor_route_not_projection_route() {
        // The origin projects onto the equator route (40 m away) but its nearest pole is
        // the first one of a northbound route starting 100 m north of the equator
        let northbound = Route::new(
            LineString::from(vec![(deg(200.0), deg(100.0)), (deg(200.0), deg(1100.0))]),
            None,
        )
        .unwrap();
        let routes = vec![equator_route(1000.0), northbound];
        let supports = place_all(&routes, 400.0).unwrap();
        let anchored = anchored_with(&routes, &supports, 200.0, 40.0, AnchorPolicy::NearestSupport);
        assert_eq!(anchored.projection.unwrap().route_index, 0);
        assert_eq!(anchored.anchor.key, SupportKey { route_index: 1, position: 0 });
        let mut claims = ClaimSet::new();

        let synthesis = synthesize(0, &anchored, &routes, &supports, &mut claims, 3, 400.0).unwrap();

        assert_eq!(synthesis.mode, SynthesisMode::LineGuided);
        let keys: Vec<SupportKey> = synthesis.satellites.iter().map(|s| s.key).collect();
        assert_eq!(
            keys,
            vec![
                SupportKey { route_index: 1, position: 1 },
                SupportKey { route_index: 1, position: 2 },
            ]
        );
        for (edge, expected) in synthesis.edges.iter().zip([400.0, 800.0]) {
            assert_abs_diff_eq!(edge.length_m, expected, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_line_guided_skips_anchor_and_undersupplies() {
        let routes = vec![equator_route(1000.0)];
        let supports = place(&routes[0], 0, 100.0).unwrap();
        // Anchored at the route start: every backward step clamps onto the anchor
        let anchored = anchored_at(&routes, &supports, 0.0, 0.0, 200.0);
        let mut claims = ClaimSet::new();

        let synthesis = synthesize(0, &anchored, &routes, &supports, &mut claims, 4, 100.0).unwrap();

        let positions: Vec<usize> = synthesis.satellites.iter().map(|s| s.key.position).collect();
        assert_eq!(positions, vec![1, 2]);
        assert!(
            synthesis
                .satellites
                .iter()
                .all(|s| !geomath::coords_equal(s.coord, anchored.coord()))
        );
    }

    #[test]
    fn test_line_guided_respects_earlier_claims() {
        let routes = vec![equator_route(1000.0)];
        let supports = place(&routes[0], 0, 100.0).unwrap();
        let mut claims = ClaimSet::new();

        let first = anchored_at(&routes, &supports, 500.0, 0.0, 200.0);
        let second = anchored_at(&routes, &supports, 600.0, 0.0, 200.0);

        let a = synthesize(0, &first, &routes, &supports, &mut claims, 2, 100.0).unwrap();
        let b = synthesize(1, &second, &routes, &supports, &mut claims, 2, 100.0).unwrap();

        // First origin claims 600 and 400; the second origin sits on 600 (its anchor),
        // so its walk targets 700 (free) and 500 (free, the first origin's anchor)
        assert_eq!(
            a.satellites.iter().map(|s| along_of(&supports, s.key)).collect::<Vec<_>>(),
            vec![600.0, 400.0]
        );
        assert_eq!(
            b.satellites.iter().map(|s| along_of(&supports, s.key)).collect::<Vec<_>>(),
            vec![700.0, 500.0]
        );
        assert_eq!(claims.len(), 4);
        assert!(b.satellites.iter().all(|s| s.origin_index == 1));
    }

    #[test]
    fn test_fallback_takes_nearest_free_supports() {
        let routes = vec![equator_route(1000.0)];
        let supports = place(&routes[0], 0, 100.0).unwrap();
        // 800 m north of the 300 m mark: out of projection reach
        let anchored = anchored_at(&routes, &supports, 300.0, 800.0, 200.0);
        assert!(anchored.projection.is_none());
        assert_eq!(anchored.anchor.key.position, 3);

        let mut claims = ClaimSet::new();
        claims.claim(SupportKey {
            route_index: 0,
            position: 2,
        });

        let synthesis = synthesize(0, &anchored, &routes, &supports, &mut claims, 3, 100.0).unwrap();

        assert_eq!(synthesis.mode, SynthesisMode::Fallback);
        let mut positions: Vec<usize> =
            synthesis.satellites.iter().map(|s| s.key.position).collect();
        // 4 is the only free support 100 m away (2 is claimed); 1 and 5 follow at 200 m
        assert_eq!(positions[0], 4);
        positions[1..].sort_unstable();
        assert_eq!(positions, vec![4, 1, 5]);
        assert_eq!(claims.len(), 4);
    }

    #[test]
    fn test_fallback_undersupply_is_not_an_error() {
        let routes = vec![equator_route(300.0)];
        let supports = place(&routes[0], 0, 100.0).unwrap();
        let anchored = anchored_at(&routes, &supports, 0.0, 1000.0, 200.0);
        let mut claims = ClaimSet::new();

        let synthesis = synthesize(0, &anchored, &routes, &supports, &mut claims, 6, 100.0).unwrap();

        assert_eq!(synthesis.mode, SynthesisMode::Fallback);
        assert_eq!(synthesis.satellites.len(), 3);
        assert_eq!(synthesis.edges.len(), 3);
    }

    #[test]
    fn test_coincident_supports_are_not_doubled() {
        // Two identical routes produce pairwise coincident supports with distinct keys
        let routes = vec![equator_route(300.0), equator_route(300.0)];
        let supports = place_all(&routes, 100.0).unwrap();
        let anchored = anchored_at(&routes, &supports, 0.0, 1000.0, 200.0);
        let mut claims = ClaimSet::new();

        let synthesis = synthesize(0, &anchored, &routes, &supports, &mut claims, 6, 100.0).unwrap();

        // The anchor's twin is skipped and each remaining location is used once
        assert_eq!(synthesis.satellites.len(), 3);
        for (i, a) in synthesis.satellites.iter().enumerate() {
            for b in &synthesis.satellites[i + 1..] {
                assert!(!geomath::coords_equal(a.coord, b.coord));
            }
        }
    }

    #[test]
    fn test_zero_quota() {
        let routes = vec![equator_route(1000.0)];
        let supports = place(&routes[0], 0, 100.0).unwrap();
        let anchored = anchored_at(&routes, &supports, 500.0, 0.0, 200.0);
        let mut claims = ClaimSet::new();

        let synthesis = synthesize(0, &anchored, &routes, &supports, &mut claims, 0, 100.0).unwrap();
        assert!(synthesis.satellites.is_empty());
        assert!(claims.is_empty());
    }

    #[test]
    fn test_empty_supports_fail() {
        let routes = vec![equator_route(1000.0)];
        let supports = place(&routes[0], 0, 100.0).unwrap();
        let anchored = anchored_at(&routes, &supports, 500.0, 0.0, 200.0);
        let mut claims = ClaimSet::new();

        let result = synthesize(0, &anchored, &routes, &[], &mut claims, 4, 100.0);
        assert!(matches!(result, Err(PlanError::NoSupports)));
    }
}
