//! Route and route-set models produced by the resolver

use std::cmp::Ordering;

use serde::Serialize;

use super::GeoPoint;
use crate::{DrivoError, Result};

/// A single drivable path between two points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    points: Vec<GeoPoint>,
    distance_meters: f64,
    duration_seconds: f64,
}

impl Route {
    /// Create a route. The polyline needs at least two points and the
    /// distance/duration must be finite and non-negative.
    pub fn new(points: Vec<GeoPoint>, distance_meters: f64, duration_seconds: f64) -> Result<Self> {
        if points.len() < 2 {
            return Err(DrivoError::invalid_request(format!(
                "Route geometry needs at least 2 points, got {}",
                points.len()
            )));
        }
        if !distance_meters.is_finite() || distance_meters < 0.0 {
            return Err(DrivoError::invalid_request(format!(
                "Route distance must be non-negative, got {distance_meters}"
            )));
        }
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(DrivoError::invalid_request(format!(
                "Route duration must be non-negative, got {duration_seconds}"
            )));
        }
        Ok(Self {
            points,
            distance_meters,
            duration_seconds,
        })
    }

    #[must_use]
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    #[must_use]
    pub fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    #[must_use]
    pub fn start(&self) -> GeoPoint {
        self.points[0]
    }

    #[must_use]
    pub fn end(&self) -> GeoPoint {
        self.points[self.points.len() - 1]
    }

    fn selection_order(&self, other: &Route) -> Ordering {
        self.distance_meters
            .total_cmp(&other.distance_meters)
            .then_with(|| self.duration_seconds.total_cmp(&other.duration_seconds))
    }
}

/// Alternatives for one resolution request, shortest first.
///
/// Never empty. Candidates are ordered by ascending distance, then ascending
/// duration, then the order the provider returned them in. The first route
/// is the recommended one used for pricing; the last is the longest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSet {
    routes: Vec<Route>,
    crosses_region_boundary: bool,
}

impl RouteSet {
    /// Order provider candidates into a route set. Fails with `NoRouteFound` when empty.
    pub fn from_candidates(mut candidates: Vec<Route>) -> Result<Self> {
        if candidates.is_empty() {
            return Err(DrivoError::no_route("Provider returned no route candidates"));
        }
        // stable: equal keys keep provider order
        candidates.sort_by(Route::selection_order);
        Ok(Self {
            routes: candidates,
            crosses_region_boundary: false,
        })
    }

    #[must_use]
    pub fn with_region_boundary(mut self, crosses: bool) -> Self {
        self.crosses_region_boundary = crosses;
        self
    }

    /// The route used for pricing
    #[must_use]
    pub fn recommended(&self) -> &Route {
        &self.routes[0]
    }

    #[must_use]
    pub fn shortest(&self) -> &Route {
        &self.routes[0]
    }

    #[must_use]
    pub fn longest(&self) -> &Route {
        &self.routes[self.routes.len() - 1]
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Always false; kept for API symmetry with `len`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    /// Whether origin and destination resolved to different countries.
    /// Only ever true when the resolver runs with a region check.
    #[must_use]
    pub fn crosses_region_boundary(&self) -> bool {
        self.crosses_region_boundary
    }

    #[must_use]
    pub fn into_routes(self) -> Vec<Route> {
        self.routes
    }
}

impl<'a> IntoIterator for &'a RouteSet {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}
