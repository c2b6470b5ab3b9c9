//! Route preview for the active delivery.
//!
//! The preview is advisory. It is recomputed only after the driver has
//! moved more than [`RECOMPUTE_THRESHOLD_M`] since the last computation, and
//! a routing failure degrades to a straight line rather than an error.

use std::f64::consts::PI;
use std::future::Future;

use bitebox_core::{LatLng, haversine_m};
use thiserror::Error;
use tracing::{debug, warn};

/// Minimum movement, in meters, before the route is recomputed.
pub const RECOMPUTE_THRESHOLD_M: f64 = 25.0;

/// Routing lookup failure.
#[derive(Debug, Error)]
#[error("Routing failed: {0}")]
pub struct RouteError(pub String);

/// Something that can turn two points into a polyline.
pub trait RouteProvider: Send + Sync {
    fn route(
        &self,
        from: LatLng,
        to: LatLng,
    ) -> impl Future<Output = Result<Vec<LatLng>, RouteError>> + Send;
}

/// Offline provider producing a gently curved line between the endpoints.
#[derive(Debug, Clone, Copy)]
pub struct InterpolatedRouteProvider {
    steps: u32,
    curve_degrees: f64,
}

impl Default for InterpolatedRouteProvider {
    fn default() -> Self {
        Self {
            steps: 24,
            // Roughly 50m of lateral bow at the midpoint
            curve_degrees: 0.0005,
        }
    }
}

impl RouteProvider for InterpolatedRouteProvider {
    async fn route(&self, from: LatLng, to: LatLng) -> Result<Vec<LatLng>, RouteError> {
        if self.steps == 0 {
            return Err(RouteError("route needs at least one step".to_string()));
        }
        let steps = f64::from(self.steps);
        Ok((0..=self.steps)
            .map(|i| {
                let t = f64::from(i) / steps;
                let curve = (t * PI).sin() * self.curve_degrees;
                LatLng::new(
                    (to.latitude - from.latitude).mul_add(t, from.latitude) + curve,
                    (to.longitude - from.longitude).mul_add(t, from.longitude) - curve,
                )
            })
            .collect())
    }
}

/// Distance-debounced route cache.
#[derive(Debug)]
pub struct RoutePreview<R> {
    provider: R,
    last_origin: Option<LatLng>,
    polyline: Vec<LatLng>,
}

impl<R: RouteProvider> RoutePreview<R> {
    /// Create an empty preview.
    pub const fn new(provider: R) -> Self {
        Self {
            provider,
            last_origin: None,
            polyline: Vec::new(),
        }
    }

    /// Current polyline; empty until the first update.
    #[must_use]
    pub fn polyline(&self) -> &[LatLng] {
        &self.polyline
    }

    /// Recompute the route from `origin` to `destination` if the driver has
    /// moved far enough. Returns whether a new route was computed.
    pub async fn update(&mut self, origin: LatLng, destination: LatLng) -> bool {
        if let Some(last) = self.last_origin {
            let moved = haversine_m(last, origin);
            if moved <= RECOMPUTE_THRESHOLD_M {
                debug!(moved_m = moved, "Skipping route recompute");
                return false;
            }
        }

        self.polyline = match self.provider.route(origin, destination).await {
            Ok(points) if points.len() >= 2 => points,
            Ok(_) => vec![origin, destination],
            Err(e) => {
                warn!(error = %e, "Route lookup failed, using straight line");
                vec![origin, destination]
            }
        };
        self.last_origin = Some(origin);
        true
    }

    /// Forget the current route.
    pub fn reset(&mut self) {
        self.last_origin = None;
        self.polyline.clear();
    }
}
