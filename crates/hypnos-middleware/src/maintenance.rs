//! The maintenance-mode gate.

use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use tracing::{debug, error};

use hypnos_core::{MaintenanceState, StateResult};

use crate::callbacks::{ExemptPredicate, MaintenanceResponder};
use crate::error::BuildError;
use crate::markers::{OverrideMap, RouteOverride};
use crate::types::{Next, Request, Response};

/// Body text of the default maintenance response.
pub const DEFAULT_MAINTENANCE_DETAIL: &str = "Service temporarily unavailable due to maintenance";

/// `Retry-After` value (seconds) on the default maintenance response.
pub const RETRY_AFTER_SECS: u32 = 3600;

/// The request gate.
///
/// Resolves the effective maintenance state for each request and either
/// runs the downstream handler or answers with the maintenance response.
/// Evaluation order is fixed:
///
/// 1. route force-off marker → handler
/// 2. route force-on marker → maintenance response
/// 3. exemption predicate → handler
/// 4. the flag (the [`force`](MaintenanceModeBuilder::force) value if
///    configured, else a backend read) → handler or maintenance response
///
/// The gate is read-only with respect to the flag, and a backend read
/// failure is logged and treated as "inactive" - a broken flag store must
/// not take the service down with it. Use [`preflight`](Self::preflight)
/// at startup to surface such failures loudly instead.
pub struct MaintenanceModeMiddleware {
    state: MaintenanceState,
    force: Option<bool>,
    overrides: OverrideMap,
    exempt: Option<Arc<dyn ExemptPredicate>>,
    responder: Option<Arc<dyn MaintenanceResponder>>,
}

impl MaintenanceModeMiddleware {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> MaintenanceModeBuilder {
        MaintenanceModeBuilder::default()
    }

    /// Creates a gate over the given state with no markers or callbacks.
    #[must_use]
    pub fn new(state: MaintenanceState) -> Self {
        Self {
            state,
            force: None,
            overrides: OverrideMap::default(),
            exempt: None,
            responder: None,
        }
    }

    /// Returns the state handle the gate reads from.
    #[must_use]
    pub fn state(&self) -> &MaintenanceState {
        &self.state
    }

    /// Performs one backend read, propagating any failure.
    ///
    /// Call this at startup: a misconfigured backend then fails the boot
    /// instead of being silently papered over on every request.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](hypnos_core::StateError) when the backend
    /// cannot be read.
    pub async fn preflight(&self) -> StateResult<bool> {
        self.state.is_active().await
    }

    /// Gates one request.
    pub async fn handle(&self, request: Request, next: Next) -> Response {
        let path = request.uri().path();

        match self.overrides.lookup(path) {
            Some(RouteOverride::ForceOff) => {
                debug!(path, "maintenance gating bypassed by force-off marker");
                return next.run(request).await;
            }
            Some(RouteOverride::ForceOn) => {
                debug!(path, "maintenance forced on by route marker");
                return self.maintenance_response(&request).await;
            }
            None => {}
        }

        if let Some(predicate) = &self.exempt {
            if predicate.check(&request).await {
                debug!(path, "request exempt from maintenance gating");
                return next.run(request).await;
            }
        }

        if self.is_active().await {
            self.maintenance_response(&request).await
        } else {
            next.run(request).await
        }
    }

    /// Resolves the flag, preferring the fixed override when configured.
    async fn is_active(&self) -> bool {
        if let Some(forced) = self.force {
            return forced;
        }
        match self.state.is_active().await {
            Ok(active) => active,
            Err(err) => {
                error!(error = %err, "maintenance flag read failed, treating as inactive");
                false
            }
        }
    }

    async fn maintenance_response(&self, request: &Request) -> Response {
        match &self.responder {
            Some(responder) => responder.respond(request).await,
            None => default_maintenance_response(),
        }
    }
}

impl std::fmt::Debug for MaintenanceModeMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceModeMiddleware")
            .field("force", &self.force)
            .field("has_exempt_predicate", &self.exempt.is_some())
            .field("has_responder", &self.responder.is_some())
            .finish_non_exhaustive()
    }
}

/// Builds the default maintenance response: `503 Service Unavailable`
/// with a JSON body and a `Retry-After` header.
#[must_use]
pub fn default_maintenance_response() -> Response {
    let body = serde_json::json!({ "detail": DEFAULT_MAINTENANCE_DETAIL });

    http::Response::builder()
        .status(StatusCode::SERVICE_UNAVAILABLE)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::RETRY_AFTER, RETRY_AFTER_SECS.to_string())
        .body(Full::new(Bytes::from(body.to_string())))
        .expect("failed to build maintenance response")
}

/// Builder for [`MaintenanceModeMiddleware`].
///
/// Route markers use exact path matching against `uri.path()`. Marker
/// conflicts (one path registered with both markers) fail in
/// [`build`](Self::build) - at setup, not at request time.
#[derive(Default)]
pub struct MaintenanceModeBuilder {
    state: Option<MaintenanceState>,
    force: Option<bool>,
    markers: Vec<(String, RouteOverride)>,
    exempt: Option<Arc<dyn ExemptPredicate>>,
    responder: Option<Arc<dyn MaintenanceResponder>>,
}

impl MaintenanceModeBuilder {
    /// Sets the state handle to read the flag from.
    ///
    /// Defaults to [`MaintenanceState::default()`], the `MAINTENANCE_MODE`
    /// environment variable.
    #[must_use]
    pub fn state(mut self, state: MaintenanceState) -> Self {
        self.state = Some(state);
        self
    }

    /// Fixes the flag to a constant, bypassing the backend entirely.
    ///
    /// Route markers and the exemption predicate still apply.
    #[must_use]
    pub fn force(mut self, active: bool) -> Self {
        self.force = Some(active);
        self
    }

    /// Marks a route as always in maintenance.
    #[must_use]
    pub fn force_on(mut self, path: impl Into<String>) -> Self {
        self.markers.push((path.into(), RouteOverride::ForceOn));
        self
    }

    /// Marks a route as never gated.
    #[must_use]
    pub fn force_off(mut self, path: impl Into<String>) -> Self {
        self.markers.push((path.into(), RouteOverride::ForceOff));
        self
    }

    /// Sets the exemption predicate.
    #[must_use]
    pub fn exempt_when(mut self, predicate: impl ExemptPredicate) -> Self {
        self.exempt = Some(Arc::new(predicate));
        self
    }

    /// Sets the maintenance response constructor, replacing the default
    /// 503 JSON response.
    #[must_use]
    pub fn respond_with(mut self, responder: impl MaintenanceResponder) -> Self {
        self.responder = Some(Arc::new(responder));
        self
    }

    /// Builds the gate.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ConflictingOverride`] when a path carries
    /// both force-on and force-off markers.
    pub fn build(self) -> Result<MaintenanceModeMiddleware, BuildError> {
        let mut overrides = OverrideMap::default();
        for (path, marker) in self.markers {
            overrides.insert(path, marker)?;
        }
        Ok(MaintenanceModeMiddleware {
            state: self.state.unwrap_or_default(),
            force: self.force,
            overrides,
            exempt: self.exempt,
            responder: self.responder,
        })
    }
}

impl std::fmt::Debug for MaintenanceModeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceModeBuilder")
            .field("force", &self.force)
            .field("markers", &self.markers)
            .finish_non_exhaustive()
    }
}
