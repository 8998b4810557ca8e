//! Sync controller — the application-facing orchestrator: initial load,
//! cache refresh, optimistic offline updates, and replay-then-reload on
//! reconnect.

use std::sync::Arc;

use rayon::prelude::*;
use serde_json::Value;

use tillpoint_core::errors::TillpointResult;
use tillpoint_core::models::HttpMethod;
use tillpoint_core::routes::Route;
use tillpoint_core::traits::{ICacheStore, ITransport};
use tillpoint_store::LocalStore;

use crate::gateway::RequestGateway;
use crate::optimistic::{merge_fields, ProjectionRegistry};
use crate::replay::{ReplayReport, Replayer};
use crate::ConnectivityState;

/// Outcome of a submitted mutation, preserving the queued-vs-applied
/// distinction the UI must surface ("queued" is deferred success, not
/// failure).
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The server applied the mutation; payload included when it returned one.
    Applied(Option<Value>),
    /// Offline: the mutation is queued for replay and a local projection has
    /// been applied where one is registered.
    Queued,
}

/// Summary of a full load pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Tables refreshed (from the network or, transparently, the cache).
    pub loaded: usize,
    /// Tables whose fetch failed outright.
    pub failed: usize,
}

/// Orchestrates the gateway, replayer, and store on behalf of the app.
pub struct SyncController<T: ITransport> {
    gateway: Arc<RequestGateway<T>>,
    replayer: Arc<Replayer<T>>,
    store: Arc<LocalStore>,
    connectivity: ConnectivityState,
    projections: ProjectionRegistry,
}

impl<T: ITransport + 'static> SyncController<T> {
    pub fn new(
        gateway: Arc<RequestGateway<T>>,
        replayer: Arc<Replayer<T>>,
        store: Arc<LocalStore>,
        connectivity: ConnectivityState,
    ) -> Self {
        Self {
            gateway,
            replayer,
            store,
            connectivity,
            projections: ProjectionRegistry::with_defaults(),
        }
    }

    /// Replace the projection registry (e.g. to add app-specific
    /// projections).
    pub fn with_projections(mut self, projections: ProjectionRegistry) -> Self {
        self.projections = projections;
        self
    }

    /// Subscribe to connectivity: a transition to online triggers a replay
    /// pass, followed by a full authoritative reload when anything was
    /// processed.
    pub fn attach(self: &Arc<Self>) {
        let controller = Arc::clone(self);
        self.connectivity.subscribe(move |online| {
            if !online {
                return;
            }
            if let Err(e) = controller.on_reconnect() {
                tracing::warn!("controller: reconnect sync failed: {e}");
            }
        });
    }

    /// Fan-out fetch of every catalog table, fan-in before returning.
    /// Successful fetches wholesale-refresh the cache; reads served from the
    /// cache by the gateway's fallback make a full offline boot work too.
    pub fn initial_load(&self) -> TillpointResult<LoadReport> {
        self.load_all()
    }

    /// Replay queued mutations, then reload everything if the pass touched
    /// at least one item. Optimistic projections made while offline are
    /// approximations; the reload reconciles them with true server state.
    pub fn on_reconnect(&self) -> TillpointResult<ReplayReport> {
        let report = self.replayer.replay()?;
        if report.processed() > 0 {
            tracing::info!(
                "controller: replay processed {} mutations, reloading",
                report.processed()
            );
            self.load_all()?;
        }
        Ok(report)
    }

    /// Submit one mutation through the gateway, applying the optimistic
    /// projection when it gets queued offline.
    pub fn submit(
        &self,
        endpoint: &str,
        method: HttpMethod,
        body: Option<Value>,
    ) -> TillpointResult<SubmitOutcome> {
        let reply = self.gateway.execute(endpoint, method, body.clone())?;

        if reply.offline {
            self.apply_optimistic(endpoint, body.as_ref())?;
            return Ok(SubmitOutcome::Queued);
        }

        // Refresh the cache with the authoritative entity when the server
        // returned one.
        if let Some(data) = &reply.data {
            if let Some(route) = self.store.routes().resolve(endpoint) {
                if route.record_key(data).is_some() {
                    self.store.put(route.table, data)?;
                }
            }
        }
        Ok(SubmitOutcome::Applied(reply.data))
    }

    /// Read one collection or entity through the gateway (cache fallback
    /// included), refreshing the cache with whatever came back.
    pub fn fetch(&self, endpoint: &str) -> TillpointResult<Option<Value>> {
        let reply = self.gateway.execute(endpoint, HttpMethod::Get, None)?;
        if let Some(route) = self.store.routes().resolve(endpoint) {
            match &reply.data {
                Some(Value::Array(records)) => self.store.bulk_put(route.table, records)?,
                Some(entity) if route.record_key(entity).is_some() => {
                    self.store.put(route.table, entity)?;
                }
                _ => {}
            }
        }
        Ok(reply.data)
    }

    fn load_all(&self) -> TillpointResult<LoadReport> {
        let routes: Vec<&Route> = self.store.routes().keyed_routes().collect();

        // Fan-out: all table fetches in parallel. Fan-in: collect settles
        // every fetch before any result is applied, so the rest of the app
        // never observes a partial load.
        let fetched: Vec<(&Route, TillpointResult<crate::GatewayReply>)> = routes
            .par_iter()
            .map(|route| {
                let endpoint = format!("/{}", route.prefix);
                (*route, self.gateway.execute(&endpoint, HttpMethod::Get, None))
            })
            .collect();

        let mut report = LoadReport::default();
        for (route, result) in fetched {
            match result {
                Ok(reply) => {
                    if let Some(Value::Array(records)) = reply.data {
                        self.store.bulk_put(route.table, &records)?;
                    }
                    report.loaded += 1;
                }
                Err(e) => {
                    tracing::warn!("controller: loading {} failed: {e}", route.table);
                    report.failed += 1;
                }
            }
        }

        match self.gateway.execute("/settings", HttpMethod::Get, None) {
            Ok(reply) => {
                if let Some(settings) = reply.data {
                    self.store.put_settings(&settings)?;
                }
                report.loaded += 1;
            }
            Err(e) => {
                tracing::warn!("controller: loading settings failed: {e}");
                report.failed += 1;
            }
        }

        tracing::info!(
            "controller: load complete, {} tables loaded, {} failed",
            report.loaded,
            report.failed
        );
        Ok(report)
    }

    /// Best-effort local projection of a queued mutation's effect. The
    /// server stays authoritative; the post-replay reload overwrites all of
    /// this. Cached records are never deleted here, so offline DELETEs leave
    /// the cache untouched until reconciliation.
    fn apply_optimistic(&self, endpoint: &str, body: Option<&Value>) -> TillpointResult<()> {
        let routes = self.store.routes();
        let Some(route) = routes.resolve(endpoint) else {
            return Ok(());
        };

        match routes.endpoint_key(route, endpoint) {
            Some(key) => {
                if let Some(action) = routes.endpoint_action(route, endpoint) {
                    let Some(project) = self.projections.get(route.table, action) else {
                        tracing::debug!(
                            "controller: no projection for {}:{action}, cache left stale",
                            route.table
                        );
                        return Ok(());
                    };
                    if let Some(entity) = self.store.get(route.table, key)? {
                        let projected = project(&entity, body.unwrap_or(&Value::Null));
                        self.store.put(route.table, &projected)?;
                    }
                } else if let Some(body) = body {
                    // Plain entity edit: shallow-merge the changed fields.
                    if let Some(entity) = self.store.get(route.table, key)? {
                        self.store.put(route.table, &merge_fields(&entity, body))?;
                    }
                }
            }
            None => {
                // Collection POST with a client-assigned id: cache the new
                // entity as-is.
                if let Some(body) = body {
                    if route.record_key(body).is_some() {
                        self.store.put(route.table, body)?;
                    }
                }
            }
        }
        Ok(())
    }
}
