//! Mutation queue replayer — drains queued mutations once connectivity
//! returns, in enqueue order, isolating per-item failures.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tillpoint_core::config::ReplayConfig;
use tillpoint_core::errors::{GatewayError, TillpointError, TillpointResult};
use tillpoint_core::models::PendingMutation;
use tillpoint_core::traits::{IMutationQueue, ITransport};
use tillpoint_store::LocalStore;

use crate::gateway::{http_error, RequestGateway};
use crate::ConnectivityState;

/// Summary of one replay pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    pub succeeded: usize,
    pub failed: usize,
    pub dead_lettered: usize,
}

impl ReplayReport {
    /// Total number of queued items this pass acted on.
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed + self.dead_lettered
    }
}

/// Whether a replay failure is worth retrying on a later cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    Retriable,
    Terminal,
}

/// Classify a replay failure. Network errors, server-side errors, and
/// rate/timeout statuses will plausibly succeed later; other client errors
/// (validation, conflicts, missing resources) never will. Session expiry is
/// retriable: the mutation becomes sendable again after re-authentication.
fn classify(err: &TillpointError) -> FailureKind {
    match err {
        TillpointError::GatewayError(GatewayError::Http { status, .. }) => match status {
            408 | 429 => FailureKind::Retriable,
            400..=499 => FailureKind::Terminal,
            _ => FailureKind::Retriable,
        },
        _ => FailureKind::Retriable,
    }
}

/// Drains the pending queue through the gateway's authorized send path.
pub struct Replayer<T: ITransport> {
    gateway: Arc<RequestGateway<T>>,
    store: Arc<LocalStore>,
    connectivity: ConnectivityState,
    max_attempts: u32,
    in_flight: AtomicBool,
}

impl<T: ITransport> Replayer<T> {
    pub fn new(
        gateway: Arc<RequestGateway<T>>,
        store: Arc<LocalStore>,
        connectivity: ConnectivityState,
        config: &ReplayConfig,
    ) -> Self {
        Self {
            gateway,
            store,
            connectivity,
            max_attempts: config.max_attempts.max(1),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Drain the queue. Single-flight: a second call while a pass is in
    /// progress is a no-op returning an all-zero report, so no queued item
    /// is ever submitted twice.
    pub fn replay(&self) -> TillpointResult<ReplayReport> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("replay: pass already in progress, skipping");
            return Ok(ReplayReport::default());
        }

        let result = self.drain();
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    fn drain(&self) -> TillpointResult<ReplayReport> {
        if !self.connectivity.is_online() {
            tracing::debug!("replay: still offline, skipping");
            return Ok(ReplayReport::default());
        }

        // One snapshot per pass: mutations enqueued mid-replay wait for the
        // next cycle.
        let queued = self.store.queued_mutations()?;
        if queued.is_empty() {
            return Ok(ReplayReport::default());
        }

        tracing::info!("replay: draining {} queued mutations", queued.len());
        let mut report = ReplayReport::default();

        for mutation in queued {
            match self.gateway.send_authorized(&mutation.request) {
                Ok(reply) if reply.is_success() => {
                    self.store.remove_mutation(mutation.id)?;
                    report.succeeded += 1;
                    tracing::debug!(
                        "replay: mutation {} ({}) succeeded",
                        mutation.id,
                        mutation.endpoint
                    );
                }
                Ok(reply) => {
                    self.handle_failure(&mut report, &mutation, http_error(&reply).into())?;
                }
                Err(e) => {
                    self.handle_failure(&mut report, &mutation, e)?;
                }
            }
        }

        tracing::info!(
            "replay: done, {} succeeded, {} failed, {} dead-lettered",
            report.succeeded,
            report.failed,
            report.dead_lettered
        );
        Ok(report)
    }

    /// A failure affects only its own item; the pass continues.
    fn handle_failure(
        &self,
        report: &mut ReplayReport,
        mutation: &PendingMutation,
        err: TillpointError,
    ) -> TillpointResult<()> {
        let attempts = mutation.attempts + 1;
        match classify(&err) {
            FailureKind::Terminal => {
                tracing::warn!(
                    "replay: mutation {} ({}) failed terminally: {err}",
                    mutation.id,
                    mutation.endpoint
                );
                self.store
                    .dead_letter_mutation(mutation.id, &err.to_string())?;
                report.dead_lettered += 1;
            }
            FailureKind::Retriable if attempts >= self.max_attempts => {
                tracing::warn!(
                    "replay: mutation {} ({}) reached attempt cap ({}), dead-lettering",
                    mutation.id,
                    mutation.endpoint,
                    self.max_attempts
                );
                self.store.dead_letter_mutation(
                    mutation.id,
                    &format!("attempt cap reached after {attempts} tries: {err}"),
                )?;
                report.dead_lettered += 1;
            }
            FailureKind::Retriable => {
                tracing::warn!(
                    "replay: mutation {} ({}) failed, will retry: {err}",
                    mutation.id,
                    mutation.endpoint
                );
                self.store.record_attempt(mutation.id)?;
                report.failed += 1;
            }
        }
        Ok(())
    }
}
