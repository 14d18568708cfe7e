//! One fetch cycle: resolve, guard, import, refresh.
//!
//! A cycle that cannot start (repository unknown, already cancelled, or
//! another cycle holding the search) returns [`CycleOutcome::Skipped`]
//! without touching the search, the notifier or the UI.

use crate::config::SyncConfig;
use crate::error::AppError;
use crate::models::SearchSpec;
use crate::services::apply_context::ApplyHandle;
use crate::services::import::{self, FetchOutcome};
use crate::services::refresh::{self, RefreshOutcome};
use crate::services::remote_source::{RemoteSource, RepositoryResolver};
use crate::services::sync_events::{DiagnosticSink, LogDiagnostics, Notifier, ProgressSink};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Everything the phases of a running cycle need.
pub struct CycleContext<'a> {
    pub search: &'a SearchSpec,
    pub source: &'a dyn RemoteSource,
    pub apply: &'a ApplyHandle,
    pub cancel: &'a CancellationToken,
    pub progress: &'a dyn ProgressSink,
    pub config: &'a SyncConfig,
}

/// Why a cycle did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No live source is registered under the search's repository name.
    RepositoryUnresolved,

    /// The cancellation token fired before the cycle started.
    Cancelled,

    /// Another cycle for the same search is running.
    GuardBusy,
}

/// Result of a completed cycle.
#[derive(Debug)]
pub struct CycleReport {
    /// Import counts, or the failure that was already notified.
    pub import: Result<FetchOutcome, AppError>,

    pub refresh: RefreshOutcome,

    pub duration_ms: u64,
}

/// What [`FetchCycle::run`] did.
#[derive(Debug)]
pub enum CycleOutcome {
    Skipped(SkipReason),
    Completed(CycleReport),
}

impl CycleOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Skipped(_) => None,
        }
    }
}

/// Runs fetch cycles for any number of searches.
///
/// Shared collaborators live here; per-run inputs are passed to [`FetchCycle::run`].
pub struct FetchCycle {
    resolver: Arc<dyn RepositoryResolver>,
    apply: ApplyHandle,
    notifier: Arc<dyn Notifier>,
    diagnostics: Arc<dyn DiagnosticSink>,
    config: SyncConfig,
}

impl FetchCycle {
    pub fn new(
        resolver: Arc<dyn RepositoryResolver>,
        apply: ApplyHandle,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            resolver,
            apply,
            notifier,
            diagnostics: Arc::new(LogDiagnostics),
            config: SyncConfig::default(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn apply_handle(&self) -> &ApplyHandle {
        &self.apply
    }

    /// Run one cycle for `search`.
    ///
    /// The guard is held from before the import until the end of the refresh
    /// and released on every exit path, including cancellation of this future.
    pub async fn run(
        &self,
        search: &SearchSpec,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> CycleOutcome {
        let Some(source) = self.resolver.resolve(&search.repository) else {
            log::debug!(
                "[sync] '{}': repository '{}' is not configured",
                search.name,
                search.repository
            );
            return CycleOutcome::Skipped(SkipReason::RepositoryUnresolved);
        };

        if cancel.is_cancelled() {
            return CycleOutcome::Skipped(SkipReason::Cancelled);
        }

        // don't run two cycles for one search
        let Some(_lease) = search.guard().lease() else {
            log::debug!("[sync] '{}': cycle already running", search.name);
            return CycleOutcome::Skipped(SkipReason::GuardBusy);
        };

        let start = Instant::now();
        log::info!("[sync] '{}': cycle started", search.name);

        let ctx = CycleContext {
            search,
            source: source.as_ref(),
            apply: &self.apply,
            cancel,
            progress,
            config: &self.config,
        };

        let import = import::import_new(&ctx, self.notifier.as_ref(), self.diagnostics.as_ref()).await;
        let refresh = refresh::refresh_current(&ctx).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        log::info!(
            "[sync] '{}': cycle finished in {}ms ({} refreshed, {} skipped)",
            search.name,
            duration_ms,
            refresh.refreshed,
            refresh.skipped
        );

        CycleOutcome::Completed(CycleReport {
            import,
            refresh,
            duration_ms,
        })
    }
}
