//! Background sync engine for saved searches.
//!
//! This module schedules fetch cycles:
//! - All searches are cycled at start and then at a configurable interval
//! - Single searches can be triggered on demand
//! - Stopping cancels in-flight cycles and ends the loop
//!
//! Every cycle runs in its own task. Overlapping triggers for one search are
//! absorbed by that search's guard.

use crate::error::AppError;
use crate::models::SearchSpec;
use crate::services::fetch_cycle::{CycleOutcome, FetchCycle};
use crate::services::sync_events::ProgressSink;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

/// Commands that can be sent to the sync engine.
#[derive(Debug)]
pub enum SyncCommand {
    /// Run a cycle for the named search.
    Trigger(String),

    /// Run a cycle for every search.
    TriggerAll,

    /// Change the scheduling interval.
    UpdateInterval(u64),

    /// Stop the sync engine.
    Stop,
}

/// Lightweight handle for controlling the background sync engine.
///
/// Communicates with the background loop via an mpsc channel.
#[derive(Clone)]
pub struct SyncHandle {
    /// Command channel sender.
    command_tx: mpsc::Sender<SyncCommand>,

    /// Searches the engine schedules.
    searches: Arc<Vec<Arc<SearchSpec>>>,

    /// Parent of every cycle's cancellation token.
    cancel: CancellationToken,
}

impl SyncHandle {
    /// Trigger a cycle for one search.
    pub async fn trigger(&self, search: &str) -> Result<(), AppError> {
        if self.search(search).is_none() {
            return Err(AppError::not_found_with_id("Search", search));
        }
        self.send(SyncCommand::Trigger(search.to_string())).await
    }

    /// Trigger a cycle for every search.
    pub async fn trigger_all(&self) -> Result<(), AppError> {
        self.send(SyncCommand::TriggerAll).await
    }

    /// Change how often all searches are cycled.
    pub async fn update_interval(&self, interval_secs: u64) -> Result<(), AppError> {
        if interval_secs == 0 {
            return Err(AppError::invalid_input_field(
                "Sync interval must be positive",
                "interval_secs",
            ));
        }
        self.send(SyncCommand::UpdateInterval(interval_secs)).await
    }

    /// Cancel running cycles and stop the engine.
    pub async fn stop(&self) -> Result<(), AppError> {
        self.cancel.cancel();
        self.send(SyncCommand::Stop).await
    }

    /// Look up a scheduled search by name.
    pub fn search(&self, name: &str) -> Option<Arc<SearchSpec>> {
        self.searches.iter().find(|s| s.name == name).cloned()
    }

    pub fn searches(&self) -> &[Arc<SearchSpec>] {
        &self.searches
    }

    async fn send(&self, command: SyncCommand) -> Result<(), AppError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| AppError::internal("Sync engine not running"))
    }
}

/// Background sync engine.
pub struct SyncEngine {
    cycle: Arc<FetchCycle>,
    searches: Arc<Vec<Arc<SearchSpec>>>,
    progress: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
}

impl SyncEngine {
    /// Start the background sync loop.
    ///
    /// Spawns a task that cycles every search immediately and then every
    /// `interval_secs` of the cycle's configuration. Returns a `SyncHandle`
    /// for triggering cycles and stopping the loop.
    pub fn start_background(
        cycle: FetchCycle,
        searches: Vec<SearchSpec>,
        progress: Arc<dyn ProgressSink>,
    ) -> SyncHandle {
        let (tx, mut rx) = mpsc::channel::<SyncCommand>(16);
        let interval_secs = cycle.config().interval_secs.max(1);

        let engine = SyncEngine {
            cycle: Arc::new(cycle),
            searches: Arc::new(searches.into_iter().map(Arc::new).collect()),
            progress,
            cancel: CancellationToken::new(),
        };

        let handle = SyncHandle {
            command_tx: tx,
            searches: engine.searches.clone(),
            cancel: engine.cancel.clone(),
        };

        tokio::spawn(async move {
            log::info!(
                "[sync] Engine started with {} search(es), interval={}s",
                engine.searches.len(),
                interval_secs
            );

            // The first tick completes immediately: that is the initial sync
            let mut interval = time::interval(Duration::from_secs(interval_secs));

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        log::debug!("[sync] Running scheduled cycles");
                        engine.spawn_all();
                    }
                    cmd = rx.recv() => {
                        match cmd {
                            Some(SyncCommand::Trigger(name)) => {
                                log::debug!("[sync] Manual cycle triggered for '{}'", name);
                                match engine.searches.iter().find(|s| s.name == name) {
                                    Some(search) => engine.spawn_cycle(search.clone()),
                                    None => log::warn!("[sync] Unknown search '{}'", name),
                                }
                            }
                            Some(SyncCommand::TriggerAll) => {
                                log::debug!("[sync] Manual cycle triggered for all searches");
                                engine.spawn_all();
                            }
                            Some(SyncCommand::UpdateInterval(secs)) => {
                                log::info!("[sync] Interval updated to {}s", secs);
                                interval = time::interval_at(
                                    time::Instant::now() + Duration::from_secs(secs),
                                    Duration::from_secs(secs),
                                );
                            }
                            Some(SyncCommand::Stop) | None => {
                                log::info!("[sync] Sync engine stopping");
                                engine.cancel.cancel();
                                break;
                            }
                        }
                    }
                }
            }
            log::info!("[sync] Sync engine stopped");
        });

        handle
    }

    fn spawn_cycle(&self, search: Arc<SearchSpec>) {
        let cycle = self.cycle.clone();
        let progress = self.progress.clone();
        let cancel = self.cancel.child_token();

        tokio::spawn(async move {
            let outcome = cycle.run(&search, &cancel, progress.as_ref()).await;
            log_outcome(&search.name, &outcome);
        });
    }

    fn spawn_all(&self) {
        let cycle = self.cycle.clone();
        let searches = self.searches.clone();
        let progress = self.progress.clone();
        let cancel = self.cancel.child_token();

        tokio::spawn(async move {
            let outcomes = run_all(&cycle, &searches, &cancel, progress.as_ref()).await;
            for (name, outcome) in &outcomes {
                log_outcome(name, outcome);
            }
        });
    }
}

/// Run one cycle for each search concurrently and collect the outcomes.
pub async fn run_all(
    cycle: &FetchCycle,
    searches: &[Arc<SearchSpec>],
    cancel: &CancellationToken,
    progress: &dyn ProgressSink,
) -> Vec<(String, CycleOutcome)> {
    join_all(searches.iter().map(|search| async move {
        let outcome = cycle.run(search, cancel, progress).await;
        (search.name.clone(), outcome)
    }))
    .await
}

fn log_outcome(search: &str, outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Skipped(reason) => {
            log::debug!("[sync] '{}': cycle skipped ({:?})", search, reason)
        }
        CycleOutcome::Completed(report) => {
            if let Err(e) = &report.import {
                log::debug!("[sync] '{}': import failed: {}", search, e);
            }
        }
    }
}
