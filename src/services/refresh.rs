//! Refresh phase: re-read every tracked issue from its tracker.
//!
//! Updates are handed to the apply context without waiting; they replace
//! issue data only, so indices stay valid for the rest of the walk. Closed
//! issues stay listed until the next import removes them.

use crate::models::TrackedIssue;
use crate::services::fetch_cycle::CycleContext;
use serde::Serialize;

/// Per-run tallies of the refresh phase.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    /// Issues whose fresh state was queued for the UI.
    pub refreshed: usize,

    /// Issues the tracker no longer knows, or failed to return.
    pub skipped: usize,
}

/// Walk the tracked issues and queue an update for each one still found.
///
/// Lookup failures are tolerated per item.
pub async fn refresh_current(ctx: &CycleContext<'_>) -> RefreshOutcome {
    let mut outcome = RefreshOutcome::default();
    let length = ctx.search.issues().read().await.len();

    for index in 0..length {
        if ctx.config.cancel_between_items && ctx.cancel.is_cancelled() {
            log::info!("[refresh] '{}': cancelled at {}/{}", ctx.search.name, index, length);
            break;
        }

        ctx.progress.set_fraction(index as f32 / length as f32);

        let id = match ctx.search.issues().read().await.get(index) {
            Some(issue) => issue.id.clone(),
            None => break,
        };

        let fresh = match ctx.source.find_issue(&id).await {
            Ok(Some(issue)) => issue,
            Ok(None) => {
                log::debug!("[refresh] Issue {} not found, skipping", id);
                outcome.skipped += 1;
                continue;
            }
            Err(e) => {
                log::warn!("[refresh] Failed to refresh issue {}: {}", id, e);
                outcome.skipped += 1;
                continue;
            }
        };

        let mut issue = TrackedIssue::from(fresh);
        issue.id = id;
        if let Err(e) = ctx.apply.update(ctx.search, issue) {
            log::warn!("[refresh] '{}': {}", ctx.search.name, e);
            break;
        }
        outcome.refreshed += 1;
    }

    outcome
}
