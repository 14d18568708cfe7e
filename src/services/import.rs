//! Import phase: merge one freshly fetched page into a search's issue list.
//!
//! Each remote issue is looked up in the ordered set and classified:
//!
//! | tracked | remote closed | action                     | count   |
//! |---------|---------------|----------------------------|---------|
//! | no      | yes           | skip                       | -       |
//! | no      | no            | insert at insertion point  | added   |
//! | yes     | yes           | remove                     | updated |
//! | yes     | no            | none (refresh handles it)  | updated |
//!
//! Inserts and removes wait for the apply context, so the next lookup sees
//! the shifted indices.

use crate::error::AppError;
use crate::models::{Lookup, RemoteIssue};
use crate::services::fetch_cycle::CycleContext;
use crate::services::sync_events::{
    connection_broken, count_of, fetch_error, fetch_starting, fetch_title, DiagnosticSink,
    Notifier, NO_ISSUES,
};
use serde::Serialize;

/// Counts accumulated by one import run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchOutcome {
    /// Open issues that were not tracked before.
    pub added: usize,

    /// Tracked issues seen again, including those removed because they closed.
    pub updated: usize,
}

impl FetchOutcome {
    /// The single summary message for this run.
    pub fn summary(&self) -> String {
        match (self.added, self.updated) {
            (0, 0) => NO_ISSUES.to_string(),
            (0, updated) => format!("updated {}", count_of(updated, "task")),
            (added, updated) if updated == 0 || updated == added => {
                format!("added {}", count_of(added, "task"))
            }
            (added, updated) => format!("added {} and updated {}", count_of(added, "task"), updated),
        }
    }
}

/// Run the import and report its result.
///
/// Emits exactly one notification: the summary on success, the failure
/// otherwise. Unclassified failures also go to `diagnostics`.
pub async fn import_new(
    ctx: &CycleContext<'_>,
    notifier: &dyn Notifier,
    diagnostics: &dyn DiagnosticSink,
) -> Result<FetchOutcome, AppError> {
    let title = fetch_title(ctx.source.presentable_name());

    match fetch_all(ctx).await {
        Ok(outcome) => {
            log::info!(
                "[import] '{}': added {}, updated {}",
                ctx.search.name,
                outcome.added,
                outcome.updated
            );
            notifier.info(&title, &outcome.summary());
            Ok(outcome)
        }
        Err(e) => {
            notifier.error(&title, &fetch_error(&e.to_string()));
            if !e.is_classified() {
                diagnostics.report(&title, &e);
            }
            Err(e)
        }
    }
}

/// Fetch one page and apply it to the search's issue list.
pub async fn fetch_all(ctx: &CycleContext<'_>) -> Result<FetchOutcome, AppError> {
    ctx.progress
        .set_text(&fetch_starting(ctx.source.presentable_name()));

    let mut outcome = FetchOutcome::default();
    let page = fetch_page(ctx).await?;
    if page.is_empty() {
        return Ok(outcome);
    }

    for issue in page {
        if ctx.config.cancel_between_items && ctx.cancel.is_cancelled() {
            log::info!("[import] '{}': cancelled mid-page", ctx.search.name);
            break;
        }

        // The read guard must be gone before waiting on the apply context.
        let lookup = ctx.search.issues().read().await.find(&issue.id);

        match lookup {
            Lookup::NotFound(_) if issue.closed => {
                log::debug!("[import] Skipping closed untracked issue {}", issue.id);
            }
            Lookup::NotFound(insert_at) => {
                outcome.added += 1;
                log::debug!("[import] Adding issue {} at {}", issue.id, insert_at);
                ctx.apply
                    .insert_at(ctx.search, insert_at, issue.into())
                    .await?;
            }
            Lookup::Found(index) if issue.closed => {
                outcome.updated += 1;
                log::debug!("[import] Removing closed issue {} at {}", issue.id, index);
                ctx.apply.remove_at(ctx.search, index).await?;
            }
            Lookup::Found(_) => {
                outcome.updated += 1;
            }
        }
    }

    Ok(outcome)
}

/// Fetch the first page, classifying any failure as a page fetch error.
async fn fetch_page(ctx: &CycleContext<'_>) -> Result<Vec<RemoteIssue>, AppError> {
    ctx.source
        .fetch_issues(&ctx.search.query, 0, ctx.config.buffer_size, false, ctx.cancel)
        .await
        .map_err(|e| AppError::remote_fetch(connection_broken(&e.to_string())))
}
