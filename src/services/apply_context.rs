//! Serialized apply context for issue list mutations.
//!
//! Every change to a search's [`OrderedIssueSet`](crate::models::OrderedIssueSet)
//! goes through one background task, which applies it and then tells the
//! UI tree about it. Fetch workers only read the sets directly.
//!
//! Structural changes (insert/remove) are acknowledged: the worker awaits the
//! ack because its next lookup must see the shifted indices. Payload updates
//! are fire-and-forget.

use crate::error::AppError;
use crate::models::{Lookup, SearchSpec, SharedIssueSet, TrackedIssue};
use crate::services::sync_events::{IssueChangeType, IssueChangedPayload};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// The external UI tree mirroring each search's issue list.
///
/// Called only from the apply context, after the change is visible in the set.
pub trait IssueTreeView: Send + Sync {
    fn insert_at(&self, search: &str, index: usize, issue: &TrackedIssue);
    fn remove_at(&self, search: &str, index: usize, issue: &TrackedIssue);
    fn update_at(&self, search: &str, index: usize, issue: &TrackedIssue);
}

/// Tree view that discards all changes (headless use).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTreeView;

impl IssueTreeView for NullTreeView {
    fn insert_at(&self, _search: &str, _index: usize, _issue: &TrackedIssue) {}
    fn remove_at(&self, _search: &str, _index: usize, _issue: &TrackedIssue) {}
    fn update_at(&self, _search: &str, _index: usize, _issue: &TrackedIssue) {}
}

/// Tree view forwarding each change as an [`IssueChangedPayload`].
#[derive(Debug, Clone)]
pub struct ChannelTreeView {
    tx: mpsc::UnboundedSender<IssueChangedPayload>,
}

impl ChannelTreeView {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<IssueChangedPayload>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, search: &str, index: usize, change: IssueChangeType, issue: &TrackedIssue) {
        let _ = self.tx.send(IssueChangedPayload {
            search: search.to_string(),
            index,
            change,
            issue: issue.clone(),
        });
    }
}

impl IssueTreeView for ChannelTreeView {
    fn insert_at(&self, search: &str, index: usize, issue: &TrackedIssue) {
        self.send(search, index, IssueChangeType::Inserted, issue);
    }

    fn remove_at(&self, search: &str, index: usize, issue: &TrackedIssue) {
        self.send(search, index, IssueChangeType::Removed, issue);
    }

    fn update_at(&self, search: &str, index: usize, issue: &TrackedIssue) {
        self.send(search, index, IssueChangeType::Updated, issue);
    }
}

/// Commands consumed by the apply context.
enum ApplyCommand {
    Insert {
        search: String,
        issues: SharedIssueSet,
        index: usize,
        issue: TrackedIssue,
        ack: oneshot::Sender<Result<(), AppError>>,
    },
    Remove {
        search: String,
        issues: SharedIssueSet,
        index: usize,
        ack: oneshot::Sender<Result<TrackedIssue, AppError>>,
    },
    Update {
        search: String,
        issues: SharedIssueSet,
        issue: TrackedIssue,
    },
    Flush {
        ack: oneshot::Sender<()>,
    },
}

/// Cloneable sender side of the apply context.
///
/// The context task stops once every handle is dropped.
#[derive(Clone)]
pub struct ApplyHandle {
    tx: mpsc::UnboundedSender<ApplyCommand>,
}

impl ApplyHandle {
    /// Insert `issue` at `index` of the search's list and wait until it is applied.
    pub async fn insert_at(
        &self,
        search: &SearchSpec,
        index: usize,
        issue: TrackedIssue,
    ) -> Result<(), AppError> {
        let (ack, done) = oneshot::channel();
        self.send(ApplyCommand::Insert {
            search: search.name.clone(),
            issues: search.issues().clone(),
            index,
            issue,
            ack,
        })?;
        done.await.map_err(|_| AppError::ApplyClosed)?
    }

    /// Remove the issue at `index` of the search's list and wait until it is applied.
    pub async fn remove_at(
        &self,
        search: &SearchSpec,
        index: usize,
    ) -> Result<TrackedIssue, AppError> {
        let (ack, done) = oneshot::channel();
        self.send(ApplyCommand::Remove {
            search: search.name.clone(),
            issues: search.issues().clone(),
            index,
            ack,
        })?;
        done.await.map_err(|_| AppError::ApplyClosed)?
    }

    /// Queue a wholesale replacement of the tracked issue with the same id.
    ///
    /// Returns as soon as the command is queued.
    pub fn update(&self, search: &SearchSpec, issue: TrackedIssue) -> Result<(), AppError> {
        self.send(ApplyCommand::Update {
            search: search.name.clone(),
            issues: search.issues().clone(),
            issue,
        })
    }

    /// Wait until every command queued before this call has been applied.
    pub async fn flush(&self) -> Result<(), AppError> {
        let (ack, done) = oneshot::channel();
        self.send(ApplyCommand::Flush { ack })?;
        done.await.map_err(|_| AppError::ApplyClosed)
    }

    fn send(&self, command: ApplyCommand) -> Result<(), AppError> {
        self.tx.send(command).map_err(|_| AppError::ApplyClosed)
    }
}

impl std::fmt::Debug for ApplyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplyHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// The apply context task.
pub struct ApplyContext {
    view: Arc<dyn IssueTreeView>,
}

impl ApplyContext {
    /// Spawn the apply task on the current tokio runtime.
    pub fn spawn(view: Arc<dyn IssueTreeView>) -> ApplyHandle {
        let (tx, mut rx) = mpsc::unbounded_channel::<ApplyCommand>();
        let context = ApplyContext { view };

        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                context.apply(command).await;
            }
            log::debug!("[apply] Apply context stopped");
        });

        ApplyHandle { tx }
    }

    async fn apply(&self, command: ApplyCommand) {
        match command {
            ApplyCommand::Insert {
                search,
                issues,
                index,
                issue,
                ack,
            } => {
                let result = issues.write().await.insert_at(index, issue.clone());
                if result.is_ok() {
                    self.view.insert_at(&search, index, &issue);
                }
                let _ = ack.send(result);
            }
            ApplyCommand::Remove {
                search,
                issues,
                index,
                ack,
            } => {
                let result = issues.write().await.remove_at(index);
                if let Ok(removed) = &result {
                    self.view.remove_at(&search, index, removed);
                }
                let _ = ack.send(result);
            }
            ApplyCommand::Update {
                search,
                issues,
                issue,
            } => {
                let mut set = issues.write().await;
                match set.find(&issue.id) {
                    Lookup::Found(index) => {
                        if let Err(e) = set.replace(issue.clone()) {
                            log::warn!("[apply] Failed to update issue {}: {}", issue.id, e);
                            return;
                        }
                        drop(set);
                        self.view.update_at(&search, index, &issue);
                    }
                    Lookup::NotFound(_) => {
                        log::debug!(
                            "[apply] Issue {} left search '{}' before its update landed",
                            issue.id,
                            search
                        );
                    }
                }
            }
            ApplyCommand::Flush { ack } => {
                let _ = ack.send(());
            }
        }
    }
}
