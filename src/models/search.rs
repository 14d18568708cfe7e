//! Saved searches and their single-flight guard.

use super::issue_set::OrderedIssueSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Issue set shared between the fetch worker (reads) and the apply context (writes).
pub type SharedIssueSet = Arc<RwLock<OrderedIssueSet>>;

/// Non-blocking exclusion flag: at most one fetch cycle per search.
#[derive(Debug, Default)]
pub struct SyncGuard {
    updating: AtomicBool,
}

impl SyncGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically flip the flag from free to held. Returns whether it flipped.
    pub fn try_acquire(&self) -> bool {
        self.updating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Mark the guard free, whoever held it.
    pub fn release(&self) {
        self.updating.store(false, Ordering::Release);
    }

    pub fn is_held(&self) -> bool {
        self.updating.load(Ordering::Acquire)
    }

    /// Acquire the guard for the lifetime of the returned lease.
    ///
    /// The lease releases the guard when dropped, so every exit path of the
    /// holder (return, `?`, panic, future cancellation) frees it.
    pub fn lease(&self) -> Option<GuardLease<'_>> {
        if self.try_acquire() {
            Some(GuardLease { guard: self })
        } else {
            None
        }
    }
}

/// Scoped ownership of a [`SyncGuard`].
#[derive(Debug)]
#[must_use = "the guard is released as soon as the lease is dropped"]
pub struct GuardLease<'a> {
    guard: &'a SyncGuard,
}

impl Drop for GuardLease<'_> {
    fn drop(&mut self) {
        self.guard.release();
    }
}

/// A saved (repository, query) pair and the issues tracked for it.
///
/// Created from configuration before any fetch and kept across cycles.
#[derive(Debug)]
pub struct SearchSpec {
    /// Unique search name, also used to address the UI node.
    pub name: String,

    /// Presentable name of the repository the search runs against.
    pub repository: String,

    /// Tracker query string.
    pub query: String,

    guard: SyncGuard,
    issues: SharedIssueSet,
}

impl SearchSpec {
    pub fn new(
        name: impl Into<String>,
        repository: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self::with_issues(name, repository, query, OrderedIssueSet::new())
    }

    /// Create a search that already tracks `issues` (e.g. restored from a previous session).
    pub fn with_issues(
        name: impl Into<String>,
        repository: impl Into<String>,
        query: impl Into<String>,
        issues: OrderedIssueSet,
    ) -> Self {
        Self {
            name: name.into(),
            repository: repository.into(),
            query: query.into(),
            guard: SyncGuard::new(),
            issues: Arc::new(RwLock::new(issues)),
        }
    }

    pub fn guard(&self) -> &SyncGuard {
        &self.guard
    }

    pub fn issues(&self) -> &SharedIssueSet {
        &self.issues
    }

    /// Whether a fetch cycle currently holds this search.
    pub fn is_updating(&self) -> bool {
        self.guard.is_held()
    }
}
