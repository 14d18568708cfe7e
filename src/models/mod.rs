//! Data models for the application.
//!
//! These models represent the issues tracked for each saved search, the
//! ordered set that mirrors the UI tree, and the search itself with its
//! single-flight guard.

pub mod issue;
pub mod issue_set;
pub mod search;

// Re-exports for convenient access
pub use issue::{IssueDetails, IssueId, RemoteIssue, TrackedIssue};
pub use issue_set::{Lookup, OrderedIssueSet};
pub use search::{GuardLease, SearchSpec, SharedIssueSet, SyncGuard};
