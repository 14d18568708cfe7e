//! Taskwatch - keeps saved issue searches in sync with remote trackers.
//!
//! Each saved search owns an ordered list of tracked issues. A fetch cycle
//! imports one page of matching issues from the search's repository, merging
//! it into the list without disturbing its order, then refreshes every
//! tracked issue. The UI tree, notifications and progress display are
//! external collaborators reached through traits.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::{AppSettings, SyncConfig};
pub use error::AppError;
pub use models::{IssueId, Lookup, OrderedIssueSet, RemoteIssue, SearchSpec, TrackedIssue};
pub use services::{
    ApplyContext, ApplyHandle, CycleOutcome, FetchCycle, FetchOutcome, RemoteSource,
    RepositoryResolver, SourceRegistry, SyncEngine, SyncHandle,
};
