//! Business logic services.
//!
//! This module contains the fetch cycle and its phases, the apply context
//! that serializes issue list mutations, the remote tracker abstraction with
//! its GitLab implementation, and the background scheduler.
//!
//! Services only talk to the UI through the traits in [`sync_events`] and
//! [`apply_context::IssueTreeView`].

pub mod apply_context;
pub mod fetch_cycle;
pub mod gitlab_client;
pub mod import;
pub mod refresh;
pub mod remote_source;
pub mod sync_engine;
pub mod sync_events;

pub use apply_context::{ApplyContext, ApplyHandle, IssueTreeView};
pub use fetch_cycle::{CycleOutcome, CycleReport, FetchCycle, SkipReason};
pub use gitlab_client::GitLabClient;
pub use import::FetchOutcome;
pub use refresh::RefreshOutcome;
pub use remote_source::{RemoteSource, RepositoryResolver, SourceRegistry};
pub use sync_engine::{SyncEngine, SyncHandle};
