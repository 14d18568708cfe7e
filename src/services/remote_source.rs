//! Remote tracker abstraction.
//!
//! A [`RemoteSource`] is a live handle to one repository on an issue
//! tracker. A [`RepositoryResolver`] turns the presentable repository name a
//! search was saved with into such a handle.

use crate::error::AppError;
use crate::models::{IssueId, RemoteIssue};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Capability over an external issue tracker.
///
/// Implementations must surface transport failures as errors instead of
/// hanging; the sync core adds no timeouts of its own.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Name the repository is presented under (what searches refer to).
    fn presentable_name(&self) -> &str;

    /// Fetch up to `limit` issues matching `query`, skipping the first `offset`.
    ///
    /// Issues come back in the tracker's order. `cancel` may be observed to
    /// abandon a long fetch early.
    async fn fetch_issues(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
        exclude_closed: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteIssue>, AppError>;

    /// Look up the current state of one issue. `Ok(None)` means it no longer exists.
    async fn find_issue(&self, id: &IssueId) -> Result<Option<RemoteIssue>, AppError>;
}

/// Resolves a presentable repository name to a live source.
pub trait RepositoryResolver: Send + Sync {
    fn resolve(&self, presentable_name: &str) -> Option<Arc<dyn RemoteSource>>;
}

/// Resolver over a fixed list of sources; the first name match wins.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn RemoteSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: Arc<dyn RemoteSource>) {
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Arc<dyn RemoteSource>) -> Self {
        self.register(source);
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl RepositoryResolver for SourceRegistry {
    fn resolve(&self, presentable_name: &str) -> Option<Arc<dyn RemoteSource>> {
        self.sources
            .iter()
            .find(|source| source.presentable_name() == presentable_name)
            .cloned()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.sources.iter().map(|s| s.presentable_name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, usize);

    #[async_trait]
    impl RemoteSource for Named {
        fn presentable_name(&self) -> &str {
            self.0
        }

        async fn fetch_issues(
            &self,
            _query: &str,
            _offset: usize,
            _limit: usize,
            _exclude_closed: bool,
            _cancel: &CancellationToken,
        ) -> Result<Vec<RemoteIssue>, AppError> {
            Ok(vec![RemoteIssue::open(self.1.to_string(), "marker")])
        }

        async fn find_issue(&self, _id: &IssueId) -> Result<Option<RemoteIssue>, AppError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_resolve_first_match_wins() {
        let registry = SourceRegistry::new()
            .with_source(Arc::new(Named("acme/app", 1)))
            .with_source(Arc::new(Named("acme/app", 2)))
            .with_source(Arc::new(Named("acme/lib", 3)));

        let source = registry.resolve("acme/app").expect("registered");
        let page = source
            .fetch_issues("", 0, 10, false, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(page[0].id, "1".into());
    }

    #[test]
    fn test_resolve_unknown_name() {
        let registry = SourceRegistry::new().with_source(Arc::new(Named("acme/app", 1)));
        assert!(registry.resolve("acme/other").is_none());
        assert!(SourceRegistry::new().resolve("acme/app").is_none());
    }
}
