//! Shared fakes for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use taskwatch::services::apply_context::{ApplyContext, ChannelTreeView, IssueTreeView};
use taskwatch::services::sync_events::{
    ChannelNotifier, DiagnosticSink, IssueChangedPayload, NotificationPayload, ProgressSink,
};
use taskwatch::{
    AppError, FetchCycle, IssueId, RemoteIssue, RemoteSource, SourceRegistry, SyncConfig,
};
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;

pub const REPO: &str = "acme/app";

/// In-memory tracker with scripted answers.
pub struct ScriptedSource {
    name: String,
    page: Mutex<Result<Vec<RemoteIssue>, String>>,
    issues: Mutex<HashMap<IssueId, RemoteIssue>>,
    failing: Mutex<HashSet<IssueId>>,
    gate: Option<Arc<Notify>>,
    cancel_on_fetch: bool,
    pub fetch_calls: AtomicUsize,
    pub find_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(page: Vec<RemoteIssue>) -> Self {
        Self {
            name: REPO.to_string(),
            page: Mutex::new(Ok(page)),
            issues: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            gate: None,
            cancel_on_fetch: false,
            fetch_calls: AtomicUsize::new(0),
            find_calls: AtomicUsize::new(0),
        }
    }

    /// A source whose page fetch fails with `cause`.
    pub fn failing_fetch(cause: &str) -> Self {
        let source = Self::new(Vec::new());
        *source.page.lock().unwrap() = Err(cause.to_string());
        source
    }

    /// Block every page fetch until `gate` is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Cancel the cycle's token while the page is being fetched.
    pub fn cancelling_during_fetch(mut self) -> Self {
        self.cancel_on_fetch = true;
        self
    }

    /// Answer `find_issue` for this id.
    pub fn with_current(self, issue: RemoteIssue) -> Self {
        self.issues.lock().unwrap().insert(issue.id.clone(), issue);
        self
    }

    /// Make `find_issue` fail for this id.
    pub fn with_failing_find(self, id: &str) -> Self {
        self.failing.lock().unwrap().insert(IssueId::from(id));
        self
    }
}

#[async_trait]
impl RemoteSource for ScriptedSource {
    fn presentable_name(&self) -> &str {
        &self.name
    }

    async fn fetch_issues(
        &self,
        _query: &str,
        offset: usize,
        limit: usize,
        _exclude_closed: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<RemoteIssue>, AppError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.cancel_on_fetch {
            cancel.cancel();
        }
        let page = self.page.lock().unwrap().clone();
        page.map(|issues| issues.into_iter().skip(offset).take(limit).collect())
            .map_err(AppError::network)
    }

    async fn find_issue(&self, id: &IssueId) -> Result<Option<RemoteIssue>, AppError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(id) {
            return Err(AppError::network("connection reset"));
        }
        Ok(self.issues.lock().unwrap().get(id).cloned())
    }
}

#[derive(Default)]
pub struct RecordingDiagnostics {
    pub reports: Mutex<Vec<String>>,
}

impl DiagnosticSink for RecordingDiagnostics {
    fn report(&self, context: &str, error: &AppError) {
        self.reports
            .lock()
            .unwrap()
            .push(format!("{}: {}", context, error));
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    pub texts: Mutex<Vec<String>>,
    pub fractions: Mutex<Vec<f32>>,
}

impl ProgressSink for RecordingProgress {
    fn set_text(&self, text: &str) {
        self.texts.lock().unwrap().push(text.to_string());
    }

    fn set_fraction(&self, fraction: f32) {
        self.fractions.lock().unwrap().push(fraction);
    }
}

/// A fetch cycle wired to recording collaborators.
pub struct Harness {
    pub cycle: FetchCycle,
    pub notifications: mpsc::UnboundedReceiver<NotificationPayload>,
    pub tree: mpsc::UnboundedReceiver<IssueChangedPayload>,
    pub diagnostics: Arc<RecordingDiagnostics>,
}

impl Harness {
    /// Must be called inside a tokio runtime (spawns the apply context).
    pub fn new(source: Arc<ScriptedSource>) -> Self {
        Self::with_config(source, SyncConfig::default())
    }

    pub fn with_config(source: Arc<ScriptedSource>, config: SyncConfig) -> Self {
        let (view, tree) = ChannelTreeView::new();
        let view: Arc<dyn IssueTreeView> = Arc::new(view);
        let apply = ApplyContext::spawn(view);
        Self::with_apply(source, config, apply, tree)
    }

    pub fn with_apply(
        source: Arc<ScriptedSource>,
        config: SyncConfig,
        apply: taskwatch::ApplyHandle,
        tree: mpsc::UnboundedReceiver<IssueChangedPayload>,
    ) -> Self {
        let (notifier, notifications) = ChannelNotifier::new();
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let registry = SourceRegistry::new().with_source(source);
        let cycle = FetchCycle::new(Arc::new(registry), apply, Arc::new(notifier))
            .with_diagnostics(diagnostics.clone())
            .with_config(config);

        Self {
            cycle,
            notifications,
            tree,
            diagnostics,
        }
    }

    /// Notifications received so far.
    pub fn drain_notifications(&mut self) -> Vec<NotificationPayload> {
        let mut out = Vec::new();
        while let Ok(n) = self.notifications.try_recv() {
            out.push(n);
        }
        out
    }

    /// Tree changes received so far. Call after flushing the apply context.
    pub fn drain_tree(&mut self) -> Vec<IssueChangedPayload> {
        let mut out = Vec::new();
        while let Ok(e) = self.tree.try_recv() {
            out.push(e);
        }
        out
    }
}

pub fn ids(list: &[&str]) -> Vec<IssueId> {
    list.iter().map(|s| IssueId::from(*s)).collect()
}
