//! Sync event types and the sinks they are delivered to.
//!
//! The fetch cycle reports to three external collaborators: a [`Notifier`]
//! for the one user-facing summary per import, a [`ProgressSink`] for the
//! background task indicator, and a [`DiagnosticSink`] for unexpected
//! failures. Channel-backed implementations forward serializable payloads so
//! a UI can consume them from its own task.

use crate::error::AppError;
use crate::models::TrackedIssue;
use serde::Serialize;
use tokio::sync::mpsc;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Payload for search-notification events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

/// Type of change applied to a search's issue list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueChangeType {
    Inserted,
    Removed,
    Updated,
}

/// Payload for issue-changed events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueChangedPayload {
    /// Name of the search whose list changed.
    pub search: String,

    /// Position of the issue in the list (before removal, for removals).
    pub index: usize,

    pub change: IssueChangeType,

    pub issue: TrackedIssue,
}

/// Fire-and-forget user notifications.
pub trait Notifier: Send + Sync {
    fn info(&self, title: &str, message: &str);
    fn error(&self, title: &str, message: &str);
}

/// Background task indicator.
pub trait ProgressSink: Send + Sync {
    fn set_text(&self, text: &str);

    /// Fraction of work done, in `[0, 1]`.
    fn set_fraction(&self, fraction: f32);
}

/// Receives failures that indicate a defect rather than an expected outage.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, context: &str, error: &AppError);
}

/// Notifier that writes to the application log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn info(&self, title: &str, message: &str) {
        log::info!("[{}] {}", title, message);
    }

    fn error(&self, title: &str, message: &str) {
        log::warn!("[{}] {}", title, message);
    }
}

/// Notifier forwarding payloads to a UI task.
///
/// Notifications sent after the receiver is gone are dropped.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<NotificationPayload>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationPayload>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, level: NotificationLevel, title: &str, message: &str) {
        let _ = self.tx.send(NotificationPayload {
            level,
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}

impl Notifier for ChannelNotifier {
    fn info(&self, title: &str, message: &str) {
        self.send(NotificationLevel::Info, title, message);
    }

    fn error(&self, title: &str, message: &str) {
        self.send(NotificationLevel::Error, title, message);
    }
}

/// Progress sink that ignores updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn set_text(&self, _text: &str) {}
    fn set_fraction(&self, _fraction: f32) {}
}

/// Diagnostic sink logging at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn report(&self, context: &str, error: &AppError) {
        log::error!("{}: {:?}", context, error);
    }
}

// Message texts

/// Title shared by all notifications of an import.
pub fn fetch_title(repository: &str) -> String {
    format!("Fetch new issues from {}", repository)
}

/// Progress text shown while the page is fetched.
pub fn fetch_starting(repository: &str) -> String {
    format!("Fetching new issues from {}...", repository)
}

/// Message of the classified error wrapping a failed page fetch.
pub fn connection_broken(cause: &str) -> String {
    format!("connection broken: {}", cause)
}

/// Message of the error notification for a failed import.
pub fn fetch_error(cause: &str) -> String {
    format!("failed to fetch issues: {}", cause)
}

/// Message of the summary when nothing was added or updated.
pub const NO_ISSUES: &str = "no issues found";

/// `"1 task"`, `"3 tasks"`.
pub fn count_of(count: usize, unit: &str) -> String {
    if count == 1 {
        format!("{} {}", count, unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_of_pluralizes() {
        assert_eq!(count_of(1, "task"), "1 task");
        assert_eq!(count_of(2, "task"), "2 tasks");
        assert_eq!(count_of(0, "task"), "0 tasks");
    }

    #[tokio::test]
    async fn test_channel_notifier_forwards_payloads() {
        let (notifier, mut rx) = ChannelNotifier::new();
        notifier.info("title", "added 1 task");
        notifier.error("title", "failed to fetch issues: boom");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.level, NotificationLevel::Info);
        assert_eq!(first.message, "added 1 task");

        let second = rx.recv().await.unwrap();
        assert_eq!(second.level, NotificationLevel::Error);
    }

    #[test]
    fn test_channel_notifier_survives_dropped_receiver() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        notifier.info("title", "nobody listens");
    }

    #[test]
    fn test_payload_serialization() {
        let payload = NotificationPayload {
            level: NotificationLevel::Error,
            title: "t".to_string(),
            message: "m".to_string(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"level\":\"error\""));
    }
}
