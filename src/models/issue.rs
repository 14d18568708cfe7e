//! Issue models.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Identifier of an issue as reported by its tracker (e.g. `"42"`, `"PRJ-17"`).
///
/// Ids order naturally: the text before a trailing run of digits is compared
/// first, then the digits numerically, so `"PRJ-2"` sorts before `"PRJ-10"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(String);

impl IssueId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into the text prefix and the trailing digits without leading zeros.
    fn natural_key(&self) -> (&str, Option<&str>) {
        let s = self.0.as_str();
        let prefix_len = s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        if prefix_len == s.len() {
            return (s, None);
        }
        let digits = s[prefix_len..].trim_start_matches('0');
        (&s[..prefix_len], Some(digits))
    }
}

impl Ord for IssueId {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a_prefix, a_num) = self.natural_key();
        let (b_prefix, b_num) = other.natural_key();

        a_prefix
            .cmp(b_prefix)
            .then_with(|| match (a_num, b_num) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            })
            // "7" and "007" are distinct ids
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for IssueId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for IssueId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Presentation data carried with an issue.
///
/// The sync core never inspects it; it is handed to the UI as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDetails {
    /// One-line summary (title).
    pub summary: String,

    /// URL to the issue in the tracker's web UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,

    /// Labels attached to the issue.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    /// Last update timestamp (Unix).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl IssueDetails {
    pub fn with_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Default::default()
        }
    }
}

/// An issue as returned by a remote source. Not owned locally until inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIssue {
    pub id: IssueId,
    pub closed: bool,
    pub details: IssueDetails,
}

impl RemoteIssue {
    pub fn open(id: impl Into<IssueId>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            closed: false,
            details: IssueDetails::with_summary(summary),
        }
    }

    pub fn closed(id: impl Into<IssueId>, summary: impl Into<String>) -> Self {
        Self {
            closed: true,
            ..Self::open(id, summary)
        }
    }
}

/// An issue held in a search's [`OrderedIssueSet`](super::OrderedIssueSet).
///
/// Refreshes replace the whole value; fields are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedIssue {
    pub id: IssueId,
    pub closed: bool,
    pub details: IssueDetails,
}

impl From<RemoteIssue> for TrackedIssue {
    fn from(issue: RemoteIssue) -> Self {
        Self {
            id: issue.id,
            closed: issue.closed,
            details: issue.details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(ids: &[&str]) -> Vec<String> {
        let mut ids: Vec<IssueId> = ids.iter().map(|s| IssueId::from(*s)).collect();
        ids.sort();
        ids.into_iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_numeric_suffix_orders_numerically() {
        assert_eq!(
            sorted(&["PRJ-10", "PRJ-2", "PRJ-1"]),
            vec!["PRJ-1", "PRJ-2", "PRJ-10"]
        );
        assert_eq!(sorted(&["100", "9", "10"]), vec!["9", "10", "100"]);
    }

    #[test]
    fn test_prefix_compared_before_number() {
        assert_eq!(
            sorted(&["B-1", "A-20", "A-3"]),
            vec!["A-3", "A-20", "B-1"]
        );
    }

    #[test]
    fn test_leading_zeros_keep_ids_distinct() {
        let a = IssueId::from("7");
        let b = IssueId::from("007");
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
        assert!(IssueId::from("007") < IssueId::from("8"));
    }

    #[test]
    fn test_ids_without_digits_fall_back_to_text() {
        assert_eq!(sorted(&["beta", "alpha", "alpha1"]), vec!["alpha", "alpha1", "beta"]);
    }

    #[test]
    fn test_order_is_transitive_for_mixed_ids() {
        let mut ids: Vec<IssueId> = ["A5x", "A10", "A9", "A", "B2", "007", "7", "70"]
            .iter()
            .map(|s| IssueId::from(*s))
            .collect();
        ids.sort();
        for a in &ids {
            for b in &ids {
                for c in &ids {
                    if a < b && b < c {
                        assert!(a < c, "{} < {} < {} but not {} < {}", a, b, c, a, c);
                    }
                }
            }
        }
    }

    #[test]
    fn test_tracked_issue_from_remote() {
        let remote = RemoteIssue::closed("12", "Crash on start");
        let tracked = TrackedIssue::from(remote.clone());
        assert_eq!(tracked.id, remote.id);
        assert!(tracked.closed);
        assert_eq!(tracked.details.summary, "Crash on start");
    }

    #[test]
    fn test_details_serialization_skips_empty_fields() {
        let json = serde_json::to_string(&IssueDetails::with_summary("x")).unwrap();
        assert_eq!(json, "{\"summary\":\"x\"}");
    }
}
