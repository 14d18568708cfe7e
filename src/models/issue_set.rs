//! Ordered collection of the issues tracked for one search.

use super::issue::{IssueId, TrackedIssue};
use crate::error::AppError;

/// Outcome of looking an id up in an [`OrderedIssueSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The id is tracked at this index.
    Found(usize),

    /// The id is not tracked; inserting at this index keeps the set sorted.
    NotFound(usize),
}

impl Lookup {
    /// The classic sorted-sequence encoding: `index` when found,
    /// `-(insertion_point + 1)` otherwise.
    pub fn encoded(self) -> isize {
        match self {
            Self::Found(index) => index as isize,
            Self::NotFound(point) => -(point as isize + 1),
        }
    }

    /// Inverse of [`Lookup::encoded`].
    pub fn from_encoded(value: isize) -> Self {
        if value >= 0 {
            Self::Found(value as usize)
        } else {
            Self::NotFound((-(value + 1)) as usize)
        }
    }
}

/// Issues of one search, strictly sorted by [`IssueId`] with no duplicates.
///
/// Only the apply context mutates a live set; see
/// [`ApplyHandle`](crate::services::apply_context::ApplyHandle).
#[derive(Debug, Clone, Default)]
pub struct OrderedIssueSet {
    items: Vec<TrackedIssue>,
}

impl OrderedIssueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from arbitrary issues. Later duplicates of an id are dropped.
    pub fn from_issues(issues: impl IntoIterator<Item = TrackedIssue>) -> Self {
        let mut items: Vec<TrackedIssue> = issues.into_iter().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items.dedup_by(|later, earlier| later.id == earlier.id);
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackedIssue> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedIssue> {
        self.items.iter()
    }

    pub fn ids(&self) -> Vec<IssueId> {
        self.items.iter().map(|issue| issue.id.clone()).collect()
    }

    /// Binary search for `id`.
    pub fn find(&self, id: &IssueId) -> Lookup {
        match self.items.binary_search_by(|probe| probe.id.cmp(id)) {
            Ok(index) => Lookup::Found(index),
            Err(point) => Lookup::NotFound(point),
        }
    }

    /// Insert `issue` at `index`.
    ///
    /// Fails without modifying the set if the position would break the
    /// strict ordering (including inserting a duplicate id).
    pub fn insert_at(&mut self, index: usize, issue: TrackedIssue) -> Result<(), AppError> {
        if index > self.items.len() {
            return Err(AppError::invalid_input_field(
                format!(
                    "Insert position {} is past the end ({} issues)",
                    index,
                    self.items.len()
                ),
                "index",
            ));
        }

        let after_prev = index == 0 || self.items[index - 1].id < issue.id;
        let before_next = index == self.items.len() || issue.id < self.items[index].id;
        if !(after_prev && before_next) {
            return Err(AppError::invalid_input_field(
                format!("Issue {} does not belong at position {}", issue.id, index),
                "index",
            ));
        }

        self.items.insert(index, issue);
        Ok(())
    }

    /// Remove and return the issue at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<TrackedIssue, AppError> {
        if index >= self.items.len() {
            return Err(AppError::not_found_with_id("Issue position", index.to_string()));
        }
        Ok(self.items.remove(index))
    }

    /// Replace the tracked issue with the same id, returning its index.
    pub fn replace(&mut self, issue: TrackedIssue) -> Result<usize, AppError> {
        match self.find(&issue.id) {
            Lookup::Found(index) => {
                self.items[index] = issue;
                Ok(index)
            }
            Lookup::NotFound(_) => Err(AppError::not_found_with_id("Issue", issue.id.as_str())),
        }
    }
}
