//! History merge: append a period's submissions without duplicates
//!
//! The pair (period_key, normalized identity) is unique across the whole
//! history. Merging is pure; persisting the result is the store's job.

use crate::model::{HistoryRecord, SubmissionRecord};
use crate::normalize::normalize;
use std::collections::HashSet;

/// Result of [`merge`]
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryMerge {
    /// Full history, existing rows first, new rows appended in submission order
    pub rows: Vec<HistoryRecord>,
    /// Number of rows added by this merge
    pub appended: usize,
}

impl HistoryMerge {
    /// No new rows; the caller can skip the write
    pub fn is_noop(&self) -> bool {
        self.appended == 0
    }

    /// Rows added by this merge
    pub fn new_rows(&self) -> &[HistoryRecord] {
        &self.rows[self.rows.len() - self.appended..]
    }
}

/// Append every submission whose (period, normalized identity) is not yet present
///
/// Appended rows carry the normalized identity. When a period contains the
/// same identity more than once, the first submission wins.
pub fn merge(
    history: Vec<HistoryRecord>,
    period_key: &str,
    submissions: &[SubmissionRecord],
) -> HistoryMerge {
    let mut seen: HashSet<String> = history
        .iter()
        .filter(|row| row.period_key == period_key)
        .map(|row| normalize(&row.reported_identity))
        .collect();

    let mut rows = history;
    let mut appended = 0;

    for submission in submissions {
        let identity = normalize(&submission.reported_identity);
        if !seen.insert(identity.clone()) {
            continue;
        }

        let mut record = HistoryRecord::from_submission(period_key, submission);
        record.reported_identity = identity;
        rows.push(record);
        appended += 1;
    }

    HistoryMerge { rows, appended }
}

/// Normalized identities that were submitted more than once, in first-seen order
pub fn find_duplicates(submissions: &[SubmissionRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();

    for submission in submissions {
        let identity = normalize(&submission.reported_identity);
        if !seen.insert(identity.clone()) && reported.insert(identity.clone()) {
            duplicates.push(identity);
        }
    }

    duplicates
}
