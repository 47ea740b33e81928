//! Gap calculation: active roster entries with no submission this period

use crate::model::{RosterEntry, SubmissionRecord};
use crate::normalize::normalize;
use std::collections::HashSet;

/// Active roster entries whose normalized name matches no submission
///
/// Output keeps roster order.
pub fn compute_gaps(roster: &[RosterEntry], submissions: &[SubmissionRecord]) -> Vec<RosterEntry> {
    let reported: HashSet<String> = submissions
        .iter()
        .map(|s| normalize(&s.reported_identity))
        .collect();

    roster
        .iter()
        .filter(|entry| entry.is_active())
        .filter(|entry| !reported.contains(&normalize(&entry.full_name)))
        .cloned()
        .collect()
}
