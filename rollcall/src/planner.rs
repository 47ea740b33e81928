//! Escalation planning: one reminder job per gap entry

use crate::delegation::{resolve_contact, RosterIndex};
use crate::error::{EngineError, Result};
use crate::model::{EngineConfig, EscalationJob, RosterEntry};

/// Build the reminder jobs for `gaps`
///
/// All-or-nothing: if any entry's contact cannot be resolved no job list is
/// returned, and the error names every entry that failed.
pub fn plan(
    gaps: &[RosterEntry],
    roster_index: &RosterIndex,
    form_link: &str,
    config: &EngineConfig,
) -> Result<Vec<EscalationJob>> {
    let mut jobs = Vec::with_capacity(gaps.len());
    let mut problems = Vec::new();

    for entry in gaps {
        match resolve_contact(entry, roster_index, config) {
            Ok(target_contact_address) => jobs.push(EscalationJob {
                target_contact_address,
                subject_identity: entry.full_name.clone(),
                reference_link: form_link.to_string(),
            }),
            Err(EngineError::DataIntegrity(msg)) => problems.push(msg),
            Err(other) => return Err(other),
        }
    }

    if !problems.is_empty() {
        return Err(EngineError::DataIntegrity(problems.join("; ")));
    }

    Ok(jobs)
}
