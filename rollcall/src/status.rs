//! Period status decisions
//!
//! A period starts `Pending` and becomes `Complete` exactly once, when a run
//! finds no gaps. A run that finds the period already `Complete` does no
//! gap, escalation or merge work at all.

use crate::model::{PeriodDescriptor, PeriodStatus, RosterEntry};

/// What a run must do for the current period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Period was already complete; nothing to do
    AlreadyComplete,
    /// No gaps: persist `Complete`, skip escalation
    MarkComplete,
    /// Gaps remain: period stays `Pending`, send reminders
    Escalate { gaps: usize },
}

impl Decision {
    /// Status to persist, if any
    pub fn status_write(&self) -> Option<PeriodStatus> {
        match self {
            Decision::MarkComplete => Some(PeriodStatus::Complete),
            _ => None,
        }
    }
}

/// Re-entrancy guard, checked before anything else is read
pub fn is_settled(period: &PeriodDescriptor) -> bool {
    period.status == PeriodStatus::Complete
}

/// Decide the terminal action for `period` given this run's gaps
pub fn decide(period: &PeriodDescriptor, gaps: &[RosterEntry]) -> Decision {
    if is_settled(period) {
        Decision::AlreadyComplete
    } else if gaps.is_empty() {
        Decision::MarkComplete
    } else {
        Decision::Escalate { gaps: gaps.len() }
    }
}
