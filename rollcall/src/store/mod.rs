//! Roster/tracking store collaborator
//!
//! The engine reads the roster, the period descriptor, the period's
//! submissions and the history through [`RosterStore`], and writes only the
//! period status and new history rows. Transport failures propagate; the
//! engine never retries.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::model::{HistoryRecord, PeriodDescriptor, PeriodStatus, RosterEntry, SubmissionRecord};

/// Storage backend for roster, periods, submissions and history
#[allow(async_fn_in_trait)]
pub trait RosterStore {
    /// Key of the period currently being collected
    async fn current_period_key(&self) -> Result<String>;

    async fn read_period(&self, period_key: &str) -> Result<PeriodDescriptor>;

    async fn read_roster(&self, period_key: &str) -> Result<Vec<RosterEntry>>;

    async fn read_submissions(&self, period_key: &str) -> Result<Vec<SubmissionRecord>>;

    async fn read_history(&self) -> Result<Vec<HistoryRecord>>;

    async fn write_period_status(&self, period_key: &str, status: PeriodStatus) -> Result<()>;

    /// Append new history rows; rows already stored are kept as-is
    async fn write_history(&self, rows: &[HistoryRecord]) -> Result<()>;
}
