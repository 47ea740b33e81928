//! Database row models
//!
//! Rows mirror table columns one to one. Validation into domain types
//! happens in the store that reads them.

use serde::{Deserialize, Serialize};

/// `roster` table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RosterRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub active: bool,
    pub direct_contact: bool,
    pub delegate_id: Option<i64>,
    pub contact_address: String,
}

/// `periods` table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PeriodRow {
    pub period_key: String,
    pub form_link: String,
    pub response_link: Option<String>,
    pub status: String,
}

/// `submissions` table row, `metrics` is a JSON array of `{name, value}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SubmissionRow {
    pub id: i64,
    pub period_key: String,
    pub submitted_at: String,
    pub reported_identity: String,
    pub metrics: String,
}

/// `history` table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryRow {
    pub period_key: String,
    pub reported_identity: String,
    pub submitted_at: String,
    pub metrics: String,
}
