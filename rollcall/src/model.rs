//! Domain types shared by the engine components
//!
//! Store rows are validated into these types at ingestion, so the pure
//! components never see untyped data.

use rollcall_common::config::EngineSection;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable roster key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RosterId(pub i64);

impl fmt::Display for RosterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an entity may be reached
///
/// Delegation is single-hop: `Delegated` names the entry whose own
/// `contact_address` receives the reminder. That entry's policy is not
/// followed any further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactPolicy {
    /// Reminders go to the entry's own address
    Direct,
    /// Reminders go to another roster entry
    Delegated { delegate_id: RosterId },
    /// Kept in the roster, excluded from gaps and escalation
    Inactive,
}

/// One tracked entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: RosterId,
    /// Display identity, "First Last"
    pub full_name: String,
    pub policy: ContactPolicy,
    /// Raw, unnormalized channel address
    pub contact_address: String,
}

impl RosterEntry {
    pub fn new(
        id: RosterId,
        full_name: impl Into<String>,
        policy: ContactPolicy,
        contact_address: impl Into<String>,
    ) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            policy,
            contact_address: contact_address.into(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.policy != ContactPolicy::Inactive
    }

    pub fn delegate_id(&self) -> Option<RosterId> {
        match self.policy {
            ContactPolicy::Delegated { delegate_id } => Some(delegate_id),
            _ => None,
        }
    }
}

/// Value of a submitted metric field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

/// Named metric, kept in submission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: MetricValue,
}

impl Metric {
    pub fn number(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: MetricValue::Number(value),
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: MetricValue::Text(value.into()),
        }
    }
}

/// One received report row for the current period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Free-text name as submitted (normalized in place before use)
    pub reported_identity: String,
    pub submitted_at: String,
    pub metrics: Vec<Metric>,
}

impl SubmissionRecord {
    pub fn new(reported_identity: impl Into<String>, submitted_at: impl Into<String>) -> Self {
        Self {
            reported_identity: reported_identity.into(),
            submitted_at: submitted_at.into(),
            metrics: Vec::new(),
        }
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }
}

/// Completion state of a period; `Pending -> Complete` is the only transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodStatus {
    Pending,
    Complete,
}

impl PeriodStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodStatus::Pending => "pending",
            PeriodStatus::Complete => "complete",
        }
    }

    /// Parse a stored status string
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "pending" => Some(PeriodStatus::Pending),
            "complete" | "completed" => Some(PeriodStatus::Complete),
            _ => None,
        }
    }
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a reporting period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDescriptor {
    /// Canonical label, e.g. "2026-10"
    pub period_key: String,
    /// Reference link sent in reminders
    pub form_link: String,
    pub status: PeriodStatus,
}

/// Submission tagged with its period, stored append-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub period_key: String,
    pub reported_identity: String,
    pub submitted_at: String,
    pub metrics: Vec<Metric>,
}

impl HistoryRecord {
    pub fn from_submission(period_key: &str, submission: &SubmissionRecord) -> Self {
        Self {
            period_key: period_key.to_string(),
            reported_identity: submission.reported_identity.clone(),
            submitted_at: submission.submitted_at.clone(),
            metrics: submission.metrics.clone(),
        }
    }
}

/// One reminder to send; produced per run, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationJob {
    pub target_contact_address: String,
    /// Identity of the missing reporter (never the delegate's)
    pub subject_identity: String,
    pub reference_link: String,
}

/// Immutable engine settings threaded into planning and resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Prefix applied to bare local numbers, e.g. "+1"
    pub region_code: String,
    /// Name signed on reminder messages
    pub admin_name: String,
    /// Operator address for run reports and empty direct addresses
    pub operator_address: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_section(&EngineSection::default())
    }
}

impl EngineConfig {
    pub fn from_section(section: &EngineSection) -> Self {
        Self {
            region_code: section.region_code.clone(),
            admin_name: section.admin_name.clone(),
            operator_address: section.operator_address.clone(),
        }
    }

    pub fn admin_first_name(&self) -> &str {
        first_word(&self.admin_name)
    }
}

/// First word of a display name, used in message greetings
pub(crate) fn first_word(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or("")
}
