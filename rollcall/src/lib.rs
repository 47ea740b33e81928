//! rollcall - Reconciliation & Escalation Engine
//!
//! Reconciles a roster of expected reporters against the submissions
//! received for a reporting period, reminds whoever is missing (through a
//! delegate when they cannot be contacted directly), keeps an append-only
//! history of submissions and marks the period complete once nobody is
//! missing.
//!
//! Components, leaves first:
//! - [`normalize`]: identity normalization
//! - [`delegation`]: single-hop contact resolution
//! - [`gaps`]: gap calculation
//! - [`planner`]: escalation planning
//! - [`history`]: idempotent history merge
//! - [`status`]: period status decisions
//!
//! [`reconciler::Reconciler`] wires them to a [`store::RosterStore`] and a
//! [`gateway::NotificationGateway`].

pub mod delegation;
pub mod error;
pub mod gaps;
pub mod gateway;
pub mod history;
pub mod model;
pub mod normalize;
pub mod planner;
pub mod reconciler;
pub mod schedule;
pub mod status;
pub mod store;

pub use error::{DeliveryError, DeliveryFailure, EngineError, Result};
pub use model::{
    ContactPolicy, EngineConfig, EscalationJob, HistoryRecord, Metric, MetricValue,
    PeriodDescriptor, PeriodStatus, RosterEntry, RosterId, SubmissionRecord,
};
pub use reconciler::{Preview, Reconciler, RunOutcome};
