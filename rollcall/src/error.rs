//! Error types for the reconciliation engine
//!
//! Fatal errors (`DataIntegrity`, `Transport`) abort a run before any write.
//! `Delivery` aggregates per-recipient send failures and is only raised
//! after every send has been attempted.

use std::fmt;
use thiserror::Error;

/// Engine error taxonomy
#[derive(Error, Debug)]
pub enum EngineError {
    /// Roster, period or history data that cannot be trusted
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// A store or gateway call failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// One or more reminder messages were not accepted by the gateway
    #[error("Message send failure(s): {}", .0.len())]
    Delivery(Vec<DeliveryFailure>),
}

impl EngineError {
    /// True for errors that abort a run before anything is written
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EngineError::Delivery(_))
    }
}

impl From<rollcall_common::Error> for EngineError {
    fn from(err: rollcall_common::Error) -> Self {
        EngineError::Transport(err.to_string())
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Transport(format!("Database error: {}", err))
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Why a single message was not delivered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Request never produced a response
    #[error("network error: {0}")]
    Network(String),

    /// Gateway answered with a non-success status
    #[error("gateway rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// One failed escalation message, kept for the aggregate report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// Display identity the reminder was about
    pub recipient: String,
    pub contact_address: String,
    pub detail: DeliveryError,
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.recipient, self.contact_address, self.detail
        )
    }
}
