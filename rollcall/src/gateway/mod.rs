//! Notification gateway collaborator and message rendering
//!
//! Delivery is at-least-once: the engine sends every job, collects the
//! per-recipient failures and reports them together.

mod dry_run;
mod twilio;

pub use self::dry_run::LogGateway;
pub use self::twilio::TwilioGateway;

use crate::error::{DeliveryError, EngineError};
use crate::model::{first_word, EngineConfig, EscalationJob};

/// Outbound message channel
#[allow(async_fn_in_trait)]
pub trait NotificationGateway {
    async fn send(&self, contact_address: &str, message_body: &str) -> Result<(), DeliveryError>;
}

/// Gateway selected from configuration at startup
pub enum Gateway {
    DryRun(LogGateway),
    Twilio(TwilioGateway),
}

impl NotificationGateway for Gateway {
    async fn send(&self, contact_address: &str, message_body: &str) -> Result<(), DeliveryError> {
        match self {
            Gateway::DryRun(gateway) => gateway.send(contact_address, message_body).await,
            Gateway::Twilio(gateway) => gateway.send(contact_address, message_body).await,
        }
    }
}

/// Reminder text for one escalation job
pub fn render_reminder(job: &EscalationJob, config: &EngineConfig) -> String {
    format!(
        "Hello! This is an automated message from {admin}.\n\
         Please submit the report for {subject}.\n\
         If you have any questions, please contact {admin_first} directly.\n\
         Thank you.\n\
         Report link: {link}",
        admin = config.admin_name,
        subject = first_word(&job.subject_identity),
        admin_first = config.admin_first_name(),
        link = job.reference_link,
    )
}

/// Operator alert text for a failed run
pub fn render_run_failure(period_key: Option<&str>, err: &EngineError) -> String {
    let mut body = match period_key {
        Some(key) => format!("Rollcall run for {} failed: {}", key, err),
        None => format!("Rollcall run failed: {}", err),
    };

    if let EngineError::Delivery(failures) = err {
        for failure in failures {
            body.push_str("\n- ");
            body.push_str(&failure.to_string());
        }
    }

    body
}
