//! Dry-run gateway: messages are logged, nothing leaves the process

use super::NotificationGateway;
use crate::error::DeliveryError;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct LogGateway;

impl NotificationGateway for LogGateway {
    async fn send(&self, contact_address: &str, message_body: &str) -> Result<(), DeliveryError> {
        info!(to = %contact_address, "[dry-run] {}", message_body.replace('\n', " | "));
        Ok(())
    }
}
