//! Twilio-compatible SMS gateway
//!
//! Posts one form request per message to
//! `{base_url}/2010-04-01/Accounts/{sid}/Messages.json` with basic auth.

use super::NotificationGateway;
use crate::error::DeliveryError;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("rollcall/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// SMS gateway client
pub struct TwilioGateway {
    http_client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_address: String,
}

impl TwilioGateway {
    pub fn new(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_address: impl Into<String>,
    ) -> Result<Self, DeliveryError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_address: from_address.into(),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        )
    }
}

impl NotificationGateway for TwilioGateway {
    async fn send(&self, contact_address: &str, message_body: &str) -> Result<(), DeliveryError> {
        let params = [
            ("To", contact_address),
            ("From", self.from_address.as_str()),
            ("Body", message_body),
        ];

        debug!(to = %contact_address, "Sending SMS");

        let response = self
            .http_client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| DeliveryError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
