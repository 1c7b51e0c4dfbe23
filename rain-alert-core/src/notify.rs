//! SMS delivery through the Twilio Messages API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::{self, Debug};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    config::{Config, DEFAULT_TWILIO_API_BASE},
    http::{REQUEST_TIMEOUT, build_client, truncate_body},
    model::{DeliveryReceipt, OutboundMessage},
};

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("HTTP request to Twilio failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Twilio rejected the message (HTTP {status}{}): {message}", code_suffix(.code))]
    Rejected {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("Refusing to send an empty message body")]
    EmptyBody,

    #[error("Failed to parse Twilio response: {0}")]
    Parse(String),
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(", code {c}")).unwrap_or_default()
}

#[async_trait]
pub trait NotificationClient: Send + Sync + Debug {
    /// Submit one message. Provider rejections are returned, not swallowed.
    async fn send_alert(&self, message: &OutboundMessage)
    -> Result<DeliveryReceipt, NotificationError>;
}

#[derive(Clone)]
pub struct TwilioClient {
    http: Client,
    account_sid: String,
    auth_token: String,
    base_url: String,
}

impl Debug for TwilioClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioClient")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl TwilioClient {
    pub fn new(account_sid: String, auth_token: String) -> Result<Self, NotificationError> {
        Ok(Self {
            http: build_client(REQUEST_TIMEOUT)?,
            account_sid,
            auth_token,
            base_url: DEFAULT_TWILIO_API_BASE.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, NotificationError> {
        Ok(Self::new(
            config.twilio_account_sid().to_string(),
            config.twilio_auth_token().to_string(),
        )?
        .with_base_url(config.twilio_api_base().to_string()))
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url.trim_end_matches('/'),
            self.account_sid
        )
    }
}

#[derive(Debug, Deserialize)]
struct TwilioErrorResponse {
    code: Option<i64>,
    message: Option<String>,
}

#[async_trait]
impl NotificationClient for TwilioClient {
    #[instrument(skip(self, message), fields(to = %message.to))]
    async fn send_alert(
        &self,
        message: &OutboundMessage,
    ) -> Result<DeliveryReceipt, NotificationError> {
        if message.body.trim().is_empty() {
            return Err(NotificationError::EmptyBody);
        }

        let res = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", message.to.as_str()),
                ("From", message.from.as_str()),
                ("Body", message.body.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<TwilioErrorResponse>(&body).ok();
            let code = detail.as_ref().and_then(|d| d.code);
            let message = detail
                .and_then(|d| d.message)
                .unwrap_or_else(|| truncate_body(&body));

            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                code,
                message,
            });
        }

        let receipt: DeliveryReceipt =
            serde_json::from_str(&body).map_err(|e| NotificationError::Parse(e.to_string()))?;

        debug!(sid = %receipt.sid, status = ?receipt.status, "Message accepted");
        Ok(receipt)
    }
}
