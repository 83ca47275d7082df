//! Twilio Programmable Messaging client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use cyclone_core::dispatch::{DeliveryMode, MessageReceipt, Messenger, SendError};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TWILIO_URL: &str = "https://api.twilio.com";

/// Account credentials and sender number.
#[derive(Clone, PartialEq, Eq)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("from_number", &self.from_number)
            .finish()
    }
}

/// Messaging configuration. Anything short of a full credential set is unconfigured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagingCredentials {
    Unconfigured,
    Configured(TwilioCredentials),
}

impl MessagingCredentials {
    pub fn from_parts(
        account_sid: Option<String>,
        auth_token: Option<String>,
        from_number: Option<String>,
    ) -> Self {
        let present = |value: Option<String>| {
            value
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        match (present(account_sid), present(auth_token), present(from_number)) {
            (Some(account_sid), Some(auth_token), Some(from_number)) => {
                MessagingCredentials::Configured(TwilioCredentials {
                    account_sid,
                    auth_token,
                    from_number,
                })
            }
            _ => MessagingCredentials::Unconfigured,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, MessagingCredentials::Configured(_))
    }
}

/// HTTP client for the Twilio Messages resource.
pub struct TwilioClient {
    pub(crate) client: Client,
    pub(crate) api_base: String,
    pub(crate) credentials: TwilioCredentials,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

impl TwilioClient {
    pub fn new(
        api_base: impl Into<String>,
        credentials: TwilioCredentials,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to create HTTP client")?,
            api_base: api_base.into(),
            credentials,
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.credentials.account_sid
        )
    }
}

#[async_trait]
impl Messenger for TwilioClient {
    async fn send(&self, to: &str, body: &str) -> Result<MessageReceipt, SendError> {
        let form = [
            ("To", to),
            ("From", self.credentials.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.credentials.account_sid, Some(&self.credentials.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|err| SendError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&text) {
                Ok(ErrorResponse {
                    code: Some(code),
                    message: Some(message),
                }) => format!("{} (code {})", message, code),
                Ok(ErrorResponse {
                    message: Some(message),
                    ..
                }) => message,
                _ => text,
            };
            return Err(SendError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let payload = response
            .json::<MessageResponse>()
            .await
            .map_err(|err| SendError::Transport(format!("unreadable response: {}", err)))?;

        Ok(MessageReceipt { id: payload.sid })
    }
}

/// Build the dispatcher delivery mode for the given credentials.
pub fn delivery_mode(
    credentials: &MessagingCredentials,
    api_base: &str,
    timeout: Duration,
) -> Result<DeliveryMode> {
    match credentials {
        MessagingCredentials::Unconfigured => Ok(DeliveryMode::Simulated),
        MessagingCredentials::Configured(credentials) => {
            let client = TwilioClient::new(api_base, credentials.clone(), timeout)?;
            Ok(DeliveryMode::Live(Arc::new(client)))
        }
    }
}
