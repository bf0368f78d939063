//! Out-of-band email channel. The pipeline treats sends as
//! fire-and-forget: a failed COD verification email is logged, never
//! bubbled into the checkout result.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Email API rejected the message: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone)]
pub struct CodVerificationMail {
    pub to: String,
    pub code: String,
    pub order_number: String,
    pub pending_order_id: Uuid,
    pub expiry_minutes: i64,
}

#[async_trait]
pub trait EmailChannel: Send + Sync {
    async fn send_cod_verification(&self, mail: CodVerificationMail)
        -> Result<(), NotificationError>;
}

/// Transactional-mail API client.
pub struct HttpEmailChannel {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    from_address: String,
}

#[derive(Debug, Serialize)]
struct SendMailBody<'a> {
    from: &'a str,
    to: &'a str,
    subject: String,
    text: String,
}

impl HttpEmailChannel {
    pub fn new(base_url: String, api_key: String, from_address: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            from_address,
        }
    }
}

#[async_trait]
impl EmailChannel for HttpEmailChannel {
    #[instrument(skip(self, mail), fields(pending_order_id = %mail.pending_order_id))]
    async fn send_cod_verification(
        &self,
        mail: CodVerificationMail,
    ) -> Result<(), NotificationError> {
        let body = SendMailBody {
            from: &self.from_address,
            to: &mail.to,
            subject: format!("Verify your cash-on-delivery order {}", mail.order_number),
            text: format!(
                "Your verification code is {}. It expires in {} minutes. \
                 Enter it on the checkout page to confirm order {}.",
                mail.code, mail.expiry_minutes, mail.order_number
            ),
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected(format!("{}: {}", status, detail)));
        }
        Ok(())
    }
}

/// Spawns the send so the checkout response never waits on the mail API.
pub fn send_cod_verification_detached(channel: Arc<dyn EmailChannel>, mail: CodVerificationMail) {
    tokio::spawn(async move {
        let pending_order_id = mail.pending_order_id;
        if let Err(e) = channel.send_cod_verification(mail).await {
            error!(
                pending_order_id = %pending_order_id,
                "Failed to send COD verification email: {}",
                e
            );
        }
    });
}
