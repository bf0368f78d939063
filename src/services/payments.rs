//! Payment-provider integration: hosted order creation for the client
//! payment sheet and HMAC verification of the asynchronous capture
//! webhook. Amounts cross the wire in minor currency units.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::instrument;

use crate::errors::ServiceError;

type HmacSha256 = Hmac<Sha256>;

/// Remote order created at the provider, handed to the client to open the
/// payment sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub provider_order_id: String,
    pub amount_minor: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<ProviderOrder, ServiceError>;
}

/// Converts a decimal major-unit amount to minor units (paise).
pub fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| ServiceError::InvalidInput(format!("amount out of range: {}", amount)))
}

/// REST client for the hosted-order endpoint, authenticated with the
/// key-id/key-secret pair.
pub struct HttpPaymentProvider {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

impl HttpPaymentProvider {
    pub fn new(base_url: String, key_id: String, key_secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            key_id,
            key_secret,
        }
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    #[instrument(skip(self))]
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<ProviderOrder, ServiceError> {
        let response = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderBody {
                amount: amount_minor,
                currency,
                receipt,
            })
            .send()
            .await
            .map_err(|e| ServiceError::PaymentFailed(format!("provider order: {}", e)))?;

        if !response.status().is_success() {
            return Err(ServiceError::PaymentFailed(format!(
                "provider order: HTTP {}",
                response.status()
            )));
        }

        let body: CreateOrderResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::PaymentFailed(format!("provider order: {}", e)))?;

        Ok(ProviderOrder {
            provider_order_id: body.id,
            amount_minor: body.amount,
            currency: body.currency,
        })
    }
}

/// Verifies the webhook signature: hex HMAC-SHA256 of the raw body under
/// the shared webhook secret.
pub fn verify_webhook_signature(
    secret: &str,
    body: &[u8],
    signature_hex: &str,
) -> Result<(), ServiceError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ServiceError::InternalError(format!("webhook hmac: {}", e)))?;
    mac.update(body);

    let provided = hex::decode(signature_hex.trim())
        .map_err(|_| ServiceError::Unauthorized("malformed webhook signature".to_string()))?;

    mac.verify_slice(&provided)
        .map_err(|_| ServiceError::Unauthorized("webhook signature mismatch".to_string()))
}
