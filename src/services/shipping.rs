//! Carrier rate estimation. Chargeable weight is the greater of dead and
//! volumetric weight per unit, summed over quantity. COD and prepaid query
//! different carrier rates, so the payment mode is a required input.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    cache::{self, CacheBackend},
    entities::order::PaymentMethod,
    errors::ServiceError,
};

/// Courier divisor: volumetric kg = (L×W×H in cm) / 5000, i.e. grams = cm³/5.
const VOLUMETRIC_DIVISOR_G: f64 = 5.0;

/// Shipping-relevant slice of one cart line.
#[derive(Debug, Clone, Copy)]
pub struct PackedItem {
    pub dead_weight_grams: i32,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
    pub quantity: i32,
}

/// Total chargeable weight in grams: per unit, the larger of dead and
/// volumetric weight, multiplied by quantity and summed.
pub fn chargeable_weight_grams(items: &[PackedItem]) -> u32 {
    items
        .iter()
        .map(|item| {
            let volumetric =
                (item.length_cm * item.width_cm * item.height_cm / VOLUMETRIC_DIVISOR_G).ceil();
            let per_unit = (item.dead_weight_grams as f64).max(volumetric);
            per_unit as u32 * item.quantity.max(0) as u32
        })
        .sum()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub cost: Decimal,
    pub courier_name: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShippingRateProvider: Send + Sync {
    async fn estimate(
        &self,
        delivery_postal_code: &str,
        weight_grams: u32,
        mode: PaymentMethod,
    ) -> Result<ShippingQuote, ServiceError>;
}

/// Carrier serviceability API client.
pub struct HttpShippingRateProvider {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    pickup_postal_code: String,
}

#[derive(Debug, Deserialize)]
struct ServiceabilityResponse {
    data: ServiceabilityData,
}

#[derive(Debug, Deserialize)]
struct ServiceabilityData {
    available_couriers: Vec<CourierRate>,
}

#[derive(Debug, Deserialize)]
struct CourierRate {
    courier_name: String,
    rate: Decimal,
}

impl HttpShippingRateProvider {
    pub fn new(base_url: String, api_token: String, pickup_postal_code: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_token,
            pickup_postal_code,
        }
    }
}

#[async_trait]
impl ShippingRateProvider for HttpShippingRateProvider {
    #[instrument(skip(self))]
    async fn estimate(
        &self,
        delivery_postal_code: &str,
        weight_grams: u32,
        mode: PaymentMethod,
    ) -> Result<ShippingQuote, ServiceError> {
        let weight_kg = format!("{:.3}", weight_grams as f64 / 1000.0);
        let cod_flag = if mode == PaymentMethod::Cod { "1" } else { "0" };

        let response = self
            .client
            .get(format!("{}/courier/serviceability", self.base_url))
            .bearer_auth(&self.api_token)
            .query(&[
                ("pickup_postcode", self.pickup_postal_code.as_str()),
                ("delivery_postcode", delivery_postal_code),
                ("weight", weight_kg.as_str()),
                ("cod", cod_flag),
            ])
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("carrier rate: {}", e)))?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "carrier rate: HTTP {}",
                response.status()
            )));
        }

        let body: ServiceabilityResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("carrier rate: {}", e)))?;

        body.data
            .available_couriers
            .into_iter()
            .min_by_key(|c| c.rate)
            .map(|c| ShippingQuote {
                cost: c.rate,
                courier_name: Some(c.courier_name),
            })
            .ok_or_else(|| {
                ServiceError::ExternalServiceError(
                    "carrier rate: no serviceable couriers".to_string(),
                )
            })
    }
}

/// Rate estimation front: trusts a caller-supplied price, then the quote
/// cache, then the live provider. Provider failures surface as errors so
/// the pipeline can decide on a fallback.
pub struct ShippingService {
    provider: Arc<dyn ShippingRateProvider>,
    cache: Arc<dyn CacheBackend>,
    cache_ttl: Duration,
}

impl ShippingService {
    pub fn new(
        provider: Arc<dyn ShippingRateProvider>,
        cache: Arc<dyn CacheBackend>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            cache_ttl,
        }
    }

    fn cache_key(postal_code: &str, weight_grams: u32, mode: PaymentMethod) -> String {
        format!("shiprate:{}:{}:{}", postal_code, weight_grams, mode)
    }

    /// Estimates the shipping charge. A non-negative `caller_price` wins
    /// outright: the front end's weight computation is allowed to be more
    /// accurate than ours, and trusting it avoids a second carrier call.
    #[instrument(skip(self))]
    pub async fn quote(
        &self,
        caller_price: Option<Decimal>,
        delivery_postal_code: &str,
        weight_grams: u32,
        mode: PaymentMethod,
    ) -> Result<ShippingQuote, ServiceError> {
        if let Some(price) = caller_price {
            if price >= Decimal::ZERO {
                return Ok(ShippingQuote {
                    cost: price,
                    courier_name: None,
                });
            }
        }

        let key = Self::cache_key(delivery_postal_code, weight_grams, mode);
        if let Ok(Some(quote)) = cache::get_json::<ShippingQuote>(&*self.cache, &key).await {
            debug!(key = %key, "Shipping quote served from cache");
            return Ok(quote);
        }

        let quote = self
            .provider
            .estimate(delivery_postal_code, weight_grams, mode)
            .await?;

        if let Err(e) = cache::set_json(&*self.cache, &key, &quote, Some(self.cache_ttl)).await {
            debug!("Failed to cache shipping quote: {}", e);
        }
        Ok(quote)
    }
}
