pub mod checkout;
pub mod common;
pub mod orders;
pub mod payment_webhooks;

use crate::cache::{CacheBackend, InMemoryCache};
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    notifications::{EmailChannel, HttpEmailChannel},
    payments::{HttpPaymentProvider, PaymentProvider},
    shipping::{HttpShippingRateProvider, ShippingRateProvider, ShippingService},
    CheckoutService, OrderService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub checkout: Arc<CheckoutService>,
    pub orders: Arc<OrderService>,
}

impl AppServices {
    /// Wires the service graph against the live HTTP providers.
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, config: Arc<AppConfig>) -> Self {
        let shipping_provider: Arc<dyn ShippingRateProvider> =
            Arc::new(HttpShippingRateProvider::new(
                config.shipping.base_url.clone(),
                config.shipping.api_token.clone(),
                config.shipping.pickup_postal_code.clone(),
            ));
        let payment_provider: Arc<dyn PaymentProvider> = Arc::new(HttpPaymentProvider::new(
            config.payment.base_url.clone(),
            config.payment.key_id.clone(),
            config.payment.key_secret.clone(),
        ));
        let email: Arc<dyn EmailChannel> = Arc::new(HttpEmailChannel::new(
            config.email.base_url.clone(),
            config.email.api_key.clone(),
            config.email.from_address.clone(),
        ));
        Self::with_providers(db, event_sender, config, shipping_provider, payment_provider, email)
    }

    /// Wires the service graph with injected providers (used by tests).
    pub fn with_providers(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
        shipping_provider: Arc<dyn ShippingRateProvider>,
        payment_provider: Arc<dyn PaymentProvider>,
        email: Arc<dyn EmailChannel>,
    ) -> Self {
        let cache: Arc<dyn CacheBackend> = Arc::new(InMemoryCache::new(
            config.cache.capacity,
            Some(config.cache_ttl()),
        ));
        let shipping = Arc::new(ShippingService::new(
            shipping_provider,
            cache,
            config.cache_ttl(),
        ));

        let orders = Arc::new(OrderService::new(db.clone(), event_sender.clone()));
        let checkout = Arc::new(CheckoutService::new(
            db,
            config,
            event_sender,
            shipping,
            payment_provider,
            email,
        ));

        Self { checkout, orders }
    }
}
