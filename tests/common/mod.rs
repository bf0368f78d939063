//! Test harness: application state backed by a throwaway SQLite database,
//! with injected provider doubles so no network is touched.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use storefront_api::{
    config::AppConfig,
    db,
    entities::{cart, cart_item, coupon, customer, product, product_variant, variant_size},
    errors::ServiceError,
    events::{self, EventSender},
    handlers::AppServices,
    services::{
        notifications::{CodVerificationMail, EmailChannel, NotificationError},
        payments::{PaymentProvider, ProviderOrder},
        shipping::{ShippingQuote, ShippingRateProvider},
    },
    AppState,
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Flat-rate shipping double.
pub struct StaticRateProvider(pub Decimal);

#[async_trait]
impl ShippingRateProvider for StaticRateProvider {
    async fn estimate(
        &self,
        _delivery_postal_code: &str,
        _weight_grams: u32,
        _mode: storefront_api::entities::order::PaymentMethod,
    ) -> Result<ShippingQuote, ServiceError> {
        Ok(ShippingQuote {
            cost: self.0,
            courier_name: Some("TestCourier".to_string()),
        })
    }
}

/// Always-failing shipping double, to exercise the fallback rate.
pub struct FailingRateProvider;

#[async_trait]
impl ShippingRateProvider for FailingRateProvider {
    async fn estimate(
        &self,
        _delivery_postal_code: &str,
        _weight_grams: u32,
        _mode: storefront_api::entities::order::PaymentMethod,
    ) -> Result<ShippingQuote, ServiceError> {
        Err(ServiceError::ExternalServiceError(
            "carrier unreachable".to_string(),
        ))
    }
}

/// Payment provider double; optionally fails order creation.
pub struct StubPaymentProvider {
    pub fail: bool,
}

#[async_trait]
impl PaymentProvider for StubPaymentProvider {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<ProviderOrder, ServiceError> {
        if self.fail {
            return Err(ServiceError::PaymentFailed(
                "provider order: HTTP 502".to_string(),
            ));
        }
        Ok(ProviderOrder {
            provider_order_id: format!("order_test_{}", receipt),
            amount_minor,
            currency: currency.to_string(),
        })
    }
}

/// Email double that records every COD verification mail.
#[derive(Clone, Default)]
pub struct CapturingEmailChannel {
    pub sent: Arc<Mutex<Vec<CodVerificationMail>>>,
}

#[async_trait]
impl EmailChannel for CapturingEmailChannel {
    async fn send_cod_verification(
        &self,
        mail: CodVerificationMail,
    ) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

impl CapturingEmailChannel {
    /// The COD send is fire-and-forget, so tests poll briefly for it.
    pub async fn wait_for_mail(&self) -> CodVerificationMail {
        for _ in 0..100 {
            if let Some(mail) = self.sent.lock().unwrap().last().cloned() {
                return mail;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("no COD verification mail was sent");
    }
}

pub struct TestApp {
    pub state: AppState,
    pub email: CapturingEmailChannel,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::build(Arc::new(StubPaymentProvider { fail: false }), None).await
    }

    pub async fn with_failing_payments() -> Self {
        Self::build(Arc::new(StubPaymentProvider { fail: true }), None).await
    }

    pub async fn with_failing_shipping() -> Self {
        Self::build(
            Arc::new(StubPaymentProvider { fail: false }),
            Some(Arc::new(FailingRateProvider)),
        )
        .await
    }

    async fn build(
        payment_provider: Arc<dyn PaymentProvider>,
        shipping_provider: Option<Arc<dyn ShippingRateProvider>>,
    ) -> Self {
        let db_file = std::env::temp_dir().join(format!("storefront_test_{}.db", Uuid::new_v4()));
        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.display()),
            "127.0.0.1".to_string(),
            0,
            "Maharashtra".to_string(),
        );
        cfg.db_max_connections = 2;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("test database connection");
        db::run_migrations(&pool).await.expect("migrations");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let email = CapturingEmailChannel::default();
        let cfg = Arc::new(cfg);
        let db_arc = Arc::new(pool);

        let services = AppServices::with_providers(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            cfg.clone(),
            shipping_provider.unwrap_or_else(|| Arc::new(StaticRateProvider(dec!(70)))),
            payment_provider,
            Arc::new(email.clone()),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        Self {
            state,
            email,
            _event_task: event_task,
        }
    }

    pub async fn seed_customer(&self) -> customer::Model {
        customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(format!("test+{}@example.com", Uuid::new_v4().simple())),
            full_name: Set("Asha Rao".to_string()),
            phone: Set(Some("9800000000".to_string())),
            state: Set(Some("Maharashtra".to_string())),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed customer")
    }

    /// Seeds a product with one variant and the given sized stock rows.
    pub async fn seed_product(
        &self,
        base_price: Decimal,
        sizes: &[(&str, i32)],
    ) -> (product::Model, product_variant::Model) {
        let now = Utc::now();
        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Trail Runner".to_string()),
            description: Set(None),
            base_price: Set(base_price),
            discount_percent: Set(Decimal::ZERO),
            status: Set(product::ProductStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product");

        let variant = product_variant::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            sku: Set(format!("TR-{}", Uuid::new_v4().simple())),
            position: Set(1),
            dead_weight_grams: Set(400),
            length_cm: Set(30.0),
            width_cm: Set(20.0),
            height_cm: Set(12.0),
            created_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed variant");

        for (label, qty) in sizes {
            variant_size::ActiveModel {
                id: Set(Uuid::new_v4()),
                variant_id: Set(variant.id),
                label: Set(label.to_string()),
                price: Set(None),
                available_qty: Set(*qty),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&*self.state.db)
            .await
            .expect("seed size");
        }

        (product, variant)
    }

    /// Seeds an active cart holding one line for the given product.
    pub async fn seed_cart(
        &self,
        customer_id: Uuid,
        product: &product::Model,
        size: Option<&str>,
        quantity: i32,
        unit_price: Decimal,
    ) -> cart::Model {
        let now = Utc::now();
        let cart = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id),
            currency: Set("INR".to_string()),
            status: Set(cart::CartStatus::Active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed cart");

        self.add_cart_line(&cart, product, size, quantity, unit_price)
            .await;
        cart
    }

    pub async fn add_cart_line(
        &self,
        cart: &cart::Model,
        product: &product::Model,
        size: Option<&str>,
        quantity: i32,
        unit_price: Decimal,
    ) -> cart_item::Model {
        let now = Utc::now();
        cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart.id),
            product_id: Set(product.id),
            name: Set(product.name.clone()),
            size_label: Set(size.map(str::to_string)),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            original_price: Set(None),
            image: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed cart item")
    }

    pub async fn seed_coupon(&self, code: &str, discount_percent: Decimal) -> coupon::Model {
        coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.to_string()),
            discount_percent: Set(discount_percent),
            min_order_total: Set(None),
            active: Set(true),
            starts_at: Set(None),
            expires_at: Set(None),
            usage_limit: Set(None),
            used_count: Set(0),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed coupon")
    }
}
