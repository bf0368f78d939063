//! The checkout/order-finalization pipeline.
//!
//! One invocation runs strictly in order: validate customer → load cart →
//! fresh stock snapshot → validate stock → compute prices, coupon, tax,
//! shipping → assemble → persist atomically → payment-method branch.
//! Prepaid orders decrement stock inside the checkout transaction and carry
//! a provider order created *before* the transaction, so a provider failure
//! leaves no order row. COD checkouts persist only a pending record; the
//! deferred stock decrement happens when the emailed code is verified.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AppConfig,
    db::DbPool,
    entities::{
        cart, cart_item, customer,
        order::{self, OrderStatus, PaymentMethod, PaymentStatus},
        order_item, pending_cod_order,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        coupons::{self, CouponApplication},
        notifications::{self, CodVerificationMail, EmailChannel},
        orders::{self, OrderResponse},
        payments::{self, PaymentProvider},
        pricing::{self, PricedLine},
        shipping::{chargeable_weight_grams, PackedItem, ShippingService},
        stock::{self, ProductSnapshot, ValidatedLine},
        tax::{self, GstBreakdown},
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct Address {
    #[validate(length(min = 1))]
    pub full_name: String,
    pub phone: Option<String>,
    #[validate(length(min = 1))]
    pub line1: String,
    pub line2: Option<String>,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 2))]
    pub state: String,
    #[validate(length(min = 4))]
    pub postal_code: String,
    #[validate(length(equal = 2))]
    pub country: String,
}

/// GSTIN details for B2B invoices.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GstInfo {
    #[validate(length(equal = 15))]
    pub gstin: String,
    #[validate(length(min = 1))]
    pub business_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    pub customer_id: Uuid,
    #[validate]
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    /// Caller-computed shipping charge; trusted when non-negative
    pub shipping_price: Option<Decimal>,
    #[validate]
    pub gst_info: Option<GstInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutTotals {
    pub items_price: Decimal,
    pub original_items_price: Decimal,
    pub discount_amount: Decimal,
    pub shipping_price: Decimal,
    pub gst: GstBreakdown,
    pub total_amount: Decimal,
    pub currency: String,
}

/// Successful checkout, by payment branch.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CheckoutOutcome {
    /// Prepaid: order persisted, client finishes payment with the handoff
    Prepaid {
        order: OrderResponse,
        provider_order_id: String,
        /// Publishable key for the client payment sheet
        key_id: String,
        amount_minor: i64,
        totals: CheckoutTotals,
    },
    /// COD: a pending record awaiting the emailed verification code
    CodPending {
        pending_order_id: Uuid,
        order_number: String,
        requires_cod_verification: bool,
        expires_at: DateTime<Utc>,
        totals: CheckoutTotals,
    },
}

/// Assembled but unpersisted order; also the JSON payload stored for
/// pending COD orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub cart_id: Uuid,
    pub payment_method: PaymentMethod,
    pub lines: Vec<DraftLine>,
    pub totals: CheckoutTotals,
    pub coupon: Option<CouponApplication>,
    pub shipping_address: Address,
    pub gst_info: Option<GstInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftLine {
    pub product_id: Uuid,
    pub sku: String,
    pub size_row_id: Uuid,
    pub size_label: String,
    pub name: String,
    pub quantity: i32,
    pub selling_price: Decimal,
    pub original_price: Decimal,
    pub image: Option<String>,
}

impl DraftLine {
    fn as_validated(&self) -> ValidatedLine {
        ValidatedLine {
            product_id: self.product_id,
            sku: self.sku.clone(),
            size_row_id: self.size_row_id,
            size_label: self.size_label.clone(),
            quantity: self.quantity,
        }
    }
}

#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DbPool>,
    config: Arc<AppConfig>,
    event_sender: Arc<EventSender>,
    shipping: Arc<ShippingService>,
    payment_provider: Arc<dyn PaymentProvider>,
    email: Arc<dyn EmailChannel>,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DbPool>,
        config: Arc<AppConfig>,
        event_sender: Arc<EventSender>,
        shipping: Arc<ShippingService>,
        payment_provider: Arc<dyn PaymentProvider>,
        email: Arc<dyn EmailChannel>,
    ) -> Self {
        Self {
            db,
            config,
            event_sender,
            shipping,
            payment_provider,
            email,
        }
    }

    /// Runs the full pipeline for one checkout attempt.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, payment_method = %request.payment_method))]
    pub async fn process_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome, ServiceError> {
        let customer_id = request.customer_id;
        match self.run_checkout(request).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.event_sender
                    .send_or_log(Event::CheckoutFailed {
                        customer_id,
                        reason: err.to_string(),
                    })
                    .await;
                Err(err)
            }
        }
    }

    async fn run_checkout(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome, ServiceError> {
        request.validate()?;

        let customer = self.load_customer(request.customer_id).await?;
        let (cart, items) = self.load_active_cart(customer.id).await?;
        let draft = self.build_draft(&request, &cart, &items).await?;

        match request.payment_method {
            PaymentMethod::Prepaid => self.finalize_prepaid(draft).await,
            PaymentMethod::Cod => self.finalize_cod(draft, &customer).await,
        }
    }

    /// Price/tax/shipping preview for the current cart; persists nothing.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn quote(&self, request: CheckoutRequest) -> Result<CheckoutTotals, ServiceError> {
        request.validate()?;
        let customer = self.load_customer(request.customer_id).await?;
        let (cart, items) = self.load_active_cart(customer.id).await?;
        let draft = self.build_draft(&request, &cart, &items).await?;
        Ok(draft.totals)
    }

    async fn load_customer(&self, customer_id: Uuid) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))
    }

    async fn load_active_cart(
        &self,
        customer_id: Uuid,
    ) -> Result<(cart::Model, Vec<cart_item::Model>), ServiceError> {
        let cart = cart::Entity::find()
            .filter(cart::Column::CustomerId.eq(customer_id))
            .filter(cart::Column::Status.eq(cart::CartStatus::Active))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::InvalidOperation("No active cart".to_string()))?;

        let items = cart_item::Entity::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .all(&*self.db)
            .await?;

        if items.is_empty() {
            return Err(ServiceError::InvalidOperation("Cart is empty".to_string()));
        }
        Ok((cart, items))
    }

    /// Steps 3–8 of the pipeline: snapshot, validate, price, coupon,
    /// shipping, tax, assemble.
    async fn build_draft(
        &self,
        request: &CheckoutRequest,
        cart: &cart::Model,
        items: &[cart_item::Model],
    ) -> Result<OrderDraft, ServiceError> {
        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let snapshot = stock::fetch_snapshot(&*self.db, &product_ids).await?;

        let validated = stock::validate_items(items, &snapshot)?;
        let pricing_summary = pricing::price_cart(items, &stock::pricing_info(&snapshot));

        let coupon = match request.coupon_code.as_deref() {
            Some(code) if !code.trim().is_empty() => Some(
                coupons::apply_coupon(&*self.db, code, pricing_summary.items_price).await?,
            ),
            _ => None,
        };
        let discount_amount = coupon
            .as_ref()
            .map(|c| c.discount_amount)
            .unwrap_or(Decimal::ZERO);

        let shipping_price = self
            .shipping_charge(request, items, &snapshot, &validated)
            .await;

        let gst = tax::compute_gst(
            pricing_summary.items_price - discount_amount,
            Some(request.shipping_address.state.as_str()),
            &self.config.business_state,
        );

        Ok(assemble_order(
            cart.id,
            request,
            &self.config.currency,
            &validated,
            &pricing_summary.lines,
            pricing_summary.items_price,
            pricing_summary.original_items_price,
            coupon,
            shipping_price,
            gst,
        ))
    }

    /// Estimator front-end with the pipeline's fallback policy: a carrier
    /// failure must not abort checkout, it degrades to the configured flat
    /// rate.
    async fn shipping_charge(
        &self,
        request: &CheckoutRequest,
        items: &[cart_item::Model],
        snapshot: &[ProductSnapshot],
        validated: &[ValidatedLine],
    ) -> Decimal {
        let weight = chargeable_weight_grams(&packed_items(items, snapshot, validated));
        match self
            .shipping
            .quote(
                request.shipping_price,
                &request.shipping_address.postal_code,
                weight,
                request.payment_method,
            )
            .await
        {
            Ok(q) => q.cost,
            Err(e) => {
                warn!(
                    "Shipping estimate failed, using fallback rate {}: {}",
                    self.config.shipping.fallback_rate, e
                );
                self.config.shipping.fallback_rate
            }
        }
    }

    /// Prepaid branch: provider order first (a failure here aborts with no
    /// order row), then the atomic persist with stock decrements.
    async fn finalize_prepaid(&self, draft: OrderDraft) -> Result<CheckoutOutcome, ServiceError> {
        let amount_minor = payments::to_minor_units(draft.totals.total_amount)?;
        let provider_order = self
            .payment_provider
            .create_order(amount_minor, &draft.totals.currency, &draft.order_number)
            .await?;

        let txn = self.db.begin().await?;
        let order_model = persist_order(
            &txn,
            &draft,
            Some(provider_order.provider_order_id.clone()),
        )
        .await?;
        stock::decrement_stock(
            &txn,
            &draft
                .lines
                .iter()
                .map(DraftLine::as_validated)
                .collect::<Vec<_>>(),
        )
        .await?;
        if let Some(coupon) = &draft.coupon {
            coupons::consume_coupon(&txn, coupon.coupon_id).await?;
        }
        txn.commit().await?;

        self.emit_order_created(&draft).await;
        info!(order_id = %draft.order_id, "Prepaid order created");

        Ok(CheckoutOutcome::Prepaid {
            order: orders::model_to_response(order_model),
            provider_order_id: provider_order.provider_order_id,
            key_id: self.config.payment.key_id.clone(),
            amount_minor,
            totals: draft.totals,
        })
    }

    /// COD branch: persist only the pending record, then email the code.
    /// Stock is untouched until verification.
    async fn finalize_cod(
        &self,
        draft: OrderDraft,
        customer: &customer::Model,
    ) -> Result<CheckoutOutcome, ServiceError> {
        let code = generate_verification_code();
        let expires_at = Utc::now() + self.config.cod_expiry();

        let pending = pending_cod_order::ActiveModel {
            id: Set(draft.order_id),
            customer_id: Set(draft.customer_id),
            order_number: Set(draft.order_number.clone()),
            payload: Set(serde_json::to_value(&draft)?),
            total_amount: Set(draft.totals.total_amount),
            code_hash: Set(hash_verification_code(&code)),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
        };

        let txn = self.db.begin().await?;
        let pending = pending.insert(&txn).await?;
        txn.commit().await?;

        notifications::send_cod_verification_detached(
            self.email.clone(),
            CodVerificationMail {
                to: customer.email.clone(),
                code,
                order_number: pending.order_number.clone(),
                pending_order_id: pending.id,
                expiry_minutes: self.config.cod_expiry_minutes,
            },
        );
        self.event_sender
            .send_or_log(Event::CodVerificationIssued {
                pending_order_id: pending.id,
                expires_at,
            })
            .await;

        info!(pending_order_id = %pending.id, "COD checkout pending verification");
        Ok(CheckoutOutcome::CodPending {
            pending_order_id: pending.id,
            order_number: pending.order_number,
            requires_cod_verification: true,
            expires_at,
            totals: draft.totals,
        })
    }

    /// Verifies a COD code and promotes the pending record: the order and
    /// its items are inserted and the deferred stock decrement runs, all in
    /// one transaction. Stock is re-validated against a fresh snapshot
    /// because it may have drained since checkout.
    #[instrument(skip(self, code), fields(pending_order_id = %pending_order_id))]
    pub async fn verify_cod(
        &self,
        pending_order_id: Uuid,
        code: &str,
    ) -> Result<OrderResponse, ServiceError> {
        let pending = pending_cod_order::Entity::find_by_id(pending_order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("Pending order not found or expired".to_string())
            })?;

        if pending.expires_at <= Utc::now() {
            return Err(ServiceError::InvalidOperation(
                "Verification code has expired".to_string(),
            ));
        }
        if hash_verification_code(code.trim()) != pending.code_hash {
            return Err(ServiceError::Unauthorized(
                "Invalid verification code".to_string(),
            ));
        }

        let draft: OrderDraft = serde_json::from_value(pending.payload.clone())?;

        let txn = self.db.begin().await?;
        let lines = self.revalidate_draft_stock(&txn, &draft).await?;
        let order_model = persist_order(&txn, &draft, None).await?;
        stock::decrement_stock(&txn, &lines).await?;
        if let Some(coupon) = &draft.coupon {
            coupons::consume_coupon(&txn, coupon.coupon_id).await?;
        }
        pending_cod_order::Entity::delete_by_id(pending_order_id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        self.clear_cart(draft.cart_id).await?;
        self.emit_order_created(&draft).await;
        self.event_sender
            .send_or_log(Event::CodOrderVerified {
                pending_order_id,
                order_id: draft.order_id,
            })
            .await;

        info!(order_id = %draft.order_id, "COD order verified and created");
        Ok(orders::model_to_response(order_model))
    }

    /// Stock may have changed between COD checkout and verification; the
    /// draft's size rows are re-resolved from a fresh snapshot.
    async fn revalidate_draft_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        draft: &OrderDraft,
    ) -> Result<Vec<ValidatedLine>, ServiceError> {
        let product_ids: Vec<Uuid> = draft.lines.iter().map(|l| l.product_id).collect();
        let snapshot = stock::fetch_snapshot(conn, &product_ids).await?;
        let by_id: HashMap<Uuid, &ProductSnapshot> =
            snapshot.iter().map(|p| (p.product_id, p)).collect();

        let mut lines = Vec::with_capacity(draft.lines.len());
        for line in &draft.lines {
            let product = by_id.get(&line.product_id).ok_or_else(|| {
                ServiceError::ProductUnavailable {
                    product_ids: vec![line.product_id],
                }
            })?;
            let size = product
                .variants
                .iter()
                .find_map(|v| v.sizes.iter().find(|s| s.label == line.size_label))
                .ok_or_else(|| ServiceError::SizeUnavailable {
                    product_id: line.product_id,
                    size: line.size_label.clone(),
                })?;
            if size.available_qty < line.quantity {
                return Err(ServiceError::InsufficientStock {
                    product_id: line.product_id,
                    size: line.size_label.clone(),
                    requested: line.quantity,
                    available: size.available_qty,
                });
            }
            lines.push(ValidatedLine {
                size_row_id: size.size_row_id,
                ..line.as_validated()
            });
        }
        Ok(lines)
    }

    /// Deletes expired pending COD records. Run from the background
    /// sweeper; abandoned checkouts never touch stock, so this is a plain
    /// delete.
    #[instrument(skip(self))]
    pub async fn purge_expired_pending(&self) -> Result<u64, ServiceError> {
        let result = pending_cod_order::Entity::delete_many()
            .filter(pending_cod_order::Column::ExpiresAt.lte(Utc::now()))
            .exec(&*self.db)
            .await?;

        if result.rows_affected > 0 {
            info!("Purged {} expired pending COD orders", result.rows_affected);
            self.event_sender
                .send_or_log(Event::CodPendingPurged {
                    purged: result.rows_affected,
                })
                .await;
        }
        Ok(result.rows_affected)
    }

    /// Empties the cart and marks it converted. Prepaid carts are cleared
    /// on payment capture, COD carts on verification.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, cart_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        cart_item::Entity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .exec(&txn)
            .await?;
        if let Some(cart) = cart::Entity::find_by_id(cart_id).one(&txn).await? {
            let mut active: cart::ActiveModel = cart.into();
            active.status = Set(cart::CartStatus::Converted);
            active.updated_at = Set(Utc::now());
            active.update(&txn).await?;
        }
        txn.commit().await?;
        Ok(())
    }

    /// Clears the active cart of a customer, used by the payment webhook.
    pub async fn clear_active_cart(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        let cart = cart::Entity::find()
            .filter(cart::Column::CustomerId.eq(customer_id))
            .filter(cart::Column::Status.eq(cart::CartStatus::Active))
            .one(&*self.db)
            .await?;
        match cart {
            Some(cart) => self.clear_cart(cart.id).await,
            None => Ok(()),
        }
    }

    async fn emit_order_created(&self, draft: &OrderDraft) {
        self.event_sender
            .send_or_log(Event::OrderCreated(draft.order_id))
            .await;
        self.event_sender
            .send_or_log(Event::CheckoutCompleted {
                order_id: draft.order_id,
                customer_id: draft.customer_id,
            })
            .await;
        for line in &draft.lines {
            self.event_sender
                .send_or_log(Event::StockDecremented {
                    product_id: line.product_id,
                    size: line.size_label.clone(),
                    quantity: line.quantity,
                })
                .await;
        }
    }
}

/// Joins cart lines with their validated variants for weight computation.
fn packed_items(
    items: &[cart_item::Model],
    snapshot: &[ProductSnapshot],
    validated: &[ValidatedLine],
) -> Vec<PackedItem> {
    let by_id: HashMap<Uuid, &ProductSnapshot> =
        snapshot.iter().map(|p| (p.product_id, p)).collect();
    items
        .iter()
        .zip(validated.iter())
        .filter_map(|(item, line)| {
            let product = by_id.get(&item.product_id)?;
            let variant = product.variants.iter().find(|v| v.sku == line.sku)?;
            Some(PackedItem {
                dead_weight_grams: variant.dead_weight_grams,
                length_cm: variant.length_cm,
                width_cm: variant.width_cm,
                height_cm: variant.height_cm,
                quantity: item.quantity,
            })
        })
        .collect()
}

/// The order assembler: combines validation, pricing, coupon, shipping and
/// tax outputs into the record shape for the chosen payment method. Pure;
/// persistence belongs to the transaction helpers below.
#[allow(clippy::too_many_arguments)]
pub fn assemble_order(
    cart_id: Uuid,
    request: &CheckoutRequest,
    currency: &str,
    validated: &[ValidatedLine],
    priced: &[PricedLine],
    items_price: Decimal,
    original_items_price: Decimal,
    coupon: Option<CouponApplication>,
    shipping_price: Decimal,
    gst: GstBreakdown,
) -> OrderDraft {
    let order_id = Uuid::new_v4();
    let discount_amount = coupon
        .as_ref()
        .map(|c| c.discount_amount)
        .unwrap_or(Decimal::ZERO);
    let total_amount = items_price - discount_amount + shipping_price + gst.total;

    let lines = validated
        .iter()
        .zip(priced.iter())
        .map(|(v, p)| DraftLine {
            product_id: v.product_id,
            sku: v.sku.clone(),
            size_row_id: v.size_row_id,
            size_label: v.size_label.clone(),
            name: p.name.clone(),
            quantity: v.quantity,
            selling_price: p.selling_price,
            original_price: p.original_price,
            image: p.image.clone(),
        })
        .collect();

    OrderDraft {
        order_id,
        order_number: format!("ORD-{}", &order_id.simple().to_string()[..8].to_uppercase()),
        customer_id: request.customer_id,
        cart_id,
        payment_method: request.payment_method,
        lines,
        totals: CheckoutTotals {
            items_price,
            original_items_price,
            discount_amount,
            shipping_price,
            gst,
            total_amount,
            currency: currency.to_string(),
        },
        coupon,
        shipping_address: request.shipping_address.clone(),
        gst_info: request.gst_info.clone(),
    }
}

/// Inserts the order row and its items inside the caller's transaction.
async fn persist_order<C: ConnectionTrait>(
    conn: &C,
    draft: &OrderDraft,
    provider_order_id: Option<String>,
) -> Result<order::Model, ServiceError> {
    let now = Utc::now();
    let order_model = order::ActiveModel {
        id: Set(draft.order_id),
        order_number: Set(draft.order_number.clone()),
        customer_id: Set(draft.customer_id),
        status: Set(OrderStatus::Pending),
        payment_method: Set(draft.payment_method),
        payment_status: Set(PaymentStatus::Pending),
        provider_order_id: Set(provider_order_id),
        items_price: Set(draft.totals.items_price),
        original_items_price: Set(draft.totals.original_items_price),
        discount_amount: Set(draft.totals.discount_amount),
        coupon_code: Set(draft.coupon.as_ref().map(|c| c.code.clone())),
        shipping_price: Set(draft.totals.shipping_price),
        cgst: Set(draft.totals.gst.cgst),
        sgst: Set(draft.totals.gst.sgst),
        igst: Set(draft.totals.gst.igst),
        tax_total: Set(draft.totals.gst.total),
        total_amount: Set(draft.totals.total_amount),
        currency: Set(draft.totals.currency.clone()),
        shipping_address: Set(serde_json::to_string(&draft.shipping_address)?),
        gst_info: Set(draft
            .gst_info
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?),
        created_at: Set(now),
        updated_at: Set(Some(now)),
        version: Set(1),
    }
    .insert(conn)
    .await?;

    for line in &draft.lines {
        order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(draft.order_id),
            product_id: Set(line.product_id),
            sku: Set(line.sku.clone()),
            name: Set(line.name.clone()),
            size_label: Set(line.size_label.clone()),
            quantity: Set(line.quantity),
            selling_price: Set(line.selling_price),
            original_price: Set(line.original_price),
            image: Set(line.image.clone()),
            status: Set(OrderStatus::Pending),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(conn)
        .await?;
    }

    Ok(order_model)
}

fn generate_verification_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

pub(crate) fn hash_verification_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(method: PaymentMethod, state: &str) -> CheckoutRequest {
        CheckoutRequest {
            customer_id: Uuid::new_v4(),
            shipping_address: Address {
                full_name: "Asha Rao".to_string(),
                phone: Some("9800000000".to_string()),
                line1: "14 MG Road".to_string(),
                line2: None,
                city: "Pune".to_string(),
                state: state.to_string(),
                postal_code: "411001".to_string(),
                country: "IN".to_string(),
            },
            payment_method: method,
            coupon_code: None,
            shipping_price: None,
            gst_info: None,
        }
    }

    fn one_line() -> (Vec<ValidatedLine>, Vec<PricedLine>) {
        let product_id = Uuid::new_v4();
        (
            vec![ValidatedLine {
                product_id,
                sku: "TR-001".to_string(),
                size_row_id: Uuid::new_v4(),
                size_label: "M".to_string(),
                quantity: 2,
            }],
            vec![PricedLine {
                product_id,
                name: "Trail Runner".to_string(),
                size_label: Some("M".to_string()),
                quantity: 2,
                selling_price: dec!(500),
                original_price: dec!(500),
                image: None,
            }],
        )
    }

    #[test]
    fn assembled_totals_satisfy_the_price_equation() {
        let (validated, priced) = one_line();
        let gst = tax::compute_gst(dec!(1000), Some("Maharashtra"), "Maharashtra");
        let draft = assemble_order(
            Uuid::new_v4(),
            &request(PaymentMethod::Prepaid, "Maharashtra"),
            "INR",
            &validated,
            &priced,
            dec!(1000),
            dec!(1000),
            None,
            dec!(70),
            gst,
        );

        let t = &draft.totals;
        assert_eq!(
            t.total_amount,
            t.items_price - t.discount_amount + t.shipping_price + t.gst.total
        );
        assert_eq!(t.total_amount, dec!(1250));
        assert_eq!(t.gst.cgst, dec!(90));
        assert_eq!(t.gst.sgst, dec!(90));
        assert_eq!(t.gst.igst, Decimal::ZERO);
    }

    #[test]
    fn coupon_discount_reduces_the_total() {
        let (validated, priced) = one_line();
        let coupon = CouponApplication {
            coupon_id: Uuid::new_v4(),
            code: "SAVE10".to_string(),
            discount_percent: dec!(10),
            discount_amount: dec!(100),
            total_after_discount: dec!(900),
        };
        let gst = tax::compute_gst(dec!(900), Some("Kerala"), "Maharashtra");
        let draft = assemble_order(
            Uuid::new_v4(),
            &request(PaymentMethod::Cod, "Kerala"),
            "INR",
            &validated,
            &priced,
            dec!(1000),
            dec!(1000),
            Some(coupon),
            dec!(70),
            gst,
        );

        // 1000 - 100 + 70 + 162 (18% of 900, all IGST inter-state)
        assert_eq!(draft.totals.gst.igst, dec!(162));
        assert_eq!(draft.totals.total_amount, dec!(1132));
        assert_eq!(draft.coupon.as_ref().unwrap().code, "SAVE10");
    }

    #[test]
    fn draft_lines_merge_validation_and_pricing() {
        let (validated, priced) = one_line();
        let gst = GstBreakdown::zero();
        let draft = assemble_order(
            Uuid::new_v4(),
            &request(PaymentMethod::Prepaid, "Maharashtra"),
            "INR",
            &validated,
            &priced,
            dec!(1000),
            dec!(1000),
            None,
            Decimal::ZERO,
            gst,
        );
        assert_eq!(draft.lines.len(), 1);
        let line = &draft.lines[0];
        assert_eq!(line.sku, "TR-001");
        assert_eq!(line.size_label, "M");
        assert_eq!(line.selling_price, dec!(500));
        assert!(draft.order_number.starts_with("ORD-"));
        assert_eq!(draft.order_number.len(), 12);
    }

    #[test]
    fn verification_code_hash_is_stable_hex_sha256() {
        let hash = hash_verification_code("123456");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_verification_code("123456"));
        assert_ne!(hash, hash_verification_code("123457"));
    }

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn draft_roundtrips_through_json() {
        let (validated, priced) = one_line();
        let draft = assemble_order(
            Uuid::new_v4(),
            &request(PaymentMethod::Cod, "Kerala"),
            "INR",
            &validated,
            &priced,
            dec!(1000),
            dec!(1000),
            None,
            dec!(70),
            tax::compute_gst(dec!(1000), Some("Kerala"), "Maharashtra"),
        );
        let value = serde_json::to_value(&draft).unwrap();
        let back: OrderDraft = serde_json::from_value(value).unwrap();
        assert_eq!(back.order_id, draft.order_id);
        assert_eq!(back.totals.total_amount, draft.totals.total_amount);
        assert_eq!(back.lines[0].size_row_id, draft.lines[0].size_row_id);
    }
}
