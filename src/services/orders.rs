use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        order::{self, OrderStatus, PaymentMethod, PaymentStatus},
        order_item, product_variant, variant_size,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock::{self, ValidatedLine},
};

/// Order read/transition service. Order rows are only ever *created* by the
/// checkout pipeline; this service owns everything after that.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub provider_order_id: Option<String>,
    pub items_price: Decimal,
    pub discount_amount: Decimal,
    pub coupon_code: Option<String>,
    pub shipping_price: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
    pub tax_total: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub items: Vec<order_item::Model>,
    pub legacy: LegacyOrderView,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// The dual-array order shape older clients consume. Both arrays are
/// projected from the same `order_items` rows, so the per-product statuses
/// and the `qty`/`quantity` aliases cannot disagree.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LegacyOrderView {
    pub products: Vec<LegacyProductEntry>,
    pub order_items: Vec<LegacyItemEntry>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LegacyProductEntry {
    pub product: Uuid,
    pub name: String,
    pub size: String,
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LegacyItemEntry {
    pub product: Uuid,
    pub name: String,
    pub quantity: i32,
    /// Legacy alias; always equals `quantity`
    pub qty: i32,
    pub selling_price: Decimal,
    pub original_price: Decimal,
    pub size: String,
    pub image: Option<String>,
    pub status: OrderStatus,
}

/// Projects order items into the legacy dual-array view.
pub fn legacy_view(items: &[order_item::Model]) -> LegacyOrderView {
    LegacyOrderView {
        products: items
            .iter()
            .map(|item| LegacyProductEntry {
                product: item.product_id,
                name: item.name.clone(),
                size: item.size_label.clone(),
                status: item.status,
            })
            .collect(),
        order_items: items
            .iter()
            .map(|item| LegacyItemEntry {
                product: item.product_id,
                name: item.name.clone(),
                quantity: item.quantity,
                qty: item.quantity,
                selling_price: item.selling_price,
                original_price: item.original_price,
                size: item.size_label.clone(),
                image: item.image.clone(),
                status: item.status,
            })
            .collect(),
    }
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDetailResponse, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(OrderDetailResponse {
            order: model_to_response(order),
            legacy: legacy_view(&items),
            items,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        customer_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let paginator = order::Entity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(OrderListResponse {
            orders: orders.into_iter().map(model_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    /// Order-level transition. Items still mirroring the previous order
    /// status follow along; items that already diverged keep their own
    /// status.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn update_order_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<OrderResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let order = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        // Cancellation goes through cancel_order so stock is restored.
        if new_status == OrderStatus::Cancelled {
            return Err(ServiceError::InvalidOperation(
                "use the cancel endpoint to cancel an order".to_string(),
            ));
        }

        let old_status = order.status;
        if !old_status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "cannot move order from {} to {}",
                old_status, new_status
            )));
        }

        let version = order.version;
        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status);
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);
        let updated = active.update(&txn).await?;

        order_item::Entity::update_many()
            .col_expr(
                order_item::Column::Status,
                sea_orm::sea_query::Expr::value(new_status),
            )
            .col_expr(
                order_item::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(Some(Utc::now())),
            )
            .filter(order_item::Column::OrderId.eq(order_id))
            .filter(order_item::Column::Status.eq(old_status))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await;

        info!(order_id = %order_id, "Order status {} -> {}", old_status, new_status);
        Ok(model_to_response(updated))
    }

    /// Per-item divergence: dispatch or cancel a single line.
    #[instrument(skip(self), fields(order_id = %order_id, item_id = %item_id))]
    pub async fn update_item_status(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<order_item::Model, ServiceError> {
        let item = order_item::Entity::find_by_id(item_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order item {} not found", item_id)))?;

        if item.order_id != order_id {
            return Err(ServiceError::InvalidOperation(format!(
                "item {} does not belong to order {}",
                item_id, order_id
            )));
        }

        if !item.status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidStatus(format!(
                "cannot move item from {} to {}",
                item.status, new_status
            )));
        }

        let txn = self.db.begin().await?;

        // Cancelling a single line returns its stock right away.
        if new_status == OrderStatus::Cancelled {
            let restock = self
                .resolve_restock_lines(&txn, std::iter::once(&item))
                .await?;
            stock::restore_stock(&txn, &restock).await?;
        }

        let mut active: order_item::ActiveModel = item.into();
        active.status = Set(new_status);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderItemStatusChanged {
                order_id,
                item_id,
                new_status: new_status.to_string(),
            })
            .await;

        Ok(updated)
    }

    /// Cancels the order and restores stock for every line that had not
    /// already been individually cancelled.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let order = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = order.status;
        if !old_status.can_transition_to(OrderStatus::Cancelled) {
            return Err(ServiceError::InvalidStatus(format!(
                "cannot cancel order in status {}",
                old_status
            )));
        }

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&txn)
            .await?;

        let restock_lines = self
            .resolve_restock_lines(
                &txn,
                items
                    .iter()
                    .filter(|item| item.status != OrderStatus::Cancelled),
            )
            .await?;
        stock::restore_stock(&txn, &restock_lines).await?;

        order_item::Entity::update_many()
            .col_expr(
                order_item::Column::Status,
                sea_orm::sea_query::Expr::value(OrderStatus::Cancelled),
            )
            .filter(order_item::Column::OrderId.eq(order_id))
            .filter(order_item::Column::Status.ne(OrderStatus::Cancelled))
            .exec(&txn)
            .await?;

        let version = order.version;
        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::Cancelled);
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        for line in &restock_lines {
            self.event_sender
                .send_or_log(Event::StockRestored {
                    product_id: line.product_id,
                    size: line.size_label.clone(),
                    quantity: line.quantity,
                })
                .await;
        }
        self.event_sender
            .send_or_log(Event::OrderCancelled(order_id))
            .await;

        Ok(model_to_response(updated))
    }

    /// Maps order items back to their stock rows via SKU + size label.
    async fn resolve_restock_lines<'a, C, I>(
        &self,
        conn: &C,
        items: I,
    ) -> Result<Vec<ValidatedLine>, ServiceError>
    where
        C: sea_orm::ConnectionTrait,
        I: Iterator<Item = &'a order_item::Model>,
    {
        let mut lines = Vec::new();
        for item in items {
            let variant = product_variant::Entity::find()
                .filter(product_variant::Column::Sku.eq(item.sku.clone()))
                .one(conn)
                .await?;
            let Some(variant) = variant else {
                warn!(sku = %item.sku, "No variant found for restock; skipping line");
                continue;
            };
            let size_row = variant_size::Entity::find()
                .filter(variant_size::Column::VariantId.eq(variant.id))
                .filter(variant_size::Column::Label.eq(item.size_label.clone()))
                .one(conn)
                .await?;
            let Some(size_row) = size_row else {
                warn!(sku = %item.sku, size = %item.size_label, "No size row for restock; skipping line");
                continue;
            };
            lines.push(ValidatedLine {
                product_id: item.product_id,
                sku: item.sku.clone(),
                size_row_id: size_row.id,
                size_label: item.size_label.clone(),
                quantity: item.quantity,
            });
        }
        Ok(lines)
    }

    /// Marks a prepaid order paid after a verified capture webhook.
    #[instrument(skip(self))]
    pub async fn mark_paid(
        &self,
        provider_order_id: &str,
        provider_payment_id: &str,
    ) -> Result<OrderResponse, ServiceError> {
        let order = order::Entity::find()
            .filter(order::Column::ProviderOrderId.eq(provider_order_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "no order for provider order {}",
                    provider_order_id
                ))
            })?;

        // Idempotent: re-delivered webhooks are acknowledged without a write.
        if order.payment_status == PaymentStatus::Paid {
            return Ok(model_to_response(order));
        }

        let order_id = order.id;
        let version = order.version;
        let mut active: order::ActiveModel = order.into();
        active.payment_status = Set(PaymentStatus::Paid);
        active.updated_at = Set(Some(Utc::now()));
        active.version = Set(version + 1);
        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::PaymentCaptured {
                order_id,
                provider_payment_id: provider_payment_id.to_string(),
            })
            .await;

        Ok(model_to_response(updated))
    }
}

pub(crate) fn model_to_response(model: order::Model) -> OrderResponse {
    OrderResponse {
        id: model.id,
        order_number: model.order_number,
        customer_id: model.customer_id,
        status: model.status,
        payment_method: model.payment_method,
        payment_status: model.payment_status,
        provider_order_id: model.provider_order_id,
        items_price: model.items_price,
        discount_amount: model.discount_amount,
        coupon_code: model.coupon_code,
        shipping_price: model.shipping_price,
        cgst: model.cgst,
        sgst: model.sgst,
        igst: model.igst,
        tax_total: model.tax_total,
        total_amount: model.total_amount,
        currency: model.currency,
        created_at: model.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(product_id: Uuid, status: OrderStatus) -> order_item::Model {
        order_item::Model {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id,
            sku: "SKU-1".to_string(),
            name: "Trail Runner".to_string(),
            size_label: "M".to_string(),
            quantity: 2,
            selling_price: dec!(500),
            original_price: dec!(600),
            image: None,
            status,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn legacy_view_keeps_both_arrays_in_sync() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let items = vec![item(p1, OrderStatus::Dispatched), item(p2, OrderStatus::Pending)];

        let view = legacy_view(&items);
        assert_eq!(view.products.len(), view.order_items.len());
        for (product_entry, item_entry) in view.products.iter().zip(view.order_items.iter()) {
            assert_eq!(product_entry.product, item_entry.product);
            assert_eq!(product_entry.status, item_entry.status);
        }
    }

    #[test]
    fn legacy_qty_alias_always_matches_quantity() {
        let items = vec![item(Uuid::new_v4(), OrderStatus::Pending)];
        let view = legacy_view(&items);
        assert_eq!(view.order_items[0].qty, view.order_items[0].quantity);
    }
}
