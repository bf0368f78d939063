//! Stock snapshotting, all-or-nothing validation, and the atomic
//! floor-checked decrement. Snapshots are read fresh on every checkout
//! attempt; they are never cached.

use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    entities::{cart_item, product, product_variant, variant_size},
    errors::ServiceError,
    services::pricing::ProductPricingInfo,
};

/// Fresh per-checkout view of one product's purchasable stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: Uuid,
    pub name: String,
    pub base_price: Decimal,
    pub discount_percent: Decimal,
    pub variants: Vec<VariantSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSnapshot {
    pub variant_id: Uuid,
    pub sku: String,
    pub dead_weight_grams: i32,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
    pub sizes: Vec<SizeSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeSnapshot {
    /// Row id the atomic decrement targets
    pub size_row_id: Uuid,
    pub label: String,
    pub price: Option<Decimal>,
    pub available_qty: i32,
}

/// A cart line that passed validation, with its size resolved to a
/// concrete stock row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedLine {
    pub product_id: Uuid,
    pub sku: String,
    pub size_row_id: Uuid,
    pub size_label: String,
    pub quantity: i32,
}

/// Loads a fresh stock snapshot for the given products on any connection
/// (pool or transaction).
#[instrument(skip(conn))]
pub async fn fetch_snapshot<C: ConnectionTrait>(
    conn: &C,
    product_ids: &[Uuid],
) -> Result<Vec<ProductSnapshot>, ServiceError> {
    let products = product::Entity::find()
        .filter(product::Column::Id.is_in(product_ids.to_vec()))
        .all(conn)
        .await?;

    let variants = product_variant::Entity::find()
        .filter(product_variant::Column::ProductId.is_in(product_ids.to_vec()))
        .order_by_asc(product_variant::Column::Position)
        .all(conn)
        .await?;

    let variant_ids: Vec<Uuid> = variants.iter().map(|v| v.id).collect();
    let sizes = variant_size::Entity::find()
        .filter(variant_size::Column::VariantId.is_in(variant_ids))
        .order_by_asc(variant_size::Column::CreatedAt)
        .all(conn)
        .await?;

    let mut sizes_by_variant: HashMap<Uuid, Vec<SizeSnapshot>> = HashMap::new();
    for size in sizes {
        sizes_by_variant
            .entry(size.variant_id)
            .or_default()
            .push(SizeSnapshot {
                size_row_id: size.id,
                label: size.label,
                price: size.price,
                available_qty: size.available_qty,
            });
    }

    let mut variants_by_product: HashMap<Uuid, Vec<VariantSnapshot>> = HashMap::new();
    for variant in variants {
        variants_by_product
            .entry(variant.product_id)
            .or_default()
            .push(VariantSnapshot {
                variant_id: variant.id,
                sku: variant.sku,
                dead_weight_grams: variant.dead_weight_grams,
                length_cm: variant.length_cm,
                width_cm: variant.width_cm,
                height_cm: variant.height_cm,
                sizes: sizes_by_variant.remove(&variant.id).unwrap_or_default(),
            });
    }

    Ok(products
        .into_iter()
        .map(|p| ProductSnapshot {
            product_id: p.id,
            name: p.name,
            base_price: p.base_price,
            discount_percent: p.discount_percent,
            variants: variants_by_product.remove(&p.id).unwrap_or_default(),
        })
        .collect())
}

/// Derives the pricing view of a snapshot for the price calculator.
pub fn pricing_info(snapshot: &[ProductSnapshot]) -> HashMap<Uuid, ProductPricingInfo> {
    snapshot
        .iter()
        .map(|p| {
            let mut size_prices = HashMap::new();
            for variant in &p.variants {
                for size in &variant.sizes {
                    if let Some(price) = size.price {
                        size_prices.entry(size.label.clone()).or_insert(price);
                    }
                }
            }
            (
                p.product_id,
                ProductPricingInfo {
                    base_price: p.base_price,
                    discount_percent: p.discount_percent,
                    size_prices,
                },
            )
        })
        .collect()
}

/// Validates every cart line against the snapshot. All-or-nothing: the
/// first failure aborts the whole checkout. Products absent from the
/// snapshot fail as a group so the error can name all of them.
///
/// A line without a size is assigned the first size of the product's first
/// variant; that assignment is logged because it silently picks a variant
/// for the customer.
pub fn validate_items(
    items: &[cart_item::Model],
    snapshot: &[ProductSnapshot],
) -> Result<Vec<ValidatedLine>, ServiceError> {
    let by_id: HashMap<Uuid, &ProductSnapshot> =
        snapshot.iter().map(|p| (p.product_id, p)).collect();

    let missing: Vec<Uuid> = items
        .iter()
        .map(|i| i.product_id)
        .filter(|id| !by_id.contains_key(id))
        .collect();
    if !missing.is_empty() {
        return Err(ServiceError::ProductUnavailable {
            product_ids: missing,
        });
    }

    let mut validated = Vec::with_capacity(items.len());
    for item in items {
        let product = by_id[&item.product_id];

        let size_label = match item.size_label.as_deref() {
            Some(label) => label.to_string(),
            None => {
                let assigned = product
                    .variants
                    .iter()
                    .find_map(|v| v.sizes.first())
                    .map(|s| s.label.clone())
                    .ok_or_else(|| ServiceError::SizeUnavailable {
                        product_id: item.product_id,
                        size: "(none)".to_string(),
                    })?;
                warn!(
                    product_id = %item.product_id,
                    size = %assigned,
                    "Cart line had no size; auto-assigned first available size"
                );
                assigned
            }
        };

        let (variant, size) = product
            .variants
            .iter()
            .find_map(|v| {
                v.sizes
                    .iter()
                    .find(|s| s.label == size_label)
                    .map(|s| (v, s))
            })
            .ok_or_else(|| ServiceError::SizeUnavailable {
                product_id: item.product_id,
                size: size_label.clone(),
            })?;

        if size.available_qty < item.quantity {
            return Err(ServiceError::InsufficientStock {
                product_id: item.product_id,
                size: size_label,
                requested: item.quantity,
                available: size.available_qty,
            });
        }

        validated.push(ValidatedLine {
            product_id: item.product_id,
            sku: variant.sku.clone(),
            size_row_id: size.size_row_id,
            size_label,
            quantity: item.quantity,
        });
    }

    Ok(validated)
}

/// Atomically decrements stock for every validated line inside the given
/// transaction. Each line is a single conditional update with a quantity
/// floor (`available_qty >= requested`); zero rows affected means another
/// checkout won the race and the whole transaction must abort.
pub async fn decrement_stock<C: ConnectionTrait>(
    conn: &C,
    lines: &[ValidatedLine],
) -> Result<(), ServiceError> {
    for line in lines {
        let result = variant_size::Entity::update_many()
            .col_expr(
                variant_size::Column::AvailableQty,
                Expr::col(variant_size::Column::AvailableQty).sub(line.quantity),
            )
            .col_expr(
                variant_size::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(variant_size::Column::Id.eq(line.size_row_id))
            .filter(variant_size::Column::AvailableQty.gte(line.quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            let available = variant_size::Entity::find_by_id(line.size_row_id)
                .one(conn)
                .await?
                .map(|s| s.available_qty)
                .unwrap_or(0);
            metrics::counter!("storefront_stock_conflicts_total", 1);
            return Err(ServiceError::InsufficientStock {
                product_id: line.product_id,
                size: line.size_label.clone(),
                requested: line.quantity,
                available,
            });
        }
    }
    Ok(())
}

/// Returns previously decremented stock, used when cancelling an order.
pub async fn restore_stock<C: ConnectionTrait>(
    conn: &C,
    lines: &[ValidatedLine],
) -> Result<(), ServiceError> {
    for line in lines {
        variant_size::Entity::update_many()
            .col_expr(
                variant_size::Column::AvailableQty,
                Expr::col(variant_size::Column::AvailableQty).add(line.quantity),
            )
            .col_expr(
                variant_size::Column::UpdatedAt,
                Expr::value(chrono::Utc::now()),
            )
            .filter(variant_size::Column::Id.eq(line.size_row_id))
            .exec(conn)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn snapshot_with(product_id: Uuid, sizes: Vec<(&str, i32)>) -> ProductSnapshot {
        ProductSnapshot {
            product_id,
            name: "Trail Runner".to_string(),
            base_price: dec!(500),
            discount_percent: Decimal::ZERO,
            variants: vec![VariantSnapshot {
                variant_id: Uuid::new_v4(),
                sku: "TR-001".to_string(),
                dead_weight_grams: 400,
                length_cm: 30.0,
                width_cm: 20.0,
                height_cm: 12.0,
                sizes: sizes
                    .into_iter()
                    .map(|(label, qty)| SizeSnapshot {
                        size_row_id: Uuid::new_v4(),
                        label: label.to_string(),
                        price: None,
                        available_qty: qty,
                    })
                    .collect(),
            }],
        }
    }

    fn cart_line(product_id: Uuid, size: Option<&str>, qty: i32) -> cart_item::Model {
        cart_item::Model {
            id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            product_id,
            name: "Trail Runner".to_string(),
            size_label: size.map(str::to_string),
            quantity: qty,
            unit_price: dec!(500),
            original_price: None,
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn valid_line_resolves_size_row() {
        let product_id = Uuid::new_v4();
        let snapshot = vec![snapshot_with(product_id, vec![("M", 5), ("L", 2)])];
        let validated =
            validate_items(&[cart_line(product_id, Some("M"), 2)], &snapshot).unwrap();
        assert_eq!(validated.len(), 1);
        assert_eq!(validated[0].size_label, "M");
        assert_eq!(validated[0].quantity, 2);
        assert_eq!(validated[0].sku, "TR-001");
    }

    #[test]
    fn missing_product_aborts_naming_all_missing() {
        let known = Uuid::new_v4();
        let unknown_a = Uuid::new_v4();
        let unknown_b = Uuid::new_v4();
        let snapshot = vec![snapshot_with(known, vec![("M", 5)])];
        let items = vec![
            cart_line(known, Some("M"), 1),
            cart_line(unknown_a, Some("M"), 1),
            cart_line(unknown_b, Some("M"), 1),
        ];
        let err = validate_items(&items, &snapshot).unwrap_err();
        assert_matches!(err, ServiceError::ProductUnavailable { product_ids } => {
            assert_eq!(product_ids, vec![unknown_a, unknown_b]);
        });
    }

    #[test]
    fn unset_size_assigns_first_size_of_first_variant() {
        let product_id = Uuid::new_v4();
        let snapshot = vec![snapshot_with(product_id, vec![("S", 1), ("M", 5)])];
        let validated = validate_items(&[cart_line(product_id, None, 1)], &snapshot).unwrap();
        assert_eq!(validated[0].size_label, "S");
    }

    #[test]
    fn unknown_size_aborts_with_product_and_size() {
        let product_id = Uuid::new_v4();
        let snapshot = vec![snapshot_with(product_id, vec![("M", 5)])];
        let err = validate_items(&[cart_line(product_id, Some("XXL"), 1)], &snapshot).unwrap_err();
        assert_matches!(err, ServiceError::SizeUnavailable { product_id: pid, size } => {
            assert_eq!(pid, product_id);
            assert_eq!(size, "XXL");
        });
    }

    #[test]
    fn insufficient_stock_reports_requested_and_available() {
        let product_id = Uuid::new_v4();
        let snapshot = vec![snapshot_with(product_id, vec![("M", 2)])];
        let err = validate_items(&[cart_line(product_id, Some("M"), 3)], &snapshot).unwrap_err();
        assert_matches!(err, ServiceError::InsufficientStock { requested: 3, available: 2, .. });
    }

    #[test]
    fn validation_is_all_or_nothing() {
        let good = Uuid::new_v4();
        let bad = Uuid::new_v4();
        let snapshot = vec![
            snapshot_with(good, vec![("M", 5)]),
            snapshot_with(bad, vec![("M", 0)]),
        ];
        let items = vec![cart_line(good, Some("M"), 1), cart_line(bad, Some("M"), 1)];
        assert!(validate_items(&items, &snapshot).is_err());
    }

    #[test]
    fn pricing_info_prefers_first_variant_size_price() {
        let product_id = Uuid::new_v4();
        let mut snapshot = snapshot_with(product_id, vec![("M", 5)]);
        snapshot.variants[0].sizes[0].price = Some(dec!(550));
        let info = pricing_info(&[snapshot]);
        assert_eq!(info[&product_id].size_prices["M"], dec!(550));
        assert_eq!(info[&product_id].base_price, dec!(500));
    }
}
