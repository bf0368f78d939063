//! Per-line price resolution for checkout. Selling price is whatever the
//! cart line currently charges; the original (strike-through) price is
//! resolved through a fallback chain that always lands on a value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entities::cart_item;

/// Pricing-relevant slice of a product, keyed by resolved size label.
#[derive(Debug, Clone, Default)]
pub struct ProductPricingInfo {
    pub base_price: Decimal,
    /// Percentage discount currently applied to the product; zero means none
    pub discount_percent: Decimal,
    /// Size-specific price overrides
    pub size_prices: HashMap<String, Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub name: String,
    pub size_label: Option<String>,
    pub quantity: i32,
    pub selling_price: Decimal,
    pub original_price: Decimal,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSummary {
    pub lines: Vec<PricedLine>,
    /// Σ selling_price × quantity
    pub items_price: Decimal,
    /// Σ original_price × quantity
    pub original_items_price: Decimal,
}

/// Resolves the original price for one line. Chain, first hit wins:
/// explicit line original price → back-derived from the selling price and
/// the product discount percent → size price → product base price →
/// selling price. Never fails; the last step guarantees a value.
fn resolve_original_price(
    item: &cart_item::Model,
    product: Option<&ProductPricingInfo>,
) -> Decimal {
    if let Some(original) = item.original_price {
        return original;
    }

    if let Some(product) = product {
        let dp = product.discount_percent;
        if dp > Decimal::ZERO && dp < Decimal::ONE_HUNDRED {
            let factor = Decimal::ONE - dp / Decimal::ONE_HUNDRED;
            if factor > Decimal::ZERO {
                return (item.unit_price / factor).round_dp(2);
            }
        }

        if let Some(size) = item.size_label.as_deref() {
            if let Some(price) = product.size_prices.get(size) {
                return *price;
            }
        }

        if product.base_price > Decimal::ZERO {
            return product.base_price;
        }
    }

    item.unit_price
}

/// Prices every cart line and aggregates the totals.
pub fn price_cart(
    items: &[cart_item::Model],
    products: &HashMap<Uuid, ProductPricingInfo>,
) -> PricingSummary {
    let mut lines = Vec::with_capacity(items.len());
    let mut items_price = Decimal::ZERO;
    let mut original_items_price = Decimal::ZERO;

    for item in items {
        let original_price = resolve_original_price(item, products.get(&item.product_id));
        let quantity = Decimal::from(item.quantity);
        items_price += item.unit_price * quantity;
        original_items_price += original_price * quantity;

        lines.push(PricedLine {
            product_id: item.product_id,
            name: item.name.clone(),
            size_label: item.size_label.clone(),
            quantity: item.quantity,
            selling_price: item.unit_price,
            original_price,
            image: item.image.clone(),
        });
    }

    PricingSummary {
        lines,
        items_price,
        original_items_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn line(unit_price: Decimal, original: Option<Decimal>, size: Option<&str>, qty: i32) -> cart_item::Model {
        cart_item::Model {
            id: Uuid::new_v4(),
            cart_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            name: "Test".to_string(),
            size_label: size.map(str::to_string),
            quantity: qty,
            unit_price,
            original_price: original,
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn info(base: Decimal, discount: Decimal) -> ProductPricingInfo {
        ProductPricingInfo {
            base_price: base,
            discount_percent: discount,
            size_prices: HashMap::new(),
        }
    }

    #[test]
    fn explicit_original_price_wins() {
        let item = line(dec!(400), Some(dec!(999)), Some("M"), 1);
        let got = resolve_original_price(&item, Some(&info(dec!(500), dec!(20))));
        assert_eq!(got, dec!(999));
    }

    #[test]
    fn derives_from_discount_percent() {
        // 400 at 20% off => original 500
        let item = line(dec!(400), None, Some("M"), 1);
        let got = resolve_original_price(&item, Some(&info(dec!(0), dec!(20))));
        assert_eq!(got, dec!(500));
    }

    #[test]
    fn falls_back_to_size_price() {
        let item = line(dec!(400), None, Some("M"), 1);
        let mut product = info(dec!(450), Decimal::ZERO);
        product.size_prices.insert("M".to_string(), dec!(480));
        assert_eq!(resolve_original_price(&item, Some(&product)), dec!(480));
    }

    #[test]
    fn falls_back_to_base_price_then_selling_price() {
        let item = line(dec!(400), None, None, 1);
        assert_eq!(
            resolve_original_price(&item, Some(&info(dec!(450), Decimal::ZERO))),
            dec!(450)
        );
        // No product record at all: degrade to the selling price.
        assert_eq!(resolve_original_price(&item, None), dec!(400));
    }

    #[test]
    fn hundred_percent_discount_does_not_divide_by_zero() {
        let item = line(dec!(400), None, None, 1);
        let got = resolve_original_price(&item, Some(&info(dec!(450), dec!(100))));
        assert_eq!(got, dec!(450));
    }

    #[test]
    fn aggregates_scale_by_quantity() {
        let mut item = line(dec!(500), Some(dec!(600)), Some("M"), 2);
        let product_id = item.product_id;
        item.quantity = 2;
        let products = HashMap::from([(product_id, info(dec!(600), Decimal::ZERO))]);
        let summary = price_cart(std::slice::from_ref(&item), &products);
        assert_eq!(summary.items_price, dec!(1000));
        assert_eq!(summary.original_items_price, dec!(1200));
        assert_eq!(summary.lines.len(), 1);
        assert_eq!(summary.lines[0].selling_price, dec!(500));
    }
}
