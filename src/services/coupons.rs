//! Coupon lookup and validation. Percentage discounts apply to the items
//! subtotal before shipping and tax; the tax base is the discounted
//! subtotal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::coupon,
    errors::ServiceError,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CouponApplication {
    pub coupon_id: Uuid,
    pub code: String,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub total_after_discount: Decimal,
}

/// Pure validity check, separated from IO for testability.
fn check_validity(
    coupon: &coupon::Model,
    now: DateTime<Utc>,
    items_price: Decimal,
) -> Result<(), String> {
    if !coupon.active {
        return Err("coupon is not active".to_string());
    }
    if let Some(starts_at) = coupon.starts_at {
        if now < starts_at {
            return Err("coupon is not yet valid".to_string());
        }
    }
    if let Some(expires_at) = coupon.expires_at {
        if now >= expires_at {
            return Err("coupon has expired".to_string());
        }
    }
    if let Some(limit) = coupon.usage_limit {
        if coupon.used_count >= limit {
            return Err("coupon usage limit reached".to_string());
        }
    }
    if let Some(min_total) = coupon.min_order_total {
        if items_price < min_total {
            return Err(format!("order total below coupon minimum of {}", min_total));
        }
    }
    Ok(())
}

/// Computes the discount a coupon code yields on `items_price`, or fails
/// with `CouponInvalid`.
#[instrument(skip(conn))]
pub async fn apply_coupon<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    items_price: Decimal,
) -> Result<CouponApplication, ServiceError> {
    let normalized = code.trim().to_uppercase();
    let coupon = coupon::Entity::find()
        .filter(coupon::Column::Code.eq(normalized.clone()))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::CouponInvalid(format!("unknown coupon {}", normalized)))?;

    check_validity(&coupon, Utc::now(), items_price).map_err(ServiceError::CouponInvalid)?;

    let discount_amount =
        (items_price * coupon.discount_percent / Decimal::ONE_HUNDRED).round_dp(2);
    Ok(CouponApplication {
        coupon_id: coupon.id,
        code: coupon.code,
        discount_percent: coupon.discount_percent,
        discount_amount,
        total_after_discount: items_price - discount_amount,
    })
}

/// Burns one use of the coupon inside the order transaction. The
/// conditional update keeps the usage cap race-free, mirroring the stock
/// decrement.
pub async fn consume_coupon<C: ConnectionTrait>(
    conn: &C,
    coupon_id: Uuid,
) -> Result<(), ServiceError> {
    let result = coupon::Entity::update_many()
        .col_expr(
            coupon::Column::UsedCount,
            Expr::col(coupon::Column::UsedCount).add(1),
        )
        .filter(coupon::Column::Id.eq(coupon_id))
        .filter(
            sea_orm::Condition::any()
                .add(coupon::Column::UsageLimit.is_null())
                .add(Expr::col(coupon::Column::UsedCount).lt(Expr::col(coupon::Column::UsageLimit))),
        )
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::CouponInvalid(
            "coupon usage limit reached".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn coupon_model() -> coupon::Model {
        coupon::Model {
            id: Uuid::new_v4(),
            code: "SAVE10".to_string(),
            discount_percent: dec!(10),
            min_order_total: None,
            active: true,
            starts_at: None,
            expires_at: None,
            usage_limit: None,
            used_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn active_unbounded_coupon_is_valid() {
        assert!(check_validity(&coupon_model(), Utc::now(), dec!(1000)).is_ok());
    }

    #[test]
    fn inactive_coupon_is_rejected() {
        let mut c = coupon_model();
        c.active = false;
        assert!(check_validity(&c, Utc::now(), dec!(1000)).is_err());
    }

    #[test]
    fn validity_window_is_enforced() {
        let now = Utc::now();
        let mut c = coupon_model();
        c.starts_at = Some(now + Duration::hours(1));
        assert!(check_validity(&c, now, dec!(1000)).is_err());

        let mut c = coupon_model();
        c.expires_at = Some(now - Duration::hours(1));
        assert!(check_validity(&c, now, dec!(1000)).is_err());
    }

    #[test]
    fn usage_limit_is_enforced() {
        let mut c = coupon_model();
        c.usage_limit = Some(5);
        c.used_count = 5;
        assert!(check_validity(&c, Utc::now(), dec!(1000)).is_err());
    }

    #[test]
    fn minimum_order_total_is_enforced() {
        let mut c = coupon_model();
        c.min_order_total = Some(dec!(500));
        assert!(check_validity(&c, Utc::now(), dec!(499)).is_err());
        assert!(check_validity(&c, Utc::now(), dec!(500)).is_ok());
    }
}
