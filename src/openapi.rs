//! OpenAPI document assembled from the annotated handler paths.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        description = "Checkout and order-finalization endpoints",
        version = env!("CARGO_PKG_VERSION"),
    ),
    paths(
        crate::handlers::checkout::process_checkout,
        crate::handlers::checkout::quote_checkout,
        crate::handlers::checkout::verify_cod,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::update_item_status,
        crate::handlers::orders::cancel_order,
        crate::handlers::payment_webhooks::handle_webhook,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::entities::order::OrderStatus,
        crate::entities::order::PaymentMethod,
        crate::entities::order::PaymentStatus,
        crate::services::orders::OrderResponse,
        crate::services::orders::OrderListResponse,
        crate::services::orders::LegacyOrderView,
        crate::services::orders::LegacyProductEntry,
        crate::services::orders::LegacyItemEntry,
        crate::services::checkout::CheckoutRequest,
        crate::services::checkout::CheckoutOutcome,
        crate::services::checkout::CheckoutTotals,
        crate::services::checkout::Address,
        crate::services::checkout::GstInfo,
        crate::services::tax::GstBreakdown,
        crate::handlers::checkout::VerifyCodRequest,
        crate::handlers::checkout::VerifyCodResponse,
        crate::handlers::orders::UpdateStatusRequest,
    )),
    tags(
        (name = "checkout", description = "Checkout pipeline"),
        (name = "orders", description = "Order lifecycle"),
        (name = "payments", description = "Payment provider callbacks"),
    )
)]
pub struct ApiDoc;
