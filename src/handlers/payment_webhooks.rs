use crate::handlers::common::{map_service_error, success_response};
use crate::{errors::ApiError, services::payments, AppState};
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

const SIGNATURE_HEADER: &str = "x-webhook-signature";

pub fn payment_webhook_routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhook", post(handle_webhook))
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    event: String,
    provider_order_id: String,
    provider_payment_id: Option<String>,
}

/// Payment-provider callback. The raw body is HMAC-verified before any
/// parsing; `payment.captured` marks the order paid and clears the
/// customer's cart. Other events are acknowledged and ignored.
#[utoipa::path(
    post,
    path = "/api/v1/payments/webhook",
    request_body(content = String, description = "Raw signed webhook payload"),
    responses(
        (status = 200, description = "Webhook processed"),
        (status = 401, description = "Signature missing or invalid"),
    ),
    tag = "payments"
)]
pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    payments::verify_webhook_signature(&state.config.payment.webhook_secret, &body, signature)
        .map_err(map_service_error)?;

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("malformed webhook payload: {}", e)))?;

    if payload.event != "payment.captured" {
        info!(event = %payload.event, "Ignoring webhook event");
        return Ok(success_response(serde_json::json!({ "handled": false })));
    }

    let order = state
        .services
        .orders
        .mark_paid(
            &payload.provider_order_id,
            payload.provider_payment_id.as_deref().unwrap_or(""),
        )
        .await
        .map_err(map_service_error)?;

    // Prepaid carts are cleared only once payment is confirmed.
    state
        .services
        .checkout
        .clear_active_cart(order.customer_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "handled": true,
        "order_id": order.id,
    })))
}
