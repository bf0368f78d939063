use crate::handlers::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    errors::ApiError,
    services::checkout::{CheckoutOutcome, CheckoutRequest, CheckoutTotals},
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for checkout endpoints
pub fn checkout_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(process_checkout))
        .route("/quote", post(quote_checkout))
        .route("/cod/verify", post(verify_cod))
}

/// Run the full checkout pipeline for the customer's active cart.
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created (prepaid) or pending COD verification", body = CheckoutOutcome),
        (status = 422, description = "Product unavailable or insufficient stock"),
        (status = 400, description = "Validation failure or invalid coupon"),
    ),
    tag = "checkout"
)]
pub async fn process_checkout(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let outcome = state
        .services
        .checkout
        .process_checkout(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(outcome))
}

/// Price, tax and shipping preview without persisting anything.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/quote",
    request_body = CheckoutRequest,
    responses((status = 200, description = "Computed totals", body = CheckoutTotals)),
    tag = "checkout"
)]
pub async fn quote_checkout(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let totals = state
        .services
        .checkout
        .quote(payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(totals))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyCodRequest {
    pub pending_order_id: Uuid,
    #[validate(length(equal = 6))]
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyCodResponse {
    pub order_id: Uuid,
    pub order_number: String,
    pub status: String,
    pub verified_at: DateTime<Utc>,
}

/// Verify a COD code: promotes the pending record to a real order and
/// performs the deferred stock decrement.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/cod/verify",
    request_body = VerifyCodRequest,
    responses(
        (status = 200, description = "Order created", body = VerifyCodResponse),
        (status = 401, description = "Wrong verification code"),
        (status = 404, description = "Pending order not found or already purged"),
    ),
    tag = "checkout"
)]
pub async fn verify_cod(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyCodRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .checkout
        .verify_cod(payload.pending_order_id, &payload.code)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(VerifyCodResponse {
        order_id: order.id,
        order_number: order.order_number,
        status: order.status.to_string(),
        verified_at: Utc::now(),
    }))
}
