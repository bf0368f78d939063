use crate::handlers::common::{map_service_error, success_response};
use crate::{
    entities::order::OrderStatus,
    errors::ApiError,
    AppState, ListQuery,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Creates the router for order endpoints
pub fn order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_orders))
        .route("/:order_id", get(get_order))
        .route("/:order_id/status", put(update_order_status))
        .route("/:order_id/items/:item_id/status", put(update_item_status))
        .route("/:order_id/cancel", post(cancel_order))
}

#[derive(Debug, Deserialize)]
struct CustomerQuery {
    customer_id: Uuid,
}

/// List a customer's orders, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(("customer_id" = Uuid, Query, description = "Customer to list orders for")),
    responses((status = 200, description = "Paginated orders")),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(customer): Query<CustomerQuery>,
    Query(list): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = state
        .services
        .orders
        .list_orders(customer.customer_id, list.page, list.limit)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(orders))
}

/// Fetch one order with its items and the legacy dual-array projection.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{order_id}",
    params(("order_id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order detail"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .services
        .orders
        .get_order(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(detail))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Order-level status transition; items still mirroring the order follow.
#[utoipa::path(
    put,
    path = "/api/v1/orders/{order_id}/status",
    params(("order_id" = Uuid, Path, description = "Order id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Order updated"),
        (status = 400, description = "Transition not allowed by the state machine"),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .update_order_status(order_id, payload.status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}

/// Per-item status transition (dispatch or cancel a single line).
#[utoipa::path(
    put,
    path = "/api/v1/orders/{order_id}/items/{item_id}/status",
    params(
        ("order_id" = Uuid, Path, description = "Order id"),
        ("item_id" = Uuid, Path, description = "Order item id"),
    ),
    request_body = UpdateStatusRequest,
    responses((status = 200, description = "Item updated")),
    tag = "orders"
)]
pub async fn update_item_status(
    State(state): State<Arc<AppState>>,
    Path((order_id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .services
        .orders
        .update_item_status(order_id, item_id, payload.status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(item))
}

/// Cancel the whole order, restoring stock for non-cancelled lines.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{order_id}/cancel",
    params(("order_id" = Uuid, Path, description = "Order id")),
    responses((status = 200, description = "Order cancelled")),
    tag = "orders"
)]
pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .services
        .orders
        .cancel_order(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(order))
}
