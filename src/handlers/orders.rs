use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{OrderItemView, OrderMetrics, OrderView, Pagination};
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_variant_id: Uuid,
    pub unit_price_cents: i64,
    pub currency: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub number: String,
    pub status: String,
    pub currency: String,
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub customer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderItemView> for OrderItemResponse {
    fn from(item: OrderItemView) -> Self {
        Self {
            id: item.id,
            product_variant_id: item.product_variant_id,
            unit_price_cents: item.unit_price_cents,
            currency: item.currency,
            quantity: item.quantity,
        }
    }
}

impl From<OrderView> for OrderResponse {
    fn from(order: OrderView) -> Self {
        Self {
            id: order.id,
            number: order.number,
            status: order.status,
            currency: order.currency,
            subtotal_cents: order.subtotal_cents,
            shipping_cents: order.shipping_cents,
            tax_cents: order.tax_cents,
            total_cents: order.total_cents,
            customer_id: order.customer_id,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items: order.items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Number of orders to return. Defaults to 20, maximum 100.
    pub limit: Option<i64>,
    /// Number of orders to skip. Defaults to 0.
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderMetricsResponse {
    pub total: i64,
    pub pending_payment: i64,
    pub paid: i64,
    pub cancelled: i64,
}

impl From<OrderMetrics> for OrderMetricsResponse {
    fn from(m: OrderMetrics) -> Self {
        Self {
            total: m.total,
            pending_payment: m.pending_payment,
            paid: m.paid,
            cancelled: m.cancelled,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders
///
/// Newest first, items included.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("limit" = Option<i64>, Query, description = "Orders per page (default 20, max 100)"),
        ("offset" = Option<i64>, Query, description = "Orders to skip (default 0)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = Pagination::new(params.limit, params.offset);
    let orders = state.orders.clone();

    let result = web::block(move || orders.list_orders(Some(page.limit), Some(page.offset)))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        limit: page.limit,
        offset: page.offset,
    }))
}

/// GET /orders/metrics
#[utoipa::path(
    get,
    path = "/orders/metrics",
    responses(
        (status = 200, description = "Order counts by status", body = OrderMetricsResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_metrics(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let orders = state.orders.clone();
    let metrics = web::block(move || orders.metrics())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderMetricsResponse::from(metrics)))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let orders = state.orders.clone();
    let order = web::block(move || orders.get_order(order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /customers/{customer_id}/orders
#[utoipa::path(
    get,
    path = "/customers/{customer_id}/orders",
    params(
        ("customer_id" = Uuid, Path, description = "Customer UUID"),
        ("limit" = Option<i64>, Query, description = "Orders per page (default 20, max 100)"),
        ("offset" = Option<i64>, Query, description = "Orders to skip (default 0)"),
    ),
    responses(
        (status = 200, description = "The customer's orders", body = ListOrdersResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_customer_orders(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let params = query.into_inner();
    let page = Pagination::new(params.limit, params.offset);
    let orders = state.orders.clone();

    let result = web::block(move || {
        orders.list_customer_orders(customer_id, Some(page.limit), Some(page.offset))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        limit: page.limit,
        offset: page.offset,
    }))
}

/// GET /customers/{customer_id}/orders/{id}
///
/// Another customer's order is reported as not found.
#[utoipa::path(
    get,
    path = "/customers/{customer_id}/orders/{id}",
    params(
        ("customer_id" = Uuid, Path, description = "Customer UUID"),
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found for this customer"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_customer_order(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (customer_id, order_id) = path.into_inner();
    let orders = state.orders.clone();
    let order = web::block(move || orders.get_customer_order(customer_id, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
