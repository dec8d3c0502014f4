use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::cart::{CartItemView, CartView};
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub product_variant_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    /// New quantity. Zero removes the item.
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveCartRequest {
    pub customer_id: Uuid,
    /// Guest cart whose items are moved into the customer's cart.
    pub guest_cart_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub product_variant_id: Uuid,
    pub unit_price_cents: i64,
    pub currency: String,
    pub quantity: i32,
    pub line_total_cents: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartResponse {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub currency: String,
    pub subtotal_cents: i64,
    pub item_count: i64,
    pub items: Vec<CartItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CartItemView> for CartItemResponse {
    fn from(item: CartItemView) -> Self {
        Self {
            line_total_cents: item.line_total_cents(),
            id: item.id,
            product_variant_id: item.product_variant_id,
            unit_price_cents: item.unit_price_cents,
            currency: item.currency,
            quantity: item.quantity,
        }
    }
}

impl From<CartView> for CartResponse {
    fn from(cart: CartView) -> Self {
        Self {
            id: cart.id,
            customer_id: cart.customer_id,
            currency: cart.currency,
            subtotal_cents: cart.subtotal_cents,
            item_count: cart.item_count,
            items: cart.items.into_iter().map(CartItemResponse::from).collect(),
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /carts
#[utoipa::path(
    post,
    path = "/carts",
    responses(
        (status = 201, description = "Empty cart created", body = CartResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn create_cart(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let carts = state.carts.clone();
    let cart = web::block(move || carts.create_cart())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(CartResponse::from(cart)))
}

/// GET /carts/{id}
#[utoipa::path(
    get,
    path = "/carts/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart UUID"),
    ),
    responses(
        (status = 200, description = "Cart with derived totals", body = CartResponse),
        (status = 404, description = "Cart not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn get_cart(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let cart_id = path.into_inner();
    let carts = state.carts.clone();
    let cart = web::block(move || carts.get_cart(cart_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// POST /carts/{id}/items
///
/// Adds a variant at its current catalog price. Adding a variant that is
/// already in the cart increases its quantity.
#[utoipa::path(
    post,
    path = "/carts/{id}/items",
    params(
        ("id" = Uuid, Path, description = "Cart UUID"),
    ),
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 400, description = "Quantity is not positive or exceeds the line limit"),
        (status = 404, description = "Cart or variant not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn add_item(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let cart_id = path.into_inner();
    let body = body.into_inner();
    let carts = state.carts.clone();
    let cart = web::block(move || carts.add_item(cart_id, body.product_variant_id, body.quantity))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// PATCH /carts/{id}/items/{item_id}
#[utoipa::path(
    patch,
    path = "/carts/{id}/items/{item_id}",
    params(
        ("id" = Uuid, Path, description = "Cart UUID"),
        ("item_id" = Uuid, Path, description = "Cart item UUID"),
    ),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 400, description = "Negative quantity or above the line limit"),
        (status = 404, description = "Item not found in this cart"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn update_item(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<UpdateItemRequest>,
) -> Result<HttpResponse, AppError> {
    let (cart_id, item_id) = path.into_inner();
    let quantity = body.into_inner().quantity;
    let carts = state.carts.clone();
    let cart = web::block(move || {
        if quantity == 0 {
            carts.remove_item(cart_id, item_id)
        } else {
            carts.update_item_quantity(cart_id, item_id, quantity)
        }
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// DELETE /carts/{id}/items/{item_id}
#[utoipa::path(
    delete,
    path = "/carts/{id}/items/{item_id}",
    params(
        ("id" = Uuid, Path, description = "Cart UUID"),
        ("item_id" = Uuid, Path, description = "Cart item UUID"),
    ),
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 404, description = "Item not found in this cart"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn remove_item(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (cart_id, item_id) = path.into_inner();
    let carts = state.carts.clone();
    let cart = web::block(move || carts.remove_item(cart_id, item_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

/// POST /carts/resolve
///
/// Returns the customer's cart, creating it when missing, after moving the
/// guest cart's items into it. Safe to retry.
#[utoipa::path(
    post,
    path = "/carts/resolve",
    request_body = ResolveCartRequest,
    responses(
        (status = 200, description = "The customer's cart", body = CartResponse),
        (status = 404, description = "Guest cart belongs to another customer"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn resolve_cart(
    state: web::Data<AppState>,
    body: web::Json<ResolveCartRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let carts = state.carts.clone();
    let cart = web::block(move || carts.resolve_customer_cart(body.customer_id, body.guest_cart_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}
