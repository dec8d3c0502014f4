use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::orders::OrderResponse;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub cart_id: Uuid,
    /// Set by the auth layer for signed-in customers; absent for guests.
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub order: OrderResponse,
    /// Where to send the shopper to pay.
    pub checkout_url: String,
}

/// POST /checkout
///
/// Turns the cart into a `pending_payment` order, reserving stock in the
/// same transaction, then empties the cart.
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created", body = CheckoutResponse),
        (status = 400, description = "Cart is empty"),
        (status = 404, description = "Cart not found"),
        (status = 409, description = "Insufficient stock, or the cart changed during checkout"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "checkout"
)]
pub async fn checkout(
    state: web::Data<AppState>,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let checkout = state.checkout.clone();
    let result = web::block(move || checkout.checkout(body.cart_id, body.customer_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(CheckoutResponse {
        order: OrderResponse::from(result.order),
        checkout_url: result.checkout_url,
    }))
}
