use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::shipping::{ShippingOption, Terminal, TerminalListing};
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ShippingOptionsParams {
    /// ISO 3166-1 alpha-2 destination country.
    pub country: String,
    #[serde(default)]
    pub cart_value_cents: i64,
    pub currency: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShippingOptionResponse {
    pub method_id: Uuid,
    pub provider_key: String,
    pub service_code: String,
    pub title: String,
    pub price_cents: i64,
    pub currency: String,
}

impl From<ShippingOption> for ShippingOptionResponse {
    fn from(o: ShippingOption) -> Self {
        Self {
            method_id: o.method_id,
            provider_key: o.provider_key,
            service_code: o.service_code,
            title: o.title,
            price_cents: o.price_cents,
            currency: o.currency,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TerminalResponse {
    pub id: String,
    pub name: String,
    pub country: String,
    pub city: String,
    pub address: String,
    pub postal_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<Terminal> for TerminalResponse {
    fn from(t: Terminal) -> Self {
        Self {
            id: t.id,
            name: t.name,
            country: t.country,
            city: t.city,
            address: t.address,
            postal_code: t.postal_code,
            latitude: t.latitude,
            longitude: t.longitude,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TerminalListResponse {
    pub provider: String,
    pub country: String,
    pub fetched_at: DateTime<Utc>,
    pub from_cache: bool,
    pub terminals: Vec<TerminalResponse>,
}

impl From<TerminalListing> for TerminalListResponse {
    fn from(l: TerminalListing) -> Self {
        Self {
            provider: l.provider_key,
            country: l.country,
            fetched_at: l.fetched_at,
            from_cache: l.from_cache,
            terminals: l.terminals.into_iter().map(TerminalResponse::from).collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /shipping/options
///
/// Priced shipping options for a destination and cart value.
#[utoipa::path(
    get,
    path = "/shipping/options",
    params(
        ("country" = String, Query, description = "Two-letter country code"),
        ("cart_value_cents" = Option<i64>, Query, description = "Cart subtotal in cents (default 0)"),
        ("currency" = String, Query, description = "Cart currency"),
    ),
    responses(
        (status = 200, description = "Available options in display order", body = [ShippingOptionResponse]),
        (status = 400, description = "Invalid country, currency or cart value"),
        (status = 404, description = "No shipping zone covers the country"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "shipping"
)]
pub async fn list_options(
    state: web::Data<AppState>,
    query: web::Query<ShippingOptionsParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let shipping = state.shipping.clone();
    let options = web::block(move || {
        shipping.list_shipping_options(&params.country, params.cart_value_cents, &params.currency)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<ShippingOptionResponse> =
        options.into_iter().map(ShippingOptionResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /shipping/terminals/{provider}/{country}
///
/// Served from the cache when present, otherwise fetched from the carrier
/// and cached.
#[utoipa::path(
    get,
    path = "/shipping/terminals/{provider}/{country}",
    params(
        ("provider" = String, Path, description = "Provider key, e.g. omniva"),
        ("country" = String, Path, description = "Two-letter country code"),
    ),
    responses(
        (status = 200, description = "Pickup terminals", body = TerminalListResponse),
        (status = 400, description = "Invalid country code"),
        (status = 503, description = "Provider not enabled or carrier unreachable"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "shipping"
)]
pub async fn get_terminals(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (provider, country) = path.into_inner();
    let terminals = state.terminals.clone();
    let listing = web::block(move || terminals.get_terminals(&provider, &country))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(TerminalListResponse::from(listing)))
}
