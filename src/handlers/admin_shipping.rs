use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::shipping::TerminalListResponse;
use crate::domain::shipping::{
    MethodInput, ProviderInput, ShippingMethod, ShippingProvider, ShippingZone, ZoneInput,
};
use crate::errors::AppError;
use crate::state::AppState;

fn default_true() -> bool {
    true
}

fn default_mode() -> String {
    "sandbox".to_string()
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

// ── Zones ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ZoneRequest {
    pub name: String,
    /// Two-letter country codes.
    pub countries: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl From<ZoneRequest> for ZoneInput {
    fn from(r: ZoneRequest) -> Self {
        Self {
            name: r.name,
            countries: r.countries,
            enabled: r.enabled,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ZoneResponse {
    pub id: Uuid,
    pub name: String,
    pub countries: Vec<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ShippingZone> for ZoneResponse {
    fn from(z: ShippingZone) -> Self {
        Self {
            id: z.id,
            name: z.name,
            countries: z.countries,
            enabled: z.enabled,
            created_at: z.created_at,
            updated_at: z.updated_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/admin/shipping/zones",
    request_body = ZoneRequest,
    responses(
        (status = 201, description = "Zone created", body = ZoneResponse),
        (status = 400, description = "Invalid zone"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "admin-shipping"
)]
pub async fn create_zone(
    state: web::Data<AppState>,
    body: web::Json<ZoneRequest>,
) -> Result<HttpResponse, AppError> {
    let input = ZoneInput::from(body.into_inner());
    let shipping = state.shipping.clone();
    let zone = web::block(move || shipping.create_zone(input))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(ZoneResponse::from(zone)))
}

#[utoipa::path(
    get,
    path = "/admin/shipping/zones",
    responses(
        (status = 200, description = "All zones", body = [ZoneResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "admin-shipping"
)]
pub async fn list_zones(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let shipping = state.shipping.clone();
    let zones = web::block(move || shipping.list_zones())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<ZoneResponse> = zones.into_iter().map(ZoneResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/admin/shipping/zones/{id}",
    params(("id" = Uuid, Path, description = "Zone UUID")),
    responses(
        (status = 200, description = "Zone found", body = ZoneResponse),
        (status = 404, description = "Zone not found"),
    ),
    tag = "admin-shipping"
)]
pub async fn get_zone(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let shipping = state.shipping.clone();
    let zone = web::block(move || shipping.get_zone(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ZoneResponse::from(zone)))
}

#[utoipa::path(
    put,
    path = "/admin/shipping/zones/{id}",
    params(("id" = Uuid, Path, description = "Zone UUID")),
    request_body = ZoneRequest,
    responses(
        (status = 200, description = "Zone updated", body = ZoneResponse),
        (status = 400, description = "Invalid zone"),
        (status = 404, description = "Zone not found"),
    ),
    tag = "admin-shipping"
)]
pub async fn update_zone(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ZoneRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let input = ZoneInput::from(body.into_inner());
    let shipping = state.shipping.clone();
    let zone = web::block(move || shipping.update_zone(id, input))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ZoneResponse::from(zone)))
}

/// Deleting a zone also deletes its methods.
#[utoipa::path(
    delete,
    path = "/admin/shipping/zones/{id}",
    params(("id" = Uuid, Path, description = "Zone UUID")),
    responses(
        (status = 204, description = "Zone deleted"),
        (status = 404, description = "Zone not found"),
    ),
    tag = "admin-shipping"
)]
pub async fn delete_zone(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let shipping = state.shipping.clone();
    web::block(move || shipping.delete_zone(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}

// ── Methods ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct MethodRequest {
    pub zone_id: Uuid,
    pub provider_key: String,
    pub service_code: String,
    pub title: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub sort_order: i32,
    /// One of `fixed`, `table`, `provider`.
    pub pricing_mode: String,
    #[serde(default = "empty_object")]
    #[schema(value_type = Object)]
    pub pricing_rules: Value,
}

impl From<MethodRequest> for MethodInput {
    fn from(r: MethodRequest) -> Self {
        Self {
            zone_id: r.zone_id,
            provider_key: r.provider_key,
            service_code: r.service_code,
            title: r.title,
            enabled: r.enabled,
            sort_order: r.sort_order,
            pricing_mode: r.pricing_mode,
            pricing_rules: r.pricing_rules,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MethodResponse {
    pub id: Uuid,
    pub zone_id: Uuid,
    pub provider_key: String,
    pub service_code: String,
    pub title: String,
    pub enabled: bool,
    pub sort_order: i32,
    pub pricing_mode: String,
    #[schema(value_type = Object)]
    pub pricing_rules: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ShippingMethod> for MethodResponse {
    fn from(m: ShippingMethod) -> Self {
        Self {
            id: m.id,
            zone_id: m.zone_id,
            provider_key: m.provider_key,
            service_code: m.service_code,
            title: m.title,
            enabled: m.enabled,
            sort_order: m.sort_order,
            pricing_mode: m.pricing_mode,
            pricing_rules: m.pricing_rules,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListMethodsParams {
    pub zone_id: Option<Uuid>,
}

#[utoipa::path(
    post,
    path = "/admin/shipping/methods",
    request_body = MethodRequest,
    responses(
        (status = 201, description = "Method created", body = MethodResponse),
        (status = 400, description = "Invalid method or pricing rules"),
        (status = 404, description = "Zone not found"),
    ),
    tag = "admin-shipping"
)]
pub async fn create_method(
    state: web::Data<AppState>,
    body: web::Json<MethodRequest>,
) -> Result<HttpResponse, AppError> {
    let input = MethodInput::from(body.into_inner());
    let shipping = state.shipping.clone();
    let method = web::block(move || shipping.create_method(input))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(MethodResponse::from(method)))
}

#[utoipa::path(
    get,
    path = "/admin/shipping/methods",
    params(("zone_id" = Option<Uuid>, Query, description = "Only methods of this zone")),
    responses(
        (status = 200, description = "Methods by sort order", body = [MethodResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "admin-shipping"
)]
pub async fn list_methods(
    state: web::Data<AppState>,
    query: web::Query<ListMethodsParams>,
) -> Result<HttpResponse, AppError> {
    let zone_id = query.into_inner().zone_id;
    let shipping = state.shipping.clone();
    let methods = web::block(move || shipping.list_methods(zone_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<MethodResponse> = methods.into_iter().map(MethodResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/admin/shipping/methods/{id}",
    params(("id" = Uuid, Path, description = "Method UUID")),
    responses(
        (status = 200, description = "Method found", body = MethodResponse),
        (status = 404, description = "Method not found"),
    ),
    tag = "admin-shipping"
)]
pub async fn get_method(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let shipping = state.shipping.clone();
    let method = web::block(move || shipping.get_method(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(MethodResponse::from(method)))
}

#[utoipa::path(
    put,
    path = "/admin/shipping/methods/{id}",
    params(("id" = Uuid, Path, description = "Method UUID")),
    request_body = MethodRequest,
    responses(
        (status = 200, description = "Method updated", body = MethodResponse),
        (status = 400, description = "Invalid method or pricing rules"),
        (status = 404, description = "Method or zone not found"),
    ),
    tag = "admin-shipping"
)]
pub async fn update_method(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<MethodRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let input = MethodInput::from(body.into_inner());
    let shipping = state.shipping.clone();
    let method = web::block(move || shipping.update_method(id, input))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(MethodResponse::from(method)))
}

#[utoipa::path(
    delete,
    path = "/admin/shipping/methods/{id}",
    params(("id" = Uuid, Path, description = "Method UUID")),
    responses(
        (status = 204, description = "Method deleted"),
        (status = 404, description = "Method not found"),
    ),
    tag = "admin-shipping"
)]
pub async fn delete_method(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let shipping = state.shipping.clone();
    web::block(move || shipping.delete_method(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}

// ── Providers ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProviderRequest {
    pub key: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// `sandbox` or `live`.
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "empty_object")]
    #[schema(value_type = Object)]
    pub config: Value,
}

impl From<ProviderRequest> for ProviderInput {
    fn from(r: ProviderRequest) -> Self {
        Self {
            key: r.key,
            name: r.name,
            enabled: r.enabled,
            mode: r.mode,
            config: r.config,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderResponse {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub enabled: bool,
    pub mode: String,
    #[schema(value_type = Object)]
    pub config: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ShippingProvider> for ProviderResponse {
    fn from(p: ShippingProvider) -> Self {
        Self {
            id: p.id,
            key: p.key,
            name: p.name,
            enabled: p.enabled,
            mode: p.mode,
            config: p.config,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Creating, updating or deleting a provider re-instantiates the live set.
#[utoipa::path(
    post,
    path = "/admin/shipping/providers",
    request_body = ProviderRequest,
    responses(
        (status = 201, description = "Provider created", body = ProviderResponse),
        (status = 400, description = "Invalid provider"),
        (status = 409, description = "Provider key already exists"),
    ),
    tag = "admin-shipping"
)]
pub async fn create_provider(
    state: web::Data<AppState>,
    body: web::Json<ProviderRequest>,
) -> Result<HttpResponse, AppError> {
    let input = ProviderInput::from(body.into_inner());
    let shipping = state.shipping.clone();
    let provider = web::block(move || shipping.create_provider(input))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(ProviderResponse::from(provider)))
}

#[utoipa::path(
    get,
    path = "/admin/shipping/providers",
    responses(
        (status = 200, description = "All providers", body = [ProviderResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "admin-shipping"
)]
pub async fn list_providers(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let shipping = state.shipping.clone();
    let providers = web::block(move || shipping.list_providers())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<ProviderResponse> = providers.into_iter().map(ProviderResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/admin/shipping/providers/{id}",
    params(("id" = Uuid, Path, description = "Provider UUID")),
    responses(
        (status = 200, description = "Provider found", body = ProviderResponse),
        (status = 404, description = "Provider not found"),
    ),
    tag = "admin-shipping"
)]
pub async fn get_provider(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let shipping = state.shipping.clone();
    let provider = web::block(move || shipping.get_provider(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProviderResponse::from(provider)))
}

#[utoipa::path(
    put,
    path = "/admin/shipping/providers/{id}",
    params(("id" = Uuid, Path, description = "Provider UUID")),
    request_body = ProviderRequest,
    responses(
        (status = 200, description = "Provider updated", body = ProviderResponse),
        (status = 400, description = "Invalid provider"),
        (status = 404, description = "Provider not found"),
        (status = 409, description = "Provider key already exists"),
    ),
    tag = "admin-shipping"
)]
pub async fn update_provider(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ProviderRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let input = ProviderInput::from(body.into_inner());
    let shipping = state.shipping.clone();
    let provider = web::block(move || shipping.update_provider(id, input))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProviderResponse::from(provider)))
}

#[utoipa::path(
    delete,
    path = "/admin/shipping/providers/{id}",
    params(("id" = Uuid, Path, description = "Provider UUID")),
    responses(
        (status = 204, description = "Provider deleted"),
        (status = 404, description = "Provider not found"),
    ),
    tag = "admin-shipping"
)]
pub async fn delete_provider(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let shipping = state.shipping.clone();
    web::block(move || shipping.delete_provider(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}

// ── Terminal cache ───────────────────────────────────────────────────────────

/// Fetches terminals from the carrier and overwrites the cached copy.
#[utoipa::path(
    post,
    path = "/admin/shipping/terminals/{provider}/{country}/refresh",
    params(
        ("provider" = String, Path, description = "Provider key"),
        ("country" = String, Path, description = "Two-letter country code"),
    ),
    responses(
        (status = 200, description = "Fresh terminal list", body = TerminalListResponse),
        (status = 400, description = "Invalid country code"),
        (status = 503, description = "Provider not enabled or carrier unreachable"),
    ),
    tag = "admin-shipping"
)]
pub async fn refresh_terminals(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (provider, country) = path.into_inner();
    let terminals = state.terminals.clone();
    let listing = web::block(move || terminals.refresh_terminals(&provider, &country))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(TerminalListResponse::from(listing)))
}

#[utoipa::path(
    delete,
    path = "/admin/shipping/terminals/{provider}/{country}",
    params(
        ("provider" = String, Path, description = "Provider key"),
        ("country" = String, Path, description = "Two-letter country code"),
    ),
    responses(
        (status = 204, description = "Cache entry evicted"),
        (status = 404, description = "Nothing cached for this provider and country"),
    ),
    tag = "admin-shipping"
)]
pub async fn delete_cached_terminals(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (provider, country) = path.into_inner();
    let terminals = state.terminals.clone();
    web::block(move || terminals.delete_cached_terminals(&provider, &country))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::NoContent().finish())
}
