use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::schema::{
    cart_items, carts, order_items, orders, product_variants, shipping_methods,
    shipping_providers, shipping_terminals_cache, shipping_zones,
};

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = product_variants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductVariantRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub title: String,
    pub price_cents: i64,
    pub currency: String,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = product_variants)]
pub struct NewProductVariantRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub title: String,
    pub price_cents: i64,
    pub currency: String,
    pub stock: i32,
}

// ── Carts ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartRow {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = carts)]
pub struct NewCartRow {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = cart_items)]
#[diesel(belongs_to(CartRow, foreign_key = cart_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemRow {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_variant_id: Uuid,
    pub unit_price_cents: i64,
    pub currency: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cart_items)]
pub struct NewCartItemRow {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_variant_id: Uuid,
    pub unit_price_cents: i64,
    pub currency: String,
    pub quantity: i32,
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
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
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub number: String,
    pub status: String,
    pub currency: String,
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_variant_id: Uuid,
    pub unit_price_cents: i64,
    pub currency: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_variant_id: Uuid,
    pub unit_price_cents: i64,
    pub currency: String,
    pub quantity: i32,
}

// ── Shipping ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = shipping_zones)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShippingZoneRow {
    pub id: Uuid,
    pub name: String,
    pub countries_json: Value,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shipping_zones)]
pub struct NewShippingZoneRow {
    pub id: Uuid,
    pub name: String,
    pub countries_json: Value,
    pub enabled: bool,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = shipping_zones)]
pub struct ShippingZoneChanges {
    pub name: String,
    pub countries_json: Value,
    pub enabled: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = shipping_methods)]
#[diesel(belongs_to(ShippingZoneRow, foreign_key = zone_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShippingMethodRow {
    pub id: Uuid,
    pub zone_id: Uuid,
    pub provider_key: String,
    pub service_code: String,
    pub title: String,
    pub enabled: bool,
    pub sort_order: i32,
    pub pricing_mode: String,
    pub pricing_rules_json: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shipping_methods)]
pub struct NewShippingMethodRow {
    pub id: Uuid,
    pub zone_id: Uuid,
    pub provider_key: String,
    pub service_code: String,
    pub title: String,
    pub enabled: bool,
    pub sort_order: i32,
    pub pricing_mode: String,
    pub pricing_rules_json: Value,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = shipping_methods)]
pub struct ShippingMethodChanges {
    pub zone_id: Uuid,
    pub provider_key: String,
    pub service_code: String,
    pub title: String,
    pub enabled: bool,
    pub sort_order: i32,
    pub pricing_mode: String,
    pub pricing_rules_json: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = shipping_providers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShippingProviderRow {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub enabled: bool,
    pub mode: String,
    pub config_json: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shipping_providers)]
pub struct NewShippingProviderRow {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub enabled: bool,
    pub mode: String,
    pub config_json: Value,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = shipping_providers)]
pub struct ShippingProviderChanges {
    pub key: String,
    pub name: String,
    pub enabled: bool,
    pub mode: String,
    pub config_json: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shipping_terminals_cache)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TerminalCacheRow {
    pub provider_key: String,
    pub country: String,
    pub payload_json: Value,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shipping_terminals_cache)]
pub struct NewTerminalCacheRow {
    pub provider_key: String,
    pub country: String,
    pub payload_json: Value,
    pub fetched_at: DateTime<Utc>,
}
