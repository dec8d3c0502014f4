use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::cart::CartView;
use super::errors::DomainError;
use super::order::{ListResult, OrderMetrics, OrderView, Pagination};
use super::shipping::{
    MethodInput, ProviderInput, ShippingMethod, ShippingProvider, ShippingZone, ZoneInput,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPrice {
    pub price_cents: i64,
    pub currency: String,
}

/// Read-only view of the catalog needed by the cart and checkout.
pub trait CatalogLookup: Send + Sync + 'static {
    fn variant_price(&self, variant_id: Uuid) -> Result<VariantPrice, DomainError>;
    fn variant_stock(&self, variant_id: Uuid) -> Result<i32, DomainError>;
}

pub trait CartRepository: Send + Sync + 'static {
    fn create(&self) -> Result<CartView, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<CartView>, DomainError>;
    /// Inserts the line or, if the variant is already in the cart, adds to its
    /// quantity while keeping the price captured on first insert.
    fn upsert_item(
        &self,
        cart_id: Uuid,
        variant_id: Uuid,
        price: &VariantPrice,
        quantity: i32,
    ) -> Result<(), DomainError>;
    /// Returns `false` when no item with this id belongs to the cart.
    fn set_item_quantity(&self, cart_id: Uuid, item_id: Uuid, quantity: i32)
        -> Result<bool, DomainError>;
    fn remove_item(&self, cart_id: Uuid, item_id: Uuid) -> Result<bool, DomainError>;
    /// Finds or creates the customer's cart, then moves every line of the
    /// guest cart into it in one transaction.
    fn resolve_for_customer(
        &self,
        customer_id: Uuid,
        guest_cart_id: Option<Uuid>,
    ) -> Result<CartView, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Writes the order and its items and reserves stock, all or nothing.
    fn create_from_cart(
        &self,
        cart: &CartView,
        customer_id: Option<Uuid>,
    ) -> Result<OrderView, DomainError>;
    /// Like `create_from_cart`, and in the same transaction removes exactly
    /// the snapshotted lines from the stored cart. Fails with `Conflict` when
    /// the cart no longer holds them.
    fn checkout_cart(
        &self,
        cart: &CartView,
        customer_id: Option<Uuid>,
    ) -> Result<OrderView, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn find_for_customer(
        &self,
        customer_id: Uuid,
        id: Uuid,
    ) -> Result<Option<OrderView>, DomainError>;
    fn list(&self, page: Pagination) -> Result<ListResult, DomainError>;
    fn list_for_customer(
        &self,
        customer_id: Uuid,
        page: Pagination,
    ) -> Result<ListResult, DomainError>;
    fn metrics(&self) -> Result<OrderMetrics, DomainError>;
}

pub trait ShippingRepository: Send + Sync + 'static {
    fn create_zone(&self, input: &ZoneInput) -> Result<ShippingZone, DomainError>;
    fn update_zone(&self, id: Uuid, input: &ZoneInput) -> Result<Option<ShippingZone>, DomainError>;
    fn find_zone(&self, id: Uuid) -> Result<Option<ShippingZone>, DomainError>;
    fn list_zones(&self) -> Result<Vec<ShippingZone>, DomainError>;
    /// Enabled zones in a stable order (oldest first).
    fn enabled_zones(&self) -> Result<Vec<ShippingZone>, DomainError>;
    fn delete_zone(&self, id: Uuid) -> Result<bool, DomainError>;

    fn create_method(&self, input: &MethodInput) -> Result<ShippingMethod, DomainError>;
    fn update_method(
        &self,
        id: Uuid,
        input: &MethodInput,
    ) -> Result<Option<ShippingMethod>, DomainError>;
    fn find_method(&self, id: Uuid) -> Result<Option<ShippingMethod>, DomainError>;
    fn list_methods(&self, zone_id: Option<Uuid>) -> Result<Vec<ShippingMethod>, DomainError>;
    fn enabled_methods_for_zone(&self, zone_id: Uuid) -> Result<Vec<ShippingMethod>, DomainError>;
    fn delete_method(&self, id: Uuid) -> Result<bool, DomainError>;

    fn create_provider(&self, input: &ProviderInput) -> Result<ShippingProvider, DomainError>;
    fn update_provider(
        &self,
        id: Uuid,
        input: &ProviderInput,
    ) -> Result<Option<ShippingProvider>, DomainError>;
    fn find_provider(&self, id: Uuid) -> Result<Option<ShippingProvider>, DomainError>;
    fn list_providers(&self) -> Result<Vec<ShippingProvider>, DomainError>;
    fn enabled_providers(&self) -> Result<Vec<ShippingProvider>, DomainError>;
    fn delete_provider(&self, id: Uuid) -> Result<bool, DomainError>;
}

#[derive(Debug, Clone)]
pub struct CachedTerminals {
    pub payload: Value,
    pub fetched_at: DateTime<Utc>,
}

pub trait TerminalCacheRepository: Send + Sync + 'static {
    fn get(&self, provider_key: &str, country: &str)
        -> Result<Option<CachedTerminals>, DomainError>;
    fn upsert(
        &self,
        provider_key: &str,
        country: &str,
        payload: Value,
    ) -> Result<DateTime<Utc>, DomainError>;
    /// Returns `false` when there was nothing to evict.
    fn delete(&self, provider_key: &str, country: &str) -> Result<bool, DomainError>;
}
