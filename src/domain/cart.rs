use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

/// Upper bound for the quantity of a single cart line, also enforced by the
/// `cart_items` table.
pub const MAX_LINE_QUANTITY: i32 = 10_000;

/// Accepts `1..=MAX_LINE_QUANTITY`.
pub fn check_line_quantity(quantity: i32) -> Result<(), DomainError> {
    if quantity <= 0 {
        return Err(DomainError::invalid("quantity must be greater than zero"));
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(DomainError::invalid(format!(
            "quantity must not exceed {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: Uuid,
    pub product_variant_id: Uuid,
    pub unit_price_cents: i64,
    pub currency: String,
    pub quantity: i32,
}

impl CartItemView {
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * i64::from(self.quantity)
    }
}

/// A cart with its items. Totals are never persisted; they are derived from
/// the items every time the cart is assembled.
#[derive(Debug, Clone)]
pub struct CartView {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub items: Vec<CartItemView>,
    pub currency: String,
    pub subtotal_cents: i64,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartView {
    pub fn assemble(
        id: Uuid,
        customer_id: Option<Uuid>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        items: Vec<CartItemView>,
    ) -> Self {
        let totals = CartTotals::from_items(&items);
        Self {
            id,
            customer_id,
            items,
            currency: totals.currency,
            subtotal_cents: totals.subtotal_cents,
            item_count: totals.item_count,
            created_at,
            updated_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartTotals {
    pub currency: String,
    pub subtotal_cents: i64,
    pub item_count: i64,
}

impl CartTotals {
    /// The cart currency is taken from the first item; an empty cart has no
    /// currency and zero totals.
    pub fn from_items(items: &[CartItemView]) -> Self {
        let currency = items
            .first()
            .map(|i| i.currency.clone())
            .unwrap_or_default();
        Self {
            currency,
            subtotal_cents: items.iter().map(CartItemView::line_total_cents).sum(),
            item_count: items.iter().map(|i| i64::from(i.quantity)).sum(),
        }
    }
}
