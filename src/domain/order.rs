use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

const ORDER_NUMBER_PREFIX: &str = "ORD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_payment" => Ok(OrderStatus::PendingPayment),
            "paid" => Ok(OrderStatus::Paid),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::invalid(format!("unknown order status '{other}'"))),
        }
    }
}

/// Snapshot of a cart line taken at checkout.
#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub id: Uuid,
    pub product_variant_id: Uuid,
    pub unit_price_cents: i64,
    pub currency: String,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub number: String,
    /// Kept as the stored string: statuses written by other components
    /// (payment webhooks) must still be readable here.
    pub status: String,
    pub currency: String,
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub customer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderMetrics {
    pub total: i64,
    pub pending_payment: i64,
    pub paid: i64,
    pub cancelled: i64,
}

impl OrderMetrics {
    /// Folds `(status, count)` rows from a grouped query. Unknown statuses
    /// still count towards the total.
    pub fn from_status_counts<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, i64)>,
    {
        let mut metrics = OrderMetrics::default();
        for (status, count) in rows {
            metrics.total += count;
            match status.parse::<OrderStatus>() {
                Ok(OrderStatus::PendingPayment) => metrics.pending_payment += count,
                Ok(OrderStatus::Paid) => metrics.paid += count,
                Ok(OrderStatus::Cancelled) => metrics.cancelled += count,
                Err(_) => {}
            }
        }
        metrics
    }
}

/// Human-readable order number: prefix, date, then time of day with
/// microseconds. Unique enough for display, not a sequence.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}{:06}",
        ORDER_NUMBER_PREFIX,
        now.format("%Y%m%d"),
        now.format("%H%M%S"),
        now.timestamp_subsec_micros()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    /// Missing or out-of-range values fall back to sane bounds instead of
    /// failing the request.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = match limit {
            Some(l) if l > 0 => l.min(Self::MAX_LIMIT),
            _ => Self::DEFAULT_LIMIT,
        };
        Self {
            limit,
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn order_number_contains_prefix_date_and_time() {
        let now = Utc
            .with_ymd_and_hms(2025, 3, 14, 9, 26, 53)
            .single()
            .expect("valid timestamp");
        assert_eq!(generate_order_number(now), "ORD-20250314-092653000000");
    }

    #[test]
    fn order_status_round_trips_through_str() {
        for status in [
            OrderStatus::PendingPayment,
            OrderStatus::Paid,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn metrics_fold_counts_by_status() {
        let metrics = OrderMetrics::from_status_counts(vec![
            ("pending_payment".to_string(), 3),
            ("paid".to_string(), 2),
            ("cancelled".to_string(), 1),
            ("refunded".to_string(), 4),
        ]);
        assert_eq!(
            metrics,
            OrderMetrics {
                total: 10,
                pending_payment: 3,
                paid: 2,
                cancelled: 1,
            }
        );
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(Pagination::new(None, None), Pagination { limit: 20, offset: 0 });
        assert_eq!(Pagination::new(Some(0), Some(-5)), Pagination { limit: 20, offset: 0 });
        assert_eq!(Pagination::new(Some(500), Some(40)), Pagination { limit: 100, offset: 40 });
    }
}
