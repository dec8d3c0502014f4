//! Shipping price calculation.
//!
//! Rules are stored as JSON next to each method. They are decoded strictly
//! when an admin writes them and leniently when a storefront prices a cart:
//! a row that no longer decodes prices at zero instead of failing the read.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::DomainError;
use super::shipping::{PricingMode, ShippingMethod};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixedRules {
    #[serde(default)]
    pub base_price_cents: Option<i64>,
    #[serde(default)]
    pub free_shipping_order_min_cents: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBand {
    #[serde(default)]
    pub min_weight_kg: f64,
    #[serde(default)]
    pub max_weight_kg: f64,
    pub price_cents: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRules {
    #[serde(default, alias = "table")]
    pub bands: Vec<PriceBand>,
    #[serde(default)]
    pub free_shipping_order_min_cents: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PricingRules {
    Fixed(FixedRules),
    Table(TableRules),
    /// Priced by a live carrier quote, outside this engine.
    Provider,
}

impl PricingRules {
    /// Strict decode, used when rules are written.
    pub fn decode(mode: PricingMode, raw: &Value) -> Result<Self, DomainError> {
        let invalid = |e: serde_json::Error| {
            DomainError::invalid(format!("invalid {mode} pricing rules: {e}"))
        };
        // An absent rules blob is stored as JSON null or an empty object.
        let raw = if raw.is_null() {
            Value::Object(Default::default())
        } else {
            raw.clone()
        };
        match mode {
            PricingMode::Fixed => serde_json::from_value(raw)
                .map(PricingRules::Fixed)
                .map_err(invalid),
            PricingMode::Table => serde_json::from_value(raw)
                .map(PricingRules::Table)
                .map_err(invalid),
            PricingMode::Provider => Ok(PricingRules::Provider),
        }
    }

    /// Lenient decode: malformed rules degrade to the empty rules of the
    /// mode, and an unrecognised mode yields `None`.
    pub fn decode_lenient(mode: &str, raw: &Value) -> Option<Self> {
        let mode: PricingMode = mode.parse().ok()?;
        match Self::decode(mode, raw) {
            Ok(rules) => Some(rules),
            Err(e) => {
                log::warn!("Degrading malformed shipping rules to defaults: {}", e);
                Some(match mode {
                    PricingMode::Fixed => PricingRules::Fixed(FixedRules::default()),
                    PricingMode::Table => PricingRules::Table(TableRules::default()),
                    PricingMode::Provider => PricingRules::Provider,
                })
            }
        }
    }

    /// Same as [`decode_lenient`](Self::decode_lenient) for rules still in
    /// textual form.
    pub fn from_raw_json(mode: &str, raw: &str) -> Option<Self> {
        let value = serde_json::from_str(raw).unwrap_or_else(|e| {
            log::warn!("Shipping rules are not valid JSON: {}", e);
            Value::Null
        });
        Self::decode_lenient(mode, &value)
    }

    fn free_shipping_threshold(&self) -> Option<i64> {
        match self {
            PricingRules::Fixed(r) => r.free_shipping_order_min_cents,
            PricingRules::Table(r) => r.free_shipping_order_min_cents,
            PricingRules::Provider => None,
        }
    }

    /// Price in minor units for a cart of the given value.
    ///
    /// A reached free-shipping threshold wins over any mode-specific price.
    /// Table mode returns the first band's price whatever the cart holds.
    pub fn price_for(&self, cart_value_cents: i64) -> i64 {
        if let Some(threshold) = self.free_shipping_threshold() {
            if cart_value_cents > 0 && cart_value_cents >= threshold {
                return 0;
            }
        }
        let price = match self {
            PricingRules::Fixed(r) => r.base_price_cents.unwrap_or(0),
            PricingRules::Table(r) => r.bands.first().map(|b| b.price_cents).unwrap_or(0),
            PricingRules::Provider => 0,
        };
        price.max(0)
    }
}

/// Prices a stored method. Never fails.
pub fn calculate_price(method: &ShippingMethod, cart_value_cents: i64) -> i64 {
    PricingRules::decode_lenient(&method.pricing_mode, &method.pricing_rules)
        .map(|rules| rules.price_for(cart_value_cents))
        .unwrap_or(0)
}
