use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::errors::DomainError;
use super::pricing::PricingRules;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingMode {
    Fixed,
    Table,
    Provider,
}

impl PricingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingMode::Fixed => "fixed",
            PricingMode::Table => "table",
            PricingMode::Provider => "provider",
        }
    }
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PricingMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(PricingMode::Fixed),
            "table" => Ok(PricingMode::Table),
            "provider" => Ok(PricingMode::Provider),
            other => Err(DomainError::invalid(format!(
                "pricing_mode must be one of fixed, table, provider (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    Sandbox,
    Live,
}

impl ProviderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderMode::Sandbox => "sandbox",
            ProviderMode::Live => "live",
        }
    }
}

impl FromStr for ProviderMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sandbox" => Ok(ProviderMode::Sandbox),
            "live" => Ok(ProviderMode::Live),
            other => Err(DomainError::invalid(format!(
                "mode must be sandbox or live (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShippingZone {
    pub id: Uuid,
    pub name: String,
    pub countries: Vec<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShippingZone {
    pub fn covers(&self, country: &str) -> bool {
        self.countries.iter().any(|c| c.eq_ignore_ascii_case(country))
    }
}

#[derive(Debug, Clone)]
pub struct ShippingMethod {
    pub id: Uuid,
    pub zone_id: Uuid,
    pub provider_key: String,
    pub service_code: String,
    pub title: String,
    pub enabled: bool,
    pub sort_order: i32,
    /// Stored verbatim; an unrecognised value prices at zero.
    pub pricing_mode: String,
    pub pricing_rules: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ShippingProvider {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub enabled: bool,
    pub mode: String,
    pub config: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ZoneInput {
    pub name: String,
    pub countries: Vec<String>,
    pub enabled: bool,
}

impl ZoneInput {
    /// Trims the name and upper-cases country codes.
    pub fn validate(self) -> Result<Self, DomainError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::invalid("zone name is required"));
        }
        if self.countries.is_empty() {
            return Err(DomainError::invalid("zone must list at least one country"));
        }
        let mut countries = Vec::with_capacity(self.countries.len());
        for raw in self.countries {
            let code = normalize_country(&raw)?;
            if !countries.contains(&code) {
                countries.push(code);
            }
        }
        Ok(Self {
            name,
            countries,
            enabled: self.enabled,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MethodInput {
    pub zone_id: Uuid,
    pub provider_key: String,
    pub service_code: String,
    pub title: String,
    pub enabled: bool,
    pub sort_order: i32,
    pub pricing_mode: String,
    pub pricing_rules: Value,
}

impl MethodInput {
    /// Rules are decoded strictly here so bad configuration is rejected when
    /// it is written, not when a storefront reads it.
    pub fn validate(self) -> Result<Self, DomainError> {
        let provider_key = normalize_provider_key(&required("provider_key", &self.provider_key)?);
        let service_code = required("service_code", &self.service_code)?;
        let title = required("title", &self.title)?;
        let mode: PricingMode = self.pricing_mode.trim().parse()?;
        PricingRules::decode(mode, &self.pricing_rules)?;
        Ok(Self {
            provider_key,
            service_code,
            title,
            pricing_mode: mode.as_str().to_string(),
            ..self
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProviderInput {
    pub key: String,
    pub name: String,
    pub enabled: bool,
    pub mode: String,
    pub config: Value,
}

impl ProviderInput {
    pub fn validate(self) -> Result<Self, DomainError> {
        let key = normalize_provider_key(&required("key", &self.key)?);
        let name = required("name", &self.name)?;
        let mode: ProviderMode = self.mode.trim().parse()?;
        if !self.config.is_object() {
            return Err(DomainError::invalid("config must be a JSON object"));
        }
        Ok(Self {
            key,
            name,
            mode: mode.as_str().to_string(),
            ..self
        })
    }
}

/// A carrier pickup point, normalised across providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    pub id: String,
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct TerminalListing {
    pub provider_key: String,
    pub country: String,
    pub terminals: Vec<Terminal>,
    pub fetched_at: DateTime<Utc>,
    pub from_cache: bool,
}

#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub service_code: String,
    pub country: String,
    pub cart_value_cents: i64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub price_cents: i64,
    pub currency: String,
}

/// A priced shipping option offered to the storefront.
#[derive(Debug, Clone)]
pub struct ShippingOption {
    pub method_id: Uuid,
    pub provider_key: String,
    pub service_code: String,
    pub title: String,
    pub price_cents: i64,
    pub currency: String,
}

pub fn normalize_country(raw: &str) -> Result<String, DomainError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(DomainError::invalid(format!(
            "'{raw}' is not a two-letter ISO country code"
        )));
    }
    Ok(code)
}

/// Provider keys are stored and looked up in lower case.
pub fn normalize_provider_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

fn required(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn method_input(mode: &str, rules: Value) -> MethodInput {
        MethodInput {
            zone_id: Uuid::new_v4(),
            provider_key: " omniva ".to_string(),
            service_code: "parcel_terminal".to_string(),
            title: "Parcel locker".to_string(),
            enabled: true,
            sort_order: 0,
            pricing_mode: mode.to_string(),
            pricing_rules: rules,
        }
    }

    #[test]
    fn zone_input_normalizes_countries() {
        let zone = ZoneInput {
            name: " Baltics ".to_string(),
            countries: vec!["lt".into(), "LV".into(), " ee".into(), "LT".into()],
            enabled: true,
        }
        .validate()
        .expect("valid zone");
        assert_eq!(zone.name, "Baltics");
        assert_eq!(zone.countries, vec!["LT", "LV", "EE"]);
    }

    #[test]
    fn zone_input_rejects_bad_country_and_empty_name() {
        let bad_country = ZoneInput {
            name: "EU".to_string(),
            countries: vec!["Lithuania".into()],
            enabled: true,
        };
        assert!(matches!(bad_country.validate(), Err(DomainError::InvalidInput(_))));

        let no_name = ZoneInput {
            name: "  ".to_string(),
            countries: vec!["LT".into()],
            enabled: true,
        };
        assert!(matches!(no_name.validate(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn method_input_rejects_unknown_mode() {
        let err = method_input("weight", json!({})).validate().unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn method_input_rejects_rules_that_do_not_match_mode() {
        let err = method_input("fixed", json!({"base_price_cents": "cheap"}))
            .validate()
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn method_input_trims_required_fields() {
        let method = method_input("fixed", json!({"base_price_cents": 250}))
            .validate()
            .expect("valid method");
        assert_eq!(method.provider_key, "omniva");
        assert_eq!(method.pricing_mode, "fixed");
    }

    #[test]
    fn provider_input_requires_object_config_and_known_mode() {
        let input = ProviderInput {
            key: "Omniva".to_string(),
            name: "Omniva".to_string(),
            enabled: true,
            mode: "live".to_string(),
            config: json!([]),
        };
        assert!(input.clone().validate().is_err());

        let ok = ProviderInput {
            config: json!({}),
            ..input.clone()
        }
        .validate()
        .expect("valid provider");
        assert_eq!(ok.key, "omniva");

        let bad_mode = ProviderInput {
            config: json!({}),
            mode: "production".to_string(),
            ..input
        };
        assert!(bad_mode.validate().is_err());
    }

    #[test]
    fn zone_covers_is_case_insensitive() {
        let now = Utc::now();
        let zone = ShippingZone {
            id: Uuid::new_v4(),
            name: "Baltics".to_string(),
            countries: vec!["LT".to_string()],
            enabled: true,
            created_at: now,
            updated_at: now,
        };
        assert!(zone.covers("lt"));
        assert!(!zone.covers("PL"));
    }
}
