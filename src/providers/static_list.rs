use std::collections::HashMap;

use serde::Deserialize;

use super::{Provider, ProviderError, ProviderSettings};
use crate::domain::shipping::{Quote, QuoteRequest, Terminal};

#[derive(Debug, Deserialize)]
struct StaticConfig {
    #[serde(default)]
    terminals: Vec<Terminal>,
    #[serde(default)]
    quotes: HashMap<String, i64>,
    #[serde(default = "default_currency")]
    currency: String,
}

fn default_currency() -> String {
    "EUR".to_string()
}

/// Serves terminals and quotes straight from its stored configuration.
/// Used for sandbox stores and carriers without an API.
pub struct StaticProvider {
    terminals: Vec<Terminal>,
    quotes: HashMap<String, i64>,
    currency: String,
}

impl StaticProvider {
    pub const KEY: &'static str = "static";

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let config: StaticConfig =
            serde_json::from_value(settings.config.clone()).map_err(|e| {
                ProviderError::InvalidConfig {
                    key: settings.key.clone(),
                    reason: e.to_string(),
                }
            })?;
        Ok(Self {
            terminals: config.terminals,
            quotes: config.quotes,
            currency: config.currency,
        })
    }
}

impl Provider for StaticProvider {
    fn key(&self) -> &str {
        Self::KEY
    }

    fn list_terminals(&self, country: &str) -> Result<Vec<Terminal>, ProviderError> {
        Ok(self
            .terminals
            .iter()
            .filter(|t| t.country.eq_ignore_ascii_case(country))
            .cloned()
            .collect())
    }

    fn quote(&self, request: &QuoteRequest) -> Result<Quote, ProviderError> {
        self.quotes
            .get(&request.service_code)
            .map(|&price_cents| Quote {
                price_cents,
                currency: self.currency.clone(),
            })
            .ok_or_else(|| {
                ProviderError::Unsupported(format!(
                    "no static quote for service '{}'",
                    request.service_code
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::domain::shipping::ProviderMode;

    fn provider() -> StaticProvider {
        StaticProvider::from_settings(&ProviderSettings {
            key: "static".to_string(),
            mode: ProviderMode::Sandbox,
            config: json!({
                "terminals": [
                    {"id": "t1", "name": "Locker 1", "country": "LT", "city": "Vilnius"},
                    {"id": "t2", "name": "Locker 2", "country": "LV"}
                ],
                "quotes": {"locker": 199},
                "currency": "EUR"
            }),
            http_timeout: Duration::from_secs(1),
        })
        .expect("valid config")
    }

    #[test]
    fn lists_terminals_for_country() {
        let terminals = provider().list_terminals("lt").unwrap();
        assert_eq!(terminals.len(), 1);
        assert_eq!(terminals[0].id, "t1");
        assert_eq!(terminals[0].city, "Vilnius");
    }

    #[test]
    fn quotes_known_services_only() {
        let p = provider();
        let mut request = QuoteRequest {
            service_code: "locker".to_string(),
            country: "LT".to_string(),
            cart_value_cents: 0,
            currency: "EUR".to_string(),
        };
        assert_eq!(p.quote(&request).unwrap().price_cents, 199);

        request.service_code = "courier".to_string();
        assert!(p.quote(&request).is_err());
    }
}
