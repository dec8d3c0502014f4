//! Omniva parcel terminals.
//!
//! Omniva publishes every location in one JSON document. Each entry carries
//! its country in `A0_NAME` and a `TYPE` of `"0"` for parcel terminals and
//! `"1"` for post offices.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;

use super::{Provider, ProviderError, ProviderSettings};
use crate::domain::shipping::{ProviderMode, Quote, QuoteRequest, Terminal};

const DEFAULT_LOCATIONS_URL: &str = "https://www.omniva.ee/locations.json";
const PARCEL_TERMINAL_TYPE: &str = "0";

#[derive(Debug, Deserialize)]
struct OmnivaConfig {
    #[serde(default)]
    locations_url: Option<String>,
    #[serde(default)]
    include_post_offices: bool,
    /// Flat prices per service code, in minor units.
    #[serde(default)]
    prices: HashMap<String, i64>,
    #[serde(default = "default_currency")]
    currency: String,
}

fn default_currency() -> String {
    "EUR".to_string()
}

#[derive(Debug, Deserialize)]
struct OmnivaLocation {
    #[serde(rename = "ZIP")]
    zip: String,
    #[serde(rename = "NAME")]
    name: String,
    #[serde(rename = "TYPE", default)]
    kind: String,
    #[serde(rename = "A0_NAME")]
    country: String,
    #[serde(rename = "A1_NAME", default)]
    county: String,
    #[serde(rename = "A2_NAME", default)]
    municipality: String,
    #[serde(rename = "A3_NAME", default)]
    settlement: String,
    #[serde(rename = "A5_NAME", default)]
    street: String,
    #[serde(rename = "A7_NAME", default)]
    house_no: String,
    #[serde(rename = "X_COORDINATE", default)]
    x: String,
    #[serde(rename = "Y_COORDINATE", default)]
    y: String,
}

impl OmnivaLocation {
    fn into_terminal(self) -> Terminal {
        let city = [&self.settlement, &self.municipality, &self.county]
            .into_iter()
            .find(|s| !s.trim().is_empty())
            .cloned()
            .unwrap_or_default();
        let address = format!("{} {}", self.street.trim(), self.house_no.trim())
            .trim()
            .to_string();
        Terminal {
            id: self.zip.clone(),
            name: self.name,
            country: self.country,
            city,
            address,
            postal_code: self.zip,
            latitude: self.y.trim().parse().ok(),
            longitude: self.x.trim().parse().ok(),
        }
    }
}

pub struct OmnivaProvider {
    locations_url: String,
    include_post_offices: bool,
    prices: HashMap<String, i64>,
    currency: String,
    mode: ProviderMode,
    http_timeout: Duration,
    client: OnceLock<reqwest::blocking::Client>,
}

impl OmnivaProvider {
    pub const KEY: &'static str = "omniva";

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let config: OmnivaConfig =
            serde_json::from_value(settings.config.clone()).map_err(|e| {
                ProviderError::InvalidConfig {
                    key: settings.key.clone(),
                    reason: e.to_string(),
                }
            })?;
        let locations_url = config
            .locations_url
            .unwrap_or_else(|| DEFAULT_LOCATIONS_URL.to_string());
        if !locations_url.starts_with("http://") && !locations_url.starts_with("https://") {
            return Err(ProviderError::InvalidConfig {
                key: settings.key.clone(),
                reason: format!("locations_url '{locations_url}' is not an http(s) URL"),
            });
        }
        Ok(Self {
            locations_url,
            include_post_offices: config.include_post_offices,
            prices: config.prices,
            currency: config.currency,
            mode: settings.mode,
            http_timeout: settings.http_timeout,
            client: OnceLock::new(),
        })
    }

    // Built on first use so that construction never happens on an async
    // executor thread.
    fn client(&self) -> Result<&reqwest::blocking::Client, ProviderError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(self.http_timeout)
            .build()?;
        Ok(self.client.get_or_init(|| client))
    }

    fn filter_locations(&self, locations: Vec<OmnivaLocation>, country: &str) -> Vec<Terminal> {
        locations
            .into_iter()
            .filter(|l| l.country.eq_ignore_ascii_case(country))
            .filter(|l| self.include_post_offices || l.kind == PARCEL_TERMINAL_TYPE)
            .map(OmnivaLocation::into_terminal)
            .collect()
    }
}

impl Provider for OmnivaProvider {
    fn key(&self) -> &str {
        Self::KEY
    }

    fn list_terminals(&self, country: &str) -> Result<Vec<Terminal>, ProviderError> {
        log::debug!(
            "Fetching Omniva locations from {} ({})",
            self.locations_url,
            self.mode.as_str()
        );
        let body = self
            .client()?
            .get(&self.locations_url)
            .send()?
            .error_for_status()?
            .text()?;
        let locations: Vec<OmnivaLocation> =
            serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(self.filter_locations(locations, country))
    }

    fn quote(&self, request: &QuoteRequest) -> Result<Quote, ProviderError> {
        let price_cents = self.prices.get(&request.service_code).copied().ok_or_else(|| {
            ProviderError::Unsupported(format!(
                "omniva has no price for service '{}'",
                request.service_code
            ))
        })?;
        Ok(Quote {
            price_cents,
            currency: self.currency.clone(),
        })
    }
}
