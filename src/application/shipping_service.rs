use std::time::Duration;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::ShippingRepository;
use crate::domain::pricing::calculate_price;
use crate::domain::shipping::{
    normalize_country, MethodInput, PricingMode, ProviderInput, QuoteRequest, ShippingMethod,
    ShippingOption, ShippingProvider, ShippingZone, ZoneInput,
};
use crate::providers::{LiveProviders, ProviderRegistry};

/// Shipping administration and storefront pricing.
pub struct ShippingService<S> {
    repo: S,
    registry: ProviderRegistry,
    live: LiveProviders,
    http_timeout: Duration,
}

impl<S: ShippingRepository> ShippingService<S> {
    pub fn new(
        repo: S,
        registry: ProviderRegistry,
        live: LiveProviders,
        http_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            registry,
            live,
            http_timeout,
        }
    }

    /// Re-instantiates every enabled provider row and swaps the live set.
    /// Returns the keys that are live afterwards.
    pub fn reload_providers(&self) -> Result<Vec<String>, DomainError> {
        let rows = self.repo.enabled_providers()?;
        self.live
            .replace(self.registry.instantiate_enabled(&rows, self.http_timeout));
        Ok(self.live.keys())
    }

    // Zones

    pub fn create_zone(&self, input: ZoneInput) -> Result<ShippingZone, DomainError> {
        let input = input.validate()?;
        let zone = self.repo.create_zone(&input)?;
        log::info!("Created shipping zone '{}' ({})", zone.name, zone.id);
        Ok(zone)
    }

    pub fn update_zone(&self, id: Uuid, input: ZoneInput) -> Result<ShippingZone, DomainError> {
        let input = input.validate()?;
        self.repo
            .update_zone(id, &input)?
            .ok_or_else(|| DomainError::not_found("Shipping zone"))
    }

    pub fn get_zone(&self, id: Uuid) -> Result<ShippingZone, DomainError> {
        self.repo
            .find_zone(id)?
            .ok_or_else(|| DomainError::not_found("Shipping zone"))
    }

    pub fn list_zones(&self) -> Result<Vec<ShippingZone>, DomainError> {
        self.repo.list_zones()
    }

    pub fn delete_zone(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.repo.delete_zone(id)? {
            return Err(DomainError::not_found("Shipping zone"));
        }
        log::info!("Deleted shipping zone {}", id);
        Ok(())
    }

    /// First enabled zone, oldest first, whose countries include `country`.
    pub fn get_zone_by_country(&self, country: &str) -> Result<ShippingZone, DomainError> {
        let country = normalize_country(country)?;
        self.repo
            .enabled_zones()?
            .into_iter()
            .find(|zone| zone.covers(&country))
            .ok_or_else(|| DomainError::NotFound(format!("No shipping zone for {country}")))
    }

    // Methods

    pub fn create_method(&self, input: MethodInput) -> Result<ShippingMethod, DomainError> {
        let input = input.validate()?;
        self.get_zone(input.zone_id)?;
        let method = self.repo.create_method(&input)?;
        log::info!(
            "Created shipping method '{}' ({}) in zone {}",
            method.title,
            method.pricing_mode,
            method.zone_id
        );
        Ok(method)
    }

    pub fn update_method(
        &self,
        id: Uuid,
        input: MethodInput,
    ) -> Result<ShippingMethod, DomainError> {
        let input = input.validate()?;
        self.get_zone(input.zone_id)?;
        self.repo
            .update_method(id, &input)?
            .ok_or_else(|| DomainError::not_found("Shipping method"))
    }

    pub fn get_method(&self, id: Uuid) -> Result<ShippingMethod, DomainError> {
        self.repo
            .find_method(id)?
            .ok_or_else(|| DomainError::not_found("Shipping method"))
    }

    pub fn list_methods(&self, zone_id: Option<Uuid>) -> Result<Vec<ShippingMethod>, DomainError> {
        self.repo.list_methods(zone_id)
    }

    pub fn delete_method(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.repo.delete_method(id)? {
            return Err(DomainError::not_found("Shipping method"));
        }
        Ok(())
    }

    // Providers

    pub fn create_provider(&self, input: ProviderInput) -> Result<ShippingProvider, DomainError> {
        let input = input.validate()?;
        if self.registry.get(&input.key).is_err() {
            log::warn!(
                "Shipping provider '{}' has no registered integration and will never go live",
                input.key
            );
        }
        let provider = self.repo.create_provider(&input)?;
        self.reload_providers()?;
        Ok(provider)
    }

    pub fn update_provider(
        &self,
        id: Uuid,
        input: ProviderInput,
    ) -> Result<ShippingProvider, DomainError> {
        let input = input.validate()?;
        let provider = self
            .repo
            .update_provider(id, &input)?
            .ok_or_else(|| DomainError::not_found("Shipping provider"))?;
        self.reload_providers()?;
        Ok(provider)
    }

    pub fn get_provider(&self, id: Uuid) -> Result<ShippingProvider, DomainError> {
        self.repo
            .find_provider(id)?
            .ok_or_else(|| DomainError::not_found("Shipping provider"))
    }

    pub fn list_providers(&self) -> Result<Vec<ShippingProvider>, DomainError> {
        self.repo.list_providers()
    }

    pub fn delete_provider(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.repo.delete_provider(id)? {
            return Err(DomainError::not_found("Shipping provider"));
        }
        self.reload_providers()?;
        Ok(())
    }

    // Storefront

    /// Priced options for a destination. Methods that cannot be priced are
    /// left out rather than failing the whole list.
    pub fn list_shipping_options(
        &self,
        country: &str,
        cart_value_cents: i64,
        currency: &str,
    ) -> Result<Vec<ShippingOption>, DomainError> {
        if cart_value_cents < 0 {
            return Err(DomainError::invalid("cart_value_cents must not be negative"));
        }
        let currency = currency.trim().to_ascii_uppercase();
        if currency.is_empty() {
            return Err(DomainError::invalid("currency is required"));
        }
        let zone = self.get_zone_by_country(country)?;
        let country = normalize_country(country)?;

        let mut options = Vec::new();
        for method in self.repo.enabled_methods_for_zone(zone.id)? {
            let priced = if method.pricing_mode == PricingMode::Provider.as_str() {
                self.provider_price(&method, &country, cart_value_cents, &currency)
            } else {
                Some((calculate_price(&method, cart_value_cents), currency.clone()))
            };
            if let Some((price_cents, currency)) = priced {
                options.push(ShippingOption {
                    method_id: method.id,
                    provider_key: method.provider_key,
                    service_code: method.service_code,
                    title: method.title,
                    price_cents,
                    currency,
                });
            }
        }
        Ok(options)
    }

    fn provider_price(
        &self,
        method: &ShippingMethod,
        country: &str,
        cart_value_cents: i64,
        currency: &str,
    ) -> Option<(i64, String)> {
        let request = QuoteRequest {
            service_code: method.service_code.clone(),
            country: country.to_string(),
            cart_value_cents,
            currency: currency.to_string(),
        };
        let quote = self
            .live
            .get(&method.provider_key)
            .and_then(|provider| provider.quote(&request));
        match quote {
            Ok(quote) => Some((quote.price_cents.max(0), quote.currency)),
            Err(e) => {
                log::warn!(
                    "Skipping shipping method {} ('{}'): {}",
                    method.id,
                    method.title,
                    e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::infrastructure::shipping_repo::DieselShippingRepository;
    use crate::infrastructure::test_support::setup_db;
    use crate::providers::default_registry;

    fn service(pool: crate::db::DbPool) -> ShippingService<DieselShippingRepository> {
        ShippingService::new(
            DieselShippingRepository::new(pool),
            default_registry(),
            LiveProviders::default(),
            Duration::from_secs(1),
        )
    }

    fn zone(name: &str, countries: &[&str], enabled: bool) -> ZoneInput {
        ZoneInput {
            name: name.to_string(),
            countries: countries.iter().map(|c| c.to_string()).collect(),
            enabled,
        }
    }

    fn method(
        zone_id: Uuid,
        title: &str,
        sort_order: i32,
        mode: &str,
        rules: serde_json::Value,
    ) -> MethodInput {
        MethodInput {
            zone_id,
            provider_key: "static".to_string(),
            service_code: "locker".to_string(),
            title: title.to_string(),
            enabled: true,
            sort_order,
            pricing_mode: mode.to_string(),
            pricing_rules: rules,
        }
    }

    #[tokio::test]
    async fn zone_lookup_skips_disabled_and_prefers_oldest() {
        let (_container, pool) = setup_db().await;
        let service = service(pool);
        service.create_zone(zone("Disabled", &["LT"], false)).unwrap();
        let first = service.create_zone(zone("Baltics", &["LT", "LV"], true)).unwrap();
        service.create_zone(zone("Overlap", &["LT"], true)).unwrap();

        assert_eq!(service.get_zone_by_country("lt").unwrap().id, first.id);
        assert!(matches!(service.get_zone_by_country("PL"), Err(DomainError::NotFound(_))));
        assert!(matches!(
            service.get_zone_by_country("Poland"),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn method_requires_existing_zone_and_valid_rules() {
        let (_container, pool) = setup_db().await;
        let service = service(pool);
        let zone = service.create_zone(zone("Baltics", &["LT"], true)).unwrap();

        assert!(matches!(
            service.create_method(method(Uuid::new_v4(), "Locker", 0, "fixed", json!({}))),
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            service.create_method(method(zone.id, "Locker", 0, "weight", json!({}))),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            service.delete_method(Uuid::new_v4()),
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn options_are_priced_in_sort_order() {
        let (_container, pool) = setup_db().await;
        let service = service(pool);
        let zone = service.create_zone(zone("Baltics", &["LT"], true)).unwrap();
        service
            .create_method(method(
                zone.id,
                "Courier",
                2,
                "table",
                json!({"bands": [{"min_weight_kg": 0, "max_weight_kg": 5, "price_cents": 790}]}),
            ))
            .unwrap();
        service
            .create_method(method(
                zone.id,
                "Locker",
                1,
                "fixed",
                json!({"base_price_cents": 250, "free_shipping_order_min_cents": 10000}),
            ))
            .unwrap();

        let options = service.list_shipping_options("LT", 5000, "eur").unwrap();
        let prices: Vec<(&str, i64)> = options
            .iter()
            .map(|o| (o.title.as_str(), o.price_cents))
            .collect();
        assert_eq!(prices, vec![("Locker", 250), ("Courier", 790)]);
        assert_eq!(options[0].currency, "EUR");

        let options = service.list_shipping_options("LT", 10000, "EUR").unwrap();
        assert_eq!(options[0].price_cents, 0);
    }

    #[tokio::test]
    async fn provider_methods_use_live_quotes_or_are_skipped() {
        let (_container, pool) = setup_db().await;
        let service = service(pool);
        let zone = service.create_zone(zone("Baltics", &["LT"], true)).unwrap();
        service
            .create_method(method(zone.id, "Live locker", 0, "provider", json!(null)))
            .unwrap();

        assert!(service.list_shipping_options("LT", 100, "EUR").unwrap().is_empty());

        service
            .create_provider(ProviderInput {
                key: "static".to_string(),
                name: "Static".to_string(),
                enabled: true,
                mode: "sandbox".to_string(),
                config: json!({"quotes": {"locker": 349}, "currency": "EUR"}),
            })
            .unwrap();

        let options = service.list_shipping_options("LT", 100, "EUR").unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].price_cents, 349);
    }

    #[tokio::test]
    async fn provider_changes_reload_live_set() {
        let (_container, pool) = setup_db().await;
        let service = service(pool);
        let input = ProviderInput {
            key: "static".to_string(),
            name: "Static".to_string(),
            enabled: true,
            mode: "sandbox".to_string(),
            config: json!({}),
        };
        let provider = service.create_provider(input.clone()).unwrap();
        assert_eq!(service.reload_providers().unwrap(), vec!["static"]);

        assert!(matches!(
            service.create_provider(input.clone()),
            Err(DomainError::Conflict(_))
        ));

        service
            .update_provider(
                provider.id,
                ProviderInput {
                    enabled: false,
                    ..input
                },
            )
            .unwrap();
        assert!(service.reload_providers().unwrap().is_empty());

        service.delete_provider(provider.id).unwrap();
        assert!(matches!(
            service.get_provider(provider.id),
            Err(DomainError::NotFound(_))
        ));
    }
}
