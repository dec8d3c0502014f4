use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::omniva::OmnivaProvider;
use super::static_list::StaticProvider;
use super::{Provider, ProviderError, ProviderSettings};
use crate::domain::shipping::{ProviderMode, ShippingProvider};

pub type ProviderFactory =
    Arc<dyn Fn(&ProviderSettings) -> Result<Arc<dyn Provider>, ProviderError> + Send + Sync>;

/// Provider key to factory. Written during startup, read afterwards.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    factories: Arc<RwLock<HashMap<String, ProviderFactory>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `key`.
    ///
    /// # Panics
    ///
    /// Panics on an empty key or a key that is already registered. Both are
    /// wiring mistakes that must stop the process at startup.
    pub fn register<F>(&self, key: &str, factory: F)
    where
        F: Fn(&ProviderSettings) -> Result<Arc<dyn Provider>, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        assert!(!key.trim().is_empty(), "shipping provider key must not be empty");
        let mut factories = self
            .factories
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        assert!(
            !factories.contains_key(key),
            "shipping provider '{key}' registered twice"
        );
        factories.insert(key.to_string(), Arc::new(factory));
    }

    pub fn get(&self, key: &str) -> Result<ProviderFactory, ProviderError> {
        self.factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
            .ok_or_else(|| ProviderError::NotRegistered(key.to_string()))
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .factories
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    pub fn build(&self, settings: &ProviderSettings) -> Result<Arc<dyn Provider>, ProviderError> {
        let factory = self.get(&settings.key)?;
        factory(settings)
    }

    /// Builds a live client for every enabled row. A row that fails is
    /// logged and left out; the rest still go live.
    pub fn instantiate_enabled(
        &self,
        rows: &[ShippingProvider],
        http_timeout: Duration,
    ) -> HashMap<String, Arc<dyn Provider>> {
        let mut live = HashMap::new();
        for row in rows.iter().filter(|r| r.enabled) {
            let mode = match row.mode.parse::<ProviderMode>() {
                Ok(mode) => mode,
                Err(e) => {
                    log::error!("Skipping shipping provider '{}': {}", row.key, e);
                    continue;
                }
            };
            let settings = ProviderSettings {
                key: row.key.clone(),
                mode,
                config: row.config.clone(),
                http_timeout,
            };
            match self.build(&settings) {
                Ok(provider) => {
                    log::info!("Shipping provider '{}' is live ({})", row.key, mode.as_str());
                    live.insert(row.key.clone(), provider);
                }
                Err(e) => log::error!("Failed to start shipping provider '{}': {}", row.key, e),
            }
        }
        live
    }
}

/// Registry with every built-in carrier.
pub fn default_registry() -> ProviderRegistry {
    let registry = ProviderRegistry::new();
    registry.register(OmnivaProvider::KEY, |settings| {
        Ok(Arc::new(OmnivaProvider::from_settings(settings)?) as Arc<dyn Provider>)
    });
    registry.register(StaticProvider::KEY, |settings| {
        Ok(Arc::new(StaticProvider::from_settings(settings)?) as Arc<dyn Provider>)
    });
    registry
}

/// The providers currently live, by key.
#[derive(Clone, Default)]
pub struct LiveProviders {
    providers: Arc<RwLock<HashMap<String, Arc<dyn Provider>>>>,
}

impl LiveProviders {
    pub fn new(providers: HashMap<String, Arc<dyn Provider>>) -> Self {
        Self {
            providers: Arc::new(RwLock::new(providers)),
        }
    }

    pub fn get(&self, key: &str) -> Result<Arc<dyn Provider>, ProviderError> {
        self.providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
            .ok_or_else(|| ProviderError::NotEnabled(key.to_string()))
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .providers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Swaps in a freshly instantiated set, e.g. after an admin change.
    pub fn replace(&self, providers: HashMap<String, Arc<dyn Provider>>) {
        *self
            .providers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = providers;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::{json, Value};
    use uuid::Uuid;

    use super::*;

    fn row(key: &str, enabled: bool, mode: &str, config: Value) -> ShippingProvider {
        let now = Utc::now();
        ShippingProvider {
            id: Uuid::new_v4(),
            key: key.to_string(),
            name: key.to_string(),
            enabled,
            mode: mode.to_string(),
            config,
            created_at: now,
            updated_at: now,
        }
    }

    fn static_factory(settings: &ProviderSettings) -> Result<Arc<dyn Provider>, ProviderError> {
        Ok(Arc::new(StaticProvider::from_settings(settings)?))
    }

    #[test]
    fn default_registry_has_builtin_carriers() {
        assert_eq!(default_registry().keys(), vec!["omniva", "static"]);
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registration_panics() {
        let registry = ProviderRegistry::new();
        registry.register("static", static_factory);
        registry.register("static", static_factory);
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn empty_key_panics() {
        ProviderRegistry::new().register("  ", static_factory);
    }

    #[test]
    fn unknown_key_is_not_registered() {
        let err = ProviderRegistry::new().get("dhl").err().expect("should fail");
        assert!(matches!(err, ProviderError::NotRegistered(key) if key == "dhl"));
    }

    #[test]
    fn instantiate_skips_disabled_broken_and_unknown_rows() {
        let registry = default_registry();
        let rows = vec![
            row("static", true, "sandbox", json!({"terminals": []})),
            row("omniva", false, "live", json!({})),
            row("dhl", true, "live", json!({})),
        ];
        let live = LiveProviders::new(registry.instantiate_enabled(&rows, Duration::from_secs(1)));

        assert_eq!(live.keys(), vec!["static"]);
        assert!(matches!(live.get("omniva"), Err(ProviderError::NotEnabled(_))));
        assert!(matches!(live.get("dhl"), Err(ProviderError::NotEnabled(_))));
    }

    #[test]
    fn instantiate_skips_rows_with_invalid_mode() {
        let registry = default_registry();
        let rows = vec![row("static", true, "production", json!({}))];
        assert!(registry.instantiate_enabled(&rows, Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn replace_swaps_live_set() {
        let live = LiveProviders::default();
        assert!(live.keys().is_empty());

        let registry = default_registry();
        live.replace(registry.instantiate_enabled(
            &[row("static", true, "sandbox", json!({}))],
            Duration::from_secs(1),
        ));
        assert!(live.get("static").is_ok());
    }
}
