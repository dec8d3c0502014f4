use crate::domain::errors::DomainError;
use crate::domain::ports::TerminalCacheRepository;
use crate::domain::shipping::{
    normalize_country, normalize_provider_key, Terminal, TerminalListing,
};
use crate::providers::{LiveProviders, Provider};

/// Cache-aside terminal lookup. Entries never expire on their own; they
/// change only through an explicit refresh or eviction.
pub struct TerminalService<T> {
    cache: T,
    live: LiveProviders,
}

impl<T: TerminalCacheRepository> TerminalService<T> {
    pub fn new(cache: T, live: LiveProviders) -> Self {
        Self { cache, live }
    }

    pub fn get_terminals(
        &self,
        provider_key: &str,
        country: &str,
    ) -> Result<TerminalListing, DomainError> {
        let provider_key = &normalize_provider_key(provider_key);
        let country = normalize_country(country)?;

        if let Some(cached) = self.cache.get(provider_key, &country)? {
            match serde_json::from_value::<Vec<Terminal>>(cached.payload) {
                Ok(terminals) => {
                    log::debug!("Terminal cache hit for {}/{}", provider_key, country);
                    return Ok(TerminalListing {
                        provider_key: provider_key.to_string(),
                        country,
                        terminals,
                        fetched_at: cached.fetched_at,
                        from_cache: true,
                    });
                }
                Err(e) => log::warn!(
                    "Discarding unreadable terminal cache for {}/{}: {}",
                    provider_key,
                    country,
                    e
                ),
            }
        }

        log::info!("Terminal cache miss for {}/{}", provider_key, country);
        let provider = self.live.get(provider_key)?;
        let terminals = fetch(provider.as_ref(), &country)?;
        let fetched_at = match self.store(provider_key, &country, &terminals) {
            Ok(fetched_at) => fetched_at,
            Err(e) => {
                log::warn!(
                    "Could not cache terminals for {}/{}: {}",
                    provider_key,
                    country,
                    e
                );
                chrono::Utc::now()
            }
        };

        Ok(TerminalListing {
            provider_key: provider_key.to_string(),
            country,
            terminals,
            fetched_at,
            from_cache: false,
        })
    }

    /// Always calls the carrier and overwrites the cached entry.
    pub fn refresh_terminals(
        &self,
        provider_key: &str,
        country: &str,
    ) -> Result<TerminalListing, DomainError> {
        let provider_key = &normalize_provider_key(provider_key);
        let country = normalize_country(country)?;
        let provider = self.live.get(provider_key)?;
        let terminals = fetch(provider.as_ref(), &country)?;
        let fetched_at = self.store(provider_key, &country, &terminals)?;
        log::info!(
            "Refreshed {} terminal(s) for {}/{}",
            terminals.len(),
            provider_key,
            country
        );

        Ok(TerminalListing {
            provider_key: provider_key.to_string(),
            country,
            terminals,
            fetched_at,
            from_cache: false,
        })
    }

    pub fn delete_cached_terminals(
        &self,
        provider_key: &str,
        country: &str,
    ) -> Result<(), DomainError> {
        let provider_key = &normalize_provider_key(provider_key);
        let country = normalize_country(country)?;
        if !self.cache.delete(provider_key, &country)? {
            return Err(DomainError::not_found("Terminal cache entry"));
        }
        log::info!("Evicted terminal cache for {}/{}", provider_key, country);
        Ok(())
    }

    fn store(
        &self,
        provider_key: &str,
        country: &str,
        terminals: &[Terminal],
    ) -> Result<chrono::DateTime<chrono::Utc>, DomainError> {
        let payload =
            serde_json::to_value(terminals).map_err(|e| DomainError::Internal(e.to_string()))?;
        self.cache.upsert(provider_key, country, payload)
    }
}

fn fetch(provider: &dyn Provider, country: &str) -> Result<Vec<Terminal>, DomainError> {
    provider.list_terminals(country).map_err(|e| {
        log::error!(
            "Provider '{}' failed to list terminals for {}: {}",
            provider.key(),
            country,
            e
        );
        DomainError::from(e)
    })
}
