use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use serde_json::Value;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::{CachedTerminals, TerminalCacheRepository};
use crate::schema::shipping_terminals_cache;

use super::models::{NewTerminalCacheRow, TerminalCacheRow};

pub struct DieselTerminalCache {
    pool: DbPool,
}

impl DieselTerminalCache {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl TerminalCacheRepository for DieselTerminalCache {
    fn get(
        &self,
        provider_key: &str,
        country: &str,
    ) -> Result<Option<CachedTerminals>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = shipping_terminals_cache::table
            .find((provider_key, country))
            .select(TerminalCacheRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(|r| CachedTerminals {
            payload: r.payload_json,
            fetched_at: r.fetched_at,
        }))
    }

    fn upsert(
        &self,
        provider_key: &str,
        country: &str,
        payload: Value,
    ) -> Result<DateTime<Utc>, DomainError> {
        let mut conn = self.pool.get()?;
        let fetched_at = Utc::now();
        diesel::insert_into(shipping_terminals_cache::table)
            .values(&NewTerminalCacheRow {
                provider_key: provider_key.to_string(),
                country: country.to_string(),
                payload_json: payload,
                fetched_at,
            })
            .on_conflict((
                shipping_terminals_cache::provider_key,
                shipping_terminals_cache::country,
            ))
            .do_update()
            .set((
                shipping_terminals_cache::payload_json
                    .eq(excluded(shipping_terminals_cache::payload_json)),
                shipping_terminals_cache::fetched_at
                    .eq(excluded(shipping_terminals_cache::fetched_at)),
            ))
            .execute(&mut conn)?;
        Ok(fetched_at)
    }

    fn delete(&self, provider_key: &str, country: &str) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(shipping_terminals_cache::table.find((provider_key, country)))
            .execute(&mut conn)?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::infrastructure::test_support::setup_db;

    #[tokio::test]
    async fn upsert_replaces_payload_for_same_key() {
        let (_container, pool) = setup_db().await;
        let cache = DieselTerminalCache::new(pool);

        cache.upsert("omniva", "LT", json!([{"id": "1"}])).unwrap();
        cache.upsert("omniva", "LT", json!([{"id": "2"}])).unwrap();
        cache.upsert("omniva", "LV", json!([])).unwrap();

        let cached = cache.get("omniva", "LT").unwrap().expect("entry exists");
        assert_eq!(cached.payload, json!([{"id": "2"}]));
        assert!(cache.get("dpd", "LT").unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_reports_missing_entries() {
        let (_container, pool) = setup_db().await;
        let cache = DieselTerminalCache::new(pool);

        cache.upsert("omniva", "LT", json!([])).unwrap();

        assert!(cache.delete("omniva", "LT").unwrap());
        assert!(!cache.delete("omniva", "LT").unwrap());
    }
}
