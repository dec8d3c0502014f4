use chrono::Utc;
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::ShippingRepository;
use crate::domain::shipping::{
    MethodInput, ProviderInput, ShippingMethod, ShippingProvider, ShippingZone, ZoneInput,
};
use crate::schema::{shipping_methods, shipping_providers, shipping_zones};

use super::models::{
    NewShippingMethodRow, NewShippingProviderRow, NewShippingZoneRow, ShippingMethodChanges,
    ShippingMethodRow, ShippingProviderChanges, ShippingProviderRow, ShippingZoneChanges,
    ShippingZoneRow,
};

/// Zones, methods and providers.
pub struct DieselShippingRepository {
    pool: DbPool,
}

impl DieselShippingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn countries_to_json(countries: &[String]) -> Value {
    Value::from(countries.to_vec())
}

impl From<ShippingZoneRow> for ShippingZone {
    fn from(row: ShippingZoneRow) -> Self {
        let countries = serde_json::from_value::<Vec<String>>(row.countries_json)
            .unwrap_or_else(|e| {
                log::warn!("Zone {} has unreadable countries_json: {}", row.id, e);
                Vec::new()
            });
        ShippingZone {
            id: row.id,
            name: row.name,
            countries,
            enabled: row.enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<ShippingMethodRow> for ShippingMethod {
    fn from(row: ShippingMethodRow) -> Self {
        ShippingMethod {
            id: row.id,
            zone_id: row.zone_id,
            provider_key: row.provider_key,
            service_code: row.service_code,
            title: row.title,
            enabled: row.enabled,
            sort_order: row.sort_order,
            pricing_mode: row.pricing_mode,
            pricing_rules: row.pricing_rules_json,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<ShippingProviderRow> for ShippingProvider {
    fn from(row: ShippingProviderRow) -> Self {
        ShippingProvider {
            id: row.id,
            key: row.key,
            name: row.name,
            enabled: row.enabled,
            mode: row.mode,
            config: row.config_json,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl ShippingRepository for DieselShippingRepository {
    // ── Zones ────────────────────────────────────────────────────────────────

    fn create_zone(&self, input: &ZoneInput) -> Result<ShippingZone, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(shipping_zones::table)
            .values(&NewShippingZoneRow {
                id: Uuid::new_v4(),
                name: input.name.clone(),
                countries_json: countries_to_json(&input.countries),
                enabled: input.enabled,
            })
            .returning(ShippingZoneRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn update_zone(
        &self,
        id: Uuid,
        input: &ZoneInput,
    ) -> Result<Option<ShippingZone>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(shipping_zones::table.find(id))
            .set(&ShippingZoneChanges {
                name: input.name.clone(),
                countries_json: countries_to_json(&input.countries),
                enabled: input.enabled,
                updated_at: Utc::now(),
            })
            .returning(ShippingZoneRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Into::into))
    }

    fn find_zone(&self, id: Uuid) -> Result<Option<ShippingZone>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = shipping_zones::table
            .find(id)
            .select(ShippingZoneRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Into::into))
    }

    fn list_zones(&self) -> Result<Vec<ShippingZone>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = shipping_zones::table
            .select(ShippingZoneRow::as_select())
            .order((shipping_zones::created_at.asc(), shipping_zones::id.asc()))
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn enabled_zones(&self) -> Result<Vec<ShippingZone>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = shipping_zones::table
            .filter(shipping_zones::enabled.eq(true))
            .select(ShippingZoneRow::as_select())
            .order((shipping_zones::created_at.asc(), shipping_zones::id.asc()))
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn delete_zone(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(shipping_zones::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    // ── Methods ──────────────────────────────────────────────────────────────

    fn create_method(&self, input: &MethodInput) -> Result<ShippingMethod, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(shipping_methods::table)
            .values(&NewShippingMethodRow {
                id: Uuid::new_v4(),
                zone_id: input.zone_id,
                provider_key: input.provider_key.clone(),
                service_code: input.service_code.clone(),
                title: input.title.clone(),
                enabled: input.enabled,
                sort_order: input.sort_order,
                pricing_mode: input.pricing_mode.clone(),
                pricing_rules_json: input.pricing_rules.clone(),
            })
            .returning(ShippingMethodRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn update_method(
        &self,
        id: Uuid,
        input: &MethodInput,
    ) -> Result<Option<ShippingMethod>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(shipping_methods::table.find(id))
            .set(&ShippingMethodChanges {
                zone_id: input.zone_id,
                provider_key: input.provider_key.clone(),
                service_code: input.service_code.clone(),
                title: input.title.clone(),
                enabled: input.enabled,
                sort_order: input.sort_order,
                pricing_mode: input.pricing_mode.clone(),
                pricing_rules_json: input.pricing_rules.clone(),
                updated_at: Utc::now(),
            })
            .returning(ShippingMethodRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Into::into))
    }

    fn find_method(&self, id: Uuid) -> Result<Option<ShippingMethod>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = shipping_methods::table
            .find(id)
            .select(ShippingMethodRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Into::into))
    }

    fn list_methods(&self, zone_id: Option<Uuid>) -> Result<Vec<ShippingMethod>, DomainError> {
        let mut conn = self.pool.get()?;
        let mut query = shipping_methods::table
            .select(ShippingMethodRow::as_select())
            .order((shipping_methods::sort_order.asc(), shipping_methods::title.asc()))
            .into_boxed();
        if let Some(zone_id) = zone_id {
            query = query.filter(shipping_methods::zone_id.eq(zone_id));
        }
        let rows: Vec<ShippingMethodRow> = query.load(&mut conn)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn enabled_methods_for_zone(&self, zone_id: Uuid) -> Result<Vec<ShippingMethod>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = shipping_methods::table
            .filter(shipping_methods::zone_id.eq(zone_id))
            .filter(shipping_methods::enabled.eq(true))
            .select(ShippingMethodRow::as_select())
            .order((shipping_methods::sort_order.asc(), shipping_methods::title.asc()))
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn delete_method(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(shipping_methods::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    // ── Providers ────────────────────────────────────────────────────────────

    fn create_provider(&self, input: &ProviderInput) -> Result<ShippingProvider, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(shipping_providers::table)
            .values(&NewShippingProviderRow {
                id: Uuid::new_v4(),
                key: input.key.clone(),
                name: input.name.clone(),
                enabled: input.enabled,
                mode: input.mode.clone(),
                config_json: input.config.clone(),
            })
            .returning(ShippingProviderRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn update_provider(
        &self,
        id: Uuid,
        input: &ProviderInput,
    ) -> Result<Option<ShippingProvider>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(shipping_providers::table.find(id))
            .set(&ShippingProviderChanges {
                key: input.key.clone(),
                name: input.name.clone(),
                enabled: input.enabled,
                mode: input.mode.clone(),
                config_json: input.config.clone(),
                updated_at: Utc::now(),
            })
            .returning(ShippingProviderRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Into::into))
    }

    fn find_provider(&self, id: Uuid) -> Result<Option<ShippingProvider>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = shipping_providers::table
            .find(id)
            .select(ShippingProviderRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Into::into))
    }

    fn list_providers(&self) -> Result<Vec<ShippingProvider>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = shipping_providers::table
            .select(ShippingProviderRow::as_select())
            .order(shipping_providers::key.asc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn enabled_providers(&self) -> Result<Vec<ShippingProvider>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = shipping_providers::table
            .filter(shipping_providers::enabled.eq(true))
            .select(ShippingProviderRow::as_select())
            .order(shipping_providers::key.asc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn delete_provider(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(shipping_providers::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}
