use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::{CatalogLookup, VariantPrice};
use crate::schema::product_variants;

use super::models::{NewProductVariantRow, ProductVariantRow};

/// Variant price and stock, read from the catalog's own table.
#[derive(Clone)]
pub struct DieselCatalog {
    pool: DbPool,
}

impl DieselCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Seeds a variant. The catalog is owned elsewhere; this exists for
    /// fixtures and local setups.
    pub fn insert_variant(
        &self,
        row: &NewProductVariantRow,
    ) -> Result<ProductVariantRow, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(diesel::insert_into(product_variants::table)
            .values(row)
            .returning(ProductVariantRow::as_returning())
            .get_result(&mut conn)?)
    }
}

impl CatalogLookup for DieselCatalog {
    fn variant_price(&self, variant_id: Uuid) -> Result<VariantPrice, DomainError> {
        let mut conn = self.pool.get()?;
        let (price_cents, currency) = product_variants::table
            .find(variant_id)
            .select((product_variants::price_cents, product_variants::currency))
            .first::<(i64, String)>(&mut conn)
            .optional()?
            .ok_or_else(|| DomainError::not_found("Product variant"))?;
        Ok(VariantPrice {
            price_cents,
            currency,
        })
    }

    fn variant_stock(&self, variant_id: Uuid) -> Result<i32, DomainError> {
        let mut conn = self.pool.get()?;
        product_variants::table
            .find(variant_id)
            .select(product_variants::stock)
            .first::<i32>(&mut conn)
            .optional()?
            .ok_or_else(|| DomainError::not_found("Product variant"))
    }
}
