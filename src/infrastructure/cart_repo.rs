use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{CartItemView, CartView, MAX_LINE_QUANTITY};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartRepository, VariantPrice};
use crate::schema::{cart_items, carts};

use super::models::{CartItemRow, CartRow, NewCartItemRow, NewCartRow};

pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_view(cart: CartRow, items: Vec<CartItemRow>) -> CartView {
    let items = items
        .into_iter()
        .map(|i| CartItemView {
            id: i.id,
            product_variant_id: i.product_variant_id,
            unit_price_cents: i.unit_price_cents,
            currency: i.currency,
            quantity: i.quantity,
        })
        .collect();
    CartView::assemble(cart.id, cart.customer_id, cart.created_at, cart.updated_at, items)
}

fn load_cart(conn: &mut PgConnection, id: Uuid) -> QueryResult<Option<CartView>> {
    let cart = carts::table
        .find(id)
        .select(CartRow::as_select())
        .first(conn)
        .optional()?;

    let Some(cart) = cart else {
        return Ok(None);
    };

    let items = cart_items::table
        .filter(cart_items::cart_id.eq(cart.id))
        .select(CartItemRow::as_select())
        .order((cart_items::created_at.asc(), cart_items::id.asc()))
        .load(conn)?;

    Ok(Some(to_view(cart, items)))
}

/// Bumps `updated_at`, which also row-locks the cart for the rest of the
/// transaction. Returns `false` if the cart does not exist.
fn touch_cart(conn: &mut PgConnection, id: Uuid, now: DateTime<Utc>) -> QueryResult<bool> {
    let updated = diesel::update(carts::table.find(id))
        .set(carts::updated_at.eq(now))
        .execute(conn)?;
    Ok(updated > 0)
}

/// Quantities are summed on conflict; the captured price is left alone.
fn upsert_line(
    conn: &mut PgConnection,
    cart_id: Uuid,
    variant_id: Uuid,
    unit_price_cents: i64,
    currency: &str,
    quantity: i32,
    now: DateTime<Utc>,
) -> QueryResult<usize> {
    diesel::insert_into(cart_items::table)
        .values(&NewCartItemRow {
            id: Uuid::new_v4(),
            cart_id,
            product_variant_id: variant_id,
            unit_price_cents,
            currency: currency.to_string(),
            quantity,
        })
        .on_conflict((cart_items::cart_id, cart_items::product_variant_id))
        .do_update()
        .set((
            cart_items::quantity.eq(cart_items::quantity + excluded(cart_items::quantity)),
            cart_items::updated_at.eq(now),
        ))
        .execute(conn)
}

fn cart_not_found() -> DomainError {
    DomainError::not_found("Cart")
}

impl CartRepository for DieselCartRepository {
    fn create(&self) -> Result<CartView, DomainError> {
        let mut conn = self.pool.get()?;

        let cart = diesel::insert_into(carts::table)
            .values(&NewCartRow {
                id: Uuid::new_v4(),
                customer_id: None,
            })
            .returning(CartRow::as_returning())
            .get_result(&mut conn)?;

        Ok(to_view(cart, vec![]))
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<CartView>, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(load_cart(&mut conn, id)?)
    }

    fn upsert_item(
        &self,
        cart_id: Uuid,
        variant_id: Uuid,
        price: &VariantPrice,
        quantity: i32,
    ) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let now = Utc::now();
            if !touch_cart(conn, cart_id, now)? {
                return Err(cart_not_found());
            }
            upsert_line(
                conn,
                cart_id,
                variant_id,
                price.price_cents,
                &price.currency,
                quantity,
                now,
            )?;
            Ok(())
        })
    }

    fn set_item_quantity(
        &self,
        cart_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let now = Utc::now();
            let updated = diesel::update(
                cart_items::table
                    .filter(cart_items::id.eq(item_id))
                    .filter(cart_items::cart_id.eq(cart_id)),
            )
            .set((
                cart_items::quantity.eq(quantity),
                cart_items::updated_at.eq(now),
            ))
            .execute(conn)?;
            if updated == 0 {
                return Ok(false);
            }
            touch_cart(conn, cart_id, now)?;
            Ok(true)
        })
    }

    fn remove_item(&self, cart_id: Uuid, item_id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let deleted = diesel::delete(
                cart_items::table
                    .filter(cart_items::id.eq(item_id))
                    .filter(cart_items::cart_id.eq(cart_id)),
            )
            .execute(conn)?;
            if deleted == 0 {
                return Ok(false);
            }
            touch_cart(conn, cart_id, Utc::now())?;
            Ok(true)
        })
    }

    fn resolve_for_customer(
        &self,
        customer_id: Uuid,
        guest_cart_id: Option<Uuid>,
    ) -> Result<CartView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let now = Utc::now();

            // The unique customer_id settles concurrent first-time creation.
            diesel::insert_into(carts::table)
                .values(&NewCartRow {
                    id: Uuid::new_v4(),
                    customer_id: Some(customer_id),
                })
                .on_conflict(carts::customer_id)
                .do_nothing()
                .execute(conn)?;

            // Both rows stay locked until commit, so two merges of the same
            // guest cart run one after the other and the second sees it empty.
            let customer_cart = carts::table
                .filter(carts::customer_id.eq(customer_id))
                .select(CartRow::as_select())
                .for_update()
                .first(conn)?;

            if let Some(guest_id) = guest_cart_id.filter(|g| *g != customer_cart.id) {
                let guest = carts::table
                    .find(guest_id)
                    .select(CartRow::as_select())
                    .for_update()
                    .first(conn)
                    .optional()?;

                match guest {
                    None => {
                        log::debug!("Guest cart {} no longer exists, nothing to merge", guest_id);
                    }
                    Some(guest) if guest.customer_id.is_some() => {
                        log::warn!(
                            "Refusing to merge cart {} owned by another customer into cart {}",
                            guest.id,
                            customer_cart.id
                        );
                        return Err(cart_not_found());
                    }
                    Some(guest) => {
                        let lines = cart_items::table
                            .filter(cart_items::cart_id.eq(guest.id))
                            .select(CartItemRow::as_select())
                            .order((cart_items::created_at.asc(), cart_items::id.asc()))
                            .load(conn)?;

                        let held: HashMap<Uuid, i32> = cart_items::table
                            .filter(cart_items::cart_id.eq(customer_cart.id))
                            .select((cart_items::product_variant_id, cart_items::quantity))
                            .load::<(Uuid, i32)>(conn)?
                            .into_iter()
                            .collect();

                        for line in &lines {
                            // Merged lines are capped at the per-line limit.
                            let existing = held.get(&line.product_variant_id).copied().unwrap_or(0);
                            let quantity = line.quantity.min(MAX_LINE_QUANTITY - existing);
                            if quantity <= 0 {
                                continue;
                            }
                            upsert_line(
                                conn,
                                customer_cart.id,
                                line.product_variant_id,
                                line.unit_price_cents,
                                &line.currency,
                                quantity,
                                now,
                            )?;
                        }

                        diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(guest.id)))
                            .execute(conn)?;
                        touch_cart(conn, guest.id, now)?;
                        touch_cart(conn, customer_cart.id, now)?;

                        if !lines.is_empty() {
                            log::info!(
                                "Merged {} line(s) from guest cart {} into cart {}",
                                lines.len(),
                                guest.id,
                                customer_cart.id
                            );
                        }
                    }
                }
            }

            load_cart(conn, customer_cart.id)?.ok_or_else(cart_not_found)
        })
    }
}
