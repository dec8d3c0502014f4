use std::collections::BTreeMap;

use chrono::Utc;
use diesel::dsl::count_star;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::CartView;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    generate_order_number, ListResult, OrderItemView, OrderMetrics, OrderStatus, OrderView,
    Pagination,
};
use crate::domain::ports::OrderRepository;
use crate::schema::{cart_items, carts, order_items, orders, product_variants};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow};

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_view(order: OrderRow, items: Vec<OrderItemRow>) -> OrderView {
    OrderView {
        id: order.id,
        number: order.number,
        status: order.status,
        currency: order.currency,
        subtotal_cents: order.subtotal_cents,
        shipping_cents: order.shipping_cents,
        tax_cents: order.tax_cents,
        total_cents: order.total_cents,
        customer_id: order.customer_id,
        created_at: order.created_at,
        updated_at: order.updated_at,
        items: items
            .into_iter()
            .map(|i| OrderItemView {
                id: i.id,
                product_variant_id: i.product_variant_id,
                unit_price_cents: i.unit_price_cents,
                currency: i.currency,
                quantity: i.quantity,
            })
            .collect(),
    }
}

/// Takes `quantity` units off the variant's stock, or reports why it could
/// not. The conditional update is atomic, so two checkouts cannot both take
/// the last unit.
fn reserve_stock(
    conn: &mut PgConnection,
    variant_id: Uuid,
    quantity: i32,
) -> Result<(), DomainError> {
    let reserved = diesel::update(
        product_variants::table
            .filter(product_variants::id.eq(variant_id))
            .filter(product_variants::stock.ge(quantity)),
    )
    .set((
        product_variants::stock.eq(product_variants::stock - quantity),
        product_variants::updated_at.eq(Utc::now()),
    ))
    .execute(conn)?;

    if reserved > 0 {
        return Ok(());
    }

    let available = product_variants::table
        .find(variant_id)
        .select(product_variants::stock)
        .first::<i32>(conn)
        .optional()?;

    Err(match available {
        None => DomainError::not_found("Product variant"),
        Some(available) => DomainError::InsufficientStock {
            variant_id,
            requested: quantity,
            available,
        },
    })
}

/// Requested units per variant, in ascending variant id order. Stock rows are
/// always locked in this order, so checkouts sharing variants cannot deadlock.
fn stock_requests(cart: &CartView) -> Result<BTreeMap<Uuid, i32>, DomainError> {
    let mut requests = BTreeMap::new();
    for item in &cart.items {
        let total: &mut i32 = requests.entry(item.product_variant_id).or_default();
        *total = total
            .checked_add(item.quantity)
            .ok_or_else(|| DomainError::invalid("quantity is out of range"))?;
    }
    Ok(requests)
}

/// Takes the snapshotted lines out of the cart. The cart row stays locked
/// until commit, so a second checkout of the same cart waits and then finds
/// nothing left to claim. Lines added or changed after the snapshot are left
/// in place and fail the claim.
fn claim_cart_lines(conn: &mut PgConnection, cart: &CartView) -> Result<(), DomainError> {
    let locked = carts::table
        .find(cart.id)
        .select(carts::id)
        .for_update()
        .first::<Uuid>(conn)
        .optional()?;
    if locked.is_none() {
        return Err(DomainError::not_found("Cart"));
    }

    let mut claimed = 0;
    for item in &cart.items {
        claimed += diesel::delete(
            cart_items::table
                .filter(cart_items::id.eq(item.id))
                .filter(cart_items::cart_id.eq(cart.id))
                .filter(cart_items::quantity.eq(item.quantity)),
        )
        .execute(conn)?;
    }
    if claimed != cart.items.len() {
        return Err(DomainError::Conflict(format!(
            "cart {} changed during checkout",
            cart.id
        )));
    }

    diesel::update(carts::table.find(cart.id))
        .set(carts::updated_at.eq(Utc::now()))
        .execute(conn)?;
    Ok(())
}

/// Reserves stock, then writes the order and a snapshot of every cart line.
/// Shipping and tax are not folded into the total yet.
fn write_order(
    conn: &mut PgConnection,
    cart: &CartView,
    customer_id: Option<Uuid>,
) -> Result<OrderView, DomainError> {
    for (variant_id, quantity) in stock_requests(cart)? {
        reserve_stock(conn, variant_id, quantity)?;
    }

    let now = Utc::now();
    let order_id = Uuid::new_v4();
    let order = diesel::insert_into(orders::table)
        .values(&NewOrderRow {
            id: order_id,
            number: generate_order_number(now),
            status: OrderStatus::PendingPayment.as_str().to_string(),
            currency: cart.currency.clone(),
            subtotal_cents: cart.subtotal_cents,
            shipping_cents: 0,
            tax_cents: 0,
            total_cents: cart.subtotal_cents,
            customer_id,
        })
        .returning(OrderRow::as_returning())
        .get_result(conn)?;

    let new_items: Vec<NewOrderItemRow> = cart
        .items
        .iter()
        .map(|i| NewOrderItemRow {
            id: Uuid::new_v4(),
            order_id,
            product_variant_id: i.product_variant_id,
            unit_price_cents: i.unit_price_cents,
            currency: i.currency.clone(),
            quantity: i.quantity,
        })
        .collect();
    let mut items: Vec<OrderItemRow> = diesel::insert_into(order_items::table)
        .values(&new_items)
        .returning(OrderItemRow::as_returning())
        .get_results(conn)?;
    // Same order the read paths use.
    items.sort_by_key(|i| (i.created_at, i.id));

    Ok(to_view(order, items))
}

fn load_page<F>(
    conn: &mut PgConnection,
    page: Pagination,
    customer_id: Option<Uuid>,
    count: F,
) -> Result<ListResult, DomainError>
where
    F: FnOnce(&mut PgConnection) -> QueryResult<i64>,
{
    let total = count(conn)?;

    let mut query = orders::table
        .select(OrderRow::as_select())
        .order((orders::created_at.desc(), orders::id.desc()))
        .limit(page.limit)
        .offset(page.offset)
        .into_boxed();
    if let Some(customer_id) = customer_id {
        query = query.filter(orders::customer_id.eq(customer_id));
    }
    let rows: Vec<OrderRow> = query.load(conn)?;

    let items: Vec<OrderItemRow> = OrderItemRow::belonging_to(&rows)
        .select(OrderItemRow::as_select())
        .order((order_items::created_at.asc(), order_items::id.asc()))
        .load(conn)?;
    let items = items.grouped_by(&rows);

    Ok(ListResult {
        items: rows
            .into_iter()
            .zip(items)
            .map(|(order, items)| to_view(order, items))
            .collect(),
        total,
    })
}

fn load_items(conn: &mut PgConnection, order_id: Uuid) -> QueryResult<Vec<OrderItemRow>> {
    order_items::table
        .filter(order_items::order_id.eq(order_id))
        .select(OrderItemRow::as_select())
        .order((order_items::created_at.asc(), order_items::id.asc()))
        .load(conn)
}

impl OrderRepository for DieselOrderRepository {
    fn create_from_cart(
        &self,
        cart: &CartView,
        customer_id: Option<Uuid>,
    ) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| write_order(conn, cart, customer_id))
    }

    fn checkout_cart(
        &self,
        cart: &CartView,
        customer_id: Option<Uuid>,
    ) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // The cart lock comes first, then stock rows in variant order.
            claim_cart_lines(conn, cart)?;
            write_order(conn, cart, customer_id)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = load_items(&mut conn, order.id)?;
        Ok(Some(to_view(order, items)))
    }

    fn find_for_customer(
        &self,
        customer_id: Uuid,
        id: Uuid,
    ) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .filter(orders::customer_id.eq(customer_id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = load_items(&mut conn, order.id)?;
        Ok(Some(to_view(order, items)))
    }

    fn list(&self, page: Pagination) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            load_page(conn, page, None, |conn| orders::table.count().get_result(conn))
        })
    }

    fn list_for_customer(
        &self,
        customer_id: Uuid,
        page: Pagination,
    ) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            load_page(conn, page, Some(customer_id), |conn| {
                orders::table
                    .filter(orders::customer_id.eq(customer_id))
                    .count()
                    .get_result(conn)
            })
        })
    }

    fn metrics(&self) -> Result<OrderMetrics, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .group_by(orders::status)
            .select((orders::status, count_star()))
            .load::<(String, i64)>(&mut conn)?;

        Ok(OrderMetrics::from_status_counts(rows))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};

    use chrono::Utc;

    use super::*;
    use crate::domain::cart::CartItemView;
    use crate::domain::ports::CatalogLookup;
    use crate::infrastructure::catalog_repo::DieselCatalog;
    use crate::infrastructure::test_support::{seed_variant, setup_db};

    fn cart_of(lines: &[(Uuid, i64, i32)]) -> CartView {
        let now = Utc::now();
        let items = lines
            .iter()
            .map(|(variant, price, qty)| CartItemView {
                id: Uuid::new_v4(),
                product_variant_id: *variant,
                unit_price_cents: *price,
                currency: "EUR".to_string(),
                quantity: *qty,
            })
            .collect();
        CartView::assemble(Uuid::new_v4(), None, now, now, items)
    }

    fn order_count(pool: &DbPool) -> (i64, i64) {
        let mut conn = pool.get().expect("Failed to get connection");
        let orders: i64 = orders::table.count().get_result(&mut conn).unwrap();
        let items: i64 = order_items::table.count().get_result(&mut conn).unwrap();
        (orders, items)
    }

    #[tokio::test]
    async fn create_writes_order_and_items_and_reserves_stock() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalog::new(pool.clone());
        let repo = DieselOrderRepository::new(pool.clone());
        let a = seed_variant(&catalog, 200, "EUR", 5);
        let b = seed_variant(&catalog, 300, "EUR", 5);
        let cart = cart_of(&[(a.id, 200, 2), (b.id, 300, 1)]);
        let customer_id = Uuid::new_v4();

        let order = repo
            .create_from_cart(&cart, Some(customer_id))
            .expect("create failed");

        assert_eq!(order.status, "pending_payment");
        assert!(order.number.starts_with("ORD-"));
        assert_eq!(order.subtotal_cents, 700);
        assert_eq!(order.total_cents, 700);
        assert_eq!(order.shipping_cents, 0);
        assert_eq!(order.tax_cents, 0);
        assert_eq!(order.customer_id, Some(customer_id));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order_count(&pool), (1, 2));
        assert_eq!(catalog.variant_stock(a.id).unwrap(), 3);
        assert_eq!(catalog.variant_stock(b.id).unwrap(), 4);
    }

    #[tokio::test]
    async fn shortfall_rolls_back_everything() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalog::new(pool.clone());
        let repo = DieselOrderRepository::new(pool.clone());
        let plenty = seed_variant(&catalog, 200, "EUR", 10);
        let scarce = seed_variant(&catalog, 300, "EUR", 1);
        let cart = cart_of(&[(plenty.id, 200, 2), (scarce.id, 300, 2)]);

        let err = repo.create_from_cart(&cart, None).unwrap_err();

        assert!(matches!(
            err,
            DomainError::InsufficientStock { requested: 2, available: 1, .. }
        ));
        assert_eq!(order_count(&pool), (0, 0));
        assert_eq!(catalog.variant_stock(plenty.id).unwrap(), 10);
    }

    #[test]
    fn stock_requests_are_merged_and_sorted_by_variant() {
        let mut ids = [Uuid::new_v4(), Uuid::new_v4()];
        ids.sort();
        let [low, high] = ids;
        let cart = cart_of(&[(high, 100, 1), (low, 100, 2), (high, 100, 3)]);

        let requests: Vec<(Uuid, i32)> = stock_requests(&cart).unwrap().into_iter().collect();

        assert_eq!(requests, vec![(low, 2), (high, 4)]);
    }

    #[tokio::test]
    async fn opposite_order_carts_do_not_deadlock() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalog::new(pool.clone());
        let repo = Arc::new(DieselOrderRepository::new(pool.clone()));
        let a = seed_variant(&catalog, 100, "EUR", 100);
        let b = seed_variant(&catalog, 100, "EUR", 100);
        let rounds = 20;

        for _ in 0..rounds {
            let barrier = Arc::new(Barrier::new(2));
            let carts = [
                cart_of(&[(a.id, 100, 1), (b.id, 100, 1)]),
                cart_of(&[(b.id, 100, 1), (a.id, 100, 1)]),
            ];
            let handles: Vec<_> = carts
                .into_iter()
                .map(|cart| {
                    let repo = repo.clone();
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        repo.create_from_cart(&cart, None)
                    })
                })
                .collect();
            for handle in handles {
                handle
                    .join()
                    .expect("checkout thread panicked")
                    .expect("concurrent checkout failed");
            }
        }

        assert_eq!(order_count(&pool).0, 2 * rounds);
        assert_eq!(catalog.variant_stock(a.id).unwrap(), 100 - 2 * rounds as i32);
        assert_eq!(catalog.variant_stock(b.id).unwrap(), 100 - 2 * rounds as i32);
    }

    #[tokio::test]
    async fn missing_variant_rolls_back() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool.clone());
        let cart = cart_of(&[(Uuid::new_v4(), 100, 1)]);

        let err = repo.create_from_cart(&cart, None).unwrap_err();

        assert!(matches!(err, DomainError::NotFound(_)));
        assert_eq!(order_count(&pool), (0, 0));
    }

    #[tokio::test]
    async fn items_are_a_snapshot_of_cart_prices() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalog::new(pool.clone());
        let repo = DieselOrderRepository::new(pool);
        let variant = seed_variant(&catalog, 999, "EUR", 5);
        let cart = cart_of(&[(variant.id, 450, 1)]);

        let order = repo.create_from_cart(&cart, None).unwrap();
        let found = repo.find_by_id(order.id).unwrap().expect("order exists");

        assert_eq!(found.items[0].unit_price_cents, 450);
        assert_eq!(found.customer_id, None);
    }

    #[tokio::test]
    async fn items_come_back_in_the_same_order_on_every_read() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalog::new(pool.clone());
        let repo = DieselOrderRepository::new(pool);
        let lines: Vec<(Uuid, i64, i32)> = (0..4)
            .map(|_| (seed_variant(&catalog, 100, "EUR", 5).id, 100, 1))
            .collect();

        let order = repo.create_from_cart(&cart_of(&lines), None).unwrap();
        let ids = |o: &OrderView| o.items.iter().map(|i| i.id).collect::<Vec<_>>();

        let found = repo.find_by_id(order.id).unwrap().expect("order exists");
        let listed = repo.list(Pagination::new(None, None)).unwrap();
        assert_eq!(ids(&found), ids(&order));
        assert_eq!(ids(&listed.items[0]), ids(&order));
    }

    #[tokio::test]
    async fn find_by_id_returns_none_for_unknown_id() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);

        assert!(repo.find_by_id(Uuid::new_v4()).unwrap().is_none());
    }

    #[tokio::test]
    async fn customer_reads_are_scoped() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalog::new(pool.clone());
        let repo = DieselOrderRepository::new(pool);
        let variant = seed_variant(&catalog, 100, "EUR", 10);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let alices = repo
            .create_from_cart(&cart_of(&[(variant.id, 100, 1)]), Some(alice))
            .unwrap();
        repo.create_from_cart(&cart_of(&[(variant.id, 100, 1)]), Some(bob))
            .unwrap();

        let page = repo
            .list_for_customer(alice, Pagination::new(None, None))
            .unwrap();
        assert_eq!(page.total, 1);
        assert!(page.items.iter().all(|o| o.customer_id == Some(alice)));

        assert!(repo.find_for_customer(bob, alices.id).unwrap().is_none());
        assert!(repo.find_for_customer(alice, alices.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn list_paginates_and_loads_items() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalog::new(pool.clone());
        let repo = DieselOrderRepository::new(pool);
        let variant = seed_variant(&catalog, 100, "EUR", 50);

        for _ in 0..5 {
            repo.create_from_cart(&cart_of(&[(variant.id, 100, 1)]), None)
                .unwrap();
        }

        let page1 = repo.list(Pagination::new(Some(3), Some(0))).unwrap();
        assert_eq!(page1.total, 5);
        assert_eq!(page1.items.len(), 3);
        assert!(page1.items.iter().all(|o| o.items.len() == 1));

        let page2 = repo.list(Pagination::new(Some(3), Some(3))).unwrap();
        assert_eq!(page2.total, 5);
        assert_eq!(page2.items.len(), 2);
    }

    #[tokio::test]
    async fn metrics_count_by_status() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalog::new(pool.clone());
        let repo = DieselOrderRepository::new(pool.clone());
        let variant = seed_variant(&catalog, 100, "EUR", 50);

        let paid = repo
            .create_from_cart(&cart_of(&[(variant.id, 100, 1)]), None)
            .unwrap();
        repo.create_from_cart(&cart_of(&[(variant.id, 100, 1)]), None)
            .unwrap();
        {
            let mut conn = pool.get().unwrap();
            diesel::update(orders::table.find(paid.id))
                .set(orders::status.eq("paid"))
                .execute(&mut conn)
                .unwrap();
        }

        let metrics = repo.metrics().unwrap();
        assert_eq!(
            metrics,
            OrderMetrics {
                total: 2,
                pending_payment: 1,
                paid: 1,
                cancelled: 0,
            }
        );
    }
}
