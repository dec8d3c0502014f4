use uuid::Uuid;

use crate::domain::cart::CartView;
use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, OrderMetrics, OrderView, Pagination};
use crate::domain::ports::{CatalogLookup, OrderRepository};

pub struct OrderService<R, C> {
    repo: R,
    catalog: C,
}

impl<R: OrderRepository, C: CatalogLookup> OrderService<R, C> {
    pub fn new(repo: R, catalog: C) -> Self {
        Self { repo, catalog }
    }

    pub fn create_from_cart(&self, cart: &CartView) -> Result<OrderView, DomainError> {
        self.create_from_cart_for_customer(cart, None)
    }

    /// Turns the cart into a `pending_payment` order. The cart itself is left
    /// untouched.
    pub fn create_from_cart_for_customer(
        &self,
        cart: &CartView,
        customer_id: Option<Uuid>,
    ) -> Result<OrderView, DomainError> {
        self.check_cart(cart)?;
        let order = self.repo.create_from_cart(cart, customer_id)?;
        log_created(&order, cart);
        Ok(order)
    }

    /// Same as `create_from_cart_for_customer`, but the ordered lines leave
    /// the stored cart in the same transaction.
    pub fn checkout_cart(
        &self,
        cart: &CartView,
        customer_id: Option<Uuid>,
    ) -> Result<OrderView, DomainError> {
        self.check_cart(cart)?;
        let order = self.repo.checkout_cart(cart, customer_id)?;
        log_created(&order, cart);
        Ok(order)
    }

    fn check_cart(&self, cart: &CartView) -> Result<(), DomainError> {
        if cart.id.is_nil() {
            return Err(DomainError::invalid("cart id is required"));
        }
        if cart.is_empty() {
            return Err(DomainError::invalid("cart is empty"));
        }
        if cart.currency.is_empty() {
            return Err(DomainError::invalid("cart currency is missing"));
        }

        // Early rejection only; the transaction re-checks while reserving.
        for item in &cart.items {
            let available = self.catalog.variant_stock(item.product_variant_id)?;
            if available < item.quantity {
                log::warn!(
                    "Checkout of cart {} rejected: variant {} has {} in stock, {} requested",
                    cart.id,
                    item.product_variant_id,
                    available,
                    item.quantity
                );
                return Err(DomainError::InsufficientStock {
                    variant_id: item.product_variant_id,
                    requested: item.quantity,
                    available,
                });
            }
        }
        Ok(())
    }

    pub fn list_orders(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<ListResult, DomainError> {
        self.repo.list(Pagination::new(limit, offset))
    }

    pub fn list_customer_orders(
        &self,
        customer_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<ListResult, DomainError> {
        self.repo
            .list_for_customer(customer_id, Pagination::new(limit, offset))
    }

    pub fn get_order(&self, id: Uuid) -> Result<OrderView, DomainError> {
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| DomainError::not_found("Order"))
    }

    pub fn get_customer_order(
        &self,
        customer_id: Uuid,
        id: Uuid,
    ) -> Result<OrderView, DomainError> {
        self.repo
            .find_for_customer(customer_id, id)?
            .ok_or_else(|| DomainError::not_found("Order"))
    }

    pub fn metrics(&self) -> Result<OrderMetrics, DomainError> {
        self.repo.metrics()
    }
}

fn log_created(order: &OrderView, cart: &CartView) {
    log::info!(
        "Created order {} from cart {} with {} item(s), total {} {}",
        order.number,
        cart.id,
        order.items.len(),
        order.total_cents,
        order.currency
    );
}
