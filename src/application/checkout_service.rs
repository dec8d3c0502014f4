use std::sync::Arc;

use uuid::Uuid;

use super::cart_service::CartService;
use super::order_service::OrderService;
use crate::domain::errors::DomainError;
use crate::domain::order::OrderView;
use crate::domain::ports::{CartRepository, CatalogLookup, OrderRepository};
use crate::payments::PaymentProvider;

#[derive(Debug, Clone)]
pub struct CheckoutResult {
    pub order: OrderView,
    pub checkout_url: String,
}

/// Cart to order to payment redirect.
pub struct CheckoutService<R, O, C> {
    carts: Arc<CartService<R, C>>,
    orders: Arc<OrderService<O, C>>,
    payments: Arc<dyn PaymentProvider>,
}

impl<R, O, C> CheckoutService<R, O, C>
where
    R: CartRepository,
    O: OrderRepository,
    C: CatalogLookup,
{
    pub fn new(
        carts: Arc<CartService<R, C>>,
        orders: Arc<OrderService<O, C>>,
        payments: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            carts,
            orders,
            payments,
        }
    }

    pub fn checkout(
        &self,
        cart_id: Uuid,
        customer_id: Option<Uuid>,
    ) -> Result<CheckoutResult, DomainError> {
        let cart = self.carts.get_cart(cart_id)?;

        // A customer's cart is only visible to that customer.
        if let Some(owner) = cart.customer_id {
            if customer_id != Some(owner) {
                return Err(DomainError::not_found("Cart"));
            }
        }

        // Orders exactly the lines read above and takes them out of the cart.
        let order = self
            .orders
            .checkout_cart(&cart, customer_id.or(cart.customer_id))?;

        let checkout_url = self.payments.checkout_url(&order);
        Ok(CheckoutResult {
            order,
            checkout_url,
        })
    }
}
