use uuid::Uuid;

use crate::domain::cart::{check_line_quantity, CartView};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartRepository, CatalogLookup};

pub struct CartService<R, C> {
    repo: R,
    catalog: C,
}

impl<R: CartRepository, C: CatalogLookup> CartService<R, C> {
    pub fn new(repo: R, catalog: C) -> Self {
        Self { repo, catalog }
    }

    pub fn create_cart(&self) -> Result<CartView, DomainError> {
        self.repo.create()
    }

    pub fn get_cart(&self, cart_id: Uuid) -> Result<CartView, DomainError> {
        self.repo
            .find_by_id(cart_id)?
            .ok_or_else(|| DomainError::not_found("Cart"))
    }

    /// Adds `quantity` units at the variant's current catalog price. If the
    /// variant is already in the cart only its quantity grows.
    pub fn add_item(
        &self,
        cart_id: Uuid,
        variant_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, DomainError> {
        check_line_quantity(quantity)?;
        let price = self.catalog.variant_price(variant_id)?;
        self.repo.upsert_item(cart_id, variant_id, &price, quantity)?;
        self.get_cart(cart_id)
    }

    pub fn update_item_quantity(
        &self,
        cart_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, DomainError> {
        check_line_quantity(quantity)?;
        if !self.repo.set_item_quantity(cart_id, item_id, quantity)? {
            return Err(DomainError::not_found("Cart item"));
        }
        self.get_cart(cart_id)
    }

    pub fn remove_item(&self, cart_id: Uuid, item_id: Uuid) -> Result<CartView, DomainError> {
        if !self.repo.remove_item(cart_id, item_id)? {
            return Err(DomainError::not_found("Cart item"));
        }
        self.get_cart(cart_id)
    }

    /// Returns the customer's cart, first moving any guest cart lines into it.
    /// Calling it again with the same guest cart changes nothing.
    pub fn resolve_customer_cart(
        &self,
        customer_id: Uuid,
        guest_cart_id: Option<Uuid>,
    ) -> Result<CartView, DomainError> {
        self.repo.resolve_for_customer(customer_id, guest_cart_id)
    }
}
