use std::sync::Arc;
use std::time::Duration;

use crate::application::cart_service::CartService;
use crate::application::checkout_service::CheckoutService;
use crate::application::order_service::OrderService;
use crate::application::shipping_service::ShippingService;
use crate::application::terminal_service::TerminalService;
use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::infrastructure::cart_repo::DieselCartRepository;
use crate::infrastructure::catalog_repo::DieselCatalog;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::shipping_repo::DieselShippingRepository;
use crate::infrastructure::terminal_cache_repo::DieselTerminalCache;
use crate::payments::PaymentProvider;
use crate::providers::{LiveProviders, ProviderRegistry};

pub type Carts = CartService<DieselCartRepository, DieselCatalog>;
pub type Orders = OrderService<DieselOrderRepository, DieselCatalog>;
pub type Checkout = CheckoutService<DieselCartRepository, DieselOrderRepository, DieselCatalog>;
pub type Shipping = ShippingService<DieselShippingRepository>;
pub type Terminals = TerminalService<DieselTerminalCache>;

/// Services shared by every worker.
#[derive(Clone)]
pub struct AppState {
    pub carts: Arc<Carts>,
    pub orders: Arc<Orders>,
    pub checkout: Arc<Checkout>,
    pub shipping: Arc<Shipping>,
    pub terminals: Arc<Terminals>,
}

impl AppState {
    /// Wires the Diesel-backed services and brings every enabled shipping
    /// provider live. Blocks on the database.
    pub fn build(
        pool: DbPool,
        registry: ProviderRegistry,
        payments: Arc<dyn PaymentProvider>,
        provider_http_timeout: Duration,
    ) -> Result<Self, DomainError> {
        let catalog = DieselCatalog::new(pool.clone());
        let live = LiveProviders::default();

        let carts = Arc::new(CartService::new(
            DieselCartRepository::new(pool.clone()),
            catalog.clone(),
        ));
        let orders = Arc::new(OrderService::new(
            DieselOrderRepository::new(pool.clone()),
            catalog,
        ));
        let checkout = Arc::new(CheckoutService::new(carts.clone(), orders.clone(), payments));
        let shipping = Arc::new(ShippingService::new(
            DieselShippingRepository::new(pool.clone()),
            registry,
            live.clone(),
            provider_http_timeout,
        ));
        let terminals = Arc::new(TerminalService::new(DieselTerminalCache::new(pool), live));

        let keys = shipping.reload_providers()?;
        log::info!("Live shipping providers: {:?}", keys);

        Ok(Self {
            carts,
            orders,
            checkout,
            shipping,
            terminals,
        })
    }
}
