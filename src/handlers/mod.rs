pub mod admin_shipping;
pub mod carts;
pub mod checkout;
pub mod orders;
pub mod shipping;

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        carts::create_cart,
        carts::get_cart,
        carts::add_item,
        carts::update_item,
        carts::remove_item,
        carts::resolve_cart,
        checkout::checkout,
        orders::list_orders,
        orders::get_metrics,
        orders::get_order,
        orders::list_customer_orders,
        orders::get_customer_order,
        shipping::list_options,
        shipping::get_terminals,
        admin_shipping::create_zone,
        admin_shipping::list_zones,
        admin_shipping::get_zone,
        admin_shipping::update_zone,
        admin_shipping::delete_zone,
        admin_shipping::create_method,
        admin_shipping::list_methods,
        admin_shipping::get_method,
        admin_shipping::update_method,
        admin_shipping::delete_method,
        admin_shipping::create_provider,
        admin_shipping::list_providers,
        admin_shipping::get_provider,
        admin_shipping::update_provider,
        admin_shipping::delete_provider,
        admin_shipping::refresh_terminals,
        admin_shipping::delete_cached_terminals,
    ),
    tags(
        (name = "carts", description = "Shopping carts"),
        (name = "checkout", description = "Cart to order"),
        (name = "orders", description = "Order reads"),
        (name = "shipping", description = "Storefront shipping options and terminals"),
        (name = "admin-shipping", description = "Shipping zones, methods, providers and terminal cache"),
    )
)]
pub struct ApiDoc;
