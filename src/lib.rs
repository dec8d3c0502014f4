pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod payments;
pub mod providers;
pub mod schema;
pub mod state;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::Config;
pub use db::{create_pool, DbPool, PoolSettings};
pub use state::AppState;

use handlers::{admin_shipping, carts, checkout, orders, shipping};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
    log::info!("Applied {} pending migration(s)", applied.len());
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = handlers::ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
            .service(
                web::scope("/carts")
                    .route("", web::post().to(carts::create_cart))
                    .route("/resolve", web::post().to(carts::resolve_cart))
                    .route("/{id}", web::get().to(carts::get_cart))
                    .route("/{id}/items", web::post().to(carts::add_item))
                    .route("/{id}/items/{item_id}", web::patch().to(carts::update_item))
                    .route("/{id}/items/{item_id}", web::delete().to(carts::remove_item)),
            )
            .route("/checkout", web::post().to(checkout::checkout))
            .service(
                web::scope("/orders")
                    .route("", web::get().to(orders::list_orders))
                    .route("/metrics", web::get().to(orders::get_metrics))
                    .route("/{id}", web::get().to(orders::get_order)),
            )
            .service(
                web::scope("/customers/{customer_id}/orders")
                    .route("", web::get().to(orders::list_customer_orders))
                    .route("/{id}", web::get().to(orders::get_customer_order)),
            )
            .service(
                web::scope("/shipping")
                    .route("/options", web::get().to(shipping::list_options))
                    .route(
                        "/terminals/{provider}/{country}",
                        web::get().to(shipping::get_terminals),
                    ),
            )
            .service(
                web::scope("/admin/shipping")
                    .route("/zones", web::post().to(admin_shipping::create_zone))
                    .route("/zones", web::get().to(admin_shipping::list_zones))
                    .route("/zones/{id}", web::get().to(admin_shipping::get_zone))
                    .route("/zones/{id}", web::put().to(admin_shipping::update_zone))
                    .route("/zones/{id}", web::delete().to(admin_shipping::delete_zone))
                    .route("/methods", web::post().to(admin_shipping::create_method))
                    .route("/methods", web::get().to(admin_shipping::list_methods))
                    .route("/methods/{id}", web::get().to(admin_shipping::get_method))
                    .route("/methods/{id}", web::put().to(admin_shipping::update_method))
                    .route("/methods/{id}", web::delete().to(admin_shipping::delete_method))
                    .route("/providers", web::post().to(admin_shipping::create_provider))
                    .route("/providers", web::get().to(admin_shipping::list_providers))
                    .route("/providers/{id}", web::get().to(admin_shipping::get_provider))
                    .route("/providers/{id}", web::put().to(admin_shipping::update_provider))
                    .route(
                        "/providers/{id}",
                        web::delete().to(admin_shipping::delete_provider),
                    )
                    .route(
                        "/terminals/{provider}/{country}/refresh",
                        web::post().to(admin_shipping::refresh_terminals),
                    )
                    .route(
                        "/terminals/{provider}/{country}",
                        web::delete().to(admin_shipping::delete_cached_terminals),
                    ),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
