use std::sync::Arc;

use checkout_core::payments::StubPaymentProvider;
use checkout_core::providers::default_registry;
use checkout_core::{build_server, create_pool, run_migrations, AppState, Config};
use dotenvy::dotenv;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(std::io::Error::other)?;

    let pool = create_pool(&config.pool).map_err(std::io::Error::other)?;
    run_migrations(&pool);

    let state = AppState::build(
        pool,
        default_registry(),
        Arc::new(StubPaymentProvider::new(&config.payment_base_url)),
        config.provider_http_timeout,
    )
    .map_err(std::io::Error::other)?;

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await
}
