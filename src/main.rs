use std::sync::Arc;

use dotenvy::dotenv;
use plant_shop::application::events::log_events;
use plant_shop::infrastructure::DieselStore;
use plant_shop::{build_server, create_pool, run_migrations, AppConfig, Storefront};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    let pool = create_pool(&config.database_url).map_err(std::io::Error::other)?;
    run_migrations(&pool).map_err(std::io::Error::other)?;

    let storefront = Storefront::new(Arc::new(DieselStore::new(pool)), config.checkout_mode);
    actix_web::rt::spawn(log_events(storefront.events.subscribe()));

    log::info!(
        "Starting server at http://{}:{} (checkout mode {:?})",
        config.host,
        config.port,
        config.checkout_mode
    );

    build_server(storefront, &config)?.await
}
