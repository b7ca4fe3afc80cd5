pub mod application;
pub mod config;
pub mod db;
pub mod doc;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use application::Storefront;
pub use config::AppConfig;
pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub const SESSION_COOKIE: &str = "session";

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("applied {} pending migrations", applied.len());
    Ok(())
}

/// Cookie session carrying the signed-in identity and checkout progress.
pub fn session_middleware(key: Key, cookie_secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_path("/".to_owned())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .build()
}

/// Build and return an actix-web `Server` bound to the configured host and
/// port.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    storefront: Storefront,
    config: &AppConfig,
) -> std::io::Result<actix_web::dev::Server> {
    let store = web::Data::new(storefront);
    let key = config.session_key.clone();
    let cookie_secure = config.cookie_secure;

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .wrap(session_middleware(key.clone(), cookie_secure))
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", doc::ApiDoc::openapi()),
            )
            .configure(handlers::configure)
    })
    .bind((config.host.clone(), config.port))?
    .run())
}
