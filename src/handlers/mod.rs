pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod session;

use actix_web::web;

/// Register every storefront route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/sign-up", web::post().to(auth::sign_up))
            .route("/sign-in", web::post().to(auth::sign_in))
            .route("/sign-out", web::post().to(auth::sign_out))
            .route("/me", web::get().to(auth::me)),
    )
    .service(
        web::scope("/products")
            .route("", web::get().to(catalog::list_products))
            .route("/{id}", web::get().to(catalog::get_product)),
    )
    .service(
        web::scope("/categories")
            .route("", web::get().to(catalog::list_categories))
            .route("/{id}", web::get().to(catalog::get_category)),
    )
    .service(
        web::scope("/cart")
            .route("", web::get().to(cart::view_cart))
            .route("/items", web::post().to(cart::add_item))
            .route("/items/{line_id}", web::patch().to(cart::update_item))
            .route("/items/{line_id}", web::delete().to(cart::remove_item)),
    )
    .service(
        web::scope("/checkout")
            .route("", web::get().to(checkout::current))
            .route("", web::delete().to(checkout::abandon))
            .route("/start", web::post().to(checkout::start))
            .route("/review", web::post().to(checkout::continue_to_address))
            .route("/address", web::put().to(checkout::submit_address))
            .route("/payment", web::put().to(checkout::submit_payment))
            .route("/back", web::post().to(checkout::back))
            .route("/place", web::post().to(checkout::place)),
    )
    .service(
        web::scope("/orders")
            .route("", web::get().to(orders::list_orders))
            .route("/{id}", web::get().to(orders::get_order)),
    );
}
