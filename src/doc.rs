use utoipa::OpenApi;

use crate::handlers::{auth, cart, catalog, checkout, orders};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::sign_up,
        auth::sign_in,
        auth::sign_out,
        auth::me,
        catalog::list_products,
        catalog::get_product,
        catalog::list_categories,
        catalog::get_category,
        cart::view_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        checkout::current,
        checkout::start,
        checkout::continue_to_address,
        checkout::submit_address,
        checkout::submit_payment,
        checkout::back,
        checkout::place,
        checkout::abandon,
        orders::list_orders,
        orders::get_order,
    ),
    components(schemas(
        auth::SignUpRequest,
        auth::SignInRequest,
        auth::IdentityResponse,
        auth::ProfileResponse,
        catalog::ProductResponse,
        catalog::CategoryResponse,
        catalog::CategoryWithProductsResponse,
        cart::AddToCartRequest,
        cart::UpdateQuantityRequest,
        cart::AddedLineResponse,
        cart::CartLineResponse,
        cart::CartResponse,
        checkout::AddressRequest,
        checkout::PaymentRequest,
        checkout::CheckoutStateResponse,
        checkout::PlacedOrderResponse,
        orders::OrderLineResponse,
        orders::OrderResponse,
    )),
    tags(
        (name = "auth", description = "Sign up, sign in and session identity"),
        (name = "catalog", description = "Products and categories"),
        (name = "cart", description = "The signed-in user's cart"),
        (name = "checkout", description = "Four-step checkout and order placement"),
        (name = "orders", description = "Order history"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/sign-in",
            "/products/{id}",
            "/cart/items/{line_id}",
            "/checkout/place",
            "/orders",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
