use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::Storefront;
use crate::domain::cart::{format_amount, CartItem, CartView};
use crate::errors::AppError;
use crate::handlers::catalog::ProductResponse;
use crate::handlers::session::SessionContext;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    /// Defaults to 1; values below 1 are rejected.
    #[serde(default = "one")]
    pub quantity: i32,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateQuantityRequest {
    /// Values below 1 are ignored.
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddedLineResponse {
    pub line_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartLineResponse {
    pub line_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// `null` when the product no longer resolves.
    pub product: Option<ProductResponse>,
    pub line_total: Option<String>,
}

impl From<CartItem> for CartLineResponse {
    fn from(item: CartItem) -> Self {
        Self {
            line_id: item.line.id,
            product_id: item.line.product_id,
            quantity: item.line.quantity,
            line_total: item.line_total().as_ref().map(format_amount),
            product: item.product.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartResponse {
    pub signed_in: bool,
    pub items: Vec<CartLineResponse>,
    /// Decimal total as a string, e.g. "79.98"
    pub total: String,
    pub checkout_enabled: bool,
    /// Prompt shown instead of lines when signed out or empty.
    pub message: Option<String>,
}

impl From<CartView> for CartResponse {
    fn from(view: CartView) -> Self {
        let checkout_enabled = view.checkout_enabled();
        let message = view.message().map(str::to_string);
        match view {
            CartView::SignedOut => Self {
                signed_in: false,
                items: Vec::new(),
                total: "0.00".to_string(),
                checkout_enabled,
                message,
            },
            CartView::Items { items, total } => Self {
                signed_in: true,
                items: items.into_iter().map(Into::into).collect(),
                total: format_amount(&total),
                checkout_enabled,
                message,
            },
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /cart
///
/// Signed-out callers get an empty view with a sign-in prompt, not an error.
#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Current cart", body = CartResponse),
    ),
    tag = "cart"
)]
pub async fn view_cart(
    store: web::Data<Storefront>,
    session: SessionContext,
) -> Result<HttpResponse, AppError> {
    let identity = session.identity()?;

    let view = web::block(move || store.cart.view_cart(identity.as_ref()))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from(view)))
}

/// POST /cart/items
///
/// Adds the product at the requested quantity. A product already in the cart
/// has its quantity overwritten.
#[utoipa::path(
    post,
    path = "/cart/items",
    request_body = AddToCartRequest,
    responses(
        (status = 201, description = "Line created or reset", body = AddedLineResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Product not found"),
        (status = 422, description = "Quantity below 1 or product out of stock"),
    ),
    tag = "cart"
)]
pub async fn add_item(
    store: web::Data<Storefront>,
    session: SessionContext,
    body: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let identity = session.require_identity()?;
    let AddToCartRequest {
        product_id,
        quantity,
    } = body.into_inner();

    let line = web::block(move || {
        store.cart.add_or_increment(Some(&identity), product_id, quantity)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(AddedLineResponse {
        line_id: line.id,
        product_id: line.product_id,
        quantity: line.quantity,
    }))
}

/// PATCH /cart/items/{line_id}
///
/// Returns the cart as it stands after the change.
#[utoipa::path(
    patch,
    path = "/cart/items/{line_id}",
    params(
        ("line_id" = Uuid, Path, description = "Cart line UUID"),
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Line not found"),
    ),
    tag = "cart"
)]
pub async fn update_item(
    store: web::Data<Storefront>,
    session: SessionContext,
    path: web::Path<Uuid>,
    body: web::Json<UpdateQuantityRequest>,
) -> Result<HttpResponse, AppError> {
    let identity = session.require_identity()?;
    let line_id = path.into_inner();
    let quantity = body.into_inner().quantity;

    let view = web::block(move || {
        store.cart.set_quantity(Some(&identity), line_id, quantity)?;
        store.cart.view_cart(Some(&identity))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from(view)))
}

/// DELETE /cart/items/{line_id}
#[utoipa::path(
    delete,
    path = "/cart/items/{line_id}",
    params(
        ("line_id" = Uuid, Path, description = "Cart line UUID"),
    ),
    responses(
        (status = 200, description = "Cart after removal", body = CartResponse),
        (status = 401, description = "Not signed in"),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    store: web::Data<Storefront>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let identity = session.require_identity()?;
    let line_id = path.into_inner();

    let view = web::block(move || {
        store.cart.remove_line(Some(&identity), line_id)?;
        store.cart.view_cart(Some(&identity))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(CartResponse::from(view)))
}
