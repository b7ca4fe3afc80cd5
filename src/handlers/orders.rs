use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::Storefront;
use crate::domain::cart::format_amount;
use crate::domain::order::OrderView;
use crate::errors::AppError;
use crate::handlers::checkout::AddressRequest;
use crate::handlers::session::SessionContext;

// ── Response DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Unit price at placement time, e.g. "24.99"
    pub price: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub status: String,
    pub total_amount: String,
    pub shipping_address: Option<AddressRequest>,
    pub payment_method: Option<String>,
    pub created_at: String,
    pub lines: Vec<OrderLineResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        Self {
            id: o.id,
            status: o.status.as_str().to_string(),
            total_amount: format_amount(&o.total_amount),
            shipping_address: o.shipping_address.as_ref().map(AddressRequest::from),
            payment_method: o.payment_method.map(|m| m.to_string()),
            created_at: o.created_at.to_rfc3339(),
            lines: o
                .lines
                .into_iter()
                .map(|l| OrderLineResponse {
                    id: l.id,
                    product_id: l.product_id,
                    quantity: l.quantity,
                    price: format_amount(&l.price),
                })
                .collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders
///
/// The caller's orders, newest first, with their lines.
#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "Order history", body = [OrderResponse]),
        (status = 401, description = "Not signed in"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    store: web::Data<Storefront>,
    session: SessionContext,
) -> Result<HttpResponse, AppError> {
    let identity = session.require_identity()?;

    let orders = web::block(move || store.checkout.orders_for(Some(&identity)))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /orders/{id}
///
/// Orders belonging to someone else are reported as not found.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    store: web::Data<Storefront>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let identity = session.require_identity()?;
    let order_id = path.into_inner();

    let order = web::block(move || store.checkout.order(Some(&identity), order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
