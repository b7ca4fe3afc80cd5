use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::Storefront;
use crate::domain::cart::format_amount;
use crate::domain::checkout::{CheckoutFlow, CheckoutStep};
use crate::domain::order::{PaymentMethod, ShippingAddress};
use crate::errors::AppError;
use crate::handlers::session::SessionContext;

// ── Request / response DTOs ──────────────────────────────────────────────────

/// Missing fields deserialize as empty and are reported back as missing.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct AddressRequest {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl From<AddressRequest> for ShippingAddress {
    fn from(a: AddressRequest) -> Self {
        ShippingAddress {
            street: a.street,
            city: a.city,
            state: a.state,
            postal_code: a.postal_code,
            country: a.country,
        }
    }
}

impl From<&ShippingAddress> for AddressRequest {
    fn from(a: &ShippingAddress) -> Self {
        Self {
            street: a.street.clone(),
            city: a.city.clone(),
            state: a.state.clone(),
            postal_code: a.postal_code.clone(),
            country: a.country.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct PaymentRequest {
    /// "card" or "paypal"; defaults to "card".
    #[schema(value_type = Option<String>)]
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutStateResponse {
    /// One of cart_review, address, payment, confirm.
    pub step: String,
    pub step_index: usize,
    pub step_title: String,
    pub steps: Vec<String>,
    pub address: AddressRequest,
    pub payment_method: String,
}

impl From<&CheckoutFlow> for CheckoutStateResponse {
    fn from(flow: &CheckoutFlow) -> Self {
        let step = flow.step();
        Self {
            step: step_name(step).to_string(),
            step_index: step.index(),
            step_title: step.title().to_string(),
            steps: CheckoutStep::ALL
                .iter()
                .map(|s| s.title().to_string())
                .collect(),
            address: flow.address().into(),
            payment_method: flow.payment_method().to_string(),
        }
    }
}

fn step_name(step: CheckoutStep) -> &'static str {
    match step {
        CheckoutStep::CartReview => "cart_review",
        CheckoutStep::Address => "address",
        CheckoutStep::Payment => "payment",
        CheckoutStep::Confirm => "confirm",
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlacedOrderResponse {
    pub order_id: Uuid,
    /// First eight characters of the order id.
    pub reference: String,
    pub total_amount: String,
    pub message: String,
}

fn state(flow: &CheckoutFlow) -> HttpResponse {
    HttpResponse::Ok().json(CheckoutStateResponse::from(flow))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /checkout
#[utoipa::path(
    get,
    path = "/checkout",
    responses(
        (status = 200, description = "Current checkout state", body = CheckoutStateResponse),
        (status = 401, description = "Not signed in"),
    ),
    tag = "checkout"
)]
pub async fn current(session: SessionContext) -> Result<HttpResponse, AppError> {
    session.require_identity()?;
    Ok(state(&session.checkout()))
}

/// POST /checkout/start
///
/// Resets the flow to cart review.
#[utoipa::path(
    post,
    path = "/checkout/start",
    responses(
        (status = 200, description = "Fresh checkout", body = CheckoutStateResponse),
        (status = 401, description = "Not signed in"),
    ),
    tag = "checkout"
)]
pub async fn start(session: SessionContext) -> Result<HttpResponse, AppError> {
    session.require_identity()?;
    let flow = CheckoutFlow::new();
    session.store_checkout(&flow)?;
    Ok(state(&flow))
}

/// POST /checkout/review
///
/// Cart review to address entry. Refused while the cart is empty.
#[utoipa::path(
    post,
    path = "/checkout/review",
    responses(
        (status = 200, description = "Moved to address step", body = CheckoutStateResponse),
        (status = 401, description = "Not signed in"),
        (status = 422, description = "Cart is empty or step out of order"),
    ),
    tag = "checkout"
)]
pub async fn continue_to_address(
    store: web::Data<Storefront>,
    session: SessionContext,
) -> Result<HttpResponse, AppError> {
    let identity = session.require_identity()?;
    let mut flow = session.checkout();

    let line_count = web::block(move || store.checkout.cart_line_count(Some(&identity)))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    flow.continue_to_address(line_count)?;
    session.store_checkout(&flow)?;
    Ok(state(&flow))
}

/// PUT /checkout/address
///
/// The submitted address is kept even when rejected, so a retry only needs
/// the missing fields.
#[utoipa::path(
    put,
    path = "/checkout/address",
    request_body = AddressRequest,
    responses(
        (status = 200, description = "Moved to payment step", body = CheckoutStateResponse),
        (status = 401, description = "Not signed in"),
        (status = 422, description = "Missing or over-long address fields"),
    ),
    tag = "checkout"
)]
pub async fn submit_address(
    session: SessionContext,
    body: web::Json<AddressRequest>,
) -> Result<HttpResponse, AppError> {
    session.require_identity()?;
    let mut flow = session.checkout();

    let result = flow.submit_address(body.into_inner().into());
    session.store_checkout(&flow)?;
    result?;
    Ok(state(&flow))
}

/// PUT /checkout/payment
#[utoipa::path(
    put,
    path = "/checkout/payment",
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "Moved to confirm step", body = CheckoutStateResponse),
        (status = 401, description = "Not signed in"),
        (status = 422, description = "Step out of order"),
    ),
    tag = "checkout"
)]
pub async fn submit_payment(
    session: SessionContext,
    body: web::Json<PaymentRequest>,
) -> Result<HttpResponse, AppError> {
    session.require_identity()?;
    let mut flow = session.checkout();

    flow.submit_payment(body.into_inner().payment_method)?;
    session.store_checkout(&flow)?;
    Ok(state(&flow))
}

/// POST /checkout/back
#[utoipa::path(
    post,
    path = "/checkout/back",
    responses(
        (status = 200, description = "Moved one step back", body = CheckoutStateResponse),
        (status = 401, description = "Not signed in"),
    ),
    tag = "checkout"
)]
pub async fn back(session: SessionContext) -> Result<HttpResponse, AppError> {
    session.require_identity()?;
    let mut flow = session.checkout();

    flow.back();
    session.store_checkout(&flow)?;
    Ok(state(&flow))
}

/// POST /checkout/place
///
/// Turns the cart into a pending order. On success the flow is discarded
/// and the cart is empty.
#[utoipa::path(
    post,
    path = "/checkout/place",
    responses(
        (status = 201, description = "Order placed", body = PlacedOrderResponse),
        (status = 401, description = "Not signed in"),
        (status = 409, description = "A placement is already running"),
        (status = 422, description = "Not at the confirm step or cart empty"),
        (status = 500, description = "Order failed"),
    ),
    tag = "checkout"
)]
pub async fn place(
    store: web::Data<Storefront>,
    session: SessionContext,
) -> Result<HttpResponse, AppError> {
    let identity = session.require_identity()?;
    let flow = session.checkout();

    let placed = web::block(move || store.checkout.place_order(Some(&identity), &flow))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(AppError::from_placement)?;

    session.discard_checkout();
    Ok(HttpResponse::Created().json(PlacedOrderResponse {
        order_id: placed.order_id,
        reference: placed.reference(),
        total_amount: format_amount(&placed.total_amount),
        message: placed.confirmation_message(),
    }))
}

/// DELETE /checkout
///
/// Abandons the flow. Nothing was persisted, so nothing is rolled back.
#[utoipa::path(
    delete,
    path = "/checkout",
    responses(
        (status = 204, description = "Checkout abandoned"),
    ),
    tag = "checkout"
)]
pub async fn abandon(session: SessionContext) -> Result<HttpResponse, AppError> {
    session.discard_checkout();
    Ok(HttpResponse::NoContent().finish())
}
