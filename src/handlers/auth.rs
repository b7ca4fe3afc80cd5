use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::Storefront;
use crate::domain::identity::{Credentials, Identity, Profile, SignUp};
use crate::errors::AppError;
use crate::handlers::session::SessionContext;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IdentityResponse {
    pub user_id: Uuid,
    pub email: String,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.user_id,
            email: identity.email,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub created_at: String,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            email: p.email,
            full_name: p.full_name,
            phone: p.phone,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /auth/sign-up
///
/// Creates the profile and signs the new user in.
#[utoipa::path(
    post,
    path = "/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Profile created and signed in", body = ProfileResponse),
        (status = 400, description = "Invalid email, name or password"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "auth"
)]
pub async fn sign_up(
    store: web::Data<Storefront>,
    session: SessionContext,
    body: web::Json<SignUpRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let request = SignUp {
        email: body.email,
        password: body.password,
        confirm_password: body.confirm_password,
        full_name: body.full_name,
        phone: body.phone,
    };

    let profile = web::block(move || store.auth.sign_up(request))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    session.sign_in(&profile.identity())?;
    Ok(HttpResponse::Created().json(ProfileResponse::from(profile)))
}

/// POST /auth/sign-in
#[utoipa::path(
    post,
    path = "/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = IdentityResponse),
        (status = 400, description = "Malformed email or empty password"),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn sign_in(
    store: web::Data<Storefront>,
    session: SessionContext,
    body: web::Json<SignInRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let credentials = Credentials::try_new(&body.email, &body.password).map_err(AppError::Auth)?;

    let identity = web::block(move || store.auth.sign_in(&credentials))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    session.sign_in(&identity)?;
    Ok(HttpResponse::Ok().json(IdentityResponse::from(identity)))
}

/// POST /auth/sign-out
///
/// Ends the session. Any checkout in progress is discarded with it.
#[utoipa::path(
    post,
    path = "/auth/sign-out",
    responses(
        (status = 204, description = "Signed out"),
    ),
    tag = "auth"
)]
pub async fn sign_out(
    store: web::Data<Storefront>,
    session: SessionContext,
) -> Result<HttpResponse, AppError> {
    let identity = session.identity()?;
    store.auth.sign_out(identity.as_ref());
    session.sign_out();
    Ok(HttpResponse::NoContent().finish())
}

/// GET /auth/me
///
/// The signed-in profile, or `null`.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current profile or null", body = Option<ProfileResponse>),
    ),
    tag = "auth"
)]
pub async fn me(
    store: web::Data<Storefront>,
    session: SessionContext,
) -> Result<HttpResponse, AppError> {
    let identity = session.identity()?;
    let had_identity = identity.is_some();

    let profile = web::block(move || store.auth.current_identity(identity.as_ref()))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    if had_identity && profile.is_none() {
        log::warn!("session identity no longer has a profile; signing out");
        session.sign_out();
    }
    Ok(HttpResponse::Ok().json(profile.map(ProfileResponse::from)))
}
