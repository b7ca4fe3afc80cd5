use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::identity::AuthFailure;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Please sign in to continue")]
    Unauthenticated,

    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<&'static str>,
    },

    #[error("{0}")]
    Auth(AuthFailure),

    #[error("Your order is already being placed")]
    CheckoutInProgress,

    #[error("Order failed")]
    CheckoutFailed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Mapping used by the order placement endpoint: any write failure is
    /// reported to the user as a failed order.
    pub fn from_placement(e: DomainError) -> Self {
        match e {
            DomainError::PartialCheckout { .. } | DomainError::Remote(_) => {
                log::error!("order placement failed: {e}");
                AppError::CheckoutFailed
            }
            other => other.into(),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound => AppError::NotFound,
            DomainError::Unauthenticated => AppError::Unauthenticated,
            DomainError::Validation { message, fields } => AppError::Validation { message, fields },
            DomainError::Auth(failure) => AppError::Auth(failure),
            DomainError::CheckoutInProgress => AppError::CheckoutInProgress,
            e @ DomainError::PartialCheckout { .. } => AppError::Internal(e.to_string()),
            DomainError::Remote(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Auth(AuthFailure::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            AppError::Auth(AuthFailure::EmailTaken) => StatusCode::CONFLICT,
            AppError::Auth(_) => StatusCode::BAD_REQUEST,
            AppError::CheckoutInProgress => StatusCode::CONFLICT,
            AppError::CheckoutFailed | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation { message, fields } => json!({
                "error": message,
                "fields": fields,
            }),
            AppError::Auth(failure) => json!({
                "error": failure.to_string(),
                "code": failure.code(),
                "action": failure.action(),
            }),
            AppError::CheckoutFailed => json!({
                "error": self.to_string(),
                "detail": "Please try again later",
            }),
            AppError::Internal(detail) => {
                log::error!("internal error: {detail}");
                json!({ "error": "Internal server error" })
            }
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
