use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use super::identity::AuthFailure;

/// The write that failed after an order row had already been committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    OrderLines,
    CartClear,
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckoutStage::OrderLines => f.write_str("order lines"),
            CheckoutStage::CartClear => f.write_str("cart clear"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found")]
    NotFound,
    #[error("Sign in required")]
    Unauthenticated,
    #[error("Invalid input: {message}")]
    Validation {
        message: String,
        fields: Vec<&'static str>,
    },
    #[error("Authentication failed: {0}")]
    Auth(AuthFailure),
    #[error("Checkout already in progress")]
    CheckoutInProgress,
    #[error("Order {order_id} was created but writing {stage} failed: {source}")]
    PartialCheckout {
        order_id: Uuid,
        stage: CheckoutStage,
        source: Box<DomainError>,
    },
    #[error("Remote write failed: {0}")]
    Remote(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }
}

impl From<AuthFailure> for DomainError {
    fn from(failure: AuthFailure) -> Self {
        DomainError::Auth(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_checkout_display_names_stage_and_order() {
        let order_id = Uuid::new_v4();
        let err = DomainError::PartialCheckout {
            order_id,
            stage: CheckoutStage::OrderLines,
            source: Box::new(DomainError::Remote("connection reset".to_string())),
        };
        let text = err.to_string();
        assert!(text.contains(&order_id.to_string()));
        assert!(text.contains("order lines"));
        assert!(text.contains("connection reset"));
    }

    #[test]
    fn validation_helper_has_no_fields() {
        let err = DomainError::validation("Your cart is empty");
        assert!(matches!(
            err,
            DomainError::Validation { ref fields, .. } if fields.is_empty()
        ));
    }
}
