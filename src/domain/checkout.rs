//! The four-step checkout flow.
//!
//! The flow is a pure value: it holds the current step and whatever the user
//! has entered so far. Nothing in it is persisted until the order is placed,
//! and dropping it is how a user abandons checkout.

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::order::{AddressRejection, PaymentMethod, ShippingAddress};

pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    CartReview,
    Address,
    Payment,
    Confirm,
}

impl CheckoutStep {
    pub const ALL: [CheckoutStep; 4] = [
        CheckoutStep::CartReview,
        CheckoutStep::Address,
        CheckoutStep::Payment,
        CheckoutStep::Confirm,
    ];

    pub fn index(&self) -> usize {
        match self {
            CheckoutStep::CartReview => 0,
            CheckoutStep::Address => 1,
            CheckoutStep::Payment => 2,
            CheckoutStep::Confirm => 3,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CheckoutStep::CartReview => "Cart Review",
            CheckoutStep::Address => "Shipping Address",
            CheckoutStep::Payment => "Payment Method",
            CheckoutStep::Confirm => "Order Review",
        }
    }

    fn previous(&self) -> CheckoutStep {
        match self {
            CheckoutStep::CartReview | CheckoutStep::Address => CheckoutStep::CartReview,
            CheckoutStep::Payment => CheckoutStep::Address,
            CheckoutStep::Confirm => CheckoutStep::Payment,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutFlow {
    step: CheckoutStep,
    address: ShippingAddress,
    payment_method: PaymentMethod,
}

impl CheckoutFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn address(&self) -> &ShippingAddress {
        &self.address
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// CartReview -> Address. Needs at least one cart line.
    pub fn continue_to_address(&mut self, cart_line_count: usize) -> Result<(), DomainError> {
        self.expect_step(CheckoutStep::CartReview)?;
        if cart_line_count == 0 {
            return Err(DomainError::validation(EMPTY_CART_MESSAGE));
        }
        self.step = CheckoutStep::Address;
        Ok(())
    }

    /// Address -> Payment. A draft with blank fields is kept so the fields
    /// the user already filled in survive a failed submit. An over-long
    /// draft is dropped; it would not fit in the session cookie.
    pub fn submit_address(&mut self, draft: ShippingAddress) -> Result<(), DomainError> {
        self.expect_step(CheckoutStep::Address)?;
        match draft.check() {
            Ok(()) => {
                self.address = draft;
                self.step = CheckoutStep::Payment;
                Ok(())
            }
            Err(rejection @ AddressRejection::Missing(_)) => {
                self.address = draft;
                Err(rejection.into())
            }
            Err(rejection) => Err(rejection.into()),
        }
    }

    /// Payment -> Confirm. Always advances.
    pub fn submit_payment(&mut self, method: Option<PaymentMethod>) -> Result<(), DomainError> {
        self.expect_step(CheckoutStep::Payment)?;
        self.payment_method = method.unwrap_or_default();
        self.step = CheckoutStep::Confirm;
        Ok(())
    }

    /// One step back; entered data is left untouched.
    pub fn back(&mut self) {
        self.step = self.step.previous();
    }

    pub fn ready_to_place(&self) -> Result<(), DomainError> {
        self.expect_step(CheckoutStep::Confirm)?;
        self.address.check().map_err(DomainError::from)
    }

    fn expect_step(&self, expected: CheckoutStep) -> Result<(), DomainError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "Checkout is at '{}', not '{}'",
                self.step.title(),
                expected.title()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{LONG_ADDRESS_MESSAGE, MISSING_ADDRESS_MESSAGE};

    fn address() -> ShippingAddress {
        ShippingAddress {
            street: "1 Fern Lane".to_string(),
            city: "Portland".to_string(),
            state: "OR".to_string(),
            postal_code: "97201".to_string(),
            country: "US".to_string(),
        }
    }

    fn at_confirm() -> CheckoutFlow {
        let mut flow = CheckoutFlow::new();
        flow.continue_to_address(1).expect("review");
        flow.submit_address(address()).expect("address");
        flow.submit_payment(None).expect("payment");
        flow
    }

    #[test]
    fn starts_at_cart_review() {
        assert_eq!(CheckoutFlow::new().step(), CheckoutStep::CartReview);
    }

    #[test]
    fn empty_cart_blocks_review() {
        let mut flow = CheckoutFlow::new();
        let err = flow.continue_to_address(0).unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
        assert_eq!(flow.step(), CheckoutStep::CartReview);
    }

    #[test]
    fn each_missing_address_field_blocks_and_keeps_entered_fields() {
        for blank in ["street", "city", "state", "postal_code", "country"] {
            let mut flow = CheckoutFlow::new();
            flow.continue_to_address(1).expect("review");

            let mut draft = address();
            match blank {
                "street" => draft.street.clear(),
                "city" => draft.city.clear(),
                "state" => draft.state.clear(),
                "postal_code" => draft.postal_code.clear(),
                _ => draft.country.clear(),
            }

            let err = flow.submit_address(draft.clone()).unwrap_err();
            match err {
                DomainError::Validation { message, fields } => {
                    assert_eq!(message, MISSING_ADDRESS_MESSAGE);
                    assert_eq!(fields, vec![blank]);
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert_eq!(flow.step(), CheckoutStep::Address);
            assert_eq!(flow.address(), &draft);
        }
    }

    #[test]
    fn overlong_address_is_rejected_and_not_kept() {
        let mut flow = CheckoutFlow::new();
        flow.continue_to_address(1).expect("review");

        let draft = ShippingAddress {
            street: "A".repeat(4000),
            ..address()
        };
        match flow.submit_address(draft).unwrap_err() {
            DomainError::Validation { message, fields } => {
                assert_eq!(message, LONG_ADDRESS_MESSAGE);
                assert_eq!(fields, vec!["street"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(flow.step(), CheckoutStep::Address);
        assert_eq!(flow.address(), &ShippingAddress::default());
    }

    #[test]
    fn full_walk_reaches_confirm_with_default_card() {
        let flow = at_confirm();
        assert_eq!(flow.step(), CheckoutStep::Confirm);
        assert_eq!(flow.payment_method(), PaymentMethod::Card);
        assert!(flow.ready_to_place().is_ok());
    }

    #[test]
    fn back_keeps_entered_data() {
        let mut flow = CheckoutFlow::new();
        flow.continue_to_address(1).expect("review");
        flow.submit_address(address()).expect("address");
        flow.submit_payment(Some(PaymentMethod::Paypal)).expect("payment");

        flow.back();
        assert_eq!(flow.step(), CheckoutStep::Payment);
        flow.back();
        assert_eq!(flow.step(), CheckoutStep::Address);
        assert_eq!(flow.address(), &address());
        assert_eq!(flow.payment_method(), PaymentMethod::Paypal);
        flow.back();
        flow.back();
        assert_eq!(flow.step(), CheckoutStep::CartReview);
    }

    #[test]
    fn steps_cannot_be_skipped() {
        let mut flow = CheckoutFlow::new();
        assert!(flow.submit_address(address()).is_err());
        assert!(flow.submit_payment(None).is_err());
        assert!(flow.ready_to_place().is_err());
        assert_eq!(flow.step(), CheckoutStep::CartReview);
    }

    #[test]
    fn flow_survives_serialisation() {
        let flow = at_confirm();
        let json = serde_json::to_string(&flow).expect("serialise");
        let restored: CheckoutFlow = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(restored, flow);
    }
}
