use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Paypal,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Paypal => "paypal",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "paypal" => Ok(PaymentMethod::Paypal),
            other => Err(format!("unknown payment method '{other}'")),
        }
    }
}

pub const MISSING_ADDRESS_MESSAGE: &str = "Please fill in all address fields";
pub const LONG_ADDRESS_MESSAGE: &str = "Address fields must be at most 80 characters";

const ADDRESS_FIELDS: [&str; 5] = ["street", "city", "state", "postal_code", "country"];

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

/// Stored as JSON on the order row; never persisted on its own.
///
/// Only presence and length are checked; postal codes and country names are
/// taken as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[validate(custom(function = "not_blank"), length(max = 80))]
    pub street: String,
    #[validate(custom(function = "not_blank"), length(max = 80))]
    pub city: String,
    #[validate(custom(function = "not_blank"), length(max = 80))]
    pub state: String,
    #[validate(custom(function = "not_blank"), length(max = 80))]
    pub postal_code: String,
    #[validate(custom(function = "not_blank"), length(max = 80))]
    pub country: String,
}

/// Why an address was turned down, with the offending fields in form order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressRejection {
    TooLong(Vec<&'static str>),
    Missing(Vec<&'static str>),
}

impl ShippingAddress {
    /// Over-long fields are reported before blank ones.
    pub fn check(&self) -> Result<(), AddressRejection> {
        let Err(errors) = self.validate() else {
            return Ok(());
        };
        let failed = errors.field_errors();
        let fields_with = |code: &str| -> Vec<&'static str> {
            ADDRESS_FIELDS
                .into_iter()
                .filter(|field| {
                    failed
                        .get(*field)
                        .is_some_and(|errs| errs.iter().any(|e| e.code == code))
                })
                .collect()
        };

        let too_long = fields_with("length");
        if !too_long.is_empty() {
            return Err(AddressRejection::TooLong(too_long));
        }
        Err(AddressRejection::Missing(fields_with("blank")))
    }
}

impl From<AddressRejection> for DomainError {
    fn from(rejection: AddressRejection) -> Self {
        let (message, fields) = match rejection {
            AddressRejection::TooLong(fields) => (LONG_ADDRESS_MESSAGE, fields),
            AddressRejection::Missing(fields) => (MISSING_ADDRESS_MESSAGE, fields),
        };
        DomainError::Validation {
            message: message.to_string(),
            fields,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub owner_id: Uuid,
    pub total_amount: BigDecimal,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

/// An order line before its order id is known. `price` is the unit price
/// snapshot taken at placement time.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineDraft {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub total_amount: BigDecimal,
    pub status: OrderStatus,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLineView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub order_id: Uuid,
    pub total_amount: BigDecimal,
}

impl PlacedOrder {
    /// Short human-facing reference: the first eight characters of the id.
    pub fn reference(&self) -> String {
        self.order_id.simple().to_string()[..8].to_string()
    }

    pub fn confirmation_message(&self) -> String {
        format!("Your order #{} has been created.", self.reference())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_address() -> ShippingAddress {
        ShippingAddress {
            street: "123 Main St".to_string(),
            city: "New York".to_string(),
            state: "NY".to_string(),
            postal_code: "10001".to_string(),
            country: "US".to_string(),
        }
    }

    #[test]
    fn complete_address_passes() {
        assert_eq!(full_address().check(), Ok(()));
    }

    #[test]
    fn blank_fields_are_reported_by_name() {
        let address = ShippingAddress {
            city: "   ".to_string(),
            country: String::new(),
            ..full_address()
        };
        assert_eq!(
            address.check(),
            Err(AddressRejection::Missing(vec!["city", "country"]))
        );
    }

    #[test]
    fn overlong_fields_win_over_blank_ones() {
        let address = ShippingAddress {
            street: "A".repeat(81),
            city: String::new(),
            ..full_address()
        };
        assert_eq!(
            address.check(),
            Err(AddressRejection::TooLong(vec!["street"]))
        );

        let at_limit = ShippingAddress {
            street: "A".repeat(80),
            ..full_address()
        };
        assert_eq!(at_limit.check(), Ok(()));
    }

    #[test]
    fn payment_method_defaults_to_card() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::Card);
        assert_eq!("paypal".parse::<PaymentMethod>(), Ok(PaymentMethod::Paypal));
        assert!("cash".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn order_status_round_trips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn reference_is_first_eight_characters() {
        let order_id = Uuid::parse_str("a1b2c3d4-0000-4000-8000-000000000000").expect("uuid");
        let placed = PlacedOrder {
            order_id,
            total_amount: BigDecimal::from(1),
        };
        assert_eq!(placed.reference(), "a1b2c3d4");
        assert_eq!(
            placed.confirmation_message(),
            "Your order #a1b2c3d4 has been created."
        );
    }
}
