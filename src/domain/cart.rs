use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::catalog::Product;

pub const MIN_QUANTITY: i32 = 1;
pub const OUT_OF_STOCK_MESSAGE: &str = "Out of stock";

pub const SIGNED_OUT_MESSAGE: &str = "Please sign in to view your cart";
pub const EMPTY_CART_MESSAGE: &str = "Add some beautiful plants to get started!";

/// One row per (owner, product); quantity is always >= 1 while the row exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

/// A cart line joined with its product. `product` is `None` when the product
/// row no longer resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub line: CartLine,
    pub product: Option<Product>,
}

impl CartItem {
    pub fn line_total(&self) -> Option<BigDecimal> {
        self.product
            .as_ref()
            .map(|p| &p.price * BigDecimal::from(self.line.quantity))
    }
}

/// Sum of `price * quantity` over items whose product resolved.
pub fn total_amount(items: &[CartItem]) -> BigDecimal {
    items
        .iter()
        .filter_map(CartItem::line_total)
        .fold(BigDecimal::from(0), |acc, amount| acc + amount)
}

/// Render an amount with two decimal places, e.g. `79.98`.
pub fn format_amount(amount: &BigDecimal) -> String {
    amount.with_scale(2).to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum CartView {
    SignedOut,
    Items {
        items: Vec<CartItem>,
        total: BigDecimal,
    },
}

impl CartView {
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let total = total_amount(&items);
        CartView::Items { items, total }
    }

    pub fn checkout_enabled(&self) -> bool {
        matches!(self, CartView::Items { items, .. } if !items.is_empty())
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            CartView::SignedOut => Some(SIGNED_OUT_MESSAGE),
            CartView::Items { items, .. } if items.is_empty() => Some(EMPTY_CART_MESSAGE),
            CartView::Items { .. } => None,
        }
    }
}
