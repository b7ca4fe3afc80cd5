use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const DEFAULT_FEATURED_LIMIT: i64 = 6;
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Read-only reference data for the cart and checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: BigDecimal,
    pub image_url: Option<String>,
    pub stock_quantity: i32,
    pub sku: String,
    pub category_id: Option<Uuid>,
    pub is_featured: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Clamp a caller-supplied page size to `1..=MAX_PAGE_LIMIT`.
pub fn clamp_limit(limit: Option<i64>, default: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, MAX_PAGE_LIMIT)
}

/// Case-insensitive match on name or description, as the search box does.
pub fn matches_term(product: &Product, term: &str) -> bool {
    let needle = term.to_lowercase();
    product.name.to_lowercase().contains(&needle)
        || product.description.to_lowercase().contains(&needle)
}
