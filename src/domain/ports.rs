use uuid::Uuid;

use super::cart::{CartItem, CartLine};
use super::catalog::{Category, Product};
use super::errors::DomainError;
use super::identity::{NewProfile, Profile, StoredProfile};
use super::order::{NewOrder, OrderLineDraft, OrderView};

pub trait CatalogRepository: Send + Sync + 'static {
    /// Active, featured products, newest first.
    fn featured(&self, limit: i64) -> Result<Vec<Product>, DomainError>;
    /// Active products whose name or description contains `term`, by name.
    fn search(&self, term: &str, limit: i64) -> Result<Vec<Product>, DomainError>;
    fn find_product(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    fn list_categories(&self) -> Result<Vec<Category>, DomainError>;
    fn find_category(&self, id: Uuid) -> Result<Option<Category>, DomainError>;
    fn products_in_category(&self, category_id: Uuid) -> Result<Vec<Product>, DomainError>;
}

pub trait CartRepository: Send + Sync + 'static {
    fn read_lines(&self, owner_id: Uuid) -> Result<Vec<CartItem>, DomainError>;
    /// Insert-or-update keyed on (owner, product). The stored quantity
    /// becomes `quantity`; it is not added to the existing one.
    fn upsert_line(
        &self,
        owner_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, DomainError>;
    /// Returns `false` when no line with that id belongs to the owner.
    fn update_quantity(
        &self,
        owner_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<bool, DomainError>;
    /// Returns `false` when the line was already gone.
    fn delete_line(&self, owner_id: Uuid, line_id: Uuid) -> Result<bool, DomainError>;
    fn delete_all(&self, owner_id: Uuid) -> Result<usize, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Insert one order row with status `pending`.
    fn create_order(&self, order: &NewOrder) -> Result<Uuid, DomainError>;
    fn create_order_lines(
        &self,
        order_id: Uuid,
        lines: &[OrderLineDraft],
    ) -> Result<(), DomainError>;
    /// Order, order lines and cart clear in a single transaction.
    fn place_atomically(
        &self,
        order: &NewOrder,
        lines: &[OrderLineDraft],
    ) -> Result<Uuid, DomainError>;
    /// Newest first, with lines.
    fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<OrderView>, DomainError>;
    fn find_for_owner(&self, owner_id: Uuid, id: Uuid) -> Result<Option<OrderView>, DomainError>;
}

pub trait ProfileRepository: Send + Sync + 'static {
    fn find_by_email(&self, email: &str) -> Result<Option<StoredProfile>, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, DomainError>;
    /// Fails with `AuthFailure::EmailTaken` when the email is registered.
    fn create(&self, profile: NewProfile) -> Result<Profile, DomainError>;
}
