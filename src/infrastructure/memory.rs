//! In-process store used by the test suites and by anyone running the
//! storefront without PostgreSQL. Mirrors the constraints the schema enforces:
//! one cart line per (owner, product), unique profile emails, and order lines
//! referencing an existing order.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::cart::{CartItem, CartLine};
use crate::domain::catalog::{matches_term, Category, Product};
use crate::domain::errors::DomainError;
use crate::domain::identity::{AuthFailure, NewProfile, Profile, StoredProfile};
use crate::domain::order::{NewOrder, OrderLineDraft, OrderLineView, OrderStatus, OrderView};
use crate::domain::ports::{CartRepository, CatalogRepository, OrderRepository, ProfileRepository};

/// Identifiers of the sample catalog, shared with the SQL seed migration.
pub mod fixtures {
    use uuid::Uuid;

    pub const INDOOR: Uuid = Uuid::from_u128(0x7d0e6f0a_1b2c_4d3e_8f40_000000000001);
    pub const SUCCULENT: Uuid = Uuid::from_u128(0x7d0e6f0a_1b2c_4d3e_8f40_000000000002);

    pub const MONSTERA: Uuid = Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440001);
    pub const SNAKE_PLANT: Uuid = Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440002);
    pub const FIDDLE_LEAF_FIG: Uuid = Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440003);
    pub const ZZ_PLANT: Uuid = Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440004);
    pub const POTHOS: Uuid = Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440005);
    pub const RUBBER_PLANT: Uuid = Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440006);
    pub const PEACE_LILY: Uuid = Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440007);
    pub const STRING_OF_PEARLS: Uuid = Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440008);
}

/// A write that should fail with a remote error until cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    CreateOrder,
    CreateOrderLines,
    DeleteAllCartLines,
}

#[derive(Default)]
struct State {
    categories: Vec<Category>,
    products: Vec<Product>,
    profiles: Vec<StoredProfile>,
    cart: Vec<CartLine>,
    orders: Vec<OrderView>,
    failures: HashSet<FailPoint>,
}

impl State {
    fn check(&self, point: FailPoint) -> Result<(), DomainError> {
        if self.failures.contains(&point) {
            return Err(DomainError::Remote(format!("injected failure at {point:?}")));
        }
        Ok(())
    }

    fn product(&self, id: Uuid) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn insert_order(&mut self, order: &NewOrder) -> Uuid {
        let id = Uuid::new_v4();
        self.orders.push(OrderView {
            id,
            owner_id: order.owner_id,
            total_amount: order.total_amount.clone(),
            status: OrderStatus::Pending,
            shipping_address: Some(order.shipping_address.clone()),
            payment_method: Some(order.payment_method),
            created_at: Utc::now(),
            lines: Vec::new(),
        });
        id
    }

    fn insert_order_lines(
        &mut self,
        order_id: Uuid,
        lines: &[OrderLineDraft],
    ) -> Result<(), DomainError> {
        if let Some(draft) = lines.iter().find(|l| self.product(l.product_id).is_none()) {
            return Err(DomainError::Remote(format!(
                "order line references unknown product {}",
                draft.product_id
            )));
        }
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| DomainError::Remote(format!("order {order_id} does not exist")))?;
        order.lines.extend(lines.iter().map(|l| OrderLineView {
            id: Uuid::new_v4(),
            product_id: l.product_id,
            quantity: l.quantity,
            price: l.price.clone(),
        }));
        Ok(())
    }

    fn clear_cart(&mut self, owner_id: Uuid) -> usize {
        let before = self.cart.len();
        self.cart.retain(|l| l.owner_id != owner_id);
        before - self.cart.len()
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// An empty store with no catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the same categories and products as the seed migration.
    pub fn with_sample_catalog() -> Self {
        let store = Self::new();
        {
            let mut state = store.state();
            state.categories = vec![
                category(fixtures::INDOOR, "Indoor", "Plants that thrive inside your home"),
                category(
                    fixtures::SUCCULENT,
                    "Succulent",
                    "Low-water plants for sunny spots",
                ),
            ];
            let base = Utc::now() - Duration::days(30);
            let seed = [
                (fixtures::MONSTERA, "Monstera Deliciosa", "A popular tropical plant with large, glossy leaves with natural holes.", 3499, 15, fixtures::INDOOR, true),
                (fixtures::SNAKE_PLANT, "Snake Plant", "A hardy, low-maintenance plant with tall, upright leaves that purify the air.", 2499, 25, fixtures::INDOOR, true),
                (fixtures::FIDDLE_LEAF_FIG, "Fiddle Leaf Fig", "A stylish plant with large, violin-shaped leaves that make a bold statement.", 4999, 8, fixtures::INDOOR, true),
                (fixtures::ZZ_PLANT, "ZZ Plant", "An extremely hardy plant that thrives on neglect and purifies the air.", 3999, 18, fixtures::INDOOR, true),
                (fixtures::POTHOS, "Pothos Golden", "A versatile trailing plant with heart-shaped leaves that can grow in various conditions.", 1999, 30, fixtures::INDOOR, false),
                (fixtures::RUBBER_PLANT, "Rubber Plant", "A striking plant with large, glossy leaves that can grow quite tall indoors.", 3999, 12, fixtures::INDOOR, false),
                (fixtures::PEACE_LILY, "Peace Lily", "A beautiful flowering plant that thrives in low light and helps purify the air.", 2799, 20, fixtures::INDOOR, false),
                (fixtures::STRING_OF_PEARLS, "String of Pearls", "A unique trailing succulent with small, bead-like leaves that cascade beautifully.", 2299, 14, fixtures::SUCCULENT, false),
            ];
            state.products = seed
                .into_iter()
                .enumerate()
                .map(|(n, (id, name, description, cents, stock, category_id, featured))| {
                    Product {
                        id,
                        name: name.to_string(),
                        description: description.to_string(),
                        price: BigDecimal::new(i64::from(cents).into(), 2),
                        image_url: None,
                        stock_quantity: stock,
                        sku: format!("PLNT-{:03}", n + 1),
                        category_id: Some(category_id),
                        is_featured: featured,
                        is_active: true,
                        created_at: base + Duration::hours(n as i64),
                    }
                })
                .collect();
        }
        store
    }

    /// Make every subsequent write at `point` fail.
    pub fn fail_on(&self, point: FailPoint) {
        self.state().failures.insert(point);
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Add or replace a catalog entry.
    pub fn put_product(&self, product: Product) {
        let mut state = self.state();
        state.products.retain(|p| p.id != product.id);
        state.products.push(product);
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn category(id: Uuid, name: &str, description: &str) -> Category {
    Category {
        id,
        name: name.to_string(),
        description: Some(description.to_string()),
        image_url: None,
    }
}

fn newest_first(a: &DateTime<Utc>, b: &DateTime<Utc>) -> std::cmp::Ordering {
    b.cmp(a)
}

impl CatalogRepository for InMemoryStore {
    fn featured(&self, limit: i64) -> Result<Vec<Product>, DomainError> {
        let state = self.state();
        let mut products: Vec<Product> = state
            .products
            .iter()
            .filter(|p| p.is_featured && p.is_active)
            .cloned()
            .collect();
        products.sort_by(|a, b| newest_first(&a.created_at, &b.created_at));
        products.truncate(limit.max(0) as usize);
        Ok(products)
    }

    fn search(&self, term: &str, limit: i64) -> Result<Vec<Product>, DomainError> {
        let state = self.state();
        let mut products: Vec<Product> = state
            .products
            .iter()
            .filter(|p| p.is_active && matches_term(p, term))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        products.truncate(limit.max(0) as usize);
        Ok(products)
    }

    fn find_product(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(self.state().product(id).cloned())
    }

    fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        let mut categories = self.state().categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    fn find_category(&self, id: Uuid) -> Result<Option<Category>, DomainError> {
        Ok(self
            .state()
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    fn products_in_category(&self, category_id: Uuid) -> Result<Vec<Product>, DomainError> {
        let state = self.state();
        let mut products: Vec<Product> = state
            .products
            .iter()
            .filter(|p| p.is_active && p.category_id == Some(category_id))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }
}

impl CartRepository for InMemoryStore {
    fn read_lines(&self, owner_id: Uuid) -> Result<Vec<CartItem>, DomainError> {
        let state = self.state();
        Ok(state
            .cart
            .iter()
            .filter(|l| l.owner_id == owner_id)
            .map(|l| CartItem {
                line: l.clone(),
                product: state.product(l.product_id).cloned(),
            })
            .collect())
    }

    fn upsert_line(
        &self,
        owner_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, DomainError> {
        let mut state = self.state();
        if state.product(product_id).is_none() {
            return Err(DomainError::Remote(format!(
                "cart line references unknown product {product_id}"
            )));
        }
        if let Some(line) = state
            .cart
            .iter_mut()
            .find(|l| l.owner_id == owner_id && l.product_id == product_id)
        {
            line.quantity = quantity;
            return Ok(line.clone());
        }
        let line = CartLine {
            id: Uuid::new_v4(),
            owner_id,
            product_id,
            quantity,
        };
        state.cart.push(line.clone());
        Ok(line)
    }

    fn update_quantity(
        &self,
        owner_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<bool, DomainError> {
        let mut state = self.state();
        match state
            .cart
            .iter_mut()
            .find(|l| l.id == line_id && l.owner_id == owner_id)
        {
            Some(line) => {
                line.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_line(&self, owner_id: Uuid, line_id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.state();
        let before = state.cart.len();
        state
            .cart
            .retain(|l| !(l.id == line_id && l.owner_id == owner_id));
        Ok(state.cart.len() < before)
    }

    fn delete_all(&self, owner_id: Uuid) -> Result<usize, DomainError> {
        let mut state = self.state();
        state.check(FailPoint::DeleteAllCartLines)?;
        Ok(state.clear_cart(owner_id))
    }
}

impl OrderRepository for InMemoryStore {
    fn create_order(&self, order: &NewOrder) -> Result<Uuid, DomainError> {
        let mut state = self.state();
        state.check(FailPoint::CreateOrder)?;
        Ok(state.insert_order(order))
    }

    fn create_order_lines(
        &self,
        order_id: Uuid,
        lines: &[OrderLineDraft],
    ) -> Result<(), DomainError> {
        let mut state = self.state();
        state.check(FailPoint::CreateOrderLines)?;
        state.insert_order_lines(order_id, lines)
    }

    fn place_atomically(
        &self,
        order: &NewOrder,
        lines: &[OrderLineDraft],
    ) -> Result<Uuid, DomainError> {
        let mut state = self.state();
        state.check(FailPoint::CreateOrder)?;
        state.check(FailPoint::CreateOrderLines)?;
        state.check(FailPoint::DeleteAllCartLines)?;

        // A rejected line takes the order row back out.
        let snapshot = state.orders.len();
        let order_id = state.insert_order(order);
        if let Err(e) = state.insert_order_lines(order_id, lines) {
            state.orders.truncate(snapshot);
            return Err(e);
        }
        state.clear_cart(order.owner_id);
        Ok(order_id)
    }

    fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        Ok(self
            .state()
            .orders
            .iter()
            .rev()
            .filter(|o| o.owner_id == owner_id)
            .cloned()
            .collect())
    }

    fn find_for_owner(&self, owner_id: Uuid, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        Ok(self
            .state()
            .orders
            .iter()
            .find(|o| o.id == id && o.owner_id == owner_id)
            .cloned())
    }
}

impl ProfileRepository for InMemoryStore {
    fn find_by_email(&self, email: &str) -> Result<Option<StoredProfile>, DomainError> {
        Ok(self
            .state()
            .profiles
            .iter()
            .find(|p| p.profile.email == email)
            .cloned())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, DomainError> {
        Ok(self
            .state()
            .profiles
            .iter()
            .find(|p| p.profile.id == id)
            .map(|p| p.profile.clone()))
    }

    fn create(&self, profile: NewProfile) -> Result<Profile, DomainError> {
        let mut state = self.state();
        if state.profiles.iter().any(|p| p.profile.email == profile.email) {
            return Err(AuthFailure::EmailTaken.into());
        }
        let stored = StoredProfile {
            profile: Profile {
                id: profile.id,
                email: profile.email,
                full_name: profile.full_name,
                phone: profile.phone,
                created_at: Utc::now(),
            },
            password_hash: profile.password_hash,
        };
        let created = stored.profile.clone();
        state.profiles.push(stored);
        Ok(created)
    }
}
