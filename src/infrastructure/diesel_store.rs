use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel::upsert::excluded;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{CartItem, CartLine};
use crate::domain::catalog::{Category, Product};
use crate::domain::errors::DomainError;
use crate::domain::identity::{AuthFailure, NewProfile, Profile, StoredProfile};
use crate::domain::order::{NewOrder, OrderLineDraft, OrderStatus, OrderView};
use crate::domain::ports::{CartRepository, CatalogRepository, OrderRepository, ProfileRepository};
use crate::schema::{cart, categories, order_items, orders, products, profiles};

use super::models::{
    CartRow, CategoryRow, NewCartRow, NewOrderItemRow, NewOrderRow, NewProfileRow, OrderItemRow,
    OrderRow, ProductRow, ProfileRow,
};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Remote(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Remote(e.to_string())
    }
}

/// Escape `%`, `_` and `\` so a search term is matched literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

// ── Write helpers shared by the sequential and transactional paths ───────────

fn insert_order(conn: &mut PgConnection, order: &NewOrder) -> Result<Uuid, DomainError> {
    let order_id = Uuid::new_v4();
    let shipping_address = serde_json::to_value(&order.shipping_address)
        .map_err(|e| DomainError::Remote(format!("cannot encode shipping address: {e}")))?;
    diesel::insert_into(orders::table)
        .values(&NewOrderRow {
            id: order_id,
            user_id: order.owner_id,
            total_amount: order.total_amount.clone(),
            status: OrderStatus::Pending.as_str().to_string(),
            shipping_address: Some(shipping_address),
            payment_method: Some(order.payment_method.as_str().to_string()),
        })
        .execute(conn)?;
    Ok(order_id)
}

fn insert_order_items(
    conn: &mut PgConnection,
    order_id: Uuid,
    lines: &[OrderLineDraft],
) -> Result<(), DomainError> {
    let rows: Vec<NewOrderItemRow> = lines
        .iter()
        .map(|l| NewOrderItemRow {
            id: Uuid::new_v4(),
            order_id,
            product_id: l.product_id,
            quantity: l.quantity,
            price: l.price.clone(),
        })
        .collect();
    diesel::insert_into(order_items::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

fn delete_cart(conn: &mut PgConnection, owner_id: Uuid) -> Result<usize, DomainError> {
    Ok(diesel::delete(cart::table.filter(cart::user_id.eq(owner_id))).execute(conn)?)
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// PostgreSQL-backed implementation of every storefront port.
pub struct DieselStore {
    pool: DbPool,
}

impl DieselStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CatalogRepository for DieselStore {
    fn featured(&self, limit: i64) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = products::table
            .filter(products::is_featured.eq(true))
            .filter(products::is_active.eq(true))
            .order(products::created_at.desc())
            .limit(limit)
            .select(ProductRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    fn search(&self, term: &str, limit: i64) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let pattern = like_pattern(term);
        let rows = products::table
            .filter(
                products::name
                    .ilike(pattern.as_str())
                    .or(products::description.ilike(pattern.as_str())),
            )
            .filter(products::is_active.eq(true))
            .order(products::name.asc())
            .limit(limit)
            .select(ProductRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    fn find_product(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = products::table
            .filter(products::id.eq(id))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = categories::table
            .order(categories::name.asc())
            .select(CategoryRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    fn find_category(&self, id: Uuid) -> Result<Option<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = categories::table
            .filter(categories::id.eq(id))
            .select(CategoryRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Category::from))
    }

    fn products_in_category(&self, category_id: Uuid) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = products::table
            .filter(products::category_id.eq(category_id))
            .filter(products::is_active.eq(true))
            .order(products::name.asc())
            .select(ProductRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}

impl CartRepository for DieselStore {
    fn read_lines(&self, owner_id: Uuid) -> Result<Vec<CartItem>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows: Vec<(CartRow, Option<ProductRow>)> = cart::table
            .left_join(products::table)
            .filter(cart::user_id.eq(owner_id))
            .order(cart::created_at.asc())
            .select((cart::all_columns, products::all_columns.nullable()))
            .load(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(|(line, product)| CartItem {
                line: line.into(),
                product: product.map(Product::from),
            })
            .collect())
    }

    fn upsert_line(
        &self,
        owner_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, DomainError> {
        let mut conn = self.pool.get()?;
        let row: CartRow = diesel::insert_into(cart::table)
            .values(&NewCartRow {
                id: Uuid::new_v4(),
                user_id: owner_id,
                product_id,
                quantity,
            })
            .on_conflict((cart::user_id, cart::product_id))
            .do_update()
            .set((
                cart::quantity.eq(excluded(cart::quantity)),
                cart::updated_at.eq(Utc::now()),
            ))
            .returning(cart::all_columns)
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn update_quantity(
        &self,
        owner_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let updated = diesel::update(
            cart::table
                .filter(cart::id.eq(line_id))
                .filter(cart::user_id.eq(owner_id)),
        )
        .set((cart::quantity.eq(quantity), cart::updated_at.eq(Utc::now())))
        .execute(&mut conn)?;
        Ok(updated > 0)
    }

    fn delete_line(&self, owner_id: Uuid, line_id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(
            cart::table
                .filter(cart::id.eq(line_id))
                .filter(cart::user_id.eq(owner_id)),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn delete_all(&self, owner_id: Uuid) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;
        delete_cart(&mut conn, owner_id)
    }
}

impl OrderRepository for DieselStore {
    fn create_order(&self, order: &NewOrder) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;
        insert_order(&mut conn, order)
    }

    fn create_order_lines(
        &self,
        order_id: Uuid,
        lines: &[OrderLineDraft],
    ) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        insert_order_items(&mut conn, order_id, lines)
    }

    fn place_atomically(
        &self,
        order: &NewOrder,
        lines: &[OrderLineDraft],
    ) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order_id = insert_order(conn, order)?;
            insert_order_items(conn, order_id, lines)?;
            delete_cart(conn, order.owner_id)?;
            Ok(order_id)
        })
    }

    fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order_rows = orders::table
            .filter(orders::user_id.eq(owner_id))
            .order(orders::created_at.desc())
            .select(OrderRow::as_select())
            .load(&mut conn)?;

        let items = OrderItemRow::belonging_to(&order_rows)
            .select(OrderItemRow::as_select())
            .load(&mut conn)?;

        items
            .grouped_by(&order_rows)
            .into_iter()
            .zip(order_rows)
            .map(|(lines, order)| order.into_view(lines))
            .collect()
    }

    fn find_for_owner(&self, owner_id: Uuid, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .filter(orders::user_id.eq(owner_id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = order_items::table
            .filter(order_items::order_id.eq(order.id))
            .select(OrderItemRow::as_select())
            .load(&mut conn)?;

        order.into_view(lines).map(Some)
    }
}

impl ProfileRepository for DieselStore {
    fn find_by_email(&self, email: &str) -> Result<Option<StoredProfile>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = profiles::table
            .filter(profiles::email.eq(email))
            .select(ProfileRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(ProfileRow::into_stored))
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = profiles::table
            .filter(profiles::id.eq(id))
            .select(ProfileRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(ProfileRow::into_profile))
    }

    fn create(&self, profile: NewProfile) -> Result<Profile, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(profiles::table)
            .values(&NewProfileRow {
                id: profile.id,
                email: profile.email,
                full_name: profile.full_name,
                phone: profile.phone,
                password_hash: profile.password_hash,
            })
            .returning(ProfileRow::as_returning())
            .get_result(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DomainError::Auth(AuthFailure::EmailTaken)
                }
                other => other.into(),
            })?;
        Ok(row.into_profile())
    }
}
