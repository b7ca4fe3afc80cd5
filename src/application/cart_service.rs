use std::sync::Arc;

use uuid::Uuid;

use crate::application::events::{EventBus, StoreEvent};
use crate::domain::cart::{CartLine, CartView, MIN_QUANTITY, OUT_OF_STOCK_MESSAGE};
use crate::domain::errors::DomainError;
use crate::domain::identity::Identity;
use crate::domain::ports::{CartRepository, CatalogRepository};

#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartRepository>,
    catalog: Arc<dyn CatalogRepository>,
    events: EventBus,
}

impl CartService {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        catalog: Arc<dyn CatalogRepository>,
        events: EventBus,
    ) -> Self {
        Self {
            carts,
            catalog,
            events,
        }
    }

    /// Viewing degrades to a sign-in prompt instead of failing.
    pub fn view_cart(&self, identity: Option<&Identity>) -> Result<CartView, DomainError> {
        let Some(identity) = identity else {
            return Ok(CartView::SignedOut);
        };
        let items = self.carts.read_lines(identity.user_id)?;
        Ok(CartView::from_items(items))
    }

    /// Upserts the line at the chosen quantity. A product that is already in
    /// the cart has its quantity overwritten, not incremented.
    pub fn add_or_increment(
        &self,
        identity: Option<&Identity>,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, DomainError> {
        let owner_id = require(identity)?;
        if quantity < MIN_QUANTITY {
            return Err(DomainError::Validation {
                message: "Quantity must be at least 1".to_string(),
                fields: vec!["quantity"],
            });
        }
        match self.catalog.find_product(product_id)? {
            Some(product) if product.is_active => {
                if product.stock_quantity < 1 {
                    return Err(DomainError::Validation {
                        message: OUT_OF_STOCK_MESSAGE.to_string(),
                        fields: vec!["product_id"],
                    });
                }
            }
            _ => return Err(DomainError::NotFound),
        }
        let line = self.carts.upsert_line(owner_id, product_id, quantity)?;
        self.events.publish(StoreEvent::CartChanged { owner_id });
        Ok(line)
    }

    /// Quantities below 1 are ignored and leave the line as it was.
    pub fn set_quantity(
        &self,
        identity: Option<&Identity>,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<(), DomainError> {
        let owner_id = require(identity)?;
        if quantity < MIN_QUANTITY {
            return Ok(());
        }
        if !self.carts.update_quantity(owner_id, line_id, quantity)? {
            return Err(DomainError::NotFound);
        }
        self.events.publish(StoreEvent::CartChanged { owner_id });
        Ok(())
    }

    /// Removing a line that is already gone is not an error.
    pub fn remove_line(
        &self,
        identity: Option<&Identity>,
        line_id: Uuid,
    ) -> Result<(), DomainError> {
        let owner_id = require(identity)?;
        if self.carts.delete_line(owner_id, line_id)? {
            self.events.publish(StoreEvent::CartChanged { owner_id });
        }
        Ok(())
    }
}

fn require(identity: Option<&Identity>) -> Result<Uuid, DomainError> {
    identity
        .map(|i| i.user_id)
        .ok_or(DomainError::Unauthenticated)
}
