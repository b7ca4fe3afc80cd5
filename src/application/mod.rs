pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod checkout_service;
pub mod events;

use std::sync::Arc;

use crate::domain::ports::{CartRepository, CatalogRepository, OrderRepository, ProfileRepository};

pub use auth_service::AuthService;
pub use cart_service::CartService;
pub use catalog_service::CatalogService;
pub use checkout_service::{CheckoutMode, CheckoutService};
pub use events::{EventBus, StoreEvent};

/// Every service the HTTP layer needs, wired over one backing store.
#[derive(Clone)]
pub struct Storefront {
    pub catalog: CatalogService,
    pub cart: CartService,
    pub checkout: CheckoutService,
    pub auth: AuthService,
    pub events: EventBus,
}

impl Storefront {
    pub fn new<S>(store: Arc<S>, mode: CheckoutMode) -> Self
    where
        S: CatalogRepository + CartRepository + OrderRepository + ProfileRepository,
    {
        let events = EventBus::new();
        Self {
            catalog: CatalogService::new(store.clone()),
            cart: CartService::new(store.clone(), store.clone(), events.clone()),
            checkout: CheckoutService::new(store.clone(), store.clone(), events.clone(), mode),
            auth: AuthService::new(store, events.clone()),
            events,
        }
    }
}
