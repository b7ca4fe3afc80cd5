use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::application::events::{EventBus, StoreEvent};
use crate::domain::cart::total_amount;
use crate::domain::checkout::{CheckoutFlow, EMPTY_CART_MESSAGE};
use crate::domain::errors::{CheckoutStage, DomainError};
use crate::domain::identity::Identity;
use crate::domain::order::{NewOrder, OrderLineDraft, OrderView, PlacedOrder};
use crate::domain::ports::{CartRepository, OrderRepository};

/// How the order, its lines and the cart clear are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckoutMode {
    /// Three independent writes; a failure after the order insert leaves the
    /// order in place.
    #[default]
    Sequential,
    /// One transaction for all three writes.
    Atomic,
}

impl FromStr for CheckoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(CheckoutMode::Sequential),
            "atomic" => Ok(CheckoutMode::Atomic),
            other => Err(format!("unknown checkout mode '{other}'")),
        }
    }
}

/// Owners with a placement currently running. Order creation has no
/// idempotency key, so a second submit must be refused while one is live.
#[derive(Debug, Default)]
struct InFlight {
    owners: Mutex<HashSet<Uuid>>,
}

struct InFlightGuard<'a> {
    registry: &'a InFlight,
    owner_id: Uuid,
}

impl InFlight {
    fn acquire(&self, owner_id: Uuid) -> Result<InFlightGuard<'_>, DomainError> {
        let mut owners = self.owners.lock().unwrap_or_else(PoisonError::into_inner);
        if !owners.insert(owner_id) {
            return Err(DomainError::CheckoutInProgress);
        }
        Ok(InFlightGuard {
            registry: self,
            owner_id,
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry
            .owners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.owner_id);
    }
}

#[derive(Clone)]
pub struct CheckoutService {
    carts: Arc<dyn CartRepository>,
    orders: Arc<dyn OrderRepository>,
    events: EventBus,
    mode: CheckoutMode,
    in_flight: Arc<InFlight>,
}

impl CheckoutService {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        orders: Arc<dyn OrderRepository>,
        events: EventBus,
        mode: CheckoutMode,
    ) -> Self {
        Self {
            carts,
            orders,
            events,
            mode,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Number of lines currently in the owner's cart, for the review step.
    pub fn cart_line_count(&self, identity: Option<&Identity>) -> Result<usize, DomainError> {
        let owner_id = require(identity)?;
        Ok(self.carts.read_lines(owner_id)?.len())
    }

    /// Turn the owner's cart into a pending order.
    ///
    /// The cart is re-read here, so the total reflects prices and quantities
    /// at placement time rather than when the review step was shown.
    pub fn place_order(
        &self,
        identity: Option<&Identity>,
        flow: &CheckoutFlow,
    ) -> Result<PlacedOrder, DomainError> {
        let owner_id = require(identity)?;
        flow.ready_to_place()?;
        let _guard = self.in_flight.acquire(owner_id)?;

        let items = self.carts.read_lines(owner_id)?;
        let mut lines = Vec::with_capacity(items.len());
        for item in &items {
            match &item.product {
                Some(product) => lines.push(OrderLineDraft {
                    product_id: product.id,
                    quantity: item.line.quantity,
                    price: product.price.clone(),
                }),
                None => log::warn!(
                    "skipping cart line {} for owner {}: product {} no longer resolves",
                    item.line.id,
                    owner_id,
                    item.line.product_id
                ),
            }
        }
        if lines.is_empty() {
            return Err(DomainError::validation(EMPTY_CART_MESSAGE));
        }

        let order = NewOrder {
            owner_id,
            total_amount: total_amount(&items),
            shipping_address: flow.address().clone(),
            payment_method: flow.payment_method(),
        };

        let order_id = match self.mode {
            CheckoutMode::Sequential => self.place_sequentially(&order, &lines)?,
            CheckoutMode::Atomic => self.orders.place_atomically(&order, &lines)?,
        };

        log::info!(
            "order {} placed for owner {} ({} lines, total {})",
            order_id,
            owner_id,
            lines.len(),
            order.total_amount
        );
        self.events.publish(StoreEvent::CartChanged { owner_id });
        self.events
            .publish(StoreEvent::OrderPlaced { owner_id, order_id });

        Ok(PlacedOrder {
            order_id,
            total_amount: order.total_amount,
        })
    }

    fn place_sequentially(
        &self,
        order: &NewOrder,
        lines: &[OrderLineDraft],
    ) -> Result<Uuid, DomainError> {
        let order_id = self.orders.create_order(order)?;
        self.orders
            .create_order_lines(order_id, lines)
            .map_err(|e| partial(order_id, CheckoutStage::OrderLines, e))?;
        self.carts
            .delete_all(order.owner_id)
            .map_err(|e| partial(order_id, CheckoutStage::CartClear, e))?;
        Ok(order_id)
    }

    pub fn orders_for(&self, identity: Option<&Identity>) -> Result<Vec<OrderView>, DomainError> {
        let owner_id = require(identity)?;
        self.orders.list_for_owner(owner_id)
    }

    pub fn order(&self, identity: Option<&Identity>, id: Uuid) -> Result<OrderView, DomainError> {
        let owner_id = require(identity)?;
        self.orders
            .find_for_owner(owner_id, id)?
            .ok_or(DomainError::NotFound)
    }
}

fn partial(order_id: Uuid, stage: CheckoutStage, source: DomainError) -> DomainError {
    log::error!(
        "partial checkout: order {} is committed but the {} write failed: {}",
        order_id,
        stage,
        source
    );
    DomainError::PartialCheckout {
        order_id,
        stage,
        source: Box::new(source),
    }
}

fn require(identity: Option<&Identity>) -> Result<Uuid, DomainError> {
    identity
        .map(|i| i.user_id)
        .ok_or(DomainError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::cart::format_amount;
    use crate::domain::order::{OrderStatus, PaymentMethod, ShippingAddress};
    use crate::infrastructure::memory::{fixtures, FailPoint, InMemoryStore};

    struct Harness {
        store: Arc<InMemoryStore>,
        svc: CheckoutService,
        identity: Identity,
    }

    fn harness(mode: CheckoutMode) -> Harness {
        let store = Arc::new(InMemoryStore::with_sample_catalog());
        let svc = CheckoutService::new(store.clone(), store.clone(), EventBus::new(), mode);
        Harness {
            store,
            svc,
            identity: Identity {
                user_id: Uuid::new_v4(),
                email: "fern@example.com".to_string(),
            },
        }
    }

    fn confirmed_flow() -> CheckoutFlow {
        let mut flow = CheckoutFlow::new();
        flow.continue_to_address(1).expect("review");
        flow.submit_address(ShippingAddress {
            street: "1 Fern Lane".to_string(),
            city: "Portland".to_string(),
            state: "OR".to_string(),
            postal_code: "97201".to_string(),
            country: "US".to_string(),
        })
        .expect("address");
        flow.submit_payment(Some(PaymentMethod::Paypal))
            .expect("payment");
        flow
    }

    fn fill_cart(h: &Harness) {
        let owner = h.identity.user_id;
        h.store
            .upsert_line(owner, fixtures::ZZ_PLANT, 1)
            .expect("zz");
        let snake = h
            .store
            .upsert_line(owner, fixtures::SNAKE_PLANT, 1)
            .expect("snake");
        h.store
            .update_quantity(owner, snake.id, 3)
            .expect("qty");
    }

    fn line_sum(order: &OrderView) -> BigDecimal {
        order
            .lines
            .iter()
            .map(|l| &l.price * BigDecimal::from(l.quantity))
            .fold(BigDecimal::from(0), |acc, x| acc + x)
    }

    #[test]
    fn completing_checkout_creates_one_order_and_empties_cart() {
        let h = harness(CheckoutMode::Sequential);
        fill_cart(&h);

        let placed = h
            .svc
            .place_order(Some(&h.identity), &confirmed_flow())
            .expect("place");

        // 39.99 + 3 * 24.99
        assert_eq!(format_amount(&placed.total_amount), "114.96");

        let orders = h.svc.orders_for(Some(&h.identity)).expect("orders");
        assert_eq!(orders.len(), 1);
        let order = &orders[0];
        assert_eq!(order.id, placed.order_id);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_method, Some(PaymentMethod::Paypal));
        assert_eq!(order.total_amount, placed.total_amount);
        assert_eq!(line_sum(order), placed.total_amount);
        assert!(h
            .store
            .read_lines(h.identity.user_id)
            .expect("cart")
            .is_empty());
    }

    #[test]
    fn total_is_computed_at_placement_time() {
        let h = harness(CheckoutMode::Sequential);
        let owner = h.identity.user_id;
        let line = h
            .store
            .upsert_line(owner, fixtures::ZZ_PLANT, 1)
            .expect("zz");
        let flow = confirmed_flow();

        h.store.update_quantity(owner, line.id, 2).expect("drift");

        let placed = h.svc.place_order(Some(&h.identity), &flow).expect("place");
        assert_eq!(format_amount(&placed.total_amount), "79.98");
    }

    #[test]
    fn placement_requires_confirm_step() {
        let h = harness(CheckoutMode::Sequential);
        fill_cart(&h);
        let err = h
            .svc
            .place_order(Some(&h.identity), &CheckoutFlow::new())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(h.svc.orders_for(Some(&h.identity)).expect("orders").is_empty());
    }

    #[test]
    fn placement_requires_identity() {
        let h = harness(CheckoutMode::Sequential);
        assert!(matches!(
            h.svc.place_order(None, &confirmed_flow()),
            Err(DomainError::Unauthenticated)
        ));
    }

    #[test]
    fn empty_cart_cannot_be_placed() {
        let h = harness(CheckoutMode::Sequential);
        let err = h
            .svc
            .place_order(Some(&h.identity), &confirmed_flow())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn sequential_line_failure_leaves_order_without_lines() {
        let h = harness(CheckoutMode::Sequential);
        fill_cart(&h);
        h.store.fail_on(FailPoint::CreateOrderLines);

        let err = h
            .svc
            .place_order(Some(&h.identity), &confirmed_flow())
            .unwrap_err();

        let DomainError::PartialCheckout {
            order_id, stage, ..
        } = &err
        else {
            panic!("expected partial checkout, got {err:?}");
        };
        assert_eq!(*stage, CheckoutStage::OrderLines);

        let orders = h.svc.orders_for(Some(&h.identity)).expect("orders");
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, *order_id);
        assert!(orders[0].lines.is_empty());
        assert_eq!(
            h.store.read_lines(h.identity.user_id).expect("cart").len(),
            2
        );
    }

    #[test]
    fn sequential_cart_clear_failure_is_partial() {
        let h = harness(CheckoutMode::Sequential);
        fill_cart(&h);
        h.store.fail_on(FailPoint::DeleteAllCartLines);

        let err = h
            .svc
            .place_order(Some(&h.identity), &confirmed_flow())
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::PartialCheckout {
                stage: CheckoutStage::CartClear,
                ..
            }
        ));
        let orders = h.svc.orders_for(Some(&h.identity)).expect("orders");
        assert_eq!(orders[0].lines.len(), 2);
    }

    #[test]
    fn atomic_line_failure_rolls_everything_back() {
        let h = harness(CheckoutMode::Atomic);
        fill_cart(&h);
        h.store.fail_on(FailPoint::CreateOrderLines);

        let err = h
            .svc
            .place_order(Some(&h.identity), &confirmed_flow())
            .unwrap_err();

        assert!(matches!(err, DomainError::Remote(_)));
        assert!(h.svc.orders_for(Some(&h.identity)).expect("orders").is_empty());
        assert_eq!(
            h.store.read_lines(h.identity.user_id).expect("cart").len(),
            2
        );
    }

    #[test]
    fn atomic_success_matches_sequential() {
        let h = harness(CheckoutMode::Atomic);
        fill_cart(&h);
        let placed = h
            .svc
            .place_order(Some(&h.identity), &confirmed_flow())
            .expect("place");
        let order = h.svc.order(Some(&h.identity), placed.order_id).expect("order");
        assert_eq!(line_sum(&order), placed.total_amount);
        assert!(h
            .store
            .read_lines(h.identity.user_id)
            .expect("cart")
            .is_empty());
    }

    #[test]
    fn concurrent_placement_is_refused() {
        let h = harness(CheckoutMode::Sequential);
        fill_cart(&h);

        let held = h.svc.in_flight.acquire(h.identity.user_id).expect("first");
        let err = h
            .svc
            .place_order(Some(&h.identity), &confirmed_flow())
            .unwrap_err();
        assert!(matches!(err, DomainError::CheckoutInProgress));
        drop(held);

        h.svc
            .place_order(Some(&h.identity), &confirmed_flow())
            .expect("placement after release");
    }

    #[test]
    fn in_flight_guard_releases_on_error() {
        let h = harness(CheckoutMode::Sequential);
        fill_cart(&h);
        h.store.fail_on(FailPoint::CreateOrder);

        assert!(h
            .svc
            .place_order(Some(&h.identity), &confirmed_flow())
            .is_err());
        assert!(h.svc.in_flight.acquire(h.identity.user_id).is_ok());
    }

    #[test]
    fn orders_of_other_owners_are_hidden() {
        let h = harness(CheckoutMode::Sequential);
        fill_cart(&h);
        let placed = h
            .svc
            .place_order(Some(&h.identity), &confirmed_flow())
            .expect("place");
        let other = Identity {
            user_id: Uuid::new_v4(),
            email: "other@example.com".to_string(),
        };
        assert!(matches!(
            h.svc.order(Some(&other), placed.order_id),
            Err(DomainError::NotFound)
        ));
    }

    #[test]
    fn checkout_mode_parses_case_insensitively() {
        assert_eq!("ATOMIC".parse::<CheckoutMode>(), Ok(CheckoutMode::Atomic));
        assert_eq!(
            "sequential".parse::<CheckoutMode>(),
            Ok(CheckoutMode::Sequential)
        );
        assert!("eventually".parse::<CheckoutMode>().is_err());
    }
}
