//! # Checkout
//!
//! Two-phase commit of a cart against the order-persistence service.
//!
//! ## State Machine (one invocation)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ──► Validating ──► HeaderCommitted ──► LinesCommitted (success) │
//! │                │                 │                                      │
//! │                │                 └──► Failed(PartialCommit)             │
//! │                │                                                        │
//! │                └──► Failed(EmptyCart | Unauthenticated                  │
//! │                            | OrderCreationFailed)                       │
//! │                                                                         │
//! │   Cart while the calls are in flight: empty (optimistic)               │
//! │   Cart after success:                 empty                            │
//! │   Cart after ANY failure:             original lines, verbatim         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is retried automatically. A retry after `PartialCommit` is a new
//! attempt with a new [`AttemptId`]; the orphaned header is never reused.
//!
//! A run whose future is dropped while the lines call is in flight stays in
//! `HeaderCommitted` and keeps the header's [`OrderId`], so the orphan can
//! still be found and voided.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::cart::{Cart, CartSnapshot};
use crate::error::{CheckoutError, CheckoutResult};
use crate::money::Money;
use crate::ports::{IdentityProvider, OrderPersistence};
use crate::types::{
    AttemptId, CommittedOrder, NewOrderHeader, OrderId, OrderLine, OrderStatus, PaymentMethod,
    PaymentStatus,
};

// =============================================================================
// Phases
// =============================================================================

/// Where a checkout invocation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase", content = "failure")]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Validating,
    HeaderCommitted,
    LinesCommitted,
    Failed(CheckoutFailure),
}

impl CheckoutPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutPhase::LinesCommitted | CheckoutPhase::Failed(_))
    }
}

/// Which failure ended a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutFailure {
    EmptyCart,
    Unauthenticated,
    OrderCreationFailed,
    PartialCommit,
}

impl From<&CheckoutError> for CheckoutFailure {
    fn from(err: &CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => CheckoutFailure::EmptyCart,
            CheckoutError::Unauthenticated => CheckoutFailure::Unauthenticated,
            CheckoutError::OrderCreationFailed { .. } => CheckoutFailure::OrderCreationFailed,
            CheckoutError::PartialCommit { .. } => CheckoutFailure::PartialCommit,
        }
    }
}

// =============================================================================
// Pending Order
// =============================================================================

/// The order a checkout is about to commit, built from a cart snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingOrder {
    pub attempt_id: AttemptId,
    pub staff_id: String,
    pub payment_method: PaymentMethod,
    pub total_amount: Money,
    pub lines: Vec<OrderLine>,
}

impl PendingOrder {
    /// Builds the order from captured cart lines.
    ///
    /// Prices come from the lines themselves (frozen at add time), never
    /// from the catalog.
    pub fn from_snapshot(
        snapshot: &CartSnapshot,
        staff_id: String,
        payment_method: PaymentMethod,
    ) -> Self {
        PendingOrder {
            attempt_id: AttemptId::new(),
            staff_id,
            payment_method,
            total_amount: snapshot.total(),
            lines: snapshot.lines().iter().map(|l| l.to_order_line()).collect(),
        }
    }

    /// The header sent in step 1. A till sale is settled on the spot.
    pub fn header(&self) -> NewOrderHeader {
        NewOrderHeader {
            attempt_id: self.attempt_id,
            staff_id: self.staff_id.clone(),
            total_amount: self.total_amount,
            payment_method: self.payment_method,
            status: OrderStatus::Completed,
            payment_status: PaymentStatus::Completed,
        }
    }
}

// =============================================================================
// Checkout Run
// =============================================================================

/// One checkout invocation and the phases it walked through.
#[derive(Debug, Clone, Default)]
pub struct CheckoutRun {
    phase: CheckoutPhase,
    history: Vec<CheckoutPhase>,
    attempt_id: Option<AttemptId>,
    order_id: Option<OrderId>,
}

impl CheckoutRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    /// Phases entered so far, in order, excluding `Idle`.
    pub fn history(&self) -> &[CheckoutPhase] {
        &self.history
    }

    /// The attempt id, once the pending order has been built.
    pub fn attempt_id(&self) -> Option<AttemptId> {
        self.attempt_id
    }

    /// The order id returned by the header call, once it succeeded.
    pub fn order_id(&self) -> Option<&OrderId> {
        self.order_id.as_ref()
    }

    /// The header left without lines by a run that never finished.
    ///
    /// Only a run stopped in `HeaderCommitted` qualifies; a run that reached
    /// `Failed(PartialCommit)` already reported its order id in the error.
    pub fn interrupted_order(&self) -> Option<&OrderId> {
        match self.phase {
            CheckoutPhase::HeaderCommitted => self.order_id.as_ref(),
            _ => None,
        }
    }

    /// Closes an interrupted run as a partial commit once its header has
    /// been dealt with. Any other run is left alone.
    pub fn close_interrupted(&mut self) {
        if self.phase == CheckoutPhase::HeaderCommitted {
            self.advance(CheckoutPhase::Failed(CheckoutFailure::PartialCommit));
        }
    }

    /// Drives the state machine to a terminal phase.
    ///
    /// ## Steps
    /// 1. Reject an empty cart, then resolve the staff member. Neither
    ///    failure reaches the order service.
    /// 2. Optimistically empty the cart and build the [`PendingOrder`].
    /// 3. Create the header. Failure: `OrderCreationFailed`.
    /// 4. Create the lines under the returned order id. Failure:
    ///    `PartialCommit`, the header now exists without lines.
    /// 5. Keep the cart empty and return the committed order.
    ///
    /// On every failure the cart gets its original lines back.
    pub async fn execute(
        &mut self,
        cart: &mut Cart,
        payment_method: PaymentMethod,
        identity: &dyn IdentityProvider,
        orders: &dyn OrderPersistence,
    ) -> CheckoutResult<CommittedOrder> {
        self.advance(CheckoutPhase::Validating);

        if cart.is_empty() {
            return Err(self.fail(CheckoutError::EmptyCart));
        }

        let staff_id = match identity.current_user_id().await {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(self.fail(CheckoutError::Unauthenticated)),
        };

        let pending_clear = cart.begin_clear();
        let pending = PendingOrder::from_snapshot(pending_clear.snapshot(), staff_id, payment_method);
        let attempt_id = pending.attempt_id;
        self.attempt_id = Some(attempt_id);

        debug!(
            attempt_id = %attempt_id,
            staff_id = %pending.staff_id,
            total = %pending.total_amount,
            lines = pending.lines.len(),
            "Creating order header"
        );

        let order_id = match orders.create_order_header(pending.header()).await {
            Ok(order_id) => order_id,
            Err(e) => {
                pending_clear.rollback();
                warn!(attempt_id = %attempt_id, error = %e, "Order header rejected");
                return Err(self.fail(CheckoutError::OrderCreationFailed {
                    attempt_id,
                    reason: e.to_string(),
                }));
            }
        };

        self.order_id = Some(order_id.clone());
        self.advance(CheckoutPhase::HeaderCommitted);

        if let Err(e) = orders.create_order_lines(&order_id, &pending.lines).await {
            pending_clear.rollback();
            error!(
                attempt_id = %attempt_id,
                order_id = %order_id,
                error = %e,
                "Order lines failed after header was created; order needs reconciling"
            );
            return Err(self.fail(CheckoutError::PartialCommit {
                order_id,
                attempt_id,
                reason: e.to_string(),
            }));
        }

        pending_clear.commit();
        self.advance(CheckoutPhase::LinesCommitted);

        info!(
            attempt_id = %attempt_id,
            order_id = %order_id,
            total = %pending.total_amount,
            payment_method = %payment_method,
            "Order committed"
        );

        Ok(CommittedOrder {
            order_id,
            attempt_id,
            total_amount: pending.total_amount,
            payment_method,
            line_count: pending.lines.len(),
            committed_at: Utc::now(),
        })
    }

    fn advance(&mut self, next: CheckoutPhase) {
        debug!(from = ?self.phase, to = ?next, "Checkout phase");
        self.phase = next;
        self.history.push(next);
    }

    fn fail(&mut self, err: CheckoutError) -> CheckoutError {
        self.advance(CheckoutPhase::Failed(CheckoutFailure::from(&err)));
        err
    }
}

/// Runs a single checkout without keeping the phase history.
pub async fn checkout(
    cart: &mut Cart,
    payment_method: PaymentMethod,
    identity: &dyn IdentityProvider,
    orders: &dyn OrderPersistence,
) -> CheckoutResult<CommittedOrder> {
    CheckoutRun::new()
        .execute(cart, payment_method, identity, orders)
        .await
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::types::{OrderId, Product};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Staff(Option<&'static str>);

    #[async_trait]
    impl IdentityProvider for Staff {
        async fn current_user_id(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[derive(Default)]
    struct ScriptedOrders {
        fail_header: bool,
        fail_lines: bool,
        header_calls: AtomicUsize,
        line_calls: AtomicUsize,
        headers: Mutex<Vec<NewOrderHeader>>,
        lines: Mutex<Vec<(OrderId, Vec<OrderLine>)>>,
    }

    #[async_trait]
    impl OrderPersistence for ScriptedOrders {
        async fn create_order_header(
            &self,
            header: NewOrderHeader,
        ) -> Result<OrderId, ServiceError> {
            let n = self.header_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_header {
                return Err(ServiceError::Unavailable("timeout".to_string()));
            }
            self.headers.lock().unwrap().push(header);
            Ok(OrderId::new(format!("order-{}", n + 1)))
        }

        async fn create_order_lines(
            &self,
            order_id: &OrderId,
            lines: &[OrderLine],
        ) -> Result<(), ServiceError> {
            self.line_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_lines {
                return Err(ServiceError::Rejected("constraint violation".to_string()));
            }
            self.lines
                .lock()
                .unwrap()
                .push((order_id.clone(), lines.to_vec()));
            Ok(())
        }
    }

    fn filled_cart() -> Cart {
        let mut cart = Cart::new();
        let bread = Product::new("bread", "Bread", Money::from_cents(250), 10);
        let milk = Product::new("milk", "Milk", Money::from_cents(100), 10);
        cart.add_item(&bread, 10).unwrap();
        cart.set_quantity("bread", 3, 10).unwrap();
        cart.add_item(&milk, 10).unwrap();
        cart
    }

    #[tokio::test]
    async fn test_successful_checkout_clears_cart() {
        let mut cart = filled_cart();
        let orders = ScriptedOrders::default();
        let mut run = CheckoutRun::new();

        let order = run
            .execute(&mut cart, PaymentMethod::Card, &Staff(Some("staff-1")), &orders)
            .await
            .unwrap();

        assert!(cart.is_empty());
        assert_eq!(order.order_id, OrderId::new("order-1"));
        assert_eq!(order.total_amount, Money::from_cents(850));
        assert_eq!(order.line_count, 2);
        assert_eq!(
            run.history(),
            [
                CheckoutPhase::Validating,
                CheckoutPhase::HeaderCommitted,
                CheckoutPhase::LinesCommitted
            ]
        );

        let headers = orders.headers.lock().unwrap();
        assert_eq!(headers[0].staff_id, "staff-1");
        assert_eq!(headers[0].total_amount, Money::from_cents(850));
        assert_eq!(headers[0].payment_method, PaymentMethod::Card);
        assert_eq!(headers[0].status, OrderStatus::Completed);
        assert_eq!(headers[0].attempt_id, order.attempt_id);

        let lines = orders.lines.lock().unwrap();
        assert_eq!(lines[0].0, order.order_id);
        assert_eq!(
            lines[0].1,
            vec![
                OrderLine {
                    product_id: "bread".to_string(),
                    quantity: 3,
                    price_at_checkout: Money::from_cents(250),
                },
                OrderLine {
                    product_id: "milk".to_string(),
                    quantity: 1,
                    price_at_checkout: Money::from_cents(100),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_line_failure_is_partial_commit_and_keeps_cart() {
        let mut cart = filled_cart();
        let before = cart.snapshot();
        let orders = ScriptedOrders {
            fail_lines: true,
            ..Default::default()
        };
        let mut run = CheckoutRun::new();

        let err = run
            .execute(&mut cart, PaymentMethod::Cash, &Staff(Some("staff-1")), &orders)
            .await
            .unwrap_err();

        match &err {
            CheckoutError::PartialCommit { order_id, .. } => {
                assert_eq!(order_id, &OrderId::new("order-1"));
            }
            other => panic!("expected PartialCommit, got {:?}", other),
        }
        assert_eq!(orders.header_calls.load(Ordering::SeqCst), 1);
        assert_eq!(orders.line_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cart.snapshot(), before);
        assert_eq!(
            run.phase(),
            CheckoutPhase::Failed(CheckoutFailure::PartialCommit)
        );
        assert!(run.history().contains(&CheckoutPhase::HeaderCommitted));
    }

    #[tokio::test]
    async fn test_header_failure_keeps_cart_and_skips_lines() {
        let mut cart = filled_cart();
        let before = cart.snapshot();
        let orders = ScriptedOrders {
            fail_header: true,
            ..Default::default()
        };

        let err = checkout(&mut cart, PaymentMethod::Cash, &Staff(Some("staff-1")), &orders)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::OrderCreationFailed { .. }));
        assert!(!err.left_external_effects());
        assert_eq!(orders.line_calls.load(Ordering::SeqCst), 0);
        assert_eq!(cart.snapshot(), before);
    }

    #[tokio::test]
    async fn test_empty_cart_makes_no_external_call() {
        let mut cart = Cart::new();
        let orders = ScriptedOrders::default();
        let mut run = CheckoutRun::new();

        let err = run
            .execute(&mut cart, PaymentMethod::Cash, &Staff(Some("staff-1")), &orders)
            .await
            .unwrap_err();

        assert_eq!(err, CheckoutError::EmptyCart);
        assert_eq!(orders.header_calls.load(Ordering::SeqCst), 0);
        assert_eq!(run.phase(), CheckoutPhase::Failed(CheckoutFailure::EmptyCart));
        assert!(run.attempt_id().is_none());
    }

    #[tokio::test]
    async fn test_unauthenticated_makes_no_order_call() {
        let mut cart = filled_cart();
        let before = cart.snapshot();
        let orders = ScriptedOrders::default();

        for staff in [Staff(None), Staff(Some("  "))] {
            let err = checkout(&mut cart, PaymentMethod::Cash, &staff, &orders)
                .await
                .unwrap_err();
            assert_eq!(err, CheckoutError::Unauthenticated);
        }

        assert_eq!(orders.header_calls.load(Ordering::SeqCst), 0);
        assert_eq!(cart.snapshot(), before);
    }

    #[tokio::test]
    async fn test_retry_after_partial_commit_is_new_attempt() {
        let mut cart = filled_cart();
        let failing = ScriptedOrders {
            fail_lines: true,
            ..Default::default()
        };
        let first = checkout(&mut cart, PaymentMethod::Cash, &Staff(Some("s")), &failing)
            .await
            .unwrap_err();
        let first_attempt = match first {
            CheckoutError::PartialCommit { attempt_id, .. } => attempt_id,
            other => panic!("expected PartialCommit, got {:?}", other),
        };

        let healthy = ScriptedOrders::default();
        let order = checkout(&mut cart, PaymentMethod::Cash, &Staff(Some("s")), &healthy)
            .await
            .unwrap();

        assert_ne!(order.attempt_id, first_attempt);
        assert_eq!(healthy.header_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_order_id_recorded_after_header() {
        let mut cart = filled_cart();
        let orders = ScriptedOrders {
            fail_lines: true,
            ..Default::default()
        };
        let mut run = CheckoutRun::new();
        let _ = run
            .execute(&mut cart, PaymentMethod::Cash, &Staff(Some("staff-1")), &orders)
            .await;

        assert_eq!(run.order_id(), Some(&OrderId::new("order-1")));
        assert_eq!(run.interrupted_order(), None);

        run.close_interrupted();
        assert_eq!(run.phase(), CheckoutPhase::Failed(CheckoutFailure::PartialCommit));
        assert_eq!(run.history().len(), 3);
    }

    #[test]
    fn test_pending_order_uses_frozen_prices() {
        let cart = filled_cart();
        let pending =
            PendingOrder::from_snapshot(&cart.snapshot(), "staff".to_string(), PaymentMethod::Cash);

        assert_eq!(pending.total_amount, Money::from_cents(850));
        assert_eq!(pending.lines[0].price_at_checkout, Money::from_cents(250));
        assert_eq!(pending.header().payment_status, PaymentStatus::Completed);
    }

    #[test]
    fn test_phase_serializes_with_failure() {
        let json =
            serde_json::to_string(&CheckoutPhase::Failed(CheckoutFailure::PartialCommit)).unwrap();
        assert_eq!(json, r#"{"phase":"failed","failure":"partial_commit"}"#);

        let json = serde_json::to_string(&CheckoutPhase::Idle).unwrap();
        assert_eq!(json, r#"{"phase":"idle"}"#);
    }
}
