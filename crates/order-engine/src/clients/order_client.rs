//! # Order Client
//!
//! Provides a high‑level API for interacting with the `Order` actor.
//! It wraps a `ResourceClient<Order>` and exposes the operations the role
//! panels use: creation at the counter, status moves in the kitchen, payment
//! and packing confirmation, and the read accessors every panel renders from.
use crate::model::{Order, OrderCreate, OrderId, OrderStatus, Transition};
use crate::order_actor::{OrderAction, OrderActionResult, OrderError};
use async_trait::async_trait;
use snapshot_actor::{ActorClient, FrameworkError, ResourceClient, Signal};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

/// Client for interacting with the Order actor.
///
/// Clones share one actor. Reads are answered from the actor's in-memory
/// snapshot; none of them touch the store.
#[derive(Clone, Debug)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, params), fields(lines = params.cart.len()))]
    pub async fn create_order(&self, params: OrderCreate) -> Result<OrderId, OrderError> {
        debug!(?params, "create_order called");
        let id = self.inner.create(params).await.map_err(Self::map_error)?;
        info!(order_id = %id, "Order placed");
        Ok(id)
    }

    /// Moves an order forward. Duplicate or backward requests come back as
    /// [`Transition::Ignored`] rather than an error.
    #[instrument(skip(self))]
    pub async fn transition_status(&self, id: OrderId, status: OrderStatus) -> Result<Transition, OrderError> {
        match self.act(id, OrderAction::TransitionStatus(status)).await? {
            OrderActionResult::TransitionStatus(transition) => Ok(transition),
            other => Err(unexpected(other)),
        }
    }

    #[instrument(skip(self))]
    pub async fn confirm_payment(&self, id: OrderId) -> Result<(), OrderError> {
        match self.act(id, OrderAction::ConfirmPayment).await? {
            OrderActionResult::ConfirmPayment(_) => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Returns `false` when the order was already packed or is not ready yet.
    #[instrument(skip(self))]
    pub async fn mark_packed(&self, id: OrderId) -> Result<bool, OrderError> {
        match self.act(id, OrderAction::MarkPacked).await? {
            OrderActionResult::MarkPacked(changed) => Ok(changed),
            other => Err(unexpected(other)),
        }
    }

    /// Runs the packing sweep now instead of waiting for the interval.
    /// Returns how many orders became packed.
    pub async fn sweep(&self) -> Result<usize, OrderError> {
        self.inner.tick().await.map_err(Self::map_error)
    }

    /// Replaces the actor's collection with the stored snapshot.
    pub async fn reload(&self) -> Result<usize, OrderError> {
        self.inner.reload().await.map_err(Self::map_error)
    }

    pub async fn by_status(&self, status: OrderStatus) -> Result<Vec<Order>, OrderError> {
        self.inner
            .query(move |order: &Order| order.status == status)
            .await
            .map_err(Self::map_error)
    }

    pub async fn by_id(&self, id: OrderId) -> Result<Option<Order>, OrderError> {
        self.get(id).await
    }

    /// Lookup by the customer-facing code. Codes repeat once ids wrap around
    /// their six base-36 digits; the newest order wins.
    pub async fn by_public_code(&self, code: &str) -> Result<Option<Order>, OrderError> {
        let code = code.trim().to_string();
        let mut matches = self
            .inner
            .query(move |order: &Order| order.matches_code(&code))
            .await
            .map_err(Self::map_error)?;
        Ok(matches.pop())
    }

    /// Same-context change notifications, including persistence warnings.
    pub fn changes(&self) -> broadcast::Receiver<Signal> {
        self.subscribe()
    }

    async fn act(&self, id: OrderId, action: OrderAction) -> Result<OrderActionResult, OrderError> {
        debug!(order_id = %id, ?action, "Sending action");
        self.inner
            .perform_action(id, action)
            .await
            .map_err(Self::map_error)
    }
}

fn unexpected(result: OrderActionResult) -> OrderError {
    OrderError::ActorCommunication(format!("unexpected action result: {result:?}"))
}

#[async_trait]
impl ActorClient<Order> for OrderClient {
    type Error = OrderError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    /// Entity errors travel boxed through the actor; unbox them so callers
    /// see the original [`OrderError`].
    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::NotFound(id) => OrderError::NotFound(id),
            FrameworkError::EntityError(inner) => match inner.downcast::<OrderError>() {
                Ok(order_error) => *order_error,
                Err(other) => OrderError::ActorCommunication(other.to_string()),
            },
            FrameworkError::Storage(store) => OrderError::Persistence(store.to_string()),
            e @ (FrameworkError::ActorClosed | FrameworkError::ActorDropped) => {
                OrderError::ActorCommunication(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, CartItem, CustomerSnapshot, PaymentIntent, PaymentMethod, PaymentStatus};
    use snapshot_actor::mock::MockClient;
    use snapshot_actor::{StoreError, Timestamp};
    use std::time::Duration;

    const T0: Timestamp = Timestamp(1_700_000_000_000);

    fn order(id: u64, status: OrderStatus) -> Order {
        let params = OrderCreate {
            customer: CustomerSnapshot {
                name: "Carmen".into(),
                phone: "809-555-0123".into(),
                address: Address {
                    street: "27 de Febrero".into(),
                    number: "101".into(),
                    sector: "Bella Vista".into(),
                    city: "Santo Domingo".into(),
                },
                references: None,
            },
            cart: vec![CartItem::new("Chicharrón", 40_000, 1, 20)],
            payment: PaymentIntent {
                method: PaymentMethod::Transfer,
                status: PaymentStatus::Due,
                due_method: None,
            },
            route: None,
        };
        let mut order = Order::new(OrderId(id), params, T0);
        order.advance(status, T0, Duration::from_secs(90));
        order
    }

    #[tokio::test]
    async fn by_status_filters_through_the_query() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_query().return_records(vec![
            order(1, OrderStatus::Pending),
            order(2, OrderStatus::Cooking),
            order(3, OrderStatus::Cooking),
        ]);
        let client = OrderClient::new(mock.client());

        let cooking = client.by_status(OrderStatus::Cooking).await.unwrap();
        assert_eq!(cooking.iter().map(|o| o.id).collect::<Vec<_>>(), vec![OrderId(2), OrderId(3)]);
        mock.verify();
    }

    #[tokio::test]
    async fn public_code_lookup_prefers_the_newest_match() {
        // Both ids share their low six base-36 digits.
        let older = order(5, OrderStatus::Delivered);
        let newer = order(5 + 36u64.pow(6), OrderStatus::Pending);
        assert_eq!(older.public_code, newer.public_code);

        let mut mock = MockClient::<Order>::new();
        mock.expect_query().return_records(vec![older, newer.clone(), order(7, OrderStatus::Ready)]);
        let client = OrderClient::new(mock.client());

        let found = client.by_public_code(" 000005 ").await.unwrap();
        assert_eq!(found.map(|o| o.id), Some(newer.id));
        mock.verify();
    }

    #[tokio::test]
    async fn transition_results_pass_through() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_action(OrderId(9))
            .return_ok(OrderActionResult::TransitionStatus(Transition::Ignored));
        let client = OrderClient::new(mock.client());

        let result = client.transition_status(OrderId(9), OrderStatus::Pending).await;
        assert_eq!(result, Ok(Transition::Ignored));
        mock.verify();
    }

    #[tokio::test]
    async fn mismatched_results_are_reported_not_panicked() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_action(OrderId(9)).return_ok(OrderActionResult::MarkPacked(true));
        let client = OrderClient::new(mock.client());

        let result = client.confirm_payment(OrderId(9)).await;
        assert!(matches!(result, Err(OrderError::ActorCommunication(msg)) if msg.contains("MarkPacked")));
    }

    #[tokio::test]
    async fn framework_errors_map_to_order_errors() {
        let mut mock = MockClient::<Order>::new();
        mock.expect_action(OrderId(1))
            .return_err(FrameworkError::NotFound(OrderId(1).to_string()));
        mock.expect_create().return_err(FrameworkError::EntityError(Box::new(
            OrderError::Validation("cart is empty".into()),
        )));
        mock.expect_get(OrderId(2)).return_err(FrameworkError::ActorClosed);
        let client = OrderClient::new(mock.client());

        assert_eq!(
            client.mark_packed(OrderId(1)).await,
            Err(OrderError::NotFound("order_1".into()))
        );
        let create = client.create_order(order_payload()).await;
        assert_eq!(create, Err(OrderError::Validation("cart is empty".into())));
        assert!(matches!(client.by_id(OrderId(2)).await, Err(OrderError::ActorCommunication(_))));
        mock.verify();

        let storage = OrderClient::map_error(FrameworkError::Storage(StoreError::InvalidKey("?".into())));
        assert!(matches!(storage, OrderError::Persistence(_)));
    }

    #[tokio::test]
    async fn changes_forwards_actor_signals() {
        let mock = MockClient::<Order>::new();
        let client = OrderClient::new(mock.client());
        let mut changes = client.changes();

        mock.signal(Signal::PersistenceWarning("quota".into()));
        assert_eq!(changes.recv().await.unwrap(), Signal::PersistenceWarning("quota".into()));
    }

    fn order_payload() -> OrderCreate {
        let template = order(1, OrderStatus::Pending);
        OrderCreate {
            customer: template.customer,
            cart: Vec::new(),
            payment: PaymentIntent {
                method: PaymentMethod::Cash,
                status: PaymentStatus::Due,
                due_method: None,
            },
            route: None,
        }
    }
}
