//! Entity trait implementation for the Order domain type.
//!
//! This module wires [`Order`] into the generic
//! [`ResourceActor`](snapshot_actor::ResourceActor):
//!
//! - creation validates the payload; when no route came with it, the routing
//!   collaborator is consulted in the background once the order is stored,
//! - actions drive the status machine, payment/packing flags and late routes,
//! - the tick hook is the packing sweep.

use super::{OrderAction, OrderActionResult, OrderContext, OrderError};
use crate::model::{Order, OrderCreate, OrderId};
use async_trait::async_trait;
use snapshot_actor::{ActorEntity, FollowUp, Timestamp};
use tracing::debug;

#[async_trait]
impl ActorEntity for Order {
    type Id = OrderId;
    type Create = OrderCreate;
    type Action = OrderAction;
    type ActionResult = OrderActionResult;
    type Context = OrderContext;
    type Error = OrderError;

    fn id(&self) -> OrderId {
        self.id
    }

    /// Rejects the payload unless the cart has lines with a quantity and the
    /// customer has a name, phone, street and number.
    fn from_create_params(id: OrderId, params: OrderCreate, now: Timestamp) -> Result<Self, OrderError> {
        validate(&params)?;
        Ok(Order::new(id, params, now))
    }

    /// Route lookup for orders created without a route. Runs after the
    /// create has been answered, bounded by the context's route timeout.
    /// Failures and timeouts leave the order without a route.
    fn follow_up(&self, ctx: &OrderContext) -> Option<FollowUp<OrderAction>> {
        if self.route.is_some() {
            return None;
        }
        let id = self.id;
        let address = self.customer.address.clone();
        let routes = ctx.routes.clone();
        let limit = ctx.route_timeout;
        Some(Box::pin(async move {
            match tokio::time::timeout(limit, routes.resolve(&address)).await {
                Ok(Ok(route)) => {
                    debug!(order_id = %id, distance_km = route.distance_km, "Route resolved");
                    Some(OrderAction::AttachRoute(route))
                }
                Ok(Err(e)) => {
                    debug!(order_id = %id, error = %e, "Route lookup failed; order stays without route");
                    None
                }
                Err(_) => {
                    debug!(
                        order_id = %id,
                        timeout_ms = limit.as_millis() as u64,
                        "Route lookup timed out; order stays without route"
                    );
                    None
                }
            }
        }))
    }

    async fn handle_action(
        &mut self,
        action: OrderAction,
        now: Timestamp,
        ctx: &OrderContext,
    ) -> Result<OrderActionResult, OrderError> {
        let result = match action {
            OrderAction::TransitionStatus(next) => {
                OrderActionResult::TransitionStatus(self.advance(next, now, ctx.packing_duration))
            }
            OrderAction::ConfirmPayment => OrderActionResult::ConfirmPayment(self.confirm_payment(now)),
            OrderAction::MarkPacked => OrderActionResult::MarkPacked(self.mark_packed()),
            OrderAction::AttachRoute(route) => OrderActionResult::AttachRoute(self.attach_route(route)),
        };
        Ok(result)
    }

    fn action_changed(result: &OrderActionResult) -> bool {
        result.changed()
    }

    /// Packing sweep.
    fn on_tick(&mut self, now: Timestamp, _ctx: &OrderContext) -> Result<bool, OrderError> {
        let expired = self.expire_packing(now);
        if expired {
            debug!(order_id = %self.id, "Packing window elapsed");
        }
        Ok(expired)
    }
}

fn validate(params: &OrderCreate) -> Result<(), OrderError> {
    if params.cart.is_empty() {
        return Err(OrderError::Validation("cart is empty".to_string()));
    }
    if let Some(line) = params.cart.iter().find(|line| line.quantity == 0) {
        return Err(OrderError::Validation(format!("{:?} has no quantity", line.name)));
    }

    let customer = &params.customer;
    let required = [
        ("name", &customer.name),
        ("phone", &customer.phone),
        ("street", &customer.address.street),
        ("number", &customer.address.number),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| *field)
        .collect();
    if !missing.is_empty() {
        return Err(OrderError::Validation(format!(
            "customer is missing {}",
            missing.join(", ")
        )));
    }
    Ok(())
}
