//! Order-specific actions and their results.

use crate::model::{OrderStatus, RouteInfo, Transition};

/// Mutations performed on an existing order, by the role panels or by the
/// route lookup started at creation.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderAction {
    /// Move the order forward. Requests that would not move it forward are ignored.
    TransitionStatus(OrderStatus),
    /// Record the payment as settled. Idempotent.
    ConfirmPayment,
    /// Explicit packing confirmation from the kitchen.
    MarkPacked,
    /// Route metadata that arrived after creation. Ignored when a route is set.
    AttachRoute(RouteInfo),
}

/// One variant per action. The flags report whether the order changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderActionResult {
    TransitionStatus(Transition),
    ConfirmPayment(bool),
    MarkPacked(bool),
    AttachRoute(bool),
}

impl OrderActionResult {
    pub fn changed(&self) -> bool {
        match self {
            OrderActionResult::TransitionStatus(transition) => *transition == Transition::Advanced,
            OrderActionResult::ConfirmPayment(changed)
            | OrderActionResult::MarkPacked(changed)
            | OrderActionResult::AttachRoute(changed) => *changed,
        }
    }
}
