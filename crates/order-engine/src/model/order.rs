//! A customer order and its lifecycle state.
//!
//! # Actor Framework
//! This struct implements the [`ActorEntity`](snapshot_actor::ActorEntity) trait,
//! allowing it to be managed by a [`ResourceActor`](snapshot_actor::ResourceActor).
//!
//! See [`impl ActorEntity for Order`](#impl-ActorEntity-for-Order) for details on:
//! - Creation parameters ([`OrderCreate`])
//! - Custom actions ([`OrderAction`](crate::order_actor::OrderAction))
//! - The packing sweep (`on_tick`)
//!
//! The mutating methods here are pure: they take `now` from the caller and
//! report whether anything changed, so the actor decides what to persist.

use serde::{Deserialize, Serialize};
use snapshot_actor::Timestamp;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Type-safe identifier for Orders. The value is the creation time in epoch
/// milliseconds, bumped when two orders are created in the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<OrderId> for u64 {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "order_{}", self.0)
    }
}

const CODE_LEN: usize = 6;
const CODE_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// The customer-facing code for an order: the last six base-36 digits of its
/// id, upper case, zero padded.
pub fn public_code_for(id: OrderId) -> String {
    let mut rest = id.0;
    let mut digits = [b'0'; CODE_LEN];
    for slot in digits.iter_mut().rev() {
        *slot = CODE_ALPHABET[(rest % 36) as usize];
        rest /= 36;
    }
    digits.iter().map(|&b| char::from(b)).collect()
}

// =============================================================================
// STATUS
// =============================================================================

/// Lifecycle stage. The derived ordering is the lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Cooking,
    Ready,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Cooking,
        OrderStatus::Ready,
        OrderStatus::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Cooking => "cooking",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Outcome of a status transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advanced,
    /// The requested status was not later than the current one.
    Ignored,
}

// =============================================================================
// SNAPSHOTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub number: String,
    pub sector: String,
    pub city: String,
}

/// Customer data copied into the order at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSnapshot {
    pub name: String,
    pub phone: String,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
}

/// One cart line. Prices are in minor currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
    pub prep_minutes: u32,
}

impl CartItem {
    pub fn new(name: impl Into<String>, unit_price: u64, quantity: u32, prep_minutes: u32) -> Self {
        Self {
            name: name.into(),
            unit_price,
            quantity,
            prep_minutes,
        }
    }

    pub fn line_total(&self) -> u64 {
        self.unit_price.saturating_mul(u64::from(self.quantity))
    }
}

/// Sum of every line's `unit_price × quantity`.
pub fn cart_total(cart: &[CartItem]) -> u64 {
    cart.iter().map(CartItem::line_total).fold(0, u64::saturating_add)
}

/// Lines are prepared in parallel, so the order takes as long as its slowest line.
pub fn estimated_minutes(cart: &[CartItem]) -> u32 {
    cart.iter().map(|item| item.prep_minutes).max().unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Due,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// How a due order will be settled on delivery.
    pub due_method: Option<PaymentMethod>,
    pub paid_at: Option<Timestamp>,
}

/// Payment as the cashier records it.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub due_method: Option<PaymentMethod>,
}

/// Delivery route metadata, given in the payload or attached once resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    pub distance_km: f64,
    pub duration_min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<[f64; 2]>>,
}

// =============================================================================
// ORDER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub public_code: String,
    pub customer: CustomerSnapshot,
    pub cart: Vec<CartItem>,
    pub total: u64,
    /// Minutes.
    pub estimated_time: u32,
    pub status: OrderStatus,
    pub created_at: Timestamp,
    pub cooking_at: Option<Timestamp>,
    pub pack_until: Option<Timestamp>,
    pub packed: bool,
    pub payment: Payment,
    #[serde(default)]
    pub route: Option<RouteInfo>,
}

/// Payload for creating a new order.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub customer: CustomerSnapshot,
    pub cart: Vec<CartItem>,
    pub payment: PaymentIntent,
    /// Kept as given; when absent the routing collaborator is asked.
    pub route: Option<RouteInfo>,
}

impl Order {
    /// Builds a pending order. Derived fields are computed here and never again.
    pub fn new(id: OrderId, params: OrderCreate, now: Timestamp) -> Self {
        let paid_at = match params.payment.status {
            PaymentStatus::Paid => Some(now),
            PaymentStatus::Due => None,
        };
        Self {
            id,
            public_code: public_code_for(id),
            total: cart_total(&params.cart),
            estimated_time: estimated_minutes(&params.cart),
            customer: params.customer,
            cart: params.cart,
            status: OrderStatus::Pending,
            created_at: now,
            cooking_at: None,
            pack_until: None,
            packed: false,
            payment: Payment {
                method: params.payment.method,
                status: params.payment.status,
                due_method: params.payment.due_method,
                paid_at,
            },
            route: params.route,
        }
    }

    /// Moves the order forward to `next`. Requests for the current or an
    /// earlier status are ignored.
    ///
    /// Entering `Cooking` stamps `cooking_at`; entering `Ready` stamps
    /// `pack_until = now + packing` and clears `packed`, whatever an older
    /// snapshot carried. A jump over a stage stamps the skipped
    /// stage's timestamp as well, and no timestamp is ever overwritten.
    pub fn advance(&mut self, next: OrderStatus, now: Timestamp, packing: Duration) -> Transition {
        if next <= self.status {
            return Transition::Ignored;
        }
        if next >= OrderStatus::Cooking && self.cooking_at.is_none() {
            self.cooking_at = Some(now);
        }
        if next >= OrderStatus::Ready && self.pack_until.is_none() {
            self.pack_until = Some(now + packing);
            self.packed = false;
        }
        self.status = next;
        Transition::Advanced
    }

    /// Returns `false` when the order was already paid.
    pub fn confirm_payment(&mut self, now: Timestamp) -> bool {
        if self.payment.status == PaymentStatus::Paid {
            return false;
        }
        self.payment.status = PaymentStatus::Paid;
        self.payment.paid_at.get_or_insert(now);
        true
    }

    /// Explicit packing confirmation. Only meaningful once the order is ready.
    pub fn mark_packed(&mut self) -> bool {
        if self.packed || self.status < OrderStatus::Ready {
            return false;
        }
        self.packed = true;
        true
    }

    /// Marks a ready order packed once its packing window has elapsed.
    pub fn expire_packing(&mut self, now: Timestamp) -> bool {
        match self.pack_until {
            Some(deadline) if self.status == OrderStatus::Ready && !self.packed && now >= deadline => {
                self.packed = true;
                true
            }
            _ => false,
        }
    }

    /// Sets route metadata resolved after creation. A route already present
    /// is kept.
    pub fn attach_route(&mut self, route: RouteInfo) -> bool {
        if self.route.is_some() {
            return false;
        }
        self.route = Some(route);
        true
    }

    /// True when `code` names this order, ignoring case and surrounding whitespace.
    pub fn matches_code(&self, code: &str) -> bool {
        self.public_code.eq_ignore_ascii_case(code.trim())
    }
}
