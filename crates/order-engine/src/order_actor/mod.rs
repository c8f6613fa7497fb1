//! # Order Actor
//!
//! The order lifecycle engine: a [`ResourceActor`] over [`Order`] records.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](snapshot_actor::ActorEntity) implementation for [`Order`]
//! - [`error`] - [`OrderError`] type for type-safe error handling
//! - [`actions`] - [`OrderAction`] and [`OrderActionResult`]
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Usage
//!
//! ```rust,ignore
//! let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
//! let (actor, client) = order_actor::new(&EngineConfig::default(), store, Arc::new(SystemClock));
//! tokio::spawn(actor.run(OrderContext::default()));
//!
//! let id = client.create_order(params).await?;
//! client.transition_status(id, OrderStatus::Cooking).await?;
//! ```
//!
//! The packing sweep runs inside the actor on the configured interval, so a
//! ready order becomes packed without anybody asking once its window elapses.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clients::OrderClient;
use crate::config::EngineConfig;
use crate::model::Order;
use crate::routing::{NoRouting, RouteResolver};
use snapshot_actor::{Clock, KeyValueStore, ResourceActor, SnapshotSlot};
use std::sync::Arc;
use std::time::Duration;

/// Collaborators and settings injected into every [`Order`] hook via `run(ctx)`.
#[derive(Debug, Clone)]
pub struct OrderContext {
    pub routes: Arc<dyn RouteResolver>,
    pub packing_duration: Duration,
    pub route_timeout: Duration,
}

impl OrderContext {
    pub fn from_config(config: &EngineConfig, routes: Arc<dyn RouteResolver>) -> Self {
        Self {
            routes,
            packing_duration: config.packing_duration(),
            route_timeout: config.route_timeout(),
        }
    }
}

impl Default for OrderContext {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default(), Arc::new(NoRouting))
    }
}

/// Creates a new Order actor bound to the configured key of `store`, and its client.
///
/// Each call is a separate execution context: two actors created over the same
/// store behave like two browser tabs sharing one storage area.
pub fn new(
    config: &EngineConfig,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
) -> (ResourceActor<Order>, OrderClient) {
    let slot = SnapshotSlot::new(store, config.storage_key.clone());
    let (actor, generic_client) = ResourceActor::new(config.actor_config(), slot, clock);
    (actor, OrderClient::new(generic_client))
}
