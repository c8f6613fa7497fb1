//! # System Lifecycle & Orchestration
//!
//! This module manages the runtime lifecycle of the order engine: starting
//! order actors with their context, opening additional views, and shutting
//! everything down.
//!
//! ## Dependency Injection via Context
//!
//! Actors are created without dependencies; the [`OrderContext`](crate::order_actor::OrderContext)
//! (routing collaborator, packing window, route timeout) is injected when the
//! loop starts:
//!
//! ```rust,ignore
//! let (actor, orders) = order_actor::new(&config, store.clone(), clock.clone());
//! tokio::spawn(actor.run(OrderContext::from_config(&config, routes)));
//! ```
//!
//! ## Graceful Shutdown
//!
//! 1. **Drop all clients** - Closes the sender side of channels
//! 2. **Actors detect closure** - `receiver.recv()` returns `None`
//! 3. **Await completion** - Wait for all actor tasks to finish
//!
//! Pending requests already in a channel are answered before the actor exits.
//!
//! ## Observability & Tracing
//!
//! The [`setup_tracing`] function initializes structured logging for the
//! binary. See the [`tracing`] module for what each level shows.

pub mod order_system;
pub mod tracing;

pub use self::order_system::*;
pub use self::tracing::setup_tracing;
