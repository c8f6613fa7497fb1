//! # Order Lifecycle Engine
//!
//! Coordinates a restaurant's orders across role panels (cashier, kitchen,
//! delivery, client) that all observe one order collection.
//!
//! - **[model]**: the [`Order`](model::Order) record and its status machine.
//! - **[order_actor]**: the [`ActorEntity`](snapshot_actor::ActorEntity) implementation, actions
//!   and the packing sweep.
//! - **[clients]**: [`OrderClient`](clients::OrderClient), the typed API panels call.
//! - **[progress]**: pure percentage/label and minutes-left projection.
//! - **[config]**: [`EngineConfig`](config::EngineConfig), loaded from TOML.
//! - **[routing]**: the route metadata collaborator seam.
//! - **[lifecycle]**: [`KitchenSystem`](lifecycle::KitchenSystem) orchestration and tracing setup.
//!
//! Consistency across contexts is eventual and last-writer-wins: every write
//! replaces the whole stored snapshot, and a context that hears about another
//! context's write replaces its collection with what is stored.

pub mod clients;
pub mod config;
pub mod lifecycle;
pub mod model;
pub mod order_actor;
pub mod progress;
pub mod routing;
