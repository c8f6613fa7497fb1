//! # Snapshot Actor
//!
//! Building blocks for a collection of records that several independent views
//! observe at once. One [`ResourceActor`] owns the collection and processes every
//! request sequentially; any number of cloned [`ResourceClient`]s talk to it.
//!
//! ## What the actor adds to a plain actor loop
//!
//! - **Whole-snapshot persistence**: after each mutation the entire collection is
//!   serialized as one JSON array under one key of a [`KeyValueStore`].
//! - **Same-context signals**: a [`Signal::Changed`] broadcast tells every
//!   subscribed view to re-read.
//! - **Cross-context sync**: when a different context writes the same key, the
//!   actor reloads the snapshot and replaces its collection. Last writer wins;
//!   there is no merge.
//! - **Time-driven mutation**: an interval tick calls [`ActorEntity::on_tick`]
//!   on every record, serialized with ordinary requests.
//!
//! ## Architecture Overview
//!
//! 1. **Entity Layer** ([`ActorEntity`]): business rules for one record type.
//! 2. **Runtime Layer** ([`ResourceActor`]): message loop, persistence, ticks.
//! 3. **Interface Layer** ([`ResourceClient`], [`ActorClient`]): typed access.
//! 4. **Infrastructure** ([`store`], [`clock`]): where snapshots live and what time it is.
//!
//! ## Minimal wiring
//!
//! ```rust,ignore
//! let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
//! let slot = SnapshotSlot::new(store, "tickets");
//! let (actor, client) = ResourceActor::<Ticket>::new(ActorConfig::default(), slot, Arc::new(SystemClock));
//! tokio::spawn(actor.run(()));
//!
//! let mut changes = client.subscribe();
//! let id = client.create(TicketCreate { title: "Fix oven".into() }).await?;
//! assert_eq!(changes.recv().await?, Signal::Changed);
//! ```
//!
//! ## Testing
//!
//! [`ManualClock`] makes time-driven hooks deterministic, [`MemoryStore`] lets
//! two actors share a store inside one test, and [`mock::MockClient`] answers
//! client requests without an actor.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod clock;
pub mod entity;
pub mod error;
pub mod id;
pub mod message;
pub mod mock;
pub mod store;

// Re-export core types for convenience
pub use actor::{ActorConfig, ResourceActor};
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use entity::{ActorEntity, FollowUp};
pub use error::FrameworkError;
pub use id::IdAllocator;
pub use message::{Predicate, ResourceRequest, Response, Signal};
pub use store::{FileStore, KeyValueStore, MemoryStore, SnapshotSlot, StoreError, StoreEvent};
