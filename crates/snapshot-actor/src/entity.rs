//! # ActorEntity Trait
//!
//! The `ActorEntity` trait defines the contract a record type must implement to be
//! managed by the generic [`ResourceActor`](crate::ResourceActor). It names the
//! associated types for ids, creation payloads, actions, context and errors, and
//! provides the lifecycle hooks (`on_create`, `follow_up`, `handle_action`,
//! `on_delete`, `on_tick`).
//!
//! # Provided Methods (Hooks)
//! - [`ActorEntity::on_create`], [`ActorEntity::on_delete`]: default to `Ok(())`.
//! - [`ActorEntity::on_tick`]: defaults to "nothing changed".
//! - [`ActorEntity::follow_up`]: defaults to no background work.
//! - [`ActorEntity::action_changed`]: defaults to `true`, so every successful
//!   action is persisted unless the entity says otherwise.
//!
//! Entities are `Serialize + DeserializeOwned` because the actor persists the
//! whole collection as one snapshot after each mutation.

use crate::clock::Timestamp;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Display};
use std::future::Future;
use std::pin::Pin;

/// Background work started for a freshly created record. Resolves to the
/// action to apply to that record, if any.
pub type FollowUp<A> = Pin<Box<dyn Future<Output = Option<A>> + Send + 'static>>;

/// Trait that any record must implement to be managed by ResourceActor.
///
/// # Async & Context
/// This trait is `#[async_trait]` so hooks can await collaborators. The `Context`
/// type is injected into every hook when the actor starts (`run(ctx)`), not when
/// it is constructed.
///
/// # Time
/// Hooks that stamp or compare times receive `now` from the actor's clock. They
/// never read the clock themselves, which keeps them deterministic under test.
#[async_trait]
pub trait ActorEntity: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The unique identifier. Allocated from the creation time (see
    /// [`IdAllocator`](crate::IdAllocator)) and used as the sort key.
    type Id: Ord + Copy + Send + Sync + Display + Debug + From<u64> + Into<u64> + 'static;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug + 'static;

    /// Enum representing resource-specific operations.
    type Action: Send + Sync + Debug + 'static;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug + 'static;

    /// The runtime context (dependencies) injected into the actor.
    type Context: Send + Sync + 'static;

    /// One error enum for the whole entity.
    type Error: std::error::Error + Send + Sync + 'static;

    fn id(&self) -> Self::Id;

    /// Construct the full record from the allocated id and the payload.
    /// This is called synchronously before `on_create`; reject invalid input here.
    fn from_create_params(
        id: Self::Id,
        params: Self::Create,
        now: Timestamp,
    ) -> Result<Self, Self::Error>;

    // --- Lifecycle Hooks (Async) ---

    /// Called after construction, before the record is inserted.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Work to run off the actor loop once the record has been inserted,
    /// persisted and returned to the caller. The action it yields goes
    /// through [`handle_action`](ActorEntity::handle_action) like a client
    /// action; a record deleted in the meantime is skipped.
    ///
    /// Used for slow collaborators that must never hold up other requests.
    fn follow_up(&self, _ctx: &Self::Context) -> Option<FollowUp<Self::Action>> {
        None
    }

    /// Called immediately before the record is removed.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handle a custom resource-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        now: Timestamp,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;

    /// Whether a successful action result represents a change worth persisting.
    fn action_changed(_result: &Self::ActionResult) -> bool {
        true
    }

    // --- Time-driven Hook ---

    /// Called for every record on each actor tick. Return `Ok(true)` when the
    /// record changed. An error aborts the whole tick: no record is updated.
    fn on_tick(&mut self, _now: Timestamp, _ctx: &Self::Context) -> Result<bool, Self::Error> {
        Ok(false)
    }
}
