//! # Generic Actor Server
//!
//! This module defines the `ResourceActor`, the component that owns one collection
//! of records, processes every request sequentially, and keeps the collection in
//! sync with a shared key/value store.

use crate::client::ResourceClient;
use crate::clock::Clock;
use crate::entity::{ActorEntity, FollowUp};
use crate::error::FrameworkError;
use crate::id::IdAllocator;
use crate::message::{ResourceRequest, Signal};
use crate::store::{SnapshotSlot, StoreError, StoreEvent};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

const SIGNAL_CAPACITY: usize = 64;

/// Runtime knobs for one actor.
#[derive(Debug, Clone)]
pub struct ActorConfig {
    /// Capacity of the request channel. Callers wait when it is full.
    pub buffer_size: usize,
    /// Period of the time-driven tick. `None` disables the interval; ticks can
    /// still be requested through [`ResourceClient::tick`].
    pub tick_interval: Option<Duration>,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            buffer_size: 32,
            tick_interval: Some(Duration::from_secs(1)),
        }
    }
}

/// The generic actor that manages a collection of records.
///
/// # Architecture Note
/// This struct is the "Server" half of the actor. It owns the collection, the
/// receiver end of the request channel, and the sender end of the signal
/// broadcast.
///
/// **Concurrency Model**:
/// One Tokio task runs [`ResourceActor::run`], which waits on four sources,
/// polled in this order when several are ready:
///
/// 1. write notifications from the store,
/// 2. requests from clients,
/// 3. actions produced by [`ActorEntity::follow_up`] work,
/// 4. the tick interval.
///
/// Each one is handled to completion before the loop waits again, so a tick
/// never observes a half-applied request and vice versa. No lock guards the
/// collection. Follow-up work itself runs on its own task and only re-enters
/// the loop with its finished action. Store notifications that have already arrived are applied
/// before the next request is served.
///
/// # Persistence
///
/// After every mutation the whole collection is written under the slot's key
/// and [`Signal::Changed`] is broadcast. A failed write is logged and
/// broadcast as [`Signal::PersistenceWarning`]; the mutation itself stands.
///
/// When another context writes the same key, the actor re-reads the snapshot
/// and replaces its collection wholesale. Concurrent writers are not merged:
/// the last write wins.
///
/// # Operations
///
/// * **Create**: allocate an id from the clock, `from_create_params`,
///   `on_create`, insert, persist, answer, then spawn `follow_up`.
/// * **Get / Query**: read-only, served from memory.
/// * **Action**: `handle_action` on the record; persisted unless
///   `action_changed` says nothing happened.
/// * **Delete**: `on_delete`, remove, persist.
/// * **Tick**: `on_tick` on a staged copy of every record; applied and
///   persisted only if something changed and no record failed.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    signals: broadcast::Sender<Signal>,
    store: BTreeMap<T::Id, T>,
    slot: SnapshotSlot,
    external: Option<broadcast::Receiver<StoreEvent>>,
    clock: Arc<dyn Clock>,
    ids: IdAllocator,
    tick_interval: Option<Duration>,
    follow_ups: mpsc::UnboundedReceiver<(T::Id, T::Action)>,
    follow_up_sender: mpsc::UnboundedSender<(T::Id, T::Action)>,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// The stored snapshot is loaded here. A missing snapshot starts an empty
    /// collection; an unreadable or corrupt one is logged and also starts
    /// empty, to be overwritten by the next successful write.
    pub fn new(
        config: ActorConfig,
        slot: SnapshotSlot,
        clock: Arc<dyn Clock>,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(config.buffer_size.max(1));
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        // Subscribe before loading so no write between the two is missed.
        let external = Some(slot.subscribe());
        let (follow_up_sender, follow_ups) = mpsc::unbounded_channel();

        let mut actor = Self {
            receiver,
            signals: signals.clone(),
            store: BTreeMap::new(),
            slot,
            external,
            clock,
            ids: IdAllocator::new(),
            tick_interval: config.tick_interval,
            follow_ups,
            follow_up_sender,
        };
        match actor.slot.load::<T>() {
            Ok(Some(records)) => actor.replace(records),
            Ok(None) => {}
            Err(e) => warn!(
                entity_type = entity_type::<T>(),
                key = actor.slot.key(),
                error = %e,
                "Stored snapshot unreadable; starting empty"
            ),
        }

        let client = ResourceClient::new(sender, signals);
        (actor, client)
    }

    /// Runs the actor's event loop until every client has been dropped.
    ///
    /// # Context Injection
    /// The `context` argument is injected into every entity hook. This allows
    /// entities to reach collaborators that were created *after* the actor was
    /// instantiated but *before* the loop started.
    pub async fn run(mut self, context: T::Context) {
        let entity_type = entity_type::<T>();
        info!(
            entity_type,
            key = self.slot.key(),
            origin = self.slot.origin(),
            size = self.store.len(),
            "Actor started"
        );

        let period = self.tick_interval.filter(|period| !period.is_zero());
        let mut ticker = period.map(|period| {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });

        loop {
            tokio::select! {
                biased;
                event = next_event(&mut self.external) => {
                    self.on_store_event(event, entity_type);
                }
                msg = self.receiver.recv() => match msg {
                    Some(msg) => self.handle(msg, &context, entity_type).await,
                    None => break,
                },
                Some((id, action)) = self.follow_ups.recv() => {
                    self.on_follow_up(id, action, &context, entity_type).await;
                }
                _ = next_tick(&mut ticker) => {
                    self.tick(&context, entity_type);
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }

    async fn handle(&mut self, msg: ResourceRequest<T>, context: &T::Context, entity_type: &str) {
        match msg {
            ResourceRequest::Create { params, respond_to } => {
                debug!(entity_type, ?params, "Create");
                let now = self.clock.now();
                let id = T::Id::from(self.ids.next(now));

                match T::from_create_params(id, params, now) {
                    Ok(mut item) => {
                        if let Err(e) = item.on_create(context).await {
                            warn!(entity_type, error = %e, "on_create failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                            return;
                        }
                        let work = item.follow_up(context);
                        self.store.insert(id, item);
                        info!(entity_type, %id, size = self.store.len(), "Created");
                        self.commit(entity_type);
                        let _ = respond_to.send(Ok(id));
                        if let Some(work) = work {
                            self.spawn_follow_up(id, work);
                        }
                    }
                    Err(e) => {
                        warn!(entity_type, error = %e, "Create failed");
                        let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                    }
                }
            }
            ResourceRequest::Get { id, respond_to } => {
                let item = self.store.get(&id).cloned();
                debug!(entity_type, %id, found = item.is_some(), "Get");
                let _ = respond_to.send(Ok(item));
            }
            ResourceRequest::Query { filter, respond_to } => {
                let items: Vec<T> = self
                    .store
                    .values()
                    .filter(|item| filter.matches(item))
                    .cloned()
                    .collect();
                debug!(entity_type, matched = items.len(), "Query");
                let _ = respond_to.send(Ok(items));
            }
            ResourceRequest::Action { id, action, respond_to } => {
                debug!(entity_type, %id, ?action, "Action");
                let result = self.apply(id, action, context, entity_type).await;
                let _ = respond_to.send(result);
            }
            ResourceRequest::Delete { id, respond_to } => {
                debug!(entity_type, %id, "Delete");
                let Some(item) = self.store.get(&id) else {
                    warn!(entity_type, %id, "Not found");
                    let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                    return;
                };
                if let Err(e) = item.on_delete(context).await {
                    warn!(entity_type, %id, error = %e, "on_delete failed");
                    let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                    return;
                }
                self.store.remove(&id);
                info!(entity_type, %id, size = self.store.len(), "Deleted");
                self.commit(entity_type);
                let _ = respond_to.send(Ok(()));
            }
            ResourceRequest::Tick { respond_to } => {
                let changed = self.tick(context, entity_type);
                let _ = respond_to.send(Ok(changed));
            }
            ResourceRequest::Reload { respond_to } => {
                let result = self.reload(entity_type).map_err(FrameworkError::from);
                let _ = respond_to.send(result);
            }
        }
    }

    async fn apply(
        &mut self,
        id: T::Id,
        action: T::Action,
        context: &T::Context,
        entity_type: &str,
    ) -> Result<T::ActionResult, FrameworkError> {
        let Some(item) = self.store.get_mut(&id) else {
            warn!(entity_type, %id, "Not found");
            return Err(FrameworkError::NotFound(id.to_string()));
        };
        let now = self.clock.now();
        let outcome = item.handle_action(action, now, context).await;
        match outcome {
            Ok(result) => {
                let changed = T::action_changed(&result);
                info!(entity_type, %id, changed, "Action ok");
                if changed {
                    self.commit(entity_type);
                }
                Ok(result)
            }
            Err(e) => {
                warn!(entity_type, %id, error = %e, "Action failed");
                Err(FrameworkError::EntityError(Box::new(e)))
            }
        }
    }

    fn spawn_follow_up(&self, id: T::Id, work: FollowUp<T::Action>) {
        let sender = self.follow_up_sender.clone();
        tokio::spawn(async move {
            if let Some(action) = work.await {
                // The actor may have shut down meanwhile.
                let _ = sender.send((id, action));
            }
        });
    }

    async fn on_follow_up(&mut self, id: T::Id, action: T::Action, context: &T::Context, entity_type: &str) {
        debug!(entity_type, %id, ?action, "Follow-up");
        if !self.store.contains_key(&id) {
            debug!(entity_type, %id, "Follow-up for a removed record dropped");
            return;
        }
        if let Err(e) = self.apply(id, action, context, entity_type).await {
            warn!(entity_type, %id, error = %e, "Follow-up failed");
        }
    }

    /// Runs `on_tick` over the collection. Never fails: faults are logged and
    /// the cycle is dropped.
    fn tick(&mut self, context: &T::Context, entity_type: &str) -> usize {
        let now = self.clock.now();
        let mut staged = Vec::new();
        for (id, item) in &self.store {
            let mut next = item.clone();
            match next.on_tick(now, context) {
                Ok(true) => staged.push((*id, next)),
                Ok(false) => {}
                Err(e) => {
                    warn!(entity_type, %id, error = %e, "Tick failed; cycle skipped");
                    return 0;
                }
            }
        }
        if staged.is_empty() {
            return 0;
        }

        let changed = staged.len();
        self.store.extend(staged);
        info!(entity_type, changed, "Tick applied");
        self.commit(entity_type);
        changed
    }

    fn on_store_event(&mut self, event: Result<StoreEvent, RecvError>, entity_type: &str) {
        match event {
            Ok(event) if self.slot.is_external(&event) => {
                debug!(entity_type, origin = event.origin, "External write");
                if let Err(e) = self.reload(entity_type) {
                    warn!(entity_type, error = %e, "Reload failed; keeping local state");
                }
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(entity_type, skipped, "Missed store notifications; reloading");
                if let Err(e) = self.reload(entity_type) {
                    warn!(entity_type, error = %e, "Reload failed; keeping local state");
                }
            }
            Err(RecvError::Closed) => {
                warn!(entity_type, "Store notifications closed");
                self.external = None;
            }
        }
    }

    fn reload(&mut self, entity_type: &str) -> Result<usize, StoreError> {
        let records = self.slot.load::<T>()?.unwrap_or_default();
        self.replace(records);
        info!(entity_type, size = self.store.len(), "Reloaded");
        let _ = self.signals.send(Signal::Changed);
        Ok(self.store.len())
    }

    fn replace(&mut self, records: Vec<T>) {
        self.store = records.into_iter().map(|r| (r.id(), r)).collect();
        if let Some(last) = self.store.keys().next_back() {
            self.ids.observe((*last).into());
        }
    }

    fn commit(&mut self, entity_type: &str) {
        let records: Vec<&T> = self.store.values().collect();
        if let Err(e) = self.slot.save(&records) {
            warn!(entity_type, error = %e, "Snapshot write failed; in-memory state kept");
            let _ = self.signals.send(Signal::PersistenceWarning(e.to_string()));
        }
        let _ = self.signals.send(Signal::Changed);
    }
}

/// Short type name for log fields ("Order" rather than "order_engine::model::order::Order").
fn entity_type<T>() -> &'static str {
    std::any::type_name::<T>()
        .split("::")
        .last()
        .unwrap_or("Unknown")
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn next_event(
    external: &mut Option<broadcast::Receiver<StoreEvent>>,
) -> Result<StoreEvent, RecvError> {
    match external {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
