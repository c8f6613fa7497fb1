//! # Generic Client
//!
//! This module defines the generic client for communicating with actors.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::{Predicate, ResourceRequest, Response, Signal};
use tokio::sync::{broadcast, mpsc, oneshot};

/// ## ResourceClient
///
/// The `ResourceClient<T>` provides a type-safe, async API for a `ResourceActor<T>`.
/// It forwards requests over a Tokio mpsc channel and awaits each result on a
/// oneshot channel. Cloning is cheap: every clone talks to the same actor and
/// can subscribe to the same [`Signal`] broadcast.
pub struct ResourceClient<T: ActorEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
    signals: broadcast::Sender<Signal>,
}

impl<T: ActorEntity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            signals: self.signals.clone(),
        }
    }
}

impl<T: ActorEntity> std::fmt::Debug for ResourceClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceClient")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl<T: ActorEntity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>, signals: broadcast::Sender<Signal>) -> Self {
        Self { sender, signals }
    }

    /// Receives every [`Signal`] the actor broadcasts from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.signals.subscribe()
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::Create) -> Result<T::Id, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Create { params, respond_to })
            .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to })
            .await
    }

    /// Records matching `filter`, in id order.
    pub async fn query(
        &self,
        filter: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Result<Vec<T>, FrameworkError> {
        let filter = Predicate::new(filter);
        self.request(|respond_to| ResourceRequest::Query { filter, respond_to })
            .await
    }

    /// The whole collection, in id order.
    pub async fn list(&self) -> Result<Vec<T>, FrameworkError> {
        self.query(|_| true).await
    }

    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<T::ActionResult, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Action {
            id,
            action,
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), FrameworkError> {
        self.request(|respond_to| ResourceRequest::Delete { id, respond_to })
            .await
    }

    /// Runs the time-driven hook immediately. Returns how many records changed.
    pub async fn tick(&self) -> Result<usize, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Tick { respond_to })
            .await
    }

    /// Replaces the collection with the stored snapshot. Returns the new size.
    pub async fn reload(&self) -> Result<usize, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Reload { respond_to })
            .await
    }
}
