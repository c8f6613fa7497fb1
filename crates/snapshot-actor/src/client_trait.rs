//! # ActorClient Trait
//!
//! Provides a common interface for resource-specific clients, adding default
//! `get`, `delete`, `all` and `subscribe` methods on top of a generic `ResourceClient`.
use crate::{ActorEntity, FrameworkError, ResourceClient, Signal};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Trait for resource-specific clients to inherit the standard operations.
///
/// # Example
///
/// ```rust,ignore
/// #[async_trait]
/// impl ActorClient<Ticket> for TicketClient {
///     type Error = TicketError;
///
///     fn inner(&self) -> &ResourceClient<Ticket> {
///         &self.inner
///     }
///
///     fn map_error(e: FrameworkError) -> Self::Error {
///         TicketError::Actor(e.to_string())
///     }
/// }
///
/// // get(), delete(), all() and subscribe() are provided automatically.
/// let open = client.all().await?;
/// ```
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: From<String> + Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the specific resource error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch a record by id.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Delete a record by id.
    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: T::Id) -> Result<(), Self::Error> {
        tracing::debug!("Sending request");
        self.inner().delete(id).await.map_err(Self::map_error)
    }

    /// Every record currently held by the actor, in id order.
    async fn all(&self) -> Result<Vec<T>, Self::Error> {
        self.inner().list().await.map_err(Self::map_error)
    }

    /// Same-context change notifications.
    fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.inner().subscribe()
    }
}
