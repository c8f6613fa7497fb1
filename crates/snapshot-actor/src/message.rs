//! # Generic Messages
//!
//! This module defines the messages exchanged between the `ResourceClient` and the
//! `ResourceActor`, plus the [`Signal`]s the actor broadcasts to every subscriber.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use std::fmt;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// A read-side filter evaluated inside the actor against its current collection.
pub struct Predicate<T>(pub Box<dyn Fn(&T) -> bool + Send + Sync>);

impl<T> Predicate<T> {
    pub fn new(filter: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self(Box::new(filter))
    }

    pub fn matches(&self, item: &T) -> bool {
        (self.0)(item)
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate")
    }
}

/// Internal message type sent to the actor to request operations.
///
/// Besides the resource operations (`Create`, `Get`, `Query`, `Action`,
/// `Delete`), two maintenance requests let callers trigger on demand what the
/// actor otherwise does by itself:
///
/// - **Tick**: run the entities' time-driven hook now instead of waiting for
///   the interval.
/// - **Reload**: replace the collection with the stored snapshot, as if
///   another context had just written it.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Query {
        filter: Predicate<T>,
        respond_to: Response<Vec<T>>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
    Tick {
        respond_to: Response<usize>,
    },
    Reload {
        respond_to: Response<usize>,
    },
}

/// Broadcast to every subscriber of an actor.
///
/// `Changed` carries no data: subscribers re-read whatever they display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// The collection changed, locally or through a reload.
    Changed,
    /// A snapshot write failed. The in-memory collection is still authoritative.
    PersistenceWarning(String),
}
