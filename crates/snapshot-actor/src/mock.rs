//! # Mock Framework
//!
//! `MockClient<T>` hands out a real [`ResourceClient<T>`] whose requests are answered
//! from a queue of expectations instead of by an actor. Use it to unit-test
//! client wrappers (mapping errors, shaping queries, reacting to signals)
//! without spawning a [`ResourceActor`](crate::ResourceActor).
//!
//! | | MockClient | Real actor |
//! |---|---|---|
//! | State | none, canned answers | real collection + store |
//! | Error injection | `return_err` | needs a failing store or entity |
//! | Use case | logic *around* the client | the actor itself, full system |
//!
//! Query expectations hold a set of records and apply the caller's filter to
//! them, so the filter a wrapper builds is exercised for real.
//!
//! ```rust,ignore
//! let mut mock = MockClient::<Ticket>::new();
//! mock.expect_query().return_records(vec![open_ticket, closed_ticket]);
//! mock.expect_get(TicketId(1)).return_err(FrameworkError::ActorClosed);
//!
//! let client = TicketClient::new(mock.client());
//! assert_eq!(client.open().await?.len(), 1);
//! mock.verify();
//! ```

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::{ResourceRequest, Signal};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{broadcast, mpsc};

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// Represents an expected request to the mock client.
enum Expectation<T: ActorEntity> {
    Get {
        id: T::Id,
        response: Result<Option<T>, FrameworkError>,
    },
    Create {
        response: Result<T::Id, FrameworkError>,
    },
    Query {
        response: Result<Vec<T>, FrameworkError>,
    },
    Action {
        id: T::Id,
        response: Result<T::ActionResult, FrameworkError>,
    },
    Delete {
        id: T::Id,
        response: Result<(), FrameworkError>,
    },
}

/// A mock client with expectation tracking for fluent testing.
///
/// Requests must arrive in the order expectations were registered. A request
/// that doesn't match the next expectation (kind or id) has its response
/// channel dropped, so the caller sees `ActorDropped`, and is reported by
/// [`MockClient::verify`].
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    signals: broadcast::Sender<Signal>,
    expectations: Queue<T>,
    mismatches: Arc<Mutex<Vec<String>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let (signals, _) = broadcast::channel(16);
        let expectations: Queue<T> = Arc::new(Mutex::new(VecDeque::new()));
        let mismatches = Arc::new(Mutex::new(Vec::new()));

        let queue = expectations.clone();
        let seen = mismatches.clone();
        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front();
                if let Err(description) = answer(request, expectation) {
                    seen.lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(description);
                }
            }
        });

        Self {
            client: ResourceClient::new(sender, signals.clone()),
            signals,
            expectations,
            mismatches,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    /// Broadcasts a signal to every subscriber of the mock's client.
    pub fn signal(&self, signal: Signal) {
        let _ = self.signals.send(signal);
    }

    pub fn expect_get(&mut self, id: T::Id) -> ExpectationBuilder<'_, T, Option<T>> {
        self.builder(move |response| Expectation::Get { id, response })
    }

    pub fn expect_create(&mut self) -> ExpectationBuilder<'_, T, T::Id> {
        self.builder(|response| Expectation::Create { response })
    }

    pub fn expect_query(&mut self) -> ExpectationBuilder<'_, T, Vec<T>> {
        self.builder(|response| Expectation::Query { response })
    }

    pub fn expect_action(&mut self, id: T::Id) -> ExpectationBuilder<'_, T, T::ActionResult> {
        self.builder(move |response| Expectation::Action { id, response })
    }

    pub fn expect_delete(&mut self, id: T::Id) -> ExpectationBuilder<'_, T, ()> {
        self.builder(move |response| Expectation::Delete { id, response })
    }

    fn builder<R>(
        &mut self,
        make: impl FnOnce(Result<R, FrameworkError>) -> Expectation<T> + 'static,
    ) -> ExpectationBuilder<'_, T, R> {
        ExpectationBuilder {
            queue: &self.expectations,
            make: Box::new(make),
        }
    }

    /// Panics unless every expectation was consumed by a matching request.
    pub fn verify(&self) {
        let mismatches = self.mismatches.lock().unwrap_or_else(PoisonError::into_inner);
        assert!(mismatches.is_empty(), "Unexpected requests: {mismatches:?}");
        let remaining = self
            .expectations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        assert_eq!(remaining, 0, "Not all expectations were met. {remaining} remaining");
    }
}

/// Registers the response for one expectation.
pub struct ExpectationBuilder<'a, T: ActorEntity, R> {
    queue: &'a Queue<T>,
    make: Box<dyn FnOnce(Result<R, FrameworkError>) -> Expectation<T>>,
}

impl<T: ActorEntity, R> ExpectationBuilder<'_, T, R> {
    pub fn return_ok(self, value: R) {
        self.push(Ok(value));
    }

    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<R, FrameworkError>) {
        let expectation = (self.make)(response);
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(expectation);
    }
}

impl<T: ActorEntity> ExpectationBuilder<'_, T, Vec<T>> {
    /// The records the caller's filter is applied to.
    pub fn return_records(self, records: Vec<T>) {
        self.return_ok(records);
    }
}

fn answer<T: ActorEntity>(
    request: ResourceRequest<T>,
    expectation: Option<Expectation<T>>,
) -> Result<(), String> {
    match (request, expectation) {
        (ResourceRequest::Get { id, respond_to }, Some(Expectation::Get { id: want, response }))
            if id == want =>
        {
            let _ = respond_to.send(response);
        }
        (ResourceRequest::Create { respond_to, .. }, Some(Expectation::Create { response })) => {
            let _ = respond_to.send(response);
        }
        (ResourceRequest::Query { filter, respond_to }, Some(Expectation::Query { response })) => {
            let filtered = response.map(|records| {
                records
                    .into_iter()
                    .filter(|record| filter.matches(record))
                    .collect()
            });
            let _ = respond_to.send(filtered);
        }
        (
            ResourceRequest::Action { id, respond_to, .. },
            Some(Expectation::Action { id: want, response }),
        ) if id == want => {
            let _ = respond_to.send(response);
        }
        (ResourceRequest::Delete { id, respond_to }, Some(Expectation::Delete { id: want, response }))
            if id == want =>
        {
            let _ = respond_to.send(response);
        }
        (request, _) => return Err(format!("{request:?}")),
    }
    Ok(())
}
