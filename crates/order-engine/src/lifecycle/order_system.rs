use crate::clients::OrderClient;
use crate::config::EngineConfig;
use crate::order_actor::{self, OrderContext};
use crate::progress::ProgressProjector;
use crate::routing::{NoRouting, RouteResolver};
use snapshot_actor::{Clock, KeyValueStore, MemoryStore};
use std::sync::Arc;
use tracing::{error, info};

/// The runtime orchestrator for the order lifecycle engine.
///
/// `KitchenSystem` is responsible for:
/// - **Lifecycle Management**: Starting and stopping every order actor it spawned
/// - **Dependency Wiring**: Building the [`OrderContext`] (routing, packing window) each actor runs with
/// - **Views**: Opening extra execution contexts over the same store
///
/// # Architecture
///
/// Role panels in one context (cashier, kitchen, delivery, client) share the
/// primary [`OrderClient`]: same actor, same in-memory collection, same change
/// signal. [`KitchenSystem::open_view`] starts another actor over the same
/// store, which behaves like a second browser tab: it only learns about the
/// first context's mutations through the store's change notifications.
///
/// # Example
///
/// ```ignore
/// let mut system = KitchenSystem::in_memory(EngineConfig::default(), Arc::new(SystemClock));
///
/// let id = system.orders.create_order(params).await?;
/// let other_tab = system.open_view();
/// other_tab.by_id(id).await?; // visible once the store notified the view
///
/// drop(other_tab);
/// system.shutdown().await?;
/// ```
pub struct KitchenSystem {
    /// Client for the primary context.
    pub orders: OrderClient,

    config: EngineConfig,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    context: OrderContext,

    /// Task handles for all running actors (used for graceful shutdown)
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl KitchenSystem {
    /// Starts the primary order actor. Must be called inside a Tokio runtime.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        routes: Arc<dyn RouteResolver>,
    ) -> Self {
        let context = OrderContext::from_config(&config, routes);
        let (actor, orders) = order_actor::new(&config, store.clone(), clock.clone());
        let handle = tokio::spawn(actor.run(context.clone()));

        Self {
            orders,
            config,
            store,
            clock,
            context,
            handles: vec![handle],
        }
    }

    /// A system over a fresh [`MemoryStore`] without routing.
    pub fn in_memory(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()), clock, Arc::new(NoRouting))
    }

    /// Starts another execution context over the same store and key.
    ///
    /// The returned client must be dropped before [`KitchenSystem::shutdown`],
    /// which waits for every actor to see its last client go.
    pub fn open_view(&mut self) -> OrderClient {
        let (actor, client) = order_actor::new(&self.config, self.store.clone(), self.clock.clone());
        self.handles.push(tokio::spawn(actor.run(self.context.clone())));
        info!(views = self.handles.len(), "View opened");
        client
    }

    /// Projector configured with this system's status table and packing window.
    pub fn projector(&self) -> ProgressProjector {
        ProgressProjector::new(self.config.status_table.clone(), self.config.packing_duration())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }

    /// Gracefully shuts down the entire system.
    ///
    /// Dropping the primary client closes its channel; each actor exits its
    /// loop once its channel has no senders left, and this waits for all of them.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if all actors shut down cleanly
    /// - `Err(String)` if any actor task failed or panicked
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        drop(self.orders);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
