//! # Order Engine Demo
//!
//! Walks one order through its whole lifecycle with two views over one store:
//! the counter (cashier and kitchen panels share the primary context) and a
//! delivery tab (a second context that only learns about changes through the
//! store).
//!
//! Time is simulated: the clock starts at the wall-clock time and jumps
//! forward between steps, so the packing window elapses instantly.
//!
//! ```bash
//! RUST_LOG=info cargo run -p order-engine -- --data-dir ./data --until ready
//! ```

use clap::Parser;
use order_engine::clients::OrderClient;
use order_engine::config::EngineConfig;
use order_engine::lifecycle::{setup_tracing, KitchenSystem};
use order_engine::model::{
    Address, CartItem, CustomerSnapshot, OrderCreate, OrderId, OrderStatus, PaymentIntent, PaymentMethod,
    PaymentStatus, RouteInfo,
};
use order_engine::order_actor::OrderError;
use order_engine::progress::ProgressProjector;
use order_engine::routing::FixedRoute;
use snapshot_actor::{Clock, FileStore, KeyValueStore, ManualClock, MemoryStore, Signal, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};

#[derive(Debug, Parser)]
#[command(name = "order-engine", about = "Order lifecycle engine demo", long_about = None)]
struct Cli {
    /// TOML engine configuration; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the order snapshot; kept in memory when omitted.
    /// Change notifications stay inside this process: another process on the
    /// same directory only sees these writes when it starts or reloads
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Stop the walkthrough once the order reaches this status
    /// (pending, cooking, ready or delivered)
    #[arg(long, default_value_t = OrderStatus::Delivered)]
    until: OrderStatus,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };
    let store: Arc<dyn KeyValueStore> = match &cli.data_dir {
        Some(dir) => Arc::new(FileStore::open(dir).map_err(|e| e.to_string())?),
        None => Arc::new(MemoryStore::new()),
    };
    let clock = Arc::new(ManualClock::new(SystemClock.now()));
    let packing = config.packing_duration();
    let routes = Arc::new(FixedRoute(RouteInfo {
        distance_km: 3.2,
        duration_min: 11.0,
        geometry: None,
    }));

    info!(
        key = %config.storage_key,
        persistent = cli.data_dir.is_some(),
        until = %cli.until,
        "Starting order engine"
    );
    let mut system = KitchenSystem::new(config, store, clock.clone(), routes);
    let projector = system.projector();
    let delivery_tab = system.open_view();

    let outcome = walkthrough(&system.orders, &delivery_tab, &projector, clock.as_ref(), packing, cli.until).await;

    drop(delivery_tab);
    system.shutdown().await?;
    outcome?;
    info!("Application completed successfully");
    Ok(())
}

/// Counter and kitchen work on `counter`; delivery happens in the other tab.
async fn walkthrough(
    counter: &OrderClient,
    delivery_tab: &OrderClient,
    projector: &ProgressProjector,
    clock: &ManualClock,
    packing: Duration,
    until: OrderStatus,
) -> Result<(), String> {
    let mut tab_changes = delivery_tab.changes();
    let id = async {
        info!("Taking order at the counter");
        counter.create_order(sample_order()).await
    }
    .instrument(info_span!("cashier"))
    .await
    .map_err(|e| e.to_string())?;
    wait_for_change(&mut tab_changes).await;
    report(delivery_tab, projector, clock, id, "delivery tab sees new order").await?;
    if until == OrderStatus::Pending {
        return Ok(());
    }

    async {
        counter.transition_status(id, OrderStatus::Cooking).await?;
        clock.advance(Duration::from_secs(20 * 60));
        if until > OrderStatus::Cooking {
            counter.transition_status(id, OrderStatus::Ready).await?;
            // Duplicate click from a second kitchen screen.
            counter.transition_status(id, OrderStatus::Ready).await?;
        }
        Ok::<_, OrderError>(())
    }
    .instrument(info_span!("kitchen"))
    .await
    .map_err(|e| e.to_string())?;
    if until == OrderStatus::Cooking {
        return report(counter, projector, clock, id, "cooking").await;
    }
    report(counter, projector, clock, id, "ready, packing").await?;

    clock.advance(packing + Duration::from_millis(1));
    let packed = counter.sweep().await.map_err(|e| e.to_string())?;
    info!(packed, "Packing sweep ran");
    if until == OrderStatus::Ready {
        return report(counter, projector, clock, id, "ready, packed").await;
    }

    async {
        delivery_tab.confirm_payment(id).await?;
        delivery_tab.transition_status(id, OrderStatus::Delivered).await
    }
    .instrument(info_span!("delivery"))
    .await
    .map_err(|e| e.to_string())?;
    report(counter, projector, clock, id, "counter after delivery").await?;

    let delivered = counter
        .by_status(OrderStatus::Delivered)
        .await
        .map_err(|e| e.to_string())?;
    info!(delivered = delivered.len(), "Orders delivered");
    Ok(())
}

async fn wait_for_change(changes: &mut tokio::sync::broadcast::Receiver<Signal>) {
    loop {
        match tokio::time::timeout(Duration::from_secs(2), changes.recv()).await {
            Ok(Ok(Signal::Changed)) => return,
            Ok(Ok(Signal::PersistenceWarning(reason))) => warn!(%reason, "Order snapshot not saved"),
            Ok(Err(e)) => {
                warn!(error = %e, "Change feed interrupted");
                return;
            }
            Err(_) => {
                warn!("No change observed");
                return;
            }
        }
    }
}

async fn report(
    view: &OrderClient,
    projector: &ProgressProjector,
    clock: &dyn Clock,
    id: OrderId,
    moment: &str,
) -> Result<(), String> {
    let Some(order) = view.by_id(id).await.map_err(|e| e.to_string())? else {
        warn!(%id, moment, "Order not visible");
        return Ok(());
    };
    let now = clock.now();
    let progress = projector.progress_for(&order, now);
    info!(
        moment,
        code = %order.public_code,
        status = %order.status,
        packed = order.packed,
        paid = order.payment.status == PaymentStatus::Paid,
        percentage = progress.percentage,
        label = %progress.label,
        minutes_left = projector.minutes_left_for(&order, now),
        "Order progress"
    );
    Ok(())
}

fn sample_order() -> OrderCreate {
    OrderCreate {
        customer: CustomerSnapshot {
            name: "Marisol Peña".to_string(),
            phone: "809-555-0142".to_string(),
            address: Address {
                street: "Calle del Sol".to_string(),
                number: "45".to_string(),
                sector: "Centro".to_string(),
                city: "Santiago".to_string(),
            },
            references: Some("Green door next to the pharmacy".to_string()),
        },
        cart: vec![
            CartItem::new("Mofongo de chicharrón", 45_000, 1, 25),
            CartItem::new("Tostones", 15_000, 2, 15),
        ],
        payment: PaymentIntent {
            method: PaymentMethod::Cash,
            status: PaymentStatus::Due,
            due_method: Some(PaymentMethod::Cash),
        },
        route: None,
    }
}
