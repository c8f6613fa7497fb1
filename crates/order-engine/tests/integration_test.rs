use order_engine::clients::OrderClient;
use order_engine::config::EngineConfig;
use order_engine::lifecycle::KitchenSystem;
use order_engine::model::{
    Address, CartItem, CustomerSnapshot, Order, OrderCreate, OrderId, OrderStatus, PaymentIntent, PaymentMethod,
    PaymentStatus, Transition,
};
use order_engine::order_actor::OrderError;
use order_engine::routing::NoRouting;
use snapshot_actor::{ActorClient, Clock, FileStore, KeyValueStore, ManualClock, MemoryStore, Signal, Timestamp};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const T0: Timestamp = Timestamp(1_760_400_000_000);
const PACKING_MS: i64 = 90_000;

// --- Helpers ---

/// Sweep interval disabled: tests run the sweep explicitly unless they opt in.
fn manual_sweep_config() -> EngineConfig {
    EngineConfig {
        sweep_interval_ms: 0,
        ..EngineConfig::default()
    }
}

fn system_over(store: Arc<dyn KeyValueStore>, clock: Arc<ManualClock>) -> KitchenSystem {
    KitchenSystem::new(manual_sweep_config(), store, clock, Arc::new(NoRouting))
}

fn order_params(cart: Vec<CartItem>) -> OrderCreate {
    OrderCreate {
        customer: CustomerSnapshot {
            name: "Yolanda".to_string(),
            phone: "849-555-0110".to_string(),
            address: Address {
                street: "Calle Cuba".to_string(),
                number: "19".to_string(),
                sector: "Los Pepines".to_string(),
                city: "Santiago".to_string(),
            },
            references: Some("Second floor".to_string()),
        },
        cart,
        payment: PaymentIntent {
            method: PaymentMethod::Cash,
            status: PaymentStatus::Due,
            due_method: Some(PaymentMethod::Cash),
        },
        route: None,
    }
}

fn two_item_cart() -> Vec<CartItem> {
    vec![
        CartItem::new("Chivo guisado", 52_000, 1, 25),
        CartItem::new("Moro de guandules", 18_000, 2, 15),
    ]
}

async fn next_change(changes: &mut broadcast::Receiver<Signal>) -> Signal {
    tokio::time::timeout(Duration::from_secs(5), changes.recv())
        .await
        .expect("signal within timeout")
        .expect("signal channel open")
}

async fn fetch(client: &OrderClient, order: &Order) -> Order {
    client.by_id(order.id).await.unwrap().expect("order present")
}

// --- Lifecycle ---

#[tokio::test]
async fn estimated_time_is_the_slowest_item() {
    let clock = Arc::new(ManualClock::new(T0));
    let system = system_over(Arc::new(MemoryStore::new()), clock);

    let id = system.orders.create_order(order_params(two_item_cart())).await.unwrap();
    let order = system.orders.by_id(id).await.unwrap().unwrap();

    assert_eq!(order.estimated_time, 25);
    assert_eq!(order.total, 52_000 + 2 * 18_000);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!((order.cooking_at, order.pack_until, order.packed), (None, None, false));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn repeated_cooking_keeps_cooking_at() {
    let clock = Arc::new(ManualClock::new(T0));
    let system = system_over(Arc::new(MemoryStore::new()), clock.clone());
    let id = system.orders.create_order(order_params(two_item_cart())).await.unwrap();

    clock.advance(Duration::from_secs(60));
    let first = system.orders.transition_status(id, OrderStatus::Cooking).await.unwrap();
    let cooking_at = system.orders.by_id(id).await.unwrap().unwrap().cooking_at;

    clock.advance(Duration::from_secs(60));
    let second = system.orders.transition_status(id, OrderStatus::Cooking).await.unwrap();

    assert_eq!((first, second), (Transition::Advanced, Transition::Ignored));
    assert_eq!(cooking_at, Some(Timestamp(T0.as_millis() + 60_000)));
    assert_eq!(system.orders.by_id(id).await.unwrap().unwrap().cooking_at, cooking_at);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn packing_window_expires_on_sweep() {
    let clock = Arc::new(ManualClock::new(T0));
    let system = system_over(Arc::new(MemoryStore::new()), clock.clone());
    let id = system.orders.create_order(order_params(two_item_cart())).await.unwrap();

    let t_ready = Timestamp(T0.as_millis() + 600_000);
    clock.set(t_ready);
    system.orders.transition_status(id, OrderStatus::Cooking).await.unwrap();
    system.orders.transition_status(id, OrderStatus::Ready).await.unwrap();

    let order = system.orders.by_id(id).await.unwrap().unwrap();
    assert_eq!(order.pack_until, Some(Timestamp(t_ready.as_millis() + PACKING_MS)));
    assert!(!order.packed);

    clock.set(Timestamp(t_ready.as_millis() + PACKING_MS - 1));
    assert_eq!(system.orders.sweep().await.unwrap(), 0);

    clock.set(Timestamp(t_ready.as_millis() + PACKING_MS + 1));
    assert_eq!(system.orders.sweep().await.unwrap(), 1);
    assert!(system.orders.by_id(id).await.unwrap().unwrap().packed);

    // Nothing left to expire.
    assert_eq!(system.orders.sweep().await.unwrap(), 0);
    system.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn sweep_runs_on_its_own_interval() {
    let clock = Arc::new(ManualClock::new(T0));
    let system = KitchenSystem::in_memory(EngineConfig::default(), clock.clone());
    let id = system.orders.create_order(order_params(two_item_cart())).await.unwrap();
    system.orders.transition_status(id, OrderStatus::Ready).await.unwrap();

    let mut changes = system.orders.changes();
    clock.advance(Duration::from_millis(PACKING_MS as u64 + 1));
    assert_eq!(next_change(&mut changes).await, Signal::Changed);

    let order = system.orders.by_id(id).await.unwrap().unwrap();
    assert!(order.packed, "packed without an explicit call");
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn confirm_payment_touches_only_payment() {
    let clock = Arc::new(ManualClock::new(T0));
    let system = system_over(Arc::new(MemoryStore::new()), clock.clone());
    let id = system.orders.create_order(order_params(two_item_cart())).await.unwrap();
    system.orders.transition_status(id, OrderStatus::Cooking).await.unwrap();
    let before = system.orders.by_id(id).await.unwrap().unwrap();
    assert_eq!(before.payment.status, PaymentStatus::Due);

    let paid_at = Timestamp(T0.as_millis() + 300_000);
    clock.set(paid_at);
    system.orders.confirm_payment(id).await.unwrap();

    let after = fetch(&system.orders, &before).await;
    assert_eq!(after.payment.status, PaymentStatus::Paid);
    assert_eq!(after.payment.paid_at, Some(paid_at));
    assert_eq!(after.status, before.status);
    assert_eq!(after.cart, before.cart);

    // Idempotent: the first payment time stands.
    clock.advance(Duration::from_secs(60));
    system.orders.confirm_payment(id).await.unwrap();
    assert_eq!(fetch(&system.orders, &before).await.payment.paid_at, Some(paid_at));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn other_views_follow_external_writes() {
    let clock = Arc::new(ManualClock::new(T0));
    let mut system = system_over(Arc::new(MemoryStore::new()), clock.clone());
    let tab_b = system.open_view();
    let mut b_changes = tab_b.changes();

    let id = system.orders.create_order(order_params(two_item_cart())).await.unwrap();
    assert_eq!(next_change(&mut b_changes).await, Signal::Changed);
    assert!(tab_b.by_id(id).await.unwrap().is_some());

    system.orders.transition_status(id, OrderStatus::Cooking).await.unwrap();
    assert_eq!(next_change(&mut b_changes).await, Signal::Changed);
    let seen_by_b = tab_b.by_status(OrderStatus::Cooking).await.unwrap();
    assert_eq!(seen_by_b.iter().map(|o| o.id).collect::<Vec<_>>(), vec![id]);

    // And the other way round.
    let mut a_changes = system.orders.changes();
    tab_b.transition_status(id, OrderStatus::Ready).await.unwrap();
    assert_eq!(next_change(&mut a_changes).await, Signal::Changed);
    assert_eq!(system.orders.by_id(id).await.unwrap().unwrap().status, OrderStatus::Ready);

    drop(tab_b);
    system.shutdown().await.unwrap();
}

// --- Invariants ---

#[tokio::test]
async fn lifecycle_invariants_hold_across_a_noisy_history() {
    let clock = Arc::new(ManualClock::new(T0));
    let system = system_over(Arc::new(MemoryStore::new()), clock.clone());
    let id = system.orders.create_order(order_params(two_item_cart())).await.unwrap();
    let created = system.orders.by_id(id).await.unwrap().unwrap();

    let requests = [
        OrderStatus::Cooking,
        OrderStatus::Pending,
        OrderStatus::Cooking,
        OrderStatus::Ready,
        OrderStatus::Cooking,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Ready,
    ];
    let mut previous = created.clone();
    for (step, request) in requests.into_iter().enumerate() {
        clock.advance(Duration::from_secs(45));
        system.orders.transition_status(id, request).await.unwrap();
        if step == 3 {
            system.orders.mark_packed(id).await.unwrap();
        }
        system.orders.sweep().await.unwrap();
        let current = system.orders.by_id(id).await.unwrap().unwrap();

        assert!(current.status >= previous.status, "status went backwards at step {step}");
        assert_eq!(current.cooking_at.is_some(), current.status >= OrderStatus::Cooking);
        assert_eq!(current.pack_until.is_some(), current.status >= OrderStatus::Ready);
        if previous.cooking_at.is_some() {
            assert_eq!(current.cooking_at, previous.cooking_at);
        }
        if previous.pack_until.is_some() {
            assert_eq!(current.pack_until, previous.pack_until);
        }
        assert!(current.packed || !previous.packed, "packed reverted at step {step}");
        assert_eq!((current.total, current.estimated_time), (created.total, created.estimated_time));
        assert_eq!(current.cart, created.cart);
        previous = current;
    }
    assert_eq!(previous.status, OrderStatus::Delivered);
    assert!(previous.packed);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn ids_stay_unique_for_same_millisecond_creations() {
    let clock = Arc::new(ManualClock::new(T0));
    let system = system_over(Arc::new(MemoryStore::new()), clock);

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(system.orders.create_order(order_params(two_item_cart())).await.unwrap());
    }
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "strictly increasing: {ids:?}");

    let codes: Vec<String> = system.orders.all().await.unwrap().into_iter().map(|o| o.public_code).collect();
    let found = system.orders.by_public_code(&codes[2].to_lowercase()).await.unwrap();
    assert_eq!(found.map(|o| o.id), Some(ids[2]));
    system.shutdown().await.unwrap();
}

// --- Persistence ---

#[tokio::test]
async fn stale_packed_flag_is_cleared_on_entering_ready() {
    // A cooking order whose snapshot, written elsewhere, already says packed.
    let mut stale = Order::new(OrderId(T0.as_millis() as u64), order_params(two_item_cart()), T0);
    stale.advance(OrderStatus::Cooking, T0, Duration::from_millis(PACKING_MS as u64));
    stale.packed = true;
    let store = Arc::new(MemoryStore::new());
    store.seed("orders", &serde_json::to_string(&vec![stale.clone()]).unwrap());

    let clock = Arc::new(ManualClock::new(T0 + Duration::from_secs(600)));
    let system = system_over(store, clock.clone());
    system.orders.transition_status(stale.id, OrderStatus::Ready).await.unwrap();

    let ready = fetch(&system.orders, &stale).await;
    assert!(!ready.packed, "packing window starts unpacked");
    assert_eq!(ready.pack_until, Some(clock.now() + Duration::from_millis(PACKING_MS as u64)));
    assert_eq!(system.orders.sweep().await.unwrap(), 0);

    clock.advance(Duration::from_millis(PACKING_MS as u64 + 1));
    assert_eq!(system.orders.sweep().await.unwrap(), 1);
    assert!(fetch(&system.orders, &stale).await.packed);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn persisted_collection_reloads_field_for_field() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(T0));
    let system = system_over(store.clone(), clock.clone());

    let pending = system.orders.create_order(order_params(two_item_cart())).await.unwrap();
    let cooking = system.orders.create_order(order_params(two_item_cart())).await.unwrap();
    let ready = system.orders.create_order(order_params(vec![CartItem::new("Yaroa", 25_000, 3, 12)])).await.unwrap();
    system.orders.transition_status(cooking, OrderStatus::Cooking).await.unwrap();
    system.orders.transition_status(ready, OrderStatus::Ready).await.unwrap();
    system.orders.confirm_payment(ready).await.unwrap();
    let before = system.orders.all().await.unwrap();
    assert_eq!(before.len(), 3);
    assert_eq!(before[0].id, pending);
    system.shutdown().await.unwrap();

    let restarted = system_over(store, clock);
    assert_eq!(restarted.orders.all().await.unwrap(), before);
    restarted.shutdown().await.unwrap();
}

#[tokio::test]
async fn file_store_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(T0));

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
    let system = system_over(store, clock.clone());
    let id = system.orders.create_order(order_params(two_item_cart())).await.unwrap();
    system.orders.transition_status(id, OrderStatus::Cooking).await.unwrap();
    system.shutdown().await.unwrap();
    assert!(dir.path().join("orders.json").exists());

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir.path()).unwrap());
    let system = system_over(store, clock);
    let order = system.orders.by_id(id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cooking);
    assert_eq!(order.cooking_at, Some(T0));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn corrupt_snapshot_falls_back_to_empty() {
    let store = Arc::new(MemoryStore::new());
    store.seed("orders", "{\"not\": \"an array\"}");
    let clock = Arc::new(ManualClock::new(T0));
    let system = system_over(store.clone(), clock);

    assert!(system.orders.all().await.unwrap().is_empty());
    assert!(matches!(system.orders.reload().await, Err(OrderError::Persistence(_))));

    system.orders.create_order(order_params(two_item_cart())).await.unwrap();
    let raw = store.read("orders").unwrap().unwrap();
    assert!(raw.starts_with('['), "next write replaces the corrupt value");
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn failed_writes_surface_as_warnings() {
    let store = Arc::new(MemoryStore::with_quota(256));
    let clock = Arc::new(ManualClock::new(T0));
    let system = system_over(store.clone(), clock);
    let mut changes = system.orders.changes();

    let id = system.orders.create_order(order_params(two_item_cart())).await.unwrap();

    assert!(matches!(next_change(&mut changes).await, Signal::PersistenceWarning(reason) if reason.contains("quota")));
    assert_eq!(next_change(&mut changes).await, Signal::Changed);
    assert!(system.orders.by_id(id).await.unwrap().is_some(), "memory stays authoritative");
    assert_eq!(store.read("orders").unwrap(), None);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn delete_removes_everywhere() {
    let clock = Arc::new(ManualClock::new(T0));
    let mut system = system_over(Arc::new(MemoryStore::new()), clock);
    let tab_b = system.open_view();
    let mut b_changes = tab_b.changes();

    let id = system.orders.create_order(order_params(two_item_cart())).await.unwrap();
    next_change(&mut b_changes).await;
    system.orders.delete(id).await.unwrap();
    next_change(&mut b_changes).await;

    assert_eq!(system.orders.by_id(id).await.unwrap(), None);
    assert_eq!(tab_b.by_id(id).await.unwrap(), None);
    assert!(matches!(system.orders.delete(id).await, Err(OrderError::NotFound(_))));

    drop(tab_b);
    system.shutdown().await.unwrap();
}

// --- Projection ---

#[tokio::test]
async fn projector_follows_a_live_order() {
    let clock = Arc::new(ManualClock::new(T0));
    let system = system_over(Arc::new(MemoryStore::new()), clock.clone());
    let projector = system.projector();
    let id = system.orders.create_order(order_params(two_item_cart())).await.unwrap();

    clock.advance(Duration::from_secs(5 * 60));
    let order = system.orders.by_id(id).await.unwrap().unwrap();
    let progress = projector.progress_for(&order, Timestamp(T0.as_millis() + 5 * 60_000));
    assert_eq!((progress.percentage, progress.label.as_str()), (5, "Received"));
    assert_eq!(projector.minutes_left_for(&order, Timestamp(T0.as_millis() + 5 * 60_000)), 20);

    system.orders.transition_status(id, OrderStatus::Ready).await.unwrap();
    let order = system.orders.by_id(id).await.unwrap().unwrap();
    let now = Timestamp(T0.as_millis() + 5 * 60_000);
    assert_eq!(projector.progress_for(&order, now).label, "Packing");
    assert_eq!(projector.minutes_left_for(&order, now), 2);
    system.shutdown().await.unwrap();
}
