//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered
//! by `RUST_LOG` (default `info`).
//!
//! ## What Gets Traced
//!
//! - **Actor lifecycle** at `info`: startup (key, origin, size), shutdown.
//! - **Mutations** at `info`: `Created`, `Action ok` (with `changed`), `Deleted`,
//!   `Tick applied`, `Reloaded`.
//! - **Payloads** at `debug`: create params, actions, route lookups.
//! - **Recoverable faults** at `warn`: failed snapshot writes, corrupt
//!   snapshots, a skipped sweep cycle.
//!
//! ```bash
//! RUST_LOG=info cargo run -p order-engine
//! RUST_LOG=snapshot_actor=debug,order_engine=debug cargo run -p order-engine
//! ```
//!
//! **With `RUST_LOG=info`** a two-view session reads:
//!
//! ```text
//! INFO Actor started entity_type="Order" key="orders" origin=1 size=0
//! INFO Actor started entity_type="Order" key="orders" origin=2 size=0
//! INFO create_order: Created entity_type="Order" id=order_1760400000000 size=1
//! INFO Reloaded entity_type="Order" size=1
//! INFO transition_status: Action ok entity_type="Order" id=order_1760400000000 changed=true
//! INFO Tick applied entity_type="Order" changed=1
//! ```
//!
//! The second `Actor started` is the other view; its `Reloaded` line is the
//! external-change sync.

use tracing_subscriber::EnvFilter;

pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false) // entity_type identifies the actor
        .compact()
        .init();
}
