//! Type-safe wrappers around [`ResourceClient`](snapshot_actor::ResourceClient).

pub mod order_client;

pub use order_client::*;
