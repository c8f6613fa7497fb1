//! Domain data: the [`Order`] record and the snapshots it carries.

pub mod order;

pub use order::*;
