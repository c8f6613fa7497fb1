//! # Progress Projector
//!
//! Turns an [`Order`] and the current time into what a panel shows: a
//! percentage with a label, and the minutes left in the current phase.
//!
//! Each status owns a percentage band from the [`StatusTable`]. Inside the band
//! the position is the fraction of the phase that has elapsed:
//!
//! | status | phase starts | phase length |
//! |---|---|---|
//! | pending | `created_at` | `estimated_time` |
//! | cooking | `cooking_at` | `estimated_time` |
//! | ready | `pack_until - packing` | packing duration |
//! | delivered | n/a | always 100 |
//!
//! Projection is pure: nothing here is cached or written back.

use crate::config::ConfigError;
use crate::model::{Order, OrderStatus};
use serde::{Deserialize, Serialize};
use snapshot_actor::Timestamp;
use std::time::Duration;

const MINUTE_MS: i64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBand {
    pub label: String,
    pub min: u8,
    pub max: u8,
}

impl StatusBand {
    pub fn new(label: impl Into<String>, min: u8, max: u8) -> Self {
        Self {
            label: label.into(),
            min,
            max,
        }
    }
}

/// Label and percentage band per status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusTable {
    pub pending: StatusBand,
    pub cooking: StatusBand,
    pub ready: StatusBand,
    pub delivered: StatusBand,
}

impl Default for StatusTable {
    fn default() -> Self {
        Self {
            pending: StatusBand::new("Received", 0, 25),
            cooking: StatusBand::new("Cooking", 25, 75),
            ready: StatusBand::new("Packing", 75, 95),
            delivered: StatusBand::new("Delivered", 100, 100),
        }
    }
}

impl StatusTable {
    pub fn band(&self, status: OrderStatus) -> &StatusBand {
        match status {
            OrderStatus::Pending => &self.pending,
            OrderStatus::Cooking => &self.cooking,
            OrderStatus::Ready => &self.ready,
            OrderStatus::Delivered => &self.delivered,
        }
    }

    /// Every band must satisfy `min <= max <= 100`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for status in OrderStatus::ALL {
            let band = self.band(status);
            if band.min > band.max || band.max > 100 {
                return Err(ConfigError::Invalid(format!(
                    "{status} band {}..{} is not within 0..=100 in ascending order",
                    band.min, band.max
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Always within `0..=100`.
    pub percentage: u8,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct ProgressProjector {
    table: StatusTable,
    packing_duration: Duration,
}

impl ProgressProjector {
    pub fn new(table: StatusTable, packing_duration: Duration) -> Self {
        Self {
            table,
            packing_duration,
        }
    }

    pub fn progress_for(&self, order: &Order, now: Timestamp) -> Progress {
        let band = self.table.band(order.status);
        let percentage = match order.status {
            OrderStatus::Delivered => 100,
            _ => {
                let fraction = self.phase_fraction(order, now);
                let span = f64::from(band.max.saturating_sub(band.min));
                let offset = (fraction * span).round() as u8;
                band.min.saturating_add(offset).min(100)
            }
        };
        Progress {
            percentage,
            label: band.label.clone(),
        }
    }

    /// Whole minutes, rounded up, until the current phase is due. Zero once
    /// the deadline has passed or the order is delivered or packed.
    pub fn minutes_left_for(&self, order: &Order, now: Timestamp) -> u32 {
        let deadline = match order.status {
            OrderStatus::Pending => order.created_at + self.estimate(order),
            OrderStatus::Cooking => order.cooking_at.unwrap_or(order.created_at) + self.estimate(order),
            OrderStatus::Ready if order.packed => return 0,
            OrderStatus::Ready => match order.pack_until {
                Some(deadline) => deadline,
                None => return 0,
            },
            OrderStatus::Delivered => return 0,
        };
        let remaining = deadline.millis_since(now);
        if remaining <= 0 {
            return 0;
        }
        let minutes = (remaining + MINUTE_MS - 1) / MINUTE_MS;
        u32::try_from(minutes).unwrap_or(u32::MAX)
    }

    fn estimate(&self, order: &Order) -> Duration {
        Duration::from_secs(u64::from(order.estimated_time) * 60)
    }

    /// Elapsed share of the current phase, clamped to `[0, 1]`.
    fn phase_fraction(&self, order: &Order, now: Timestamp) -> f64 {
        let (start, length) = match order.status {
            OrderStatus::Pending => (order.created_at, self.estimate(order)),
            OrderStatus::Cooking => (order.cooking_at.unwrap_or(order.created_at), self.estimate(order)),
            OrderStatus::Ready if order.packed => return 1.0,
            OrderStatus::Ready => match order.pack_until {
                Some(deadline) => (deadline - self.packing_duration, self.packing_duration),
                None => return 1.0,
            },
            OrderStatus::Delivered => return 1.0,
        };
        let length_ms = length.as_millis() as f64;
        if length_ms <= 0.0 {
            return 1.0;
        }
        (now.millis_since(start) as f64 / length_ms).clamp(0.0, 1.0)
    }
}

impl Default for ProgressProjector {
    fn default() -> Self {
        Self::new(StatusTable::default(), Duration::from_millis(crate::config::DEFAULT_PACKING_DURATION_MS))
    }
}
