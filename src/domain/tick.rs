//! Short-horizon distance between two readings of the client tick counter.

use serde::{Deserialize, Serialize};

/// Number of client ticks between two events of the same trade.
///
/// The client tick counter is small and wraps, so a `TickDelta` is only
/// meaningful when both readings were taken a few ticks apart. Compare it
/// against small thresholds with [`TickDelta::within`]; never convert it into
/// a wall-clock duration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TickDelta(u32);

impl TickDelta {
    pub const ZERO: TickDelta = TickDelta(0);

    pub fn new(ticks: u32) -> Self {
        TickDelta(ticks)
    }

    /// Distance between two counter readings, taking the shorter way round
    /// the wrap point.
    pub fn between(a: u32, b: u32) -> Self {
        TickDelta(a.wrapping_sub(b).min(b.wrapping_sub(a)))
    }

    /// Add another delta (saturating).
    pub fn saturating_add(self, other: TickDelta) -> Self {
        TickDelta(self.0.saturating_add(other.0))
    }

    /// True when this delta is at most `threshold` ticks.
    pub fn within(&self, threshold: u32) -> bool {
        self.0 <= threshold
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}
