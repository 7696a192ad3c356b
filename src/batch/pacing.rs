//! Inter-item delays and periodic cooldowns.

use rand::Rng;
use std::time::Duration;

/// How hard the batch leans on the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub item_delay_min: Duration,
    pub item_delay_max: Duration,
    /// Checkpoint every N items; 0 means only at the final item
    pub checkpoint_every: usize,
    pub cooldown_min: Duration,
    pub cooldown_max: Duration,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            item_delay_min: Duration::from_secs(3),
            item_delay_max: Duration::from_secs(6),
            checkpoint_every: 20,
            cooldown_min: Duration::from_secs(30),
            cooldown_max: Duration::from_secs(50),
        }
    }
}

impl PacingPolicy {
    /// No pauses at all, checkpoint every `checkpoint_every` items.
    pub fn immediate(checkpoint_every: usize) -> Self {
        Self {
            item_delay_min: Duration::ZERO,
            item_delay_max: Duration::ZERO,
            checkpoint_every,
            cooldown_min: Duration::ZERO,
            cooldown_max: Duration::ZERO,
        }
    }

    /// Pause after one item.
    pub fn item_delay(&self) -> Duration {
        jitter(self.item_delay_min, self.item_delay_max)
    }

    /// Pause after a checkpoint.
    pub fn cooldown(&self) -> Duration {
        jitter(self.cooldown_min, self.cooldown_max)
    }

    /// Whether the 1-based `index` of `total` is a checkpoint.
    pub fn is_checkpoint(&self, index: usize, total: usize) -> bool {
        index == total || (self.checkpoint_every > 0 && index % self.checkpoint_every == 0)
    }
}

fn jitter(min: Duration, max: Duration) -> Duration {
    let lo = min.as_millis() as u64;
    let hi = max.as_millis() as u64;

    if hi <= lo {
        return min;
    }

    Duration::from_millis(rand::rng().random_range(lo..=hi))
}
