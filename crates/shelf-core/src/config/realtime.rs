//! Live-stream fanout configuration.

use serde::{Deserialize, Serialize};

/// Settings for upstream change feeds and subscriber delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Broadcast buffer size for each upstream feed.
    #[serde(default = "default_feed_buffer_size")]
    pub feed_buffer_size: usize,
    /// Per-subscriber delivery channel capacity.
    #[serde(default = "default_delivery_buffer_size")]
    pub delivery_buffer_size: usize,
    /// Delay before re-establishing a dropped upstream feed.
    #[serde(default = "default_resubscribe_delay_ms")]
    pub resubscribe_delay_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            feed_buffer_size: default_feed_buffer_size(),
            delivery_buffer_size: default_delivery_buffer_size(),
            resubscribe_delay_ms: default_resubscribe_delay_ms(),
        }
    }
}

fn default_feed_buffer_size() -> usize {
    64
}

fn default_delivery_buffer_size() -> usize {
    16
}

fn default_resubscribe_delay_ms() -> u64 {
    250
}
