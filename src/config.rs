use std::time::Duration;

use clap::Args;

use crate::input::DedupPolicy;

pub const DEFAULT_FEED_URL: &str = "http://localhost:3000/api/datos";

/// Options shared by every front end.
#[derive(Args, Clone, Debug)]
pub struct Settings {
    /// Endpoint returning the device's button presses as a JSON array.
    #[arg(long, env = "TRIQUI_FEED_URL", default_value = DEFAULT_FEED_URL)]
    pub feed_url: String,

    /// How often the device feed is polled, in milliseconds.
    #[arg(long, env = "TRIQUI_POLL_INTERVAL_MS", default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// How repeated device readings are recognized.
    #[arg(long, env = "TRIQUI_DEDUP", value_enum, default_value_t = DedupPolicy::Identifier)]
    pub dedup: DedupPolicy,

    /// Upper bound on a single feed request, in milliseconds.
    #[arg(long, env = "TRIQUI_REQUEST_TIMEOUT_MS", default_value_t = 5000)]
    pub request_timeout_ms: u64,
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }
}
