//! Engine timing and retry configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delays and retry bounds for the search and purchase engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Wait before each purchase pass after the first (milliseconds).
    /// Gives the vendor time to settle the previous payment.
    #[serde(default = "default_reload_delay")]
    pub reload_delay_ms: u64,

    /// Wait after `reload_page` before the first readiness probe (milliseconds).
    #[serde(default = "default_page_ready_initial_delay")]
    pub page_ready_initial_delay_ms: u64,

    /// Gap between readiness probes (milliseconds).
    #[serde(default = "default_page_ready_poll_interval")]
    pub page_ready_poll_interval_ms: u64,

    /// Readiness probes before giving up.
    #[serde(default = "default_page_ready_max_attempts")]
    pub page_ready_max_attempts: u32,

    /// Pause after each ticket click (milliseconds).
    #[serde(default = "default_click_pause")]
    pub click_pause_ms: u64,

    /// Wait after the last click for the payment panel (milliseconds).
    #[serde(default = "default_post_select_settle")]
    pub post_select_settle_ms: u64,

    /// Gap between payment control probes (milliseconds).
    #[serde(default = "default_payment_poll_interval")]
    pub payment_poll_interval_ms: u64,

    /// Payment control probes before giving up.
    #[serde(default = "default_payment_poll_max_attempts")]
    pub payment_poll_max_attempts: u32,

    /// How many search numbers the vendor filter accepts.
    #[serde(default = "default_filter_max_numbers")]
    pub filter_max_numbers: usize,
}

fn default_reload_delay() -> u64 {
    20_000 // 20 seconds
}

fn default_page_ready_initial_delay() -> u64 {
    2000
}

fn default_page_ready_poll_interval() -> u64 {
    500
}

fn default_page_ready_max_attempts() -> u32 {
    120 // one minute at the default interval
}

fn default_click_pause() -> u64 {
    1000
}

fn default_post_select_settle() -> u64 {
    2000
}

fn default_payment_poll_interval() -> u64 {
    1000
}

fn default_payment_poll_max_attempts() -> u32 {
    10
}

fn default_filter_max_numbers() -> usize {
    7
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reload_delay_ms: default_reload_delay(),
            page_ready_initial_delay_ms: default_page_ready_initial_delay(),
            page_ready_poll_interval_ms: default_page_ready_poll_interval(),
            page_ready_max_attempts: default_page_ready_max_attempts(),
            click_pause_ms: default_click_pause(),
            post_select_settle_ms: default_post_select_settle(),
            payment_poll_interval_ms: default_payment_poll_interval(),
            payment_poll_max_attempts: default_payment_poll_max_attempts(),
            filter_max_numbers: default_filter_max_numbers(),
        }
    }
}

impl EngineConfig {
    pub fn reload_delay(&self) -> Duration {
        Duration::from_millis(self.reload_delay_ms)
    }

    pub fn page_ready_initial_delay(&self) -> Duration {
        Duration::from_millis(self.page_ready_initial_delay_ms)
    }

    pub fn page_ready_poll_interval(&self) -> Duration {
        Duration::from_millis(self.page_ready_poll_interval_ms)
    }

    pub fn click_pause(&self) -> Duration {
        Duration::from_millis(self.click_pause_ms)
    }

    pub fn post_select_settle(&self) -> Duration {
        Duration::from_millis(self.post_select_settle_ms)
    }

    pub fn payment_poll_interval(&self) -> Duration {
        Duration::from_millis(self.payment_poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.reload_delay_ms, 20_000);
        assert_eq!(config.page_ready_initial_delay_ms, 2000);
        assert_eq!(config.page_ready_poll_interval_ms, 500);
        assert_eq!(config.click_pause_ms, 1000);
        assert_eq!(config.post_select_settle_ms, 2000);
        assert_eq!(config.payment_poll_max_attempts, 10);
        assert_eq!(config.filter_max_numbers, 7);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            reload_delay_ms = 5000
            payment_poll_max_attempts = 3
        "#;
        let config: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.reload_delay(), Duration::from_secs(5));
        assert_eq!(config.payment_poll_max_attempts, 3);
        assert_eq!(config.click_pause_ms, 1000);
    }
}
