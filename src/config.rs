use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which overlay series the candle view asks the source for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Sma,
    Bbands,
}

impl IndicatorKind {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "bbands" | "bands" => IndicatorKind::Bbands,
            _ => IndicatorKind::Sma,
        }
    }
}

/// All tunables in one place: poll cadence, buffer caps, the heat-map tick,
/// the notification cooldown, and the depth-scene scales. Nothing downstream
/// hardcodes these.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the simulation service.
    pub base_url: String,

    /// Auto-run wall-clock period.
    pub poll_interval_ms: u64,
    /// Ticks advanced per auto-run step.
    pub step_size: u32,

    /// FIFO cap on the locally retained trade buffer.
    pub trade_buffer_cap: usize,
    /// Tail of the price history kept for charting.
    pub price_history_cap: usize,

    /// Minimum spacing between user-facing notifications.
    pub notify_cooldown_ms: u64,

    /// Price rounding granularity for heat-map bins.
    pub heatmap_tick: f64,

    /// Reference price when one side of the book is empty.
    pub depth_fallback_mid: f64,
    /// Horizontal stretch applied to (price - mid).
    pub depth_spread_scale: f64,
    /// Max bar height in scene units.
    pub depth_height_scale: f64,
    /// Front/back separation of bid vs ask bars.
    pub depth_side_offset: f64,

    /// Candle bucket size in simulation ticks.
    pub candle_timeframe: u32,
    pub indicator: IndicatorKind,
    pub indicator_period: u32,

    /// Full-scale values for the metrics gauges.
    pub gauge_volume_scale: f64,
    pub gauge_volatility_scale: f64,
    pub gauge_trades_scale: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            poll_interval_ms: 1000,
            step_size: 1,
            trade_buffer_cap: 100,
            price_history_cap: 500,
            notify_cooldown_ms: 500,
            heatmap_tick: 0.5,
            depth_fallback_mid: 100.0,
            depth_spread_scale: 2.0,
            depth_height_scale: 5.0,
            depth_side_offset: 0.5,
            candle_timeframe: 10,
            indicator: IndicatorKind::Sma,
            indicator_period: 20,
            gauge_volume_scale: 10_000.0,
            gauge_volatility_scale: 2.0,
            gauge_trades_scale: 1_000.0,
        }
    }
}

impl Config {
    /// Defaults overridden by `SIMVIZ_*` environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("SIMVIZ_BASE_URL") {
            cfg.base_url = v;
        }
        read_env("SIMVIZ_POLL_INTERVAL_MS", &mut cfg.poll_interval_ms);
        read_env("SIMVIZ_STEP_SIZE", &mut cfg.step_size);
        read_env("SIMVIZ_TRADE_BUFFER_CAP", &mut cfg.trade_buffer_cap);
        read_env("SIMVIZ_NOTIFY_COOLDOWN_MS", &mut cfg.notify_cooldown_ms);
        read_env("SIMVIZ_HEATMAP_TICK", &mut cfg.heatmap_tick);
        read_env("SIMVIZ_DEPTH_FALLBACK_MID", &mut cfg.depth_fallback_mid);
        read_env("SIMVIZ_CANDLE_TIMEFRAME", &mut cfg.candle_timeframe);
        read_env("SIMVIZ_INDICATOR_PERIOD", &mut cfg.indicator_period);
        if let Ok(v) = std::env::var("SIMVIZ_INDICATOR") {
            cfg.indicator = IndicatorKind::from_str(&v);
        }
        cfg
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn notify_cooldown(&self) -> Duration {
        Duration::from_millis(self.notify_cooldown_ms)
    }
}

fn read_env<T: std::str::FromStr>(key: &str, slot: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        if let Ok(v) = raw.trim().parse::<T>() {
            *slot = v;
        }
    }
}
