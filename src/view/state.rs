use crate::agg::{DepthLayout, Heatmap, OverlayPoint};
use crate::config::Config;
use crate::direction::Direction;
use crate::types::*;

/// Normalized gauge positions for the metrics dashboard, each clamped to 0..=1.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Gauges {
    pub volume: f64,
    pub volatility: f64,
    pub trades: f64,
}

impl Gauges {
    pub fn from_metrics(metrics: &MarketMetrics, cfg: &Config) -> Self {
        fn norm(value: f64, scale: f64) -> f64 {
            if scale <= 0.0 || !value.is_finite() {
                return 0.0;
            }
            (value / scale).clamp(0.0, 1.0)
        }
        Self {
            volume: norm(metrics.total_volume, cfg.gauge_volume_scale),
            volatility: norm(metrics.volatility, cfg.gauge_volatility_scale),
            trades: norm(metrics.trade_count as f64, cfg.gauge_trades_scale),
        }
    }
}

/// The render-ready snapshot. Replaced wholesale on each committed cycle;
/// only the trade buffer appends-then-truncates and the direction memory
/// persists across cycles (until reset).
#[derive(Clone, Debug, Default)]
pub struct ViewState {
    /// FIFO tail of the source trade log, capped at `trade_buffer_cap`.
    pub trades: Vec<Trade>,
    pub price_history: Vec<PriceSample>,
    pub book: BookSnapshot,
    pub candles: Vec<Candle>,
    pub overlay: Vec<OverlayPoint>,
    pub heatmap: Heatmap,
    pub depth: DepthLayout,
    pub direction: Direction,
    pub agents: Vec<AgentPnl>,
    pub graph: AgentGraph,
    /// Stats of the agent last picked for inspection, kept until replaced
    /// or reset.
    pub inspected_agent: Option<(u64, AgentStats)>,
    pub metrics: MarketMetrics,
    pub gauges: Gauges,
    /// One-shot user-visible note from the last failed action; empty when clear.
    pub last_error: String,
    /// Count of committed cycles, for display and staleness checks.
    pub committed_cycles: u64,
}

impl ViewState {
    pub fn last_price(&self) -> Option<f64> {
        self.price_history.last().map(|s| s.price)
    }

    /// Drop everything derived and buffered; used on simulation reset.
    pub fn clear(&mut self) {
        *self = ViewState {
            committed_cycles: self.committed_cycles,
            ..ViewState::default()
        };
    }
}
