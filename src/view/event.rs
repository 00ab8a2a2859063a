use crate::types::*;

/// Everything one scatter/gather refresh brought back. Built in full by the
/// scheduler and committed in full by the reducer; no partial variant exists.
#[derive(Clone, Debug)]
pub struct CycleData {
    pub trades: Vec<Trade>,
    pub book: BookSnapshot,
    pub price_history: Vec<PriceSample>,
    pub candles: Vec<Candle>,
    pub indicator: IndicatorSeries,
    pub agents: Vec<AgentPnl>,
    pub graph: AgentGraph,
    pub metrics: MarketMetrics,
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    /// A full refresh cycle finished; swap in the new snapshot.
    Cycle(CycleData),
    /// Per-agent stats arrived for the inspection card.
    AgentStatsLoaded { agent_id: u64, stats: AgentStats },
    /// A step/reset/agent action or a fetch failed; keep the old snapshot.
    ActionFailed { what: String },
    /// The simulation was reset; drop buffers and tracked memory.
    Reset,
}
