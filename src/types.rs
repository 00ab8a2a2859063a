use serde::{Deserialize, Serialize};

pub fn format_ts(ts: f64) -> String {
    use chrono::{Local, TimeZone};
    let dt = Local
        .timestamp_opt(ts as i64, 0)
        .single()
        .unwrap_or_else(|| Local.timestamp_opt(0, 0).single().unwrap());
    dt.format("%H:%M:%S").to_string()
}

// ---- market entities -------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: u64,
    pub timestamp: f64,
    pub price: f64,
    pub quantity: u64,
    pub side: Side,
}

impl Trade {
    /// A record with a non-finite price is unusable for any derived view.
    pub fn is_well_formed(&self) -> bool {
        self.price.is_finite() && self.timestamp.is_finite()
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PriceSample {
    pub time: f64,
    pub price: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: f64,
    pub volume: f64,
}

/// Bids descending, asks ascending, as delivered by the source feed.
/// The pipeline trusts the ordering and tolerates empty sides.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Candle {
    pub time: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SmaPoint {
    pub time: f64,
    pub sma: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BandPoint {
    pub time: f64,
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// One of the two indicator series the source can serve for a period setting.
#[derive(Clone, Debug)]
pub enum IndicatorSeries {
    Sma(Vec<SmaPoint>),
    Bands(Vec<BandPoint>),
}

// ---- agents & metrics ------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentType {
    NoiseTrader,
    MarketTaker,
    LiquidityProvider,
    #[serde(untagged)]
    Other(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Portfolio {
    pub cash: f64,
    pub shares: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentPnl {
    pub agent_id: u64,
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    pub portfolio: Portfolio,
    pub portfolio_value: f64,
    pub pnl: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentStats {
    pub total_trades: u64,
    pub volume_bought: u64,
    pub volume_sold: u64,
    pub net_volume: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: u64,
    #[serde(rename = "type")]
    pub agent_type: AgentType,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: u64,
    pub target: u64,
    pub value: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AgentGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct MarketMetrics {
    pub total_volume: f64,
    pub volatility: f64,
    pub trade_count: u64,
}
