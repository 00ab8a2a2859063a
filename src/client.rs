use crate::error::{Result, SimVizError};
use crate::types::*;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Read and action operations of the simulation service. The scheduler only
/// ever talks to this trait, so tests can script a stub source.
#[async_trait]
pub trait DataSource: Send + Sync {
    // reads
    async fn trades(&self) -> Result<Vec<Trade>>;
    async fn book(&self) -> Result<BookSnapshot>;
    async fn price_history(&self) -> Result<Vec<PriceSample>>;
    async fn candles(&self, timeframe: u32) -> Result<Vec<Candle>>;
    async fn sma(&self, period: u32) -> Result<Vec<SmaPoint>>;
    async fn bands(&self, period: u32) -> Result<Vec<BandPoint>>;
    async fn agent_pnl(&self) -> Result<Vec<AgentPnl>>;
    async fn agent_graph(&self) -> Result<AgentGraph>;
    async fn metrics(&self) -> Result<MarketMetrics>;
    async fn agent_stats(&self, agent_id: u64) -> Result<AgentStats>;

    // actions
    async fn step(&self, ticks: u32) -> Result<()>;
    async fn reset(&self) -> Result<()>;
    async fn create_agents(&self, agent_type: &AgentType, count: u32) -> Result<()>;
    async fn delete_agent(&self, agent_id: u64) -> Result<()>;
}

/// Thin reqwest adapter over the service's JSON endpoints. Holds nothing but
/// the client handle and the base URL.
pub struct HttpDataSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDataSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str, path: &str) -> Result<T> {
        let resp = self.http.get(self.url(path)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SimVizError::Status { endpoint, status });
        }
        resp.json::<T>().await.map_err(|e| SimVizError::Payload {
            endpoint,
            detail: e.to_string(),
        })
    }

    async fn post_action(&self, action: &'static str, path: &str) -> Result<()> {
        let resp = self.http.post(self.url(path)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SimVizError::Action {
                action,
                detail: format!("status {status}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn trades(&self) -> Result<Vec<Trade>> {
        self.get_json("trades", "/data/trades").await
    }

    async fn book(&self) -> Result<BookSnapshot> {
        self.get_json("book", "/data/book").await
    }

    async fn price_history(&self) -> Result<Vec<PriceSample>> {
        self.get_json("price-history", "/data/price-history").await
    }

    async fn candles(&self, timeframe: u32) -> Result<Vec<Candle>> {
        self.get_json(
            "candlestick",
            &format!("/data/candlestick?timeframe={timeframe}"),
        )
        .await
    }

    async fn sma(&self, period: u32) -> Result<Vec<SmaPoint>> {
        self.get_json("sma", &format!("/data/indicators/sma?period={period}"))
            .await
    }

    async fn bands(&self, period: u32) -> Result<Vec<BandPoint>> {
        self.get_json(
            "bbands",
            &format!("/data/indicators/bbands?period={period}"),
        )
        .await
    }

    async fn agent_pnl(&self) -> Result<Vec<AgentPnl>> {
        self.get_json("agent-pnl", "/data/agent-pnl").await
    }

    async fn agent_graph(&self) -> Result<AgentGraph> {
        self.get_json("agent-graph", "/data/agent-graph").await
    }

    async fn metrics(&self) -> Result<MarketMetrics> {
        self.get_json("metrics", "/data/metrics").await
    }

    async fn agent_stats(&self, agent_id: u64) -> Result<AgentStats> {
        self.get_json("agent-stats", &format!("/agents/{agent_id}/stats"))
            .await
    }

    async fn step(&self, ticks: u32) -> Result<()> {
        self.post_action("step", &format!("/simulation/step?ticks={ticks}"))
            .await
    }

    async fn reset(&self) -> Result<()> {
        self.post_action("reset", "/simulation/reset").await
    }

    async fn create_agents(&self, agent_type: &AgentType, count: u32) -> Result<()> {
        let body = serde_json::json!({ "agent_type": agent_type, "count": count });
        let resp = self.http.post(self.url("/agents")).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SimVizError::Action {
                action: "create-agents",
                detail: format!("status {status}"),
            });
        }
        Ok(())
    }

    async fn delete_agent(&self, agent_id: u64) -> Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/agents/{agent_id}")))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SimVizError::Action {
                action: "delete-agent",
                detail: format!("status {status}"),
            });
        }
        Ok(())
    }
}
