use anyhow::Result;
use simviz::notify::LogSink;
use simviz::types::format_ts;
use simviz::{Config, HttpDataSource, RefreshScheduler, ViewRuntime};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = Config::from_env();
    info!(base_url = %cfg.base_url, interval_ms = cfg.poll_interval_ms, "starting simviz");

    let source = Arc::new(HttpDataSource::new(cfg.base_url.clone())?);
    let (runtime, mut snapshots) = ViewRuntime::new(cfg.clone(), Box::<LogSink>::default());

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let runtime_task = tokio::spawn(runtime.run(events_rx));

    let scheduler = RefreshScheduler::spawn(cfg, source, events_tx);
    scheduler.refresh();
    scheduler.start();

    // One-line summary per committed snapshot until ctrl-c.
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = snapshots.borrow_and_update().clone();
                let last = snap
                    .price_history
                    .last()
                    .map(|s| format!("{:.2} at {}", s.price, format_ts(s.time)))
                    .unwrap_or_else(|| "-".to_string());
                info!(
                    cycle = snap.committed_cycles,
                    trades = snap.trades.len(),
                    bins = snap.heatmap.bins.len(),
                    candles = snap.candles.len(),
                    direction = ?snap.direction,
                    last_price = %last,
                    "snapshot"
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    scheduler.shutdown().await;
    drop(snapshots);
    runtime_task.await?;
    Ok(())
}
