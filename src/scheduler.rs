//! Refresh scheduler: drives step requests, the auto-run timer, and reset.
//!
//! All scheduling runs on one task, so cycles are serialized by construction;
//! an auto-run tick that lands while a cycle is still in flight is skipped,
//! never stacked: `MissedTickBehavior::Skip` keeps the cadence on period
//! boundaries, and a delivered tick whose deadline already expired mid-cycle
//! is discarded rather than run back-to-back. Completed cycles leave here
//! only as whole `AppEvent`s.

use crate::client::DataSource;
use crate::config::{Config, IndicatorKind};
use crate::error::Result;
use crate::types::{AgentType, IndicatorSeries};
use crate::view::{AppEvent, CycleData};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// A tick this far past its deadline was held up by an in-flight cycle and is
/// dropped; anything closer is ordinary runtime jitter.
const STALE_TICK_GRACE: Duration = Duration::from_millis(50);

#[derive(Debug)]
enum Command {
    Refresh,
    Step(u32),
    StartAuto,
    StopAuto,
    SetStepSize(u32),
    Reset,
    CreateAgents { agent_type: AgentType, count: u32 },
    DeleteAgent { agent_id: u64 },
    FetchAgentStats { agent_id: u64 },
    Shutdown,
}

/// Handle to the scheduler task. Dropping the handle without `shutdown` keeps
/// the task alive until the command channel closes.
pub struct RefreshScheduler {
    cmd_tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn spawn(
        cfg: Config,
        source: Arc<dyn DataSource>,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_loop(cfg, source, events, cmd_rx));
        Self { cmd_tx, task }
    }

    fn send(&self, cmd: Command) {
        let _ = self.cmd_tx.send(cmd);
    }

    /// One fan-out fetch without advancing the simulation.
    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    /// Advance the simulation by `count` ticks, then refresh once.
    pub fn step(&self, count: u32) {
        self.send(Command::Step(count));
    }

    /// Begin auto-run; the first tick fires one full period from now.
    pub fn start(&self) {
        self.send(Command::StartAuto);
    }

    /// Stop auto-run; a tick already in progress still completes.
    pub fn stop(&self) {
        self.send(Command::StopAuto);
    }

    /// Takes effect on the next auto-run tick, not retroactively.
    pub fn set_step_size(&self, count: u32) {
        self.send(Command::SetStepSize(count));
    }

    /// Cancel the pending tick, reset the simulation, clear tracked state,
    /// refresh once.
    pub fn reset(&self) {
        self.send(Command::Reset);
    }

    pub fn create_agents(&self, agent_type: AgentType, count: u32) {
        self.send(Command::CreateAgents { agent_type, count });
    }

    pub fn delete_agent(&self, agent_id: u64) {
        self.send(Command::DeleteAgent { agent_id });
    }

    /// Pull the per-agent trade stats for the inspection card. Does not
    /// advance the simulation or touch the refresh cadence.
    pub fn fetch_agent_stats(&self, agent_id: u64) {
        self.send(Command::FetchAgentStats { agent_id });
    }

    /// Ends the scheduler task and releases its timer.
    pub async fn shutdown(self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
        let _ = self.task.await;
    }
}

async fn run_loop(
    cfg: Config,
    source: Arc<dyn DataSource>,
    events: mpsc::UnboundedSender<AppEvent>,
    mut cmds: mpsc::UnboundedReceiver<Command>,
) {
    let period = cfg.poll_interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut auto_run = false;
    let mut step_size = cfg.step_size.max(1);

    loop {
        tokio::select! {
            cmd = cmds.recv() => {
                match cmd {
                    None | Some(Command::Shutdown) => break,
                    Some(Command::Refresh) => refresh(&cfg, source.as_ref(), &events).await,
                    Some(Command::Step(count)) => {
                        run_cycle(&cfg, source.as_ref(), &events, count).await;
                    }
                    Some(Command::StartAuto) => {
                        ticker.reset();
                        auto_run = true;
                        debug!(period_ms = cfg.poll_interval_ms, "auto-run started");
                    }
                    Some(Command::StopAuto) => {
                        auto_run = false;
                        debug!("auto-run stopped");
                    }
                    Some(Command::SetStepSize(count)) => {
                        step_size = count.max(1);
                    }
                    Some(Command::Reset) => {
                        // the pending tick must not fire mid-reset
                        ticker.reset();
                        match source.reset().await {
                            Ok(()) => {
                                let _ = events.send(AppEvent::Reset);
                                refresh(&cfg, source.as_ref(), &events).await;
                            }
                            Err(err) => {
                                warn!(error = %err, "simulation reset failed");
                                let _ = events.send(AppEvent::ActionFailed {
                                    what: err.to_string(),
                                });
                            }
                        }
                    }
                    Some(Command::CreateAgents { agent_type, count }) => {
                        match source.create_agents(&agent_type, count).await {
                            Ok(()) => refresh(&cfg, source.as_ref(), &events).await,
                            Err(err) => {
                                warn!(error = %err, "create agents failed");
                                let _ = events.send(AppEvent::ActionFailed {
                                    what: err.to_string(),
                                });
                            }
                        }
                    }
                    Some(Command::DeleteAgent { agent_id }) => {
                        match source.delete_agent(agent_id).await {
                            Ok(()) => refresh(&cfg, source.as_ref(), &events).await,
                            Err(err) => {
                                warn!(error = %err, agent_id, "delete agent failed");
                                let _ = events.send(AppEvent::ActionFailed {
                                    what: err.to_string(),
                                });
                            }
                        }
                    }
                    Some(Command::FetchAgentStats { agent_id }) => {
                        match source.agent_stats(agent_id).await {
                            Ok(stats) => {
                                let _ = events.send(AppEvent::AgentStatsLoaded { agent_id, stats });
                            }
                            Err(err) => {
                                warn!(error = %err, agent_id, "agent stats fetch failed");
                                let _ = events.send(AppEvent::ActionFailed {
                                    what: err.to_string(),
                                });
                            }
                        }
                    }
                }
            }
            deadline = ticker.tick() => {
                if auto_run {
                    let overdue = Instant::now().duration_since(deadline);
                    if overdue > STALE_TICK_GRACE {
                        debug!(overdue_ms = overdue.as_millis() as u64, "dropping tick that expired mid-cycle");
                    } else {
                        run_cycle(&cfg, source.as_ref(), &events, step_size).await;
                    }
                }
            }
        }
    }
}

/// One step-then-refresh cycle. A failed step leaves the prior snapshot
/// untouched and does not halt auto-run.
async fn run_cycle(
    cfg: &Config,
    source: &dyn DataSource,
    events: &mpsc::UnboundedSender<AppEvent>,
    ticks: u32,
) {
    if let Err(err) = source.step(ticks).await {
        warn!(error = %err, ticks, "simulation step failed");
        let _ = events.send(AppEvent::ActionFailed {
            what: err.to_string(),
        });
        return;
    }
    refresh(cfg, source, events).await;
}

async fn refresh(cfg: &Config, source: &dyn DataSource, events: &mpsc::UnboundedSender<AppEvent>) {
    match fetch_cycle(cfg, source).await {
        Ok(data) => {
            let _ = events.send(AppEvent::Cycle(data));
        }
        Err(err) => {
            warn!(error = %err, "refresh failed; keeping previous snapshot");
            let _ = events.send(AppEvent::ActionFailed {
                what: err.to_string(),
            });
        }
    }
}

/// Scatter/gather over every read endpoint. `tokio::join!` runs the fetches
/// concurrently and lets siblings finish even when one fails; a failure then
/// aborts the commit, not the in-flight requests.
async fn fetch_cycle(cfg: &Config, source: &dyn DataSource) -> Result<CycleData> {
    let indicator = async {
        match cfg.indicator {
            IndicatorKind::Sma => source
                .sma(cfg.indicator_period)
                .await
                .map(IndicatorSeries::Sma),
            IndicatorKind::Bbands => source
                .bands(cfg.indicator_period)
                .await
                .map(IndicatorSeries::Bands),
        }
    };

    let (trades, book, price_history, candles, indicator, agents, graph, metrics) = tokio::join!(
        source.trades(),
        source.book(),
        source.price_history(),
        source.candles(cfg.candle_timeframe),
        indicator,
        source.agent_pnl(),
        source.agent_graph(),
        source.metrics(),
    );

    Ok(CycleData {
        trades: trades?,
        book: book?,
        price_history: price_history?,
        candles: candles?,
        indicator: indicator?,
        agents: agents?,
        graph: graph?,
        metrics: metrics?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimVizError;
    use crate::types::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct StubInner {
        steps: Vec<u32>,
        resets: usize,
        trades: Vec<Trade>,
    }

    /// Scripted source: every `step(n)` appends `n` trades to its own log.
    #[derive(Default)]
    struct StubSource {
        inner: Mutex<StubInner>,
        fail_step: AtomicBool,
        fail_trades: AtomicBool,
        fetch_delay_ms: u64,
    }

    impl StubSource {
        fn steps(&self) -> Vec<u32> {
            self.inner.lock().unwrap().steps.clone()
        }

        fn resets(&self) -> usize {
            self.inner.lock().unwrap().resets
        }
    }

    fn action_err(action: &'static str) -> SimVizError {
        SimVizError::Action {
            action,
            detail: "scripted failure".to_string(),
        }
    }

    #[async_trait]
    impl DataSource for StubSource {
        async fn trades(&self) -> Result<Vec<Trade>> {
            if self.fetch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.fetch_delay_ms)).await;
            }
            if self.fail_trades.load(Ordering::SeqCst) {
                return Err(action_err("trades"));
            }
            Ok(self.inner.lock().unwrap().trades.clone())
        }

        async fn book(&self) -> Result<BookSnapshot> {
            Ok(BookSnapshot::default())
        }

        async fn price_history(&self) -> Result<Vec<PriceSample>> {
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .trades
                .iter()
                .map(|t| PriceSample {
                    time: t.timestamp,
                    price: t.price,
                })
                .collect())
        }

        async fn candles(&self, _timeframe: u32) -> Result<Vec<Candle>> {
            Ok(Vec::new())
        }

        async fn sma(&self, _period: u32) -> Result<Vec<SmaPoint>> {
            Ok(Vec::new())
        }

        async fn bands(&self, _period: u32) -> Result<Vec<BandPoint>> {
            Ok(Vec::new())
        }

        async fn agent_pnl(&self) -> Result<Vec<AgentPnl>> {
            Ok(Vec::new())
        }

        async fn agent_graph(&self) -> Result<AgentGraph> {
            Ok(AgentGraph::default())
        }

        async fn metrics(&self) -> Result<MarketMetrics> {
            Ok(MarketMetrics::default())
        }

        async fn agent_stats(&self, agent_id: u64) -> Result<AgentStats> {
            Ok(AgentStats {
                total_trades: agent_id,
                volume_bought: 40,
                volume_sold: 30,
                net_volume: 10,
            })
        }

        async fn step(&self, ticks: u32) -> Result<()> {
            if self.fail_step.load(Ordering::SeqCst) {
                return Err(action_err("step"));
            }
            let mut inner = self.inner.lock().unwrap();
            inner.steps.push(ticks);
            for _ in 0..ticks {
                let id = inner.trades.len() as u64 + 1;
                inner.trades.push(Trade {
                    trade_id: id,
                    timestamp: id as f64,
                    price: 100.0 + id as f64,
                    quantity: 1,
                    side: Side::Buy,
                });
            }
            Ok(())
        }

        async fn reset(&self) -> Result<()> {
            let mut inner = self.inner.lock().unwrap();
            inner.resets += 1;
            inner.trades.clear();
            Ok(())
        }

        async fn create_agents(&self, _agent_type: &AgentType, _count: u32) -> Result<()> {
            Ok(())
        }

        async fn delete_agent(&self, _agent_id: u64) -> Result<()> {
            Ok(())
        }
    }

    fn spawn_with(
        source: Arc<StubSource>,
        cfg: Config,
    ) -> (RefreshScheduler, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (RefreshScheduler::spawn(cfg, source, tx), rx)
    }

    async fn settle() {
        // let the scheduler task drain its queued commands
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Vec<AppEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    fn count_cycles(events: &[AppEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, AppEvent::Cycle(_)))
            .count()
    }

    #[tokio::test(start_paused = true)]
    async fn step_issues_one_advance_and_one_refresh() {
        let source = Arc::new(StubSource::default());
        let (sched, mut rx) = spawn_with(source.clone(), Config::default());

        sched.step(3);
        settle().await;

        assert_eq!(source.steps(), vec![3]);
        let events = drain(&mut rx);
        assert_eq!(count_cycles(&events), 1);
        sched.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn auto_run_ticks_on_the_wall_clock_and_honors_live_step_size() {
        let source = Arc::new(StubSource::default());
        let (sched, mut rx) = spawn_with(source.clone(), Config::default());

        sched.start();
        settle().await;
        assert!(source.steps().is_empty(), "first tick is a full period away");

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(source.steps(), vec![1]);

        // adjusting the step size applies to the next tick
        sched.set_step_size(5);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(source.steps(), vec![1, 5]);

        sched.stop();
        settle().await;
        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(source.steps(), vec![1, 5], "no ticks after stop");

        let events = drain(&mut rx);
        assert_eq!(count_cycles(&events), 2);
        sched.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_ticks_are_skipped_not_queued() {
        let source = Arc::new(StubSource {
            fetch_delay_ms: 2500,
            ..StubSource::default()
        });
        let (sched, mut rx) = spawn_with(source.clone(), Config::default());

        sched.start();
        // first tick at t=1s, its refresh holds the loop until t=3.5s; the
        // ticks due at 2s and 3s expire mid-cycle and are discarded, so no
        // back-to-back cycle starts at 3.5s
        tokio::time::sleep(Duration::from_millis(3700)).await;
        assert_eq!(source.steps().len(), 1, "no catch-up cycle right after the overrun");

        // cadence resumes on the boundary: the next cycle runs at 4s and
        // finishes at 6.5s, where the stale 5s/6s ticks are discarded again
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(source.steps().len(), 2, "overlapped ticks were skipped");

        let events = drain(&mut rx);
        assert_eq!(count_cycles(&events), 2);
        sched.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_the_pending_tick_and_clears_state() {
        let source = Arc::new(StubSource::default());
        let (sched, mut rx) = spawn_with(source.clone(), Config::default());

        sched.start();
        settle().await;

        // halfway into the period, reset
        tokio::time::sleep(Duration::from_millis(500)).await;
        sched.reset();
        settle().await;
        assert_eq!(source.resets(), 1);

        let events = drain(&mut rx);
        assert!(matches!(events[0], AppEvent::Reset));
        assert_eq!(count_cycles(&events), 1, "reset performs one refresh");

        // the tick originally due at t=1s must not fire; next is 1s after reset
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert!(source.steps().is_empty());
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(source.steps(), vec![1]);
        sched.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_step_reports_and_keeps_running() {
        let source = Arc::new(StubSource::default());
        source.fail_step.store(true, Ordering::SeqCst);
        let (sched, mut rx) = spawn_with(source.clone(), Config::default());

        sched.start();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let events = drain(&mut rx);
        assert_eq!(count_cycles(&events), 0);
        assert!(events
            .iter()
            .any(|e| matches!(e, AppEvent::ActionFailed { .. })));

        // auto-run is still alive: clear the fault and the next tick succeeds
        source.fail_step.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let events = drain(&mut rx);
        assert_eq!(count_cycles(&events), 1);
        sched.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn agent_stats_fetch_emits_a_loaded_event() {
        let source = Arc::new(StubSource::default());
        let (sched, mut rx) = spawn_with(source.clone(), Config::default());

        sched.fetch_agent_stats(42);
        settle().await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            AppEvent::AgentStatsLoaded { agent_id, stats } => {
                assert_eq!(*agent_id, 42);
                assert_eq!(stats.total_trades, 42);
                assert_eq!(stats.net_volume, 10);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        sched.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_aborts_the_commit() {
        let source = Arc::new(StubSource::default());
        source.fail_trades.store(true, Ordering::SeqCst);
        let (sched, mut rx) = spawn_with(source.clone(), Config::default());

        sched.refresh();
        settle().await;

        let events = drain(&mut rx);
        assert_eq!(count_cycles(&events), 0);
        assert!(matches!(events[0], AppEvent::ActionFailed { .. }));
        sched.shutdown().await;
    }
}
