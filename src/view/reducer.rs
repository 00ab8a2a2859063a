use super::event::{AppEvent, CycleData};
use super::state::{Gauges, ViewState};
use crate::agg;
use crate::config::Config;
use crate::direction::DirectionTracker;
use crate::notify::{DeltaNotifier, NotificationEvent};
use tokio::time::Instant;

pub struct ReduceOutcome {
    pub changed: bool,
    pub notification: Option<NotificationEvent>,
    /// Market volume of a freshly committed cycle; drives the sink's ambient
    /// level. `None` for events that leave the metrics untouched.
    pub ambient_volume: Option<f64>,
}

/// Apply one event to the view state. A `Cycle` replaces every derived view
/// in one step; nothing downstream can observe half of a refresh.
pub fn reduce(
    state: &mut ViewState,
    tracker: &mut DirectionTracker,
    notifier: &mut DeltaNotifier,
    cfg: &Config,
    ev: AppEvent,
) -> ReduceOutcome {
    match ev {
        AppEvent::Cycle(cycle) => commit_cycle(state, tracker, notifier, cfg, cycle),
        AppEvent::AgentStatsLoaded { agent_id, stats } => {
            state.inspected_agent = Some((agent_id, stats));
            ReduceOutcome {
                changed: true,
                notification: None,
                ambient_volume: None,
            }
        }
        AppEvent::ActionFailed { what } => {
            state.last_error = what;
            ReduceOutcome {
                changed: true,
                notification: None,
                ambient_volume: None,
            }
        }
        AppEvent::Reset => {
            state.clear();
            tracker.reset();
            state.direction = tracker.direction();
            ReduceOutcome {
                changed: true,
                notification: None,
                ambient_volume: None,
            }
        }
    }
}

fn commit_cycle(
    state: &mut ViewState,
    tracker: &mut DirectionTracker,
    notifier: &mut DeltaNotifier,
    cfg: &Config,
    cycle: CycleData,
) -> ReduceOutcome {
    // Delta detection runs against the buffer as it was before this commit.
    let notification = notifier.observe(&state.trades, &cycle.trades, Instant::now());

    // Append-then-truncate: only trades past the buffered watermark come in,
    // eviction is FIFO by arrival order.
    let watermark = state.trades.last().map(|t| t.trade_id);
    state.trades.extend(
        cycle
            .trades
            .into_iter()
            .filter(|t| t.is_well_formed())
            .filter(|t| watermark.map_or(true, |seen| t.trade_id > seen)),
    );
    let overflow = state.trades.len().saturating_sub(cfg.trade_buffer_cap);
    if overflow > 0 {
        state.trades.drain(..overflow);
    }

    state.price_history = cycle.price_history;
    let tail = state
        .price_history
        .len()
        .saturating_sub(cfg.price_history_cap);
    if tail > 0 {
        state.price_history.drain(..tail);
    }
    if let Some(sample) = state.price_history.last() {
        tracker.observe(sample.price);
    }
    state.direction = tracker.direction();

    // Derived views are rebuilt from scratch, never patched.
    state.heatmap = agg::bin_trades(&state.trades, cfg.heatmap_tick);
    state.depth = agg::build_layout(&cycle.book, cfg);
    state.overlay = agg::merge_overlay(&cycle.candles, &cycle.indicator);
    state.book = cycle.book;
    state.candles = cycle.candles;

    state.agents = cycle.agents;
    state.graph = cycle.graph;
    state.gauges = Gauges::from_metrics(&cycle.metrics, cfg);
    state.metrics = cycle.metrics;

    state.last_error.clear();
    state.committed_cycles += 1;

    ReduceOutcome {
        changed: true,
        notification,
        ambient_volume: Some(state.metrics.total_volume),
    }
}
