pub mod event;
pub mod reducer;
pub mod state;

pub use event::*;
pub use state::*;

use crate::config::Config;
use crate::direction::DirectionTracker;
use crate::notify::{DeltaNotifier, NotificationSink};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Owns the view state and everything that persists across cycles. Consumes
/// `AppEvent`s from the scheduler, commits snapshots atomically, and drives
/// the notification sink.
pub struct ViewRuntime {
    state: ViewState,
    tracker: DirectionTracker,
    notifier: DeltaNotifier,
    sink: Box<dyn NotificationSink>,
    cfg: Config,
    published: watch::Sender<Arc<ViewState>>,
}

impl ViewRuntime {
    pub fn new(cfg: Config, mut sink: Box<dyn NotificationSink>) -> (Self, watch::Receiver<Arc<ViewState>>) {
        sink.init();
        let (published, rx) = watch::channel(Arc::new(ViewState::default()));
        let notifier = DeltaNotifier::new(cfg.notify_cooldown());
        (
            Self {
                state: ViewState::default(),
                tracker: DirectionTracker::new(),
                notifier,
                sink,
                cfg,
                published,
            },
            rx,
        )
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn handle_event(&mut self, ev: AppEvent) {
        let outcome = reducer::reduce(
            &mut self.state,
            &mut self.tracker,
            &mut self.notifier,
            &self.cfg,
            ev,
        );
        if outcome.changed {
            // Subscribers only ever see fully committed snapshots.
            self.published.send_replace(Arc::new(self.state.clone()));
        }
        if let Some(notification) = outcome.notification {
            self.sink.notify(&notification);
        }
        if let Some(volume) = outcome.ambient_volume {
            self.sink.ambient(crate::sound::ambient_level_db(volume));
        }
    }

    /// Drain events until the channel closes, then release the sink.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<AppEvent>) {
        while let Some(ev) = events.recv().await {
            self.handle_event(ev);
        }
        self.sink.shutdown();
    }
}
