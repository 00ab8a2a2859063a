//! Delta notifier: turns the raw trade stream into at most one rate-limited
//! user-facing event per refresh cycle. Deciding *whether and for which trade*
//! to fire lives here; rendering the effect (sound, toast) is behind the
//! [`NotificationSink`] handle so tests can substitute a recording stub.

use crate::types::{Side, Trade};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NotificationEvent {
    pub side: Side,
    pub price: f64,
    pub quantity: u64,
    pub emitted_at: Instant,
}

impl NotificationEvent {
    pub fn toast_text(&self) -> String {
        format!(
            "{} {} @ {:.2}",
            self.side.as_str().to_uppercase(),
            self.quantity,
            self.price
        )
    }
}

/// Side-effect handle with an explicit lifecycle. One sink instance is wired
/// in at startup and shut down with the pipeline.
pub trait NotificationSink: Send {
    fn init(&mut self) {}
    fn notify(&mut self, event: &NotificationEvent);
    /// Ambient noise level for the current market volume, refreshed on each
    /// committed cycle. Sinks without an ambient channel ignore it.
    fn ambient(&mut self, _level_db: f64) {}
    fn shutdown(&mut self) {}
}

/// Sink that renders the toast as a log line and names the sound cue.
#[derive(Debug, Default)]
pub struct LogSink {
    muted: bool,
}

impl LogSink {
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

impl NotificationSink for LogSink {
    fn notify(&mut self, event: &NotificationEvent) {
        if self.muted {
            return;
        }
        tracing::info!(
            cue = crate::sound::cue_pitch(event.side),
            "trade {}",
            event.toast_text()
        );
    }

    fn ambient(&mut self, level_db: f64) {
        if self.muted {
            return;
        }
        tracing::debug!(level_db, "market ambience");
    }
}

pub struct DeltaNotifier {
    cooldown: Duration,
    last_emit: Option<Instant>,
}

impl DeltaNotifier {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_emit: None,
        }
    }

    /// Compare the previous buffer tail against the freshly fetched log and
    /// decide on a notification. Multiple new trades fold into one event built
    /// from the latest; anything inside the cooldown window is suppressed.
    pub fn observe(
        &mut self,
        previous: &[Trade],
        current: &[Trade],
        now: Instant,
    ) -> Option<NotificationEvent> {
        let watermark = previous.last().map(|t| t.trade_id);
        let latest_new = current
            .iter()
            .filter(|t| watermark.map_or(true, |seen| t.trade_id > seen))
            .last()?;

        if let Some(last) = self.last_emit {
            if now.duration_since(last) < self.cooldown {
                return None;
            }
        }
        self.last_emit = Some(now);

        Some(NotificationEvent {
            side: latest_new.side,
            price: latest_new.price,
            quantity: latest_new.quantity,
            emitted_at: now,
        })
    }
}
