//! Trade-volume heat map: bucket the retained trades by price tick and track
//! the hottest bin. Fully rebuilt from the current buffer on every cycle, so
//! the bins can never drift away from the trades they summarize.

use crate::types::Trade;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatmapBin {
    /// Price rounded to the configured tick.
    pub price: f64,
    pub volume: f64,
}

#[derive(Clone, Debug, Default)]
pub struct Heatmap {
    /// Sorted highest price first.
    pub bins: Vec<HeatmapBin>,
    pub max_volume: f64,
}

/// Bucket key in integer ticks, so the map key is hashable and exact.
fn tick_key(price: f64, tick: f64) -> i64 {
    (price / tick).round() as i64
}

pub fn bin_trades(trades: &[Trade], tick: f64) -> Heatmap {
    let tick = if tick.is_finite() && tick > 0.0 { tick } else { 0.5 };

    let mut acc: std::collections::HashMap<i64, f64> = std::collections::HashMap::new();
    let mut max_volume = 0.0f64;

    for trade in trades {
        if !trade.is_well_formed() || trade.quantity == 0 {
            continue;
        }
        let key = tick_key(trade.price, tick);
        let vol = acc.entry(key).or_insert(0.0);
        *vol += trade.quantity as f64;
        if *vol > max_volume {
            max_volume = *vol;
        }
    }

    let mut bins: Vec<HeatmapBin> = acc
        .into_iter()
        .map(|(key, volume)| HeatmapBin {
            price: key as f64 * tick,
            volume,
        })
        .collect();
    bins.sort_by(|a, b| b.price.partial_cmp(&a.price).unwrap_or(std::cmp::Ordering::Equal));

    Heatmap { bins, max_volume }
}

/// HSL hue for a bin: blue (240°) when cold, red (0°) when at the running
/// maximum. Square-root scaling spreads the low-volume end visually.
/// Returns `(hue_degrees, intensity)`; an empty map pins every bin to the
/// neutral cold end.
pub fn heat_color(volume: f64, max_volume: f64) -> (f64, f64) {
    if max_volume <= 0.0 {
        return (240.0, 0.0);
    }
    let intensity = (volume / max_volume).clamp(0.0, 1.0).sqrt();
    (240.0 * (1.0 - intensity), intensity)
}
