//! 3-D depth layout: one bar per resting level, offset horizontally by the
//! distance to the mid price, scaled vertically by relative volume. Stateless;
//! rebuilt from the latest book snapshot each cycle.

use crate::config::Config;
use crate::types::{BookSnapshot, DepthLevel};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthBar {
    pub price: f64,
    pub volume: f64,
    /// `[x, y, z]` scene position; `y` centers the box on half its height.
    pub position: [f64; 3],
    /// Bar height in scene units, `volume / max_volume * height_scale`.
    pub scale: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DepthLayout {
    pub bid_bars: Vec<DepthBar>,
    pub ask_bars: Vec<DepthBar>,
    pub mid_price: f64,
    pub max_volume: f64,
}

fn bars(
    levels: &[DepthLevel],
    mid: f64,
    max_volume: f64,
    cfg: &Config,
    side_z: f64,
) -> Vec<DepthBar> {
    levels
        .iter()
        .filter(|lv| lv.price.is_finite() && lv.volume.is_finite() && lv.volume >= 0.0)
        .map(|lv| {
            let scale = lv.volume / max_volume * cfg.depth_height_scale;
            DepthBar {
                price: lv.price,
                volume: lv.volume,
                position: [(lv.price - mid) * cfg.depth_spread_scale, scale / 2.0, side_z],
                scale,
            }
        })
        .collect()
}

pub fn build_layout(book: &BookSnapshot, cfg: &Config) -> DepthLayout {
    // Floor of 1 keeps the division defined on an empty or all-zero book.
    let max_volume = book
        .bids
        .iter()
        .chain(book.asks.iter())
        .map(|lv| lv.volume)
        .filter(|v| v.is_finite())
        .fold(1.0f64, f64::max);

    // Sides arrive pre-sorted: best bid first, best ask first.
    let best_bid = book.bids.iter().map(|lv| lv.price).find(|p| p.is_finite());
    let best_ask = book.asks.iter().map(|lv| lv.price).find(|p| p.is_finite());
    let mid_price = (best_bid.unwrap_or(cfg.depth_fallback_mid)
        + best_ask.unwrap_or(cfg.depth_fallback_mid))
        / 2.0;

    DepthLayout {
        bid_bars: bars(&book.bids, mid_price, max_volume, cfg, cfg.depth_side_offset),
        ask_bars: bars(&book.asks, mid_price, max_volume, cfg, -cfg.depth_side_offset),
        mid_price,
        max_volume,
    }
}
