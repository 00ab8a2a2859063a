pub mod depth;
pub mod heatmap;
pub mod indicator;

pub use depth::{build_layout, DepthBar, DepthLayout};
pub use heatmap::{bin_trades, heat_color, Heatmap, HeatmapBin};
pub use indicator::{merge_overlay, OverlayPoint, OverlayValue};
