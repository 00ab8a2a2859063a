//! Client-side pipeline for the market simulation service: periodic polling,
//! bounded local state, and the derived views (heat map, depth layout,
//! indicator overlay) the display layer renders from.

pub mod agg;
pub mod client;
pub mod config;
pub mod direction;
pub mod error;
pub mod notify;
pub mod scheduler;
pub mod sound;
pub mod types;
pub mod view;

pub use client::{DataSource, HttpDataSource};
pub use config::{Config, IndicatorKind};
pub use error::{Result, SimVizError};
pub use scheduler::RefreshScheduler;
pub use view::{AppEvent, ViewRuntime, ViewState};
