//! Candle/indicator overlay merge. Indicator points only survive if their
//! timestamp matches a candle bucket; everything else is dropped, never
//! extrapolated, so the overlay axis stays a subset of the candle axis.

use crate::types::{Candle, IndicatorSeries};
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OverlayValue {
    Sma(f64),
    Bands { upper: f64, middle: f64, lower: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayPoint {
    pub time: f64,
    pub value: OverlayValue,
}

/// Candle times keyed in milliseconds so float axis values compare exactly.
fn time_key(time: f64) -> i64 {
    (time * 1000.0).round() as i64
}

pub fn merge_overlay(candles: &[Candle], series: &IndicatorSeries) -> Vec<OverlayPoint> {
    let axis: HashSet<i64> = candles
        .iter()
        .filter(|c| c.time.is_finite())
        .map(|c| time_key(c.time))
        .collect();

    match series {
        IndicatorSeries::Sma(points) => points
            .iter()
            .filter(|p| p.time.is_finite() && p.sma.is_finite())
            .filter(|p| axis.contains(&time_key(p.time)))
            .map(|p| OverlayPoint {
                time: p.time,
                value: OverlayValue::Sma(p.sma),
            })
            .collect(),
        IndicatorSeries::Bands(points) => points
            .iter()
            .filter(|p| {
                p.time.is_finite()
                    && p.upper.is_finite()
                    && p.middle.is_finite()
                    && p.lower.is_finite()
            })
            .filter(|p| axis.contains(&time_key(p.time)))
            .map(|p| OverlayPoint {
                time: p.time,
                value: OverlayValue::Bands {
                    upper: p.upper,
                    middle: p.middle,
                    lower: p.lower,
                },
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BandPoint, SmaPoint};

    fn candle(time: f64) -> Candle {
        Candle {
            time,
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
            volume: 10.0,
        }
    }

    #[test]
    fn overlay_axis_is_subset_of_candle_axis() {
        let candles: Vec<Candle> = [10.0, 20.0, 30.0].iter().map(|t| candle(*t)).collect();
        let series = IndicatorSeries::Sma(vec![
            SmaPoint { time: 5.0, sma: 99.0 },   // before the range
            SmaPoint { time: 20.0, sma: 100.0 },
            SmaPoint { time: 25.0, sma: 100.2 }, // between buckets
            SmaPoint { time: 30.0, sma: 100.4 },
            SmaPoint { time: 40.0, sma: 100.8 }, // after the range
        ]);

        let overlay = merge_overlay(&candles, &series);
        assert!(overlay.len() <= candles.len());
        assert_eq!(overlay.len(), 2);
        for point in &overlay {
            assert!(candles.iter().any(|c| c.time == point.time));
        }
    }

    #[test]
    fn band_points_keep_their_triple() {
        let candles = vec![candle(10.0)];
        let series = IndicatorSeries::Bands(vec![BandPoint {
            time: 10.0,
            upper: 102.0,
            middle: 100.0,
            lower: 98.0,
        }]);
        let overlay = merge_overlay(&candles, &series);
        assert_eq!(
            overlay[0].value,
            OverlayValue::Bands {
                upper: 102.0,
                middle: 100.0,
                lower: 98.0
            }
        );
    }

    #[test]
    fn non_finite_indicator_values_are_dropped() {
        let candles = vec![candle(10.0)];
        let series = IndicatorSeries::Sma(vec![SmaPoint {
            time: 10.0,
            sma: f64::NAN,
        }]);
        assert!(merge_overlay(&candles, &series).is_empty());
    }

    #[test]
    fn empty_inputs_produce_empty_overlay() {
        let series = IndicatorSeries::Sma(vec![SmaPoint { time: 1.0, sma: 1.0 }]);
        assert!(merge_overlay(&[], &series).is_empty());
        let series = IndicatorSeries::Bands(Vec::new());
        assert!(merge_overlay(&[candle(1.0)], &series).is_empty());
    }
}
