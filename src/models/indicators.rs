//! Technical indicators computed from daily bars
//!
//! Every function returns a sequence aligned 1:1 with its input. Positions
//! without a full lookback window are `None` and are never back-filled.
//!
//! # Seeding
//! - EMA: seeded with the first input value, no bias adjustment
//!   (`ema[t] = ema[t-1] + α·(x[t] - ema[t-1])`, `α = 2 / (span + 1)`)
//! - RSI: Wilder smoothing, seeded with the plain mean of the first
//!   `period` gains and losses
//! - Bollinger: sample standard deviation (n - 1) over the window

use super::{Indicator, OhlcvSeries, Pane};
use crate::constants::{
    BOLLINGER_K, MACD_FAST, MACD_SIGNAL, MACD_SLOW, RSI_PERIOD, TREND_WINDOW,
};

/// A derived series drawn over (or under) the candles
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    /// Legend label
    pub label: String,
    /// Source indicator
    pub indicator: Indicator,
    /// Target pane
    pub pane: Pane,
    /// One value per bar
    pub values: Vec<Option<f64>>,
}

impl Overlay {
    fn new(label: &str, indicator: Indicator, values: Vec<Option<f64>>) -> Self {
        Self {
            label: label.to_string(),
            indicator,
            pane: indicator.pane(),
            values,
        }
    }

    /// Defined values only
    pub fn defined(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().flatten().copied()
    }
}

/// Trailing simple moving average
///
/// # Arguments
/// * `closes` - Closing prices in date order
/// * `period` - Window length (e.g., 20)
///
/// # Returns
/// * `None` for the first `period - 1` positions
pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut ma_values = vec![None; closes.len()];

    if period == 0 || closes.len() < period {
        return ma_values;
    }

    for i in (period - 1)..closes.len() {
        let start_idx = i + 1 - period;
        let sum: f64 = closes[start_idx..=i].iter().sum();
        ma_values[i] = Some(sum / period as f64);
    }

    ma_values
}

/// Exponential moving average with span smoothing, seeded with the first value
pub fn calculate_ema(values: &[f64], span: usize) -> Vec<f64> {
    let mut ema = Vec::with_capacity(values.len());
    let Some(&first) = values.first() else {
        return ema;
    };

    let alpha = 2.0 / (span as f64 + 1.0);
    ema.push(first);
    for &value in &values[1..] {
        let prev = ema[ema.len() - 1];
        ema.push(prev + alpha * (value - prev));
    }

    ema
}

/// Trailing sample standard deviation (n - 1)
pub fn calculate_rolling_std(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut std_values = vec![None; closes.len()];

    if period < 2 || closes.len() < period {
        return std_values;
    }

    for i in (period - 1)..closes.len() {
        let window = &closes[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance =
            window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
        std_values[i] = Some(variance.sqrt());
    }

    std_values
}

/// Bollinger bands: `(upper, middle, lower)` = SMA ± k·std
pub fn calculate_bollinger(
    closes: &[f64],
    period: usize,
    k: f64,
) -> (Vec<Option<f64>>, Vec<Option<f64>>, Vec<Option<f64>>) {
    let middle = calculate_sma(closes, period);
    let std = calculate_rolling_std(closes, period);

    let upper = middle
        .iter()
        .zip(&std)
        .map(|(m, s)| Some((*m)? + k * (*s)?))
        .collect();
    let lower = middle
        .iter()
        .zip(&std)
        .map(|(m, s)| Some((*m)? - k * (*s)?))
        .collect();

    (upper, middle, lower)
}

/// Running VWAP from series start: cumsum(close·volume) / cumsum(volume)
///
/// `None` while cumulative volume is still zero.
pub fn calculate_vwap(closes: &[f64], volumes: &[u64]) -> Vec<Option<f64>> {
    let mut turnover = 0.0;
    let mut volume_total = 0.0;

    closes
        .iter()
        .zip(volumes)
        .map(|(&close, &volume)| {
            turnover += close * volume as f64;
            volume_total += volume as f64;
            if volume_total > 0.0 {
                Some(turnover / volume_total)
            } else {
                None
            }
        })
        .collect()
}

/// Relative Strength Index (Wilder)
///
/// `None` for the first `period` positions; 100 when average loss is zero.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut rsi_values = vec![None; closes.len()];

    if period == 0 || closes.len() <= period {
        return rsi_values;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain = changes[..period].iter().map(|c| c.max(0.0)).sum::<f64>() / period as f64;
    let mut avg_loss = changes[..period].iter().map(|c| (-c).max(0.0)).sum::<f64>() / period as f64;
    rsi_values[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    let p = period as f64;
    for (i, change) in changes.iter().enumerate().skip(period) {
        avg_gain = (avg_gain * (p - 1.0) + change.max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-change).max(0.0)) / p;
        rsi_values[i + 1] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    rsi_values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// MACD line, signal line and histogram
#[derive(Debug, Clone, PartialEq)]
pub struct MacdOutput {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// MACD = EMA(fast) - EMA(slow); signal = EMA(signal) of MACD
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdOutput {
    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);
    let macd: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = calculate_ema(&macd, signal);
    let histogram = macd.iter().zip(&signal_line).map(|(m, s)| m - s).collect();

    MacdOutput {
        macd,
        signal: signal_line,
        histogram,
    }
}

/// Derive the drawable series for one indicator
///
/// Bollinger bands yield two overlays (upper, lower); MACD yields the line
/// and the signal; every other indicator yields one.
pub fn compute_overlays(series: &OhlcvSeries, indicator: Indicator) -> Vec<Overlay> {
    let closes = series.closes();

    match indicator {
        Indicator::Sma20 => vec![Overlay::new(
            "20-Day SMA",
            indicator,
            calculate_sma(&closes, TREND_WINDOW),
        )],
        Indicator::Ema20 => vec![Overlay::new(
            "20-Day EMA",
            indicator,
            calculate_ema(&closes, TREND_WINDOW).into_iter().map(Some).collect(),
        )],
        Indicator::Bb20 => {
            let (upper, _middle, lower) = calculate_bollinger(&closes, TREND_WINDOW, BOLLINGER_K);
            vec![
                Overlay::new("BB Upper", indicator, upper),
                Overlay::new("BB Lower", indicator, lower),
            ]
        }
        Indicator::Vwap => vec![Overlay::new(
            "VWAP",
            indicator,
            calculate_vwap(&closes, &series.volumes()),
        )],
        Indicator::Rsi => vec![Overlay::new(
            "RSI",
            indicator,
            calculate_rsi(&closes, RSI_PERIOD),
        )],
        Indicator::Macd => {
            let out = calculate_macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
            vec![
                Overlay::new("MACD", indicator, out.macd.into_iter().map(Some).collect()),
                Overlay::new("MACD Signal", indicator, out.signal.into_iter().map(Some).collect()),
            ]
        }
    }
}

/// Overlays for a whole selection, in selection order
pub fn compute_all_overlays(series: &OhlcvSeries, indicators: &[Indicator]) -> Vec<Overlay> {
    indicators
        .iter()
        .flat_map(|&indicator| compute_overlays(series, indicator))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ohlcv;
    use chrono::{Duration, NaiveDate};

    fn closes_fixture(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    fn series_fixture(closes: &[f64]) -> OhlcvSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Ohlcv::new(start + Duration::days(i as i64), c, c + 1.0, c - 1.0, c, 1_000 + i as u64)
            })
            .collect();
        OhlcvSeries::new("TEST", bars)
    }

    #[test]
    fn test_calculate_sma() {
        let closes = vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let ma3 = calculate_sma(&closes, 3);

        assert_eq!(ma3[0], None); // Not enough data
        assert_eq!(ma3[1], None); // Not enough data
        assert_eq!(ma3[2], Some(11.0)); // (10+11+12)/3
        assert_eq!(ma3[3], Some(12.0)); // (11+12+13)/3
        assert_eq!(ma3[4], Some(13.0)); // (12+13+14)/3
        assert_eq!(ma3[5], Some(14.0)); // (13+14+15)/3
    }

    #[test]
    fn test_sma20_matches_window_mean() {
        let closes = closes_fixture(60);
        let sma = calculate_sma(&closes, 20);

        for (t, value) in sma.iter().enumerate() {
            if t < 19 {
                assert!(value.is_none());
            } else {
                let mean = closes[t - 19..=t].iter().sum::<f64>() / 20.0;
                assert!((value.unwrap() - mean).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_sma_short_series_all_undefined() {
        let sma = calculate_sma(&[1.0, 2.0, 3.0], 20);
        assert!(sma.iter().all(Option::is_none));
    }

    #[test]
    fn test_ema_recurrence() {
        let closes = closes_fixture(40);
        let ema = calculate_ema(&closes, 20);
        let alpha = 2.0 / 21.0;

        assert_eq!(ema[0], closes[0]);
        for t in 1..closes.len() {
            let expected = ema[t - 1] + alpha * (closes[t] - ema[t - 1]);
            assert!((ema[t] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_ema_empty() {
        assert!(calculate_ema(&[], 20).is_empty());
    }

    #[test]
    fn test_rolling_std_sample() {
        // Sample std of [2, 4, 4, 4, 5, 5, 7, 9] = sqrt(32/7)
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = calculate_rolling_std(&values, 8);
        assert!((std[7].unwrap() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert!(std[6].is_none());
    }

    #[test]
    fn test_bollinger_ordering() {
        let closes = closes_fixture(80);
        let (upper, middle, lower) = calculate_bollinger(&closes, 20, 2.0);

        for t in 0..closes.len() {
            match (upper[t], middle[t], lower[t]) {
                (Some(u), Some(m), Some(l)) => {
                    assert!(u >= m);
                    assert!(m >= l);
                }
                (None, None, None) => assert!(t < 19),
                _ => panic!("bands must share definedness at {}", t),
            }
        }
    }

    #[test]
    fn test_bollinger_flat_prices_collapse() {
        let closes = vec![50.0; 25];
        let (upper, middle, lower) = calculate_bollinger(&closes, 20, 2.0);
        assert_eq!(upper[24], Some(50.0));
        assert_eq!(middle[24], Some(50.0));
        assert_eq!(lower[24], Some(50.0));
    }

    #[test]
    fn test_vwap_running_total() {
        let closes = vec![10.0, 20.0, 30.0];
        let volumes = vec![100, 300, 0];
        let vwap = calculate_vwap(&closes, &volumes);

        assert_eq!(vwap[0], Some(10.0));
        // (10*100 + 20*300) / 400 = 17.5
        assert_eq!(vwap[1], Some(17.5));
        // zero-volume bar leaves the running value unchanged
        assert_eq!(vwap[2], Some(17.5));
    }

    #[test]
    fn test_vwap_zero_volume_prefix() {
        let vwap = calculate_vwap(&[10.0, 12.0], &[0, 50]);
        assert_eq!(vwap[0], None);
        assert_eq!(vwap[1], Some(12.0));
    }

    #[test]
    fn test_rsi_bounds_and_warmup() {
        let closes = closes_fixture(60);
        let rsi = calculate_rsi(&closes, 14);

        assert!(rsi[..14].iter().all(Option::is_none));
        for value in rsi[14..].iter() {
            let v = value.unwrap();
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn test_rsi_monotonic_rise_is_100() {
        let closes: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let rsi = calculate_rsi(&closes, 14);
        assert_eq!(rsi[14], Some(100.0));
        assert_eq!(rsi[19], Some(100.0));
    }

    #[test]
    fn test_rsi_seed_value() {
        // 14 changes: 7 gains of +1, 7 losses of -1 -> RS = 1 -> RSI = 50
        let mut closes = vec![100.0];
        for i in 0..14 {
            let last = closes[closes.len() - 1];
            closes.push(if i % 2 == 0 { last + 1.0 } else { last - 1.0 });
        }
        let rsi = calculate_rsi(&closes, 14);
        assert!((rsi[14].unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_macd_histogram_identity() {
        let closes = closes_fixture(50);
        let out = calculate_macd(&closes, 12, 26, 9);

        assert_eq!(out.macd.len(), closes.len());
        assert_eq!(out.macd[0], 0.0);
        for t in 0..closes.len() {
            assert!((out.histogram[t] - (out.macd[t] - out.signal[t])).abs() < 1e-12);
        }
    }

    #[test]
    fn test_compute_overlays_labels_and_alignment() {
        let closes = closes_fixture(30);
        let series = series_fixture(&closes);

        let overlays = compute_all_overlays(&series, &Indicator::all());
        let labels: Vec<_> = overlays.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["20-Day SMA", "20-Day EMA", "RSI", "MACD", "MACD Signal", "BB Upper", "BB Lower", "VWAP"]
        );
        assert!(overlays.iter().all(|o| o.values.len() == series.len()));
    }

    #[test]
    fn test_compute_overlays_does_not_touch_series() {
        let closes = closes_fixture(30);
        let series = series_fixture(&closes);
        let before = series.clone();

        let _ = compute_all_overlays(&series, &[Indicator::Sma20, Indicator::Bb20]);
        assert_eq!(series, before);
    }
}
