//! Candlestick chart rasterisation
//!
//! Draws candles and indicator lines into an RGB buffer and exports it as
//! PNG through a scoped temporary file. Oscillators (RSI, MACD) get their own
//! pane beneath the price pane, one pane per indicator.

use crate::constants::{RSI_OVERBOUGHT, RSI_OVERSOLD};
use crate::error::{AppError, Result};
use crate::models::indicators::compute_all_overlays;
use crate::models::{Indicator, OhlcvSeries, Overlay, Pane};
use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Common color definitions
pub mod colors {
    use image::Rgb;

    pub const GREEN: Rgb<u8> = Rgb([0, 200, 83]);
    pub const RED: Rgb<u8> = Rgb([255, 68, 68]);
    pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    pub const LIGHT_GRAY: Rgb<u8> = Rgb([225, 225, 225]);
    pub const MID_GRAY: Rgb<u8> = Rgb([160, 160, 160]);
    pub const BLUE: Rgb<u8> = Rgb([33, 150, 243]);
    pub const ORANGE: Rgb<u8> = Rgb([255, 152, 0]);
    pub const PURPLE: Rgb<u8> = Rgb([156, 39, 176]);
    pub const TEAL: Rgb<u8> = Rgb([0, 150, 136]);
    pub const PINK: Rgb<u8> = Rgb([233, 30, 99]);
    pub const BROWN: Rgb<u8> = Rgb([121, 85, 72]);
}

/// Chart geometry and colours
#[derive(Debug, Clone)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    /// Height share of each oscillator pane
    pub oscillator_ratio: f64,
    pub background: Rgb<u8>,
    pub grid: Rgb<u8>,
    pub bullish_color: Rgb<u8>,
    pub bearish_color: Rgb<u8>,
    /// Overlay colours, assigned in overlay order
    pub palette: Vec<Rgb<u8>>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 700,
            margin: 24,
            oscillator_ratio: 0.2,
            background: colors::WHITE,
            grid: colors::LIGHT_GRAY,
            bullish_color: colors::GREEN,
            bearish_color: colors::RED,
            palette: vec![
                colors::BLUE,
                colors::ORANGE,
                colors::PURPLE,
                colors::TEAL,
                colors::PINK,
                colors::BROWN,
            ],
        }
    }
}

/// Rendered chart for one ticker
#[derive(Debug, Clone)]
pub struct ChartArtifact {
    pub ticker: String,
    pub overlays: Vec<Overlay>,
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ChartArtifact {
    /// PNG bytes as standard base64
    pub fn png_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.png)
    }

    /// `data:` URI for inline display
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.png_base64())
    }
}

/// Vertical band of the image with its own value axis
#[derive(Debug, Clone, Copy)]
struct PaneArea {
    left: u32,
    right: u32,
    top: u32,
    bottom: u32,
    min: f64,
    max: f64,
}

impl PaneArea {
    fn y(&self, value: f64) -> u32 {
        let span = self.max - self.min;
        let t = if span > 0.0 { (self.max - value) / span } else { 0.5 };
        let y = self.top as f64 + t.clamp(0.0, 1.0) * (self.bottom - self.top) as f64;
        y.round() as u32
    }
}

/// Candlestick renderer
pub struct ChartRenderer {
    config: ChartConfig,
    temp_dir: PathBuf,
}

impl ChartRenderer {
    pub fn new(config: ChartConfig, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            temp_dir: temp_dir.into(),
        }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Render candles plus the selected indicators and export to PNG
    pub fn render(&self, series: &OhlcvSeries, indicators: &[Indicator]) -> Result<ChartArtifact> {
        if series.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Cannot chart {}: no bars",
                series.ticker()
            )));
        }

        let overlays = compute_all_overlays(series, indicators);
        let image = self.draw(series, &overlays);
        let png = export_png(&image, &self.temp_dir)?;

        debug!(
            "Rendered {} chart: {} bars, {} overlays, {} PNG bytes",
            series.ticker(),
            series.len(),
            overlays.len(),
            png.len()
        );

        Ok(ChartArtifact {
            ticker: series.ticker().to_string(),
            overlays,
            png,
            width: image.width(),
            height: image.height(),
        })
    }

    /// Draw into an RGB buffer
    pub fn draw(&self, series: &OhlcvSeries, overlays: &[Overlay]) -> RgbImage {
        let cfg = &self.config;
        let mut img = RgbImage::from_pixel(cfg.width, cfg.height, cfg.background);
        if series.is_empty() {
            return img;
        }

        let oscillators: Vec<Indicator> = {
            let mut seen = Vec::new();
            for overlay in overlays.iter().filter(|o| o.pane == Pane::Oscillator) {
                if !seen.contains(&overlay.indicator) {
                    seen.push(overlay.indicator);
                }
            }
            seen
        };

        let left = cfg.margin;
        let right = cfg.width.saturating_sub(cfg.margin).max(left + 1);
        let usable = cfg.height.saturating_sub(2 * cfg.margin);
        let osc_height = (usable as f64 * cfg.oscillator_ratio) as u32;
        let price_bottom = cfg
            .margin
            .saturating_add(usable.saturating_sub(osc_height * oscillators.len() as u32))
            .max(cfg.margin + 1);

        // Price pane
        let bars = series.bars();
        let mut min = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let mut max = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        for overlay in overlays.iter().filter(|o| o.pane == Pane::Price) {
            for value in overlay.defined() {
                min = min.min(value);
                max = max.max(value);
            }
        }
        let (min, max) = padded_range(min, max);
        let price = PaneArea {
            left,
            right,
            top: cfg.margin,
            bottom: price_bottom,
            min,
            max,
        };

        draw_grid(&mut img, &price, cfg.grid);

        let slot = (right - left) as f64 / bars.len() as f64;
        let body_width = ((slot * 0.7) as u32).max(1);
        let x_at = |i: usize| (left as f64 + slot * (i as f64 + 0.5)).round() as u32;

        for (i, bar) in bars.iter().enumerate() {
            let color = if bar.is_bullish() {
                cfg.bullish_color
            } else {
                cfg.bearish_color
            };
            let x = x_at(i);
            draw_vertical_line(&mut img, x, price.y(bar.high), price.y(bar.low), color);

            let y_open = price.y(bar.open);
            let y_close = price.y(bar.close);
            let body_top = y_open.min(y_close);
            let body_height = (y_open.max(y_close) - body_top).max(1);
            draw_filled_rect(
                &mut img,
                x.saturating_sub(body_width / 2),
                body_top,
                body_width,
                body_height,
                color,
            );
        }

        // Oscillator panes
        let mut panes: Vec<(Indicator, PaneArea)> = Vec::new();
        for (k, indicator) in oscillators.iter().enumerate() {
            let top = price_bottom + osc_height * k as u32 + cfg.margin / 2;
            let bottom = (price_bottom + osc_height * (k as u32 + 1)).max(top + 1);
            let (min, max) = match indicator {
                Indicator::Rsi => (0.0, 100.0),
                _ => {
                    let values = overlays
                        .iter()
                        .filter(|o| o.indicator == *indicator)
                        .flat_map(|o| o.defined());
                    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                        (lo.min(v), hi.max(v))
                    });
                    padded_range(lo.min(0.0), hi.max(0.0))
                }
            };
            let area = PaneArea {
                left,
                right,
                top,
                bottom,
                min,
                max,
            };
            draw_horizontal_line(&mut img, area.top, left, right, cfg.grid);
            draw_horizontal_line(&mut img, area.bottom, left, right, cfg.grid);
            match indicator {
                Indicator::Rsi => {
                    draw_horizontal_line(&mut img, area.y(RSI_OVERBOUGHT), left, right, colors::MID_GRAY);
                    draw_horizontal_line(&mut img, area.y(RSI_OVERSOLD), left, right, colors::MID_GRAY);
                }
                _ => draw_horizontal_line(&mut img, area.y(0.0), left, right, colors::MID_GRAY),
            }
            panes.push((*indicator, area));
        }

        // Indicator lines
        for (n, overlay) in overlays.iter().enumerate() {
            let color = cfg
                .palette
                .get(n % cfg.palette.len().max(1))
                .copied()
                .unwrap_or(colors::BLUE);
            let area = match overlay.pane {
                Pane::Price => price,
                Pane::Oscillator => match panes.iter().find(|(ind, _)| *ind == overlay.indicator) {
                    Some((_, area)) => *area,
                    None => continue,
                },
            };

            let mut prev: Option<(u32, u32)> = None;
            for (i, value) in overlay.values.iter().enumerate() {
                match value {
                    Some(v) if v.is_finite() => {
                        let point = (x_at(i), area.y(*v));
                        if let Some(p) = prev {
                            draw_line(&mut img, p, point, color);
                        }
                        prev = Some(point);
                    }
                    _ => prev = None,
                }
            }

            // Legend swatch
            let swatch_x = left + 4 + n as u32 * 18;
            draw_filled_rect(&mut img, swatch_x, cfg.margin / 2, 12, 8, color);
        }

        img
    }
}

fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let span = max - min;
    if span <= 0.0 {
        let pad = min.abs().max(1.0) * 0.01;
        return (min - pad, max + pad);
    }
    (min - span * 0.05, max + span * 0.05)
}

fn draw_grid(img: &mut RgbImage, area: &PaneArea, color: Rgb<u8>) {
    const LINES: u32 = 5;
    for k in 0..=LINES {
        let y = area.top + (area.bottom - area.top) * k / LINES;
        draw_horizontal_line(img, y, area.left, area.right, color);
    }
}

/// Encode as PNG via a scoped temporary file in `dir`
///
/// The file is removed when this returns, on success and on error.
pub fn export_png(image: &RgbImage, dir: &Path) -> Result<Vec<u8>> {
    let tmp = tempfile::Builder::new()
        .prefix("traderai-chart-")
        .suffix(".png")
        .tempfile_in(dir)?;

    image.save_with_format(tmp.path(), ImageFormat::Png)?;
    let bytes = std::fs::read(tmp.path())?;
    tmp.close()?;

    Ok(bytes)
}

/// Helper function to draw a filled rectangle
fn draw_filled_rect(img: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    let (img_width, img_height) = img.dimensions();
    for py in y..y.saturating_add(height).min(img_height) {
        for px in x..x.saturating_add(width).min(img_width) {
            img.put_pixel(px, py, color);
        }
    }
}

/// Helper function to draw a vertical line
fn draw_vertical_line(img: &mut RgbImage, x: u32, y1: u32, y2: u32, color: Rgb<u8>) {
    let (start, end) = if y1 < y2 { (y1, y2) } else { (y2, y1) };
    let (img_width, img_height) = img.dimensions();
    if x < img_width && img_height > 0 {
        for y in start..=end.min(img_height - 1) {
            img.put_pixel(x, y, color);
        }
    }
}

/// Helper function to draw a horizontal line
fn draw_horizontal_line(img: &mut RgbImage, y: u32, x1: u32, x2: u32, color: Rgb<u8>) {
    let (start, end) = if x1 < x2 { (x1, x2) } else { (x2, x1) };
    let (img_width, img_height) = img.dimensions();
    if y < img_height && img_width > 0 {
        for x in start..=end.min(img_width - 1) {
            img.put_pixel(x, y, color);
        }
    }
}

/// Bresenham segment, two pixels thick
fn draw_line(img: &mut RgbImage, from: (u32, u32), to: (u32, u32), color: Rgb<u8>) {
    let (mut x0, mut y0) = (from.0 as i64, from.1 as i64);
    let (x1, y1) = (to.0 as i64, to.1 as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (w, h) = (img.width() as i64, img.height() as i64);

    loop {
        for (px, py) in [(x0, y0), (x0, y0 + 1)] {
            if px >= 0 && py >= 0 && px < w && py < h {
                img.put_pixel(px as u32, py as u32, color);
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::session::tests::make_series;

    fn renderer(dir: &Path) -> ChartRenderer {
        ChartRenderer::new(
            ChartConfig {
                width: 400,
                height: 300,
                ..ChartConfig::default()
            },
            dir,
        )
    }

    fn is_png(bytes: &[u8]) -> bool {
        bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
    }

    #[test]
    fn test_render_produces_png() {
        let dir = tempfile::tempdir().unwrap();
        let series = make_series("AAPL", 60);

        let chart = renderer(dir.path())
            .render(&series, &[Indicator::Sma20, Indicator::Bb20])
            .unwrap();

        assert!(is_png(&chart.png));
        assert_eq!((chart.width, chart.height), (400, 300));
        assert_eq!(chart.overlays.len(), 3);
        assert!(chart.data_uri().starts_with("data:image/png;base64,iVBOR"));
    }

    #[test]
    fn test_render_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let series = make_series("MSFT", 40);

        renderer(dir.path()).render(&series, &Indicator::all()).unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_export_failure_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let img = RgbImage::new(4, 4);
        assert!(export_png(&img, &missing).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_export_encode_failure_removes_temp_file() {
        // The temp file is created first; a zero-sized image fails in the encoder
        let dir = tempfile::tempdir().unwrap();
        assert!(export_png(&RgbImage::new(0, 0), dir.path()).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_render_empty_series_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let series = make_series("EMPTY", 0);
        assert!(matches!(
            renderer(dir.path()).render(&series, &[]),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_draw_colours_candles() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(dir.path());
        let series = make_series("AAPL", 30);

        let img = r.draw(&series, &[]);
        let has_bull = img.pixels().any(|p| *p == colors::GREEN);
        let has_bear = img.pixels().any(|p| *p == colors::RED);
        assert!(has_bull && has_bear);
    }

    #[test]
    fn test_draw_single_flat_bar() {
        let dir = tempfile::tempdir().unwrap();
        let series = OhlcvSeries::new(
            "FLAT",
            vec![crate::models::Ohlcv::new(
                chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                10.0,
                10.0,
                10.0,
                10.0,
                0,
            )],
        );
        let img = renderer(dir.path()).draw(&series, &[]);
        assert!(img.pixels().any(|p| *p == colors::GREEN));
    }

    #[test]
    fn test_oscillator_panes_draw_overlays() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(dir.path());
        let series = make_series("AAPL", 60);
        let overlays = compute_all_overlays(&series, &[Indicator::Rsi]);

        let img = r.draw(&series, &overlays);
        assert!(img.pixels().any(|p| *p == r.config().palette[0]));
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(f64::INFINITY, f64::NEG_INFINITY), (0.0, 1.0));
        let (lo, hi) = padded_range(100.0, 100.0);
        assert!(lo < 100.0 && hi > 100.0);
        let (lo, hi) = padded_range(0.0, 100.0);
        assert_eq!((lo, hi), (-5.0, 105.0));
    }
}
