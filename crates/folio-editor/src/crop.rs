// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop state — the crop box, its aspect-ratio constraint and the viewport zoom.
//
// All box coordinates are in source-image pixels. Every mutation clamps the
// box into the source bounds; when a ratio is set, height is always derived
// from width so the two never drift more than one pixel from the ratio.

use std::sync::Arc;

use folio_core::config::AppConfig;
use folio_core::error::{FolioError, Result};
use folio_core::types::AspectRatio;
use folio_document::ImageProcessor;
use image::DynamicImage;
use tracing::{debug, instrument};

/// Rectangle in source-image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropBox {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Whether the box lies entirely inside a `width` x `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width >= 1 && self.height >= 1 && self.right() <= width && self.bottom() <= height
    }

    fn centre(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

/// Tunables for crop mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSettings {
    /// Fraction of the largest constrained box used for the default crop box.
    pub auto_area: f64,
    /// Longest output edge on apply; `None` keeps full resolution.
    pub max_output: Option<u32>,
    /// Lower bound for the viewport zoom factor.
    pub min_zoom: f64,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for CropSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            auto_area: config.crop_auto_area.clamp(0.01, 1.0),
            max_output: config.crop_max_output.filter(|max| *max > 0),
            min_zoom: config.min_zoom.max(f64::MIN_POSITIVE),
        }
    }
}

/// State of an active crop: source image, box, constraint and zoom.
#[derive(Debug, Clone)]
pub struct CropState {
    source: Arc<DynamicImage>,
    crop_box: CropBox,
    aspect: AspectRatio,
    zoom: f64,
    settings: CropSettings,
}

impl CropState {
    /// Start cropping `source` with a free aspect ratio and the default box.
    pub fn new(source: Arc<DynamicImage>, settings: CropSettings) -> Result<Self> {
        if source.width() == 0 || source.height() == 0 {
            return Err(FolioError::InvalidState("cannot crop an empty image".into()));
        }
        let mut state = Self {
            source,
            crop_box: CropBox {
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            },
            aspect: AspectRatio::Free,
            zoom: 1.0,
            settings,
        };
        state.crop_box = state.default_box();
        debug!(crop_box = ?state.crop_box, "Crop started");
        Ok(state)
    }

    // -- Accessors --------------------------------------------------------------

    pub fn crop_box(&self) -> CropBox {
        self.crop_box
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn source(&self) -> &DynamicImage {
        &self.source
    }

    pub fn source_size(&self) -> (u32, u32) {
        (self.source.width(), self.source.height())
    }

    // -- Mutations --------------------------------------------------------------

    /// Change the constraint. A ratio re-derives the box around its current
    /// centre with roughly the same area; `Free` keeps the box as it is.
    #[instrument(skip(self))]
    pub fn set_aspect_ratio(&mut self, aspect: AspectRatio) {
        // Unvalidated ratios (zero, negative, NaN) mean no constraint.
        let aspect = aspect
            .value()
            .and_then(AspectRatio::ratio)
            .unwrap_or(AspectRatio::Free);
        self.aspect = aspect;
        let Some(ratio) = aspect.value() else {
            return;
        };
        let (sw, sh) = self.source_size();
        let area = self.crop_box.width as f64 * self.crop_box.height as f64;
        let (width, height) = sized_for_ratio((area * ratio).sqrt(), ratio, sw, sh);
        let (cx, cy) = self.crop_box.centre();
        self.crop_box = place_centred(cx, cy, width, height, sw, sh);
        debug!(crop_box = ?self.crop_box, "Aspect ratio applied");
    }

    /// Set the viewport zoom, clamped to the configured minimum. Non-finite
    /// factors are ignored. Returns the zoom now in effect.
    pub fn set_zoom(&mut self, factor: f64) -> f64 {
        if factor.is_finite() {
            self.zoom = factor.max(self.settings.min_zoom);
        }
        self.zoom
    }

    /// Restore the default box and a zoom of 1.0. The constraint is kept.
    pub fn reset(&mut self) {
        self.crop_box = self.default_box();
        self.zoom = 1.0;
    }

    /// Move the top-left corner, clamped so the box stays inside the source.
    pub fn move_to(&mut self, x: u32, y: u32) {
        let (sw, sh) = self.source_size();
        self.crop_box.x = x.min(sw - self.crop_box.width);
        self.crop_box.y = y.min(sh - self.crop_box.height);
    }

    /// Move by a signed offset, clamped into the source.
    pub fn move_by(&mut self, dx: i64, dy: i64) {
        let x = (self.crop_box.x as i64 + dx).max(0);
        let y = (self.crop_box.y as i64 + dy).max(0);
        self.move_to(
            u32::try_from(x).unwrap_or(u32::MAX),
            u32::try_from(y).unwrap_or(u32::MAX),
        );
    }

    /// Resize keeping the top-left corner where possible. With a ratio set,
    /// `width` drives and `height` is derived.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (sw, sh) = self.source_size();
        let (width, height) = match self.aspect.value() {
            Some(ratio) => sized_for_ratio(width as f64, ratio, sw, sh),
            None => (width.clamp(1, sw), height.clamp(1, sh)),
        };
        self.crop_box.width = width;
        self.crop_box.height = height;
        let (x, y) = (self.crop_box.x, self.crop_box.y);
        self.move_to(x, y);
    }

    /// Replace the box, clamping it into bounds and onto the constraint.
    pub fn set_box(&mut self, crop_box: CropBox) {
        self.crop_box.x = crop_box.x;
        self.crop_box.y = crop_box.y;
        self.resize(crop_box.width, crop_box.height);
    }

    // -- Output -----------------------------------------------------------------

    /// The pixels inside the box at source resolution.
    pub fn preview(&self) -> DynamicImage {
        let b = self.crop_box;
        self.source.crop_imm(b.x, b.y, b.width, b.height)
    }

    /// Cut out the box, resampling down to `max_output` if it is exceeded.
    #[instrument(skip(self), fields(crop_box = ?self.crop_box))]
    pub fn rasterize(&self) -> DynamicImage {
        let cropped = self.preview();
        match self.settings.max_output {
            Some(max) if cropped.width().max(cropped.height()) > max => {
                ImageProcessor::from_dynamic(cropped).resize(max, max).into_dynamic()
            }
            _ => cropped,
        }
    }

    // -- Helpers ----------------------------------------------------------------

    /// The largest box satisfying the constraint, scaled by `auto_area` and
    /// centred on the source.
    fn default_box(&self) -> CropBox {
        let (sw, sh) = self.source_size();
        let area = self.settings.auto_area;
        let (width, height) = match self.aspect.value() {
            Some(ratio) => {
                let full_w = (sh as f64 * ratio).min(sw as f64);
                sized_for_ratio(full_w * area, ratio, sw, sh)
            }
            None => (scaled_edge(sw, area), scaled_edge(sh, area)),
        };
        place_centred(sw as f64 / 2.0, sh as f64 / 2.0, width, height, sw, sh)
    }
}

fn scaled_edge(edge: u32, fraction: f64) -> u32 {
    ((edge as f64 * fraction).round() as u32).clamp(1, edge)
}

/// Width and height in `ratio` (w/h) for a target width, fitted into
/// `max_w` x `max_h`. Height is always rounded from width, so
/// `|h - w/ratio| <= 1` unless even a 1px wide box is taller than `max_h`.
fn sized_for_ratio(target_w: f64, ratio: f64, max_w: u32, max_h: u32) -> (u32, u32) {
    let width = (target_w.round().max(1.0) as u32).min(max_w);
    let height = height_for(width, ratio, max_h);
    if (width as f64 / ratio).round() <= max_h as f64 {
        return (width, height);
    }
    // Flooring keeps width / ratio at or below max_h.
    let width = ((max_h as f64 * ratio).floor().max(1.0) as u32).min(max_w);
    (width, height_for(width, ratio, max_h))
}

fn height_for(width: u32, ratio: f64, max_h: u32) -> u32 {
    ((width as f64 / ratio).round().max(1.0) as u32).min(max_h)
}

/// Place a `width` x `height` box centred on `(cx, cy)`, shifted into bounds.
fn place_centred(cx: f64, cy: f64, width: u32, height: u32, sw: u32, sh: u32) -> CropBox {
    let x = (cx - width as f64 / 2.0).round().max(0.0) as u32;
    let y = (cy - height as f64 / 2.0).round().max(0.0) as u32;
    CropBox {
        x: x.min(sw - width),
        y: y.min(sh - height),
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn state(width: u32, height: u32) -> CropState {
        let img = RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        CropState::new(Arc::new(DynamicImage::ImageRgba8(img)), CropSettings::default()).unwrap()
    }

    fn assert_in_bounds(state: &CropState) {
        let (sw, sh) = state.source_size();
        let b = state.crop_box();
        assert!(b.fits_within(sw, sh), "{b:?} outside {sw}x{sh}");
    }

    fn assert_ratio(state: &CropState, ratio: f64) {
        let b = state.crop_box();
        let drift = (b.height as f64 - b.width as f64 / ratio).abs();
        assert!(drift <= 1.0, "{b:?} drifts {drift} from ratio {ratio}");
    }

    #[test]
    fn default_box_covers_eighty_percent_centred() {
        let s = state(100, 50);
        assert_eq!(
            s.crop_box(),
            CropBox {
                x: 10,
                y: 5,
                width: 80,
                height: 40,
            }
        );
        assert_eq!(s.aspect_ratio(), AspectRatio::Free);
        assert_eq!(s.zoom(), 1.0);
    }

    #[test]
    fn setting_ratio_keeps_centre_and_bounds() {
        let mut s = state(200, 100);
        let before = s.crop_box().centre();
        s.set_aspect_ratio(AspectRatio::Ratio(1.0));
        let b = s.crop_box();
        assert_eq!(b.width, b.height);
        assert_in_bounds(&s);
        let after = b.centre();
        assert!((before.0 - after.0).abs() <= 1.0 && (before.1 - after.1).abs() <= 1.0);
    }

    #[test]
    fn free_keeps_box_unchanged() {
        let mut s = state(120, 90);
        s.set_aspect_ratio(AspectRatio::Ratio(16.0 / 9.0));
        let constrained = s.crop_box();
        s.set_aspect_ratio(AspectRatio::Free);
        assert_eq!(s.crop_box(), constrained);
    }

    #[test]
    fn ratio_survives_resize_and_move_sequences() {
        let ratio = 4.0 / 3.0;
        let mut s = state(97, 61);
        s.set_aspect_ratio(AspectRatio::Ratio(ratio));
        let steps = [
            (500, 40, -3),
            (13, -1000, 1000),
            (77, 5, 5),
            (1, 0, 0),
            (96, 7, -2),
        ];
        for (w, dx, dy) in steps {
            s.resize(w, 1);
            assert_in_bounds(&s);
            assert_ratio(&s, ratio);
            s.move_by(dx, dy);
            assert_in_bounds(&s);
            assert_ratio(&s, ratio);
        }
    }

    #[test]
    fn extreme_ratio_is_bounded_by_height() {
        let mut s = state(50, 40);
        s.set_aspect_ratio(AspectRatio::Ratio(0.1));
        assert_in_bounds(&s);
        assert_ratio(&s, 0.1);
    }

    #[test]
    fn height_bound_with_fractional_width_keeps_ratio() {
        // 45 * 0.1 and 7 * 0.25 both land between whole pixels.
        for (width, height, ratio) in [(50, 45, 0.1), (300, 7, 0.25), (90, 33, 0.3)] {
            let mut s = state(width, height);
            s.set_aspect_ratio(AspectRatio::Ratio(ratio));
            assert_in_bounds(&s);
            assert_ratio(&s, ratio);

            s.resize(width, height);
            assert_in_bounds(&s);
            assert_ratio(&s, ratio);
        }

        let mut s = state(50, 45);
        s.set_aspect_ratio(AspectRatio::Ratio(0.1));
        let b = s.crop_box();
        assert_eq!((b.width, b.height), (4, 40));
    }

    #[test]
    fn invalid_ratio_means_free() {
        for ratio in [-1.0, 0.0, f64::NAN, f64::INFINITY] {
            let mut s = state(60, 40);
            let before = s.crop_box();
            s.set_aspect_ratio(AspectRatio::Ratio(ratio));
            assert_eq!(s.aspect_ratio(), AspectRatio::Free);
            assert_eq!(s.crop_box(), before);
        }
    }

    #[test]
    fn free_resize_clamps_each_edge() {
        let mut s = state(30, 20);
        s.move_to(25, 15);
        s.resize(1000, 1000);
        assert_eq!(
            s.crop_box(),
            CropBox {
                x: 0,
                y: 0,
                width: 30,
                height: 20,
            }
        );
    }

    #[test]
    fn set_box_clamps_into_bounds() {
        let mut s = state(40, 40);
        s.set_box(CropBox {
            x: 35,
            y: 39,
            width: 10,
            height: 10,
        });
        assert_eq!(
            s.crop_box(),
            CropBox {
                x: 30,
                y: 30,
                width: 10,
                height: 10,
            }
        );
    }

    #[test]
    fn zoom_has_a_floor_but_no_ceiling() {
        let mut s = state(10, 10);
        let b = s.crop_box();
        assert_eq!(s.set_zoom(0.0), CropSettings::default().min_zoom);
        assert_eq!(s.set_zoom(25.0), 25.0);
        assert_eq!(s.set_zoom(f64::NAN), 25.0);
        assert_eq!(s.crop_box(), b);
    }

    #[test]
    fn reset_restores_default_box_and_zoom() {
        let mut s = state(64, 48);
        let default_box = s.crop_box();
        s.set_zoom(3.0);
        s.set_box(CropBox {
            x: 1,
            y: 2,
            width: 5,
            height: 6,
        });
        s.reset();
        assert_eq!(s.crop_box(), default_box);
        assert_eq!(s.zoom(), 1.0);
    }

    #[test]
    fn rasterize_returns_exact_box_pixels() {
        let mut s = state(20, 20);
        s.set_box(CropBox {
            x: 3,
            y: 4,
            width: 5,
            height: 6,
        });
        let out = s.rasterize().to_rgba8();
        assert_eq!(out.dimensions(), (5, 6));
        assert_eq!(out.get_pixel(0, 0), &Rgba([3, 4, 0, 255]));
        assert_eq!(out.get_pixel(4, 5), &Rgba([7, 9, 0, 255]));
    }

    #[test]
    fn rasterize_resamples_to_max_output() {
        let img = RgbaImage::from_pixel(200, 100, Rgba([10, 20, 30, 255]));
        let settings = CropSettings {
            max_output: Some(50),
            ..CropSettings::default()
        };
        let mut s = CropState::new(Arc::new(DynamicImage::ImageRgba8(img)), settings).unwrap();
        s.set_box(CropBox {
            x: 0,
            y: 0,
            width: 200,
            height: 100,
        });
        let out = s.rasterize();
        assert_eq!((out.width(), out.height()), (50, 25));
    }

    #[test]
    fn empty_source_is_rejected() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        assert!(CropState::new(Arc::new(img), CropSettings::default()).is_err());
    }
}
