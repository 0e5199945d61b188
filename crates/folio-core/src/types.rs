// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Folio: identifiers, paper geometry, and the pending
// edit state of an image under edit.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an image in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(pub Uuid);

impl ImageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height), portrait.
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Page dimensions in millimetres for the given orientation.
    pub fn page_mm(&self, orientation: Orientation) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        match orientation {
            Orientation::Portrait => (w as f32, h as f32),
            Orientation::Landscape => (h as f32, w as f32),
        }
    }
}

impl FromStr for PaperSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "a3" => Ok(Self::A3),
            "a5" => Ok(Self::A5),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            "tabloid" => Ok(Self::Tabloid),
            other => {
                // Custom sizes as "<width>x<height>" in millimetres.
                let (w, h) = other
                    .split_once('x')
                    .ok_or_else(|| format!("unknown paper size {s:?}"))?;
                let width_mm = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
                let height_mm = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
                if width_mm == 0 || height_mm == 0 {
                    return Err(format!("paper size {s:?} has a zero dimension"));
                }
                Ok(Self::Custom {
                    width_mm,
                    height_mm,
                })
            }
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Axis for a mirror flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipAxis {
    /// Mirror left-to-right.
    Horizontal,
    /// Mirror top-to-bottom.
    Vertical,
}

impl FromStr for FlipAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h" | "horizontal" => Ok(Self::Horizontal),
            "v" | "vertical" => Ok(Self::Vertical),
            _ => Err(format!("unknown flip axis {s:?} (expected h or v)")),
        }
    }
}

/// Crop box aspect-ratio constraint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// No constraint; width and height move independently.
    #[default]
    Free,
    /// Width divided by height. Always finite and positive.
    Ratio(f64),
}

impl AspectRatio {
    /// Build a ratio constraint, rejecting zero, negative, and non-finite values.
    pub fn ratio(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self::Ratio(value))
    }

    /// The constrained width/height ratio, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Free => None,
            Self::Ratio(r) => Some(*r),
        }
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("free") {
            return Ok(Self::Free);
        }
        let value = match trimmed.split_once(':') {
            Some((w, h)) => {
                let w = w.trim().parse::<f64>().map_err(|e| e.to_string())?;
                let h = h.trim().parse::<f64>().map_err(|e| e.to_string())?;
                w / h
            }
            None => trimmed.parse::<f64>().map_err(|e| e.to_string())?,
        };
        Self::ratio(value).ok_or_else(|| format!("aspect ratio {s:?} must be positive"))
    }
}

/// Pending geometric edits relative to the loaded working image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    /// Clockwise rotation in degrees, always in `[0, 360)`.
    pub rotation: f32,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl Geometry {
    /// Add `delta` degrees to the cumulative rotation. Non-finite deltas are
    /// ignored.
    pub fn rotate(&mut self, delta: f32) {
        if !delta.is_finite() {
            return;
        }
        self.rotation = (self.rotation + delta).rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
        if self.rotation >= 360.0 {
            self.rotation = 0.0;
        }
    }

    /// Toggle the flip flag for `axis`.
    pub fn flip(&mut self, axis: FlipAxis) {
        match axis {
            FlipAxis::Horizontal => self.flip_horizontal = !self.flip_horizontal,
            FlipAxis::Vertical => self.flip_vertical = !self.flip_vertical,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.rotation == 0.0 && !self.flip_horizontal && !self.flip_vertical
    }
}

/// Pending colour adjustments, each in [`ColorAdjustments::MIN`]..=[`ColorAdjustments::MAX`].
///
/// Each field holds the single effective value for its adjustment; setting a
/// field replaces the previous value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColorAdjustments {
    pub brightness: i32,
    pub contrast: i32,
    pub saturation: i32,
}

impl ColorAdjustments {
    pub const MIN: i32 = -100;
    pub const MAX: i32 = 100;

    /// Clamp a slider value into the supported range.
    pub fn clamp(value: i32) -> i32 {
        value.clamp(Self::MIN, Self::MAX)
    }

    pub fn is_identity(&self) -> bool {
        self.brightness == 0 && self.contrast == 0 && self.saturation == 0
    }
}

/// Render a byte count for display: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".into();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (value * 100.0).round() / 100.0;
    // Two decimals at most, trailing zeros dropped.
    let mut text = format!("{rounded:.2}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    format!("{text} {}", UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_accumulates_modulo_360() {
        let mut geometry = Geometry::default();
        for delta in [90.0, 90.0, 270.0, -45.0, 720.0] {
            geometry.rotate(delta);
        }
        // 90 + 90 + 270 - 45 + 720 = 1125 = 3 * 360 + 45
        assert_eq!(geometry.rotation, 45.0);

        geometry.rotate(-90.0);
        assert_eq!(geometry.rotation, 315.0);
    }

    #[test]
    fn non_finite_rotation_is_ignored() {
        let mut geometry = Geometry::default();
        geometry.rotate(30.0);
        for delta in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            geometry.rotate(delta);
            assert_eq!(geometry.rotation, 30.0);
        }
    }

    #[test]
    fn double_flip_is_identity() {
        let mut geometry = Geometry::default();
        geometry.flip(FlipAxis::Horizontal);
        assert!(!geometry.is_identity());
        geometry.flip(FlipAxis::Horizontal);
        assert!(geometry.is_identity());

        geometry.flip(FlipAxis::Vertical);
        geometry.flip(FlipAxis::Vertical);
        assert_eq!(geometry, Geometry::default());
    }

    #[test]
    fn aspect_ratio_parsing() {
        assert_eq!("free".parse::<AspectRatio>().unwrap(), AspectRatio::Free);
        assert_eq!(
            "16:9".parse::<AspectRatio>().unwrap().value().unwrap(),
            16.0 / 9.0
        );
        assert_eq!("1".parse::<AspectRatio>().unwrap(), AspectRatio::Ratio(1.0));
        assert!("0:1".parse::<AspectRatio>().is_err());
        assert!("-2".parse::<AspectRatio>().is_err());
        assert!(AspectRatio::ratio(f64::NAN).is_none());
    }

    #[test]
    fn paper_size_parsing_and_orientation() {
        assert_eq!("A4".parse::<PaperSize>().unwrap(), PaperSize::A4);
        assert_eq!(
            "100x150".parse::<PaperSize>().unwrap(),
            PaperSize::Custom {
                width_mm: 100,
                height_mm: 150
            }
        );
        assert!("0x150".parse::<PaperSize>().is_err());
        assert!("folio".parse::<PaperSize>().is_err());

        assert_eq!(PaperSize::A4.page_mm(Orientation::Portrait), (210.0, 297.0));
        assert_eq!(PaperSize::A4.page_mm(Orientation::Landscape), (297.0, 210.0));
    }

    #[test]
    fn colour_values_clamp_to_slider_range() {
        assert_eq!(ColorAdjustments::clamp(250), 100);
        assert_eq!(ColorAdjustments::clamp(-101), -100);
        assert_eq!(ColorAdjustments::clamp(40), 40);
    }

    #[test]
    fn file_sizes_render_like_the_gallery() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
    }
}
