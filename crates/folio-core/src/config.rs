// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Orientation, PaperSize};

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Paper size of every page in the exported document.
    pub paper_size: PaperSize,
    /// Page orientation (landscape swaps width and height).
    pub orientation: Orientation,
    /// Blank border kept around each image, in millimetres.
    pub page_margin_mm: f32,
    /// Fraction of the source covered by the automatic crop box, per side.
    pub crop_auto_area: f64,
    /// Longest edge of an applied crop; larger crops are resampled down.
    pub crop_max_output: Option<u32>,
    /// Lower bound for the crop viewport zoom factor.
    pub min_zoom: f64,
    /// Filename prefix for exported documents.
    pub output_prefix: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            orientation: Orientation::Portrait,
            page_margin_mm: 0.0,
            crop_auto_area: 0.8,
            crop_max_output: Some(4096),
            min_zoom: 0.1,
            output_prefix: "images-to-pdf".into(),
        }
    }
}

impl AppConfig {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write settings to a JSON file, creating missing parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
