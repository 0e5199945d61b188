// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input normalisation — every file becomes (bytes, name, MIME type) before it
// reaches the store, whatever its origin.

use std::path::Path;

use folio_core::error::Result;
use folio_editor::CropBox;
use image::ImageFormat;
use tracing::debug;

/// MIME type reported for files whose extension is not a known image format.
const UNKNOWN_MIME: &str = "application/octet-stream";

/// One file ready to be added to the collection.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Read a file from disk and declare its MIME type from the extension.
pub fn read_input(path: &Path) -> Result<InputFile> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = mime_for_path(path).to_owned();
    debug!(%name, %mime_type, bytes = bytes.len(), "Input read");
    Ok(InputFile { name, mime_type, bytes })
}

/// MIME type for `path` based on its extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or(UNKNOWN_MIME)
}

/// Parse a crop box from `x,y,width,height`.
pub fn parse_crop_box(value: &str) -> std::result::Result<CropBox, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [x, y, width, height] = parts.as_slice() else {
        return Err(format!("crop must be in format x,y,width,height, got: {value}"));
    };
    let parse = |label: &str, raw: &str| {
        raw.parse::<u32>()
            .map_err(|_| format!("invalid {label}: {raw}"))
    };
    let crop_box = CropBox {
        x: parse("x", x)?,
        y: parse("y", y)?,
        width: parse("width", width)?,
        height: parse("height", height)?,
    };
    if crop_box.width == 0 || crop_box.height == 0 {
        return Err("crop width and height must be positive".into());
    }
    Ok(crop_box)
}
