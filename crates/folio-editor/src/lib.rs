// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-editor — The image collection and the single-image editor.
//
// `ImageStore` owns the ordered collection that gets exported. An
// `EditSession` holds one record exclusively while it is edited, switching
// between free transform mode and crop mode (`CropState`).

pub mod crop;
pub mod integrity;
pub mod session;
pub mod store;

pub use crop::{CropBox, CropSettings, CropState};
pub use session::{EditMode, EditSession};
pub use store::{ImageRecord, ImageStore};
