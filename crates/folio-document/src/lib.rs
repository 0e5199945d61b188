// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-document — Pixel and document processing for Folio.
//
// Provides image operations (rotate, flip, resize, brightness/contrast/
// saturation) and the document composer that lays an ordered image collection
// out as a one-image-per-page PDF.

pub mod image;
pub mod pdf;

// Re-export the primary structs so callers can use `folio_document::DocumentComposer` etc.
pub use crate::image::processor::ImageProcessor;
pub use pdf::composer::{
    ComposeProgress, ComposedPage, DocumentArtifact, DocumentComposer, FinalizedDocument,
    PageImage, Placement, fit_to_page,
};
pub use pdf::reader::PdfReader;
