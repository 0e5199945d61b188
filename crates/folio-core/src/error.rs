// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folio.

use thiserror::Error;

use crate::types::ImageId;

/// Top-level error type for all Folio operations.
#[derive(Debug, Error)]
pub enum FolioError {
    // -- Collection errors --
    #[error("{name} is not an image (declared type {mime_type:?})")]
    NotAnImage { name: String, mime_type: String },

    #[error("no images to export")]
    EmptyCollection,

    #[error("image {0} not found")]
    ImageNotFound(ImageId),

    // -- Editor errors --
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("an edit session is already open")]
    SessionAlreadyOpen,

    #[error("rendering failed: {0}")]
    RenderError(String),

    // -- Document errors --
    #[error("failed to decode image {name}: {reason}")]
    ImageDecode { name: String, reason: String },

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FolioError {
    /// Name of the image this error concerns, when it is known.
    pub fn image_name(&self) -> Option<&str> {
        match self {
            Self::NotAnImage { name, .. } | Self::ImageDecode { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;
