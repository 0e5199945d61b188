// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open and inspect composed PDF documents using the `lopdf` crate.

use std::path::Path;

use folio_core::error::{FolioError, Result};
use lopdf::{Document, ObjectId};
use tracing::{debug, info, instrument};

/// Maximum `/Parent` hops followed when looking for an inherited `/MediaBox`.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Reads existing PDF files for inspection.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            FolioError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self { document })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            FolioError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Width and height in points of page `page_number` (1-indexed), read from
    /// its `/MediaBox`, following `/Parent` inheritance.
    pub fn page_size_pt(&self, page_number: u32) -> Result<(f32, f32)> {
        let pages = self.document.get_pages();
        let page_id = *pages.get(&page_number).ok_or_else(|| {
            FolioError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })?;
        self.media_box(page_id)
    }

    /// Page sizes in points for every page, in page order.
    pub fn page_sizes_pt(&self) -> Result<Vec<(f32, f32)>> {
        self.document
            .get_pages()
            .values()
            .map(|id| self.media_box(*id))
            .collect()
    }

    // -- Helpers --------------------------------------------------------------

    fn media_box(&self, page_id: ObjectId) -> Result<(f32, f32)> {
        let pdf_err =
            |what: &str, err: lopdf::Error| FolioError::PdfError(format!("{what}: {err}"));

        let mut node = page_id;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let dict = self
                .document
                .get_dictionary(node)
                .map_err(|e| pdf_err("page dictionary", e))?;

            if let Ok(media_box) = dict.get(b"MediaBox") {
                let (_, media_box) = self
                    .document
                    .dereference(media_box)
                    .map_err(|e| pdf_err("MediaBox reference", e))?;
                let coords = media_box
                    .as_array()
                    .map_err(|e| pdf_err("MediaBox", e))?
                    .iter()
                    .map(|v| v.as_float())
                    .collect::<std::result::Result<Vec<f32>, _>>()
                    .map_err(|e| pdf_err("MediaBox coordinate", e))?;
                if coords.len() != 4 {
                    return Err(FolioError::PdfError(format!(
                        "MediaBox has {} entries, expected 4",
                        coords.len()
                    )));
                }
                return Ok(((coords[2] - coords[0]).abs(), (coords[3] - coords[1]).abs()));
            }

            node = dict
                .get(b"Parent")
                .and_then(|parent| parent.as_reference())
                .map_err(|e| pdf_err("page has no MediaBox", e))?;
        }

        Err(FolioError::PdfError("MediaBox inheritance too deep".into()))
    }
}
