// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image record store — the ordered collection of images that gets exported.
//
// The store is a cheaply cloneable handle around `Arc<Mutex<..>>` so the edit
// session can write committed bytes back while holding its record
// exclusively. Every operation is short and non-blocking; pixel work happens
// outside the lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use folio_core::error::{FolioError, Result};
use folio_core::types::{ImageId, format_file_size};
use folio_document::{ImageProcessor, PageImage};
use tracing::{debug, info, instrument, warn};

use crate::integrity::{fingerprint, short_fingerprint};

/// One image in the collection.
///
/// `original_bytes` never changes after creation; `current_bytes` is replaced
/// wholesale by each committed edit and never patched in place.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    id: ImageId,
    name: String,
    byte_size: u64,
    mime_type: String,
    original_digest: String,
    original_bytes: Arc<[u8]>,
    original_size: (u32, u32),
    current_bytes: Arc<[u8]>,
    current_size: (u32, u32),
}

impl ImageRecord {
    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the file as it was added, in bytes.
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// `byte_size` for display, e.g. `1.5 MB`.
    pub fn display_size(&self) -> String {
        format_file_size(self.byte_size)
    }

    /// MIME type declared when the file was added.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// SHA-256 (hex) of the bytes the record was created from.
    pub fn original_digest(&self) -> &str {
        &self.original_digest
    }

    pub fn original_bytes(&self) -> &[u8] {
        &self.original_bytes
    }

    pub fn current_bytes(&self) -> &[u8] {
        &self.current_bytes
    }

    /// Pixel dimensions of the current bytes.
    pub fn dimensions(&self) -> (u32, u32) {
        self.current_size
    }

    /// Whether any committed edit is in effect.
    pub fn is_modified(&self) -> bool {
        self.current_bytes != self.original_bytes
    }
}

impl PageImage for ImageRecord {
    fn page_name(&self) -> &str {
        &self.name
    }

    fn page_bytes(&self) -> &[u8] {
        &self.current_bytes
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    records: Vec<ImageRecord>,
    /// Record currently held by the open edit session, if any.
    editing: Option<ImageId>,
}

impl StoreInner {
    fn record_mut(&mut self, id: ImageId) -> Result<&mut ImageRecord> {
        self.records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(FolioError::ImageNotFound(id))
    }
}

/// Ordered image collection. Insertion order is export order.
#[derive(Debug, Clone, Default)]
pub struct ImageStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- Collection -----------------------------------------------------------

    /// Add an uploaded or captured file to the end of the collection.
    ///
    /// Rejects MIME types outside `image/*` with `NotAnImage`, and bytes that do
    /// not decode with `ImageDecode`. Records are told apart by id, so two files
    /// with the same name are both kept.
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    pub fn add(
        &self,
        bytes: Vec<u8>,
        name: impl Into<String> + std::fmt::Debug,
        mime_type: impl Into<String> + std::fmt::Debug,
    ) -> Result<ImageRecord> {
        let name = name.into();
        let mime_type = mime_type.into();

        if !mime_type.to_ascii_lowercase().starts_with("image/") {
            warn!(%name, %mime_type, "Rejected non-image file");
            return Err(FolioError::NotAnImage { name, mime_type });
        }

        let decoded = ImageProcessor::decode(&name, &bytes)?;
        let size = (decoded.width(), decoded.height());
        let original: Arc<[u8]> = Arc::from(bytes);

        let record = ImageRecord {
            id: ImageId::new(),
            byte_size: original.len() as u64,
            mime_type,
            original_digest: fingerprint(&original),
            original_size: size,
            current_bytes: Arc::clone(&original),
            current_size: size,
            original_bytes: original,
            name,
        };

        let mut inner = self.lock();
        inner.records.push(record.clone());
        info!(
            id = %record.id,
            name = %record.name,
            width = size.0,
            height = size.1,
            digest = %&record.original_digest[..12],
            count = inner.records.len(),
            "Image added"
        );
        Ok(record)
    }

    /// Remove the record with `id`. Absent ids are a no-op.
    ///
    /// Fails with `InvalidState` while the record is open in the editor.
    pub fn remove(&self, id: ImageId) -> Result<()> {
        let mut inner = self.lock();
        if inner.editing == Some(id) {
            warn!(%id, "Refused to remove image under edit");
            return Err(FolioError::InvalidState(format!(
                "image {id} is open in the editor"
            )));
        }
        let before = inner.records.len();
        inner.records.retain(|r| r.id != id);
        if inner.records.len() < before {
            info!(%id, count = inner.records.len(), "Image removed");
        } else {
            debug!(%id, "Remove of unknown image ignored");
        }
        Ok(())
    }

    /// Empty the collection. Fails with `InvalidState` while an edit session
    /// is open, since that would remove the record under edit.
    pub fn clear(&self) -> Result<()> {
        let mut inner = self.lock();
        if let Some(id) = inner.editing {
            return Err(FolioError::InvalidState(format!(
                "cannot clear while image {id} is open in the editor"
            )));
        }
        inner.records.clear();
        info!("Collection cleared");
        Ok(())
    }

    /// Snapshot of the collection in export order.
    pub fn list(&self) -> Vec<ImageRecord> {
        self.lock().records.clone()
    }

    pub fn get(&self, id: ImageId) -> Option<ImageRecord> {
        self.lock().records.iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Whether `id` is currently open in the editor.
    pub fn is_editing(&self, id: ImageId) -> bool {
        self.lock().editing == Some(id)
    }

    // -- Edit session hooks -----------------------------------------------------

    /// Mark `id` as under edit and return a snapshot of it.
    pub(crate) fn claim(&self, id: ImageId) -> Result<ImageRecord> {
        let mut inner = self.lock();
        if inner.editing.is_some() {
            return Err(FolioError::SessionAlreadyOpen);
        }
        let record = inner
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(FolioError::ImageNotFound(id))?;
        inner.editing = Some(id);
        Ok(record)
    }

    /// Release the edit claim on `id`.
    pub(crate) fn release(&self, id: ImageId) {
        let mut inner = self.lock();
        if inner.editing == Some(id) {
            inner.editing = None;
        }
    }

    pub(crate) fn current_bytes(&self, id: ImageId) -> Result<Arc<[u8]>> {
        let mut inner = self.lock();
        Ok(Arc::clone(&inner.record_mut(id)?.current_bytes))
    }

    /// Replace the current bytes of `id` wholesale.
    pub(crate) fn write_current(
        &self,
        id: ImageId,
        bytes: Arc<[u8]>,
        size: (u32, u32),
    ) -> Result<()> {
        let mut inner = self.lock();
        let record = inner.record_mut(id)?;
        debug!(
            %id,
            digest = %short_fingerprint(&bytes),
            width = size.0,
            height = size.1,
            "Current bytes replaced"
        );
        record.current_bytes = bytes;
        record.current_size = size;
        Ok(())
    }

    /// Point the current bytes of `id` back at its original bytes.
    pub(crate) fn revert_to_original(&self, id: ImageId) -> Result<Arc<[u8]>> {
        let mut inner = self.lock();
        let record = inner.record_mut(id)?;
        record.current_bytes = Arc::clone(&record.original_bytes);
        record.current_size = record.original_size;
        Ok(Arc::clone(&record.original_bytes))
    }
}
