// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Build pipeline — add every input to a store, run the same edit plan over
// each image through a real edit session, then compose and name the PDF.

use folio_core::error::Result;
use folio_core::types::{AspectRatio, FlipAxis};
use folio_document::{DocumentComposer, FinalizedDocument};
use folio_editor::{CropBox, CropSettings, EditSession, ImageStore};
use tracing::{debug, info, instrument};

use super::inputs::InputFile;

/// Edits applied to every image of a build.
#[derive(Debug, Clone, Default)]
pub struct EditPlan {
    pub rotate: Option<f32>,
    pub flips: Vec<FlipAxis>,
    pub brightness: Option<i32>,
    pub contrast: Option<i32>,
    pub saturation: Option<i32>,
    /// Crop applied after the transform edits are committed.
    pub crop: Option<CropBox>,
    pub aspect: Option<AspectRatio>,
}

impl EditPlan {
    fn has_transform(&self) -> bool {
        self.rotate.is_some()
            || !self.flips.is_empty()
            || self.brightness.is_some()
            || self.contrast.is_some()
            || self.saturation.is_some()
    }

    fn has_crop(&self) -> bool {
        self.crop.is_some() || self.aspect.is_some()
    }

    fn is_empty(&self) -> bool {
        !self.has_transform() && !self.has_crop()
    }

    /// Run the plan through an open session, committing as it goes.
    async fn apply(&self, session: &mut EditSession) -> Result<()> {
        if self.has_transform() {
            if let Some(delta) = self.rotate {
                session.rotate(delta)?;
            }
            for axis in &self.flips {
                session.flip(*axis)?;
            }
            if let Some(value) = self.brightness {
                session.set_brightness(value)?;
            }
            if let Some(value) = self.contrast {
                session.set_contrast(value)?;
            }
            if let Some(value) = self.saturation {
                session.set_saturation(value)?;
            }
            session.commit_async().await?;
        }

        if self.has_crop() {
            session.enter_crop()?;
            let crop = session.crop_mut()?;
            if let Some(aspect) = self.aspect {
                crop.set_aspect_ratio(aspect);
            }
            if let Some(crop_box) = self.crop {
                crop.set_box(crop_box);
            }
            session.apply_crop_async().await?;
        }
        Ok(())
    }
}

/// Add `inputs` in order, edit each with `plan`, and compose the document.
///
/// The first failure stops the build and is returned as is.
#[instrument(skip_all, fields(inputs = inputs.len()))]
pub async fn build_document(
    inputs: Vec<InputFile>,
    plan: &EditPlan,
    crop_settings: CropSettings,
    composer: &DocumentComposer,
) -> Result<FinalizedDocument> {
    let store = ImageStore::new();
    for input in inputs {
        let record = store.add(input.bytes, input.name, input.mime_type)?;
        debug!(
            name = record.name(),
            mime_type = record.mime_type(),
            size = %record.display_size(),
            "Image added"
        );
    }

    if !plan.is_empty() {
        for record in store.list() {
            let mut session = store.open_session_with(record.id(), crop_settings)?;
            plan.apply(&mut session).await?;
            session.close();
        }
    }

    let records = store.list();
    info!(images = records.len(), "Composing document");
    let artifact = composer.compose_async(records).await?;
    Ok(composer.finalize(artifact))
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::FolioError;
    use folio_document::{ImageProcessor, PdfReader};
    use image::{DynamicImage, Rgba, RgbaImage};

    fn png_input(name: &str, width: u32, height: u32) -> InputFile {
        let pixels = RgbaImage::from_pixel(width, height, Rgba([40, 80, 120, 255]));
        let img = DynamicImage::ImageRgba8(pixels);
        InputFile {
            name: name.into(),
            mime_type: "image/png".into(),
            bytes: ImageProcessor::from_dynamic(img).to_png_bytes().unwrap(),
        }
    }

    #[tokio::test]
    async fn builds_one_page_per_input() {
        let inputs = vec![png_input("a.png", 30, 40), png_input("b.png", 40, 30)];
        let plan = EditPlan {
            rotate: Some(90.0),
            brightness: Some(20),
            crop: Some(CropBox {
                x: 0,
                y: 0,
                width: 20,
                height: 20,
            }),
            ..EditPlan::default()
        };

        let doc = build_document(inputs, &plan, CropSettings::default(), &DocumentComposer::a4())
            .await
            .unwrap();

        assert_eq!(doc.page_count, 2);
        assert!(doc.filename.starts_with("images-to-pdf-") && doc.filename.ends_with(".pdf"));
        assert_eq!(PdfReader::from_bytes(&doc.bytes).unwrap().page_count(), 2);
    }

    #[tokio::test]
    async fn no_inputs_is_empty_collection() {
        let err = build_document(
            Vec::new(),
            &EditPlan::default(),
            CropSettings::default(),
            &DocumentComposer::a4(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FolioError::EmptyCollection));
    }

    #[tokio::test]
    async fn non_image_input_stops_the_build() {
        let text = InputFile {
            name: "notes.txt".into(),
            mime_type: "application/octet-stream".into(),
            bytes: b"hello".to_vec(),
        };
        let err = build_document(
            vec![png_input("a.png", 10, 10), text],
            &EditPlan::default(),
            CropSettings::default(),
            &DocumentComposer::a4(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FolioError::NotAnImage { ref name, .. } if name == "notes.txt"));
    }
}
