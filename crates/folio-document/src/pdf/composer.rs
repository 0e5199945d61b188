// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document composer — bind an ordered collection of images into a PDF with one
// image per page, using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use chrono::{DateTime, Utc};
use folio_core::AppConfig;
use folio_core::error::{FolioError, Result};
use folio_core::types::{Orientation, PaperSize};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

use crate::image::processor::ImageProcessor;

/// Images are embedded at 72 DPI so one pixel is one point before scaling.
const EMBED_DPI: f32 = 72.0;

/// Anything that can be laid out as a page: a name for error messages and the
/// encoded image bytes to draw.
pub trait PageImage {
    /// Display name, used to label decode failures.
    fn page_name(&self) -> &str;
    /// Encoded image bytes (JPEG, PNG, ...).
    fn page_bytes(&self) -> &[u8];
}

/// Where one image lands on its page, in millimetres from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Page units per source pixel.
    pub scale: f32,
}

/// Fit an `image_w` x `image_h` pixel image inside a `page_w` x `page_h` page
/// (minus `margin` on every side), preserving aspect ratio and centring it.
///
/// The scale is `min(usable_w / image_w, usable_h / image_h)`, so the image
/// always touches two opposite edges of the usable area and never exceeds it.
pub fn fit_to_page(page_w: f32, page_h: f32, margin: f32, image_w: u32, image_h: u32) -> Placement {
    let margin = margin.clamp(0.0, page_w.min(page_h) / 4.0);
    let usable_w = page_w - 2.0 * margin;
    let usable_h = page_h - 2.0 * margin;
    let (image_w, image_h) = (image_w.max(1) as f32, image_h.max(1) as f32);

    let scale = (usable_w / image_w).min(usable_h / image_h);
    let width = image_w * scale;
    let height = image_h * scale;

    Placement {
        x: margin + (usable_w - width) / 2.0,
        y: margin + (usable_h - height) / 2.0,
        width,
        height,
        scale,
    }
}

/// One page of a composed document.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPage {
    /// Name of the image drawn on this page.
    pub name: String,
    /// Source pixel dimensions.
    pub image_size: (u32, u32),
    pub placement: Placement,
}

/// The composed, not yet named, document: page layout plus serialised PDF.
#[derive(Debug, Clone)]
pub struct DocumentArtifact {
    /// Page size in millimetres.
    pub page_size_mm: (f32, f32),
    /// Pages in collection order.
    pub pages: Vec<ComposedPage>,
    /// PDF bytes.
    pub pdf: Vec<u8>,
}

impl DocumentArtifact {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// A finished document ready to hand to the user.
#[derive(Debug, Clone)]
pub struct FinalizedDocument {
    /// Suggested filename, e.g. `images-to-pdf-2026-10-14T09-30-00.pdf`.
    pub filename: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Progress report emitted after each page is drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeProgress {
    /// Zero-based index of the page just finished.
    pub index: usize,
    pub total: usize,
    pub name: String,
}

/// Binds images into a multi-page PDF on fixed-size pages.
#[derive(Debug, Clone)]
pub struct DocumentComposer {
    paper_size: PaperSize,
    orientation: Orientation,
    margin_mm: f32,
    title: String,
    filename_prefix: String,
}

impl DocumentComposer {
    /// Create a composer targeting the given paper size, portrait, no margin.
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            orientation: Orientation::Portrait,
            margin_mm: 0.0,
            title: "Folio Images".into(),
            filename_prefix: "images-to-pdf".into(),
        }
    }

    /// Create a composer defaulting to A4 portrait.
    pub fn a4() -> Self {
        Self::new(PaperSize::A4)
    }

    /// Create a composer from the page settings in `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut composer = Self::new(config.paper_size);
        composer.orientation = config.orientation;
        composer.margin_mm = config.page_margin_mm;
        composer.filename_prefix = config.output_prefix.clone();
        composer
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn set_margin_mm(&mut self, margin_mm: f32) {
        self.margin_mm = margin_mm;
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Page dimensions in millimetres.
    pub fn page_size_mm(&self) -> (f32, f32) {
        self.paper_size.page_mm(self.orientation)
    }

    // -- Composition ----------------------------------------------------------

    /// Compose `images` into a document, one page per image, in order.
    pub fn compose<I: PageImage>(&self, images: &[I]) -> Result<DocumentArtifact> {
        self.compose_with_progress(images, |_| {})
    }

    /// Compose `images`, calling `on_page` after each page is drawn.
    ///
    /// Images are decoded and drawn strictly one at a time. The first decode
    /// failure aborts the whole document with `ImageDecode` naming the image;
    /// no partial artifact is returned.
    #[instrument(skip_all, fields(images = images.len()))]
    pub fn compose_with_progress<I: PageImage>(
        &self,
        images: &[I],
        mut on_page: impl FnMut(ComposeProgress),
    ) -> Result<DocumentArtifact> {
        if images.is_empty() {
            return Err(FolioError::EmptyCollection);
        }

        let (page_w, page_h) = self.page_size_mm();
        info!(
            paper = ?self.paper_size,
            orientation = ?self.orientation,
            pages = images.len(),
            "Composing PDF"
        );

        let mut doc = PdfDocument::new(&self.title);
        let mut pdf_pages: Vec<PdfPage> = Vec::with_capacity(images.len());
        let mut pages: Vec<ComposedPage> = Vec::with_capacity(images.len());

        for (index, image) in images.iter().enumerate() {
            let name = image.page_name();
            let decoded = ImageProcessor::decode(name, image.page_bytes())?.into_dynamic();
            let (img_w, img_h) = (decoded.width(), decoded.height());

            // Convert to RGB8 for printpdf.
            let rgb_image = decoded.to_rgb8();
            let raw = RawImage {
                pixels: RawImageData::U8(rgb_image.into_raw()),
                width: img_w as usize,
                height: img_h as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let placement = fit_to_page(page_w, page_h, self.margin_mm, img_w, img_h);

            // PDF space has its origin at the bottom-left corner.
            let x_pt = Mm(placement.x).into_pt().0;
            let y_pt = Mm(page_h - placement.y - placement.height).into_pt().0;
            let draw_w_pt = Mm(placement.width).into_pt().0;
            let scale = draw_w_pt / img_w.max(1) as f32;

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(x_pt)),
                    translate_y: Some(Pt(y_pt)),
                    scale_x: Some(scale),
                    scale_y: Some(scale),
                    dpi: Some(EMBED_DPI),
                    rotate: None,
                },
            }];
            pdf_pages.push(PdfPage::new(Mm(page_w), Mm(page_h), ops));

            debug!(
                index,
                name,
                x_mm = placement.x,
                y_mm = placement.y,
                w_mm = placement.width,
                h_mm = placement.height,
                "Image placed on page"
            );

            pages.push(ComposedPage {
                name: name.to_owned(),
                image_size: (img_w, img_h),
                placement,
            });
            on_page(ComposeProgress {
                index,
                total: images.len(),
                name: name.to_owned(),
            });
        }

        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let pdf = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(pdf_bytes = pdf.len(), warnings = warnings.len(), "PDF serialised");

        Ok(DocumentArtifact {
            page_size_mm: (page_w, page_h),
            pages,
            pdf,
        })
    }

    /// Compose on the blocking thread pool so the caller's task stays free.
    ///
    /// Dropping the returned future abandons the result.
    pub async fn compose_async<I>(&self, images: Vec<I>) -> Result<DocumentArtifact>
    where
        I: PageImage + Send + 'static,
    {
        let composer = self.clone();
        tokio::task::spawn_blocking(move || composer.compose(&images))
            .await
            .map_err(|err| FolioError::RenderError(format!("composition task failed: {err}")))?
    }

    // -- Naming ---------------------------------------------------------------

    /// Name the artifact after the current UTC time.
    pub fn finalize(&self, artifact: DocumentArtifact) -> FinalizedDocument {
        self.finalize_at(artifact, Utc::now())
    }

    /// Name the artifact after `at`: `<prefix>-YYYY-MM-DDTHH-MM-SS.pdf`.
    pub fn finalize_at(&self, artifact: DocumentArtifact, at: DateTime<Utc>) -> FinalizedDocument {
        let filename = format!(
            "{}-{}.pdf",
            self.filename_prefix,
            at.format("%Y-%m-%dT%H-%M-%S")
        );
        info!(%filename, pages = artifact.page_count(), "Document finalized");
        FinalizedDocument {
            filename,
            page_count: artifact.page_count(),
            bytes: artifact.pdf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::PdfReader;
    use chrono::TimeZone;
    use image::{DynamicImage, Rgba, RgbaImage};

    struct TestImage {
        name: String,
        bytes: Vec<u8>,
    }

    impl PageImage for TestImage {
        fn page_name(&self) -> &str {
            &self.name
        }
        fn page_bytes(&self) -> &[u8] {
            &self.bytes
        }
    }

    fn png(name: &str, width: u32, height: u32) -> TestImage {
        let img =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255])));
        TestImage {
            name: name.into(),
            bytes: ImageProcessor::from_dynamic(img).to_png_bytes().unwrap(),
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn tall_image_fits_height_and_centres_horizontally() {
        let placement = fit_to_page(210.0, 297.0, 0.0, 100, 200);
        assert!(approx(placement.scale, 1.485));
        assert!(approx(placement.width, 148.5));
        assert!(approx(placement.height, 297.0));
        assert!(approx(placement.x, 30.75));
        assert!(approx(placement.y, 0.0));
    }

    #[test]
    fn wide_image_fits_width_and_centres_vertically() {
        let placement = fit_to_page(210.0, 297.0, 0.0, 420, 210);
        assert!(approx(placement.width, 210.0));
        assert!(approx(placement.height, 105.0));
        assert!(approx(placement.x, 0.0));
        assert!(approx(placement.y, 96.0));
    }

    #[test]
    fn margin_shrinks_usable_area() {
        let placement = fit_to_page(210.0, 297.0, 15.0, 100, 100);
        assert!(approx(placement.width, 180.0));
        assert!(approx(placement.x, 15.0));
        assert!(approx(placement.y, (297.0 - 180.0) / 2.0));
    }

    #[test]
    fn margin_and_title_overrides_reach_the_document() {
        let mut composer = DocumentComposer::a4();
        composer.set_margin_mm(15.0);
        composer.set_title("Receipts");
        assert_eq!(composer.title(), "Receipts");

        let artifact = composer.compose(&[png("square.png", 100, 100)]).unwrap();
        let placement = &artifact.pages[0].placement;
        assert!(approx(placement.width, 180.0));
        assert!(approx(placement.x, 15.0));
    }

    #[test]
    fn empty_collection_is_rejected() {
        let images: Vec<TestImage> = Vec::new();
        assert!(matches!(
            DocumentComposer::a4().compose(&images),
            Err(FolioError::EmptyCollection)
        ));
    }

    #[test]
    fn one_page_per_image_in_order() {
        let images = vec![png("a.png", 100, 200), png("b.png", 300, 100), png("c.png", 50, 50)];
        let artifact = DocumentComposer::a4().compose(&images).unwrap();

        let names: Vec<&str> = artifact.pages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a.png", "b.png", "c.png"]);
        assert_eq!(artifact.pages[1].image_size, (300, 100));

        let reader = PdfReader::from_bytes(&artifact.pdf).unwrap();
        assert_eq!(reader.page_count(), 3);
    }

    #[test]
    fn decode_failure_aborts_and_names_image() {
        let images = vec![
            png("good.png", 10, 10),
            TestImage {
                name: "bad.jpg".into(),
                bytes: b"not really a jpeg".to_vec(),
            },
            png("never-reached.png", 10, 10),
        ];
        let mut seen = Vec::new();
        let result = DocumentComposer::a4().compose_with_progress(&images, |p| seen.push(p.name));

        match result {
            Err(FolioError::ImageDecode { name, .. }) => assert_eq!(name, "bad.jpg"),
            other => panic!("expected ImageDecode, got {other:?}"),
        }
        assert_eq!(seen, ["good.png"]);
    }

    #[test]
    fn landscape_pages_swap_dimensions() {
        let mut composer = DocumentComposer::a4();
        composer.set_orientation(Orientation::Landscape);
        let artifact = composer.compose(&[png("wide.png", 400, 100)]).unwrap();
        assert_eq!(artifact.page_size_mm, (297.0, 210.0));

        let reader = PdfReader::from_bytes(&artifact.pdf).unwrap();
        let (w_pt, h_pt) = reader.page_size_pt(1).unwrap();
        assert!(w_pt > h_pt);
    }

    #[test]
    fn filename_is_timestamp_derived() {
        let composer = DocumentComposer::a4();
        let artifact = composer.compose(&[png("a.png", 8, 8)]).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 10, 14, 9, 5, 7).unwrap();

        let finalized = composer.finalize_at(artifact, at);
        assert_eq!(finalized.filename, "images-to-pdf-2026-10-14T09-05-07.pdf");
        assert_eq!(finalized.page_count, 1);
        assert!(finalized.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn async_compose_matches_sync_layout() {
        let composer = DocumentComposer::a4();
        let artifact = composer
            .compose_async(vec![png("a.png", 100, 200), png("b.png", 200, 100)])
            .await
            .unwrap();
        assert_eq!(artifact.page_count(), 2);
        assert!(approx(artifact.pages[0].placement.x, 30.75));
    }
}
