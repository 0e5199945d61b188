// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — rotate, flip, resize, and brightness/contrast/
// saturation adjustment. Operates on in-memory images using the `image` and
// `imageproc` crates.

use folio_core::error::{FolioError, Result};
use folio_core::types::{ColorAdjustments, Geometry};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::geometric_transformations::{self, Interpolation};
use tracing::{debug, info, instrument};

/// Fill for canvas area uncovered by an arbitrary-angle rotation.
const ROTATION_FILL: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// Image processing pipeline operating on a single in-memory image.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let png = ImageProcessor::decode("photo.jpg", &bytes)?
///     .flip_horizontal()
///     .rotate(90.0)
///     .apply_color(&ColorAdjustments { brightness: 20, ..Default::default() })
///     .to_png_bytes()?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (JPEG, PNG, WebP, ...). `name` is only used to
    /// label the error when the bytes are not a decodable image.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn decode(name: &str, data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| FolioError::ImageDecode {
            name: name.to_owned(),
            reason: err.to_string(),
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Composite edits ------------------------------------------------------

    /// Bake a full pending edit state into the image: colour first, then
    /// flips in the image's own frame, then rotation about the centre.
    ///
    /// Every call starts from the image it is given, so applying the same
    /// `Geometry`/`ColorAdjustments` to the same source always yields the same
    /// pixels.
    #[instrument(skip(self), fields(width = self.width(), height = self.height()))]
    pub fn apply_edits(self, geometry: &Geometry, color: &ColorAdjustments) -> Self {
        let mut processor = self.apply_color(color);
        if geometry.flip_horizontal {
            processor = processor.flip_horizontal();
        }
        if geometry.flip_vertical {
            processor = processor.flip_vertical();
        }
        processor.rotate(geometry.rotation)
    }

    /// Apply the three slider adjustments (each `-100..=100`) in one pass.
    ///
    /// Brightness shifts every channel by `v/100 * 255`; contrast scales around
    /// mid-grey with the classic `259(c+255) / (255(259-c))` factor where
    /// `c = v/100 * 255`; saturation pushes the non-maximal channels toward or
    /// away from the pixel's brightest channel.
    #[instrument(skip(self))]
    pub fn apply_color(self, color: &ColorAdjustments) -> Self {
        if color.is_identity() {
            return self;
        }
        let brightness = slider_to_brightness(color.brightness);
        let contrast = slider_to_contrast_factor(color.contrast);
        let saturation = ColorAdjustments::clamp(color.saturation) as f32 / 100.0;

        // Brightness and contrast are per-channel, so fold them into one table.
        let table: [u8; 256] = std::array::from_fn(|value| {
            let brightened = (value as i32 + brightness).clamp(0, 255) as f32;
            (contrast * (brightened - 128.0) + 128.0).round().clamp(0.0, 255.0) as u8
        });

        let mut rgba = self.image.to_rgba8();
        for pixel in rgba.pixels_mut() {
            let Rgba([r, g, b, a]) = *pixel;
            let mapped = [table[r as usize], table[g as usize], table[b as usize]];
            let out = if saturation == 0.0 {
                mapped
            } else {
                saturate(mapped, saturation)
            };
            *pixel = Rgba([out[0], out[1], out[2], a]);
        }
        debug!(brightness, contrast, saturation, "Colour adjustments applied");
        Self {
            image: DynamicImage::ImageRgba8(rgba),
        }
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Resize the image to fit within `max_width` x `max_height`, preserving
    /// aspect ratio. Uses Lanczos3 filtering for high-quality downscaling.
    #[instrument(skip(self), fields(max_width, max_height))]
    pub fn resize(self, max_width: u32, max_height: u32) -> Self {
        info!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            max_width,
            max_height,
            "Resizing image"
        );
        let resized = self
            .image
            .resize(max_width, max_height, image::imageops::FilterType::Lanczos3);
        debug!(
            new_w = resized.width(),
            new_h = resized.height(),
            "Resize complete"
        );
        Self { image: resized }
    }

    /// Rotate the image by an arbitrary angle in degrees (clockwise).
    ///
    /// For 90/180/270 degree rotations, lossless rotation is used. For other
    /// angles the canvas first grows to the rotated bounding box, then bilinear
    /// rotation about the centre is applied, so no pixel is clipped.
    #[instrument(skip(self), fields(degrees))]
    pub fn rotate(self, degrees: f32) -> Self {
        // Fast-path for exact multiples of 90.
        let normalised = degrees.rem_euclid(360.0);
        if normalised.abs() < 0.01 || (normalised - 360.0).abs() < 0.01 {
            return self;
        }
        if (normalised - 90.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate90(),
            };
        }
        if (normalised - 180.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate180(),
            };
        }
        if (normalised - 270.0).abs() < 0.01 {
            return Self {
                image: self.image.rotate270(),
            };
        }

        let rgba = self.image.to_rgba8();
        let (w, h) = rgba.dimensions();
        let radians = normalised.to_radians();
        let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
        let canvas_w = (w as f32 * cos + h as f32 * sin).ceil() as u32;
        let canvas_h = (w as f32 * sin + h as f32 * cos).ceil() as u32;

        let mut canvas = RgbaImage::from_pixel(canvas_w.max(w), canvas_h.max(h), ROTATION_FILL);
        let offset_x = (canvas.width() - w) / 2;
        let offset_y = (canvas.height() - h) / 2;
        image::imageops::overlay(&mut canvas, &rgba, offset_x as i64, offset_y as i64);

        let rotated: RgbaImage = geometric_transformations::rotate_about_center(
            &canvas,
            radians,
            Interpolation::Bilinear,
            ROTATION_FILL,
        );

        debug!(canvas_w, canvas_h, "General rotation applied");
        Self {
            image: DynamicImage::ImageRgba8(rotated),
        }
    }

    /// Mirror the image left-to-right.
    pub fn flip_horizontal(self) -> Self {
        Self {
            image: self.image.fliph(),
        }
    }

    /// Mirror the image top-to-bottom.
    pub fn flip_vertical(self) -> Self {
        Self {
            image: self.image.flipv(),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png)
    }
}

/// Slider value to a per-channel brightness offset.
fn slider_to_brightness(value: i32) -> i32 {
    (ColorAdjustments::clamp(value) as f32 / 100.0 * 255.0).round() as i32
}

/// Slider value to a multiplicative contrast factor around mid-grey.
fn slider_to_contrast_factor(value: i32) -> f32 {
    let c = ColorAdjustments::clamp(value) as f32 / 100.0 * 255.0;
    259.0 * (c + 255.0) / (255.0 * (259.0 - c))
}

/// Move each non-maximal channel toward (`amount < 0`) or away from
/// (`amount > 0`) the pixel's maximum channel.
fn saturate(rgb: [u8; 3], amount: f32) -> [u8; 3] {
    let max = rgb.iter().copied().max().unwrap_or(0) as f32;
    let adjust = -amount;
    rgb.map(|channel| {
        let c = channel as f32;
        if c == max {
            channel
        } else {
            (c + (max - c) * adjust).round().clamp(0.0, 255.0) as u8
        }
    })
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| FolioError::RenderError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::types::FlipAxis;

    /// 3x2 image whose pixels are all distinct, so geometry is observable.
    fn marked_image() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(3, 2, |x, y| {
            Rgba([(x * 80) as u8, (y * 120) as u8, 40, 255])
        }))
    }

    fn grey(value: u8) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([value, value, value, 255])))
    }

    #[test]
    fn right_angle_rotation_swaps_dimensions() {
        let rotated = ImageProcessor::from_dynamic(marked_image()).rotate(90.0);
        assert_eq!((rotated.width(), rotated.height()), (2, 3));

        let full_turn = ImageProcessor::from_dynamic(marked_image()).rotate(360.0);
        assert_eq!(full_turn.as_dynamic().to_rgba8(), marked_image().to_rgba8());
    }

    #[test]
    fn arbitrary_rotation_expands_canvas() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 50, Rgba([0, 0, 0, 255])));
        let rotated = ImageProcessor::from_dynamic(img).rotate(45.0);
        // Bounding box of a 100x50 rectangle at 45 degrees is ~106x106.
        assert!(rotated.width() >= 106);
        assert!(rotated.height() >= 106);
    }

    #[test]
    fn flips_apply_before_rotation() {
        let mut geometry = Geometry::default();
        geometry.flip(FlipAxis::Horizontal);
        geometry.rotate(90.0);

        let edited = ImageProcessor::from_dynamic(marked_image())
            .apply_edits(&geometry, &ColorAdjustments::default())
            .into_dynamic();
        let expected = marked_image().fliph().rotate90();
        assert_eq!(edited.to_rgba8(), expected.to_rgba8());
    }

    #[test]
    fn identity_edits_leave_pixels_alone() {
        let edited = ImageProcessor::from_dynamic(marked_image())
            .apply_edits(&Geometry::default(), &ColorAdjustments::default())
            .into_dynamic();
        assert_eq!(edited.to_rgba8(), marked_image().to_rgba8());
    }

    #[test]
    fn brightness_slider_shifts_channels() {
        let color = ColorAdjustments {
            brightness: 20,
            ..Default::default()
        };
        let out = ImageProcessor::from_dynamic(grey(100)).apply_color(&color).into_dynamic();
        // 20/100 * 255 = 51
        assert_eq!(out.to_rgba8().get_pixel(0, 0).0, [151, 151, 151, 255]);
    }

    #[test]
    fn contrast_slider_spreads_around_mid_grey() {
        let color = ColorAdjustments {
            contrast: 50,
            ..Default::default()
        };
        let dark = ImageProcessor::from_dynamic(grey(100)).apply_color(&color).into_dynamic();
        let light = ImageProcessor::from_dynamic(grey(160)).apply_color(&color).into_dynamic();
        assert!(dark.to_rgba8().get_pixel(0, 0).0[0] < 100);
        assert!(light.to_rgba8().get_pixel(0, 0).0[0] > 160);
    }

    #[test]
    fn negative_saturation_moves_toward_grey() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([200, 100, 50, 255])));
        let color = ColorAdjustments {
            saturation: -100,
            ..Default::default()
        };
        let out = ImageProcessor::from_dynamic(img).apply_color(&color).into_dynamic();
        assert_eq!(out.to_rgba8().get_pixel(0, 0).0, [200, 200, 200, 255]);
    }

    #[test]
    fn resize_preserves_aspect_ratio() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(400, 200, Rgba([5, 5, 5, 255])));
        let resized = ImageProcessor::from_dynamic(img).resize(100, 100);
        assert_eq!((resized.width(), resized.height()), (100, 50));
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let png = ImageProcessor::from_dynamic(marked_image()).to_png_bytes().unwrap();
        let decoded = ImageProcessor::decode("marked.png", &png).unwrap();
        assert_eq!(decoded.as_dynamic().to_rgba8(), marked_image().to_rgba8());
    }

    #[test]
    fn garbage_bytes_name_the_image() {
        let err = ImageProcessor::decode("broken.jpg", b"definitely not an image")
            .err()
            .unwrap();
        match err {
            FolioError::ImageDecode { name, .. } => assert_eq!(name, "broken.jpg"),
            other => panic!("unexpected error variant: {other}"),
        }
    }
}
