//! Resize + watermark transform
//!
//! Loads an image, converts it to RGB, resizes it to the target size with a
//! Lanczos3 filter, stamps the watermark text and saves it in the format
//! implied by the output extension (JPEG with the configured quality).
//!
//! The watermark is white at alpha 80/255, centred, and rotated 30 degrees
//! counter-clockwise around the image centre. Text that rotates past the
//! image edges is clipped.

use super::font::{self, TextMask};
use super::ImageTransform;
use crate::config::{Mode, TransformConfig};
use crate::error::{ItemError, ItemStage};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Default watermark opacity (0-255)
pub const DEFAULT_OPACITY: u8 = 80;
/// Default watermark rotation in degrees, counter-clockwise
pub const DEFAULT_ANGLE_DEGREES: f32 = 30.0;
/// Fraction of the image width the text spans before rotation
const TEXT_WIDTH_FRACTION: f32 = 0.75;

/// Resize + watermark transform
#[derive(Debug, Clone)]
pub struct WatermarkTransform {
    width: u32,
    height: u32,
    text: String,
    quality: u8,
    opacity: u8,
    angle_degrees: f32,
}

impl WatermarkTransform {
    pub fn new(width: u32, height: u32, text: impl Into<String>) -> Self {
        Self {
            width,
            height,
            text: text.into(),
            quality: 95,
            opacity: DEFAULT_OPACITY,
            angle_degrees: DEFAULT_ANGLE_DEGREES,
        }
    }

    /// Build from configuration, using the mode's default watermark if none is set
    pub fn from_config(config: &TransformConfig, mode: Mode) -> Self {
        Self::new(config.width, config.height, config.watermark_for(mode))
            .with_quality(config.quality)
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn target_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Resize and stamp an already decoded image
    pub fn render(&self, image: &image::DynamicImage) -> RgbImage {
        let rgb = image.to_rgb8();
        let mut resized = imageops::resize(&rgb, self.width, self.height, FilterType::Lanczos3);
        stamp_text(&mut resized, &self.text, self.opacity, self.angle_degrees);
        resized
    }

    fn save(&self, image: &RgbImage, output: &Path) -> Result<(), ItemError> {
        let format = ImageFormat::from_path(output)
            .map_err(|e| ItemError::new(output, ItemStage::Write, e))?;

        let file = File::create(output)
            .map_err(|e| ItemError::new(output, ItemStage::Write, e))?;
        let mut writer = BufWriter::new(file);

        let encoded = match format {
            ImageFormat::Jpeg => {
                JpegEncoder::new_with_quality(&mut writer, self.quality).encode_image(image)
            }
            _ => image.write_to(&mut writer, format),
        };
        encoded.map_err(|e| ItemError::new(output, ItemStage::Write, e))?;

        writer.flush()
            .map_err(|e| ItemError::new(output, ItemStage::Write, e))
    }
}

impl ImageTransform for WatermarkTransform {
    fn transform(&self, input: &Path, output: &Path) -> Result<(), ItemError> {
        let source = image::open(input)
            .map_err(|e| ItemError::new(input, ItemStage::Load, e))?;

        if source.width() == 0 || source.height() == 0 {
            return Err(ItemError::new(input, ItemStage::Transform, "image has zero size"));
        }

        let rendered = self.render(&source);
        self.save(&rendered, output)
    }

    fn name(&self) -> &str {
        "resize+watermark"
    }
}

/// Scale at which `text` spans roughly `TEXT_WIDTH_FRACTION` of `image_width`
fn fit_scale(text: &str, image_width: u32) -> usize {
    let unscaled = font::text_width(text);
    if unscaled == 0 {
        return 1;
    }
    let target = (image_width as f32 * TEXT_WIDTH_FRACTION) as usize;
    (target / unscaled).max(1)
}

/// Alpha-blend white text onto `image`, rotated around the image centre
///
/// Each destination pixel is mapped back into the unrotated text mask, so
/// the rotated text has no holes.
pub fn stamp_text(image: &mut RgbImage, text: &str, opacity: u8, angle_degrees: f32) {
    let (width, height) = image.dimensions();
    let mask = TextMask::render(text, fit_scale(text, width));
    if mask.width() == 0 || opacity == 0 {
        return;
    }

    let offset_x = (width as i64 - mask.width() as i64) / 2;
    let offset_y = (height as i64 - mask.height() as i64) / 2;
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    let alpha = opacity as u32;

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        let sx = cx + dx * cos - dy * sin;
        let sy = cy + dx * sin + dy * cos;

        let mx = sx.floor() as i64 - offset_x;
        let my = sy.floor() as i64 - offset_y;
        if !mask.is_set(mx, my) {
            continue;
        }

        for channel in pixel.0.iter_mut() {
            let blended = (255 * alpha + *channel as u32 * (255 - alpha) + 127) / 255;
            *channel = blended as u8;
        }
    }
}
