use idscan_core::{Enhancement, RectRatio, RegionSpec};
use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};
use std::io::Cursor;
use thiserror::Error;

/// Upper bound on either side of an enhanced region, in pixels.
const MAX_ENHANCED_DIMENSION: u32 = 5600;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
    #[error("Image has no pixels")]
    Empty,
}

/// Decode raw image bytes (JPEG / PNG / WEBP / …).
pub fn decode(data: &[u8]) -> Result<DynamicImage, PreprocessError> {
    let img = image::load_from_memory(data)?;
    if img.width() == 0 || img.height() == 0 {
        return Err(PreprocessError::Empty);
    }
    Ok(img)
}

/// Pixel rectangle `(x, y, w, h)` for a fractional one, clamped so it never
/// leaves the image and always covers at least one pixel.
pub fn pixel_rect(width: u32, height: u32, rect: &RectRatio) -> (u32, u32, u32, u32) {
    let (x, w) = span(width, rect.x, rect.w);
    let (y, h) = span(height, rect.y, rect.h);
    (x, y, w, h)
}

fn span(extent: u32, start: f64, len: f64) -> (u32, u32) {
    if extent == 0 {
        return (0, 0);
    }
    let max_start = extent.saturating_sub(1);
    let begin = ((start.clamp(0.0, 1.0) * extent as f64).floor() as u32).min(max_start);
    let size = (len.clamp(0.0, 1.0) * extent as f64).round() as u32;
    (begin, size.clamp(1, extent - begin))
}

pub fn crop(img: &DynamicImage, rect: &RectRatio) -> DynamicImage {
    if rect.is_full() {
        return img.clone();
    }
    let (x, y, w, h) = pixel_rect(img.width(), img.height(), rect);
    img.crop_imm(x, y, w, h)
}

/// Rescale and adjust contrast. Identity enhancements return the input untouched.
pub fn enhance(img: DynamicImage, enhancement: &Enhancement) -> DynamicImage {
    let img = if (enhancement.scale - 1.0).abs() > f32::EPSILON {
        let scale = enhancement
            .scale
            .min(MAX_ENHANCED_DIMENSION as f32 / img.width().max(img.height()) as f32);
        let w = ((img.width() as f32 * scale).round() as u32).max(1);
        let h = ((img.height() as f32 * scale).round() as u32).max(1);
        img.resize_exact(w, h, image::imageops::FilterType::Lanczos3)
    } else {
        img
    };

    if enhancement.contrast_percent == 100 {
        return img;
    }
    DynamicImage::ImageRgba8(scale_contrast(&img.to_rgba8(), enhancement.contrast_percent))
}

/// Linear contrast around mid-gray: `128 + (v - 128) * percent / 100`.
fn scale_contrast(img: &RgbaImage, percent: u32) -> RgbaImage {
    let factor = percent as f32 / 100.0;
    let adjust = |v: u8| (128.0 + (v as f32 - 128.0) * factor).round().clamp(0.0, 255.0) as u8;
    ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
        let p = img.get_pixel(x, y);
        Rgba([adjust(p[0]), adjust(p[1]), adjust(p[2]), p[3]])
    })
}

/// Crop and enhance one planned region, returning PNG bytes ready for OCR.
pub fn extract_region(img: &DynamicImage, region: &RegionSpec) -> Result<Vec<u8>, PreprocessError> {
    encode_as_png(&enhance(crop(img, &region.rect), &region.enhancement))
}

pub fn encode_as_png(img: &DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Image decode and region extraction as used by the pipeline.
pub trait ImagePrimitive: Send + Sync {
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, PreprocessError>;
    /// Crop and enhance `region`, returning encoded bytes for the OCR engine.
    fn extract_region(&self, img: &DynamicImage, region: &RegionSpec) -> Result<Vec<u8>, PreprocessError>;
}

/// [`ImagePrimitive`] over the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterOps;

impl ImagePrimitive for RasterOps {
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, PreprocessError> {
        decode(data)
    }

    fn extract_region(&self, img: &DynamicImage, region: &RegionSpec) -> Result<Vec<u8>, PreprocessError> {
        extract_region(img, region)
    }
}
