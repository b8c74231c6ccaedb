//! Photo intake pipeline: decode a user-selected image, downscale it so
//! the longer edge fits the size cap, and re-encode as JPEG. The output
//! is what gets embedded in a stop and persisted, so the cap here is
//! what keeps the storage blob manageable.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageReader, Limits};
use thiserror::Error;
use tracing::instrument;

use crate::{AppError, ErrorKind, Photo};

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to decode image: {source}")]
    Decode {
        #[from]
        source: image::ImageError,
    },

    #[error("failed to read image data: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("jpeg encoding failed: width={width}, height={height}, reason={reason}")]
    Encode {
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("input too large: {size} bytes, max {max}")]
    InputTooLarge { size: usize, max: usize },

    #[error("input bytes empty")]
    EmptyInput,
}

impl From<ImageError> for AppError {
    fn from(e: ImageError) -> Self {
        let kind = match &e {
            ImageError::InputTooLarge { .. } => ErrorKind::ImageTooLarge,
            ImageError::Decode { .. }
            | ImageError::Io { .. }
            | ImageError::Encode { .. }
            | ImageError::EmptyInput => ErrorKind::ImageProcessing,
        };
        AppError::new(kind, e.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct ProcessingConfig {
    pub max_input_bytes: usize,
    pub max_source_dimension: u32,
    pub max_alloc_bytes: u64,
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: crate::MAX_PHOTO_INPUT_BYTES,
            max_source_dimension: crate::MAX_SOURCE_DIMENSION,
            max_alloc_bytes: crate::MAX_DECODE_ALLOC_BYTES,
            max_dimension: crate::MAX_PHOTO_DIMENSION,
            jpeg_quality: crate::PHOTO_JPEG_QUALITY,
        }
    }
}

/// Fit `width`x`height` inside a `max`x`max` box, preserving aspect
/// ratio with truncating integer math. Images already inside the box
/// keep their dimensions; nothing is ever upscaled.
#[must_use]
pub const fn scaled_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }

    if width > height {
        let scaled = (height as u64 * max as u64 / width as u64) as u32;
        (max, if scaled == 0 { 1 } else { scaled })
    } else {
        let scaled = (width as u64 * max as u64 / height as u64) as u32;
        (if scaled == 0 { 1 } else { scaled }, max)
    }
}

#[instrument(skip(bytes, config), fields(input_size = bytes.len()))]
pub fn process_photo(bytes: &[u8], config: &ProcessingConfig) -> Result<Photo, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyInput);
    }
    if bytes.len() > config.max_input_bytes {
        return Err(ImageError::InputTooLarge {
            size: bytes.len(),
            max: config.max_input_bytes,
        });
    }

    let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let mut limits = Limits::default();
    limits.max_image_width = Some(config.max_source_dimension);
    limits.max_image_height = Some(config.max_source_dimension);
    limits.max_alloc = Some(config.max_alloc_bytes);
    reader.limits(limits);

    let decoded = reader.decode()?;
    let (width, height) = decoded.dimensions();
    let (target_width, target_height) = scaled_dimensions(width, height, config.max_dimension);

    let resized = if (target_width, target_height) == (width, height) {
        decoded
    } else {
        decoded.resize_exact(target_width, target_height, FilterType::Triangle)
    };

    // JPEG carries no alpha channel.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, config.jpeg_quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| ImageError::Encode {
            width: target_width,
            height: target_height,
            reason: e.to_string(),
        })?;

    Ok(Photo {
        mime_type: "image/jpeg".to_string(),
        data: buffer.into_inner(),
        width: target_width,
        height: target_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([40, 120, 200, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn landscape_scales_to_max_width() {
        assert_eq!(scaled_dimensions(1600, 1200, 800), (800, 600));
    }

    #[test]
    fn portrait_scales_to_max_height() {
        assert_eq!(scaled_dimensions(1200, 1600, 800), (600, 800));
    }

    #[test]
    fn small_images_are_not_upscaled() {
        assert_eq!(scaled_dimensions(400, 300, 800), (400, 300));
        assert_eq!(scaled_dimensions(800, 800, 800), (800, 800));
    }

    #[test]
    fn extreme_aspect_ratio_never_collapses_to_zero() {
        assert_eq!(scaled_dimensions(8000, 2, 800), (800, 1));
        assert_eq!(scaled_dimensions(2, 8000, 800), (1, 800));
    }

    #[test]
    fn oversized_photo_is_downscaled_and_re_encoded() {
        let photo = process_photo(&png_bytes(1600, 1200), &ProcessingConfig::default()).unwrap();
        assert_eq!((photo.width, photo.height), (800, 600));
        assert_eq!(photo.mime_type, "image/jpeg");

        let roundtrip = image::load_from_memory(&photo.data).unwrap();
        assert_eq!(roundtrip.dimensions(), (800, 600));
    }

    #[test]
    fn small_photo_keeps_dimensions_but_becomes_jpeg() {
        let photo = process_photo(&png_bytes(320, 240), &ProcessingConfig::default()).unwrap();
        assert_eq!((photo.width, photo.height), (320, 240));
        assert_eq!(photo.mime_type, "image/jpeg");
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = process_photo(&[], &ProcessingConfig::default()).unwrap_err();
        assert!(matches!(err, ImageError::EmptyInput));
    }

    #[test]
    fn oversized_input_is_rejected() {
        let config = ProcessingConfig {
            max_input_bytes: 16,
            ..ProcessingConfig::default()
        };
        let err = process_photo(&[0u8; 32], &config).unwrap_err();
        assert!(matches!(err, ImageError::InputTooLarge { .. }));
    }

    #[test]
    fn garbage_input_fails_to_decode() {
        let err = process_photo(&[1, 2, 3, 4, 5, 6, 7, 8], &ProcessingConfig::default());
        assert!(err.is_err());
    }
}
