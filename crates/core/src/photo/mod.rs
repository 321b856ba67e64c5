//! Photo ingestion engine.
//!
//! Turns an arbitrary uploaded image into a bounded JPEG:
//!
//! 1. Reject inputs above `max_input_bytes` before touching the decoder.
//! 2. Decode (PNG, JPEG or WebP, sniffed from magic bytes; the client's
//!    declared content type is never consulted).
//! 3. Downsample to `max_width` with nearest-neighbour sampling when wider.
//! 4. Re-encode, walking the quality ladder downwards until the output fits
//!    `max_output_bytes`.
//!
//! The engine is a pure function of its input and [`IngestConfig`]; it holds
//! no state between calls and is safe to run on any number of threads.

pub mod encode;
pub mod resize;

use std::io::Cursor;

use image::{ImageError, ImageReader, Limits};

pub use encode::{encode_jpeg, QualityLadder};
pub use resize::{resize_nearest, target_dimensions};

/// Content type of every photo produced by the engine.
pub const PHOTO_CONTENT_TYPE: &str = "image/jpeg";

/// Default upload ceiling: 1 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;

/// Default stored photo ceiling: 500 KiB.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 500 * 1024;

/// Default maximum output width in pixels.
pub const DEFAULT_MAX_WIDTH: u32 = 1024;

/// Default decoder dimension limit (either axis).
pub const DEFAULT_MAX_INPUT_DIMENSION: u32 = 12_000;

/// Default decoded pixel budget: 24 megapixels.
pub const DEFAULT_MAX_INPUT_PIXELS: u64 = 24_000_000;

/// Decoder allocation allowance per pixel of budget (8-bit RGBA).
const DECODE_BYTES_PER_PIXEL: u64 = 4;

/// Bounds for a single ingestion.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Uploads larger than this are rejected without decoding.
    pub max_input_bytes: usize,
    /// Output width ceiling; narrower images are left untouched.
    pub max_width: u32,
    /// Encoded output must be at most this many bytes.
    pub max_output_bytes: usize,
    /// Decoder refuses images whose width or height exceeds this.
    pub max_input_dimension: u32,
    /// Caps decoder allocations at this many pixels of 8-bit RGBA, so a
    /// small, highly compressed upload cannot expand without bound.
    pub max_input_pixels: u64,
    /// Quality search parameters.
    pub quality: QualityLadder,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_width: DEFAULT_MAX_WIDTH,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            max_input_dimension: DEFAULT_MAX_INPUT_DIMENSION,
            max_input_pixels: DEFAULT_MAX_INPUT_PIXELS,
            quality: QualityLadder::default(),
        }
    }
}

/// Why an upload could not be turned into a stored photo.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("upload is {actual} bytes, limit is {limit}")]
    InputTooLarge { actual: usize, limit: usize },

    #[error("not a decodable image: {0}")]
    Decode(#[source] ImageError),

    #[error("image cannot be compressed under {limit} bytes (smallest attempt was {smallest} bytes)")]
    CannotFit { limit: usize, smallest: usize },

    #[error("encoder failure: {0}")]
    Encode(#[source] ImageError),
}

impl IngestError {
    /// Whether the client can fix this by submitting a different file.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, IngestError::Encode(_))
    }
}

/// A photo ready to be stored.
#[derive(Debug, Clone)]
pub struct IngestedPhoto {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
    /// JPEG quality the bytes were encoded at.
    pub quality: u8,
}

/// Runs uploads through decode, resize and budget-fit encode.
#[derive(Debug, Clone, Default)]
pub struct PhotoIngestor {
    config: IngestConfig,
}

impl PhotoIngestor {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    /// Ingest raw upload bytes.
    pub fn ingest(&self, raw: &[u8]) -> Result<IngestedPhoto, IngestError> {
        let cfg = &self.config;
        if raw.len() > cfg.max_input_bytes {
            return Err(IngestError::InputTooLarge {
                actual: raw.len(),
                limit: cfg.max_input_bytes,
            });
        }

        let decoded = self.decode(raw)?.into_rgb8();

        let (width, height) =
            target_dimensions(decoded.width(), decoded.height(), cfg.max_width);
        let image = if (width, height) == decoded.dimensions() {
            decoded
        } else {
            resize_nearest(&decoded, width, height)
        };

        let (bytes, quality) =
            encode::fit_to_budget(&image, &cfg.quality, cfg.max_output_bytes)?;

        Ok(IngestedPhoto {
            bytes,
            content_type: PHOTO_CONTENT_TYPE,
            width,
            height,
            quality,
        })
    }

    fn decode(&self, raw: &[u8]) -> Result<image::DynamicImage, IngestError> {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.config.max_input_dimension);
        limits.max_image_height = Some(self.config.max_input_dimension);
        limits.max_alloc = Some(
            self.config
                .max_input_pixels
                .saturating_mul(DECODE_BYTES_PER_PIXEL),
        );

        let mut reader = ImageReader::new(Cursor::new(raw))
            .with_guessed_format()
            .map_err(|e| IngestError::Decode(ImageError::IoError(e)))?;
        reader.limits(limits);
        reader.decode().map_err(IngestError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};

    fn png_bytes(img: &RgbImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img.clone())
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        })
    }

    /// Deterministic high-entropy image; compresses poorly at every quality.
    fn noise(width: u32, height: u32) -> RgbImage {
        let mut state: u32 = 0x9E37_79B9;
        ImageBuffer::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let b = state.to_le_bytes();
            Rgb([b[0], b[1], b[2]])
        })
    }

    fn ingestor(max_width: u32, max_output_bytes: usize) -> PhotoIngestor {
        PhotoIngestor::new(IngestConfig {
            max_width,
            max_output_bytes,
            ..IngestConfig::default()
        })
    }

    // -- resize behaviour ------------------------------------------------------

    #[test]
    fn wide_image_is_scaled_to_max_width() {
        let raw = png_bytes(&gradient(2000, 1000));
        let photo = ingestor(1024, DEFAULT_MAX_OUTPUT_BYTES).ingest(&raw).unwrap();

        assert_eq!((photo.width, photo.height), (1024, 512));
        let decoded = image::load_from_memory(&photo.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1024, 512));
    }

    #[test]
    fn scaled_height_is_rounded() {
        // 1001 * 1000 / 1500 = 667.33
        let raw = png_bytes(&gradient(1500, 1001));
        let photo = ingestor(1000, DEFAULT_MAX_OUTPUT_BYTES).ingest(&raw).unwrap();
        assert_eq!((photo.width, photo.height), (1000, 667));
    }

    #[test]
    fn narrow_image_keeps_its_dimensions() {
        let raw = png_bytes(&gradient(300, 200));
        let photo = ingestor(1024, DEFAULT_MAX_OUTPUT_BYTES).ingest(&raw).unwrap();

        let decoded = image::load_from_memory(&photo.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (300, 200));
    }

    #[test]
    fn image_exactly_max_width_is_not_resized() {
        let raw = png_bytes(&gradient(640, 480));
        let photo = ingestor(640, DEFAULT_MAX_OUTPUT_BYTES).ingest(&raw).unwrap();
        assert_eq!((photo.width, photo.height), (640, 480));
    }

    // -- encoding --------------------------------------------------------------

    #[test]
    fn output_is_jpeg_regardless_of_input_format() {
        let raw = png_bytes(&gradient(64, 64));
        let photo = PhotoIngestor::default().ingest(&raw).unwrap();

        assert_eq!(photo.content_type, "image/jpeg");
        assert_eq!(&photo.bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(
            image::guess_format(&photo.bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn jpeg_input_is_accepted() {
        let raw = encode_jpeg(&gradient(120, 90), 90).unwrap();
        let photo = PhotoIngestor::default().ingest(&raw).unwrap();
        assert_eq!((photo.width, photo.height), (120, 90));
    }

    #[test]
    fn small_image_fits_at_starting_quality() {
        let raw = png_bytes(&gradient(200, 100));
        let photo = PhotoIngestor::default().ingest(&raw).unwrap();

        assert_eq!(photo.quality, QualityLadder::default().start);
        assert!(photo.bytes.len() <= DEFAULT_MAX_OUTPUT_BYTES);
    }

    #[test]
    fn quality_steps_down_until_output_fits() {
        let img = noise(128, 128);
        let budget = encode_jpeg(&img, 60).unwrap().len();

        let photo = ingestor(1024, budget).ingest(&png_bytes(&img)).unwrap();

        assert!(photo.bytes.len() <= budget);
        assert!(photo.quality >= 60, "chose q{} below the fitting q60", photo.quality);
        assert!(photo.quality < 80);
    }

    #[test]
    fn last_resort_quality_is_tried_after_ladder() {
        let img = noise(128, 128);
        let at_floor = encode_jpeg(&img, 40).unwrap().len();
        let at_last_resort = encode_jpeg(&img, 35).unwrap().len();
        assert!(at_last_resort < at_floor, "noise should shrink at lower quality");

        let photo = ingestor(1024, at_last_resort)
            .ingest(&png_bytes(&img))
            .unwrap();

        assert_eq!(photo.quality, 35);
        assert!(photo.bytes.len() <= at_last_resort);
    }

    #[test]
    fn image_that_cannot_fit_is_rejected() {
        let raw = png_bytes(&noise(64, 64));
        let err = ingestor(1024, 100).ingest(&raw).unwrap_err();

        assert_matches!(err, IngestError::CannotFit { limit: 100, smallest } if smallest > 100);
        assert!(err.is_client_error());
    }

    // -- rejection -------------------------------------------------------------

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = PhotoIngestor::default()
            .ingest(b"definitely not an image")
            .unwrap_err();
        assert_matches!(err, IngestError::Decode(_));
    }

    #[test]
    fn truncated_png_fails_to_decode() {
        let raw = png_bytes(&gradient(64, 64));
        let err = PhotoIngestor::default().ingest(&raw[..raw.len() / 2]).unwrap_err();
        assert_matches!(err, IngestError::Decode(_));
    }

    #[test]
    fn oversized_upload_is_rejected_before_decoding() {
        let ingestor = PhotoIngestor::new(IngestConfig {
            max_input_bytes: 16,
            ..IngestConfig::default()
        });
        let err = ingestor.ingest(&[0u8; 17]).unwrap_err();
        assert_matches!(err, IngestError::InputTooLarge { actual: 17, limit: 16 });
    }

    #[test]
    fn decoder_dimension_limit_is_enforced() {
        let ingestor = PhotoIngestor::new(IngestConfig {
            max_input_dimension: 50,
            ..IngestConfig::default()
        });
        let err = ingestor.ingest(&png_bytes(&gradient(100, 10))).unwrap_err();
        assert_matches!(err, IngestError::Decode(_));
    }

    #[test]
    fn pixel_budget_rejects_large_canvas() {
        let ingestor = PhotoIngestor::new(IngestConfig {
            max_input_pixels: 10_000,
            ..IngestConfig::default()
        });
        let black = RgbImage::new(200, 200);
        let err = ingestor.ingest(&png_bytes(&black)).unwrap_err();
        assert_matches!(err, IngestError::Decode(_));
    }

    #[test]
    fn tiny_png_declaring_huge_canvas_is_refused() {
        let bomb = with_png_dimensions(png_bytes(&RgbImage::new(8, 8)), 11_000, 11_000);
        assert!(bomb.len() < 1024);

        let err = PhotoIngestor::default().ingest(&bomb).unwrap_err();
        assert_matches!(err, IngestError::Decode(_));
    }

    /// Rewrite the IHDR width and height of a PNG, fixing up the chunk CRC.
    fn with_png_dimensions(mut png: Vec<u8>, width: u32, height: u32) -> Vec<u8> {
        assert_eq!(&png[12..16], b"IHDR");
        png[16..20].copy_from_slice(&width.to_be_bytes());
        png[20..24].copy_from_slice(&height.to_be_bytes());
        let crc = crc32(&png[12..29]);
        png[29..33].copy_from_slice(&crc.to_be_bytes());
        png
    }

    fn crc32(bytes: &[u8]) -> u32 {
        let mut crc = 0xFFFF_FFFFu32;
        for &b in bytes {
            crc ^= u32::from(b);
            for _ in 0..8 {
                let mask = (crc & 1).wrapping_neg();
                crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
            }
        }
        !crc
    }
}
