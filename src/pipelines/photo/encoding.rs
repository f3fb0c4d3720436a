// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding of captured frames
//!
//! Encoding is CPU-bound and runs on the blocking pool so the caller's
//! event loop keeps turning.

use crate::backends::camera::types::CameraFrame;
use crate::constants::JPEG_QUALITY;
use crate::errors::PhotoError;
use image::{DynamicImage, RgbImage, RgbaImage};
use tracing::{debug, info};

/// Encoded image data
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Photo encoder with a fixed JPEG quality
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    quality: u8,
}

impl PhotoEncoder {
    pub fn new() -> Self {
        Self {
            quality: JPEG_QUALITY,
        }
    }

    /// Encoder with a custom quality (clamped to 1-100)
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode an RGBA frame as JPEG asynchronously
    pub async fn encode(&self, frame: CameraFrame) -> Result<EncodedImage, PhotoError> {
        info!(
            width = frame.width,
            height = frame.height,
            quality = self.quality,
            "Starting JPEG encoding"
        );

        let quality = self.quality;

        tokio::task::spawn_blocking(move || {
            let rgb = Self::to_rgb(&frame)?;
            let data = Self::encode_jpeg(&rgb, quality)?;

            debug!(size = data.len(), "Encoding complete");

            Ok(EncodedImage {
                data,
                width: frame.width,
                height: frame.height,
            })
        })
        .await
        .map_err(|e| PhotoError::EncodingFailed(format!("Encoding task error: {}", e)))?
    }

    /// Drop the alpha channel; JPEG has none
    fn to_rgb(frame: &CameraFrame) -> Result<RgbImage, PhotoError> {
        let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.data.to_vec())
            .ok_or_else(|| {
                PhotoError::EncodingFailed(format!(
                    "Frame buffer of {} bytes does not match {}x{}",
                    frame.data.len(),
                    frame.width,
                    frame.height
                ))
            })?;

        Ok(DynamicImage::ImageRgba8(rgba).to_rgb8())
    }

    fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, PhotoError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);

        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);

        encoder
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PhotoError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

        Ok(buffer)
    }
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new()
    }
}
