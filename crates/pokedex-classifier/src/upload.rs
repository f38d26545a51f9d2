//! Upload validation
//!
//! Every upload passes through [`validate_upload`] before any decode or
//! inference is attempted. The result is typed: either a [`ValidatedUpload`]
//! whose magic bytes identify a readable raster format, or an
//! [`UploadRejection`] describing why it was refused.

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use pokedex_core::{Error, Result, UploadRejection};

/// Default upload cap (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Limits applied during validation
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// An upload that is known to carry a decodable image format
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    bytes: Bytes,
    format: ImageFormat,
}

impl ValidatedUpload {
    /// Format identified from the magic bytes
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode into an in-memory image
    pub fn decode(&self) -> Result<DynamicImage> {
        image::load_from_memory_with_format(&self.bytes, self.format)
            .map_err(|e| Error::decode(format!("{:?} payload could not be decoded: {}", self.format, e)))
    }
}

/// Validate a raw upload against `limits` and its declared content type
pub fn validate_upload(
    bytes: Bytes,
    content_type: Option<&str>,
    limits: &UploadLimits,
) -> std::result::Result<ValidatedUpload, UploadRejection> {
    if bytes.is_empty() {
        return Err(UploadRejection::Empty);
    }

    if bytes.len() > limits.max_bytes {
        return Err(UploadRejection::TooLarge {
            size: bytes.len(),
            limit: limits.max_bytes,
        });
    }

    if let Some(content_type) = content_type {
        if !is_acceptable_content_type(content_type) {
            return Err(UploadRejection::UnsupportedContentType(content_type.to_string()));
        }
    }

    let format = image::guess_format(&bytes).map_err(|_| UploadRejection::UnrecognizedFormat)?;
    if !format.reading_enabled() {
        return Err(UploadRejection::UnrecognizedFormat);
    }

    Ok(ValidatedUpload { bytes, format })
}

/// Browsers send `image/*`; scripted clients often send octet-stream
fn is_acceptable_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("image/") || essence == "application/octet-stream"
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes() -> Bytes {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([10, 200, 30])));
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        Bytes::from(buf)
    }

    #[test]
    fn test_valid_png() {
        let upload = validate_upload(png_bytes(), Some("image/png"), &UploadLimits::default()).unwrap();
        assert_eq!(upload.format(), ImageFormat::Png);

        let image = upload.decode().unwrap();
        assert_eq!(image.width(), 4);
    }

    #[test]
    fn test_content_type_is_optional_and_parameters_ignored() {
        let limits = UploadLimits::default();
        assert!(validate_upload(png_bytes(), None, &limits).is_ok());
        assert!(validate_upload(png_bytes(), Some("application/octet-stream"), &limits).is_ok());
        assert!(validate_upload(png_bytes(), Some("IMAGE/PNG; charset=binary"), &limits).is_ok());
    }

    #[test]
    fn test_rejections() {
        let limits = UploadLimits { max_bytes: 16 };

        assert_eq!(
            validate_upload(Bytes::new(), None, &limits).unwrap_err(),
            UploadRejection::Empty
        );

        assert!(matches!(
            validate_upload(png_bytes(), None, &limits).unwrap_err(),
            UploadRejection::TooLarge { limit: 16, .. }
        ));

        assert_eq!(
            validate_upload(Bytes::from_static(b"hello"), Some("text/plain"), &limits).unwrap_err(),
            UploadRejection::UnsupportedContentType("text/plain".to_string())
        );

        assert_eq!(
            validate_upload(Bytes::from_static(b"not an image"), None, &limits).unwrap_err(),
            UploadRejection::UnrecognizedFormat
        );
    }

    #[test]
    fn test_truncated_image_fails_at_decode_not_validation() {
        let full = png_bytes();
        let truncated = full.slice(..full.len() / 2);

        let upload = validate_upload(truncated, Some("image/png"), &UploadLimits::default()).unwrap();
        assert!(matches!(upload.decode().unwrap_err(), Error::Decode(_)));
    }
}
