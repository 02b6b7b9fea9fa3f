//! Image validation and re-encoding
//!
//! Validate-then-act: the extension check happens before any decode or
//! storage call, so unsupported uploads never produce partial writes.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;

use crate::errors::AppError;

const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Allowed extensions: jpg, jpeg, png (case-insensitive).
pub fn validate_extension(filename: &str) -> Result<ImageKind, AppError> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => Ok(ImageKind::Jpeg),
        "png" => Ok(ImageKind::Png),
        _ => Err(AppError::UnsupportedImageType(filename.to_string())),
    }
}

/// Decode and re-encode (JPEG quality 85, PNG default compression).
/// Strips whatever the client sent and guarantees the stored bytes really
/// are the claimed format.
pub fn reencode(bytes: &[u8], kind: ImageKind) -> Result<Vec<u8>, AppError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| AppError::InvalidFormat(format!("Not a decodable image: {}", e)))?;

    let mut out = Cursor::new(Vec::new());
    match kind {
        ImageKind::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
            // JPEG has no alpha channel
            img.to_rgb8()
                .write_with_encoder(encoder)
                .map_err(|e| AppError::InvalidFormat(format!("JPEG encode failed: {}", e)))?;
        }
        ImageKind::Png => {
            img.write_to(&mut out, ImageFormat::Png)
                .map_err(|e| AppError::InvalidFormat(format!("PNG encode failed: {}", e)))?;
        }
    }
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_fixture() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 30, 30]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn accepts_allowed_extensions() {
        assert_eq!(validate_extension("car.jpg").unwrap(), ImageKind::Jpeg);
        assert_eq!(validate_extension("car.JPEG").unwrap(), ImageKind::Jpeg);
        assert_eq!(validate_extension("car.png").unwrap(), ImageKind::Png);
    }

    #[test]
    fn rejects_other_extensions() {
        assert!(validate_extension("car.gif").is_err());
        assert!(validate_extension("car.png.exe").is_err());
        assert!(validate_extension("car").is_err());
    }

    #[test]
    fn reencodes_png_to_jpeg() {
        let bytes = reencode(&png_fixture(), ImageKind::Jpeg).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn reencodes_png_to_png() {
        let bytes = reencode(&png_fixture(), ImageKind::Png).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn rejects_non_image_bytes() {
        assert!(reencode(b"definitely not an image", ImageKind::Png).is_err());
    }
}
