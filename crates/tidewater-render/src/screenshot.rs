//! Saving captured frames.

use image::{ImageBuffer, Rgba};
use std::path::Path;

use crate::error::{RenderError, RenderResult};

/// Image container chosen from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFileFormat {
    Png,
    Jpeg,
}

impl ImageFileFormat {
    /// Picks the format from the path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> RenderResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            _ => Err(RenderError::UnsupportedImageFormat(extension)),
        }
    }
}

fn to_image(data: &[u8], width: u32, height: u32) -> RenderResult<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    // wgpu uses a top-left origin, so rows are already in image order
    ImageBuffer::from_raw(width, height, data.to_vec()).ok_or_else(|| {
        RenderError::CaptureFailed(format!(
            "{} bytes do not form a {width}x{height} RGBA image",
            data.len()
        ))
    })
}

/// Saves tightly packed RGBA8 pixels to a PNG or JPEG file.
pub fn save_image(path: impl AsRef<Path>, data: &[u8], width: u32, height: u32) -> RenderResult<()> {
    let path = path.as_ref();
    let format = ImageFileFormat::from_path(path)?;
    let img = to_image(data, width, height)?;

    match format {
        ImageFileFormat::Png => img.save_with_format(path, image::ImageFormat::Png)?,
        ImageFileFormat::Jpeg => {
            // JPEG has no alpha
            let rgb = image::DynamicImage::ImageRgba8(img).to_rgb8();
            rgb.save_with_format(path, image::ImageFormat::Jpeg)?;
        }
    }
    log::info!("saved {width}x{height} frame to {}", path.display());
    Ok(())
}

/// Encodes tightly packed RGBA8 pixels as PNG in memory.
pub fn encode_png(data: &[u8], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let img = to_image(data, width, height)?;
    let mut buffer = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ImageFileFormat::from_path(Path::new("out.PNG")).unwrap(),
            ImageFileFormat::Png
        );
        assert_eq!(
            ImageFileFormat::from_path(Path::new("shot.jpeg")).unwrap(),
            ImageFileFormat::Jpeg
        );
        assert!(matches!(
            ImageFileFormat::from_path(Path::new("frame.bmp")),
            Err(RenderError::UnsupportedImageFormat(ext)) if ext == "bmp"
        ));
    }

    #[test]
    fn test_encode_png_signature() {
        let pixels = vec![255u8; 2 * 2 * 4];
        let png = encode_png(&pixels, 2, 2).unwrap();
        assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_wrong_buffer_size_rejected() {
        let pixels = vec![0u8; 3];
        assert!(matches!(
            encode_png(&pixels, 2, 2),
            Err(RenderError::CaptureFailed(_))
        ));
    }
}
