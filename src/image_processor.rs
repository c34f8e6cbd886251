//! # Image Processing Module
//!
//! Re-encode locale usato quando il servizio remoto non è disponibile o
//! risponde in modo non valido.
//!
//! ## Pipeline:
//! 1. **Scelta decoder**: dal mime type rilevato (JPEG, PNG, GIF; default JPEG)
//! 2. **Decodifica**: con il crate `image`, su `spawn_blocking`
//! 3. **Conversione**: RGB8 (il canale alpha viene scartato)
//! 4. **Codifica**: sempre JPEG, alla qualità di fallback
//! 5. **Scrittura**: file di staging + rename sulla destinazione
//!
//! ## Nota sul formato
//!
//! L'output è sempre JPEG anche per sorgenti PNG/GIF, qualunque sia
//! l'estensione della destinazione.

use crate::error::OptimizeError;
use crate::file_manager::FileManager;
use image::codecs::jpeg::JpegEncoder;
use image::io::Reader as ImageReader;
use image::{ColorType, ImageFormat};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Local JPEG re-encoder
pub struct ImageProcessor;

impl ImageProcessor {
    /// Decoder selected for a detected mime type
    pub fn decoder_format(mime: &str) -> ImageFormat {
        match mime {
            "image/jpeg" | "image/jpg" => ImageFormat::Jpeg,
            "image/png" => ImageFormat::Png,
            "image/gif" => ImageFormat::Gif,
            _ => ImageFormat::Jpeg,
        }
    }

    /// Decode `source` and write it to `destination` as a JPEG.
    ///
    /// Returns the number of bytes written.
    pub async fn reencode_as_jpeg(
        source: &Path,
        mime: &str,
        destination: &Path,
        quality: u8,
    ) -> Result<u64, OptimizeError> {
        let source = source.to_path_buf();
        let destination = destination.to_path_buf();
        let format = Self::decoder_format(mime);

        tokio::task::spawn_blocking(move || {
            Self::reencode_blocking(&source, format, &destination, quality)
        })
        .await
        .map_err(|e| OptimizeError::LocalEncode(format!("re-encode task aborted: {}", e)))?
    }

    fn reencode_blocking(
        source: &Path,
        format: ImageFormat,
        destination: &Path,
        quality: u8,
    ) -> Result<u64, OptimizeError> {
        let start_time = std::time::Instant::now();

        let file = std::fs::File::open(source)?;
        let image = ImageReader::with_format(BufReader::new(file), format).decode()?;
        let rgb = image.to_rgb8();

        let mut staged = FileManager::staging_file(destination)?;
        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)?;
            writer.flush()?;
        }
        let written = staged.as_file().metadata()?.len();
        FileManager::persist(staged, destination)?;

        debug!(
            "Re-encoded {} ({:?}) as JPEG q{} in {:?}: {}",
            source.display(),
            format,
            quality,
            start_time.elapsed(),
            FileManager::format_size(written)
        );

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 128]))
    }

    #[test]
    fn test_decoder_format() {
        assert_eq!(ImageProcessor::decoder_format("image/jpeg"), ImageFormat::Jpeg);
        assert_eq!(ImageProcessor::decoder_format("image/jpg"), ImageFormat::Jpeg);
        assert_eq!(ImageProcessor::decoder_format("image/png"), ImageFormat::Png);
        assert_eq!(ImageProcessor::decoder_format("image/gif"), ImageFormat::Gif);
        assert_eq!(ImageProcessor::decoder_format("image/webp"), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_png_is_coerced_to_jpeg() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("logo.png");
        let destination = temp_dir.path().join("logo-small.png");
        RgbaImage::from_pixel(16, 16, Rgba([10, 200, 30, 120]))
            .save_with_format(&source, ImageFormat::Png)
            .unwrap();

        let written = ImageProcessor::reencode_as_jpeg(&source, "image/png", &destination, 85)
            .await
            .unwrap();

        let bytes = std::fs::read(&destination).unwrap();
        assert_eq!(bytes.len() as u64, written);
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_gif_and_jpeg_sources() {
        let temp_dir = TempDir::new().unwrap();

        let gif = temp_dir.path().join("anim.gif");
        gradient(8, 8).save_with_format(&gif, ImageFormat::Gif).unwrap();
        let out = temp_dir.path().join("anim-out.jpg");
        ImageProcessor::reencode_as_jpeg(&gif, "image/gif", &out, 85).await.unwrap();
        let decoded = image::open(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));

        let jpeg = temp_dir.path().join("photo.jpg");
        gradient(20, 10).save_with_format(&jpeg, ImageFormat::Jpeg).unwrap();
        let out = temp_dir.path().join("photo-out.jpg");
        ImageProcessor::reencode_as_jpeg(&jpeg, "image/jpeg", &out, 85).await.unwrap();
        let decoded = image::open(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }

    #[tokio::test]
    async fn test_lower_quality_is_smaller() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("photo.jpg");
        gradient(64, 64).save_with_format(&source, ImageFormat::Jpeg).unwrap();

        let high = temp_dir.path().join("high.jpg");
        let low = temp_dir.path().join("low.jpg");
        let high_size = ImageProcessor::reencode_as_jpeg(&source, "image/jpeg", &high, 100)
            .await
            .unwrap();
        let low_size = ImageProcessor::reencode_as_jpeg(&source, "image/jpeg", &low, 10)
            .await
            .unwrap();
        assert!(low_size < high_size);
    }

    #[tokio::test]
    async fn test_corrupt_source_leaves_destination_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("broken.jpg");
        std::fs::write(&source, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J']).unwrap();
        let destination = temp_dir.path().join("existing.jpg");
        std::fs::write(&destination, b"previous").unwrap();

        let result =
            ImageProcessor::reencode_as_jpeg(&source, "image/jpeg", &destination, 85).await;
        assert!(matches!(result, Err(OptimizeError::Image(_))));
        assert_eq!(std::fs::read(&destination).unwrap(), b"previous");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_in_place_reencode_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("public.png");
        gradient(8, 8).save_with_format(&source, ImageFormat::Png).unwrap();
        std::fs::set_permissions(&source, std::fs::Permissions::from_mode(0o644)).unwrap();

        ImageProcessor::reencode_as_jpeg(&source, "image/png", &source, 85)
            .await
            .unwrap();

        let mode = std::fs::metadata(&source).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
        let bytes = std::fs::read(&source).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }
}
