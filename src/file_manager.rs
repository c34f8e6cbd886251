//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file necessarie all'ottimizzatore.
//!
//! ## Responsabilità:
//! - Controlli di esistenza e dimensione del file sorgente
//! - Validazione estensione della destinazione (jpg, jpeg, png, gif)
//! - Rilevamento mime type dal contenuto del file (magic bytes), non dal nome
//! - Scrittura sicura: file di staging nella stessa directory, poi rename atomico
//! - Utilità per calcoli dimensioni e percentuali
//!
//! ## Sicurezza operazioni:
//! - La destinazione viene sostituita solo a scrittura completata
//! - Un errore a metà scrittura lascia intatto il file esistente (anche se coincide col sorgente)
//!
//! ## Esempio:
//! ```rust,ignore
//! let mime = FileManager::detect_mime_type(&source).await?;
//! if !FileManager::is_allowed_mime_type(mime) {
//!     return Err(OptimizeError::UnsupportedMimeType { path: source, mime: mime.to_string() });
//! }
//! ```

use image::ImageFormat;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::io::AsyncReadExt;

/// Destination extensions accepted (case-insensitive)
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Source mime types accepted
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpg", "image/jpeg", "image/png", "image/gif"];

/// Reported when the content matches no known image signature
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

const SNIFF_LEN: u64 = 64;

/// Manages file operations for the optimizer
pub struct FileManager;

impl FileManager {
    /// Check whether a path exists on disk
    pub async fn exists(path: &Path) -> bool {
        fs::metadata(path).await.is_ok()
    }

    /// Size of a file in bytes
    pub async fn file_size(path: &Path) -> std::io::Result<u64> {
        Ok(fs::metadata(path).await?.len())
    }

    /// Check if a path carries one of the accepted image extensions
    pub fn has_allowed_extension(path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext_lower.as_str())
        } else {
            false
        }
    }

    /// Detect the mime type from the leading bytes of the file
    pub async fn detect_mime_type(path: &Path) -> std::io::Result<&'static str> {
        let file = fs::File::open(path).await?;
        let mut header = Vec::with_capacity(SNIFF_LEN as usize);
        file.take(SNIFF_LEN).read_to_end(&mut header).await?;
        Ok(Self::mime_from_bytes(&header))
    }

    /// Map magic bytes to a mime type
    pub fn mime_from_bytes(bytes: &[u8]) -> &'static str {
        match image::guess_format(bytes) {
            Ok(ImageFormat::Jpeg) => "image/jpeg",
            Ok(ImageFormat::Png) => "image/png",
            Ok(ImageFormat::Gif) => "image/gif",
            Ok(ImageFormat::WebP) => "image/webp",
            Ok(ImageFormat::Bmp) => "image/bmp",
            Ok(ImageFormat::Tiff) => "image/tiff",
            Ok(ImageFormat::Ico) => "image/x-icon",
            Ok(ImageFormat::Avif) => "image/avif",
            _ => UNKNOWN_MIME_TYPE,
        }
    }

    pub fn is_allowed_mime_type(mime: &str) -> bool {
        ALLOWED_MIME_TYPES.contains(&mime)
    }

    /// Path actually written for `destination`: a symlink is followed so the
    /// link itself survives the replace
    pub fn write_target(destination: &Path) -> PathBuf {
        match std::fs::symlink_metadata(destination) {
            Ok(meta) if meta.file_type().is_symlink() => {
                std::fs::canonicalize(destination).unwrap_or_else(|_| destination.to_path_buf())
            }
            _ => destination.to_path_buf(),
        }
    }

    /// Staging file next to `destination`, so the final rename stays on one filesystem.
    ///
    /// Created with the umask default mode of a new file, not the owner-only
    /// mode of a regular temp file.
    pub fn staging_file(destination: &Path) -> std::io::Result<NamedTempFile> {
        let target = Self::write_target(destination);
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix(".optimizing-");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        builder.tempfile_in(dir)
    }

    /// Move a fully written staging file over `destination`.
    ///
    /// An existing destination keeps its permissions.
    pub fn persist(staged: NamedTempFile, destination: &Path) -> std::io::Result<()> {
        let target = Self::write_target(destination);
        if let Ok(meta) = std::fs::metadata(&target) {
            staged.as_file().set_permissions(meta.permissions())?;
        }
        staged.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
