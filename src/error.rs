//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'ottimizzatore.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` enum per categorizzare tutti gli errori possibili
//! - Definisce `TransportError` per i fallimenti dei client HTTP
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - Validazione: estensione destinazione, sorgente mancante, mime non ammesso, file troppo grande
//! - `Transport`: nessun client HTTP utilizzabile
//! - `RemoteService`: risposta del servizio remoto non valida o errore di rete
//! - `Download`: errore nello scaricamento dell'immagine compressa
//! - `LocalEncode`: errore di decodifica/codifica nel fallback locale
//! - `Io` / `Image`: conversioni automatiche da errori standard
//!
//! ## Esempio:
//! ```rust,ignore
//! if !FileManager::exists(source).await {
//!     return Err(OptimizeError::SourceNotFound(source.to_path_buf()));
//! }
//! ```

use std::path::PathBuf;

/// Custom error types for image optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("Destination file ({}) does not have a valid extension", .0.display())]
    InvalidDestinationExtension(PathBuf),

    #[error("Source file ({}) does not exist", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Source file ({}) has unsupported mime type {}", .path.display(), .mime)]
    UnsupportedMimeType { path: PathBuf, mime: String },

    #[error(
        "Source file ({}) exceeded maximum allowed size of {} bytes ({} bytes)",
        .path.display(),
        .limit,
        .size
    )]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Remote optimization failed: {0}")]
    RemoteService(String),

    #[error("Download of optimized file failed: {0}")]
    Download(String),

    #[error("Local re-encode failed: {0}")]
    LocalEncode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

impl OptimizeError {
    /// Input validation failures: never retried, no network traffic
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDestinationExtension(_)
                | Self::SourceNotFound(_)
                | Self::UnsupportedMimeType { .. }
                | Self::FileTooLarge { .. }
        )
    }
}

/// Failures reported by an HTTP transport
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// The client cannot be used in this environment; the next transport is tried
    #[error("{0} transport is not available")]
    Unavailable(&'static str),

    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status code {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    Body(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Status(status.as_u16()),
            None => Self::Request(e.to_string()),
        }
    }
}

impl From<ureq::Error> for TransportError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(code, _) => Self::Status(code),
            ureq::Error::Transport(transport) => Self::Request(transport.to_string()),
        }
    }
}
