//! # Transport Module
//!
//! Client HTTP intercambiabili per dialogare con reSmush.it.
//!
//! ## Protocollo:
//! 1. `POST {endpoint}?qlty={quality}` con body multipart, un solo campo `files`
//!    (byte del file, nome originale, mime type rilevato)
//! 2. Risposta JSON `{ "dest": "<url>", ... }` (gli altri campi sono ignorati)
//! 3. `GET {dest}` scritto su file di staging e poi spostato sulla destinazione
//!
//! ## Implementazioni:
//! - `ReqwestTransport`: client primario (async, multipart nativo)
//! - `UreqTransport`: client secondario (bloccante, eseguito con `spawn_blocking`)
//!
//! Un transport che non può essere usato nell'ambiente risponde con
//! `TransportError::Unavailable` e l'ottimizzatore passa al successivo.

pub mod reqwest_transport;
pub mod ureq_transport;

pub use reqwest_transport::ReqwestTransport;
pub use ureq_transport::UreqTransport;

use crate::error::TransportError;
use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Multipart field carrying the image
pub const UPLOAD_FIELD: &str = "files";

/// Query parameter carrying the requested quality
pub const QUALITY_PARAM: &str = "qlty";

/// An HTTP client able to upload an image and fetch the optimized result
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Short name used in logs and outcomes
    fn name(&self) -> &'static str;

    /// Upload the image and return the raw response body
    async fn post(
        &self,
        endpoint: &str,
        quality: u8,
        upload: &UploadRequest,
    ) -> Result<String, TransportError>;

    /// Fetch `url` into `destination`, returning the number of bytes written
    async fn download(&self, url: &str, destination: &Path) -> Result<u64, TransportError>;
}

/// Payload of the single-field multipart upload
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadRequest {
    /// Read the source file into an upload payload
    pub async fn from_file(path: &Path, mime_type: &str) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Ok(Self {
            file_name,
            mime_type: mime_type.to_string(),
            bytes,
        })
    }

    /// Boundary that cannot collide with the content it delimits
    pub fn boundary(&self) -> String {
        let digest = hex::encode(Sha256::digest(&self.bytes));
        format!("------------------------{}", &digest[..24])
    }

    /// Serialize as a `multipart/form-data` body
    pub fn to_multipart(&self, boundary: &str) -> Vec<u8> {
        let mut body = Vec::with_capacity(self.bytes.len() + 256);
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                UPLOAD_FIELD,
                self.file_name.replace('"', "%22")
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", self.mime_type).as_bytes());
        body.extend_from_slice(&self.bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
        body
    }
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    dest: Option<String>,
    error: Option<serde_json::Value>,
    error_long: Option<String>,
}

/// Extract the URL of the compressed artifact from a service response
pub fn parse_response(body: &str) -> Result<String, TransportError> {
    if body.trim().is_empty() {
        return Err(TransportError::Body("empty response".to_string()));
    }

    let response: ServiceResponse = serde_json::from_str(body)
        .map_err(|e| TransportError::Body(format!("not a JSON object: {}", e)))?;

    match response.dest {
        Some(dest) if !dest.trim().is_empty() => Ok(dest),
        _ => {
            let reason = match (response.error, response.error_long) {
                (_, Some(long)) => format!(": {}", long),
                (Some(code), None) => format!(": error {}", code),
                (None, None) => String::new(),
            };
            Err(TransportError::Body(format!(
                "response does not contain compressed file URL{}",
                reason
            )))
        }
    }
}

/// Full URL of the upload request
pub(crate) fn upload_url(endpoint: &str, quality: u8) -> Result<reqwest::Url, TransportError> {
    let mut url = reqwest::Url::parse(endpoint)
        .map_err(|e| TransportError::Request(format!("invalid endpoint {}: {}", endpoint, e)))?;
    url.query_pairs_mut()
        .append_pair(QUALITY_PARAM, &quality.to_string());
    Ok(url)
}
