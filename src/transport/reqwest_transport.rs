//! # Reqwest Transport
//!
//! Client HTTP primario, basato su `reqwest` (async, multipart nativo).
//! Se il client non può essere costruito nell'ambiente corrente il transport
//! viene considerato non disponibile.

use super::{upload_url, HttpTransport, UploadRequest, UPLOAD_FIELD};
use crate::error::TransportError;
use crate::file_manager::FileManager;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub const NAME: &'static str = "reqwest";

    /// Build the client; failure means this transport is unavailable
    pub fn new(connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| {
                debug!("Failed to build reqwest client: {}", e);
                TransportError::Unavailable(Self::NAME)
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn post(
        &self,
        endpoint: &str,
        quality: u8,
        upload: &UploadRequest,
    ) -> Result<String, TransportError> {
        let url = upload_url(endpoint, quality)?;

        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        debug!("POST {} ({} bytes) via reqwest", url, upload.bytes.len());
        let response = self.client.post(url).multipart(form).send().await?;

        if response.status() != StatusCode::OK {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<u64, TransportError> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;

        let staged = FileManager::staging_file(destination)?;
        let mut file = tokio::fs::File::from_std(staged.reopen()?);
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        let destination = destination.to_path_buf();
        tokio::task::spawn_blocking(move || FileManager::persist(staged, &destination))
            .await
            .map_err(|e| TransportError::Request(format!("persist task aborted: {}", e)))??;

        debug!("Downloaded {} bytes from {} via reqwest", written, url);
        Ok(written)
    }
}
