//! # Ureq Transport
//!
//! Client HTTP secondario basato su `ureq`. È bloccante, quindi ogni richiesta
//! gira su `tokio::task::spawn_blocking`. Il body multipart viene costruito a
//! mano da `UploadRequest::to_multipart`.

use super::{upload_url, HttpTransport, UploadRequest};
use crate::error::TransportError;
use crate::file_manager::FileManager;
use async_trait::async_trait;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use ureq::{Agent, AgentBuilder};

pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub const NAME: &'static str = "ureq";

    pub fn new(connect_timeout: Duration) -> Self {
        let agent = AgentBuilder::new().timeout_connect(connect_timeout).build();
        Self { agent }
    }
}

fn join_error(e: tokio::task::JoinError) -> TransportError {
    TransportError::Request(format!("blocking request aborted: {}", e))
}

#[async_trait]
impl HttpTransport for UreqTransport {
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
        let boundary = upload.boundary();
        let body = upload.to_multipart(&boundary);
        let agent = self.agent.clone();

        debug!("POST {} ({} bytes) via ureq", url, upload.bytes.len());
        tokio::task::spawn_blocking(move || -> Result<String, TransportError> {
            let response = agent
                .post(url.as_str())
                .set(
                    "Content-Type",
                    &format!("multipart/form-data; boundary={}", boundary),
                )
                .send_bytes(&body)?;

            if response.status() != 200 {
                return Err(TransportError::Status(response.status()));
            }

            Ok(response.into_string()?)
        })
        .await
        .map_err(join_error)?
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<u64, TransportError> {
        let agent = self.agent.clone();
        let url = url.to_string();
        let destination = destination.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<u64, TransportError> {
            let response = agent.get(&url).call()?;

            let mut staged = FileManager::staging_file(&destination)?;
            let mut reader = response.into_reader();
            let written = std::io::copy(&mut reader, staged.as_file_mut())?;
            staged.flush()?;
            FileManager::persist(staged, &destination)?;

            debug!("Downloaded {} bytes from {} via ureq", written, url);
            Ok(written)
        })
        .await
        .map_err(join_error)?
    }
}
