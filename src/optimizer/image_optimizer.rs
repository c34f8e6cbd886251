//! # Image Optimizer
//!
//! Orchestratore di una singola ottimizzazione.
//!
//! ## Flusso di esecuzione:
//! 1. Validazione: estensione destinazione, esistenza sorgente, mime type
//!    (dal contenuto), dimensione < 5 MiB, nome destinazione univoco
//! 2. Upload al servizio remoto provando i transport in ordine
//!    (`Unavailable` -> transport successivo)
//! 3. Download del risultato (`dest`) sulla destinazione
//! 4. Qualunque errore remoto -> re-encode locale JPEG alla qualità di fallback
//!
//! `optimize` restituisce solo `bool`: i dettagli dell'errore finiscono
//! nell'`ErrorLog`. `optimize_detailed` espone l'esito completo.

use crate::config::Config;
use crate::error::OptimizeError;
use crate::error_log::{ErrorLog, FileErrorLog};
use crate::file_manager::FileManager;
use crate::image_processor::ImageProcessor;
use crate::optimizer::execution_budget::ExecutionBudget;
use crate::optimizer::path_resolver::PathResolver;
use crate::transport::{
    parse_response, HttpTransport, ReqwestTransport, UploadRequest, UreqTransport,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A validated optimization request
#[derive(Debug, Clone)]
pub struct OptimizationRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub mime_type: &'static str,
    pub original_size: u64,
}

/// How the destination was produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimizationMethod {
    /// Compressed by the remote service, fetched with the named transport
    Remote { transport: &'static str },
    /// Re-encoded locally as JPEG
    LocalReencode,
}

/// Result of a successful optimization
#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub method: OptimizationMethod,
    pub original_size: u64,
    pub optimized_size: u64,
}

impl OptimizationOutcome {
    pub fn reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.original_size, self.optimized_size)
    }
}

/// Optimizes one image per call through reSmush.it, falling back to a local re-encode
pub struct Optimizer {
    config: Config,
    transports: Vec<Box<dyn HttpTransport>>,
    error_log: Arc<dyn ErrorLog>,
    budget: ExecutionBudget,
}

impl Optimizer {
    /// Creates an optimizer with probed transports and the file error log
    pub fn new(config: Config) -> Self {
        let transports = Self::probe_transports(&config);
        let error_log = Arc::new(FileErrorLog::new(config.error_log_path()));
        Self::with_parts(config, transports, error_log)
    }

    /// Creates an optimizer with explicit transports (tried in order) and error sink
    pub fn with_parts(
        config: Config,
        transports: Vec<Box<dyn HttpTransport>>,
        error_log: Arc<dyn ErrorLog>,
    ) -> Self {
        let budget = ExecutionBudget::new(config.max_execution_seconds);
        Self {
            config,
            transports,
            error_log,
            budget,
        }
    }

    /// Primary transport first when enabled and constructible, then the secondary one
    pub fn probe_transports(config: &Config) -> Vec<Box<dyn HttpTransport>> {
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);
        let mut transports: Vec<Box<dyn HttpTransport>> = Vec::new();

        if config.primary_transport {
            match ReqwestTransport::new(connect_timeout) {
                Ok(transport) => transports.push(Box::new(transport)),
                Err(e) => warn!("Primary transport disabled: {}", e),
            }
        }
        transports.push(Box::new(UreqTransport::new(connect_timeout)));

        transports
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport_names(&self) -> Vec<&'static str> {
        self.transports.iter().map(|t| t.name()).collect()
    }

    /// Optimize `source` into `destination` (or in place when `None`).
    ///
    /// Never fails outward: errors are written to the error log and reported as `false`.
    pub async fn optimize(&mut self, source: &Path, destination: Option<&Path>) -> bool {
        match self.optimize_detailed(source, destination).await {
            Ok(_) => true,
            Err(e) => {
                self.error_log.log_error(&e.to_string());
                false
            }
        }
    }

    /// Same flow as [`Optimizer::optimize`], returning the outcome or the final error
    pub async fn optimize_detailed(
        &mut self,
        source: &Path,
        destination: Option<&Path>,
    ) -> Result<OptimizationOutcome, OptimizeError> {
        let request = self.validate(source, destination).await?;
        debug!(
            "Optimizing {} ({}, {}) -> {}",
            request.source.display(),
            request.mime_type,
            FileManager::format_size(request.original_size),
            request.destination.display()
        );

        let method = match self.optimize_remote(&request).await {
            Ok(transport) => OptimizationMethod::Remote { transport },
            Err(e) => {
                warn!(
                    "Remote optimization of {} failed ({}), re-encoding locally at quality {}",
                    request.source.display(),
                    e,
                    self.config.fallback_quality
                );
                self.reencode_locally(&request).await?;
                OptimizationMethod::LocalReencode
            }
        };

        let optimized_size = FileManager::file_size(&request.destination).await?;
        let outcome = OptimizationOutcome {
            source: request.source,
            destination: request.destination,
            method,
            original_size: request.original_size,
            optimized_size,
        };

        info!(
            "Optimized {} -> {} ({:?}): {} -> {} ({:.1}% reduction)",
            outcome.source.display(),
            outcome.destination.display(),
            outcome.method,
            FileManager::format_size(outcome.original_size),
            FileManager::format_size(outcome.optimized_size),
            outcome.reduction_percent()
        );

        Ok(outcome)
    }

    /// Check the inputs and resolve the final destination
    pub async fn validate(
        &self,
        source: &Path,
        destination: Option<&Path>,
    ) -> Result<OptimizationRequest, OptimizeError> {
        let destination = destination.filter(|d| !d.as_os_str().is_empty());

        if let Some(dest) = destination {
            if !FileManager::has_allowed_extension(dest) {
                return Err(OptimizeError::InvalidDestinationExtension(dest.to_path_buf()));
            }
        }

        if !FileManager::exists(source).await {
            return Err(OptimizeError::SourceNotFound(source.to_path_buf()));
        }

        let mime_type = FileManager::detect_mime_type(source).await?;
        if !FileManager::is_allowed_mime_type(mime_type) {
            return Err(OptimizeError::UnsupportedMimeType {
                path: source.to_path_buf(),
                mime: mime_type.to_string(),
            });
        }

        let original_size = FileManager::file_size(source).await?;
        if original_size >= self.config.max_file_size {
            return Err(OptimizeError::FileTooLarge {
                path: source.to_path_buf(),
                size: original_size,
                limit: self.config.max_file_size,
            });
        }

        let destination = PathResolver::resolve_destination(source, destination).await;

        Ok(OptimizationRequest {
            source: source.to_path_buf(),
            destination,
            mime_type,
            original_size,
        })
    }

    /// Upload and download through the first usable transport
    async fn optimize_remote(
        &mut self,
        request: &OptimizationRequest,
    ) -> Result<&'static str, OptimizeError> {
        let upload = UploadRequest::from_file(&request.source, request.mime_type).await?;

        for transport in &self.transports {
            self.budget.reset_if_required();

            let body = match transport
                .post(&self.config.api_endpoint, self.config.quality, &upload)
                .await
            {
                Ok(body) => body,
                Err(e) if e.is_unavailable() => {
                    debug!("{}, trying next transport", e);
                    continue;
                }
                Err(e) => {
                    return Err(OptimizeError::RemoteService(format!(
                        "{}: {}",
                        transport.name(),
                        e
                    )))
                }
            };

            let dest = parse_response(&body).map_err(|e| {
                OptimizeError::RemoteService(format!("{}: {}", transport.name(), e))
            })?;

            self.budget.reset_if_required();
            let written = transport
                .download(&dest, &request.destination)
                .await
                .map_err(|e| OptimizeError::Download(format!("{}: {}", dest, e)))?;
            debug!(
                "Stored {} from {} via {}",
                FileManager::format_size(written),
                dest,
                transport.name()
            );

            return Ok(transport.name());
        }

        Err(OptimizeError::RemoteService("no HTTP transport available".to_string()))
    }

    async fn reencode_locally(
        &mut self,
        request: &OptimizationRequest,
    ) -> Result<u64, OptimizeError> {
        self.budget.reset_if_required();

        ImageProcessor::reencode_as_jpeg(
            &request.source,
            request.mime_type,
            &request.destination,
            self.config.fallback_quality,
        )
        .await
        .map_err(|e| match e {
            OptimizeError::LocalEncode(_) => e,
            other => OptimizeError::LocalEncode(other.to_string()),
        })
    }
}
