//! # Path Resolution Module
//!
//! Centralizza il calcolo del path di destinazione.
//!
//! - Nessuna destinazione (o uguale al sorgente): il sorgente viene sovrascritto
//! - Destinazione libera: usata così com'è
//! - Destinazione esistente: `name-1.ext`, `name-2.ext`, ... fino al primo libero

use crate::file_manager::FileManager;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Final destination for `source` given the caller's request
    pub async fn resolve_destination(source: &Path, requested: Option<&Path>) -> PathBuf {
        match requested {
            Some(dest) if !Self::same_file(source, dest).await => Self::unique_path(dest).await,
            _ => source.to_path_buf(),
        }
    }

    /// Whether two spellings name the same file (`./a.jpg`, `a.jpg`, absolute form)
    pub async fn same_file(a: &Path, b: &Path) -> bool {
        if a == b {
            return true;
        }
        match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// First path that does not exist yet.
    ///
    /// The counter is always applied to the requested stem, so an existing
    /// `-N` in the requested name is kept and suffixes never stack.
    pub async fn unique_path(path: &Path) -> PathBuf {
        if !FileManager::exists(path).await {
            return path.to_path_buf();
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut number: u64 = 1;
        loop {
            let candidate = path.with_file_name(format!("{}-{}{}", stem, number, ext));
            if !FileManager::exists(&candidate).await {
                debug!("Destination {} taken, using {}", path.display(), candidate.display());
                return candidate;
            }
            number += 1;
        }
    }
}
