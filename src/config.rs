//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'ottimizzatore.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di ottimizzazione
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default coerenti con il servizio reSmush.it
//!
//! ## Parametri di configurazione:
//! - `api_endpoint`: URL del servizio remoto (default: `http://api.resmush.it`)
//! - `quality`: Qualità richiesta al servizio remoto (1-100, default: 92)
//! - `fallback_quality`: Qualità JPEG per il re-encode locale (1-100, default: 85)
//! - `connect_timeout_secs`: Timeout di connessione delle richieste (default: 5)
//! - `max_file_size`: Dimensione massima del sorgente in byte (default: 5 MiB, esclusa)
//! - `max_execution_seconds`: Limite di esecuzione dell'host (default: 0 = nessun limite)
//! - `primary_transport`: Abilita il client HTTP primario (default: true)
//! - `log_file`: File di log degli errori (default: None = `~/.resmush-optimizer/debug.log`)
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     quality: 80,
//!     primary_transport: false,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Public reSmush.it endpoint
pub const DEFAULT_API_ENDPOINT: &str = "http://api.resmush.it";

/// Sources must be strictly smaller than this (5 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5_242_880;

/// Configuration for a single optimizer instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote optimization service
    pub api_endpoint: String,
    /// Quality sent to the remote service (1-100)
    pub quality: u8,
    /// JPEG quality used when re-encoding locally (1-100)
    pub fallback_quality: u8,
    /// Connect timeout for every outbound request
    pub connect_timeout_secs: u64,
    /// Files of this size or larger are rejected
    pub max_file_size: u64,
    /// Wall-clock execution cap of the host (0 = no cap)
    pub max_execution_seconds: u64,
    /// Whether the primary HTTP transport should be offered
    pub primary_transport: bool,
    /// Error log location (None = default location in the home directory)
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            quality: 92,
            fallback_quality: 85,
            connect_timeout_secs: 5,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_execution_seconds: 0,
            primary_transport: true,
            log_file: None,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.quality == 0 || self.quality > 100 {
            return Err(anyhow::anyhow!("Quality must be between 1 and 100"));
        }

        if self.fallback_quality == 0 || self.fallback_quality > 100 {
            return Err(anyhow::anyhow!("Fallback quality must be between 1 and 100"));
        }

        if self.connect_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Connect timeout must be greater than 0"));
        }

        if self.max_file_size == 0 {
            return Err(anyhow::anyhow!("Maximum file size must be greater than 0"));
        }

        let endpoint = reqwest::Url::parse(&self.api_endpoint)
            .map_err(|e| anyhow::anyhow!("Invalid API endpoint {}: {}", self.api_endpoint, e))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!(
                "API endpoint must use http or https: {}",
                self.api_endpoint
            ));
        }

        Ok(())
    }

    /// Resolve where error lines are appended
    pub fn error_log_path(&self) -> PathBuf {
        if let Some(ref path) = self.log_file {
            return path.clone();
        }

        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".resmush-optimizer")
            .join("debug.log")
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.quality = 0;
        assert!(config.validate().is_err());

        config.quality = 92;
        config.fallback_quality = 101;
        assert!(config.validate().is_err());

        config.fallback_quality = 85;
        config.connect_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.connect_timeout_secs = 5;
        config.api_endpoint = "ftp://api.resmush.it".to_string();
        assert!(config.validate().is_err());

        config.api_endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.api_endpoint, "http://api.resmush.it");
        assert_eq!(config.quality, 92);
        assert_eq!(config.fallback_quality, 85);
        assert_eq!(config.connect_timeout_secs, 5);
        assert_eq!(config.max_file_size, 5_242_880);
        assert_eq!(config.max_execution_seconds, 0);
        assert!(config.primary_transport);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_error_log_path() {
        let config = Config {
            log_file: Some(PathBuf::from("/var/log/optimizer.log")),
            ..Default::default()
        };
        assert_eq!(config.error_log_path(), PathBuf::from("/var/log/optimizer.log"));

        let default_path = Config::default().error_log_path();
        assert!(default_path.ends_with(".resmush-optimizer/debug.log"));
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            api_endpoint: "https://example.test/api".to_string(),
            quality: 80,
            fallback_quality: 70,
            primary_transport: false,
            max_execution_seconds: 30,
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();

        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.api_endpoint, "https://example.test/api");
        assert_eq!(loaded_config.quality, 80);
        assert_eq!(loaded_config.fallback_quality, 70);
        assert!(!loaded_config.primary_transport);
        assert_eq!(loaded_config.max_execution_seconds, 30);
    }

    #[tokio::test]
    async fn test_config_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "quality": 75 }"#).await.unwrap();

        let loaded_config = Config::from_file(&config_path).await.unwrap();
        assert_eq!(loaded_config.quality, 75);
        assert_eq!(loaded_config.fallback_quality, 85);
        assert_eq!(loaded_config.api_endpoint, DEFAULT_API_ENDPOINT);
    }

    #[tokio::test]
    async fn test_config_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let loaded_config = Config::from_file(&temp_dir.path().join("absent.json")).await.unwrap();
        assert_eq!(loaded_config.quality, 92);
    }
}
