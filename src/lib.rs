//! # reSmush.it Optimizer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare della libreria
//! - Espone i tipi e le funzioni principali tramite re-exports
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom (`OptimizeError`, `TransportError`)
//! - `error_log`: Sink dei messaggi di errore (file con timestamp)
//! - `file_manager`: Operazioni sui file, mime sniffing, nomi univoci
//! - `transport`: Client HTTP verso reSmush.it (reqwest primario, ureq secondario)
//! - `image_processor`: Re-encode JPEG locale usato come fallback
//! - `optimizer`: Orchestratore di una singola ottimizzazione
//! - `logging`: Setup di `tracing`
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use resmush_optimizer::{Config, Optimizer};
//!
//! let mut optimizer = Optimizer::new(Config::default());
//! let ok = optimizer.optimize(Path::new("photo.png"), Some(Path::new("photo-small.png"))).await;
//! ```

pub mod config;
pub mod error;
pub mod error_log;
pub mod file_manager;
pub mod image_processor;
pub mod logging;
pub mod optimizer;
pub mod transport;

pub use config::Config;
pub use error::{OptimizeError, TransportError};
pub use error_log::{ErrorLog, FileErrorLog};
pub use logging::init_tracing;
pub use optimizer::{OptimizationMethod, OptimizationOutcome, Optimizer};
pub use transport::{HttpTransport, ReqwestTransport, UploadRequest, UreqTransport};
